//! Windowed application layer for the Trigon renderer.
//!
//! Owns the event loop, the startup configuration, and the per-frame
//! acquire/submit/present cycle over a [`trigon_gpu::RenderContext`].

pub mod config;
pub mod frame;
pub mod runner;

pub use config::AppConfig;
pub use frame::{draw_frame, FrameOutcome};
pub use runner::run;
