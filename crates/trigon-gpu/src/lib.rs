//! Vulkan bring-up and presentation layer for the Trigon renderer.
//!
//! This crate walks a native window from nothing to a steady per-frame draw
//! loop:
//! - instance and adapter bring-up with optional validation diagnostics
//! - presentation chain negotiation and image view creation
//! - render pass and graphics pipeline construction
//! - per-image framebuffers with command buffers recorded once at startup
//! - semaphore/fence synchronization for the acquire/submit/present cycle
//!
//! [`RenderContextBuilder`] runs the whole chain as a staged sequence; each
//! stage either produces the handles the next stage consumes or aborts
//! bring-up with an error naming the stage that failed.

pub mod capabilities;
pub mod command;
pub mod context;
pub mod device;
pub mod error;
pub mod frame;
pub mod instance;
pub mod pipeline;
pub mod shader;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use capabilities::{QueueFamily, SwapchainSupport};
pub use context::{BringupStage, RenderContext, RenderContextBuilder};
pub use error::{GpuError, Result};
pub use frame::FrameResources;
pub use instance::{DebugMessenger, DiagnosticsLevel};
pub use pipeline::{Pipeline, PipelineConfig};
pub use surface::SurfaceContext;
pub use swapchain::Swapchain;
pub use sync::FrameSync;
