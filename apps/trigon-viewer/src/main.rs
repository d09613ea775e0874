//! Trigon demo viewer.
//!
//! Opens a fixed 800x600 window and draws one shader-generated triangle per
//! frame until the window is closed.
//!
//! The shader binaries are loaded from `shaders/triangle.vert.spv` and
//! `shaders/triangle.frag.spv` relative to the working directory; compile
//! the GLSL sources next to them with `glslc` first:
//!
//! ```bash
//! glslc shaders/triangle.vert -o shaders/triangle.vert.spv
//! glslc shaders/triangle.frag -o shaders/triangle.frag.spv
//! cargo run -p trigon-viewer
//! ```
//!
//! Set `RUST_LOG` to control log output (e.g. info, debug, trace).

use trigon_app::AppConfig;

fn main() -> anyhow::Result<()> {
    trigon_app::run(AppConfig::new("Trigon viewer"))
}
