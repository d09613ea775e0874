//! Startup configuration.

use std::path::PathBuf;
use trigon_gpu::DiagnosticsLevel;

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Window width; also the swapchain fallback when the surface lets the
    /// window decide its size.
    pub width: u32,
    /// Window height.
    pub height: u32,
    /// Validation diagnostics, threaded into device bring-up.
    pub diagnostics: DiagnosticsLevel,
    /// Path to the precompiled vertex shader binary.
    pub vertex_shader: PathBuf,
    /// Path to the precompiled fragment shader binary.
    pub fragment_shader: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Trigon".to_string(),
            width: 800,
            height: 600,
            diagnostics: DiagnosticsLevel::default_for_build(),
            vertex_shader: PathBuf::from("shaders/triangle.vert.spv"),
            fragment_shader: PathBuf::from("shaders/triangle.frag.spv"),
        }
    }
}

impl AppConfig {
    /// Create a new config with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the diagnostics level.
    pub fn with_diagnostics(mut self, level: DiagnosticsLevel) -> Self {
        self.diagnostics = level;
        self
    }

    /// Set the shader binary paths.
    pub fn with_shaders(
        mut self,
        vertex: impl Into<PathBuf>,
        fragment: impl Into<PathBuf>,
    ) -> Self {
        self.vertex_shader = vertex.into();
        self.fragment_shader = fragment.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_800_by_600() {
        let config = AppConfig::default();
        assert_eq!((config.width, config.height), (800, 600));
    }

    #[test]
    fn builders_override_defaults() {
        let config = AppConfig::new("demo")
            .with_size(1024, 768)
            .with_diagnostics(DiagnosticsLevel::Off)
            .with_shaders("v.spv", "f.spv");
        assert_eq!(config.title, "demo");
        assert_eq!((config.width, config.height), (1024, 768));
        assert_eq!(config.diagnostics, DiagnosticsLevel::Off);
        assert_eq!(config.vertex_shader, PathBuf::from("v.spv"));
        assert_eq!(config.fragment_shader, PathBuf::from("f.spv"));
    }
}
