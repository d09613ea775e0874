//! GPU error types.

use crate::context::BringupStage;
use ash::vk;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from bring-up, resource creation, and the frame loop.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan call returned a non-success status.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// The Vulkan entry points could not be loaded.
    #[error("Failed to load Vulkan: {0}")]
    EntryLoading(String),

    /// No adapter offers a combined graphics/present queue family plus the
    /// required device extensions and usable swapchain support.
    #[error("No suitable adapter found")]
    NoSuitableAdapter,

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// Swapchain creation failed.
    #[error("Swapchain creation failed: {0}")]
    SwapchainCreation(String),

    /// A shader binary was empty or not a whole number of 32-bit words.
    #[error("Malformed shader binary {}: {len} bytes is not a non-empty multiple of 4", path.display())]
    MalformedShaderBinary { path: PathBuf, len: usize },

    /// Reading a shader binary from disk failed.
    #[error("Failed to read shader binary {}: {source}", path.display())]
    ShaderIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Shader module creation failed.
    #[error("Shader module creation failed: {0}")]
    ShaderCompilation(String),

    /// Pipeline creation failed.
    #[error("Pipeline creation failed: {0}")]
    PipelineCreation(String),

    /// Internal invariant violated.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A bring-up stage failed; everything constructed before it has already
    /// been torn down by the builder.
    #[error("{stage:?} bring-up failed: {source}")]
    Bringup {
        stage: BringupStage,
        #[source]
        source: Box<GpuError>,
    },
}

impl GpuError {
    /// Tag this error with the bring-up stage it occurred in.
    pub(crate) fn at_stage(self, stage: BringupStage) -> Self {
        Self::Bringup {
            stage,
            source: Box::new(self),
        }
    }

    /// Whether this reports a transient presentation status (the chain no
    /// longer matches the surface) rather than a fatal failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Vulkan(vk::Result::ERROR_OUT_OF_DATE_KHR | vk::Result::SUBOPTIMAL_KHR)
        )
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_date_is_retryable() {
        assert!(GpuError::Vulkan(vk::Result::ERROR_OUT_OF_DATE_KHR).is_retryable());
        assert!(GpuError::Vulkan(vk::Result::SUBOPTIMAL_KHR).is_retryable());
    }

    #[test]
    fn other_failures_are_fatal() {
        assert!(!GpuError::Vulkan(vk::Result::ERROR_DEVICE_LOST).is_retryable());
        assert!(!GpuError::NoSuitableAdapter.is_retryable());
    }

    #[test]
    fn bringup_errors_name_their_stage() {
        let err = GpuError::NoSuitableAdapter.at_stage(BringupStage::Device);
        assert!(err.to_string().contains("Device"));
    }
}
