//! Per-image frame resources: framebuffers and pre-recorded command buffers.

use crate::command::{record_draw_commands, CommandPool};
use crate::error::{GpuError, Result};
use crate::pipeline::Pipeline;
use ash::vk;

/// One framebuffer per view, all binding the same render pass and extent.
///
/// # Safety
/// The device, views, and render pass must be valid.
pub unsafe fn create_framebuffers(
    device: &ash::Device,
    image_views: &[vk::ImageView],
    render_pass: vk::RenderPass,
    extent: vk::Extent2D,
) -> Result<Vec<vk::Framebuffer>> {
    image_views
        .iter()
        .map(|view| {
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass)
                .attachments(std::slice::from_ref(view))
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            device
                .create_framebuffer(&create_info, None)
                .map_err(GpuError::from)
        })
        .collect()
}

/// Framebuffers and command buffers for every presentation image.
///
/// Command buffers are recorded exactly once here; nothing ever re-records
/// them.
pub struct FrameResources {
    pub framebuffers: Vec<vk::Framebuffer>,
    pub command_pool: CommandPool,
    pub command_buffers: Vec<vk::CommandBuffer>,
}

impl FrameResources {
    /// Create framebuffers, allocate one primary command buffer per image,
    /// and record the draw sequence into each.
    ///
    /// # Safety
    /// All handles must be valid.
    pub unsafe fn new(
        device: &ash::Device,
        image_views: &[vk::ImageView],
        pipeline: &Pipeline,
        extent: vk::Extent2D,
        queue_family: u32,
    ) -> Result<Self> {
        let framebuffers = create_framebuffers(device, image_views, pipeline.render_pass, extent)?;

        let command_pool = CommandPool::new(device, queue_family)?;
        let command_buffers =
            command_pool.allocate_command_buffers(device, framebuffers.len() as u32)?;

        for (&cmd, &framebuffer) in command_buffers.iter().zip(&framebuffers) {
            record_draw_commands(
                device,
                cmd,
                pipeline.render_pass,
                framebuffer,
                pipeline.pipeline,
                extent,
            )?;
        }

        tracing::debug!("Recorded {} command buffers", command_buffers.len());

        Ok(Self {
            framebuffers,
            command_pool,
            command_buffers,
        })
    }

    /// Destroy the pool (freeing its command buffers), then the
    /// framebuffers.
    ///
    /// # Safety
    /// The device must be valid and no command buffer may be pending.
    pub unsafe fn destroy(&self, device: &ash::Device) {
        self.command_pool.destroy(device);
        for &framebuffer in &self.framebuffers {
            device.destroy_framebuffer(framebuffer, None);
        }
    }
}
