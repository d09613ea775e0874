//! Per-frame acquire, submit, and present orchestration.

use ash::vk;
use tracing::debug;
use trigon_gpu::command::submit_command_buffers;
use trigon_gpu::{RenderContext, Result};

/// What one frame iteration accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and queued for presentation.
    Presented,
    /// The presentation chain no longer matches the surface; the frame was
    /// skipped and the caller may retry on the next iteration.
    OutOfDate,
}

/// Run one acquire/submit/present cycle.
///
/// The submission waits on `image_available` at color-attachment output and
/// signals `render_finished` plus the in-flight fence; presentation waits on
/// `render_finished`. With a single frame in flight, the fence wait at the
/// top bounds the host loop to the pace the GPU retires frames.
pub fn draw_frame(ctx: &RenderContext) -> Result<FrameOutcome> {
    let device = ctx.device();
    let sync = ctx.sync();

    unsafe {
        sync.wait(device)?;

        let (image_index, acquire_suboptimal) = match ctx.swapchain().acquire_next_image(
            ctx.swapchain_loader(),
            sync.image_available,
            u64::MAX,
        ) {
            Ok(acquired) => acquired,
            Err(e) if e.is_retryable() => {
                debug!("Image acquire reported the presentation chain out of date");
                return Ok(FrameOutcome::OutOfDate);
            }
            Err(e) => return Err(e),
        };

        // Re-arm the fence only once an image is actually in hand, so a
        // skipped frame leaves it signaled.
        sync.reset(device)?;

        let command_buffer = ctx.frames().command_buffers[image_index as usize];
        submit_command_buffers(
            device,
            ctx.queue(),
            &[command_buffer],
            &[sync.image_available],
            &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT],
            &[sync.render_finished],
            sync.in_flight,
        )?;

        let present_suboptimal = ctx.swapchain().present(
            ctx.swapchain_loader(),
            ctx.queue(),
            image_index,
            &[sync.render_finished],
        )?;

        if acquire_suboptimal || present_suboptimal {
            return Ok(FrameOutcome::OutOfDate);
        }
    }

    Ok(FrameOutcome::Presented)
}
