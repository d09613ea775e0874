//! Synchronization for the acquire/submit/present handshake.

use crate::error::Result;
use ash::vk;

/// The primitives coordinating the single frame in flight with the
/// presentation engine.
///
/// `image_available` is signaled when the presentation engine hands over an
/// acquired image, gating the submission's color output; `render_finished`
/// is signaled when the submission completes, gating presentation;
/// `in_flight` is the host-side bound that keeps a new iteration from
/// reusing these primitives while the previous frame is still pending.
pub struct FrameSync {
    pub image_available: vk::Semaphore,
    pub render_finished: vk::Semaphore,
    pub in_flight: vk::Fence,
}

impl FrameSync {
    /// Create the semaphore pair and the in-flight fence.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn new(device: &ash::Device) -> Result<Self> {
        let semaphore_info = vk::SemaphoreCreateInfo::default();
        let image_available = device.create_semaphore(&semaphore_info, None)?;
        let render_finished = device.create_semaphore(&semaphore_info, None)?;

        // Starts signaled so the first iteration's wait returns immediately.
        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        let in_flight = device.create_fence(&fence_info, None)?;

        Ok(Self {
            image_available,
            render_finished,
            in_flight,
        })
    }

    /// Block until the in-flight frame retires.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn wait(&self, device: &ash::Device) -> Result<()> {
        device.wait_for_fences(&[self.in_flight], true, u64::MAX)?;
        Ok(())
    }

    /// Re-arm the fence for the next submission. Call only after a
    /// successful image acquire, so a skipped frame leaves it signaled.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn reset(&self, device: &ash::Device) -> Result<()> {
        device.reset_fences(&[self.in_flight])?;
        Ok(())
    }

    /// Destroy the semaphores and the fence.
    ///
    /// # Safety
    /// The device must be valid and none of the primitives may be in use.
    pub unsafe fn destroy(&self, device: &ash::Device) {
        device.destroy_semaphore(self.image_available, None);
        device.destroy_semaphore(self.render_finished, None);
        device.destroy_fence(self.in_flight, None);
    }
}
