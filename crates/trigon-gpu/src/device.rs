//! Adapter selection and logical device creation.

use crate::capabilities::{
    find_graphics_present_family, query_queue_families, supports_device_extensions,
    SwapchainSupport,
};
use crate::error::{GpuError, Result};
use ash::vk;
use std::ffi::{c_char, CStr};

/// Device extensions every selected adapter must support.
pub fn required_device_extensions() -> Vec<&'static CStr> {
    vec![ash::khr::swapchain::NAME]
}

/// An adapter chosen for rendering, with its combined graphics/present
/// queue family.
#[derive(Debug, Clone, Copy)]
pub struct SelectedAdapter {
    pub adapter: vk::PhysicalDevice,
    pub queue_family: u32,
}

/// Pick the first adapter that has a combined graphics+present queue family,
/// the required device extensions, and usable swapchain support.
///
/// # Safety
/// The instance, surface loader, and surface must be valid.
pub unsafe fn select_adapter(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<SelectedAdapter> {
    let adapters = instance.enumerate_physical_devices()?;
    if adapters.is_empty() {
        tracing::warn!("No Vulkan adapters present");
        return Err(GpuError::NoSuitableAdapter);
    }

    for adapter in adapters {
        let name = adapter_name(instance, adapter);

        let families = query_queue_families(instance, adapter, surface_loader, surface);
        let Some(queue_family) = find_graphics_present_family(&families) else {
            tracing::debug!("{name}: no combined graphics/present queue family");
            continue;
        };

        if !supports_device_extensions(instance, adapter, &required_device_extensions()) {
            tracing::debug!("{name}: missing required device extensions");
            continue;
        }

        let support = SwapchainSupport::query(surface_loader, adapter, surface)?;
        if !support.is_adequate() {
            tracing::debug!("{name}: no usable surface formats or present modes");
            continue;
        }

        tracing::info!("Selected adapter: {name} (queue family {queue_family})");
        return Ok(SelectedAdapter {
            adapter,
            queue_family,
        });
    }

    Err(GpuError::NoSuitableAdapter)
}

unsafe fn adapter_name(instance: &ash::Instance, adapter: vk::PhysicalDevice) -> String {
    let properties = instance.get_physical_device_properties(adapter);
    CStr::from_ptr(properties.device_name.as_ptr())
        .to_string_lossy()
        .into_owned()
}

/// Open a logical device with a single queue used for both graphics
/// submission and presentation.
///
/// # Safety
/// The instance and adapter must be valid and the queue family must exist.
pub unsafe fn create_device(
    instance: &ash::Instance,
    adapter: vk::PhysicalDevice,
    queue_family: u32,
) -> Result<(ash::Device, vk::Queue)> {
    let queue_priority = 1.0_f32;
    let queue_info = vk::DeviceQueueCreateInfo::default()
        .queue_family_index(queue_family)
        .queue_priorities(std::slice::from_ref(&queue_priority));

    let extensions = required_device_extensions();
    let extension_names: Vec<*const c_char> = extensions.iter().map(|ext| ext.as_ptr()).collect();

    let features = vk::PhysicalDeviceFeatures::default();

    let create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(std::slice::from_ref(&queue_info))
        .enabled_extension_names(&extension_names)
        .enabled_features(&features);

    let device = instance.create_device(adapter, &create_info, None)?;
    let queue = device.get_device_queue(queue_family, 0);

    Ok((device, queue))
}
