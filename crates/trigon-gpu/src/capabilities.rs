//! Adapter capability queries.
//!
//! Read-only inspection of what an adapter offers: queue families,
//! presentation support, surface formats and present modes, device
//! extensions. Queries never abort; an adapter that reports nothing usable
//! is left for the caller to reject.

use ash::vk;
use std::ffi::CStr;

use crate::error::Result;

/// One queue family on an adapter.
#[derive(Debug, Clone, Copy)]
pub struct QueueFamily {
    pub index: u32,
    pub flags: vk::QueueFlags,
    pub queue_count: u32,
    pub supports_present: bool,
}

impl QueueFamily {
    /// Whether this family can both record graphics work and present it.
    pub fn is_graphics_present(&self) -> bool {
        self.queue_count > 0
            && self.flags.contains(vk::QueueFlags::GRAPHICS)
            && self.supports_present
    }
}

/// Enumerate an adapter's queue families, with presentation support checked
/// against the given surface.
///
/// An adapter exposing zero families yields an empty list, logged but not
/// fatal.
///
/// # Safety
/// The instance, adapter, and surface must be valid.
pub unsafe fn query_queue_families(
    instance: &ash::Instance,
    adapter: vk::PhysicalDevice,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Vec<QueueFamily> {
    let properties = instance.get_physical_device_queue_family_properties(adapter);
    if properties.is_empty() {
        tracing::warn!("Adapter exposes no queue families");
    }

    properties
        .iter()
        .enumerate()
        .map(|(index, family)| {
            let index = index as u32;
            let supports_present = surface_loader
                .get_physical_device_surface_support(adapter, index, surface)
                .unwrap_or(false);

            QueueFamily {
                index,
                flags: family.queue_flags,
                queue_count: family.queue_count,
                supports_present,
            }
        })
        .collect()
}

/// First family usable for both graphics submission and presentation.
pub fn find_graphics_present_family(families: &[QueueFamily]) -> Option<u32> {
    families
        .iter()
        .find(|family| family.is_graphics_present())
        .map(|family| family.index)
}

/// Swapchain-related surface support reported by an adapter.
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    /// Query surface capabilities, formats, and present modes.
    ///
    /// Empty format or present-mode lists are returned as-is; the caller
    /// decides whether that makes the adapter unsuitable.
    ///
    /// # Safety
    /// The surface loader, adapter, and surface must be valid.
    pub unsafe fn query(
        surface_loader: &ash::khr::surface::Instance,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self> {
        let capabilities =
            surface_loader.get_physical_device_surface_capabilities(adapter, surface)?;
        let formats = surface_loader.get_physical_device_surface_formats(adapter, surface)?;
        let present_modes =
            surface_loader.get_physical_device_surface_present_modes(adapter, surface)?;

        if formats.is_empty() {
            tracing::warn!("Adapter reports no surface formats");
        }
        if present_modes.is_empty() {
            tracing::warn!("Adapter reports no present modes");
        }

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// Whether a swapchain can be negotiated at all.
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Check that an adapter supports every required device extension.
///
/// # Safety
/// The instance and adapter must be valid.
pub unsafe fn supports_device_extensions(
    instance: &ash::Instance,
    adapter: vk::PhysicalDevice,
    required: &[&CStr],
) -> bool {
    let Ok(available) = instance.enumerate_device_extension_properties(adapter) else {
        return false;
    };

    required.iter().all(|&needed| {
        let found = available
            .iter()
            .any(|ext| CStr::from_ptr(ext.extension_name.as_ptr()) == needed);
        if !found {
            tracing::debug!("Device extension {} not available", needed.to_string_lossy());
        }
        found
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(index: u32, flags: vk::QueueFlags, queue_count: u32, present: bool) -> QueueFamily {
        QueueFamily {
            index,
            flags,
            queue_count,
            supports_present: present,
        }
    }

    #[test]
    fn no_families_yields_no_selection() {
        assert_eq!(find_graphics_present_family(&[]), None);
    }

    #[test]
    fn graphics_without_present_is_rejected() {
        let families = [family(0, vk::QueueFlags::GRAPHICS, 1, false)];
        assert_eq!(find_graphics_present_family(&families), None);
    }

    #[test]
    fn present_without_graphics_is_rejected() {
        let families = [family(0, vk::QueueFlags::COMPUTE, 1, true)];
        assert_eq!(find_graphics_present_family(&families), None);
    }

    #[test]
    fn zero_queue_family_is_rejected() {
        let families = [family(0, vk::QueueFlags::GRAPHICS, 0, true)];
        assert_eq!(find_graphics_present_family(&families), None);
    }

    #[test]
    fn first_combined_family_wins() {
        let families = [
            family(0, vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, 1, false),
            family(1, vk::QueueFlags::GRAPHICS, 1, true),
            family(2, vk::QueueFlags::GRAPHICS, 2, true),
        ];
        assert_eq!(find_graphics_present_family(&families), Some(1));
    }

    #[test]
    fn support_without_formats_is_inadequate() {
        let support = SwapchainSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(!support.is_adequate());
    }

    #[test]
    fn support_without_present_modes_is_inadequate() {
        let support = SwapchainSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![],
        };
        assert!(!support.is_adequate());
    }
}
