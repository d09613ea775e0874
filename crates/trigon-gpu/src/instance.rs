//! Vulkan instance creation and validation diagnostics.

use crate::error::Result;
use ash::vk;
use std::ffi::{c_char, c_void, CStr, CString};

/// How much validation output to request at bring-up.
///
/// Threaded explicitly through instance creation; nothing in this crate
/// reads a process-wide flag or a compile-time toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticsLevel {
    /// No validation layer, no messenger.
    Off,
    /// Warnings and errors from the validation layer.
    Warning,
    /// Everything the validation layer emits, down to verbose output.
    Verbose,
}

impl DiagnosticsLevel {
    /// Default for the current build profile: warnings in debug builds,
    /// off in release.
    pub fn default_for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Warning
        } else {
            Self::Off
        }
    }

    /// Whether any diagnostics are requested.
    pub fn enabled(self) -> bool {
        !matches!(self, Self::Off)
    }

    fn severity_flags(self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        match self {
            Self::Off => vk::DebugUtilsMessageSeverityFlagsEXT::empty(),
            Self::Warning => {
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
            }
            Self::Verbose => {
                vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
            }
        }
    }
}

/// Validation layer requested when diagnostics are enabled.
pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Create a Vulkan instance.
///
/// `window_extensions` is the host-supplied list of instance extensions the
/// windowing system needs. When diagnostics are requested but the validation
/// layer is unavailable, the instance is created without it and a warning is
/// logged; diagnostics absence is never fatal.
///
/// # Safety
/// The entry must be a valid Vulkan entry point.
pub unsafe fn create_instance(
    entry: &ash::Entry,
    app_name: &str,
    window_extensions: &[*const c_char],
    diagnostics: DiagnosticsLevel,
) -> Result<ash::Instance> {
    let app_name = CString::new(app_name).unwrap();
    let engine_name = CString::new("Trigon").unwrap();

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(&engine_name)
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_0);

    let validation = diagnostics.enabled() && validation_layer_available(entry)?;

    let mut extension_names: Vec<*const c_char> = window_extensions.to_vec();
    let mut layer_names: Vec<*const c_char> = Vec::new();
    if validation {
        extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        layer_names.push(VALIDATION_LAYER.as_ptr());
        tracing::info!("Validation layer enabled");
    } else if diagnostics.enabled() {
        tracing::warn!(
            "Validation layer {} requested but unavailable, continuing without diagnostics",
            VALIDATION_LAYER.to_string_lossy()
        );
    }

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names);

    let instance = entry.create_instance(&create_info, None)?;

    Ok(instance)
}

/// Check whether the validation layer can be enabled.
unsafe fn validation_layer_available(entry: &ash::Entry) -> Result<bool> {
    let available = entry.enumerate_instance_layer_properties()?;
    Ok(available
        .iter()
        .any(|props| CStr::from_ptr(props.layer_name.as_ptr()) == VALIDATION_LAYER))
}

/// Log every instance extension the loader reports, at debug level.
///
/// # Safety
/// The entry must be a valid Vulkan entry point.
pub unsafe fn log_available_extensions(entry: &ash::Entry) -> Result<()> {
    let extensions = entry.enumerate_instance_extension_properties(None)?;
    tracing::debug!("{} instance extensions available:", extensions.len());
    for ext in &extensions {
        tracing::debug!(
            "  {}",
            CStr::from_ptr(ext.extension_name.as_ptr()).to_string_lossy()
        );
    }
    Ok(())
}

/// Debug-utils messenger forwarding validation output into `tracing`.
pub struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    /// Register the messenger on an instance.
    ///
    /// # Safety
    /// The entry and instance must be valid, and the instance must have been
    /// created with the debug-utils extension enabled.
    pub unsafe fn new(
        entry: &ash::Entry,
        instance: &ash::Instance,
        level: DiagnosticsLevel,
    ) -> Result<Self> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(level.severity_flags())
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        let loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let messenger = loader.create_debug_utils_messenger(&create_info, None)?;

        Ok(Self { loader, messenger })
    }

    /// Unregister the messenger.
    ///
    /// # Safety
    /// The owning instance must still be alive.
    pub unsafe fn destroy(&self) {
        self.loader
            .destroy_debug_utils_messenger(self.messenger, None);
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }

    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        tracing::error!("validation: {message}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        tracing::warn!("validation: {message}");
    } else {
        tracing::debug!("validation: {message}");
    }

    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_disables_diagnostics() {
        assert!(!DiagnosticsLevel::Off.enabled());
        assert!(DiagnosticsLevel::Warning.enabled());
        assert!(DiagnosticsLevel::Verbose.enabled());
    }

    #[test]
    fn verbose_requests_more_than_warning() {
        let warning = DiagnosticsLevel::Warning.severity_flags();
        let verbose = DiagnosticsLevel::Verbose.severity_flags();
        assert!(verbose.contains(warning));
        assert!(verbose.contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE));
        assert!(!warning.contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE));
    }
}
