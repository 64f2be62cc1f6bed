use std::{
    ffi::{CStr, c_char},
    sync::Arc,
};

use ash::vk;
use raw_window_handle::RawDisplayHandle;

use crate::{AshDebugWrapper, AshHandle, GpuError, Version, extension_set, physical::PhysicalDevice};

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

extension_set! {
    pub struct InstanceExtensions {
        khr_surface => ash::khr::surface::NAME,
        khr_wayland_surface => ash::khr::wayland_surface::NAME,
        khr_xlib_surface => ash::khr::xlib_surface::NAME,
        khr_xcb_surface => ash::khr::xcb_surface::NAME,
        khr_win32_surface => ash::khr::win32_surface::NAME,
        khr_android_surface => ash::khr::android_surface::NAME,
        ext_metal_surface => ash::ext::metal_surface::NAME,
    }
}

pub struct Library {
    pub(crate) entry: ash::Entry,
}

impl Library {
    pub fn new() -> Result<Arc<Library>, GpuError> {
        let entry = unsafe { ash::Entry::load() }?;
        Ok(Arc::new(Library { entry }))
    }

    /// Returns the instance extensions the loader supports.
    pub fn supported_extensions(&self) -> Result<InstanceExtensions, GpuError> {
        let properties = unsafe { self.entry.enumerate_instance_extension_properties(None) }?;
        let names = properties
            .iter()
            .filter_map(|property| property.extension_name_as_c_str().ok());

        Ok(InstanceExtensions::from_iter(names))
    }

    /// Checks whether an instance layer is installed.
    pub fn has_layer(&self, layer: &CStr) -> Result<bool, GpuError> {
        let properties = unsafe { self.entry.enumerate_instance_layer_properties() }?;
        Ok(properties
            .iter()
            .filter_map(|property| property.layer_name_as_c_str().ok())
            .any(|name| name == layer))
    }
}

pub struct InstanceCreateInfo {
    pub application_name: String,
    pub api_version: Version,
    /// Enables the Khronos validation layer when it is installed.
    pub validation: bool,
}

pub struct Instance {
    entry: Arc<Library>,
    instance: AshDebugWrapper<ash::Instance>,
    api_version: Version,
}

impl Instance {
    /// Creates an instance with the extensions needed to present to
    /// `display_handle`.
    pub fn new(
        entry: Arc<Library>,
        display_handle: RawDisplayHandle,
        create_info: InstanceCreateInfo,
    ) -> Result<Arc<Self>, GpuError> {
        let required = ash_window::enumerate_required_extensions(display_handle)?;
        let required = InstanceExtensions::from_iter(
            required
                .iter()
                .map(|&name| unsafe { CStr::from_ptr(name as *const c_char) }),
        );

        let missing = required.difference(&entry.supported_extensions()?);
        if !missing.is_empty() {
            return Err(GpuError::MissingLayerOrExtension(missing.to_string()));
        }

        let mut enabled_layers = Vec::new();
        if create_info.validation {
            if entry.has_layer(VALIDATION_LAYER)? {
                enabled_layers.push(VALIDATION_LAYER.as_ptr());
            } else {
                log::warn!(
                    target: crate::LOG_TARGET,
                    "validation requested but {} is not installed",
                    VALIDATION_LAYER.to_string_lossy()
                );
            }
        }

        let application_name = std::ffi::CString::new(create_info.application_name)
            .unwrap_or_else(|_| c"volkano".to_owned());

        let application_info = vk::ApplicationInfo::default()
            .application_name(&application_name)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(c"Volkano")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(create_info.api_version.to_vk());

        let enabled_extensions = required.iter_c_ptrs().collect::<Vec<_>>();

        let vk_create_info = vk::InstanceCreateInfo::default()
            .application_info(&application_info)
            .enabled_layer_names(&enabled_layers)
            .enabled_extension_names(&enabled_extensions);

        let instance = unsafe { entry.entry.create_instance(&vk_create_info, None) }?;

        log::info!(
            target: crate::LOG_TARGET,
            "created vulkan {} instance with extensions {} ({} layers)",
            create_info.api_version,
            required,
            enabled_layers.len(),
        );

        Ok(Arc::new(Self {
            entry,
            instance: AshDebugWrapper(instance),
            api_version: create_info.api_version,
        }))
    }

    pub fn enumerate_physical_devices(self: &Arc<Self>) -> Result<Vec<Arc<PhysicalDevice>>, GpuError> {
        let physical_devices = unsafe { self.instance.enumerate_physical_devices() }?;

        Ok(physical_devices
            .into_iter()
            .map(|physical_device| PhysicalDevice::from_raw(Arc::clone(self), physical_device))
            .collect())
    }

    /// Returns the library (entry) associated with this instance.
    pub fn library(&self) -> &Arc<Library> {
        &self.entry
    }

    pub fn api_version(&self) -> Version {
        self.api_version
    }
}

impl AshHandle for Instance {
    type Handle = ash::Instance;

    fn ash_handle(&self) -> &Self::Handle {
        &self.instance
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        log::debug!(target: crate::LOG_TARGET, "destroying instance {:?}", self.instance);
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}
