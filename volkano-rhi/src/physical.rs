use std::{cell::OnceCell, sync::Arc};

use ash::vk;
use smallvec::SmallVec;

use crate::{
    AdapterProperties, AdapterType, AshHandle, DeviceExtensions, QueueFamilyProperties, QueueFlags,
    Version, VkHandle, instance::Instance,
};

/// A physical GPU. Properties are queried lazily and cached.
pub struct PhysicalDevice {
    instance: Arc<Instance>,
    physical_device: vk::PhysicalDevice,
    properties: OnceCell<AdapterProperties>,
    queue_families: OnceCell<SmallVec<[QueueFamilyProperties; 8]>>,
    extensions: OnceCell<DeviceExtensions>,
}

impl VkHandle for PhysicalDevice {
    type Handle = vk::PhysicalDevice;

    fn vk_handle(&self) -> Self::Handle {
        self.physical_device
    }
}

impl std::fmt::Debug for PhysicalDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDevice")
            .field("handle", &crate::DebugWrapper(self.physical_device))
            .field("name", &self.properties().name)
            .finish()
    }
}

impl PhysicalDevice {
    pub fn from_raw(instance: Arc<Instance>, physical_device: vk::PhysicalDevice) -> Arc<Self> {
        Arc::new(Self {
            instance,
            physical_device,
            properties: Default::default(),
            queue_families: Default::default(),
            extensions: Default::default(),
        })
    }

    pub fn properties(&self) -> &AdapterProperties {
        self.properties.get_or_init(|| {
            let properties = unsafe {
                self.instance
                    .ash_handle()
                    .get_physical_device_properties(self.physical_device)
            };

            let name = properties
                .device_name_as_c_str()
                .ok()
                .map(std::ffi::CStr::to_string_lossy)
                .map(|s| s.to_string())
                .unwrap_or_else(|| "<unknown>".into());

            AdapterProperties {
                api_version: Version::from_vk(properties.api_version),
                driver_version: Version::from_vk(properties.driver_version),
                vendor_id: properties.vendor_id,
                device_id: properties.device_id,
                adapter_type: AdapterType::from_vk(properties.device_type)
                    .unwrap_or(AdapterType::Other),
                name,
            }
        })
    }

    pub fn queue_families(&self) -> &[QueueFamilyProperties] {
        self.queue_families.get_or_init(|| {
            let families = unsafe {
                self.instance
                    .ash_handle()
                    .get_physical_device_queue_family_properties(self.physical_device)
            };

            families
                .into_iter()
                .map(|family| {
                    QueueFamilyProperties::new(
                        QueueFlags::from_vk(family.queue_flags),
                        family.queue_count,
                    )
                })
                .collect()
        })
    }

    /// Returns the extensions supported by the physical device.
    pub fn extensions(&self) -> &DeviceExtensions {
        self.extensions.get_or_init(|| {
            let properties = unsafe {
                self.instance
                    .ash_handle()
                    .enumerate_device_extension_properties(self.physical_device)
                    .unwrap_or_default()
            };

            let extension_names = properties
                .iter()
                .filter_map(|extension| extension.extension_name_as_c_str().ok());

            DeviceExtensions::from_iter(extension_names)
        })
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }
}
