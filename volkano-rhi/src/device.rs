use std::sync::Arc;

use ash::vk;
use smallvec::SmallVec;

use crate::{
    AshDebugWrapper, AshHandle, GpuError, VkHandle, extension_set, physical::PhysicalDevice,
};

extension_set! {
    pub struct DeviceExtensions {
        khr_swapchain => ash::khr::swapchain::NAME,
    }
}

impl DeviceExtensions {
    /// The extensions a presenting renderer cannot work without.
    pub const fn required() -> Self {
        Self {
            khr_swapchain: true,
        }
    }
}

pub struct Device {
    physical_device: Arc<PhysicalDevice>,
    device: AshDebugWrapper<ash::Device>,
    swapchain_loader: ash::khr::swapchain::Device,
}

impl AshHandle for Device {
    type Handle = ash::Device;

    fn ash_handle(&self) -> &Self::Handle {
        &self.device
    }
}

impl Device {
    /// Creates a logical device with one queue in each of the given
    /// (distinct) queue families.
    pub fn new(
        physical_device: Arc<PhysicalDevice>,
        queue_family_indices: &[u32],
        extensions: DeviceExtensions,
    ) -> Result<Arc<Self>, GpuError> {
        let missing = extensions.difference(physical_device.extensions());
        if !missing.is_empty() {
            return Err(GpuError::MissingLayerOrExtension(missing.to_string()));
        }

        let queue_priorities = [1.0];
        let queue_create_infos = queue_family_indices
            .iter()
            .map(|&queue_family_index| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(queue_family_index)
                    .queue_priorities(&queue_priorities)
            })
            .collect::<SmallVec<[_; 4]>>();

        let enabled_extension_names = extensions.iter_c_ptrs().collect::<Vec<_>>();

        let vk_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&enabled_extension_names);

        let instance = physical_device.instance();
        let device = unsafe {
            instance
                .ash_handle()
                .create_device(physical_device.vk_handle(), &vk_create_info, None)
        }?;

        let swapchain_loader = ash::khr::swapchain::Device::new(instance.ash_handle(), &device);

        log::info!(
            target: crate::LOG_TARGET,
            "created logical device on {} with queue families {:?}",
            physical_device.properties().name,
            queue_family_indices,
        );

        Ok(Arc::new(Self {
            physical_device,
            device: AshDebugWrapper(device),
            swapchain_loader,
        }))
    }

    /// Returns the physical device associated with the device.
    pub fn physical_device(&self) -> &Arc<PhysicalDevice> {
        &self.physical_device
    }

    pub fn swapchain_loader(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain_loader
    }

    pub fn queue(&self, queue_family_index: u32) -> vk::Queue {
        unsafe { self.device.get_device_queue(queue_family_index, 0) }
    }

    pub fn wait_idle(&self) -> Result<(), GpuError> {
        unsafe { self.device.device_wait_idle() }?;
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        log::debug!(target: crate::LOG_TARGET, "destroying device {:?}", self.device);
        unsafe {
            self.device.destroy_device(None);
        }
    }
}
