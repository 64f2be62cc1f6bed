use std::sync::Arc;

use ash::vk;

use crate::{AshHandle, DebugWrapper, GpuError, VkHandle, device::Device};

pub struct Fence {
    device: Arc<Device>,
    fence: DebugWrapper<vk::Fence>,
}

impl Fence {
    /// Creates a new fence, optionally in the signaled state.
    pub fn new(device: Arc<Device>, signaled: bool) -> Result<Self, GpuError> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe { device.ash_handle().create_fence(&create_info, None) }?;

        Ok(Self {
            device,
            fence: DebugWrapper(fence),
        })
    }

    /// Blocks until the fence signals. Expiry of `timeout` (in nanoseconds)
    /// is reported as [`GpuError::Timeout`].
    pub fn wait(&self, timeout: u64) -> Result<(), GpuError> {
        unsafe {
            self.device
                .ash_handle()
                .wait_for_fences(&[self.fence.0], true, timeout)
        }?;

        Ok(())
    }

    /// Puts the fence back into the unsignaled state.
    pub fn reset(&self) -> Result<(), GpuError> {
        unsafe { self.device.ash_handle().reset_fences(&[self.fence.0]) }?;
        Ok(())
    }
}

impl VkHandle for Fence {
    type Handle = vk::Fence;

    fn vk_handle(&self) -> Self::Handle {
        self.fence.0
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.ash_handle().destroy_fence(self.fence.0, None);
        }
    }
}

pub struct Semaphore {
    device: Arc<Device>,
    semaphore: DebugWrapper<vk::Semaphore>,
}

impl Semaphore {
    pub fn new(device: Arc<Device>) -> Result<Self, GpuError> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe { device.ash_handle().create_semaphore(&create_info, None) }?;

        Ok(Self {
            device,
            semaphore: DebugWrapper(semaphore),
        })
    }
}

impl VkHandle for Semaphore {
    type Handle = vk::Semaphore;

    fn vk_handle(&self) -> Self::Handle {
        self.semaphore.0
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device
                .ash_handle()
                .destroy_semaphore(self.semaphore.0, None);
        }
    }
}
