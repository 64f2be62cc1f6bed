use std::sync::{Arc, Mutex, PoisonError};

use ash::vk;

use crate::{AshHandle, GpuError, VkHandle, device::Device};

/// Memory location for buffer allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryLocation {
    /// GPU-only memory (fast, not accessible from CPU)
    GpuOnly,
    /// CPU to GPU memory (host-visible, can be written from CPU)
    CpuToGpu,
}

impl MemoryLocation {
    const fn to_gpu_allocator(self) -> gpu_allocator::MemoryLocation {
        match self {
            MemoryLocation::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
            MemoryLocation::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
        }
    }
}

pub struct MemoryAllocator {
    allocator: Mutex<gpu_allocator::vulkan::Allocator>,
    // Declared last so the allocator is dropped while the device is alive.
    device: Arc<Device>,
}

impl MemoryAllocator {
    pub fn new(device: Arc<Device>) -> Result<Arc<Self>, GpuError> {
        let physical_device = device.physical_device();

        let create_desc = gpu_allocator::vulkan::AllocatorCreateDesc {
            instance: physical_device.instance().ash_handle().clone(),
            device: device.ash_handle().clone(),
            physical_device: physical_device.vk_handle(),
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        };

        let allocator = gpu_allocator::vulkan::Allocator::new(&create_desc)?;

        Ok(Arc::new(Self {
            allocator: Mutex::new(allocator),
            device,
        }))
    }

    pub fn allocate(
        self: &Arc<Self>,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: MemoryLocation,
    ) -> Result<MemoryAllocation, GpuError> {
        let allocation_desc = gpu_allocator::vulkan::AllocationCreateDesc {
            name,
            requirements,
            location: location.to_gpu_allocator(),
            linear: true,
            allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
        };

        let allocation = self
            .allocator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .allocate(&allocation_desc)?;

        Ok(MemoryAllocation {
            allocator: Arc::clone(self),
            allocation: Some(allocation),
        })
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

/// A block of device memory, returned to its allocator on drop.
pub struct MemoryAllocation {
    allocator: Arc<MemoryAllocator>,
    allocation: Option<gpu_allocator::vulkan::Allocation>,
}

impl MemoryAllocation {
    /// Returns the device memory backing this allocation.
    ///
    /// # Safety
    /// The returned memory object should only be used to bind buffers to it.
    /// The allocation must not be freed while a bound resource is in use.
    pub unsafe fn memory(&self) -> vk::DeviceMemory {
        self.allocation
            .as_ref()
            .map(|allocation| unsafe { allocation.memory() })
            .unwrap_or(vk::DeviceMemory::null())
    }

    pub fn offset(&self) -> u64 {
        self.allocation
            .as_ref()
            .map(gpu_allocator::vulkan::Allocation::offset)
            .unwrap_or(0)
    }

    /// Copies `data` to the start of a host-visible allocation.
    pub fn write(&mut self, data: &[u8]) -> Result<(), GpuError> {
        let mapped = self
            .allocation
            .as_mut()
            .and_then(gpu_allocator::vulkan::Allocation::mapped_slice_mut)
            .ok_or_else(|| GpuError::Allocation("allocation is not host visible".into()))?;

        let target = mapped.get_mut(..data.len()).ok_or_else(|| {
            GpuError::Allocation(format!(
                "write of {} bytes exceeds the allocation",
                data.len()
            ))
        })?;
        target.copy_from_slice(data);
        Ok(())
    }
}

impl Drop for MemoryAllocation {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            let result = self
                .allocator
                .allocator
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .free(allocation);

            if let Err(error) = result {
                log::error!(target: crate::LOG_TARGET, "failed to free allocation: {error}");
            }
        }
    }
}
