use std::sync::Arc;

use ash::vk;

use crate::{
    AshHandle, DebugWrapper, GpuError, VkHandle,
    device::Device,
    memory::{MemoryAllocation, MemoryAllocator, MemoryLocation},
    vk_flags,
};

vk_flags! {
    pub struct BufferUsage: vk::BufferUsageFlags {
        TRANSFER_SRC => TRANSFER_SRC,
        TRANSFER_DST => TRANSFER_DST,
        VERTEX_BUFFER => VERTEX_BUFFER,
        INDEX_BUFFER => INDEX_BUFFER,
    }
}

pub struct Buffer {
    // The buffer handle is destroyed in `drop`, before the memory is freed.
    device: Arc<Device>,
    buffer: DebugWrapper<vk::Buffer>,
    memory: MemoryAllocation,
    size: u64,
}

impl Buffer {
    /// Creates a host-visible buffer and fills it with `data`.
    pub fn with_data(
        allocator: &Arc<MemoryAllocator>,
        usage: BufferUsage,
        data: &[u8],
    ) -> Result<Self, GpuError> {
        let device = Arc::clone(allocator.device());
        let size = data.len() as u64;

        let create_info = vk::BufferCreateInfo::default()
            .size(size)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .usage(usage.to_vk());

        let buffer = unsafe { device.ash_handle().create_buffer(&create_info, None) }?;

        let memory_requirements =
            unsafe { device.ash_handle().get_buffer_memory_requirements(buffer) };

        let bound = allocator
            .allocate("buffer", memory_requirements, MemoryLocation::CpuToGpu)
            .and_then(|mut memory| {
                memory.write(data)?;
                unsafe {
                    device
                        .ash_handle()
                        .bind_buffer_memory(buffer, memory.memory(), memory.offset())
                }?;
                Ok(memory)
            });

        let memory = match bound {
            Ok(memory) => memory,
            Err(error) => {
                unsafe { device.ash_handle().destroy_buffer(buffer, None) };
                return Err(error);
            }
        };

        Ok(Self {
            device,
            buffer: DebugWrapper(buffer),
            memory,
            size,
        })
    }

    /// Returns the size of the buffer in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn memory(&self) -> &MemoryAllocation {
        &self.memory
    }
}

impl VkHandle for Buffer {
    type Handle = vk::Buffer;

    fn vk_handle(&self) -> Self::Handle {
        self.buffer.0
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.ash_handle().destroy_buffer(self.buffer.0, None);
        }
    }
}
