use crate::{Version, vk_enum, vk_flags};

vk_enum! {
    pub enum AdapterType: ash::vk::PhysicalDeviceType {
        DiscreteGpu => DISCRETE_GPU,
        IntegratedGpu => INTEGRATED_GPU,
        VirtualGpu => VIRTUAL_GPU,
        Cpu => CPU,
        Other => OTHER,
    }
}

vk_flags! {
    pub struct QueueFlags: ash::vk::QueueFlags {
        GRAPHICS => GRAPHICS,
        COMPUTE => COMPUTE,
        TRANSFER => TRANSFER,
    }
}

/// Cached, immutable properties of a physical GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProperties {
    pub api_version: Version,
    pub driver_version: Version,
    pub vendor_id: u32,
    pub device_id: u32,
    pub adapter_type: AdapterType,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueFamilyProperties {
    pub queue_flags: QueueFlags,
    pub queue_count: u32,
}

impl QueueFamilyProperties {
    pub const fn new(queue_flags: QueueFlags, queue_count: u32) -> Self {
        Self {
            queue_flags,
            queue_count,
        }
    }

    /// Whether the family can run transfer commands. Graphics and compute
    /// families implicitly can, even when they do not advertise it.
    pub const fn supports_transfer(&self) -> bool {
        self.queue_flags.intersects(QueueFlags::TRANSFER)
            || self.queue_flags.intersects(QueueFlags::GRAPHICS)
            || self.queue_flags.intersects(QueueFlags::COMPUTE)
    }
}
