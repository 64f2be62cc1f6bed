//! Access to the raw handles behind the RAII wrappers.

use std::ops::Deref;

use ash::vk::Handle;

/// Implemented by wrappers that own a raw Vulkan handle.
pub trait VkHandle {
    type Handle: Handle;

    fn vk_handle(&self) -> Self::Handle;
}

impl VkHandle for ash::Instance {
    type Handle = ash::vk::Instance;

    fn vk_handle(&self) -> Self::Handle {
        self.handle()
    }
}

impl VkHandle for ash::Device {
    type Handle = ash::vk::Device;

    fn vk_handle(&self) -> Self::Handle {
        self.handle()
    }
}

/// Implemented by wrappers around an ash dispatch table (`ash::Instance`,
/// `ash::Device`).
pub trait AshHandle {
    type Handle: VkHandle;

    fn ash_handle(&self) -> &Self::Handle;
}

fn write_raw(f: &mut std::fmt::Formatter<'_>, raw: u64) -> std::fmt::Result {
    write!(f, "{raw:#x}")
}

/// A raw handle that prints as its address.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DebugWrapper<T: Handle>(pub T);

impl<T: Handle> Deref for DebugWrapper<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Handle + Copy> std::fmt::Debug for DebugWrapper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_raw(f, self.0.as_raw())
    }
}

/// An ash dispatch table that prints as the address of its handle.
pub struct AshDebugWrapper<T: VkHandle>(pub T);

impl<T: VkHandle> Deref for AshDebugWrapper<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: VkHandle> std::fmt::Debug for AshDebugWrapper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_raw(f, self.0.vk_handle().as_raw())
    }
}
