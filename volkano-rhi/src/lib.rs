//! Thin RAII wrappers over ash, and the [`GpuInstance`]/[`GpuDevice`] seam
//! the renderer is written against.

pub mod adapter;
pub mod backend;
pub mod buffer;
pub mod command;
pub mod device;
pub mod error;
pub mod extent;
pub mod framebuffer;
pub mod handle;
pub mod image_view;
pub mod instance;
pub mod memory;
pub mod physical;
pub mod pipeline;
pub mod render_pass;
pub mod surface;
pub mod swapchain;
pub mod sync;
pub mod version;
pub mod vulkan;

mod macros;

pub use adapter::{AdapterProperties, AdapterType, QueueFamilyProperties, QueueFlags};
pub use backend::*;
pub use buffer::BufferUsage;
pub use device::DeviceExtensions;
pub use error::{ErrorClass, GpuError};
pub use extent::Extent2D;
pub use handle::{AshDebugWrapper, AshHandle, DebugWrapper, VkHandle};
pub use pipeline::{RasterizationState, VertexAttribute, VertexLayout};
pub use surface::{SurfaceCapabilities, SurfaceInfo};
pub use version::Version;
pub use vulkan::{VulkanDevice, VulkanInstance};

pub const LOG_TARGET: &str = "vulkan";
