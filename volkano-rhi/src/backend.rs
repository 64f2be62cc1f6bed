//! The GPU seam.
//!
//! Every call the renderer makes goes through [`GpuInstance`] and
//! [`GpuDevice`]. The Vulkan implementation lives in [`crate::vulkan`];
//! tests provide recording mocks.
//!
//! Resources are plain owned values. Dropping one releases it, so owners
//! control destruction order through field order and explicit `drop` calls.

use std::ffi::CStr;

use ash::vk;

use crate::{
    AdapterProperties, DeviceExtensions, Extent2D, GpuError, QueueFamilyProperties, SurfaceInfo,
    buffer::BufferUsage,
    pipeline::{RasterizationState, VertexLayout},
};

pub type Format = vk::Format;
pub type ColorSpace = vk::ColorSpaceKHR;
pub type SurfaceFormat = vk::SurfaceFormatKHR;
pub type PresentMode = vk::PresentModeKHR;
pub type SurfaceTransform = vk::SurfaceTransformFlagsKHR;
pub type PrimitiveTopology = vk::PrimitiveTopology;
pub type PipelineStage = vk::PipelineStageFlags;

/// A wait without an upper bound.
pub const NO_TIMEOUT: u64 = u64::MAX;

pub struct DeviceCreateInfo<'a> {
    /// One queue is created per entry. Entries must be distinct.
    pub queue_family_indices: &'a [u32],
    pub extensions: DeviceExtensions,
}

#[derive(Debug, Clone, Copy)]
pub struct SwapchainCreateInfo {
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: Extent2D,
    pub min_image_count: u32,
    pub pre_transform: SurfaceTransform,
}

pub struct GraphicsPipelineCreateInfo<'a, D: GpuDevice + ?Sized> {
    pub vertex_shader: &'a D::ShaderModule,
    pub fragment_shader: &'a D::ShaderModule,
    pub entry_point: &'a CStr,
    pub vertex_layout: &'a VertexLayout,
    pub topology: PrimitiveTopology,
    pub rasterization: RasterizationState,
    pub layout: &'a D::PipelineLayout,
    pub render_pass: &'a D::RenderPass,
}

pub struct SubmitInfo<'a, D: GpuDevice + ?Sized> {
    pub command_buffer: &'a D::CommandBuffer,
    pub wait_semaphore: &'a D::Semaphore,
    pub wait_stage: PipelineStage,
    pub signal_semaphore: &'a D::Semaphore,
    pub fence: &'a D::Fence,
}

/// An image handed out by the swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquiredImage {
    pub index: u32,
    /// The image is usable, but the swapchain no longer matches the surface.
    pub suboptimal: bool,
}

/// Outcome of a successful present. Out-of-date is reported as
/// [`GpuError::OutOfDate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Optimal,
    Suboptimal,
}

/// Entry point of a backend: adapter enumeration and device creation for
/// the surface the instance was created with.
pub trait GpuInstance {
    type Adapter: Clone;
    type Device: GpuDevice;

    fn enumerate_adapters(&self) -> Result<Vec<Self::Adapter>, GpuError>;

    fn adapter_properties(&self, adapter: &Self::Adapter) -> AdapterProperties;

    fn queue_family_properties(&self, adapter: &Self::Adapter) -> Vec<QueueFamilyProperties>;

    fn supported_device_extensions(&self, adapter: &Self::Adapter) -> DeviceExtensions;

    /// Whether `queue_family_index` can present to the instance's surface.
    fn surface_support(
        &self,
        adapter: &Self::Adapter,
        queue_family_index: u32,
    ) -> Result<bool, GpuError>;

    fn create_device(
        &self,
        adapter: &Self::Adapter,
        create_info: &DeviceCreateInfo<'_>,
    ) -> Result<Self::Device, GpuError>;
}

pub trait GpuDevice {
    type Queue: Clone;
    type Swapchain;
    type Image: Copy;
    type ImageView;
    type Framebuffer;
    type RenderPass;
    type PipelineLayout;
    type Pipeline;
    type ShaderModule;
    type CommandPool;
    type CommandBuffer;
    type Semaphore;
    type Fence;
    type Buffer;

    fn get_queue(&self, queue_family_index: u32) -> Self::Queue;

    fn wait_idle(&self) -> Result<(), GpuError>;

    /// Queries the surface the device presents to.
    fn surface_info(&self) -> Result<SurfaceInfo, GpuError>;

    fn create_swapchain(
        &self,
        create_info: &SwapchainCreateInfo,
        old_swapchain: Option<&Self::Swapchain>,
    ) -> Result<Self::Swapchain, GpuError>;

    /// Returns the images owned by `swapchain`, in presentation index order.
    fn swapchain_images(&self, swapchain: &Self::Swapchain) -> Result<Vec<Self::Image>, GpuError>;

    fn create_image_view(&self, image: Self::Image, format: Format)
    -> Result<Self::ImageView, GpuError>;

    fn create_render_pass(&self, color_format: Format) -> Result<Self::RenderPass, GpuError>;

    fn create_framebuffer(
        &self,
        render_pass: &Self::RenderPass,
        image_view: &Self::ImageView,
        extent: Extent2D,
    ) -> Result<Self::Framebuffer, GpuError>;

    fn create_shader_module(&self, code: &[u32]) -> Result<Self::ShaderModule, GpuError>;

    fn create_pipeline_layout(&self) -> Result<Self::PipelineLayout, GpuError>;

    fn create_graphics_pipeline(
        &self,
        create_info: &GraphicsPipelineCreateInfo<'_, Self>,
    ) -> Result<Self::Pipeline, GpuError>;

    fn create_command_pool(&self, queue_family_index: u32)
    -> Result<Self::CommandPool, GpuError>;

    fn allocate_command_buffer(
        &self,
        pool: &Self::CommandPool,
    ) -> Result<Self::CommandBuffer, GpuError>;

    fn create_semaphore(&self) -> Result<Self::Semaphore, GpuError>;

    fn create_fence(&self, signaled: bool) -> Result<Self::Fence, GpuError>;

    /// Creates a host-visible buffer initialized with `data`.
    fn create_buffer(&self, usage: BufferUsage, data: &[u8]) -> Result<Self::Buffer, GpuError>;

    /// Blocks until `fence` is signaled. Fails with [`GpuError::Timeout`]
    /// after `timeout_ns`.
    fn wait_for_fence(&self, fence: &Self::Fence, timeout_ns: u64) -> Result<(), GpuError>;

    fn reset_fence(&self, fence: &Self::Fence) -> Result<(), GpuError>;

    /// Signals `fence` through an empty submission on `queue`.
    fn signal_fence(&self, queue: &Self::Queue, fence: &Self::Fence) -> Result<(), GpuError>;

    fn acquire_next_image(
        &self,
        swapchain: &Self::Swapchain,
        timeout_ns: u64,
        signal_semaphore: &Self::Semaphore,
    ) -> Result<AcquiredImage, GpuError>;

    fn submit(&self, queue: &Self::Queue, submit_info: &SubmitInfo<'_, Self>)
    -> Result<(), GpuError>;

    fn present(
        &self,
        queue: &Self::Queue,
        swapchain: &Self::Swapchain,
        image_index: u32,
        wait_semaphore: &Self::Semaphore,
    ) -> Result<PresentStatus, GpuError>;

    fn reset_command_buffer(&self, command_buffer: &Self::CommandBuffer) -> Result<(), GpuError>;

    fn begin_command_buffer(&self, command_buffer: &Self::CommandBuffer) -> Result<(), GpuError>;

    fn end_command_buffer(&self, command_buffer: &Self::CommandBuffer) -> Result<(), GpuError>;

    fn cmd_begin_render_pass(
        &self,
        command_buffer: &Self::CommandBuffer,
        render_pass: &Self::RenderPass,
        framebuffer: &Self::Framebuffer,
        extent: Extent2D,
        clear_color: [f32; 4],
    );

    fn cmd_bind_pipeline(&self, command_buffer: &Self::CommandBuffer, pipeline: &Self::Pipeline);

    fn cmd_set_viewport(&self, command_buffer: &Self::CommandBuffer, extent: Extent2D);

    fn cmd_set_scissor(&self, command_buffer: &Self::CommandBuffer, extent: Extent2D);

    fn cmd_bind_vertex_buffer(&self, command_buffer: &Self::CommandBuffer, buffer: &Self::Buffer);

    /// Binds `buffer` as a `u16` index buffer.
    fn cmd_bind_index_buffer(&self, command_buffer: &Self::CommandBuffer, buffer: &Self::Buffer);

    fn cmd_draw(&self, command_buffer: &Self::CommandBuffer, vertex_count: u32);

    fn cmd_draw_indexed(&self, command_buffer: &Self::CommandBuffer, index_count: u32);

    fn cmd_end_render_pass(&self, command_buffer: &Self::CommandBuffer);
}
