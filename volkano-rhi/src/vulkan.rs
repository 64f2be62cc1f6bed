//! The ash-backed implementation of [`GpuInstance`] and [`GpuDevice`].

use std::sync::Arc;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::{
    AcquiredImage, AdapterProperties, AshHandle, DeviceCreateInfo, DeviceExtensions, Extent2D,
    Format, GpuDevice, GpuError, GpuInstance, GraphicsPipelineCreateInfo, PresentStatus,
    QueueFamilyProperties, SubmitInfo, SurfaceInfo, SwapchainCreateInfo, Version, VkHandle,
    buffer::{Buffer, BufferUsage},
    command::{CommandBuffer, CommandPool},
    device::Device,
    framebuffer::Framebuffer,
    image_view::ImageView,
    instance::{Instance, InstanceCreateInfo, Library},
    memory::MemoryAllocator,
    physical::PhysicalDevice,
    pipeline::{GraphicsPipeline, PipelineLayout, ShaderModule},
    render_pass::RenderPass,
    surface::Surface,
    swapchain::Swapchain,
    sync::{Fence, Semaphore},
};

/// A Vulkan instance bound to the surface of one window.
pub struct VulkanInstance {
    surface: Arc<Surface>,
    instance: Arc<Instance>,
}

impl VulkanInstance {
    pub fn new(
        window: &(impl HasWindowHandle + HasDisplayHandle),
        application_name: &str,
        validation: bool,
    ) -> Result<Self, GpuError> {
        let library = Library::new()?;
        let instance = Instance::new(
            library,
            window.display_handle()?.as_raw(),
            InstanceCreateInfo {
                application_name: application_name.to_owned(),
                api_version: Version::V1_0,
                validation,
            },
        )?;
        let surface = Surface::new(Arc::clone(&instance), window)?;

        Ok(Self { surface, instance })
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }
}

impl GpuInstance for VulkanInstance {
    type Adapter = Arc<PhysicalDevice>;
    type Device = VulkanDevice;

    fn enumerate_adapters(&self) -> Result<Vec<Self::Adapter>, GpuError> {
        self.instance.enumerate_physical_devices()
    }

    fn adapter_properties(&self, adapter: &Self::Adapter) -> AdapterProperties {
        adapter.properties().clone()
    }

    fn queue_family_properties(&self, adapter: &Self::Adapter) -> Vec<QueueFamilyProperties> {
        adapter.queue_families().to_vec()
    }

    fn supported_device_extensions(&self, adapter: &Self::Adapter) -> DeviceExtensions {
        *adapter.extensions()
    }

    fn surface_support(
        &self,
        adapter: &Self::Adapter,
        queue_family_index: u32,
    ) -> Result<bool, GpuError> {
        self.surface.supports_queue_family(adapter, queue_family_index)
    }

    fn create_device(
        &self,
        adapter: &Self::Adapter,
        create_info: &DeviceCreateInfo<'_>,
    ) -> Result<Self::Device, GpuError> {
        let device = Device::new(
            Arc::clone(adapter),
            create_info.queue_family_indices,
            create_info.extensions,
        )?;
        let allocator = MemoryAllocator::new(Arc::clone(&device))?;

        Ok(VulkanDevice {
            allocator,
            surface: Arc::clone(&self.surface),
            device,
        })
    }
}

#[derive(Clone)]
pub struct Queue {
    queue: crate::DebugWrapper<vk::Queue>,
}

impl VkHandle for Queue {
    type Handle = vk::Queue;

    fn vk_handle(&self) -> Self::Handle {
        self.queue.0
    }
}

pub struct VulkanDevice {
    allocator: Arc<MemoryAllocator>,
    surface: Arc<Surface>,
    device: Arc<Device>,
}

impl VulkanDevice {
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl GpuDevice for VulkanDevice {
    type Queue = Queue;
    type Swapchain = Swapchain;
    type Image = vk::Image;
    type ImageView = ImageView;
    type Framebuffer = Framebuffer;
    type RenderPass = RenderPass;
    type PipelineLayout = PipelineLayout;
    type Pipeline = GraphicsPipeline;
    type ShaderModule = ShaderModule;
    type CommandPool = CommandPool;
    type CommandBuffer = CommandBuffer;
    type Semaphore = Semaphore;
    type Fence = Fence;
    type Buffer = Buffer;

    fn get_queue(&self, queue_family_index: u32) -> Self::Queue {
        Queue {
            queue: crate::DebugWrapper(self.device.queue(queue_family_index)),
        }
    }

    fn wait_idle(&self) -> Result<(), GpuError> {
        self.device.wait_idle()
    }

    fn surface_info(&self) -> Result<SurfaceInfo, GpuError> {
        self.surface.info(self.device.physical_device())
    }

    fn create_swapchain(
        &self,
        create_info: &SwapchainCreateInfo,
        old_swapchain: Option<&Self::Swapchain>,
    ) -> Result<Self::Swapchain, GpuError> {
        Swapchain::new(
            Arc::clone(&self.device),
            Arc::clone(&self.surface),
            create_info,
            old_swapchain,
        )
    }

    fn swapchain_images(&self, swapchain: &Self::Swapchain) -> Result<Vec<Self::Image>, GpuError> {
        swapchain.images()
    }

    fn create_image_view(
        &self,
        image: Self::Image,
        format: Format,
    ) -> Result<Self::ImageView, GpuError> {
        ImageView::new(Arc::clone(&self.device), image, format)
    }

    fn create_render_pass(&self, color_format: Format) -> Result<Self::RenderPass, GpuError> {
        RenderPass::new(Arc::clone(&self.device), color_format)
    }

    fn create_framebuffer(
        &self,
        render_pass: &Self::RenderPass,
        image_view: &Self::ImageView,
        extent: Extent2D,
    ) -> Result<Self::Framebuffer, GpuError> {
        Framebuffer::new(Arc::clone(&self.device), render_pass, image_view, extent)
    }

    fn create_shader_module(&self, code: &[u32]) -> Result<Self::ShaderModule, GpuError> {
        ShaderModule::new(Arc::clone(&self.device), code)
    }

    fn create_pipeline_layout(&self) -> Result<Self::PipelineLayout, GpuError> {
        PipelineLayout::empty(Arc::clone(&self.device))
    }

    fn create_graphics_pipeline(
        &self,
        create_info: &GraphicsPipelineCreateInfo<'_, Self>,
    ) -> Result<Self::Pipeline, GpuError> {
        GraphicsPipeline::new(Arc::clone(&self.device), create_info)
    }

    fn create_command_pool(
        &self,
        queue_family_index: u32,
    ) -> Result<Self::CommandPool, GpuError> {
        CommandPool::new(Arc::clone(&self.device), queue_family_index)
    }

    fn allocate_command_buffer(
        &self,
        pool: &Self::CommandPool,
    ) -> Result<Self::CommandBuffer, GpuError> {
        pool.allocate()
    }

    fn create_semaphore(&self) -> Result<Self::Semaphore, GpuError> {
        Semaphore::new(Arc::clone(&self.device))
    }

    fn create_fence(&self, signaled: bool) -> Result<Self::Fence, GpuError> {
        Fence::new(Arc::clone(&self.device), signaled)
    }

    fn create_buffer(&self, usage: BufferUsage, data: &[u8]) -> Result<Self::Buffer, GpuError> {
        Buffer::with_data(&self.allocator, usage, data)
    }

    fn wait_for_fence(&self, fence: &Self::Fence, timeout_ns: u64) -> Result<(), GpuError> {
        fence.wait(timeout_ns)
    }

    fn reset_fence(&self, fence: &Self::Fence) -> Result<(), GpuError> {
        fence.reset()
    }

    fn signal_fence(&self, queue: &Self::Queue, fence: &Self::Fence) -> Result<(), GpuError> {
        unsafe {
            self.device
                .ash_handle()
                .queue_submit(queue.vk_handle(), &[], fence.vk_handle())
        }?;
        Ok(())
    }

    fn acquire_next_image(
        &self,
        swapchain: &Self::Swapchain,
        timeout_ns: u64,
        signal_semaphore: &Self::Semaphore,
    ) -> Result<AcquiredImage, GpuError> {
        swapchain.acquire_next_image(timeout_ns, signal_semaphore)
    }

    fn submit(
        &self,
        queue: &Self::Queue,
        submit_info: &SubmitInfo<'_, Self>,
    ) -> Result<(), GpuError> {
        let command_buffers = [submit_info.command_buffer.vk_handle()];
        let wait_semaphores = [submit_info.wait_semaphore.vk_handle()];
        let wait_stages = [submit_info.wait_stage];
        let signal_semaphores = [submit_info.signal_semaphore.vk_handle()];

        let vk_submit_info = vk::SubmitInfo::default()
            .command_buffers(&command_buffers)
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device.ash_handle().queue_submit(
                queue.vk_handle(),
                &[vk_submit_info],
                submit_info.fence.vk_handle(),
            )
        }?;
        Ok(())
    }

    fn present(
        &self,
        queue: &Self::Queue,
        swapchain: &Self::Swapchain,
        image_index: u32,
        wait_semaphore: &Self::Semaphore,
    ) -> Result<PresentStatus, GpuError> {
        swapchain.present(queue.vk_handle(), image_index, wait_semaphore)
    }

    fn reset_command_buffer(&self, command_buffer: &Self::CommandBuffer) -> Result<(), GpuError> {
        command_buffer.reset()
    }

    fn begin_command_buffer(&self, command_buffer: &Self::CommandBuffer) -> Result<(), GpuError> {
        command_buffer.begin()
    }

    fn end_command_buffer(&self, command_buffer: &Self::CommandBuffer) -> Result<(), GpuError> {
        command_buffer.end()
    }

    fn cmd_begin_render_pass(
        &self,
        command_buffer: &Self::CommandBuffer,
        render_pass: &Self::RenderPass,
        framebuffer: &Self::Framebuffer,
        extent: Extent2D,
        clear_color: [f32; 4],
    ) {
        command_buffer.begin_render_pass(render_pass, framebuffer, extent, clear_color);
    }

    fn cmd_bind_pipeline(&self, command_buffer: &Self::CommandBuffer, pipeline: &Self::Pipeline) {
        command_buffer.bind_pipeline(pipeline);
    }

    fn cmd_set_viewport(&self, command_buffer: &Self::CommandBuffer, extent: Extent2D) {
        command_buffer.set_viewport(extent);
    }

    fn cmd_set_scissor(&self, command_buffer: &Self::CommandBuffer, extent: Extent2D) {
        command_buffer.set_scissor(extent);
    }

    fn cmd_bind_vertex_buffer(&self, command_buffer: &Self::CommandBuffer, buffer: &Self::Buffer) {
        command_buffer.bind_vertex_buffer(buffer);
    }

    fn cmd_bind_index_buffer(&self, command_buffer: &Self::CommandBuffer, buffer: &Self::Buffer) {
        command_buffer.bind_index_buffer(buffer, vk::IndexType::UINT16);
    }

    fn cmd_draw(&self, command_buffer: &Self::CommandBuffer, vertex_count: u32) {
        command_buffer.draw(vertex_count);
    }

    fn cmd_draw_indexed(&self, command_buffer: &Self::CommandBuffer, index_count: u32) {
        command_buffer.draw_indexed(index_count);
    }

    fn cmd_end_render_pass(&self, command_buffer: &Self::CommandBuffer) {
        command_buffer.end_render_pass();
    }
}
