//! A recording GPU backend for end-to-end renderer tests.
#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    sync::Arc,
};

use ash::vk;
use volkano_fs::MemoryFs;
use volkano_render::{GpuRenderer, RendererConfig, SurfaceProvider};
use volkano_rhi::{
    AcquiredImage, AdapterProperties, AdapterType, BufferUsage, DeviceCreateInfo,
    DeviceExtensions, Extent2D, Format, GpuDevice, GpuError, GpuInstance,
    GraphicsPipelineCreateInfo, PresentStatus, QueueFamilyProperties, QueueFlags, SubmitInfo,
    SurfaceCapabilities, SurfaceInfo, SwapchainCreateInfo, Version,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Device,
    Swapchain,
    ImageView,
    Framebuffer,
    RenderPass,
    PipelineLayout,
    Pipeline,
    ShaderModule,
    CommandPool,
    CommandBuffer,
    Semaphore,
    Fence,
    Buffer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateDevice { families: Vec<u32> },
    GetQueue(u32),
    WaitIdle,
    SurfaceInfo,
    Create(Kind, u32),
    CreateSwapchain {
        id: u32,
        extent: Extent2D,
        old: Option<u32>,
        min_image_count: u32,
    },
    CreateSwapchainFailed { old: Option<u32> },
    CreateFramebuffer { id: u32, extent: Extent2D },
    CreateBuffer { id: u32, usage: BufferUsage, size: usize },
    WaitForFence,
    ResetFence,
    SignalFence,
    Acquire,
    Submit,
    Present,
    ResetCommandBuffer,
    BeginCommandBuffer,
    EndCommandBuffer,
    BeginRenderPass { extent: Extent2D, clear_color: [f32; 4] },
    BindPipeline,
    SetViewport(Extent2D),
    SetScissor(Extent2D),
    BindVertexBuffer(u32),
    BindIndexBuffer(u32),
    Draw(u32),
    DrawIndexed(u32),
    EndRenderPass,
    Destroy(Kind, u32),
}

/// Everything the mock records, and the failures it is told to inject.
pub struct MockState {
    pub calls: Vec<Call>,
    pub surface: SurfaceInfo,
    pub acquire_errors: VecDeque<GpuError>,
    pub swapchain_errors: VecDeque<GpuError>,
    pub present_results: VecDeque<Result<PresentStatus, GpuError>>,
    pub fence_error: Option<GpuError>,
    next_id: u32,
    next_image: u32,
}

impl MockState {
    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn created(&self, kind: Kind) -> usize {
        self.calls
            .iter()
            .filter(|call| match call {
                Call::Create(created, _) => *created == kind,
                Call::CreateSwapchain { .. } => kind == Kind::Swapchain,
                Call::CreateFramebuffer { .. } => kind == Kind::Framebuffer,
                Call::CreateBuffer { .. } => kind == Kind::Buffer,
                _ => false,
            })
            .count()
    }

    pub fn destroyed(&self, kind: Kind) -> usize {
        self.count(|call| matches!(call, Call::Destroy(destroyed, _) if *destroyed == kind))
    }

    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(predicate)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

pub type Shared = Rc<RefCell<MockState>>;

/// A resource that records its own destruction.
pub struct Resource {
    kind: Kind,
    id: u32,
    state: Shared,
}

impl Resource {
    fn new(state: &Shared, kind: Kind) -> Self {
        let id = state.borrow_mut().allocate_id();
        state.borrow_mut().calls.push(Call::Create(kind, id));
        Self::with_id(state, kind, id)
    }

    fn with_id(state: &Shared, kind: Kind, id: u32) -> Self {
        Self {
            kind,
            id,
            state: state.clone(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for Resource {
    fn drop(&mut self) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::Destroy(self.kind, self.id));
    }
}

pub struct MockSwapchain {
    resource: Resource,
    image_count: u32,
}

#[derive(Debug, Clone)]
pub struct MockAdapter {
    pub properties: AdapterProperties,
    pub families: Vec<QueueFamilyProperties>,
    pub present_support: Vec<bool>,
    pub extensions: DeviceExtensions,
}

impl MockAdapter {
    pub fn new(name: &str, adapter_type: AdapterType) -> Self {
        Self {
            properties: AdapterProperties {
                api_version: Version::V1_3,
                driver_version: Version::new(1, 0, 0),
                vendor_id: 0,
                device_id: 0,
                adapter_type,
                name: name.to_string(),
            },
            families: vec![QueueFamilyProperties::new(
                QueueFlags::GRAPHICS | QueueFlags::COMPUTE | QueueFlags::TRANSFER,
                1,
            )],
            present_support: vec![true],
            extensions: DeviceExtensions::required(),
        }
    }

    pub fn discrete() -> Self {
        Self::new("discrete", AdapterType::DiscreteGpu)
    }
}

pub struct MockInstance {
    pub adapters: Vec<MockAdapter>,
    state: Shared,
}

impl MockInstance {
    pub fn new(adapters: Vec<MockAdapter>) -> (Self, Shared) {
        let state = Rc::new(RefCell::new(MockState {
            calls: Vec::new(),
            surface: default_surface(),
            acquire_errors: VecDeque::new(),
            swapchain_errors: VecDeque::new(),
            present_results: VecDeque::new(),
            fence_error: None,
            next_id: 0,
            next_image: 0,
        }));

        let instance = Self {
            adapters,
            state: state.clone(),
        };
        (instance, state)
    }
}

fn default_surface() -> SurfaceInfo {
    SurfaceInfo {
        capabilities: SurfaceCapabilities {
            min_image_count: 2,
            max_image_count: 3,
            current_extent: Some(Extent2D::new(800, 600)),
            min_image_extent: Extent2D::new(1, 1),
            max_image_extent: Extent2D::new(4096, 4096),
            current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
        },
        formats: vec![vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }],
        present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
    }
}

impl GpuInstance for MockInstance {
    type Adapter = MockAdapter;
    type Device = MockDevice;

    fn enumerate_adapters(&self) -> Result<Vec<Self::Adapter>, GpuError> {
        Ok(self.adapters.clone())
    }

    fn adapter_properties(&self, adapter: &Self::Adapter) -> AdapterProperties {
        adapter.properties.clone()
    }

    fn queue_family_properties(&self, adapter: &Self::Adapter) -> Vec<QueueFamilyProperties> {
        adapter.families.clone()
    }

    fn supported_device_extensions(&self, adapter: &Self::Adapter) -> DeviceExtensions {
        adapter.extensions
    }

    fn surface_support(
        &self,
        adapter: &Self::Adapter,
        queue_family_index: u32,
    ) -> Result<bool, GpuError> {
        Ok(adapter
            .present_support
            .get(queue_family_index as usize)
            .copied()
            .unwrap_or(false))
    }

    fn create_device(
        &self,
        _adapter: &Self::Adapter,
        create_info: &DeviceCreateInfo<'_>,
    ) -> Result<Self::Device, GpuError> {
        self.state.borrow_mut().calls.push(Call::CreateDevice {
            families: create_info.queue_family_indices.to_vec(),
        });

        Ok(MockDevice {
            state: self.state.clone(),
        })
    }
}

pub struct MockDevice {
    state: Shared,
}

impl MockDevice {
    fn push(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.push(Call::Destroy(Kind::Device, 0));
    }
}

impl GpuDevice for MockDevice {
    type Queue = u32;
    type Swapchain = MockSwapchain;
    type Image = u32;
    type ImageView = Resource;
    type Framebuffer = Resource;
    type RenderPass = Resource;
    type PipelineLayout = Resource;
    type Pipeline = Resource;
    type ShaderModule = Resource;
    type CommandPool = Resource;
    type CommandBuffer = Resource;
    type Semaphore = Resource;
    type Fence = Resource;
    type Buffer = Resource;

    fn get_queue(&self, queue_family_index: u32) -> Self::Queue {
        self.push(Call::GetQueue(queue_family_index));
        queue_family_index
    }

    fn wait_idle(&self) -> Result<(), GpuError> {
        self.push(Call::WaitIdle);
        Ok(())
    }

    fn surface_info(&self) -> Result<SurfaceInfo, GpuError> {
        self.push(Call::SurfaceInfo);
        Ok(self.state.borrow().surface.clone())
    }

    fn create_swapchain(
        &self,
        create_info: &SwapchainCreateInfo,
        old_swapchain: Option<&Self::Swapchain>,
    ) -> Result<Self::Swapchain, GpuError> {
        let old = old_swapchain.map(|swapchain| swapchain.resource.id);
        let injected = self.state.borrow_mut().swapchain_errors.pop_front();
        if let Some(error) = injected {
            self.push(Call::CreateSwapchainFailed { old });
            return Err(error);
        }

        let id = self.state.borrow_mut().allocate_id();
        self.push(Call::CreateSwapchain {
            id,
            extent: create_info.extent,
            old,
            min_image_count: create_info.min_image_count,
        });

        Ok(MockSwapchain {
            resource: Resource::with_id(&self.state, Kind::Swapchain, id),
            image_count: create_info.min_image_count,
        })
    }

    fn swapchain_images(&self, swapchain: &Self::Swapchain) -> Result<Vec<Self::Image>, GpuError> {
        Ok((0..swapchain.image_count).collect())
    }

    fn create_image_view(
        &self,
        _image: Self::Image,
        _format: Format,
    ) -> Result<Self::ImageView, GpuError> {
        Ok(Resource::new(&self.state, Kind::ImageView))
    }

    fn create_render_pass(&self, _color_format: Format) -> Result<Self::RenderPass, GpuError> {
        Ok(Resource::new(&self.state, Kind::RenderPass))
    }

    fn create_framebuffer(
        &self,
        _render_pass: &Self::RenderPass,
        _image_view: &Self::ImageView,
        extent: Extent2D,
    ) -> Result<Self::Framebuffer, GpuError> {
        let id = self.state.borrow_mut().allocate_id();
        self.push(Call::CreateFramebuffer { id, extent });
        Ok(Resource::with_id(&self.state, Kind::Framebuffer, id))
    }

    fn create_shader_module(&self, _code: &[u32]) -> Result<Self::ShaderModule, GpuError> {
        Ok(Resource::new(&self.state, Kind::ShaderModule))
    }

    fn create_pipeline_layout(&self) -> Result<Self::PipelineLayout, GpuError> {
        Ok(Resource::new(&self.state, Kind::PipelineLayout))
    }

    fn create_graphics_pipeline(
        &self,
        _create_info: &GraphicsPipelineCreateInfo<'_, Self>,
    ) -> Result<Self::Pipeline, GpuError> {
        Ok(Resource::new(&self.state, Kind::Pipeline))
    }

    fn create_command_pool(&self, _queue_family_index: u32) -> Result<Self::CommandPool, GpuError> {
        Ok(Resource::new(&self.state, Kind::CommandPool))
    }

    fn allocate_command_buffer(
        &self,
        _pool: &Self::CommandPool,
    ) -> Result<Self::CommandBuffer, GpuError> {
        Ok(Resource::new(&self.state, Kind::CommandBuffer))
    }

    fn create_semaphore(&self) -> Result<Self::Semaphore, GpuError> {
        Ok(Resource::new(&self.state, Kind::Semaphore))
    }

    fn create_fence(&self, _signaled: bool) -> Result<Self::Fence, GpuError> {
        Ok(Resource::new(&self.state, Kind::Fence))
    }

    fn create_buffer(&self, usage: BufferUsage, data: &[u8]) -> Result<Self::Buffer, GpuError> {
        let id = self.state.borrow_mut().allocate_id();
        self.push(Call::CreateBuffer {
            id,
            usage,
            size: data.len(),
        });
        Ok(Resource::with_id(&self.state, Kind::Buffer, id))
    }

    fn wait_for_fence(&self, _fence: &Self::Fence, _timeout_ns: u64) -> Result<(), GpuError> {
        self.push(Call::WaitForFence);
        match self.state.borrow().fence_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn reset_fence(&self, _fence: &Self::Fence) -> Result<(), GpuError> {
        self.push(Call::ResetFence);
        Ok(())
    }

    fn signal_fence(&self, _queue: &Self::Queue, _fence: &Self::Fence) -> Result<(), GpuError> {
        self.push(Call::SignalFence);
        Ok(())
    }

    fn acquire_next_image(
        &self,
        swapchain: &Self::Swapchain,
        _timeout_ns: u64,
        _signal_semaphore: &Self::Semaphore,
    ) -> Result<AcquiredImage, GpuError> {
        self.push(Call::Acquire);

        let mut state = self.state.borrow_mut();
        if let Some(error) = state.acquire_errors.pop_front() {
            return Err(error);
        }

        let index = state.next_image % swapchain.image_count;
        state.next_image += 1;
        Ok(AcquiredImage {
            index,
            suboptimal: false,
        })
    }

    fn submit(
        &self,
        _queue: &Self::Queue,
        _submit_info: &SubmitInfo<'_, Self>,
    ) -> Result<(), GpuError> {
        self.push(Call::Submit);
        Ok(())
    }

    fn present(
        &self,
        _queue: &Self::Queue,
        _swapchain: &Self::Swapchain,
        _image_index: u32,
        _wait_semaphore: &Self::Semaphore,
    ) -> Result<PresentStatus, GpuError> {
        self.push(Call::Present);
        self.state
            .borrow_mut()
            .present_results
            .pop_front()
            .unwrap_or(Ok(PresentStatus::Optimal))
    }

    fn reset_command_buffer(&self, _command_buffer: &Self::CommandBuffer) -> Result<(), GpuError> {
        self.push(Call::ResetCommandBuffer);
        Ok(())
    }

    fn begin_command_buffer(&self, _command_buffer: &Self::CommandBuffer) -> Result<(), GpuError> {
        self.push(Call::BeginCommandBuffer);
        Ok(())
    }

    fn end_command_buffer(&self, _command_buffer: &Self::CommandBuffer) -> Result<(), GpuError> {
        self.push(Call::EndCommandBuffer);
        Ok(())
    }

    fn cmd_begin_render_pass(
        &self,
        _command_buffer: &Self::CommandBuffer,
        _render_pass: &Self::RenderPass,
        _framebuffer: &Self::Framebuffer,
        extent: Extent2D,
        clear_color: [f32; 4],
    ) {
        self.push(Call::BeginRenderPass {
            extent,
            clear_color,
        });
    }

    fn cmd_bind_pipeline(&self, _command_buffer: &Self::CommandBuffer, _pipeline: &Self::Pipeline) {
        self.push(Call::BindPipeline);
    }

    fn cmd_set_viewport(&self, _command_buffer: &Self::CommandBuffer, extent: Extent2D) {
        self.push(Call::SetViewport(extent));
    }

    fn cmd_set_scissor(&self, _command_buffer: &Self::CommandBuffer, extent: Extent2D) {
        self.push(Call::SetScissor(extent));
    }

    fn cmd_bind_vertex_buffer(&self, _command_buffer: &Self::CommandBuffer, buffer: &Self::Buffer) {
        self.push(Call::BindVertexBuffer(buffer.id));
    }

    fn cmd_bind_index_buffer(&self, _command_buffer: &Self::CommandBuffer, buffer: &Self::Buffer) {
        self.push(Call::BindIndexBuffer(buffer.id));
    }

    fn cmd_draw(&self, _command_buffer: &Self::CommandBuffer, vertex_count: u32) {
        self.push(Call::Draw(vertex_count));
    }

    fn cmd_draw_indexed(&self, _command_buffer: &Self::CommandBuffer, index_count: u32) {
        self.push(Call::DrawIndexed(index_count));
    }

    fn cmd_end_render_pass(&self, _command_buffer: &Self::CommandBuffer) {
        self.push(Call::EndRenderPass);
    }
}

/// A window whose drawable size tests can change.
#[derive(Debug, Clone)]
pub struct MockWindow {
    size: Rc<Cell<(u32, u32)>>,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Rc::new(Cell::new((width, height))),
        }
    }
}

impl SurfaceProvider for MockWindow {
    fn drawable_size(&self) -> (u32, u32) {
        self.size.get()
    }
}

/// Resizes both the window and the surface's current extent.
pub fn resize(state: &Shared, window: &MockWindow, width: u32, height: u32) {
    window.size.set((width, height));
    state.borrow_mut().surface.capabilities.current_extent = Some(Extent2D::new(width, height));
}

/// A SPIR-V module consisting of just a header.
pub fn spirv_stub() -> Vec<u8> {
    [0x0723_0203u32, 0x0001_0000, 0, 1, 0]
        .iter()
        .flat_map(|word| word.to_le_bytes())
        .collect()
}

pub fn shader_fs(config: &RendererConfig) -> Arc<MemoryFs> {
    Arc::new(
        MemoryFs::new()
            .with_file(config.vertex_shader.clone(), spirv_stub())
            .with_file(config.fragment_shader.clone(), spirv_stub()),
    )
}

pub type MockRenderer = GpuRenderer<MockInstance, MockWindow>;

/// Builds an uninitialized renderer over the given adapters.
pub fn renderer_with(adapters: Vec<MockAdapter>) -> (MockRenderer, Shared, MockWindow) {
    let (instance, state) = MockInstance::new(adapters);
    let window = MockWindow::new(800, 600);
    let config = RendererConfig::default();
    let fs = shader_fs(&config);
    let renderer = GpuRenderer::new(instance, window.clone(), fs, config);
    (renderer, state, window)
}

/// Builds and initializes a renderer over one discrete adapter.
pub fn initialized_renderer() -> (MockRenderer, Shared, MockWindow) {
    use volkano_render::Renderer;

    let (mut renderer, state, window) = renderer_with(vec![MockAdapter::discrete()]);
    renderer.initialize().unwrap();
    (renderer, state, window)
}
