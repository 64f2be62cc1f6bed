//! The per-frame acquire, record, submit and present cycle.

use volkano_rhi::{GpuDevice, GpuError, PipelineStage, PresentStatus, SubmitInfo};

use crate::{
    LOG_TARGET,
    device_context::DeviceContext,
    error::{GpuResultExt, RendererError},
    mesh::GpuMesh,
    pipeline_cache::PipelineState,
    presentation::PresentationChain,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Acquiring,
    Recording,
    Submitted,
    Presenting,
    /// The chain must be rebuilt before the next frame.
    Resizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// Presented, but the chain no longer matches the surface.
    PresentedSuboptimal,
    /// Nothing was presented because the chain is out of date.
    OutOfDate,
}

impl FrameOutcome {
    pub fn needs_rebuild(self) -> bool {
        !matches!(self, FrameOutcome::Presented)
    }
}

/// Semaphores and fence guarding the single frame in flight.
pub struct FrameSync<D: GpuDevice> {
    in_flight: D::Fence,
    render_finished: D::Semaphore,
    image_available: D::Semaphore,
}

impl<D: GpuDevice> FrameSync<D> {
    pub fn new(device: &D) -> Result<Self, RendererError> {
        let image_available = device
            .create_semaphore()
            .context("create image-available semaphore")?;
        let render_finished = device
            .create_semaphore()
            .context("create render-finished semaphore")?;
        // Signaled so the first frame does not wait forever.
        let in_flight = device
            .create_fence(true)
            .context("create in-flight fence")?;

        Ok(Self {
            in_flight,
            render_finished,
            image_available,
        })
    }
}

/// Everything a frame reads but does not own.
pub struct FrameResources<'a, D: GpuDevice> {
    pub context: &'a DeviceContext<D>,
    pub chain: &'a PresentationChain<D>,
    pub pipeline: &'a PipelineState<D>,
    pub mesh: Option<&'a GpuMesh<D>>,
}

pub struct FrameExecutor<D: GpuDevice> {
    sync: FrameSync<D>,
    command_buffer: D::CommandBuffer,
    command_pool: D::CommandPool,
    state: FrameState,
    clear_color: [f32; 4],
    timeout_ns: u64,
    frame_index: u64,
}

impl<D: GpuDevice> FrameExecutor<D> {
    pub fn new(
        context: &DeviceContext<D>,
        clear_color: [f32; 4],
        timeout_ns: u64,
    ) -> Result<Self, RendererError> {
        let device = &context.device;
        let command_pool = device
            .create_command_pool(context.graphics_family)
            .context("create command pool")?;
        let command_buffer = device
            .allocate_command_buffer(&command_pool)
            .context("allocate command buffer")?;
        let sync = FrameSync::new(device)?;

        Ok(Self {
            sync,
            command_buffer,
            command_pool,
            state: FrameState::Idle,
            clear_color,
            timeout_ns,
            frame_index: 0,
        })
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Marks the chain as rebuilt after [`FrameState::Resizing`].
    pub fn resized(&mut self) {
        if self.state == FrameState::Resizing {
            self.state = FrameState::Idle;
        }
    }

    /// Runs one frame.
    pub fn execute(&mut self, resources: FrameResources<'_, D>) -> Result<FrameOutcome, RendererError> {
        let device = &resources.context.device;
        let swapchain = resources.chain.swapchain().ok_or_else(|| {
            RendererError::invariant("execute frame", "presentation chain has no swapchain")
        })?;

        device
            .wait_for_fence(&self.sync.in_flight, self.timeout_ns)
            .context("wait for in-flight fence")?;
        device
            .reset_fence(&self.sync.in_flight)
            .context("reset in-flight fence")?;

        self.state = FrameState::Acquiring;
        let acquired = match device.acquire_next_image(
            swapchain,
            self.timeout_ns,
            &self.sync.image_available,
        ) {
            Ok(acquired) => acquired,
            Err(GpuError::OutOfDate) => {
                // Nothing will be submitted this tick, so the fence has to be
                // signaled by hand.
                device
                    .signal_fence(&resources.context.graphics_queue, &self.sync.in_flight)
                    .context("re-signal in-flight fence")?;
                self.state = FrameState::Resizing;
                log::debug!(target: LOG_TARGET, "swapchain out of date on acquire");
                return Ok(FrameOutcome::OutOfDate);
            }
            Err(error) => return Err(RendererError::from_gpu("acquire next image", error)),
        };

        self.state = FrameState::Recording;
        self.record(&resources, acquired.index)?;

        self.state = FrameState::Submitted;
        device
            .submit(
                &resources.context.graphics_queue,
                &SubmitInfo {
                    command_buffer: &self.command_buffer,
                    wait_semaphore: &self.sync.image_available,
                    wait_stage: PipelineStage::COLOR_ATTACHMENT_OUTPUT,
                    signal_semaphore: &self.sync.render_finished,
                    fence: &self.sync.in_flight,
                },
            )
            .context("submit frame")?;

        self.state = FrameState::Presenting;
        let outcome = match device.present(
            &resources.context.present_queue,
            swapchain,
            acquired.index,
            &self.sync.render_finished,
        ) {
            Ok(PresentStatus::Optimal) if !acquired.suboptimal => FrameOutcome::Presented,
            Ok(_) => FrameOutcome::PresentedSuboptimal,
            Err(GpuError::OutOfDate) => FrameOutcome::OutOfDate,
            Err(error) => return Err(RendererError::from_gpu("present", error)),
        };

        self.frame_index += 1;
        self.state = if outcome.needs_rebuild() {
            log::debug!(target: LOG_TARGET, "frame {} ended with {outcome:?}", self.frame_index);
            FrameState::Resizing
        } else {
            FrameState::Idle
        };

        Ok(outcome)
    }

    fn record(&self, resources: &FrameResources<'_, D>, image_index: u32) -> Result<(), RendererError> {
        let device = &resources.context.device;
        let command_buffer = &self.command_buffer;
        let extent = resources.chain.extent();

        let framebuffer = resources.chain.framebuffer(image_index).ok_or_else(|| {
            RendererError::invariant(
                "record frame",
                format!("no framebuffer for swapchain image {image_index}"),
            )
        })?;

        device
            .reset_command_buffer(command_buffer)
            .context("reset command buffer")?;
        device
            .begin_command_buffer(command_buffer)
            .context("begin command buffer")?;

        device.cmd_begin_render_pass(
            command_buffer,
            resources.pipeline.render_pass(),
            framebuffer,
            extent,
            self.clear_color,
        );
        device.cmd_bind_pipeline(command_buffer, resources.pipeline.pipeline());
        device.cmd_set_viewport(command_buffer, extent);
        device.cmd_set_scissor(command_buffer, extent);

        if let Some(mesh) = resources.mesh {
            mesh.record_draw(device, command_buffer);
        }

        device.cmd_end_render_pass(command_buffer);
        device
            .end_command_buffer(command_buffer)
            .context("end command buffer")
    }
}
