use std::sync::Arc;

use volkano_fs::Fs;
use volkano_rhi::{Extent2D, GpuDevice, GpuInstance};

use crate::{
    LOG_TARGET,
    config::RendererConfig,
    device_context::{DeviceContext, select_and_initialize},
    error::{GpuResultExt, RendererError},
    frame::{FrameExecutor, FrameResources, FrameState},
    mesh::{GpuMesh, Mesh},
    pipeline_cache::PipelineState,
    presentation::{PresentationChain, RebuildOutcome},
    surface::SurfaceProvider,
};

/// What the application loop drives every tick.
pub trait Renderer {
    fn initialize(&mut self) -> Result<(), RendererError>;

    /// Called after the window was resized.
    fn on_window_resize(&mut self) -> Result<(), RendererError>;

    /// Produces one frame.
    fn render(&mut self) -> Result<(), RendererError>;
}

/// A renderer that draws nothing.
#[derive(Debug, Default)]
pub struct NullRenderer {
    initialized: bool,
    frames: u64,
    resizes: u64,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn resizes(&self) -> u64 {
        self.resizes
    }
}

impl Renderer for NullRenderer {
    fn initialize(&mut self) -> Result<(), RendererError> {
        log::info!(target: LOG_TARGET, "initialized null renderer");
        self.initialized = true;
        Ok(())
    }

    fn on_window_resize(&mut self) -> Result<(), RendererError> {
        if !self.initialized {
            return Err(RendererError::NotInitialized);
        }
        self.resizes += 1;
        Ok(())
    }

    fn render(&mut self) -> Result<(), RendererError> {
        if !self.initialized {
            return Err(RendererError::NotInitialized);
        }
        self.frames += 1;
        Ok(())
    }
}

/// Everything created by [`GpuRenderer::initialize`], declared in
/// destruction order.
struct GpuState<D: GpuDevice> {
    mesh: Option<GpuMesh<D>>,
    frame: FrameExecutor<D>,
    chain: PresentationChain<D>,
    pipeline: PipelineState<D>,
    context: DeviceContext<D>,
}

impl<D: GpuDevice> GpuState<D> {
    fn rebuild(&mut self, drawable: Extent2D) -> Result<RebuildOutcome, RendererError> {
        let outcome = self.chain.rebuild(
            &self.context.device,
            self.pipeline.render_pass(),
            self.pipeline.color_format(),
            drawable,
        )?;

        if outcome == RebuildOutcome::Rebuilt {
            self.frame.resized();
        }

        Ok(outcome)
    }
}

/// The GPU renderer: device context, presentation chain, pipeline and frame
/// executor over a [`GpuInstance`].
pub struct GpuRenderer<I: GpuInstance, S: SurfaceProvider> {
    state: Option<GpuState<I::Device>>,
    instance: I,
    surface: S,
    fs: Arc<dyn Fs>,
    config: RendererConfig,
}

impl<I: GpuInstance, S: SurfaceProvider> GpuRenderer<I, S> {
    pub fn new(instance: I, surface: S, fs: Arc<dyn Fs>, config: RendererConfig) -> Self {
        Self {
            state: None,
            instance,
            surface,
            fs,
            config,
        }
    }

    /// Uploads `mesh` and draws it every frame from now on, replacing the
    /// previous mesh.
    pub fn upload_mesh(&mut self, mesh: &Mesh) -> Result<(), RendererError> {
        let state = self.state.as_mut().ok_or(RendererError::NotInitialized)?;
        let gpu_mesh = GpuMesh::upload(&state.context.device, mesh)?;

        if state.mesh.is_some() {
            // The previous buffers may still be read by the frame in flight.
            state
                .context
                .device
                .wait_idle()
                .context("wait for device idle")?;
        }

        log::debug!(
            target: LOG_TARGET,
            "uploaded mesh with {} vertices and {} indices",
            gpu_mesh.vertex_count(),
            gpu_mesh.index_count(),
        );
        state.mesh = Some(gpu_mesh);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn device_context(&self) -> Option<&DeviceContext<I::Device>> {
        self.state.as_ref().map(|state| &state.context)
    }

    pub fn presentation_chain(&self) -> Option<&PresentationChain<I::Device>> {
        self.state.as_ref().map(|state| &state.chain)
    }

    pub fn frame_state(&self) -> Option<FrameState> {
        self.state.as_ref().map(|state| state.frame.state())
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }
}

impl<I: GpuInstance, S: SurfaceProvider> Renderer for GpuRenderer<I, S> {
    fn initialize(&mut self) -> Result<(), RendererError> {
        if self.state.is_some() {
            log::warn!(target: LOG_TARGET, "renderer is already initialized");
            return Ok(());
        }

        let context = select_and_initialize(&self.instance)?;
        let device = &context.device;

        let mut chain = PresentationChain::new(
            device,
            self.surface.drawable_extent(),
            self.config.prefer_mailbox,
        )?;
        let pipeline = PipelineState::build(
            device,
            &*self.fs,
            &self.config,
            chain.surface_format().format,
        )?;
        chain.create_framebuffers(device, pipeline.render_pass())?;

        let frame = FrameExecutor::new(
            &context,
            self.config.clear_color,
            self.config.frame_timeout_ns(),
        )?;

        log::info!(
            target: LOG_TARGET,
            "renderer initialized on {} ({} swapchain images at {})",
            context.properties.name,
            chain.image_count(),
            chain.extent(),
        );

        self.state = Some(GpuState {
            mesh: None,
            frame,
            chain,
            pipeline,
            context,
        });

        Ok(())
    }

    fn on_window_resize(&mut self) -> Result<(), RendererError> {
        let drawable = self.surface.drawable_extent();
        let state = self.state.as_mut().ok_or(RendererError::NotInitialized)?;

        state.rebuild(drawable)?;
        Ok(())
    }

    fn render(&mut self) -> Result<(), RendererError> {
        let drawable = self.surface.drawable_extent();
        let state = self.state.as_mut().ok_or(RendererError::NotInitialized)?;

        if state.chain.is_stale() && state.rebuild(drawable)? == RebuildOutcome::Deferred {
            return Ok(());
        }

        let outcome = state.frame.execute(FrameResources {
            context: &state.context,
            chain: &state.chain,
            pipeline: &state.pipeline,
            mesh: state.mesh.as_ref(),
        })?;

        if outcome.needs_rebuild() {
            state.chain.mark_stale();
            state.rebuild(drawable)?;
        }

        Ok(())
    }
}

impl<I: GpuInstance, S: SurfaceProvider> Drop for GpuRenderer<I, S> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            if let Err(error) = state.context.device.wait_idle() {
                log::error!(target: LOG_TARGET, "failed to wait for the device before teardown: {error}");
            }

            drop(state);
            log::info!(target: LOG_TARGET, "released gpu resources");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_renderer_requires_initialize() {
        let mut renderer = NullRenderer::new();
        assert!(matches!(renderer.render(), Err(RendererError::NotInitialized)));
        assert!(matches!(
            renderer.on_window_resize(),
            Err(RendererError::NotInitialized)
        ));

        renderer.initialize().unwrap();
        renderer.render().unwrap();
        renderer.render().unwrap();
        renderer.on_window_resize().unwrap();

        assert_eq!(renderer.frames(), 2);
        assert_eq!(renderer.resizes(), 1);
    }

    #[test]
    fn test_null_renderer_is_a_boxed_renderer() {
        let mut renderer: Box<dyn Renderer> = Box::new(NullRenderer::new());
        renderer.initialize().unwrap();
        renderer.render().unwrap();
    }
}
