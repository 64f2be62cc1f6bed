use std::sync::Arc;

use volkano_fs::Fs;
use volkano_render::{Backend, GpuRenderer, Mesh, NullRenderer, Renderer};
use volkano_rhi::VulkanInstance;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    LOG_TARGET,
    config::EngineConfig,
    engine::{Engine, EngineError},
    event::EventTranslator,
    surface::WindowSurface,
};

/// The engine and the window it presents to. The engine owns the surface,
/// so it goes first.
struct RunnerState {
    engine: Engine,
    window: Arc<Window>,
}

/// The winit application driving the [`Engine`].
struct Runner {
    state: Option<RunnerState>,
    config: EngineConfig,
    fs: Arc<dyn Fs>,
    translator: EventTranslator,
    error: Option<EngineError>,
}

impl Runner {
    fn new(config: EngineConfig, fs: Arc<dyn Fs>) -> Self {
        Self {
            state: None,
            config,
            fs,
            translator: EventTranslator::new(),
            error: None,
        }
    }

    fn create_state(&self, event_loop: &ActiveEventLoop) -> Result<RunnerState, EngineError> {
        let window = Arc::new(event_loop.create_window(self.config.window.window_attributes())?);
        log::info!(target: LOG_TARGET, "created window {:?}", self.config.window.title);

        let renderer = self.create_renderer(&window)?;
        Ok(RunnerState {
            engine: Engine::new(renderer),
            window,
        })
    }

    fn create_renderer(&self, window: &Arc<Window>) -> Result<Box<dyn Renderer>, EngineError> {
        let config = &self.config.renderer;

        match config.backend {
            Backend::Vulkan => {
                let instance =
                    VulkanInstance::new(&**window, &self.config.window.title, config.validation)?;
                let mut renderer = GpuRenderer::new(
                    instance,
                    WindowSurface(window.clone()),
                    self.fs.clone(),
                    config.clone(),
                );
                renderer.initialize()?;
                renderer.upload_mesh(&Mesh::triangle())?;
                Ok(Box::new(renderer))
            }
            Backend::Null => {
                let mut renderer = NullRenderer::new();
                renderer.initialize()?;
                Ok(Box::new(renderer))
            }
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: EngineError) {
        log::error!(target: LOG_TARGET, "{error}");
        self.error.get_or_insert(error);
        // Release the renderer while the window is still alive.
        self.state = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for Runner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.create_state(event_loop) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(error) => self.fail(event_loop, error),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let result = match &event {
            WindowEvent::RedrawRequested => state.engine.tick().map(|_| ()),
            _ => match self.translator.translate(&event) {
                Some(surface_event) => state.engine.handle(surface_event),
                None => Ok(()),
            },
        };

        if let Err(error) = result {
            self.fail(event_loop, error);
            return;
        }

        if !state.engine.is_running() {
            self.state = None;
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            if state.engine.should_render() {
                state.window.request_redraw();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.state = None;
    }
}

/// Opens the window and runs the engine until the window closes or the
/// renderer fails.
pub fn run(config: EngineConfig, fs: Arc<dyn Fs>) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().map_err(EngineError::from)?;
    let mut runner = Runner::new(config, fs);

    event_loop.run_app(&mut runner).map_err(EngineError::from)?;

    match runner.error.take() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
