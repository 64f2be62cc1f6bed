use volkano_render::{Renderer, RendererError};
use volkano_rhi::GpuError;

use crate::{LOG_TARGET, config::ConfigError, event::SurfaceEvent};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("renderer error: {0}")]
    Renderer(#[from] RendererError),
    #[error("gpu error: {0}")]
    Gpu(#[from] GpuError),
    #[error("failed to create the window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Drives an initialized renderer from window events.
pub struct Engine {
    renderer: Box<dyn Renderer>,
    running: bool,
    paused: bool,
    frames: u64,
}

impl Engine {
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self {
            renderer,
            running: true,
            paused: false,
            frames: 0,
        }
    }

    pub fn handle(&mut self, event: SurfaceEvent) -> Result<(), EngineError> {
        match event {
            SurfaceEvent::Quit => {
                log::info!(target: LOG_TARGET, "quit requested after {} frames", self.frames);
                self.running = false;
            }
            SurfaceEvent::Minimized => {
                log::debug!(target: LOG_TARGET, "window minimized, pausing");
                self.paused = true;
            }
            SurfaceEvent::Restored { width, height } => {
                log::debug!(target: LOG_TARGET, "window restored at {width}x{height}");
                self.paused = false;
                self.resize()?;
            }
            SurfaceEvent::Resized { width, height } => {
                log::debug!(target: LOG_TARGET, "window resized to {width}x{height}");
                self.resize()?;
            }
        }

        Ok(())
    }

    fn resize(&mut self) -> Result<(), EngineError> {
        self.guard(|renderer| renderer.on_window_resize())
    }

    /// Renders a frame unless the engine is paused or stopped. Returns whether
    /// a frame was rendered.
    pub fn tick(&mut self) -> Result<bool, EngineError> {
        if !self.should_render() {
            return Ok(false);
        }

        self.guard(|renderer| renderer.render())?;
        self.frames += 1;
        Ok(true)
    }

    /// Runs `f`, absorbing recoverable renderer errors and stopping the engine
    /// on fatal ones.
    fn guard(
        &mut self,
        f: impl FnOnce(&mut dyn Renderer) -> Result<(), RendererError>,
    ) -> Result<(), EngineError> {
        match f(self.renderer.as_mut()) {
            Ok(()) => Ok(()),
            Err(error) if error.is_recoverable() => {
                log::warn!(target: LOG_TARGET, "{error}");
                Ok(())
            }
            Err(error) => {
                log::error!(target: LOG_TARGET, "stopping: {error}");
                self.running = false;
                Err(error.into())
            }
        }
    }

    pub fn should_render(&self) -> bool {
        self.running && !self.paused
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
