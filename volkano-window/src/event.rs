use winit::event::WindowEvent;

/// What the engine needs to know about the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Quit,
    Resized { width: u32, height: u32 },
    /// The drawable area shrank to nothing.
    Minimized,
    /// The drawable area came back after [`SurfaceEvent::Minimized`].
    Restored { width: u32, height: u32 },
}

/// Turns winit window events into [`SurfaceEvent`]s.
#[derive(Debug, Default)]
pub struct EventTranslator {
    minimized: bool,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&mut self, event: &WindowEvent) -> Option<SurfaceEvent> {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => Some(SurfaceEvent::Quit),
            WindowEvent::Resized(size) => Some(self.resized(size.width, size.height)),
            _ => None,
        }
    }

    fn resized(&mut self, width: u32, height: u32) -> SurfaceEvent {
        if width == 0 || height == 0 {
            self.minimized = true;
            SurfaceEvent::Minimized
        } else if std::mem::take(&mut self.minimized) {
            SurfaceEvent::Restored { width, height }
        } else {
            SurfaceEvent::Resized { width, height }
        }
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }
}
