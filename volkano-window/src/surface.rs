use std::sync::Arc;

use volkano_render::SurfaceProvider;
use winit::window::Window;

/// A winit window as the renderer's drawable surface.
#[derive(Debug, Clone)]
pub struct WindowSurface(pub Arc<Window>);

impl SurfaceProvider for WindowSurface {
    fn drawable_size(&self) -> (u32, u32) {
        let size = self.0.inner_size();
        (size.width, size.height)
    }
}
