use volkano_rhi::Extent2D;

/// The window the renderer presents to.
pub trait SurfaceProvider {
    /// The current size of the drawable area in pixels.
    fn drawable_size(&self) -> (u32, u32);

    fn drawable_extent(&self) -> Extent2D {
        Extent2D::from(self.drawable_size())
    }
}

impl<T: SurfaceProvider + ?Sized> SurfaceProvider for &T {
    fn drawable_size(&self) -> (u32, u32) {
        (**self).drawable_size()
    }
}

impl<T: SurfaceProvider + ?Sized> SurfaceProvider for std::sync::Arc<T> {
    fn drawable_size(&self) -> (u32, u32) {
        (**self).drawable_size()
    }
}
