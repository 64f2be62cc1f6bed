use std::sync::Arc;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::{
    AshHandle, DebugWrapper, Extent2D, GpuError, VkHandle,
    backend::{PresentMode, SurfaceFormat, SurfaceTransform},
    instance::Instance,
    physical::PhysicalDevice,
};

/// Capabilities of a surface for a given adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// Zero means there is no upper bound.
    pub max_image_count: u32,
    /// `None` when the surface lets the swapchain decide its extent.
    pub current_extent: Option<Extent2D>,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
    pub current_transform: SurfaceTransform,
}

impl SurfaceCapabilities {
    pub fn from_vk(capabilities: &vk::SurfaceCapabilitiesKHR) -> Self {
        let current_extent = (capabilities.current_extent.width != u32::MAX)
            .then(|| Extent2D::from_vk(capabilities.current_extent));

        Self {
            min_image_count: capabilities.min_image_count,
            max_image_count: capabilities.max_image_count,
            current_extent,
            min_image_extent: Extent2D::from_vk(capabilities.min_image_extent),
            max_image_extent: Extent2D::from_vk(capabilities.max_image_extent),
            current_transform: capabilities.current_transform,
        }
    }
}

/// A fresh snapshot of what the surface supports.
#[derive(Debug, Clone)]
pub struct SurfaceInfo {
    pub capabilities: SurfaceCapabilities,
    pub formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,
}

pub struct Surface {
    instance: Arc<Instance>,
    surface: DebugWrapper<vk::SurfaceKHR>,
    surface_loader: ash::khr::surface::Instance,
}

impl Surface {
    /// Creates a new surface from anything exposing raw window handles.
    pub fn new(
        instance: Arc<Instance>,
        window: &(impl HasWindowHandle + HasDisplayHandle),
    ) -> Result<Arc<Self>, GpuError> {
        let library = instance.library();
        let surface_loader =
            ash::khr::surface::Instance::new(&library.entry, instance.ash_handle());

        let surface = unsafe {
            ash_window::create_surface(
                &library.entry,
                instance.ash_handle(),
                window.display_handle()?.as_raw(),
                window.window_handle()?.as_raw(),
                None,
            )
        }?;

        log::debug!(target: crate::LOG_TARGET, "created surface {:?}", DebugWrapper(surface));

        Ok(Arc::new(Self {
            instance,
            surface: DebugWrapper(surface),
            surface_loader,
        }))
    }

    pub fn info(&self, physical_device: &PhysicalDevice) -> Result<SurfaceInfo, GpuError> {
        let vk_physical_device = physical_device.vk_handle();

        let capabilities = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(vk_physical_device, self.surface.0)
        }?;

        let formats = unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(vk_physical_device, self.surface.0)
        }?;

        let present_modes = unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(vk_physical_device, self.surface.0)
        }?;

        Ok(SurfaceInfo {
            capabilities: SurfaceCapabilities::from_vk(&capabilities),
            formats,
            present_modes,
        })
    }

    /// Checks if a queue family supports presentation to this surface.
    pub fn supports_queue_family(
        &self,
        physical_device: &PhysicalDevice,
        queue_family_index: u32,
    ) -> Result<bool, GpuError> {
        let supported = unsafe {
            self.surface_loader.get_physical_device_surface_support(
                physical_device.vk_handle(),
                queue_family_index,
                self.surface.0,
            )
        }?;

        Ok(supported)
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }
}

impl VkHandle for Surface {
    type Handle = vk::SurfaceKHR;

    fn vk_handle(&self) -> Self::Handle {
        self.surface.0
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        log::debug!(target: crate::LOG_TARGET, "destroying surface {:?}", self.surface);
        unsafe {
            self.surface_loader.destroy_surface(self.surface.0, None);
        }
    }
}
