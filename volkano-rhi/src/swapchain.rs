use std::sync::Arc;

use ash::vk;

use crate::{
    AcquiredImage, DebugWrapper, Extent2D, GpuError, PresentStatus,
    SwapchainCreateInfo, VkHandle, device::Device, surface::Surface, sync::Semaphore,
};

pub struct Swapchain {
    device: Arc<Device>,
    surface: Arc<Surface>,
    swapchain: DebugWrapper<vk::SwapchainKHR>,
    format: vk::Format,
    extent: Extent2D,
}

impl Swapchain {
    /// Creates a swapchain for `surface`. When `old_swapchain` is given it is
    /// retired by the new one, but stays alive until the caller drops it.
    pub fn new(
        device: Arc<Device>,
        surface: Arc<Surface>,
        create_info: &SwapchainCreateInfo,
        old_swapchain: Option<&Swapchain>,
    ) -> Result<Self, GpuError> {
        let old_swapchain = old_swapchain
            .map(|swapchain| swapchain.swapchain.0)
            .unwrap_or(vk::SwapchainKHR::null());

        let vk_create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.vk_handle())
            .min_image_count(create_info.min_image_count)
            .image_format(create_info.surface_format.format)
            .image_color_space(create_info.surface_format.color_space)
            .image_extent(create_info.extent.to_vk())
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(create_info.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(create_info.present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe {
            device
                .swapchain_loader()
                .create_swapchain(&vk_create_info, None)
        }?;

        log::debug!(
            target: crate::LOG_TARGET,
            "created swapchain {:?} ({}, {:?}, {:?}, {} images min)",
            DebugWrapper(swapchain),
            create_info.extent,
            create_info.surface_format.format,
            create_info.present_mode,
            create_info.min_image_count,
        );

        Ok(Self {
            device,
            surface,
            swapchain: DebugWrapper(swapchain),
            format: create_info.surface_format.format,
            extent: create_info.extent,
        })
    }

    pub fn images(&self) -> Result<Vec<vk::Image>, GpuError> {
        let images = unsafe {
            self.device
                .swapchain_loader()
                .get_swapchain_images(self.swapchain.0)
        }?;

        Ok(images)
    }

    /// Acquires the next image, signaling `semaphore` once it is ready.
    pub fn acquire_next_image(
        &self,
        timeout: u64,
        semaphore: &Semaphore,
    ) -> Result<AcquiredImage, GpuError> {
        let (index, suboptimal) = unsafe {
            self.device.swapchain_loader().acquire_next_image(
                self.swapchain.0,
                timeout,
                semaphore.vk_handle(),
                vk::Fence::null(),
            )
        }?;

        Ok(AcquiredImage { index, suboptimal })
    }

    /// Presents an image to the surface.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: &Semaphore,
    ) -> Result<PresentStatus, GpuError> {
        let swapchains = [self.swapchain.0];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore.vk_handle()];
        let present_info = vk::PresentInfoKHR::default()
            .swapchains(&swapchains)
            .image_indices(&image_indices)
            .wait_semaphores(&wait_semaphores);

        let suboptimal = unsafe {
            self.device
                .swapchain_loader()
                .queue_present(queue, &present_info)
        }?;

        Ok(if suboptimal {
            PresentStatus::Suboptimal
        } else {
            PresentStatus::Optimal
        })
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn surface(&self) -> &Arc<Surface> {
        &self.surface
    }
}

impl VkHandle for Swapchain {
    type Handle = vk::SwapchainKHR;

    fn vk_handle(&self) -> Self::Handle {
        self.swapchain.0
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        log::debug!(target: crate::LOG_TARGET, "destroying swapchain {:?}", self.swapchain);
        unsafe {
            self.device
                .swapchain_loader()
                .destroy_swapchain(self.swapchain.0, None);
        }
    }
}
