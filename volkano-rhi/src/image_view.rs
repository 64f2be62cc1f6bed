use std::sync::Arc;

use ash::vk;

use crate::{AshHandle, DebugWrapper, GpuError, VkHandle, device::Device};

/// A 2D color view over a single-mip, single-layer image.
pub struct ImageView {
    device: Arc<Device>,
    image_view: DebugWrapper<vk::ImageView>,
}

impl ImageView {
    pub fn new(device: Arc<Device>, image: vk::Image, format: vk::Format) -> Result<Self, GpuError> {
        let subresource_range = vk::ImageSubresourceRange::default()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .base_mip_level(0)
            .level_count(1)
            .base_array_layer(0)
            .layer_count(1);

        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping::default())
            .subresource_range(subresource_range);

        let image_view = unsafe { device.ash_handle().create_image_view(&create_info, None) }?;

        Ok(Self {
            device,
            image_view: DebugWrapper(image_view),
        })
    }
}

impl VkHandle for ImageView {
    type Handle = vk::ImageView;

    fn vk_handle(&self) -> Self::Handle {
        self.image_view.0
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        unsafe {
            self.device
                .ash_handle()
                .destroy_image_view(self.image_view.0, None);
        }
    }
}
