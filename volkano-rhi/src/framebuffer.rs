use std::sync::Arc;

use ash::vk;

use crate::{
    AshHandle, DebugWrapper, Extent2D, GpuError, VkHandle, device::Device, image_view::ImageView,
    render_pass::RenderPass,
};

pub struct Framebuffer {
    device: Arc<Device>,
    framebuffer: DebugWrapper<vk::Framebuffer>,
    extent: Extent2D,
}

impl Framebuffer {
    pub fn new(
        device: Arc<Device>,
        render_pass: &RenderPass,
        image_view: &ImageView,
        extent: Extent2D,
    ) -> Result<Self, GpuError> {
        let attachments = [image_view.vk_handle()];
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.vk_handle())
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.ash_handle().create_framebuffer(&create_info, None) }?;

        Ok(Self {
            device,
            framebuffer: DebugWrapper(framebuffer),
            extent,
        })
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }
}

impl VkHandle for Framebuffer {
    type Handle = vk::Framebuffer;

    fn vk_handle(&self) -> Self::Handle {
        self.framebuffer.0
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device
                .ash_handle()
                .destroy_framebuffer(self.framebuffer.0, None);
        }
    }
}
