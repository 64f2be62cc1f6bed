use std::sync::Arc;

use ash::vk;

use crate::{AshHandle, DebugWrapper, GpuError, VkHandle, device::Device};

/// A single-subpass render pass that clears one color attachment and leaves
/// it ready for presentation.
pub struct RenderPass {
    device: Arc<Device>,
    render_pass: DebugWrapper<vk::RenderPass>,
    color_format: vk::Format,
}

impl RenderPass {
    pub fn new(device: Arc<Device>, color_format: vk::Format) -> Result<Self, GpuError> {
        let attachments = [color_attachment(color_format)];

        let color_references = [vk::AttachmentReference::default()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];

        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_references)];

        let dependencies = [external_dependency()];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe { device.ash_handle().create_render_pass(&create_info, None) }?;

        Ok(Self {
            device,
            render_pass: DebugWrapper(render_pass),
            color_format,
        })
    }

    pub fn color_format(&self) -> vk::Format {
        self.color_format
    }
}

fn color_attachment(format: vk::Format) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
}

// The acquired image may still be read by the presentation engine, so the
// layout transition must wait for color attachment output.
fn external_dependency() -> vk::SubpassDependency {
    vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
}

impl VkHandle for RenderPass {
    type Handle = vk::RenderPass;

    fn vk_handle(&self) -> Self::Handle {
        self.render_pass.0
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device
                .ash_handle()
                .destroy_render_pass(self.render_pass.0, None);
        }
    }
}
