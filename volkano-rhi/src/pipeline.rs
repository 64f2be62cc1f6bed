use std::sync::Arc;

use ash::vk;

use crate::{
    AshHandle, DebugWrapper, GpuError, GraphicsPipelineCreateInfo, VkHandle, device::Device,
    vulkan::VulkanDevice,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: vk::Format,
    pub offset: u32,
}

/// Layout of a single interleaved vertex buffer bound at binding 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    fn binding_descriptions(&self) -> [vk::VertexInputBindingDescription; 1] {
        [vk::VertexInputBindingDescription::default()
            .binding(0)
            .stride(self.stride)
            .input_rate(vk::VertexInputRate::VERTEX)]
    }

    fn attribute_descriptions(&self) -> Vec<vk::VertexInputAttributeDescription> {
        self.attributes
            .iter()
            .map(|attribute| {
                vk::VertexInputAttributeDescription::default()
                    .location(attribute.location)
                    .binding(0)
                    .format(attribute.format)
                    .offset(attribute.offset)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizationState {
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub line_width: f32,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::CLOCKWISE,
            line_width: 1.0,
        }
    }
}

pub struct ShaderModule {
    device: Arc<Device>,
    module: DebugWrapper<vk::ShaderModule>,
}

impl ShaderModule {
    pub fn new(device: Arc<Device>, code: &[u32]) -> Result<Self, GpuError> {
        let create_info = vk::ShaderModuleCreateInfo::default().code(code);
        let module = unsafe { device.ash_handle().create_shader_module(&create_info, None) }?;

        Ok(Self {
            device,
            module: DebugWrapper(module),
        })
    }
}

impl VkHandle for ShaderModule {
    type Handle = vk::ShaderModule;

    fn vk_handle(&self) -> Self::Handle {
        self.module.0
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device
                .ash_handle()
                .destroy_shader_module(self.module.0, None);
        }
    }
}

pub struct PipelineLayout {
    device: Arc<Device>,
    layout: DebugWrapper<vk::PipelineLayout>,
}

impl PipelineLayout {
    /// Creates a layout without descriptor sets or push constants.
    pub fn empty(device: Arc<Device>) -> Result<Self, GpuError> {
        let create_info = vk::PipelineLayoutCreateInfo::default();
        let layout = unsafe {
            device
                .ash_handle()
                .create_pipeline_layout(&create_info, None)
        }?;

        Ok(Self {
            device,
            layout: DebugWrapper(layout),
        })
    }
}

impl VkHandle for PipelineLayout {
    type Handle = vk::PipelineLayout;

    fn vk_handle(&self) -> Self::Handle {
        self.layout.0
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .ash_handle()
                .destroy_pipeline_layout(self.layout.0, None);
        }
    }
}

pub struct GraphicsPipeline {
    device: Arc<Device>,
    pipeline: DebugWrapper<vk::Pipeline>,
}

impl GraphicsPipeline {
    pub fn new(
        device: Arc<Device>,
        create_info: &GraphicsPipelineCreateInfo<'_, VulkanDevice>,
    ) -> Result<Self, GpuError> {
        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(create_info.vertex_shader.vk_handle())
                .name(create_info.entry_point),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(create_info.fragment_shader.vk_handle())
                .name(create_info.entry_point),
        ];

        let binding_descriptions = create_info.vertex_layout.binding_descriptions();
        let attribute_descriptions = create_info.vertex_layout.attribute_descriptions();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&binding_descriptions)
            .vertex_attribute_descriptions(&attribute_descriptions);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(create_info.topology)
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic.
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = create_info.rasterization;
        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(rasterization.polygon_mode)
            .cull_mode(rasterization.cull_mode)
            .front_face(rasterization.front_face)
            .depth_bias_enable(false)
            .line_width(rasterization.line_width);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(false)
            .color_write_mask(vk::ColorComponentFlags::RGBA)];

        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(create_info.layout.vk_handle())
            .render_pass(create_info.render_pass.vk_handle())
            .subpass(0);

        let pipelines = unsafe {
            device
                .ash_handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
        }
        .map_err(|(_, result)| GpuError::from_vk(result))?;

        let pipeline = pipelines
            .into_iter()
            .next()
            .ok_or(GpuError::Unexpected(vk::Result::ERROR_UNKNOWN))?;

        Ok(Self {
            device,
            pipeline: DebugWrapper(pipeline),
        })
    }
}

impl VkHandle for GraphicsPipeline {
    type Handle = vk::Pipeline;

    #[inline]
    fn vk_handle(&self) -> Self::Handle {
        self.pipeline.0
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device
                .ash_handle()
                .destroy_pipeline(self.pipeline.0, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_descriptions_use_binding_zero() {
        let layout = VertexLayout {
            stride: 24,
            attributes: vec![
                VertexAttribute {
                    location: 0,
                    format: vk::Format::R32G32B32_SFLOAT,
                    offset: 0,
                },
                VertexAttribute {
                    location: 1,
                    format: vk::Format::R32G32B32_SFLOAT,
                    offset: 12,
                },
            ],
        };

        let [binding] = layout.binding_descriptions();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.stride, 24);

        let attributes = layout.attribute_descriptions();
        assert_eq!(attributes.len(), 2);
        assert!(attributes.iter().all(|attribute| attribute.binding == 0));
        assert_eq!(attributes[1].offset, 12);
    }

    #[test]
    fn test_default_rasterization_culls_back_faces() {
        let state = RasterizationState::default();
        assert_eq!(state.polygon_mode, vk::PolygonMode::FILL);
        assert_eq!(state.cull_mode, vk::CullModeFlags::BACK);
        assert_eq!(state.front_face, vk::FrontFace::CLOCKWISE);
    }
}
