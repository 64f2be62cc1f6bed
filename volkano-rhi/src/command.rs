use std::sync::Arc;

use ash::vk;

use crate::{
    AshHandle, DebugWrapper, Extent2D, GpuError, VkHandle, buffer::Buffer, device::Device,
    framebuffer::Framebuffer, pipeline::GraphicsPipeline, render_pass::RenderPass,
};

pub struct CommandPool {
    device: Arc<Device>,
    pool: DebugWrapper<vk::CommandPool>,
}

impl CommandPool {
    /// Creates a pool whose buffers can be reset individually.
    pub fn new(device: Arc<Device>, queue_family_index: u32) -> Result<Self, GpuError> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family_index);

        let pool = unsafe { device.ash_handle().create_command_pool(&create_info, None) }?;

        Ok(Self {
            device,
            pool: DebugWrapper(pool),
        })
    }

    /// Allocates a primary command buffer from this pool. The buffer is
    /// freed together with the pool.
    pub fn allocate(&self) -> Result<CommandBuffer, GpuError> {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool.0)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers =
            unsafe { self.device.ash_handle().allocate_command_buffers(&allocate_info) }?;

        let command_buffer = command_buffers
            .into_iter()
            .next()
            .ok_or(GpuError::Unexpected(vk::Result::ERROR_UNKNOWN))?;

        Ok(CommandBuffer {
            device: Arc::clone(&self.device),
            command_buffer: DebugWrapper(command_buffer),
        })
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device
                .ash_handle()
                .destroy_command_pool(self.pool.0, None);
        }
    }
}

pub struct CommandBuffer {
    device: Arc<Device>,
    command_buffer: DebugWrapper<vk::CommandBuffer>,
}

impl CommandBuffer {
    pub fn begin(&self) -> Result<(), GpuError> {
        let begin_info = vk::CommandBufferBeginInfo::default();
        unsafe {
            self.device
                .ash_handle()
                .begin_command_buffer(self.command_buffer.0, &begin_info)
        }?;
        Ok(())
    }

    pub fn end(&self) -> Result<(), GpuError> {
        unsafe {
            self.device
                .ash_handle()
                .end_command_buffer(self.command_buffer.0)
        }?;
        Ok(())
    }

    pub fn reset(&self) -> Result<(), GpuError> {
        unsafe {
            self.device.ash_handle().reset_command_buffer(
                self.command_buffer.0,
                vk::CommandBufferResetFlags::empty(),
            )
        }?;
        Ok(())
    }

    pub fn begin_render_pass(
        &self,
        render_pass: &RenderPass,
        framebuffer: &Framebuffer,
        extent: Extent2D,
        clear_color: [f32; 4],
    ) {
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: clear_color,
            },
        }];

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass.vk_handle())
            .framebuffer(framebuffer.vk_handle())
            .render_area(extent.to_rect())
            .clear_values(&clear_values);

        unsafe {
            self.device.ash_handle().cmd_begin_render_pass(
                self.command_buffer.0,
                &begin_info,
                vk::SubpassContents::INLINE,
            );
        }
    }

    pub fn end_render_pass(&self) {
        unsafe {
            self.device
                .ash_handle()
                .cmd_end_render_pass(self.command_buffer.0);
        }
    }

    pub fn bind_pipeline(&self, pipeline: &GraphicsPipeline) {
        unsafe {
            self.device.ash_handle().cmd_bind_pipeline(
                self.command_buffer.0,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.vk_handle(),
            );
        }
    }

    /// Sets a viewport covering `extent` with the full depth range.
    pub fn set_viewport(&self, extent: Extent2D) {
        let viewports = [vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }];

        unsafe {
            self.device
                .ash_handle()
                .cmd_set_viewport(self.command_buffer.0, 0, &viewports);
        }
    }

    pub fn set_scissor(&self, extent: Extent2D) {
        unsafe {
            self.device
                .ash_handle()
                .cmd_set_scissor(self.command_buffer.0, 0, &[extent.to_rect()]);
        }
    }

    pub fn bind_vertex_buffer(&self, buffer: &Buffer) {
        unsafe {
            self.device.ash_handle().cmd_bind_vertex_buffers(
                self.command_buffer.0,
                0,
                &[buffer.vk_handle()],
                &[0],
            );
        }
    }

    pub fn bind_index_buffer(&self, buffer: &Buffer, index_type: vk::IndexType) {
        unsafe {
            self.device.ash_handle().cmd_bind_index_buffer(
                self.command_buffer.0,
                buffer.vk_handle(),
                0,
                index_type,
            );
        }
    }

    pub fn draw(&self, vertex_count: u32) {
        unsafe {
            self.device
                .ash_handle()
                .cmd_draw(self.command_buffer.0, vertex_count, 1, 0, 0);
        }
    }

    pub fn draw_indexed(&self, index_count: u32) {
        unsafe {
            self.device
                .ash_handle()
                .cmd_draw_indexed(self.command_buffer.0, index_count, 1, 0, 0, 0);
        }
    }
}

impl VkHandle for CommandBuffer {
    type Handle = vk::CommandBuffer;

    fn vk_handle(&self) -> Self::Handle {
        self.command_buffer.0
    }
}
