//! The render pass and graphics pipeline, built once at initialization.

use std::{io::Cursor, path::Path};

use volkano_fs::Fs;
use volkano_rhi::{
    Format, GpuDevice, GraphicsPipelineCreateInfo, PrimitiveTopology, RasterizationState,
};

use crate::{
    LOG_TARGET,
    config::RendererConfig,
    error::{GpuResultExt, RendererError},
    mesh::Vertex,
};

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Reads a SPIR-V binary and returns its words.
pub fn load_spirv(fs: &dyn Fs, path: &Path) -> Result<Vec<u32>, RendererError> {
    let bytes = fs.read(path)?;
    let invalid = |reason: String| RendererError::InvalidShader {
        path: path.to_path_buf(),
        reason,
    };

    let words = ash::util::read_spv(&mut Cursor::new(&bytes[..]))
        .map_err(|error| invalid(error.to_string()))?;

    match words.first() {
        Some(&SPIRV_MAGIC) => Ok(words),
        Some(&magic) => Err(invalid(format!("bad magic number {magic:#010x}"))),
        None => Err(invalid("the file is empty".into())),
    }
}

/// Render pass, layout and pipeline. Fields are declared in destruction
/// order.
pub struct PipelineState<D: GpuDevice> {
    pipeline: D::Pipeline,
    layout: D::PipelineLayout,
    render_pass: D::RenderPass,
    color_format: Format,
}

impl<D: GpuDevice> PipelineState<D> {
    pub fn build(
        device: &D,
        fs: &dyn Fs,
        config: &RendererConfig,
        color_format: Format,
    ) -> Result<Self, RendererError> {
        let vertex_code = load_spirv(fs, &config.vertex_shader)?;
        let fragment_code = load_spirv(fs, &config.fragment_shader)?;

        let render_pass = device
            .create_render_pass(color_format)
            .context("create render pass")?;
        let layout = device
            .create_pipeline_layout()
            .context("create pipeline layout")?;

        // Shader modules are only needed while the pipeline is created.
        let vertex_shader = device
            .create_shader_module(&vertex_code)
            .context("create vertex shader module")?;
        let fragment_shader = device
            .create_shader_module(&fragment_code)
            .context("create fragment shader module")?;

        let vertex_layout = Vertex::layout();
        let pipeline = device
            .create_graphics_pipeline(&GraphicsPipelineCreateInfo {
                vertex_shader: &vertex_shader,
                fragment_shader: &fragment_shader,
                entry_point: c"main",
                vertex_layout: &vertex_layout,
                topology: PrimitiveTopology::TRIANGLE_LIST,
                rasterization: RasterizationState::default(),
                layout: &layout,
                render_pass: &render_pass,
            })
            .context("create graphics pipeline")?;

        log::info!(
            target: LOG_TARGET,
            "built graphics pipeline for {:?} from {} and {}",
            color_format,
            config.vertex_shader.display(),
            config.fragment_shader.display(),
        );

        Ok(Self {
            pipeline,
            layout,
            render_pass,
            color_format,
        })
    }

    pub fn pipeline(&self) -> &D::Pipeline {
        &self.pipeline
    }

    pub fn layout(&self) -> &D::PipelineLayout {
        &self.layout
    }

    pub fn render_pass(&self) -> &D::RenderPass {
        &self.render_pass
    }

    pub fn color_format(&self) -> Format {
        self.color_format
    }
}
