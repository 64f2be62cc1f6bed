use std::mem::{offset_of, size_of};

use ash::vk;
use bytemuck::{Pod, Zeroable};
use volkano_rhi::{BufferUsage, GpuDevice, VertexAttribute, VertexLayout};

use crate::error::{GpuResultExt, RendererError};

/// A vertex of a mesh.
#[derive(Clone, Copy, Debug, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

pub type Index = u16;

impl Vertex {
    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    /// The vertex input layout the graphics pipeline is built with.
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: size_of::<Vertex>() as u32,
            attributes: vec![
                VertexAttribute {
                    location: 0,
                    format: vk::Format::R32G32B32_SFLOAT,
                    offset: offset_of!(Vertex, position) as u32,
                },
                VertexAttribute {
                    location: 1,
                    format: vk::Format::R32G32B32_SFLOAT,
                    offset: offset_of!(Vertex, color) as u32,
                },
            ],
        }
    }
}

/// CPU-side mesh data. Without indices the vertices are drawn in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<Index>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<Index>) -> Self {
        Self { vertices, indices }
    }

    /// A single triangle with red, green and blue corners.
    pub fn triangle() -> Self {
        Self::new(
            vec![
                Vertex::new([0.0, -0.5, 0.0], [1.0, 0.0, 0.0]),
                Vertex::new([0.5, 0.5, 0.0], [0.0, 1.0, 0.0]),
                Vertex::new([-0.5, 0.5, 0.0], [0.0, 0.0, 1.0]),
            ],
            Vec::new(),
        )
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }
}

/// A mesh uploaded to host-visible GPU buffers.
pub struct GpuMesh<D: GpuDevice> {
    vertex_buffer: D::Buffer,
    index_buffer: Option<D::Buffer>,
    vertex_count: u32,
    index_count: u32,
}

impl<D: GpuDevice> GpuMesh<D> {
    pub fn upload(device: &D, mesh: &Mesh) -> Result<Self, RendererError> {
        if mesh.vertices.is_empty() {
            return Err(RendererError::invariant("upload mesh", "the mesh has no vertices"));
        }

        let vertex_buffer = device
            .create_buffer(BufferUsage::VERTEX_BUFFER, bytemuck::cast_slice(&mesh.vertices))
            .context("create vertex buffer")?;

        let index_buffer = if mesh.is_indexed() {
            let buffer = device
                .create_buffer(BufferUsage::INDEX_BUFFER, bytemuck::cast_slice(&mesh.indices))
                .context("create index buffer")?;
            Some(buffer)
        } else {
            None
        };

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_count: mesh.vertices.len() as u32,
            index_count: mesh.indices.len() as u32,
        })
    }

    /// Binds the buffers and records the draw.
    pub fn record_draw(&self, device: &D, command_buffer: &D::CommandBuffer) {
        device.cmd_bind_vertex_buffer(command_buffer, &self.vertex_buffer);
        match &self.index_buffer {
            Some(index_buffer) => {
                device.cmd_bind_index_buffer(command_buffer, index_buffer);
                device.cmd_draw_indexed(command_buffer, self.index_count);
            }
            None => device.cmd_draw(command_buffer, self.vertex_count),
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}
