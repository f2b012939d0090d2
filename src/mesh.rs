//! GPU-resident geometry.
//!
//! A [`Mesh`] is a vertex buffer of expanded [`Vertex`] records plus the
//! number of vertices to draw. There is no index buffer: every triangle
//! corner has its own record, so the mesh is drawn with a plain
//! `draw(0..vertex_count)` as a triangle list.

use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;
use crate::sphere::{SphereMesh, Vertex};

/// Errors raised when geometry cannot be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The draw count does not fit in a `u32`.
    TooManyVertices(usize),
    /// The vertex buffer is larger than the device allows.
    BufferTooLarge { bytes: u64, limit: u64 },
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::TooManyVertices(n) => {
                write!(f, "{} vertices cannot be drawn in one call", n)
            }
            MeshError::BufferTooLarge { bytes, limit } => write!(
                f,
                "vertex buffer of {} bytes exceeds the device limit of {} bytes",
                bytes, limit
            ),
        }
    }
}

impl std::error::Error for MeshError {}

/// GPU-resident, non-indexed triangle list.
///
/// Meshes are immutable after creation; to render different geometry,
/// create a new mesh.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl Mesh {
    /// Uploads `vertices` into a new static vertex buffer.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex], label: &str) -> Result<Self, MeshError> {
        let max_buffer_size = gpu.device.limits().max_buffer_size;
        let vertex_count = checked_vertex_count(vertices.len(), max_buffer_size)?;
        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        Ok(Self {
            vertex_buffer,
            vertex_count,
        })
    }

    /// Uploads a generated sphere.
    pub fn from_sphere(gpu: &GpuContext, sphere: &SphereMesh) -> Result<Self, MeshError> {
        log::info!(
            "Uploading sphere: {} vertices, {} triangles ({} bytes)",
            sphere.vertex_count(),
            sphere.triangle_count(),
            std::mem::size_of_val(sphere.vertices())
        );
        Self::new(gpu, sphere.vertices(), "Sphere Vertex Buffer")
    }

    /// Number of vertices the draw call covers.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Records the draw of the whole mesh into `render_pass`.
    ///
    /// The pipeline and bind groups must already be set.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

/// Draw count for `len` vertices, if they fit both a `u32` and a buffer of
/// at most `max_buffer_size` bytes.
fn checked_vertex_count(len: usize, max_buffer_size: u64) -> Result<u32, MeshError> {
    let count = u32::try_from(len).map_err(|_| MeshError::TooManyVertices(len))?;
    let bytes = count as u64 * std::mem::size_of::<Vertex>() as u64;
    if bytes > max_buffer_size {
        return Err(MeshError::BufferTooLarge {
            bytes,
            limit: max_buffer_size,
        });
    }
    Ok(count)
}
