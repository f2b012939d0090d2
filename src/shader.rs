//! Shader programs loaded from WGSL files on disk.
//!
//! A [`ShaderProgram`] pairs a vertex shader file and a fragment shader file
//! into one render pipeline, together with the uniform buffer holding the
//! three transform matrices. Uniforms are addressed by name, the same names
//! the vertex shader's `Transforms` struct uses:
//!
//! | Name               | Offset | Meaning                      |
//! |--------------------|--------|------------------------------|
//! | `modelMatrix`      | 0      | object to world              |
//! | `viewMatrix`       | 64     | world to camera              |
//! | `projectionMatrix` | 128    | camera to clip space         |
//!
//! The vertex shader must export `vs_main` and the fragment shader `fs_main`.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Mat4;

use crate::gpu::{DEPTH_FORMAT, GpuContext};
use crate::sphere::Vertex;

pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

/// Errors that can occur while loading or using a shader program.
#[derive(Debug)]
pub enum ShaderError {
    /// A shader file could not be read.
    Io { path: PathBuf, source: std::io::Error },
    /// WGSL parsing or validation failed for a shader file.
    Compile { path: PathBuf, message: String },
    /// The two stages could not be linked into a pipeline.
    Link(String),
    /// No uniform with this name exists in the program.
    UnknownUniform(String),
}

impl std::fmt::Display for ShaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderError::Io { path, source } => {
                write!(f, "failed to read shader '{}': {}", path.display(), source)
            }
            ShaderError::Compile { path, message } => {
                write!(f, "failed to compile shader '{}': {}", path.display(), message)
            }
            ShaderError::Link(msg) => write!(f, "failed to link shader program: {}", msg),
            ShaderError::UnknownUniform(name) => write!(f, "unknown uniform '{}'", name),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShaderError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// WGSL source read from disk, remembering where it came from.
#[derive(Clone, Debug)]
pub struct ShaderSource {
    path: PathBuf,
    source: String,
}

impl ShaderSource {
    /// Read a shader from the given file path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref().to_path_buf();
        let source = fs::read_to_string(&path).map_err(|source| ShaderError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("Loaded shader {:?} ({} bytes)", path, source.len());

        Ok(Self { path, source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The transform matrices as laid out in the uniform buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl Default for TransformUniforms {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

impl TransformUniforms {
    /// Byte offset of the named matrix inside the uniform buffer.
    pub fn offset_of(name: &str) -> Result<u64, ShaderError> {
        let matrix_size = std::mem::size_of::<[[f32; 4]; 4]>() as u64;
        match name {
            "modelMatrix" => Ok(0),
            "viewMatrix" => Ok(matrix_size),
            "projectionMatrix" => Ok(2 * matrix_size),
            _ => Err(ShaderError::UnknownUniform(name.to_string())),
        }
    }
}

/// A linked vertex + fragment shader pair and its uniform storage.
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
}

impl ShaderProgram {
    /// Loads both shader files, compiles them and links them into a pipeline.
    ///
    /// The pipeline reads [`Vertex`] records as a triangle list, writes the
    /// surface format, and depth-tests against the context's depth buffer.
    /// Face culling is left off.
    pub fn compile_and_link(
        gpu: &GpuContext,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_source = ShaderSource::load(vertex_path)?;
        let fragment_source = ShaderSource::load(fragment_path)?;
        Self::from_sources(gpu, &vertex_source, &fragment_source)
    }

    /// Compiles and links already loaded shader sources.
    pub fn from_sources(
        gpu: &GpuContext,
        vertex: &ShaderSource,
        fragment: &ShaderSource,
    ) -> Result<Self, ShaderError> {
        let device = &gpu.device;

        let vertex_module = compile_module(gpu, vertex, "Vertex Shader")?;
        let fragment_module = compile_module(gpu, fragment, "Fragment Shader")?;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Transform Uniforms"),
            size: std::mem::size_of::<TransformUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue.write_buffer(
            &uniform_buffer,
            0,
            bytemuck::cast_slice(&[TransformUniforms::default()]),
        );

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Transform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sphere Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sphere Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(VERTEX_ENTRY_POINT),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(FRAGMENT_ENTRY_POINT),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Link(err.to_string()));
        }

        log::info!(
            "Linked shader program {:?} + {:?}",
            vertex.path(),
            fragment.path()
        );

        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
        })
    }

    /// Uploads a matrix to the named uniform.
    pub fn set_uniform(
        &self,
        gpu: &GpuContext,
        name: &str,
        value: Mat4,
    ) -> Result<(), ShaderError> {
        let offset = TransformUniforms::offset_of(name)?;
        gpu.queue.write_buffer(
            &self.uniform_buffer,
            offset,
            bytemuck::cast_slice(&value.to_cols_array()),
        );
        Ok(())
    }

    /// Binds the pipeline and its uniforms for the following draw calls.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
    }
}

fn compile_module(
    gpu: &GpuContext,
    shader: &ShaderSource,
    label: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader.source().into()),
        });

    match pollster::block_on(gpu.device.pop_error_scope()) {
        Some(err) => Err(ShaderError::Compile {
            path: shader.path().to_path_buf(),
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}
