//! Per-frame drawing of the sphere.
//!
//! The [`Renderer`] owns the sphere's vertex buffer, the shader program and
//! the orientation state. [`Renderer::initialize`] generates and uploads the
//! mesh once; [`Renderer::render_frame`] then recomputes the model matrix
//! from the current angles, uploads the model, view and projection matrices,
//! and issues a single non-indexed draw.

use std::path::Path;

use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, MeshError};
use crate::orientation::{InputAction, Orientation};
use crate::shader::{ShaderError, ShaderProgram};
use crate::sphere::{SphereError, SphereParams, generate_sphere};

/// Errors raised while setting up the renderer.
#[derive(Debug)]
pub enum RendererError {
    Sphere(SphereError),
    Mesh(MeshError),
    Shader(ShaderError),
}

impl std::fmt::Display for RendererError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererError::Sphere(e) => write!(f, "invalid sphere: {}", e),
            RendererError::Mesh(e) => write!(f, "failed to upload sphere: {}", e),
            RendererError::Shader(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RendererError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RendererError::Sphere(e) => Some(e),
            RendererError::Mesh(e) => Some(e),
            RendererError::Shader(e) => Some(e),
        }
    }
}

impl From<SphereError> for RendererError {
    fn from(e: SphereError) -> Self {
        RendererError::Sphere(e)
    }
}

impl From<MeshError> for RendererError {
    fn from(e: MeshError) -> Self {
        RendererError::Mesh(e)
    }
}

impl From<ShaderError> for RendererError {
    fn from(e: ShaderError) -> Self {
        RendererError::Shader(e)
    }
}

/// Errors raised while drawing a frame.
#[derive(Debug)]
pub enum FrameError {
    /// The surface texture could not be acquired.
    Surface(wgpu::SurfaceError),
    /// A uniform upload was rejected.
    Shader(ShaderError),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Surface(e) => write!(f, "surface error: {}", e),
            FrameError::Shader(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<wgpu::SurfaceError> for FrameError {
    fn from(e: wgpu::SurfaceError) -> Self {
        FrameError::Surface(e)
    }
}

impl From<ShaderError> for FrameError {
    fn from(e: ShaderError) -> Self {
        FrameError::Shader(e)
    }
}

/// Draws the rotating sphere.
pub struct Renderer {
    mesh: Mesh,
    program: ShaderProgram,
    camera: Camera,
    orientation: Orientation,
    clear_color: wgpu::Color,
}

impl Renderer {
    /// Generates the sphere, uploads it, and links the shader program.
    pub fn initialize(
        gpu: &GpuContext,
        sphere: &SphereParams,
        vertex_shader: &Path,
        fragment_shader: &Path,
    ) -> Result<Self, RendererError> {
        let sphere = generate_sphere(sphere)?;
        let program = ShaderProgram::compile_and_link(gpu, vertex_shader, fragment_shader)?;
        let mesh = Mesh::from_sphere(gpu, &sphere)?;

        Ok(Self {
            mesh,
            program,
            camera: Camera::default(),
            orientation: Orientation::default(),
            clear_color: wgpu::Color::BLACK,
        })
    }

    /// Sets the color the framebuffer is cleared to each frame.
    pub fn with_clear_color(mut self, clear_color: wgpu::Color) -> Self {
        self.clear_color = clear_color;
        self
    }

    /// Rotates the sphere by one step in the direction of `action`.
    pub fn handle_input_action(&mut self, action: InputAction) {
        self.orientation.apply(action);
    }

    pub fn angle_x(&self) -> f32 {
        self.orientation.angle_x
    }

    pub fn angle_y(&self) -> f32 {
        self.orientation.angle_y
    }

    pub fn set_angle_x(&mut self, angle_x: f32) {
        self.orientation.angle_x = angle_x;
    }

    pub fn set_angle_y(&mut self, angle_y: f32) {
        self.orientation.angle_y = angle_y;
    }

    pub fn orientation(&self) -> &Orientation {
        &self.orientation
    }

    pub fn vertex_count(&self) -> u32 {
        self.mesh.vertex_count()
    }

    /// Draws one frame into the surface and presents it.
    pub fn render_frame(&self, gpu: &GpuContext) -> Result<(), FrameError> {
        self.program
            .set_uniform(gpu, "modelMatrix", self.orientation.model_matrix())?;
        self.program
            .set_uniform(gpu, "viewMatrix", self.camera.view_matrix())?;
        self.program
            .set_uniform(gpu, "projectionMatrix", self.camera.projection_matrix())?;

        let output = gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Sphere Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sphere Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.program.bind(&mut render_pass);
            self.mesh.draw(&mut render_pass);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
