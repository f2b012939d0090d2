//! # Spinsphere
//!
//! **A procedurally generated UV-sphere you can spin with the arrow keys.**
//!
//! The sphere is sampled on a latitude/longitude grid, stitched into
//! triangles band by band, expanded into a flat vertex buffer, and uploaded
//! once. Every frame the model matrix is rebuilt from two rotation angles,
//! combined with a fixed camera, and the whole mesh is drawn in one call.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> Result<(), spinsphere::AppError> {
//!     env_logger::init();
//!     spinsphere::run_with_config(spinsphere::AppConfig::from_env().title("Globe"))
//! }
//! ```
//!
//! ## Generating geometry without a window
//!
//! ```
//! use spinsphere::{SphereParams, generate_sphere, FLOATS_PER_VERTEX};
//!
//! let params = SphereParams::new(0.5, 80, 80)?;
//! let mesh = generate_sphere(&params)?;
//! assert_eq!(mesh.as_floats().len(), mesh.vertex_count() * FLOATS_PER_VERTEX);
//! # Ok::<(), spinsphere::SphereError>(())
//! ```
//!
//! ## Controls
//!
//! - Arrow keys / WASD: rotate by one degree per press (key repeat applies)
//! - Escape: quit

mod app;
mod camera;
mod gpu;
mod input;
mod mesh;
mod orientation;
mod renderer;
mod shader;
mod sphere;

pub use app::{AppConfig, AppError, ENV_PREFIX, run_with_config};
pub use camera::Camera;
pub use gpu::{DEPTH_FORMAT, GpuContext, GpuError};
pub use input::Input;
pub use mesh::{Mesh, MeshError};
pub use orientation::{InputAction, Orientation, ROTATION_STEP};
pub use renderer::{FrameError, Renderer, RendererError};
pub use shader::{ShaderError, ShaderProgram, ShaderSource, TransformUniforms};
pub use sphere::{
    FLOATS_PER_VERTEX, MAX_VERTEX_BUFFER_BYTES, SPHERE_COLOR, SphereError, SphereMesh,
    SphereParams, Vertex, expand, generate_sphere, grid_vertices, triangle_indices,
};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec3};

// Re-export the winit key type used by `InputAction::from_key`
pub use winit::keyboard::KeyCode;
