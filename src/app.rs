use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, ConfigError, Environment};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::gpu::{GpuContext, GpuError};
use crate::input::Input;
use crate::renderer::{FrameError, Renderer, RendererError};
use crate::sphere::SphereParams;

/// Prefix of the environment variables read by [`AppConfig::from_env`].
pub const ENV_PREFIX: &str = "SPINSPHERE";

/// Top-level error of a spinsphere run.
#[derive(Debug)]
pub enum AppError {
    EventLoop(winit::error::EventLoopError),
    Window(winit::error::OsError),
    Gpu(GpuError),
    Renderer(RendererError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::EventLoop(e) => write!(f, "event loop error: {}", e),
            AppError::Window(e) => write!(f, "failed to create window: {}", e),
            AppError::Gpu(e) => write!(f, "{}", e),
            AppError::Renderer(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Gpu(e) => Some(e),
            AppError::Renderer(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for AppError {
    fn from(e: winit::error::OsError) -> Self {
        AppError::Window(e)
    }
}

impl From<GpuError> for AppError {
    fn from(e: GpuError) -> Self {
        AppError::Gpu(e)
    }
}

impl From<RendererError> for AppError {
    fn from(e: RendererError) -> Self {
        AppError::Renderer(e)
    }
}

/// Configuration for the window and the sphere.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub sphere: SphereParams,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub clear_color: wgpu::Color,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Spinsphere".to_string(),
            width: 800,
            height: 800,
            sphere: SphereParams::default(),
            vertex_shader: PathBuf::from("res/shaders/vertex.wgsl"),
            fragment_shader: PathBuf::from("res/shaders/fragment.wgsl"),
            clear_color: wgpu::Color::BLACK,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `SPINSPHERE_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Applies `SPINSPHERE_RADIUS`, `SPINSPHERE_SECTORS`, `SPINSPHERE_STACKS`
    /// and `SPINSPHERE_SHADER_DIR` from `environment`.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        let settings = match Config::builder().add_source(environment).build() {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Ignoring {}_* environment: {}", ENV_PREFIX, err);
                return self;
            }
        };

        if let Some(radius) = setting(settings.get_float("radius"), "RADIUS") {
            self.sphere.radius = radius as f32;
        }
        if let Some(sectors) =
            setting(settings.get_int("sectors"), "SECTORS").and_then(|n| in_u32(n, "SECTORS"))
        {
            self.sphere.sectors = sectors;
        }
        if let Some(stacks) =
            setting(settings.get_int("stacks"), "STACKS").and_then(|n| in_u32(n, "STACKS"))
        {
            self.sphere.stacks = stacks;
        }
        if let Some(dir) = setting(settings.get_string("shader_dir"), "SHADER_DIR") {
            self = self.shader_dir(dir);
        }
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn sphere(mut self, sphere: SphereParams) -> Self {
        self.sphere = sphere;
        self
    }

    pub fn shaders(mut self, vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        self.vertex_shader = vertex.into();
        self.fragment_shader = fragment.into();
        self
    }

    /// Looks for `vertex.wgsl` and `fragment.wgsl` in `dir`.
    pub fn shader_dir(self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.shaders(dir.join("vertex.wgsl"), dir.join("fragment.wgsl"))
    }

    pub fn clear_color(mut self, r: f64, g: f64, b: f64) -> Self {
        self.clear_color = wgpu::Color { r, g, b, a: 1.0 };
        self
    }
}

/// A present and well-formed setting; anything else is `None`.
fn setting<T>(value: Result<T, ConfigError>, name: &str) -> Option<T> {
    match value {
        Ok(value) => Some(value),
        Err(ConfigError::NotFound(_)) => None,
        Err(err) => {
            log::warn!("Ignoring {}_{}: {}", ENV_PREFIX, name, err);
            None
        }
    }
}

fn in_u32(value: i64, name: &str) -> Option<u32> {
    match u32::try_from(value) {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}_{}={}: out of range", ENV_PREFIX, name, value);
            None
        }
    }
}

/// Open a window and spin the sphere until it is closed.
pub fn run_with_config(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = SpinsphereApp::Pending { config };
    event_loop.run_app(&mut app)?;

    match app {
        SpinsphereApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

/// What the event loop does after a frame failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Recovery {
    /// The surface is lost or outdated; configure it again.
    Reconfigure,
    /// Out of memory or an unrecoverable surface failure.
    Exit,
    /// Drop this frame and try the next one.
    Skip,
}

fn recovery_for(err: &FrameError) -> Recovery {
    match err {
        FrameError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            Recovery::Reconfigure
        }
        FrameError::Surface(wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other) => {
            Recovery::Exit
        }
        // Timeouts happen when a frame takes too long to present
        FrameError::Surface(_) | FrameError::Shader(_) => Recovery::Skip,
    }
}

enum SpinsphereApp {
    Pending {
        config: AppConfig,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        renderer: Renderer,
        input: Input,
    },
    Failed(AppError),
}

impl SpinsphereApp {
    fn start(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let renderer = Renderer::initialize(
            &gpu,
            &config.sphere,
            &config.vertex_shader,
            &config.fragment_shader,
        )?
        .with_clear_color(config.clear_color);

        log::info!(
            "Ready: {} vertices, {}x{} surface",
            renderer.vertex_count(),
            gpu.width(),
            gpu.height()
        );
        window.request_redraw();

        Ok(SpinsphereApp::Running {
            window,
            gpu,
            renderer,
            input: Input::new(),
        })
    }
}

impl ApplicationHandler for SpinsphereApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let SpinsphereApp::Pending { config } = self {
            *self = match Self::start(event_loop, config) {
                Ok(running) => running,
                Err(err) => {
                    log::error!("{}", err);
                    event_loop.exit();
                    SpinsphereApp::Failed(err)
                }
            };
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let SpinsphereApp::Running {
            window,
            gpu,
            renderer,
            input,
        } = self
        else {
            return;
        };

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
                // On macos the window needs to be redrawn manually after resizing
                window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                for action in input.drain_actions() {
                    renderer.handle_input_action(action);
                }

                if let Err(err) = renderer.render_frame(gpu) {
                    match recovery_for(&err) {
                        Recovery::Reconfigure => {
                            log::debug!("{}, reconfiguring", err);
                            gpu.reconfigure();
                        }
                        Recovery::Exit => {
                            log::error!("{}", err);
                            event_loop.exit();
                        }
                        Recovery::Skip => log::warn!("Skipping frame: {}", err),
                    }
                }

                window.request_redraw();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(vars))
    }

    #[test]
    fn defaults_match_the_demo() {
        let config = AppConfig::default();

        assert_eq!(config.sphere, SphereParams::new(0.5, 80, 80).unwrap());
        assert_eq!(config.width, config.height);
        assert_eq!(config.vertex_shader, PathBuf::from("res/shaders/vertex.wgsl"));
        assert_eq!(config.fragment_shader, PathBuf::from("res/shaders/fragment.wgsl"));
    }

    #[test]
    fn env_overrides_sphere_and_shaders() {
        let config = AppConfig::default().with_environment(environment(&[
            ("SPINSPHERE_RADIUS", "1.5"),
            ("SPINSPHERE_SECTORS", "12"),
            ("SPINSPHERE_STACKS", "6"),
            ("SPINSPHERE_SHADER_DIR", "/tmp/shaders"),
        ]));

        assert_eq!(config.sphere, SphereParams::new(1.5, 12, 6).unwrap());
        assert_eq!(config.vertex_shader, PathBuf::from("/tmp/shaders/vertex.wgsl"));
        assert_eq!(config.fragment_shader, PathBuf::from("/tmp/shaders/fragment.wgsl"));
    }

    #[test]
    fn unparsable_env_values_are_ignored() {
        let config = AppConfig::default().with_environment(environment(&[
            ("SPINSPHERE_RADIUS", "big"),
            ("SPINSPHERE_SECTORS", "-4"),
            ("SPINSPHERE_STACKS", "10"),
        ]));

        assert_eq!(config.sphere.radius, 0.5);
        assert_eq!(config.sphere.sectors, 80);
        assert_eq!(config.sphere.stacks, 10);
    }

    #[test]
    fn out_of_range_counts_are_ignored() {
        let config = AppConfig::default().with_environment(environment(&[
            ("SPINSPHERE_SECTORS", "99999999999"),
            ("SPINSPHERE_STACKS", "many"),
        ]));

        assert_eq!(config.sphere, SphereParams::default());
    }

    #[test]
    fn unrelated_env_is_untouched() {
        let config = AppConfig::default()
            .with_environment(environment(&[("RADIUS", "9"), ("OTHER_STACKS", "3")]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn surface_errors_pick_a_recovery() {
        use wgpu::SurfaceError;

        let recovery = |e| recovery_for(&FrameError::Surface(e));
        assert_eq!(recovery(SurfaceError::Lost), Recovery::Reconfigure);
        assert_eq!(recovery(SurfaceError::Outdated), Recovery::Reconfigure);
        assert_eq!(recovery(SurfaceError::OutOfMemory), Recovery::Exit);
        assert_eq!(recovery(SurfaceError::Other), Recovery::Exit);
        assert_eq!(recovery(SurfaceError::Timeout), Recovery::Skip);
    }

    #[test]
    fn fatal_surface_errors_report_their_own_cause() {
        let other = FrameError::Surface(wgpu::SurfaceError::Other);
        let oom = FrameError::Surface(wgpu::SurfaceError::OutOfMemory);

        assert_eq!(other.to_string(), format!("surface error: {}", wgpu::SurfaceError::Other));
        assert_ne!(other.to_string(), oom.to_string());
    }

    #[test]
    fn unknown_uniforms_skip_the_frame() {
        let err = FrameError::Shader(crate::shader::ShaderError::UnknownUniform("tint".into()));
        assert_eq!(recovery_for(&err), Recovery::Skip);
    }

    #[test]
    fn builder_sets_fields() {
        let config = AppConfig::new()
            .title("Globe")
            .size(640, 480)
            .sphere(SphereParams::new(2.0, 16, 8).unwrap())
            .shaders("a.wgsl", "b.wgsl")
            .clear_color(0.1, 0.2, 0.3);

        assert_eq!(config.title, "Globe");
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.sphere.sectors, 16);
        assert_eq!(config.vertex_shader, PathBuf::from("a.wgsl"));
        assert_eq!(config.clear_color.b, 0.3);
        assert_eq!(config.clear_color.a, 1.0);
    }
}
