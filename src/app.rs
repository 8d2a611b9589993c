use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::game::Game;

/// Configuration for the app window and game loop.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Seconds per update step, or `None` for one update per rendered frame.
    pub fixed_time_step: Option<f64>,
    pub clear_color: wgpu::Color,
    pub camera: Camera,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Playground".to_string(),
            width: 800,
            height: 600,
            fixed_time_step: None,
            clear_color: wgpu::Color::BLACK,
            camera: Camera::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
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

    /// Seconds per update step, or `None` for one update per rendered frame.
    pub fn fixed_time_step(mut self, seconds: Option<f64>) -> Self {
        self.fixed_time_step = seconds;
        self
    }

    /// Run updates at a fixed rate of `updates_per_second`.
    pub fn fixed_rate(self, updates_per_second: f64) -> Self {
        self.fixed_time_step(Some(1.0 / updates_per_second))
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }
}

/// Open a window and run the sample with the default configuration.
pub fn run() -> Result<(), EventLoopError> {
    run_with_config(AppConfig::default())
}

/// Open a window and run the sample until it is closed.
pub fn run_with_config(config: AppConfig) -> Result<(), EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PlaygroundApp::Pending { config };
    event_loop.run_app(&mut app)
}

enum PlaygroundApp {
    Pending {
        config: AppConfig,
    },
    Running {
        window: Arc<Window>,
        game: Game,
    },
}

impl ApplicationHandler for PlaygroundApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let config = match self {
            PlaygroundApp::Pending { config } => config,
            PlaygroundApp::Running { window, game } => {
                game.on_resuming();
                window.request_redraw();
                return;
            }
        };

        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match Game::new(window.clone(), config) {
            Ok(game) => {
                window.request_redraw();
                *self = PlaygroundApp::Running { window, game };
            }
            Err(e) => {
                log::error!("Failed to initialize: {}", e);
                event_loop.exit();
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let PlaygroundApp::Running { game, .. } = self {
            game.on_suspending();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let PlaygroundApp::Running { window, game } = self else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                game.on_window_size_changed(size.width, size.height);
            }
            WindowEvent::Focused(true) => game.on_activated(),
            WindowEvent::Focused(false) => game.on_deactivated(),
            WindowEvent::RedrawRequested => {
                if let Err(e) = game.tick() {
                    log::error!("Frame failed: {}", e);
                }
                window.request_redraw();
            }
            _ => {}
        }
    }
}
