//! The game loop: one update step and one render per tick, plus the window
//! notifications that feed it.

use std::sync::Arc;
use winit::window::Window;

use crate::app::AppConfig;
use crate::gpu::{GpuContext, GpuError};
use crate::renderer::Renderer;
use crate::scene::Scene;
use crate::timer::StepTimer;

pub struct Game {
    gpu: GpuContext,
    renderer: Renderer,
    scene: Scene,
    timer: StepTimer,
}

impl Game {
    /// Initialize the GPU, the renderer and the starting scene for `window`.
    pub fn new(window: Arc<Window>, config: &AppConfig) -> Result<Self, GpuError> {
        let gpu = GpuContext::new(window)?;
        let scene = Scene::with_default_objects();
        let renderer = Renderer::new(&gpu, config.camera, config.clear_color, scene.len())?;
        let timer = timer_for(config);

        log::info!(
            "Game initialized with {} mesh(es) at {}x{}",
            scene.len(),
            gpu.width(),
            gpu.height()
        );

        Ok(Self {
            gpu,
            renderer,
            scene,
            timer,
        })
    }

    /// Run the update step(s) due for this tick, then draw.
    pub fn tick(&mut self) -> Result<(), GpuError> {
        let fps = self.timer.frames_per_second();
        let scene = &mut self.scene;
        self.timer.tick(|timer| scene.update(timer));
        if self.timer.frames_per_second() != fps {
            log::trace!("{} fps", self.timer.frames_per_second());
        }
        self.render()
    }

    fn render(&mut self) -> Result<(), GpuError> {
        if !should_render(&self.timer) {
            return Ok(());
        }
        self.renderer.render(&self.gpu, &mut self.scene)
    }

    pub fn on_window_size_changed(&mut self, width: u32, height: u32) {
        if !self.gpu.resize(width, height) {
            return;
        }
        self.renderer.resize(&self.gpu);
    }

    pub fn on_activated(&mut self) {
        log::debug!("Window activated");
    }

    pub fn on_deactivated(&mut self) {
        log::debug!("Window deactivated");
    }

    pub fn on_suspending(&mut self) {
        log::info!("Suspending");
    }

    pub fn on_resuming(&mut self) {
        self.timer.reset_elapsed_time();
        log::info!("Resuming");
    }
}

/// A timer in the mode `config` asks for.
///
/// Fixed mode is only enabled once the timer accepts the step length, so a
/// bad rate falls back to variable timestep.
fn timer_for(config: &AppConfig) -> StepTimer {
    let mut timer = StepTimer::new();
    if let Some(step) = config.fixed_time_step {
        if timer.set_target_elapsed_seconds(step) {
            timer.set_fixed_time_step(true);
        }
    }
    timer
}

/// Nothing is drawn until the timer has run at least one update.
fn should_render(timer: &StepTimer) -> bool {
    timer.frame_count() > 0
}
