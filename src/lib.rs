//! # Playground
//!
//! A minimal rendering sample: one window, one pipeline, and a vertex-colored
//! cube that spins with elapsed time.
//!
//! ```no_run
//! fn main() {
//!     playground::run().unwrap();
//! }
//! ```
//!
//! The pieces are usable on their own:
//!
//! - [`Mesh`]: transform setters, world-matrix accessors and `render`
//! - [`CubeMesh`]: the fixed 8-vertex, 36-index cube
//! - [`Scene`] and [`StepTimer`]: the update half of the game loop
//! - [`Renderer`] and [`ConstantBuffers`]: the draw half
//!
//! Set `RUST_LOG=playground=debug` to see buffer uploads and resize events.

mod app;
mod camera;
mod constant_buffers;
mod cube;
mod game;
mod gpu;
mod mesh;
mod renderer;
mod scene;
mod timer;

pub use app::{AppConfig, run, run_with_config};
pub use camera::Camera;
pub use constant_buffers::{
    ChangesEveryFrame, ChangesEveryPrimitive, ChangesOnResize, ConstantBuffers,
};
pub use cube::CubeMesh;
pub use game::Game;
pub use gpu::{GpuContext, GpuError};
pub use mesh::{Mesh, MeshTransform, SimpleVertex, roll_pitch_yaw};
pub use renderer::Renderer;
pub use scene::Scene;
pub use timer::StepTimer;

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec3};
