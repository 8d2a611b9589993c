//! The objects in the world and the per-tick update step.

use crate::cube::CubeMesh;
use crate::mesh::{Mesh, roll_pitch_yaw};
use crate::timer::StepTimer;
use glam::Vec3;

/// Every mesh the game loop updates and draws, in draw order.
#[derive(Default)]
pub struct Scene {
    meshes: Vec<Box<dyn Mesh>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sample's starting scene: a single cube at the origin.
    pub fn with_default_objects() -> Self {
        let mut scene = Self::new();
        scene.add(CubeMesh::new());
        scene
    }

    /// Add a mesh and return its draw index.
    pub fn add(&mut self, mesh: impl Mesh + 'static) -> usize {
        self.meshes.push(Box::new(mesh));
        self.meshes.len() - 1
    }

    pub fn meshes(&self) -> &[Box<dyn Mesh>] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [Box<dyn Mesh>] {
        &mut self.meshes
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Spin every mesh by the total elapsed time on all three axes.
    pub fn update(&mut self, timer: &StepTimer) {
        let t = timer.total_seconds() as f32;
        let world = roll_pitch_yaw(Vec3::splat(t));
        for mesh in &mut self.meshes {
            mesh.set_world_matrix(world);
        }
    }
}
