//! The mesh abstraction: vertex format, transform state and the [`Mesh`] trait.
//!
//! - [`SimpleVertex`]: position plus RGBA color, the only vertex format the
//!   sample's pipeline reads
//! - [`MeshTransform`]: the world matrix and the last translation, rotation
//!   and scale handed to a mesh
//! - [`Mesh`]: the interface the game loop drives: transform setters, world
//!   matrix accessors and `render`
//!
//! # Transforms do not compose
//!
//! [`Mesh::translate`], [`Mesh::rotate`] and [`Mesh::scale`] each rebuild the
//! world matrix from their own argument alone. The last call wins:
//!
//! ```
//! use playground::{CubeMesh, Mesh, Vec3, Mat4};
//!
//! let mut cube = CubeMesh::new();
//! cube.scale(Vec3::splat(2.0));
//! cube.translate(Vec3::new(0.0, 1.0, 0.0));
//! assert_eq!(cube.world_matrix(), Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)));
//! ```
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | color     | Float32x4 | 12     | 1               |

use crate::gpu::{GpuContext, GpuError};
use glam::{EulerRot, Mat4, Vec3};

/// A vertex with a model-space position and an RGBA color.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimpleVertex {
    /// Model-space position.
    pub position: [f32; 3],
    /// Linear RGBA color, interpolated across the triangle.
    pub color: [f32; 4],
}

impl SimpleVertex {
    /// The wgpu vertex buffer layout for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SimpleVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // color
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };

    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Builds a rotation from pitch (`x`), yaw (`y`) and roll (`z`) angles in radians.
///
/// Roll is applied first, then pitch, then yaw.
pub fn roll_pitch_yaw(angles: Vec3) -> Mat4 {
    Mat4::from_euler(EulerRot::YXZ, angles.y, angles.x, angles.z)
}

/// Transform state shared by every mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshTransform {
    /// Matrix placing the mesh in world space.
    pub world: Mat4,
    /// Last value passed to [`Mesh::translate`].
    pub translation: Vec3,
    /// Last value passed to [`Mesh::rotate`] (pitch, yaw, roll).
    pub rotation: Vec3,
    /// Last value passed to [`Mesh::scale`].
    pub scale: Vec3,
}

impl Default for MeshTransform {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY,
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// A renderable object with a world transform.
///
/// Implementors only provide access to their [`MeshTransform`] and a `render`
/// body; the transform operations come for free.
pub trait Mesh {
    fn transform(&self) -> &MeshTransform;

    fn transform_mut(&mut self) -> &mut MeshTransform;

    /// Bind this mesh's geometry and issue its draw call.
    ///
    /// The caller has already set the pipeline and the per-primitive uniforms
    /// for this mesh on `render_pass`.
    fn render(
        &mut self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<(), GpuError>;

    /// Replace the world matrix with a translation by `translation`.
    fn translate(&mut self, translation: Vec3) {
        let t = self.transform_mut();
        t.translation = translation;
        t.world = Mat4::from_translation(translation);
    }

    /// Replace the world matrix with a rotation by `rotation` (pitch, yaw, roll).
    fn rotate(&mut self, rotation: Vec3) {
        let t = self.transform_mut();
        t.rotation = rotation;
        t.world = roll_pitch_yaw(rotation);
    }

    /// Replace the world matrix with a scale by `scale`.
    fn scale(&mut self, scale: Vec3) {
        let t = self.transform_mut();
        t.scale = scale;
        t.world = Mat4::from_scale(scale);
    }

    fn world_matrix(&self) -> Mat4 {
        self.transform().world
    }

    fn set_world_matrix(&mut self, world: Mat4) {
        self.transform_mut().world = world;
    }

    fn translation(&self) -> Vec3 {
        self.transform().translation
    }

    fn rotation(&self) -> Vec3 {
        self.transform().rotation
    }

    fn scale_factors(&self) -> Vec3 {
        self.transform().scale
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    /// A mesh with no geometry, for exercising the trait without a GPU.
    #[derive(Default)]
    pub(crate) struct NullMesh {
        pub(crate) transform: MeshTransform,
    }

    impl Mesh for NullMesh {
        fn transform(&self) -> &MeshTransform {
            &self.transform
        }

        fn transform_mut(&mut self) -> &mut MeshTransform {
            &mut self.transform
        }

        fn render(
            &mut self,
            _gpu: &GpuContext,
            _render_pass: &mut wgpu::RenderPass<'_>,
        ) -> Result<(), GpuError> {
            Ok(())
        }
    }

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        assert!(a.abs_diff_eq(b, 1e-5), "\n{:?}\n!=\n{:?}", a, b);
    }

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<SimpleVertex>(), 28);
        assert_eq!(SimpleVertex::LAYOUT.array_stride, 28);
    }

    #[test]
    fn new_mesh_has_identity_world() {
        let mesh = NullMesh::default();
        assert_eq!(mesh.world_matrix(), Mat4::IDENTITY);
        assert_eq!(mesh.translation(), Vec3::ZERO);
        assert_eq!(mesh.rotation(), Vec3::ZERO);
        assert_eq!(mesh.scale_factors(), Vec3::ONE);
    }

    #[test]
    fn rotation_on_all_axes() {
        let theta = 0.7;
        let expected = Mat4::from_rotation_y(theta)
            * Mat4::from_rotation_x(theta)
            * Mat4::from_rotation_z(theta);
        assert_mat_eq(roll_pitch_yaw(Vec3::splat(theta)), expected);
    }

    #[test]
    fn single_axis_rotations() {
        assert_mat_eq(
            roll_pitch_yaw(Vec3::new(FRAC_PI_4, 0.0, 0.0)),
            Mat4::from_rotation_x(FRAC_PI_4),
        );
        assert_mat_eq(
            roll_pitch_yaw(Vec3::new(0.0, FRAC_PI_4, 0.0)),
            Mat4::from_rotation_y(FRAC_PI_4),
        );
        assert_mat_eq(
            roll_pitch_yaw(Vec3::new(0.0, 0.0, FRAC_PI_4)),
            Mat4::from_rotation_z(FRAC_PI_4),
        );
    }

    #[test]
    fn yaw_quarter_turn_moves_x_to_negative_z() {
        let p = roll_pitch_yaw(Vec3::new(0.0, FRAC_PI_2, 0.0)).transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::NEG_Z, 1e-6), "{:?}", p);
    }

    #[test]
    fn roll_applies_before_pitch() {
        // Roll takes +X to +Y, then pitch takes +Y to +Z.
        let m = roll_pitch_yaw(Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::Z, 1e-6), "{:?}", p);
    }

    #[test]
    fn transforms_overwrite_instead_of_composing() {
        let mut mesh = NullMesh::default();

        mesh.translate(Vec3::new(1.0, 2.0, 3.0));
        mesh.rotate(Vec3::new(0.0, FRAC_PI_2, 0.0));
        assert_mat_eq(mesh.world_matrix(), Mat4::from_rotation_y(FRAC_PI_2));

        mesh.scale(Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(mesh.world_matrix(), Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0)));

        // Each setter still records its own vector.
        assert_eq!(mesh.translation(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.rotation(), Vec3::new(0.0, FRAC_PI_2, 0.0));
        assert_eq!(mesh.scale_factors(), Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn repeated_translate_is_not_cumulative() {
        let mut mesh = NullMesh::default();
        mesh.translate(Vec3::X);
        mesh.translate(Vec3::X);
        assert_eq!(mesh.world_matrix().w_axis.truncate(), Vec3::X);
    }

    #[test]
    fn set_world_matrix_round_trips() {
        let mut mesh = NullMesh::default();
        let m = Mat4::from_scale_rotation_translation(
            Vec3::splat(0.5),
            glam::Quat::from_rotation_z(1.0),
            Vec3::new(4.0, 5.0, 6.0),
        );
        mesh.set_world_matrix(m);
        assert_eq!(mesh.world_matrix(), m);
        // The recorded vectors are untouched.
        assert_eq!(mesh.translation(), Vec3::ZERO);
    }
}
