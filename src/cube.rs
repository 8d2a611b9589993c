//! The one concrete mesh: a vertex-colored cube spanning -1..1 on every axis.

use crate::gpu::{GpuContext, GpuError};
use crate::mesh::{Mesh, MeshTransform, SimpleVertex};

#[rustfmt::skip]
const VERTICES: [SimpleVertex; 8] = [
    SimpleVertex::new([-1.0,  1.0, -1.0], [0.0, 0.0, 1.0, 1.0]),
    SimpleVertex::new([ 1.0,  1.0, -1.0], [0.0, 1.0, 0.0, 1.0]),
    SimpleVertex::new([ 1.0,  1.0,  1.0], [0.0, 1.0, 1.0, 1.0]),
    SimpleVertex::new([-1.0,  1.0,  1.0], [1.0, 0.0, 0.0, 1.0]),
    SimpleVertex::new([-1.0, -1.0, -1.0], [1.0, 0.0, 1.0, 1.0]),
    SimpleVertex::new([ 1.0, -1.0, -1.0], [1.0, 1.0, 0.0, 1.0]),
    SimpleVertex::new([ 1.0, -1.0,  1.0], [1.0, 1.0, 1.0, 1.0]),
    SimpleVertex::new([-1.0, -1.0,  1.0], [0.0, 0.0, 0.0, 1.0]),
];

// Two triangles per face: top, front (-Z), left, right, back (+Z), bottom.
#[rustfmt::skip]
const INDICES: [u16; 36] = [
    3, 1, 0,
    2, 1, 3,

    0, 5, 4,
    1, 5, 0,

    3, 4, 7,
    0, 4, 3,

    1, 6, 5,
    2, 6, 1,

    2, 7, 6,
    3, 7, 2,

    6, 4, 5,
    7, 4, 6,
];

/// GPU copies of the cube geometry, created on first render.
struct CubeBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
}

/// A fixed 8-vertex, 36-index cube.
///
/// The geometry is uploaded the first time the cube is rendered and reused
/// for every later frame.
pub struct CubeMesh {
    transform: MeshTransform,
    buffers: Option<CubeBuffers>,
}

impl Default for CubeMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeMesh {
    pub fn new() -> Self {
        Self {
            transform: MeshTransform::default(),
            buffers: None,
        }
    }

    /// The cube's vertices in model space.
    pub fn vertices(&self) -> &'static [SimpleVertex] {
        &VERTICES
    }

    /// Triangle-list indices into [`vertices`](Self::vertices).
    pub fn indices(&self) -> &'static [u16] {
        &INDICES
    }

    fn upload(gpu: &GpuContext) -> Result<CubeBuffers, GpuError> {
        let vertex = gpu.create_buffer_init(
            "Cube Vertex Buffer",
            bytemuck::cast_slice(&VERTICES),
            wgpu::BufferUsages::VERTEX,
        )?;
        let index = gpu.create_buffer_init(
            "Cube Index Buffer",
            bytemuck::cast_slice(&INDICES),
            wgpu::BufferUsages::INDEX,
        )?;
        log::debug!(
            "Uploaded cube geometry: {} vertices, {} indices",
            VERTICES.len(),
            INDICES.len()
        );
        Ok(CubeBuffers { vertex, index })
    }
}

impl Mesh for CubeMesh {
    fn transform(&self) -> &MeshTransform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut MeshTransform {
        &mut self.transform
    }

    fn render(
        &mut self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<(), GpuError> {
        let buffers = match self.buffers.take() {
            Some(buffers) => buffers,
            None => Self::upload(gpu)?,
        };
        let buffers = self.buffers.insert(buffers);

        render_pass.set_vertex_buffer(0, buffers.vertex.slice(..));
        render_pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..INDICES.len() as u32, 0, 0..1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::collections::HashMap;

    fn position(i: u16) -> Vec3 {
        Vec3::from_array(VERTICES[i as usize].position)
    }

    fn triangles() -> impl Iterator<Item = [u16; 3]> {
        INDICES.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    #[test]
    fn cube_counts() {
        let cube = CubeMesh::new();
        assert_eq!(cube.vertices().len(), 8);
        assert_eq!(cube.indices().len(), 36);
        assert_eq!(triangles().count(), 12);
    }

    #[test]
    fn indices_in_range() {
        assert!(INDICES.iter().all(|&i| (i as usize) < VERTICES.len()));
    }

    #[test]
    fn every_vertex_is_a_unit_corner() {
        for v in VERTICES {
            assert!(v.position.iter().all(|c| c.abs() == 1.0), "{:?}", v);
            assert_eq!(v.color[3], 1.0);
        }
        // All eight corners are distinct.
        for (i, a) in VERTICES.iter().enumerate() {
            for b in &VERTICES[i + 1..] {
                assert_ne!(a.position, b.position);
            }
        }
    }

    #[test]
    fn no_degenerate_triangles() {
        for [a, b, c] in triangles() {
            assert!(a != b && b != c && a != c, "{:?}", [a, b, c]);
            let area = (position(b) - position(a)).cross(position(c) - position(a));
            assert!(area.length() > 0.0);
        }
    }

    #[test]
    fn winding_is_consistently_outward() {
        for [a, b, c] in triangles() {
            let (pa, pb, pc) = (position(a), position(b), position(c));
            let normal = (pb - pa).cross(pc - pa);
            let centroid = (pa + pb + pc) / 3.0;
            assert!(
                normal.dot(centroid) > 0.0,
                "triangle {:?} faces inward",
                [a, b, c]
            );
        }
    }

    #[test]
    fn two_triangles_per_face() {
        let mut faces: HashMap<[i32; 3], usize> = HashMap::new();
        for [a, b, c] in triangles() {
            let (pa, pb, pc) = (position(a), position(b), position(c));
            let n = (pb - pa).cross(pc - pa).normalize();
            *faces.entry(n.round().as_ivec3().to_array()).or_default() += 1;
        }
        assert_eq!(faces.len(), 6);
        assert!(faces.values().all(|&n| n == 2));
    }

    #[test]
    fn mesh_is_closed() {
        // Each directed edge appears once and its reverse appears once.
        let mut edges: HashMap<(u16, u16), usize> = HashMap::new();
        for [a, b, c] in triangles() {
            for edge in [(a, b), (b, c), (c, a)] {
                *edges.entry(edge).or_default() += 1;
            }
        }
        for (&(from, to), &count) in &edges {
            assert_eq!(count, 1, "edge {}->{} repeated", from, to);
            assert_eq!(edges.get(&(to, from)), Some(&1), "edge {}->{} unmatched", from, to);
        }
    }

    #[test]
    fn new_cube_has_no_gpu_buffers() {
        let cube = CubeMesh::new();
        assert!(cube.buffers.is_none());
        assert_eq!(cube.world_matrix(), glam::Mat4::IDENTITY);
    }
}
