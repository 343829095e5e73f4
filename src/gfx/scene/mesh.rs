//! CPU-side triangle meshes
//!
//! Meshes keep their geometry on the CPU for picking; the render engine
//! uploads them lazily and keys the GPU copies by [`MeshId`].

use std::sync::atomic::{AtomicU64, Ordering};

use super::vertex::Vertex3D;
use crate::gfx::picking::Aabb;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique mesh identity used to key GPU resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        MeshId(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Surface appearance of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub base_color: [f32; 4],
    /// Emphasis color added on top of lighting; black means neutral
    pub emissive: [f32; 3],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
            emissive: [0.0, 0.0, 0.0],
        }
    }
}

pub struct Mesh {
    id: MeshId,
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    bounds: Aabb,
    pub material: Material,
}

impl Mesh {
    /// Builds a mesh from positions and triangle indices.
    ///
    /// Missing or mismatched normals are replaced by averaged face normals.
    /// Indices that reference missing vertices are dropped with their triangle.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        indices: Vec<u32>,
        material: Material,
    ) -> Self {
        let vertex_count = positions.len() as u32;
        let indices: Vec<u32> = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < vertex_count))
            .flatten()
            .copied()
            .collect();

        let normals = match normals {
            Some(normals) if normals.len() == positions.len() => normals,
            _ => Self::calculate_face_normals(&positions, &indices),
        };

        let bounds = Aabb::from_vertices(&positions);
        let vertices = positions
            .into_iter()
            .zip(normals)
            .map(|(position, normal)| Vertex3D { position, normal })
            .collect();

        Self {
            id: MeshId::next(),
            vertices,
            indices,
            bounds,
            material,
        }
    }

    /// Averages the face normals touching each vertex
    pub fn calculate_face_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut normals = vec![[0.0f32; 3]; positions.len()];

        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (v0, v1, v2) = (positions[a], positions[b], positions[c]);
            let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            let face = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            for i in [a, b, c] {
                for k in 0..3 {
                    normals[i][k] += face[k];
                }
            }
        }

        for n in normals.iter_mut() {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            *n = if len > f32::EPSILON {
                [n[0] / len, n[1] / len, n[2] / len]
            } else {
                [0.0, 1.0, 0.0]
            };
        }

        normals
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Local-space bounding box
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Triangles as position triples in local space
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.vertices[tri[0] as usize].position,
                self.vertices[tri[1] as usize].position,
                self.vertices[tri[2] as usize].position,
            ]
        })
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("id", &self.id)
            .field("vertices", &self.vertices.len())
            .field("triangles", &(self.indices.len() / 3))
            .field("material", &self.material)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            vec![0, 1, 2],
            Material::default(),
        )
    }

    #[test]
    fn face_normals_are_computed_when_missing() {
        let mesh = triangle();
        for v in mesh.vertices() {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn out_of_range_triangles_are_dropped() {
        let mesh = Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            vec![0, 1, 2, 0, 1, 7],
            Material::default(),
        );
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn every_mesh_gets_a_fresh_id() {
        assert_ne!(triangle().id(), triangle().id());
    }
}
