//! # Object Picking System
//!
//! Maps a pointer position to the scene nodes underneath it by casting a ray
//! from the camera.
//!
//! ## How it works
//!
//! 1. **Pointer to Ray**: Normalize the pointer into [-1, 1] (vertical axis
//!    flipped) and unproject it through the camera
//! 2. **Broad phase**: Reject meshes whose world-space bounding box misses
//! 3. **Narrow phase**: Exact ray/triangle distance for the remaining meshes
//! 4. **Ordering**: Hits sorted nearest first; ties keep traversal order
//!
//! ## Usage
//!
//! ```no_run
//! use doorway::gfx::camera::{CameraManager, Viewport};
//! use doorway::gfx::picking::ObjectPicker;
//! use doorway::gfx::scene::SceneGraphStore;
//! use doorway::config::ViewerConfig;
//!
//! let config = ViewerConfig::default();
//! let cameras = CameraManager::from_config(&config);
//! let store = SceneGraphStore::new(config.environment);
//! let mut picker = ObjectPicker::new();
//! let result = picker.pick((400.0, 300.0), Viewport::new(800, 600), &cameras.camera, &store);
//! if let Some(hit) = result.nearest() {
//!     println!("Picked node {:?} at {:.2}", hit.node, hit.distance);
//! }
//! ```

use std::collections::HashMap;

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4, Zero};

use crate::gfx::{
    camera::{MapCamera, Viewport},
    scene::{Mesh, NodeId, NodeKind, SceneGraph, SceneGraphStore},
};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Double-sided Moller-Trumbore test; returns the distance along the ray
    pub fn intersect_triangle(&self, v0: Vector3<f32>, v1: Vector3<f32>, v2: Vector3<f32>) -> Option<f32> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < 1e-8 {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = self.origin - v0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > f32::EPSILON).then_some(t)
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl Aabb {
    /// Create a new AABB
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(Vector3::zero(), Vector3::zero());
        };

        let mut min = Vector3::new(first[0], first[1], first[2]);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            min.x = min.x.min(vertex[0]);
            min.y = min.y.min(vertex[1]);
            min.z = min.z.min(vertex[2]);
            max.x = max.x.max(vertex[0]);
            max.y = max.y.max(vertex[1]);
            max.z = max.z.max(vertex[2]);
        }

        Self::new(min, max)
    }

    /// Test ray-AABB intersection
    /// Returns the distance to intersection point, or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (min, max) = (self.min[axis], self.max[axis]);

            // Parallel to this slab: inside it or never
            if direction.abs() < 1e-8 {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let t1 = (min - origin) * inv;
            let t2 = (max - origin) * inv;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ];

        let transformed: Vec<[f32; 3]> = corners
            .iter()
            .map(|corner| transform_point(matrix, *corner).into())
            .collect();

        Self::from_vertices(&transformed)
    }
}

fn transform_point(matrix: &Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
    let v = matrix * Vector4::new(point.x, point.y, point.z, 1.0);
    Vector3::new(v.x / v.w, v.y / v.w, v.z / v.w)
}

/// One intersected node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    /// Distance from the camera eye to the intersection point
    pub distance: f32,
    /// World space intersection point
    pub intersection_point: Vector3<f32>,
}

/// Every node hit by one ray, nearest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickResult {
    hits: Vec<PickHit>,
}

impl PickResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a result from unordered hits; equal distances keep their order
    pub fn from_hits(mut hits: Vec<PickHit>) -> Self {
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self { hits }
    }

    pub fn nearest(&self) -> Option<&PickHit> {
        self.hits.first()
    }

    pub fn hits(&self) -> &[PickHit] {
        &self.hits
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Normalizes a pointer position into [-1, 1] on both axes, y pointing up
pub fn normalized_device_coords(pointer: (f32, f32), viewport: Viewport) -> Option<(f32, f32)> {
    if viewport.is_degenerate() {
        return None;
    }
    let x = (pointer.0 / viewport.width) * 2.0 - 1.0;
    let y = -(pointer.1 / viewport.height) * 2.0 + 1.0;
    Some((x, y))
}

/// Ray from the camera eye through the pointer position
pub fn screen_to_ray(pointer: (f32, f32), viewport: Viewport, camera: &MapCamera) -> Option<Ray> {
    let (ndc_x, ndc_y) = normalized_device_coords(pointer, viewport)?;

    let inv_view_proj = (camera.projection_matrix() * camera.view_matrix()).invert()?;
    let far = inv_view_proj * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);
    if far.w.abs() < f32::EPSILON {
        return None;
    }
    let far = Vector3::new(far.x / far.w, far.y / far.w, far.z / far.w);

    let direction = far - camera.eye;
    (direction.magnitude2() > 0.0).then(|| Ray::new(camera.eye, direction))
}

#[derive(Debug, Clone, Copy)]
struct CachedBounds {
    world: Matrix4<f32>,
    /// World to mesh space; `None` for singular transforms
    local: Option<Matrix4<f32>>,
    bounds: Aabb,
}

impl CachedBounds {
    /// Nearest triangle hit of `mesh` along the world-space `ray`
    fn nearest_hit(&self, ray: &Ray, mesh: &Mesh) -> Option<f32> {
        let Some(local) = self.local else {
            return mesh
                .triangles()
                .filter_map(|[a, b, c]| {
                    ray.intersect_triangle(
                        transform_point(&self.world, a.into()),
                        transform_point(&self.world, b.into()),
                        transform_point(&self.world, c.into()),
                    )
                })
                .min_by(|a, b| a.total_cmp(b));
        };

        let origin = transform_point(&local, ray.origin);
        let direction = (local * ray.direction.extend(0.0)).truncate();
        // Mesh-space distances shrink or grow by this factor
        let scale = direction.magnitude();
        if scale <= f32::EPSILON {
            return None;
        }
        let local_ray = Ray::new(origin, direction);

        mesh.triangles()
            .filter_map(|[a, b, c]| local_ray.intersect_triangle(a.into(), b.into(), c.into()))
            .map(|t| t / scale)
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Object picker for 3D pointer selection
pub struct ObjectPicker {
    /// World-space bounds per mesh node, valid for one store revision
    cached: HashMap<NodeId, CachedBounds>,
    cached_revision: Option<u64>,
}

impl ObjectPicker {
    /// Create a new object picker
    pub fn new() -> Self {
        Self {
            cached: HashMap::new(),
            cached_revision: None,
        }
    }

    /// Picks every mesh under the pointer in the store's active graph
    pub fn pick(
        &mut self,
        pointer: (f32, f32),
        viewport: Viewport,
        camera: &MapCamera,
        store: &SceneGraphStore,
    ) -> PickResult {
        if self.cached_revision != Some(store.revision()) {
            self.invalidate_cache();
            self.cached_revision = Some(store.revision());
        }

        let (Some(graph), Some(ray)) = (store.graph(), screen_to_ray(pointer, viewport, camera))
        else {
            return PickResult::empty();
        };

        self.intersect_graph(&ray, graph)
    }

    /// Intersects a ray with every visible mesh of a graph
    fn intersect_graph(&mut self, ray: &Ray, graph: &SceneGraph) -> PickResult {
        if self.cached.is_empty() {
            graph.traverse(|id, node, world| {
                if let NodeKind::Mesh(mesh) = &node.kind {
                    self.cached.insert(
                        id,
                        CachedBounds {
                            world: *world,
                            local: world.invert(),
                            bounds: mesh.bounds().transform(world),
                        },
                    );
                }
            });
        }

        let mut hits = Vec::new();
        graph.traverse(|id, node, _| {
            let NodeKind::Mesh(mesh) = &node.kind else {
                return;
            };
            if !node.visible {
                return;
            }
            let Some(cached) = self.cached.get(&id) else {
                return;
            };
            if cached.bounds.intersect_ray(ray).is_none() {
                return;
            }

            if let Some(distance) = cached.nearest_hit(ray, mesh) {
                hits.push(PickHit {
                    node: id,
                    distance,
                    intersection_point: ray.point_at(distance),
                });
            }
        });

        PickResult::from_hits(hits)
    }

    /// Invalidate cached bounds (call when node transforms change)
    pub fn invalidate_cache(&mut self) {
        self.cached.clear();
    }
}

impl Default for ObjectPicker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::gfx::scene::{Material, Mesh, Node};
    use cgmath::Deg;

    fn cube(half: f32) -> Mesh {
        let h = half;
        let positions = vec![
            [-h, -h, -h],
            [h, -h, -h],
            [h, h, -h],
            [-h, h, -h],
            [-h, -h, h],
            [h, -h, h],
            [h, h, h],
            [-h, h, h],
        ];
        let indices = vec![
            0, 1, 2, 0, 2, 3, // back
            4, 6, 5, 4, 7, 6, // front
            0, 4, 5, 0, 5, 1, // bottom
            3, 2, 6, 3, 6, 7, // top
            0, 3, 7, 0, 7, 4, // left
            1, 5, 6, 1, 6, 2, // right
        ];
        Mesh::new(positions, None, indices, Material::default())
    }

    fn at(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(x, y, z))
    }

    fn camera() -> MapCamera {
        let mut camera = MapCamera::new(Deg(60.0).into(), 1.0, 1.0, 1000.0);
        camera.set_pose(Vector3::new(0.0, 0.0, 10.0));
        camera.look_at(Vector3::zero());
        camera
    }

    fn viewport() -> Viewport {
        Viewport::new(600, 600)
    }

    /// Slightly right of center, off the diagonals of the cube faces
    const POINTER: (f32, f32) = (320.0, 300.0);

    fn store_with(graph: SceneGraph) -> SceneGraphStore {
        let mut store = SceneGraphStore::new(Environment {
            background: [0.0; 3],
            fog_density: 0.0,
        });
        store.install(graph);
        store
    }

    #[test]
    fn test_aabb_creation() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = Aabb::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray).is_some());

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn axis_aligned_ray_on_a_slab_face_still_hits() {
        let aabb = Aabb::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));

        // x and y components are exactly zero, origin lies on the x = 0 face
        let grazing = Ray::new(Vector3::new(0.0, 0.5, -5.0), Vector3::new(0.0, 0.0, 1.0));
        let distance = aabb.intersect_ray(&grazing).unwrap();
        assert!((distance - 5.0).abs() < 1e-5);

        let beside = Ray::new(Vector3::new(-0.1, 0.5, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&beside).is_none());
    }

    #[test]
    fn triangle_hit_reports_distance_from_both_sides() {
        let (a, b, c) = (
            Vector3::new(-1.0, -1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        );
        let front = Ray::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        let back = Ray::new(Vector3::new(0.0, 0.0, -2.0), Vector3::new(0.0, 0.0, 1.0));
        assert!((front.intersect_triangle(a, b, c).unwrap() - 3.0).abs() < 1e-5);
        assert!((back.intersect_triangle(a, b, c).unwrap() - 2.0).abs() < 1e-5);

        let away = Ray::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(away.intersect_triangle(a, b, c).is_none());
    }

    #[test]
    fn pointer_normalization_flips_the_vertical_axis() {
        let vp = Viewport::new(800, 600);
        assert_eq!(normalized_device_coords((400.0, 300.0), vp), Some((0.0, 0.0)));
        assert_eq!(normalized_device_coords((0.0, 0.0), vp), Some((-1.0, 1.0)));
        assert_eq!(normalized_device_coords((800.0, 600.0), vp), Some((1.0, -1.0)));
        assert_eq!(normalized_device_coords((1.0, 1.0), Viewport::new(0, 0)), None);
    }

    #[test]
    fn center_ray_points_at_the_target() {
        let ray = screen_to_ray((300.0, 300.0), viewport(), &camera()).unwrap();
        assert_eq!(ray.origin, Vector3::new(0.0, 0.0, 10.0));
        assert!((ray.direction - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-4);
    }

    #[test]
    fn empty_space_yields_empty_result() {
        let mut graph = SceneGraph::new("root");
        let root = graph.root();
        graph.add_child(root, Node::mesh("far_left", cube(1.0)).with_transform(at(-50.0, 0.0, 0.0)));
        let store = store_with(graph);

        let result = ObjectPicker::new().pick((300.0, 300.0), viewport(), &camera(), &store);
        assert!(result.is_empty());
        assert!(result.nearest().is_none());
    }

    #[test]
    fn nested_meshes_are_found_nearest_first() {
        let mut graph = SceneGraph::new("root");
        let root = graph.root();
        let group = graph.add_child(root, Node::group("wing").with_transform(at(0.0, 0.0, -2.0)));
        let far = graph.add_child(group, Node::mesh("far", cube(1.0)).with_transform(at(0.0, 0.0, -5.0)));
        let near = graph.add_child(group, Node::mesh("near", cube(1.0)).with_transform(at(0.0, 0.0, 4.0)));
        let store = store_with(graph);

        let result = ObjectPicker::new().pick(POINTER, viewport(), &camera(), &store);

        let order: Vec<NodeId> = result.hits().iter().map(|hit| hit.node).collect();
        assert_eq!(order, vec![near, far]);
        // near cube spans z in [1, 3]; camera sits at z = 10
        assert!((result.nearest().unwrap().distance - 7.0).abs() < 0.05);
    }

    #[test]
    fn scaled_meshes_report_world_distances() {
        let mut graph = SceneGraph::new("root");
        let root = graph.root();
        let tower = graph.add_child(
            root,
            Node::mesh("tower", cube(1.0))
                .with_transform(at(0.0, 0.0, -10.0) * Matrix4::from_nonuniform_scale(2.0, 2.0, 4.0)),
        );
        let ray = Ray::new(Vector3::new(0.1, 0.2, 0.0), Vector3::new(0.0, 0.0, -1.0));

        let result = ObjectPicker::new().intersect_graph(&ray, &graph);

        let hit = result.nearest().unwrap();
        assert_eq!(hit.node, tower);
        // front face of the stretched cube sits at z = -10 + 4
        assert!((hit.distance - 6.0).abs() < 1e-4);
        assert!((hit.intersection_point - Vector3::new(0.1, 0.2, -6.0)).magnitude() < 1e-4);
    }

    #[test]
    fn equidistant_hits_keep_traversal_order() {
        let mut graph = SceneGraph::new("root");
        let root = graph.root();
        let first = graph.add_child(root, Node::mesh("first", cube(1.0)));
        let second = graph.add_child(root, Node::mesh("second", cube(1.0)));
        let store = store_with(graph);
        let mut picker = ObjectPicker::new();

        for _ in 0..3 {
            let result = picker.pick(POINTER, viewport(), &camera(), &store);
            let order: Vec<NodeId> = result.hits().iter().map(|hit| hit.node).collect();
            assert_eq!(order, vec![first, second]);
        }
    }

    #[test]
    fn hidden_meshes_are_skipped() {
        let mut graph = SceneGraph::new("root");
        let root = graph.root();
        let mut hidden = Node::mesh("hidden", cube(1.0));
        hidden.visible = false;
        graph.add_child(root, hidden);
        let store = store_with(graph);

        let result = ObjectPicker::new().pick(POINTER, viewport(), &camera(), &store);
        assert!(result.is_empty());
    }

    #[test]
    fn cache_follows_store_revision() {
        let mut graph = SceneGraph::new("root");
        let root = graph.root();
        graph.add_child(root, Node::mesh("a", cube(1.0)));
        let mut store = store_with(graph);
        let mut picker = ObjectPicker::new();
        assert_eq!(picker.pick(POINTER, viewport(), &camera(), &store).len(), 1);

        let mut moved = SceneGraph::new("root");
        let root = moved.root();
        moved.add_child(root, Node::mesh("b", cube(1.0)).with_transform(at(40.0, 0.0, 0.0)));
        store.install(moved);

        assert!(picker.pick(POINTER, viewport(), &camera(), &store).is_empty());
    }
}
