//! Scene graph store
//!
//! Holds everything the renderer draws for the active scene: one loaded
//! graph, the fixed lights installed around it and the shared environment.
//! Clearing the store is all-or-nothing and records the released meshes so
//! the render engine can destroy their GPU buffers.

use cgmath::{InnerSpace, Vector3, Vector4};

use super::{
    graph::{NodeKind, SceneGraph},
    mesh::MeshId,
};
use crate::config::{Environment, LightKind, LightSpec};

pub struct SceneGraphStore {
    graph: Option<SceneGraph>,
    lights: Vec<LightSpec>,
    environment: Environment,
    released: Vec<MeshId>,
    revision: u64,
}

impl SceneGraphStore {
    pub fn new(environment: Environment) -> Self {
        Self {
            graph: None,
            lights: Vec::new(),
            environment,
            released: Vec::new(),
            revision: 0,
        }
    }

    /// Drops the graph and every light; mesh ids are queued for disposal
    pub fn clear(&mut self) {
        if let Some(graph) = self.graph.take() {
            self.released.extend(graph.mesh_ids());
        }
        self.lights.clear();
        self.revision += 1;
    }

    /// Installs a loaded graph, replacing (and releasing) any previous one
    pub fn install(&mut self, graph: SceneGraph) {
        if let Some(previous) = self.graph.replace(graph) {
            self.released.extend(previous.mesh_ids());
        }
        self.revision += 1;
    }

    pub fn add_light(&mut self, light: LightSpec) {
        self.lights.push(light);
        self.revision += 1;
    }

    pub fn graph(&self) -> Option<&SceneGraph> {
        self.graph.as_ref()
    }

    pub fn graph_mut(&mut self) -> Option<&mut SceneGraph> {
        self.graph.as_mut()
    }

    /// Lights installed directly into the store
    pub fn lights(&self) -> &[LightSpec] {
        &self.lights
    }

    /// Store lights followed by light nodes of the graph, in world space
    pub fn collect_lights(&self) -> Vec<LightSpec> {
        let mut lights = self.lights.clone();
        if let Some(graph) = &self.graph {
            graph.traverse(|_, node, world| {
                if let NodeKind::Light(spec) = &node.kind {
                    lights.push(world_light(spec, world));
                }
            });
        }
        lights
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_none() && self.lights.is_empty()
    }

    /// Meshes released since the last call
    pub fn take_released(&mut self) -> Vec<MeshId> {
        std::mem::take(&mut self.released)
    }

    /// Increments whenever the content of the store is replaced
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

fn world_light(spec: &LightSpec, world: &cgmath::Matrix4<f32>) -> LightSpec {
    // w = 0 keeps node translation out of directions
    let to_world = |p: Vector3<f32>, w: f32| {
        let v = world * Vector4::new(p.x, p.y, p.z, w);
        Vector3::new(v.x, v.y, v.z)
    };
    let kind = match spec.kind {
        LightKind::Ambient => LightKind::Ambient,
        LightKind::Directional { position } => {
            let direction = to_world(position, 0.0);
            LightKind::Directional {
                position: if direction.magnitude2() > 0.0 {
                    direction.normalize()
                } else {
                    position
                },
            }
        }
        LightKind::Point { position, range } => LightKind::Point {
            position: to_world(position, 1.0),
            range,
        },
    };
    LightSpec { kind, ..*spec }
}
