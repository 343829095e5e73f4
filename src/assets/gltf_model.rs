//! glTF 2.0 import (`.gltf` with external or embedded buffers, `.glb`)

use std::path::Path;

use cgmath::{Matrix4, Vector3};
use gltf::khr_lights_punctual::Kind as GltfLightKind;

use crate::{
    config::{LightKind, LightSpec},
    error::LoadError,
    gfx::scene::{Material, Mesh, Node, NodeId, NodeKind, SceneGraph},
};

/// Builds a scene graph from the default scene of a glTF document
pub fn parse(url: &str, bytes: &[u8], base: Option<&Path>) -> Result<SceneGraph, LoadError> {
    let gltf_error = |source| LoadError::Gltf {
        url: url.to_string(),
        source,
    };

    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(gltf_error)?;
    let buffers = gltf::import_buffers(&document, base, blob).map_err(gltf_error)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| LoadError::Empty {
            url: url.to_string(),
        })?;

    let mut graph = SceneGraph::new(scene.name().unwrap_or("Scene"));
    let root = graph.root();
    for node in scene.nodes() {
        add_node(&mut graph, root, &node, &buffers);
    }

    log::debug!(
        "Imported glTF '{}': {} nodes, {} meshes",
        url,
        graph.len(),
        graph.mesh_ids().len()
    );
    Ok(graph)
}

fn add_node(graph: &mut SceneGraph, parent: NodeId, node: &gltf::Node, buffers: &[gltf::buffer::Data]) {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let transform = Matrix4::from(node.transform().matrix());

    let mut meshes: Vec<(String, Mesh)> = node
        .mesh()
        .map(|mesh| read_mesh(&mesh, buffers))
        .unwrap_or_default();

    let kind = if meshes.len() == 1 {
        let (_, mesh) = meshes.remove(0);
        NodeKind::Mesh(mesh)
    } else if !meshes.is_empty() {
        NodeKind::Group
    } else if let Some(light) = node.light() {
        NodeKind::Light(convert_light(&light))
    } else if node.camera().is_some() {
        NodeKind::Other
    } else {
        NodeKind::Group
    };

    let id = graph.add_child(parent, Node::new(name, kind).with_transform(transform));

    // Multi-primitive meshes hang their primitives below the node
    for (primitive_name, mesh) in meshes {
        graph.add_child(id, Node::mesh(primitive_name, mesh));
    }

    for child in node.children() {
        add_node(graph, id, &child, buffers);
    }
}

fn read_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Vec<(String, Mesh)> {
    let mesh_name = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

    mesh.primitives()
        .filter(|primitive| primitive.mode() == gltf::mesh::Mode::Triangles)
        .filter_map(|primitive| {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

            let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
            let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            if indices.len() < 3 {
                return None;
            }

            let material = primitive.material();
            let pbr = material.pbr_metallic_roughness();
            let material = Material {
                base_color: pbr.base_color_factor(),
                emissive: material.emissive_factor(),
            };

            let name = format!("{}_{}", mesh_name, primitive.index());
            Some((name, Mesh::new(positions, normals, indices, material)))
        })
        .collect()
}

fn convert_light(light: &gltf::khr_lights_punctual::Light) -> LightSpec {
    let kind = match light.kind() {
        // glTF directional lights shine down their local -Z axis
        GltfLightKind::Directional => LightKind::Directional {
            position: Vector3::unit_z(),
        },
        GltfLightKind::Point | GltfLightKind::Spot { .. } => LightKind::Point {
            position: Vector3::new(0.0, 0.0, 0.0),
            range: light.range().unwrap_or(0.0),
        },
    };

    LightSpec {
        kind,
        color: light.color(),
        intensity: light.intensity(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    /// One triangle in the XY plane, embedded as a base64 data URI
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "name": "Louvre", "nodes": [0] }],
        "nodes": [
            { "name": "Building", "translation": [0.0, 5.0, 0.0], "children": [1, 2] },
            { "name": "Pyramid", "mesh": 0 },
            { "name": "Object_7", "mesh": 0 }
        ],
        "meshes": [{
            "name": "tri",
            "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }]
        }],
        "materials": [{
            "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.25, 1.0, 1.0] }
        }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        }]
    }"#;

    #[test]
    fn imports_nodes_meshes_and_transforms() {
        let graph = parse("louvre.gltf", TRIANGLE_GLTF.as_bytes(), None).unwrap();

        let mut names = Vec::new();
        graph.traverse(|_, node, _| names.push(node.name.clone()));
        assert_eq!(names, vec!["Louvre", "Building", "Pyramid", "Object_7"]);

        let pyramid = graph.find_by_name("Pyramid").unwrap();
        let node = graph.node(pyramid).unwrap();
        let mesh = node.as_mesh().unwrap();
        assert_eq!(mesh.triangles().count(), 1);
        assert_eq!(mesh.material.base_color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(mesh.material.emissive, [0.0, 0.0, 0.0]);

        let origin = graph.world_transform(pyramid) * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(origin, Vector4::new(0.0, 5.0, 0.0, 1.0));
    }

    #[test]
    fn shared_meshes_get_distinct_ids() {
        let graph = parse("louvre.gltf", TRIANGLE_GLTF.as_bytes(), None).unwrap();
        let ids = graph.mesh_ids();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn malformed_json_is_a_gltf_error() {
        let err = parse("broken.gltf", b"{ not json", None).unwrap_err();
        assert!(matches!(err, LoadError::Gltf { ref url, .. } if url == "broken.gltf"));
    }
}
