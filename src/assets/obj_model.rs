//! Wavefront OBJ import via tobj

use std::{io::Cursor, path::Path};

use crate::{
    error::LoadError,
    gfx::scene::{Material, Mesh, Node, SceneGraph},
};

/// Builds a scene graph with one mesh node per OBJ object.
///
/// Material libraries are resolved relative to `base`; when they cannot be
/// loaded the meshes fall back to the default material.
pub fn parse(url: &str, bytes: &[u8], base: Option<&Path>) -> Result<SceneGraph, LoadError> {
    let mut reader = Cursor::new(bytes);
    let (models, materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |mtl_path| match base {
            Some(dir) => tobj::load_mtl(dir.join(mtl_path)),
            None => Err(tobj::LoadError::OpenFileFailed),
        },
    )
    .map_err(|source| LoadError::Obj {
        url: url.to_string(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("Failed to load materials for {}: {}", url, e);
        Vec::new()
    });

    let root_name = Path::new(url)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("model");
    let mut graph = SceneGraph::new(root_name);
    let root = graph.root();

    for model in models {
        let mesh = &model.mesh;
        if mesh.indices.len() < 3 {
            log::debug!("Skipping OBJ object '{}' without faces", model.name);
            continue;
        }
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let normals = (!mesh.normals.is_empty()).then(|| {
            mesh.normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect::<Vec<_>>()
        });

        let material = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .map(|mtl| {
                let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
                Material {
                    base_color: [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)],
                    ..Material::default()
                }
            })
            .unwrap_or_default();

        let indices = mesh.indices.clone();
        graph.add_child(root, Node::mesh(model.name, Mesh::new(positions, normals, indices, material)));
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PYRAMID_OBJ: &str = "\
o Pyramid
v -1.0 0.0 -1.0
v 1.0 0.0 -1.0
v 1.0 0.0 1.0
v -1.0 0.0 1.0
v 0.0 1.5 0.0
f 1 2 5
f 2 3 5
f 3 4 5
f 4 1 5
f 1 4 3 2
o Ground
v -10.0 -0.1 -10.0
v 10.0 -0.1 -10.0
v 10.0 -0.1 10.0
f 6 7 8
";

    #[test]
    fn objects_become_mesh_nodes() {
        let graph = parse("models/louvre.obj", PYRAMID_OBJ.as_bytes(), None).unwrap();

        let mut names = Vec::new();
        graph.traverse(|_, node, _| names.push(node.name.clone()));
        assert_eq!(names, vec!["louvre", "Pyramid", "Ground"]);

        let pyramid = graph.find_by_name("Pyramid").unwrap();
        let mesh = graph.node(pyramid).unwrap().as_mesh().unwrap();
        // four sides plus the triangulated base
        assert_eq!(mesh.triangles().count(), 6);
        assert_eq!(mesh.material, Material::default());
    }

    #[test]
    fn objects_without_faces_are_skipped() {
        let source = format!("{}o Marker\nv 5.0 5.0 5.0\n", PYRAMID_OBJ);
        let graph = parse("louvre.obj", source.as_bytes(), None).unwrap();
        assert!(graph.find_by_name("Marker").is_none());
        assert_eq!(graph.mesh_ids().len(), 2);
    }

    #[test]
    fn missing_material_library_is_not_fatal() {
        let source = format!("mtllib missing.mtl\nusemtl stone\n{}", PYRAMID_OBJ);
        let graph = parse("louvre.obj", source.as_bytes(), None).unwrap();
        assert_eq!(graph.mesh_ids().len(), 2);
    }
}
