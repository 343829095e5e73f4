//! # Scene Management Module
//!
//! Scene graphs produced by the asset loader and the store that presents the
//! active one to the renderer.
//!
//! ## Key Components
//!
//! - [`SceneGraph`] - Arena of named [`Node`]s with a group root
//! - [`NodeKind`] - Explicit node tag: mesh, group, light or other
//! - [`Mesh`] - CPU geometry with a material and a [`MeshId`] for GPU caching
//! - [`SceneGraphStore`] - Graph, lights and environment of the active scene
//! - [`Vertex3D`] - GPU vertex layout
//!
//! ## Usage
//!
//! ```no_run
//! use doorway::config::ViewerConfig;
//! use doorway::gfx::scene::{Node, SceneGraph, SceneGraphStore};
//!
//! let config = ViewerConfig::default();
//! let mut store = SceneGraphStore::new(config.environment);
//! let mut graph = SceneGraph::new("room");
//! let root = graph.root();
//! graph.add_child(root, Node::group("furniture"));
//! store.install(graph);
//! ```

pub mod graph;
pub mod mesh;
pub mod store;
pub mod vertex;

// Re-export main types
pub use graph::{Node, NodeId, NodeKind, SceneGraph};
pub use mesh::{Material, Mesh, MeshId};
pub use store::SceneGraphStore;
pub use vertex::Vertex3D;
