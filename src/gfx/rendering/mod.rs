//! Core rendering functionality
//!
//! One mesh pipeline, GPU copies of scene meshes and frame rendering.

pub mod mesh_cache;
pub mod render_engine;

pub use mesh_cache::{MeshCache, ObjectUniform};
pub use render_engine::RenderEngine;
