//! # Graphics Module
//!
//! Everything between a loaded model and pixels on screen.
//!
//! - **Scene** ([`scene`]) - scene graph, meshes and the store holding the
//!   active scene
//! - **Camera** ([`camera`]) - damped map camera and its pointer controls
//! - **Picking** ([`picking`]) - ray casts from the pointer into the scene
//! - **Rendering** ([`rendering`]) - surface, pipeline and per-frame drawing
//! - **Resources** ([`resources`]) - global uniforms and depth texture

pub mod camera;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use camera::MapCamera;
pub use rendering::RenderEngine;
