//! GPU resource management
//!
//! Uniforms shared by a whole frame and the depth buffer.

pub mod global_bindings;
pub mod texture_resource;

pub use global_bindings::{GlobalBindings, GlobalUniform, GpuLight, MAX_LIGHTS};
pub use texture_resource::TextureResource;
