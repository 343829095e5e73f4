//! WGPU utility functions and helpers

pub mod uniform_buffer;

pub use uniform_buffer::{uniform_layout_entry, UniformBuffer};
