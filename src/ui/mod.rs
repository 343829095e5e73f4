//! # User Interface Module
//!
//! Dear ImGui overlay drawn on top of the scene.
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu, input capture
//! - [`controls_panel`] - map control toggles and the load status readout
//!
//! When the overlay wants the pointer, window events stop there and never
//! reach the map controls or the picker.

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::controls_panel;
