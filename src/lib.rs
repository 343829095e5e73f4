//! Doorway walkthrough viewer
//!
//! A two-scene 3D viewer built on wgpu and winit: orbit around an exterior
//! model, click its door and step into the interior, where hovering the
//! exhibits highlights them.

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod gfx;
pub mod ui;
pub mod viewer;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::DoorwayApp;
pub use config::ViewerConfig;
pub use error::{LoadError, ViewerError};

/// Opens the viewer window and blocks until it is closed
pub fn run(config: ViewerConfig) -> Result<(), ViewerError> {
    DoorwayApp::new(config)?.run()
}
