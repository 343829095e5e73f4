pub mod camera_controller;
pub mod camera_utils;
pub mod map_camera;

// Re-export main types
pub use camera_controller::{CameraController, PointerGesture};
pub use camera_utils::{CameraManager, CameraUniform, Viewport};
pub use map_camera::MapCamera;
