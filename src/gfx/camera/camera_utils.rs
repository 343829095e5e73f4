use cgmath::{Deg, Matrix4, SquareMatrix};
use winit::event::WindowEvent;

use super::{
    camera_controller::{CameraController, PointerGesture},
    map_camera::MapCamera,
};
use crate::config::ViewerConfig;

/// Drawable area in physical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

pub struct CameraManager {
    pub camera: MapCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: MapCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    /// Camera and map controls configured from the viewer settings
    pub fn from_config(config: &ViewerConfig) -> Self {
        let (width, height) = config.window_size;
        let mut camera = MapCamera::new(
            Deg(config.fovy_degrees).into(),
            width as f32 / height.max(1) as f32,
            config.znear,
            config.zfar,
        );
        camera.damping = Some(config.damping_factor);

        let mut controller = CameraController::new(1.0, 1.0);
        controller.click_tolerance = config.click_tolerance;

        Self::new(camera, controller)
    }

    /// Routes a window event through the map controls
    pub fn process_event(&mut self, event: &WindowEvent, viewport: Viewport) -> PointerGesture {
        self.controller
            .process_events(event, viewport, &mut self.camera)
    }

    /// Applies one damped navigation step; call once per rendered frame
    pub fn update(&mut self) {
        self.camera.update();
        self.camera.update_view_proj();
    }

    /// Get the view projection matrix from the camera
    pub fn get_view_proj_matrix(&self) -> cgmath::Matrix4<f32> {
        self.camera.build_view_projection_matrix()
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    /// Creates a default [CameraUniform].
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_conversion_keeps_columns() {
        let m = Matrix4::from_translation(cgmath::Vector3::new(1.0, 2.0, 3.0));
        let array = convert_matrix4_to_array(m);
        assert_eq!(array[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(array[0], [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn manager_uses_configured_damping_and_aspect() {
        let config = ViewerConfig::default();
        let manager = CameraManager::from_config(&config);
        assert_eq!(manager.camera.damping, Some(0.05));
        assert!((manager.camera.aspect - 1.5).abs() < 1e-6);
        assert_eq!(manager.controller.click_tolerance, 4.0);
    }

    #[test]
    fn degenerate_viewport_is_detected() {
        assert!(Viewport::new(0, 600).is_degenerate());
        assert!(!Viewport::new(800, 600).is_degenerate());
    }
}
