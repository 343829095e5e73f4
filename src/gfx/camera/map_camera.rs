use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use crate::config::{CameraPose, ControlBounds};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Keeps the polar angle away from the poles where `look_at` degenerates
const POLE_EPSILON: f32 = 1e-4;

/// Navigation input accumulated between two `update()` calls
#[derive(Debug, Clone, Copy)]
struct PendingMotion {
    theta: f32,
    phi: f32,
    pan: Vector3<f32>,
    scale: f32,
    dolly_focus: Option<Vector3<f32>>,
}

impl Default for PendingMotion {
    fn default() -> Self {
        Self {
            theta: 0.0,
            phi: 0.0,
            pan: Vector3::zero(),
            scale: 1.0,
            dolly_focus: None,
        }
    }
}

impl PendingMotion {
    fn is_idle(&self) -> bool {
        self.theta.abs() < f32::EPSILON
            && self.phi.abs() < f32::EPSILON
            && self.pan.magnitude2() < f32::EPSILON
            && (self.scale - 1.0).abs() < f32::EPSILON
    }
}

/// Perspective camera driven by damped map-style navigation.
///
/// Input never moves the camera directly; it accumulates motion that
/// [`MapCamera::update`] applies once per frame. With damping enabled each
/// update applies a fraction of the pending motion and decays the rest,
/// which produces the inertia.
#[derive(Debug, Clone, Copy)]
pub struct MapCamera {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: ControlBounds,
    /// Fraction of pending motion applied per frame, `None` disables damping
    pub damping: Option<f32>,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
    motion: PendingMotion,
}

impl Camera for MapCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection_matrix() * self.view_matrix()
    }
}

impl MapCamera {
    pub fn new(fovy: Rad<f32>, aspect: f32, znear: f32, zfar: f32) -> Self {
        Self {
            eye: Vector3::new(0.0, 0.0, 1.0),
            target: Vector3::zero(),
            up: Vector3::unit_y(),
            bounds: ControlBounds::default(),
            damping: None,
            aspect,
            fovy,
            znear,
            zfar,
            uniform: CameraUniform::default(),
            motion: PendingMotion::default(),
        }
    }

    /// Moves the eye without touching the target
    pub fn set_pose(&mut self, position: Vector3<f32>) {
        self.eye = position;
    }

    /// Points the camera at `target`
    pub fn look_at(&mut self, target: Vector3<f32>) {
        self.target = target;
    }

    /// Places the camera for a freshly activated scene and drops any motion
    /// left over from the previous one, so the next update does not animate
    pub fn apply_pose(&mut self, pose: &CameraPose) {
        self.bounds = pose.bounds;
        self.set_pose(pose.position);
        self.look_at(pose.target);
        self.reset_motion();
    }

    /// Discards pending (damped) navigation
    pub fn reset_motion(&mut self) {
        self.motion = PendingMotion::default();
    }

    /// Whether navigation input is still being applied
    pub fn is_moving(&self) -> bool {
        !self.motion.is_idle()
    }

    /// Orbits around the target; angles in radians
    pub fn rotate(&mut self, delta_theta: f32, delta_phi: f32) {
        self.motion.theta += delta_theta;
        self.motion.phi += delta_phi;
    }

    /// Moves eye and target together by a world-space offset
    pub fn pan(&mut self, offset: Vector3<f32>) {
        self.motion.pan += offset;
    }

    /// Scales the eye distance; `focus` pulls the target toward a world point
    pub fn dolly(&mut self, scale: f32, focus: Option<Vector3<f32>>) {
        self.motion.scale *= scale;
        self.motion.dolly_focus = focus;
    }

    pub fn distance(&self) -> f32 {
        (self.eye - self.target).magnitude()
    }

    /// Camera basis vectors (right, up, back) in world space
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        let back = (self.eye - self.target).normalize();
        let right = self.up.cross(back).normalize();
        let up = back.cross(right);
        (right, up, back)
    }

    /// Applies one step of pending motion; returns true if the eye moved
    pub fn update(&mut self) -> bool {
        let offset = self.eye - self.target;
        let radius = offset.magnitude();
        if radius <= f32::EPSILON {
            self.reset_motion();
            return false;
        }

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let min_phi = self.bounds.min_polar_angle.max(POLE_EPSILON);
        let max_phi = self.bounds.max_polar_angle.min(std::f32::consts::PI - POLE_EPSILON);
        let in_bounds = radius >= self.bounds.min_distance
            && radius <= self.bounds.max_distance
            && phi >= min_phi
            && phi <= max_phi;
        if self.motion.is_idle() && in_bounds {
            return false;
        }

        let step = self.damping.unwrap_or(1.0);
        theta += self.motion.theta * step;
        phi = (phi + self.motion.phi * step).clamp(min_phi, max_phi);
        self.target += self.motion.pan * step;

        let new_radius = (radius * self.motion.scale)
            .clamp(self.bounds.min_distance, self.bounds.max_distance);
        if let Some(focus) = self.motion.dolly_focus {
            self.target += (focus - self.target) * (1.0 - new_radius / radius);
        }

        let old_eye = self.eye;
        self.eye = self.target
            + Vector3::new(
                new_radius * phi.sin() * theta.sin(),
                new_radius * phi.cos(),
                new_radius * phi.sin() * theta.cos(),
            );

        match self.damping {
            Some(factor) => {
                let decay = 1.0 - factor;
                self.motion.theta *= decay;
                self.motion.phi *= decay;
                self.motion.pan *= decay;
            }
            None => {
                self.motion.theta = 0.0;
                self.motion.phi = 0.0;
                self.motion.pan = Vector3::zero();
            }
        }
        self.motion.scale = 1.0;
        self.motion.dolly_focus = None;

        (self.eye - old_eye).magnitude2() > 0.0
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.eye),
            Point3::from_vec(self.target),
            self.up,
        )
    }

    /// OpenGL-convention projection (NDC depth in [-1, 1])
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}
