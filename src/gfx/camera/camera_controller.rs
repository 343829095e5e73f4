use cgmath::{InnerSpace, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use super::{camera_utils::Viewport, map_camera::MapCamera};
use crate::gfx::picking::screen_to_ray;

/// Per-notch dolly factor before `zoom_speed` is applied
const DOLLY_STEP: f32 = 0.95;
/// Pixels per wheel line for touchpads reporting pixel deltas
const PIXELS_PER_LINE: f32 = 50.0;

/// Pointer activity the viewer cares about after the controls had their turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerGesture {
    None,
    /// Pointer moved without a drag in progress
    Hover { x: f32, y: f32 },
    /// Left button released without dragging past the click tolerance
    Click { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Pan,
    Rotate,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    mode: DragMode,
    origin: (f32, f32),
    travelled: f32,
}

/// Map-style controls: left drag pans, right drag orbits, the wheel dollies.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Dolly toward the point under the cursor instead of the target
    pub zoom_to_cursor: bool,
    /// Pan in the screen plane instead of the ground plane
    pub screen_space_panning: bool,
    pub click_tolerance: f32,
    cursor: Option<(f32, f32)>,
    drag: Option<Drag>,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 1.0,
            zoom_to_cursor: false,
            screen_space_panning: false,
            click_tolerance: 4.0,
            cursor: None,
            drag: None,
        }
    }

    pub fn process_events(
        &mut self,
        event: &WindowEvent,
        viewport: Viewport,
        camera: &mut MapCamera,
    ) -> PointerGesture {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved((position.x as f32, position.y as f32), viewport, camera)
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.button(*button, *state == ElementState::Pressed)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => {
                        *y as f32 / PIXELS_PER_LINE
                    }
                };
                self.scroll(lines, viewport, camera);
                PointerGesture::None
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = None;
                PointerGesture::None
            }
            _ => PointerGesture::None,
        }
    }

    /// Tracks the cursor; drags pan or orbit, plain moves become hovers
    pub fn cursor_moved(
        &mut self,
        position: (f32, f32),
        viewport: Viewport,
        camera: &mut MapCamera,
    ) -> PointerGesture {
        let previous = self.cursor.replace(position);

        let Some(mut drag) = self.drag else {
            return PointerGesture::Hover {
                x: position.0,
                y: position.1,
            };
        };

        if let Some(previous) = previous {
            let delta = (position.0 - previous.0, position.1 - previous.1);
            match drag.mode {
                DragMode::Pan => self.pan(delta, viewport, camera),
                DragMode::Rotate => self.rotate(delta, viewport, camera),
            }
        }
        let (dx, dy) = (position.0 - drag.origin.0, position.1 - drag.origin.1);
        drag.travelled = drag.travelled.max((dx * dx + dy * dy).sqrt());
        self.drag = Some(drag);

        PointerGesture::None
    }

    /// Starts or ends a drag; a short left press yields a click
    pub fn button(&mut self, button: MouseButton, pressed: bool) -> PointerGesture {
        let mode = match button {
            MouseButton::Left => DragMode::Pan,
            MouseButton::Right => DragMode::Rotate,
            _ => return PointerGesture::None,
        };

        if pressed {
            if self.drag.is_none() {
                self.drag = Some(Drag {
                    mode,
                    origin: self.cursor.unwrap_or((0.0, 0.0)),
                    travelled: 0.0,
                });
            }
            return PointerGesture::None;
        }

        match self.drag {
            Some(drag) if drag.mode == mode => {
                self.drag = None;
                match self.cursor {
                    Some((x, y)) if mode == DragMode::Pan && drag.travelled <= self.click_tolerance => {
                        PointerGesture::Click { x, y }
                    }
                    _ => PointerGesture::None,
                }
            }
            _ => PointerGesture::None,
        }
    }

    /// Dollies by wheel lines; positive values zoom in
    pub fn scroll(&mut self, lines: f32, viewport: Viewport, camera: &mut MapCamera) {
        if lines == 0.0 {
            return;
        }
        let step = DOLLY_STEP.powf(self.zoom_speed * lines.abs());
        let scale = if lines > 0.0 { step } else { 1.0 / step };

        let focus = if self.zoom_to_cursor {
            self.cursor
                .and_then(|cursor| cursor_focus(cursor, viewport, camera))
        } else {
            None
        };
        camera.dolly(scale, focus);
    }

    /// Returns true while a button drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        matches!(self.drag, Some(Drag { mode: DragMode::Pan, .. }))
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        matches!(self.drag, Some(Drag { mode: DragMode::Rotate, .. }))
    }

    fn pan(&self, delta: (f32, f32), viewport: Viewport, camera: &mut MapCamera) {
        if viewport.is_degenerate() {
            return;
        }
        let target_distance = camera.distance() * (camera.fovy.0 / 2.0).tan();
        let scale = 2.0 * target_distance / viewport.height * self.pan_speed;

        let (right, up, _) = camera.basis();
        let vertical = if self.screen_space_panning {
            up
        } else {
            camera.up.cross(right).normalize()
        };

        camera.pan(-right * delta.0 * scale + vertical * delta.1 * scale);
    }

    fn rotate(&self, delta: (f32, f32), viewport: Viewport, camera: &mut MapCamera) {
        if viewport.is_degenerate() {
            return;
        }
        let per_pixel = 2.0 * std::f32::consts::PI / viewport.height * self.rotate_speed;
        camera.rotate(-delta.0 * per_pixel, -delta.1 * per_pixel);
    }
}

/// Point under the cursor on the plane through the target facing the camera
fn cursor_focus(cursor: (f32, f32), viewport: Viewport, camera: &MapCamera) -> Option<Vector3<f32>> {
    let ray = screen_to_ray(cursor, viewport, camera)?;
    let (_, _, back) = camera.basis();
    let denom = ray.direction.dot(back);
    if denom.abs() < f32::EPSILON {
        return None;
    }
    let t = (camera.target - ray.origin).dot(back) / denom;
    (t > 0.0).then(|| ray.point_at(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Deg;

    fn viewport() -> Viewport {
        Viewport::new(800, 600)
    }

    fn camera() -> MapCamera {
        let mut camera = MapCamera::new(Deg(60.0).into(), 800.0 / 600.0, 1.0, 1000.0);
        camera.set_pose(Vector3::new(0.0, 10.0, 10.0));
        camera
    }

    #[test]
    fn short_left_press_is_a_click() {
        let mut controls = CameraController::new(1.0, 1.0);
        let mut camera = camera();
        controls.cursor_moved((100.0, 100.0), viewport(), &mut camera);
        controls.button(MouseButton::Left, true);
        controls.cursor_moved((102.0, 101.0), viewport(), &mut camera);

        assert_eq!(
            controls.button(MouseButton::Left, false),
            PointerGesture::Click { x: 102.0, y: 101.0 }
        );
        assert!(!controls.is_dragging());
    }

    #[test]
    fn drag_beyond_tolerance_is_not_a_click() {
        let mut controls = CameraController::new(1.0, 1.0);
        let mut camera = camera();
        controls.cursor_moved((100.0, 100.0), viewport(), &mut camera);
        controls.button(MouseButton::Left, true);
        assert!(controls.is_panning());
        controls.cursor_moved((160.0, 100.0), viewport(), &mut camera);
        controls.cursor_moved((101.0, 100.0), viewport(), &mut camera);

        assert_eq!(controls.button(MouseButton::Left, false), PointerGesture::None);
    }

    #[test]
    fn right_button_release_never_clicks() {
        let mut controls = CameraController::new(1.0, 1.0);
        let mut camera = camera();
        controls.cursor_moved((10.0, 10.0), viewport(), &mut camera);
        controls.button(MouseButton::Right, true);
        assert!(controls.is_rotating());
        assert_eq!(controls.button(MouseButton::Right, false), PointerGesture::None);
    }

    #[test]
    fn moves_without_drag_are_hovers() {
        let mut controls = CameraController::new(1.0, 1.0);
        let mut camera = camera();
        assert_eq!(
            controls.cursor_moved((5.0, 6.0), viewport(), &mut camera),
            PointerGesture::Hover { x: 5.0, y: 6.0 }
        );
    }

    #[test]
    fn ground_panning_keeps_target_height() {
        let mut controls = CameraController::new(1.0, 1.0);
        let mut camera = camera();
        controls.cursor_moved((400.0, 300.0), viewport(), &mut camera);
        controls.button(MouseButton::Left, true);
        controls.cursor_moved((400.0, 350.0), viewport(), &mut camera);
        camera.update();

        assert!(camera.target.y.abs() < 1e-4);
        assert!(camera.target.z < 0.0, "dragging down moves forward");
    }

    #[test]
    fn screen_space_panning_moves_along_camera_up() {
        let mut controls = CameraController::new(1.0, 1.0);
        controls.screen_space_panning = true;
        let mut camera = camera();
        controls.cursor_moved((400.0, 300.0), viewport(), &mut camera);
        controls.button(MouseButton::Left, true);
        controls.cursor_moved((400.0, 350.0), viewport(), &mut camera);
        camera.update();

        assert!(camera.target.y > 0.0);
    }

    #[test]
    fn scrolling_up_zooms_in() {
        let mut controls = CameraController::new(1.0, 1.0);
        let mut camera = camera();
        let before = camera.distance();
        controls.scroll(1.0, viewport(), &mut camera);
        camera.update();
        assert!(camera.distance() < before);

        let before = camera.distance();
        controls.scroll(-2.0, viewport(), &mut camera);
        camera.update();
        assert!(camera.distance() > before);
    }

    #[test]
    fn zoom_to_cursor_shifts_target_toward_cursor() {
        let mut controls = CameraController::new(1.0, 1.0);
        controls.zoom_to_cursor = true;
        let mut camera = camera();
        controls.cursor_moved((700.0, 300.0), viewport(), &mut camera);
        controls.scroll(3.0, viewport(), &mut camera);
        camera.update();

        assert!(camera.target.x > 0.0);
    }
}
