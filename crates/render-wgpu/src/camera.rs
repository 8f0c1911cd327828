use glam::{Vec2, Vec3};
use lavaworld_input::CameraAction;
use lavaworld_kernel::Camera;

/// Orbit camera controller: rotate around a target, pan, and zoom.
///
/// Camera motion is not part of the kernel's frame steps; the controller
/// only touches the camera's eye and target.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// World units per pixel of drag, per unit of distance to the target.
    pub pan_speed: f32,
    /// Distance multiplier per wheel line toward the target.
    pub zoom_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    home_eye: Vec3,
    home_target: Vec3,
}

const MIN_POLAR: f32 = 0.01;
const MAX_POLAR: f32 = std::f32::consts::PI - 0.01;

impl OrbitControls {
    /// Controller whose reset returns to the camera's current view.
    pub fn new(camera: &Camera) -> Self {
        Self {
            rotate_speed: 0.005,
            pan_speed: 0.0015,
            zoom_factor: 0.9,
            min_distance: 1.0,
            max_distance: 500.0,
            home_eye: camera.eye,
            home_target: camera.target,
        }
    }

    /// Apply one action. Returns whether the camera moved.
    pub fn apply(&self, camera: &mut Camera, action: CameraAction) -> bool {
        match action {
            CameraAction::Orbit(delta) => self.orbit(camera, delta),
            CameraAction::Pan(delta) => self.pan(camera, delta),
            CameraAction::Zoom(lines) => self.zoom(camera, lines),
            CameraAction::Reset => {
                camera.eye = self.home_eye;
                camera.target = self.home_target;
            }
            CameraAction::Noop => return false,
        }
        true
    }

    fn orbit(&self, camera: &mut Camera, delta: Vec2) {
        let offset = camera.eye - camera.target;
        let radius = offset.length().max(self.min_distance);
        let azimuth = offset.x.atan2(offset.z) - delta.x * self.rotate_speed;
        let polar = ((offset.y / radius).clamp(-1.0, 1.0).acos() - delta.y * self.rotate_speed)
            .clamp(MIN_POLAR, MAX_POLAR);
        camera.eye = camera.target
            + radius
                * Vec3::new(
                    polar.sin() * azimuth.sin(),
                    polar.cos(),
                    polar.sin() * azimuth.cos(),
                );
    }

    fn pan(&self, camera: &mut Camera, delta: Vec2) {
        let distance = (camera.eye - camera.target).length();
        let scale = distance * self.pan_speed;
        let shift = (-camera.right() * delta.x + camera.up() * delta.y) * scale;
        camera.eye += shift;
        camera.target += shift;
    }

    fn zoom(&self, camera: &mut Camera, lines: f32) {
        let offset = camera.eye - camera.target;
        let distance = (offset.length() * self.zoom_factor.powf(lines))
            .clamp(self.min_distance, self.max_distance);
        camera.eye = camera.target + offset.normalize_or(Vec3::Z) * distance;
    }
}
