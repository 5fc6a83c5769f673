use glam::Vec2;

use crate::model::OrbitCamera;

/// Turns pointer drags and wheel steps into orbit camera motion
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub rotate_speed: f32,
    pub pan_speed: f32,
    /// Distance factor per wheel notch
    pub dolly_step: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitController {
    pub fn new() -> Self {
        Self {
            rotate_speed: 1.0,
            pan_speed: 1.0,
            dolly_step: 0.95,
            min_distance: 1.0,
            max_distance: 80.0,
        }
    }

    /// A drag across the full viewport height turns the camera once around
    pub fn rotate(&self, camera: &mut OrbitCamera, delta: Vec2, viewport: Vec2) {
        let height = viewport.y.max(1.0);
        let turn = std::f32::consts::TAU * self.rotate_speed / height;
        camera.rotate(-delta.x * turn, delta.y * turn);
    }

    /// Moves the target so the point under the cursor stays under the cursor
    pub fn pan(&self, camera: &mut OrbitCamera, delta: Vec2, viewport: Vec2) {
        let height = viewport.y.max(1.0);
        let world_per_pixel = 2.0 * camera.distance * (camera.effective_fov() / 2.0).tan() / height;
        let offset = (-camera.right() * delta.x + camera.up() * delta.y) * world_per_pixel * self.pan_speed;
        camera.pan(offset);
    }

    /// Positive `delta_y` (scrolling towards the user) moves the camera away
    pub fn dolly(&self, camera: &mut OrbitCamera, delta_y: f32) {
        let factor = if delta_y > 0.0 {
            1.0 / self.dolly_step
        } else if delta_y < 0.0 {
            self.dolly_step
        } else {
            return;
        };
        camera.dolly(factor, self.min_distance, self.max_distance);
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new()
    }
}
