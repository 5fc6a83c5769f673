use glam::{Mat4, Vec2, Vec3, Vec4};

use super::picking::Ray;

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Perspective camera orbiting a target point
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Azimuth around +Y, zero looking down -Z from +Z
    pub yaw: f32,
    /// Elevation above the XZ plane
    pub pitch: f32,
    /// Vertical field of view before zoom (radians)
    pub fov_y: f32,
    /// Divides the field of view; 2.0 shows half as much
    pub zoom: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl OrbitCamera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut cam = Self {
            target: Vec3::ZERO,
            distance: 1.0,
            yaw: 0.0,
            pitch: 0.0,
            fov_y: 50f32.to_radians(),
            zoom: 1.0,
            aspect: 1.0,
            z_near: 0.1,
            z_far: 100.0,
        };
        cam.set_aspect(width, height);
        cam.look_from(Vec3::new(6.0, 6.0, 10.0), Vec3::ZERO);
        cam
    }

    /// Place the eye at `eye` looking at `target`
    pub fn look_from(&mut self, eye: Vec3, target: Vec3) {
        let offset = eye - target;
        self.target = target;
        self.distance = offset.length().max(f32::EPSILON);
        self.yaw = offset.x.atan2(offset.z);
        self.pitch = (offset.y / self.distance).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + self.distance * Vec3::new(cp * sy, sp, cp * cy)
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye()).normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or_zero()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize_or_zero()
    }

    /// Field of view after zoom
    pub fn effective_fov(&self) -> f32 {
        2.0 * ((self.fov_y / 2.0).tan() / self.zoom.max(f32::EPSILON)).atan()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.effective_fov(), self.aspect, self.z_near, self.z_far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn pan(&mut self, offset: Vec3) {
        self.target += offset;
    }

    pub fn dolly(&mut self, factor: f32, min: f32, max: f32) {
        self.distance = (self.distance * factor).clamp(min, max);
    }

    /// Ray from the eye through a point given in viewport pixels (origin top-left)
    pub fn screen_ray(&self, cursor: Vec2, viewport: Vec2) -> Ray {
        let ndc_x = cursor.x / viewport.x.max(1.0) * 2.0 - 1.0;
        let ndc_y = 1.0 - cursor.y / viewport.y.max(1.0) * 2.0;

        let inv = self.view_proj().inverse();
        let near = inv * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;

        Ray {
            origin: self.eye(),
            direction: (far - near).normalize_or_zero(),
        }
    }
}
