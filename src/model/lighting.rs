use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use glam::Vec3;

use super::scene::Color;

pub const ZOOM_RANGE: RangeInclusive<f32> = 0.5..=2.0;
pub const INTENSITY_RANGE: RangeInclusive<f32> = 0.0..=2.0;
pub const ANGLE_RANGE: RangeInclusive<f32> = 0.0..=TAU;

const AMBIENT_INTENSITY: f32 = 0.3;
const DIR_LIGHT_RADIUS: f32 = 15.0;
const DIR_LIGHT_HEIGHT: f32 = 10.0;
const POINT_LIGHT_POS: Vec3 = Vec3::new(-5.0, 5.0, 5.0);
const SPOT_LIGHT_POS: Vec3 = Vec3::new(0.0, 8.0, -8.0);
const SPOT_ANGLE: f32 = 0.3;
const SPOT_PENUMBRA: f32 = 0.5;

const MAGENTA: Color = [1.0, 0.0, 1.0];
const YELLOW: Color = [1.0, 1.0, 0.0];
const CYAN: Color = [0.0, 1.0, 1.0];

/// Slider-driven camera zoom and light parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSettings {
    pub zoom: f32,
    pub dir_light: f32,
    pub point_light: f32,
    pub spot_light: f32,
    /// Position of the directional lights on their circle (radians)
    pub dir_light_angle: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            dir_light: 1.4,
            point_light: 0.6,
            spot_light: 0.8,
            dir_light_angle: 2.0,
        }
    }
}

fn clamp_to(value: f32, range: &RangeInclusive<f32>) -> f32 {
    if value.is_nan() {
        return *range.start();
    }
    value.clamp(*range.start(), *range.end())
}

impl LightSettings {
    pub fn set_zoom(&mut self, value: f32) {
        self.zoom = clamp_to(value, &ZOOM_RANGE);
    }

    pub fn set_dir_light(&mut self, value: f32) {
        self.dir_light = clamp_to(value, &INTENSITY_RANGE);
    }

    pub fn set_point_light(&mut self, value: f32) {
        self.point_light = clamp_to(value, &INTENSITY_RANGE);
    }

    pub fn set_spot_light(&mut self, value: f32) {
        self.spot_light = clamp_to(value, &INTENSITY_RANGE);
    }

    pub fn set_dir_light_angle(&mut self, value: f32) {
        self.dir_light_angle = clamp_to(value, &ANGLE_RANGE);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Resolve the slider values into concrete light sources
    pub fn rig(&self) -> LightRig {
        let (s, c) = self.dir_light_angle.sin_cos();
        let x = c * DIR_LIGHT_RADIUS;
        let z = s * DIR_LIGHT_RADIUS;
        let directional = [
            (Vec3::new(x, DIR_LIGHT_HEIGHT, -z), MAGENTA),
            (Vec3::new(-x, DIR_LIGHT_HEIGHT, -z), YELLOW),
            (Vec3::new(-x, DIR_LIGHT_HEIGHT, z), CYAN),
        ]
        .map(|(position, color)| DirectionalLight {
            position,
            color,
            intensity: self.dir_light,
        });

        LightRig {
            ambient: AMBIENT_INTENSITY,
            directional,
            point: PointLight {
                position: POINT_LIGHT_POS,
                intensity: self.point_light,
            },
            spot: SpotLight {
                position: SPOT_LIGHT_POS,
                target: Vec3::ZERO,
                intensity: self.spot_light,
                angle: SPOT_ANGLE,
                penumbra: SPOT_PENUMBRA,
            },
        }
    }
}

/// Shines from `position` towards the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
}

impl DirectionalLight {
    /// Unit vector from the lit surface towards the light
    pub fn to_light(&self) -> Vec3 {
        self.position.normalize_or_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub target: Vec3,
    pub intensity: f32,
    /// Half-angle of the outer cone
    pub angle: f32,
    /// Fraction of the cone over which the edge fades out
    pub penumbra: f32,
}

impl SpotLight {
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// (cos outer, cos inner) for the smoothstep falloff
    pub fn cone_cosines(&self) -> (f32, f32) {
        (self.angle.cos(), (self.angle * (1.0 - self.penumbra)).cos())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub ambient: f32,
    pub directional: [DirectionalLight; 3],
    pub point: PointLight,
    pub spot: SpotLight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo() {
        let s = LightSettings::default();
        assert_eq!(s.zoom, 1.0);
        assert_eq!(s.dir_light, 1.4);
        assert_eq!(s.point_light, 0.6);
        assert_eq!(s.spot_light, 0.8);
        assert_eq!(s.dir_light_angle, 2.0);
    }

    #[test]
    fn setters_clamp_to_slider_range() {
        let mut s = LightSettings::default();
        s.set_zoom(10.0);
        s.set_dir_light(-1.0);
        s.set_dir_light_angle(f32::NAN);
        assert_eq!(s.zoom, 2.0);
        assert_eq!(s.dir_light, 0.0);
        assert_eq!(s.dir_light_angle, 0.0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut s = LightSettings::default();
        s.set_zoom(0.5);
        s.set_point_light(2.0);
        s.set_spot_light(0.0);
        s.reset();
        assert_eq!(s, LightSettings::default());
    }

    #[test]
    fn directional_lights_sit_on_circle() {
        let mut s = LightSettings::default();
        s.set_dir_light_angle(0.0);
        let rig = s.rig();
        assert_eq!(rig.directional[0].position, Vec3::new(15.0, 10.0, 0.0));
        assert_eq!(rig.directional[1].position, Vec3::new(-15.0, 10.0, 0.0));
        for light in rig.directional {
            let flat = Vec3::new(light.position.x, 0.0, light.position.z);
            assert!((flat.length() - 15.0).abs() < 1e-4);
            assert_eq!(light.intensity, s.dir_light);
        }
    }

    #[test]
    fn spot_cone_inner_is_narrower() {
        let (outer, inner) = LightSettings::default().rig().spot.cone_cosines();
        assert!(inner > outer);
    }
}
