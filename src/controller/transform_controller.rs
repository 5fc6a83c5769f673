use glam::Vec3;

use crate::controller::input::{HeldKeys, InputProcessor, TransformAction};
use crate::model::Transform;

/// Objects never shrink below this per-axis scale
pub const MIN_SCALE: f32 = 0.01;

/// Units per second for each kind of keyboard-driven change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSpeeds {
    /// WASD translation along x/z
    pub move_speed: f32,
    /// Q/E and arrow left/right rotation (radians per second)
    pub rotate_speed: f32,
    /// Arrow up/down translation along y
    pub lift_speed: f32,
    /// Relative growth per second for +/-
    pub scale_speed: f32,
}

impl Default for TransformSpeeds {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            rotate_speed: 2.0,
            lift_speed: 2.0,
            scale_speed: 1.5,
        }
    }
}

/// Applies held keys to the selected object's transform once per frame
#[derive(Debug, Clone, Default)]
pub struct TransformController {
    pub speeds: TransformSpeeds,
    processor: InputProcessor,
}

impl TransformController {
    pub fn new(speeds: TransformSpeeds, processor: InputProcessor) -> Self {
        Self { speeds, processor }
    }

    pub fn processor(&self) -> &InputProcessor {
        &self.processor
    }

    /// Every active action contributes independently; opposite keys cancel out.
    pub fn apply(&self, transform: &mut Transform, held: &HeldKeys, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let active = |action| self.processor.is_active(action, held);
        let TransformSpeeds { move_speed, rotate_speed, lift_speed, scale_speed } = self.speeds;

        if active(TransformAction::Forward) {
            transform.position.z -= move_speed * dt;
        }
        if active(TransformAction::Backward) {
            transform.position.z += move_speed * dt;
        }
        if active(TransformAction::Left) {
            transform.position.x -= move_speed * dt;
        }
        if active(TransformAction::Right) {
            transform.position.x += move_speed * dt;
        }

        if active(TransformAction::RotateLeft) {
            transform.rotation.y += rotate_speed * dt;
        }
        if active(TransformAction::RotateRight) {
            transform.rotation.y -= rotate_speed * dt;
        }

        if active(TransformAction::Up) {
            transform.position.y += lift_speed * dt;
        }
        if active(TransformAction::Down) {
            transform.position.y -= lift_speed * dt;
        }

        if active(TransformAction::RollLeft) {
            transform.rotation.z += rotate_speed * dt;
        }
        if active(TransformAction::RollRight) {
            transform.rotation.z -= rotate_speed * dt;
        }

        if active(TransformAction::Grow) {
            transform.scale *= 1.0 + scale_speed * dt;
        }
        if active(TransformAction::Shrink) {
            transform.scale *= (1.0 - scale_speed * dt).max(0.0);
            transform.scale = transform.scale.max(Vec3::splat(MIN_SCALE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[&str]) -> HeldKeys {
        let mut held = HeldKeys::new();
        for k in keys {
            held.press(k);
        }
        held
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn forward_moves_negative_z() {
        let ctrl = TransformController::default();
        let mut t = Transform::default();
        ctrl.apply(&mut t, &held(&["w"]), 0.1);
        assert!(close(t.position.z, -0.3));
        assert_eq!(t.position.x, 0.0);
    }

    #[test]
    fn forward_and_left_compose() {
        let ctrl = TransformController::default();
        let mut t = Transform::default();
        ctrl.apply(&mut t, &held(&["w", "a"]), 0.1);
        assert!(close(t.position.x, -0.3));
        assert!(close(t.position.z, -0.3));
    }

    #[test]
    fn every_binding_has_its_effect() {
        let ctrl = TransformController::default();
        let cases: [(&str, fn(&Transform) -> f32, f32); 10] = [
            ("s", |t| t.position.z, 0.2),
            ("d", |t| t.position.x, 0.2),
            ("q", |t| t.rotation.y, 0.2 * 2.0 / 3.0),
            ("e", |t| t.rotation.y, -0.2 * 2.0 / 3.0),
            ("arrowup", |t| t.position.y, 0.2 * 2.0 / 3.0),
            ("arrowdown", |t| t.position.y, -0.2 * 2.0 / 3.0),
            ("arrowleft", |t| t.rotation.z, 0.2 * 2.0 / 3.0),
            ("arrowright", |t| t.rotation.z, -0.2 * 2.0 / 3.0),
            ("ы", |t| t.position.z, 0.2),
            ("в", |t| t.position.x, 0.2),
        ];
        for (key, read, expected) in cases {
            let mut t = Transform::default();
            ctrl.apply(&mut t, &held(&[key]), 0.2 / 3.0);
            assert!(close(read(&t), expected), "{key}: {} != {expected}", read(&t));
        }
    }

    #[test]
    fn scale_compounds() {
        let ctrl = TransformController::default();
        let keys = held(&["+"]);
        let mut t = Transform::default();
        ctrl.apply(&mut t, &keys, 0.1);
        ctrl.apply(&mut t, &keys, 0.1);
        assert!(close(t.scale.x, 1.15 * 1.15));
        assert!(close(t.scale.y, 1.15 * 1.15));
        assert!(!close(t.scale.z, 1.3));
    }

    #[test]
    fn shrink_is_floored() {
        let ctrl = TransformController::default();
        let keys = held(&["_"]);
        let mut t = Transform::default();
        ctrl.apply(&mut t, &keys, 0.1);
        assert!(close(t.scale.x, 0.85));
        for _ in 0..1000 {
            ctrl.apply(&mut t, &keys, 0.1);
        }
        assert_eq!(t.scale, Vec3::splat(MIN_SCALE));
        // a huge frame step cannot flip the sign
        ctrl.apply(&mut t, &keys, 10.0);
        assert_eq!(t.scale, Vec3::splat(MIN_SCALE));
    }

    #[test]
    fn opposite_keys_cancel() {
        let ctrl = TransformController::default();
        let mut t = Transform::default();
        ctrl.apply(&mut t, &held(&["w", "s", "q", "e"]), 0.1);
        assert!(close(t.position.z, 0.0));
        assert!(close(t.rotation.y, 0.0));
    }

    #[test]
    fn unknown_keys_and_bad_dt_do_nothing() {
        let ctrl = TransformController::default();
        let mut t = Transform::default();
        ctrl.apply(&mut t, &held(&["x", "f12"]), 0.1);
        ctrl.apply(&mut t, &held(&["w"]), -1.0);
        ctrl.apply(&mut t, &held(&["w"]), f32::NAN);
        assert_eq!(t, Transform::default());
    }
}
