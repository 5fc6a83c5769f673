use glam::Vec2;
use tracing::{info, trace};

use crate::config::ViewerConfig;
use crate::controller::input::{HeldKeys, InputEvent, InputProcessor, MouseButton};
use crate::controller::orbit_controller::OrbitController;
use crate::controller::selection::SelectionController;
use crate::controller::transform_controller::TransformController;
use crate::model::{LightSettings, ObjectId, OrbitCamera, Scene, SceneObject};

/// A press that travels further than this (logical px) is a drag, not a click
pub const CLICK_DRAG_THRESHOLD: f32 = 2.0;

/// Mouse cursor the front-end should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    Pointer,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    button: MouseButton,
    origin: Vec2,
    last: Vec2,
    dragging: bool,
}

/// All state the viewer mutates in response to input, independent of the GPU
pub struct ViewerState {
    pub scene: Scene,
    pub selection: SelectionController,
    pub held_keys: HeldKeys,
    pub lights: LightSettings,
    pub camera: OrbitCamera,
    orbit: OrbitController,
    transform: TransformController,
    press: Option<Press>,
    hovered: Option<ObjectId>,
    viewport: Vec2,
    surface_generation: u64,
}

impl ViewerState {
    pub fn new(config: &ViewerConfig) -> Self {
        let lights = LightSettings::default();
        let mut camera = OrbitCamera::new(config.width, config.height);
        camera.zoom = lights.zoom;

        Self {
            scene: Scene::demo(),
            selection: SelectionController::new(),
            held_keys: HeldKeys::new(),
            lights,
            camera,
            orbit: OrbitController::new(),
            transform: TransformController::new(config.speeds, InputProcessor::new(config.bindings.clone())),
            press: None,
            hovered: None,
            viewport: Vec2::new(config.width as f32, config.height as f32),
            surface_generation: 0,
        }
    }

    pub fn selected_object(&self) -> Option<&SceneObject> {
        self.selection.selected().and_then(|id| self.scene.get(id))
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Bumped by [`ViewerState::reset`]; the renderer rebuilds its surface when it changes
    pub fn surface_generation(&self) -> u64 {
        self.surface_generation
    }

    pub fn cursor_hint(&self) -> CursorHint {
        if self.hovered.is_some() {
            CursorHint::Pointer
        } else {
            CursorHint::Default
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.viewport = Vec2::new(width, height);
            self.camera.aspect = width / height;
        }
    }

    // --- state transitions -------------------------------------------------

    pub fn on_pointer_hit(&mut self, id: ObjectId) {
        match self.scene.get(id).filter(|o| o.selectable) {
            Some(object) => self.selection.select_at(object),
            None => self.selection.clear_selection(),
        }
    }

    pub fn on_pointer_miss(&mut self) {
        self.selection.clear_selection();
    }

    pub fn on_key_down(&mut self, key: &str) {
        self.held_keys.press(key);
    }

    pub fn on_key_up(&mut self, key: &str) {
        self.held_keys.release(key);
    }

    /// Per-frame update. Works on one snapshot of the held keys.
    /// `dt` is the elapsed time in seconds; negative or non-finite counts as 0.
    pub fn on_frame(&mut self, dt: f32) {
        let Some(id) = self.selection.selected() else {
            return;
        };
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let held = self.held_keys.clone();
        if let Some(object) = self.scene.get_mut(id) {
            self.transform.apply(&mut object.transform, &held, dt);
            trace!(?id, transform = ?object.transform, dt, "frame update");
        }
    }

    pub fn set_zoom(&mut self, value: f32) {
        self.lights.set_zoom(value);
        self.camera.zoom = self.lights.zoom;
    }

    pub fn set_dir_light(&mut self, value: f32) {
        self.lights.set_dir_light(value);
    }

    pub fn set_point_light(&mut self, value: f32) {
        self.lights.set_point_light(value);
    }

    pub fn set_spot_light(&mut self, value: f32) {
        self.lights.set_spot_light(value);
    }

    pub fn set_dir_light_angle(&mut self, value: f32) {
        self.lights.set_dir_light_angle(value);
    }

    /// Restore zoom and lights, discard camera drift and request a fresh surface.
    /// Selection and object transforms are left alone.
    pub fn reset(&mut self) {
        self.lights.reset();
        let mut camera = OrbitCamera::new(self.viewport.x as u32, self.viewport.y as u32);
        camera.aspect = self.camera.aspect;
        camera.zoom = self.lights.zoom;
        self.camera = camera;
        self.press = None;
        self.surface_generation += 1;
        info!(generation = self.surface_generation, "scene reset");
    }

    // --- event routing -----------------------------------------------------

    pub fn pick_at(&self, cursor: Vec2) -> Option<ObjectId> {
        let ray = self.camera.screen_ray(cursor, self.viewport);
        self.scene.pick(&ray)
    }

    pub fn click_at(&mut self, cursor: Vec2) {
        match self.pick_at(cursor) {
            Some(id) => self.on_pointer_hit(id),
            None => self.on_pointer_miss(),
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.on_key_down(key),
            InputEvent::KeyUp(key) => self.on_key_up(key),
            InputEvent::PointerMoved { x, y } => self.pointer_moved(Vec2::new(*x, *y)),
            InputEvent::PointerDown { button, x, y } => {
                let at = Vec2::new(*x, *y);
                self.press = Some(Press { button: *button, origin: at, last: at, dragging: false });
            }
            InputEvent::PointerUp { button, x, y } => {
                let at = Vec2::new(*x, *y);
                if let Some(press) = self.press.take() {
                    let clicked =
                        press.button == *button && !press.dragging && at.distance(press.origin) <= CLICK_DRAG_THRESHOLD;
                    match button {
                        MouseButton::Left if clicked => self.click_at(at),
                        // a right click only ever deselects
                        MouseButton::Right if clicked && self.pick_at(at).is_none() => self.on_pointer_miss(),
                        _ => {}
                    }
                }
                self.hovered = self.pick_at(at);
            }
            InputEvent::Wheel { delta_y } => self.orbit.dolly(&mut self.camera, *delta_y),
            InputEvent::FocusLost => {
                self.held_keys.clear();
                self.press = None;
            }
            InputEvent::Resized { width, height } => self.set_viewport(*width, *height),
        }
    }

    fn pointer_moved(&mut self, at: Vec2) {
        let Some(press) = self.press.as_mut() else {
            self.hovered = self.pick_at(at);
            return;
        };

        if !press.dragging && at.distance(press.origin) > CLICK_DRAG_THRESHOLD {
            press.dragging = true;
        }
        let delta = at - press.last;
        press.last = at;
        if !press.dragging {
            return;
        }

        match press.button {
            MouseButton::Left => self.orbit.rotate(&mut self.camera, delta, self.viewport),
            MouseButton::Right | MouseButton::Middle => self.orbit.pan(&mut self.camera, delta, self.viewport),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Shape, Transform};
    use glam::Vec3;

    fn state() -> ViewerState {
        ViewerState::new(&ViewerConfig::default())
    }

    #[test]
    fn no_selection_means_no_motion() {
        let mut s = state();
        let before = s.scene.transforms();
        for key in ["w", "a", "q", "arrowup", "arrowleft", "+", "-"] {
            s.on_key_down(key);
        }
        for dt in [0.0, 0.016, 0.1, 5.0] {
            s.on_frame(dt);
        }
        assert_eq!(s.scene.transforms(), before);
    }

    #[test]
    fn frame_moves_only_the_selected_object() {
        let mut s = state();
        let sphere = s.scene.find(Shape::Sphere).unwrap();
        let torus = s.scene.find(Shape::Torus).unwrap();
        let torus_before = s.scene.get(torus).unwrap().transform;

        s.on_pointer_hit(sphere);
        s.on_key_down("W");
        s.on_frame(0.1);

        let t = s.scene.get(sphere).unwrap().transform;
        assert!((t.position.z - -0.3).abs() < 1e-5);
        assert_eq!(s.scene.get(torus).unwrap().transform, torus_before);
    }

    #[test]
    fn keys_survive_selection_changes() {
        let mut s = state();
        let sphere = s.scene.find(Shape::Sphere).unwrap();
        let cylinder = s.scene.find(Shape::Cylinder).unwrap();
        s.on_key_down("d");
        s.on_pointer_hit(sphere);
        s.on_pointer_miss();
        s.on_pointer_hit(cylinder);
        s.on_frame(0.1);
        assert!((s.scene.get(cylinder).unwrap().transform.position.x - 4.3).abs() < 1e-5);
    }

    #[test]
    fn ground_hit_counts_as_miss() {
        let mut s = state();
        let sphere = s.scene.find(Shape::Sphere).unwrap();
        s.on_pointer_hit(sphere);
        s.on_pointer_hit(s.scene.find(Shape::Ground).unwrap());
        assert_eq!(s.selection.selected(), None);
        assert!(s.selection.overlay().is_none());
    }

    #[test]
    fn slow_frames_move_by_the_full_elapsed_time() {
        let mut s = state();
        let sphere = s.scene.find(Shape::Sphere).unwrap();
        let start = s.scene.get(sphere).unwrap().transform.position;
        s.on_pointer_hit(sphere);
        s.on_key_down("w");
        s.on_key_down("arrowup");
        s.on_frame(0.2);
        let p = s.scene.get(sphere).unwrap().transform.position;
        assert!((p.z - (start.z - 3.0 * 0.2)).abs() < 1e-5);
        assert!((p.y - (start.y + 2.0 * 0.2)).abs() < 1e-5);
    }

    #[test]
    fn bad_frame_times_count_as_zero() {
        let mut s = state();
        let sphere = s.scene.find(Shape::Sphere).unwrap();
        s.on_pointer_hit(sphere);
        s.on_key_down("w");
        let before = s.scene.get(sphere).unwrap().transform;
        for dt in [-0.5, f32::NAN, f32::INFINITY] {
            s.on_frame(dt);
        }
        assert_eq!(s.scene.get(sphere).unwrap().transform, before);
    }

    #[test]
    fn reset_restores_parameters_but_not_objects() {
        let mut s = state();
        let torus = s.scene.find(Shape::Torus).unwrap();
        s.on_pointer_hit(torus);
        s.on_key_down("e");
        s.on_frame(0.1);
        s.set_zoom(1.8);
        s.set_dir_light(0.2);
        s.set_point_light(2.0);
        s.set_spot_light(0.0);
        s.set_dir_light_angle(5.0);
        s.camera.rotate(1.0, 0.3);
        let moved: Vec<Transform> = s.scene.transforms();

        s.reset();

        assert_eq!(s.lights, LightSettings::default());
        assert_eq!(s.camera.zoom, 1.0);
        assert!((s.camera.eye() - Vec3::new(6.0, 6.0, 10.0)).length() < 1e-4);
        assert_eq!(s.scene.transforms(), moved);
        assert_eq!(s.selection.selected(), Some(torus));
        assert_eq!(s.surface_generation(), 1);
    }
}
