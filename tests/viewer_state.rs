//! Drives `ViewerState` through `InputEvent`s the way the front-ends do.

use glam::Vec3;
use scene3d::controller::{CursorHint, InputEvent, MouseButton};
use scene3d::model::Shape;
use scene3d::{ViewerConfig, ViewerState};

fn viewer() -> ViewerState {
    ViewerState::new(&ViewerConfig::default())
}

/// Projects a world point to viewport pixels (origin top-left)
fn screen_position(state: &ViewerState, world: Vec3) -> (f32, f32) {
    let clip = state.camera.view_proj() * world.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    let viewport = state.viewport();
    ((ndc.x + 1.0) / 2.0 * viewport.x, (1.0 - ndc.y) / 2.0 * viewport.y)
}

fn object_on_screen(state: &ViewerState, shape: Shape) -> (f32, f32) {
    let id = state.scene.find(shape).unwrap();
    let position = state.scene.get(id).unwrap().transform.position;
    screen_position(state, position)
}

fn click(state: &mut ViewerState, (x, y): (f32, f32)) {
    state.handle_event(&InputEvent::PointerDown { button: MouseButton::Left, x, y });
    state.handle_event(&InputEvent::PointerUp { button: MouseButton::Left, x, y });
}

#[test]
fn click_selects_the_object_under_the_cursor() {
    let mut state = viewer();
    let sphere = state.scene.find(Shape::Sphere).unwrap();

    let at = object_on_screen(&state, Shape::Sphere);
    click(&mut state, at);

    assert_eq!(state.selection.selected(), Some(sphere));
    assert_eq!(state.selection.overlay().map(|o| o.parent()), Some(sphere));
}

#[test]
fn click_into_empty_space_clears_the_selection() {
    let mut state = viewer();
    let at = object_on_screen(&state, Shape::Cylinder);
    click(&mut state, at);
    assert!(state.selection.selected().is_some());

    click(&mut state, (4.0, 4.0));
    assert_eq!(state.selection.selected(), None);
    assert!(state.selection.overlay().is_none());
}

#[test]
fn clicking_another_object_moves_the_overlay() {
    let mut state = viewer();
    let cylinder = state.scene.find(Shape::Cylinder).unwrap();

    let sphere_at = object_on_screen(&state, Shape::Sphere);
    let cylinder_at = object_on_screen(&state, Shape::Cylinder);
    click(&mut state, sphere_at);
    click(&mut state, cylinder_at);

    assert_eq!(state.selection.selected(), Some(cylinder));
    assert_eq!(state.selection.overlay().map(|o| o.parent()), Some(cylinder));
}

#[test]
fn drag_orbits_without_touching_the_selection() {
    let mut state = viewer();
    let sphere = state.scene.find(Shape::Sphere).unwrap();
    let at = object_on_screen(&state, Shape::Sphere);
    click(&mut state, at);
    let eye_before = state.camera.eye();

    state.handle_event(&InputEvent::PointerDown { button: MouseButton::Left, x: 4.0, y: 4.0 });
    state.handle_event(&InputEvent::PointerMoved { x: 60.0, y: 30.0 });
    state.handle_event(&InputEvent::PointerMoved { x: 120.0, y: 60.0 });
    state.handle_event(&InputEvent::PointerUp { button: MouseButton::Left, x: 120.0, y: 60.0 });

    assert_eq!(state.selection.selected(), Some(sphere));
    assert!(state.camera.eye().distance(eye_before) > 0.1);
}

#[test]
fn drag_that_returns_to_its_start_is_not_a_click() {
    let mut state = viewer();
    let (x, y) = object_on_screen(&state, Shape::Sphere);

    state.handle_event(&InputEvent::PointerDown { button: MouseButton::Left, x, y });
    state.handle_event(&InputEvent::PointerMoved { x: x + 40.0, y });
    state.handle_event(&InputEvent::PointerMoved { x, y });
    state.handle_event(&InputEvent::PointerUp { button: MouseButton::Left, x, y });

    assert_eq!(state.selection.selected(), None);
}

#[test]
fn jitter_below_the_threshold_still_clicks() {
    let mut state = viewer();
    let cylinder = state.scene.find(Shape::Cylinder).unwrap();
    let (x, y) = object_on_screen(&state, Shape::Cylinder);

    state.handle_event(&InputEvent::PointerDown { button: MouseButton::Left, x, y });
    state.handle_event(&InputEvent::PointerMoved { x: x + 1.0, y });
    state.handle_event(&InputEvent::PointerUp { button: MouseButton::Left, x: x + 1.0, y });

    assert_eq!(state.selection.selected(), Some(cylinder));
}

#[test]
fn right_click_does_not_select() {
    let mut state = viewer();
    let (x, y) = object_on_screen(&state, Shape::Sphere);
    state.handle_event(&InputEvent::PointerDown { button: MouseButton::Right, x, y });
    state.handle_event(&InputEvent::PointerUp { button: MouseButton::Right, x, y });
    assert_eq!(state.selection.selected(), None);
}

#[test]
fn right_click_into_empty_space_deselects() {
    let mut state = viewer();
    let sphere = state.scene.find(Shape::Sphere).unwrap();
    let sphere_at = object_on_screen(&state, Shape::Sphere);
    click(&mut state, sphere_at);

    // right click on an object keeps the selection
    let (x, y) = object_on_screen(&state, Shape::Cylinder);
    state.handle_event(&InputEvent::PointerDown { button: MouseButton::Right, x, y });
    state.handle_event(&InputEvent::PointerUp { button: MouseButton::Right, x, y });
    assert_eq!(state.selection.selected(), Some(sphere));

    state.handle_event(&InputEvent::PointerDown { button: MouseButton::Right, x: 4.0, y: 4.0 });
    state.handle_event(&InputEvent::PointerUp { button: MouseButton::Right, x: 4.0, y: 4.0 });
    assert_eq!(state.selection.selected(), None);
    assert!(state.selection.overlay().is_none());
}

#[test]
fn right_drag_into_empty_space_keeps_the_selection() {
    let mut state = viewer();
    let sphere = state.scene.find(Shape::Sphere).unwrap();
    let sphere_at = object_on_screen(&state, Shape::Sphere);
    click(&mut state, sphere_at);

    state.handle_event(&InputEvent::PointerDown { button: MouseButton::Right, x: 4.0, y: 4.0 });
    state.handle_event(&InputEvent::PointerMoved { x: 60.0, y: 30.0 });
    state.handle_event(&InputEvent::PointerMoved { x: 4.0, y: 4.0 });
    state.handle_event(&InputEvent::PointerUp { button: MouseButton::Right, x: 4.0, y: 4.0 });
    assert_eq!(state.selection.selected(), Some(sphere));
}

#[test]
fn hover_drives_the_cursor_hint() {
    let mut state = viewer();
    let (x, y) = object_on_screen(&state, Shape::Sphere);

    state.handle_event(&InputEvent::PointerMoved { x, y });
    assert_eq!(state.cursor_hint(), CursorHint::Pointer);

    state.handle_event(&InputEvent::PointerMoved { x: 4.0, y: 4.0 });
    assert_eq!(state.cursor_hint(), CursorHint::Default);
}

#[test]
fn keys_move_the_selection_until_released() {
    let mut state = viewer();
    let cylinder = state.scene.find(Shape::Cylinder).unwrap();
    let at = object_on_screen(&state, Shape::Cylinder);
    click(&mut state, at);

    state.handle_event(&InputEvent::KeyDown("W".into()));
    state.on_frame(0.1);
    state.handle_event(&InputEvent::KeyUp("w".into()));
    state.on_frame(0.1);

    let position = state.scene.get(cylinder).unwrap().transform.position;
    assert!((position - Vec3::new(4.0, 0.5, -0.3)).length() < 1e-5);
}

#[test]
fn focus_loss_releases_held_keys() {
    let mut state = viewer();
    let sphere = state.scene.find(Shape::Sphere).unwrap();
    let at = object_on_screen(&state, Shape::Sphere);
    click(&mut state, at);
    let before = state.scene.get(sphere).unwrap().transform;

    state.handle_event(&InputEvent::KeyDown("d".into()));
    state.handle_event(&InputEvent::KeyDown("+".into()));
    state.handle_event(&InputEvent::FocusLost);
    state.on_frame(0.1);

    assert_eq!(state.scene.get(sphere).unwrap().transform, before);
    assert_eq!(state.held_keys.held_count(), 0);
}

#[test]
fn wheel_dollies_the_camera() {
    let mut state = viewer();
    let distance = state.camera.distance;
    state.handle_event(&InputEvent::Wheel { delta_y: -100.0 });
    assert!(state.camera.distance < distance);
    state.handle_event(&InputEvent::Wheel { delta_y: 100.0 });
    state.handle_event(&InputEvent::Wheel { delta_y: 100.0 });
    assert!(state.camera.distance > distance);
}

#[test]
fn resize_keeps_picking_aligned() {
    let mut state = viewer();
    state.handle_event(&InputEvent::Resized { width: 800.0, height: 800.0 });
    let sphere = state.scene.find(Shape::Sphere).unwrap();

    let at = object_on_screen(&state, Shape::Sphere);
    click(&mut state, at);
    assert_eq!(state.selection.selected(), Some(sphere));
}

#[test]
fn reset_after_interaction() {
    let mut state = viewer();
    let sphere = state.scene.find(Shape::Sphere).unwrap();
    let at = object_on_screen(&state, Shape::Sphere);
    click(&mut state, at);
    state.handle_event(&InputEvent::KeyDown("arrowup".into()));
    state.on_frame(0.1);
    state.set_point_light(1.7);
    state.handle_event(&InputEvent::Wheel { delta_y: 100.0 });

    state.reset();

    assert_eq!(state.lights.point_light, 0.6);
    assert!((state.camera.eye() - Vec3::new(6.0, 6.0, 10.0)).length() < 1e-4);
    assert_eq!(state.selection.selected(), Some(sphere));
    assert!((state.scene.get(sphere).unwrap().transform.position.y - 0.7).abs() < 1e-5);
    assert_eq!(state.surface_generation(), 1);
}
