use egui::{Align2, Context, RichText};

use crate::controller::{CursorHint, ViewerState};
use crate::model::lighting::{ANGLE_RANGE, INTENSITY_RANGE, ZOOM_RANGE};
use crate::view::UiFrame;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0xa5, 0xf3, 0xfc);

const CONTROLS_GUIDE: &[(&str, &str)] = &[
    ("Forward/Backward", "W / S"),
    ("Left/Right", "A / D"),
    ("Up/Down", "↑ / ↓"),
    ("Rotate around Y", "Q / E"),
    ("Rotate around Z", "← / →"),
    ("Scale", "+ / -"),
];

const MOUSE_GUIDE: &[(&str, &str)] = &[
    ("Rotate", "Left Click + Drag"),
    ("Zoom", "Mouse Wheel"),
    ("Pan", "Right Click + Drag"),
];

/// Run one egui pass over the viewer header
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, state: &mut ViewerState) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        draw_header(ctx, state);
        apply_cursor_hint(ctx, state.cursor_hint());
    })
}

/// Tessellates a finished pass for the renderer, returning what the platform still has to apply
pub fn into_frame(egui_ctx: &Context, output: egui::FullOutput) -> (UiFrame, egui::PlatformOutput) {
    let frame = UiFrame {
        primitives: egui_ctx.tessellate(output.shapes, output.pixels_per_point),
        textures_delta: output.textures_delta,
        pixels_per_point: output.pixels_per_point,
    };
    (frame, output.platform_output)
}

fn slider_label(name: &str, value: f32, decimals: usize, unit: &str) -> String {
    format!("{name} ({value:.decimals$}{unit})")
}

fn draw_header(ctx: &Context, state: &mut ViewerState) {
    egui::Window::new("3D Scene")
        .anchor(Align2::LEFT_TOP, [16.0, 16.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button(RichText::new("Reset").color(ACCENT)).clicked() {
                    state.reset();
                }
                ui.label(selection_status(state));
            });

            egui::CollapsingHeader::new("Controls Guide").default_open(false).show(ui, |ui| {
                ui.label("Select an object by clicking on it. Click away to deselect.");
                ui.label("Move selected object:");
                for (action, keys) in CONTROLS_GUIDE {
                    ui.label(RichText::new(format!("  {action}: {keys}")).small());
                }
                ui.label("Navigate the scene using mouse controls.");
                for (action, keys) in MOUSE_GUIDE {
                    ui.label(RichText::new(format!("  {action}: {keys}")).small());
                }
                ui.label("Reset restores zoom and lighting. Sliders adjust them.");
            });

            ui.separator();
            ui.horizontal_wrapped(|ui| {
                let lights = state.lights;
                if let Some(v) = slider(ui, &slider_label("Zoom", lights.zoom, 1, ""), lights.zoom, ZOOM_RANGE, 0.1) {
                    state.set_zoom(v);
                }
                if let Some(v) =
                    slider(ui, &slider_label("Directional Light", lights.dir_light, 1, ""), lights.dir_light, INTENSITY_RANGE, 0.1)
                {
                    state.set_dir_light(v);
                }
                if let Some(v) =
                    slider(ui, &slider_label("Point Light", lights.point_light, 1, ""), lights.point_light, INTENSITY_RANGE, 0.1)
                {
                    state.set_point_light(v);
                }
                if let Some(v) =
                    slider(ui, &slider_label("Spot Light", lights.spot_light, 1, ""), lights.spot_light, INTENSITY_RANGE, 0.1)
                {
                    state.set_spot_light(v);
                }
                let angle_label = slider_label("Directional Light Angle", lights.dir_light_angle, 2, " rad");
                if let Some(v) = slider(ui, &angle_label, lights.dir_light_angle, ANGLE_RANGE, 0.01) {
                    state.set_dir_light_angle(v);
                }
            });
        });
}

/// Label above a value-less slider; returns the new value when it moved
fn slider(ui: &mut egui::Ui, label: &str, value: f32, range: std::ops::RangeInclusive<f32>, step: f64) -> Option<f32> {
    let mut edited = value;
    let changed = ui
        .vertical(|ui| {
            ui.label(label);
            ui.add(egui::Slider::new(&mut edited, range).step_by(step).show_value(false)).changed()
        })
        .inner;
    changed.then_some(edited)
}

fn selection_status(state: &ViewerState) -> RichText {
    match state.selected_object() {
        Some(object) => {
            let t = object.transform;
            RichText::new(format!(
                "{} at ({:.1}, {:.1}, {:.1}) scale {:.2}",
                object.name(),
                t.position.x,
                t.position.y,
                t.position.z,
                t.scale.x
            ))
            .color(ACCENT)
        }
        None => RichText::new("Nothing selected").weak(),
    }
}

fn apply_cursor_hint(ctx: &Context, hint: CursorHint) {
    if hint == CursorHint::Pointer && !ctx.is_pointer_over_area() {
        ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
    }
}
