use glam::{Mat4, Vec3};
use tracing::{debug, info};

use crate::model::{Color, ObjectId, Scene, SceneObject};

/// Wireframe box drawn around the selected object. Its transform is relative
/// to the parent object, so it follows every move, rotation and scale.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightOverlay {
    parent: ObjectId,
    center: Vec3,
    size: Vec3,
    color: Color,
}

impl HighlightOverlay {
    fn new(object: &SceneObject) -> Self {
        let bounds = object.local_bounds();
        Self {
            parent: object.id,
            center: bounds.center(),
            size: bounds.size(),
            color: object.highlight_color,
        }
    }

    pub fn parent(&self) -> ObjectId {
        self.parent
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Maps the unit wire box onto the parent's local bounding box
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.center) * Mat4::from_scale(self.size)
    }

    /// World matrix, or `None` if the parent no longer exists
    pub fn world_matrix(&self, scene: &Scene) -> Option<Mat4> {
        let parent = scene.get(self.parent)?;
        Some(parent.transform.matrix() * self.local_matrix())
    }
}

/// Tracks the single selected object and owns its highlight overlay
#[derive(Debug, Default)]
pub struct SelectionController {
    selected: Option<ObjectId>,
    overlay: Option<HighlightOverlay>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    pub fn overlay(&self) -> Option<&HighlightOverlay> {
        self.overlay.as_ref()
    }

    /// Select `object`, replacing any previous overlay with a fresh one
    pub fn select_at(&mut self, object: &SceneObject) {
        self.detach_overlay();
        self.selected = Some(object.id);
        self.overlay = Some(HighlightOverlay::new(object));
        info!(object = object.name(), "selected");
    }

    /// Drop the selection and its overlay. Calling this with nothing selected is a no-op.
    pub fn clear_selection(&mut self) {
        self.detach_overlay();
        if let Some(previous) = self.selected.take() {
            info!(?previous, "selection cleared");
        }
    }

    fn detach_overlay(&mut self) {
        if let Some(overlay) = self.overlay.take() {
            debug!(parent = ?overlay.parent, "overlay detached");
        }
    }
}
