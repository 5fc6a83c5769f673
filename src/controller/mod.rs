// CONTROLLER: input, selection and the per-frame update
pub mod input;
pub mod orbit_controller;
pub mod selection;
pub mod transform_controller;
pub mod viewer_state;

pub use input::{HeldKeys, InputEvent, InputProcessor, KeyBindings, MouseButton, TransformAction};
pub use orbit_controller::OrbitController;
pub use selection::{HighlightOverlay, SelectionController};
pub use transform_controller::{TransformController, TransformSpeeds};
pub use viewer_state::{CursorHint, ViewerState};
