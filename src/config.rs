use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::controller::{KeyBindings, TransformSpeeds};

/// Start-up settings. Defaults reproduce the demo; a few knobs can be
/// overridden through `SCENE3D_*` environment variables on native builds.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub speeds: TransformSpeeds,
    pub bindings: KeyBindings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "3D Scene".to_string(),
            width: 1280,
            height: 720,
            speeds: TransformSpeeds::default(),
            bindings: KeyBindings::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`ViewerConfig::from_env`] with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        override_with(&lookup, "SCENE3D_WIDTH", &mut config.width);
        override_with(&lookup, "SCENE3D_HEIGHT", &mut config.height);
        override_with(&lookup, "SCENE3D_MOVE_SPEED", &mut config.speeds.move_speed);
        override_with(&lookup, "SCENE3D_ROTATE_SPEED", &mut config.speeds.rotate_speed);
        override_with(&lookup, "SCENE3D_LIFT_SPEED", &mut config.speeds.lift_speed);
        override_with(&lookup, "SCENE3D_SCALE_SPEED", &mut config.speeds.scale_speed);
        if let Some(title) = lookup("SCENE3D_TITLE") {
            config.title = title;
        }
        config.width = config.width.max(1);
        config.height = config.height.max(1);
        config
    }
}

fn override_with<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, target: &mut T) {
    let Some(raw) = lookup(name) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!(variable = name, value = %raw, "ignoring unparsable setting"),
    }
}
