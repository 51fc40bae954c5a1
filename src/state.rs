use crate::core::{AssetHandle, Rgb};

/// Mutually exclusive background strategy. Only `mode` selects what the
/// compositor draws; the other state fields are parameters for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    Transparent,
    Color,
    Image,
}

/// Versioned description of one composite. Value type: committed snapshots are
/// never mutated, edits produce a new state via [`EditorState::apply`].
///
/// Inactive fields are retained, not cleared, when `mode` switches away, so
/// switching back restores the previous color or image without data loss.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EditorState {
    pub mode: BackgroundMode,
    pub background_color: Rgb,
    pub background_image: Option<AssetHandle>,
    /// Zoom factor reserved for future transforms; carried through history
    /// unchanged by current operations.
    pub scale: f64,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            mode: BackgroundMode::Transparent,
            background_color: Rgb::WHITE,
            background_image: None,
            scale: 1.0,
        }
    }
}

/// Partial update over [`EditorState`]. Fields left `None` keep their current
/// value; one patch is one atomic, undoable edit.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<BackgroundMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<AssetHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl StatePatch {
    pub fn mode(mode: BackgroundMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn color(color: Rgb) -> Self {
        Self {
            background_color: Some(color),
            ..Self::default()
        }
    }

    /// Switch to image mode and set the background reference in one edit.
    pub fn image(handle: AssetHandle) -> Self {
        Self {
            mode: Some(BackgroundMode::Image),
            background_image: Some(handle),
            ..Self::default()
        }
    }
}

impl EditorState {
    /// Shallow field-wise override, never a deep merge: each `Some` field of
    /// the patch replaces the corresponding field wholesale.
    pub fn apply(&self, patch: &StatePatch) -> Self {
        Self {
            mode: patch.mode.unwrap_or(self.mode),
            background_color: patch.background_color.unwrap_or(self.background_color),
            background_image: patch
                .background_image
                .clone()
                .or_else(|| self.background_image.clone()),
            scale: patch.scale.unwrap_or(self.scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_transparent_white() {
        let s = EditorState::default();
        assert_eq!(s.mode, BackgroundMode::Transparent);
        assert_eq!(s.background_color, Rgb::WHITE);
        assert_eq!(s.background_image, None);
        assert_eq!(s.scale, 1.0);
    }

    #[test]
    fn apply_overrides_only_patched_fields() {
        let base = EditorState::default();
        let patched = base.apply(&StatePatch::color(Rgb::new(0x11, 0x22, 0x33)));

        assert_eq!(patched.mode, BackgroundMode::Transparent);
        assert_eq!(patched.background_color, Rgb::new(0x11, 0x22, 0x33));
        assert_eq!(patched.background_image, None);
        assert_eq!(patched.scale, 1.0);
        // The original snapshot is untouched.
        assert_eq!(base.background_color, Rgb::WHITE);
    }

    #[test]
    fn image_patch_sets_mode_and_handle_atomically() {
        let s = EditorState::default().apply(&StatePatch::image(AssetHandle::new("bg-1")));
        assert_eq!(s.mode, BackgroundMode::Image);
        assert_eq!(s.background_image, Some(AssetHandle::new("bg-1")));
    }

    #[test]
    fn inactive_fields_survive_mode_round_trip() {
        let color = Rgb::from_hex("#112233").unwrap();
        let s = EditorState::default()
            .apply(&StatePatch {
                mode: Some(BackgroundMode::Color),
                background_color: Some(color),
                ..StatePatch::default()
            })
            .apply(&StatePatch::image(AssetHandle::new("bg-1")))
            .apply(&StatePatch::mode(BackgroundMode::Color));

        assert_eq!(s.mode, BackgroundMode::Color);
        assert_eq!(s.background_color, color);
        // The image reference is inactive but retained too.
        assert_eq!(s.background_image, Some(AssetHandle::new("bg-1")));
    }

    #[test]
    fn json_roundtrip() {
        let s = EditorState {
            mode: BackgroundMode::Image,
            background_color: Rgb::new(1, 2, 3),
            background_image: Some(AssetHandle::new("bg-7")),
            scale: 1.5,
        };
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"image\""));
        let back: EditorState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
