use crate::error::EditorResult;

/// External subject-extraction (matting) service.
///
/// Both payloads are opaque encoded image bytes; the service strips the
/// background and returns a cutout with an alpha channel. Failures carry a
/// human-readable message and mean the editing session never begins.
pub trait BackgroundExtractor {
    fn remove_background(&self, image: &[u8]) -> EditorResult<Vec<u8>>;
}
