use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    assets::{AssetLoader, decode::decode_image},
    core::{AssetHandle, Surface},
    encode_png::encode_png,
    error::{EditorError, EditorResult},
    extract::BackgroundExtractor,
    history::History,
    render::{Compositor, RenderStatus},
    state::{BackgroundMode, EditorState, StatePatch},
};

/// One editing session: wires the history, the two image slots, and the
/// compositor together and drives re-renders the way the UI collaborators
/// expect.
///
/// All operations are synchronous and atomic with respect to each other;
/// image decode is the only thing that can remain outstanding. The session
/// keeps the bytes behind every handle it was given so that undoing back to
/// an earlier background reference can re-resolve it.
#[derive(Debug)]
pub struct EditorSession {
    state: EditorState,
    history: History,
    loader: AssetLoader,
    compositor: Compositor,
    sources: HashMap<AssetHandle, Arc<Vec<u8>>>,
}

impl EditorSession {
    /// Begin editing a decoded-ready subject cutout.
    ///
    /// Fails if the subject payload cannot be decoded; no session (and no
    /// history) exists in that case.
    pub fn begin(subject: AssetHandle, subject_bytes: impl Into<Vec<u8>>) -> EditorResult<Self> {
        let bytes: Arc<Vec<u8>> = Arc::new(subject_bytes.into());

        let mut loader = AssetLoader::new();
        if let Some(token) = loader.subject.request(subject.clone()) {
            loader.subject.complete(token, decode_image(&bytes));
        }
        if let Some(message) = loader.subject.error() {
            return Err(EditorError::decode(message.to_string()));
        }

        let state = EditorState::default();
        let mut history = History::new();
        history.init(state.clone());

        let mut compositor = Compositor::new();
        compositor.mark_dirty();

        let mut sources = HashMap::new();
        sources.insert(subject, bytes);

        let mut session = Self {
            state,
            history,
            loader,
            compositor,
            sources,
        };
        session.refresh()?;
        Ok(session)
    }

    /// Run the external matting collaborator, then begin a session on its
    /// output. An extraction failure propagates and no session begins.
    pub fn begin_from_extraction(
        extractor: &dyn BackgroundExtractor,
        subject: AssetHandle,
        original_bytes: &[u8],
    ) -> EditorResult<Self> {
        let cutout = extractor.remove_background(original_bytes)?;
        Self::begin(subject, cutout)
    }

    /// Merge a partial update into the live state and commit it as one
    /// undoable edit.
    pub fn apply(&mut self, patch: &StatePatch) {
        let next = self.state.apply(patch);
        self.state = next.clone();
        self.history.commit(next);
        self.sync_background();
        self.compositor.mark_dirty();
    }

    /// Register `bytes` for `handle` and switch to that image background in
    /// one atomic edit.
    pub fn set_background_image(&mut self, handle: AssetHandle, bytes: impl Into<Vec<u8>>) {
        self.sources.insert(handle.clone(), Arc::new(bytes.into()));
        self.apply(&StatePatch::image(handle));
    }

    /// Step back one edit. At the start of history this changes nothing.
    pub fn undo(&mut self) {
        if let Some(prev) = self.history.undo().cloned()
            && prev != self.state
        {
            self.state = prev;
            self.sync_background();
            self.compositor.mark_dirty();
        }
    }

    /// Step forward one edit. At the end of history this changes nothing.
    pub fn redo(&mut self) {
        if let Some(next) = self.history.redo().cloned()
            && next != self.state
        {
            self.state = next;
            self.sync_background();
            self.compositor.mark_dirty();
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The live editor state, for control highlighting.
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Re-render if anything changed since the last render.
    pub fn refresh(&mut self) -> EditorResult<RenderStatus> {
        self.compositor.refresh(&self.loader, &self.state)
    }

    /// Latest rendered surface for the on-screen preview. Read-only; replaced
    /// wholesale by the next successful render.
    pub fn surface(&self) -> Option<&Surface> {
        self.compositor.surface()
    }

    /// Decode failure of the background slot, if any, for display.
    pub fn background_error(&self) -> Option<&str> {
        self.loader.background.error()
    }

    /// Encode the current composite as PNG bytes at the subject's native
    /// resolution.
    ///
    /// Rejected while a required raster is still resolving: a stale or
    /// partial surface is never exported.
    pub fn export_png(&mut self) -> EditorResult<Vec<u8>> {
        match self.refresh()? {
            RenderStatus::Deferred => Err(EditorError::export(
                "render pending: a required image is not ready",
            )),
            RenderStatus::Fresh => {
                let surface = self
                    .compositor
                    .surface()
                    .ok_or_else(|| EditorError::export("nothing has been rendered yet"))?;
                encode_png(surface)
            }
        }
    }

    /// Discard history, rasters, and edits. A new session starts with
    /// [`EditorSession::begin`].
    pub fn start_over(&mut self) {
        self.history.reset();
        self.loader.subject.clear();
        self.loader.background.clear();
        self.compositor.reset();
        self.sources.clear();
        self.state = EditorState::default();
    }

    /// Direct access to the image slots, for hosts that deliver decode
    /// completions themselves. Call [`Self::mark_dirty`] after delivering one.
    pub fn loader_mut(&mut self) -> &mut AssetLoader {
        &mut self.loader
    }

    /// Note an out-of-band raster change; the next refresh re-renders.
    pub fn mark_dirty(&mut self) {
        self.compositor.mark_dirty();
    }

    /// Keep the background slot in step with the live state.
    ///
    /// Only image mode needs the slot; switching away leaves any in-flight or
    /// resolved raster alone so switching back can reuse it.
    fn sync_background(&mut self) {
        if self.state.mode != BackgroundMode::Image {
            return;
        }
        let Some(handle) = self.state.background_image.clone() else {
            return;
        };
        if let Some(token) = self.loader.background.request(handle.clone()) {
            let result = match self.sources.get(&handle) {
                Some(bytes) => decode_image(bytes),
                None => Err(EditorError::decode(format!(
                    "no bytes registered for handle '{}'",
                    handle.as_str()
                ))),
            };
            self.loader.background.complete(token, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
        let mut img = image::RgbaImage::new(width, height);
        for p in img.pixels_mut() {
            p.0 = px;
        }
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn begin_rejects_undecodable_subject() {
        let err = EditorSession::begin(AssetHandle::new("subject"), b"garbage".to_vec());
        assert!(matches!(err, Err(EditorError::Decode(_))));
    }

    #[test]
    fn begin_renders_the_subject_immediately() {
        let session = EditorSession::begin(
            AssetHandle::new("subject"),
            png_bytes(3, 2, [10, 20, 30, 255]),
        )
        .unwrap();

        let surface = session.surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (3, 2));
        assert!(!session.can_undo());
        assert!(!session.can_redo());
    }

    #[test]
    fn extraction_failure_means_no_session() {
        struct Refuses;
        impl BackgroundExtractor for Refuses {
            fn remove_background(&self, _image: &[u8]) -> EditorResult<Vec<u8>> {
                Err(EditorError::extraction("quota exceeded"))
            }
        }

        let err = EditorSession::begin_from_extraction(
            &Refuses,
            AssetHandle::new("subject"),
            b"payload",
        )
        .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn extraction_output_feeds_the_session() {
        struct Passthrough(Vec<u8>);
        impl BackgroundExtractor for Passthrough {
            fn remove_background(&self, _image: &[u8]) -> EditorResult<Vec<u8>> {
                Ok(self.0.clone())
            }
        }

        let extractor = Passthrough(png_bytes(2, 2, [0, 0, 0, 0]));
        let session = EditorSession::begin_from_extraction(
            &extractor,
            AssetHandle::new("subject"),
            b"original",
        )
        .unwrap();
        assert_eq!(session.surface().unwrap().width(), 2);
    }

    #[test]
    fn undo_to_older_background_handle_re_resolves_it() {
        let mut session = EditorSession::begin(
            AssetHandle::new("subject"),
            png_bytes(2, 2, [0, 0, 0, 0]),
        )
        .unwrap();

        session.set_background_image(AssetHandle::new("bg-a"), png_bytes(2, 2, [255, 0, 0, 255]));
        session.set_background_image(AssetHandle::new("bg-b"), png_bytes(2, 2, [0, 0, 255, 255]));
        session.refresh().unwrap();
        assert_eq!(
            session.surface().unwrap().pixel(0, 0),
            Some([0, 0, 255, 255])
        );

        session.undo();
        session.refresh().unwrap();
        assert_eq!(
            session.state().background_image,
            Some(AssetHandle::new("bg-a"))
        );
        assert_eq!(
            session.surface().unwrap().pixel(0, 0),
            Some([255, 0, 0, 255])
        );
    }

    #[test]
    fn background_decode_failure_is_surfaced_not_fatal() {
        let mut session = EditorSession::begin(
            AssetHandle::new("subject"),
            png_bytes(2, 2, [7, 7, 7, 255]),
        )
        .unwrap();
        let before = session.surface().unwrap().clone();

        session.set_background_image(AssetHandle::new("bg"), b"not a png".to_vec());
        assert_eq!(session.refresh().unwrap(), RenderStatus::Deferred);
        assert!(session.background_error().is_some());
        // The previous surface survives and the subject slot is untouched.
        assert_eq!(session.surface(), Some(&before));
        assert!(session.export_png().is_err());
    }

    #[test]
    fn start_over_clears_everything() {
        let mut session = EditorSession::begin(
            AssetHandle::new("subject"),
            png_bytes(2, 2, [7, 7, 7, 255]),
        )
        .unwrap();
        session.apply(&StatePatch::mode(BackgroundMode::Color));
        session.start_over();

        assert!(!session.can_undo());
        assert!(!session.can_redo());
        assert!(session.surface().is_none());
        assert_eq!(session.state(), &EditorState::default());
    }
}
