use crate::{
    assets::{AssetLoader, RasterSource},
    composite_cpu,
    core::Surface,
    error::{EditorError, EditorResult},
    state::{BackgroundMode, EditorState},
};

/// Outcome of a [`Compositor::refresh`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStatus {
    /// The surface now reflects the latest state and rasters.
    Fresh,
    /// A required raster is not ready; the previous surface (if any) is kept.
    Deferred,
}

/// Deterministically compose one frame.
///
/// The surface is sized exactly to the subject; the background's native size
/// never alters the output resolution. The background pass always runs
/// strictly before the subject pass.
#[tracing::instrument(skip(subject, background, state), fields(mode = ?state.mode))]
pub fn compose(
    subject: &RasterSource,
    background: Option<&RasterSource>,
    state: &EditorState,
) -> EditorResult<Surface> {
    let mut surface = Surface::transparent(subject.width, subject.height)?;

    match state.mode {
        BackgroundMode::Transparent => {}
        BackgroundMode::Color => {
            composite_cpu::fill_in_place(
                surface.data_mut(),
                state.background_color.to_premul_rgba8(),
            )?;
        }
        BackgroundMode::Image => {
            let bg = background.ok_or_else(|| {
                EditorError::validation("image mode requires a resolved background raster")
            })?;
            let (w, h) = (surface.width(), surface.height());
            composite_cpu::blit_cover(surface.data_mut(), w, h, &bg.rgba8_premul, bg.width, bg.height)?;
        }
    }

    composite_cpu::over_in_place(surface.data_mut(), &subject.rgba8_premul).map_err(|_| {
        EditorError::validation("subject raster byte length does not match its dimensions")
    })?;

    Ok(surface)
}

/// Exclusive owner of the rendered surface.
///
/// The surface is replaced wholesale on every successful render and handed out
/// read-only. While a required input is missing the compositor defers instead
/// of flickering to blank, and reports itself pending so consumers never read
/// a stale surface as if it were current.
#[derive(Clone, Debug, Default)]
pub struct Compositor {
    surface: Option<Surface>,
    dirty: bool,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that state or a raster changed; the current surface is stale.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Re-render if inputs changed and every required raster is ready.
    pub fn refresh(&mut self, loader: &AssetLoader, state: &EditorState) -> EditorResult<RenderStatus> {
        if !self.dirty {
            return Ok(RenderStatus::Fresh);
        }

        let Some(subject) = loader.subject.raster() else {
            tracing::debug!("render deferred: subject raster not ready");
            return Ok(RenderStatus::Deferred);
        };
        let background = if state.mode == BackgroundMode::Image {
            match loader.background.raster() {
                Some(bg) => Some(bg),
                None => {
                    tracing::debug!("render deferred: background raster not ready");
                    return Ok(RenderStatus::Deferred);
                }
            }
        } else {
            None
        };

        self.surface = Some(compose(subject, background, state)?);
        self.dirty = false;
        Ok(RenderStatus::Fresh)
    }

    /// Latest rendered surface, possibly stale while [`Self::is_pending`].
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// True when the surface does not reflect the latest inputs.
    pub fn is_pending(&self) -> bool {
        self.dirty
    }

    /// Drop the rendered surface (start over).
    pub fn reset(&mut self) {
        self.surface = None;
        self.dirty = false;
    }
}
