use std::sync::Arc;

use crate::core::AssetHandle;
use crate::error::EditorResult;

pub mod decode;

/// Decoded raster with known dimensions.
///
/// Pixel bytes are row-major premultiplied RGBA8, tightly packed. Instances
/// are immutable once created; a changed source produces a replacement.
#[derive(Clone, Debug)]
pub struct RasterSource {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Token identifying one decode request against one slot. Completions carrying
/// a token older than the slot's latest request are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeToken {
    generation: u64,
}

#[derive(Clone, Debug, Default)]
enum SlotState {
    #[default]
    Empty,
    Pending {
        handle: AssetHandle,
    },
    Ready {
        handle: AssetHandle,
        raster: RasterSource,
    },
    Failed {
        handle: AssetHandle,
        message: String,
    },
}

/// One logical image input (subject or background) resolving asynchronously
/// from an opaque handle to a [`RasterSource`].
///
/// There is no cancel primitive: switching handles while a decode is in
/// flight bumps the generation, and the stale completion is dropped when it
/// eventually arrives (last reference wins, independent of completion order).
#[derive(Clone, Debug, Default)]
pub struct ImageSlot {
    generation: u64,
    state: SlotState,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin resolving `handle`.
    ///
    /// Returns the token the decode completion must present, or `None` when
    /// the slot already tracks this handle (a resolved raster is reused, a
    /// pending decode keeps running, and a failed decode is not retried
    /// automatically).
    pub fn request(&mut self, handle: AssetHandle) -> Option<DecodeToken> {
        if self.handle() == Some(&handle) {
            return None;
        }
        self.generation += 1;
        self.state = SlotState::Pending { handle };
        Some(DecodeToken {
            generation: self.generation,
        })
    }

    /// Deliver the outcome of the decode identified by `token`.
    ///
    /// Returns `false` when the completion was ignored: the token is stale
    /// (a newer request superseded it) or the slot is no longer pending.
    pub fn complete(&mut self, token: DecodeToken, result: EditorResult<RasterSource>) -> bool {
        if token.generation != self.generation {
            tracing::debug!(
                token = token.generation,
                current = self.generation,
                "ignoring stale decode completion"
            );
            return false;
        }
        let SlotState::Pending { handle } = std::mem::take(&mut self.state) else {
            return false;
        };
        self.state = match result {
            Ok(raster) => SlotState::Ready { handle, raster },
            Err(err) => SlotState::Failed {
                handle,
                message: err.to_string(),
            },
        };
        true
    }

    /// Drop whatever the slot holds; any in-flight decode becomes stale.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.state = SlotState::Empty;
    }

    /// Handle the slot currently tracks, in any state.
    pub fn handle(&self) -> Option<&AssetHandle> {
        match &self.state {
            SlotState::Empty => None,
            SlotState::Pending { handle }
            | SlotState::Ready { handle, .. }
            | SlotState::Failed { handle, .. } => Some(handle),
        }
    }

    pub fn raster(&self) -> Option<&RasterSource> {
        match &self.state {
            SlotState::Ready { raster, .. } => Some(raster),
            _ => None,
        }
    }

    /// Human-readable decode failure, surfaced for display rather than retried.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SlotState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SlotState::Ready { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SlotState::Pending { .. })
    }
}

/// The two image inputs of a composite: the subject cutout (always required)
/// and the optional background image (required only in image mode).
#[derive(Clone, Debug, Default)]
pub struct AssetLoader {
    pub subject: ImageSlot,
    pub background: ImageSlot,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }
}
