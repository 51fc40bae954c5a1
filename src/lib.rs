#![forbid(unsafe_code)]

pub mod assets;
pub mod composite_cpu;
pub mod core;
pub mod encode_png;
pub mod error;
pub mod extract;
pub mod history;
pub mod render;
pub mod session;
pub mod state;

pub use assets::{AssetLoader, DecodeToken, ImageSlot, RasterSource, decode::decode_image};
pub use core::{AssetHandle, Rgb, Surface};
pub use encode_png::encode_png;
pub use error::{EditorError, EditorResult};
pub use extract::BackgroundExtractor;
pub use history::History;
pub use render::{Compositor, RenderStatus, compose};
pub use session::EditorSession;
pub use state::{BackgroundMode, EditorState, StatePatch};
