//! marble - Template overlay and pixel accounting for tiled canvases
//!
//! Templates are images placed on a world grid of fixed-size tiles. They are
//! sliced into per-tile chunks, upscaled so each pixel sits in the centre of
//! a small block, and drawn over live tile images. Every overlaid tile is
//! diffed against the template to count painted, missing and wrong pixels.

pub mod cli;
pub mod codec;
pub mod discovery;
pub mod error;
pub mod output;
pub mod progress;
pub mod registry;
pub mod render;
pub mod session;
pub mod store;
pub mod types;

pub use codec::{AuthorCodec, ContainerMeta, TemplateContainer, TemplateEntry};
pub use discovery::{discover, Manifest, Project};
pub use error::{MarbleError, Result};
pub use progress::{ProgressSummary, ProgressTable, TileStats};
pub use registry::{DeleteOutcome, ImportOutcome, RegistryOptions, StorageKey, TemplateRegistry};
pub use render::{compose_tile, extract_palette, slice_template, TileComposite};
pub use session::OverlaySession;
pub use store::{FileStore, KeyValueStore, MemoryStore, UserSettings};
pub use types::{Anchor, ChunkKey, ColourPalette, Grid, Rgb, Template, TileCoord};
