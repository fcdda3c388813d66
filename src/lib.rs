//! Persistent on-disk cache of bitmap fonts generated from vector fonts.
//!
//! [`FontCache::load_or_generate`] returns a cached font when the catalog
//! shows it was generated with the same parameters, version and screen
//! resolution, and otherwise rasterizes it, writes a BMFont descriptor plus
//! PNG atlas pages, and records it in the catalog.

pub mod cache;
pub mod catalog;
pub mod color;
pub mod config;
pub mod error;
pub mod events;
pub mod fnt;
pub mod font;
pub mod font_set;
pub mod packer;
pub mod parameter;
pub mod paths;
pub mod platform;
pub mod raster;
pub mod writer;

pub use cache::FontCache;
pub use color::Color;
pub use config::CacheConfig;
pub use error::{ErrorKind, FontCacheError, Result};
pub use events::{CacheEvent, CacheEvents, LogEvents, RecordingEvents};
pub use font::BitmapFont;
pub use font_set::{FontSet, FontSetLoader, SizeScaling, SizeSlot};
pub use packer::PixmapPacker;
pub use parameter::FontParameter;
pub use platform::Resolution;
pub use raster::{AbGlyphRasterizer, Rasterizer};
