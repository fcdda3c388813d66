//! The rasterizer seam: turns a parameter record into glyph bitmaps (pushed
//! into the packer) and the metrics that describe them.

mod outline;

pub use outline::{AbGlyphRasterizer, default_charset};

use crate::error::Result;
use crate::fnt::FontData;
use crate::packer::PixmapPacker;
use crate::parameter::FontParameter;

pub trait Rasterizer {
    /// Emits every glyph bitmap into `packer` and returns the font data
    /// describing them. `FontData::pages` may be left empty; the artifact
    /// writer fills page references in.
    fn generate_data(
        &mut self,
        parameter: &FontParameter,
        packer: &mut PixmapPacker,
    ) -> Result<FontData>;

    /// Fingerprint of the source font, if known. A change invalidates every
    /// cached font generated from it.
    fn source_hash(&self) -> Option<u64> {
        None
    }
}

impl<R: Rasterizer + ?Sized> Rasterizer for &mut R {
    fn generate_data(
        &mut self,
        parameter: &FontParameter,
        packer: &mut PixmapPacker,
    ) -> Result<FontData> {
        (**self).generate_data(parameter, packer)
    }

    fn source_hash(&self) -> Option<u64> {
        (**self).source_hash()
    }
}
