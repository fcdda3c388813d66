#![allow(dead_code)]

use std::path::Path;

use fontcache::fnt::{FontData, GlyphInfo, Kerning};
use fontcache::paths::PathResolver;
use fontcache::{
    CacheConfig, Color, FontCache, FontCacheError, FontParameter, PixmapPacker, Rasterizer,
    RecordingEvents, Resolution, Result,
};
use image::{Rgba, RgbaImage};

pub const CHARS: &str = " ?ABab";
pub const SCREEN: Resolution = Resolution::new(1600, 900);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Solid blocks instead of outlines; counts how often it ran.
#[derive(Debug, Default)]
pub struct BlockRasterizer {
    pub calls: usize,
    pub source_hash: Option<u64>,
    pub fail: bool,
}

impl BlockRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_hash(hash: u64) -> Self {
        Self {
            source_hash: Some(hash),
            ..Self::default()
        }
    }
}

impl Rasterizer for BlockRasterizer {
    fn generate_data(
        &mut self,
        parameter: &FontParameter,
        packer: &mut PixmapPacker,
    ) -> Result<FontData> {
        self.calls += 1;
        if self.fail {
            return Err(FontCacheError::RasterizerFailed("no outlines".to_string()));
        }
        let [r, g, b, a] = parameter.color.to_array();
        let (w, h) = ((parameter.size / 2).max(1), parameter.size);
        let mut glyphs = Vec::new();
        for ch in CHARS.chars() {
            let advance = w as i32 + 1;
            if ch == ' ' {
                glyphs.push(GlyphInfo {
                    id: ch as u32,
                    x: 0,
                    y: 0,
                    width: 0,
                    height: 0,
                    xoffset: 0,
                    yoffset: 0,
                    xadvance: advance,
                    page: 0,
                });
                continue;
            }
            let rect = packer.pack(&RgbaImage::from_pixel(w, h, Rgba([r, g, b, a])))?;
            glyphs.push(GlyphInfo {
                id: ch as u32,
                x: rect.x,
                y: rect.y,
                width: rect.w,
                height: rect.h,
                xoffset: 0,
                yoffset: 0,
                xadvance: advance,
                page: rect.page as u32,
            });
        }
        Ok(FontData {
            face: "blocks".to_string(),
            size: parameter.size,
            line_height: (parameter.size as i32 + parameter.space_y).max(0) as u32,
            base: parameter.size,
            scale_w: packer.page_size(),
            scale_h: packer.page_size(),
            spacing: [packer.padding(); 2],
            glyphs,
            kernings: vec![Kerning {
                first: 'A' as u32,
                second: 'b' as u32,
                amount: -1,
            }],
            ..FontData::default()
        })
    }

    fn source_hash(&self) -> Option<u64> {
        self.source_hash
    }
}

pub fn s1_parameter() -> FontParameter {
    FontParameter {
        size: 12,
        border_width: 0.0,
        border_color: "00000000".parse::<Color>().unwrap(),
        color: "FFFFFFFF".parse::<Color>().unwrap(),
        space_y: 0,
    }
}

pub fn config(version: &str) -> CacheConfig {
    CacheConfig {
        version: version.to_string(),
        always_regenerate: false,
        ..CacheConfig::default()
    }
}

pub fn cache(root: &Path, config: CacheConfig, events: &RecordingEvents) -> FontCache {
    FontCache::with_resolver(config, PathResolver::with_root(root), SCREEN)
        .unwrap()
        .with_events(events.clone())
}
