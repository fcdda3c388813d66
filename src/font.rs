//! In-memory bitmap fonts, either freshly generated or rebuilt from a cached
//! descriptor and its page images.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use image::RgbaImage;
use log::{debug, info};

use crate::error::{FontCacheError, Result};
use crate::fnt::{self, FontData};

/// Private-use glyph some fonts carry as their explicit fallback.
const FONT_DEFAULT_CHAR: char = '\u{F8FF}';

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub page: usize,
    pub tex_rect: [f32; 4], // px: [x0, y0, x1, y1] (texture space)
    pub size: [f32; 2],
    pub offset: [f32; 2], // [x_off_from_pen, y_off_from_line_top]
    pub advance: f32,
}

pub struct BitmapFont {
    data: FontData,
    glyph_map: HashMap<char, Glyph>,
    kernings: HashMap<(char, char), i32>,
    default_glyph: Option<Glyph>,
    pages: Vec<RgbaImage>,
}

impl std::fmt::Debug for BitmapFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitmapFont")
            .field("face", &self.data.face)
            .field("size", &self.data.size)
            .field("glyphs", &self.glyph_map.len())
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl BitmapFont {
    /// Takes ownership of the page buffers; dropping the font releases them.
    pub fn from_parts(data: FontData, pages: Vec<RgbaImage>) -> Result<Self> {
        if pages.len() != data.pages.len() {
            return Err(FontCacheError::corrupt_artifact(
                &data.face,
                format!(
                    "descriptor lists {} pages but {} images were supplied",
                    data.pages.len(),
                    pages.len()
                ),
            ));
        }

        let mut glyph_map = HashMap::with_capacity(data.glyphs.len() + 1);
        for g in &data.glyphs {
            let Some(ch) = char::from_u32(g.id) else {
                debug!("Skipping glyph id {} (not a scalar value).", g.id);
                continue;
            };
            let page = g.page as usize;
            let Some(img) = pages.get(page) else {
                return Err(FontCacheError::corrupt_artifact(
                    &data.face,
                    format!("glyph {} refers to missing page {page}", g.id),
                ));
            };
            let (pw, ph) = img.dimensions();
            let outside =
                |pos: u32, len: u32, limit: u32| pos.checked_add(len).is_none_or(|end| end > limit);
            if outside(g.x, g.width, pw) || outside(g.y, g.height, ph) {
                return Err(FontCacheError::corrupt_artifact(
                    &data.pages[page],
                    format!("glyph {} rect exceeds {pw}x{ph} page", g.id),
                ));
            }
            glyph_map.insert(
                ch,
                Glyph {
                    page,
                    tex_rect: [
                        g.x as f32,
                        g.y as f32,
                        (g.x + g.width) as f32,
                        (g.y + g.height) as f32,
                    ],
                    size: [g.width as f32, g.height as f32],
                    offset: [g.xoffset as f32, g.yoffset as f32],
                    advance: g.xadvance as f32,
                },
            );
        }
        synthesize_space_from_nbsp(&mut glyph_map);

        let kernings = data
            .kernings
            .iter()
            .filter_map(|k| {
                Some(((char::from_u32(k.first)?, char::from_u32(k.second)?), k.amount))
            })
            .collect();
        let default_glyph = glyph_map
            .get(&FONT_DEFAULT_CHAR)
            .or_else(|| glyph_map.get(&'?'))
            .copied();

        Ok(Self {
            data,
            glyph_map,
            kernings,
            default_glyph,
            pages,
        })
    }

    pub fn data(&self) -> &FontData {
        &self.data
    }

    pub fn name(&self) -> &str {
        &self.data.face
    }

    pub fn line_height(&self) -> u32 {
        self.data.line_height
    }

    pub fn base(&self) -> u32 {
        self.data.base
    }

    pub fn pages(&self) -> &[RgbaImage] {
        &self.pages
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_map.len()
    }

    /// Falls back to the font's default glyph for characters it lacks.
    pub fn find_glyph(&self, c: char) -> Option<&Glyph> {
        self.glyph_map.get(&c).or(self.default_glyph.as_ref())
    }

    pub fn kerning(&self, first: char, second: char) -> i32 {
        self.kernings.get(&(first, second)).copied().unwrap_or(0)
    }

    /// Logical width of one line: integer advances plus kerning.
    pub fn measure_line_width(&self, text: &str) -> i32 {
        let mut width = 0;
        let mut prev: Option<char> = None;
        for c in text.chars() {
            if let Some(p) = prev {
                width += self.kerning(p, c);
            }
            width += self.find_glyph(c).map_or(0, |g| g.advance as i32);
            prev = Some(c);
        }
        width
    }
}

fn synthesize_space_from_nbsp(all_glyphs: &mut HashMap<char, Glyph>) {
    if let Some(space) = all_glyphs.get(&' ').copied() {
        all_glyphs.entry('\u{00A0}').or_insert(space);
    } else if let Some(nbsp) = all_glyphs.get(&'\u{00A0}').copied() {
        all_glyphs.insert(' ', nbsp);
    }
}

/* ======================= LOADER ======================= */

pub fn descriptor_path(dir: &Path, id: &str) -> std::path::PathBuf {
    dir.join(format!("{id}.fnt"))
}

/// Rebuilds `<dir>/<id>.fnt` and the page images it references.
pub fn load(id: &str, dir: &Path) -> Result<BitmapFont> {
    let fnt_path = descriptor_path(dir, id);
    let text = match fs::read_to_string(&fnt_path) {
        Ok(text) => text,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            return Err(FontCacheError::ArtifactMissing(fnt_path));
        }
        Err(e) if e.kind() == IoErrorKind::InvalidData => {
            return Err(FontCacheError::corrupt_artifact(&fnt_path, e.to_string()));
        }
        Err(e) => return Err(FontCacheError::io(&fnt_path, e)),
    };
    let data = fnt::parse(&text)
        .map_err(|e| FontCacheError::corrupt_artifact(&fnt_path, e.to_string()))?;

    let mut pages = Vec::with_capacity(data.pages.len());
    for page_ref in &data.pages {
        let page_path = dir.join(page_ref);
        // A descriptor pointing at a missing page is a broken artifact, not
        // a missing one.
        let img = image::open(&page_path).map_err(|e| {
            FontCacheError::corrupt_artifact(&page_path, format!("page unreadable: {e}"))
        })?;
        pages.push(img.into_rgba8());
    }

    let font = BitmapFont::from_parts(data, pages)
        .map_err(|e| FontCacheError::corrupt_artifact(&fnt_path, e.to_string()))?;
    info!(
        "Loaded generated font '{}' ({} glyphs, {} pages).",
        id,
        font.glyph_count(),
        font.pages().len()
    );
    Ok(font)
}
