//! Vector-font rasterizer built on `ab_glyph`.

use std::fs;
use std::hash::Hasher;
use std::path::Path;

use ab_glyph::{Font as _, FontArc, Glyph, GlyphId, PxScale, ScaleFont as _};
use image::{Rgba, RgbaImage};
use log::{debug, info, trace};
use twox_hash::XxHash64;

use super::Rasterizer;
use crate::error::{FontCacheError, Result};
use crate::fnt::{FontData, GlyphInfo, Kerning};
use crate::packer::PixmapPacker;
use crate::parameter::FontParameter;

/// Printable ASCII, the euro sign and printable Latin-1 (U+00A0..=U+00FF).
pub fn default_charset() -> Vec<char> {
    (' '..='~').chain(['\u{20AC}']).chain('\u{00A0}'..='\u{00FF}').collect()
}

pub struct AbGlyphRasterizer {
    name: String,
    font: FontArc,
    charset: Vec<char>,
    source_hash: u64,
}

impl AbGlyphRasterizer {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&bytes);
        let source_hash = hasher.finish();

        let name = name.into();
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| FontCacheError::RasterizerFailed(format!("'{name}': {e}")))?;
        Ok(Self {
            name,
            font,
            charset: default_charset(),
            source_hash,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| FontCacheError::io(path, e))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Loaded vector font {:?} ({} bytes).", path, bytes.len());
        Self::from_bytes(name, bytes)
    }

    /// Replaces the generated character set. Duplicates are dropped, first
    /// occurrence wins.
    pub fn with_charset(mut self, chars: &str) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.charset = chars.chars().filter(|c| seen.insert(*c)).collect();
        self
    }

    pub fn charset(&self) -> &[char] {
        &self.charset
    }
}

impl Rasterizer for AbGlyphRasterizer {
    fn generate_data(
        &mut self,
        parameter: &FontParameter,
        packer: &mut PixmapPacker,
    ) -> Result<FontData> {
        parameter.validate()?;
        let scale = PxScale::from(parameter.size as f32);
        let scaled = self.font.as_scaled(scale);
        let pad = parameter.border_width.ceil() as u32;
        let pad_i = pad as i32;

        let (base, line_height) = line_metrics(
            scaled.ascent(),
            scaled.descent(),
            scaled.line_gap(),
            pad,
            parameter.space_y,
        );

        let mut glyphs = Vec::with_capacity(self.charset.len());
        let mut ids: Vec<(char, GlyphId)> = Vec::with_capacity(self.charset.len());
        for &ch in &self.charset {
            let id = self.font.glyph_id(ch);
            if id.0 == 0 && ch != ' ' {
                trace!("'{}' has no glyph in '{}'; skipped.", ch.escape_debug(), self.name);
                continue;
            }
            ids.push((ch, id));

            let xadvance = scaled.h_advance(id).round() as i32 + parameter.border_width as i32;
            let outlined = scaled.outline_glyph(Glyph {
                id,
                scale,
                position: ab_glyph::point(0.0, 0.0),
            });
            let Some(outlined) = outlined else {
                // Non-drawable glyph (e.g. space): metrics only.
                glyphs.push(GlyphInfo {
                    id: ch as u32,
                    x: 0,
                    y: 0,
                    width: 0,
                    height: 0,
                    xoffset: 0,
                    yoffset: 0,
                    xadvance,
                    page: 0,
                });
                continue;
            };

            let bounds = outlined.px_bounds();
            let w = (bounds.max.x - bounds.min.x).ceil().max(1.0) as u32;
            let h = (bounds.max.y - bounds.min.y).ceil().max(1.0) as u32;
            let mut coverage = vec![0f32; (w * h) as usize];
            outlined.draw(|x, y, v| {
                if x < w && y < h {
                    let idx = (y * w + x) as usize;
                    coverage[idx] = coverage[idx].max(v);
                }
            });

            let bitmap = compose_glyph(&coverage, w, h, parameter);
            let rect = packer.pack(&bitmap)?;
            glyphs.push(GlyphInfo {
                id: ch as u32,
                x: rect.x,
                y: rect.y,
                width: rect.w,
                height: rect.h,
                xoffset: bounds.min.x.floor() as i32 - pad_i,
                yoffset: base as i32 + bounds.min.y.floor() as i32 - pad_i,
                xadvance,
                page: rect.page as u32,
            });
        }
        glyphs.sort_by_key(|g| g.id);

        let mut kernings = Vec::new();
        for &(a, a_id) in &ids {
            for &(b, b_id) in &ids {
                let amount = scaled.kern(a_id, b_id).round() as i32;
                if amount != 0 {
                    kernings.push(Kerning {
                        first: a as u32,
                        second: b as u32,
                        amount,
                    });
                }
            }
        }

        packer.ensure_page();
        debug!(
            "Rasterized '{}' at {}px: {} glyphs, {} kerning pairs, {} pages.",
            self.name,
            parameter.size,
            glyphs.len(),
            kernings.len(),
            packer.page_count()
        );
        Ok(FontData {
            face: self.name.clone(),
            size: parameter.size,
            padding: [pad; 4],
            spacing: [packer.padding(); 2],
            outline: pad,
            line_height,
            base,
            scale_w: packer.page_size(),
            scale_h: packer.page_size(),
            pages: Vec::new(),
            glyphs,
            kernings,
        })
    }

    fn source_hash(&self) -> Option<u64> {
        Some(self.source_hash)
    }
}

/// `(base, line_height)`. The outline shifts the baseline down by `pad` but
/// leaves line spacing alone; `space_y` is added on top.
pub(crate) fn line_metrics(
    ascent: f32,
    descent: f32,
    line_gap: f32,
    pad: u32,
    space_y: i32,
) -> (u32, u32) {
    let base = ascent.ceil().max(0.0) as u32 + pad;
    let natural = (ascent - descent + line_gap).ceil() as i32;
    (base, (natural + space_y).max(0) as u32)
}

/// Tints coverage with `color` and lays a `border_width` outline in
/// `border_color` beneath it. The result is `ceil(border)` pixels larger on
/// every side.
pub(crate) fn compose_glyph(
    coverage: &[f32],
    w: u32,
    h: u32,
    parameter: &FontParameter,
) -> RgbaImage {
    let radius = parameter.border_width;
    let pad = radius.ceil() as u32;
    let (ow, oh) = (w + 2 * pad, h + 2 * pad);
    let reach = pad as i32;

    let cov_at = |x: i32, y: i32| -> f32 {
        if x < 0 || y < 0 || x >= w as i32 || y >= h as i32 {
            0.0
        } else {
            coverage[(y as u32 * w + x as u32) as usize]
        }
    };

    let [fr, fg, fb, fa] = parameter.color.to_f32();
    let [br, bg, bb, ba] = parameter.border_color.to_f32();

    RgbaImage::from_fn(ow, oh, |ox, oy| {
        let (gx, gy) = (ox as i32 - reach, oy as i32 - reach);
        let fill = cov_at(gx, gy) * fa;

        let mut border = 0f32;
        if radius > 0.0 {
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let dist = ((dx * dx + dy * dy) as f32).sqrt();
                    let weight = (radius + 1.0 - dist).clamp(0.0, 1.0);
                    if weight > 0.0 {
                        border = border.max(cov_at(gx + dx, gy + dy) * weight);
                    }
                }
            }
        }
        let border = border * ba;

        // `fill` over `border`.
        let out_a = fill + border * (1.0 - fill);
        if out_a <= 0.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let mix = |f: f32, b: f32| {
            let v = (f * fill + b * border * (1.0 - fill)) / out_a;
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };
        Rgba([
            mix(fr, br),
            mix(fg, bg),
            mix(fb, bb),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::{compose_glyph, default_charset, line_metrics};
    use crate::color::Color;
    use crate::parameter::FontParameter;

    fn param(border: f32) -> FontParameter {
        FontParameter {
            size: 8,
            border_width: border,
            border_color: Color::rgba(0xFF, 0, 0, 0xFF),
            color: Color::WHITE,
            space_y: 0,
        }
    }

    #[test]
    fn plain_glyph_takes_fill_color_and_coverage_alpha() {
        let cov = [1.0, 0.5, 0.0, 0.0];
        let img = compose_glyph(&cov, 2, 2, &param(0.0));
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(1, 0).0[3], 128);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn border_grows_bitmap_and_surrounds_fill() {
        let cov = [1.0];
        let img = compose_glyph(&cov, 1, 1, &param(1.0));
        assert_eq!(img.dimensions(), (3, 3));
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255, 255], "center keeps fill");
        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0, 255], "edge neighbour is border");
        let corner = img.get_pixel(0, 0).0;
        assert!(corner[3] < 255, "diagonal gets a soft edge, got {corner:?}");
    }

    #[test]
    fn border_moves_baseline_but_not_line_spacing() {
        assert_eq!(line_metrics(9.2, -2.6, 1.0, 0, 0), (10, 13));
        assert_eq!(line_metrics(9.2, -2.6, 1.0, 2, 0), (12, 13));
        assert_eq!(line_metrics(9.2, -2.6, 1.0, 2, 3), (12, 16));
        assert_eq!(line_metrics(9.2, -2.6, 1.0, 0, -20), (10, 0));
    }

    #[test]
    fn default_charset_covers_ascii_and_latin1() {
        let chars = default_charset();
        assert_eq!(chars.len(), 95 + 1 + 96);
        for c in ['A', '~', ' ', '\u{00A0}', 'é', 'ÿ', '€'] {
            assert!(chars.contains(&c), "{c:?}");
        }
        assert!(!chars.contains(&'\u{007F}'));
        assert!(!chars.contains(&'\u{0085}'));
    }
}
