//! Emits a generated font as `<dir>/<id>.fnt` plus `<dir>/<id>/page_N.png`.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::{debug, info};

use crate::error::{FontCacheError, Result};
use crate::fnt::{self, FontData};
use crate::font::descriptor_path;

#[inline(always)]
pub fn page_file_name(index: usize) -> String {
    format!("page_{index}.png")
}

/// Writes every page, then the descriptor. Page references in `data` are
/// rewritten to `<id>/<file>` so the descriptor resolves relative to `dir`.
///
/// Pages from an earlier generation of the same `id` are removed first.
pub fn write(id: &str, data: &mut FontData, pages: &[RgbaImage], dir: &Path) -> Result<PathBuf> {
    let page_dir = dir.join(id);
    match fs::remove_dir_all(&page_dir) {
        Ok(()) => debug!("Cleared previous pages in {page_dir:?}."),
        Err(e) if e.kind() == IoErrorKind::NotFound => {}
        Err(e) => return Err(FontCacheError::io(&page_dir, e)),
    }
    fs::create_dir_all(&page_dir).map_err(|e| FontCacheError::io(&page_dir, e))?;

    let mut refs = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        let file = page_file_name(i);
        let path = page_dir.join(&file);
        page.save_with_format(&path, ImageFormat::Png)
            .map_err(|e| FontCacheError::image(&path, e))?;
        refs.push(format!("{id}/{file}"));
    }

    data.face = id.to_string();
    data.pages = refs;
    let fnt_path = descriptor_path(dir, id);
    fs::write(&fnt_path, fnt::write(data)).map_err(|e| FontCacheError::io(&fnt_path, e))?;
    info!(
        "Saved font '{}': descriptor {:?}, {} page(s) in {:?}.",
        id,
        fnt_path,
        pages.len(),
        page_dir
    );
    Ok(fnt_path)
}

#[cfg(test)]
mod tests {
    use super::write;
    use crate::fnt::{self, FontData, GlyphInfo};
    use image::{Rgba, RgbaImage};
    use std::fs;

    fn data() -> FontData {
        FontData {
            face: "whatever".to_string(),
            size: 10,
            line_height: 12,
            base: 9,
            scale_w: 16,
            scale_h: 16,
            glyphs: vec![GlyphInfo {
                id: 'A' as u32,
                x: 1,
                y: 1,
                width: 4,
                height: 4,
                xoffset: 0,
                yoffset: 2,
                xadvance: 5,
                page: 1,
            }],
            ..FontData::default()
        }
    }

    #[test]
    fn writes_pages_then_relocatable_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let pages = vec![RgbaImage::new(16, 16), RgbaImage::from_pixel(16, 16, Rgba([1, 2, 3, 4]))];
        let mut d = data();
        let fnt_path = write("small", &mut d, &pages, dir.path()).unwrap();

        assert_eq!(fnt_path, dir.path().join("small.fnt"));
        assert!(dir.path().join("small/page_0.png").is_file());
        assert!(dir.path().join("small/page_1.png").is_file());

        let parsed = fnt::parse(&fs::read_to_string(&fnt_path).unwrap()).unwrap();
        assert_eq!(parsed.pages, vec!["small/page_0.png", "small/page_1.png"]);
        assert_eq!(parsed.face, "small");
        assert_eq!(parsed, d);
    }

    #[test]
    fn regeneration_drops_stale_pages() {
        let dir = tempfile::tempdir().unwrap();
        let two = vec![RgbaImage::new(16, 16), RgbaImage::new(16, 16)];
        write("f", &mut data(), &two, dir.path()).unwrap();

        let mut one_page = FontData {
            glyphs: Vec::new(),
            ..data()
        };
        write("f", &mut one_page, &[RgbaImage::new(16, 16)], dir.path()).unwrap();
        assert!(dir.path().join("f/page_0.png").is_file());
        assert!(!dir.path().join("f/page_1.png").exists());
    }
}
