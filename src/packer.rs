//! Skyline atlas packer: fixed-size RGBA8 pages, a fixed gap between
//! glyphs, bottom-left placement along the skyline of each page.

use image::{RgbaImage, imageops};
use log::{debug, trace};

use crate::error::{FontCacheError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 1024;
pub const DEFAULT_PADDING: u32 = 2;

/// Where a bitmap landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRect {
    pub page: usize,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    x: u32,
    y: u32,
    w: u32,
}

struct Page {
    image: RgbaImage,
    skyline: Vec<Segment>,
}

impl Page {
    fn new(size: u32) -> Self {
        Self {
            image: RgbaImage::new(size, size),
            skyline: vec![Segment { x: 0, y: 0, w: size }],
        }
    }

    /// Lowest (then left-most) spot for a `w`x`h` bitmap whose footprint is
    /// `fw`x`fh`. Returns `(segment index, x, y)`.
    fn find(&self, size: u32, w: u32, h: u32, fw: u32) -> Option<(usize, u32, u32)> {
        let mut best: Option<(usize, u32, u32)> = None;
        for (i, seg) in self.skyline.iter().enumerate() {
            let x = seg.x;
            if x + w > size {
                break;
            }
            let span = fw.min(size - x);
            let mut y = 0;
            let mut covered = 0;
            for s in &self.skyline[i..] {
                if covered >= span {
                    break;
                }
                y = y.max(s.y);
                covered += s.w;
            }
            if y + h > size {
                continue;
            }
            if best.is_none_or(|(_, bx, by)| y < by || (y == by && x < bx)) {
                best = Some((i, x, y));
            }
        }
        best
    }

    fn place(&mut self, size: u32, idx: usize, x: u32, y: u32, fw: u32, fh: u32) {
        let fw = fw.min(size - x);
        let end = x + fw;
        let top = (y + fh).min(size);

        let mut next = Vec::with_capacity(self.skyline.len() + 2);
        next.extend_from_slice(&self.skyline[..idx]);
        next.push(Segment { x, y: top, w: fw });
        for seg in &self.skyline[idx..] {
            let seg_end = seg.x + seg.w;
            if seg_end <= end {
                continue;
            }
            if seg.x < end {
                next.push(Segment {
                    x: end,
                    y: seg.y,
                    w: seg_end - end,
                });
            } else {
                next.push(*seg);
            }
        }

        // Merge neighbours at the same height.
        let mut merged: Vec<Segment> = Vec::with_capacity(next.len());
        for seg in next {
            match merged.last_mut() {
                Some(last) if last.y == seg.y => last.w += seg.w,
                _ => merged.push(seg),
            }
        }
        self.skyline = merged;
    }
}

/// Receives glyph bitmaps from the rasterizer and owns the resulting pages
/// until [`PixmapPacker::into_pages`] hands them off.
pub struct PixmapPacker {
    page_size: u32,
    padding: u32,
    pages: Vec<Page>,
}

impl PixmapPacker {
    pub fn new(page_size: u32, padding: u32) -> Self {
        Self {
            page_size,
            padding,
            pages: Vec::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&RgbaImage> {
        self.pages.get(index).map(|p| &p.image)
    }

    /// Copies `bitmap` into the first page with room, opening a new page when
    /// none has any.
    pub fn pack(&mut self, bitmap: &RgbaImage) -> Result<PackedRect> {
        let (w, h) = bitmap.dimensions();
        let size = self.page_size;
        if w > size || h > size {
            return Err(FontCacheError::RasterizerFailed(format!(
                "glyph bitmap {w}x{h} does not fit a {size}x{size} page"
            )));
        }
        let (fw, fh) = (w + self.padding, h + self.padding);

        let found = self
            .pages
            .iter()
            .enumerate()
            .find_map(|(pi, page)| page.find(size, w, h, fw).map(|(i, x, y)| (pi, i, x, y)));
        let (page_idx, seg_idx, x, y) = match found {
            Some(spot) => spot,
            None => {
                let page = Page::new(size);
                let (i, x, y) = page.find(size, w, h, fw).ok_or_else(|| {
                    FontCacheError::RasterizerFailed(format!(
                        "glyph bitmap {w}x{h} rejected by an empty page"
                    ))
                })?;
                self.pages.push(page);
                debug!("Opened atlas page {} ({size}x{size}).", self.pages.len() - 1);
                (self.pages.len() - 1, i, x, y)
            }
        };

        let page = &mut self.pages[page_idx];
        page.place(size, seg_idx, x, y, fw, fh);
        imageops::replace(&mut page.image, bitmap, i64::from(x), i64::from(y));
        trace!("Packed {w}x{h} at page {page_idx} ({x},{y}).");
        Ok(PackedRect {
            page: page_idx,
            x,
            y,
            w,
            h,
        })
    }

    /// Ensures at least one page exists; fonts with no visible glyphs still
    /// reference page 0.
    pub fn ensure_page(&mut self) {
        if self.pages.is_empty() {
            self.pages.push(Page::new(self.page_size));
        }
    }

    pub fn into_pages(self) -> Vec<RgbaImage> {
        self.pages.into_iter().map(|p| p.image).collect()
    }
}
