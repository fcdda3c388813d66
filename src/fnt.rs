//! AngelCode BMFont descriptors in text form.
//!
//! The writer is deterministic and the parser keeps every field the writer
//! emits, so `write(&parse(text)?) == text` for any descriptor written here.
//! Fields the writer doesn't model (`bold`, `charset`, channel masks, ...)
//! are accepted on input and written back with their fixed values.

use std::collections::HashMap;
use std::fmt::Write as _;

/// One `char` line. Coordinates are texture pixels on `page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphInfo {
    pub id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub xoffset: i32,
    pub yoffset: i32,
    pub xadvance: i32,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kerning {
    pub first: u32,
    pub second: u32,
    pub amount: i32,
}

/// Font metrics plus glyph placement: what the rasterizer produces and what
/// the descriptor stores.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FontData {
    pub face: String,
    pub size: u32,
    /// up, right, down, left
    pub padding: [u32; 4],
    pub spacing: [u32; 2],
    pub outline: u32,
    pub line_height: u32,
    pub base: u32,
    pub scale_w: u32,
    pub scale_h: u32,
    /// Page image references, relative to the descriptor's directory.
    pub pages: Vec<String>,
    pub glyphs: Vec<GlyphInfo>,
    pub kernings: Vec<Kerning>,
}

impl FontData {
    pub fn glyph(&self, id: u32) -> Option<&GlyphInfo> {
        self.glyphs.iter().find(|g| g.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FntError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for FntError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for FntError {}

/* ======================= WRITER ======================= */

pub fn write(data: &FontData) -> String {
    let mut out = String::with_capacity(128 + data.glyphs.len() * 96);
    let [pu, pr, pd, pl] = data.padding;
    let [sx, sy] = data.spacing;
    // Infallible: fmt::Write for String never errors.
    let _ = writeln!(
        out,
        "info face=\"{}\" size={} bold=0 italic=0 charset=\"\" unicode=1 stretchH=100 smooth=1 aa=1 padding={pu},{pr},{pd},{pl} spacing={sx},{sy} outline={}",
        data.face, data.size, data.outline
    );
    let _ = writeln!(
        out,
        "common lineHeight={} base={} scaleW={} scaleH={} pages={} packed=0 alphaChnl=0 redChnl=0 greenChnl=0 blueChnl=0",
        data.line_height,
        data.base,
        data.scale_w,
        data.scale_h,
        data.pages.len()
    );
    for (i, file) in data.pages.iter().enumerate() {
        let _ = writeln!(out, "page id={i} file=\"{file}\"");
    }
    let _ = writeln!(out, "chars count={}", data.glyphs.len());
    for g in &data.glyphs {
        let _ = writeln!(
            out,
            "char id={} x={} y={} width={} height={} xoffset={} yoffset={} xadvance={} page={} chnl=15",
            g.id, g.x, g.y, g.width, g.height, g.xoffset, g.yoffset, g.xadvance, g.page
        );
    }
    if !data.kernings.is_empty() {
        let _ = writeln!(out, "kernings count={}", data.kernings.len());
        for k in &data.kernings {
            let _ = writeln!(
                out,
                "kerning first={} second={} amount={}",
                k.first, k.second, k.amount
            );
        }
    }
    out
}

/* ======================= PARSER ======================= */

// Far above any real atlas; bounds what a tampered `pages=` can allocate.
const MAX_PAGES: usize = 1024;

/// Splits `tag k=v k="quoted v" ...` into the tag and a key map.
fn tokenize(line: &str) -> Option<(&str, HashMap<&str, &str>)> {
    let line = line.trim();
    let (tag, mut rest) = match line.find(char::is_whitespace) {
        Some(i) => (&line[..i], line[i..].trim_start()),
        None => (line, ""),
    };
    if tag.is_empty() {
        return None;
    }
    let mut fields = HashMap::new();
    while !rest.is_empty() {
        let eq = rest.find('=')?;
        let key = rest[..eq].trim();
        let after = &rest[eq + 1..];
        let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            let end = quoted.find('"')?;
            (&quoted[..end], &quoted[end + 1..])
        } else {
            let end = after.find(char::is_whitespace).unwrap_or(after.len());
            (&after[..end], &after[end..])
        };
        fields.insert(key, value);
        rest = remaining.trim_start();
    }
    Some((tag, fields))
}

struct Fields<'a> {
    line: usize,
    tag: &'a str,
    map: HashMap<&'a str, &'a str>,
}

impl<'a> Fields<'a> {
    fn err(&self, message: String) -> FntError {
        FntError {
            line: self.line,
            message,
        }
    }

    fn raw(&self, key: &str) -> Result<&'a str, FntError> {
        self.map
            .get(key)
            .copied()
            .ok_or_else(|| self.err(format!("'{}' is missing '{key}'", self.tag)))
    }

    fn num<T: std::str::FromStr>(&self, key: &str) -> Result<T, FntError> {
        let raw = self.raw(key)?;
        raw.parse()
            .map_err(|_| self.err(format!("'{}' has bad '{key}' value '{raw}'", self.tag)))
    }

    fn num_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, FntError> {
        if self.map.contains_key(key) {
            self.num(key)
        } else {
            Ok(default)
        }
    }

    fn list<const N: usize>(&self, key: &str) -> Result<[u32; N], FntError> {
        let Some(raw) = self.map.get(key) else {
            return Ok([0; N]);
        };
        let mut out = [0u32; N];
        let mut parts = raw.split(',');
        for slot in &mut out {
            *slot = parts
                .next()
                .and_then(|p| p.trim().parse().ok())
                .ok_or_else(|| self.err(format!("bad '{key}' list '{raw}'")))?;
        }
        Ok(out)
    }
}

pub fn parse(text: &str) -> Result<FontData, FntError> {
    let mut data = FontData::default();
    let mut saw_common = false;
    let mut page_count = 0usize;
    let mut pages: Vec<Option<String>> = Vec::new();
    let mut declared_chars: Option<usize> = None;
    let mut declared_kernings: Option<usize> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.trim().is_empty() {
            continue;
        }
        let (tag, map) = tokenize(raw).ok_or_else(|| FntError {
            line: line_no,
            message: format!("unreadable line '{raw}'"),
        })?;
        let f = Fields {
            line: line_no,
            tag,
            map,
        };

        match tag {
            "info" => {
                data.face = f.map.get("face").copied().unwrap_or_default().to_string();
                data.size = f.num_or("size", 0)?;
                data.padding = f.list::<4>("padding")?;
                data.spacing = f.list::<2>("spacing")?;
                data.outline = f.num_or("outline", 0)?;
            }
            "common" => {
                data.line_height = f.num("lineHeight")?;
                data.base = f.num("base")?;
                data.scale_w = f.num_or("scaleW", 0)?;
                data.scale_h = f.num_or("scaleH", 0)?;
                page_count = f.num("pages")?;
                if page_count > MAX_PAGES {
                    return Err(f.err(format!(
                        "{page_count} pages exceeds the {MAX_PAGES} page limit"
                    )));
                }
                pages = vec![None; page_count];
                saw_common = true;
            }
            "page" => {
                let id: usize = f.num("id")?;
                let file = f.raw("file")?;
                let slot = pages
                    .get_mut(id)
                    .ok_or_else(|| f.err(format!("page id {id} outside 0..{page_count}")))?;
                if slot.replace(file.to_string()).is_some() {
                    return Err(f.err(format!("page id {id} declared twice")));
                }
            }
            "chars" => declared_chars = Some(f.num("count")?),
            "char" => {
                let glyph = GlyphInfo {
                    id: f.num("id")?,
                    x: f.num("x")?,
                    y: f.num("y")?,
                    width: f.num("width")?,
                    height: f.num("height")?,
                    xoffset: f.num("xoffset")?,
                    yoffset: f.num("yoffset")?,
                    xadvance: f.num("xadvance")?,
                    page: f.num_or("page", 0)?,
                };
                if glyph.page as usize >= page_count {
                    return Err(f.err(format!(
                        "char {} refers to page {} of {page_count}",
                        glyph.id, glyph.page
                    )));
                }
                data.glyphs.push(glyph);
            }
            "kernings" => declared_kernings = Some(f.num("count")?),
            "kerning" => data.kernings.push(Kerning {
                first: f.num("first")?,
                second: f.num("second")?,
                amount: f.num("amount")?,
            }),
            other => {
                return Err(f.err(format!("unknown tag '{other}'")));
            }
        }
    }

    let eof = |message: String| FntError {
        line: text.lines().count(),
        message,
    };
    if !saw_common {
        return Err(eof("missing 'common' line".to_string()));
    }
    data.pages = pages
        .into_iter()
        .enumerate()
        .map(|(i, p)| p.ok_or_else(|| eof(format!("page {i} never declared"))))
        .collect::<Result<_, _>>()?;
    if let Some(n) = declared_chars
        && n != data.glyphs.len()
    {
        return Err(eof(format!("declared {n} chars, found {}", data.glyphs.len())));
    }
    if let Some(n) = declared_kernings
        && n != data.kernings.len()
    {
        return Err(eof(format!(
            "declared {n} kernings, found {}",
            data.kernings.len()
        )));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::{FontData, GlyphInfo, Kerning, parse, write};

    fn sample() -> FontData {
        FontData {
            face: "small".to_string(),
            size: 12,
            padding: [1, 1, 1, 1],
            spacing: [1, 1],
            outline: 0,
            line_height: 14,
            base: 11,
            scale_w: 1024,
            scale_h: 1024,
            pages: vec!["small/page_0.png".to_string(), "small/page_1.png".to_string()],
            glyphs: vec![
                GlyphInfo { id: 32, x: 0, y: 0, width: 0, height: 0, xoffset: 0, yoffset: 0, xadvance: 3, page: 0 },
                GlyphInfo { id: 65, x: 0, y: 0, width: 7, height: 9, xoffset: 0, yoffset: 2, xadvance: 8, page: 0 },
                GlyphInfo { id: 86, x: 9, y: 0, width: 7, height: 9, xoffset: -1, yoffset: 2, xadvance: 7, page: 1 },
            ],
            kernings: vec![Kerning { first: 65, second: 86, amount: -1 }],
        }
    }

    #[test]
    fn written_descriptor_reserializes_bit_exact() {
        let text = write(&sample());
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, sample());
        assert_eq!(write(&parsed), text);
    }

    #[test]
    fn page_lines_carry_relative_references() {
        let text = write(&sample());
        assert!(text.contains("page id=0 file=\"small/page_0.png\"\n"));
        assert!(text.contains("page id=1 file=\"small/page_1.png\"\n"));
        assert!(text.starts_with("info face=\"small\" size=12 "));
    }

    #[test]
    fn accepts_crlf_and_foreign_fields() {
        let text = "info face=\"Some Face\" size=20 bold=1 charset=\"ANSI\"\r\n\
                    common lineHeight=24 base=19 scaleW=256 scaleH=256 pages=1 packed=0\r\n\
                    page id=0 file=\"x.png\"\r\n\
                    chars count=1\r\n\
                    char id=33   x=1 y=2 width=3 height=4 xoffset=0 yoffset=0 xadvance=5 page=0 chnl=15\r\n";
        let data = parse(text).unwrap();
        assert_eq!(data.face, "Some Face");
        assert_eq!(data.line_height, 24);
        assert_eq!(data.glyph(33).unwrap().xadvance, 5);
    }

    #[test]
    fn reports_line_of_first_problem() {
        let mut text = write(&sample());
        text = text.replace("xadvance=8", "xadvance=eight");
        let err = parse(&text).unwrap_err();
        assert_eq!(err.line, 7, "{err}");

        let err = parse("").unwrap_err();
        assert!(err.message.contains("common"));

        let missing_page = write(&sample()).replace("page id=1 file=\"small/page_1.png\"\n", "");
        assert!(parse(&missing_page).is_err());

        let short = write(&sample()).replace("chars count=3", "chars count=4");
        assert!(parse(&short).is_err());
    }

    #[test]
    fn absurd_page_count_is_rejected_before_allocating() {
        let text = write(&sample()).replace("pages=2", "pages=4000000000");
        let err = parse(&text).unwrap_err();
        assert_eq!(err.line, 2, "{err}");
        assert!(err.message.contains("page limit"), "{err}");
    }
}
