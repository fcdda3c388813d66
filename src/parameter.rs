//! Rasterization parameters and their catalog record form.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::color::Color;
use crate::error::{FontCacheError, Result};

/// Everything the rasterizer needs besides the font itself.
///
/// Equality is field-wise; `border_width` compares bit patterns, so values
/// only match when they round trip through [`encode`]/[`decode`] unchanged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontParameter {
    /// Nominal pixel height.
    pub size: u32,
    /// Outline thickness in pixels.
    pub border_width: f32,
    pub border_color: Color,
    pub color: Color,
    /// Extra vertical spacing added to the line height.
    pub space_y: i32,
}

impl Default for FontParameter {
    fn default() -> Self {
        Self {
            size: 16,
            border_width: 0.0,
            border_color: Color::BLACK,
            color: Color::WHITE,
            space_y: 0,
        }
    }
}

impl PartialEq for FontParameter {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
            && self.border_width.to_bits() == other.border_width.to_bits()
            && self.border_color == other.border_color
            && self.color == other.color
            && self.space_y == other.space_y
    }
}

impl Eq for FontParameter {}

impl FontParameter {
    pub fn with_size(size: u32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Rejects values no rasterizer can honor.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(FontCacheError::ConfigInvalid(
                "font size must be positive".to_string(),
            ));
        }
        if !self.border_width.is_finite() || self.border_width < 0.0 {
            return Err(FontCacheError::ConfigInvalid(format!(
                "border width must be a non-negative number, got {}",
                self.border_width
            )));
        }
        Ok(())
    }
}

/// Writes `{size, borderWidth, borderColor, color, spaceY}`.
pub fn encode(parameter: &FontParameter) -> Value {
    json!({
        "size": parameter.size,
        "borderWidth": parameter.border_width,
        "borderColor": parameter.border_color.to_string(),
        "color": parameter.color.to_string(),
        "spaceY": parameter.space_y,
    })
}

/// Inverse of [`encode`]. Unknown fields are ignored so catalog entries may
/// carry extra bookkeeping next to the parameter fields.
pub fn decode(record: &Value) -> Result<FontParameter> {
    if !record.is_object() {
        return Err(FontCacheError::MalformedParameter(format!(
            "expected an object, found {record}"
        )));
    }
    let parameter = FontParameter::deserialize(record)
        .map_err(|e| FontCacheError::MalformedParameter(e.to_string()))?;
    if parameter.size == 0 {
        return Err(FontCacheError::MalformedParameter(
            "size must be positive".to_string(),
        ));
    }
    if !parameter.border_width.is_finite() || parameter.border_width < 0.0 {
        return Err(FontCacheError::MalformedParameter(format!(
            "borderWidth {} out of range",
            parameter.border_width
        )));
    }
    Ok(parameter)
}

#[inline(always)]
pub fn equals(p1: &FontParameter, p2: &FontParameter) -> bool {
    p1 == p2
}

#[cfg(test)]
mod tests {
    use super::{FontParameter, decode, encode, equals};
    use crate::color::Color;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn sample() -> FontParameter {
        FontParameter {
            size: 12,
            border_width: 0.0,
            border_color: Color::CLEAR,
            color: Color::WHITE,
            space_y: 0,
        }
    }

    #[test]
    fn encodes_recognized_fields() {
        let v = encode(&sample());
        assert_eq!(
            v,
            json!({
                "size": 12,
                "borderWidth": 0.0,
                "borderColor": "00000000",
                "color": "ffffffff",
                "spaceY": 0,
            })
        );
    }

    #[test]
    fn codec_preserves_awkward_border_widths() {
        for bw in [0.1f32, 0.3, 1.0 / 3.0, 2.75, 1e-7, 123.456] {
            let p = FontParameter {
                border_width: bw,
                space_y: -3,
                ..sample()
            };
            let text = serde_json::to_string(&encode(&p)).unwrap();
            let back = decode(&serde_json::from_str(&text).unwrap()).unwrap();
            assert!(equals(&p, &back), "borderWidth {bw} drifted to {}", back.border_width);
        }
    }

    #[test]
    fn decode_accepts_upper_case_colors_and_extra_fields() {
        let v = json!({
            "size": 14,
            "borderWidth": 1.5,
            "borderColor": "FF000080",
            "color": "FFFFFFFF",
            "spaceY": 2,
            "sourceHash": "00000000deadbeef",
        });
        let p = decode(&v).unwrap();
        assert_eq!(p.size, 14);
        assert_eq!(p.border_color, Color::rgba(0xFF, 0, 0, 0x80));
        assert_eq!(p.space_y, 2);
    }

    #[test]
    fn decode_rejects_missing_or_ill_typed_fields() {
        let cases = [
            json!({"size": 12, "borderWidth": 0, "borderColor": "00000000", "color": "ffffffff"}),
            json!({"size": "12", "borderWidth": 0, "borderColor": "00000000", "color": "ffffffff", "spaceY": 0}),
            json!({"size": 12, "borderWidth": 0, "borderColor": "red", "color": "ffffffff", "spaceY": 0}),
            json!({"size": 0, "borderWidth": 0, "borderColor": "00000000", "color": "ffffffff", "spaceY": 0}),
            json!({"size": 12, "borderWidth": -1, "borderColor": "00000000", "color": "ffffffff", "spaceY": 0}),
            json!("size=12"),
        ];
        for v in cases {
            let err = decode(&v).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedParameter, "{v}");
        }
    }

    #[test]
    fn any_field_difference_breaks_equality() {
        let base = sample();
        let variants = [
            FontParameter { size: 14, ..base },
            FontParameter { border_width: 0.5, ..base },
            FontParameter { border_color: Color::BLACK, ..base },
            FontParameter { color: Color::BLACK, ..base },
            FontParameter { space_y: 1, ..base },
        ];
        for v in variants {
            assert!(!equals(&base, &v), "{v:?} should differ from {base:?}");
        }
        assert!(equals(&base, &sample()));
    }

    #[test]
    fn validate_flags_zero_size() {
        let p = FontParameter::with_size(0);
        assert_eq!(p.validate().unwrap_err().kind(), ErrorKind::ConfigInvalid);
        assert!(FontParameter::with_size(1).validate().is_ok());
    }
}
