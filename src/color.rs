use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// RGBA color with 8-bit components.
///
/// Text form is `rrggbbaa` (lowercase on output). Parsing also accepts an
/// optional leading `#`, upper-case digits and the 6-digit `rrggbb` form
/// (alpha = `ff`). Components are bytes, so text round trips are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgba(0xFF, 0xFF, 0xFF, 0xFF);
    pub const BLACK: Self = Self::rgba(0x00, 0x00, 0x00, 0xFF);
    pub const CLEAR: Self = Self::rgba(0x00, 0x00, 0x00, 0x00);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline(always)]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Normalized components, as the renderer consumes them.
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color '{}': expected 6 or 8 hex digits", self.0)
    }
}

impl std::error::Error for ParseColorError {}

#[inline(always)]
const fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(10 + (b - b'a')),
        b'A'..=b'F' => Some(10 + (b - b'A')),
        _ => None,
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let digits = s.strip_prefix('#').unwrap_or(s).as_bytes();
        if digits.len() != 6 && digits.len() != 8 {
            return Err(err());
        }

        let mut out = [0xFFu8; 4];
        for (slot, pair) in out.iter_mut().zip(digits.chunks_exact(2)) {
            let hi = hex_val(pair[0]).ok_or_else(err)?;
            let lo = hex_val(pair[1]).ok_or_else(err)?;
            *slot = (hi << 4) | lo;
        }
        Ok(Self::rgba(out[0], out[1], out[2], out[3]))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::Color;

    #[test]
    fn parses_eight_and_six_digit_forms() {
        assert_eq!(
            "FFFFFFFF".parse::<Color>().unwrap(),
            Color::WHITE,
            "upper-case 8 digits"
        );
        assert_eq!("#00000000".parse::<Color>().unwrap(), Color::CLEAR);
        assert_eq!(
            "12ab3c".parse::<Color>().unwrap(),
            Color::rgba(0x12, 0xAB, 0x3C, 0xFF)
        );
    }

    #[test]
    fn rejects_bad_lengths_and_digits() {
        for bad in ["", "fff", "fffffff", "gg000000", "#1234567890"] {
            assert!(bad.parse::<Color>().is_err(), "'{bad}' should not parse");
        }
    }

    #[test]
    fn text_form_is_lowercase_rgba() {
        let c = Color::rgba(0xDE, 0xAD, 0xBE, 0xEF);
        assert_eq!(c.to_string(), "deadbeef");
        assert_eq!(c.to_string().parse::<Color>().unwrap(), c);
    }
}
