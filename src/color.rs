use crate::error::{BoothError, BoothResult};

/// Opaque sRGB color, as used for frame backgrounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    /// Parse a `#rrggbb` hex string. A missing leading `#` is tolerated.
    pub fn from_hex(hex: &str) -> BoothResult<Self> {
        let s = hex.trim().trim_start_matches('#');
        if s.len() != 6 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BoothError::validation(format!(
                "frame color must be a #rrggbb hex string, got '{hex}'"
            )));
        }
        let parse = |range: std::ops::Range<usize>| u8::from_str_radix(&s[range], 16);
        Ok(Self {
            r: parse(0..2).expect("checked hex digits"),
            g: parse(2..4).expect("checked hex digits"),
            b: parse(4..6).expect("checked hex digits"),
        })
    }

    /// Perceptual luminance in `[0, 1]` (`0.299R + 0.587G + 0.114B`).
    pub fn luminance(self) -> f64 {
        (0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b)) / 255.0
    }

    /// Whether overlaid text should be dark rather than light.
    ///
    /// The threshold is strictly greater than 0.5, so the mid gray `#808080`
    /// (luminance 128/255 ≈ 0.502) counts as light while `#7f7f7f` does not.
    pub fn is_light(self) -> bool {
        self.luminance() > 0.5
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Hex-string convenience used by UI layers that hold raw palette entries.
pub fn is_light_color(hex: &str) -> BoothResult<bool> {
    Ok(Color::from_hex(hex)?.is_light())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(Color::from_hex("#ffffff").unwrap(), Color::WHITE);
        assert_eq!(Color::from_hex("000000").unwrap(), Color::BLACK);
        assert_eq!(
            Color::from_hex("#f8b4c8").unwrap(),
            Color {
                r: 0xf8,
                g: 0xb4,
                b: 0xc8
            }
        );
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn light_dark_extremes() {
        assert!(is_light_color("#ffffff").unwrap());
        assert!(!is_light_color("#000000").unwrap());
    }

    #[test]
    fn mid_gray_boundary() {
        // 128/255 is just above the 0.5 threshold, 127/255 just below.
        assert!(is_light_color("#808080").unwrap());
        assert!(!is_light_color("#7f7f7f").unwrap());
    }
}
