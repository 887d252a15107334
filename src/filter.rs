//! Photo filters as structured numeric parameters.
//!
//! Each filter is a fixed recipe of color-matrix stages (grayscale, sepia,
//! saturate, hue-rotate), brightness/contrast adjustments, and an optional
//! gaussian blur. The same recipe is applied to live preview frames, captured
//! stills, and replayed video frames, so all three stay visually consistent.

use crate::canvas::FrameRgba;
use crate::layout::BoothMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    None,
    Bw,
    Smoothing,
    Brighter,
    Warm,
    Cool,
    Vintage,
    Vivid,
    Sepia,
    Faded,
    Retro,
    Noir,
    Rose,
}

/// Numeric filter recipe. `Default` is the identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    /// `[0, 1]` mix toward luminance gray.
    pub grayscale: f32,
    /// `[0, 1]` mix toward the sepia matrix.
    pub sepia: f32,
    /// Gaussian blur radius in pixels; `0` skips the pass.
    pub blur_radius_px: f32,
    /// Linear channel multiplier; `1` is neutral.
    pub brightness: f32,
    /// Pivot-at-0.5 contrast factor; `1` is neutral.
    pub contrast: f32,
    /// Saturation factor; `1` is neutral, `0` is grayscale.
    pub saturation: f32,
    /// Hue rotation in degrees.
    pub hue_rotate_deg: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            grayscale: 0.0,
            sepia: 0.0,
            blur_radius_px: 0.0,
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            hue_rotate_deg: 0.0,
        }
    }
}

impl FilterKind {
    pub const ALL: [FilterKind; 13] = [
        Self::None,
        Self::Bw,
        Self::Smoothing,
        Self::Brighter,
        Self::Warm,
        Self::Cool,
        Self::Vintage,
        Self::Vivid,
        Self::Sepia,
        Self::Faded,
        Self::Retro,
        Self::Noir,
        Self::Rose,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bw => "B&W",
            Self::Smoothing => "Smooth",
            Self::Brighter => "Bright",
            Self::Warm => "Warm",
            Self::Cool => "Cool",
            Self::Vintage => "Vintage",
            Self::Vivid => "Vivid",
            Self::Sepia => "Sepia",
            Self::Faded => "Faded",
            Self::Retro => "Retro",
            Self::Noir => "Noir",
            Self::Rose => "Rose",
        }
    }

    pub fn params(self) -> FilterParams {
        let id = FilterParams::default();
        match self {
            Self::None => id,
            Self::Bw => FilterParams {
                grayscale: 1.0,
                ..id
            },
            Self::Smoothing => FilterParams {
                blur_radius_px: 0.5,
                brightness: 1.05,
                contrast: 0.97,
                ..id
            },
            Self::Brighter => FilterParams {
                brightness: 1.3,
                ..id
            },
            Self::Warm => FilterParams {
                sepia: 0.3,
                saturation: 1.2,
                brightness: 1.05,
                ..id
            },
            Self::Cool => FilterParams {
                brightness: 1.05,
                saturation: 1.1,
                hue_rotate_deg: 15.0,
                ..id
            },
            Self::Vintage => FilterParams {
                sepia: 0.2,
                contrast: 0.9,
                brightness: 1.1,
                saturation: 0.85,
                ..id
            },
            Self::Vivid => FilterParams {
                saturation: 1.5,
                contrast: 1.15,
                ..id
            },
            Self::Sepia => FilterParams {
                sepia: 0.6,
                brightness: 1.05,
                contrast: 1.05,
                ..id
            },
            Self::Faded => FilterParams {
                brightness: 1.1,
                contrast: 0.8,
                saturation: 0.7,
                ..id
            },
            Self::Retro => FilterParams {
                sepia: 0.4,
                saturation: 0.8,
                contrast: 1.1,
                brightness: 0.95,
                ..id
            },
            Self::Noir => FilterParams {
                grayscale: 1.0,
                contrast: 1.4,
                brightness: 0.9,
                ..id
            },
            Self::Rose => FilterParams {
                sepia: 0.15,
                saturation: 1.2,
                hue_rotate_deg: -10.0,
                brightness: 1.05,
                ..id
            },
        }
    }

    /// Filters offered by each UI mode, in display order.
    pub fn for_mode(mode: BoothMode) -> &'static [FilterKind] {
        match mode {
            BoothMode::Digital => &[
                Self::None,
                Self::Bw,
                Self::Smoothing,
                Self::Brighter,
                Self::Warm,
                Self::Cool,
                Self::Vintage,
                Self::Vivid,
            ],
            BoothMode::Vintage => &[
                Self::None,
                Self::Bw,
                Self::Warm,
                Self::Vintage,
                Self::Sepia,
                Self::Faded,
                Self::Retro,
                Self::Noir,
                Self::Rose,
            ],
        }
    }
}

// Luminance weights and the sepia/hue matrices follow the SVG/CSS
// filter-effects definitions the recipe values were tuned for.
const LUM_R: f32 = 0.2126;
const LUM_G: f32 = 0.7152;
const LUM_B: f32 = 0.0722;

type Mat3 = [[f32; 3]; 3];

const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

fn mat_mul(a: Mat3, b: Mat3) -> Mat3 {
    let mut out = [[0.0f32; 3]; 3];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, v) in row.iter_mut().enumerate() {
            *v = a[r][0] * b[0][c] + a[r][1] * b[1][c] + a[r][2] * b[2][c];
        }
    }
    out
}

fn mix(a: Mat3, b: Mat3, t: f32) -> Mat3 {
    let mut out = [[0.0f32; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            out[r][c] = a[r][c] * (1.0 - t) + b[r][c] * t;
        }
    }
    out
}

fn grayscale_matrix(amount: f32) -> Mat3 {
    let g = [
        [LUM_R, LUM_G, LUM_B],
        [LUM_R, LUM_G, LUM_B],
        [LUM_R, LUM_G, LUM_B],
    ];
    mix(IDENTITY, g, amount.clamp(0.0, 1.0))
}

fn sepia_matrix(amount: f32) -> Mat3 {
    let s = [
        [0.393, 0.769, 0.189],
        [0.349, 0.686, 0.168],
        [0.272, 0.534, 0.131],
    ];
    mix(IDENTITY, s, amount.clamp(0.0, 1.0))
}

fn saturate_matrix(s: f32) -> Mat3 {
    [
        [
            LUM_R + (1.0 - LUM_R) * s,
            LUM_G * (1.0 - s),
            LUM_B * (1.0 - s),
        ],
        [
            LUM_R * (1.0 - s),
            LUM_G + (1.0 - LUM_G) * s,
            LUM_B * (1.0 - s),
        ],
        [
            LUM_R * (1.0 - s),
            LUM_G * (1.0 - s),
            LUM_B + (1.0 - LUM_B) * s,
        ],
    ]
}

fn hue_rotate_matrix(deg: f32) -> Mat3 {
    let (sin, cos) = deg.to_radians().sin_cos();
    [
        [
            LUM_R + cos * (1.0 - LUM_R) + sin * (-LUM_R),
            LUM_G + cos * (-LUM_G) + sin * (-LUM_G),
            LUM_B + cos * (-LUM_B) + sin * (1.0 - LUM_B),
        ],
        [
            LUM_R + cos * (-LUM_R) + sin * 0.143,
            LUM_G + cos * (1.0 - LUM_G) + sin * 0.140,
            LUM_B + cos * (-LUM_B) + sin * (-0.283),
        ],
        [
            LUM_R + cos * (-LUM_R) + sin * (-(1.0 - LUM_R)),
            LUM_G + cos * (-LUM_G) + sin * LUM_G,
            LUM_B + cos * (1.0 - LUM_B) + sin * LUM_B,
        ],
    ]
}

/// Apply `params` to a frame in place.
///
/// Stage order is fixed: color matrices first, then
/// brightness, contrast, and finally blur. Alpha is untouched.
pub fn apply_filter(params: &FilterParams, frame: &mut FrameRgba) {
    let is_identity = *params == FilterParams::default();
    if is_identity {
        return;
    }

    let mut m = IDENTITY;
    if params.grayscale > 0.0 {
        m = mat_mul(grayscale_matrix(params.grayscale), m);
    }
    if params.sepia > 0.0 {
        m = mat_mul(sepia_matrix(params.sepia), m);
    }
    if params.saturation != 1.0 {
        m = mat_mul(saturate_matrix(params.saturation), m);
    }
    if params.hue_rotate_deg != 0.0 {
        m = mat_mul(hue_rotate_matrix(params.hue_rotate_deg), m);
    }

    let brightness = params.brightness;
    let contrast = params.contrast;
    for px in frame.data.chunks_exact_mut(4) {
        let r = f32::from(px[0]) / 255.0;
        let g = f32::from(px[1]) / 255.0;
        let b = f32::from(px[2]) / 255.0;
        let mut out = [
            m[0][0] * r + m[0][1] * g + m[0][2] * b,
            m[1][0] * r + m[1][1] * g + m[1][2] * b,
            m[2][0] * r + m[2][1] * g + m[2][2] * b,
        ];
        for v in &mut out {
            *v *= brightness;
            *v = (*v - 0.5) * contrast + 0.5;
        }
        px[0] = (out[0].clamp(0.0, 1.0) * 255.0).round() as u8;
        px[1] = (out[1].clamp(0.0, 1.0) * 255.0).round() as u8;
        px[2] = (out[2].clamp(0.0, 1.0) * 255.0).round() as u8;
    }

    if params.blur_radius_px > 0.0 {
        gaussian_blur(frame, params.blur_radius_px);
    }
}

/// Separable gaussian blur with sigma equal to the radius. Edge pixels are
/// handled by clamping the sample coordinate.
fn gaussian_blur(frame: &mut FrameRgba, radius: f32) {
    let sigma = radius.max(0.01);
    let taps = (sigma * 3.0).ceil() as i64;
    let mut kernel = Vec::with_capacity((2 * taps + 1) as usize);
    let mut sum = 0.0f32;
    for i in -taps..=taps {
        let x = i as f32;
        let w = (-x * x / (2.0 * sigma * sigma)).exp();
        kernel.push(w);
        sum += w;
    }
    for w in &mut kernel {
        *w /= sum;
    }

    let (w, h) = (frame.width as i64, frame.height as i64);
    let src = frame.data.clone();
    let mut tmp = vec![0u8; src.len()];

    // Horizontal pass.
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (k, weight) in kernel.iter().enumerate() {
                let sx = (x + k as i64 - taps).clamp(0, w - 1);
                let si = ((y * w + sx) * 4) as usize;
                for c in 0..4 {
                    acc[c] += f32::from(src[si + c]) * weight;
                }
            }
            let di = ((y * w + x) * 4) as usize;
            for c in 0..4 {
                tmp[di + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    // Vertical pass.
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (k, weight) in kernel.iter().enumerate() {
                let sy = (y + k as i64 - taps).clamp(0, h - 1);
                let si = ((sy * w + x) * 4) as usize;
                for c in 0..4 {
                    acc[c] += f32::from(tmp[si + c]) * weight;
                }
            }
            let di = ((y * w + x) * 4) as usize;
            for c in 0..4 {
                frame.data[di + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn gradient_frame() -> FrameRgba {
        let mut f = FrameRgba::new(16, 16);
        for y in 0..16u32 {
            for x in 0..16u32 {
                let i = ((y * 16 + x) as usize) * 4;
                f.data[i] = (x * 16) as u8;
                f.data[i + 1] = (y * 16) as u8;
                f.data[i + 2] = ((x + y) * 8) as u8;
                f.data[i + 3] = 255;
            }
        }
        f
    }

    fn mean_luma(f: &FrameRgba) -> f64 {
        let mut sum = 0.0;
        for px in f.data.chunks_exact(4) {
            sum += 0.2126 * f64::from(px[0]) + 0.7152 * f64::from(px[1]) + 0.0722 * f64::from(px[2]);
        }
        sum / (f.data.len() as f64 / 4.0)
    }

    #[test]
    fn none_is_identity() {
        let mut f = gradient_frame();
        let orig = f.clone();
        apply_filter(&FilterKind::None.params(), &mut f);
        assert_eq!(f, orig);
    }

    #[test]
    fn grayscale_filters_desaturate_completely() {
        for kind in [FilterKind::Bw, FilterKind::Noir] {
            let mut f = gradient_frame();
            apply_filter(&kind.params(), &mut f);
            for px in f.data.chunks_exact(4) {
                let spread = px[..3].iter().max().unwrap() - px[..3].iter().min().unwrap();
                assert!(spread <= 1, "{kind:?} left color in pixel {px:?}");
            }
        }
    }

    #[test]
    fn brighter_raises_mean_luma() {
        let mut f = gradient_frame();
        let before = mean_luma(&f);
        apply_filter(&FilterKind::Brighter.params(), &mut f);
        assert!(mean_luma(&f) > before * 1.1);
    }

    #[test]
    fn warm_shifts_red_over_blue() {
        let mut f = FrameRgba::with_fill(
            8,
            8,
            Color {
                r: 128,
                g: 128,
                b: 128,
            },
        );
        apply_filter(&FilterKind::Warm.params(), &mut f);
        let px = &f.data[0..4];
        assert!(px[0] > px[2], "expected warm cast, got {px:?}");
    }

    #[test]
    fn alpha_is_preserved() {
        let mut f = gradient_frame();
        f.data[3] = 77;
        apply_filter(&FilterKind::Vivid.params(), &mut f);
        assert_eq!(f.data[3], 77);
    }

    #[test]
    fn blur_smooths_but_preserves_solid_fill() {
        let mut f = FrameRgba::with_fill(
            8,
            8,
            Color {
                r: 100,
                g: 150,
                b: 200,
            },
        );
        gaussian_blur(&mut f, 1.5);
        for px in f.data.chunks_exact(4) {
            assert!((i32::from(px[0]) - 100).abs() <= 1);
            assert!((i32::from(px[1]) - 150).abs() <= 1);
            assert!((i32::from(px[2]) - 200).abs() <= 1);
        }
    }

    #[test]
    fn every_mode_list_starts_with_none() {
        assert_eq!(FilterKind::for_mode(BoothMode::Digital)[0], FilterKind::None);
        assert_eq!(FilterKind::for_mode(BoothMode::Vintage)[0], FilterKind::None);
    }

    #[test]
    fn identity_filter_is_labeled_none() {
        assert_eq!(FilterKind::None.label(), "None");
        assert_eq!(FilterKind::Bw.label(), "B&W");
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FilterKind::Bw).unwrap(),
            "\"bw\""
        );
    }
}
