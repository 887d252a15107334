//! Decorative theme registry.
//!
//! A theme contributes a frame-color palette and a set of sticker overlays
//! placed on the composed canvas. Sticker artwork is embedded SVG so output
//! never depends on files present at runtime.

use std::sync::OnceLock;

use anyhow::Context as _;

use crate::canvas::FrameRgba;
use crate::error::{BoothError, BoothResult};

/// One sticker placement in canvas coordinates.
#[derive(Clone, Copy, Debug)]
pub struct ThemeAsset {
    pub svg: &'static str,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_deg: f64,
}

/// Sticker placements are either fixed coordinates (tuned for the classic
/// strip sizes) or computed from the actual canvas dimensions.
#[derive(Clone)]
pub enum ThemeAssets {
    Fixed(Vec<ThemeAsset>),
    Generated(fn(f64, f64) -> Vec<ThemeAsset>),
}

impl ThemeAssets {
    pub fn resolve(&self, canvas_width: f64, canvas_height: f64) -> Vec<ThemeAsset> {
        match self {
            Self::Fixed(v) => v.clone(),
            Self::Generated(f) => f(canvas_width, canvas_height),
        }
    }
}

#[derive(Clone)]
pub struct Theme {
    pub name: &'static str,
    pub label: &'static str,
    /// Suggested frame colors, first entry is the default.
    pub palette: &'static [&'static str],
    pub assets: ThemeAssets,
}

impl std::fmt::Debug for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Theme")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

const STAR_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
  <path d="M12 1 L14.8 8.6 L23 9.2 L16.8 14.4 L18.9 22.5 L12 18 L5.1 22.5 L7.2 14.4 L1 9.2 L9.2 8.6 Z" fill="#ffd93d" stroke="#e8a800" stroke-width="0.6"/>
</svg>"##;

const BUTTERFLY_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
  <g fill="#a8d8ea" stroke="#5b9bd5" stroke-width="0.5">
    <ellipse cx="8" cy="8" rx="6" ry="5" transform="rotate(-20 8 8)"/>
    <ellipse cx="16" cy="8" rx="6" ry="5" transform="rotate(20 16 8)"/>
    <ellipse cx="8.5" cy="16" rx="4.5" ry="4" transform="rotate(15 8.5 16)"/>
    <ellipse cx="15.5" cy="16" rx="4.5" ry="4" transform="rotate(-15 15.5 16)"/>
  </g>
  <rect x="11.2" y="5" width="1.6" height="14" rx="0.8" fill="#444"/>
</svg>"##;

const BOW_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
  <g fill="#f8b4c8" stroke="#d4809f" stroke-width="0.6">
    <path d="M12 12 C6 6, 2 7, 3 12 C2 17, 6 18, 12 12 Z"/>
    <path d="M12 12 C18 6, 22 7, 21 12 C22 17, 18 18, 12 12 Z"/>
    <circle cx="12" cy="12" r="2.2"/>
  </g>
</svg>"##;

const SPRIG_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
  <path d="M12 22 C12 14, 12 8, 12 2" stroke="#7aa874" stroke-width="1.4" fill="none"/>
  <g fill="#c8e6c9" stroke="#7aa874" stroke-width="0.5">
    <ellipse cx="8" cy="7" rx="3.4" ry="1.8" transform="rotate(-35 8 7)"/>
    <ellipse cx="16" cy="7" rx="3.4" ry="1.8" transform="rotate(35 16 7)"/>
    <ellipse cx="7.5" cy="13" rx="3.8" ry="2" transform="rotate(-30 7.5 13)"/>
    <ellipse cx="16.5" cy="13" rx="3.8" ry="2" transform="rotate(30 16.5 13)"/>
  </g>
</svg>"##;

fn cottagecore_assets(w: f64, h: f64) -> Vec<ThemeAsset> {
    // One sprig near each corner, leaning inward, scaled with the canvas.
    let size = (w.min(h) * 0.12).clamp(32.0, 72.0);
    let inset = size * 0.35;
    vec![
        ThemeAsset {
            svg: SPRIG_SVG,
            x: inset,
            y: inset,
            width: size,
            height: size,
            rotation_deg: -30.0,
        },
        ThemeAsset {
            svg: SPRIG_SVG,
            x: w - inset - size,
            y: inset,
            width: size,
            height: size,
            rotation_deg: 30.0,
        },
        ThemeAsset {
            svg: SPRIG_SVG,
            x: inset,
            y: h - inset - size,
            width: size,
            height: size,
            rotation_deg: -150.0,
        },
        ThemeAsset {
            svg: SPRIG_SVG,
            x: w - inset - size,
            y: h - inset - size,
            width: size,
            height: size,
            rotation_deg: 150.0,
        },
    ]
}

fn build_themes() -> Vec<Theme> {
    vec![
        Theme {
            name: "minimalist",
            label: "Minimalist",
            palette: &["#ffffff", "#000000"],
            assets: ThemeAssets::Fixed(Vec::new()),
        },
        Theme {
            name: "y2k",
            label: "Y2K",
            palette: &["#a8d8ea", "#ffd93d", "#e1bee7"],
            assets: ThemeAssets::Fixed(vec![
                ThemeAsset {
                    svg: STAR_SVG,
                    x: 12.0,
                    y: 12.0,
                    width: 48.0,
                    height: 48.0,
                    rotation_deg: -15.0,
                },
                ThemeAsset {
                    svg: STAR_SVG,
                    x: 330.0,
                    y: 60.0,
                    width: 36.0,
                    height: 36.0,
                    rotation_deg: 20.0,
                },
                ThemeAsset {
                    svg: BUTTERFLY_SVG,
                    x: 20.0,
                    y: 300.0,
                    width: 56.0,
                    height: 56.0,
                    rotation_deg: 10.0,
                },
            ]),
        },
        Theme {
            name: "coquette",
            label: "Coquette",
            palette: &["#f8b4c8", "#ffffff"],
            assets: ThemeAssets::Fixed(vec![
                ThemeAsset {
                    svg: BOW_SVG,
                    x: 16.0,
                    y: 10.0,
                    width: 52.0,
                    height: 52.0,
                    rotation_deg: -12.0,
                },
                ThemeAsset {
                    svg: BOW_SVG,
                    x: 326.0,
                    y: 280.0,
                    width: 44.0,
                    height: 44.0,
                    rotation_deg: 18.0,
                },
            ]),
        },
        Theme {
            name: "cottagecore",
            label: "Cottagecore",
            palette: &["#c8e6c9", "#ffe0b2"],
            assets: ThemeAssets::Generated(cottagecore_assets),
        },
    ]
}

/// All registered themes.
pub fn themes() -> &'static [Theme] {
    static THEMES: OnceLock<Vec<Theme>> = OnceLock::new();
    THEMES.get_or_init(build_themes)
}

/// Look up a theme by its stable name.
pub fn theme(name: &str) -> Option<&'static Theme> {
    themes().iter().find(|t| t.name == name)
}

/// Rasterize a sticker at its placement size.
///
/// Returns straight-alpha RGBA; the pixmap's premultiplied channels are
/// unpremultiplied before handing the buffer to the canvas blender.
pub fn rasterize_asset(asset: &ThemeAsset) -> BoothResult<FrameRgba> {
    let w = asset.width.round().max(1.0) as u32;
    let h = asset.height.round().max(1.0) as u32;

    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(asset.svg, &opt).context("sticker svg parse failed")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| BoothError::validation("sticker raster size is zero"))?;
    let sx = w as f32 / tree.size().width();
    let sy = h as f32 / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    let mut frame = FrameRgba::new(w, h);
    for (dst, px) in frame.data.chunks_exact_mut(4).zip(pixmap.pixels()) {
        let c = px.demultiply();
        dst[0] = c.red();
        dst[1] = c.green();
        dst[2] = c.blue();
        dst[3] = c.alpha();
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_expected_names() {
        let names: Vec<_> = themes().iter().map(|t| t.name).collect();
        assert_eq!(names, ["minimalist", "y2k", "coquette", "cottagecore"]);
        assert!(theme("y2k").is_some());
        assert!(theme("nope").is_none());
    }

    #[test]
    fn minimalist_has_no_stickers() {
        let t = theme("minimalist").unwrap();
        assert!(t.assets.resolve(400.0, 1260.0).is_empty());
    }

    #[test]
    fn generated_assets_scale_with_canvas() {
        let t = theme("cottagecore").unwrap();
        let small = t.assets.resolve(400.0, 1260.0);
        let large = t.assets.resolve(1160.0, 510.0);
        assert_eq!(small.len(), 4);
        assert_eq!(large.len(), 4);
        assert!(large[0].width > small[0].width);
        // All placements stay inside the canvas.
        for a in small.iter().chain(large.iter()) {
            assert!(a.x >= 0.0 && a.y >= 0.0);
        }
    }

    #[test]
    fn stickers_rasterize_with_transparency() {
        for t in themes() {
            for asset in t.assets.resolve(400.0, 1260.0) {
                let img = rasterize_asset(&asset).unwrap();
                assert_eq!(img.width, asset.width.round() as u32);
                let any_opaque = img.data.chunks_exact(4).any(|p| p[3] > 0);
                let any_clear = img.data.chunks_exact(4).any(|p| p[3] == 0);
                assert!(any_opaque, "sticker in '{}' rendered empty", t.name);
                assert!(any_clear, "sticker in '{}' has no transparent area", t.name);
            }
        }
    }

    #[test]
    fn bad_svg_is_an_error() {
        let asset = ThemeAsset {
            svg: "<not-svg>",
            x: 0.0,
            y: 0.0,
            width: 24.0,
            height: 24.0,
            rotation_deg: 0.0,
        };
        assert!(rasterize_asset(&asset).is_err());
    }
}
