//! Deterministic composition renderer.
//!
//! Turns captured photos plus a layout, frame color, and optional theme into
//! the final print canvas. The same inputs always produce the same bytes;
//! cosmetic failures (a photo that fails to decode, a sticker that fails to
//! rasterize) are skipped with a warning rather than failing the whole
//! composition.

use std::sync::OnceLock;

use anyhow::Context as _;
use image::imageops::FilterType;

use crate::camera::Photo;
use crate::canvas::FrameRgba;
use crate::color::Color;
use crate::error::BoothResult;
use crate::layout::{CAPTION_TEXT, LOGO_AREA_HEIGHT, LayoutConfig};
use crate::theme::{Theme, rasterize_asset};

#[derive(Clone, Debug, Default)]
pub struct CompositionOptions {
    /// Background color. `None` means white.
    pub frame_color: Option<Color>,
    pub theme: Option<Theme>,
}

impl CompositionOptions {
    pub fn frame_color(&self) -> Color {
        self.frame_color.unwrap_or(Color::WHITE)
    }
}

/// Render the final canvas.
///
/// Photos map to slots by index; extra photos are ignored and missing ones
/// leave their slot showing the frame color. Vintage layouts skip the
/// caption.
pub fn render_composition(
    photos: &[Photo],
    layout: &LayoutConfig,
    options: &CompositionOptions,
) -> BoothResult<FrameRgba> {
    layout.validate()?;
    let mut canvas = FrameRgba::with_fill(
        layout.canvas_width,
        layout.canvas_height,
        options.frame_color(),
    );
    draw_photos(&mut canvas, photos, layout);
    let overlay = render_overlay(layout, options)?;
    canvas.blend_over(&overlay, 0, 0);
    Ok(canvas)
}

/// Draw decoded photos into their slots with cover-fit.
pub(crate) fn draw_photos(canvas: &mut FrameRgba, photos: &[Photo], layout: &LayoutConfig) {
    for (i, slot) in layout.slots.iter().enumerate().take(photos.len()) {
        match photos[i].decode() {
            Ok(img) => canvas.draw_image_cover(&img, slot.rect(), FilterType::Lanczos3),
            Err(e) => tracing::warn!(slot = i, error = %e, "skipping undecodable photo"),
        }
    }
}

/// Transparent layer holding everything that sits above the photos: theme
/// stickers and the caption. Rendered once and reused per animation frame by
/// the video generator.
pub(crate) fn render_overlay(
    layout: &LayoutConfig,
    options: &CompositionOptions,
) -> BoothResult<FrameRgba> {
    let mut overlay = FrameRgba::new(layout.canvas_width, layout.canvas_height);

    if let Some(theme) = &options.theme {
        let assets = theme.assets.resolve(
            f64::from(layout.canvas_width),
            f64::from(layout.canvas_height),
        );
        for asset in &assets {
            match rasterize_asset(asset) {
                Ok(img) => {
                    let rect = kurbo::Rect::new(
                        asset.x,
                        asset.y,
                        asset.x + asset.width,
                        asset.y + asset.height,
                    );
                    overlay.draw_rotated(&img, rect, asset.rotation_deg);
                }
                Err(e) => {
                    tracing::warn!(theme = theme.name, error = %e, "skipping sticker")
                }
            }
        }
    }

    if !layout.is_vintage() && system_fonts_available() {
        match render_caption(layout.canvas_width, options.frame_color()) {
            Ok(caption) => {
                let y = i64::from(layout.canvas_height) - i64::from(LOGO_AREA_HEIGHT);
                overlay.blend_over(&caption, 0, y);
            }
            Err(e) => tracing::warn!(error = %e, "skipping caption"),
        }
    }

    Ok(overlay)
}

/// Whether any system font is available for the caption. Probed once.
pub fn system_fonts_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        db.faces().next().is_some()
    })
}

/// Rasterize the caption band: subtle branding text centered in a strip of
/// [`LOGO_AREA_HEIGHT`] pixels. Dark translucent text on light frames, light
/// translucent text on dark frames.
fn render_caption(width: u32, frame_color: Color) -> BoothResult<FrameRgba> {
    let (fill, opacity) = if frame_color.is_light() {
        ("#000000", 0.25)
    } else {
        ("#ffffff", 0.35)
    };
    let h = LOGO_AREA_HEIGHT;
    let svg = format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{cx}" y="{cy}" dy="0.35em" text-anchor="middle" "#,
            r#"font-family="sans-serif" font-weight="600" font-size="20" "#,
            r#"fill="{fill}" fill-opacity="{opacity}">{text}</text></svg>"#
        ),
        w = width,
        h = h,
        cx = width / 2,
        cy = h / 2,
        fill = fill,
        opacity = opacity,
        text = CAPTION_TEXT,
    );

    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(&svg, &opt).context("caption svg parse failed")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, h)
        .context("caption pixmap allocation failed")?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    let mut frame = FrameRgba::new(width, h);
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
    use crate::layout::{LayoutId, layout};

    fn solid_photo(w: u32, h: u32, color: Color) -> Photo {
        let jpeg = FrameRgba::with_fill(w, h, color).encode_jpeg(92).unwrap();
        Photo::from_jpeg(jpeg)
    }

    fn px(f: &FrameRgba, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * f.width + x) as usize) * 4;
        [f.data[i], f.data[i + 1], f.data[i + 2], f.data[i + 3]]
    }

    #[test]
    fn canvas_matches_layout_dimensions() {
        let l = layout(LayoutId::OneByFourStrip);
        let out = render_composition(&[], l, &CompositionOptions::default()).unwrap();
        assert_eq!((out.width, out.height), (400, 1260));
    }

    #[test]
    fn photos_land_in_their_slots() {
        let l = layout(LayoutId::OneByFourStrip);
        let photos: Vec<_> = (0..4)
            .map(|i| solid_photo(352, 270, Color { r: 50 * i as u8, g: 100, b: 200 }))
            .collect();
        let out = render_composition(&photos, l, &CompositionOptions::default()).unwrap();
        for (i, slot) in l.slots.iter().enumerate() {
            let cx = (slot.x + slot.width / 2.0) as u32;
            let cy = (slot.y + slot.height / 2.0) as u32;
            let p = px(&out, cx, cy);
            assert!(
                (i32::from(p[0]) - 50 * i as i32).abs() < 12,
                "slot {i} center {p:?}"
            );
        }
        // Padding area keeps the frame color.
        assert_eq!(px(&out, 5, 5), [255, 255, 255, 255]);
    }

    #[test]
    fn missing_photos_leave_frame_color() {
        let l = layout(LayoutId::OneByFourStrip);
        let photos = vec![solid_photo(352, 270, Color::BLACK)];
        let opts = CompositionOptions {
            frame_color: Some(Color { r: 248, g: 180, b: 200 }),
            theme: None,
        };
        let out = render_composition(&photos, l, &opts).unwrap();
        let s1 = &l.slots[1];
        let p = px(&out, (s1.x + 10.0) as u32, (s1.y + 10.0) as u32);
        assert_eq!(p, [248, 180, 200, 255]);
    }

    #[test]
    fn extra_photos_are_ignored() {
        let l = layout(LayoutId::Single);
        let photos: Vec<_> = (0..3).map(|_| solid_photo(100, 140, Color::BLACK)).collect();
        let out = render_composition(&photos, l, &CompositionOptions::default()).unwrap();
        assert_eq!((out.width, out.height), (600, 860));
    }

    #[test]
    fn undecodable_photo_is_skipped_not_fatal() {
        let l = layout(LayoutId::Single);
        let photos = vec![Photo::from_jpeg(vec![0xde, 0xad, 0xbe, 0xef])];
        let out = render_composition(&photos, l, &CompositionOptions::default()).unwrap();
        // Slot shows frame color.
        let s = &l.slots[0];
        let p = px(&out, (s.x + 10.0) as u32, (s.y + 10.0) as u32);
        assert_eq!(p, [255, 255, 255, 255]);
    }

    #[test]
    fn same_inputs_same_bytes() {
        let l = layout(LayoutId::TwoByTwoHorizontal);
        let photos: Vec<_> = (0..4)
            .map(|i| solid_photo(365, 260, Color { r: 10, g: 20 * i as u8, b: 30 }))
            .collect();
        let opts = CompositionOptions {
            frame_color: Some(Color::BLACK),
            theme: crate::theme::theme("y2k").cloned(),
        };
        let a = render_composition(&photos, l, &opts).unwrap();
        let b = render_composition(&photos, l, &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn caption_marks_digital_but_not_vintage() {
        if !system_fonts_available() {
            eprintln!("skipping: no system fonts");
            return;
        }
        let opts = CompositionOptions::default();

        let digital = layout(LayoutId::Single);
        let out = render_composition(&[], digital, &opts).unwrap();
        let band = out.crop(0, out.height - LOGO_AREA_HEIGHT, out.width, LOGO_AREA_HEIGHT);
        let darkened = band.data.chunks_exact(4).any(|p| p[0] < 250);
        assert!(darkened, "expected caption pixels in the bottom band");

        let vintage = layout(LayoutId::VintageStrip);
        let out = render_composition(&[], vintage, &opts).unwrap();
        assert!(
            out.data.chunks_exact(4).all(|p| p[0] == 255),
            "vintage canvas should have no caption"
        );
    }

    #[test]
    fn theme_stickers_appear_on_canvas() {
        let l = layout(LayoutId::OneByFourStrip);
        let opts = CompositionOptions {
            frame_color: Some(Color::WHITE),
            theme: crate::theme::theme("y2k").cloned(),
        };
        let out = render_composition(&[], l, &opts).unwrap();
        // The first star sits near (12, 12) with size 48; something there
        // must no longer be pure white.
        let region_touched = (12..60).any(|y| (12..60).any(|x| px(&out, x, y) != [255, 255, 255, 255]));
        assert!(region_touched, "expected sticker pixels near the top-left");
    }
}
