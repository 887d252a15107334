//! CPU raster surface used by the composition and frame-video renderers.
//!
//! Pixels are straight-alpha RGBA8 in row-major order. Blending is done in
//! integer math so identical inputs produce identical bytes on every run.

use anyhow::Context as _;
use image::RgbaImage;
use image::imageops::FilterType;

use crate::color::Color;
use crate::error::{BoothError, BoothResult};
use crate::geometry::calculate_cover_crop;

#[derive(Clone, Debug, PartialEq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, straight alpha.
    pub data: Vec<u8>,
}

#[inline]
fn mul_div255(x: u16, y: u16) -> u16 {
    ((x * y) + 127) / 255
}

impl FrameRgba {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn with_fill(width: u32, height: u32, color: Color) -> Self {
        let mut f = Self::new(width, height);
        f.fill(color);
        f
    }

    pub fn fill(&mut self, color: Color) {
        let px = color.to_rgba8();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    pub fn from_rgba_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }

    pub fn to_rgba_image(&self) -> BoothResult<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| BoothError::validation("frame buffer size mismatch"))
    }

    /// Encode as JPEG. Alpha is discarded; `quality` is the usual 1..=100.
    pub fn encode_jpeg(&self, quality: u8) -> BoothResult<Vec<u8>> {
        let rgb = image::DynamicImage::ImageRgba8(self.to_rgba_image()?).into_rgb8();
        let mut out = Vec::new();
        let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
        enc.encode_image(&rgb).context("jpeg encode failed")?;
        Ok(out)
    }

    pub fn decode_jpeg(bytes: &[u8]) -> BoothResult<Self> {
        let img = image::load_from_memory(bytes)
            .context("jpeg decode failed")?
            .into_rgba8();
        Ok(Self::from_rgba_image(img))
    }

    /// Flip left-to-right in place (selfie mirroring).
    pub fn mirror_horizontal(&mut self) {
        let w = self.width as usize;
        for row in self.data.chunks_exact_mut(w * 4) {
            let (mut a, mut b) = (0usize, w - 1);
            while a < b {
                for i in 0..4 {
                    row.swap(a * 4 + i, b * 4 + i);
                }
                a += 1;
                b -= 1;
            }
        }
    }

    /// Copy out a sub-rectangle. The rectangle is clamped to the frame.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Self {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let w = w.min(self.width - x).max(1);
        let h = h.min(self.height - y).max(1);
        let mut out = Self::new(w, h);
        for row in 0..h {
            let src_start = (((y + row) * self.width + x) as usize) * 4;
            let dst_start = ((row * w) as usize) * 4;
            let n = (w as usize) * 4;
            out.data[dst_start..dst_start + n]
                .copy_from_slice(&self.data[src_start..src_start + n]);
        }
        out
    }

    /// Source-over blend `src` at integer offset `(ox, oy)`, clipped to this
    /// frame's bounds.
    pub fn blend_over(&mut self, src: &FrameRgba, ox: i64, oy: i64) {
        for sy in 0..src.height as i64 {
            let dy = oy + sy;
            if dy < 0 || dy >= self.height as i64 {
                continue;
            }
            for sx in 0..src.width as i64 {
                let dx = ox + sx;
                if dx < 0 || dx >= self.width as i64 {
                    continue;
                }
                let si = ((sy as u64 * u64::from(src.width) + sx as u64) * 4) as usize;
                let di = ((dy as u64 * u64::from(self.width) + dx as u64) * 4) as usize;
                over_px(&mut self.data[di..di + 4], &src.data[si..si + 4]);
            }
        }
    }

    /// Draw `img` into `rect` with object-fit:cover semantics: center-crop the
    /// source to the rect's aspect ratio, then resize and copy.
    pub fn draw_image_cover(&mut self, img: &FrameRgba, rect: kurbo::Rect, filter: FilterType) {
        self.draw_image_cover_faded(img, rect, 1.0, 1.0, filter);
    }

    /// Cover-draw with an extra uniform `opacity` and a `scale` factor applied
    /// about the rect center. Used by the fade-in animation.
    pub fn draw_image_cover_faded(
        &mut self,
        img: &FrameRgba,
        rect: kurbo::Rect,
        opacity: f32,
        scale: f64,
        filter: FilterType,
    ) {
        if opacity <= 0.0 || rect.width() < 1.0 || rect.height() < 1.0 {
            return;
        }
        let dw = (rect.width() * scale).round().max(1.0) as u32;
        let dh = (rect.height() * scale).round().max(1.0) as u32;

        let crop = calculate_cover_crop(
            f64::from(img.width),
            f64::from(img.height),
            rect.width(),
            rect.height(),
        );
        let cropped = img.crop(
            crop.sx.floor() as u32,
            crop.sy.floor() as u32,
            crop.sw.round().max(1.0) as u32,
            crop.sh.round().max(1.0) as u32,
        );
        let resized = if cropped.width == dw && cropped.height == dh {
            cropped
        } else {
            let Ok(rgba) = cropped.to_rgba_image() else {
                return;
            };
            Self::from_rgba_image(image::imageops::resize(&rgba, dw, dh, filter))
        };

        let mut scaled = resized;
        if opacity < 1.0 {
            let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u16;
            for px in scaled.data.chunks_exact_mut(4) {
                px[3] = mul_div255(u16::from(px[3]), a) as u8;
            }
        }

        let cx = (rect.x0 + rect.x1) / 2.0;
        let cy = (rect.y0 + rect.y1) / 2.0;
        let ox = (cx - f64::from(dw) / 2.0).round() as i64;
        let oy = (cy - f64::from(dh) / 2.0).round() as i64;
        self.blend_over(&scaled, ox, oy);
    }

    /// Draw `img` stretched into `rect` and rotated by `rotation_deg` about
    /// the rect center. Inverse-maps destination pixels with nearest sampling,
    /// which is plenty for small decorative stickers.
    pub fn draw_rotated(&mut self, img: &FrameRgba, rect: kurbo::Rect, rotation_deg: f64) {
        if rect.width() < 1.0 || rect.height() < 1.0 {
            return;
        }
        let dw = rect.width().round().max(1.0) as u32;
        let dh = rect.height().round().max(1.0) as u32;
        let Ok(rgba) = img.to_rgba_image() else {
            return;
        };
        let src = if img.width == dw && img.height == dh {
            img.clone()
        } else {
            Self::from_rgba_image(image::imageops::resize(&rgba, dw, dh, FilterType::Triangle))
        };

        if rotation_deg == 0.0 {
            self.blend_over(&src, rect.x0.round() as i64, rect.y0.round() as i64);
            return;
        }

        let center = kurbo::Point::new((rect.x0 + rect.x1) / 2.0, (rect.y0 + rect.y1) / 2.0);
        let fwd = kurbo::Affine::rotate_about(rotation_deg.to_radians(), center);
        let inv = fwd.inverse();

        // Bounding box of the rotated rect, clipped to the canvas.
        let bbox = fwd.transform_rect_bbox(rect);
        let x0 = bbox.x0.floor().max(0.0) as u32;
        let y0 = bbox.y0.floor().max(0.0) as u32;
        let x1 = (bbox.x1.ceil() as u32).min(self.width);
        let y1 = (bbox.y1.ceil() as u32).min(self.height);

        for dy in y0..y1 {
            for dx in x0..x1 {
                let p = inv * kurbo::Point::new(f64::from(dx) + 0.5, f64::from(dy) + 0.5);
                let sx = (p.x - rect.x0).floor();
                let sy = (p.y - rect.y0).floor();
                if sx < 0.0 || sy < 0.0 || sx >= f64::from(dw) || sy >= f64::from(dh) {
                    continue;
                }
                let si = ((sy as u64 * u64::from(dw) + sx as u64) * 4) as usize;
                let di = ((u64::from(dy) * u64::from(self.width) + u64::from(dx)) * 4) as usize;
                over_px(&mut self.data[di..di + 4], &src.data[si..si + 4]);
            }
        }
    }

    /// Blend a uniform white layer over the whole frame. `alpha` in `[0, 1]`.
    pub fn flash_white(&mut self, alpha: f32) {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        if a == 0 {
            return;
        }
        let white = [255u8, 255, 255, a];
        for px in self.data.chunks_exact_mut(4) {
            over_px(px, &white);
        }
    }
}

/// Straight-alpha source-over for one pixel.
fn over_px(dst: &mut [u8], src: &[u8]) {
    let sa = u16::from(src[3]);
    if sa == 255 {
        dst.copy_from_slice(src);
        return;
    }
    if sa == 0 {
        return;
    }
    let inv = 255 - sa;
    for i in 0..3 {
        dst[i] = (mul_div255(u16::from(src[i]), sa) + mul_div255(u16::from(dst[i]), inv)) as u8;
    }
    dst[3] = (sa + mul_div255(u16::from(dst[3]), inv)) as u8;
}
