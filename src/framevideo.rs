//! Animated strip video.
//!
//! Renders the composed layout as a short video using one of two strategies:
//! replaying the per-shot clips inside their slots (ending in a white-flash
//! dissolve to the still), or a sequential fade-in of the stills when no
//! usable clips exist. Returns `Ok(None)` whenever video output is simply
//! unavailable on this machine, so callers degrade to photo-only export.

use image::imageops::FilterType;

use crate::camera::Photo;
use crate::canvas::FrameRgba;
use crate::compose::{CompositionOptions, render_composition, render_overlay};
use crate::ease::Ease;
use crate::error::{BoothError, BoothResult};
use crate::layout::LayoutConfig;
use crate::media::ClipSource;
use crate::recorder::{ClipRecorder, MediaBlob, select_codec};

pub const VIDEO_FPS: u32 = 30;

/// Total length of the white-flash dissolve into the still, covering both
/// the rise over the last live frame and the decay over the still.
const FLASH_MS: u64 = 150;
/// Still hold after the flash in the clip-replay strategy.
const HOLD_STILL_MS: u64 = 1500;
/// Clips whose durations differ by more than this get truncated with a
/// warning rather than silently.
const CLIP_SPREAD_WARN_SEC: f64 = 0.25;

/// Empty-canvas hold before the first photo fades in.
const HOLD_START_MS: u64 = 600;
/// Per-photo fade duration.
const PHOTO_FADE_MS: u64 = 500;
/// Gap between consecutive photo fades.
const PHOTO_GAP_MS: u64 = 400;
/// Final hold on the completed canvas.
const HOLD_END_MS: u64 = 1200;

fn ms_to_frames(ms: u64) -> usize {
    ((ms * u64::from(VIDEO_FPS)) / 1000) as usize
}

/// Rising and falling frame counts of the flash, together spanning
/// [`FLASH_MS`].
fn dissolve_frames() -> (usize, usize) {
    let total = ms_to_frames(FLASH_MS).max(2);
    let rise = total / 2;
    (rise, total - rise)
}

/// Generate the animated strip video.
///
/// Uses clip replay when a clip is available for every slot, otherwise the
/// fade-in animation. Clip decode problems fall back to fade-in; missing
/// encoder support yields `Ok(None)`.
pub fn generate_frame_video(
    photos: &[Photo],
    layout: &LayoutConfig,
    options: &CompositionOptions,
    clips: &[MediaBlob],
) -> BoothResult<Option<MediaBlob>> {
    layout.validate()?;
    if select_codec().is_none() {
        tracing::info!("no video encoder available, skipping frame video");
        return Ok(None);
    }

    let still = render_composition(photos, layout, options)?;
    let overlay = render_overlay(layout, options)?;

    let replay = if clips.len() >= layout.photo_count && layout.photo_count > 0 {
        match plan_clip_replay(layout, clips) {
            Ok(plan) => Some(plan),
            Err(e) => {
                tracing::warn!(error = %e, "clip replay unavailable, falling back to fade-in");
                None
            }
        }
    } else {
        None
    };

    let Some(mut rec) = ClipRecorder::start(layout.canvas_width, layout.canvas_height, VIDEO_FPS)
    else {
        return Ok(None);
    };

    match replay {
        Some(plan) => record_clip_replay(&mut rec, layout, options, &plan, &overlay, &still)?,
        None => record_fade_in(&mut rec, photos, layout, options, &overlay)?,
    }

    Ok(rec.stop())
}

/// Per-slot frames, already resized to slot dimensions.
struct ReplayPlan {
    per_slot: Vec<Vec<FrameRgba>>,
    output_frames: usize,
}

/// Decode every clip up front so a failure never leaves a half-recorded
/// video. Replay length is the shortest clip's duration.
fn plan_clip_replay(layout: &LayoutConfig, clips: &[MediaBlob]) -> BoothResult<ReplayPlan> {
    let sources: Vec<ClipSource> = clips[..layout.photo_count]
        .iter()
        .map(ClipSource::from_blob)
        .collect::<BoothResult<_>>()?;

    let durations: Vec<f64> = sources.iter().map(|s| s.info.duration_sec).collect();
    let common = durations.iter().copied().fold(f64::INFINITY, f64::min);
    if !common.is_finite() || common <= 0.0 {
        return Err(BoothError::media("clips have no usable duration"));
    }
    let spread = durations.iter().copied().fold(0.0, f64::max) - common;
    if spread > CLIP_SPREAD_WARN_SEC {
        tracing::warn!(
            spread_sec = spread,
            common_sec = common,
            "clip durations diverge, truncating replay to the shortest"
        );
    }

    let output_frames = ((common * f64::from(VIDEO_FPS)).floor() as usize).max(1);

    let mut per_slot = Vec::with_capacity(sources.len());
    for (source, slot) in sources.iter().zip(&layout.slots) {
        let slot_w = slot.width.round().max(1.0) as u32;
        let slot_h = slot.height.round().max(1.0) as u32;
        let src_fps = source.info.fps().max(1.0);
        let src_frames = ((common * src_fps).floor() as usize).max(1);

        // Chunked decode keeps per-call pipe buffers bounded.
        let mut decoded: Vec<FrameRgba> = Vec::with_capacity(src_frames);
        const CHUNK: usize = 30;
        while decoded.len() < src_frames {
            let want = CHUNK.min(src_frames - decoded.len());
            let start = decoded.len() as f64 / src_fps;
            let chunk = source.decode_frames(start, want)?;
            if chunk.is_empty() {
                break;
            }
            for frame in chunk {
                let mut sized = FrameRgba::new(slot_w, slot_h);
                sized.draw_image_cover(
                    &frame,
                    kurbo::Rect::new(0.0, 0.0, f64::from(slot_w), f64::from(slot_h)),
                    FilterType::Triangle,
                );
                decoded.push(sized);
            }
        }
        if decoded.is_empty() {
            return Err(BoothError::media("clip decoded to zero frames"));
        }

        // Remap source timing onto the output frame rate.
        let frames = (0..output_frames)
            .map(|j| {
                let t = j as f64 / f64::from(VIDEO_FPS);
                let idx = ((t * src_fps).round() as usize).min(decoded.len() - 1);
                decoded[idx].clone()
            })
            .collect();
        per_slot.push(frames);
    }

    Ok(ReplayPlan {
        per_slot,
        output_frames,
    })
}

fn record_clip_replay(
    rec: &mut ClipRecorder,
    layout: &LayoutConfig,
    options: &CompositionOptions,
    plan: &ReplayPlan,
    overlay: &FrameRgba,
    still: &FrameRgba,
) -> BoothResult<()> {
    let bg = options.frame_color();
    let mut last_live = still.clone();

    for j in 0..plan.output_frames {
        let mut canvas =
            FrameRgba::with_fill(layout.canvas_width, layout.canvas_height, bg);
        for (slot, frames) in layout.slots.iter().zip(&plan.per_slot) {
            canvas.blend_over(
                &frames[j],
                slot.x.round() as i64,
                slot.y.round() as i64,
            );
        }
        canvas.blend_over(overlay, 0, 0);
        if j + 1 == plan.output_frames {
            last_live = canvas.clone();
        }
        rec.push_frame(&canvas)?;
    }

    // White-flash dissolve: brighten over the last live frame, then reveal
    // the still as the flash decays.
    let (rise, fall) = dissolve_frames();
    for i in 0..rise {
        let a = Ease::Linear.apply((i + 1) as f64 / rise as f64) as f32;
        let mut frame = last_live.clone();
        frame.flash_white(a);
        rec.push_frame(&frame)?;
    }
    for i in 0..fall {
        let a = 1.0 - Ease::Linear.apply((i + 1) as f64 / fall as f64) as f32;
        let mut frame = still.clone();
        frame.flash_white(a);
        rec.push_frame(&frame)?;
    }

    for _ in 0..ms_to_frames(HOLD_STILL_MS) {
        rec.push_frame(still)?;
    }
    Ok(())
}

fn record_fade_in(
    rec: &mut ClipRecorder,
    photos: &[Photo],
    layout: &LayoutConfig,
    options: &CompositionOptions,
    overlay: &FrameRgba,
) -> BoothResult<()> {
    let bg = options.frame_color();
    let n = layout.photo_count.min(photos.len());

    // Pre-fit each photo to its slot; the animation only rescales slightly.
    let mut slot_images: Vec<Option<FrameRgba>> = Vec::with_capacity(n);
    for (photo, slot) in photos.iter().zip(&layout.slots).take(layout.photo_count) {
        match photo.decode() {
            Ok(img) => {
                let w = slot.width.round().max(1.0) as u32;
                let h = slot.height.round().max(1.0) as u32;
                let mut sized = FrameRgba::new(w, h);
                sized.draw_image_cover(
                    &img,
                    kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h)),
                    FilterType::Lanczos3,
                );
                slot_images.push(Some(sized));
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping undecodable photo in animation");
                slot_images.push(None);
            }
        }
    }

    let total_ms = HOLD_START_MS
        + (n as u64) * PHOTO_FADE_MS
        + (n as u64).saturating_sub(1) * PHOTO_GAP_MS
        + HOLD_END_MS;
    let total_frames = ms_to_frames(total_ms).max(1);

    for j in 0..total_frames {
        let t_ms = (j as u64) * 1000 / u64::from(VIDEO_FPS);
        let mut canvas =
            FrameRgba::with_fill(layout.canvas_width, layout.canvas_height, bg);
        for (i, slot) in layout.slots.iter().enumerate().take(slot_images.len()) {
            let Some(img) = &slot_images[i] else {
                continue;
            };
            let start = HOLD_START_MS + (i as u64) * (PHOTO_FADE_MS + PHOTO_GAP_MS);
            if t_ms < start {
                continue;
            }
            let raw = ((t_ms - start) as f64 / PHOTO_FADE_MS as f64).min(1.0);
            let p = Ease::OutCubic.apply(raw);
            let scale = 0.95 + 0.05 * p;
            canvas.draw_image_cover_faded(
                img,
                slot.rect(),
                p as f32,
                scale,
                FilterType::Triangle,
            );
        }
        canvas.blend_over(overlay, 0, 0);
        rec.push_frame(&canvas)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ms_to_frames_at_30fps() {
        assert_eq!(ms_to_frames(1000), 30);
        assert_eq!(ms_to_frames(150), 4);
        assert_eq!(ms_to_frames(500), 15);
        assert_eq!(ms_to_frames(0), 0);
    }

    #[test]
    fn dissolve_spans_the_flash_window() {
        let (rise, fall) = dissolve_frames();
        assert!(rise >= 1 && fall >= 1);
        // The whole dissolve fits in the 150ms flash budget.
        assert_eq!(rise + fall, ms_to_frames(FLASH_MS).max(2));
        assert!((rise + fall) as u64 * 1000 / u64::from(VIDEO_FPS) <= FLASH_MS);
    }

    #[test]
    fn fade_in_timeline_length() {
        // 4 photos: 600 + 4*500 + 3*400 + 1200 = 5000 ms.
        let n: u64 = 4;
        let total = HOLD_START_MS + n * PHOTO_FADE_MS + (n - 1) * PHOTO_GAP_MS + HOLD_END_MS;
        assert_eq!(total, 5000);
        assert_eq!(ms_to_frames(total), 150);
    }
}
