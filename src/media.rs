//! Probing and decoding of recorded clips via ffprobe/ffmpeg subprocesses.
//!
//! Decoded frames come back as raw RGBA over a pipe, the same wire format the
//! recorder feeds in, so replaying a clip is a pure byte-level round trip
//! through the codec.

use std::path::Path;
use std::process::Command;

use anyhow::Context as _;

use crate::canvas::FrameRgba;
use crate::error::{BoothError, BoothResult};
use crate::recorder::MediaBlob;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoSourceInfo {
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub duration_sec: f64,
}

impl VideoSourceInfo {
    pub fn fps(&self) -> f64 {
        f64::from(self.fps_num) / f64::from(self.fps_den.max(1))
    }
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    streams: Option<Vec<ProbeStream>>,
    format: Option<ProbeFormat>,
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (num, den) = s.split_once('/')?;
    let num: u32 = num.trim().parse().ok()?;
    let den: u32 = den.trim().parse().ok()?;
    if num == 0 || den == 0 {
        return None;
    }
    Some((num, den))
}

/// Probe a video file's first video stream.
pub fn probe_video(path: &Path) -> BoothResult<VideoSourceInfo> {
    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams", "-show_format"])
        .arg(path)
        .output()
        .context("run ffprobe")?;
    if !out.status.success() {
        return Err(BoothError::media(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    let probe: ProbeOut =
        serde_json::from_slice(&out.stdout).context("parse ffprobe output")?;

    let stream = probe
        .streams
        .unwrap_or_default()
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| BoothError::media("no video stream found"))?;

    let width = stream
        .width
        .ok_or_else(|| BoothError::media("video stream has no width"))?;
    let height = stream
        .height
        .ok_or_else(|| BoothError::media("video stream has no height"))?;

    let (fps_num, fps_den) = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_ff_ratio)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_ff_ratio))
        .unwrap_or((30, 1));

    let duration_sec = stream
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            probe
                .format
                .and_then(|f| f.duration)
                .and_then(|d| d.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
    })
}

/// Decode up to `frame_count` RGBA frames starting at `start_time_sec`.
/// Returns fewer frames when the stream ends early.
pub fn decode_video_frames_rgba8(
    path: &Path,
    info: &VideoSourceInfo,
    start_time_sec: f64,
    frame_count: usize,
) -> BoothResult<Vec<FrameRgba>> {
    if frame_count == 0 {
        return Ok(Vec::new());
    }
    let out = Command::new("ffmpeg")
        .args(["-v", "error"])
        .args(["-ss", &format!("{start_time_sec:.6}")])
        .arg("-i")
        .arg(path)
        .args(["-frames:v", &frame_count.to_string()])
        .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
        .output()
        .context("run ffmpeg decoder")?;
    if !out.status.success() {
        return Err(BoothError::media(format!(
            "ffmpeg decode failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frame_bytes = (info.width as usize) * (info.height as usize) * 4;
    if frame_bytes == 0 || out.stdout.len() % frame_bytes != 0 {
        return Err(BoothError::media(format!(
            "decoded byte count {} is not a multiple of frame size {frame_bytes}",
            out.stdout.len()
        )));
    }

    Ok(out
        .stdout
        .chunks_exact(frame_bytes)
        .map(|chunk| FrameRgba {
            width: info.width,
            height: info.height,
            data: chunk.to_vec(),
        })
        .collect())
}

/// A recorded clip spilled to disk for decoding.
pub struct ClipSource {
    pub info: VideoSourceInfo,
    file: tempfile::NamedTempFile,
}

impl ClipSource {
    /// Write the blob to a temp file and probe it.
    pub fn from_blob(blob: &MediaBlob) -> BoothResult<ClipSource> {
        let mut file = tempfile::Builder::new()
            .prefix("booth-replay-")
            .suffix(&format!(".{}", blob.extension()))
            .tempfile()
            .context("create temp clip file")?;
        std::io::Write::write_all(&mut file, &blob.bytes).context("write clip to disk")?;
        let info = probe_video(file.path())?;
        Ok(ClipSource { info, file })
    }

    pub fn decode_frames(&self, start_time_sec: f64, frame_count: usize) -> BoothResult<Vec<FrameRgba>> {
        decode_video_frames_rgba8(self.file.path(), &self.info, start_time_sec, frame_count)
    }
}
