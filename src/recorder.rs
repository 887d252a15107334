//! Clip recording over an ffmpeg subprocess.
//!
//! Raw RGBA frames are piped to ffmpeg's stdin and encoded into a temporary
//! container file; stopping the recorder reads the file back as an in-memory
//! blob. Every failure mode degrades silently to "no recording" so photo
//! capture keeps working on machines without a usable encoder.

use std::io::Write as _;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;

use anyhow::Context as _;

use crate::canvas::FrameRgba;
use crate::error::{BoothError, BoothResult};

/// An encoded media payload plus its MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaBlob {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl MediaBlob {
    pub fn extension(&self) -> &'static str {
        if self.mime.starts_with("video/mp4") {
            "mp4"
        } else if self.mime.starts_with("video/webm") {
            "webm"
        } else if self.mime.starts_with("image/jpeg") {
            "jpg"
        } else {
            "bin"
        }
    }
}

/// Recording codecs in preference order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoCodec {
    Vp9,
    Vp8,
    Webm,
    Mp4,
}

impl VideoCodec {
    pub const PREFERENCE: [VideoCodec; 4] = [Self::Vp9, Self::Vp8, Self::Webm, Self::Mp4];

    pub fn mime(self) -> &'static str {
        match self {
            Self::Vp9 => "video/webm;codecs=vp9",
            Self::Vp8 => "video/webm;codecs=vp8",
            Self::Webm => "video/webm",
            Self::Mp4 => "video/mp4",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            _ => "webm",
        }
    }

    fn encoder_name(self) -> &'static str {
        match self {
            Self::Vp9 => "libvpx-vp9",
            Self::Vp8 | Self::Webm => "libvpx",
            Self::Mp4 => "libx264",
        }
    }

    /// Encoder arguments tuned for realtime capture rather than quality.
    fn encoder_args(self) -> Vec<&'static str> {
        match self {
            Self::Vp9 => vec![
                "-c:v",
                "libvpx-vp9",
                "-deadline",
                "realtime",
                "-cpu-used",
                "8",
                "-b:v",
                "2M",
            ],
            Self::Vp8 | Self::Webm => vec![
                "-c:v",
                "libvpx",
                "-deadline",
                "realtime",
                "-cpu-used",
                "8",
                "-b:v",
                "2M",
            ],
            Self::Mp4 => vec![
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ],
        }
    }
}

/// Whether ffmpeg runs at all on this machine.
pub fn is_ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn query_codec() -> Option<VideoCodec> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-encoders"])
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let listing = String::from_utf8_lossy(&out.stdout);
    VideoCodec::PREFERENCE
        .into_iter()
        .find(|codec| listing.contains(codec.encoder_name()))
}

/// Best supported recording codec, probed once per process.
/// `None` means video recording is unavailable.
pub fn select_codec() -> Option<VideoCodec> {
    static CODEC: OnceLock<Option<VideoCodec>> = OnceLock::new();
    *CODEC.get_or_init(query_codec)
}

/// Records a stream of RGBA frames into a [`MediaBlob`].
pub struct ClipRecorder {
    child: Option<Child>,
    stdin: Option<std::process::ChildStdin>,
    file: tempfile::NamedTempFile,
    codec: VideoCodec,
    width: u32,
    height: u32,
    frames_pushed: u64,
}

impl ClipRecorder {
    /// Spawn a recorder, or `None` when recording is not possible here
    /// (no ffmpeg, no supported codec, odd dimensions, spawn failure).
    pub fn start(width: u32, height: u32, fps: u32) -> Option<ClipRecorder> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            tracing::warn!(width, height, "recording skipped: dimensions must be even");
            return None;
        }
        let codec = select_codec()?;
        Self::spawn(width, height, fps, codec)
            .map_err(|e| tracing::warn!(error = %e, "recording unavailable"))
            .ok()
    }

    fn spawn(width: u32, height: u32, fps: u32, codec: VideoCodec) -> BoothResult<ClipRecorder> {
        let file = tempfile::Builder::new()
            .prefix("booth-clip-")
            .suffix(&format!(".{}", codec.extension()))
            .tempfile()
            .context("create temp recording file")?;

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-s", &format!("{width}x{height}")])
            .args(["-r", &fps.to_string()])
            .args(["-i", "pipe:0", "-an"])
            .args(codec.encoder_args())
            .arg(file.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().context("spawn ffmpeg encoder")?;
        let stdin = child.stdin.take();
        Ok(ClipRecorder {
            child: Some(child),
            stdin,
            file,
            codec,
            width,
            height,
            frames_pushed: 0,
        })
    }

    pub fn mime(&self) -> &'static str {
        self.codec.mime()
    }

    /// Feed one frame. The frame must match the recorder's dimensions.
    pub fn push_frame(&mut self, frame: &FrameRgba) -> BoothResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(BoothError::media(format!(
                "frame is {}x{}, recorder expects {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(BoothError::media("recorder already stopped"));
        };
        stdin
            .write_all(&frame.data)
            .context("write frame to encoder")?;
        self.frames_pushed += 1;
        Ok(())
    }

    /// Finish encoding and return the blob. Returns `None` if no frames were
    /// pushed or the encoder failed; calling again after stop yields `None`.
    pub fn stop(&mut self) -> Option<MediaBlob> {
        drop(self.stdin.take()?);
        let child = self.child.take()?;

        // wait_with_output drains stderr to EOF; a plain wait() could
        // deadlock against a full stderr pipe on a chatty encoder.
        let out = match child.wait_with_output() {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(error = %e, "waiting for encoder failed");
                return None;
            }
        };
        if !out.status.success() || self.frames_pushed == 0 {
            if !out.status.success() {
                tracing::warn!(
                    status = %out.status,
                    stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                    "encoder exited with failure"
                );
            }
            return None;
        }
        match std::fs::read(self.file.path()) {
            Ok(bytes) if !bytes.is_empty() => Some(MediaBlob {
                mime: self.codec.mime().to_string(),
                bytes,
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "reading encoded clip failed");
                None
            }
        }
    }
}

impl Drop for ClipRecorder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
