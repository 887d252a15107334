//! Writing session artifacts to disk with timestamped filenames.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::canvas::FrameRgba;
use crate::error::BoothResult;
use crate::recorder::MediaBlob;

pub const JPEG_EXPORT_QUALITY: u8 = 92;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    Photo,
    Video,
    Clip,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Clip => "clip",
        }
    }
}

/// `photobooth-<kind>-<unix millis>.<ext>`; unique per millisecond, sorts
/// chronologically.
pub fn artifact_filename(kind: ArtifactKind, extension: &str) -> String {
    let ts = chrono::Utc::now().timestamp_millis();
    format!("photobooth-{}-{ts}.{extension}", kind.as_str())
}

/// Write a blob into `dir`, creating the directory if needed.
/// A partially written file is removed on failure.
pub fn export_blob(blob: &MediaBlob, kind: ArtifactKind, dir: &Path) -> BoothResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create export directory {}", dir.display()))?;
    let path = dir.join(artifact_filename(kind, blob.extension()));
    if let Err(e) = std::fs::write(&path, &blob.bytes) {
        let _ = std::fs::remove_file(&path);
        return Err(anyhow::Error::new(e)
            .context(format!("write {}", path.display()))
            .into());
    }
    tracing::info!(path = %path.display(), bytes = blob.bytes.len(), "exported artifact");
    Ok(path)
}

/// Encode a composed canvas as JPEG and write it into `dir`.
pub fn export_canvas(canvas: &FrameRgba, dir: &Path) -> BoothResult<PathBuf> {
    let blob = MediaBlob {
        mime: "image/jpeg".to_string(),
        bytes: canvas.encode_jpeg(JPEG_EXPORT_QUALITY)?,
    };
    export_blob(&blob, ArtifactKind::Photo, dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn filename_shape() {
        let name = artifact_filename(ArtifactKind::Video, "webm");
        assert!(name.starts_with("photobooth-video-"));
        assert!(name.ends_with(".webm"));
        let ts: i64 = name
            .trim_start_matches("photobooth-video-")
            .trim_end_matches(".webm")
            .parse()
            .unwrap();
        assert!(ts > 1_700_000_000_000);
    }

    #[test]
    fn blob_export_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("strips");
        let blob = MediaBlob {
            mime: "video/webm".into(),
            bytes: vec![1, 2, 3, 4],
        };
        let path = export_blob(&blob, ArtifactKind::Clip, &nested).unwrap();
        assert!(path.starts_with(&nested));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3, 4]);
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("photobooth-clip-"));
    }

    #[test]
    fn canvas_export_is_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = FrameRgba::with_fill(32, 24, Color { r: 12, g: 200, b: 99 });
        let path = export_canvas(&canvas, dir.path()).unwrap();
        assert_eq!(path.extension().unwrap(), "jpg");
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xff, 0xd8]);
    }
}
