//! Camera acquisition and still capture.
//!
//! The controller never panics on hardware problems: failures are stored and
//! surfaced as user-facing messages, and the rest of the engine degrades to
//! whatever the camera can provide.

use crate::canvas::FrameRgba;
use crate::error::BoothResult;
use crate::filter::FilterKind;
use crate::filter::apply_filter;
use crate::geometry::calculate_cover_crop;

pub const JPEG_QUALITY: u8 = 92;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Front,
    Back,
}

/// Requested stream parameters. Backends treat the dimensions as ideals and
/// may deliver something else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamRequest {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: Facing,
}

impl Default for StreamRequest {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 960,
            facing: Facing::Front,
        }
    }
}

/// User-presentable camera failures.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera access denied. Please allow camera permissions.")]
    PermissionDenied,
    #[error("No camera found. Please connect a camera.")]
    NotFound,
    #[error("{0}")]
    Other(String),
}

/// A live video source delivering frames on demand.
pub trait VideoStream: Send {
    /// Latest frame, or `None` if the stream has no frame yet.
    fn current_frame(&mut self) -> Option<FrameRgba>;
    fn stop(&mut self);
}

/// Opens streams. Swapped out in tests for a synthetic source.
pub trait CameraBackend: Send {
    fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn VideoStream>, CameraError>;
}

/// A captured still, stored as encoded JPEG.
#[derive(Clone, Debug, PartialEq)]
pub struct Photo {
    jpeg: Vec<u8>,
}

impl Photo {
    pub fn from_jpeg(jpeg: Vec<u8>) -> Self {
        Self { jpeg }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn decode(&self) -> BoothResult<FrameRgba> {
        FrameRgba::decode_jpeg(&self.jpeg)
    }
}

/// Owns the stream lifecycle and the still-capture path.
pub struct CameraController {
    backend: Box<dyn CameraBackend>,
    request: StreamRequest,
    stream: Option<Box<dyn VideoStream>>,
    error: Option<CameraError>,
}

impl CameraController {
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        Self::with_request(backend, StreamRequest::default())
    }

    pub fn with_request(backend: Box<dyn CameraBackend>, request: StreamRequest) -> Self {
        Self {
            backend,
            request,
            stream: None,
            error: None,
        }
    }

    /// Open the stream. Returns whether the camera is ready; a failure is
    /// recorded in [`error`](Self::error) instead of propagating.
    /// Calling again while ready is a no-op.
    pub fn start_camera(&mut self) -> bool {
        if self.stream.is_some() {
            return true;
        }
        match self.backend.open(&self.request) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.error = None;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "camera open failed");
                self.error = Some(e);
                false
            }
        }
    }

    /// Stop and release the stream. Safe to call when already stopped.
    pub fn stop_camera(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }

    pub fn is_ready(&self) -> bool {
        self.stream.is_some()
    }

    pub fn error(&self) -> Option<&CameraError> {
        self.error.as_ref()
    }

    /// Latest raw frame from the stream, unmirrored and unfiltered.
    pub fn current_frame(&mut self) -> Option<FrameRgba> {
        self.stream.as_mut()?.current_frame()
    }

    /// Frame as shown in the viewfinder: filter applied, then mirrored.
    pub fn preview_frame(&mut self, mirrored: bool, filter: FilterKind) -> Option<FrameRgba> {
        let mut frame = self.current_frame()?;
        apply_filter(&filter.params(), &mut frame);
        if mirrored {
            frame.mirror_horizontal();
        }
        Some(frame)
    }

    /// Capture a still: grab the current frame, apply the filter, mirror if
    /// requested, center-crop to `target_aspect` (width over height), and
    /// encode as JPEG. Returns `None` when no frame is available.
    pub fn capture_photo(
        &mut self,
        mirrored: bool,
        filter: FilterKind,
        target_aspect: Option<f64>,
    ) -> Option<Photo> {
        let mut frame = self.preview_frame(mirrored, filter)?;
        if let Some(aspect) = target_aspect {
            let crop = calculate_cover_crop(
                f64::from(frame.width),
                f64::from(frame.height),
                aspect,
                1.0,
            );
            frame = frame.crop(
                crop.sx.floor() as u32,
                crop.sy.floor() as u32,
                crop.sw.round().max(1.0) as u32,
                crop.sh.round().max(1.0) as u32,
            );
        }
        match frame.encode_jpeg(JPEG_QUALITY) {
            Ok(jpeg) => Some(Photo::from_jpeg(jpeg)),
            Err(e) => {
                tracing::warn!(error = %e, "still encode failed");
                None
            }
        }
    }
}

/// Deterministic frame source for tests and headless use. Produces a moving
/// gradient so consecutive frames differ.
pub struct SyntheticCamera {
    pub width: u32,
    pub height: u32,
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
        }
    }
}

struct SyntheticStream {
    width: u32,
    height: u32,
    tick: u32,
}

impl VideoStream for SyntheticStream {
    fn current_frame(&mut self) -> Option<FrameRgba> {
        let mut f = FrameRgba::new(self.width, self.height);
        let t = self.tick;
        self.tick = self.tick.wrapping_add(1);
        for y in 0..self.height {
            for x in 0..self.width {
                let i = ((y * self.width + x) as usize) * 4;
                f.data[i] = ((x + t) % 256) as u8;
                f.data[i + 1] = (y % 256) as u8;
                f.data[i + 2] = ((x / 2 + y / 2) % 256) as u8;
                f.data[i + 3] = 255;
            }
        }
        Some(f)
    }

    fn stop(&mut self) {}
}

impl CameraBackend for SyntheticCamera {
    fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn VideoStream>, CameraError> {
        let _ = request;
        Ok(Box::new(SyntheticStream {
            width: self.width,
            height: self.height,
            tick: 0,
        }))
    }
}

/// Backend that always fails with a fixed error. For error-path tests.
pub struct UnavailableCamera(pub CameraError);

impl CameraBackend for UnavailableCamera {
    fn open(&mut self, _request: &StreamRequest) -> Result<Box<dyn VideoStream>, CameraError> {
        Err(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_controller() -> CameraController {
        CameraController::new(Box::new(SyntheticCamera {
            width: 64,
            height: 48,
        }))
    }

    #[test]
    fn start_is_idempotent() {
        let mut cam = synthetic_controller();
        assert!(!cam.is_ready());
        assert!(cam.start_camera());
        assert!(cam.start_camera());
        assert!(cam.is_ready());
        assert!(cam.error().is_none());
    }

    #[test]
    fn stop_without_start_is_safe() {
        let mut cam = synthetic_controller();
        cam.stop_camera();
        cam.stop_camera();
        assert!(!cam.is_ready());
    }

    #[test]
    fn failure_is_recorded_not_thrown() {
        let mut cam = CameraController::new(Box::new(UnavailableCamera(CameraError::NotFound)));
        assert!(!cam.start_camera());
        assert_eq!(cam.error(), Some(&CameraError::NotFound));
        assert!(cam.current_frame().is_none());
        assert!(cam.capture_photo(true, FilterKind::None, None).is_none());
    }

    #[test]
    fn permission_error_message_is_user_facing() {
        assert_eq!(
            CameraError::PermissionDenied.to_string(),
            "Camera access denied. Please allow camera permissions."
        );
        assert_eq!(
            CameraError::NotFound.to_string(),
            "No camera found. Please connect a camera."
        );
    }

    #[test]
    fn capture_produces_jpeg() {
        let mut cam = synthetic_controller();
        cam.start_camera();
        let photo = cam.capture_photo(false, FilterKind::None, None).unwrap();
        assert_eq!(&photo.as_bytes()[..2], &[0xff, 0xd8]);
        let frame = photo.decode().unwrap();
        assert_eq!((frame.width, frame.height), (64, 48));
    }

    #[test]
    fn capture_crops_to_target_aspect() {
        let mut cam = synthetic_controller();
        cam.start_camera();
        let photo = cam.capture_photo(false, FilterKind::None, Some(1.0)).unwrap();
        let frame = photo.decode().unwrap();
        assert_eq!((frame.width, frame.height), (48, 48));
    }

    #[test]
    fn mirrored_capture_flips_content() {
        let mut cam = synthetic_controller();
        cam.start_camera();
        let plain = cam.capture_photo(false, FilterKind::None, None).unwrap();
        let mut cam2 = synthetic_controller();
        cam2.start_camera();
        let mirrored = cam2.capture_photo(true, FilterKind::None, None).unwrap();
        assert_ne!(plain, mirrored);
    }

    #[test]
    fn synthetic_frames_advance() {
        let mut cam = synthetic_controller();
        cam.start_camera();
        let a = cam.current_frame().unwrap();
        let b = cam.current_frame().unwrap();
        assert_ne!(a, b);
    }
}
