//! Photobooth capture and composition engine.
//!
//! The crate runs a countdown-driven capture session against a camera
//! backend, records per-shot clips and a continuous session video, and then
//! renders the results: a deterministic print composition (layout + frame
//! color + theme stickers + caption) and an animated strip video that either
//! replays the clips inside their slots or fades the stills in sequentially.
//!
//! Media encoding and decoding go through ffmpeg subprocesses; machines
//! without ffmpeg or a supported codec degrade to photo-only operation
//! instead of failing.
//!
//! Typical flow:
//!
//! ```no_run
//! use snapstrip::prelude::*;
//!
//! # async fn demo() -> snapstrip::BoothResult<()> {
//! let camera = CameraController::new(Box::new(SyntheticCamera::default()));
//! let mut session = CaptureSession::new(camera, SessionConfig::default());
//! session.start_session().await?;
//!
//! let state = session.state();
//! let layout = layout(LayoutId::OneByFourStrip);
//! let options = CompositionOptions::default();
//! let canvas = render_composition(&state.photos, layout, &options)?;
//! export_canvas(&canvas, std::path::Path::new("out"))?;
//!
//! if let Some(video) = generate_frame_video(&state.photos, layout, &options, &state.clips)? {
//!     export_blob(&video, ArtifactKind::Video, std::path::Path::new("out"))?;
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod camera;
pub mod canvas;
pub mod color;
pub mod compose;
pub mod countdown;
pub mod ease;
pub mod error;
pub mod export;
pub mod filter;
pub mod framevideo;
pub mod geometry;
pub mod layout;
pub mod media;
pub mod recorder;
pub mod session;
pub mod theme;

pub use error::{BoothError, BoothResult};

/// Common imports for building a booth on top of this crate.
pub mod prelude {
    pub use crate::camera::{
        CameraBackend, CameraController, CameraError, Facing, Photo, StreamRequest,
        SyntheticCamera, VideoStream,
    };
    pub use crate::canvas::FrameRgba;
    pub use crate::color::Color;
    pub use crate::compose::{CompositionOptions, render_composition};
    pub use crate::countdown::Countdown;
    pub use crate::error::{BoothError, BoothResult};
    pub use crate::export::{ArtifactKind, export_blob, export_canvas};
    pub use crate::filter::{FilterKind, FilterParams, apply_filter};
    pub use crate::framevideo::generate_frame_video;
    pub use crate::layout::{
        BoothMode, LayoutConfig, LayoutId, all_layouts, layout, layouts_for_mode,
    };
    pub use crate::recorder::{ClipRecorder, MediaBlob, VideoCodec};
    pub use crate::session::{
        CaptureSession, LiveSettings, SessionConfig, SessionHandle, SessionPhase, SessionState,
    };
    pub use crate::theme::{Theme, ThemeAsset, ThemeAssets, theme, themes};
}
