//! Capture session orchestration.
//!
//! Runs the countdown/capture loop: per shot, a countdown with live preview,
//! an optional per-shot clip recording, the still capture, and a pause before
//! the next shot. A second recorder can span the whole session for a single
//! continuous behind-the-scenes video. State is published through watch
//! channels; a cloneable handle allows cancellation and live setting changes
//! while the session future runs.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::camera::{CameraController, Photo};
use crate::canvas::FrameRgba;
use crate::countdown::Countdown;
use crate::error::BoothResult;
use crate::filter::FilterKind;
use crate::layout::{COUNTDOWN_DURATION_SECS, PAUSE_BETWEEN_PHOTOS_MS};
use crate::recorder::{ClipRecorder, MediaBlob};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    /// Stills to capture.
    pub photo_count: usize,
    /// Record per-shot clips and the whole-session video.
    pub enable_video: bool,
    pub countdown_secs: u32,
    pub pause_between_ms: u64,
    /// Crop captured stills to this width/height ratio.
    pub target_aspect_ratio: Option<f64>,
    /// Frame rate for preview-driven recordings.
    pub clip_fps: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            photo_count: 4,
            enable_video: true,
            countdown_secs: COUNTDOWN_DURATION_SECS,
            pause_between_ms: PAUSE_BETWEEN_PHOTOS_MS,
            target_aspect_ratio: None,
            clip_fps: 30,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Countdown,
    Capturing,
    Review,
}

/// Settings the user may flip mid-session. Applied from the next preview
/// frame or capture onward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveSettings {
    pub mirrored: bool,
    pub filter: FilterKind,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            mirrored: true,
            filter: FilterKind::None,
        }
    }
}

/// Observable session snapshot.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub current_index: usize,
    pub photos: Vec<Photo>,
    pub clips: Vec<MediaBlob>,
    pub session_video: Option<MediaBlob>,
}

/// Cloneable remote control for a running session.
#[derive(Clone)]
pub struct SessionHandle {
    cancel: watch::Sender<bool>,
    settings: watch::Sender<LiveSettings>,
}

impl SessionHandle {
    /// Abort the session. The running future unwinds to `Idle`.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn set_mirrored(&self, mirrored: bool) {
        self.settings.send_modify(|s| s.mirrored = mirrored);
    }

    pub fn set_filter(&self, filter: FilterKind) {
        self.settings.send_modify(|s| s.filter = filter);
    }
}

pub struct CaptureSession {
    config: SessionConfig,
    camera: CameraController,
    countdown: Countdown,
    state: watch::Sender<SessionState>,
    settings: watch::Sender<LiveSettings>,
    cancel: watch::Sender<bool>,
}

impl CaptureSession {
    pub fn new(camera: CameraController, config: SessionConfig) -> Self {
        Self {
            config,
            camera,
            countdown: Countdown::new(),
            state: watch::Sender::new(SessionState::default()),
            settings: watch::Sender::new(LiveSettings::default()),
            cancel: watch::Sender::new(false),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn subscribe_countdown(&self) -> watch::Receiver<u32> {
        self.countdown.subscribe()
    }

    pub fn settings(&self) -> LiveSettings {
        *self.settings.borrow()
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            cancel: self.cancel.clone(),
            settings: self.settings.clone(),
        }
    }

    pub fn camera(&mut self) -> &mut CameraController {
        &mut self.camera
    }

    /// Run the full countdown/capture loop.
    ///
    /// Returns once the session reaches `Review`, is cancelled (back to
    /// `Idle`), or the camera fails to start (stays `Idle` with the error
    /// recorded on the camera controller).
    pub async fn start_session(&mut self) -> BoothResult<()> {
        self.cancel.send_replace(false);
        self.state.send_replace(SessionState::default());

        if !self.camera.start_camera() {
            return Ok(());
        }
        let Some(first) = self.camera.current_frame() else {
            tracing::warn!("camera produced no frame, aborting session");
            self.camera.stop_camera();
            return Ok(());
        };
        let (rec_w, rec_h) = (first.width, first.height);

        let mut session_rec = if self.config.enable_video {
            ClipRecorder::start(rec_w, rec_h, self.config.clip_fps)
        } else {
            None
        };

        for index in 0..self.config.photo_count {
            self.state.send_modify(|s| {
                s.phase = SessionPhase::Countdown;
                s.current_index = index;
            });

            let mut clip_rec = if self.config.enable_video {
                ClipRecorder::start(rec_w, rec_h, self.config.clip_fps)
            } else {
                None
            };

            let cancelled = drive_until(
                self.countdown.start(self.config.countdown_secs),
                &self.cancel,
                &mut self.camera,
                &self.settings,
                &mut session_rec,
                &mut clip_rec,
                self.config.clip_fps,
            )
            .await;
            if cancelled {
                drop(clip_rec);
                self.abort(session_rec);
                return Ok(());
            }

            if let Some(blob) = clip_rec.as_mut().and_then(ClipRecorder::stop) {
                self.state.send_modify(|s| s.clips.push(blob));
            }

            self.state.send_modify(|s| s.phase = SessionPhase::Capturing);
            let live = *self.settings.borrow();
            match self.camera.capture_photo(
                live.mirrored,
                live.filter,
                self.config.target_aspect_ratio,
            ) {
                Some(photo) => self.state.send_modify(|s| s.photos.push(photo)),
                None => tracing::warn!(index, "still capture produced no photo"),
            }

            // Keep the session recording rolling through the pause, but skip
            // the pause entirely after the final shot.
            if index + 1 < self.config.photo_count {
                let cancelled = drive_until(
                    tokio::time::sleep(Duration::from_millis(self.config.pause_between_ms)),
                    &self.cancel,
                    &mut self.camera,
                    &self.settings,
                    &mut session_rec,
                    &mut None,
                    self.config.clip_fps,
                )
                .await;
                if cancelled {
                    self.abort(session_rec);
                    return Ok(());
                }
            }
        }

        let video = session_rec.as_mut().and_then(ClipRecorder::stop);
        self.camera.stop_camera();
        self.state.send_modify(|s| {
            s.session_video = video;
            s.phase = SessionPhase::Review;
        });
        Ok(())
    }

    fn abort(&mut self, session_rec: Option<ClipRecorder>) {
        drop(session_rec);
        self.countdown.reset();
        self.camera.stop_camera();
        self.state.send_replace(SessionState::default());
        tracing::info!("session cancelled");
    }

    /// Discard everything and return to `Idle`, ready for a fresh run.
    pub fn retake_all(&mut self) {
        self.cancel.send_replace(false);
        self.countdown.reset();
        self.camera.stop_camera();
        self.state.send_replace(SessionState::default());
    }

    /// Capture one still immediately with the current live settings,
    /// outside the countdown loop. The camera must be started.
    pub fn capture_still(&mut self) -> Option<Photo> {
        let live = *self.settings.borrow();
        let photo = self.camera.capture_photo(
            live.mirrored,
            live.filter,
            self.config.target_aspect_ratio,
        )?;
        let clone = photo.clone();
        self.state.send_modify(|s| s.photos.push(clone));
        Some(photo)
    }
}

fn push_frame_quiet(rec: &mut Option<ClipRecorder>, frame: &FrameRgba) {
    if let Some(r) = rec.as_mut() {
        if let Err(e) = r.push_frame(frame) {
            tracing::warn!(error = %e, "dropping recorder after push failure");
            *rec = None;
        }
    }
}

/// Await `fut` while feeding preview frames to the recorders at the clip
/// frame rate. Returns `true` if cancellation won the race.
async fn drive_until<F>(
    fut: F,
    cancel: &watch::Sender<bool>,
    camera: &mut CameraController,
    settings: &watch::Sender<LiveSettings>,
    session_rec: &mut Option<ClipRecorder>,
    clip_rec: &mut Option<ClipRecorder>,
    fps: u32,
) -> bool
where
    F: Future<Output = ()>,
{
    let mut cancel_rx = cancel.subscribe();
    if *cancel_rx.borrow_and_update() {
        return true;
    }
    tokio::pin!(fut);

    let period = Duration::from_millis(1000 / u64::from(fps.max(1)));
    let mut redraw = tokio::time::interval(period);
    redraw.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut fut => return false,
            res = cancel_rx.wait_for(|c| *c) => {
                let _ = res;
                return true;
            }
            _ = redraw.tick() => {
                if session_rec.is_none() && clip_rec.is_none() {
                    continue;
                }
                let live = *settings.borrow();
                if let Some(frame) = camera.preview_frame(live.mirrored, live.filter) {
                    push_frame_quiet(session_rec, &frame);
                    push_frame_quiet(clip_rec, &frame);
                }
            }
        }
    }
}
