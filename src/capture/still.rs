//! File-backed camera: serves one still image as its video feed.
//!
//! Used on headless hosts and in tests. Counts live streams so callers can
//! check that every opened stream was stopped.

use super::{CameraDevice, CaptureError, FacingMode, MediaStream};
use crate::source::Frame;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct StillCamera {
    frame: Option<Frame>,
    denial: Option<String>,
    live: Arc<AtomicUsize>,
}

impl StillCamera {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame: Some(frame),
            denial: None,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Load the feed image from disk.
    pub fn from_path(path: &Path) -> Result<Self, CaptureError> {
        let decoded = image::open(path)
            .map_err(|e| CaptureError::NotFound(format!("{}: {}", path.display(), e)))?;
        let frame = Frame::new(decoded.to_rgb8())
            .ok_or_else(|| CaptureError::NotFound(format!("{} is empty", path.display())))?;
        Ok(Self::new(frame))
    }

    /// A camera whose permission request is always denied.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            frame: None,
            denial: Some(reason.to_string()),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of streams opened and not yet stopped.
    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Shared live-stream counter, readable after the camera has moved.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.live.clone()
    }
}

impl CameraDevice for StillCamera {
    type Stream = StillStream;

    async fn request_stream(&mut self, facing: FacingMode) -> Result<StillStream, CaptureError> {
        if let Some(reason) = &self.denial {
            return Err(CaptureError::PermissionDenied(reason.clone()));
        }
        let frame = self
            .frame
            .clone()
            .ok_or_else(|| CaptureError::NotFound("no still image loaded".to_string()))?;
        log::debug!("[CAMERA] Still feed opened ({:?})", facing);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(StillStream {
            frame,
            live: self.live.clone(),
            stopped: false,
        })
    }
}

pub struct StillStream {
    frame: Frame,
    live: Arc<AtomicUsize>,
    stopped: bool,
}

impl MediaStream for StillStream {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        if self.stopped {
            return Err(CaptureError::Frame("stream already stopped".to_string()));
        }
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for StillStream {
    fn drop(&mut self) {
        self.stop();
    }
}
