//! Camera capture domain: public API.
//!
//! This module owns the camera device for the workflow. External code talks
//! to a `CaptureManager`; platform backends plug in through `CameraDevice`
//! and `MediaStream`.
//!
//! The one hard rule: a live stream is always wrapped in a `DeviceHandle`,
//! and a `DeviceHandle` stops its stream on every exit path (capture,
//! explicit release, or drop).

mod handle;
mod manager;
mod still;

pub use handle::DeviceHandle;
pub use manager::CaptureManager;
pub use still::{StillCamera, StillStream};

use crate::source::{Frame, SourceError};
use thiserror::Error;

/// Which camera to ask for. Food photos use the rear (environment) camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    #[default]
    Environment,
    User,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("no camera available: {0}")]
    NotFound(String),
    #[error("camera did not respond within {0}s")]
    Timeout(u64),
    #[error("camera is already open")]
    Busy,
    #[error("camera is not open")]
    NotOpen,
    #[error("could not read a frame: {0}")]
    Frame(String),
    #[error(transparent)]
    Encode(#[from] SourceError),
}

/// A live video stream from a camera.
///
/// Implementors must also stop their tracks on `Drop`. A stream can be
/// dropped without `stop` when `CaptureManager::open` times out after the
/// device produced it but before it was wrapped in a `DeviceHandle`.
pub trait MediaStream {
    /// Render the current frame to a pixel buffer.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Stop every track of the stream. `DeviceHandle` calls this exactly once.
    fn stop(&mut self);
}

/// A camera that can be asked for a stream (the permission prompt lives
/// behind `request_stream` on platforms that have one).
#[allow(async_fn_in_trait)]
pub trait CameraDevice {
    type Stream: MediaStream;

    async fn request_stream(&mut self, facing: FacingMode) -> Result<Self::Stream, CaptureError>;
}
