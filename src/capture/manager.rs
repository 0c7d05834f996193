//! Camera lifecycle for one workflow instance.

use super::{CameraDevice, CaptureError, DeviceHandle, FacingMode};
use crate::source::CapturedImage;
use std::time::Duration;

/// Default upper bound for the permission prompt + stream start.
pub const DEFAULT_OPEN_TIMEOUT_SECS: u64 = 15;

/// Holds the camera device and, while the camera view is up, the live handle.
pub struct CaptureManager<C: CameraDevice> {
    device: C,
    active: Option<DeviceHandle<C::Stream>>,
    open_timeout: Duration,
}

impl<C: CameraDevice> CaptureManager<C> {
    pub fn new(device: C) -> Self {
        Self {
            device,
            active: None,
            open_timeout: Duration::from_secs(DEFAULT_OPEN_TIMEOUT_SECS),
        }
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    pub fn device(&self) -> &C {
        &self.device
    }

    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(DeviceHandle::is_live)
    }

    /// Ask for the environment-facing camera.
    ///
    /// On any failure nothing is held: a stream is only kept once it has
    /// been wrapped in a handle.
    pub async fn open(&mut self) -> Result<(), CaptureError> {
        if self.is_active() {
            return Err(CaptureError::Busy);
        }

        let start = std::time::Instant::now();
        let request = self.device.request_stream(FacingMode::Environment);
        let stream = match tokio::time::timeout(self.open_timeout, request).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                log::warn!("[CAMERA] Open failed: {}", e);
                return Err(e);
            }
            Err(_) => {
                log::warn!(
                    "[CAMERA] Open timed out after {}s",
                    self.open_timeout.as_secs()
                );
                return Err(CaptureError::Timeout(self.open_timeout.as_secs()));
            }
        };

        self.active = Some(DeviceHandle::new(stream));
        log::info!(
            "[CAMERA] Stream opened in {}ms",
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Capture the current frame. The device is released before this returns.
    pub fn capture(&mut self) -> Result<CapturedImage, CaptureError> {
        let handle = self.active.take().ok_or(CaptureError::NotOpen)?;
        handle.capture()
    }

    /// Stop the camera if it is running. Safe to call at any time.
    pub fn release(&mut self) {
        if let Some(mut handle) = self.active.take() {
            handle.release();
        }
    }
}

impl<C: CameraDevice> std::fmt::Debug for CaptureManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureManager")
            .field("active", &self.is_active())
            .field("open_timeout", &self.open_timeout)
            .finish()
    }
}
