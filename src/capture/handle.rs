//! Scoped ownership of a live camera stream.

use super::{CaptureError, MediaStream};
use crate::source::CapturedImage;

/// Exclusive owner of an open camera stream.
///
/// Releasing is idempotent and also happens on drop, so a handle can never
/// outlive its owner with the camera still running.
pub struct DeviceHandle<S: MediaStream> {
    stream: Option<S>,
}

impl<S: MediaStream> DeviceHandle<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }

    /// Stop the stream. No-op on an already released handle.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            log::info!("[CAMERA] Stream stopped");
        }
    }

    /// Grab the current frame as a JPEG image and release the device.
    ///
    /// The handle is consumed and released before this returns, whether or
    /// not the frame could be read.
    pub fn capture(mut self) -> Result<CapturedImage, CaptureError> {
        let frame = match self.stream.as_mut() {
            Some(stream) => stream.read_frame(),
            None => Err(CaptureError::NotOpen),
        };
        self.release();
        Ok(CapturedImage::from_capture(&frame?)?)
    }
}

impl<S: MediaStream> Drop for DeviceHandle<S> {
    fn drop(&mut self) {
        if self.stream.is_some() {
            log::debug!("[CAMERA] Handle dropped while live, releasing");
            self.release();
        }
    }
}

impl<S: MediaStream> std::fmt::Debug for DeviceHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::solid_frame;
    use crate::source::Frame;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingStream {
        stops: Rc<Cell<u32>>,
        fail_read: bool,
    }

    impl MediaStream for CountingStream {
        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            if self.fail_read {
                return Err(CaptureError::Frame("sensor glitch".to_string()));
            }
            Ok(solid_frame(8, 8))
        }

        fn stop(&mut self) {
            self.stops.set(self.stops.get() + 1);
        }
    }

    fn handle(fail_read: bool) -> (DeviceHandle<CountingStream>, Rc<Cell<u32>>) {
        let stops = Rc::new(Cell::new(0));
        let stream = CountingStream {
            stops: stops.clone(),
            fail_read,
        };
        (DeviceHandle::new(stream), stops)
    }

    #[test]
    fn release_is_idempotent() {
        let (mut h, stops) = handle(false);
        h.release();
        h.release();
        assert!(!h.is_live());
        drop(h);
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn capture_releases_on_success() {
        let (h, stops) = handle(false);
        let image = h.capture().unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn capture_releases_on_failed_read() {
        let (h, stops) = handle(true);
        assert!(matches!(h.capture(), Err(CaptureError::Frame(_))));
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn drop_releases() {
        let (h, stops) = handle(false);
        drop(h);
        assert_eq!(stops.get(), 1);
    }
}
