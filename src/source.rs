//! Image source resolution: camera frames and picked files become one type.
//!
//! Both acquisition paths end in a `CapturedImage`: encoded bytes, a mime
//! type, and where the image came from. Camera frames are JPEG-encoded here;
//! uploaded files are validated by decoding them once and then kept as-is,
//! so the backend receives exactly the bytes the user picked.

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use thiserror::Error;

/// JPEG quality for captured frames. Matches the browser default for
/// `canvas.toDataURL("image/jpeg")` (0.92).
pub const JPEG_QUALITY: u8 = 92;

/// Mime types that carry no information about the actual image format.
const GENERIC_MIME_TYPES: &[&str] = &["", "application/octet-stream", "binary/octet-stream"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("file is empty")]
    Empty,
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("image data is corrupt: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode frame: {0}")]
    Encode(image::ImageError),
}

/// Where a `CapturedImage` was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    Camera,
    Upload,
}

/// A single video frame as RGB pixels. Never zero-sized.
#[derive(Debug, Clone)]
pub struct Frame(RgbImage);

impl Frame {
    /// Wrap decoded pixels. Returns `None` for an empty (0×N or N×0) buffer.
    pub fn new(pixels: RgbImage) -> Option<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return None;
        }
        Some(Self(pixels))
    }

    /// Build a frame from tightly packed RGB8 bytes.
    pub fn from_raw(width: u32, height: u32, rgb: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, rgb).and_then(Self::new)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.0
    }
}

/// An encoded image waiting for (or having gone through) analysis.
///
/// Immutable once built. The workflow owns at most one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    bytes: Vec<u8>,
    mime_type: String,
    origin: ImageOrigin,
}

impl CapturedImage {
    /// Encode a camera frame as JPEG.
    ///
    /// Frames are validated on construction, so the error path only covers
    /// encoder failures that well-formed RGB input does not produce.
    pub fn from_capture(frame: &Frame) -> Result<Self, SourceError> {
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
            .encode_image(frame.pixels())
            .map_err(SourceError::Encode)?;
        log::info!(
            "[SOURCE] Frame {}x{} encoded to JPEG ({} bytes)",
            frame.width(),
            frame.height(),
            bytes.len()
        );
        Ok(Self {
            bytes,
            mime_type: ImageFormat::Jpeg.to_mime_type().to_string(),
            origin: ImageOrigin::Camera,
        })
    }

    /// Accept a picked file if it decodes as an image.
    ///
    /// `mime_type` is what the picker reported; when it is missing or
    /// generic, the sniffed format's mime type is used instead.
    pub fn from_file(bytes: Vec<u8>, mime_type: Option<&str>) -> Result<Self, SourceError> {
        if bytes.is_empty() {
            return Err(SourceError::Empty);
        }

        let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
        let format = reader.format().ok_or(SourceError::UnknownFormat)?;
        let decoded = reader.decode()?;

        let mime_type = match mime_type.map(str::trim) {
            Some(m) if m.starts_with("image/") => m.to_string(),
            Some(m) if !GENERIC_MIME_TYPES.contains(&m) => {
                log::warn!(
                    "[SOURCE] Picker reported '{}' for a {:?} image, using sniffed type",
                    m,
                    format
                );
                format.to_mime_type().to_string()
            }
            _ => format.to_mime_type().to_string(),
        };

        log::info!(
            "[SOURCE] Upload accepted: {:?} {}x{} ({} bytes)",
            format,
            decoded.width(),
            decoded.height(),
            bytes.len()
        );

        Ok(Self {
            bytes,
            mime_type,
            origin: ImageOrigin::Upload,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:` URL for preview surfaces.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn solid_frame(width: u32, height: u32) -> Frame {
        let pixels = RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
        Frame::new(pixels).unwrap()
    }

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let pixels = RgbImage::from_pixel(width, height, image::Rgb([10, 200, 30]));
        let mut out = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn empty_frames_are_rejected() {
        assert!(Frame::new(RgbImage::new(0, 10)).is_none());
        assert!(Frame::from_raw(2, 2, vec![0; 5]).is_none());
        assert!(Frame::from_raw(2, 2, vec![0; 12]).is_some());
    }

    #[test]
    fn capture_produces_jpeg() {
        let image = CapturedImage::from_capture(&solid_frame(16, 8)).unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.origin(), ImageOrigin::Camera);
        // JPEG SOI marker
        assert_eq!(&image.bytes()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn upload_keeps_original_bytes() {
        let png = png_bytes(4, 4);
        let image = CapturedImage::from_file(png.clone(), Some("image/png")).unwrap();
        assert_eq!(image.bytes(), png.as_slice());
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.origin(), ImageOrigin::Upload);
    }

    #[test]
    fn upload_sniffs_generic_mime() {
        let image =
            CapturedImage::from_file(png_bytes(3, 3), Some("application/octet-stream")).unwrap();
        assert_eq!(image.mime_type(), "image/png");

        let image = CapturedImage::from_file(png_bytes(3, 3), None).unwrap();
        assert_eq!(image.mime_type(), "image/png");

        let image = CapturedImage::from_file(png_bytes(3, 3), Some("text/plain")).unwrap();
        assert_eq!(image.mime_type(), "image/png");
    }

    #[test]
    fn garbage_upload_is_unreadable() {
        assert!(matches!(
            CapturedImage::from_file(Vec::new(), Some("image/jpeg")),
            Err(SourceError::Empty)
        ));
        assert!(matches!(
            CapturedImage::from_file(b"definitely not an image".to_vec(), Some("image/jpeg")),
            Err(SourceError::UnknownFormat)
        ));

        let mut truncated = png_bytes(32, 32);
        truncated.truncate(40);
        assert!(CapturedImage::from_file(truncated, Some("image/png")).is_err());
    }

    #[test]
    fn data_url_has_mime_prefix() {
        let image = CapturedImage::from_file(png_bytes(2, 2), Some("image/png")).unwrap();
        let url = image.to_data_url();
        assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
