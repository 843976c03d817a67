//! One-shot frame capture.
//!
//! Renders the current frame of a [`VideoSurface`] into a raster sized to the
//! surface and encodes it as a JPEG `data:` URI.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

use crate::camera::VideoSurface;
use crate::error::{Result, SightlineError};

/// Default JPEG quality (0.8 on the 0..1 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

const NOT_READY: &str = "Video stream not ready";

/// A captured, encoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    /// `data:image/jpeg;base64,...`
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

/// Captures the current frame of `surface`.
///
/// Fails with [`SightlineError::Capture`] while the surface reports zero
/// dimensions, which means the device has not produced a frame yet. This is
/// distinct from camera loss, where no surface exists at all.
pub fn capture_frame<S>(surface: &S, quality: u8) -> Result<CapturedFrame>
where
    S: VideoSurface + ?Sized,
{
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return Err(SightlineError::capture(NOT_READY));
    }

    let frame = surface
        .current_frame()
        .ok_or_else(|| SightlineError::capture(NOT_READY))?;
    let raster = render_to_raster(frame, width, height);

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(&raster)
        .map_err(|err| SightlineError::capture(format!("JPEG encoding failed: {err}")))?;

    tracing::debug!(width, height, bytes = bytes.len(), "frame captured");

    Ok(CapturedFrame {
        data_uri: format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(&bytes)),
        width,
        height,
    })
}

/// Draws `frame` onto a `width`×`height` raster.
fn render_to_raster(frame: RgbImage, width: u32, height: u32) -> RgbImage {
    if frame.dimensions() == (width, height) {
        frame
    } else {
        imageops::resize(&frame, width, height, FilterType::Triangle)
    }
}

/// Decodes a base64 image, with or without a `data:<mime>;base64,` prefix.
pub fn decode_data_uri(data: &str) -> Result<DynamicImage> {
    let payload = match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    };
    let bytes = BASE64_STANDARD
        .decode(payload.trim())
        .map_err(|err| SightlineError::Serialization {
            format: "base64".to_string(),
            message: err.to_string(),
        })?;
    Ok(image::load_from_memory(&bytes)?)
}
