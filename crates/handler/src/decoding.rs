use crate::error::HandlerError;
use crate::payload::{APPLICATION_JSON, APPLICATION_X_IMAGE, APPLICATION_X_NPY, JsonRequest};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, GrayImage, RgbImage};

/// Raw numeric buffers carry no dimension metadata; the shape is fixed by
/// convention with the caller.
pub const RAW_BUFFER_HEIGHT: u32 = 137;
pub const RAW_BUFFER_WIDTH: u32 = 236;

#[derive(Debug)]
pub struct DecodedImage {
    pub image: RgbImage,
    pub short_hint: Option<u32>,
}

/// Turn a raw request payload into a decoded RGB image, dispatching on the
/// content-type label. Unrecognized content types fail immediately; decoding
/// failures propagate from the underlying parsers.
pub fn decode_request(payload: &[u8], content_type: &str) -> anyhow::Result<DecodedImage> {
    match content_type {
        APPLICATION_JSON => {
            let request: JsonRequest = serde_json::from_slice(payload)?;
            let bytes = BASE64.decode(request.image.as_bytes())?;
            let image = image::load_from_memory(&bytes)?.to_rgb8();
            Ok(DecodedImage {
                image,
                short_hint: request.short,
            })
        }
        APPLICATION_X_IMAGE => {
            let image = image::load_from_memory(payload)?.to_rgb8();
            Ok(DecodedImage {
                image,
                short_hint: None,
            })
        }
        APPLICATION_X_NPY => Ok(DecodedImage {
            image: decode_raw_buffer(payload)?,
            short_hint: None,
        }),
        other => Err(HandlerError::UnsupportedContentType {
            content_type: other.to_string(),
        }
        .into()),
    }
}

fn decode_raw_buffer(payload: &[u8]) -> anyhow::Result<RgbImage> {
    let expected = (RAW_BUFFER_WIDTH * RAW_BUFFER_HEIGHT) as usize;
    if payload.len() != expected {
        anyhow::bail!(
            "Buffer size mismatch: expected {} bytes for a {}x{} buffer, got {}",
            expected,
            RAW_BUFFER_HEIGHT,
            RAW_BUFFER_WIDTH,
            payload.len()
        );
    }

    let gray = GrayImage::from_raw(RAW_BUFFER_WIDTH, RAW_BUFFER_HEIGHT, payload.to_vec())
        .ok_or_else(|| anyhow::anyhow!("Raw buffer does not fit its declared dimensions"))?;

    Ok(DynamicImage::ImageLuma8(gray).to_rgb8())
}
