use base64::Engine;
use image::ImageFormat;

use crate::models::image::SourceImage;

/// Decode an uploaded image given as base64 text, with or without a
/// `data:<mime>;base64,` prefix. The prefix is stripped and the mime type is
/// taken from the decoded bytes, not from the prefix.
pub fn from_encoded(encoded: &str) -> Result<SourceImage, ImagePayloadError> {
    let payload = strip_data_url_prefix(encoded.trim());
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map_err(ImagePayloadError::Decode)?;
    let mime_type = sniff_mime(&bytes)?;

    Ok(SourceImage {
        mime_type: mime_type.to_string(),
        data: payload.to_string(),
    })
}

/// Build a source image from raw uploaded bytes.
pub fn from_bytes(bytes: &[u8]) -> Result<SourceImage, ImagePayloadError> {
    let mime_type = sniff_mime(bytes)?;

    Ok(SourceImage {
        mime_type: mime_type.to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

/// Drop everything up to and including the first comma of a data URL.
pub fn strip_data_url_prefix(encoded: &str) -> &str {
    if encoded.starts_with("data:") {
        if let Some((_, payload)) = encoded.split_once(',') {
            return payload;
        }
    }
    encoded
}

/// Only PNG, JPEG and WEBP are forwarded to the model.
pub fn sniff_mime(bytes: &[u8]) -> Result<&'static str, ImagePayloadError> {
    let format = image::guess_format(bytes).map_err(|_| ImagePayloadError::UnsupportedFormat)?;

    match format {
        ImageFormat::Png => Ok("image/png"),
        ImageFormat::Jpeg => Ok("image/jpeg"),
        ImageFormat::WebP => Ok("image/webp"),
        _ => Err(ImagePayloadError::UnsupportedFormat),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImagePayloadError {
    #[error("Image payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Unsupported image format (expected PNG, JPEG or WEBP)")]
    UnsupportedFormat,
}
