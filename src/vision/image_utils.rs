// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Source image loading for text detection
//!
//! Images arrive as files, raw bytes or base64 strings. The format is
//! sniffed from magic bytes before decoding so that obviously wrong
//! payloads are rejected without touching a decoder.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use tracing::debug;

/// Default upper bound for encoded image payloads (32MB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 32 * 1024 * 1024;

/// Errors raised while loading a source image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image payload is {0} bytes, limit is {1} bytes")]
    TooLarge(usize, usize),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image payload is empty")]
    EmptyData,

    #[error("Image has zero width or height")]
    ZeroSized,

    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Metadata collected while decoding a source image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Channel count of the decoded pixel buffer
    pub channels: u8,
    pub format: ImageFormat,
    /// Size of the encoded payload
    pub size_bytes: usize,
}

/// Read and decode an image file
pub fn load_image_file<P: AsRef<Path>>(
    path: P,
    max_bytes: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ImageError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode_image_bytes(&bytes, max_bytes)
}

/// Decode a base64 string holding an encoded image
pub fn decode_base64_image(
    encoded: &str,
    max_bytes: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(ImageError::EmptyData);
    }

    // Accept data URLs as produced by browsers
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };

    let bytes = STANDARD.decode(payload)?;
    decode_image_bytes(&bytes, max_bytes)
}

/// Decode an encoded image held in memory
pub fn decode_image_bytes(
    bytes: &[u8],
    max_bytes: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }
    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge(bytes.len(), max_bytes));
    }

    let format = detect_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(ImageError::ZeroSized);
    }

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        channels: img.color().channel_count(),
        format,
        size_bytes: bytes.len(),
    };
    debug!(
        "Decoded {:?} image {}x{} ({} channels, {} bytes)",
        info.format, info.width, info.height, info.channels, info.size_bytes
    );

    Ok((img, info))
}

/// Sniff the image format from its leading magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Ok(ImageFormat::Png),
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Ok(ImageFormat::WebP),
        [b'B', b'M', ..] => Ok(ImageFormat::Bmp),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),
        _ => Err(ImageError::UnsupportedFormat),
    }
}
