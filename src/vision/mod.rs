// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for CPU-based image analysis
//!
//! This module provides:
//! - Image loading and format checks
//! - Text region detection (DB post-processing over an ONNX model)

pub mod image_utils;
pub mod ocr;

pub use image_utils::{
    decode_base64_image, decode_image_bytes, detect_format, load_image_file, ImageError, ImageInfo,
    DEFAULT_MAX_IMAGE_BYTES,
};
