// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the DB text detection model

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::Array4;

use super::config::ChannelOrder;
use super::errors::DetectionError;
use super::scale::ScaleParam;

/// Mean values for normalization (ImageNet), per tensor channel
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for normalization (ImageNet), per tensor channel
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Preprocess an image for text detection
///
/// Steps:
/// 1. Resize to `dst_width x dst_height` (bilinear)
/// 2. Convert to three colour channels in the requested order
/// 3. Normalize: `(pixel - mean * 255) * (1 / (std * 255))`
/// 4. Convert to NCHW tensor format [1, 3, H, W]
///
/// # Errors
/// Returns `InvalidInput` when the image has a zero side or its size does
/// not match the scale parameters' source size.
pub fn preprocess_for_detection(
    image: &DynamicImage,
    scale: &ScaleParam,
    order: ChannelOrder,
) -> Result<Array4<f32>, DetectionError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectionError::InvalidInput(format!(
            "image has a zero side ({}x{})",
            width, height
        )));
    }
    if width != scale.src_width || height != scale.src_height {
        return Err(DetectionError::InvalidInput(format!(
            "image is {}x{} but scale expects {}x{}",
            width, height, scale.src_width, scale.src_height
        )));
    }

    let resized = if (width, height) == (scale.dst_width, scale.dst_height) {
        image.to_rgb8()
    } else {
        image
            .resize_exact(scale.dst_width, scale.dst_height, FilterType::Triangle)
            .to_rgb8()
    };

    let mean = MEAN.map(|m| m * 255.0);
    let norm = STD.map(|s| 1.0 / (s * 255.0));
    let source_channel: [usize; 3] = match order {
        ChannelOrder::Bgr => [2, 1, 0],
        ChannelOrder::Rgb => [0, 1, 2],
    };

    let (w, h) = (scale.dst_width as usize, scale.dst_height as usize);
    let mut tensor = Array4::zeros((1, 3, h, w));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let raw = pixel[source_channel[c]] as f32;
            tensor[[0, c, y as usize, x as usize]] = (raw - mean[c]) * norm[c];
        }
    }

    Ok(tensor)
}
