// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Binarization of the probability map byte view

use image::{GrayImage, Luma};

/// Foreground value in binary masks
pub const FOREGROUND: u8 = 255;

/// Threshold the byte view and grow regions with a 2x2 dilation
///
/// A pixel is foreground when `byte >= box_thresh * 255`.
pub fn binarize(bytes: &GrayImage, box_thresh: f32) -> GrayImage {
    let cutoff = box_thresh * 255.0;
    let thresholded = GrayImage::from_fn(bytes.width(), bytes.height(), |x, y| {
        if f32::from(bytes.get_pixel(x, y)[0]) >= cutoff {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    });
    dilate_2x2(&thresholded)
}

/// Dilation with a 2x2 rectangle anchored at its bottom-right cell
///
/// `dst(x, y) = max(src(x-1..=x, y-1..=y))`, so regions grow by one pixel
/// towards +x and +y. Out-of-image neighbours are ignored.
pub fn dilate_2x2(src: &GrayImage) -> GrayImage {
    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        let mut value = src.get_pixel(x, y)[0];
        if x > 0 {
            value = value.max(src.get_pixel(x - 1, y)[0]);
        }
        if y > 0 {
            value = value.max(src.get_pixel(x, y - 1)[0]);
            if x > 0 {
                value = value.max(src.get_pixel(x - 1, y - 1)[0]);
            }
        }
        Luma([value])
    })
}
