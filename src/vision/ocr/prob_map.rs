// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Probability map produced by the detection model

use image::GrayImage;
use ndarray::{s, Array2, Array4};

use super::errors::DetectionError;

/// Per-pixel text probability in model-input space
///
/// NaN is stored as 0 and infinities are clamped to 0 or 1 so that the
/// byte view and box scores stay well defined. The number of such values
/// is kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMap {
    data: Array2<f32>,
    non_finite: usize,
}

impl ProbabilityMap {
    /// Wrap an `H x W` grid of probabilities
    pub fn new(mut data: Array2<f32>) -> Result<Self, DetectionError> {
        let (height, width) = data.dim();
        if height == 0 || width == 0 {
            return Err(DetectionError::UnexpectedOutputShape {
                actual: vec![1, 1, height, width],
            });
        }

        let mut non_finite = 0;
        data.mapv_inplace(|v| {
            if v.is_finite() {
                v
            } else {
                non_finite += 1;
                if v == f32::INFINITY {
                    1.0
                } else {
                    0.0
                }
            }
        });

        Ok(Self { data, non_finite })
    }

    /// Extract the map from a `[1, 1, H, W]` engine output
    pub fn from_output(output: &Array4<f32>) -> Result<Self, DetectionError> {
        let shape = output.shape();
        if shape[0] != 1 || shape[1] != 1 {
            return Err(DetectionError::UnexpectedOutputShape {
                actual: shape.to_vec(),
            });
        }
        Self::new(output.slice(s![0, 0, .., ..]).to_owned())
    }

    /// Build a map from row-major values
    pub fn from_vec(width: usize, height: usize, values: Vec<f32>) -> Result<Self, DetectionError> {
        let data = Array2::from_shape_vec((height, width), values)
            .map_err(|e| DetectionError::InvalidInput(e.to_string()))?;
        Self::new(data)
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[[y, x]]
    }

    /// Count of NaN or infinite values replaced at construction
    pub fn non_finite_count(&self) -> usize {
        self.non_finite
    }

    /// Byte view: `round(v * 255)` clamped to `[0, 255]`
    pub fn to_byte_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            image::Luma([to_byte(self.get(x as usize, y as usize))])
        })
    }
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
