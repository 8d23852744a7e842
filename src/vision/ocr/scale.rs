// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Resize bookkeeping between the source image and the model input

use serde::{Deserialize, Serialize};

use super::errors::DetectionError;

/// DB models downsample by 32, so input sides must be multiples of it
pub const SIDE_ALIGNMENT: u32 = 32;

/// Source and model-input sizes plus the ratios between them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleParam {
    pub src_width: u32,
    pub src_height: u32,
    pub dst_width: u32,
    pub dst_height: u32,
    /// `dst_width / src_width`
    pub ratio_width: f32,
    /// `dst_height / src_height`
    pub ratio_height: f32,
}

impl ScaleParam {
    /// Build scale parameters from explicit sizes and caller-chosen ratios
    ///
    /// # Errors
    /// Returns `InvalidScale` for zero sizes or ratios that are not
    /// strictly positive and finite.
    pub fn new(
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
        ratio_width: f32,
        ratio_height: f32,
    ) -> Result<Self, DetectionError> {
        let param = Self {
            src_width,
            src_height,
            dst_width,
            dst_height,
            ratio_width,
            ratio_height,
        };
        param.validate()?;
        Ok(param)
    }

    /// Build scale parameters whose ratios follow from the sizes
    pub fn from_sizes(
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    ) -> Result<Self, DetectionError> {
        if src_width == 0 || src_height == 0 {
            return Err(DetectionError::InvalidScale(format!(
                "source size {}x{} has a zero side",
                src_width, src_height
            )));
        }
        Self::new(
            src_width,
            src_height,
            dst_width,
            dst_height,
            dst_width as f32 / src_width as f32,
            dst_height as f32 / src_height as f32,
        )
    }

    /// Scaling policy used ahead of detection
    ///
    /// The longest source side is scaled to `max_side_len` (or kept when
    /// `max_side_len` is 0 or larger than the image), the other side follows
    /// the same ratio, and each side is floored to a multiple of 32 with a
    /// minimum of 32.
    pub fn from_max_side_len(
        src_width: u32,
        src_height: u32,
        max_side_len: u32,
    ) -> Result<Self, DetectionError> {
        if src_width == 0 || src_height == 0 {
            return Err(DetectionError::InvalidScale(format!(
                "source size {}x{} has a zero side",
                src_width, src_height
            )));
        }

        let longest = src_width.max(src_height);
        let target = if max_side_len == 0 || max_side_len > longest {
            longest
        } else {
            max_side_len
        };

        let (dst_width, dst_height) = if src_width > src_height {
            let ratio = target as f32 / src_width as f32;
            (target, (src_height as f32 * ratio) as u32)
        } else {
            let ratio = target as f32 / src_height as f32;
            ((src_width as f32 * ratio) as u32, target)
        };

        Self::from_sizes(
            src_width,
            src_height,
            align_side(dst_width),
            align_side(dst_height),
        )
    }

    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.src_width == 0 || self.src_height == 0 {
            return Err(DetectionError::InvalidScale(format!(
                "source size {}x{} has a zero side",
                self.src_width, self.src_height
            )));
        }
        if self.dst_width == 0 || self.dst_height == 0 {
            return Err(DetectionError::InvalidScale(format!(
                "target size {}x{} has a zero side",
                self.dst_width, self.dst_height
            )));
        }
        for (name, ratio) in [("ratio_width", self.ratio_width), ("ratio_height", self.ratio_height)] {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(DetectionError::InvalidScale(format!(
                    "{} must be positive, got {}",
                    name, ratio
                )));
            }
        }
        Ok(())
    }
}

fn align_side(side: u32) -> u32 {
    if side % SIDE_ALIGNMENT == 0 {
        side
    } else {
        ((side / SIDE_ALIGNMENT) * SIDE_ALIGNMENT).max(SIDE_ALIGNMENT)
    }
}
