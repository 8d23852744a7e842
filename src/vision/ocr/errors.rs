// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for text detection
//!
//! Only model construction and inference failures are reported here.
//! Degenerate candidates are skipped by the pipeline and never surface
//! as errors.

use thiserror::Error;

use crate::vision::image_utils::ImageError;

/// Errors that can occur while building or running the detection pipeline
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Model file does not exist
    #[error("Text detection model not found: {0}")]
    ModelNotFound(String),

    /// Model blob could not be turned into an inference session
    #[error("Failed to load text detection model: {0}")]
    ModelLoad(String),

    /// The inference engine returned an error
    #[error("Detection inference failed: {0}")]
    Inference(String),

    /// The engine produced a tensor that is not `[1, 1, H, W]`
    #[error("Unexpected detection output shape: {actual:?}, expected [1, 1, H, W]")]
    UnexpectedOutputShape { actual: Vec<usize> },

    /// The input tensor or image is unusable
    #[error("Invalid detection input: {0}")]
    InvalidInput(String),

    /// Scale parameters with zero sizes or non-positive ratios
    #[error("Invalid scale parameters: {0}")]
    InvalidScale(String),

    /// Configuration failed validation
    #[error("Invalid detection config: {0}")]
    InvalidConfig(String),

    /// Source image could not be loaded
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl DetectionError {
    /// Whether the error happened while constructing the engine
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            DetectionError::ModelNotFound(_) | DetectionError::ModelLoad(_)
        )
    }
}
