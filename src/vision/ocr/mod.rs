// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! DB text detection for scene and document images
//!
//! Runs a Differentiable Binarization segmentation model on CPU and turns
//! its probability map into scored quadrilaterals.
//!
//! Components:
//! - `scale` - Source/model-input size bookkeeping
//! - `preprocessing` - Resize and normalize into an NCHW tensor
//! - `engine` - Inference seam and the ONNX Runtime engine
//! - `prob_map` - Probability map and its byte view
//! - `binarize` - Threshold and 2x2 dilation
//! - `contours` - Boundary tracing, outer and hole borders
//! - `geometry` - Minimum-area rectangles and corner ordering
//! - `score` - Mean probability inside a quad
//! - `unclip` - Outward polygon offset
//! - `detection` - Coordinate mapping and the full pipeline

pub mod binarize;
pub mod config;
pub mod contours;
pub mod detection;
pub mod engine;
pub mod errors;
pub mod geometry;
pub mod preprocessing;
pub mod prob_map;
pub mod scale;
pub mod score;
pub mod unclip;

pub use config::{ChannelOrder, DetectionConfig, Thresholds, DEFAULT_MAX_CANDIDATES, LONG_SIDE_THRESH};
pub use detection::{map_to_source, postprocess, DetPoint, Detection, DetectionPipeline, DetectionStats};
pub use engine::{DetectionEngine, OnnxDetectionEngine};
pub use errors::DetectionError;
pub use geometry::{min_area_rect, order_corners, Point2f, Quad, RotatedRect, Size2f};
pub use prob_map::ProbabilityMap;
pub use scale::ScaleParam;
