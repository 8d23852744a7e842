// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! DB text detection pipeline
//!
//! Turns the model's probability map into scored text quads in source
//! image pixels: binarize, trace contours, fit rotated rectangles, score,
//! unclip, refit and map back through the scale parameters.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::binarize::binarize;
use super::config::{DetectionConfig, Thresholds, LONG_SIDE_THRESH};
use super::contours::extract_contours;
use super::engine::DetectionEngine;
use super::errors::DetectionError;
use super::geometry::{min_area_rect, quad_from_rect, Point2f, Quad};
use super::preprocessing::preprocess_for_detection;
use super::prob_map::ProbabilityMap;
use super::scale::ScaleParam;
use super::score::box_score_fast;
use super::unclip::{is_degenerate, unclip};

/// A corner in source image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetPoint {
    pub x: i32,
    pub y: i32,
}

/// A detected text region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Corners in canonical order, clamped to the source image
    pub points: [DetPoint; 4],
    /// Mean probability inside the pre-expansion quad
    pub score: f32,
}

/// Per-call counters for candidate handling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionStats {
    /// Contours on the mask (outer and hole borders), before the candidate cap
    pub contours_found: usize,
    /// Contours that entered the per-candidate loop
    pub contours_processed: usize,
    /// Rejected: two or fewer simplified points
    pub too_few_points: usize,
    /// Rejected: rectangle long side below the threshold
    pub too_small: usize,
    /// Rejected: box score below the threshold
    pub low_score: usize,
    /// Rejected: offset produced nothing or a sub-pixel rectangle
    pub unclip_failed: usize,
    /// Rejected: expanded long side below the threshold
    pub too_small_after_unclip: usize,
    pub accepted: usize,
    /// NaN or infinite values in the probability map
    pub non_finite_values: usize,
}

/// Map a quad from model-input space back to source pixels
///
/// Coordinates are divided by the ratios, truncated toward zero and
/// clamped into the source image.
pub fn map_to_source(quad: &Quad, scale: &ScaleParam) -> [DetPoint; 4] {
    let max_x = scale.src_width as i32 - 1;
    let max_y = scale.src_height as i32 - 1;
    quad.map(|p| DetPoint {
        x: ((p.x / scale.ratio_width) as i32).clamp(0, max_x),
        y: ((p.y / scale.ratio_height) as i32).clamp(0, max_y),
    })
}

/// Run candidate extraction on a probability map
///
/// Detections come back in reverse contour discovery order. Candidate
/// rejections are counted in the returned stats and never fail the call.
///
/// # Errors
/// `InvalidConfig` for out-of-range thresholds, `InvalidScale` for
/// unusable scale parameters.
pub fn postprocess(
    map: &ProbabilityMap,
    scale: &ScaleParam,
    thresholds: &Thresholds,
) -> Result<(Vec<Detection>, DetectionStats), DetectionError> {
    thresholds.validate().map_err(DetectionError::InvalidConfig)?;
    scale.validate()?;

    let mut stats = DetectionStats {
        non_finite_values: map.non_finite_count(),
        ..DetectionStats::default()
    };

    let mask = binarize(&map.to_byte_image(), thresholds.box_thresh);
    let contours = extract_contours(&mask, thresholds.max_candidates);
    stats.contours_found = contours.total_found;
    stats.contours_processed = contours.contours.len();

    let mut detections = Vec::new();
    for (index, contour) in contours.contours.iter().enumerate() {
        if contour.len() <= 2 {
            trace!("Candidate {}: {} points, skipped", index, contour.len());
            stats.too_few_points += 1;
            continue;
        }

        let points: Vec<Point2f> = contour
            .iter()
            .map(|p| Point2f::new(p.x as f32, p.y as f32))
            .collect();
        let (quad, long_side) = quad_from_rect(&min_area_rect(&points));
        if long_side < LONG_SIDE_THRESH {
            trace!("Candidate {}: long side {:.2}, skipped", index, long_side);
            stats.too_small += 1;
            continue;
        }

        let score = box_score_fast(map, &quad);
        if score < thresholds.box_score_thresh {
            trace!("Candidate {}: score {:.3}, skipped", index, score);
            stats.low_score += 1;
            continue;
        }

        let expanded = match unclip(&quad, thresholds.unclip_ratio) {
            Some(rect) if !is_degenerate(&rect) => rect,
            _ => {
                trace!("Candidate {}: unclip produced no usable polygon", index);
                stats.unclip_failed += 1;
                continue;
            }
        };

        let (clip_quad, clip_long_side) = quad_from_rect(&expanded);
        if clip_long_side < LONG_SIDE_THRESH + 2.0 {
            trace!(
                "Candidate {}: expanded long side {:.2}, skipped",
                index,
                clip_long_side
            );
            stats.too_small_after_unclip += 1;
            continue;
        }

        detections.push(Detection {
            points: map_to_source(&clip_quad, scale),
            score,
        });
    }

    detections.reverse();
    stats.accepted = detections.len();

    debug!(
        "Text detection: {} contours ({} processed), {} accepted",
        stats.contours_found, stats.contours_processed, stats.accepted
    );

    Ok((detections, stats))
}

/// Text detection over a reusable inference engine
///
/// The engine is built once by the caller and reused for every call.
#[derive(Debug, Clone)]
pub struct DetectionPipeline<E: DetectionEngine> {
    engine: E,
    config: DetectionConfig,
}

impl<E: DetectionEngine> DetectionPipeline<E> {
    /// Create a pipeline after validating the configuration
    pub fn new(engine: E, config: DetectionConfig) -> Result<Self, DetectionError> {
        config.validate().map_err(DetectionError::InvalidConfig)?;
        Ok(Self { engine, config })
    }

    /// Create a pipeline with the default configuration
    pub fn with_defaults(engine: E) -> Self {
        Self {
            engine,
            config: DetectionConfig::default(),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Scale parameters for an image under the configured `max_side_len`
    pub fn scale_for(&self, image: &DynamicImage) -> Result<ScaleParam, DetectionError> {
        ScaleParam::from_max_side_len(image.width(), image.height(), self.config.max_side_len)
    }

    /// Detect text regions with the configured thresholds
    ///
    /// # Arguments
    /// - `image`: Source image, any channel layout
    /// - `scale`: Source and model-input sizes for this image
    ///
    /// # Errors
    /// Engine failures, unexpected output shapes and invalid inputs abort
    /// the call.
    pub fn detect(
        &self,
        image: &DynamicImage,
        scale: &ScaleParam,
    ) -> Result<Vec<Detection>, DetectionError> {
        self.detect_with_thresholds(image, scale, &self.config.thresholds())
    }

    /// Detect text regions with thresholds for this call only
    pub fn detect_with_thresholds(
        &self,
        image: &DynamicImage,
        scale: &ScaleParam,
        thresholds: &Thresholds,
    ) -> Result<Vec<Detection>, DetectionError> {
        let map = self.build_probability_map(image, scale)?;
        let (detections, _) = postprocess(&map, scale, thresholds)?;
        Ok(detections)
    }

    /// Preprocess, run the engine and extract the probability map
    pub fn build_probability_map(
        &self,
        image: &DynamicImage,
        scale: &ScaleParam,
    ) -> Result<ProbabilityMap, DetectionError> {
        scale.validate()?;
        let input = preprocess_for_detection(image, scale, self.config.channel_order)?;
        let output = self.engine.run(&input)?;
        let map = ProbabilityMap::from_output(&output)?;

        if self.config.warn_on_non_finite && map.non_finite_count() > 0 {
            warn!(
                "Detection model produced {} non-finite probabilities; clamped",
                map.non_finite_count()
            );
        }
        debug!(
            "Probability map {}x{} for {}x{} input",
            map.width(),
            map.height(),
            scale.dst_width,
            scale.dst_height
        );

        Ok(map)
    }

    /// Post-process an existing probability map
    pub fn postprocess(
        &self,
        map: &ProbabilityMap,
        scale: &ScaleParam,
        thresholds: &Thresholds,
    ) -> Result<Vec<Detection>, DetectionError> {
        postprocess(map, scale, thresholds).map(|(detections, _)| detections)
    }

    /// Post-process an existing probability map and report candidate counters
    pub fn postprocess_with_stats(
        &self,
        map: &ProbabilityMap,
        scale: &ScaleParam,
        thresholds: &Thresholds,
    ) -> Result<(Vec<Detection>, DetectionStats), DetectionError> {
        postprocess(map, scale, thresholds)
    }
}
