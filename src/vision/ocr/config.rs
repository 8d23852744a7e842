// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for text detection
//!
//! Values come from defaults, a TOML file (`[detection]` table) or
//! `TEXT_DET_*` environment variables. CLI flags are applied on top by the
//! binary.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use super::errors::DetectionError;

/// Minimum long side (in model-input pixels) of a candidate rectangle
pub const LONG_SIDE_THRESH: f32 = 3.0;

/// Default cap on contours processed per call
pub const DEFAULT_MAX_CANDIDATES: usize = 1000;

/// Channel layout written into the model input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// Blue, green, red (models exported from OpenCV pipelines)
    #[default]
    Bgr,
    Rgb,
}

impl std::str::FromStr for ChannelOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bgr" => Ok(ChannelOrder::Bgr),
            "rgb" => Ok(ChannelOrder::Rgb),
            other => Err(format!("unknown channel order '{}', expected bgr or rgb", other)),
        }
    }
}

/// Per-call thresholds consumed by the post-processing stages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum mean probability inside a quad
    pub box_score_thresh: f32,
    /// Binarization threshold on the probability map
    pub box_thresh: f32,
    /// Expansion ratio applied by unclip
    pub unclip_ratio: f32,
    /// Contours beyond this count are ignored
    pub max_candidates: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        DetectionConfig::default().thresholds()
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.box_score_thresh) {
            return Err(format!(
                "box_score_thresh must be within [0, 1], got {}",
                self.box_score_thresh
            ));
        }
        if !(0.0..=1.0).contains(&self.box_thresh) {
            return Err(format!(
                "box_thresh must be within [0, 1], got {}",
                self.box_thresh
            ));
        }
        if !self.unclip_ratio.is_finite() || self.unclip_ratio <= 0.0 {
            return Err(format!(
                "unclip_ratio must be positive, got {}",
                self.unclip_ratio
            ));
        }
        if self.max_candidates == 0 {
            return Err("max_candidates must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Configuration for the detection pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum box score (default: 0.5)
    pub box_score_thresh: f32,
    /// Probability map binarization threshold (default: 0.5)
    pub box_thresh: f32,
    /// Unclip expansion ratio (default: 1.8)
    pub unclip_ratio: f32,
    /// Maximum contours processed per call (default: 1000)
    pub max_candidates: usize,
    /// Longest model-input side used by the scaling policy (default: 1024, 0 = native)
    pub max_side_len: u32,
    /// Tensor channel layout (default: bgr)
    pub channel_order: ChannelOrder,
    /// Log a warning when the model emits NaN or infinite probabilities
    pub warn_on_non_finite: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            box_score_thresh: 0.5,
            box_thresh: 0.5,
            unclip_ratio: 1.8,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            max_side_len: 1024,
            channel_order: ChannelOrder::Bgr,
            warn_on_non_finite: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    detection: DetectionConfig,
}

impl DetectionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            box_score_thresh: lookup("TEXT_DET_BOX_SCORE_THRESH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.box_score_thresh),
            box_thresh: lookup("TEXT_DET_BOX_THRESH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.box_thresh),
            unclip_ratio: lookup("TEXT_DET_UNCLIP_RATIO")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.unclip_ratio),
            max_candidates: lookup("TEXT_DET_MAX_CANDIDATES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_candidates),
            max_side_len: lookup("TEXT_DET_MAX_SIDE_LEN")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_side_len),
            channel_order: lookup("TEXT_DET_CHANNEL_ORDER")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.channel_order),
            warn_on_non_finite: lookup("TEXT_DET_WARN_NON_FINITE")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(defaults.warn_on_non_finite),
        }
    }

    /// Load configuration from a TOML file
    ///
    /// Reads the `[detection]` table; missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DetectionError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DetectionError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| DetectionError::InvalidConfig(e.to_string()))?;
        file.detection
            .validate()
            .map_err(DetectionError::InvalidConfig)?;
        Ok(file.detection)
    }

    /// Thresholds for a single detection call
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            box_score_thresh: self.box_score_thresh,
            box_thresh: self.box_thresh,
            unclip_ratio: self.unclip_ratio,
            max_candidates: self.max_candidates,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        self.thresholds().validate()
    }
}
