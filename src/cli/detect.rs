// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::vision::image_utils::{load_image_file, DEFAULT_MAX_IMAGE_BYTES};
use crate::vision::ocr::{
    Detection, DetectionConfig, DetectionPipeline, OnnxDetectionEngine, ScaleParam,
};

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Path to the DB detection model (ONNX)
    #[arg(long, env = "TEXT_DET_MODEL")]
    pub model: PathBuf,

    /// Image to scan
    #[arg(long)]
    pub image: PathBuf,

    /// TOML file with a [detection] table
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum mean probability inside a box
    #[arg(long)]
    pub box_score_thresh: Option<f32>,

    /// Probability map binarization threshold
    #[arg(long)]
    pub box_thresh: Option<f32>,

    /// Box expansion ratio
    #[arg(long)]
    pub unclip_ratio: Option<f32>,

    /// Longest model-input side (0 keeps the image size)
    #[arg(long)]
    pub max_side_len: Option<u32>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the scale command
#[derive(Args, Debug)]
pub struct ScaleArgs {
    /// Image to measure
    #[arg(long)]
    pub image: PathBuf,

    /// Longest model-input side (0 keeps the image size)
    #[arg(long, default_value_t = 1024)]
    pub max_side_len: u32,
}

/// JSON document printed by the detect command
#[derive(Debug, Serialize)]
pub struct DetectReport {
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub scale: ScaleParam,
    pub detections: Vec<Detection>,
    pub elapsed_ms: u128,
}

/// Resolve the detection config: file or environment, then CLI overrides
pub fn resolve_config(args: &DetectArgs) -> Result<DetectionConfig> {
    let mut config = match &args.config {
        Some(path) => DetectionConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DetectionConfig::from_env(),
    };

    if let Some(v) = args.box_score_thresh {
        config.box_score_thresh = v;
    }
    if let Some(v) = args.box_thresh {
        config.box_thresh = v;
    }
    if let Some(v) = args.unclip_ratio {
        config.unclip_ratio = v;
    }
    if let Some(v) = args.max_side_len {
        config.max_side_len = v;
    }

    config.validate().map_err(|e| anyhow!("Invalid detection config: {}", e))?;
    Ok(config)
}

/// Run detection on one image and print the report
pub async fn run_detect(args: DetectArgs) -> Result<()> {
    dotenv::dotenv().ok();

    let config = resolve_config(&args)?;
    let (image, image_info) = load_image_file(&args.image, DEFAULT_MAX_IMAGE_BYTES)
        .with_context(|| format!("Failed to load image {}", args.image.display()))?;
    info!(
        "🖼️  Loaded {} ({}x{}, {:?})",
        args.image.display(),
        image_info.width,
        image_info.height,
        image_info.format
    );

    let engine = OnnxDetectionEngine::from_file(&args.model)?;
    let pipeline = Arc::new(DetectionPipeline::new(engine.clone(), config)?);
    let scale = pipeline.scale_for(&image)?;

    let started = Instant::now();
    let detections = tokio::task::spawn_blocking(move || pipeline.detect(&image, &scale))
        .await
        .context("Detection task failed")??;
    let elapsed_ms = started.elapsed().as_millis();
    engine.shutdown();

    info!("✅ {} text regions in {} ms", detections.len(), elapsed_ms);

    let report = DetectReport {
        image: args.image.display().to_string(),
        width: image_info.width,
        height: image_info.height,
        scale,
        detections,
        elapsed_ms,
    };
    println!("{}", render_json(&report, args.pretty)?);
    Ok(())
}

/// Compute scale parameters for an image file
pub fn compute_scale(image: &Path, max_side_len: u32) -> Result<ScaleParam> {
    let (img, _) = load_image_file(image, DEFAULT_MAX_IMAGE_BYTES)
        .with_context(|| format!("Failed to load image {}", image.display()))?;
    Ok(ScaleParam::from_max_side_len(
        img.width(),
        img.height(),
        max_side_len,
    )?)
}

/// Print the scale parameters chosen for an image
pub async fn run_scale(args: ScaleArgs) -> Result<()> {
    let scale = compute_scale(&args.image, args.max_side_len)?;
    println!("{}", render_json(&scale, true)?);
    Ok(())
}

fn render_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
