// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detection pipeline tests against a mocked inference engine
//!
//! Verify that the pipeline:
//! - Feeds the engine a [1, 3, H, W] tensor sized by the scale parameters
//! - Rejects engine outputs that are not [1, 1, H, W]
//! - Surfaces engine failures as call errors
//! - Can be shared across threads and blocking tasks

use fabstir_text_detector::vision::ocr::{
    DetectionConfig, DetectionEngine, DetectionError, DetectionPipeline, ScaleParam,
};
use image::DynamicImage;
use mockall::mock;
use mockall::predicate::function;
use ndarray::Array4;
use std::sync::Arc;

mock! {
    pub Engine {}

    impl DetectionEngine for Engine {
        fn run(&self, input: &Array4<f32>) -> Result<Array4<f32>, DetectionError>;
    }
}

/// Probability output with one text-like bar
fn bar_output(height: usize, width: usize) -> Array4<f32> {
    let mut output = Array4::zeros((1, 1, height, width));
    for y in height / 4..height / 4 + 8 {
        for x in 8..width - 8 {
            output[[0, 0, y, x]] = 0.95;
        }
    }
    output
}

#[test]
fn test_engine_receives_scaled_tensor() {
    let mut engine = MockEngine::new();
    engine
        .expect_run()
        .with(function(|input: &Array4<f32>| input.shape() == [1, 3, 64, 96]))
        .times(1)
        .returning(|_| Ok(bar_output(64, 96)));

    let pipeline = DetectionPipeline::with_defaults(engine);
    let image = DynamicImage::new_rgb8(192, 128);
    let scale = ScaleParam::from_sizes(192, 128, 96, 64).unwrap();

    let detections = pipeline.detect(&image, &scale).unwrap();
    assert_eq!(detections.len(), 1);
    // Mapped back into the 192x128 source
    assert!(detections[0].points.iter().all(|p| p.x < 192 && p.y < 128));
    assert!(detections[0].points.iter().any(|p| p.x > 96));
}

#[test]
fn test_unexpected_output_shape_is_an_error() {
    let mut engine = MockEngine::new();
    engine
        .expect_run()
        .returning(|_| Ok(Array4::zeros((1, 2, 32, 32))));

    let pipeline = DetectionPipeline::with_defaults(engine);
    let image = DynamicImage::new_rgb8(32, 32);
    let scale = ScaleParam::from_sizes(32, 32, 32, 32).unwrap();

    match pipeline.detect(&image, &scale) {
        Err(DetectionError::UnexpectedOutputShape { actual }) => {
            assert_eq!(actual, vec![1, 2, 32, 32]);
        }
        other => panic!("expected shape error, got {:?}", other),
    }
}

#[test]
fn test_engine_failure_aborts_the_call() {
    let mut engine = MockEngine::new();
    engine
        .expect_run()
        .returning(|_| Err(DetectionError::Inference("session crashed".to_string())));

    let pipeline = DetectionPipeline::with_defaults(engine);
    let image = DynamicImage::new_rgb8(32, 32);
    let scale = ScaleParam::from_sizes(32, 32, 32, 32).unwrap();

    let err = pipeline.detect(&image, &scale).unwrap_err();
    assert!(matches!(err, DetectionError::Inference(_)));
    assert!(!err.is_construction_error());
}

#[test]
fn test_mismatched_image_never_reaches_engine() {
    let mut engine = MockEngine::new();
    engine.expect_run().never();

    let pipeline = DetectionPipeline::with_defaults(engine);
    let image = DynamicImage::new_rgb8(50, 50);
    let scale = ScaleParam::from_sizes(64, 64, 64, 64).unwrap();

    assert!(matches!(
        pipeline.detect(&image, &scale),
        Err(DetectionError::InvalidInput(_))
    ));
}

#[test]
fn test_non_finite_output_is_clamped() {
    let mut engine = MockEngine::new();
    engine.expect_run().returning(|_| {
        let mut output = bar_output(64, 64);
        output[[0, 0, 0, 0]] = f32::NAN;
        output[[0, 0, 20, 20]] = f32::INFINITY;
        Ok(output)
    });

    let pipeline = DetectionPipeline::with_defaults(engine);
    let image = DynamicImage::new_rgb8(64, 64);
    let scale = ScaleParam::from_sizes(64, 64, 64, 64).unwrap();

    let map = pipeline.build_probability_map(&image, &scale).unwrap();
    assert_eq!(map.non_finite_count(), 2);

    let (detections, stats) = pipeline
        .postprocess_with_stats(&map, &scale, &pipeline.config().thresholds())
        .unwrap();
    assert_eq!(stats.non_finite_values, 2);
    assert!(detections.iter().all(|d| d.score.is_finite()));
}

#[test]
fn test_per_call_thresholds_override_config() {
    let mut engine = MockEngine::new();
    engine.expect_run().times(2).returning(|_| Ok(bar_output(64, 64)));

    let pipeline = DetectionPipeline::new(engine, DetectionConfig::default()).unwrap();
    let image = DynamicImage::new_rgb8(64, 64);
    let scale = ScaleParam::from_sizes(64, 64, 64, 64).unwrap();

    assert_eq!(pipeline.detect(&image, &scale).unwrap().len(), 1);

    let mut strict = pipeline.config().thresholds();
    strict.box_score_thresh = 1.0;
    assert!(pipeline
        .detect_with_thresholds(&image, &scale, &strict)
        .unwrap()
        .is_empty());
}

#[test]
fn test_pipeline_shared_across_blocking_tasks() {
    let mut engine = MockEngine::new();
    engine.expect_run().times(4).returning(|_| Ok(bar_output(64, 64)));

    let pipeline = Arc::new(DetectionPipeline::with_defaults(engine));
    let image = Arc::new(DynamicImage::new_rgb8(64, 64));
    let scale = ScaleParam::from_sizes(64, 64, 64, 64).unwrap();

    let results = tokio_test::block_on(async {
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pipeline = Arc::clone(&pipeline);
            let image = Arc::clone(&image);
            handles.push(tokio::task::spawn_blocking(move || {
                pipeline.detect(&image, &scale)
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }
        results
    });

    // Same input, same output on every thread
    assert_eq!(results.len(), 4);
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_detect_on_blocking_thread() {
    let mut engine = MockEngine::new();
    engine.expect_run().returning(|_| Ok(bar_output(32, 64)));

    let pipeline = DetectionPipeline::with_defaults(engine);
    let image = DynamicImage::new_rgb8(64, 32);
    let scale = pipeline.scale_for(&image).unwrap();
    assert_eq!((scale.dst_width, scale.dst_height), (64, 32));

    let detections = tokio::task::spawn_blocking(move || pipeline.detect(&image, &scale))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detections.len(), 1);
}
