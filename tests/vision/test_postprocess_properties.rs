// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Post-processing property tests
//!
//! Exercise the map-to-detections path on synthetic probability maps:
//! - Output coordinates stay inside the source image
//! - Repeated calls give identical results
//! - Raising the box score threshold only removes detections
//! - The candidate cap bounds the work per call
//! - The long side cutoff and unclip expansion behave at their edges

use fabstir_text_detector::vision::ocr::geometry::{min_area_rect, quad_from_rect, Point2f};
use fabstir_text_detector::vision::ocr::unclip::unclip;
use fabstir_text_detector::vision::ocr::{postprocess, ProbabilityMap, ScaleParam, Thresholds};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Map with non-overlapping random blocks, one per grid cell at most
fn random_map(seed: u64, width: usize, height: usize) -> ProbabilityMap {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = vec![0.0f32; width * height];
    let cell = 20;

    for cy in 0..height / cell {
        for cx in 0..width / cell {
            if !rng.gen_bool(0.6) {
                continue;
            }
            let w = rng.gen_range(2..cell - 4);
            let h = rng.gen_range(2..cell - 4);
            let value: f32 = rng.gen_range(0.3..1.0);
            let x0 = cx * cell + 1;
            let y0 = cy * cell + 1;
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    values[y * width + x] = value;
                }
            }
        }
    }

    ProbabilityMap::from_vec(width, height, values).unwrap()
}

fn thresholds(box_score_thresh: f32) -> Thresholds {
    Thresholds {
        box_score_thresh,
        box_thresh: 0.3,
        unclip_ratio: 1.6,
        max_candidates: 1000,
    }
}

fn block_map(width: usize, height: usize, blocks: &[(usize, usize, usize, f32)]) -> ProbabilityMap {
    let mut values = vec![0.0f32; width * height];
    for &(x0, y0, side, value) in blocks {
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                values[y * width + x] = value;
            }
        }
    }
    ProbabilityMap::from_vec(width, height, values).unwrap()
}

#[test]
fn test_detections_stay_inside_source_image() {
    // Model space 160x120; sources smaller, equal and larger
    let scales = [
        ScaleParam::new(80, 60, 160, 120, 2.0, 2.0).unwrap(),
        ScaleParam::new(160, 120, 160, 120, 1.0, 1.0).unwrap(),
        ScaleParam::new(320, 240, 160, 120, 0.5, 0.5).unwrap(),
        ScaleParam::new(100, 300, 160, 120, 1.6, 0.4).unwrap(),
    ];

    for seed in 0..12 {
        let map = random_map(seed, 160, 120);
        for scale in &scales {
            let (detections, _) = postprocess(&map, scale, &thresholds(0.3)).unwrap();
            for det in &detections {
                for p in &det.points {
                    assert!(
                        p.x >= 0 && p.x < scale.src_width as i32,
                        "seed {} x {} outside {}",
                        seed,
                        p.x,
                        scale.src_width
                    );
                    assert!(
                        p.y >= 0 && p.y < scale.src_height as i32,
                        "seed {} y {} outside {}",
                        seed,
                        p.y,
                        scale.src_height
                    );
                }
            }
        }
    }
}

#[test]
fn test_postprocess_is_deterministic() {
    let scale = ScaleParam::from_sizes(200, 160, 200, 160).unwrap();
    for seed in 0..8 {
        let map = random_map(seed, 200, 160);
        let first = postprocess(&map, &scale, &thresholds(0.4)).unwrap();
        let second = postprocess(&map, &scale, &thresholds(0.4)).unwrap();
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }
}

#[test]
fn test_box_score_threshold_is_monotonic() {
    let scale = ScaleParam::from_sizes(200, 160, 200, 160).unwrap();
    for seed in 0..8 {
        let map = random_map(seed, 200, 160);
        let mut previous = postprocess(&map, &scale, &thresholds(0.0)).unwrap().0;

        for step in 1..=10 {
            let current = postprocess(&map, &scale, &thresholds(step as f32 / 10.0))
                .unwrap()
                .0;
            assert!(current.len() <= previous.len());
            for det in &current {
                assert!(
                    previous.contains(det),
                    "seed {}: detection {:?} appeared at threshold {}",
                    seed,
                    det,
                    step as f32 / 10.0
                );
            }
            previous = current;
        }
    }
}

#[test]
fn test_candidate_cap_limits_processing() {
    // 42 x 42 = 1764 qualifying 4x4 blocks, spaced so they stay apart after dilation
    let mut blocks = Vec::new();
    for gy in 0..42 {
        for gx in 0..42 {
            blocks.push((gx * 7 + 1, gy * 7 + 1, 4, 1.0));
        }
    }
    let map = block_map(300, 300, &blocks);
    let scale = ScaleParam::from_sizes(300, 300, 300, 300).unwrap();
    let t = Thresholds {
        box_score_thresh: 0.5,
        box_thresh: 0.5,
        unclip_ratio: 1.8,
        max_candidates: 1000,
    };

    let (detections, stats) = postprocess(&map, &scale, &t).unwrap();
    assert_eq!(stats.contours_found, 1764);
    assert_eq!(stats.contours_processed, 1000);
    assert!(detections.len() <= 1000);
    assert_eq!(detections.len(), stats.accepted);
}

#[test]
fn test_long_side_cutoff() {
    let scale = ScaleParam::from_sizes(40, 40, 40, 40).unwrap();
    let t = Thresholds {
        box_score_thresh: 0.3,
        box_thresh: 0.5,
        unclip_ratio: 1.8,
        max_candidates: 1000,
    };

    // A 2x2 block dilates to 3x3: rectangle long side 2
    let small = block_map(40, 40, &[(10, 10, 2, 1.0)]);
    let (detections, stats) = postprocess(&small, &scale, &t).unwrap();
    assert!(detections.is_empty());
    assert_eq!(stats.too_small, 1);

    // A 4x4 block dilates to 5x5: rectangle long side 4
    let large = block_map(40, 40, &[(10, 10, 4, 1.0)]);
    let (detections, stats) = postprocess(&large, &scale, &t).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(stats.too_small, 0);
}

#[test]
fn test_synthetic_rectangle_scenario() {
    let mut values = vec![0.0f32; 200 * 200];
    for y in 50..=60 {
        for x in 50..=70 {
            values[y * 200 + x] = 0.9;
        }
    }
    let map = ProbabilityMap::from_vec(200, 200, values).unwrap();
    let scale = ScaleParam::new(200, 200, 200, 200, 1.0, 1.0).unwrap();
    let t = Thresholds {
        box_score_thresh: 0.5,
        box_thresh: 0.5,
        unclip_ratio: 1.0,
        max_candidates: 1000,
    };

    let (detections, _) = postprocess(&map, &scale, &t).unwrap();
    assert_eq!(detections.len(), 1);

    let det = &detections[0];
    // Dilation and the inclusive fill dilute the mean below the block value
    assert!(det.score > 0.7 && det.score < 0.91, "score {}", det.score);

    let min_x = det.points.iter().map(|p| p.x).min().unwrap();
    let max_x = det.points.iter().map(|p| p.x).max().unwrap();
    let min_y = det.points.iter().map(|p| p.y).min().unwrap();
    let max_y = det.points.iter().map(|p| p.y).max().unwrap();
    assert!((42..=50).contains(&min_x), "min_x {}", min_x);
    assert!((70..=78).contains(&max_x), "max_x {}", max_x);
    assert!((42..=50).contains(&min_y), "min_y {}", min_y);
    assert!((60..=68).contains(&max_y), "max_y {}", max_y);
}

#[test]
fn test_unclip_never_shrinks() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let cx: f32 = rng.gen_range(20.0..180.0);
        let cy: f32 = rng.gen_range(20.0..180.0);
        let hw: f32 = rng.gen_range(5.0..40.0);
        let hh: f32 = rng.gen_range(4.0..15.0);
        let angle: f32 = rng.gen_range(-1.5..1.5);
        let (s, c) = angle.sin_cos();

        let points: Vec<Point2f> = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
            .iter()
            .map(|&(dx, dy)| Point2f::new(cx + dx * c - dy * s, cy + dx * s + dy * c))
            .collect();
        let rect = min_area_rect(&points);
        let (quad, _) = quad_from_rect(&rect);

        for ratio in [0.05f32, 0.1, 0.5, 1.0, 1.8, 3.0] {
            let expanded = unclip(&quad, ratio).unwrap();
            assert!(
                expanded.area() >= rect.area(),
                "ratio {}: {} < {}",
                ratio,
                expanded.area(),
                rect.area()
            );
        }
    }
}
