// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Rectangle fitting and corner ordering tests

use fabstir_text_detector::vision::ocr::geometry::{
    min_area_rect, order_corners, quad_from_rect, Point2f, RotatedRect, Size2f,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Whether `p` lies inside `rect`, with a tolerance in pixels
fn rect_contains(rect: &RotatedRect, p: Point2f, tolerance: f32) -> bool {
    let theta = rect.angle.to_radians();
    let (s, c) = theta.sin_cos();
    let dx = p.x - rect.center.x;
    let dy = p.y - rect.center.y;
    let u = dx * c + dy * s;
    let v = -dx * s + dy * c;
    u.abs() <= rect.size.width / 2.0 + tolerance && v.abs() <= rect.size.height / 2.0 + tolerance
}

#[test]
fn test_min_area_rect_encloses_random_clouds() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        let count = rng.gen_range(3..40);
        let points: Vec<Point2f> = (0..count)
            .map(|_| Point2f::new(rng.gen_range(0.0..200.0), rng.gen_range(0.0..100.0)))
            .collect();

        let rect = min_area_rect(&points);
        for p in &points {
            assert!(rect_contains(&rect, *p, 1e-2), "{:?} outside {:?}", p, rect);
        }

        // Never worse than the axis-aligned box
        let (lo_x, hi_x, lo_y, hi_y) = points.iter().fold(
            (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
            |(a, b, c, d), p| (a.min(p.x), b.max(p.x), c.min(p.y), d.max(p.y)),
        );
        assert!(rect.area() <= (hi_x - lo_x) * (hi_y - lo_y) + 1e-2);
    }
}

#[test]
fn test_quad_corners_lie_on_rect() {
    let rect = RotatedRect {
        center: Point2f::new(50.0, 40.0),
        size: Size2f {
            width: 30.0,
            height: 10.0,
        },
        angle: 20.0,
    };
    let (quad, long_side) = quad_from_rect(&rect);
    assert_eq!(long_side, 30.0);

    // Opposite corners are symmetric about the center
    let mid = Point2f::new((quad[0].x + quad[2].x) / 2.0, (quad[0].y + quad[2].y) / 2.0);
    assert!((mid.x - 50.0).abs() < 1e-3 && (mid.y - 40.0).abs() < 1e-3);

    // Adjacent sides have the rectangle's lengths
    let side = |a: Point2f, b: Point2f| ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
    let mut sides = [side(quad[0], quad[1]), side(quad[1], quad[2])];
    sides.sort_by(|a, b| a.total_cmp(b));
    assert!((sides[0] - 10.0).abs() < 1e-3);
    assert!((sides[1] - 30.0).abs() < 1e-3);
}

#[test]
fn test_order_corners_is_input_order_independent_for_distinct_points() {
    let corners = [
        Point2f::new(10.0, 12.0),
        Point2f::new(40.0, 4.0),
        Point2f::new(44.0, 20.0),
        Point2f::new(14.0, 28.0),
    ];
    let expected = order_corners(corners);
    assert_eq!(expected[0], Point2f::new(10.0, 12.0));
    assert_eq!(expected[1], Point2f::new(40.0, 4.0));
    assert_eq!(expected[2], Point2f::new(44.0, 20.0));
    assert_eq!(expected[3], Point2f::new(14.0, 28.0));

    let permutations = [[3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];
    for perm in permutations {
        let shuffled = perm.map(|i| corners[i]);
        assert_eq!(order_corners(shuffled), expected);
    }
}

#[test]
fn test_fit_of_rotated_rectangle_points() {
    // Dense samples along the border of a rectangle rotated by 30 degrees
    let (s, c) = 30f32.to_radians().sin_cos();
    let mut points = Vec::new();
    for i in 0..=40 {
        let t = i as f32 / 40.0;
        for (dx, dy) in [
            (-20.0 + 40.0 * t, -6.0),
            (-20.0 + 40.0 * t, 6.0),
            (-20.0, -6.0 + 12.0 * t),
            (20.0, -6.0 + 12.0 * t),
        ] {
            points.push(Point2f::new(100.0 + dx * c - dy * s, 80.0 + dx * s + dy * c));
        }
    }

    let rect = min_area_rect(&points);
    assert!((rect.area() - 480.0).abs() < 0.5, "area {}", rect.area());
    assert!((rect.long_side() - 40.0).abs() < 0.05);
    assert!((rect.center.x - 100.0).abs() < 1e-2);
    assert!((rect.center.y - 80.0).abs() < 1e-2);
}
