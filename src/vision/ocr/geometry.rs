// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Rotated rectangle fitting for text candidates
//!
//! - Convex hull (Andrew's monotone chain)
//! - Minimum-area enclosing rectangle (rotating calipers over the hull)
//! - Rectangle corners and their canonical ordering
//!
//! Rectangles follow the OpenCV `RotatedRect` convention: `size.width`
//! runs along the `angle` direction, `size.height` along its normal.

use serde::{Deserialize, Serialize};

/// A point with float coordinates in model-input space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size2f {
    pub width: f32,
    pub height: f32,
}

/// Rectangle at arbitrary orientation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point2f,
    pub size: Size2f,
    /// Rotation in degrees
    pub angle: f32,
}

impl RotatedRect {
    pub fn area(&self) -> f32 {
        self.size.width * self.size.height
    }

    pub fn long_side(&self) -> f32 {
        self.size.width.max(self.size.height)
    }

    /// The four corners, in the same order as OpenCV `boxPoints`
    pub fn corners(&self) -> [Point2f; 4] {
        let theta = f64::from(self.angle).to_radians();
        let b = theta.cos() * 0.5;
        let a = theta.sin() * 0.5;
        let (cx, cy) = (f64::from(self.center.x), f64::from(self.center.y));
        let (w, h) = (f64::from(self.size.width), f64::from(self.size.height));

        let p0 = (cx - a * h - b * w, cy + b * h - a * w);
        let p1 = (cx + a * h - b * w, cy - b * h - a * w);
        let p2 = (2.0 * cx - p0.0, 2.0 * cy - p0.1);
        let p3 = (2.0 * cx - p1.0, 2.0 * cy - p1.1);

        [p0, p1, p2, p3].map(|(x, y)| Point2f::new(x as f32, y as f32))
    }
}

/// Four corners in canonical order
pub type Quad = [Point2f; 4];

/// Order rectangle corners the way downstream consumers expect
///
/// Corners are stably sorted by x. The left pair yields the first and last
/// corner (smaller y first, ties go to the second sorted point), the right
/// pair yields the second and third corner (smaller y first, ties go to the
/// fourth sorted point).
pub fn order_corners(corners: [Point2f; 4]) -> Quad {
    let mut sorted = corners;
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

    let (index1, index4) = if sorted[1].y > sorted[0].y { (0, 1) } else { (1, 0) };
    let (index2, index3) = if sorted[3].y > sorted[2].y { (2, 3) } else { (3, 2) };

    [sorted[index1], sorted[index2], sorted[index3], sorted[index4]]
}

/// Canonical quad of a rectangle together with its long side
pub fn quad_from_rect(rect: &RotatedRect) -> (Quad, f32) {
    (order_corners(rect.corners()), rect.long_side())
}

/// Minimum-area rectangle enclosing a point set
///
/// Degenerate inputs produce zero-sized rectangles: nothing for an empty
/// set, the point itself for a single point, and a segment for collinear
/// points.
pub fn min_area_rect(points: &[Point2f]) -> RotatedRect {
    let pts: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (f64::from(p.x), f64::from(p.y)))
        .collect();

    match pts.len() {
        0 => return RotatedRect::default(),
        1 => {
            return RotatedRect {
                center: points[0],
                ..RotatedRect::default()
            }
        }
        _ => {}
    }

    let hull = convex_hull(&pts);
    match hull.len() {
        1 => RotatedRect {
            center: points[0],
            ..RotatedRect::default()
        },
        2 => segment_rect(hull[0], hull[1]),
        _ => rotating_calipers(&hull),
    }
}

/// Convex hull in counter-clockwise order without collinear points
fn convex_hull(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));
    pts.dedup();

    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<(f64, f64)> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(f64, f64)> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[inline]
fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn segment_rect(a: (f64, f64), b: (f64, f64)) -> RotatedRect {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    RotatedRect {
        center: Point2f::new(((a.0 + b.0) / 2.0) as f32, ((a.1 + b.1) / 2.0) as f32),
        size: Size2f {
            width: dx.hypot(dy) as f32,
            height: 0.0,
        },
        angle: dy.atan2(dx).to_degrees() as f32,
    }
}

fn rotating_calipers(hull: &[(f64, f64)]) -> RotatedRect {
    let n = hull.len();
    let mut best_area = f64::MAX;
    let mut best = RotatedRect::default();

    for i in 0..n {
        let p1 = hull[i];
        let p2 = hull[(i + 1) % n];
        let (ex, ey) = (p2.0 - p1.0, p2.1 - p1.1);
        let len = ex.hypot(ey);
        if len < 1e-12 {
            continue;
        }

        // Edge direction and its normal
        let (ux, uy) = (ex / len, ey / len);
        let (vx, vy) = (-uy, ux);

        let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
        let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
        for &(px, py) in hull {
            let (dx, dy) = (px - p1.0, py - p1.1);
            let u = dx * ux + dy * uy;
            let v = dx * vx + dy * vy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let width = max_u - min_u;
        let height = max_v - min_v;
        let area = width * height;
        if area < best_area {
            best_area = area;
            let cu = (min_u + max_u) / 2.0;
            let cv = (min_v + max_v) / 2.0;
            best = RotatedRect {
                center: Point2f::new(
                    (p1.0 + cu * ux + cv * vx) as f32,
                    (p1.1 + cu * uy + cv * vy) as f32,
                ),
                size: Size2f {
                    width: width as f32,
                    height: height as f32,
                },
                angle: uy.atan2(ux).to_degrees() as f32,
            };
        }
    }

    best
}
