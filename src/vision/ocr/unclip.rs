// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Unclip: outward expansion of a candidate quad
//!
//! DB models predict shrunk text kernels. The quad is grown back by
//! `area * ratio / perimeter` and refit to a rotated rectangle.

use geo::{Area, Coord, EuclideanLength, LineString, Polygon};
use geo_clipper::{Clipper, EndType, JoinType};

use super::geometry::{min_area_rect, Point2f, Quad, RotatedRect};

/// Arc tolerance for round joins
const ROUND_JOIN_TOLERANCE: f64 = 0.25;

/// Fixed-point scale the clipper works at; 1/1000 px resolution
const OFFSET_SCALE: f64 = 1000.0;

/// Expanded rectangles with both sides below this are discarded
pub const MIN_UNCLIP_SIDE: f32 = 1.001;

/// Offset distance for a quad: `area * ratio / perimeter`
///
/// `None` for quads without a perimeter.
pub fn unclip_distance(quad: &Quad, unclip_ratio: f32) -> Option<f64> {
    let polygon = quad_polygon(quad);

    let perimeter = polygon.exterior().euclidean_length();
    if perimeter <= f64::EPSILON {
        return None;
    }
    Some(polygon.unsigned_area() * f64::from(unclip_ratio) / perimeter)
}

fn quad_polygon(quad: &Quad) -> Polygon<f64> {
    Polygon::new(
        LineString::from(
            quad.iter()
                .map(|p| Coord {
                    x: f64::from(p.x),
                    y: f64::from(p.y),
                })
                .collect::<Vec<_>>(),
        ),
        vec![],
    )
}

/// Grow a quad outward and fit the minimum-area rectangle of the result
///
/// The offset runs on the float quad with round joins, so the result always
/// contains the input; the vertices of every polygon it produces are fitted
/// together. Returns `None` when the offset yields no polygon.
pub fn unclip(quad: &Quad, unclip_ratio: f32) -> Option<RotatedRect> {
    let distance = unclip_distance(quad, unclip_ratio)?;

    let polygon = quad_polygon(quad);

    let expanded = polygon.offset(
        distance,
        JoinType::Round(ROUND_JOIN_TOLERANCE),
        EndType::ClosedPolygon,
        OFFSET_SCALE,
    );

    let points: Vec<Point2f> = expanded
        .0
        .iter()
        .flat_map(|polygon| {
            // Rings repeat their first coordinate at the end
            let coords = &polygon.exterior().0;
            let open = coords.len().saturating_sub(1);
            coords[..open]
                .iter()
                .map(|c| Point2f::new(c.x as f32, c.y as f32))
        })
        .collect();

    if points.is_empty() {
        return None;
    }
    Some(min_area_rect(&points))
}

/// Whether an expanded rectangle is too small on both sides to keep
pub fn is_degenerate(rect: &RotatedRect) -> bool {
    rect.size.width < MIN_UNCLIP_SIDE && rect.size.height < MIN_UNCLIP_SIDE
}
