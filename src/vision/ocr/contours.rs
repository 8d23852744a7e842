// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Boundary tracing on the binary mask

use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::point::Point;

/// Boundaries found on a mask
#[derive(Debug, Clone, Default)]
pub struct ContourSet {
    /// Simplified boundaries in discovery (raster) order, capped
    pub contours: Vec<Vec<Point<u32>>>,
    /// Boundaries present before the cap
    pub total_found: usize,
}

/// Trace every boundary on the mask as one flat list
///
/// Outer and hole borders are both kept, in the order the raster scan meets
/// them, with no nesting. Only the first `max_candidates` boundaries are
/// kept; each is simplified with [`simplify_chain`].
pub fn extract_contours(mask: &GrayImage, max_candidates: usize) -> ContourSet {
    let borders = find_contours::<u32>(mask);

    let total_found = borders.len();
    let contours = borders
        .into_iter()
        .take(max_candidates)
        .map(|c| simplify_chain(&c.points))
        .collect();

    ContourSet {
        contours,
        total_found,
    }
}

/// Compress a closed pixel chain to its turning points
///
/// Repeated consecutive points are merged, then every point whose incoming
/// and outgoing steps point the same way is dropped. The chain is treated as
/// cyclic.
pub fn simplify_chain(points: &[Point<u32>]) -> Vec<Point<u32>> {
    let mut chain = points.to_vec();
    chain.dedup();
    while chain.len() > 1 && chain.first() == chain.last() {
        chain.pop();
    }

    let n = chain.len();
    if n < 3 {
        return chain;
    }

    let step = |from: Point<u32>, to: Point<u32>| {
        (
            i64::from(to.x) - i64::from(from.x),
            i64::from(to.y) - i64::from(from.y),
        )
    };

    (0..n)
        .filter(|&i| {
            let prev = chain[(i + n - 1) % n];
            let next = chain[(i + 1) % n];
            step(prev, chain[i]) != step(chain[i], next)
        })
        .map(|i| chain[i])
        .collect()
}
