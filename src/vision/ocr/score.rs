// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Box scoring: mean probability inside a candidate quad

use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;

use super::geometry::Quad;
use super::prob_map::ProbabilityMap;

/// Mean probability under the filled quad
///
/// The quad's bounding box (floor of the minimum, ceil of the maximum) is
/// clipped to the map. Quad corners are truncated to integers and the
/// quad is filled with its boundary included. Returns 0 when no pixel is
/// covered.
pub fn box_score_fast(map: &ProbabilityMap, quad: &Quad) -> f32 {
    let max_x = map.width() as i32 - 1;
    let max_y = map.height() as i32 - 1;

    let (lo_x, hi_x, lo_y, hi_y) = quad.iter().fold(
        (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
        |(lx, hx, ly, hy), p| (lx.min(p.x), hx.max(p.x), ly.min(p.y), hy.max(p.y)),
    );
    let x0 = (lo_x.floor() as i32).clamp(0, max_x);
    let x1 = (hi_x.ceil() as i32).clamp(0, max_x);
    let y0 = (lo_y.floor() as i32).clamp(0, max_y);
    let y1 = (hi_y.ceil() as i32).clamp(0, max_y);

    let local: [(i32, i32); 4] = quad.map(|p| (p.x as i32 - x0, p.y as i32 - y0));
    let mask = fill_quad((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32, &local);

    let mut sum = 0.0f64;
    let mut count = 0usize;
    for (mx, my, pixel) in mask.enumerate_pixels() {
        if pixel[0] != 0 {
            sum += f64::from(map.get((x0 as u32 + mx) as usize, (y0 as u32 + my) as usize));
            count += 1;
        }
    }

    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}

/// Rasterize a convex quad, boundary included
fn fill_quad(width: u32, height: u32, quad: &[(i32, i32); 4]) -> GrayImage {
    let mut mask = GrayImage::from_fn(width, height, |x, y| {
        if contains(quad, x as i64, y as i64) {
            Luma([255])
        } else {
            Luma([0])
        }
    });

    for i in 0..4 {
        let (ax, ay) = quad[i];
        let (bx, by) = quad[(i + 1) % 4];
        draw_line_segment_mut(
            &mut mask,
            (ax as f32, ay as f32),
            (bx as f32, by as f32),
            Luma([255]),
        );
    }

    mask
}

/// Point-in-convex-polygon test accepting either winding; edges count as inside
fn contains(quad: &[(i32, i32); 4], x: i64, y: i64) -> bool {
    let mut positive = false;
    let mut negative = false;
    for i in 0..4 {
        let (ax, ay) = (i64::from(quad[i].0), i64::from(quad[i].1));
        let (bx, by) = (i64::from(quad[(i + 1) % 4].0), i64::from(quad[(i + 1) % 4].1));
        let cross = (bx - ax) * (y - ay) - (by - ay) * (x - ax);
        if cross > 0 {
            positive = true;
        } else if cross < 0 {
            negative = true;
        }
    }
    !(positive && negative)
}
