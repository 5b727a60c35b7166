//! Per-scanline crossing computation: where a horizontal line at `y`
//! crosses each segment of each outline.

use crate::error::RasterError;
use crate::outline::{quad_eval, GlyphOutlines, OutlineSegment};

/// Upper bound on intersections returned for a single scanline. Exceeding
/// it means the glyph is pathologically complex for this rasterizer;
/// see [`RasterError::ComplexityExceeded`].
pub const MAX_INTERSECTIONS_PER_SCANLINE: usize = 64;

/// x-values closer together than this are treated as the same crossing
/// (a scanline grazing a vertex reports it once, not twice).
const DEDUP_EPSILON: f64 = 1e-3;

/// A single scanline crossing. `t` is in the outline's global parameter
/// space: `floor(t)` is the segment index, `t - floor(t)` the in-segment
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub outline_id: u32,
    pub x: f64,
    pub t: f64,
}

/// Computes every crossing of horizontal line `y` with `outlines`, sorted
/// ascending by `x`, deduplicated, and asserted to have even count.
pub fn intersect_scanline(
    outlines: &GlyphOutlines,
    y: f64,
) -> Result<Vec<Intersection>, RasterError> {
    let mut hits = Vec::new();

    for (outline_id, outline) in outlines.outlines.iter().enumerate() {
        let (lower, upper) = outline.y_range;
        if y < lower || y > upper {
            continue;
        }
        for (segment_index, segment) in outline.segments.iter().enumerate() {
            for t in segment_roots(segment, y) {
                let x = segment_x_at(segment, t);
                push_bounded(
                    &mut hits,
                    Intersection { outline_id: outline_id as u32, x, t: segment_index as f64 + t },
                )?;
            }
        }
    }

    hits.sort_by(|a, b| a.x.partial_cmp(&b.x).expect("NaN x in intersection list"));
    dedup_by_x(&mut hits);

    debug_assert_eq!(hits.len() % 2, 0, "scanline produced an odd number of crossings");
    Ok(hits)
}

fn push_bounded(hits: &mut Vec<Intersection>, hit: Intersection) -> Result<(), RasterError> {
    if hits.len() >= MAX_INTERSECTIONS_PER_SCANLINE {
        return Err(RasterError::ComplexityExceeded);
    }
    hits.push(hit);
    Ok(())
}

/// Roots `t ∈ [0, 1]` of `segment`'s y-coordinate equalling `y`.
fn segment_roots(segment: &OutlineSegment, y: f64) -> Vec<f64> {
    match *segment {
        OutlineSegment::Line { from, to } => {
            let (lo, hi) = segment.y_range();
            if y < lo || y > hi || (from.y - to.y).abs() < 1e-12 {
                return Vec::new();
            }
            let t = (y - from.y) / (to.y - from.y);
            if (0.0..=1.0).contains(&t) { vec![t] } else { Vec::new() }
        }
        OutlineSegment::Quadratic { from, control, to } => {
            let (a, b, c) = (from.y, control.y, to.y);
            let denom = a - 2.0 * b + c;
            let mut roots = Vec::new();
            if denom.abs() < 1e-12 {
                if (c - a).abs() > 1e-12 {
                    let t = (y - a) / (c - a);
                    if (0.0..=1.0).contains(&t) {
                        roots.push(t);
                    }
                }
                return roots;
            }
            let b_coeff = 2.0 * b - 2.0 * a;
            let c_coeff = a - y;
            let discriminant = b_coeff * b_coeff - 4.0 * denom * c_coeff;
            if discriminant < 0.0 {
                return roots;
            }
            let sqrt_d = discriminant.sqrt();
            let t1 = (-b_coeff + sqrt_d) / (2.0 * denom);
            let t2 = (-b_coeff - sqrt_d) / (2.0 * denom);
            for t in [t1, t2] {
                if (0.0..=1.0).contains(&t) {
                    roots.push(t);
                }
            }
            roots
        }
    }
}

fn segment_x_at(segment: &OutlineSegment, t: f64) -> f64 {
    match *segment {
        OutlineSegment::Line { from, to } => from.x + (to.x - from.x) * t,
        OutlineSegment::Quadratic { from, control, to } => quad_eval(from.x, control.x, to.x, t),
    }
}

fn dedup_by_x(hits: &mut Vec<Intersection>) {
    let mut i = 1;
    while i < hits.len() {
        if (hits[i].x - hits[i - 1].x).abs() < DEDUP_EPSILON {
            hits.remove(i);
        } else {
            i += 1;
        }
    }
}
