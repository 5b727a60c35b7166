//! Groups scanline intersections from a pair of half-scanlines into the
//! 2- and 4-point figures the coverage rasterizer walks.

use crate::error::RasterError;
use crate::outline::{min_t_middle, point_at_t, GlyphOutlines};
use crate::scanline::Intersection;

/// Upper bound on 4-point figures produced for a single half-scanline
/// strip.
pub const MAX_CONNECTIONS: usize = 32;

/// Two intersections on the same scanline and outline, ordered so that
/// `start.x <= end.x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionPair {
    pub start: Intersection,
    pub end: Intersection,
}

impl IntersectionPair {
    fn new(a: Intersection, b: Intersection) -> Self {
        if a.x <= b.x { Self { start: a, end: b } } else { Self { start: b, end: a } }
    }

    fn x_span(&self) -> (f64, f64) {
        (self.start.x, self.end.x)
    }
}

/// A figure describing outline geometry between `y_upper` and `y_lower`.
/// Exactly one of `upper`/`lower` is set for a figure that starts and
/// ends on the same scanline; both are set for a trapezoid spanning the
/// full strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionConnection {
    pub upper: Option<IntersectionPair>,
    pub lower: Option<IntersectionPair>,
    pub invert_coverage: bool,
}

impl IntersectionConnection {
    fn is_four_point(&self) -> bool {
        self.upper.is_some() && self.lower.is_some()
    }

    fn two_point_span(&self) -> Option<(f64, f64)> {
        match (self.upper, self.lower) {
            (Some(p), None) => Some(p.x_span()),
            (None, Some(p)) => Some(p.x_span()),
            _ => None,
        }
    }

    /// The combined x-span of both edges of a 4-point trapezoid.
    fn four_point_span(&self) -> Option<(f64, f64)> {
        let (upper, lower) = (self.upper?, self.lower?);
        let (u_lo, u_hi) = upper.x_span();
        let (l_lo, l_hi) = lower.x_span();
        Some((u_lo.min(l_lo), u_hi.max(l_hi)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Upper,
    Lower,
}

#[derive(Clone, Copy)]
struct Tagged {
    hit: Intersection,
    side: Side,
}

/// Combine the intersection lists of two half-scanlines into ordered
/// [`IntersectionConnection`]s: all 4-point trapezoids first, then all
/// 2-point figures, with hole-carving 2-point figures flagged via
/// `invert_coverage`.
pub fn pair_intersections(
    outlines: &GlyphOutlines,
    y_upper: f64,
    y_lower: f64,
    upper: &[Intersection],
    lower: &[Intersection],
) -> Result<Vec<IntersectionConnection>, RasterError> {
    let mut tagged: Vec<Tagged> = Vec::with_capacity(upper.len() + lower.len());
    tagged.extend(upper.iter().map(|&hit| Tagged { hit, side: Side::Upper }));
    tagged.extend(lower.iter().map(|&hit| Tagged { hit, side: Side::Lower }));

    let max_outline = tagged.iter().map(|t| t.hit.outline_id).max();
    let mut four_point = Vec::new();
    let mut two_point = Vec::new();

    if let Some(max_outline) = max_outline {
        for outline_id in 0..=max_outline {
            let mut group: Vec<Tagged> =
                tagged.iter().copied().filter(|t| t.hit.outline_id == outline_id).collect();
            if group.is_empty() {
                continue;
            }
            group.sort_by(|a, b| a.hit.t.partial_cmp(&b.hit.t).expect("NaN t"));

            let n = group.len();
            if n % 2 != 0 {
                // A well-formed closed outline crosses a strip an even
                // number of times; an odd count means the caller handed
                // us a scanline pair that doesn't bound a closed region.
                continue;
            }

            let outline = outlines.outlines.get(outline_id as usize);
            let verify_midpoint = |a_t: f64, b_t: f64| {
                let Some(outline) = outline else { return };
                let segment_count = outline.segments.len() as f64;
                let mid_t = min_t_middle(a_t, b_t, segment_count);
                let mid_y = point_at_t(outline, mid_t).y;
                let (lo, hi) = if y_upper <= y_lower { (y_upper, y_lower) } else { (y_lower, y_upper) };
                debug_assert!(
                    mid_y >= lo - 1e-6 && mid_y <= hi + 1e-6,
                    "t-connected midpoint fell outside the scanline strip"
                );
            };

            let mut cross_pairs = Vec::new();
            for i in 0..n / 2 {
                let a = group[2 * i];
                let b = group[(2 * i + 1) % n];
                verify_midpoint(a.hit.t, b.hit.t);
                if a.side == b.side {
                    two_point.push(IntersectionConnection {
                        upper: if a.side == Side::Upper { Some(IntersectionPair::new(a.hit, b.hit)) } else { None },
                        lower: if a.side == Side::Lower { Some(IntersectionPair::new(a.hit, b.hit)) } else { None },
                        invert_coverage: false,
                    });
                } else {
                    cross_pairs.push((a, b));
                }
            }

            for chunk in cross_pairs.chunks(2) {
                if chunk.len() < 2 {
                    continue;
                }
                let (h1a, h1b) = chunk[0];
                let (h2a, h2b) = chunk[1];
                let upper_hits: Vec<Intersection> = [h1a, h1b, h2a, h2b]
                    .iter()
                    .filter(|t| t.side == Side::Upper)
                    .map(|t| t.hit)
                    .collect();
                let lower_hits: Vec<Intersection> = [h1a, h1b, h2a, h2b]
                    .iter()
                    .filter(|t| t.side == Side::Lower)
                    .map(|t| t.hit)
                    .collect();
                if upper_hits.len() != 2 || lower_hits.len() != 2 {
                    continue;
                }
                four_point.push(IntersectionConnection {
                    upper: Some(IntersectionPair::new(upper_hits[0], upper_hits[1])),
                    lower: Some(IntersectionPair::new(lower_hits[0], lower_hits[1])),
                    invert_coverage: false,
                });
            }

            if four_point.len() + two_point.len() > MAX_CONNECTIONS {
                return Err(RasterError::ComplexityExceeded);
            }
        }
    }

    mark_nested_trapezoids(&mut four_point);
    mark_holes(&mut two_point, &four_point);

    let mut connections = four_point;
    connections.extend(two_point);
    Ok(connections)
}

/// A 2-point figure whose x-span lies strictly inside a 4-point figure's
/// combined span carves a hole: its coverage contribution gets
/// subtracted rather than added.
fn mark_holes(two_point: &mut [IntersectionConnection], four_point: &[IntersectionConnection]) {
    for hole in two_point.iter_mut() {
        let Some((lo, hi)) = hole.two_point_span() else { continue };
        for outer in four_point {
            if !outer.is_four_point() {
                continue;
            }
            let upper = outer.upper.unwrap().x_span();
            let lower = outer.lower.unwrap().x_span();
            let outer_lo = upper.0.min(lower.0);
            let outer_hi = upper.1.max(lower.1);
            if lo > outer_lo && hi < outer_hi {
                hole.invert_coverage = true;
                break;
            }
        }
    }
}

/// A 4-point trapezoid whose combined x-span lies strictly inside another
/// 4-point trapezoid's combined span is itself a counter (a ring glyph's
/// inner contour has vertical-ish sides, so it crosses both half-scanlines
/// just like the outer contour and never produces a 2-point figure).
/// Invert its coverage the same way `mark_holes` does for 2-point figures.
fn mark_nested_trapezoids(four_point: &mut [IntersectionConnection]) {
    let spans: Vec<Option<(f64, f64)>> =
        four_point.iter().map(|c| c.four_point_span()).collect();
    for i in 0..four_point.len() {
        let Some((lo, hi)) = spans[i] else { continue };
        for (j, outer_span) in spans.iter().enumerate() {
            if i == j {
                continue;
            }
            let Some((outer_lo, outer_hi)) = outer_span else { continue };
            if lo > *outer_lo && hi < *outer_hi {
                four_point[i].invert_coverage = true;
                break;
            }
        }
    }
}
