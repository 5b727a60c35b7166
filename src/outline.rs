//! Converts decoded glyph vertices into scaled, Y-flipped outline segments
//! ready for scanline intersection.

use crate::glyf::{Vertex, VertexKind};

/// A point in scaled, Y-down pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// One piece of an outline: a line or a quadratic Bezier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlineSegment {
    Line { from: Point, to: Point },
    Quadratic { from: Point, control: Point, to: Point },
}

impl OutlineSegment {
    /// `from` endpoint, shared by both variants.
    pub fn from(&self) -> Point {
        match *self {
            OutlineSegment::Line { from, .. } => from,
            OutlineSegment::Quadratic { from, .. } => from,
        }
    }

    /// `to` endpoint, shared by both variants.
    pub fn to(&self) -> Point {
        match *self {
            OutlineSegment::Line { to, .. } => to,
            OutlineSegment::Quadratic { to, .. } => to,
        }
    }

    /// The `(lower, upper)` bound of `y` swept out by this segment.
    ///
    /// For a quadratic, accounts for the curve's extremum at
    /// `t = (y0 - yc) / (y0 - 2*yc + y1)` when that `t` falls in `[0, 1]`.
    pub fn y_range(&self) -> (f64, f64) {
        match *self {
            OutlineSegment::Line { from, to } => {
                if from.y <= to.y { (from.y, to.y) } else { (to.y, from.y) }
            }
            OutlineSegment::Quadratic { from, control, to } => {
                let mut lower = from.y.min(to.y);
                let mut upper = from.y.max(to.y);
                let denom = from.y - 2.0 * control.y + to.y;
                if denom.abs() > 1e-12 {
                    let t = (from.y - control.y) / denom;
                    if (0.0..=1.0).contains(&t) {
                        let y_t = quad_eval(from.y, control.y, to.y, t);
                        lower = lower.min(y_t);
                        upper = upper.max(y_t);
                    }
                }
                (lower, upper)
            }
        }
    }

    /// The `t`-step corresponding to roughly one pixel of arc length,
    /// clamped to at most 1.0 (the whole segment).
    pub fn t_per_pixel(&self) -> f64 {
        match *self {
            OutlineSegment::Line { from, to } => {
                let len = from.distance(to);
                if len <= 0.0 { 1.0 } else { (1.0 / len).min(1.0) }
            }
            OutlineSegment::Quadratic { from, control, to } => {
                const SAMPLES: usize = 10;
                let mut length = 0.0;
                let mut prev = from;
                for i in 1..=SAMPLES {
                    let t = i as f64 / SAMPLES as f64;
                    let x = quad_eval(from.x, control.x, to.x, t);
                    let y = quad_eval(from.y, control.y, to.y, t);
                    let cur = Point::new(x, y);
                    length += prev.distance(cur);
                    prev = cur;
                }
                if length <= 0.0 { 1.0 } else { (1.0 / length).min(1.0) }
            }
        }
    }
}

#[inline]
pub(crate) fn quad_eval(p0: f64, p1: f64, p2: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * p0 + 2.0 * u * t * p1 + t * t * p2
}

/// Advance `b` forward past `a` on a cyclic domain of length `modulus`
/// (adding `modulus` once if `b < a`), so that walking from `a` to the
/// result always moves in the increasing-`t` direction around a closed
/// outline.
#[inline]
pub(crate) fn wrap_forward(a: f64, b: f64, modulus: f64) -> f64 {
    if b < a { b + modulus } else { b }
}

/// The midpoint, in global outline-`t` space, between `a` and `b`,
/// always taken by walking forward from `a` (wrapping past `modulus` if
/// needed), then folded back into `[0, modulus)`.
///
/// Used both to sanity-check that two candidate intersections are
/// genuinely "t-connected" (their midpoint actually lies on the short
/// arc between them) and, in the coverage rasterizer, as the step
/// primitive for walking an outline from `t_left` towards `t_right`.
pub(crate) fn min_t_middle(a: f64, b: f64, modulus: f64) -> f64 {
    let forward_b = wrap_forward(a, b, modulus);
    ((a + forward_b) / 2.0) % modulus
}

/// Evaluate the point on `outline` at global parameter `t` (wrapped into
/// `[0, segment_count)`), where `floor(t)` selects the segment and
/// `t - floor(t)` is the in-segment parameter.
pub(crate) fn point_at_t(outline: &Outline, t: f64) -> Point {
    let segment_count = outline.segments.len() as f64;
    let wrapped = t.rem_euclid(segment_count);
    let index = wrapped.floor() as usize;
    let index = index.min(outline.segments.len() - 1);
    let local_t = wrapped - index as f64;
    let segment = &outline.segments[index];
    match *segment {
        OutlineSegment::Line { from, to } => {
            Point::new(from.x + (to.x - from.x) * local_t, from.y + (to.y - from.y) * local_t)
        }
        OutlineSegment::Quadratic { from, control, to } => Point::new(
            quad_eval(from.x, control.x, to.x, local_t),
            quad_eval(from.y, control.y, to.y, local_t),
        ),
    }
}

/// A closed contour: an ordered list of segments plus the union of their
/// `y_range`s.
#[derive(Debug, Clone)]
pub struct Outline {
    pub segments: Vec<OutlineSegment>,
    pub y_range: (f64, f64),
}

/// A glyph's outlines plus its bounding box in the same scaled pixel
/// space, with the image origin at the top-left.
#[derive(Debug, Clone)]
pub struct GlyphOutlines {
    pub outlines: Vec<Outline>,
}

/// Build scaled, Y-flipped outlines from a glyph's decoded contours.
///
/// `scale` converts FUnits to pixels; `glyph_height` is the glyph's
/// FUnit-space height (`y_max - y_min`) scaled into pixels, used to flip
/// the Y axis so that image row 0 is the top of the glyph.
pub fn build_outlines(contours: &[Vec<Vertex>], scale: f64, glyph_height: f64) -> GlyphOutlines {
    let to_point = |x: f64, y: f64| Point::new(x * scale, glyph_height - y * scale);

    let mut outlines = Vec::with_capacity(contours.len());
    for contour in contours {
        let mut segments = Vec::with_capacity(contour.len());
        let mut cursor = match contour.first() {
            Some(v) => to_point(v.x, v.y),
            None => continue,
        };
        for vertex in &contour[1..] {
            let to = to_point(vertex.x, vertex.y);
            let segment = match vertex.kind {
                VertexKind::Move => {
                    cursor = to;
                    continue;
                }
                VertexKind::Line => OutlineSegment::Line { from: cursor, to },
                VertexKind::Curve { cx, cy } => OutlineSegment::Quadratic {
                    from: cursor,
                    control: to_point(cx, cy),
                    to,
                },
            };
            segments.push(segment);
            cursor = to;
        }

        if segments.is_empty() {
            continue;
        }
        let mut lower = f64::INFINITY;
        let mut upper = f64::NEG_INFINITY;
        for segment in &segments {
            let (lo, hi) = segment.y_range();
            lower = lower.min(lo);
            upper = upper.max(hi);
        }
        outlines.push(Outline { segments, y_range: (lower, upper) });
    }

    GlyphOutlines { outlines }
}
