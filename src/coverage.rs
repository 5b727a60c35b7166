//! Half-scanline coverage accumulation: walks paired intersection
//! figures and turns them into anti-aliased per-pixel coverage.

use crate::error::RasterError;
use crate::outline::{point_at_t, wrap_forward, GlyphOutlines, Outline, Point};
use crate::pairing::{pair_intersections, IntersectionConnection, IntersectionPair};
use crate::scanline::intersect_scanline;

/// A sink for rasterized coverage. `add`/`sub` accumulate; `set`
/// overwrites. [`rasterize`] accumulates into an internal scratch buffer
/// and only calls `set` once per pixel, with the final clamped value —
/// `add`/`sub` are exposed for callers composing multiple glyphs into a
/// shared buffer themselves.
pub trait PixelWriter {
    fn add(&mut self, x: i32, y: i32, coverage: f32);
    fn sub(&mut self, x: i32, y: i32, coverage: f32);
    fn set(&mut self, x: i32, y: i32, coverage: f32);
}

/// A flat in-memory [`PixelWriter`]. This is the minimal reference sink
/// needed to exercise `rasterize_glyph` in tests — not an atlas or
/// texture-packing layer, which stays external per the crate's scope.
#[derive(Debug, Clone)]
pub struct CoverageBuffer {
    width: i32,
    height: i32,
    pixels: Vec<f32>,
}

impl CoverageBuffer {
    pub fn new(width: i32, height: i32) -> Self {
        let len = (width.max(0) as usize) * (height.max(0) as usize);
        Self { width, height, pixels: vec![0.0; len] }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn get(&self, x: i32, y: i32) -> f32 {
        self.index(x, y).map(|i| self.pixels[i]).unwrap_or(0.0)
    }

    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = 0.0);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }
}

impl PixelWriter for CoverageBuffer {
    fn add(&mut self, x: i32, y: i32, coverage: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] += coverage;
        }
    }

    fn sub(&mut self, x: i32, y: i32, coverage: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] -= coverage;
        }
    }

    fn set(&mut self, x: i32, y: i32, coverage: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = coverage;
        }
    }
}

/// `|x1(y2-y3) + x2(y3-y1) + x3(y1-y2)| / 2`.
pub fn triangle_area(p1: Point, p2: Point, p3: Point) -> f64 {
    ((p1.x * (p2.y - p3.y) + p2.x * (p3.y - p1.y) + p3.x * (p1.y - p2.y)) / 2.0).abs()
}

/// Where the segment `inside -> outside` crosses the unit square's
/// boundary: the smallest non-negative `t` along the segment that
/// leaves `[0, 1] x [0, 1]`.
pub fn interpolate_boundary(inside: Point, outside: Point) -> Point {
    let dx = outside.x - inside.x;
    let dy = outside.y - inside.y;
    let mut best_t = 1.0f64;
    for t in boundary_candidates(inside.x, dx).into_iter().chain(boundary_candidates(inside.y, dy)) {
        if t >= 0.0 && t <= best_t {
            best_t = t;
        }
    }
    Point::new(inside.x + dx * best_t, inside.y + dy * best_t)
}

fn boundary_candidates(origin: f64, delta: f64) -> Vec<f64> {
    if delta.abs() < 1e-12 {
        return Vec::new();
    }
    vec![(0.0 - origin) / delta, (1.0 - origin) / delta]
}

/// Weight contributed by each of the two half-scanlines per pixel.
const HALF_SCANLINE_WEIGHT: f64 = 0.5;
/// Samples taken per pixel of arc length while anti-aliasing a
/// trapezoid's slanted edge.
const TRAPEZOID_SAMPLES_PER_PIXEL: usize = 4;
/// Samples taken per pixel of arc length while anti-aliasing a 2-point
/// figure (a contour that enters and exits through a single scanline).
const TWO_POINT_SAMPLES_PER_PIXEL: usize = 3;

/// Rasterize every outline into `writer`, clearing `[bbox_x0, bbox_x1) x
/// [bbox_y0, bbox_y1)` first.
///
/// Accumulation happens into a scratch buffer scoped to the bbox rather
/// than directly into `writer`: overlapping figures on the same pixel (an
/// outer fill and a nested counter sharing a half-scanline row, or two
/// half-scanlines both touching the same row) can otherwise push the raw
/// sum outside `[0, 1]`. The scratch buffer is clamped once per pixel
/// before it is flushed to `writer` via `set`.
pub fn rasterize(
    outlines: &GlyphOutlines,
    bbox_x0: i32,
    bbox_y0: i32,
    bbox_x1: i32,
    bbox_y1: i32,
    writer: &mut dyn PixelWriter,
) -> Result<(), RasterError> {
    let width = (bbox_x1 - bbox_x0).max(0);
    let height = (bbox_y1 - bbox_y0).max(0);
    let mut scratch = ScratchBuffer::new(bbox_x0, bbox_y0, width, height);

    let mut y = bbox_y0 as f64;
    while y < bbox_y1 as f64 {
        let y_upper = y;
        let y_lower = y + HALF_SCANLINE_WEIGHT;
        let upper_hits = intersect_scanline(outlines, y_upper)?;
        let lower_hits = intersect_scanline(outlines, y_lower)?;
        let connections =
            pair_intersections(outlines, y_upper, y_lower, &upper_hits, &lower_hits)?;

        for connection in &connections {
            accumulate_connection(outlines, connection, y_upper, &mut scratch)?;
        }

        y += HALF_SCANLINE_WEIGHT;
    }

    for y in bbox_y0..bbox_y1 {
        for x in bbox_x0..bbox_x1 {
            writer.set(x, y, scratch.get(x, y).clamp(0.0, 1.0));
        }
    }
    Ok(())
}

/// Accumulation sink used internally by [`rasterize`] so the final
/// per-pixel clamp to `[0, 1]` happens exactly once, after every figure
/// has contributed, rather than per emitted triangle/trapezoid slice.
struct ScratchBuffer {
    origin_x: i32,
    origin_y: i32,
    width: i32,
    height: i32,
    pixels: Vec<f32>,
}

impl ScratchBuffer {
    fn new(origin_x: i32, origin_y: i32, width: i32, height: i32) -> Self {
        let len = (width.max(0) as usize) * (height.max(0) as usize);
        Self { origin_x, origin_y, width, height, pixels: vec![0.0; len] }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (lx, ly) = (x - self.origin_x, y - self.origin_y);
        if lx < 0 || ly < 0 || lx >= self.width || ly >= self.height {
            return None;
        }
        Some((ly * self.width + lx) as usize)
    }

    fn get(&self, x: i32, y: i32) -> f32 {
        self.index(x, y).map(|i| self.pixels[i]).unwrap_or(0.0)
    }
}

impl PixelWriter for ScratchBuffer {
    fn add(&mut self, x: i32, y: i32, coverage: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] += coverage;
        }
    }

    fn sub(&mut self, x: i32, y: i32, coverage: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] -= coverage;
        }
    }

    fn set(&mut self, x: i32, y: i32, coverage: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = coverage;
        }
    }
}

fn accumulate_connection(
    outlines: &GlyphOutlines,
    connection: &IntersectionConnection,
    row_top: f64,
    writer: &mut dyn PixelWriter,
) -> Result<(), RasterError> {
    let row_y = row_top.floor() as i32;
    match (connection.upper, connection.lower) {
        (Some(upper), Some(lower)) => {
            accumulate_trapezoid(outlines, upper, lower, row_y, connection.invert_coverage, writer)
        }
        (Some(pair), None) | (None, Some(pair)) => {
            accumulate_two_point(outlines, pair, row_y, connection.invert_coverage, writer)
        }
        (None, None) => Ok(()),
    }
}

/// A 4-point trapezoid: anti-alias its left and right edges, then fill
/// whatever whole pixel columns lie strictly between them at the full
/// half-scanline weight.
fn accumulate_trapezoid(
    outlines: &GlyphOutlines,
    upper: IntersectionPair,
    lower: IntersectionPair,
    row_y: i32,
    invert: bool,
    writer: &mut dyn PixelWriter,
) -> Result<(), RasterError> {
    let outline_id = upper.start.outline_id as usize;
    let Some(outline) = outlines.outlines.get(outline_id) else { return Ok(()) };

    // Left edge: interior lies to the right, so the anchor sits at the
    // pixel's right-hand corner.
    let left_col = walk_edge(
        outline,
        upper.start,
        lower.start,
        TRAPEZOID_SAMPLES_PER_PIXEL,
        true,
        row_y,
        invert,
        writer,
    )?;
    // Right edge: interior lies to the left, anchor at the left corner.
    let right_col = walk_edge(
        outline,
        upper.end,
        lower.end,
        TRAPEZOID_SAMPLES_PER_PIXEL,
        false,
        row_y,
        invert,
        writer,
    )?;

    for x in (left_col + 1)..right_col {
        emit(writer, x, row_y, HALF_SCANLINE_WEIGHT, invert);
    }
    Ok(())
}

/// Walks the outline between `from` and `to` (both on the same trapezoid
/// edge, one above and one below), accumulating anti-aliased coverage
/// into the pixel columns the edge crosses. Returns the rightmost column
/// index touched, so the caller can fill the interior strip correctly.
#[allow(clippy::too_many_arguments)]
fn walk_edge(
    outline: &Outline,
    from: crate::scanline::Intersection,
    to: crate::scanline::Intersection,
    samples_per_pixel: usize,
    anchor_on_right: bool,
    row_y: i32,
    invert: bool,
    writer: &mut dyn PixelWriter,
) -> Result<i32, RasterError> {
    let start = point_at_t(outline, from.t);
    let end = point_at_t(outline, to.t);
    let anchor_x = |c: i32| if anchor_on_right { c as f64 + 1.0 } else { c as f64 };

    walk_and_accumulate(
        outline,
        from.t,
        to.t,
        samples_per_pixel,
        |p| Point::new(anchor_x(p.x.floor() as i32), p.y),
        HALF_SCANLINE_WEIGHT,
        invert,
        row_y,
        writer,
    )?;

    Ok(start.x.floor().max(end.x.floor()) as i32)
}

/// A 2-point figure: the contour enters and exits through a single
/// scanline within this half-scanline band. Walk the short arc between
/// the two intersections, accumulating triangle-area coverage against a
/// fixed anchor at the pixel's right edge, per spec.
fn accumulate_two_point(
    outlines: &GlyphOutlines,
    pair: IntersectionPair,
    row_y: i32,
    invert: bool,
    writer: &mut dyn PixelWriter,
) -> Result<(), RasterError> {
    let outline_id = pair.start.outline_id as usize;
    let Some(outline) = outlines.outlines.get(outline_id) else { return Ok(()) };

    walk_and_accumulate(
        outline,
        pair.start.t,
        pair.end.t,
        TWO_POINT_SAMPLES_PER_PIXEL,
        |p| Point::new(p.x.floor() + 1.0, p.y),
        HALF_SCANLINE_WEIGHT,
        invert,
        row_y,
        writer,
    )
}

/// Shared walk: sample the outline from `t_from` towards `t_to` (the
/// forward, wrapping arc), accumulating `triangle_area(prev, cur,
/// anchor(prev))` per step. When a sample crosses into a new pixel
/// column, [`interpolate_boundary`] locates the crossing, the running
/// total for the column just left is flushed (clamped to `[0, weight]`),
/// and accumulation restarts in the new column.
#[allow(clippy::too_many_arguments)]
fn walk_and_accumulate(
    outline: &Outline,
    t_from: f64,
    t_to: f64,
    samples_per_pixel: usize,
    anchor: impl Fn(Point) -> Point,
    weight: f64,
    invert: bool,
    row_y: i32,
    writer: &mut dyn PixelWriter,
) -> Result<(), RasterError> {
    let segment_count = outline.segments.len() as f64;
    if segment_count == 0.0 {
        return Ok(());
    }
    let forward_to = wrap_forward(t_from, t_to, segment_count);
    let total_delta = forward_to - t_from;
    if total_delta <= 1e-12 {
        return Ok(());
    }

    let steps = ((total_delta.ceil() as usize) * samples_per_pixel).clamp(samples_per_pixel, 512);

    let mut prev = point_at_t(outline, t_from);
    let mut pixel_x = prev.x.floor() as i32;
    let mut accumulated = 0.0f64;

    for i in 1..=steps {
        let t = t_from + total_delta * (i as f64 / steps as f64);
        let cur = point_at_t(outline, t);
        let cur_pixel_x = cur.x.floor() as i32;

        if cur_pixel_x != pixel_x {
            let inside = Point::new(prev.x - pixel_x as f64, prev.y);
            let outside = Point::new(cur.x - pixel_x as f64, cur.y);
            let boundary_local = interpolate_boundary(inside, outside);
            let boundary = Point::new(boundary_local.x + pixel_x as f64, boundary_local.y);

            accumulated += triangle_area(prev, boundary, anchor(prev));
            emit(writer, pixel_x, row_y, accumulated.clamp(0.0, weight), invert);

            pixel_x = cur_pixel_x;
            prev = boundary;
            accumulated = 0.0;
        }

        accumulated += triangle_area(prev, cur, anchor(prev));
        prev = cur;
    }

    emit(writer, pixel_x, row_y, accumulated.clamp(0.0, weight), invert);
    Ok(())
}

fn emit(writer: &mut dyn PixelWriter, x: i32, y: i32, coverage: f64, invert: bool) {
    let coverage = coverage as f32;
    if invert {
        writer.sub(x, y, coverage);
    } else {
        writer.add(x, y, coverage);
    }
}
