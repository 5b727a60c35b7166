//! Glyph location (`loca`) and simple-glyph contour decoding (`glyf`).

use crate::error::ParseError;
use crate::reader::BinaryReader;
use crate::tables::TableRecord;

const ON_CURVE_POINT: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

/// Translates a glyph index into a byte range within `glyf`.
#[derive(Debug, Clone, Copy)]
pub struct GlyphLocator {
    loca: TableRecord,
    glyf: TableRecord,
    index_to_loc_format: u8,
    glyph_count: u16,
}

impl GlyphLocator {
    pub fn new(
        loca: TableRecord,
        glyf: TableRecord,
        index_to_loc_format: u8,
        glyph_count: u16,
    ) -> Self {
        Self { loca, glyf, index_to_loc_format, glyph_count }
    }

    fn loca_entry(&self, data: &[u8], index: u32) -> Result<u32, ParseError> {
        if self.index_to_loc_format == 0 {
            let off = self.loca.offset + index as usize * 2;
            Ok(BinaryReader::at(data, off)?.read_u16()? as u32 * 2)
        } else {
            let off = self.loca.offset + index as usize * 4;
            BinaryReader::at(data, off)?.read_u32()
        }
    }

    /// Return the absolute byte offset and length of `glyph_index`'s entry
    /// in `glyf`. Fails with `GlyphHasNoOutline` for empty glyphs (e.g.
    /// space) and `InvalidGlyphIndex` when out of range.
    pub fn glyph_range(&self, data: &[u8], glyph_index: u32) -> Result<TableRecord, ParseError> {
        if glyph_index >= self.glyph_count as u32 {
            return Err(ParseError::InvalidGlyphIndex);
        }
        let start = self.loca_entry(data, glyph_index)?;
        let end = self.loca_entry(data, glyph_index + 1)?;
        if start == end {
            return Err(ParseError::GlyphHasNoOutline);
        }
        if end as usize > self.glyf.length {
            return Err(ParseError::TruncatedInput);
        }
        Ok(TableRecord {
            offset: self.glyf.offset + start as usize,
            length: (end - start) as usize,
        })
    }
}

/// A point's role within a contour's vertex stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexKind {
    Move,
    Line,
    /// A quadratic curve to `(x, y)` with control point `(cx, cy)`.
    Curve { cx: f64, cy: f64 },
}

/// One vertex of a decoded contour, in FUnit coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub kind: VertexKind,
    pub x: f64,
    pub y: f64,
}

/// Header fields of a simple glyph: bounding box in FUnits and contour
/// count (always non-negative; composite glyphs are rejected by the
/// caller before this type is constructed).
#[derive(Debug, Clone, Copy)]
pub struct GlyphHeader {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

/// Decode a simple glyph's contours into per-contour vertex lists.
///
/// Fails with `CompositeUnsupported` when the contour count is negative
/// (a composite glyph), which is explicitly out of scope.
pub fn decode_simple_glyph(
    data: &[u8],
    range: TableRecord,
) -> Result<(GlyphHeader, Vec<Vec<Vertex>>), ParseError> {
    let mut r = BinaryReader::at(data, range.offset)?;

    let contour_count = r.read_i16()?;
    if contour_count < 0 {
        return Err(ParseError::CompositeUnsupported);
    }
    let contour_count = contour_count as usize;

    let x_min = r.read_i16()? as i32;
    let y_min = r.read_i16()? as i32;
    let x_max = r.read_i16()? as i32;
    let y_max = r.read_i16()? as i32;
    let header = GlyphHeader { x_min, y_min, x_max, y_max };

    if contour_count == 0 {
        return Ok((header, Vec::new()));
    }

    let mut end_pts = Vec::with_capacity(contour_count);
    for _ in 0..contour_count {
        end_pts.push(r.read_u16()? as usize);
    }
    let point_count = end_pts[contour_count - 1] + 1;

    let instruction_length = r.read_u16()? as usize;
    r.skip(instruction_length)?;

    // Flags, honouring the REPEAT bit.
    let mut flags = Vec::with_capacity(point_count);
    while flags.len() < point_count {
        let flag = r.read_u8()?;
        flags.push(flag);
        if flag & REPEAT != 0 {
            let repeat_count = r.read_u8()?;
            for _ in 0..repeat_count {
                if flags.len() >= point_count {
                    break;
                }
                flags.push(flag);
            }
        }
    }

    // X stream.
    let mut xs = Vec::with_capacity(point_count);
    let mut x = 0i32;
    for &flag in &flags {
        if flag & X_SHORT != 0 {
            let delta = r.read_u8()? as i32;
            x += if flag & X_SAME_OR_POSITIVE != 0 { delta } else { -delta };
        } else if flag & X_SAME_OR_POSITIVE == 0 {
            x += r.read_i16()? as i32;
        }
        // else: X_SHORT unset and X_SAME_OR_POSITIVE set -> delta is 0.
        xs.push(x);
    }

    // Y stream.
    let mut ys = Vec::with_capacity(point_count);
    let mut y = 0i32;
    for &flag in &flags {
        if flag & Y_SHORT != 0 {
            let delta = r.read_u8()? as i32;
            y += if flag & Y_SAME_OR_POSITIVE != 0 { delta } else { -delta };
        } else if flag & Y_SAME_OR_POSITIVE == 0 {
            y += r.read_i16()? as i32;
        }
        ys.push(y);
    }

    let mut contours = Vec::with_capacity(contour_count);
    let mut point_start = 0usize;
    for &end in &end_pts {
        let contour_flags = &flags[point_start..=end];
        let contour_xs = &xs[point_start..=end];
        let contour_ys = &ys[point_start..=end];
        contours.push(build_contour(contour_flags, contour_xs, contour_ys));
        point_start = end + 1;
    }

    Ok((header, contours))
}

/// Reconstruct a closed contour's vertex stream from its raw on/off-curve
/// points, synthesizing implicit on-curve midpoints between consecutive
/// off-curve points.
fn build_contour(flags: &[u8], xs: &[i32], ys: &[i32]) -> Vec<Vertex> {
    let n = flags.len();
    if n == 0 {
        return Vec::new();
    }
    let on_curve = |i: usize| flags[i] & ON_CURVE_POINT != 0;
    let point = |i: usize| (xs[i] as f64, ys[i] as f64);
    let midpoint = |a: (f64, f64), b: (f64, f64)| ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);

    // Find a starting on-curve point, synthesizing one if the contour
    // begins and ends off-curve. `walk` lists the indices still to be
    // consumed in order, after the start point has been fixed.
    let (start_point, walk): (_, Vec<usize>) = if on_curve(0) {
        (point(0), (1..n).collect())
    } else if on_curve(n - 1) {
        (point(n - 1), (0..n - 1).collect())
    } else {
        (midpoint(point(n - 1), point(0)), (0..n).collect())
    };

    let mut vertices = Vec::with_capacity(n + 2);
    vertices.push(Vertex { kind: VertexKind::Move, x: start_point.0, y: start_point.1 });

    let mut pending_off: Option<(f64, f64)> = None;
    for idx in walk {
        let p = point(idx);
        if on_curve(idx) {
            if let Some(ctrl) = pending_off.take() {
                vertices.push(Vertex { kind: VertexKind::Curve { cx: ctrl.0, cy: ctrl.1 }, x: p.0, y: p.1 });
            } else {
                vertices.push(Vertex { kind: VertexKind::Line, x: p.0, y: p.1 });
            }
        } else if let Some(ctrl) = pending_off.take() {
            let mid = midpoint(ctrl, p);
            vertices.push(Vertex { kind: VertexKind::Curve { cx: ctrl.0, cy: ctrl.1 }, x: mid.0, y: mid.1 });
            pending_off = Some(p);
        } else {
            pending_off = Some(p);
        }
    }

    // Close back to the start point.
    if let Some(ctrl) = pending_off.take() {
        vertices.push(Vertex { kind: VertexKind::Curve { cx: ctrl.0, cy: ctrl.1 }, x: start_point.0, y: start_point.1 });
    } else {
        vertices.push(Vertex { kind: VertexKind::Line, x: start_point.0, y: start_point.1 });
    }

    vertices
}
