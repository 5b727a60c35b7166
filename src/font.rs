//! Ties the table directory, cmap, glyf, GPOS, outline, and coverage
//! pieces together into the public [`Font`] API.

use crate::cmap::CmapDecoder;
use crate::coverage::{self, PixelWriter};
use crate::error::ParseError;
use crate::glyf::{decode_simple_glyph, GlyphLocator};
use crate::gpos;
use crate::outline::build_outlines;
use crate::reader::BinaryReader;
use crate::tables::{parse_table_index, TableIndex, TableRecord};

/// A glyph's bounding box in FUnits, pre-scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphBoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

/// One `hmtx` entry: advance width and left side bearing, in FUnits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HorizontalMetric {
    pub advance_width: u16,
    pub left_side_bearing: i16,
}

/// A signed FUnit kerning adjustment between two codepoints, as returned
/// by [`Font::all_kern_pairs`].
///
/// `left_cp`/`right_cp` are glyph ids cast to `u32`, not Unicode
/// codepoints: the GPOS pair-adjustment tables this walks are keyed by
/// glyph id, and reversing that to a codepoint would require inverting
/// the font's cmap, which this crate does not build. Callers that need
/// codepoints must maintain their own glyph-id-to-codepoint map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernPair {
    pub left_cp: u32,
    pub right_cp: u32,
    pub advance_x: i16,
}

/// A parsed TTF/OTF font. Borrows the source byte slice for its lifetime
/// and is immutable after construction; see the crate-level docs for the
/// concurrency model this implies.
pub struct Font<'a> {
    data: &'a [u8],
    tables: TableIndex,
    cmap: CmapDecoder,
    locator: GlyphLocator,
    glyph_count: u16,
    units_per_em: u16,
    horizontal_metric_count: u16,
    ascender: i16,
    descender: i16,
    line_gap: i16,
    space_advance: u16,
}

impl<'a> Font<'a> {
    /// `units_per_em` from `head`.
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// The number of glyphs declared in `maxp`.
    pub fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    /// Typographic ascender in FUnits, from `hhea`.
    pub fn ascender(&self) -> i16 {
        self.ascender
    }

    /// Typographic descender in FUnits (normally negative), from `hhea`.
    pub fn descender(&self) -> i16 {
        self.descender
    }

    /// Line gap in FUnits, from `hhea`.
    pub fn line_gap(&self) -> i16 {
        self.line_gap
    }

    /// The space character's (`U+0020`) horizontal advance in FUnits, 0 if
    /// the font's cmap has no mapping for it.
    pub fn space_advance(&self) -> u16 {
        self.space_advance
    }

    /// Map a Unicode codepoint to a glyph index, or 0 (the missing glyph)
    /// if the font has no mapping for it.
    pub fn glyph_index(&self, codepoint: u32) -> u32 {
        self.cmap.glyph_index(self.data, codepoint).unwrap_or(0)
    }

    /// The glyph's bounding box in FUnits, pre-scale.
    pub fn glyph_bounding_box(&self, glyph_index: u32) -> Result<GlyphBoundingBox, ParseError> {
        let range = self.locator.glyph_range(self.data, glyph_index)?;
        let (header, _contours) = decode_simple_glyph(self.data, range)?;
        Ok(GlyphBoundingBox {
            x_min: header.x_min,
            y_min: header.y_min,
            x_max: header.x_max,
            y_max: header.y_max,
        })
    }

    fn horizontal_metric(&self, glyph_index: u32) -> Result<HorizontalMetric, ParseError> {
        if glyph_index >= self.glyph_count as u32 {
            return Err(ParseError::InvalidGlyphIndex);
        }
        let hmtx = self.tables.hmtx.ok_or(ParseError::MissingRequiredTable("hmtx"))?;
        horizontal_metric_at(self.data, hmtx, self.horizontal_metric_count, glyph_index)
    }

    /// Horizontal advance in FUnits. Invalid glyph indices report 0
    /// rather than erroring, matching the infallible surface spec.md's
    /// external interface specifies for this operation.
    pub fn advance_x(&self, glyph_index: u32) -> u16 {
        self.horizontal_metric(glyph_index).map(|m| m.advance_width).unwrap_or(0)
    }

    /// Left side bearing in FUnits. See [`Font::advance_x`] for the
    /// invalid-index behaviour.
    pub fn left_side_bearing(&self, glyph_index: u32) -> i16 {
        self.horizontal_metric(glyph_index).map(|m| m.left_side_bearing).unwrap_or(0)
    }

    /// Signed `x_advance` kerning adjustment between two codepoints, via
    /// GPOS pair adjustment (lookup type 2, formats 1 and 2). Returns
    /// `Ok(None)` when the font has no `GPOS` table at all, or when GPOS
    /// is present but has no entry for this pair.
    pub fn kern_pair_advance(&self, left_cp: u32, right_cp: u32) -> Result<Option<i16>, ParseError> {
        let Some(gpos) = self.tables.gpos else { return Ok(None) };
        let left_gid = self.glyph_index(left_cp) as u16;
        let right_gid = self.glyph_index(right_cp) as u16;
        gpos::kern_pair_advance(self.data, gpos, left_gid, right_gid)
    }

    /// Every non-zero kerning pair the font's first GPOS pair-adjustment
    /// lookup declares, as glyph-id pairs (see [`KernPair`]'s docs on why
    /// these are glyph ids rather than codepoints). Returns an empty
    /// vector when there is no `GPOS` table.
    pub fn all_kern_pairs(&self) -> Vec<KernPair> {
        let Some(gpos) = self.tables.gpos else { return Vec::new() };
        gpos::all_pair_adjustments(self.data, gpos)
            .unwrap_or_default()
            .into_iter()
            .map(|(left, right, advance_x)| KernPair {
                left_cp: left as u32,
                right_cp: right as u32,
                advance_x,
            })
            .collect()
    }

    /// Pixels-per-FUnit scale that makes the font's ascender-to-descender
    /// span equal `desired_px` pixels.
    pub fn scale_for_pixel_height(&self, desired_px: f32) -> f32 {
        desired_px / (self.ascender as f32 - self.descender as f32)
    }

    /// Pixels-per-FUnit scale for a given point size and output device
    /// resolution (pixels per inch), at 72 points to the inch.
    pub fn funit_to_pixel_scale(&self, point_size: f32, ppi: f32) -> f32 {
        (point_size * ppi) / (72.0 * self.units_per_em as f32)
    }

    /// The pixel-space width and height `rasterize_glyph` would need to
    /// cover this codepoint's glyph at `scale`.
    pub fn required_dimensions(&self, codepoint: u32, scale: f32) -> Result<(i32, i32), ParseError> {
        let glyph_index = self.glyph_index(codepoint);
        let bbox = self.glyph_bounding_box(glyph_index)?;
        let scale = scale as f64;
        let width = (bbox.x_max as f64 * scale).ceil() - (bbox.x_min as f64 * scale).floor();
        let height = (bbox.y_max as f64 * scale).ceil() - (bbox.y_min as f64 * scale).floor();
        Ok((width as i32, height as i32))
    }

    /// Rasterize `codepoint`'s glyph at `scale` (FUnits-to-pixels) into
    /// `writer`, clearing its bounding box first. Errors (including
    /// `GlyphHasNoOutline` for glyphs like space) surface to the caller
    /// uncaught, per spec: the rasterizer never swallows a parse error,
    /// it returns early and leaves the skip-or-not decision to the
    /// caller.
    pub fn rasterize_glyph(
        &self,
        scale: f32,
        codepoint: u32,
        writer: &mut dyn PixelWriter,
    ) -> Result<(), ParseError> {
        let glyph_index = self.glyph_index(codepoint);
        let range = self.locator.glyph_range(self.data, glyph_index)?;
        let (header, contours) = decode_simple_glyph(self.data, range)?;

        let scale = scale as f64;
        let glyph_height = (header.y_max - header.y_min) as f64 * scale;
        let outlines = build_outlines(&contours, scale, glyph_height);

        let bbox_x0 = (header.x_min as f64 * scale).floor() as i32;
        let bbox_x1 = (header.x_max as f64 * scale).ceil() as i32;
        let bbox_y0 = 0i32;
        let bbox_y1 = glyph_height.ceil() as i32;

        coverage::rasterize(&outlines, bbox_x0, bbox_y0, bbox_x1, bbox_y1, writer)?;
        Ok(())
    }
}

/// Read one `hmtx` entry for `glyph_index`, clamping to the last explicit
/// record (and continuing into the trailing lsb-only array) for glyphs at
/// or beyond `metric_count`, per spec.md's hmtx lookup rule.
fn horizontal_metric_at(
    data: &[u8],
    hmtx: TableRecord,
    metric_count: u16,
    glyph_index: u32,
) -> Result<HorizontalMetric, ParseError> {
    let metric_count = metric_count as u32;
    if glyph_index < metric_count {
        let off = hmtx.offset + glyph_index as usize * 4;
        let mut r = BinaryReader::at(data, off)?;
        let advance_width = r.read_u16()?;
        let left_side_bearing = r.read_i16()?;
        Ok(HorizontalMetric { advance_width, left_side_bearing })
    } else {
        // Beyond the last explicit entry: the advance width clamps to the
        // last metric record, per spec; left side bearings carry on in a
        // trailing lsb-only array (standard `hmtx` layout).
        let last_off = hmtx.offset + (metric_count as usize - 1) * 4;
        let advance_width = BinaryReader::at(data, last_off)?.read_u16()?;
        let lsb_index = glyph_index - metric_count;
        let lsb_off = hmtx.offset + metric_count as usize * 4 + lsb_index as usize * 2;
        let left_side_bearing = BinaryReader::at(data, lsb_off)?.read_i16()?;
        Ok(HorizontalMetric { advance_width, left_side_bearing })
    }
}

/// Parse a TTF/OTF byte buffer's table directory and the scalar fields
/// of `head`/`hhea`/`maxp`/`cmap`, returning a `Font` that borrows
/// `data` for its lifetime.
///
/// Required tables: `cmap` (Unicode format 4), `head`, `hhea`, `hmtx`,
/// `maxp`, `OS/2`, and either `glyf`+`loca` or a fatal error — CFF-only
/// fonts are out of scope and reported as a missing `glyf` table.
pub fn parse(data: &[u8]) -> Result<Font<'_>, ParseError> {
    let tables = parse_table_index(data)?;

    let glyf = tables.glyf.ok_or(ParseError::MissingRequiredTable("glyf"))?;
    let loca = tables.loca.ok_or(ParseError::MissingRequiredTable("loca"))?;
    let head = tables.head.ok_or(ParseError::MissingRequiredTable("head"))?;
    let hhea = tables.hhea.ok_or(ParseError::MissingRequiredTable("hhea"))?;
    let maxp = tables.maxp.ok_or(ParseError::MissingRequiredTable("maxp"))?;
    let cmap = tables.cmap.ok_or(ParseError::MissingRequiredTable("cmap"))?;

    let units_per_em = BinaryReader::at(data, head.offset + 18)?.read_u16()?;
    let index_to_loc_format = BinaryReader::at(data, head.offset + 50)?.read_i16()? as u8;

    let ascender = BinaryReader::at(data, hhea.offset + 4)?.read_i16()?;
    let descender = BinaryReader::at(data, hhea.offset + 6)?.read_i16()?;
    let line_gap = BinaryReader::at(data, hhea.offset + 8)?.read_i16()?;
    let horizontal_metric_count = BinaryReader::at(data, hhea.offset + 34)?.read_u16()?;
    if horizontal_metric_count == 0 {
        return Err(ParseError::MissingRequiredTable("hmtx"));
    }

    let glyph_count = BinaryReader::at(data, maxp.offset + 4)?.read_u16()?;

    let cmap = CmapDecoder::new(data, cmap)?;
    let locator = GlyphLocator::new(loca, glyf, index_to_loc_format, glyph_count);

    let space_gid = cmap.glyph_index(data, ' ' as u32).unwrap_or(0);
    let space_advance = if space_gid == 0 || space_gid >= glyph_count as u32 {
        0
    } else {
        let hmtx = tables.hmtx.ok_or(ParseError::MissingRequiredTable("hmtx"))?;
        horizontal_metric_at(data, hmtx, horizontal_metric_count, space_gid)
            .map(|m| m.advance_width)
            .unwrap_or(0)
    };

    Ok(Font {
        data,
        tables,
        cmap,
        locator,
        glyph_count,
        units_per_em,
        horizontal_metric_count,
        ascender,
        descender,
        line_gap,
        space_advance,
    })
}
