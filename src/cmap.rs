//! Format-4 Unicode `cmap` subtable decoding: `codepoint -> glyph index`.

use crate::error::ParseError;
use crate::reader::BinaryReader;
use crate::tables::TableRecord;

const PLATFORM_UNICODE: u16 = 0;

/// A decoded reference to the `cmap` subtable this crate will query.
///
/// Only the subtable's absolute byte offset is retained; the format-4
/// arrays are re-read on every lookup rather than copied out, keeping
/// `Font` allocation-free.
#[derive(Debug, Clone, Copy)]
pub struct CmapDecoder {
    subtable_offset: usize,
}

impl CmapDecoder {
    /// Locate the first Unicode-platform subtable in `cmap` and verify it
    /// is format 4.
    pub fn new(data: &[u8], cmap: TableRecord) -> Result<Self, ParseError> {
        let mut r = BinaryReader::at(data, cmap.offset)?;
        let _version = r.read_u16()?;
        let num_subtables = r.read_u16()?;

        let mut chosen = None;
        for _ in 0..num_subtables {
            let platform_id = r.read_u16()?;
            let _encoding_id = r.read_u16()?;
            let offset = r.read_u32()? as usize;
            if chosen.is_none() && platform_id == PLATFORM_UNICODE {
                chosen = Some(cmap.offset.checked_add(offset).ok_or(ParseError::TruncatedInput)?);
            }
        }

        let subtable_offset = chosen.ok_or(ParseError::UnsupportedCmapFormat)?;
        let format = BinaryReader::at(data, subtable_offset)?.read_u16()?;
        if format != 4 {
            return Err(ParseError::UnsupportedCmapFormat);
        }

        Ok(Self { subtable_offset })
    }

    /// Map a Unicode codepoint to a glyph index, returning 0 (the missing
    /// glyph) when the font has no mapping for it.
    pub fn glyph_index(&self, data: &[u8], codepoint: u32) -> Result<u32, ParseError> {
        if codepoint > 0xFFFF {
            return Ok(0);
        }
        let codepoint = codepoint as u16;

        let mut r = BinaryReader::at(data, self.subtable_offset)?;
        let _format = r.read_u16()?;
        let _length = r.read_u16()?;
        let _language = r.read_u16()?;
        let seg_count_x2 = r.read_u16()?;
        let segcount = (seg_count_x2 / 2) as usize;
        let _search_range = r.read_u16()?;
        let _entry_selector = r.read_u16()?;
        let _range_shift = r.read_u16()?;

        let end_codes_off = r.position();
        let start_codes_off = end_codes_off + segcount * 2 + 2; // +2 for reservedPad
        let id_deltas_off = start_codes_off + segcount * 2;
        let id_range_offsets_off = id_deltas_off + segcount * 2;

        // Binary search endCode[] for the first segment whose endCode >= codepoint.
        let mut lo = 0usize;
        let mut hi = segcount;
        let mut segment = None;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let end_code = r.u16_at(end_codes_off + mid * 2)?;
            if end_code >= codepoint {
                segment = Some(mid);
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        let segment = match segment {
            Some(s) => s,
            None => return Ok(0),
        };

        let start_code = r.u16_at(start_codes_off + segment * 2)?;
        if codepoint < start_code {
            return Ok(0);
        }

        let id_delta = r.u16_at(id_deltas_off + segment * 2)? as i16;
        let id_range_offset = r.u16_at(id_range_offsets_off + segment * 2)?;

        if id_range_offset == 0 {
            return Ok((codepoint as i32 + id_delta as i32).rem_euclid(65536) as u32);
        }

        let glyph_array_addr = id_range_offsets_off
            + segment * 2
            + id_range_offset as usize
            + (codepoint - start_code) as usize * 2;
        let glyph_id = r.u16_at(glyph_array_addr)?;
        if glyph_id == 0 {
            return Ok(0);
        }
        Ok((glyph_id as i32 + id_delta as i32).rem_euclid(65536) as u32)
    }
}
