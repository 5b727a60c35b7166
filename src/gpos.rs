//! GPOS pair-adjustment (lookup type 2) kerning: the only GPOS feature
//! this crate understands.

use crate::error::ParseError;
use crate::reader::BinaryReader;
use crate::tables::TableRecord;

const DFLT_TAG: &[u8; 4] = b"DFLT";
const LOOKUP_TYPE_PAIR_ADJUSTMENT: u16 = 2;
/// The only value-format pattern this crate accepts: `x_advance` present
/// on the first glyph, nothing on the second.
const VALUE_FORMAT_X_ADVANCE_ONLY: u16 = 0x0004;

/// Look up the signed `x_advance` kerning adjustment between two glyph
/// ids, per the GPOS pair-adjustment lookup (formats 1 and 2).
///
/// Requires a `DFLT` script entry to exist at all (`NoDefaultLang`
/// otherwise); beyond that, feature filtering is skipped and this walks
/// straight to the first lookup of type 2, per spec's documented minimal
/// implementation. Only the first subtable whose coverage includes
/// `left_gid` is consulted — if its value format doesn't match the
/// supported pattern, that's a hard error rather than falling through to
/// another subtable.
pub fn kern_pair_advance(
    data: &[u8],
    gpos: TableRecord,
    left_gid: u16,
    right_gid: u16,
) -> Result<Option<i16>, ParseError> {
    let mut r = BinaryReader::at(data, gpos.offset)?;
    let _major = r.read_u16()?;
    let minor = r.read_u16()?;
    let script_list_off = r.read_u16()? as usize;
    let _feature_list_off = r.read_u16()? as usize;
    let lookup_list_off = r.read_u16()? as usize;
    if minor == 1 {
        let _feature_variations_off = r.read_u32()?;
    }

    require_default_script(data, gpos.offset + script_list_off)?;

    let lookup = match find_pair_adjustment_lookup(data, gpos.offset + lookup_list_off)? {
        Some(lookup) => lookup,
        None => return Ok(None),
    };

    for subtable_off in lookup {
        let mut sr = BinaryReader::at(data, subtable_off)?;
        let pos_format = sr.read_u16()?;
        let coverage_off = sr.read_u16()? as usize;
        let coverage_index = match coverage_index(data, subtable_off + coverage_off, left_gid)? {
            Some(i) => i,
            None => continue,
        };

        return match pos_format {
            1 => pair_adjustment_format1(data, subtable_off, coverage_index, right_gid),
            2 => pair_adjustment_format2(data, subtable_off, left_gid, right_gid),
            _ => Ok(None),
        };
    }

    Ok(None)
}

fn require_default_script(data: &[u8], script_list_off: usize) -> Result<(), ParseError> {
    let mut r = BinaryReader::at(data, script_list_off)?;
    let count = r.read_u16()?;
    for _ in 0..count {
        let tag = r.read_bytes(4)?;
        let _offset = r.read_u16()?;
        if tag == DFLT_TAG {
            return Ok(());
        }
    }
    Err(ParseError::NoDefaultLang)
}

/// Returns the list of absolute subtable offsets for the first lookup of
/// type 2 (pair adjustment) found in the lookup list, or `None` if there
/// is no such lookup.
fn find_pair_adjustment_lookup(
    data: &[u8],
    lookup_list_off: usize,
) -> Result<Option<Vec<usize>>, ParseError> {
    let mut r = BinaryReader::at(data, lookup_list_off)?;
    let lookup_count = r.read_u16()?;
    let mut lookup_offsets = Vec::with_capacity(lookup_count as usize);
    for _ in 0..lookup_count {
        lookup_offsets.push(r.read_u16()? as usize);
    }

    for off in lookup_offsets {
        let lookup_off = lookup_list_off + off;
        let mut lr = BinaryReader::at(data, lookup_off)?;
        let lookup_type = lr.read_u16()?;
        let _lookup_flag = lr.read_u16()?;
        let subtable_count = lr.read_u16()?;
        if lookup_type != LOOKUP_TYPE_PAIR_ADJUSTMENT {
            continue;
        }
        let mut subtables = Vec::with_capacity(subtable_count as usize);
        for _ in 0..subtable_count {
            let sub_off = lr.read_u16()? as usize;
            subtables.push(lookup_off + sub_off);
        }
        return Ok(Some(subtables));
    }
    Ok(None)
}

fn pair_adjustment_format1(
    data: &[u8],
    subtable_off: usize,
    coverage_index: u16,
    right_gid: u16,
) -> Result<Option<i16>, ParseError> {
    let mut r = BinaryReader::at(data, subtable_off + 4)?; // skip format + coverage offset
    let value_format_1 = r.read_u16()?;
    let value_format_2 = r.read_u16()?;
    if value_format_1 != VALUE_FORMAT_X_ADVANCE_ONLY || value_format_2 != 0 {
        return Err(ParseError::UnsupportedValueFormat);
    }
    let pair_set_count = r.read_u16()?;
    if coverage_index >= pair_set_count {
        return Ok(None);
    }
    let mut offsets_r = BinaryReader::at(data, r.position())?;
    offsets_r.skip(coverage_index as usize * 2)?;
    let pair_set_off = offsets_r.read_u16()? as usize;

    let mut pr = BinaryReader::at(data, subtable_off + pair_set_off)?;
    let pair_value_count = pr.read_u16()?;
    for _ in 0..pair_value_count {
        let second_glyph = pr.read_u16()?;
        let x_advance = pr.read_i16()?;
        if second_glyph == right_gid {
            return Ok(if x_advance != 0 { Some(x_advance) } else { None });
        }
    }
    Ok(None)
}

fn pair_adjustment_format2(
    data: &[u8],
    subtable_off: usize,
    left_gid: u16,
    right_gid: u16,
) -> Result<Option<i16>, ParseError> {
    let mut r = BinaryReader::at(data, subtable_off + 4)?; // skip format + coverage offset
    let value_format_1 = r.read_u16()?;
    let value_format_2 = r.read_u16()?;
    if value_format_1 != VALUE_FORMAT_X_ADVANCE_ONLY || value_format_2 != 0 {
        return Err(ParseError::UnsupportedValueFormat);
    }
    let class_def1_off = r.read_u16()? as usize;
    let class_def2_off = r.read_u16()? as usize;
    let class_count_1 = r.read_u16()?;
    let class_count_2 = r.read_u16()?;

    let class_1 = class_of(data, subtable_off + class_def1_off, left_gid)?;
    let class_2 = class_of(data, subtable_off + class_def2_off, right_gid)?;
    if class_1 >= class_count_1 || class_2 >= class_count_2 {
        return Err(ParseError::InvalidGlyphIndex);
    }

    let matrix_base = r.position();
    let index = class_1 as usize * class_count_2 as usize + class_2 as usize;
    let x_advance = BinaryReader::at(data, matrix_base + index * 2)?.read_i16()?;
    Ok(if x_advance != 0 { Some(x_advance) } else { None })
}

/// Walk every pair-value record of the first pair-adjustment lookup's
/// format-1 subtables and return `(left_gid, right_gid, x_advance)` for
/// every non-zero entry. Format-2 (class-based) subtables are skipped: a
/// class matrix has no per-glyph-pair enumeration without also walking
/// every covered glyph through `class_of`, which the batch extractor
/// leaves as a documented limitation (see `Font::all_kern_pairs`).
pub fn all_pair_adjustments(data: &[u8], gpos: TableRecord) -> Result<Vec<(u16, u16, i16)>, ParseError> {
    let mut r = BinaryReader::at(data, gpos.offset)?;
    let _major = r.read_u16()?;
    let minor = r.read_u16()?;
    let script_list_off = r.read_u16()? as usize;
    let _feature_list_off = r.read_u16()? as usize;
    let lookup_list_off = r.read_u16()? as usize;
    if minor == 1 {
        let _feature_variations_off = r.read_u32()?;
    }

    require_default_script(data, gpos.offset + script_list_off)?;

    let Some(lookup) = find_pair_adjustment_lookup(data, gpos.offset + lookup_list_off)? else {
        return Ok(Vec::new());
    };

    let mut pairs = Vec::new();
    for subtable_off in lookup {
        let mut sr = BinaryReader::at(data, subtable_off)?;
        let pos_format = sr.read_u16()?;
        let coverage_off = sr.read_u16()? as usize;
        if pos_format != 1 {
            continue;
        }
        let covered = coverage_glyphs(data, subtable_off + coverage_off)?;

        let mut vr = BinaryReader::at(data, subtable_off + 4)?;
        let value_format_1 = vr.read_u16()?;
        let value_format_2 = vr.read_u16()?;
        if value_format_1 != VALUE_FORMAT_X_ADVANCE_ONLY || value_format_2 != 0 {
            return Err(ParseError::UnsupportedValueFormat);
        }
        let pair_set_count = vr.read_u16()?;
        let offsets_base = vr.position();

        for index in 0..pair_set_count {
            let Some(&left_gid) = covered.get(index as usize) else { continue };
            let mut or = BinaryReader::at(data, offsets_base)?;
            or.skip(index as usize * 2)?;
            let pair_set_off = or.read_u16()? as usize;

            let mut pr = BinaryReader::at(data, subtable_off + pair_set_off)?;
            let pair_value_count = pr.read_u16()?;
            for _ in 0..pair_value_count {
                let right_gid = pr.read_u16()?;
                let x_advance = pr.read_i16()?;
                if x_advance != 0 {
                    pairs.push((left_gid, right_gid, x_advance));
                }
            }
        }
    }
    Ok(pairs)
}

/// The full list of covered glyph ids, in coverage-index order (formats 1
/// and 2).
fn coverage_glyphs(data: &[u8], coverage_off: usize) -> Result<Vec<u16>, ParseError> {
    let mut r = BinaryReader::at(data, coverage_off)?;
    let format = r.read_u16()?;
    match format {
        1 => {
            let glyph_count = r.read_u16()?;
            let mut glyphs = Vec::with_capacity(glyph_count as usize);
            for _ in 0..glyph_count {
                glyphs.push(r.read_u16()?);
            }
            Ok(glyphs)
        }
        2 => {
            let range_count = r.read_u16()?;
            let mut glyphs = Vec::new();
            for _ in 0..range_count {
                let start = r.read_u16()?;
                let end = r.read_u16()?;
                let _start_coverage_index = r.read_u16()?;
                let mut g = start;
                while g <= end {
                    glyphs.push(g);
                    g += 1;
                }
            }
            Ok(glyphs)
        }
        _ => Ok(Vec::new()),
    }
}

/// Locate `glyph`'s index within a coverage table (formats 1 and 2).
fn coverage_index(data: &[u8], coverage_off: usize, glyph: u16) -> Result<Option<u16>, ParseError> {
    let mut r = BinaryReader::at(data, coverage_off)?;
    let format = r.read_u16()?;
    match format {
        1 => {
            let glyph_count = r.read_u16()?;
            for i in 0..glyph_count {
                if r.read_u16()? == glyph {
                    return Ok(Some(i));
                }
            }
            Ok(None)
        }
        2 => {
            let range_count = r.read_u16()?;
            for _ in 0..range_count {
                let start = r.read_u16()?;
                let end = r.read_u16()?;
                let start_coverage_index = r.read_u16()?;
                if glyph >= start && glyph <= end {
                    let index = start_coverage_index as u32 + (glyph - start) as u32;
                    if index > u16::MAX as u32 {
                        return Err(ParseError::InvalidGlyphIndex);
                    }
                    return Ok(Some(index as u16));
                }
            }
            Ok(None)
        }
        _ => Ok(None),
    }
}

/// Look up `glyph`'s class within a class-definition table (formats 1
/// and 2). Glyphs outside any declared range are class 0, per spec.
fn class_of(data: &[u8], class_def_off: usize, glyph: u16) -> Result<u16, ParseError> {
    let mut r = BinaryReader::at(data, class_def_off)?;
    let format = r.read_u16()?;
    match format {
        1 => {
            let start_glyph = r.read_u16()?;
            let glyph_count = r.read_u16()?;
            if glyph < start_glyph || glyph >= start_glyph + glyph_count {
                return Ok(0);
            }
            let mut cr = BinaryReader::at(data, r.position())?;
            cr.skip((glyph - start_glyph) as usize * 2)?;
            cr.read_u16()
        }
        2 => {
            let range_count = r.read_u16()?;
            for _ in 0..range_count {
                let start = r.read_u16()?;
                let end = r.read_u16()?;
                let class = r.read_u16()?;
                if glyph >= start && glyph <= end {
                    return Ok(class);
                }
            }
            Ok(0)
        }
        _ => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal GPOS table with one DFLT script, one lookup of
    /// type 2, and a single format-1 pair-adjustment subtable covering
    /// glyph `left` with one pair record `(right, advance)`.
    ///
    /// Sections are built independently and concatenated, with every
    /// offset field computed from the actual length of the sections that
    /// precede it — no offset is hand-predicted.
    fn build_gpos_format1(left: u16, right: u16, advance: i16) -> Vec<u8> {
        // Coverage table (format 1): one glyph.
        let mut coverage = Vec::new();
        coverage.extend_from_slice(&1u16.to_be_bytes()); // format
        coverage.extend_from_slice(&1u16.to_be_bytes()); // glyphCount
        coverage.extend_from_slice(&left.to_be_bytes());

        // PairSet: one pair value record.
        let mut pair_set = Vec::new();
        pair_set.extend_from_slice(&1u16.to_be_bytes()); // pairValueCount
        pair_set.extend_from_slice(&right.to_be_bytes());
        pair_set.extend_from_slice(&advance.to_be_bytes());

        // Subtable (format 1): fixed header, then pairSet, then coverage.
        let pair_set_header_len = 2 + 2 + 2 + 2 + 2 + 2; // format..pairSetOffsets[0]
        let coverage_off = (pair_set_header_len + pair_set.len()) as u16;
        let mut subtable = Vec::new();
        subtable.extend_from_slice(&1u16.to_be_bytes()); // posFormat
        subtable.extend_from_slice(&coverage_off.to_be_bytes());
        subtable.extend_from_slice(&VALUE_FORMAT_X_ADVANCE_ONLY.to_be_bytes());
        subtable.extend_from_slice(&0u16.to_be_bytes()); // valueFormat2
        subtable.extend_from_slice(&1u16.to_be_bytes()); // pairSetCount
        subtable.extend_from_slice(&(pair_set_header_len as u16).to_be_bytes()); // pairSetOffsets[0]
        subtable.extend_from_slice(&pair_set);
        subtable.extend_from_slice(&coverage);
        assert_eq!(subtable.len(), coverage_off as usize + coverage.len());

        // Lookup table: type 2, one subtable.
        let lookup_header_len = 2 + 2 + 2 + 2; // type, flag, subTableCount, offsets[0]
        let mut lookup = Vec::new();
        lookup.extend_from_slice(&LOOKUP_TYPE_PAIR_ADJUSTMENT.to_be_bytes());
        lookup.extend_from_slice(&0u16.to_be_bytes()); // lookupFlag
        lookup.extend_from_slice(&1u16.to_be_bytes()); // subTableCount
        lookup.extend_from_slice(&(lookup_header_len as u16).to_be_bytes());
        lookup.extend_from_slice(&subtable);

        // LookupList: one lookup.
        let lookup_list_header_len = 2 + 2; // lookupCount, offsets[0]
        let mut lookup_list = Vec::new();
        lookup_list.extend_from_slice(&1u16.to_be_bytes()); // lookupCount
        lookup_list.extend_from_slice(&(lookup_list_header_len as u16).to_be_bytes());
        lookup_list.extend_from_slice(&lookup);

        // ScriptList: one DFLT entry (script table itself is never read).
        let mut script_list = Vec::new();
        script_list.extend_from_slice(&1u16.to_be_bytes()); // scriptCount
        script_list.extend_from_slice(DFLT_TAG);
        script_list.extend_from_slice(&0u16.to_be_bytes()); // script offset (unused)

        // Header: major, minor, scriptListOffset, featureListOffset, lookupListOffset.
        let header_len = 2 + 2 + 2 + 2 + 2;
        let script_list_off = header_len as u16;
        let lookup_list_off = (header_len + script_list.len()) as u16;
        let mut gpos = Vec::new();
        gpos.extend_from_slice(&1u16.to_be_bytes());
        gpos.extend_from_slice(&0u16.to_be_bytes());
        gpos.extend_from_slice(&script_list_off.to_be_bytes());
        gpos.extend_from_slice(&0u16.to_be_bytes()); // featureListOffset (unused)
        gpos.extend_from_slice(&lookup_list_off.to_be_bytes());
        gpos.extend_from_slice(&script_list);
        gpos.extend_from_slice(&lookup_list);

        gpos
    }

    #[test]
    fn finds_pair_adjustment_format1() {
        let data = build_gpos_format1(5, 9, -80);
        let record = TableRecord { offset: 0, length: data.len() };
        let result = kern_pair_advance(&data, record, 5, 9).unwrap();
        assert_eq!(result, Some(-80));
    }

    #[test]
    fn unrelated_pair_returns_none() {
        let data = build_gpos_format1(5, 9, -80);
        let record = TableRecord { offset: 0, length: data.len() };
        let result = kern_pair_advance(&data, record, 5, 5).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn zero_advance_reports_as_none() {
        let data = build_gpos_format1(5, 9, 0);
        let record = TableRecord { offset: 0, length: data.len() };
        let result = kern_pair_advance(&data, record, 5, 9).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn all_pair_adjustments_reports_format1_entries() {
        let data = build_gpos_format1(5, 9, -80);
        let record = TableRecord { offset: 0, length: data.len() };
        let pairs = all_pair_adjustments(&data, record).unwrap();
        assert_eq!(pairs, vec![(5, 9, -80)]);
    }

    #[test]
    fn missing_default_script_is_an_error() {
        let mut gpos = Vec::new();
        gpos.extend_from_slice(&1u16.to_be_bytes());
        gpos.extend_from_slice(&0u16.to_be_bytes());
        gpos.extend_from_slice(&6u16.to_be_bytes()); // scriptListOffset
        gpos.extend_from_slice(&0u16.to_be_bytes());
        gpos.extend_from_slice(&0u16.to_be_bytes());
        gpos.extend_from_slice(&0u16.to_be_bytes()); // scriptCount = 0 (no DFLT)
        let record = TableRecord { offset: 0, length: gpos.len() };
        assert_eq!(kern_pair_advance(&gpos, record, 1, 2), Err(ParseError::NoDefaultLang));
    }
}
