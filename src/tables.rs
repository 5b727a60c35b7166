//! The sfnt table directory: tag -> (offset, length) for the tables this
//! crate cares about.

use crate::error::ParseError;
use crate::reader::BinaryReader;

/// Byte range of one table within the font buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub offset: usize,
    pub length: usize,
}

/// Directory of the tables this crate decodes, plus whatever scalar
/// bookkeeping the directory header itself carries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableIndex {
    pub cmap: Option<TableRecord>,
    pub loca: Option<TableRecord>,
    pub head: Option<TableRecord>,
    pub glyf: Option<TableRecord>,
    pub hhea: Option<TableRecord>,
    pub hmtx: Option<TableRecord>,
    pub kern: Option<TableRecord>,
    pub gpos: Option<TableRecord>,
    pub maxp: Option<TableRecord>,
    pub name: Option<TableRecord>,
    pub os2: Option<TableRecord>,
}

/// Parse the sfnt header and table directory out of `data`.
///
/// Tag matching is case-sensitive ASCII, per the OpenType spec. Missing
/// `OS/2` or `hmtx` is fatal; missing `loca` is fatal only when `glyf` is
/// present (CFF-only fonts, which this crate does not otherwise support,
/// would have neither).
pub fn parse_table_index(data: &[u8]) -> Result<TableIndex, ParseError> {
    let mut r = BinaryReader::new(data);

    let _scaler_type = r.read_u32()?;
    let num_tables = r.read_u16()?;
    let _search_range = r.read_u16()?;
    let _entry_selector = r.read_u16()?;
    let _range_shift = r.read_u16()?;

    let mut index = TableIndex::default();
    for _ in 0..num_tables {
        let tag = r.read_bytes(4)?;
        let _checksum = r.read_u32()?;
        let offset = r.read_u32()? as usize;
        let length = r.read_u32()? as usize;

        if offset.checked_add(length).map(|end| end > data.len()).unwrap_or(true) {
            return Err(ParseError::TruncatedInput);
        }
        let record = TableRecord { offset, length };

        match tag {
            b"cmap" => index.cmap = Some(record),
            b"loca" => index.loca = Some(record),
            b"head" => index.head = Some(record),
            b"glyf" => index.glyf = Some(record),
            b"hhea" => index.hhea = Some(record),
            b"hmtx" => index.hmtx = Some(record),
            b"kern" => index.kern = Some(record),
            b"GPOS" => index.gpos = Some(record),
            b"maxp" => index.maxp = Some(record),
            b"name" => index.name = Some(record),
            b"OS/2" => index.os2 = Some(record),
            _ => {}
        }
    }

    if index.os2.is_none() {
        return Err(ParseError::MissingRequiredTable("OS/2"));
    }
    if index.hmtx.is_none() {
        return Err(ParseError::MissingRequiredTable("hmtx"));
    }
    if index.glyf.is_some() && index.loca.is_none() {
        return Err(ParseError::MissingRequiredTable("loca"));
    }

    Ok(index)
}
