//! End-to-end test against a hand-built synthetic TTF: parse, look up a
//! glyph by codepoint, read its metrics and bounding box, apply GPOS
//! kerning, and rasterize it into a coverage buffer — the same sequence
//! a consumer crate (a text-layout engine, an atlas packer) would drive.

use ttf_raster::{parse, CoverageBuffer, ParseError};

const UNITS_PER_EM: u16 = 1000;

fn be16(v: u16) -> [u8; 2] {
    v.to_be_bytes()
}

fn be16i(v: i16) -> [u8; 2] {
    v.to_be_bytes()
}

/// A square glyph ("A") and a square-ring glyph ("o": an outer square
/// with a smaller square counter cut out of its middle), plus a GPOS
/// pair-adjustment kerning entry between them, packed into a complete
/// sfnt byte buffer.
fn build_font() -> Vec<u8> {
    // -- glyf --
    // Glyph 1 ("A"): a single 1000x1000 FUnit square, full coverage.
    let mut glyph_a = Vec::new();
    glyph_a.extend_from_slice(&be16i(1)); // numberOfContours
    glyph_a.extend_from_slice(&be16i(0)); // xMin
    glyph_a.extend_from_slice(&be16i(0)); // yMin
    glyph_a.extend_from_slice(&be16i(1000)); // xMax
    glyph_a.extend_from_slice(&be16i(1000)); // yMax
    glyph_a.extend_from_slice(&be16(3)); // endPtsOfContours[0]: 4 points
    glyph_a.extend_from_slice(&be16(0)); // instructionLength
    glyph_a.extend(std::iter::repeat(0x01u8).take(4)); // all on-curve
    for dx in [0i16, 1000, 0, -1000] {
        glyph_a.extend_from_slice(&be16i(dx));
    }
    for dy in [0i16, 0, 1000, 0] {
        glyph_a.extend_from_slice(&be16i(dy));
    }

    // Glyph 2 ("o"): outer 1000x1000 square, inner 400x400 counter
    // centered at (300,300)-(700,700), two contours, same winding.
    let mut glyph_o = Vec::new();
    glyph_o.extend_from_slice(&be16i(2)); // numberOfContours
    glyph_o.extend_from_slice(&be16i(0));
    glyph_o.extend_from_slice(&be16i(0));
    glyph_o.extend_from_slice(&be16i(1000));
    glyph_o.extend_from_slice(&be16i(1000));
    glyph_o.extend_from_slice(&be16(3)); // outer contour ends at point 3
    glyph_o.extend_from_slice(&be16(7)); // inner contour ends at point 7
    glyph_o.extend_from_slice(&be16(0)); // instructionLength
    glyph_o.extend(std::iter::repeat(0x01u8).take(8)); // all on-curve, both contours
    // Outer contour deltas (same square as glyph_a).
    for dx in [0i16, 1000, 0, -1000] {
        glyph_o.extend_from_slice(&be16i(dx));
    }
    // Inner contour deltas: start at (300,300), then trace a 400x400 box.
    // Coordinate deltas run continuously across contours (per glyf.rs's
    // decoder), so the first inner delta must account for the pen
    // position the outer contour's last point left behind: (0,1000).
    for dx in [300i16 - 0, 400, 0, -400] {
        glyph_o.extend_from_slice(&be16i(dx));
    }
    for dy in [0i16, 0, 1000, 0] {
        glyph_o.extend_from_slice(&be16i(dy));
    }
    for dy in [300i16 - 1000, 0, 400, 0] {
        glyph_o.extend_from_slice(&be16i(dy));
    }

    let mut glyf = Vec::new();
    glyf.extend_from_slice(&[0u8; 0]); // glyph 0: the empty missing-glyph placeholder
    let glyph_a_start = glyf.len();
    glyf.extend_from_slice(&glyph_a);
    let glyph_o_start = glyf.len();
    glyf.extend_from_slice(&glyph_o);
    let glyf_end = glyf.len();

    // -- loca (format 0: word offsets) --
    let loca_words = [0u16, 0, (glyph_a_start as u16) / 2, (glyph_o_start as u16) / 2];
    // Note: glyph 0 is empty (loca[0] == loca[1] == 0); glyph_a spans
    // [loca[1], loca[2]); glyph_o spans [loca[2], loca[3]).
    let _ = glyf_end;
    let mut loca = Vec::new();
    for w in loca_words {
        loca.extend_from_slice(&be16(w));
    }

    // -- head --
    let mut head = vec![0u8; 54];
    head[18..20].copy_from_slice(&be16(UNITS_PER_EM));
    head[50..52].copy_from_slice(&be16i(0)); // indexToLocFormat = 0

    // -- hhea --
    let mut hhea = vec![0u8; 36];
    hhea[4..6].copy_from_slice(&be16i(800)); // ascender
    hhea[6..8].copy_from_slice(&be16i(-200)); // descender
    hhea[8..10].copy_from_slice(&be16i(0)); // lineGap
    hhea[34..36].copy_from_slice(&be16(3)); // numberOfHMetrics (glyphs 0,1,2)

    // -- maxp --
    let mut maxp = vec![0u8; 6];
    maxp[4..6].copy_from_slice(&be16(3)); // numGlyphs

    // -- hmtx: glyph 0, glyph 1 ("A"), glyph 2 ("o") --
    let mut hmtx = Vec::new();
    hmtx.extend_from_slice(&be16(500));
    hmtx.extend_from_slice(&be16i(0));
    hmtx.extend_from_slice(&be16(650));
    hmtx.extend_from_slice(&be16i(50));
    hmtx.extend_from_slice(&be16(620));
    hmtx.extend_from_slice(&be16i(40));

    // -- OS/2 (presence only) --
    let os2 = vec![0u8; 4];

    // -- cmap: format 4, 'A' -> glyph 1, 'o' -> glyph 2 --
    let cmap = build_cmap4(&[('A' as u16, 1), ('o' as u16, 2)]);

    // -- GPOS: DFLT script, one lookup (type 2, pair adjustment, format 1),
    // kerning 'A' followed by 'o' by -120 FUnits. --
    let gpos = build_gpos_format1(1, 2, -120);

    let tables: Vec<(&[u8; 4], &[u8])> = vec![
        (b"cmap", &cmap),
        (b"head", &head),
        (b"hhea", &hhea),
        (b"hmtx", &hmtx),
        (b"loca", &loca),
        (b"glyf", &glyf),
        (b"maxp", &maxp),
        (b"OS/2", &os2),
        (b"GPOS", &gpos),
    ];
    assemble_sfnt(&tables)
}

fn build_cmap4(mappings: &[(u16, u16)]) -> Vec<u8> {
    // One segment per mapping plus the mandatory 0xFFFF terminator,
    // each using idRangeOffset == 0 (idDelta-only) since every segment
    // here covers exactly one codepoint.
    let mut sorted = mappings.to_vec();
    sorted.sort_by_key(|&(cp, _)| cp);
    let segcount = sorted.len() + 1;

    let mut end_codes = Vec::new();
    let mut start_codes = Vec::new();
    let mut id_deltas = Vec::new();
    let mut id_range_offsets = Vec::new();
    for &(cp, gid) in &sorted {
        end_codes.push(cp);
        start_codes.push(cp);
        id_deltas.push(gid.wrapping_sub(cp));
        id_range_offsets.push(0u16);
    }
    end_codes.push(0xFFFF);
    start_codes.push(0xFFFF);
    id_deltas.push(1);
    id_range_offsets.push(0);

    let mut subtable = Vec::new();
    subtable.extend_from_slice(&be16(4)); // format
    subtable.extend_from_slice(&be16(0)); // length (unused)
    subtable.extend_from_slice(&be16(0)); // language
    subtable.extend_from_slice(&be16((segcount * 2) as u16));
    subtable.extend_from_slice(&[0u8; 6]); // searchRange/entrySelector/rangeShift
    for c in &end_codes {
        subtable.extend_from_slice(&be16(*c));
    }
    subtable.extend_from_slice(&be16(0)); // reservedPad
    for c in &start_codes {
        subtable.extend_from_slice(&be16(*c));
    }
    for d in &id_deltas {
        subtable.extend_from_slice(&be16(*d));
    }
    for o in &id_range_offsets {
        subtable.extend_from_slice(&be16(*o));
    }

    let mut cmap = Vec::new();
    cmap.extend_from_slice(&be16(0)); // version
    cmap.extend_from_slice(&be16(1)); // numSubtables
    cmap.extend_from_slice(&be16(0)); // platformID (Unicode)
    cmap.extend_from_slice(&be16(3)); // encodingID
    cmap.extend_from_slice(&12u32.to_be_bytes()); // offset to subtable
    cmap.extend_from_slice(&subtable);
    cmap
}

fn build_gpos_format1(left_gid: u16, right_gid: u16, advance: i16) -> Vec<u8> {
    let mut coverage = Vec::new();
    coverage.extend_from_slice(&be16(1)); // format
    coverage.extend_from_slice(&be16(1)); // glyphCount
    coverage.extend_from_slice(&be16(left_gid));

    let mut pair_set = Vec::new();
    pair_set.extend_from_slice(&be16(1)); // pairValueCount
    pair_set.extend_from_slice(&be16(right_gid));
    pair_set.extend_from_slice(&be16i(advance));

    let pair_set_header_len = 2 + 2 + 2 + 2 + 2 + 2;
    let coverage_off = (pair_set_header_len + pair_set.len()) as u16;
    let mut subtable = Vec::new();
    subtable.extend_from_slice(&be16(1)); // posFormat
    subtable.extend_from_slice(&be16(coverage_off));
    subtable.extend_from_slice(&be16(0x0004)); // valueFormat1: xAdvance only
    subtable.extend_from_slice(&be16(0)); // valueFormat2
    subtable.extend_from_slice(&be16(1)); // pairSetCount
    subtable.extend_from_slice(&be16(pair_set_header_len as u16));
    subtable.extend_from_slice(&pair_set);
    subtable.extend_from_slice(&coverage);

    let lookup_header_len = 2 + 2 + 2 + 2;
    let mut lookup = Vec::new();
    lookup.extend_from_slice(&be16(2)); // lookupType: pair adjustment
    lookup.extend_from_slice(&be16(0)); // lookupFlag
    lookup.extend_from_slice(&be16(1)); // subTableCount
    lookup.extend_from_slice(&be16(lookup_header_len as u16));
    lookup.extend_from_slice(&subtable);

    let lookup_list_header_len = 2 + 2;
    let mut lookup_list = Vec::new();
    lookup_list.extend_from_slice(&be16(1)); // lookupCount
    lookup_list.extend_from_slice(&be16(lookup_list_header_len as u16));
    lookup_list.extend_from_slice(&lookup);

    let mut script_list = Vec::new();
    script_list.extend_from_slice(&be16(1)); // scriptCount
    script_list.extend_from_slice(b"DFLT");
    script_list.extend_from_slice(&be16(0)); // script offset (unused)

    let header_len = 2 + 2 + 2 + 2 + 2;
    let script_list_off = header_len as u16;
    let lookup_list_off = (header_len + script_list.len()) as u16;
    let mut gpos = Vec::new();
    gpos.extend_from_slice(&be16(1)); // majorVersion
    gpos.extend_from_slice(&be16(0)); // minorVersion
    gpos.extend_from_slice(&be16(script_list_off));
    gpos.extend_from_slice(&be16(0)); // featureListOffset (unused)
    gpos.extend_from_slice(&be16(lookup_list_off));
    gpos.extend_from_slice(&script_list);
    gpos.extend_from_slice(&lookup_list);
    gpos
}

fn assemble_sfnt(tables: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);

    let header_len = 12 + tables.len() * 16;
    let mut offset = header_len;
    let mut records = Vec::new();
    let mut body = Vec::new();
    for (tag, data) in tables {
        records.extend_from_slice(tag.as_slice());
        records.extend_from_slice(&0u32.to_be_bytes());
        records.extend_from_slice(&(offset as u32).to_be_bytes());
        records.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(data);
        offset += data.len();
    }
    out.extend_from_slice(&records);
    out.extend_from_slice(&body);
    out
}

#[test]
fn parses_metrics_and_round_trips_glyph_lookup() {
    let data = build_font();
    let font = parse(&data).expect("well-formed synthetic font should parse");

    assert_eq!(font.units_per_em(), UNITS_PER_EM);
    assert_eq!(font.glyph_count(), 3);

    let a_gid = font.glyph_index('A' as u32);
    assert_eq!(a_gid, 1);
    let o_gid = font.glyph_index('o' as u32);
    assert_eq!(o_gid, 2);
    assert_eq!(font.glyph_index('Z' as u32), 0);

    let bbox = font.glyph_bounding_box(a_gid).unwrap();
    assert_eq!(bbox.x_max, 1000);
    assert_eq!(bbox.y_max, 1000);
    assert_eq!(font.advance_x(a_gid), 650);
    assert_eq!(font.left_side_bearing(a_gid), 50);
}

#[test]
fn kerning_pair_is_found_and_unrelated_pair_is_not() {
    let data = build_font();
    let font = parse(&data).unwrap();

    let kern = font.kern_pair_advance('A' as u32, 'o' as u32).unwrap();
    assert_eq!(kern, Some(-120));

    let none = font.kern_pair_advance('A' as u32, 'A' as u32).unwrap();
    assert_eq!(none, None);

    let pairs = font.all_kern_pairs();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].advance_x, -120);
}

#[test]
fn rasterizes_solid_square_glyph_with_coverage_in_range() {
    let data = build_font();
    let font = parse(&data).unwrap();
    let scale = font.scale_for_pixel_height(24.0);

    let (w, h) = font.required_dimensions('A' as u32, scale).unwrap();
    let mut buf = CoverageBuffer::new(w, h);
    font.rasterize_glyph(scale, 'A' as u32, &mut buf).unwrap();

    let mut total = 0.0f64;
    for y in 0..h {
        for x in 0..w {
            let c = buf.get(x, y);
            assert!((0.0..=1.0 + 1e-3).contains(&c));
            total += c as f64;
        }
    }
    // A filled square should cover nearly its whole bounding box.
    let bbox_area = (w as f64) * (h as f64);
    assert!(total > bbox_area * 0.9, "expected near-full coverage, got {total} of {bbox_area}");
}

#[test]
fn rasterizes_ring_glyph_with_empty_counter() {
    let data = build_font();
    let font = parse(&data).unwrap();
    let scale = font.scale_for_pixel_height(40.0);

    let (w, h) = font.required_dimensions('o' as u32, scale).unwrap();
    let mut buf = CoverageBuffer::new(w, h);
    font.rasterize_glyph(scale, 'o' as u32, &mut buf).unwrap();

    // The counter (inner hole) sits roughly in the middle third of the
    // glyph; it should end up with little to no coverage while the ring
    // itself does.
    let cx = w / 2;
    let cy = h / 2;
    let counter_coverage = buf.get(cx, cy);
    assert!(counter_coverage < 0.5, "expected the counter to be mostly uncovered, got {counter_coverage}");

    let edge_coverage = buf.get(1, h / 2);
    assert!(edge_coverage > 0.3, "expected the ring itself to carry real coverage, got {edge_coverage}");

    for y in 0..h {
        for x in 0..w {
            assert!(buf.get(x, y) <= 1.0 + 1e-3);
        }
    }
}

#[test]
fn truncated_buffer_is_rejected_as_malformed() {
    let data = build_font();
    let truncated = &data[..data.len() / 2];
    assert!(matches!(parse(truncated), Err(ParseError::TruncatedInput)));
}
