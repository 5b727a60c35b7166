//! Error kinds for table parsing and rasterization.
//!
//! The core has no use for a dependency like `thiserror`: the variant set
//! is small and fixed, so a hand-written `Display` impl is plenty.

use core::fmt;

/// Everything that can go wrong while reading or interpreting font tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A read would have gone past the end of the font byte slice.
    TruncatedInput,
    /// `OS/2`, `hmtx`, or (`glyf` + `loca`) is absent from the table directory.
    MissingRequiredTable(&'static str),
    /// The font's Unicode `cmap` subtable is not format 4.
    UnsupportedCmapFormat,
    /// A GPOS pair-adjustment value format other than `{x_advance only, empty}`.
    UnsupportedValueFormat,
    /// A glyph index at or beyond `Font::glyph_count`.
    InvalidGlyphIndex,
    /// `loca[i] == loca[i + 1]`: the glyph has no outline (e.g. space).
    GlyphHasNoOutline,
    /// `glyf` contour count was negative (a composite glyph).
    CompositeUnsupported,
    /// GPOS has no `DFLT` script entry.
    NoDefaultLang,
    /// The rasterizer's fixed-capacity scanline buffers were exceeded; see
    /// [`RasterError::ComplexityExceeded`]. Surfaced here too because
    /// `Font::rasterize_glyph` reports every failure through `ParseError`.
    ComplexityExceeded,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TruncatedInput => write!(f, "read past the end of the font buffer"),
            ParseError::MissingRequiredTable(tag) => {
                write!(f, "required table `{tag}` is missing")
            }
            ParseError::UnsupportedCmapFormat => {
                write!(f, "cmap Unicode subtable is not format 4")
            }
            ParseError::UnsupportedValueFormat => {
                write!(f, "GPOS pair-adjustment value format is not {{x_advance, empty}}")
            }
            ParseError::InvalidGlyphIndex => write!(f, "glyph index out of range"),
            ParseError::GlyphHasNoOutline => write!(f, "glyph has no outline"),
            ParseError::CompositeUnsupported => write!(f, "composite glyphs are not supported"),
            ParseError::NoDefaultLang => write!(f, "GPOS has no DFLT script entry"),
            ParseError::ComplexityExceeded => {
                write!(f, "glyph outline exceeded the rasterizer's fixed-capacity buffers")
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<RasterError> for ParseError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::ComplexityExceeded => ParseError::ComplexityExceeded,
        }
    }
}

/// Errors raised only by the rasterizer, once parsing has already succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterError {
    /// A scanline produced more intersections or figures than the
    /// fixed-capacity stack buffers allow (64 intersections, 32 pair
    /// figures, 32 connections). Degrading silently would corrupt
    /// coverage, so this is a hard failure instead.
    ComplexityExceeded,
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::ComplexityExceeded => {
                write!(f, "glyph outline exceeded the rasterizer's fixed-capacity buffers")
            }
        }
    }
}

impl std::error::Error for RasterError {}
