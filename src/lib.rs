//! # ttf-raster
//!
//! A self-contained TrueType/OpenType (TTF/OTF) parser and analytic
//! scanline rasterizer: the core a text-rendering toolkit needs to turn a
//! font byte stream into anti-aliased glyph coverage, without pulling in
//! FreeType, HarfBuzz, or a parsing crate.
//!
//! The crate does two tightly coupled jobs:
//!
//! 1. **Parse** — decode the sfnt container directory and walk
//!    `head`/`maxp`/`hhea`/`hmtx`/`loca`/`glyf`/`cmap`/`OS/2`/`GPOS` to
//!    expose per-glyph metrics, simple-glyph outlines, and GPOS pair
//!    kerning, over a borrowed byte slice with zero allocation.
//! 2. **Rasterize** — convert a glyph's contours into line/quadratic
//!    outline segments, then compute per-pixel fractional coverage by
//!    analytically intersecting sub-pixel scanlines with those segments.
//!
//! ## Architecture
//!
//! ```text
//! bytes -> TableIndex -> Font (parsed metadata, borrows the bytes)
//!
//! codepoint -> glyph_index -> glyf range -> contour vertices
//!           -> outline segments -> scanline intersections
//!           -> paired 2-/4-point figures -> per-pixel coverage
//! ```
//!
//! Out of scope, deliberately: composite/CFF glyphs, hinting, LCD
//! filtering, complex-script shaping, variable fonts, bitmap/color
//! tables, font collections, and any texture-atlas/Pen layer — those are
//! glue that belongs in the surrounding application, not this core.
//!
//! ## Example
//!
//! ```ignore
//! use ttf_raster::{parse, CoverageBuffer};
//!
//! // `font_bytes` is a caller-supplied TTF/OTF buffer; the core never
//! // performs file I/O itself.
//! let font = parse(font_bytes)?;
//! let scale = font.scale_for_pixel_height(24.0);
//! let (w, h) = font.required_dimensions('A' as u32, scale)?;
//! let mut buf = CoverageBuffer::new(w, h);
//! font.rasterize_glyph(scale, 'A' as u32, &mut buf)?;
//! # Ok::<(), ttf_raster::ParseError>(())
//! ```

pub mod cmap;
pub mod coverage;
pub mod error;
pub mod font;
pub mod glyf;
pub mod gpos;
pub mod outline;
pub mod pairing;
pub mod reader;
pub mod scanline;
pub mod tables;

pub use coverage::{CoverageBuffer, PixelWriter};
pub use error::{ParseError, RasterError};
pub use font::{parse, Font, GlyphBoundingBox, HorizontalMetric, KernPair};
