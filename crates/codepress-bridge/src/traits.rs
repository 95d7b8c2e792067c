// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability traits for the external collaborators the renderers consume.
//
// The renderers never know how a matrix is encoded or how a glyph is drawn;
// they only see these narrow seams. All implementations are shareable across
// the background worker thread.

use codepress_core::TextStyle;
use codepress_core::error::Result;
use codepress_core::{EcLevel, ModuleMatrix, Symbology};
use image::{Rgba, RgbaImage};

/// Size and face variant requested from a text rasteriser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphStyle {
    /// Nominal glyph height in pixels.
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
}

impl GlyphStyle {
    pub fn regular(size: u32) -> Self {
        Self {
            size,
            bold: false,
            italic: false,
        }
    }
}

impl From<&TextStyle> for GlyphStyle {
    fn from(style: &TextStyle) -> Self {
        Self {
            size: style.effective_size(),
            bold: style.bold,
            italic: style.italic,
        }
    }
}

/// Turns a payload into a QR module matrix.
pub trait QrEncoder: Send + Sync {
    /// `version: None` selects the smallest symbol that holds `data`.
    /// Rejected payloads return `CodepressError::Encoding`.
    fn encode_qr(&self, data: &str, version: Option<u8>, ec: EcLevel) -> Result<ModuleMatrix>;
}

/// A 1-D symbol at the encoder's native scale.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSymbol {
    /// Dark bars on a white ground, label band (if any) underneath.
    pub image: RgbaImage,
    /// Height of the label band at the bottom of `image`. `None` when the
    /// encoder cannot say where its label starts.
    pub text_band: Option<u32>,
}

impl RasterSymbol {
    pub fn new(image: RgbaImage, text_band: Option<u32>) -> Self {
        Self { image, text_band }
    }

    /// Rows above the label band.
    pub fn bar_rows(&self) -> u32 {
        let h = self.image.height();
        h - self.text_band.unwrap_or(0).min(h)
    }
}

/// Turns a payload into a rendered 1-D symbol at the encoder's native scale.
pub trait SymbolEncoder: Send + Sync {
    /// When `label` is set, the payload is drawn as human-readable text in a
    /// band below the bars.
    fn encode_symbol(
        &self,
        data: &str,
        symbology: Symbology,
        label: Option<&GlyphStyle>,
    ) -> Result<RasterSymbol>;
}

/// Measures and draws single-line text.
pub trait TextRasterizer: Send + Sync {
    /// Bounding box `(width, height)` of `text`.
    fn measure(&self, text: &str, style: &GlyphStyle) -> (u32, u32);

    /// Draw `text` with its bounding box's top-left corner at `(x, y)`.
    /// Pixels falling outside the canvas are clipped.
    fn draw(
        &self,
        canvas: &mut RgbaImage,
        x: i32,
        y: i32,
        text: &str,
        style: &GlyphStyle,
        color: Rgba<u8>,
    );

    /// Short description for logs.
    fn face_name(&self) -> &str;
}
