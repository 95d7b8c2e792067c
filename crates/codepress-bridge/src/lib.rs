// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Codepress: capability bridges to the external encoders and glyph rasterisers.
//
// Renderers depend only on the traits in `traits`; `codec_bridge()` wires up
// the concrete implementations for a given font configuration.

pub mod bitmap_font;
pub mod glyph;
mod mask;
pub mod qr;
pub mod symbol;
pub mod traits;

use std::sync::Arc;

use codepress_core::FontConfig;
use tracing::{info, warn};

pub use traits::{GlyphStyle, QrEncoder, RasterSymbol, SymbolEncoder, TextRasterizer};

/// The set of capabilities one run works with.
#[derive(Clone)]
pub struct Codecs {
    pub qr: Arc<dyn QrEncoder>,
    pub symbols: Arc<dyn SymbolEncoder>,
    pub text: Arc<dyn TextRasterizer>,
}

impl std::fmt::Debug for Codecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codecs")
            .field("text", &self.text.face_name())
            .finish_non_exhaustive()
    }
}

/// Text rasteriser for `font`, falling back to the built-in bitmap face when
/// no file is configured or it cannot be loaded.
pub fn text_rasterizer(font: &FontConfig) -> Arc<dyn TextRasterizer> {
    match &font.path {
        Some(path) => match glyph::TrueTypeRasterizer::load(path) {
            Ok(face) => Arc::new(face),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "font unavailable, using built-in bitmap face");
                Arc::new(bitmap_font::BitmapRasterizer)
            }
        },
        None => Arc::new(bitmap_font::BitmapRasterizer),
    }
}

/// Wire up the default encoders around the configured font.
pub fn codec_bridge(font: &FontConfig) -> Codecs {
    let text = text_rasterizer(font);
    info!(face = text.face_name(), "codec bridge ready");
    Codecs {
        qr: Arc::new(qr::QrcodeEncoder),
        symbols: Arc::new(symbol::RxingSymbolEncoder::new(Arc::clone(&text))),
        text,
    }
}
