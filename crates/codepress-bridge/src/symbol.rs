// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// 1-D symbol encoding via rxing, rasterised at a fixed native scale.

use std::sync::Arc;

use codepress_core::Symbology;
use codepress_core::error::{CodepressError, Result};
use image::{Rgba, RgbaImage};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};
use tracing::debug;

use crate::traits::{GlyphStyle, RasterSymbol, SymbolEncoder, TextRasterizer};

/// Pixels per module in the native raster.
pub const NATIVE_MODULE_PX: u32 = 2;
/// Bar height of the native raster.
pub const NATIVE_BAR_HEIGHT: u32 = 100;
/// Gap above and below the human-readable label.
const LABEL_GAP: u32 = 4;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn barcode_format(symbology: Symbology) -> BarcodeFormat {
    match symbology {
        Symbology::Code128 => BarcodeFormat::CODE_128,
        Symbology::Code39 => BarcodeFormat::CODE_39,
        Symbology::Code93 => BarcodeFormat::CODE_93,
        Symbology::Ean13 => BarcodeFormat::EAN_13,
        Symbology::Ean8 => BarcodeFormat::EAN_8,
        Symbology::UpcA => BarcodeFormat::UPC_A,
        Symbology::UpcE => BarcodeFormat::UPC_E,
        Symbology::Itf => BarcodeFormat::ITF,
        Symbology::Codabar => BarcodeFormat::CODABAR,
    }
}

/// rxing-backed encoder drawing its label with the configured text face.
pub struct RxingSymbolEncoder {
    text: Arc<dyn TextRasterizer>,
}

impl RxingSymbolEncoder {
    pub fn new(text: Arc<dyn TextRasterizer>) -> Self {
        Self { text }
    }

    /// Dark/light module row, quiet zone included.
    fn module_row(data: &str, symbology: Symbology) -> Result<Vec<bool>> {
        if data.is_empty() {
            return Err(CodepressError::Encoding(format!(
                "{}: empty payload",
                symbology.name()
            )));
        }
        let matrix = MultiFormatWriter::default()
            .encode(data, &barcode_format(symbology), 0, 0)
            .map_err(|e| CodepressError::Encoding(format!("{}: {e}", symbology.name())))?;
        let (w, h) = (matrix.width(), matrix.height());
        if w == 0 || h == 0 {
            return Err(CodepressError::Encoding(format!(
                "{}: encoder produced an empty symbol",
                symbology.name()
            )));
        }
        let row = h / 2;
        Ok((0..w).map(|x| matrix.get(x, row)).collect())
    }
}

impl SymbolEncoder for RxingSymbolEncoder {
    fn encode_symbol(
        &self,
        data: &str,
        symbology: Symbology,
        label: Option<&GlyphStyle>,
    ) -> Result<RasterSymbol> {
        let modules = Self::module_row(data, symbology)?;
        let width = modules.len() as u32 * NATIVE_MODULE_PX;

        let label_box = label.map(|style| (style, self.text.measure(data, style)));
        let band = label_box.map(|(_, (_, th))| th + 2 * LABEL_GAP);

        let mut img = RgbaImage::from_pixel(width, NATIVE_BAR_HEIGHT + band.unwrap_or(0), PAPER);
        for (i, _) in modules.iter().enumerate().filter(|(_, dark)| **dark) {
            let x0 = i as u32 * NATIVE_MODULE_PX;
            for x in x0..x0 + NATIVE_MODULE_PX {
                for y in 0..NATIVE_BAR_HEIGHT {
                    img.put_pixel(x, y, INK);
                }
            }
        }

        if let Some((style, (tw, _))) = label_box {
            let tx = (width as i32 - tw as i32) / 2;
            let ty = (NATIVE_BAR_HEIGHT + LABEL_GAP) as i32;
            self.text.draw(&mut img, tx, ty, data, style, INK);
        }

        debug!(
            symbology = symbology.name(),
            modules = modules.len(),
            width,
            height = img.height(),
            "encoded symbol"
        );
        Ok(RasterSymbol::new(img, band))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap_font::BitmapRasterizer;

    fn encoder() -> RxingSymbolEncoder {
        RxingSymbolEncoder::new(Arc::new(BitmapRasterizer))
    }

    #[test]
    fn code128_has_native_module_width() {
        let img = encoder()
            .encode_symbol("HELLO-123", Symbology::Code128, None)
            .unwrap();
        assert_eq!(img.text_band, None);
        let img = img.image;
        assert_eq!(img.height(), NATIVE_BAR_HEIGHT);
        assert_eq!(img.width() % NATIVE_MODULE_PX, 0);
        assert!(img.pixels().any(|p| *p == INK));
    }

    #[test]
    fn label_adds_band_below_bars() {
        for size in [12, 40] {
            let style = GlyphStyle::regular(size);
            let symbol = encoder()
                .encode_symbol("12345", Symbology::Code128, Some(&style))
                .unwrap();
            let (_, th) = BitmapRasterizer.measure("12345", &style);
            assert_eq!(symbol.text_band, Some(th + 2 * LABEL_GAP));
            assert_eq!(symbol.image.height(), NATIVE_BAR_HEIGHT + th + 2 * LABEL_GAP);
            assert_eq!(symbol.bar_rows(), NATIVE_BAR_HEIGHT);
            // The label never reaches into the bar rows.
            let ink_rows: Vec<u32> = (NATIVE_BAR_HEIGHT..symbol.image.height())
                .filter(|&y| (0..symbol.image.width()).any(|x| *symbol.image.get_pixel(x, y) == INK))
                .collect();
            assert!(!ink_rows.is_empty());
            assert!(ink_rows.iter().all(|&y| y >= NATIVE_BAR_HEIGHT + LABEL_GAP));
        }
    }

    #[test]
    fn invalid_payload_for_symbology_is_rejected() {
        let err = encoder()
            .encode_symbol("not digits", Symbology::Ean13, None)
            .unwrap_err();
        assert!(matches!(err, CodepressError::Encoding(_)));
        assert!(encoder().encode_symbol("", Symbology::Code128, None).is_err());
    }
}
