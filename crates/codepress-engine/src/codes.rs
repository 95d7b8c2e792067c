// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-item code production: encode through the bridge, render through the
// document crate, recover from rejected payloads.

use std::sync::Arc;

use codepress_bridge::{Codecs, GlyphStyle, TextRasterizer};
use codepress_core::error::{CodepressError, Result};
use codepress_core::{BarcodeOptions, QrOptions, RenderOptions, ResourceLimits, Symbology};
use codepress_document::{BarcodeNormalizer, MatrixRenderer, RenderedImage, error_placeholder};
use tracing::{debug, warn};

/// A rendered item and whether it is the error placeholder.
#[derive(Debug, Clone)]
pub struct RenderedItem {
    pub image: RenderedImage,
    pub placeholder: bool,
}

/// Turns single payloads into finished code images.
pub struct CodeFactory {
    codecs: Codecs,
    matrix: MatrixRenderer,
    barcode: BarcodeNormalizer,
}

impl CodeFactory {
    pub fn new(codecs: Codecs, limits: ResourceLimits) -> Self {
        let matrix = MatrixRenderer::new(Arc::clone(&codecs.text), limits.clone());
        let barcode = BarcodeNormalizer::new(limits);
        Self {
            codecs,
            matrix,
            barcode,
        }
    }

    pub fn text(&self) -> &Arc<dyn TextRasterizer> {
        &self.codecs.text
    }

    /// Render `data`, applying the QR version and symbology fallbacks.
    pub fn render(&self, data: &str, options: &RenderOptions) -> Result<RenderedImage> {
        match options {
            RenderOptions::Qr(o) => self.render_qr(data, o),
            RenderOptions::Barcode(o) => self.render_barcode(data, o),
        }
    }

    /// Render `data`, substituting the error placeholder when the payload
    /// cannot be encoded. Whole-run failures still propagate.
    pub fn render_or_placeholder(&self, data: &str, options: &RenderOptions) -> Result<RenderedItem> {
        match self.render(data, options) {
            Ok(image) => Ok(RenderedItem {
                image,
                placeholder: false,
            }),
            Err(e) if !e.is_fatal() => {
                warn!(item = %preview(data), error = %e, "item replaced by placeholder");
                Ok(RenderedItem {
                    image: error_placeholder(self.codecs.text.as_ref(), data),
                    placeholder: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn render_qr(&self, data: &str, options: &QrOptions) -> Result<RenderedImage> {
        let qr = &self.codecs.qr;
        let matrix = match qr.encode_qr(data, options.version, options.error_correction) {
            Ok(m) => m,
            Err(CodepressError::Encoding(reason)) if options.version.is_some() => {
                warn!(
                    version = options.version,
                    %reason,
                    "payload does not fit the forced QR version, retrying with automatic version"
                );
                qr.encode_qr(data, None, options.error_correction)?
            }
            Err(e) => return Err(e),
        };
        debug!(side = matrix.side(), "QR encoded");
        self.matrix.render(&matrix, data, options)
    }

    fn render_barcode(&self, data: &str, options: &BarcodeOptions) -> Result<RenderedImage> {
        let label = options.text.show.then(|| GlyphStyle::from(&options.text));
        let symbols = &self.codecs.symbols;
        let symbol = match symbols.encode_symbol(data, options.symbology, label.as_ref()) {
            Ok(s) => s,
            Err(CodepressError::Encoding(reason)) if options.symbology != Symbology::FALLBACK => {
                warn!(
                    symbology = options.symbology.name(),
                    fallback = Symbology::FALLBACK.name(),
                    %reason,
                    "symbology rejected payload, falling back"
                );
                symbols.encode_symbol(data, Symbology::FALLBACK, label.as_ref())?
            }
            Err(e) => return Err(e),
        };
        self.barcode.render(&symbol, data, options)
    }
}

/// Payload prefix safe to put in a log line.
fn preview(data: &str) -> String {
    data.chars().take(32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepress_bridge::codec_bridge;
    use codepress_core::{ColorSpec, FontConfig, TextStyle};
    use codepress_document::render::placeholder::PLACEHOLDER_PX;

    fn factory() -> CodeFactory {
        CodeFactory::new(codec_bridge(&FontConfig::default()), ResourceLimits::default())
    }

    #[test]
    fn qr_items_are_exactly_out_px_square() {
        let f = factory();
        let options = RenderOptions::Qr(QrOptions::default());
        for data in ["A", "B", "C"] {
            let img = f.render(data, &options).unwrap();
            assert_eq!(img.dimensions(), (300, 300));
            assert_eq!(img.label, data);
            let pixels: Vec<_> = img.image.pixels().collect();
            assert!(pixels.iter().any(|p| p.0 == ColorSpec::BLACK.to_rgba()));
            assert!(pixels.iter().any(|p| p.0 == ColorSpec::WHITE.to_rgba()));
        }
    }

    #[test]
    fn forced_version_too_small_falls_back_to_auto() {
        let options = RenderOptions::Qr(QrOptions {
            version: Some(1),
            ..QrOptions::default()
        });
        let long = "x".repeat(200);
        let item = factory().render_or_placeholder(&long, &options).unwrap();
        assert!(!item.placeholder);
        assert_eq!(item.image.width(), 300);
    }

    #[test]
    fn bad_symbology_payload_falls_back_to_code128() {
        let options = RenderOptions::Barcode(BarcodeOptions {
            symbology: Symbology::Ean13,
            ..BarcodeOptions::default()
        });
        let item = factory().render_or_placeholder("not digits", &options).unwrap();
        assert!(!item.placeholder);
        assert!(item.image.width() > item.image.height());
    }

    #[test]
    fn barcode_label_never_leaks_into_the_bars() {
        let f = factory();
        for size_px in [12, 24, 40] {
            for narrow_bar_px in [2, 3] {
                let options = BarcodeOptions {
                    narrow_bar_px,
                    bar_height_px: 100,
                    margin_px: 6,
                    text: TextStyle {
                        show: true,
                        size_px,
                        ..TextStyle::default()
                    },
                    ..BarcodeOptions::default()
                };
                let item = f
                    .render_or_placeholder("HELLO-42", &RenderOptions::Barcode(options))
                    .unwrap();
                assert!(!item.placeholder);
                let img = &item.image.image;
                let (top, bottom) = (6, 6 + 100);
                for x in 0..img.width() {
                    let first = img.get_pixel(x, top);
                    assert!(
                        (top..bottom).all(|y| img.get_pixel(x, y) == first),
                        "size {size_px}, narrow {narrow_bar_px}: column {x} not uniform"
                    );
                }
                // The label itself survives below the bars.
                let label_ink = (bottom..img.height())
                    .any(|y| (0..img.width()).any(|x| img.get_pixel(x, y).0 == ColorSpec::BLACK.to_rgba()));
                assert!(label_ink, "size {size_px}: label missing");
            }
        }
    }

    #[test]
    fn unencodable_payload_becomes_placeholder() {
        let options = RenderOptions::Barcode(BarcodeOptions::default());
        let item = factory().render_or_placeholder("", &options).unwrap();
        assert!(item.placeholder);
        assert_eq!(item.image.dimensions(), (PLACEHOLDER_PX, PLACEHOLDER_PX));
    }

    #[test]
    fn exhausted_resources_are_not_papered_over() {
        let f = CodeFactory::new(
            codec_bridge(&FontConfig::default()),
            ResourceLimits {
                max_canvas_bytes: 16,
            },
        );
        let err = f
            .render_or_placeholder("A", &RenderOptions::Qr(QrOptions::default()))
            .unwrap_err();
        assert!(err.is_resource_exhausted());
    }
}
