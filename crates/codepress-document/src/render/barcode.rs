// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Barcode normaliser: rescale an encoder's native symbol bitmap so the
// narrowest bar hits a requested pixel width, then fix the bar height, add a
// quiet zone and recolour.

use codepress_bridge::RasterSymbol;
use codepress_core::color::{DEFAULT_THRESHOLD, classify};
use codepress_core::error::Result;
use codepress_core::{BarcodeOptions, PixelClass, ResourceLimits, TextPosition};
use image::{Rgba, RgbaImage, imageops};
use tracing::{debug, instrument};

use super::RenderedImage;
use super::canvas;
use super::runs::BarRunProfile;

/// Smallest text band cut by the `text_region_ratio` estimate.
const MIN_TEXT_BAND: u32 = 8;

/// Normalises externally rendered 1-D symbols.
pub struct BarcodeNormalizer {
    limits: ResourceLimits,
    threshold: u8,
}

impl BarcodeNormalizer {
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Uniform factor taking the narrowest bar on the scanline through the
    /// middle of the bar rows to `narrow_bar_px`. Never shrinks.
    pub fn scale_factor(&self, symbol: &RasterSymbol, narrow_bar_px: u32) -> f32 {
        let row = symbol.bar_rows().max(1) / 2;
        let profile = BarRunProfile::from_scanline(&symbol.image, row, self.threshold);
        let narrow = profile.narrowest_bar();
        (narrow_bar_px as f32 / narrow as f32).max(1.0)
    }

    /// Normalise `symbol` (labelled `label`) per `options`.
    #[instrument(skip_all, fields(
        symbology = options.symbology.name(),
        width = symbol.image.width(),
        height = symbol.image.height(),
    ))]
    pub fn render(
        &self,
        symbol: &RasterSymbol,
        label: &str,
        options: &BarcodeOptions,
    ) -> Result<RenderedImage> {
        let scale = self.scale_factor(symbol, options.narrow_bar_px);
        let native = &symbol.image;
        let (native_w, native_h) = native.dimensions();
        let scaled_w = ((native_w as f32 * scale).round() as u32).max(1);

        // Split at native resolution so no label row can be sampled into
        // the bars by a fractional scale.
        let text_rows = if options.text.show && native_h > 1 {
            let rows = symbol.text_band.unwrap_or_else(|| {
                let estimate = (native_h as f32 * options.text_region_ratio) as u32;
                estimate.max(MIN_TEXT_BAND)
            });
            Some(rows.clamp(1, native_h - 1))
        } else {
            None
        };
        let bar_rows = match text_rows {
            Some(rows) => native_h - rows,
            // A band drawn for a hidden label is cut off with the bars.
            None => symbol.bar_rows().clamp(1, native_h.max(1)),
        };

        let bars = imageops::crop_imm(native, 0, 0, native_w, bar_rows).to_image();
        let bars = canvas::resize_nearest(&bars, scaled_w, options.bar_height_px, &self.limits)?;

        let white = Rgba([255, 255, 255, 255]);
        let body = match text_rows {
            Some(rows) => {
                let text = imageops::crop_imm(native, 0, bar_rows, native_w, rows).to_image();
                let text_h = ((rows as f32 * scale).round() as u32).max(1);
                let text = canvas::resize_nearest(&text, scaled_w, text_h, &self.limits)?;
                self.stack(&bars, &text, options, white)?
            }
            None => bars,
        };

        let m = options.margin_px;
        let mut image = canvas::expand(&body, (m, m, m, m), white, &self.limits)?;
        drop(body);

        let bar = Rgba(options.bar_color.to_rgba());
        let background = Rgba(options.background().to_rgba());
        for p in image.pixels_mut() {
            *p = match classify([p[0], p[1], p[2]], self.threshold) {
                PixelClass::Foreground => bar,
                PixelClass::Background => background,
            };
        }

        debug!(
            scale,
            width = image.width(),
            height = image.height(),
            "barcode normalised"
        );
        Ok(RenderedImage::new(image, label))
    }

    /// Stack bars and label in label order with a `text.margin_px` gap.
    fn stack(
        &self,
        bars: &RgbaImage,
        text: &RgbaImage,
        options: &BarcodeOptions,
        fill: Rgba<u8>,
    ) -> Result<RgbaImage> {
        let w = bars.width();
        let gap = options.text.margin_px;
        let total_h = bars
            .height()
            .saturating_add(text.height())
            .saturating_add(gap.saturating_mul(2));
        let mut out = canvas::filled_rgba(w, total_h, fill, &self.limits)?;
        match options.text.position {
            TextPosition::Bottom => {
                imageops::replace(&mut out, bars, 0, 0);
                imageops::replace(&mut out, text, 0, i64::from(bars.height() + gap));
            }
            TextPosition::Top => {
                imageops::replace(&mut out, text, 0, 0);
                imageops::replace(&mut out, bars, 0, i64::from(text.height() + gap));
            }
        }
        Ok(out)
    }
}
