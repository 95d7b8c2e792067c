// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Matrix renderer: boolean module grid to a coloured, annotated, padded bitmap.

use std::sync::Arc;

use codepress_bridge::{GlyphStyle, TextRasterizer};
use codepress_core::error::Result;
use codepress_core::{ModuleMatrix, QrOptions, ResourceLimits, TextAlign, TextPosition};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, instrument};

use super::RenderedImage;
use super::canvas;

/// Side of a finder pattern, in modules.
const FINDER: usize = 7;

/// Renders QR module matrices.
pub struct MatrixRenderer {
    text: Arc<dyn TextRasterizer>,
    limits: ResourceLimits,
}

impl MatrixRenderer {
    pub fn new(text: Arc<dyn TextRasterizer>, limits: ResourceLimits) -> Self {
        Self { text, limits }
    }

    /// Integer module size that fits `side` modules inside the padded target.
    pub fn box_size(side: usize, options: &QrOptions) -> u32 {
        let available = options
            .out_px
            .saturating_sub(options.padding_lr.saturating_mul(2));
        let side = u32::try_from(side).unwrap_or(u32::MAX).max(1);
        (available / side).max(1)
    }

    /// Render `matrix`, labelled with `label`, per `options`.
    ///
    /// The output width is always `out_px`; the height follows proportionally.
    #[instrument(skip_all, fields(side = matrix.side(), out_px = options.out_px))]
    pub fn render(
        &self,
        matrix: &ModuleMatrix,
        label: &str,
        options: &QrOptions,
    ) -> Result<RenderedImage> {
        let side = matrix.side();
        let box_px = Self::box_size(side, options);
        let qr_px = u32::try_from(side)
            .unwrap_or(u32::MAX)
            .saturating_mul(box_px);

        let module = Rgba(options.module_color.to_rgba());
        let back = Rgba(options.back_color.to_rgba());

        let mut img = canvas::filled_rgba(qr_px, qr_px, back, &self.limits)?;
        for y in 0..side {
            for x in 0..side {
                if matrix.get(x, y) {
                    fill_modules(&mut img, box_px, (x, y), 1, module);
                }
            }
        }

        if side >= FINDER {
            self.paint_finders(&mut img, side, box_px, options);
        }

        if options.text.show {
            img = self.annotate(img, label, options)?;
        }

        let padded = canvas::expand(
            &img,
            (
                options.padding_lr,
                options.padding_tb,
                options.padding_lr,
                options.padding_tb,
            ),
            back,
            &self.limits,
        )?;
        drop(img);

        let image = if padded.width() != options.out_px {
            let (w, h) = padded.dimensions();
            let new_h = (u64::from(h) * u64::from(options.out_px) / u64::from(w.max(1))).max(1);
            let new_h = u32::try_from(new_h).unwrap_or(u32::MAX);
            canvas::resize_nearest(&padded, options.out_px, new_h, &self.limits)?
        } else {
            padded
        };

        debug!(
            box_px,
            width = image.width(),
            height = image.height(),
            "matrix rendered"
        );
        Ok(RenderedImage::new(image, label))
    }

    /// Repaint the three finder patterns: optional 7x7 ring colour, 5x5 gap in
    /// the background colour, 3x3 core in the inner-eye or module colour.
    fn paint_finders(&self, img: &mut RgbaImage, side: usize, box_px: u32, options: &QrOptions) {
        let back = Rgba(options.back_color.to_rgba());
        let core = Rgba(
            options
                .inner_eye_color
                .unwrap_or(options.module_color)
                .to_rgba(),
        );
        let origins = [(0, 0), (side - FINDER, 0), (0, side - FINDER)];
        for (fx, fy) in origins {
            if let Some(outer) = options.outer_eye_color {
                fill_modules(img, box_px, (fx, fy), FINDER, Rgba(outer.to_rgba()));
            }
            fill_modules(img, box_px, (fx + 1, fy + 1), FINDER - 2, back);
            fill_modules(img, box_px, (fx + 2, fy + 2), FINDER - 4, core);
        }
    }

    /// Grow the canvas by a text band above or below and draw the label in it.
    fn annotate(&self, img: RgbaImage, label: &str, options: &QrOptions) -> Result<RgbaImage> {
        let text = &options.text;
        let style = GlyphStyle::from(text);
        let (tw, th) = self.text.measure(label, &style);
        let extra = th.saturating_add(text.margin_px.saturating_mul(2));
        let qr_px = img.width();

        let back = Rgba(options.back_color.to_rgba());
        let mut out = canvas::filled_rgba(qr_px, img.height() + extra, back, &self.limits)?;

        let (img_y, text_y) = match text.position {
            TextPosition::Bottom => (0, img.height() + text.margin_px),
            TextPosition::Top => (extra, text.margin_px),
        };
        imageops::replace(&mut out, &img, 0, i64::from(img_y));

        let text_x = match text.align {
            TextAlign::Left => text.margin_px as i32,
            TextAlign::Center => (qr_px as i32 - tw as i32) / 2,
            TextAlign::Right => qr_px as i32 - tw as i32 - text.margin_px as i32,
        };
        self.text.draw(
            &mut out,
            text_x,
            text_y as i32,
            label,
            &style,
            Rgba(options.module_color.to_rgba()),
        );
        Ok(out)
    }
}

/// Fill a `span` x `span` block of modules whose top-left module is `origin`.
fn fill_modules(img: &mut RgbaImage, box_px: u32, origin: (usize, usize), span: usize, color: Rgba<u8>) {
    let x = origin.0 as i64 * i64::from(box_px);
    let y = origin.1 as i64 * i64::from(box_px);
    let size = span as u32 * box_px;
    let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
        return;
    };
    draw_filled_rect_mut(img, Rect::at(x, y).of_size(size, size), color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepress_bridge::bitmap_font::BitmapRasterizer;
    use codepress_bridge::{QrEncoder, qr::QrcodeEncoder};
    use codepress_core::{ColorSpec, EcLevel, TextStyle};

    fn renderer() -> MatrixRenderer {
        MatrixRenderer::new(Arc::new(BitmapRasterizer), ResourceLimits::default())
    }

    fn qr(data: &str) -> ModuleMatrix {
        QrcodeEncoder.encode_qr(data, None, EcLevel::M).unwrap()
    }

    /// Straight module painting with no finder repaint, padding or rescale.
    fn naive(matrix: &ModuleMatrix, box_px: u32) -> RgbaImage {
        let side = matrix.side() as u32;
        RgbaImage::from_fn(side * box_px, side * box_px, |x, y| {
            if matrix.get((x / box_px) as usize, (y / box_px) as usize) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn oversized_padding_keeps_one_pixel_modules() {
        let options = QrOptions {
            padding_lr: u32::MAX,
            ..QrOptions::default()
        };
        assert_eq!(MatrixRenderer::box_size(21, &options), 1);
    }

    #[test]
    fn width_is_exactly_out_px() {
        let m = qr("hello world");
        for out_px in [57, 100, 300, 333, 1000] {
            for padding in [0, 10, 25] {
                let options = QrOptions {
                    out_px,
                    padding_lr: padding,
                    padding_tb: padding,
                    ..QrOptions::default()
                };
                let img = renderer().render(&m, "hello world", &options).unwrap();
                assert_eq!(img.width(), out_px, "out_px {out_px} padding {padding}");
            }
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let m = qr("repeat");
        let options = QrOptions::default();
        let a = renderer().render(&m, "repeat", &options).unwrap();
        let b = renderer().render(&m, "repeat", &options).unwrap();
        assert_eq!(a.image.as_raw(), b.image.as_raw());
    }

    #[test]
    fn default_finders_match_plain_module_pattern() {
        let m = qr("finder check");
        let options = QrOptions {
            out_px: m.side() as u32 * 4,
            padding_lr: 0,
            padding_tb: 0,
            ..QrOptions::default()
        };
        assert_eq!(MatrixRenderer::box_size(m.side(), &options), 4);
        let img = renderer().render(&m, "finder check", &options).unwrap();
        assert_eq!(img.image, naive(&m, 4));
    }

    #[test]
    fn eye_colours_recolour_ring_and_core() {
        let m = qr("eyes");
        let red = ColorSpec::rgb(255, 0, 0);
        let blue = ColorSpec::rgb(0, 0, 255);
        let options = QrOptions {
            out_px: m.side() as u32 * 2,
            padding_lr: 0,
            padding_tb: 0,
            outer_eye_color: Some(red),
            inner_eye_color: Some(blue),
            ..QrOptions::default()
        };
        let img = renderer().render(&m, "eyes", &options).unwrap().image;
        // Ring corner, gap, and core of the top-right finder (box 2 px).
        let fx = (m.side() as u32 - 7) * 2;
        assert_eq!(*img.get_pixel(fx, 0), Rgba(red.to_rgba()));
        assert_eq!(*img.get_pixel(fx + 2, 2), Rgba([255, 255, 255, 255]));
        assert_eq!(*img.get_pixel(fx + 6, 6), Rgba(blue.to_rgba()));
    }

    #[test]
    fn small_matrix_skips_finders() {
        let m = ModuleMatrix::new(2, vec![true, false, false, true]).unwrap();
        let options = QrOptions {
            out_px: 20,
            padding_lr: 0,
            padding_tb: 0,
            ..QrOptions::default()
        };
        let img = renderer().render(&m, "tiny", &options).unwrap();
        assert_eq!(img.image, naive(&m, 10));
    }

    #[test]
    fn text_band_grows_height() {
        let m = qr("label");
        let mut options = QrOptions::default();
        let plain = renderer().render(&m, "label", &options).unwrap();
        assert_eq!((plain.width(), plain.height()), (300, 300));

        options.text = TextStyle {
            show: true,
            ..TextStyle::default()
        };
        let labelled = renderer().render(&m, "label", &options).unwrap();
        assert_eq!(labelled.width(), 300);
        assert!(labelled.height() > 300);
    }

    #[test]
    fn top_label_moves_modules_down() {
        let m = qr("top");
        let options = QrOptions {
            out_px: m.side() as u32 * 4,
            padding_lr: 0,
            padding_tb: 0,
            text: TextStyle {
                show: true,
                position: TextPosition::Top,
                ..TextStyle::default()
            },
            ..QrOptions::default()
        };
        let img = renderer().render(&m, "top", &options).unwrap().image;
        // Top-left finder corner is dark in the matrix; with the label on top the
        // first row of pixels belongs to the text band background.
        assert_eq!(*img.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        let (_, th) = BitmapRasterizer.measure("top", &GlyphStyle::from(&options.text));
        let band = th + 2 * options.text.margin_px;
        assert_eq!(*img.get_pixel(0, band), Rgba([0, 0, 0, 255]));
    }

    /// Leftmost dark pixel inside the label band at the bottom of `img`.
    fn label_left_edge(img: &RgbaImage, band: u32) -> Option<u32> {
        let top = img.height() - band;
        (0..img.width()).find(|&x| (top..img.height()).any(|y| img.get_pixel(x, y)[0] < 128))
    }

    #[test]
    fn label_alignment_respects_margins() {
        let m = qr("align");
        let w = m.side() as u32 * 4;
        let mut options = QrOptions {
            out_px: w,
            padding_lr: 0,
            padding_tb: 0,
            text: TextStyle {
                show: true,
                margin_px: 7,
                size_px: 16,
                ..TextStyle::default()
            },
            ..QrOptions::default()
        };
        // "H" has ink in its first bitmap column, so ink starts where the text does.
        let style = GlyphStyle::from(&options.text);
        let (tw, th) = BitmapRasterizer.measure("HH", &style);
        let band = th + 2 * options.text.margin_px;

        options.text.align = TextAlign::Left;
        let left = renderer().render(&m, "HH", &options).unwrap().image;
        assert_eq!(label_left_edge(&left, band), Some(7));

        options.text.align = TextAlign::Right;
        let right = renderer().render(&m, "HH", &options).unwrap().image;
        assert_eq!(right.width(), w);
        assert_eq!(label_left_edge(&right, band), Some(w - tw - 7));

        options.text.align = TextAlign::Center;
        let centred = renderer().render(&m, "HH", &options).unwrap().image;
        assert_eq!(label_left_edge(&centred, band), Some((w - tw) / 2));
    }
}
