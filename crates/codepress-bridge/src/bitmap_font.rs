// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in 8x8 bitmap face, used when no TrueType font is configured.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::mask;
use crate::traits::{GlyphStyle, TextRasterizer};

const CELL: u32 = 8;

/// Integer-scaled `font8x8` glyphs. Always available, never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitmapRasterizer;

impl BitmapRasterizer {
    /// Whole-pixel scale factor approximating `size`.
    fn scale(size: u32) -> u32 {
        ((size as f32 / CELL as f32).round() as u32).max(1)
    }

    fn coverage(text: &str, scale: u32) -> GrayImage {
        let chars = text.chars().count() as u32;
        let mut out = GrayImage::new(chars * CELL * scale, CELL * scale);
        for (i, ch) in text.chars().enumerate() {
            let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
                continue;
            };
            let origin_x = i as u32 * CELL * scale;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..CELL {
                    // Least significant bit is the leftmost pixel.
                    if (bits >> col) & 1 == 0 {
                        continue;
                    }
                    let px = origin_x + col * scale;
                    let py = row as u32 * scale;
                    for sy in 0..scale {
                        for sx in 0..scale {
                            out.put_pixel(px + sx, py + sy, Luma([255]));
                        }
                    }
                }
            }
        }
        out
    }

    fn styled(text: &str, style: &GlyphStyle) -> GrayImage {
        let scale = Self::scale(style.size);
        let bold = style.bold.then(|| mask::bold_offset(style.size));
        mask::stylize(Self::coverage(text, scale), bold, style.italic)
    }
}

impl TextRasterizer for BitmapRasterizer {
    fn measure(&self, text: &str, style: &GlyphStyle) -> (u32, u32) {
        let scale = Self::scale(style.size);
        let h = CELL * scale;
        let mut w = text.chars().count() as u32 * CELL * scale;
        if style.bold {
            w += mask::bold_offset(style.size);
        }
        if style.italic {
            w += mask::slant_extra(h);
        }
        (w, h)
    }

    fn draw(
        &self,
        canvas: &mut RgbaImage,
        x: i32,
        y: i32,
        text: &str,
        style: &GlyphStyle,
        color: Rgba<u8>,
    ) {
        mask::blit(canvas, &Self::styled(text, style), x, y, color);
    }

    fn face_name(&self) -> &str {
        "builtin 8x8"
    }
}
