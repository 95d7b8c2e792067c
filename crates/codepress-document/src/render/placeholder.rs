// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed-size stand-in for items whose payload could not be encoded.

use codepress_bridge::{GlyphStyle, TextRasterizer};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Side of the placeholder square.
pub const PLACEHOLDER_PX: u32 = 200;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Red square with a white "ERROR" legend, carrying the original label.
pub fn error_placeholder(text: &dyn TextRasterizer, label: &str) -> super::RenderedImage {
    let mut image = RgbaImage::from_pixel(PLACEHOLDER_PX, PLACEHOLDER_PX, RED);
    draw_hollow_rect_mut(
        &mut image,
        Rect::at(4, 4).of_size(PLACEHOLDER_PX - 8, PLACEHOLDER_PX - 8),
        WHITE,
    );
    text.draw(&mut image, 10, 10, "ERROR", &GlyphStyle::regular(16), WHITE);
    super::RenderedImage::new(image, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepress_bridge::bitmap_font::BitmapRasterizer;

    #[test]
    fn placeholder_is_fixed_size_and_red() {
        let img = error_placeholder(&BitmapRasterizer, "bad payload");
        assert_eq!((img.width(), img.height()), (PLACEHOLDER_PX, PLACEHOLDER_PX));
        assert_eq!(img.label, "bad payload");
        assert_eq!(*img.image.get_pixel(100, 150), RED);
        assert!(img.image.pixels().any(|p| *p == WHITE));
    }
}
