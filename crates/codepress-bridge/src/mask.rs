// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coverage masks: synthetic bold/italic, and tinting a mask onto a canvas.

use image::{GrayImage, Luma, Rgba, RgbaImage, imageops};

/// Horizontal shear applied for synthetic italics (x shift per row).
const ITALIC_SHEAR: f32 = 0.2;

/// Stroke widening for synthetic bold at `size`.
pub(crate) fn bold_offset(size: u32) -> u32 {
    (size / 16).max(1)
}

/// Extra width the italic shear adds to a mask of `height` rows.
pub(crate) fn slant_extra(height: u32) -> u32 {
    (height.saturating_sub(1) as f32 * ITALIC_SHEAR).round() as u32
}

/// Widen strokes by OR-ing the mask with copies shifted right by 1..=offset.
pub(crate) fn embolden(mask: &GrayImage, offset: u32) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut out = GrayImage::new(w + offset, h);
    for y in 0..h {
        for x in 0..w {
            let c = mask.get_pixel(x, y)[0];
            if c == 0 {
                continue;
            }
            for dx in 0..=offset {
                let px = out.get_pixel_mut(x + dx, y);
                px[0] = px[0].max(c);
            }
        }
    }
    out
}

/// Shear the mask so the top row leans right.
pub(crate) fn slant(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    let extra = slant_extra(h);
    let mut out = GrayImage::new(w + extra, h);
    for y in 0..h {
        let shift = ((h - 1 - y) as f32 * ITALIC_SHEAR).round() as u32;
        for x in 0..w {
            let c = mask.get_pixel(x, y)[0];
            if c > 0 {
                out.put_pixel(x + shift, y, Luma([c]));
            }
        }
    }
    out
}

/// Apply the synthetic variants a face could not provide natively.
pub(crate) fn stylize(mask: GrayImage, bold: Option<u32>, italic: bool) -> GrayImage {
    let mask = match bold {
        Some(offset) => embolden(&mask, offset),
        None => mask,
    };
    if italic { slant(&mask) } else { mask }
}

/// Composite `color` through `mask` onto `canvas` with its top-left at
/// `(x, y)`. Parts outside the canvas are clipped.
pub(crate) fn blit(canvas: &mut RgbaImage, mask: &GrayImage, x: i32, y: i32, color: Rgba<u8>) {
    let Rgba([r, g, b, a]) = color;
    let tint = RgbaImage::from_fn(mask.width(), mask.height(), |mx, my| {
        let coverage = u16::from(mask.get_pixel(mx, my)[0]);
        Rgba([r, g, b, (u16::from(a) * coverage / 255) as u8])
    });
    imageops::overlay(canvas, &tint, i64::from(x), i64::from(y));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_mask() -> GrayImage {
        // Single vertical stroke, 1 px wide, 5 px tall.
        GrayImage::from_fn(3, 5, |x, _| if x == 1 { Luma([255]) } else { Luma([0]) })
    }

    #[test]
    fn embolden_widens_each_stroke() {
        let bold = embolden(&bar_mask(), 1);
        assert_eq!(bold.dimensions(), (4, 5));
        assert_eq!(bold.get_pixel(1, 0)[0], 255);
        assert_eq!(bold.get_pixel(2, 0)[0], 255);
        assert_eq!(bold.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn slant_shifts_top_rows_right() {
        let mask = GrayImage::from_pixel(1, 11, Luma([255]));
        let slanted = slant(&mask);
        assert_eq!(slanted.width(), 1 + slant_extra(11));
        assert_eq!(slanted.get_pixel(2, 0)[0], 255);
        assert_eq!(slanted.get_pixel(0, 10)[0], 255);
    }

    #[test]
    fn blit_clips_and_blends() {
        let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        blit(&mut canvas, &bar_mask(), -1, 0, Rgba([0, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
    }
}
