// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run-length profile of one binarised scanline.

use codepress_core::PixelClass;
use codepress_core::color::classify;
use image::RgbaImage;

/// Alternating `(class, length)` runs across one row, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarRunProfile {
    runs: Vec<(PixelClass, u32)>,
}

impl BarRunProfile {
    /// Binarise row `y` of `img` at `threshold` and run-length encode it.
    pub fn from_scanline(img: &RgbaImage, y: u32, threshold: u8) -> Self {
        let mut runs: Vec<(PixelClass, u32)> = Vec::new();
        if y >= img.height() {
            return Self { runs };
        }
        for x in 0..img.width() {
            let p = img.get_pixel(x, y);
            let class = classify([p[0], p[1], p[2]], threshold);
            match runs.last_mut() {
                Some((last, len)) if *last == class => *len += 1,
                _ => runs.push((class, 1)),
            }
        }
        Self { runs }
    }

    pub fn runs(&self) -> &[(PixelClass, u32)] {
        &self.runs
    }

    /// Shortest foreground run, floored at 1 (also 1 when there are no bars).
    pub fn narrowest_bar(&self) -> u32 {
        self.runs
            .iter()
            .filter(|(class, _)| *class == PixelClass::Foreground)
            .map(|(_, len)| *len)
            .min()
            .unwrap_or(1)
            .max(1)
    }
}
