// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster synthesis: QR matrices and 1-D symbols to sized, coloured bitmaps.

pub mod barcode;
pub mod canvas;
pub mod matrix;
pub mod placeholder;
pub mod runs;

use image::RgbaImage;

/// A rendered code plus the source text it encodes.
///
/// The label travels with the pixels so export can name files and draw
/// captions without re-reading the item list.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub image: RgbaImage,
    pub label: String,
}

impl RenderedImage {
    pub fn new(image: RgbaImage, label: impl Into<String>) -> Self {
        Self {
            image,
            label: label.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
