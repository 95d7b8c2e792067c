// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page compositor: places fixed-size cells with captions onto white page
// canvases, one page at a time.

use std::sync::Arc;

use codepress_bridge::{GlyphStyle, TextRasterizer};
use codepress_core::error::Result;
use codepress_core::{Arrangement, LayoutConfig, ResourceLimits};
use image::{Rgb, Rgba, RgbImage, RgbaImage, imageops};
use tracing::{debug, info, warn};

use super::layout::{PageGeometry, caption_text};
use crate::image::ImageProcessor;
use crate::render::canvas;

const PAGE_WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const CAPTION_INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Outcome of offering one image to the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Pasted with its top-left corner at (`x`, `y`).
    PlacedAt { x: u32, y: u32 },
    /// The current page has no room. Flush it and offer the image again.
    PageFull,
}

/// The page under construction.
struct PageBuffer {
    canvas: RgbImage,
    x: u32,
    y: u32,
    items: usize,
}

/// Stateful compositor for one export run.
///
/// Every image is fitted to the same cell, so pages are uniform and the
/// per-page capacity is known up front.
pub struct PageCompositor {
    geometry: PageGeometry,
    arrangement: Arrangement,
    vertical_per_page: u32,
    caption_gap: u32,
    caption_max_chars: usize,
    caption_style: GlyphStyle,
    text: Arc<dyn TextRasterizer>,
    limits: ResourceLimits,
    page: Option<PageBuffer>,
    pages_flushed: usize,
}

impl PageCompositor {
    pub fn new(
        layout: &LayoutConfig,
        cell: (u32, u32),
        text: Arc<dyn TextRasterizer>,
        limits: ResourceLimits,
    ) -> Self {
        let geometry = PageGeometry::new(layout, cell);
        debug!(
            cell_w = geometry.cell_width,
            cell_h = geometry.cell_height,
            columns = geometry.columns_fit(),
            rows = geometry.rows_fit(),
            "page geometry"
        );
        Self {
            geometry,
            arrangement: layout.arrangement,
            vertical_per_page: layout.vertical_per_page,
            caption_gap: layout.caption_gap_px,
            caption_max_chars: layout.caption_max_chars,
            caption_style: GlyphStyle::regular(layout.caption_size_px),
            text,
            limits,
            page: None,
            pages_flushed: 0,
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Items one page holds.
    pub fn capacity(&self) -> usize {
        self.geometry
            .capacity(self.arrangement, self.vertical_per_page)
    }

    pub fn pages_flushed(&self) -> usize {
        self.pages_flushed
    }

    // -- Placement ------------------------------------------------------------

    /// Offer `image` with `caption` to the current page.
    ///
    /// Returns [`Placement::PageFull`] without touching the page when the
    /// item does not fit. An item that cannot fit even an empty page is
    /// placed anyway and clipped.
    pub fn place(&mut self, image: &RgbaImage, caption: &str) -> Result<Placement> {
        let g = self.geometry;
        if self.page.is_none() {
            let canvas = canvas::filled_rgb(g.page_width, g.page_height, PAGE_WHITE, &self.limits)?;
            self.page = Some(PageBuffer {
                canvas,
                x: g.margin,
                y: g.margin,
                items: 0,
            });
        }
        let Some(page) = self.page.as_mut() else {
            return Ok(Placement::PageFull);
        };

        let (mut x, mut y) = (page.x, page.y);
        if page.items > 0 && self.arrangement == Arrangement::Horizontal && x + g.cell_width > g.right_limit() {
            x = g.margin;
            y += g.row_pitch();
        }

        let overflows = y + g.cell_height + g.caption_band > g.bottom_limit()
            || x + g.cell_width > g.right_limit();
        if page.items > 0 {
            let capped = self.arrangement == Arrangement::Vertical
                && page.items >= self.vertical_per_page.max(1) as usize;
            if capped || overflows {
                return Ok(Placement::PageFull);
            }
        } else if overflows {
            warn!(
                cell_w = g.cell_width,
                cell_h = g.cell_height,
                "cell exceeds the printable area, clipping"
            );
        }

        let tile = ImageProcessor::from_rgba(image.clone())
            .flatten(PAGE_WHITE)
            .fit_exact(g.cell_width, g.cell_height)
            .into_rgb();
        imageops::replace(&mut page.canvas, &tile, i64::from(x), i64::from(y));

        let caption = caption_text(caption, self.caption_max_chars);
        if !caption.is_empty() {
            let tile = render_caption(self.text.as_ref(), &caption, &self.caption_style, &self.limits)?;
            let cy = y + g.cell_height + self.caption_gap;
            imageops::replace(&mut page.canvas, &tile, i64::from(x), i64::from(cy));
        }

        page.items += 1;
        match self.arrangement {
            Arrangement::Horizontal => {
                page.x = x + g.column_pitch();
                page.y = y;
            }
            Arrangement::Vertical => {
                page.x = g.margin;
                page.y = y + g.row_pitch();
            }
        }
        Ok(Placement::PlacedAt { x, y })
    }

    /// Hand over the current page, if it holds anything, and start afresh.
    pub fn flush_page(&mut self) -> Option<RgbImage> {
        let page = self.page.take()?;
        if page.items == 0 {
            return None;
        }
        self.pages_flushed += 1;
        info!(page = self.pages_flushed, items = page.items, "page composed");
        Some(page.canvas)
    }
}

/// Caption rendered black on white, cropped to its measured size.
fn render_caption(
    text: &dyn TextRasterizer,
    caption: &str,
    style: &GlyphStyle,
    limits: &ResourceLimits,
) -> Result<RgbImage> {
    let (w, h) = text.measure(caption, style);
    let mut tile = canvas::filled_rgba(w.max(1), h.max(1), Rgba([255, 255, 255, 255]), limits)?;
    text.draw(&mut tile, 0, 0, caption, style, CAPTION_INK);
    Ok(ImageProcessor::from_rgba(tile).into_rgb())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepress_bridge::bitmap_font::BitmapRasterizer;
    use codepress_core::PageSize;

    fn layout(arrangement: Arrangement) -> LayoutConfig {
        LayoutConfig {
            page_size: PageSize::A4,
            arrangement,
            columns: 3,
            margin_px: 10,
            spacing_px: 10,
            caption_gap_px: 10,
            caption_size_px: 16,
            vertical_per_page: 3,
            ..LayoutConfig::default()
        }
    }

    fn compositor(arrangement: Arrangement, cell: (u32, u32)) -> PageCompositor {
        PageCompositor::new(
            &layout(arrangement),
            cell,
            Arc::new(BitmapRasterizer),
            ResourceLimits::default(),
        )
    }

    fn black(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn wraps_into_rows_of_column_count() {
        let mut c = compositor(Arrangement::Horizontal, (813, 813));
        let img = black(813, 813);
        let mut spots = Vec::new();
        for i in 0..7 {
            match c.place(&img, &format!("item {i}")).unwrap() {
                Placement::PlacedAt { x, y } => spots.push((x, y)),
                Placement::PageFull => panic!("page full at {i}"),
            }
        }
        let pitch = 813 + 26 + 10;
        assert_eq!(spots[0], (10, 10));
        assert_eq!(spots[2], (10 + 2 * 823, 10));
        assert_eq!(spots[3], (10, 10 + pitch));
        assert_eq!(spots[6], (10, 10 + 2 * pitch));
        let rows: std::collections::BTreeSet<u32> = spots.iter().map(|s| s.1).collect();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn full_page_is_reported_then_flushed() {
        let mut c = compositor(Arrangement::Horizontal, (813, 1600));
        assert_eq!(c.capacity(), 6);
        let img = black(100, 100);
        for _ in 0..6 {
            assert!(matches!(c.place(&img, "x").unwrap(), Placement::PlacedAt { .. }));
        }
        assert_eq!(c.place(&img, "x").unwrap(), Placement::PageFull);
        let page = c.flush_page().unwrap();
        assert_eq!(page.dimensions(), PageSize::A4.pixels());
        assert_eq!(c.pages_flushed(), 1);
        assert!(c.flush_page().is_none());
        assert_eq!(
            c.place(&img, "x").unwrap(),
            Placement::PlacedAt { x: 10, y: 10 }
        );
    }

    #[test]
    fn vertical_caps_items_per_page() {
        let mut c = compositor(Arrangement::Vertical, (300, 300));
        let img = black(300, 300);
        let mut ys = Vec::new();
        for _ in 0..3 {
            match c.place(&img, "").unwrap() {
                Placement::PlacedAt { x, y } => {
                    assert_eq!(x, 10);
                    ys.push(y);
                }
                Placement::PageFull => panic!("early page break"),
            }
        }
        assert_eq!(ys, vec![10, 10 + 336, 10 + 2 * 336]);
        assert_eq!(c.place(&img, "").unwrap(), Placement::PageFull);
    }

    #[test]
    fn oversized_cell_is_clipped_on_an_empty_page() {
        let mut c = compositor(Arrangement::Horizontal, (3000, 4000));
        let img = black(10, 10);
        assert_eq!(
            c.place(&img, "big").unwrap(),
            Placement::PlacedAt { x: 10, y: 10 }
        );
        assert_eq!(c.place(&img, "big").unwrap(), Placement::PageFull);
    }

    #[test]
    fn cells_are_stretched_and_captions_drawn() {
        let mut c = compositor(Arrangement::Horizontal, (200, 200));
        c.place(&black(50, 80), "caption").unwrap();
        let page = c.flush_page().unwrap();
        // Stretched cell covers its full box.
        assert_eq!(*page.get_pixel(10 + 199, 10 + 199), Rgb([0, 0, 0]));
        assert_eq!(*page.get_pixel(10 + 201, 10), PAGE_WHITE);
        // Caption ink sits in the band below the cell.
        let band_top = 10 + 200 + 10;
        let inked = (band_top..band_top + 16)
            .any(|y| (10..200).any(|x| page.get_pixel(x, y)[0] < 128));
        assert!(inked);
    }

    #[test]
    fn flush_without_items_yields_nothing() {
        let mut c = compositor(Arrangement::Horizontal, (100, 100));
        assert!(c.flush_page().is_none());
        assert_eq!(c.pages_flushed(), 0);
    }
}
