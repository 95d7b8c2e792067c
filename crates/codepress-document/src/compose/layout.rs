// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry: how many fixed-size cells fit on a page, and where.

use codepress_core::{Arrangement, LayoutConfig};

/// Fixed page and cell dimensions for one composition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub page_width: u32,
    pub page_height: u32,
    pub margin: u32,
    pub spacing: u32,
    /// Caption gap plus caption height, reserved under every cell.
    pub caption_band: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl PageGeometry {
    pub fn new(layout: &LayoutConfig, cell: (u32, u32)) -> Self {
        let (page_width, page_height) = layout.page_size.pixels();
        Self {
            page_width,
            page_height,
            margin: layout.margin_px,
            spacing: layout.spacing_px,
            caption_band: layout.caption_band(),
            cell_width: cell.0.max(1),
            cell_height: cell.1.max(1),
        }
    }

    /// Right edge a cell may not cross.
    pub fn right_limit(&self) -> u32 {
        self.page_width.saturating_sub(self.margin)
    }

    /// Bottom edge a cell plus its caption may not cross.
    pub fn bottom_limit(&self) -> u32 {
        self.page_height.saturating_sub(self.margin)
    }

    /// Horizontal distance between neighbouring cell origins.
    pub fn column_pitch(&self) -> u32 {
        self.cell_width + self.spacing
    }

    /// Vertical distance between neighbouring row origins.
    pub fn row_pitch(&self) -> u32 {
        self.cell_height + self.caption_band + self.spacing
    }

    /// Cells per row (at least 1, even if a cell overhangs the page).
    pub fn columns_fit(&self) -> u32 {
        let usable = self.right_limit().saturating_sub(self.margin);
        if self.cell_width > usable {
            return 1;
        }
        1 + (usable - self.cell_width) / self.column_pitch()
    }

    /// Rows per page (at least 1).
    pub fn rows_fit(&self) -> u32 {
        let usable = self.bottom_limit().saturating_sub(self.margin);
        let block = self.cell_height + self.caption_band;
        if block > usable {
            return 1;
        }
        1 + (usable - block) / self.row_pitch()
    }

    /// Items one page holds under `arrangement`.
    pub fn capacity(&self, arrangement: Arrangement, vertical_per_page: u32) -> usize {
        let items = match arrangement {
            Arrangement::Horizontal => self.columns_fit() * self.rows_fit(),
            Arrangement::Vertical => self.rows_fit().min(vertical_per_page.max(1)),
        };
        items as usize
    }
}

/// Largest width and largest height over `sizes`, or `None` when empty.
pub fn max_cell(sizes: impl IntoIterator<Item = (u32, u32)>) -> Option<(u32, u32)> {
    sizes
        .into_iter()
        .fold(None, |acc, (w, h)| match acc {
            None => Some((w, h)),
            Some((mw, mh)) => Some((mw.max(w), mh.max(h))),
        })
}

/// First `max_chars` characters of `label`.
pub fn caption_text(label: &str, max_chars: usize) -> String {
    label.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepress_core::PageSize;

    fn layout() -> LayoutConfig {
        LayoutConfig {
            page_size: PageSize::A4,
            columns: 3,
            margin_px: 10,
            spacing_px: 10,
            caption_gap_px: 10,
            caption_size_px: 16,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn auto_sized_cells_fill_exactly_the_column_count() {
        let layout = layout();
        let cell = layout.auto_cell_width().unwrap();
        let geometry = PageGeometry::new(&layout, (cell, cell));
        assert_eq!(geometry.columns_fit(), 3);
    }

    #[test]
    fn capacity_by_arrangement() {
        let geometry = PageGeometry::new(&layout(), (813, 1600));
        assert_eq!(geometry.rows_fit(), 2);
        assert_eq!(geometry.capacity(Arrangement::Horizontal, 3), 6);
        assert_eq!(geometry.capacity(Arrangement::Vertical, 3), 2);

        let small = PageGeometry::new(&layout(), (300, 300));
        assert_eq!(small.capacity(Arrangement::Vertical, 3), 3);
    }

    #[test]
    fn oversized_cell_still_holds_one() {
        let geometry = PageGeometry::new(&layout(), (5000, 5000));
        assert_eq!(geometry.capacity(Arrangement::Horizontal, 3), 1);
    }

    #[test]
    fn cell_is_max_of_samples_and_captions_truncate() {
        assert_eq!(max_cell([(10, 40), (30, 20)]), Some((30, 40)));
        assert_eq!(max_cell(std::iter::empty()), None);
        assert_eq!(caption_text("abcdefghijklmnopqrstuvwxyz", 20), "abcdefghijklmnopqrst");
        assert_eq!(caption_text("短い", 20), "短い");
    }
}
