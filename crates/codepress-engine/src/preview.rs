// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live preview: the first composed page, scaled down for display.

use codepress_core::error::Result;
use codepress_core::{LayoutConfig, RenderOptions};
use codepress_document::{ImageProcessor, PageCompositor, Placement};
use image::RgbImage;
use tracing::{debug, instrument};

use crate::runner::{BatchRunner, sized_for_layout};

/// Compose the first page from at most `min(capacity, max_display)` items
/// and shrink it to fit `viewport`. Never upscales.
///
/// Returns `None` for an empty item list or a cancelled run.
#[instrument(skip_all, fields(items = items.len(), viewport = ?viewport))]
pub fn render_preview(
    runner: &BatchRunner,
    items: &[String],
    options: &RenderOptions,
    layout: &LayoutConfig,
    viewport: (u32, u32),
) -> Result<Option<RgbImage>> {
    options.validate()?;
    layout.validate()?;
    let options = sized_for_layout(options, layout);
    let engine = runner.engine();

    let shown = &items[..items.len().min(engine.max_display)];
    let Some(cell) = runner.measure_cell(shown, &options)? else {
        return Ok(None);
    };
    let mut compositor = PageCompositor::new(
        layout,
        cell,
        runner.factory().text().clone(),
        engine.limits.clone(),
    );
    let shown = &shown[..shown.len().min(compositor.capacity())];

    let summary = runner.for_each_item(shown, &options, |_, item| {
        // Capacity is derived from the same geometry, so the page never fills early.
        if compositor.place(&item.image.image, &item.image.label)? == Placement::PageFull {
            debug!("preview page full");
        }
        Ok(())
    })?;
    if summary.cancelled {
        return Ok(None);
    }
    let Some(page) = compositor.flush_page() else {
        return Ok(None);
    };

    let (max_w, max_h) = viewport;
    let preview = ImageProcessor::from_rgb(page)
        .shrink_to_fit(max_w.max(1), max_h.max(1))
        .into_rgb();
    debug!(width = preview.width(), height = preview.height(), "preview ready");
    Ok(Some(preview))
}
