// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch runner: render an ordered item list in bounded sub-batches, streaming
// each result out as soon as it exists.

use codepress_bridge::Codecs;
use codepress_core::error::Result;
use codepress_core::{EngineConfig, LayoutConfig, RenderOptions};
use codepress_document::compose::max_cell;
use tracing::{debug, info, instrument};

use crate::cancel::CancelFlag;
use crate::codes::{CodeFactory, RenderedItem};
use crate::events::BatchEvent;

/// Counters for one pass over the items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub placeholders: usize,
    pub cancelled: bool,
}

/// Renderer options with the layout's auto-sized cell fed back in, when the
/// layout asks for it.
pub fn sized_for_layout(options: &RenderOptions, layout: &LayoutConfig) -> RenderOptions {
    match layout.auto_cell_width() {
        Some(cell) => options.with_auto_size(cell),
        None => options.clone(),
    }
}

/// Sequential renderer over a list of payloads.
pub struct BatchRunner {
    factory: CodeFactory,
    engine: EngineConfig,
    cancel: CancelFlag,
}

impl BatchRunner {
    pub fn new(factory: CodeFactory, engine: EngineConfig, cancel: CancelFlag) -> Self {
        Self {
            factory,
            engine,
            cancel,
        }
    }

    /// Runner whose renderers share the engine's resource limits.
    pub fn with_codecs(codecs: Codecs, engine: EngineConfig, cancel: CancelFlag) -> Self {
        let factory = CodeFactory::new(codecs, engine.limits.clone());
        Self::new(factory, engine, cancel)
    }

    pub fn factory(&self) -> &CodeFactory {
        &self.factory
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Render every item, emitting `ItemCompleted` and `Progress` per item
    /// and `Finished` at the end (also on cancellation).
    ///
    /// A whole-run failure is returned without a `Finished` event; the
    /// worker relays it as [`BatchEvent::Failed`].
    #[instrument(skip_all, fields(items = items.len(), mode = ?options.mode()))]
    pub fn run(
        &self,
        items: &[String],
        options: &RenderOptions,
        emit: &mut dyn FnMut(BatchEvent),
    ) -> Result<BatchSummary> {
        options.validate()?;
        self.engine.validate()?;

        let total = items.len();
        let max_display = self.engine.max_display;
        let summary = self.for_each_item(items, options, |index, item| {
            let RenderedItem { image, placeholder } = item;
            emit(BatchEvent::ItemCompleted {
                index,
                label: image.label.clone(),
                placeholder,
                image: (index < max_display).then_some(image),
            });
            emit(BatchEvent::Progress {
                done: index + 1,
                total,
            });
            Ok(())
        })?;

        emit(BatchEvent::Finished {
            completed: summary.completed,
            cancelled: summary.cancelled,
        });
        info!(
            completed = summary.completed,
            placeholders = summary.placeholders,
            cancelled = summary.cancelled,
            "batch finished"
        );
        Ok(summary)
    }

    /// Largest rendered size over the leading `sample_size` items, or `None`
    /// if cancelled first.
    pub fn measure_cell(&self, items: &[String], options: &RenderOptions) -> Result<Option<(u32, u32)>> {
        let sample = &items[..items.len().min(self.engine.sample_size)];
        let mut sizes = Vec::with_capacity(sample.len());
        let summary = self.for_each_item(sample, options, |_, item| {
            sizes.push(item.image.dimensions());
            Ok(())
        })?;
        if summary.cancelled {
            return Ok(None);
        }
        Ok(max_cell(sizes))
    }

    /// Render items in order and hand each to `visit`, checking cancellation
    /// before every item and at sub-batch boundaries.
    ///
    /// Each rendered image is moved into `visit` and dropped there, so at most
    /// one item's buffers are alive at a time.
    pub fn for_each_item(
        &self,
        items: &[String],
        options: &RenderOptions,
        mut visit: impl FnMut(usize, RenderedItem) -> Result<()>,
    ) -> Result<BatchSummary> {
        let sub_batch = self.engine.sub_batch_size.max(1);
        let mut summary = BatchSummary::default();

        for (batch_no, chunk) in items.chunks(sub_batch).enumerate() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let base = batch_no * sub_batch;
            info!(
                sub_batch = batch_no + 1,
                start = base,
                len = chunk.len(),
                "sub-batch started"
            );

            for (offset, data) in chunk.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    summary.cancelled = true;
                    break;
                }
                let item = self.factory.render_or_placeholder(data, options)?;
                if item.placeholder {
                    summary.placeholders += 1;
                }
                debug!(index = base + offset, "item rendered");
                visit(base + offset, item)?;
                summary.completed += 1;
            }
            if summary.cancelled {
                break;
            }
        }

        if summary.cancelled {
            info!(completed = summary.completed, "run cancelled");
        }
        Ok(summary)
    }
}
