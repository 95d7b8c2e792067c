// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-way messages from a worker to the control surface.

use codepress_core::CodepressError;
use codepress_document::RenderedImage;

use crate::export::ExportStatus;

/// Generation run events, emitted in non-decreasing item order.
#[derive(Debug)]
pub enum BatchEvent {
    /// Item `index` finished. `image` is only carried for the first
    /// `max_display` items.
    ItemCompleted {
        index: usize,
        label: String,
        placeholder: bool,
        image: Option<RenderedImage>,
    },
    Progress { done: usize, total: usize },
    /// The run ended normally or was cancelled.
    Finished { completed: usize, cancelled: bool },
    /// The run was aborted by a whole-run failure.
    Failed(CodepressError),
}

/// Export run events.
#[derive(Debug)]
pub enum ExportEvent {
    /// Short status line for the current phase.
    Status(String),
    Progress { done: usize, total: usize },
    /// Informational message, e.g. an artifact written.
    Message(String),
    /// Something the user should know about but which does not stop the run.
    Warning(String),
    /// Terminal status. Always the last event of a run.
    Finished(ExportStatus),
}
