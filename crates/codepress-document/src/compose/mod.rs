// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page composition: grid geometry and the page-at-a-time compositor.

pub mod layout;
pub mod page;

pub use layout::{PageGeometry, caption_text, max_cell};
pub use page::{PageCompositor, Placement};
