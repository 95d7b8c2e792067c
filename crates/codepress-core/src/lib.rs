// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Codepress: core types, options, and error definitions shared across all crates.

pub mod color;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod input;
pub mod types;

pub use color::{ColorSpec, PixelClass};
pub use config::{
    AppConfig, BarcodeOptions, EngineConfig, FontConfig, LayoutConfig, QrOptions, RenderOptions,
    ResourceLimits, TextStyle,
};
pub use error::CodepressError;
pub use input::{Delimiter, split_items};
pub use types::*;
