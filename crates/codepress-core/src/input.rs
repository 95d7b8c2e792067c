// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Splitting raw pasted text into an ordered item list.

use serde::{Deserialize, Serialize};

/// Separator between payloads in raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Newline,
    /// Any of `,`, `;`, `\n`, `\r`.
    #[default]
    Auto,
}

impl Delimiter {
    fn matches(self, c: char) -> bool {
        match self {
            Self::Comma => c == ',',
            Self::Semicolon => c == ';',
            Self::Newline => c == '\n' || c == '\r',
            Self::Auto => matches!(c, ',' | ';' | '\n' | '\r'),
        }
    }
}

/// Split `raw` on `delimiter`, trimming entries and dropping empty ones.
pub fn split_items(raw: &str, delimiter: Delimiter) -> Vec<String> {
    raw.split(|c| delimiter.matches(c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
