// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Codepress.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Codepress operations.
///
/// Cancellation is deliberately absent: a cancelled run ends in a terminal
/// status, never in an error.
#[derive(Debug, Error)]
pub enum CodepressError {
    // -- Per-item errors (a batch continues past these) --
    #[error("encoding rejected payload: {0}")]
    Encoding(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("font error: {0}")]
    Font(String),

    // -- Whole-run errors --
    #[error("resources exhausted: {0}")]
    ResourceExhausted(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("background worker failed: {0}")]
    Worker(String),

    // -- Storage / persistence --
    #[error("{operation} failed for {}: {source}", path.display())]
    FileIo {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CodepressError {
    /// Wrap an I/O error with the operation and path it concerned.
    pub fn file_io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileIo {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts the whole run rather than a single item.
    ///
    /// Encoding, image, and font failures are recovered per item by
    /// substituting a placeholder image.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Encoding(_) | Self::Image(_) | Self::Font(_)
        )
    }

    /// Whether this error is an allocation / memory-budget failure.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, Self::ResourceExhausted(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CodepressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_item_errors_are_not_fatal() {
        assert!(!CodepressError::Encoding("ean13 needs digits".into()).is_fatal());
        assert!(!CodepressError::Image("decode".into()).is_fatal());
        assert!(!CodepressError::Font("missing".into()).is_fatal());
    }

    #[test]
    fn run_errors_are_fatal() {
        assert!(CodepressError::ResourceExhausted("page canvas".into()).is_fatal());
        assert!(CodepressError::Pdf("save".into()).is_fatal());
        let io = CodepressError::file_io(
            "write page",
            "/tmp/out.png",
            std::io::Error::other("disk full"),
        );
        assert!(io.is_fatal());
        assert!(io.to_string().contains("/tmp/out.png"));
        assert!(io.to_string().contains("write page"));
    }
}
