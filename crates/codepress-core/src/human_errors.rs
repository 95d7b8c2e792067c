// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how a front end presents it.

use crate::error::CodepressError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A temporary condition; running again may succeed.
    Transient,
    /// The user must change something (options, paths, free space).
    ActionRequired,
    /// Retrying with the same input will fail the same way.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether running the same request again could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `CodepressError` into a `HumanError`.
pub fn humanize_error(err: &CodepressError) -> HumanError {
    match err {
        // -- Per-item --
        CodepressError::Encoding(detail) => HumanError {
            message: "One of the entries can't be turned into this kind of code.".into(),
            suggestion: format!(
                "Check the entry matches the chosen barcode type (some only accept digits or a fixed length). ({detail})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CodepressError::Image(_) => HumanError {
            message: "An image couldn't be processed.".into(),
            suggestion: "Try again with smaller sizes. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        CodepressError::Font(detail) => HumanError {
            message: "The label font couldn't be loaded.".into(),
            suggestion: format!(
                "Check the font path points at a TrueType or OpenType file, or remove it to use the built-in font. ({detail})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Whole run --
        CodepressError::ResourceExhausted(_) => HumanError {
            message: "There isn't enough memory for this batch.".into(),
            suggestion: "Split the list into smaller batches, pick a smaller page size, or lower the code size.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CodepressError::InvalidOptions(detail) => HumanError {
            message: "Some of the settings don't make sense together.".into(),
            suggestion: format!("Adjust the settings and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CodepressError::Pdf(_) => HumanError {
            message: "The PDF couldn't be assembled.".into(),
            suggestion: "Try exporting as PNG instead, or export fewer items at once.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        CodepressError::Worker(_) => HumanError {
            message: "The background job stopped unexpectedly.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        CodepressError::FileIo { source, path, .. } => humanize_io(source, Some(path)),
        CodepressError::Io(io_err) => humanize_io(io_err, None),

        CodepressError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check the file is valid JSON, or remove it to use the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_io(io_err: &std::io::Error, path: Option<&std::path::PathBuf>) -> HumanError {
    let location = path
        .map(|p| format!(" ({})", p.display()))
        .unwrap_or_default();

    match io_err.kind() {
        std::io::ErrorKind::NotFound => HumanError {
            message: format!("A file or folder couldn't be found{location}."),
            suggestion: "Check the folder exists and the path is spelled correctly.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        std::io::ErrorKind::PermissionDenied => HumanError {
            message: format!("Permission was denied{location}."),
            suggestion: "Choose a folder you can write to, or check the file permissions.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        _ => HumanError {
            message: format!("There was a problem reading or writing a file{location}."),
            suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_exhaustion_needs_action() {
        let human = humanize_error(&CodepressError::ResourceExhausted("canvas".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn missing_output_dir_names_the_path() {
        let err = CodepressError::file_io(
            "write segment",
            "/nowhere/out_1.pdf",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("/nowhere/out_1.pdf"));
    }

    #[test]
    fn worker_loss_is_transient() {
        let human = humanize_error(&CodepressError::Worker("panicked".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn bad_payload_keeps_detail() {
        let human = humanize_error(&CodepressError::Encoding("ean13 requires 12 digits".into()));
        assert!(human.suggestion.contains("ean13 requires 12 digits"));
    }
}
