// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the people reviewing redacted documents.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the CLI presents the message.

use crate::error::MedicloakError;

/// Severity of an error from the reviewer's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A detection layer was skipped; the rest of the result is still usable.
    Degraded,
    /// Something flaky happened; trying again may help.
    Transient,
    /// The reviewer must do something (pick another file, fix the config).
    ActionRequired,
    /// Cannot be fixed by retrying: wrong format, damaged file.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the reviewer should try.
    pub suggestion: String,
    /// Whether retrying could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `MedicloakError` into a `HumanError`.
pub fn humanize_error(err: &MedicloakError) -> HumanError {
    match err {
        // -- Detection --
        MedicloakError::DetectorFailure { detector, .. } => HumanError {
            message: format!("The {detector} check could not run."),
            suggestion: "Everything else was still redacted. Check that part of the document by hand before sharing it.".into(),
            retriable: false,
            severity: Severity::Degraded,
        },

        MedicloakError::ExternalServiceUnavailable { service, .. } => HumanError {
            message: format!("{service} isn't available, so it was skipped."),
            suggestion: "The text was still redacted with the built-in patterns. Review names and places yourself, or install the missing component and run again.".into(),
            retriable: true,
            severity: Severity::Degraded,
        },

        MedicloakError::EmptyInput => HumanError {
            message: "There was nothing to redact.".into(),
            suggestion: "The document had no readable text. If it is a scan, make sure text recognition is enabled.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Documents --
        MedicloakError::UnsupportedDocument(detail) => HumanError {
            message: "This type of document isn't supported.".into(),
            suggestion: format!("Try a PDF, PNG, JPEG or plain text file instead. (File type: {detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        MedicloakError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged or have no text layer. Try exporting the pages as images and redacting those.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        MedicloakError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        MedicloakError::OcrError(_) => HumanError {
            message: "Text recognition didn't work on this scan, so the image was not redacted.".into(),
            suggestion: "Try scanning the page again with better lighting and focus. Do not share the original image.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Configuration --
        MedicloakError::InvalidConfig(detail) => HumanError {
            message: "The redaction settings are not valid.".into(),
            suggestion: format!("Fix the settings file or delete it to use the defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Storage --
        MedicloakError::Database(_) => HumanError {
            message: "The audit log could not be written.".into(),
            suggestion: "The redaction itself finished. Check that the audit database location is writable.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        MedicloakError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "MediCloak doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere you own first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        MedicloakError::Serialization(_) => HumanError {
            message: "A settings or report file could not be read.".into(),
            suggestion: "Check that the file is valid JSON.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
