// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for MediCloak.

use thiserror::Error;

/// Top-level error type for all MediCloak operations.
#[derive(Debug, Error)]
pub enum MedicloakError {
    // -- Detection errors --
    #[error("detector {detector} failed: {reason}")]
    DetectorFailure { detector: String, reason: String },

    #[error("{service} unavailable: {reason}")]
    ExternalServiceUnavailable { service: String, reason: String },

    #[error("nothing to redact: no text and no tokens supplied")]
    EmptyInput,

    // -- Document errors --
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MedicloakError {
    /// Shorthand for an unavailable external capability.
    pub fn unavailable(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExternalServiceUnavailable {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a single detector that could not be evaluated.
    pub fn detector(detector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DetectorFailure {
            detector: detector.into(),
            reason: reason.into(),
        }
    }

    /// Whether the pipeline is expected to carry on after this error.
    ///
    /// Detector and external-service failures only remove one detection
    /// layer; everything else aborts the operation that raised it.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::DetectorFailure { .. } | Self::ExternalServiceUnavailable { .. } | Self::OcrError(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MedicloakError>;
