// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-only capability traits for external collaborators.
//
// Engines behind these traits are constructed by the caller and handed to the
// redaction entry points explicitly. Image-based capabilities (OCR, document
// extraction) live in `medicloak-document::capabilities`.

use serde::{Deserialize, Serialize};

use crate::error::{MedicloakError, Result};

/// An entity found by a named-entity recognizer. `start..end` is a byte range
/// into the text that was analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    /// Recogniser-specific kind label, e.g. "PERSON" or "person".
    pub kind: String,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, kind: impl Into<String>) -> Self {
        Self {
            start,
            end,
            kind: kind.into(),
        }
    }
}

/// Named-entity recognition over plain text.
pub trait EntityRecognizer {
    /// Short name used in logs and degradation records.
    fn name(&self) -> &str;

    /// Find entities in `text`.
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

/// Recognizer used when no model is installed.
pub struct UnavailableRecognizer;

impl EntityRecognizer for UnavailableRecognizer {
    fn name(&self) -> &str {
        "ner (unavailable)"
    }

    fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>> {
        tracing::warn!("EntityRecognizer::recognize called on unavailable recognizer");
        Err(MedicloakError::unavailable("NER", "no entity model loaded"))
    }
}
