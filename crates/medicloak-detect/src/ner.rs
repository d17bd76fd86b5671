// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// NER adapter — turns an external entity recognizer into one more source of
// sensitive substrings. A missing or failing recognizer only removes this
// layer; it never fails the run.

use medicloak_core::capabilities::{EntityRecognizer, EntitySpan};
use medicloak_core::config::RedactionConfig;
use tracing::{debug, instrument};

use crate::degradation::Degradations;

/// Filters recognizer output to an allow-list of entity kinds.
#[derive(Debug, Clone)]
pub struct NerAdapter {
    kinds: Vec<String>,
}

impl NerAdapter {
    pub fn new(config: &RedactionConfig) -> Self {
        Self::with_kinds(config.ner_kinds.iter().map(String::as_str))
    }

    pub fn with_kinds<'a>(kinds: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            kinds: kinds.into_iter().map(canonical_kind).collect(),
        }
    }

    pub fn accepts(&self, kind: &str) -> bool {
        let kind = canonical_kind(kind);
        self.kinds.iter().any(|allowed| *allowed == kind)
    }

    /// Literal text of every accepted entity.
    ///
    /// Failures are recorded in `degradations` and yield no entities.
    #[instrument(skip_all, fields(recognizer = recognizer.name(), text_len = text.len()))]
    pub fn entity_texts(
        &self,
        recognizer: &dyn EntityRecognizer,
        text: &str,
        degradations: &mut Degradations,
    ) -> Vec<String> {
        let spans = match recognizer.recognize(text) {
            Ok(spans) => spans,
            Err(err) => {
                degradations.record_error("ner", &err);
                return Vec::new();
            }
        };
        let total = spans.len();
        let texts = self.filter_spans(text, &spans);
        debug!(total, kept = texts.len(), "entities filtered");
        texts
    }

    /// Keep spans of an accepted kind that lie on valid char boundaries.
    pub fn filter_spans(&self, text: &str, spans: &[EntitySpan]) -> Vec<String> {
        spans
            .iter()
            .filter(|span| self.accepts(&span.kind))
            .filter_map(|span| text.get(span.start..span.end))
            .map(str::trim)
            .filter(|entity| !entity.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Map recognizer-specific labels onto the configured vocabulary.
///
/// Common upper-case tag sets (PERSON, GPE, LOC, ORG) are folded into
/// person / place / organization.
pub fn canonical_kind(kind: &str) -> String {
    let lowered = kind.trim().to_lowercase();
    match lowered.as_str() {
        "per" | "person" | "people" => "person".into(),
        "gpe" | "loc" | "location" | "place" | "fac" => "place".into(),
        "org" | "organisation" | "organization" => "organization".into(),
        "date" | "time" => "date".into(),
        _ => lowered,
    }
}
