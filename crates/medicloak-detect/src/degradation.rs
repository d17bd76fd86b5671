// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Degradation tracking — records detection layers that were skipped during a
// run so callers can surface them instead of failing the request.

use medicloak_core::error::MedicloakError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One skipped layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    /// What was skipped, e.g. "detector:email", "ner", "ocr:page-2".
    pub component: String,
    pub reason: String,
}

/// Ordered, de-duplicated list of skipped layers for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradations {
    events: Vec<Degradation>,
}

impl Degradations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped component. Repeats of the same component are ignored.
    pub fn record(&mut self, component: impl Into<String>, reason: impl Into<String>) {
        let component = component.into();
        if self.events.iter().any(|event| event.component == component) {
            return;
        }
        let reason = reason.into();
        warn!(%component, %reason, "detection layer skipped");
        self.events.push(Degradation { component, reason });
    }

    /// Record a degradable error under `component`.
    pub fn record_error(&mut self, component: impl Into<String>, err: &MedicloakError) {
        self.record(component, err.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Degradation> {
        self.events.iter()
    }

    /// Whether anything with the given component prefix was skipped.
    pub fn affects(&self, prefix: &str) -> bool {
        self.events.iter().any(|event| event.component.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_are_collapsed() {
        let mut degradations = Degradations::new();
        degradations.record("detector:email", "regex compilation failed");
        degradations.record("detector:email", "regex compilation failed");
        degradations.record("ner", "no model");
        assert_eq!(degradations.len(), 2);
        assert!(degradations.affects("detector:"));
        assert!(!degradations.affects("ocr"));
    }

    #[test]
    fn records_error_text() {
        let mut degradations = Degradations::new();
        degradations.record_error("ner", &MedicloakError::unavailable("NER", "timeout"));
        let event = degradations.iter().next().unwrap();
        assert_eq!(event.reason, "NER unavailable: timeout");
    }
}
