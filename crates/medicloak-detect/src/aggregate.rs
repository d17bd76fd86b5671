// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sensitive span aggregation — folds every detection layer into one
// normalised SensitiveSubstringSet.

use medicloak_core::types::{DetectorMatch, SensitiveSubstringSet};
use tracing::debug;

/// Collects candidates from each detection layer.
///
/// Normalisation (trim, lower-case, minimum length, de-duplication) is done by
/// the set itself, so the order layers are added in does not matter.
#[derive(Debug, Default)]
pub struct SpanAggregator {
    set: SensitiveSubstringSet,
    from_detectors: usize,
    from_labels: usize,
    from_keywords: usize,
    from_entities: usize,
}

impl SpanAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_matches(&mut self, matches: &[DetectorMatch]) -> &mut Self {
        for found in matches {
            if self.set.insert(&found.matched_text) {
                self.from_detectors += 1;
            }
        }
        self
    }

    pub fn add_label_candidates<S: AsRef<str>>(&mut self, candidates: &[S]) -> &mut Self {
        for candidate in candidates {
            if self.set.insert(candidate.as_ref()) {
                self.from_labels += 1;
            }
        }
        self
    }

    pub fn add_keywords<S: AsRef<str>>(&mut self, keywords: &[S]) -> &mut Self {
        for keyword in keywords {
            if self.set.insert(keyword.as_ref()) {
                self.from_keywords += 1;
            }
        }
        self
    }

    pub fn add_entities<S: AsRef<str>>(&mut self, entities: &[S]) -> &mut Self {
        for entity in entities {
            if self.set.insert(entity.as_ref()) {
                self.from_entities += 1;
            }
        }
        self
    }

    pub fn finish(self) -> SensitiveSubstringSet {
        debug!(
            total = self.set.len(),
            detectors = self.from_detectors,
            labels = self.from_labels,
            keywords = self.from_keywords,
            entities = self.from_entities,
            "sensitive substrings aggregated"
        );
        self.set
    }
}
