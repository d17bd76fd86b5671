// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label-value extraction — finds "Label: value" lines and derives the phrases
// to redact from the value.
//
// This layer is the main source of both false positives (short generic words
// in a value get redacted everywhere) and false negatives (long free-form
// values are only partly captured). Both are accepted limitations.

use std::collections::HashSet;

use medicloak_core::config::RedactionConfig;
use medicloak_core::error::{MedicloakError, Result};
use regex::Regex;
use tracing::{debug, instrument};

/// Phrases with at most this many words are also split into single words.
const MAX_SPLIT_WORDS: usize = 4;

/// A label line and the candidates derived from its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelValue {
    /// The label as written in the document.
    pub label: String,
    /// Byte offset (within the line) where the value begins.
    pub value_start: usize,
    /// The truncated, trimmed value phrase.
    pub phrase: String,
    /// Redaction candidates, phrase first.
    pub candidates: Vec<String>,
}

/// Finds label-driven values in text.
pub struct LabelValueExtractor {
    /// Matches a whole line: optional indent, label, optional `:`/`-`, value.
    line_re: Regex,
    /// Matches the first boundary keyword inside a value.
    boundary_re: Option<Regex>,
    /// Run of two or more blanks, or a tab.
    gap_re: Regex,
    /// Lower-cased labels for token lookups.
    labels: HashSet<String>,
    /// Word count of the longest label.
    max_label_words: usize,
}

impl LabelValueExtractor {
    /// Build an extractor from the configured label and boundary keywords.
    pub fn new(config: &RedactionConfig) -> Result<Self> {
        let mut labels: Vec<String> = config
            .labels
            .iter()
            .map(|label| label.trim().to_lowercase())
            .filter(|label| !label.is_empty())
            .collect();
        if labels.is_empty() {
            return Err(MedicloakError::InvalidConfig(
                "at least one label keyword is required".into(),
            ));
        }
        // Longest first so "patient name" wins over "patient".
        labels.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        labels.dedup();

        let line_pattern = format!(
            r"(?i)^[ \t]*(?P<label>{})[ \t]*[:\-]?[ \t]*(?P<value>[^\s:\-].*?)[ \t\r]*$",
            keyword_alternation(&labels)
        );
        let line_re = Regex::new(&line_pattern)
            .map_err(|err| MedicloakError::InvalidConfig(format!("label pattern: {err}")))?;

        let mut boundaries = config.all_boundary_keywords();
        boundaries.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        boundaries.dedup();
        let boundary_re = if boundaries.is_empty() {
            None
        } else {
            let pattern = format!(r"(?i)(?:^|[^\w])(?:{})", keyword_alternation(&boundaries));
            Some(Regex::new(&pattern).map_err(|err| {
                MedicloakError::InvalidConfig(format!("boundary pattern: {err}"))
            })?)
        };

        let gap_re = Regex::new(r"[ ]{2,}|\t")
            .map_err(|err| MedicloakError::InvalidConfig(format!("gap pattern: {err}")))?;

        let max_label_words = labels
            .iter()
            .map(|label| label.split_whitespace().count())
            .max()
            .unwrap_or(1);

        Ok(Self {
            line_re,
            boundary_re,
            gap_re,
            labels: labels.into_iter().collect(),
            max_label_words,
        })
    }

    /// Whether a single token (e.g. "Name:" or "DOB") is a label keyword.
    pub fn is_label(&self, token: &str) -> bool {
        let normalized = normalize_label_token(token);
        !normalized.is_empty() && self.labels.contains(&normalized)
    }

    /// Whether two consecutive tokens together spell a multi-word label.
    pub fn is_label_pair(&self, first: &str, second: &str) -> bool {
        self.is_label_sequence(&[first, second])
    }

    /// Whether consecutive tokens, in reading order, spell one label
    /// (e.g. `["Date", "of", "Birth:"]`).
    pub fn is_label_sequence(&self, words: &[&str]) -> bool {
        let mut normalized = Vec::with_capacity(words.len());
        for word in words {
            let word = normalize_label_token(word);
            if word.is_empty() {
                return false;
            }
            normalized.push(word);
        }
        !normalized.is_empty() && self.labels.contains(&normalized.join(" "))
    }

    /// Number of words in the longest configured label.
    pub fn max_label_words(&self) -> usize {
        self.max_label_words
    }

    /// Match one line (without its terminator) against the label pattern.
    pub fn match_line(&self, line: &str) -> Option<LabelValue> {
        let caps = self.line_re.captures(line)?;
        let label = caps.name("label")?;
        let value = caps.name("value")?;

        let phrase = self.truncate_value(value.as_str());
        Some(LabelValue {
            label: label.as_str().to_owned(),
            value_start: value.start(),
            candidates: split_candidates(&phrase),
            phrase,
        })
    }

    /// Every label line in `text`.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub fn extract(&self, text: &str) -> Vec<LabelValue> {
        let found: Vec<LabelValue> = text.lines().filter_map(|line| self.match_line(line)).collect();
        debug!(label_lines = found.len(), "label extraction complete");
        found
    }

    /// Flattened redaction candidates for `text`.
    pub fn candidates(&self, text: &str) -> Vec<String> {
        self.extract(text)
            .into_iter()
            .flat_map(|value| value.candidates)
            .collect()
    }

    /// Cut the value at a wide gap and then at the next boundary keyword.
    fn truncate_value<'a>(&self, value: &'a str) -> String {
        let mut phrase: &'a str = match self.gap_re.find(value) {
            Some(gap) => &value[..gap.start()],
            None => value,
        };
        if let Some(boundary_re) = &self.boundary_re {
            if let Some(hit) = boundary_re.find(phrase) {
                phrase = &phrase[..hit.start()];
            }
        }
        phrase.trim().to_owned()
    }
}

/// Derive candidates from a truncated phrase.
///
/// Short phrases also yield every word so that OCR splitting the phrase into
/// tokens still lines up; long phrases yield their first two words, which is
/// where a name usually sits.
pub fn split_candidates(phrase: &str) -> Vec<String> {
    if phrase.is_empty() {
        return Vec::new();
    }
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let mut candidates = vec![phrase.to_owned()];

    if words.len() <= MAX_SPLIT_WORDS {
        candidates.extend(
            words
                .iter()
                .map(|word| word.trim_matches(|c| c == ':' || c == ','))
                .filter(|word| word.chars().count() >= 2)
                .map(str::to_owned),
        );
    } else {
        candidates.push(words[..2].join(" "));
    }
    candidates
}

/// Regex alternation of escaped keywords. Spaces inside a keyword match any
/// run of blanks; a trailing word character gets a word boundary.
fn keyword_alternation(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|keyword| {
            let escaped = keyword
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"[ \t]+");
            if keyword.chars().last().is_some_and(|c| c.is_alphanumeric() || c == '_') {
                format!(r"{escaped}\b")
            } else {
                escaped
            }
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn normalize_label_token(token: &str) -> String {
    token
        .trim()
        .trim_end_matches(|c: char| c == ':' || c == '-' || c.is_whitespace())
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> LabelValueExtractor {
        LabelValueExtractor::new(&RedactionConfig::default()).unwrap()
    }

    #[test]
    fn short_value_yields_phrase_and_words() {
        let value = extractor().match_line("Name: John Doe").unwrap();
        assert_eq!(value.label, "Name");
        assert_eq!(value.phrase, "John Doe");
        assert_eq!(value.candidates, vec!["John Doe", "John", "Doe"]);
        assert_eq!(value.value_start, 6);
    }

    #[test]
    fn stops_at_next_label() {
        let value = extractor().match_line("Name: John Age: 45").unwrap();
        assert_eq!(value.phrase, "John");
    }

    #[test]
    fn stops_at_wide_gap_and_tab() {
        let ex = extractor();
        assert_eq!(ex.match_line("Name: John Doe    Ward 4").unwrap().phrase, "John Doe");
        assert_eq!(ex.match_line("Name: Jane\tBed 9").unwrap().phrase, "Jane");
    }

    #[test]
    fn long_value_yields_first_two_words() {
        let value = extractor()
            .match_line("Address: 14 Lake View Road Near City Mall")
            .unwrap();
        assert_eq!(
            value.candidates,
            vec!["14 Lake View Road Near City Mall", "14 Lake"]
        );
    }

    #[test]
    fn separator_is_optional_and_case_insensitive() {
        let ex = extractor();
        assert_eq!(ex.match_line("PHONE - 555 1234").unwrap().phrase, "555 1234");
        assert_eq!(ex.match_line("  dob 01/02/1990").unwrap().phrase, "01/02/1990");
    }

    #[test]
    fn longest_label_wins() {
        let value = extractor().match_line("Patient Name: Asha Rao").unwrap();
        assert_eq!(value.label, "Patient Name");
        assert_eq!(value.phrase, "Asha Rao");
    }

    #[test]
    fn label_must_be_a_whole_word() {
        assert!(extractor().match_line("Names were not recorded").is_none());
    }

    #[test]
    fn age_is_not_a_redaction_label_by_default() {
        assert!(extractor().match_line("Age: 40").is_none());
    }

    #[test]
    fn label_without_value_is_ignored() {
        assert!(extractor().match_line("Name:   ").is_none());
    }

    #[test]
    fn words_are_stripped_of_punctuation() {
        assert_eq!(split_candidates("Doe, John"), vec!["Doe, John", "Doe", "John"]);
        // Single-character words are dropped.
        assert_eq!(split_candidates("J Doe"), vec!["J Doe", "Doe"]);
    }

    #[test]
    fn token_label_lookup() {
        let ex = extractor();
        assert!(ex.is_label("Name"));
        assert!(ex.is_label("name:"));
        assert!(ex.is_label("DOB-"));
        assert!(!ex.is_label("John"));
        assert!(!ex.is_label(":"));
        assert!(ex.is_label_pair("Mobile", "No:"));
        assert!(!ex.is_label_pair("Mobile", "Phone"));
    }

    #[test]
    fn label_sequences_of_any_length() {
        let ex = extractor();
        assert!(ex.is_label_sequence(&["Date", "of", "Birth:"]));
        assert!(ex.is_label_sequence(&["DOB"]));
        assert!(!ex.is_label_sequence(&["of", "Birth:"]));
        assert!(!ex.is_label_sequence(&["Date", ":", "Birth"]));
        assert!(!ex.is_label_sequence(&[]));
        assert!(ex.max_label_words() >= 3);
    }

    #[test]
    fn candidates_across_lines() {
        let text = "Name: John Doe\nAge: 40\nPhone: 9876543210";
        assert_eq!(
            extractor().candidates(text),
            vec!["John Doe", "John", "Doe", "9876543210", "9876543210"]
        );
    }

    #[test]
    fn empty_labels_rejected() {
        let config = RedactionConfig {
            labels: Vec::new(),
            ..RedactionConfig::default()
        };
        assert!(LabelValueExtractor::new(&config).is_err());
    }
}
