// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redactor — the public entry point of the detection layer. Owns the compiled
// label patterns and NER filter for one configuration; the structured
// detector bank is shared process-wide.

use medicloak_core::capabilities::EntityRecognizer;
use medicloak_core::config::RedactionConfig;
use medicloak_core::error::Result;
use medicloak_core::types::{RedactionResult, SensitiveSubstringSet, Token};
use tracing::{info, instrument};

use crate::aggregate::SpanAggregator;
use crate::degradation::Degradations;
use crate::labels::LabelValueExtractor;
use crate::ner::NerAdapter;
use crate::patterns::DetectorBank;
use crate::text::TextMasker;
use crate::tokens::{TokenMasker, is_label_adjacent};

/// Detects sensitive substrings and masks text and OCR tokens.
///
/// Holds no per-document state; one instance can serve any number of runs.
pub struct Redactor {
    config: RedactionConfig,
    bank: &'static DetectorBank,
    labels: LabelValueExtractor,
    ner: NerAdapter,
}

impl Redactor {
    /// Build a redactor, rejecting invalid configuration.
    pub fn new(config: RedactionConfig) -> Result<Self> {
        config.validate()?;
        let labels = LabelValueExtractor::new(&config)?;
        let ner = NerAdapter::new(&config);
        Ok(Self {
            config,
            bank: DetectorBank::standard(),
            labels,
            ner,
        })
    }

    pub fn config(&self) -> &RedactionConfig {
        &self.config
    }

    pub fn labels(&self) -> &LabelValueExtractor {
        &self.labels
    }

    pub fn bank(&self) -> &DetectorBank {
        self.bank
    }

    /// Sensitive substrings from the detectors and label lines of `text`.
    pub fn detect(&self, text: &str) -> SensitiveSubstringSet {
        let mut degradations = Degradations::new();
        self.detect_with(text, &[] as &[&str], None, &mut degradations)
    }

    /// As [`Redactor::detect`], plus entities from an optional recognizer.
    pub fn detect_with_ner(
        &self,
        text: &str,
        recognizer: Option<&dyn EntityRecognizer>,
        degradations: &mut Degradations,
    ) -> SensitiveSubstringSet {
        self.detect_with(text, &[] as &[&str], recognizer, degradations)
    }

    /// Every detection layer: structured detectors, label values, manual
    /// keywords and (when given) recognised entities.
    #[instrument(skip_all, fields(
        text_len = text.len(),
        keyword_count = keywords.len(),
        ner = recognizer.is_some(),
    ))]
    pub fn detect_with<S: AsRef<str>>(
        &self,
        text: &str,
        keywords: &[S],
        recognizer: Option<&dyn EntityRecognizer>,
        degradations: &mut Degradations,
    ) -> SensitiveSubstringSet {
        let matches = self.bank.scan(text, degradations);
        let candidates = self.labels.candidates(text);
        let entities = match recognizer {
            Some(recognizer) if !text.trim().is_empty() => {
                self.ner.entity_texts(recognizer, text, degradations)
            }
            _ => Vec::new(),
        };

        let mut aggregator = SpanAggregator::new();
        aggregator
            .add_matches(&matches)
            .add_label_candidates(&candidates)
            .add_keywords(keywords)
            .add_entities(&entities);
        let set = aggregator.finish();

        info!(sensitive = set.len(), "detection complete");
        set
    }

    /// Redact `text` with the four-pass text masker.
    pub fn mask_text<S: AsRef<str>>(
        &self,
        text: &str,
        sensitive: &SensitiveSubstringSet,
        keywords: &[S],
    ) -> String {
        let mut degradations = Degradations::new();
        self.mask_text_with(text, sensitive, keywords, &mut degradations)
    }

    /// As [`Redactor::mask_text`], reporting skipped layers.
    pub fn mask_text_with<S: AsRef<str>>(
        &self,
        text: &str,
        sensitive: &SensitiveSubstringSet,
        keywords: &[S],
        degradations: &mut Degradations,
    ) -> String {
        TextMasker::new(self.bank, &self.labels).mask(text, sensitive, keywords, degradations)
    }

    /// Decide which OCR tokens must be covered. Regions only, no pixels.
    pub fn mask_tokens(
        &self,
        tokens: &[Token],
        sensitive: &SensitiveSubstringSet,
        degradations: &mut Degradations,
    ) -> RedactionResult {
        TokenMasker::new(self.bank, &self.labels, self.config.min_fragment_len)
            .mask(tokens, sensitive, degradations)
    }

    pub fn is_label_adjacent(&self, tokens: &[Token], index: usize) -> bool {
        is_label_adjacent(tokens, index, &self.labels)
    }
}

#[cfg(test)]
mod tests {
    use medicloak_core::error::MedicloakError;
    use medicloak_core::types::BoundingBox;

    use super::*;

    fn redactor() -> Redactor {
        Redactor::new(RedactionConfig::default()).unwrap()
    }

    #[test]
    fn detect_unions_detectors_and_labels() {
        let set = redactor().detect("Name: John Doe\nAge: 40\nmail a@b.com");
        assert!(set.contains("john doe"));
        assert!(set.contains("john"));
        assert!(set.contains("doe"));
        assert!(set.contains("a@b.com"));
        assert!(!set.contains("40"));
    }

    #[test]
    fn keywords_join_the_set() {
        let mut degradations = Degradations::new();
        let set = redactor().detect_with("nothing here", &["Ward 7", "x"], None, &mut degradations);
        assert!(set.contains("ward 7"));
        // Single characters are masked in text but never enter the set.
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = RedactionConfig {
            min_fragment_len: 0,
            ..RedactionConfig::default()
        };
        assert!(matches!(
            Redactor::new(config),
            Err(MedicloakError::InvalidConfig(_))
        ));
    }

    #[test]
    fn detect_then_mask() {
        let redactor = redactor();
        let text = "Name: John Doe\nJohn was seen on 12/05/2023";
        let set = redactor.detect(text);
        let masked = redactor.mask_text(text, &set, &[] as &[&str]);
        assert_eq!(masked, "Name: ████\n████ was seen on ████");
    }

    fn tokens(words: &[&str]) -> Vec<Token> {
        words
            .iter()
            .enumerate()
            .map(|(i, word)| Token::new(*word, BoundingBox::new(i as i32 * 60, 0, 50, 12), 0, i))
            .collect()
    }

    fn masked_words(redactor: &Redactor, words: &[&str], set: &SensitiveSubstringSet) -> Vec<String> {
        let mut degradations = Degradations::new();
        redactor
            .mask_tokens(&tokens(words), set, &mut degradations)
            .masked_regions
            .into_iter()
            .map(|region| region.original_text)
            .collect()
    }

    #[test]
    fn text_and_tokens_agree_on_three_word_labels() {
        let redactor = redactor();
        let text = "Date of Birth: Third March";
        let set = redactor.detect(text);
        assert_eq!(redactor.mask_text(text, &set, &[] as &[&str]), "Date of Birth: ████");

        let words = ["Date", "of", "Birth:", "Third", "March"];
        assert_eq!(masked_words(&redactor, &words, &set), vec!["Third", "March"]);
        assert_eq!(
            masked_words(&redactor, &words[..4], &SensitiveSubstringSet::new()),
            vec!["Third"]
        );
    }

    #[test]
    fn text_and_tokens_agree_on_members_that_grow_when_lower_cased() {
        let redactor = redactor();
        let set: SensitiveSubstringSet = ["İstanbul"].into_iter().collect();
        assert_eq!(
            redactor.mask_text("Born in İstanbul", &set, &[] as &[&str]),
            "Born in ████"
        );
        assert_eq!(
            masked_words(&redactor, &["Born", "in", "İstanbul"], &set),
            vec!["İstanbul"]
        );
    }
}
