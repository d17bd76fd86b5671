// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text masker — redacts raw text in four passes:
//
// 1. every structured detector, in bank order;
// 2. label lines: everything after the label prefix;
// 3. manual keywords (anywhere, case-insensitive), then whole-word members of
//    the sensitive substring set;
// 4. the structured detectors once more, for anything passes 2-3 exposed.
//
// A replacement can expose a new word boundary next to a set member, so the
// four passes repeat until the text stops changing. Literals made only of
// marker characters are ignored, which keeps the repetition finite.

use medicloak_core::types::{MARKER, SensitiveSubstringSet};
use regex::Regex;
use tracing::{debug, instrument};

use crate::degradation::Degradations;
use crate::labels::LabelValueExtractor;
use crate::patterns::DetectorBank;
use crate::spans::replace_spans;

/// Upper bound on pipeline repetitions for one call.
const MAX_ROUNDS: usize = 8;

/// Applies the masking passes to plain text.
pub struct TextMasker<'a> {
    bank: &'a DetectorBank,
    labels: &'a LabelValueExtractor,
}

impl<'a> TextMasker<'a> {
    pub fn new(bank: &'a DetectorBank, labels: &'a LabelValueExtractor) -> Self {
        Self { bank, labels }
    }

    /// Redact `text`. Keywords are trimmed; empty ones are ignored.
    #[instrument(skip_all, fields(
        text_len = text.len(),
        set_len = sensitive.len(),
        keyword_count = keywords.len(),
    ))]
    pub fn mask<S: AsRef<str>>(
        &self,
        text: &str,
        sensitive: &SensitiveSubstringSet,
        keywords: &[S],
        degradations: &mut Degradations,
    ) -> String {
        let mut masked = self.mask_once(text, sensitive, keywords, degradations);
        let mut rounds = 1;
        while rounds < MAX_ROUNDS {
            let next = self.mask_once(&masked, sensitive, keywords, degradations);
            rounds += 1;
            if next == masked {
                break;
            }
            masked = next;
        }

        debug!(
            rounds,
            markers = masked.matches(MARKER).count(),
            "text masking complete"
        );
        masked
    }

    /// One run of the four passes.
    pub fn mask_once<S: AsRef<str>>(
        &self,
        text: &str,
        sensitive: &SensitiveSubstringSet,
        keywords: &[S],
        degradations: &mut Degradations,
    ) -> String {
        let masked = self.bank.redact(text, MARKER, degradations);
        let masked = self.mask_label_lines(&masked);
        let masked = mask_keywords(&masked, keywords, degradations);
        let masked = mask_members(&masked, sensitive, degradations);
        self.bank.redact(&masked, MARKER, degradations)
    }

    /// Replace the value of every label line, keeping the label prefix and
    /// the line terminator exactly as written.
    pub fn mask_label_lines(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        for line in text.split_inclusive('\n') {
            let (content, terminator) = split_terminator(line);
            match self.labels.match_line(content) {
                Some(value) => {
                    output.push_str(&content[..value.value_start]);
                    output.push_str(MARKER);
                }
                None => output.push_str(content),
            }
            output.push_str(terminator);
        }
        output
    }
}

/// Case-insensitive literal replacement of each keyword.
pub fn mask_keywords<S: AsRef<str>>(
    text: &str,
    keywords: &[S],
    degradations: &mut Degradations,
) -> String {
    let mut current = text.to_owned();
    for keyword in keywords {
        let keyword = keyword.as_ref().trim();
        if keyword.is_empty() || is_marker_only(keyword) {
            continue;
        }
        let folded = FoldedText::new(&current);
        match folded.find_all(keyword, false) {
            Ok(spans) => current = replace_spans(&current, spans, MARKER),
            Err(err) => degradations.record("keyword", err.to_string()),
        }
    }
    current
}

/// Whole-word, case-insensitive replacement of every set member.
///
/// All members are matched against the same input and overlapping hits are
/// merged, so a phrase and its own words collapse into one marker.
pub fn mask_members(
    text: &str,
    sensitive: &SensitiveSubstringSet,
    degradations: &mut Degradations,
) -> String {
    let folded = FoldedText::new(text);
    let mut spans = Vec::new();
    for member in sensitive.iter().filter(|member| !is_marker_only(member)) {
        match folded.find_all(member, true) {
            Ok(found) => spans.extend(found),
            Err(err) => degradations.record("sensitive-set", err.to_string()),
        }
    }
    replace_spans(text, spans, MARKER)
}

/// A lower-cased copy of a text that remembers, for every byte, which
/// original character produced it.
///
/// Lower-casing can change a character's length ("İ" becomes "i̇"), so
/// literals are searched in the folded copy and each hit is mapped back to
/// whole characters of the original.
struct FoldedText {
    folded: String,
    /// Original byte range of the character behind each folded byte.
    origin: Vec<(usize, usize)>,
}

impl FoldedText {
    fn new(text: &str) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());
        for (start, c) in text.char_indices() {
            let range = (start, start + c.len_utf8());
            for lower in fold_char(c) {
                folded.push(lower);
                origin.extend(std::iter::repeat_n(range, lower.len_utf8()));
            }
        }
        Self { folded, origin }
    }

    /// Original byte spans of every occurrence of `literal`.
    fn find_all(
        &self,
        literal: &str,
        whole_word: bool,
    ) -> Result<Vec<(usize, usize)>, regex::Error> {
        let literal: String = literal.chars().flat_map(fold_char).collect();
        let regex = literal_regex(&literal, whole_word)?;
        Ok(regex
            .find_iter(&self.folded)
            .filter(|m| !m.is_empty())
            .map(|m| (self.origin[m.start()].0, self.origin[m.end() - 1].1))
            .collect())
    }
}

/// Per-character lower case. Final sigma folds to plain sigma so the result
/// does not depend on the neighbouring characters.
fn fold_char(c: char) -> impl Iterator<Item = char> {
    c.to_lowercase().map(|lower| if lower == 'ς' { 'σ' } else { lower })
}

/// Build a regex for an already folded literal. With `whole_word`, ends that
/// are word characters must sit on a word boundary.
fn literal_regex(literal: &str, whole_word: bool) -> Result<Regex, regex::Error> {
    let mut pattern = regex::escape(literal);
    if whole_word {
        if literal.chars().next().is_some_and(is_word_char) {
            pattern.insert_str(0, r"\b");
        }
        if literal.chars().last().is_some_and(is_word_char) {
            pattern.push_str(r"\b");
        }
    }
    Regex::new(&pattern)
}

fn is_marker_only(literal: &str) -> bool {
    literal.chars().all(|c| MARKER.contains(c))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn split_terminator(line: &str) -> (&str, &str) {
    let content_len = line.trim_end_matches(['\n', '\r']).len();
    line.split_at(content_len)
}

#[cfg(test)]
mod tests {
    use medicloak_core::config::RedactionConfig;

    use super::*;

    fn mask(text: &str, set: &SensitiveSubstringSet, keywords: &[&str]) -> String {
        let labels = LabelValueExtractor::new(&RedactionConfig::default()).unwrap();
        let masker = TextMasker::new(DetectorBank::standard(), &labels);
        let mut degradations = Degradations::new();
        masker.mask(text, set, keywords, &mut degradations)
    }

    #[test]
    fn label_value_is_masked_but_age_kept() {
        let out = mask("Name: John Doe\nAge: 40", &SensitiveSubstringSet::new(), &[]);
        assert_eq!(out, "Name: ████\nAge: 40");
    }

    #[test]
    fn structured_literals_removed() {
        let out = mask(
            "Reach a@b.com or 9876543210. Aadhaar 1234 5678 9012.",
            &SensitiveSubstringSet::new(),
            &[],
        );
        assert!(!out.contains("a@b.com"));
        assert!(!out.contains("9876543210"));
        assert!(!out.contains("1234 5678 9012"));
        assert_eq!(out.matches(MARKER).count(), 2 + 1);
    }

    #[test]
    fn keywords_are_case_insensitive_and_can_be_one_char() {
        let out = mask("Ward X, bed x1", &SensitiveSubstringSet::new(), &[" x "]);
        assert_eq!(out, "Ward ████, bed ████1");
    }

    #[test]
    fn set_members_are_whole_word() {
        let set: SensitiveSubstringSet = ["john doe", "doe", "of"].into_iter().collect();
        let out = mask("Seen John Doe of Pune; Doe's office", &set, &[]);
        assert_eq!(out, "Seen ████ ████ Pune; ████'s office");
    }

    #[test]
    fn members_that_change_length_when_lower_cased() {
        let set: SensitiveSubstringSet = ["İstanbul"].into_iter().collect();
        assert_eq!(mask("Born in İstanbul", &set, &[]), "Born in ████");

        let set: SensitiveSubstringSet = ["Ödön İnce"].into_iter().collect();
        assert_eq!(mask("Ref: ÖDÖN İNCE, Ward 3", &set, &[]), "Ref: ████, Ward 3");
    }

    #[test]
    fn keywords_that_change_length_when_lower_cased() {
        let out = mask("Seen at İzmir clinic", &SensitiveSubstringSet::new(), &["i\u{307}zmir"]);
        assert_eq!(out, "Seen at ████ clinic");
    }

    #[test]
    fn final_sigma_matches_either_form() {
        let set: SensitiveSubstringSet = ["ΟΔΥΣΣΕΥΣ"].into_iter().collect();
        assert_eq!(mask("Seen Οδυσσευς here", &set, &[]), "Seen ████ here");
    }

    #[test]
    fn preserves_crlf_terminators() {
        let out = mask("Phone: 12 34\r\nNote\r\n", &SensitiveSubstringSet::new(), &[]);
        assert_eq!(out, "Phone: ████\r\nNote\r\n");
    }

    #[test]
    fn remasking_is_a_no_op() {
        let set: SensitiveSubstringSet = ["john doe", "john"].into_iter().collect();
        let text = "Patient Name: John Doe  MRN-5521\nDOB 12/03/1981\nemail j@x.org, pin 560001";
        let once = mask(text, &set, &["Rao"]);
        let twice = mask(&once, &set, &["Rao"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn member_glued_to_a_number_is_still_caught() {
        let set: SensitiveSubstringSet = ["john"].into_iter().collect();
        let once = mask("John9876543210 called", &set, &[]);
        assert_eq!(once, "████████ called");
        assert_eq!(mask(&once, &set, &[]), once);
    }

    #[test]
    fn marker_keywords_are_ignored() {
        let out = mask("Ward ████", &SensitiveSubstringSet::new(), &["█", "██"]);
        assert_eq!(out, "Ward ████");
    }

    #[test]
    fn empty_text_stays_empty() {
        assert_eq!(mask("", &SensitiveSubstringSet::new(), &["x"]), "");
    }
}
