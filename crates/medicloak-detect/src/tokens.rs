// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Token masking decisions — decides which OCR tokens must be covered on the
// page image. No pixels are touched here; drawing lives in medicloak-document.

use medicloak_core::types::{MaskTrigger, MaskedRegion, RedactionResult, SensitiveSubstringSet, Token};
use tracing::{debug, instrument};

use crate::degradation::Degradations;
use crate::labels::LabelValueExtractor;
use crate::patterns::DetectorBank;

/// Applies the four token rules in order: exact member, fragment of a member,
/// structured detector, label adjacency.
pub struct TokenMasker<'a> {
    bank: &'a DetectorBank,
    labels: &'a LabelValueExtractor,
    min_fragment_len: usize,
}

impl<'a> TokenMasker<'a> {
    pub fn new(bank: &'a DetectorBank, labels: &'a LabelValueExtractor, min_fragment_len: usize) -> Self {
        Self {
            bank,
            labels,
            min_fragment_len,
        }
    }

    /// The rule that masks `tokens[index]`, if any.
    pub fn decide(
        &self,
        tokens: &[Token],
        index: usize,
        sensitive: &SensitiveSubstringSet,
        degradations: &mut Degradations,
    ) -> Option<MaskTrigger> {
        let token = tokens.get(index)?;
        if token.is_blank() {
            return None;
        }

        let key = comparison_key(&token.text);
        if !key.is_empty() {
            if sensitive.contains(&key) {
                return Some(MaskTrigger::ExactMember);
            }
            if key.chars().count() >= self.min_fragment_len && sensitive.has_member_containing(&key) {
                return Some(MaskTrigger::Fragment);
            }
        }

        if let Some(kind) = self.bank.first_matching(token.text.trim(), degradations) {
            return Some(MaskTrigger::Detector(kind));
        }

        if is_label_adjacent(tokens, index, self.labels) {
            return Some(MaskTrigger::LabelAdjacent);
        }
        None
    }

    /// Decide every token. The result carries regions only; its
    /// `redacted_text` is left empty.
    #[instrument(skip_all, fields(token_count = tokens.len(), set_len = sensitive.len()))]
    pub fn mask(
        &self,
        tokens: &[Token],
        sensitive: &SensitiveSubstringSet,
        degradations: &mut Degradations,
    ) -> RedactionResult {
        let masked_regions: Vec<MaskedRegion> = (0..tokens.len())
            .filter_map(|index| {
                let trigger = self.decide(tokens, index, sensitive, degradations)?;
                let token = &tokens[index];
                Some(MaskedRegion {
                    page_index: token.page_index,
                    bounding_box: token.bounding_box,
                    original_text: token.text.clone(),
                    trigger,
                })
            })
            .collect();

        debug!(masked = masked_regions.len(), "token decisions complete");
        RedactionResult {
            redacted_text: String::new(),
            masked_regions,
        }
    }
}

/// Whether `tokens[index]` is the value that directly follows a label.
///
/// Looks back over punctuation-only separators (such as `:`) and stops at
/// blank tokens and page changes. True when the nearest content tokens, read
/// back as far as the longest label, end in a label keyword ("Name", "Mobile
/// No", "Date of Birth"). Separators themselves, and a token that completes a
/// multi-word label with its predecessors, are never label-adjacent.
pub fn is_label_adjacent(tokens: &[Token], index: usize, labels: &LabelValueExtractor) -> bool {
    let Some(token) = tokens.get(index) else {
        return false;
    };
    if token.is_blank() || is_separator(&token.text) {
        return false;
    }

    // Nearest content token first.
    let max_words = labels.max_label_words().max(1);
    let mut content: Vec<&str> = Vec::with_capacity(max_words);
    let mut directly_before = false;
    for (offset, previous) in tokens[..index].iter().rev().enumerate() {
        if previous.page_index != token.page_index || previous.is_blank() {
            break;
        }
        if is_separator(&previous.text) {
            if content.is_empty() {
                continue;
            }
            break;
        }
        if content.is_empty() {
            directly_before = offset == 0;
        }
        content.push(&previous.text);
        if content.len() == max_words {
            break;
        }
    }
    if content.is_empty() {
        return false;
    }

    // Reading order: the `words` nearest content tokens, then `last` if given.
    let spells_label = |words: usize, last: Option<&str>| {
        let mut sequence: Vec<&str> = content[..words].iter().rev().copied().collect();
        sequence.extend(last);
        labels.is_label_sequence(&sequence)
    };

    let completes_label = directly_before
        && (1..max_words.min(content.len() + 1))
            .any(|words| spells_label(words, Some(token.text.as_str())));
    if completes_label {
        return false;
    }
    (1..=content.len()).any(|words| spells_label(words, None))
}

/// A non-empty token made only of punctuation or symbols.
fn is_separator(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.chars().all(|c| !c.is_alphanumeric())
}

/// Lower-cased token text without the punctuation OCR tends to attach.
fn comparison_key(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '.' | '(' | ')' | '[' | ']' | '"' | '\''))
        .to_lowercase()
}
