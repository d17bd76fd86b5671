// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the MediCloak redaction engine.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed opaque replacement substituted for redacted text.
///
/// Made of U+2588 FULL BLOCK characters, which are neither word characters
/// nor digits, so no detector can ever match the marker itself.
pub const MARKER: &str = "████";

/// Minimum length (in characters) of a sensitive substring.
pub const MIN_SENSITIVE_LEN: usize = 2;

/// Unique identifier for one redaction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned pixel rectangle in page-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.left.saturating_add(i32::try_from(self.width).unwrap_or(i32::MAX))
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.top.saturating_add(i32::try_from(self.height).unwrap_or(i32::MAX))
    }

    /// A zero-area box cannot be drawn.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One OCR-recognised word.
///
/// Produced by an external OCR capability and only ever read by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub bounding_box: BoundingBox,
    /// Zero-based page this token was recognised on.
    pub page_index: usize,
    /// Position of the token in reading order across the document.
    pub sequence_position: usize,
}

impl Token {
    pub fn new(
        text: impl Into<String>,
        bounding_box: BoundingBox,
        page_index: usize,
        sequence_position: usize,
    ) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            page_index,
            sequence_position,
        }
    }

    /// Blank tokens mark line and field boundaries in OCR output.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The structured formats recognised by the pattern detector bank, in the
/// order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetectorKind {
    Email,
    Phone,
    Date,
    /// Grouped 12-digit national identity number.
    NationalId,
    /// Five letters, four digits, one letter.
    AlphanumericId,
    /// "MRN" followed by digits.
    RecordNumber,
    /// "INS" followed by digits.
    InsuranceId,
    /// Six-digit postal code.
    PostalCode,
}

impl DetectorKind {
    /// Every detector, specific formats before generic numeric ones.
    pub const ALL: [DetectorKind; 8] = [
        Self::Email,
        Self::Phone,
        Self::Date,
        Self::NationalId,
        Self::AlphanumericId,
        Self::RecordNumber,
        Self::InsuranceId,
        Self::PostalCode,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Date => "date",
            Self::NationalId => "national_id",
            Self::AlphanumericId => "alphanumeric_id",
            Self::RecordNumber => "record_number",
            Self::InsuranceId => "insurance_id",
            Self::PostalCode => "postal_code",
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single structured-pattern hit. `start..end` is a byte range into the
/// text the detector ran over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorMatch {
    pub start: usize,
    pub end: usize,
    pub matched_text: String,
    pub kind: DetectorKind,
}

/// Case-insensitive set of strings deemed sensitive.
///
/// Entries are trimmed and lower-cased on insertion and anything shorter than
/// [`MIN_SENSITIVE_LEN`] characters is dropped. The set holds no positions:
/// the text masker and the visual masker each work out "where" on their own,
/// using string identity as the only bridge between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveSubstringSet {
    entries: BTreeSet<String>,
}

impl SensitiveSubstringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalise a candidate the same way the set does.
    pub fn normalize(candidate: &str) -> Option<String> {
        let lowered = candidate.trim().to_lowercase();
        if lowered.chars().count() < MIN_SENSITIVE_LEN {
            return None;
        }
        Some(lowered)
    }

    /// Insert a candidate. Returns `true` if it was new and long enough.
    pub fn insert(&mut self, candidate: &str) -> bool {
        match Self::normalize(candidate) {
            Some(entry) => self.entries.insert(entry),
            None => false,
        }
    }

    pub fn contains(&self, candidate: &str) -> bool {
        Self::normalize(candidate).is_some_and(|entry| self.entries.contains(&entry))
    }

    /// Whether `fragment` (already lower-cased) occurs inside any member.
    pub fn has_member_containing(&self, fragment: &str) -> bool {
        !fragment.is_empty() && self.entries.iter().any(|entry| entry.contains(fragment))
    }

    /// Members in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another set into this one.
    pub fn merge(&mut self, other: &SensitiveSubstringSet) {
        self.entries.extend(other.entries.iter().cloned());
    }
}

impl<S: AsRef<str>> FromIterator<S> for SensitiveSubstringSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<S: AsRef<str>> Extend<S> for SensitiveSubstringSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for candidate in iter {
            self.insert(candidate.as_ref());
        }
    }
}

/// Which rule caused a token to be masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskTrigger {
    /// Token text equals a sensitive substring.
    ExactMember,
    /// Token text is a fragment of a longer sensitive phrase.
    Fragment,
    /// A structured detector matched the token on its own.
    Detector(DetectorKind),
    /// The token directly follows a label keyword.
    LabelAdjacent,
}

/// One masked area of a page image, kept for audit.
///
/// `original_text` is the pre-redaction token text and must not be shown to
/// the end user by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedRegion {
    pub page_index: usize,
    pub bounding_box: BoundingBox,
    pub original_text: String,
    pub trigger: MaskTrigger,
}

/// Outcome of masking one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionResult {
    pub redacted_text: String,
    pub masked_regions: Vec<MaskedRegion>,
}

impl RedactionResult {
    /// Number of masked regions on the given page.
    pub fn regions_on_page(&self, page_index: usize) -> usize {
        self.masked_regions
            .iter()
            .filter(|region| region.page_index == page_index)
            .count()
    }
}

/// Split a comma-separated keyword list into trimmed, non-empty keywords.
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_owned)
        .collect()
}
