// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pattern detector bank — one regular expression per structured format,
// always applied in the fixed order of `DetectorKind::ALL`.
//
// Separators are spaces or tabs, never newlines, so a match cannot swallow a
// line break and merge two lines of the document.

use std::sync::LazyLock;

use medicloak_core::error::MedicloakError;
use medicloak_core::types::{DetectorKind, DetectorMatch};
use regex::Regex;
use tracing::{debug, instrument};

use crate::degradation::Degradations;
use crate::spans::replace_spans;

const EMAIL: &str = r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}";
const PHONE: &str =
    r"(?:\+?\d{1,3}[- \t]?)?(?:\d{10}|\d{5}[- \t]\d{5}|\d{3}[-. \t]\d{3}[-. \t]\d{4})";
const DATE: &str = r"\b(?:\d{1,2}[-/]\d{1,2}[-/]\d{2,4}|\d{4}[-/]\d{1,2}[-/]\d{1,2})\b";
const NATIONAL_ID: &str = r"\b\d{4}[ \t]?\d{4}[ \t]?\d{4}\b";
const ALPHANUMERIC_ID: &str = r"(?i)\b[A-Z]{5}\d{4}[A-Z]\b";
const RECORD_NUMBER: &str = r"(?i)\bMRN-?\d+\b";
const INSURANCE_ID: &str = r"(?i)\bINS[-_ \t]?\d+\b";
const POSTAL_CODE: &str = r"\b\d{6}\b";

/// Source pattern of a built-in detector.
pub fn standard_pattern(kind: DetectorKind) -> &'static str {
    match kind {
        DetectorKind::Email => EMAIL,
        DetectorKind::Phone => PHONE,
        DetectorKind::Date => DATE,
        DetectorKind::NationalId => NATIONAL_ID,
        DetectorKind::AlphanumericId => ALPHANUMERIC_ID,
        DetectorKind::RecordNumber => RECORD_NUMBER,
        DetectorKind::InsuranceId => INSURANCE_ID,
        DetectorKind::PostalCode => POSTAL_CODE,
    }
}

static STANDARD_BANK: LazyLock<DetectorBank> = LazyLock::new(|| {
    DetectorBank::from_patterns(
        DetectorKind::ALL
            .iter()
            .map(|kind| (*kind, standard_pattern(*kind))),
    )
});

/// A single structured-format detector.
///
/// `regex` is `None` when the pattern failed to compile; the detector is then
/// skipped and reported as degraded instead of aborting the pipeline.
pub struct Detector {
    pub kind: DetectorKind,
    regex: Option<Regex>,
    compile_error: Option<String>,
}

impl Detector {
    pub fn compile(kind: DetectorKind, pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => Self {
                kind,
                regex: Some(regex),
                compile_error: None,
            },
            Err(err) => Self {
                kind,
                regex: None,
                compile_error: Some(err.to_string()),
            },
        }
    }

    /// The compiled regex, or the reason this detector cannot run.
    fn regex(&self) -> Result<&Regex, MedicloakError> {
        self.regex.as_ref().ok_or_else(|| {
            MedicloakError::detector(
                self.kind.name(),
                self.compile_error
                    .as_deref()
                    .unwrap_or("regex compilation failed"),
            )
        })
    }

    /// All non-overlapping matches, in text order.
    pub fn find_all(&self, text: &str) -> Result<Vec<DetectorMatch>, MedicloakError> {
        let regex = self.regex()?;
        Ok(regex
            .find_iter(text)
            .map(|m| DetectorMatch {
                start: m.start(),
                end: m.end(),
                matched_text: m.as_str().to_owned(),
                kind: self.kind,
            })
            .collect())
    }

    /// Whether the detector matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> Result<bool, MedicloakError> {
        Ok(self.regex()?.is_match(text))
    }
}

/// The ordered set of structured detectors.
pub struct DetectorBank {
    detectors: Vec<Detector>,
}

impl DetectorBank {
    /// The built-in bank, compiled once per process.
    pub fn standard() -> &'static DetectorBank {
        &STANDARD_BANK
    }

    /// Build a bank from explicit patterns, kept in the order given.
    pub fn from_patterns<'a>(patterns: impl IntoIterator<Item = (DetectorKind, &'a str)>) -> Self {
        Self {
            detectors: patterns
                .into_iter()
                .map(|(kind, pattern)| Detector::compile(kind, pattern))
                .collect(),
        }
    }

    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    /// Run every detector over `text` and return the matches sorted by start
    /// offset, ties broken by detector order.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub fn scan(&self, text: &str, degradations: &mut Degradations) -> Vec<DetectorMatch> {
        let mut matches = Vec::new();
        for detector in &self.detectors {
            match detector.find_all(text) {
                Ok(found) => matches.extend(found),
                Err(err) => degradations.record_error(component(detector.kind), &err),
            }
        }
        matches.sort_by_key(|m| (m.start, detector_rank(m.kind)));
        debug!(match_count = matches.len(), "detector scan complete");
        matches
    }

    /// Replace every match with `marker`, one detector at a time in bank
    /// order. Each detector sees the output of the previous one, so a long
    /// specific identifier is gone before a generic numeric pattern runs.
    pub fn redact(&self, text: &str, marker: &str, degradations: &mut Degradations) -> String {
        let mut current = text.to_owned();
        for detector in &self.detectors {
            match detector.find_all(&current) {
                Ok(found) if !found.is_empty() => {
                    let spans = found.iter().map(|m| (m.start, m.end)).collect();
                    current = replace_spans(&current, spans, marker);
                }
                Ok(_) => {}
                Err(err) => degradations.record_error(component(detector.kind), &err),
            }
        }
        current
    }

    /// The first detector (in bank order) that matches `text` in isolation.
    pub fn first_matching(&self, text: &str, degradations: &mut Degradations) -> Option<DetectorKind> {
        for detector in &self.detectors {
            match detector.is_match(text) {
                Ok(true) => return Some(detector.kind),
                Ok(false) => {}
                Err(err) => degradations.record_error(component(detector.kind), &err),
            }
        }
        None
    }
}

fn component(kind: DetectorKind) -> String {
    format!("detector:{}", kind.name())
}

fn detector_rank(kind: DetectorKind) -> usize {
    DetectorKind::ALL
        .iter()
        .position(|candidate| *candidate == kind)
        .unwrap_or(DetectorKind::ALL.len())
}
