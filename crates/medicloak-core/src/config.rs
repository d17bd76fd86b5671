// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MedicloakError, Result};

/// Label keywords whose values are redacted ("Name: John Doe").
pub const DEFAULT_LABELS: &[&str] = &[
    "patient name",
    "patient",
    "name",
    "phone",
    "mobile",
    "mobile no",
    "contact",
    "email",
    "address",
    "addr",
    "dob",
    "date of birth",
];

/// Extra keywords that end a label value without being redacted themselves.
pub const DEFAULT_BOUNDARY_KEYWORDS: &[&str] = &["age", "diagnosis", "mrn", "id"];

/// Entity kinds accepted from a named-entity recognizer.
pub const DEFAULT_NER_KINDS: &[&str] = &["person", "place", "organization", "date"];

/// Settings for one redaction engine.
///
/// Every field has a default so a partial JSON file is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Label keywords that introduce a sensitive value.
    pub labels: Vec<String>,
    /// Keywords that terminate a label value (labels always do too).
    pub boundary_keywords: Vec<String>,
    /// Entity kinds kept from the NER capability (compared case-insensitively).
    pub ner_kinds: Vec<String>,
    /// Shortest OCR token that may be masked for being part of a longer
    /// sensitive phrase.
    pub min_fragment_len: usize,
    /// Fill colour (RGB) of visual masks.
    pub mask_colour: [u8; 3],
    /// Run the visual token masker when page images are available.
    pub visual_redaction: bool,
    /// Assemble masked page images into a PDF.
    pub export_pdf: bool,
    /// Append a record of each run to the audit log.
    pub audit_enabled: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            labels: to_owned_list(DEFAULT_LABELS),
            boundary_keywords: to_owned_list(DEFAULT_BOUNDARY_KEYWORDS),
            ner_kinds: to_owned_list(DEFAULT_NER_KINDS),
            min_fragment_len: 2,
            mask_colour: [0, 0, 0],
            visual_redaction: true,
            export_pdf: true,
            audit_enabled: true,
        }
    }
}

impl RedactionConfig {
    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.labels.iter().all(|label| label.trim().is_empty()) {
            return Err(MedicloakError::InvalidConfig(
                "at least one label keyword is required".into(),
            ));
        }
        if self.min_fragment_len == 0 {
            return Err(MedicloakError::InvalidConfig(
                "min_fragment_len must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), "config loaded");
        Ok(config)
    }

    /// Read a config file, falling back to defaults when it is missing or bad.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    path = %path.as_ref().display(),
                    error = %err,
                    "using default redaction config"
                );
                Self::default()
            }
        }
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Labels plus boundary keywords, trimmed and lower-cased.
    pub fn all_boundary_keywords(&self) -> Vec<String> {
        self.labels
            .iter()
            .chain(self.boundary_keywords.iter())
            .map(|keyword| keyword.trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect()
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}
