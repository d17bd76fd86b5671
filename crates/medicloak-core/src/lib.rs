// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MediCloak — Core types, configuration, capabilities and error definitions
// shared across all crates.

pub mod capabilities;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use capabilities::{EntityRecognizer, EntitySpan, UnavailableRecognizer};
pub use config::RedactionConfig;
pub use error::MedicloakError;
pub use types::*;

/// Shown with every result: detection is heuristic and never exhaustive.
pub const BEST_EFFORT_NOTICE: &str = "Redaction is best-effort. The absence of a detected match is not proof that \
     no personal or health information remains. Review the output before sharing it.";
