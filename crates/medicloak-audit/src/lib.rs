// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// medicloak-audit — Append-only record of redaction runs.
//
// Fingerprints source documents with SHA-256 and appends one row per run to a
// SQLite log. Counts and hashes only; document content is never stored.

pub mod audit;
pub mod integrity;

pub use audit::{AuditEntry, AuditLog, RunRecord};
pub use integrity::hash_bytes;
