// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// medicloak-detect — Detection and masking for the MediCloak redaction engine.
//
// Provides the structured pattern detector bank, label-value extraction, the
// sensitive span aggregator, the NER adapter, and the text and token maskers
// behind a single `Redactor` facade.

pub mod aggregate;
pub mod degradation;
pub mod labels;
pub mod ner;
pub mod patterns;
pub mod redactor;
pub mod spans;
pub mod text;
pub mod tokens;

pub use aggregate::SpanAggregator;
pub use degradation::{Degradation, Degradations};
pub use labels::{LabelValue, LabelValueExtractor};
pub use ner::NerAdapter;
pub use patterns::DetectorBank;
pub use redactor::Redactor;
pub use text::TextMasker;
pub use tokens::{TokenMasker, is_label_adjacent};
