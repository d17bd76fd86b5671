// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page text extraction and redacted page export.

pub mod reader;
pub mod writer;

pub use reader::PdfTextExtractor;
pub use writer::RedactedPdfWriter;
