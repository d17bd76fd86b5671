// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// medicloak-document — Document handling for the MediCloak redaction engine.
//
// Provides the OCR and document-extraction capability seams, page image
// decoding, PDF text extraction and redacted PDF export, the visual masker,
// and the per-document redaction session that ties them to the detector.

pub mod capabilities;
pub mod image;
pub mod pdf;
pub mod scan;
pub mod session;
pub mod visual;

// Re-export the primary types so callers can use `medicloak_document::RedactionSession` etc.
pub use capabilities::{
    DocumentExtractor, ExtractedDocument, OcrCapability, UnavailableExtractor, UnavailableOcr,
    join_tokens,
};
pub use image::processor::ImageProcessor;
pub use pdf::reader::PdfTextExtractor;
pub use pdf::writer::RedactedPdfWriter;
pub use session::{
    PageOutcome, RawDocument, RedactionReport, RedactionSession, ReportSummary, VisualStatus,
};
pub use visual::VisualMasker;

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrEngine;
