// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image-side capability traits — OCR and document extraction.
//
// Implementations are built by the caller and passed into a session. The
// `Unavailable*` types stand in when an engine is not installed, so a run
// degrades to text-only redaction instead of failing.

use image::DynamicImage;
use medicloak_core::error::{MedicloakError, Result};
use medicloak_core::types::Token;
use tracing::warn;

/// Optical character recognition over one page image.
pub trait OcrCapability {
    /// Short name used in logs and degradation records.
    fn name(&self) -> &str;

    /// Recognised words in reading order. Blank tokens mark line breaks.
    fn tokens(&self, image: &DynamicImage, page_index: usize) -> Result<Vec<Token>>;

    /// Plain-text transcription of the page.
    fn transcribe(&self, image: &DynamicImage) -> Result<String> {
        Ok(join_tokens(&self.tokens(image, 0)?))
    }
}

/// Text and page images recovered from an encoded document.
#[derive(Debug, Clone, Default)]
pub struct ExtractedDocument {
    /// One entry per page, in page order.
    pub page_texts: Vec<String>,
    /// Rendered pages. Empty when the extractor cannot rasterise.
    pub page_images: Vec<DynamicImage>,
}

impl ExtractedDocument {
    pub fn page_count(&self) -> usize {
        self.page_texts.len().max(self.page_images.len())
    }

    /// All page texts joined with newlines.
    pub fn text(&self) -> String {
        self.page_texts.join("\n")
    }
}

/// Decodes an encoded document (PDF and the like) into text and pages.
pub trait DocumentExtractor {
    fn name(&self) -> &str;

    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument>;
}

/// OCR stand-in used when no engine is installed.
pub struct UnavailableOcr;

impl OcrCapability for UnavailableOcr {
    fn name(&self) -> &str {
        "ocr (unavailable)"
    }

    fn tokens(&self, _image: &DynamicImage, _page_index: usize) -> Result<Vec<Token>> {
        warn!("OcrCapability::tokens called on unavailable OCR");
        Err(MedicloakError::unavailable("OCR", "no OCR engine installed"))
    }

    fn transcribe(&self, _image: &DynamicImage) -> Result<String> {
        warn!("OcrCapability::transcribe called on unavailable OCR");
        Err(MedicloakError::unavailable("OCR", "no OCR engine installed"))
    }
}

/// Extractor stand-in used when no decoder is available.
pub struct UnavailableExtractor;

impl DocumentExtractor for UnavailableExtractor {
    fn name(&self) -> &str {
        "extractor (unavailable)"
    }

    fn extract(&self, _bytes: &[u8]) -> Result<ExtractedDocument> {
        warn!("DocumentExtractor::extract called on unavailable extractor");
        Err(MedicloakError::unavailable(
            "document extractor",
            "no document decoder installed",
        ))
    }
}

/// Rebuild page text from tokens: words are joined by spaces and each blank
/// token starts a new line.
pub fn join_tokens(tokens: &[Token]) -> String {
    let mut text = String::new();
    for token in tokens {
        if token.is_blank() {
            text.truncate(text.trim_end_matches(' ').len());
            text.push('\n');
            continue;
        }
        if !text.is_empty() && !text.ends_with('\n') {
            text.push(' ');
        }
        text.push_str(token.text.trim());
    }
    text.trim_end().to_owned()
}
