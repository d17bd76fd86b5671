// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF text extractor — per-page text from existing PDF documents using the
// `lopdf` crate. Pages are not rasterised; page images must come from a
// separate renderer.

use lopdf::Document;
use medicloak_core::error::{MedicloakError, Result};
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{DocumentExtractor, ExtractedDocument};

/// Reads the text layer of a PDF.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Number of pages, without extracting anything.
    pub fn page_count(&self, bytes: &[u8]) -> Result<usize> {
        Ok(load(bytes)?.get_pages().len())
    }
}

impl DocumentExtractor for PdfTextExtractor {
    fn name(&self) -> &str {
        "lopdf"
    }

    /// One text entry per page. A page whose text cannot be decoded yields an
    /// empty entry rather than failing the document.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument> {
        let document = load(bytes)?;
        if document.is_encrypted() {
            return Err(MedicloakError::UnsupportedDocument(
                "encrypted PDFs are not supported".into(),
            ));
        }

        let pages = document.get_pages();
        let mut page_texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            match document.extract_text(&[*page_number]) {
                Ok(text) => page_texts.push(text.trim_end().to_owned()),
                Err(err) => {
                    warn!(page_number, %err, "Page text could not be decoded");
                    page_texts.push(String::new());
                }
            }
        }

        let chars: usize = page_texts.iter().map(String::len).sum();
        info!(pages = page_texts.len(), chars, "PDF text extracted");
        Ok(ExtractedDocument {
            page_texts,
            page_images: Vec::new(),
        })
    }
}

fn load(bytes: &[u8]) -> Result<Document> {
    if bytes.is_empty() {
        return Err(MedicloakError::PdfError("PDF data is empty".into()));
    }
    let document = Document::load_mem(bytes)
        .map_err(|err| MedicloakError::PdfError(format!("failed to load PDF from memory: {}", err)))?;
    debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    use super::*;

    /// A minimal PDF with one line of Courier text per page.
    fn sample_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => lines.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut output = Vec::new();
        doc.save_to(&mut output).unwrap();
        output
    }

    #[test]
    fn extracts_text_per_page() {
        let bytes = sample_pdf(&["Name: John Doe", "Phone: 9876543210"]);
        let extracted = PdfTextExtractor::new().extract(&bytes).unwrap();
        assert_eq!(extracted.page_texts.len(), 2);
        assert!(extracted.page_texts[0].contains("John Doe"));
        assert!(extracted.page_texts[1].contains("9876543210"));
        assert!(extracted.page_images.is_empty());
    }

    #[test]
    fn counts_pages() {
        let bytes = sample_pdf(&["one", "two", "three"]);
        assert_eq!(PdfTextExtractor::new().page_count(&bytes).unwrap(), 3);
    }

    #[test]
    fn rejects_garbage() {
        let extractor = PdfTextExtractor::new();
        assert!(matches!(
            extractor.extract(b"definitely not a pdf"),
            Err(MedicloakError::PdfError(_))
        ));
        assert!(extractor.extract(&[]).is_err());
    }
}
