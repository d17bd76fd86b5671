// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction session — runs one document through detection, text masking and
// (when page images and OCR are available) visual masking.
//
// Every run owns its document, tokens and sensitive set. OCR results are
// cached for the lifetime of one run only, so each page is recognised at most
// once and nothing leaks between documents.

use std::collections::BTreeMap;

use image::DynamicImage;
use medicloak_core::BEST_EFFORT_NOTICE;
use medicloak_core::capabilities::EntityRecognizer;
use medicloak_core::error::MedicloakError;
use medicloak_core::types::{MARKER, MaskedRegion, RedactionResult, RunId, SensitiveSubstringSet, Token};
use medicloak_detect::{Degradations, Redactor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{ExtractedDocument, OcrCapability, join_tokens};
use crate::pdf::writer::RedactedPdfWriter;
use crate::visual::VisualMasker;

/// Appended to the best-effort notice on every report.
pub const VISUAL_NOTICE: &str = "Visual masking only covers words the OCR engine recognised; \
     handwriting, stamps, logos and faint text may remain visible.";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One document to redact: text, page images, or both.
#[derive(Debug, Clone, Default)]
pub struct RawDocument {
    text: String,
    pages: Vec<DynamicImage>,
    extra_text: Option<String>,
}

impl RawDocument {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Page images only; text is recovered through OCR during the run.
    pub fn from_pages(pages: Vec<DynamicImage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn from_extracted(extracted: ExtractedDocument) -> Self {
        Self {
            text: extracted.text(),
            pages: extracted.page_images,
            extra_text: None,
        }
    }

    pub fn with_pages(mut self, pages: Vec<DynamicImage>) -> Self {
        self.pages = pages;
        self
    }

    /// Text pasted alongside the document, appended on its own line.
    pub fn with_extra_text(mut self, extra: impl Into<String>) -> Self {
        self.extra_text = Some(extra.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pages(&self) -> &[DynamicImage] {
        &self.pages
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Whether page images were masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VisualStatus {
    Redacted { pages: usize, regions: usize },
    /// No page image in the report may be treated as redacted.
    NotPerformed { reason: String },
}

impl VisualStatus {
    /// Short machine-readable name, as used in the audit log.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Redacted { .. } => "redacted",
            Self::NotPerformed { .. } => "not_performed",
        }
    }

    fn not_performed(reason: impl Into<String>) -> Self {
        Self::NotPerformed {
            reason: reason.into(),
        }
    }
}

/// A masked page image and the regions painted on it.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub page_index: usize,
    pub regions: Vec<MaskedRegion>,
    pub image: DynamicImage,
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RedactionReport {
    pub run_id: RunId,
    pub redacted_text: String,
    /// Size of the sensitive substring set. The set itself is not kept.
    pub sensitive_count: usize,
    /// Empty unless `visual_status` is `Redacted`.
    pub pages: Vec<PageOutcome>,
    pub visual_status: VisualStatus,
    pub redacted_pdf: Option<Vec<u8>>,
    pub degradations: Degradations,
    pub notice: String,
}

impl RedactionReport {
    fn empty(run_id: RunId, reason: String, degradations: Degradations) -> Self {
        Self {
            run_id,
            redacted_text: String::new(),
            sensitive_count: 0,
            pages: Vec::new(),
            visual_status: VisualStatus::not_performed(reason),
            redacted_pdf: None,
            degradations,
            notice: notice(),
        }
    }

    pub fn marker_count(&self) -> usize {
        self.redacted_text.matches(MARKER).count()
    }

    pub fn region_count(&self) -> usize {
        self.pages.iter().map(|page| page.regions.len()).sum()
    }

    pub fn is_visually_redacted(&self) -> bool {
        matches!(self.visual_status, VisualStatus::Redacted { .. })
    }

    /// Text and regions in the engine's plain result shape.
    pub fn to_result(&self) -> RedactionResult {
        RedactionResult {
            redacted_text: self.redacted_text.clone(),
            masked_regions: self
                .pages
                .iter()
                .flat_map(|page| page.regions.iter().cloned())
                .collect(),
        }
    }

    /// Serializable view without images or original token text.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            run_id: self.run_id,
            redacted_text: self.redacted_text.clone(),
            sensitive_count: self.sensitive_count,
            marker_count: self.marker_count(),
            regions_per_page: self.pages.iter().map(|page| page.regions.len()).collect(),
            visual_status: self.visual_status.clone(),
            redacted_pdf_bytes: self.redacted_pdf.as_ref().map(Vec::len),
            degradations: self.degradations.clone(),
            notice: self.notice.clone(),
        }
    }
}

/// What `--json` prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub run_id: RunId,
    pub redacted_text: String,
    pub sensitive_count: usize,
    pub marker_count: usize,
    pub regions_per_page: Vec<usize>,
    pub visual_status: VisualStatus,
    pub redacted_pdf_bytes: Option<usize>,
    pub degradations: Degradations,
    pub notice: String,
}

fn notice() -> String {
    format!("{BEST_EFFORT_NOTICE} {VISUAL_NOTICE}")
}

// ---------------------------------------------------------------------------
// Per-run cache
// ---------------------------------------------------------------------------

/// OCR results for one run, keyed by page index.
struct RunCache<'a> {
    ocr: Option<&'a dyn OcrCapability>,
    pages: BTreeMap<usize, Result<Vec<Token>, String>>,
}

impl<'a> RunCache<'a> {
    fn new(ocr: Option<&'a dyn OcrCapability>) -> Self {
        Self {
            ocr,
            pages: BTreeMap::new(),
        }
    }

    /// Tokens for a page, recognising it on first use.
    fn page_tokens(&mut self, page_index: usize, image: &DynamicImage) -> Result<&[Token], String> {
        let ocr = self.ocr;
        self.pages
            .entry(page_index)
            .or_insert_with(|| match ocr {
                Some(ocr) => ocr.tokens(image, page_index).map_err(|err| err.to_string()),
                None => Err("no OCR capability supplied".into()),
            })
            .as_deref()
            .map_err(Clone::clone)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Runs documents through one redactor and an optional set of external
/// capabilities.
pub struct RedactionSession<'a> {
    redactor: &'a Redactor,
    ocr: Option<&'a dyn OcrCapability>,
    ner: Option<&'a dyn EntityRecognizer>,
    pdf_writer: RedactedPdfWriter,
}

impl<'a> RedactionSession<'a> {
    pub fn new(redactor: &'a Redactor) -> Self {
        Self {
            redactor,
            ocr: None,
            ner: None,
            pdf_writer: RedactedPdfWriter::default(),
        }
    }

    pub fn with_ocr(mut self, ocr: &'a dyn OcrCapability) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_ner(mut self, ner: &'a dyn EntityRecognizer) -> Self {
        self.ner = Some(ner);
        self
    }

    pub fn with_pdf_writer(mut self, writer: RedactedPdfWriter) -> Self {
        self.pdf_writer = writer;
        self
    }

    /// Redact one document.
    ///
    /// Never fails: unavailable capabilities and empty input are reported in
    /// the result, and text redaction always completes.
    #[instrument(skip_all, fields(
        text_len = document.text.len(),
        pages = document.pages.len(),
        keyword_count = keywords.len(),
    ))]
    pub fn run<S: AsRef<str>>(&self, document: RawDocument, keywords: &[S]) -> RedactionReport {
        let run_id = RunId::new();
        let mut degradations = Degradations::new();
        let mut cache = RunCache::new(self.ocr);

        let text = self.document_text(&document, &mut cache, &mut degradations);
        if text.trim().is_empty() && document.pages.is_empty() {
            let reason = MedicloakError::EmptyInput.to_string();
            info!(%run_id, "{reason}");
            return RedactionReport::empty(run_id, reason, degradations);
        }

        let sensitive = self
            .redactor
            .detect_with(&text, keywords, self.ner, &mut degradations);
        let redacted_text = self
            .redactor
            .mask_text_with(&text, &sensitive, keywords, &mut degradations);

        let (visual_status, pages) =
            self.mask_pages(&document.pages, &sensitive, &mut cache, &mut degradations);
        let redacted_pdf = self.export_pdf(&pages, &visual_status, &mut degradations);

        let report = RedactionReport {
            run_id,
            redacted_text,
            sensitive_count: sensitive.len(),
            pages,
            visual_status,
            redacted_pdf,
            degradations,
            notice: notice(),
        };
        info!(
            %run_id,
            markers = report.marker_count(),
            regions = report.region_count(),
            visual = report.is_visually_redacted(),
            degraded = report.degradations.len(),
            "Redaction run complete"
        );
        report
    }

    /// The document's text, falling back to OCR transcription of its pages,
    /// with any extra text appended.
    fn document_text(
        &self,
        document: &RawDocument,
        cache: &mut RunCache<'_>,
        degradations: &mut Degradations,
    ) -> String {
        let mut text = document.text.clone();
        if text.trim().is_empty() && !document.pages.is_empty() && self.ocr.is_some() {
            let mut transcripts = Vec::with_capacity(document.pages.len());
            for (index, image) in document.pages.iter().enumerate() {
                match cache.page_tokens(index, image) {
                    Ok(tokens) => transcripts.push(join_tokens(tokens)),
                    Err(reason) => degradations.record(format!("ocr:page-{index}"), reason),
                }
            }
            text = transcripts.join("\n");
            debug!(chars = text.len(), "Text recovered from page images");
        }

        match document.extra_text.as_deref() {
            Some(extra) => [text.as_str(), extra]
                .into_iter()
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            None => text,
        }
    }

    /// Mask every page, or none of them.
    fn mask_pages(
        &self,
        images: &[DynamicImage],
        sensitive: &SensitiveSubstringSet,
        cache: &mut RunCache<'_>,
        degradations: &mut Degradations,
    ) -> (VisualStatus, Vec<PageOutcome>) {
        if images.is_empty() {
            return (VisualStatus::not_performed("no page images supplied"), Vec::new());
        }
        if !self.redactor.config().visual_redaction {
            return (
                VisualStatus::not_performed("visual redaction disabled in configuration"),
                Vec::new(),
            );
        }
        if self.ocr.is_none() {
            degradations.record("ocr", "no OCR capability supplied");
            return (VisualStatus::not_performed("OCR unavailable"), Vec::new());
        }

        let masker = VisualMasker::new(self.redactor);
        let mut outcomes = Vec::with_capacity(images.len());
        let mut position = 0;
        for (page_index, image) in images.iter().enumerate() {
            let tokens: Vec<Token> = match cache.page_tokens(page_index, image) {
                Ok(tokens) => tokens
                    .iter()
                    .map(|token| {
                        let mut token = token.clone();
                        token.page_index = page_index;
                        token.sequence_position = position;
                        position += 1;
                        token
                    })
                    .collect(),
                Err(reason) => {
                    degradations.record(format!("ocr:page-{page_index}"), reason.clone());
                    warn!(page_index, "Visual masking abandoned");
                    return (
                        VisualStatus::not_performed(format!(
                            "OCR failed on page {}: {reason}",
                            page_index + 1
                        )),
                        Vec::new(),
                    );
                }
            };

            let (image, regions) = masker.mask_page(image, &tokens, sensitive, degradations);
            outcomes.push(PageOutcome {
                page_index,
                regions,
                image,
            });
        }

        let regions = outcomes.iter().map(|page| page.regions.len()).sum();
        (
            VisualStatus::Redacted {
                pages: outcomes.len(),
                regions,
            },
            outcomes,
        )
    }

    fn export_pdf(
        &self,
        pages: &[PageOutcome],
        status: &VisualStatus,
        degradations: &mut Degradations,
    ) -> Option<Vec<u8>> {
        if !self.redactor.config().export_pdf || !matches!(status, VisualStatus::Redacted { .. }) {
            return None;
        }
        let images: Vec<DynamicImage> = pages.iter().map(|page| page.image.clone()).collect();
        match self.pdf_writer.write_pages(&images) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                degradations.record_error("pdf-export", &err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use image::{Rgb, RgbImage};
    use medicloak_core::config::RedactionConfig;
    use medicloak_core::error::Result;
    use medicloak_core::types::BoundingBox;

    use super::*;
    use crate::capabilities::UnavailableOcr;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    /// Returns the same words for every page and counts calls.
    struct ScriptedOcr {
        words: Vec<&'static str>,
        calls: Cell<usize>,
    }

    impl ScriptedOcr {
        fn new(words: &[&'static str]) -> Self {
            Self {
                words: words.to_vec(),
                calls: Cell::new(0),
            }
        }
    }

    impl OcrCapability for ScriptedOcr {
        fn name(&self) -> &str {
            "scripted"
        }

        fn tokens(&self, _image: &DynamicImage, page_index: usize) -> Result<Vec<Token>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self
                .words
                .iter()
                .enumerate()
                .map(|(i, word)| {
                    let bbox = if word.is_empty() {
                        BoundingBox::new(0, 0, 0, 0)
                    } else {
                        BoundingBox::new(i as i32 * 30, 5, 25, 10)
                    };
                    Token::new(*word, bbox, page_index, i)
                })
                .collect())
        }
    }

    fn redactor() -> Redactor {
        Redactor::new(RedactionConfig::default()).unwrap()
    }

    fn blank_page() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 20, WHITE))
    }

    #[test]
    fn text_only_run() {
        let redactor = redactor();
        let report = RedactionSession::new(&redactor)
            .run(RawDocument::from_text("Name: John Doe\nAge: 40"), &[] as &[&str]);

        assert_eq!(report.redacted_text, "Name: ████\nAge: 40");
        assert_eq!(report.sensitive_count, 3);
        assert!(report.pages.is_empty());
        assert_eq!(
            report.visual_status,
            VisualStatus::not_performed("no page images supplied")
        );
        assert!(report.notice.contains("best-effort"));
        assert!(report.degradations.is_empty());
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let redactor = redactor();
        let report = RedactionSession::new(&redactor).run(RawDocument::from_text("  \n"), &["x"]);
        assert!(report.redacted_text.is_empty());
        assert_eq!(report.sensitive_count, 0);
        assert!(!report.is_visually_redacted());
        assert!(report.to_result().masked_regions.is_empty());
    }

    #[test]
    fn scanned_page_is_transcribed_once_and_masked() {
        let redactor = redactor();
        let ocr = ScriptedOcr::new(&["Name:", "John", "Doe", "", "Age:", "40"]);
        let report = RedactionSession::new(&redactor)
            .with_ocr(&ocr)
            .run(RawDocument::from_pages(vec![blank_page()]), &[] as &[&str]);

        assert_eq!(ocr.calls.get(), 1);
        assert_eq!(report.redacted_text, "Name: ████\nAge: 40");
        assert_eq!(
            report.visual_status,
            VisualStatus::Redacted {
                pages: 1,
                regions: 2
            }
        );
        let page = report.pages[0].image.to_rgb8();
        assert_eq!(page.get_pixel(40, 10), &Rgb([0, 0, 0]));
        assert_eq!(page.get_pixel(10, 10), &WHITE);
        assert!(report.redacted_pdf.is_some());
    }

    #[test]
    fn tokens_are_numbered_across_pages() {
        let redactor = redactor();
        let ocr = ScriptedOcr::new(&["Name:", "Asha"]);
        let report = RedactionSession::new(&redactor).with_ocr(&ocr).run(
            RawDocument::from_text("Name: Asha").with_pages(vec![blank_page(), blank_page()]),
            &[] as &[&str],
        );

        assert_eq!(ocr.calls.get(), 2);
        let regions = report.to_result().masked_regions;
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].page_index, 0);
        assert_eq!(regions[1].page_index, 1);
    }

    #[test]
    fn failing_ocr_leaves_pages_unredacted() {
        let redactor = redactor();
        let report = RedactionSession::new(&redactor).with_ocr(&UnavailableOcr).run(
            RawDocument::from_text("Phone: 9876543210").with_pages(vec![blank_page()]),
            &[] as &[&str],
        );

        assert_eq!(report.redacted_text, "Phone: ████");
        assert!(report.pages.is_empty());
        assert!(report.redacted_pdf.is_none());
        assert!(matches!(
            report.visual_status,
            VisualStatus::NotPerformed { ref reason } if reason.contains("page 1")
        ));
        assert!(report.degradations.affects("ocr:page-0"));
    }

    #[test]
    fn missing_ocr_is_a_degradation() {
        let redactor = redactor();
        let report = RedactionSession::new(&redactor).run(
            RawDocument::from_text("Name: Asha").with_pages(vec![blank_page()]),
            &[] as &[&str],
        );
        assert_eq!(report.visual_status, VisualStatus::not_performed("OCR unavailable"));
        assert!(report.degradations.affects("ocr"));
    }

    #[test]
    fn visual_redaction_can_be_disabled() {
        let redactor = Redactor::new(RedactionConfig {
            visual_redaction: false,
            ..RedactionConfig::default()
        })
        .unwrap();
        let ocr = ScriptedOcr::new(&["Asha"]);
        let report = RedactionSession::new(&redactor).with_ocr(&ocr).run(
            RawDocument::from_text("Name: Asha").with_pages(vec![blank_page()]),
            &[] as &[&str],
        );
        assert_eq!(ocr.calls.get(), 0);
        assert!(!report.is_visually_redacted());
        assert!(report.degradations.is_empty());
    }

    #[test]
    fn extra_text_is_appended() {
        let redactor = redactor();
        let report = RedactionSession::new(&redactor).run(
            RawDocument::from_text("Name: John\n").with_extra_text("  Phone: 9876543210 "),
            &[] as &[&str],
        );
        assert_eq!(report.redacted_text, "Name: ████\nPhone: ████");
    }

    #[test]
    fn summary_hides_images_and_original_text() {
        let redactor = redactor();
        let ocr = ScriptedOcr::new(&["Name:", "Asha"]);
        let report = RedactionSession::new(&redactor)
            .with_ocr(&ocr)
            .run(RawDocument::from_pages(vec![blank_page()]), &[] as &[&str]);

        let summary = report.summary();
        assert_eq!(summary.regions_per_page, vec![1]);
        assert_eq!(summary.marker_count, 1);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("Asha"));
        assert!(json.contains("\"status\":\"redacted\""));
    }
}
