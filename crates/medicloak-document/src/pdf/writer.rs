// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redacted PDF writer — assembles masked page images into one PDF using
// `printpdf` 0.8, one full-bleed image per page.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use image::DynamicImage;
use medicloak_core::error::{MedicloakError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// Resolution assumed for page images that carry none of their own.
pub const DEFAULT_DPI: f32 = 150.0;

const MM_PER_INCH: f32 = 25.4;

/// Builds a PDF whose pages are exactly the given images.
pub struct RedactedPdfWriter {
    dpi: f32,
    title: String,
}

impl Default for RedactedPdfWriter {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            title: "Redacted document".into(),
        }
    }
}

impl RedactedPdfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolution the page images were rendered at. Non-positive values fall
    /// back to [`DEFAULT_DPI`].
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = if dpi > 0.0 { dpi } else { DEFAULT_DPI };
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Page size in millimetres for an image of the given pixel size.
    pub fn page_size_mm(&self, width_px: u32, height_px: u32) -> (f32, f32) {
        (
            width_px as f32 / self.dpi * MM_PER_INCH,
            height_px as f32 / self.dpi * MM_PER_INCH,
        )
    }

    /// One page per image, in order.
    #[instrument(skip_all, fields(pages = images.len(), dpi = self.dpi))]
    pub fn write_pages(&self, images: &[DynamicImage]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(MedicloakError::PdfError("no pages to write".into()));
        }
        info!(title = %self.title, "Creating redacted PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pages = Vec::with_capacity(images.len());

        for image in images {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            if width == 0 || height == 0 {
                return Err(MedicloakError::ImageError("page image has zero size".into()));
            }
            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let (page_w, page_h) = self.page_size_mm(width, height);
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(1.0),
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];
            pages.push(PdfPage::new(Mm(page_w), Mm(page_h), ops));
            debug!(width, height, page_w, page_h, "Page image placed");
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = output.len(), warnings = warnings.len(), "Redacted PDF serialised");
        Ok(output)
    }

    /// Write the PDF straight to a file.
    pub fn write_pages_to_file(&self, images: &[DynamicImage], path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.write_pages(images)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote redacted PDF to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    fn page(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    #[test]
    fn one_pdf_page_per_image() {
        let bytes = RedactedPdfWriter::new()
            .write_pages(&[page(300, 400), page(300, 400)])
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn page_size_follows_dpi() {
        let writer = RedactedPdfWriter::new().with_dpi(300.0);
        let (w, h) = writer.page_size_mm(2480, 3508);
        // A4 at 300 dpi.
        assert!((w - 210.0).abs() < 0.5);
        assert!((h - 297.0).abs() < 0.5);
        assert_eq!(RedactedPdfWriter::new().with_dpi(-1.0).dpi, DEFAULT_DPI);
    }

    #[test]
    fn empty_page_list_is_an_error() {
        assert!(matches!(
            RedactedPdfWriter::new().write_pages(&[]),
            Err(MedicloakError::PdfError(_))
        ));
    }

    #[test]
    fn writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redacted.pdf");
        RedactedPdfWriter::new()
            .with_title("Test")
            .write_pages_to_file(&[page(10, 10)], &path)
            .unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
