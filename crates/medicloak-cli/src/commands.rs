// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command implementations. Each command builds one document, runs it through
// a fresh redaction session, prints the result and appends an audit record.

use std::io::Write;
use std::path::{Path, PathBuf};

use medicloak_audit::{AuditLog, RunRecord, hash_bytes};
use medicloak_core::config::RedactionConfig;
use medicloak_core::error::{MedicloakError, Result};
use medicloak_core::types::parse_keywords;
use medicloak_detect::Redactor;
use medicloak_document::{
    DocumentExtractor, ImageProcessor, OcrCapability, PdfTextExtractor, RawDocument,
    RedactionReport, RedactionSession, VisualStatus,
};
use tracing::{debug, info, warn};

use crate::cli::{Cli, Commands, ImageArgs, PdfArgs, RedactArgs, TextArgs};

/// Settings shared by every command of one invocation.
struct Context {
    config: RedactionConfig,
    audit_db: Option<PathBuf>,
}

impl Context {
    fn from_cli(cli: &Cli) -> Self {
        let config = match &cli.config {
            Some(path) => RedactionConfig::load_or_default(path),
            None => RedactionConfig::default(),
        };
        Self {
            config,
            audit_db: cli.audit_db.clone(),
        }
    }

    fn redactor(&self) -> Result<Redactor> {
        Redactor::new(self.config.clone())
    }

    /// Append the run to the audit log, when one was requested.
    fn audit(&self, source: &str, input: &[u8], report: &RedactionReport) -> Result<()> {
        let Some(path) = &self.audit_db else {
            return Ok(());
        };
        if !self.config.audit_enabled {
            debug!("audit disabled in configuration");
            return Ok(());
        }
        let log = AuditLog::open(path)?;
        log.record(&RunRecord {
            run_id: report.run_id,
            source: source.into(),
            document_hash: hash_bytes(input),
            markers: report.marker_count(),
            regions: report.region_count(),
            visual_status: report.visual_status.label().into(),
            degraded: report
                .degradations
                .iter()
                .map(|event| event.component.clone())
                .collect(),
        })?;
        Ok(())
    }
}

/// Run the parsed command, writing its output to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let ctx = Context::from_cli(cli);
    match &cli.command {
        Commands::Text(args) => text(&ctx, args, out),
        Commands::Image(args) => image(&ctx, args, out),
        Commands::Pdf(args) => pdf(&ctx, args, out),
    }
}

fn text(ctx: &Context, args: &TextArgs, out: &mut dyn Write) -> Result<()> {
    let input = match &args.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    };
    let redactor = ctx.redactor()?;
    let report = RedactionSession::new(&redactor).run(
        with_extra(RawDocument::from_text(input.as_str()), &args.redact),
        &parse_keywords(&args.redact.keywords),
    );

    write_report(out, &report, args.redact.json)?;
    ctx.audit("text", input.as_bytes(), &report)
}

fn image(ctx: &Context, args: &ImageArgs, out: &mut dyn Write) -> Result<()> {
    let bytes = std::fs::read(&args.file)?;
    let page = ImageProcessor::from_bytes(&bytes)?.into_dynamic();
    let redactor = ctx.redactor()?;
    let ocr = load_ocr(args.models.as_deref());

    let mut session = RedactionSession::new(&redactor);
    if let Some(ocr) = ocr.as_deref() {
        session = session.with_ocr(ocr);
    }
    let report = session.run(
        with_extra(RawDocument::from_pages(vec![page]), &args.redact),
        &parse_keywords(&args.redact.keywords),
    );

    write_report(out, &report, args.redact.json)?;
    ctx.audit("image", &bytes, &report)?;

    // Nothing is written unless every page was masked.
    let Some(masked) = report.pages.first() else {
        let reason = match &report.visual_status {
            VisualStatus::NotPerformed { reason } => reason.clone(),
            VisualStatus::Redacted { .. } => "no page was produced".into(),
        };
        return Err(MedicloakError::unavailable(
            "Visual redaction",
            format!("{reason}; no image written"),
        ));
    };
    ImageProcessor::from_dynamic(masked.image.clone()).save(&args.out)?;
    info!(path = %args.out.display(), "Masked image written");

    if let Some(path) = &args.pdf {
        match &report.redacted_pdf {
            Some(pdf) => {
                std::fs::write(path, pdf)?;
                info!(path = %path.display(), "Masked PDF written");
            }
            None => warn!("PDF export disabled or failed; no PDF written"),
        }
    }
    Ok(())
}

fn pdf(ctx: &Context, args: &PdfArgs, out: &mut dyn Write) -> Result<()> {
    let bytes = std::fs::read(&args.file)?;
    let extracted = PdfTextExtractor::new().extract(&bytes)?;
    let redactor = ctx.redactor()?;
    let report = RedactionSession::new(&redactor).run(
        with_extra(RawDocument::from_extracted(extracted), &args.redact),
        &parse_keywords(&args.redact.keywords),
    );

    write_report(out, &report, args.redact.json)?;
    ctx.audit("pdf", &bytes, &report)
}

fn with_extra(document: RawDocument, args: &RedactArgs) -> RawDocument {
    match &args.extra {
        Some(extra) => document.with_extra_text(extra.as_str()),
        None => document,
    }
}

/// Redacted text (or the JSON summary) on `out`; the review notice and any
/// skipped layers go to stderr.
fn write_report(out: &mut dyn Write, report: &RedactionReport, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report.summary())?)?;
        return Ok(());
    }

    writeln!(out, "{}", report.redacted_text)?;
    for event in report.degradations.iter() {
        eprintln!("Skipped {}: {}", event.component, event.reason);
    }
    eprintln!("Note: {}", report.notice);
    Ok(())
}

#[cfg(feature = "ocr")]
fn load_ocr(models: Option<&Path>) -> Option<Box<dyn OcrCapability>> {
    use medicloak_document::OcrEngine;

    let engine = match models {
        Some(dir) => OcrEngine::from_model_dir(dir),
        None => OcrEngine::with_defaults(),
    };
    match engine {
        Ok(engine) => Some(Box::new(engine)),
        Err(err) => {
            warn!(error = %err, "OCR engine unavailable");
            None
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn load_ocr(_models: Option<&Path>) -> Option<Box<dyn OcrCapability>> {
    warn!("built without the `ocr` feature; images cannot be read");
    None
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn run_args(args: &[&str]) -> (Result<()>, String) {
        let cli = Cli::parse_from(args);
        let mut out = Vec::new();
        let result = run(&cli, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn text_file_is_redacted_and_audited() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("note.txt");
        let db = dir.path().join("audit.db");
        std::fs::write(&input, "Name: John Doe\nPhone: 9876543210\nAge: 61\n").unwrap();

        let (result, output) = run_args(&[
            "medicloak",
            "--audit-db",
            db.to_str().unwrap(),
            "text",
            input.to_str().unwrap(),
        ]);
        result.unwrap();
        assert_eq!(output, "Name: ████\nPhone: ████\nAge: 61\n\n");

        let entries = AuditLog::open(&db).unwrap().recent_entries(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, "text");
        assert_eq!(entries[0].markers, 2);
        assert_eq!(entries[0].visual_status, "not_performed");
        assert_eq!(entries[0].document_hash.len(), 64);
    }

    #[test]
    fn keywords_and_extra_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("note.txt");
        std::fs::write(&input, "Seen on Sunflower ward.").unwrap();

        let (result, output) = run_args(&[
            "medicloak",
            "text",
            input.to_str().unwrap(),
            "--keywords",
            "sunflower",
            "--extra",
            "Email: a.b@example.org",
        ]);
        result.unwrap();
        assert_eq!(output, "Seen on ████ ward.\nEmail: ████\n");
    }

    #[test]
    fn json_summary() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("note.txt");
        std::fs::write(&input, "Name: Asha").unwrap();

        let (result, output) =
            run_args(&["medicloak", "text", input.to_str().unwrap(), "--json"]);
        result.unwrap();
        let summary: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(summary["redacted_text"], "Name: ████");
        assert_eq!(summary["marker_count"], 1);
        assert_eq!(summary["visual_status"]["status"], "not_performed");
    }

    #[test]
    fn audit_can_be_disabled_in_config() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("note.txt");
        let config = dir.path().join("config.json");
        let db = dir.path().join("audit.db");
        std::fs::write(&input, "Name: Asha").unwrap();
        std::fs::write(&config, r#"{ "audit_enabled": false }"#).unwrap();

        let (result, _) = run_args(&[
            "medicloak",
            "--config",
            config.to_str().unwrap(),
            "--audit-db",
            db.to_str().unwrap(),
            "text",
            input.to_str().unwrap(),
        ]);
        result.unwrap();
        assert!(!db.exists());
    }

    #[test]
    fn pdf_command_rejects_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("note.pdf");
        std::fs::write(&input, "not a pdf").unwrap();

        let (result, output) = run_args(&["medicloak", "pdf", input.to_str().unwrap()]);
        assert!(matches!(result, Err(MedicloakError::PdfError(_))));
        assert!(output.is_empty());
    }

    #[test]
    fn missing_input_file_is_an_io_error() {
        let (result, _) = run_args(&["medicloak", "text", "/nonexistent/medicloak/note.txt"]);
        assert!(matches!(result, Err(MedicloakError::Io(_))));
    }

    #[cfg(not(feature = "ocr"))]
    #[test]
    fn image_without_ocr_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.png");
        let masked = dir.path().join("masked.png");
        let db = dir.path().join("audit.db");
        let page = image::RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        page.save(&input).unwrap();

        let (result, _) = run_args(&[
            "medicloak",
            "--audit-db",
            db.to_str().unwrap(),
            "image",
            input.to_str().unwrap(),
            "--out",
            masked.to_str().unwrap(),
        ]);
        assert!(matches!(
            result,
            Err(MedicloakError::ExternalServiceUnavailable { .. })
        ));
        assert!(!masked.exists());

        let entries = AuditLog::open(&db).unwrap().recent_entries(1).unwrap();
        assert_eq!(entries[0].source, "image");
        assert_eq!(entries[0].degraded, vec!["ocr"]);
    }
}
