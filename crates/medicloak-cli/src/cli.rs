// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments for the `medicloak` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// MediCloak - best-effort redaction of personal and health information
#[derive(Parser, Debug)]
#[command(name = "medicloak")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Redaction settings (JSON); defaults are used when missing or invalid
    #[arg(short, long, global = true, env = "MEDICLOAK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Append a record of each run (hashes and counts only) to this SQLite database
    #[arg(long, global = true, env = "MEDICLOAK_AUDIT_DB")]
    pub audit_db: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "medicloak_detect=trace"; overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Redact a text file, or standard input
    Text(TextArgs),

    /// OCR an image, mask what was found and write the masked image
    Image(ImageArgs),

    /// Redact the text layer of a PDF
    Pdf(PdfArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Default)]
pub struct RedactArgs {
    /// Extra values to redact, comma-separated
    #[arg(short, long, default_value = "")]
    pub keywords: String,

    /// Additional text redacted together with the document
    #[arg(long)]
    pub extra: Option<String>,

    /// Print the JSON run summary instead of the redacted text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TextArgs {
    /// Text file; standard input when omitted
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub redact: RedactArgs,
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Image to redact (PNG, JPEG, TIFF, ...)
    pub file: PathBuf,

    /// Where to write the masked image
    #[arg(short, long)]
    pub out: PathBuf,

    /// Also write the masked page as a PDF
    #[arg(long)]
    pub pdf: Option<PathBuf>,

    /// Directory holding the OCR models
    #[arg(long)]
    pub models: Option<PathBuf>,

    #[command(flatten)]
    pub redact: RedactArgs,
}

#[derive(Args, Debug)]
pub struct PdfArgs {
    /// PDF whose text layer should be redacted
    pub file: PathBuf,

    #[command(flatten)]
    pub redact: RedactArgs,
}
