// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MediCloak — best-effort PII/PHI redaction for medical text and scans.
//
// Entry point. Initialises logging, parses arguments and runs one command.
// Failures are reported through the plain-language error mapping.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use medicloak_core::human_errors::humanize_error;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    tracing::debug!("MediCloak starting");

    let mut stdout = std::io::stdout().lock();
    match commands::run(&cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            let human = humanize_error(&err);
            eprintln!("Error: {}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::from(1)
        }
    }
}
