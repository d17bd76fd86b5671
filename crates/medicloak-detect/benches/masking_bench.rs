// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for detection, text masking and token decisions in
// the medicloak-detect crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use medicloak_core::config::RedactionConfig;
use medicloak_core::types::{BoundingBox, Token};
use medicloak_detect::{Degradations, Redactor};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const NOTE: &str = "\
Patient Name: Asha Rao   Ward 4
Age: 52
DOB: 14/02/1972
Phone: +91 98765 43210
Email: asha.rao@example.org
Address: 21 Lake View Road Near City Mall Pune 411001
Aadhaar 1234 5678 9012, PAN ABCDE1234F, MRN-88231, INS 55120
Diagnosis: Type 2 diabetes. Asha Rao to follow up in two weeks.
";

/// A note repeated `copies` times, roughly one page per copy.
fn document(copies: usize) -> String {
    NOTE.repeat(copies)
}

fn tokens_for(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (row, line) in text.lines().enumerate() {
        for (col, word) in line.split_whitespace().enumerate() {
            let bbox = BoundingBox::new(col as i32 * 60, row as i32 * 20, 56, 16);
            tokens.push(Token::new(word, bbox, 0, tokens.len()));
        }
        tokens.push(Token::new("", BoundingBox::new(0, 0, 0, 0), 0, tokens.len()));
    }
    tokens
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Detection over documents of one, ten and fifty notes.
fn bench_detect(c: &mut Criterion) {
    let redactor = Redactor::new(RedactionConfig::default()).expect("default config is valid");
    let mut group = c.benchmark_group("detect");
    for copies in [1, 10, 50] {
        let text = document(copies);
        group.bench_function(format!("{copies} notes"), |b| {
            b.iter(|| black_box(redactor.detect(black_box(&text))));
        });
    }
    group.finish();
}

/// The full text masker, including the repeat-until-stable rounds.
fn bench_mask_text(c: &mut Criterion) {
    let redactor = Redactor::new(RedactionConfig::default()).expect("default config is valid");
    let keywords = ["Ward 4", "City Mall"];
    let mut group = c.benchmark_group("mask_text");
    for copies in [1, 10, 50] {
        let text = document(copies);
        let set = redactor.detect(&text);
        group.bench_function(format!("{copies} notes"), |b| {
            b.iter(|| black_box(redactor.mask_text(black_box(&text), &set, &keywords)));
        });
    }
    group.finish();
}

/// Token decisions for one OCR'd page.
fn bench_mask_tokens(c: &mut Criterion) {
    let redactor = Redactor::new(RedactionConfig::default()).expect("default config is valid");
    let text = document(1);
    let set = redactor.detect(&text);
    let tokens = tokens_for(&text);

    c.bench_function("mask_tokens (1 page)", |b| {
        b.iter(|| {
            let mut degradations = Degradations::new();
            black_box(redactor.mask_tokens(black_box(&tokens), &set, &mut degradations))
        });
    });
}

criterion_group!(benches, bench_detect, bench_mask_text, bench_mask_tokens);
criterion_main!(benches);
