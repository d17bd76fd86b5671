// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Span splicing. Spans are collected first, sorted ascending, merged where they
// overlap, and the output is rebuilt by copying the unmatched gaps, so no
// offsets ever need to be adjusted after an edit.

/// Sort byte ranges and merge the ones that overlap.
///
/// Empty and inverted ranges are dropped.
pub fn merge_spans(mut spans: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    spans.retain(|(start, end)| start < end);
    spans.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start < last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Replace every span of `text` with `marker`.
///
/// Spans must lie on char boundaries (regex match offsets always do).
pub fn replace_spans(text: &str, spans: Vec<(usize, usize)>, marker: &str) -> String {
    let spans = merge_spans(spans);
    if spans.is_empty() {
        return text.to_owned();
    }

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in spans {
        let end = end.min(text.len());
        if start < cursor || start >= end {
            continue;
        }
        output.push_str(&text[cursor..start]);
        output.push_str(marker);
        cursor = end;
    }
    output.push_str(&text[cursor..]);
    output
}
