// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Shared text utilities for line normalization and parsing.

/// Check if a byte is a valid identifier start character (letter or underscore).
#[inline]
pub fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

/// Check if a byte is a valid identifier continuation character.
#[inline]
pub fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Check if a string is a well-formed identifier (`[A-Za-z_][A-Za-z0-9_]*`).
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(&c) if is_ident_start(c) => bytes[1..].iter().all(|&c| is_ident_char(c)),
        _ => false,
    }
}

/// Split a line into code and comment parts at the first unquoted semicolon.
///
/// Quote tracking covers both `'` and `"` delimiters so that a `;`
/// inside a string literal is data rather than a comment. String
/// literals have no escape sequences.
pub fn split_comment(line: &str) -> (&str, &str) {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    for (idx, &c) in bytes.iter().enumerate() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                b'\'' | b'"' => quote = Some(c),
                b';' => return (&line[..idx], &line[idx..]),
                _ => {}
            },
        }
    }
    (line, "")
}

/// One logical source line after normalization.
///
/// `text` is the comment-stripped, trimmed form used for
/// classification; `raw` is the original line kept for diagnostics.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub number: u32,
    pub text: String,
    pub raw: String,
}

/// Split a source string into normalized lines, one per `\n`-separated
/// input line, numbered from 1.
#[must_use]
pub fn normalize_source(source: &str) -> Vec<SourceLine> {
    source
        .split('\n')
        .enumerate()
        .map(|(idx, raw)| {
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            let (code, _comment) = split_comment(raw);
            SourceLine {
                number: idx as u32 + 1,
                text: code.trim().to_string(),
                raw: raw.to_string(),
            }
        })
        .collect()
}
