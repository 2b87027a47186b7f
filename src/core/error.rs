// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types and diagnostics for the assembler.
//!
//! Every failure is fatal to the run: the assembler stops at the first
//! error and reports a single [`Diagnostic`] carrying the offending
//! source line. No partial byte output is ever returned.

use std::fmt;

/// Categories of assembler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmErrorKind {
    /// Unrecognized line, malformed directive argument, bad operand
    /// grammar, unterminated string.
    Syntax,
    /// Duplicate label definition or undefined label reference.
    Symbol,
    /// Literal or resolved value exceeds its field width.
    Range,
    /// Mnemonic does not admit the observed operand shape.
    Mode,
    /// Post-encoding size disagreement with the chosen variant.
    Internal,
    /// File I/O failure in the CLI layer.
    Io,
}

/// An assembler error with a kind and message.
#[derive(Debug, Clone)]
pub struct AsmError {
    kind: AsmErrorKind,
    message: String,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.kind
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AsmError {}

/// An error bound to the source line that produced it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    line: u32,
    source: String,
    error: AsmError,
}

impl Diagnostic {
    pub fn new(line: u32, source: impl Into<String>, error: AsmError) -> Self {
        Self {
            line,
            source: source.into(),
            error,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}: {}. Original line: '{}'",
            self.line,
            self.error.message(),
            self.source
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Error from a failed CLI run.
///
/// Assembly failures carry the diagnostic; CLI and I/O failures carry
/// only the underlying error.
#[derive(Debug)]
pub struct RunError {
    error: AsmError,
    diagnostic: Option<Diagnostic>,
}

impl RunError {
    pub fn new(error: AsmError) -> Self {
        Self {
            error,
            diagnostic: None,
        }
    }

    pub fn from_diagnostic(diagnostic: Diagnostic) -> Self {
        Self {
            error: diagnostic.error().clone(),
            diagnostic: Some(diagnostic),
        }
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostic.as_ref()
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.diagnostic {
            Some(diag) => write!(f, "{diag}"),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for RunError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_format_names_line_and_source() {
        let err = AsmError::new(AsmErrorKind::Range, "Value 256 out of range 0-255");
        let diag = Diagnostic::new(3, ".byte 256", err);
        assert_eq!(
            diag.to_string(),
            "Line 3: Value 256 out of range 0-255. Original line: '.byte 256'"
        );
    }

    #[test]
    fn run_error_prefers_diagnostic() {
        let err = AsmError::new(AsmErrorKind::Symbol, "Duplicate label: loop");
        let diag = Diagnostic::new(7, "loop:", err.clone());
        let run = RunError::from_diagnostic(diag);
        assert!(run.to_string().starts_with("Line 7:"));
        assert_eq!(run.error().kind(), AsmErrorKind::Symbol);

        let run = RunError::new(err);
        assert_eq!(run.to_string(), "Duplicate label: loop");
        assert!(run.diagnostic().is_none());
    }
}
