// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! MOS 6502 Assembler - main entry point.
//!
//! This module ties the CPU-agnostic core to the 6502 encoding tables.
//! Assembly is two passes over the classified line records:
//!
//! 1. **Layout**: bind labels, apply origins, and fix every
//!    instruction's addressing-mode variant (and therefore size), so
//!    each record gets its final address.
//! 2. **Emit**: resolve operands against the completed symbol table,
//!    range-check each field, and concatenate the encoded bytes.
//!
//! There is no back-patching: pass 2 never changes an address or a
//! size fixed in pass 1.

pub mod cli;


use std::fs;

use clap::Parser;

use crate::core::error::{AsmError, AsmErrorKind, Diagnostic, RunError};
use crate::core::imagestore::ImageStore;
use crate::core::parser::{self, DataWidth, Statement, TextItem, Value};
use crate::core::symbol_table::{SymbolTable, SymbolTableResult};
use crate::core::text_utils::{normalize_source, SourceLine};
use crate::mos6502::encoder;
use crate::mos6502::operand::OperandForm;
use crate::mos6502::table::InstructionEntry;

use cli::{validate_cli, Cli};

pub use cli::VERSION;

/// Result of one assembly run, in the shape callers consume directly:
/// the flat output stream plus at most one diagnostic string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleResult {
    pub bytes: Vec<u8>,
    pub error: Option<String>,
}

/// Assemble a source string to a flat byte stream.
///
/// On failure `bytes` is empty and `error` carries the first (and
/// only) diagnostic, formatted
/// `Line N: <message>. Original line: '<text>'`.
#[must_use]
pub fn assemble(source: &str) -> AssembleResult {
    let mut assembler = Assembler::new();
    match assembler.run_source(source) {
        Ok(bytes) => AssembleResult { bytes, error: None },
        Err(diag) => AssembleResult {
            bytes: Vec::new(),
            error: Some(diag.to_string()),
        },
    }
}

/// One line record after pass 1, carrying its fixed address.
struct Record {
    number: u32,
    raw: String,
    addr: u16,
    payload: Payload,
}

/// Pass-2 work for a record. Lines that emit nothing (empty, label
/// definitions, origin and reserve directives) collapse to `None`
/// once their pass-1 effect is applied.
enum Payload {
    None,
    Data {
        width: DataWidth,
        values: Vec<Value>,
    },
    Text {
        items: Vec<TextItem>,
        zero_terminated: bool,
    },
    Instruction {
        entry: &'static InstructionEntry,
        form: OperandForm,
    },
}

/// Core assembler state for one run.
pub struct Assembler {
    symbols: SymbolTable,
    records: Vec<Record>,
    image: ImageStore,
    first_origin: Option<u16>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            records: Vec::new(),
            image: ImageStore::new(),
            first_origin: None,
        }
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Memory image built by pass 2, with bytes at their load addresses.
    #[must_use]
    pub fn image(&self) -> &ImageStore {
        &self.image
    }

    /// The first origin directive in the source, which is where the
    /// flat stream is intended to load.
    #[must_use]
    pub fn first_origin(&self) -> Option<u16> {
        self.first_origin
    }

    /// Assemble a source string: normalize, classify, pass 1, pass 2.
    pub fn run_source(&mut self, source: &str) -> Result<Vec<u8>, Diagnostic> {
        let lines = normalize_source(source);
        self.pass1(&lines)?;
        self.pass2()
    }

    /// Pass 1: classify lines, bind labels, lay out addresses.
    fn pass1(&mut self, lines: &[SourceLine]) -> Result<(), Diagnostic> {
        self.symbols = SymbolTable::new();
        self.records = Vec::with_capacity(lines.len());
        self.image = ImageStore::new();
        self.first_origin = None;

        let mut counter: u16 = 0;
        for line in lines {
            let parsed =
                parser::parse_line(line).map_err(|err| diagnose(line.number, &line.raw, err))?;

            for label in &parsed.labels {
                if self.symbols.add(label, counter) == SymbolTableResult::Duplicate {
                    return Err(diagnose(
                        line.number,
                        &line.raw,
                        AsmError::new(AsmErrorKind::Symbol, format!("Duplicate label: {label}")),
                    ));
                }
            }

            // The record address is the location counter after label
            // binding and before the statement's own layout effect.
            let addr = counter;
            let payload = match parsed.stmt {
                Statement::Empty => Payload::None,
                Statement::Origin { addr: origin } => {
                    if self.first_origin.is_none() {
                        self.first_origin = Some(origin);
                    }
                    counter = origin;
                    Payload::None
                }
                Statement::Reserve { count } => {
                    let val = count
                        .resolve_checked(&self.symbols, 0xffff)
                        .map_err(|err| diagnose(line.number, &line.raw, err))?;
                    counter = counter.wrapping_add(val as u16);
                    Payload::None
                }
                Statement::Data { width, values } => {
                    let len = values.len() * width.num_bytes();
                    counter = counter.wrapping_add(len as u16);
                    Payload::Data { width, values }
                }
                Statement::Text {
                    items,
                    zero_terminated,
                } => {
                    let len = items.iter().map(TextItem::num_bytes).sum::<usize>()
                        + usize::from(zero_terminated);
                    counter = counter.wrapping_add(len as u16);
                    Payload::Text {
                        items,
                        zero_terminated,
                    }
                }
                Statement::Instruction { mnemonic, operand } => {
                    let form = OperandForm::parse(&operand)
                        .map_err(|err| diagnose(line.number, &line.raw, err))?;
                    let entry = encoder::select_variant(&mnemonic, &form, &self.symbols)
                        .map_err(|err| diagnose(line.number, &line.raw, err))?;
                    counter = counter.wrapping_add(u16::from(entry.size()));
                    Payload::Instruction { entry, form }
                }
            };

            self.records.push(Record {
                number: parsed.number,
                raw: parsed.raw,
                addr,
                payload,
            });
        }
        Ok(())
    }

    /// Pass 2: resolve operands and emit bytes in record order.
    fn pass2(&mut self) -> Result<Vec<u8>, Diagnostic> {
        let mut out = Vec::new();
        for record in &self.records {
            let bytes = match &record.payload {
                Payload::None => continue,
                Payload::Data { width, values } => {
                    let mut bytes = Vec::with_capacity(values.len() * width.num_bytes());
                    for value in values {
                        let val = value
                            .resolve_checked(&self.symbols, width.max_value())
                            .map_err(|err| diagnose(record.number, &record.raw, err))?;
                        bytes.extend_from_slice(&val.to_le_bytes()[..width.num_bytes()]);
                    }
                    bytes
                }
                Payload::Text {
                    items,
                    zero_terminated,
                } => {
                    let mut bytes = Vec::new();
                    for item in items {
                        match item {
                            TextItem::Literal(data) => bytes.extend_from_slice(data),
                            TextItem::Value(value) => {
                                let val = value
                                    .resolve_checked(&self.symbols, 0xff)
                                    .map_err(|err| diagnose(record.number, &record.raw, err))?;
                                bytes.push(val as u8);
                            }
                        }
                    }
                    if *zero_terminated {
                        bytes.push(0);
                    }
                    bytes
                }
                Payload::Instruction { entry, form } => {
                    let bytes = encoder::encode(entry, form, record.addr, &self.symbols)
                        .map_err(|err| diagnose(record.number, &record.raw, err))?;
                    if bytes.len() != usize::from(entry.size()) {
                        return Err(diagnose(
                            record.number,
                            &record.raw,
                            AsmError::new(
                                AsmErrorKind::Internal,
                                format!(
                                    "Encoded length {} does not match declared size {} for {}",
                                    bytes.len(),
                                    entry.size(),
                                    entry.mnemonic
                                ),
                            ),
                        ));
                    }
                    bytes
                }
            };
            self.image.store_slice(record.addr, &bytes);
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }
}

fn diagnose(number: u32, raw: &str, error: AsmError) -> Diagnostic {
    Diagnostic::new(number, raw, error)
}

/// Run the assembler with command-line arguments.
pub fn run() -> Result<(), RunError> {
    let cli = Cli::parse();
    run_one(&cli)
}

fn run_one(cli: &Cli) -> Result<(), RunError> {
    let config = validate_cli(cli)?;

    let source = fs::read_to_string(&cli.infile).map_err(|_| {
        RunError::new(AsmError::new(
            AsmErrorKind::Io,
            format!("Cannot open file: {}", cli.infile.display()),
        ))
    })?;

    let mut assembler = Assembler::new();
    let bytes = assembler
        .run_source(&source)
        .map_err(RunError::from_diagnostic)?;

    if let Some(bin_path) = &config.bin_path {
        fs::write(bin_path, &bytes).map_err(|_| {
            RunError::new(AsmError::new(
                AsmErrorKind::Io,
                format!("Error opening file for write: {}", bin_path.display()),
            ))
        })?;
    }

    if let Some(hex_path) = &config.hex_path {
        let mut hex_file = fs::File::create(hex_path).map_err(|_| {
            RunError::new(AsmError::new(
                AsmErrorKind::Io,
                format!("Error opening file for write: {}", hex_path.display()),
            ))
        })?;
        assembler.image().write_hex_file(&mut hex_file).map_err(|err| {
            RunError::new(AsmError::new(AsmErrorKind::Io, err.to_string()))
        })?;
    }

    if config.dump_symbols {
        let stdout = std::io::stdout();
        assembler
            .symbols()
            .dump(stdout.lock())
            .map_err(|err| RunError::new(AsmError::new(AsmErrorKind::Io, err.to_string())))?;
    }

    Ok(())
}
