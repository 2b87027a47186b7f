// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};

use crate::core::error::{AsmError, AsmErrorKind, RunError};

pub const VERSION: &str = "1.0";

const LONG_ABOUT: &str = "MOS 6502 Assembler producing flat binary and Intel HEX output.

Outputs are opt-in: specify at least one of -b/--bin, -x/--hex, or
-s/--symbols. Use -o/--outfile to set the output base name when
filenames are omitted. The binary output is the flat concatenation of
emitted bytes; the HEX output places bytes at their load addresses and
is the form to use for programs with more than one origin.";

#[derive(Parser, Debug)]
#[command(
    name = "mosforge",
    version = VERSION,
    about = "MOS 6502 Assembler producing flat binary and Intel HEX output",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        short = 'i',
        long = "infile",
        value_name = "FILE",
        long_help = "Input assembly source file."
    )]
    pub infile: PathBuf,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "BASE",
        long_help = "Output filename base when -b/-x omit filenames. Defaults to the input base name."
    )]
    pub outfile: Option<String>,
    #[arg(
        short = 'b',
        long = "bin",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Emit the flat binary stream. FILE is optional; when omitted, the output base is used and a .bin extension is added."
    )]
    pub bin_name: Option<String>,
    #[arg(
        short = 'x',
        long = "hex",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Emit an Intel HEX file with bytes at their load addresses. FILE is optional; when omitted, the output base is used and a .hex extension is added."
    )]
    pub hex_name: Option<String>,
    #[arg(
        short = 's',
        long = "symbols",
        action = ArgAction::SetTrue,
        long_help = "Print the symbol table to stdout after assembly."
    )]
    pub symbols: bool,
}

/// Validated output plan for one run.
#[derive(Debug)]
pub struct OutputConfig {
    pub bin_path: Option<PathBuf>,
    pub hex_path: Option<PathBuf>,
    pub dump_symbols: bool,
}

/// Check output options and resolve the concrete output paths.
pub fn validate_cli(cli: &Cli) -> Result<OutputConfig, RunError> {
    if cli.bin_name.is_none() && cli.hex_name.is_none() && !cli.symbols {
        return Err(RunError::new(AsmError::new(
            AsmErrorKind::Io,
            "No output selected; use -b/--bin, -x/--hex, or -s/--symbols",
        )));
    }

    let base = match &cli.outfile {
        Some(base) => base.clone(),
        None => input_base_from_path(&cli.infile)?,
    };

    Ok(OutputConfig {
        bin_path: resolve_output_path(&base, cli.bin_name.as_deref(), "bin"),
        hex_path: resolve_output_path(&base, cli.hex_name.as_deref(), "hex"),
        dump_symbols: cli.symbols,
    })
}

/// Derive the default output base from the input filename.
pub fn input_base_from_path(path: &Path) -> Result<String, RunError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            RunError::new(AsmError::new(
                AsmErrorKind::Io,
                format!("Invalid input filename: {}", path.display()),
            ))
        })
}

/// Resolve an output path from an optional explicit name.
///
/// `None` means the output was not requested; an empty name means the
/// flag was given without a filename, so the base plus extension is
/// used.
pub fn resolve_output_path(base: &str, name: Option<&str>, ext: &str) -> Option<PathBuf> {
    match name {
        None => None,
        Some("") => Some(PathBuf::from(format!("{base}.{ext}"))),
        Some(name) => {
            let path = PathBuf::from(name);
            if path.extension().is_none() {
                Some(path.with_extension(ext))
            } else {
                Some(path)
            }
        }
    }
}
