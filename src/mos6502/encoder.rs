// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Addressing-mode selection and operand encoding.
//!
//! Selection runs in pass 1 and fixes each instruction's mode, opcode
//! and size; encoding runs in pass 2 and must honor that choice. The
//! two passes agree by construction: the only deferred decision is the
//! zero-page/absolute split for identifier operands, which selection
//! resolves with the binding state available at its point in pass 1.

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::parser::{check_range, Value};
use crate::core::symbol_table::SymbolTable;

use super::operand::{AddressMode, ByteSelector, OperandForm};
use super::table::{self, InstructionEntry};

/// Fix the addressing-mode variant for an instruction in pass 1.
///
/// For identifier operands that admit both a zero-page and an absolute
/// encoding, the zero-page variant is chosen only when the identifier
/// is already bound to an address in the zero page; anything else
/// (including every forward reference) selects the absolute variant.
pub fn select_variant(
    mnemonic: &str,
    form: &OperandForm,
    symbols: &SymbolTable,
) -> Result<&'static InstructionEntry, AsmError> {
    if !table::has_mnemonic(mnemonic) {
        return Err(AsmError::new(
            AsmErrorKind::Syntax,
            format!("Unknown mnemonic: {mnemonic}"),
        ));
    }

    match form {
        OperandForm::Implied => table::lookup(mnemonic, AddressMode::Implied)
            .or_else(|| table::lookup(mnemonic, AddressMode::Accumulator))
            .ok_or_else(|| mode_error(mnemonic, "requires an operand")),
        OperandForm::Accumulator => require_mode(mnemonic, AddressMode::Accumulator),
        OperandForm::Immediate { .. } => require_mode(mnemonic, AddressMode::Immediate),
        OperandForm::Direct(value) => {
            if table::is_branch(mnemonic) {
                if value.as_ident().is_none() {
                    return Err(mode_error(mnemonic, "branch target must be a label"));
                }
                return require_mode(mnemonic, AddressMode::Relative);
            }
            select_direct(
                mnemonic,
                value,
                symbols,
                AddressMode::ZeroPage,
                AddressMode::Absolute,
            )
        }
        OperandForm::DirectX(value) => select_direct(
            mnemonic,
            value,
            symbols,
            AddressMode::ZeroPageX,
            AddressMode::AbsoluteX,
        ),
        OperandForm::DirectY(value) => select_direct(
            mnemonic,
            value,
            symbols,
            AddressMode::ZeroPageY,
            AddressMode::AbsoluteY,
        ),
        OperandForm::Indirect(_) => require_mode(mnemonic, AddressMode::Indirect),
        OperandForm::IndirectX(_) => require_mode(mnemonic, AddressMode::IndexedIndirectX),
        OperandForm::IndirectY(_) => require_mode(mnemonic, AddressMode::IndirectIndexedY),
    }
}

fn require_mode(
    mnemonic: &str,
    mode: AddressMode,
) -> Result<&'static InstructionEntry, AsmError> {
    table::lookup(mnemonic, mode).ok_or_else(|| {
        mode_error(mnemonic, &format!("does not support {} addressing", mode.name()))
    })
}

/// Resolve the zero-page/absolute split for a direct-shaped operand.
///
/// Hex literals split on their written digit count (one or two digits
/// is the zero-page form). Identifiers follow the provisional rule in
/// the doc comment on [`select_variant`].
fn select_direct(
    mnemonic: &str,
    value: &Value,
    symbols: &SymbolTable,
    zp_mode: AddressMode,
    abs_mode: AddressMode,
) -> Result<&'static InstructionEntry, AsmError> {
    let zp_row = table::lookup(mnemonic, zp_mode);
    let abs_row = table::lookup(mnemonic, abs_mode);

    match value {
        Value::Hex { .. } => {
            if value.is_zero_page_literal() {
                zp_row.ok_or_else(|| {
                    mode_error(
                        mnemonic,
                        &format!("does not support {} addressing", zp_mode.name()),
                    )
                })
            } else {
                abs_row.ok_or_else(|| {
                    mode_error(
                        mnemonic,
                        &format!("does not support {} addressing", abs_mode.name()),
                    )
                })
            }
        }
        Value::Ident(name) => {
            let bound_zero_page =
                matches!(symbols.lookup(name), Some(addr) if addr <= 0xff);
            if bound_zero_page {
                if let Some(row) = zp_row {
                    return Ok(row);
                }
            }
            abs_row.or(zp_row).ok_or_else(|| {
                mode_error(
                    mnemonic,
                    &format!("does not support {} addressing", abs_mode.name()),
                )
            })
        }
        // The operand parser only passes hex literals and identifiers.
        _ => Err(AsmError::new(
            AsmErrorKind::Internal,
            format!("Unexpected address value for {mnemonic}"),
        )),
    }
}

fn mode_error(mnemonic: &str, detail: &str) -> AsmError {
    AsmError::new(AsmErrorKind::Mode, format!("{mnemonic} {detail}"))
}

/// Encode an instruction in pass 2 against its pass-1 variant.
///
/// `addr` is the instruction's own address, used for relative-branch
/// offset arithmetic.
pub fn encode(
    entry: &InstructionEntry,
    form: &OperandForm,
    addr: u16,
    symbols: &SymbolTable,
) -> Result<Vec<u8>, AsmError> {
    let mut bytes = vec![entry.opcode];
    match entry.mode {
        AddressMode::Implied | AddressMode::Accumulator => {}
        AddressMode::Immediate => {
            let OperandForm::Immediate { selector, value } = form else {
                return Err(shape_mismatch(entry));
            };
            bytes.push(encode_immediate(*selector, value, symbols)?);
        }
        AddressMode::ZeroPage
        | AddressMode::ZeroPageX
        | AddressMode::ZeroPageY
        | AddressMode::IndexedIndirectX
        | AddressMode::IndirectIndexedY => {
            let value = form.value().ok_or_else(|| shape_mismatch(entry))?;
            let val = value.resolve_checked(symbols, 0xff)?;
            bytes.push(val as u8);
        }
        AddressMode::Absolute
        | AddressMode::AbsoluteX
        | AddressMode::AbsoluteY
        | AddressMode::Indirect => {
            let value = form.value().ok_or_else(|| shape_mismatch(entry))?;
            let val = value.resolve_checked(symbols, 0xffff)?;
            bytes.push((val & 0xff) as u8);
            bytes.push((val >> 8) as u8);
        }
        AddressMode::Relative => {
            let value = form.value().ok_or_else(|| shape_mismatch(entry))?;
            bytes.push(encode_branch_offset(value, addr, symbols)?);
        }
    }
    Ok(bytes)
}

fn encode_immediate(
    selector: Option<ByteSelector>,
    value: &Value,
    symbols: &SymbolTable,
) -> Result<u8, AsmError> {
    let val = value.resolve(symbols)?;
    match selector {
        None => {
            check_range(val, 0xff)?;
            Ok(val as u8)
        }
        Some(ByteSelector::Low) => Ok((val & 0xff) as u8),
        Some(ByteSelector::High) => Ok(((val >> 8) & 0xff) as u8),
    }
}

/// Compute the signed 8-bit offset for a branch at `addr` targeting
/// the label's address: `target - (addr + 2)`, two's complement.
fn encode_branch_offset(
    value: &Value,
    addr: u16,
    symbols: &SymbolTable,
) -> Result<u8, AsmError> {
    let target = value.resolve(symbols)? as i64;
    let offset = target - (i64::from(addr) + 2);
    if !(-128..=127).contains(&offset) {
        let name = value.as_ident().unwrap_or("?");
        return Err(AsmError::new(
            AsmErrorKind::Range,
            format!("Branch target '{name}' out of range: offset {offset} exceeds -128..127"),
        ));
    }
    Ok(offset as i8 as u8)
}

fn shape_mismatch(entry: &InstructionEntry) -> AsmError {
    AsmError::new(
        AsmErrorKind::Internal,
        format!(
            "Operand shape does not match {} {} variant",
            entry.mnemonic,
            entry.mode.name()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(text: &str) -> OperandForm {
        OperandForm::parse(text).expect("operand should parse")
    }

    fn select(mnemonic: &str, text: &str, symbols: &SymbolTable) -> &'static InstructionEntry {
        select_variant(mnemonic, &form(text), symbols).expect("variant should resolve")
    }

    #[test]
    fn hex_digit_count_drives_zero_page_split() {
        let symbols = SymbolTable::new();
        assert_eq!(select("LDA", "$10", &symbols).mode, AddressMode::ZeroPage);
        assert_eq!(select("LDA", "$0010", &symbols).mode, AddressMode::Absolute);
        assert_eq!(select("LDA", "$123", &symbols).mode, AddressMode::Absolute);
    }

    #[test]
    fn bound_zero_page_label_selects_zero_page() {
        let mut symbols = SymbolTable::new();
        let _ = symbols.add("zp", 0x10);
        let _ = symbols.add("far", 0x0300);
        assert_eq!(select("LDA", "zp", &symbols).mode, AddressMode::ZeroPage);
        assert_eq!(select("LDA", "far", &symbols).mode, AddressMode::Absolute);
        // Forward references default to the always-safe absolute form.
        assert_eq!(select("LDA", "later", &symbols).mode, AddressMode::Absolute);
    }

    #[test]
    fn zero_page_only_mnemonic_accepts_forward_reference() {
        let symbols = SymbolTable::new();
        // STY has no absolute,X variant; the zero page,X row is the
        // only candidate for an identifier operand.
        assert_eq!(select("STY", "later,X", &symbols).mode, AddressMode::ZeroPageX);
    }

    #[test]
    fn jmp_only_admits_absolute_shapes() {
        let symbols = SymbolTable::new();
        assert_eq!(select("JMP", "$0200", &symbols).mode, AddressMode::Absolute);
        assert_eq!(select("JMP", "loop", &symbols).mode, AddressMode::Absolute);
        let err = select_variant("JMP", &form("$10"), &symbols).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Mode);
    }

    #[test]
    fn invalid_mode_pairs_are_rejected() {
        let symbols = SymbolTable::new();
        let err = select_variant("LDX", &form("$10,X"), &symbols).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Mode);
        assert!(err.message().contains("LDX"));
        let err = select_variant("STA", &form("#$10"), &symbols).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Mode);
        let err = select_variant("LDA", &form(""), &symbols).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Mode);
    }

    #[test]
    fn unknown_mnemonic_is_a_syntax_error() {
        let symbols = SymbolTable::new();
        let err = select_variant("XYZ", &form(""), &symbols).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Syntax);
        assert!(err.message().contains("XYZ"));
    }

    #[test]
    fn shift_without_operand_uses_accumulator_row() {
        let symbols = SymbolTable::new();
        assert_eq!(select("ASL", "", &symbols).opcode, 0x0A);
        assert_eq!(select("ASL", "A", &symbols).opcode, 0x0A);
        assert_eq!(select("BRK", "", &symbols).opcode, 0x00);
    }

    #[test]
    fn branch_operand_must_be_a_label() {
        let symbols = SymbolTable::new();
        assert_eq!(select("BNE", "loop", &symbols).mode, AddressMode::Relative);
        let err = select_variant("BNE", &form("$0200"), &symbols).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Mode);
    }

    #[test]
    fn encodes_absolute_little_endian() {
        let mut symbols = SymbolTable::new();
        let _ = symbols.add("target", 0x0300);
        let entry = select("STA", "$0300", &symbols);
        let bytes = encode(entry, &form("$0300"), 0x0200, &symbols).unwrap();
        assert_eq!(bytes, vec![0x8D, 0x00, 0x03]);
        let entry = select("STA", "target", &symbols);
        let bytes = encode(entry, &form("target"), 0x0200, &symbols).unwrap();
        assert_eq!(bytes, vec![0x8D, 0x00, 0x03]);
    }

    #[test]
    fn encodes_immediate_with_selectors() {
        let mut symbols = SymbolTable::new();
        let _ = symbols.add("msg", 0x1234);
        let entry = select("LDA", "#<msg", &symbols);
        assert_eq!(
            encode(entry, &form("#<msg"), 0, &symbols).unwrap(),
            vec![0xA9, 0x34]
        );
        assert_eq!(
            encode(entry, &form("#>msg"), 0, &symbols).unwrap(),
            vec![0xA9, 0x12]
        );
    }

    #[test]
    fn immediate_range_error_names_value_and_bound() {
        let symbols = SymbolTable::new();
        let entry = select("LDA", "#256", &symbols);
        let err = encode(entry, &form("#256"), 0, &symbols).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Range);
        assert_eq!(err.message(), "Value 256 out of range 0-255");
    }

    #[test]
    fn encodes_branch_offsets_both_directions() {
        let mut symbols = SymbolTable::new();
        let _ = symbols.add("back", 0x0202);
        let _ = symbols.add("fwd", 0x0210);
        let entry = select("BNE", "back", &symbols);
        // Branch at $0205: $0202 - ($0205 + 2) = -5 -> $FB.
        assert_eq!(
            encode(entry, &form("back"), 0x0205, &symbols).unwrap(),
            vec![0xD0, 0xFB]
        );
        assert_eq!(
            encode(entry, &form("fwd"), 0x0205, &symbols).unwrap(),
            vec![0xD0, 0x09]
        );
    }

    #[test]
    fn branch_out_of_range_names_label_and_offset() {
        let mut symbols = SymbolTable::new();
        let _ = symbols.add("far", 0x0400);
        let entry = select("BEQ", "far", &symbols);
        let err = encode(entry, &form("far"), 0x0200, &symbols).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Range);
        assert!(err.message().contains("far"));
        assert!(err.message().contains("510"));
    }

    #[test]
    fn undefined_branch_target_is_a_symbol_error() {
        let symbols = SymbolTable::new();
        let entry = select("BEQ", "nowhere", &symbols);
        let err = encode(entry, &form("nowhere"), 0x0200, &symbols).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Symbol);
    }

    #[test]
    fn encodes_indirect_shapes() {
        let mut symbols = SymbolTable::new();
        let _ = symbols.add("vec", 0x20);
        let entry = select("JMP", "($1234)", &symbols);
        assert_eq!(
            encode(entry, &form("($1234)"), 0, &symbols).unwrap(),
            vec![0x6C, 0x34, 0x12]
        );
        let entry = select("LDA", "($20,X)", &symbols);
        assert_eq!(
            encode(entry, &form("($20,X)"), 0, &symbols).unwrap(),
            vec![0xA1, 0x20]
        );
        let entry = select("LDA", "(vec),Y", &symbols);
        assert_eq!(
            encode(entry, &form("(vec),Y"), 0, &symbols).unwrap(),
            vec![0xB1, 0x20]
        );
    }

    #[test]
    fn zero_page_range_is_enforced_at_encode_time() {
        let mut symbols = SymbolTable::new();
        let _ = symbols.add("far", 0x0300);
        let entry = select("LDA", "($20),Y", &symbols);
        let err = encode(entry, &form("(far),Y"), 0, &symbols).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Range);
        assert_eq!(err.message(), "Value 768 out of range 0-255");
    }
}
