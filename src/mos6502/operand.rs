// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand types and addressing modes for the MOS 6502.

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::parser::Value;

/// Addressing modes of the base 6502.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressMode {
    /// No operand (NOP, RTS, BRK, etc.)
    Implied,
    /// `A` or empty operand on shift/rotate instructions
    Accumulator,
    /// `#$nn` - 8-bit immediate value
    Immediate,
    /// `$nn` - zero page (8-bit address)
    ZeroPage,
    /// `$nn,X` - zero page indexed by X
    ZeroPageX,
    /// `$nn,Y` - zero page indexed by Y
    ZeroPageY,
    /// `$nnnn` - absolute (16-bit address)
    Absolute,
    /// `$nnnn,X` - absolute indexed by X
    AbsoluteX,
    /// `$nnnn,Y` - absolute indexed by Y
    AbsoluteY,
    /// `($nnnn)` - indirect (JMP only)
    Indirect,
    /// `($nn,X)` - indexed indirect (zero page)
    IndexedIndirectX,
    /// `($nn),Y` - indirect indexed (zero page)
    IndirectIndexedY,
    /// Branch target, encoded as an 8-bit signed offset
    Relative,
}

impl AddressMode {
    /// Number of operand bytes following the opcode.
    #[must_use]
    pub fn operand_size(self) -> u8 {
        match self {
            AddressMode::Implied | AddressMode::Accumulator => 0,
            AddressMode::Immediate
            | AddressMode::ZeroPage
            | AddressMode::ZeroPageX
            | AddressMode::ZeroPageY
            | AddressMode::IndexedIndirectX
            | AddressMode::IndirectIndexedY
            | AddressMode::Relative => 1,
            AddressMode::Absolute
            | AddressMode::AbsoluteX
            | AddressMode::AbsoluteY
            | AddressMode::Indirect => 2,
        }
    }

    /// Human-readable mode name for diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AddressMode::Implied => "implied",
            AddressMode::Accumulator => "accumulator",
            AddressMode::Immediate => "immediate",
            AddressMode::ZeroPage => "zero page",
            AddressMode::ZeroPageX => "zero page,X",
            AddressMode::ZeroPageY => "zero page,Y",
            AddressMode::Absolute => "absolute",
            AddressMode::AbsoluteX => "absolute,X",
            AddressMode::AbsoluteY => "absolute,Y",
            AddressMode::Indirect => "indirect",
            AddressMode::IndexedIndirectX => "indexed indirect",
            AddressMode::IndirectIndexedY => "indirect indexed",
            AddressMode::Relative => "relative",
        }
    }
}

/// Low/high byte selector in immediate operands (`#<expr`, `#>expr`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteSelector {
    Low,
    High,
}

/// The textual shape of an instruction operand.
///
/// Shapes carry unresolved [`Value`]s; the zero-page/absolute split for
/// the direct shapes is decided by the layout pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperandForm {
    /// Empty operand
    Implied,
    /// `A`
    Accumulator,
    /// `#value`, optionally with a byte selector
    Immediate {
        selector: Option<ByteSelector>,
        value: Value,
    },
    /// Bare address: zero page, absolute, or branch target
    Direct(Value),
    /// `value,X`
    DirectX(Value),
    /// `value,Y`
    DirectY(Value),
    /// `(value)`
    Indirect(Value),
    /// `(value,X)`
    IndirectX(Value),
    /// `(value),Y`
    IndirectY(Value),
}

impl OperandForm {
    /// Tokenize operand text into its addressing shape.
    pub fn parse(text: &str) -> Result<OperandForm, AsmError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(OperandForm::Implied);
        }
        if text.eq_ignore_ascii_case("A") {
            return Ok(OperandForm::Accumulator);
        }

        if let Some(rest) = text.strip_prefix('#') {
            return parse_immediate(rest.trim_start());
        }

        if text.starts_with('(') {
            return parse_indirect(text);
        }

        if let Some((head, index)) = split_index(text) {
            let value = parse_address_value(head)?;
            return Ok(match index {
                IndexRegister::X => OperandForm::DirectX(value),
                IndexRegister::Y => OperandForm::DirectY(value),
            });
        }

        Ok(OperandForm::Direct(parse_address_value(text)?))
    }

    /// The unresolved value carried by address-shaped operands.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            OperandForm::Direct(value)
            | OperandForm::DirectX(value)
            | OperandForm::DirectY(value)
            | OperandForm::Indirect(value)
            | OperandForm::IndirectX(value)
            | OperandForm::IndirectY(value) => Some(value),
            OperandForm::Immediate { value, .. } => Some(value),
            OperandForm::Implied | OperandForm::Accumulator => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum IndexRegister {
    X,
    Y,
}

fn parse_immediate(rest: &str) -> Result<OperandForm, AsmError> {
    let (selector, rest) = if let Some(expr) = rest.strip_prefix('<') {
        (Some(ByteSelector::Low), expr.trim_start())
    } else if let Some(expr) = rest.strip_prefix('>') {
        (Some(ByteSelector::High), expr.trim_start())
    } else {
        (None, rest)
    };
    let value = Value::parse(rest)?;
    if matches!(value, Value::Char(_)) {
        return Err(AsmError::new(
            AsmErrorKind::Syntax,
            format!("Character literal not permitted in immediate operand: '{rest}'"),
        ));
    }
    Ok(OperandForm::Immediate { selector, value })
}

fn parse_indirect(text: &str) -> Result<OperandForm, AsmError> {
    let Some(close) = text.find(')') else {
        return Err(AsmError::new(
            AsmErrorKind::Syntax,
            format!("Unbalanced parentheses in operand: '{text}'"),
        ));
    };
    let inner = text[1..close].trim();
    let after = text[close + 1..].trim();

    if after.is_empty() {
        if let Some((head, index)) = split_index(inner) {
            if index == IndexRegister::X {
                return Ok(OperandForm::IndirectX(parse_address_value(head)?));
            }
            return Err(AsmError::new(
                AsmErrorKind::Syntax,
                format!("Invalid indirect operand: '{text}'"),
            ));
        }
        return Ok(OperandForm::Indirect(parse_address_value(inner)?));
    }

    let Some(index) = after.strip_prefix(',') else {
        return Err(AsmError::new(
            AsmErrorKind::Syntax,
            format!("Invalid indirect operand: '{text}'"),
        ));
    };
    if index.trim().eq_ignore_ascii_case("Y") {
        return Ok(OperandForm::IndirectY(parse_address_value(inner)?));
    }
    Err(AsmError::new(
        AsmErrorKind::Syntax,
        format!("Invalid indirect operand: '{text}'"),
    ))
}

/// Split a trailing `,X` / `,Y` index suffix.
fn split_index(text: &str) -> Option<(&str, IndexRegister)> {
    let (head, tail) = text.rsplit_once(',')?;
    let tail = tail.trim();
    if tail.eq_ignore_ascii_case("X") {
        Some((head.trim(), IndexRegister::X))
    } else if tail.eq_ignore_ascii_case("Y") {
        Some((head.trim(), IndexRegister::Y))
    } else {
        None
    }
}

/// Address operands admit hex literals and identifiers only.
fn parse_address_value(text: &str) -> Result<Value, AsmError> {
    let value = Value::parse(text)?;
    match value {
        Value::Hex { .. } | Value::Ident(_) => Ok(value),
        Value::Dec { .. } | Value::Char(_) => Err(AsmError::new(
            AsmErrorKind::Syntax,
            format!("Invalid address operand: '{text}' (hex literal or label required)"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_implied_and_accumulator() {
        assert_eq!(OperandForm::parse("").unwrap(), OperandForm::Implied);
        assert_eq!(OperandForm::parse("A").unwrap(), OperandForm::Accumulator);
        assert_eq!(OperandForm::parse("a").unwrap(), OperandForm::Accumulator);
    }

    #[test]
    fn parses_immediate_forms() {
        let form = OperandForm::parse("#$1F").unwrap();
        assert!(matches!(
            form,
            OperandForm::Immediate {
                selector: None,
                value: Value::Hex { .. }
            }
        ));
        let form = OperandForm::parse("#128").unwrap();
        assert!(matches!(
            form,
            OperandForm::Immediate {
                selector: None,
                value: Value::Dec { .. }
            }
        ));
        let form = OperandForm::parse("#<msg").unwrap();
        assert!(matches!(
            form,
            OperandForm::Immediate {
                selector: Some(ByteSelector::Low),
                ..
            }
        ));
        let form = OperandForm::parse("#>$0200").unwrap();
        assert!(matches!(
            form,
            OperandForm::Immediate {
                selector: Some(ByteSelector::High),
                ..
            }
        ));
    }

    #[test]
    fn immediate_rejects_character_literals() {
        assert!(OperandForm::parse("#'A'").is_err());
    }

    #[test]
    fn parses_direct_and_indexed_shapes() {
        assert!(matches!(
            OperandForm::parse("$0300").unwrap(),
            OperandForm::Direct(Value::Hex { .. })
        ));
        assert!(matches!(
            OperandForm::parse("label").unwrap(),
            OperandForm::Direct(Value::Ident(_))
        ));
        assert!(matches!(
            OperandForm::parse("$10,X").unwrap(),
            OperandForm::DirectX(_)
        ));
        assert!(matches!(
            OperandForm::parse("$0200 , y").unwrap(),
            OperandForm::DirectY(_)
        ));
    }

    #[test]
    fn parses_indirect_shapes() {
        assert!(matches!(
            OperandForm::parse("($1234)").unwrap(),
            OperandForm::Indirect(_)
        ));
        assert!(matches!(
            OperandForm::parse("($20,X)").unwrap(),
            OperandForm::IndirectX(_)
        ));
        assert!(matches!(
            OperandForm::parse("($20),Y").unwrap(),
            OperandForm::IndirectY(_)
        ));
        assert!(matches!(
            OperandForm::parse("(vec),y").unwrap(),
            OperandForm::IndirectY(Value::Ident(_))
        ));
    }

    #[test]
    fn rejects_malformed_indirects() {
        assert!(OperandForm::parse("($20").is_err());
        assert!(OperandForm::parse("($20,Y)").is_err());
        assert!(OperandForm::parse("($20),X").is_err());
        assert!(OperandForm::parse("($20)Y").is_err());
    }

    #[test]
    fn address_operands_reject_decimal_and_char() {
        assert!(OperandForm::parse("512").is_err());
        assert!(OperandForm::parse("'A'").is_err());
        assert!(OperandForm::parse("300,X").is_err());
    }

    #[test]
    fn operand_sizes_match_modes() {
        assert_eq!(AddressMode::Implied.operand_size(), 0);
        assert_eq!(AddressMode::Immediate.operand_size(), 1);
        assert_eq!(AddressMode::Relative.operand_size(), 1);
        assert_eq!(AddressMode::Absolute.operand_size(), 2);
        assert_eq!(AddressMode::Indirect.operand_size(), 2);
    }
}
