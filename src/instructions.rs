//! Per-arity instruction encoders. Each mnemonic's operand count and
//! addressing-mode restrictions are enforced here before a `MachineWord`
//! sequence is pushed onto the code image.

use crate::assembler::Assembler;
use crate::error::Error;
use crate::lexer::{next_token, Span, Token};
use crate::word::{AddressingMode, Are, MachineWord};

pub const MNEMONICS: [&str; 16] = [
    "mov", "cmp", "add", "sub", "not", "clr", "lea", "inc", "dec", "jmp", "bne", "red", "prn", "jsr", "rts", "stop",
];

const OPCODE_LEA: u8 = 6;
const OPCODE_CMP: u8 = 1;
const OPCODE_PRN: u8 = 12;

pub fn opcode_of(mnemonic: &str) -> u8 {
    MNEMONICS.iter().position(|m| *m == mnemonic).expect("mnemonic already classified by the lexer") as u8
}

/// The original's `parseTwoOperands`/`parseOneOperand` fall into a
/// `default: return FALSE` when a token isn't a number, label, or
/// register; anything else (a directive, another mnemonic, a bare
/// label declaration used where an operand was expected) is rejected
/// the same way here instead of reaching the word builders below.
fn operand_mode(tok: &Token, instruction: &str, line: &str, line_number: usize, span: Span) -> Result<u8, Error> {
    match tok {
        Token::Number(_) => Ok(AddressingMode::Immediate as u8),
        Token::Label(_) => Ok(AddressingMode::Direct as u8),
        Token::Register(_) => Ok(AddressingMode::Register as u8),
        _ => Err(Error::InvalidAddressingMode { instruction: instruction.to_string(), line_number, line: line.to_string(), span }),
    }
}

fn check_immediate_range(tok: &Token, line: &str, line_number: usize, span: Span) -> Result<(), Error> {
    if let Token::Number(v) = tok {
        if !(-1024..=1023).contains(v) {
            return Err(Error::ImmediateOutOfRange { value: *v, line_number, line: line.to_string(), span });
        }
    }
    Ok(())
}

/// Only ever called after `operand_mode` has already accepted `tok` as
/// a `Number`/`Register`/`Label`.
fn src_operand_word(tok: &Token) -> MachineWord {
    match tok {
        Token::Number(v) => MachineWord::ImmediateOrDirect { operand: *v as i16, are: Are::Absolute, label_ref: None },
        Token::Register(r) => MachineWord::Register { src_reg: *r, dst_reg: 0, are: Are::Absolute },
        Token::Label(name) => {
            MachineWord::ImmediateOrDirect { operand: 0, are: Are::NotDetermined, label_ref: Some(name.clone()) }
        }
        _ => unreachable!("operand_mode rejects every other token shape"),
    }
}

fn dst_operand_word(tok: &Token) -> MachineWord {
    match tok {
        Token::Number(v) => MachineWord::ImmediateOrDirect { operand: *v as i16, are: Are::Absolute, label_ref: None },
        Token::Register(r) => MachineWord::Register { src_reg: 0, dst_reg: *r, are: Are::Absolute },
        Token::Label(name) => {
            MachineWord::ImmediateOrDirect { operand: 0, are: Are::NotDetermined, label_ref: Some(name.clone()) }
        }
        _ => unreachable!("operand_mode rejects every other token shape"),
    }
}

fn wrong_count(instruction: &str, expected: usize, line: &str, line_number: usize) -> Error {
    Error::InvalidArgumentCount { instruction: instruction.to_string(), expected, line_number, line: line.to_string() }
}

pub fn encode_two_operands(
    asm: &mut Assembler,
    mnemonic: &str,
    line: &str,
    cursor: &mut usize,
    line_number: usize,
) -> Result<(), Error> {
    let opcode = opcode_of(mnemonic);
    let (src_tok, src_span) = next_token(line, cursor);
    let (comma_tok, _) = next_token(line, cursor);
    let (dst_tok, dst_span) = next_token(line, cursor);
    let (end_tok, _) = next_token(line, cursor);

    if src_tok == Token::End || dst_tok == Token::End {
        return Err(wrong_count(mnemonic, 2, line, line_number));
    }
    if comma_tok != Token::Comma || end_tok != Token::End {
        return Err(Error::InvalidCommaGrammar { line_number, line: line.to_string() });
    }
    if let Token::Invalid(text, reason) = &src_tok {
        return Err(Error::InvalidToken { token: text.clone(), reason: reason.clone(), line_number, line: line.to_string(), span: src_span });
    }
    if let Token::Invalid(text, reason) = &dst_tok {
        return Err(Error::InvalidToken { token: text.clone(), reason: reason.clone(), line_number, line: line.to_string(), span: dst_span });
    }

    if opcode == OPCODE_LEA && !matches!(src_tok, Token::Label(_)) {
        return Err(Error::InvalidAddressingMode { instruction: mnemonic.to_string(), line_number, line: line.to_string(), span: src_span });
    }
    if opcode != OPCODE_CMP && matches!(dst_tok, Token::Number(_)) {
        return Err(Error::InvalidAddressingMode { instruction: mnemonic.to_string(), line_number, line: line.to_string(), span: dst_span });
    }
    check_immediate_range(&src_tok, line, line_number, src_span)?;
    check_immediate_range(&dst_tok, line, line_number, dst_span)?;

    let first = MachineWord::First {
        opcode,
        src_mode: operand_mode(&src_tok, mnemonic, line, line_number, src_span)?,
        dst_mode: operand_mode(&dst_tok, mnemonic, line, line_number, dst_span)?,
        are: Are::Absolute,
    };
    asm.push_code(first, line_number)?;

    if let (Token::Register(s), Token::Register(d)) = (&src_tok, &dst_tok) {
        asm.push_code(MachineWord::Register { src_reg: *s, dst_reg: *d, are: Are::Absolute }, line_number)?;
    } else {
        asm.push_code(src_operand_word(&src_tok), line_number)?;
        asm.push_code(dst_operand_word(&dst_tok), line_number)?;
    }
    Ok(())
}

pub fn encode_one_operand(
    asm: &mut Assembler,
    mnemonic: &str,
    line: &str,
    cursor: &mut usize,
    line_number: usize,
) -> Result<(), Error> {
    let opcode = opcode_of(mnemonic);
    let (dst_tok, dst_span) = next_token(line, cursor);
    let (end_tok, _) = next_token(line, cursor);

    if dst_tok == Token::End {
        return Err(wrong_count(mnemonic, 1, line, line_number));
    }
    if end_tok != Token::End {
        return Err(Error::InvalidCommaGrammar { line_number, line: line.to_string() });
    }
    if let Token::Invalid(text, reason) = &dst_tok {
        return Err(Error::InvalidToken { token: text.clone(), reason: reason.clone(), line_number, line: line.to_string(), span: dst_span });
    }
    if opcode != OPCODE_PRN && matches!(dst_tok, Token::Number(_)) {
        return Err(Error::InvalidAddressingMode { instruction: mnemonic.to_string(), line_number, line: line.to_string(), span: dst_span });
    }
    check_immediate_range(&dst_tok, line, line_number, dst_span)?;

    let first = MachineWord::First { opcode, src_mode: 0, dst_mode: operand_mode(&dst_tok, mnemonic, line, line_number, dst_span)?, are: Are::Absolute };
    asm.push_code(first, line_number)?;
    asm.push_code(dst_operand_word(&dst_tok), line_number)?;
    Ok(())
}

pub fn encode_zero_operands(
    asm: &mut Assembler,
    mnemonic: &str,
    line: &str,
    cursor: &mut usize,
    line_number: usize,
) -> Result<(), Error> {
    let opcode = opcode_of(mnemonic);
    let (end_tok, _) = next_token(line, cursor);
    if end_tok != Token::End {
        return Err(wrong_count(mnemonic, 0, line, line_number));
    }
    asm.push_code(MachineWord::First { opcode, src_mode: 0, dst_mode: 0, are: Are::Absolute }, line_number)
}
