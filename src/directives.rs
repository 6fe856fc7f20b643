//! Handlers for the four assembler directives: `.data`, `.string`,
//! `.extern`, `.entry`.

use crate::assembler::Assembler;
use crate::error::Error;
use crate::lexer::{next_token, Span, Token};
use crate::symbol::SymbolKind;

fn mask12(v: i32) -> u16 {
    (v as i16 as u16) & 0x0FFF
}

fn invalid(reason: &str, line: &str, line_number: usize, span: Span) -> Error {
    Error::InvalidArgument { reason: reason.to_string(), line_number, line: line.to_string(), span }
}

fn comma_grammar(line: &str, line_number: usize) -> Error {
    Error::InvalidCommaGrammar { line_number, line: line.to_string() }
}

pub fn parse_data(asm: &mut Assembler, line: &str, cursor: &mut usize, line_number: usize) -> Result<(), Error> {
    let (tok, span) = next_token(line, cursor);
    let mut values = Vec::new();
    match tok {
        Token::Number(v) => values.push(v),
        Token::Comma => return Err(comma_grammar(line, line_number)),
        Token::End => return Err(invalid(".data requires at least one number", line, line_number, span)),
        _ => return Err(invalid(".data arguments must be numbers", line, line_number, span)),
    }

    loop {
        let (tok, span) = next_token(line, cursor);
        match tok {
            Token::End => break,
            Token::Comma => {
                let (tok2, span2) = next_token(line, cursor);
                match tok2 {
                    Token::Number(v) => values.push(v),
                    Token::End => return Err(comma_grammar(line, line_number)),
                    _ => return Err(invalid(".data arguments must be numbers", line, line_number, span2)),
                }
            }
            _ => return Err(comma_grammar(line, line_number)),
        }
    }

    for v in values {
        asm.push_data(mask12(v), line_number)?;
    }
    Ok(())
}

/// Pushes the string's bytes followed by an explicit trailing zero
/// word — the length-plus-one word count a C string's implicit NUL
/// terminator gives for free.
pub fn parse_string(asm: &mut Assembler, line: &str, cursor: &mut usize, line_number: usize) -> Result<(), Error> {
    let (tok, span) = next_token(line, cursor);
    let text = match tok {
        Token::Str(s) => s,
        _ => return Err(invalid(".string requires a quoted string literal", line, line_number, span)),
    };
    let (end_tok, end_span) = next_token(line, cursor);
    if end_tok != Token::End {
        return Err(invalid("unexpected token after string literal", line, line_number, end_span));
    }
    for byte in text.bytes() {
        asm.push_data(byte as u16, line_number)?;
    }
    asm.push_data(0, line_number)?;
    Ok(())
}

fn parse_single_label(line: &str, cursor: &mut usize, line_number: usize) -> Result<String, Error> {
    let (tok, span) = next_token(line, cursor);
    let name = match tok {
        Token::Label(name) => name,
        _ => return Err(invalid("expected a label name", line, line_number, span)),
    };
    let (end_tok, end_span) = next_token(line, cursor);
    if end_tok != Token::End {
        return Err(invalid("unexpected token after label name", line, line_number, end_span));
    }
    Ok(name)
}

pub fn parse_extern(asm: &mut Assembler, line: &str, cursor: &mut usize, line_number: usize) -> Result<(), Error> {
    let name = parse_single_label(line, cursor, line_number)?;
    asm.add_symbol(&name, SymbolKind::External, false, line_number)
}

pub fn parse_entry(asm: &mut Assembler, line: &str, cursor: &mut usize, line_number: usize) -> Result<(), Error> {
    let name = parse_single_label(line, cursor, line_number)?;
    asm.add_symbol(&name, SymbolKind::Exported, false, line_number)
}

#[cfg(test)]
mod tests {
    use crate::assembler::assemble;
    use crate::error::Error;

    #[test]
    fn data_directive_accumulates_values() {
        let program = assemble(".data 1, 2, 3\n").unwrap();
        assert_eq!(program.data.len(), 3);
    }

    #[test]
    fn data_directive_rejects_trailing_comma() {
        let errors = assemble(".data 1, 2,\n").unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn string_directive_writes_length_plus_one_words() {
        let program = assemble(r#".string "ab""#).unwrap();
        assert_eq!(program.data.len(), 3);
    }

    #[test]
    fn extern_and_entry_require_exactly_one_label() {
        let errors = assemble(".extern\n").unwrap_err();
        assert!(matches!(errors[0], Error::InvalidArgument { .. }));
    }
}
