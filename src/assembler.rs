//! Two-pass assembly of preprocessed source text into a code image, a
//! data image, and the three label tables.

use crate::directives;
use crate::error::Error;
use crate::instructions;
use crate::lexer::{next_token, Token, MAX_LINE_LENGTH};
use crate::symbol::{SymbolKind, SymbolTables};
use crate::word::MachineWord;

pub const BASE_ADDRESS: u16 = 100;
pub const MEMORY_CAPACITY: u16 = 924;

pub struct AssembledProgram {
    pub code: Vec<MachineWord>,
    pub data: Vec<MachineWord>,
    pub externals: Vec<(String, u16)>,
    pub entries: Vec<(String, i32)>,
    /// Non-fatal cross-table diagnostics, e.g. a name declared both
    /// `.extern` and `.entry`.
    pub warnings: Vec<String>,
}

pub struct Assembler {
    pub(crate) code: Vec<MachineWord>,
    pub(crate) data: Vec<MachineWord>,
    pub(crate) ic: u16,
    pub(crate) dc: u16,
    pub(crate) symbols: SymbolTables,
    errors: Vec<Error>,
}

impl Assembler {
    fn new() -> Self {
        Assembler {
            code: Vec::new(),
            data: Vec::new(),
            ic: 0,
            dc: 0,
            symbols: SymbolTables::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn check_capacity(&self, line_number: usize) -> Result<(), Error> {
        if self.ic as u32 + self.dc as u32 + 1 > MEMORY_CAPACITY as u32 {
            return Err(Error::CapacityExceeded { line_number });
        }
        Ok(())
    }

    pub(crate) fn push_data(&mut self, value: u16, line_number: usize) -> Result<(), Error> {
        self.check_capacity(line_number)?;
        self.data.push(MachineWord::Data { value });
        self.dc += 1;
        Ok(())
    }

    pub(crate) fn push_code(&mut self, word: MachineWord, line_number: usize) -> Result<(), Error> {
        self.check_capacity(line_number)?;
        self.code.push(word);
        self.ic += 1;
        Ok(())
    }

    pub(crate) fn add_symbol(
        &mut self,
        name: &str,
        kind: SymbolKind,
        is_data: bool,
        line_number: usize,
    ) -> Result<(), Error> {
        self.symbols.add(name, kind, is_data, self.ic, self.dc, line_number)
    }

    fn process_line(&mut self, raw_line: &str, line_number: usize) -> Result<(), Error> {
        if raw_line.len() > MAX_LINE_LENGTH {
            return Err(Error::LineTooLong { line_number });
        }
        if raw_line.trim().is_empty() || raw_line.trim_start().starts_with(';') {
            return Ok(());
        }

        let mut cursor = 0usize;
        let (mut tok, mut span) = next_token(raw_line, &mut cursor);
        if tok == Token::End {
            return Ok(());
        }

        let mut label_decl = None;
        if let Token::LabelDeclaration(name) = tok {
            label_decl = Some(name);
            let (t2, s2) = next_token(raw_line, &mut cursor);
            tok = t2;
            span = s2;
        }

        match tok {
            Token::Directive(directive) => {
                self.dispatch_directive(&directive, label_decl, raw_line, &mut cursor, line_number)
            }
            Token::InstructionNoOperands(mnemonic) => {
                self.declare_code_label(label_decl, line_number)?;
                instructions::encode_zero_operands(self, &mnemonic, raw_line, &mut cursor, line_number)
            }
            Token::InstructionOneOperand(mnemonic) => {
                self.declare_code_label(label_decl, line_number)?;
                instructions::encode_one_operand(self, &mnemonic, raw_line, &mut cursor, line_number)
            }
            Token::InstructionTwoOperands(mnemonic) => {
                self.declare_code_label(label_decl, line_number)?;
                instructions::encode_two_operands(self, &mnemonic, raw_line, &mut cursor, line_number)
            }
            Token::Invalid(text, reason) => {
                Err(Error::InvalidToken { token: text, reason, line_number, line: raw_line.to_string(), span })
            }
            // A bare word that lexes as a plain label rather than a
            // directive or instruction keyword is exactly what's left
            // over once the preprocessor has expanded every macro it
            // recognized: it's a reference to a macro that was never
            // defined.
            Token::Label(name) => Err(Error::UnknownMacroReference { name, line_number }),
            _ => Err(Error::InvalidToken {
                token: raw_line[span.start..span.end].to_string(),
                reason: "expected a directive or instruction".to_string(),
                line_number,
                line: raw_line.to_string(),
                span,
            }),
        }
    }

    fn declare_code_label(&mut self, label_decl: Option<String>, line_number: usize) -> Result<(), Error> {
        if let Some(name) = label_decl {
            self.add_symbol(&name, SymbolKind::Internal, false, line_number)?;
        }
        Ok(())
    }

    fn dispatch_directive(
        &mut self,
        directive: &str,
        label_decl: Option<String>,
        line: &str,
        cursor: &mut usize,
        line_number: usize,
    ) -> Result<(), Error> {
        let is_data_directive = directive == ".data" || directive == ".string";
        if label_decl.is_some() && !is_data_directive {
            return Err(Error::LabelAfterNonDataDirective { line_number });
        }
        match directive {
            ".data" => {
                if let Some(name) = &label_decl {
                    self.add_symbol(name, SymbolKind::Internal, true, line_number)?;
                }
                directives::parse_data(self, line, cursor, line_number)
            }
            ".string" => {
                if let Some(name) = &label_decl {
                    self.add_symbol(name, SymbolKind::Internal, true, line_number)?;
                }
                directives::parse_string(self, line, cursor, line_number)
            }
            ".extern" => directives::parse_extern(self, line, cursor, line_number),
            ".entry" => directives::parse_entry(self, line, cursor, line_number),
            other => Err(Error::InvalidToken {
                token: other.to_string(),
                reason: "unknown directive".to_string(),
                line_number,
                line: line.to_string(),
                span: crate::lexer::Span::new(0, 0),
            }),
        }
    }

    /// Every label referenced from the code image must resolve to
    /// either an `.extern` declaration or an internal definition.
    fn check_all_labels_defined(&self) -> Vec<Error> {
        let mut errors = Vec::new();
        for word in &self.code {
            if let Some(name) = word.label_ref() {
                if self.symbols.find(name, SymbolKind::External).is_none()
                    && self.symbols.find(name, SymbolKind::Internal).is_none()
                {
                    errors.push(Error::UnresolvedLabelReference { name: name.to_string() });
                }
            }
        }
        errors
    }

    fn finish(mut self) -> AssembledProgram {
        self.symbols.relocate_internal(BASE_ADDRESS as i32);

        let mut externals = Vec::new();
        for (i, word) in self.code.iter_mut().enumerate() {
            let name = match word.label_ref() {
                Some(n) => n.to_string(),
                None => continue,
            };
            if self.symbols.find(&name, SymbolKind::External).is_some() {
                *word = MachineWord::ImmediateOrDirect {
                    operand: 0,
                    are: crate::word::Are::External,
                    label_ref: None,
                };
                externals.push((name, i as u16 + BASE_ADDRESS));
            } else if let Some(symbol) = self.symbols.find(&name, SymbolKind::Internal) {
                *word = MachineWord::ImmediateOrDirect {
                    operand: symbol.address as i16,
                    are: crate::word::Are::Relocatable,
                    label_ref: None,
                };
            }
        }

        let entries = self
            .symbols
            .exported_in_order()
            .filter_map(|exported| self.symbols.find(&exported.name, SymbolKind::Internal))
            .map(|internal| (internal.name.clone(), internal.address))
            .collect();

        let warnings = self.symbols.diagnose_external_exported_collisions();

        AssembledProgram { code: self.code, data: self.data, externals, entries, warnings }
    }
}

/// Assembles already-preprocessed source text. Returns every error
/// found across the whole file rather than stopping at the first one,
/// matching the original compiler's "collect everything, then skip
/// the file" behavior.
pub fn assemble(source: &str) -> Result<AssembledProgram, Vec<Error>> {
    let mut asm = Assembler::new();
    for (i, raw_line) in source.lines().enumerate() {
        if let Err(e) = asm.process_line(raw_line, i + 1) {
            asm.errors.push(e);
        }
    }
    asm.errors.extend(asm.symbols.validate_cross_table());
    asm.errors.extend(asm.check_all_labels_defined());

    if !asm.errors.is_empty() {
        return Err(asm.errors);
    }
    Ok(asm.finish())
}
