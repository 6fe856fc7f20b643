//! A single hand-rolled error type covering every failure this crate
//! can report, in the teacher's style: one `Display` impl that prints
//! a colored severity tag, the line number, and — where a span is
//! available — the source line with a caret underline beneath it.

use std::fmt;

use colored::Colorize;

use crate::lexer::Span;

#[derive(Debug)]
pub enum Error {
    LineTooLong { line_number: usize },
    InvalidToken { token: String, reason: String, line_number: usize, line: String, span: Span },
    InvalidArgument { reason: String, line_number: usize, line: String, span: Span },
    InvalidArgumentCount { instruction: String, expected: usize, line_number: usize, line: String },
    InvalidCommaGrammar { line_number: usize, line: String },
    InvalidAddressingMode { instruction: String, line_number: usize, line: String, span: Span },
    ImmediateOutOfRange { value: i32, line_number: usize, line: String, span: Span },
    LabelAfterNonDataDirective { line_number: usize },
    DuplicateLabel { name: String, line_number: usize },
    CapacityExceeded { line_number: usize },
    InvalidMacroName { name: String, line_number: usize },
    MacroRedefinition { name: String, line_number: usize },
    EndmacroTrailingContent { line_number: usize },
    UnknownMacroReference { name: String, line_number: usize },
    ExternalInternalCollision { name: String },
    ExportedNotInternal { name: String },
    UnresolvedLabelReference { name: String },
    ReadError { path: String, detail: String },
    WriteError { path: String, detail: String },
}

impl Error {
    fn underline(line: &str, span: &Span) -> String {
        let mut out = String::with_capacity(line.len());
        for (i, _) in line.char_indices() {
            if i >= span.start && i < span.end {
                out.push('^');
            } else {
                out.push(' ');
            }
        }
        if span.end > span.start {
            out
        } else {
            format!("{out}^")
        }
    }

    fn with_snippet(message: String, line_number: usize, line: &str, span: &Span) -> String {
        format!(
            "{}\n{line_number}\t{line}\n\t{}",
            message,
            Error::underline(line, span).green()
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = "error:".red().bold();
        match self {
            Error::LineTooLong { line_number } => {
                write!(f, "{tag} line {line_number} exceeds 80 characters")
            }
            Error::InvalidToken { token, reason, line_number, line, span } => {
                write!(f, "{tag} {}", Error::with_snippet(format!("invalid token '{token}': {reason}"), *line_number, line, span))
            }
            Error::InvalidArgument { reason, line_number, line, span } => {
                write!(f, "{tag} {}", Error::with_snippet(reason.clone(), *line_number, line, span))
            }
            Error::InvalidArgumentCount { instruction, expected, line_number, line } => {
                write!(f, "{tag} line {line_number}: '{instruction}' expects {expected} operand(s)\n{line_number}\t{line}")
            }
            Error::InvalidCommaGrammar { line_number, line } => {
                write!(f, "{tag} line {line_number}: malformed comma list\n{line_number}\t{line}")
            }
            Error::InvalidAddressingMode { instruction, line_number, line, span } => {
                write!(f, "{tag} {}", Error::with_snippet(format!("invalid addressing mode for '{instruction}'"), *line_number, line, span))
            }
            Error::ImmediateOutOfRange { value, line_number, line, span } => {
                write!(f, "{tag} {}", Error::with_snippet(format!("immediate value {value} is outside [-1024, 1023]"), *line_number, line, span))
            }
            Error::LabelAfterNonDataDirective { line_number } => {
                write!(f, "{tag} line {line_number}: a label declaration is only allowed before .data or .string")
            }
            Error::DuplicateLabel { name, line_number } => {
                write!(f, "{tag} line {line_number}: label '{name}' is already defined")
            }
            Error::CapacityExceeded { line_number } => {
                write!(f, "{tag} line {line_number}: memory capacity exceeded")
            }
            Error::InvalidMacroName { name, line_number } => {
                write!(f, "{tag} line {line_number}: '{name}' is not a valid macro name")
            }
            Error::MacroRedefinition { name, line_number } => {
                write!(f, "{tag} line {line_number}: macro '{name}' is already defined")
            }
            Error::EndmacroTrailingContent { line_number } => {
                write!(f, "{tag} line {line_number}: unexpected text after 'endmcro'")
            }
            Error::UnknownMacroReference { name, line_number } => {
                write!(f, "{tag} line {line_number}: '{name}' is not a known instruction, directive, or macro")
            }
            Error::ExternalInternalCollision { name } => {
                write!(f, "{tag} '{name}' is declared both .extern and as an internal label")
            }
            Error::ExportedNotInternal { name } => {
                write!(f, "{tag} '{name}' is declared .entry but never defined in this file")
            }
            Error::UnresolvedLabelReference { name } => {
                write!(f, "{tag} '{name}' is referenced but never declared .extern or defined")
            }
            Error::ReadError { path, detail } => {
                write!(f, "{tag} could not read '{path}': {detail}")
            }
            Error::WriteError { path, detail } => {
                write!(f, "{tag} could not write '{path}': {detail}")
            }
        }
    }
}

impl std::error::Error for Error {}
