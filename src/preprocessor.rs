//! Macro preprocessor. Expands `mcro name ... endmcro` blocks by
//! recording the byte range of each macro body in the original source
//! and replaying it wherever the macro name appears on its own line,
//! rather than buffering macro bodies into owned strings.

use std::collections::HashMap;

use crate::error::Error;
use crate::lexer::is_keyword;

const MACRO_START: &str = "mcro ";
const MACRO_END: &str = "endmcro";

fn validate_macro_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace) && !is_keyword(name)
}

struct Preprocessor<'a> {
    source: &'a str,
    macros: HashMap<String, (usize, usize)>,
}

impl<'a> Preprocessor<'a> {
    fn new(source: &'a str) -> Self {
        Preprocessor { source, macros: HashMap::new() }
    }

    fn expand_all(&mut self) -> Result<String, Error> {
        let mut out = String::new();
        self.expand_range(0, self.source.len(), &mut 0, &mut out)?;
        Ok(out)
    }

    /// Walks lines in `[start, end)`, appending non-macro lines to
    /// `out` and recursively replaying referenced macro bodies.
    /// `line_number` is shared across recursive calls so diagnostics
    /// report the position in the original file.
    fn expand_range(
        &mut self,
        start: usize,
        end: usize,
        line_number: &mut usize,
        out: &mut String,
    ) -> Result<(), Error> {
        enum State {
            Outside,
            InsideMacro { name: String, body_start: usize },
        }

        let mut state = State::Outside;
        let mut pos = start;
        while pos < end {
            let line_end = self.source[pos..end].find('\n').map(|i| pos + i).unwrap_or(end);
            let raw_line = &self.source[pos..line_end];
            let trimmed = raw_line.trim();
            *line_number += 1;
            let next_pos = if line_end < end { line_end + 1 } else { end };

            match &mut state {
                State::Outside => {
                    if trimmed.is_empty() || trimmed.starts_with(';') {
                        // blank and comment lines are dropped
                    } else if let Some(range) = self.macros.get(trimmed).copied() {
                        self.expand_range(range.0, range.1, line_number, out)?;
                    } else if let Some(rest) = trimmed.strip_prefix(MACRO_START) {
                        let name = rest.trim();
                        if !validate_macro_name(name) {
                            return Err(Error::InvalidMacroName { name: name.to_string(), line_number: *line_number });
                        }
                        if self.macros.contains_key(name) {
                            return Err(Error::MacroRedefinition { name: name.to_string(), line_number: *line_number });
                        }
                        state = State::InsideMacro { name: name.to_string(), body_start: next_pos };
                    } else {
                        out.push_str(raw_line);
                        out.push('\n');
                    }
                }
                State::InsideMacro { name, body_start } => {
                    if let Some(rest) = trimmed.strip_prefix(MACRO_END) {
                        if !rest.trim().is_empty() {
                            return Err(Error::EndmacroTrailingContent { line_number: *line_number });
                        }
                        self.macros.insert(name.clone(), (*body_start, pos));
                        state = State::Outside;
                    }
                }
            }
            pos = next_pos;
        }
        Ok(())
    }
}

pub fn expand(source: &str) -> Result<String, Error> {
    Preprocessor::new(source).expand_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_simple_macro() {
        let src = "mcro GREET\nmov @r1, @r2\nendmcro\nGREET\nstop\n";
        let out = expand(src).unwrap();
        assert_eq!(out, "mov @r1, @r2\nstop\n");
    }

    #[test]
    fn macro_can_be_used_more_than_once() {
        let src = "mcro M\nadd @r1, @r2\nendmcro\nM\nM\n";
        let out = expand(src).unwrap();
        assert_eq!(out, "add @r1, @r2\nadd @r1, @r2\n");
    }

    #[test]
    fn redefining_a_macro_is_an_error() {
        let src = "mcro M\nstop\nendmcro\nmcro M\nstop\nendmcro\n";
        assert!(matches!(expand(src), Err(Error::MacroRedefinition { .. })));
    }

    #[test]
    fn macro_name_colliding_with_keyword_is_invalid() {
        let src = "mcro mov\nstop\nendmcro\n";
        assert!(matches!(expand(src), Err(Error::InvalidMacroName { .. })));
    }

    #[test]
    fn macro_name_with_embedded_whitespace_is_invalid() {
        let src = "mcro FOO BAR\nstop\nendmcro\n";
        assert!(matches!(expand(src), Err(Error::InvalidMacroName { .. })));
    }

    #[test]
    fn trailing_text_after_endmcro_is_an_error() {
        let src = "mcro M\nstop\nendmcro extra\n";
        assert!(matches!(expand(src), Err(Error::EndmacroTrailingContent { .. })));
    }

    #[test]
    fn lines_outside_any_macro_pass_through_untouched() {
        let src = "mov @r1, @r2\nstop\n";
        assert_eq!(expand(src).unwrap(), src);
    }

    #[test]
    fn expanding_an_already_expanded_file_is_idempotent() {
        let src = "mov @r1, @r2\nstop\n";
        let once = expand(src).unwrap();
        let twice = expand(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn comments_and_blank_lines_are_dropped() {
        let src = "; a comment\n\nmov @r1, @r2\n";
        assert_eq!(expand(src).unwrap(), "mov @r1, @r2\n");
    }
}
