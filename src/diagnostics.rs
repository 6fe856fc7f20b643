//! Small terminal-output helpers, grounded in the same `colored`-based
//! severity tags the teacher uses for warnings and errors.

use colored::Colorize;
use std::fmt;

pub fn error(message: impl fmt::Display) {
    println!("{}", message);
}

pub fn warning(message: impl fmt::Display, line_number: usize) {
    println!("{} - line {line_number}: {message}", "warning:".yellow().bold());
}

pub fn info(message: impl fmt::Display) {
    println!("{message}");
}
