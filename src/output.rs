//! Emission of the `.obj`, `.ext`, and `.ent` artifacts from a
//! resolved `AssembledProgram`.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::assembler::AssembledProgram;
use crate::error::Error;

fn write_error(path: &Path, e: std::io::Error) -> Error {
    Error::WriteError { path: path.display().to_string(), detail: e.to_string() }
}

pub fn write_obj(program: &AssembledProgram, path: &Path) -> Result<(), Error> {
    let file = fs::File::create(path).map_err(|e| write_error(path, e))?;
    let mut w = std::io::BufWriter::new(file);
    writeln!(w, "{} {}", program.code.len(), program.data.len()).map_err(|e| write_error(path, e))?;
    for word in program.code.iter().chain(program.data.iter()) {
        let [a, b] = word.to_base64();
        writeln!(w, "{a}{b}").map_err(|e| write_error(path, e))?;
    }
    Ok(())
}

/// Only written when at least one `.extern` label is actually
/// referenced from code, matching the original's lazy file creation.
pub fn write_ext(program: &AssembledProgram, path: &Path) -> Result<bool, Error> {
    if program.externals.is_empty() {
        return Ok(false);
    }
    let file = fs::File::create(path).map_err(|e| write_error(path, e))?;
    let mut w = std::io::BufWriter::new(file);
    for (name, address) in &program.externals {
        writeln!(w, "{name}\t{address}").map_err(|e| write_error(path, e))?;
    }
    Ok(true)
}

/// Only written when at least one label was declared `.entry`.
pub fn write_ent(program: &AssembledProgram, path: &Path) -> Result<bool, Error> {
    if program.entries.is_empty() {
        return Ok(false);
    }
    let file = fs::File::create(path).map_err(|e| write_error(path, e))?;
    let mut w = std::io::BufWriter::new(file);
    for (name, address) in &program.entries {
        writeln!(w, "{name}\t{address}").map_err(|e| write_error(path, e))?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;

    #[test]
    fn obj_header_reports_code_and_data_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let program = assemble("mov @r1, @r2\nX: .data 1, 2\n").unwrap();
        let path = dir.path().join("out.obj");
        write_obj(&program, &path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header, format!("{} {}", program.code.len(), program.data.len()));
    }

    #[test]
    fn ext_file_is_skipped_when_no_externals() {
        let dir = tempfile::tempdir().unwrap();
        let program = assemble("stop\n").unwrap();
        let path = dir.path().join("out.ext");
        assert!(!write_ext(&program, &path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn ext_file_uses_a_single_tab_between_name_and_address() {
        let dir = tempfile::tempdir().unwrap();
        let program = assemble(".extern X\nmov X, @r1\nstop\n").unwrap();
        let path = dir.path().join("out.ext");
        assert!(write_ext(&program, &path).unwrap());
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().next().unwrap(), format!("X\t{}", program.externals[0].1));
    }

    #[test]
    fn ent_file_lists_relocated_addresses() {
        let dir = tempfile::tempdir().unwrap();
        let program = assemble("X: .data 1\n.entry X\n").unwrap();
        let path = dir.path().join("out.ent");
        assert!(write_ent(&program, &path).unwrap());
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("X\t100"));
    }
}
