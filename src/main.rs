use std::env;
use std::fs;
use std::path::Path;
use std::process;

use asm12::{assembler, diagnostics, output, preprocessor};

fn process_file(stem: &str) {
    let as_path = format!("{stem}.as");
    let source = match fs::read_to_string(&as_path) {
        Ok(s) => s,
        Err(e) => {
            diagnostics::warning(format!("could not open '{as_path}': {e}"), 0);
            return;
        }
    };

    let expanded = match preprocessor::expand(&source) {
        Ok(expanded) => expanded,
        Err(e) => {
            diagnostics::error(e);
            return;
        }
    };

    let am_path = format!("{stem}.am");
    if let Err(e) = fs::write(&am_path, &expanded) {
        diagnostics::warning(format!("could not write '{am_path}': {e}"), 0);
        return;
    }

    let program = match assembler::assemble(&expanded) {
        Ok(program) => program,
        Err(errors) => {
            for e in errors {
                diagnostics::error(e);
            }
            diagnostics::warning(format!("skipping '{stem}'"), 0);
            return;
        }
    };

    for w in &program.warnings {
        diagnostics::warning(w, 0);
    }

    if let Err(e) = output::write_obj(&program, Path::new(&format!("{stem}.obj"))) {
        diagnostics::error(e);
    }
    if let Err(e) = output::write_ext(&program, Path::new(&format!("{stem}.ext"))) {
        diagnostics::error(e);
    }
    if let Err(e) = output::write_ent(&program, Path::new(&format!("{stem}.ent"))) {
        diagnostics::error(e);
    }
}

fn main() {
    let stems: Vec<String> = env::args().skip(1).collect();
    if stems.is_empty() {
        eprintln!("usage: asm12 <file-stem> [file-stem...]");
        process::exit(1);
    }

    for stem in &stems {
        process_file(stem);
    }
}
