use std::fs;

use asm12::{assembler, output, preprocessor};

fn run(source: &str) -> Result<assembler::AssembledProgram, Vec<asm12::Error>> {
    let expanded = preprocessor::expand(source).map_err(|e| vec![e])?;
    assembler::assemble(&expanded)
}

#[test]
fn end_to_end_program_with_macro_and_entry() {
    let source = "\
mcro SETUP
mov 1, @r1
endmcro
MAIN: SETUP
add @r1, @r1
X: .data 5
.entry X
stop
";
    let program = run(source).expect_err("'MAIN: SETUP' is not a valid macro invocation");
    assert!(!program.is_empty());

    let source = "\
mcro SETUP
mov 1, @r1
endmcro
SETUP
add @r1, @r1
X: .data 5
.entry X
stop
";
    let program = run(source).expect("program should assemble");
    assert!(!program.code.is_empty());
    assert_eq!(program.entries, vec![("X".to_string(), 105)]);
}

#[test]
fn end_to_end_program_with_extern_reference() {
    let source = "\
.extern SHARED
mov SHARED, @r2
stop
";
    let program = run(source).unwrap();
    assert_eq!(program.externals.len(), 1);
    assert_eq!(program.externals[0].0, "SHARED");
}

#[test]
fn writes_obj_ext_ent_files_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let source = "\
.extern SHARED
MAIN: mov SHARED, @r2
.entry MAIN
stop
";
    let program = run(source).unwrap();

    let obj = dir.path().join("prog.obj");
    let ext = dir.path().join("prog.ext");
    let ent = dir.path().join("prog.ent");

    output::write_obj(&program, &obj).unwrap();
    output::write_ext(&program, &ext).unwrap();
    output::write_ent(&program, &ent).unwrap();

    assert!(obj.exists());
    assert!(ext.exists());
    assert!(ent.exists());

    let ext_contents = fs::read_to_string(&ext).unwrap();
    assert!(ext_contents.contains("SHARED"));
    let ent_contents = fs::read_to_string(&ent).unwrap();
    assert!(ent_contents.contains("MAIN"));
}

#[test]
fn file_is_skipped_when_a_label_is_declared_twice() {
    let source = "\
X: .data 1
X: .data 2
";
    let errors = run(source).unwrap_err();
    assert!(!errors.is_empty());
}

#[test]
fn file_is_skipped_when_entry_label_never_defined() {
    let source = ".entry MISSING\nstop\n";
    let errors = run(source).unwrap_err();
    assert!(!errors.is_empty());
}

#[test]
fn capacity_cap_is_924_words_not_1024() {
    let mut source = String::new();
    for i in 0..923 {
        source.push_str(&format!(".data {}\n", i % 100));
    }
    assert!(run(&source).is_ok());

    source.push_str(".data 1\n.data 1\n");
    let errors = run(&source).unwrap_err();
    assert!(errors.iter().any(|e| matches!(e, asm12::Error::CapacityExceeded { .. })));
}

#[test]
fn macro_body_can_contain_multiple_instructions_and_is_replayed_verbatim() {
    let source = "\
mcro TWICE
add @r1, @r1
add @r1, @r1
endmcro
TWICE
stop
";
    let program = run(source).unwrap();
    // two 'add' (2 words each) plus one 'stop' (1 word) = 5 words
    assert_eq!(program.code.len(), 5);
}
