// Integration tests over the demo programs on disk

use ccheck::analyze_source;
use ccheck::analyzer::diagnostics::DiagnosticKind;
use std::fs;
use std::path::Path;

fn analyze_demo(name: &str) -> ccheck::Analysis {
    let path = Path::new("demos").join(name);
    let source = fs::read_to_string(&path).expect("Failed to read demo file");
    analyze_source(&source).expect("Frontend failed on demo file")
}

#[test]
fn test_valid_program_is_clean() {
    let analysis = analyze_demo("valid_program.c");

    assert!(!analysis.program.nodes.is_empty());
    assert!(
        analysis.is_clean(),
        "unexpected diagnostics: {:?}",
        analysis.diagnostics
    );
}

#[test]
fn test_control_flow_program_is_clean() {
    let analysis = analyze_demo("control_flow.c");

    // find_max, sum_array, factorial_loop, main
    assert_eq!(analysis.program.nodes.len(), 4);
    assert!(
        analysis.is_clean(),
        "unexpected diagnostics: {:?}",
        analysis.diagnostics
    );
}

#[test]
fn test_error_program_reports_all_five_classes() {
    let analysis = analyze_demo("error_program.c");

    let kinds: Vec<_> = analysis.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::UndeclaredVariable, // x = 10;
            DiagnosticKind::TypeMismatch,       // int y = "hello";
            DiagnosticKind::TypeMismatch,       // int z = 3.14;
            DiagnosticKind::Redeclaration,      // float a = 2.5;
            DiagnosticKind::UndeclaredVariable, // x in x + y
        ]
    );

    // Diagnostics come out in source order
    let lines: Vec<_> =
        analysis.diagnostics.iter().map(|d| d.location.line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
}

#[test]
fn test_error_program_first_declaration_never_flagged() {
    let analysis = analyze_demo("error_program.c");

    let redecl = analysis
        .diagnostics
        .iter()
        .find(|d| d.kind == DiagnosticKind::Redeclaration)
        .expect("expected a redeclaration diagnostic");

    // Flagged at `float a = 2.5;`, not at `int a = 5;`
    assert!(redecl.message.contains("'a'"));
    let source = fs::read_to_string("demos/error_program.c").unwrap();
    let flagged_line =
        source.lines().nth(redecl.location.line - 1).unwrap();
    assert!(flagged_line.contains("float a"));
}
