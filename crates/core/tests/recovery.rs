//! Panic-mode recovery through the public entry point.

use pluto_core::ast::Statement;
use pluto_core::{parse_source_recovering, DiagnosticKind, DEFAULT_MAX_ERRORS};

#[test]
fn bad_statements_are_dropped_and_parsing_continues() {
    let src = "procedure P\nmain\n  x = )\n  y = 2\n  while = 3\n  z = 4\nend main\nend procedure\n";
    let (file, diagnostics) = parse_source_recovering(src, DEFAULT_MAX_ERRORS).unwrap();

    let lines: Vec<u32> = diagnostics.iter().map(|d| d.span.line).collect();
    assert_eq!(lines, vec![3, 5]);
    assert!(diagnostics.iter().all(|d| d.kind == DiagnosticKind::Syntax));

    let main = &file.procedures().next().unwrap().main;
    let targets: Vec<&str> = main
        .statements
        .iter()
        .map(|s| match s {
            Statement::Assignment { target, .. } => target.as_str(),
            other => panic!("{:?}", other),
        })
        .collect();
    assert_eq!(targets, vec!["y", "z"]);
}

#[test]
fn broken_item_is_skipped() {
    let src = "type = 3\nprocedure Q main x = 1 end main end procedure\n";
    let (file, diagnostics) = parse_source_recovering(src, DEFAULT_MAX_ERRORS).unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].span.line, 1);
    assert_eq!(file.items.len(), 1);
    assert_eq!(file.procedures().next().unwrap().name, "Q");
}

#[test]
fn error_count_is_capped() {
    let src = "procedure P main\n x = )\n y = )\n z = )\nend main end procedure";
    let (_, diagnostics) = parse_source_recovering(src, 2).unwrap();
    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn unterminated_block_is_reported_last() {
    let src = "procedure P\nmain\n  x = )\n";
    let (file, diagnostics) = parse_source_recovering(src, DEFAULT_MAX_ERRORS).unwrap();
    assert!(file.items.is_empty());
    let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::Syntax, DiagnosticKind::UnterminatedBlock]
    );
}

#[test]
fn lexical_errors_abort() {
    let err = parse_source_recovering("procedure @", DEFAULT_MAX_ERRORS).unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::Lexical);
}

#[test]
fn clean_input_has_no_diagnostics() {
    let src = "procedure P main if a then b = 1 end if end main end procedure";
    let (file, diagnostics) = parse_source_recovering(src, DEFAULT_MAX_ERRORS).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(file.items.len(), 1);
}
