//! Parser conformance suite.
//!
//! - `conformance/positive/<name>.pluto` must parse strictly, survive a
//!   print/re-parse round trip, and parse in recovering mode with no
//!   diagnostics.
//! - `conformance/negative/<name>.pluto` must fail; the sibling
//!   `<name>.expected-error.json` names the diagnostic kind and line.

use std::path::{Path, PathBuf};

use pluto_core::{parse_source, parse_source_recovering, printer, DiagnosticKind};

fn conformance_dir(sub: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../conformance")
        .join(sub)
}

fn fixtures(sub: &str) -> Vec<PathBuf> {
    let mut paths: Vec<_> = std::fs::read_dir(conformance_dir(sub))
        .unwrap_or_else(|e| panic!("cannot list conformance/{}: {}", sub, e))
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "pluto"))
        .collect();
    paths.sort();
    paths
}

fn kind_from_name(name: &str) -> DiagnosticKind {
    match name {
        "Lexical" => DiagnosticKind::Lexical,
        "Syntax" => DiagnosticKind::Syntax,
        "UnterminatedBlock" => DiagnosticKind::UnterminatedBlock,
        other => panic!("unknown diagnostic kind '{}'", other),
    }
}

#[test]
fn positive_fixtures_parse_and_round_trip() {
    let paths = fixtures("positive");
    assert!(paths.len() >= 4, "positive fixtures missing");
    for path in paths {
        let src = std::fs::read_to_string(&path).unwrap();
        let ast = parse_source(&src)
            .unwrap_or_else(|e| panic!("{} failed to parse: {}", path.display(), e));

        let printed = printer::print_source_file(&ast);
        let reparsed = parse_source(&printed).unwrap_or_else(|e| {
            panic!(
                "{}: printed form does not parse: {}\n\n{}",
                path.display(),
                e,
                printed
            )
        });
        // Statement lines move when reprinting, so compare printed forms.
        assert_eq!(
            printer::print_source_file(&reparsed),
            printed,
            "{}: printing is not stable",
            path.display()
        );
        assert_eq!(reparsed.items.len(), ast.items.len());

        let (recovered, diagnostics) = parse_source_recovering(&src, 10).unwrap();
        assert!(diagnostics.is_empty(), "{}: {:?}", path.display(), diagnostics);
        assert_eq!(recovered, ast);
    }
}

#[test]
fn negative_fixtures_fail_with_expected_diagnostic() {
    let paths = fixtures("negative");
    assert!(paths.len() >= 8, "negative fixtures missing");
    for path in paths {
        let src = std::fs::read_to_string(&path).unwrap();
        let expected_path = path.with_extension("expected-error.json");
        let expected: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(&expected_path)
                .unwrap_or_else(|e| panic!("{}: {}", expected_path.display(), e)),
        )
        .unwrap();

        let err = match parse_source(&src) {
            Ok(_) => panic!("{} parsed but should fail", path.display()),
            Err(e) => e,
        };
        assert_eq!(
            err.kind,
            kind_from_name(expected["kind"].as_str().unwrap()),
            "{}: {}",
            path.display(),
            err
        );
        assert_eq!(
            u64::from(err.span.line),
            expected["line"].as_u64().unwrap(),
            "{}: {}",
            path.display(),
            err
        );
    }
}
