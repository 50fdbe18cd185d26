//! Rendering resolution errors as ariadne reports and JSON.

mod common;

use common::*;
use serde_json::Value;
use tyclass::diagnostics::{render_diagnostic, DiagnosticOptions};
use tyclass::{Implementation, Origin, ResolveError, Resolver, Ty, Typed};

// ── Helpers ────────────────────────────────────────────────────────────

const SRC: &str = "let out = encode(&resolver, &account);";

/// Span of the `encode(...)` call in `SRC`.
fn call_span() -> std::ops::Range<usize> {
    let start = SRC.find("encode").unwrap();
    start..SRC.len() - 1
}

fn render(err: &ResolveError) -> String {
    render_diagnostic(err, SRC, "main.rs", &DiagnosticOptions::colorless(), Some(call_span()))
}

fn missing_component_error() -> ResolveError {
    // No int encoder, so `Account::balance` is unbound.
    let mut table = tyclass::InstanceTable::<Json>::new();
    table.register(string_encoder(), Origin::builtin("core")).unwrap();
    table.declare_type::<Person>().unwrap();
    table.declare_type::<Account>().unwrap();
    Resolver::new(&table).resolve_type::<Account>().unwrap_err()
}

// ── Reports ────────────────────────────────────────────────────────────

#[test]
fn missing_instance_report() {
    let output = render(&missing_component_error());
    assert!(output.contains("[R0001]"), "{}", output);
    assert!(
        output.contains("no instance found for `Account` (component `Int` has no instance)"),
        "{}",
        output
    );
    assert!(output.contains("requires an instance for `Int`"), "{}", output);
    assert!(output.contains("register an implementation for `Int`"), "{}", output);
    assert!(output.contains("main.rs"), "{}", output);
}

#[test]
fn ambiguous_report_lists_candidates() {
    let mut table = core_table();
    table
        .register(Implementation::new("a", |s: &String| Value::String(s.clone())), Origin::imported("x"))
        .unwrap();
    table
        .register(Implementation::new("b", |s: &String| Value::String(s.clone())), Origin::imported("y"))
        .unwrap();
    let err = Resolver::new(&table).resolve(&Ty::string()).unwrap_err();

    let output = render(&err);
    assert!(output.contains("[R0002]"), "{}", output);
    assert!(output.contains("2 candidates apply here"), "{}", output);
    assert!(output.contains("candidate `a` from x (imported)"), "{}", output);
    assert!(output.contains("candidate `b` from y (imported)"), "{}", output);
}

#[test]
fn recursive_report_shows_path() {
    let tree = Ty::named("Tree");
    let err = ResolveError::RecursiveDerivation {
        ty: tree.clone(),
        cycle: vec![tree.clone(), Ty::list(tree.clone()), tree],
    };
    let output = render(&err);
    assert!(output.contains("[R0004]"), "{}", output);
    assert!(output.contains("derivation path: Tree -> List<Tree> -> Tree"), "{}", output);
}

#[test]
fn missing_span_points_at_start() {
    let err = ResolveError::NoInstanceFound { ty: Ty::float(), missing: Ty::float() };
    let output = render_diagnostic(&err, SRC, "main.rs", &DiagnosticOptions::colorless(), None);
    assert!(output.contains("no instance for `Float` in scope"), "{}", output);
}

#[test]
fn empty_source_report() {
    let output = render_diagnostic(
        &missing_component_error(),
        "",
        "generated.rs",
        &DiagnosticOptions::colorless(),
        Some(call_span()),
    );
    assert!(output.contains("[R0001]"), "{}", output);
    assert!(output.contains("requires an instance for `Int`"), "{}", output);
    assert!(output.contains("generated.rs"), "{}", output);
}

// ── JSON ───────────────────────────────────────────────────────────────

#[test]
fn json_output_mode() {
    let err = missing_component_error();
    let output = render_diagnostic(&err, SRC, "main.rs", &DiagnosticOptions::json_mode(), Some(call_span()));
    assert!(!output.contains('\n'), "JSON output should be one line: {}", output);

    let parsed: serde_json::Value = serde_json::from_str(&output)
        .unwrap_or_else(|e| panic!("invalid JSON output: {}\n{}", e, output));
    assert_eq!(parsed["code"], "R0001");
    assert_eq!(parsed["severity"], "error");
    assert_eq!(parsed["file"], "main.rs");
    assert_eq!(parsed["error"]["kind"], "NoInstanceFound");
    assert_eq!(parsed["spans"][0]["start"], call_span().start);
    assert!(parsed["help"].as_str().unwrap().contains("Int"));
}

#[test]
fn json_omits_help_when_absent() {
    let err = ResolveError::ConflictingTypeDef { name: Account::type_of().to_string() };
    let output = render_diagnostic(&err, SRC, "main.rs", &DiagnosticOptions::json_mode(), None);
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["code"], "R0005");
    assert!(parsed.get("help").is_none());
}
