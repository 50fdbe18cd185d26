//! Ariadne-based rendering for resolution errors.
//!
//! A resolution error is reported against the call site that asked for the
//! instance. Output is either a labeled ariadne report or, in JSON mode, a
//! single-line JSON object for tooling.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use serde::Serialize;

use crate::error::ResolveError;

// ── Error Codes ────────────────────────────────────────────────────────

/// A unique error code per error variant.
pub fn error_code(err: &ResolveError) -> &'static str {
    match err {
        ResolveError::NoInstanceFound { .. } => "R0001",
        ResolveError::AmbiguousInstance { .. } => "R0002",
        ResolveError::DuplicateDefinition { .. } => "R0003",
        ResolveError::RecursiveDerivation { .. } => "R0004",
        ResolveError::ConflictingTypeDef { .. } => "R0005",
    }
}

// ── Options ────────────────────────────────────────────────────────────

/// How diagnostics are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagnosticOptions {
    /// Emit ANSI colors in ariadne output.
    pub color: bool,
    /// Emit one JSON object instead of an ariadne report.
    pub json: bool,
}

impl DiagnosticOptions {
    /// Plain text, no colors. Used for snapshots.
    pub fn colorless() -> Self {
        DiagnosticOptions { color: false, json: false }
    }

    pub fn json_mode() -> Self {
        DiagnosticOptions { color: false, json: true }
    }
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        DiagnosticOptions { color: true, json: false }
    }
}

// ── Labels and Help ────────────────────────────────────────────────────

fn label_message(err: &ResolveError) -> String {
    match err {
        ResolveError::NoInstanceFound { ty, missing } if ty == missing => {
            format!("no instance for `{}` in scope", ty)
        }
        ResolveError::NoInstanceFound { missing, .. } => {
            format!("requires an instance for `{}`", missing)
        }
        ResolveError::AmbiguousInstance { candidates, .. } => {
            format!("{} candidates apply here", candidates.len())
        }
        ResolveError::DuplicateDefinition { scope, .. } => {
            format!("already defined in {}", scope)
        }
        ResolveError::RecursiveDerivation { ty, .. } => {
            format!("deriving `{}` needs `{}` itself", ty, ty)
        }
        ResolveError::ConflictingTypeDef { name } => format!("`{}` declared here", name),
    }
}

fn help(err: &ResolveError) -> Option<String> {
    match err {
        ResolveError::NoInstanceFound { missing, .. } => {
            Some(format!("register an implementation for `{}`", missing))
        }
        ResolveError::AmbiguousInstance { .. } => Some(
            "define a local instance or remove one of the imports".to_string(),
        ),
        ResolveError::RecursiveDerivation { ty, .. } => Some(format!(
            "recursive types need a direct instance; register one for `{}`",
            ty
        )),
        ResolveError::DuplicateDefinition { .. } | ResolveError::ConflictingTypeDef { .. } => None,
    }
}

fn note(err: &ResolveError) -> Option<String> {
    match err {
        ResolveError::AmbiguousInstance { candidates, .. } => {
            let lines: Vec<String> = candidates.iter().map(|c| format!("candidate {}", c)).collect();
            Some(lines.join("\n"))
        }
        ResolveError::RecursiveDerivation { cycle, .. } => {
            let path: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            Some(format!("derivation path: {}", path.join(" -> ")))
        }
        _ => None,
    }
}

// ── JSON Output ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    code: &'static str,
    severity: &'static str,
    message: String,
    file: &'a str,
    spans: Vec<JsonSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    error: &'a ResolveError,
}

#[derive(Serialize)]
struct JsonSpan {
    start: usize,
    end: usize,
    label: String,
}

// ── Main Rendering Function ────────────────────────────────────────────

/// Render a resolution error.
///
/// `span` is the byte range of the resolving call site in `source`; without
/// one the report points at the start of the source.
pub fn render_diagnostic(
    error: &ResolveError,
    source: &str,
    filename: &str,
    options: &DiagnosticOptions,
    span: Option<Range<usize>>,
) -> String {
    let source_len = source.len();

    // Clamp a range to be valid within source bounds.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        // Ariadne needs at least a 1-char span.
        if s < e {
            s..e
        } else if s < source_len {
            s..s + 1
        } else {
            source_len.saturating_sub(1)..source_len
        }
    };
    let span = clamp(span.unwrap_or(0..0));
    let code = error_code(error);

    if options.json {
        let diagnostic = JsonDiagnostic {
            code,
            severity: "error",
            message: error.to_string(),
            file: filename,
            spans: vec![JsonSpan {
                start: span.start,
                end: span.end,
                label: label_message(error),
            }],
            help: help(error),
            error,
        };
        return serde_json::to_string(&diagnostic)
            .unwrap_or_else(|e| format!(r#"{{"code":"{}","error":"{}"}}"#, code, e));
    }

    // Ariadne has nothing to label in an empty source; give it one blank.
    let (source, span) = if source.is_empty() { (" ", 0..1) } else { (source, span) };

    let config = Config::default().with_color(options.color);
    let mut builder = Report::build(ReportKind::Error, (filename, span.clone()))
        .with_code(code)
        .with_message(error.to_string())
        .with_config(config)
        .with_label(
            Label::new((filename, span))
                .with_message(label_message(error))
                .with_color(Color::Red),
        );

    if let Some(note) = note(error) {
        builder.set_note(note);
    }
    if let Some(help) = help(error) {
        builder.set_help(help);
    }

    let mut buf = Vec::new();
    if let Err(e) = builder.finish().write((filename, Source::from(source)), &mut buf) {
        return format!("error[{}]: {} ({})", code, error, e);
    }
    String::from_utf8_lossy(&buf).into_owned()
}
