//! Diagnostics sink
//!
//! Every stage reports into one `Diagnostics` value. The driver reads the
//! running error count between stages; warnings never gate anything.
//! Reports can be rendered for a terminal or serialized as JSON.

use log::debug;
use serde::Serialize;

use crate::utils::{Error, SourceMap, Span, Warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// One recorded report
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Error(Error),
    Warning(Warning),
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Error(_) => Severity::Error,
            Self::Warning(_) => Severity::Warning,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Error(e) => e.span(),
            Self::Warning(w) => Some(w.span()),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Error(e) => e.code(),
            Self::Warning(w) => w.code(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Error(e) => e.to_string(),
            Self::Warning(w) => w.to_string(),
        }
    }

    pub fn note(&self) -> Option<(Span, &'static str)> {
        match self {
            Self::Error(e) => e.note(),
            Self::Warning(_) => None,
        }
    }
}

/// Collected diagnostics with running counts
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: Error) {
        debug!("error reported: {error}");
        self.errors += 1;
        self.items.push(Diagnostic::Error(error));
    }

    pub fn report_warning(&mut self, warning: Warning) {
        debug!("warning reported: {warning}");
        self.warnings += 1;
        self.items.push(Diagnostic::Warning(warning));
    }

    pub fn extend_errors(&mut self, errors: impl IntoIterator<Item = Error>) {
        for error in errors {
            self.report(error);
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.items.iter().filter_map(|d| match d {
            Diagnostic::Error(e) => Some(e),
            Diagnostic::Warning(_) => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter().filter_map(|d| match d {
            Diagnostic::Warning(w) => Some(w),
            Diagnostic::Error(_) => None,
        })
    }

    /// Human readable rendering with source excerpts
    pub fn render(&self, file: &str, source: &str) -> String {
        let map = SourceMap::new(source);
        let mut out = String::new();
        for diagnostic in &self.items {
            let label = match diagnostic.severity() {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            out.push_str(&format!(
                "{label}[{}]: {}\n",
                diagnostic.code(),
                diagnostic.message()
            ));
            if let Some(span) = diagnostic.span() {
                render_location(&mut out, &map, file, span);
            }
            if let Some((span, note)) = diagnostic.note() {
                out.push_str(&format!("note: {note}\n"));
                render_location(&mut out, &map, file, span);
            }
        }
        out
    }

    /// Summary line printed at the end of a compilation, if anything was reported
    pub fn summary(&self) -> Option<String> {
        match (self.warnings, self.errors) {
            (0, 0) => None,
            (0, e) => Some(format!("Generated {e} errors.")),
            (w, 0) => Some(format!("Generated {w} warnings.")),
            (w, e) => Some(format!("Generated {w} warnings and {e} errors.")),
        }
    }

    /// Machine readable report
    pub fn to_feedback(&self, file: &str, source: &str) -> CompilationFeedback {
        let map = SourceMap::new(source);
        let location = |span: Span| {
            let (line, column) = map.line_col(span.start);
            Location {
                file: file.to_string(),
                line,
                column,
            }
        };

        CompilationFeedback {
            success: !self.has_errors(),
            source_file: file.to_string(),
            diagnostics: self
                .items
                .iter()
                .map(|d| DiagnosticReport {
                    code: d.code().to_string(),
                    severity: d.severity(),
                    message: d.message(),
                    location: d.span().map(location),
                    related: d
                        .note()
                        .map(|(span, message)| RelatedInfo {
                            message: message.to_string(),
                            location: location(span),
                        })
                        .into_iter()
                        .collect(),
                })
                .collect(),
            stats: CompilationStats {
                error_count: self.errors,
                warning_count: self.warnings,
                loc: source.lines().count(),
            },
        }
    }
}

fn render_location(out: &mut String, map: &SourceMap<'_>, file: &str, span: Span) {
    let (line, column) = map.line_col(span.start);
    let text = map.line_text(line);
    let width = line.to_string().len();
    let carets = "^".repeat(span.len().max(1).min(text.len().saturating_sub(column - 1).max(1)));
    out.push_str(&format!("{:width$}--> {file}:{line}:{column}\n", ""));
    out.push_str(&format!("{line} | {text}\n"));
    out.push_str(&format!("{:width$} | {:pad$}{carets}\n", "", "", pad = column - 1));
}

// ==================== Structured Report ====================

#[derive(Debug, Clone, Serialize)]
pub struct CompilationFeedback {
    pub success: bool,
    pub source_file: String,
    pub diagnostics: Vec<DiagnosticReport>,
    pub stats: CompilationStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    /// Diagnostic code (e.g., "E0101")
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
    pub related: Vec<RelatedInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedInfo {
    pub message: String,
    pub location: Location,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompilationStats {
    pub error_count: usize,
    pub warning_count: usize,
    /// Lines of source
    pub loc: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "var x: integer;\nvar x: long;\nbegin end.";

    fn sample() -> Diagnostics {
        let mut diags = Diagnostics::new();
        diags.report(Error::NameRedefinition {
            name: "x".into(),
            span: Span::new(20, 21),
            previous: Some(Span::new(4, 5)),
        });
        diags.report_warning(Warning::UnusedVariable {
            name: "x".into(),
            span: Span::new(4, 5),
        });
        diags
    }

    #[test]
    fn test_counts() {
        let diags = sample();
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert!(diags.has_errors());
        assert_eq!(diags.summary().as_deref(), Some("Generated 1 warnings and 1 errors."));
    }

    #[test]
    fn test_render() {
        let rendered = sample().render("t.pas", SOURCE);
        assert_eq!(
            rendered,
            "error[E0102]: Redefinition of x\n \
             --> t.pas:2:5\n\
             2 | var x: long;\n  \
             |     ^\n\
             note: previous declared here\n \
             --> t.pas:1:5\n\
             1 | var x: integer;\n  \
             |     ^\n\
             warning[W0002]: Unused variable x\n \
             --> t.pas:1:5\n\
             1 | var x: integer;\n  \
             |     ^\n"
        );
    }

    #[test]
    fn test_json_feedback() {
        let feedback = sample().to_feedback("t.pas", SOURCE);
        let json = serde_json::to_value(&feedback).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["diagnostics"][0]["code"], "E0102");
        assert_eq!(json["diagnostics"][0]["location"]["line"], 2);
        assert_eq!(json["diagnostics"][0]["related"][0]["location"]["line"], 1);
        assert_eq!(json["diagnostics"][1]["severity"], "Warning");
        assert_eq!(json["stats"]["loc"], 3);
    }
}
