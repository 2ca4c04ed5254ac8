//! Inline suppression of diagnostics via comments.
//!
//! Supports suppression comments like:
//! - `// celestecheck:ignore <rule> - <reason>`
//! - `// celestecheck:ignore-next-line <rule> - <reason>`
//! - `// celestecheck:ignore-file <rule> - <reason>`
//!
//! `<rule>` is a code (`CL0004`), a name (`HooksShouldBeStatic`) or `*`.

use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Diagnostic, DiagnosticId};
use crate::model::Program;

/// Header lines within which `ignore-file` is honoured even after code starts.
const FILE_HEADER_LINES: usize = 10;

/// How a suppression applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionType {
    /// Applies to the same line
    Line,
    /// Applies to the next line
    NextLine,
    /// Applies to the entire file
    File,
}

/// An inline suppression directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Rule to suppress (code or name) or "*" for all
    pub rule: String,
    /// Human-readable reason
    pub reason: String,
    /// File containing the suppression
    pub file: String,
    /// Line number (0 for file-level)
    pub line: usize,
    /// How the suppression applies
    pub suppression_type: SuppressionType,
}

/// A diagnostic that was suppressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressedDiagnostic {
    pub diagnostic: Diagnostic,
    pub suppression: Suppression,
}

lazy_static::lazy_static! {
    /// Patterns for matching suppression comments.
    static ref SUPPRESSION_PATTERNS: Vec<Regex> = vec![
        // Line comment: // celestecheck:...
        Regex::new(r"//\s*celestecheck:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*))?").unwrap(),
        // Block comment: /* celestecheck:... */
        Regex::new(r"/\*\s*celestecheck:(ignore(?:-file|-next-line)?)\s+(\S+?)\s*(?:-\s*(.*?))?\s*\*/").unwrap(),
    ];
}

/// Parse suppression directives from file content.
pub fn parse_suppressions(file_path: &str, content: &str) -> Vec<Suppression> {
    let mut suppressions = Vec::new();
    let mut in_header = true;

    for (line_num, line) in content.lines().enumerate() {
        let line_number = line_num + 1;
        let trimmed = line.trim();

        // The header ends at the first line that is neither blank nor a comment
        if in_header && !is_comment_or_empty(trimmed) {
            in_header = false;
        }

        for pattern in SUPPRESSION_PATTERNS.iter() {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let directive = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let rule = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let reason = caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();

            let suppression_type = match directive {
                "ignore-file" => {
                    if !in_header && line_number > FILE_HEADER_LINES {
                        continue;
                    }
                    SuppressionType::File
                }
                "ignore-next-line" => SuppressionType::NextLine,
                "ignore" => {
                    // Alone on its line: covers the next line. After code: covers this one.
                    let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
                    if line[..start].trim().is_empty() {
                        SuppressionType::NextLine
                    } else {
                        SuppressionType::Line
                    }
                }
                _ => continue,
            };

            suppressions.push(Suppression {
                rule: rule.to_string(),
                reason,
                file: file_path.to_string(),
                line: if suppression_type == SuppressionType::File {
                    0
                } else {
                    line_number
                },
                suppression_type,
            });
            break; // Only one suppression per line
        }
    }

    suppressions
}

/// Check if a C# line is a comment, a preprocessor line or empty.
fn is_comment_or_empty(line: &str) -> bool {
    line.is_empty()
        || line.starts_with("//")
        || line.starts_with("/*")
        || line.starts_with('*')
        || line.starts_with('#')
}

/// Check if a diagnostic matches a suppression.
pub fn matches_suppression(diagnostic: &Diagnostic, suppression: &Suppression) -> bool {
    if diagnostic.file() != suppression.file {
        return false;
    }

    if suppression.rule != "*" && DiagnosticId::parse(&suppression.rule) != Some(diagnostic.id) {
        return false;
    }

    match suppression.suppression_type {
        SuppressionType::File => true,
        SuppressionType::Line => diagnostic.line() == suppression.line,
        SuppressionType::NextLine => diagnostic.line() == suppression.line + 1,
    }
}

/// Separate diagnostics into active and suppressed based on suppressions.
pub fn filter_suppressed(
    diagnostics: Vec<Diagnostic>,
    suppressions: &[Suppression],
) -> (Vec<Diagnostic>, Vec<SuppressedDiagnostic>) {
    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for diagnostic in diagnostics {
        match suppressions
            .iter()
            .find(|s| matches_suppression(&diagnostic, s))
        {
            Some(suppression) => suppressed.push(SuppressedDiagnostic {
                diagnostic,
                suppression: suppression.clone(),
            }),
            None => active.push(diagnostic),
        }
    }

    (active, suppressed)
}

/// Collect suppressions from the source files named in `diagnostics`.
///
/// Text comes from the model when embedded, else from disk relative to
/// `base_dir`. Unreadable files are skipped.
pub fn collect_suppressions(
    program: &Program,
    base_dir: Option<&Path>,
    diagnostics: &[Diagnostic],
) -> Vec<Suppression> {
    let wanted: BTreeSet<&str> = diagnostics.iter().map(|d| d.file()).collect();
    let mut result = Vec::new();

    for path in wanted {
        let Some(file) = program.file_by_path(path) else {
            continue;
        };
        match program.source_text(file, base_dir) {
            Some(content) => result.extend(parse_suppressions(path, &content)),
            None => warn!(file = %path, "source not available, inline suppressions ignored"),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Severity;
    use crate::model::{Location, Span};

    fn diagnostic_at(line: usize) -> Diagnostic {
        Diagnostic {
            id: DiagnosticId::HooksShouldBeStatic,
            severity: Severity::Warning,
            location: Location::new(
                "Hooks.cs",
                Span {
                    start_line: line,
                    start_col: 5,
                    ..Default::default()
                },
            ),
            message: "Hook 'OnUpdate' should be static".to_string(),
            args: vec!["OnUpdate".to_string()],
        }
    }

    fn suppression(rule: &str, line: usize, suppression_type: SuppressionType) -> Suppression {
        Suppression {
            rule: rule.to_string(),
            reason: String::new(),
            file: "Hooks.cs".to_string(),
            line,
            suppression_type,
        }
    }

    #[test]
    fn test_parse_suppressions_csharp() {
        let content = r#"// celestecheck:ignore-file CL0015 - Legacy scans
using Monocle;

public class Hooks {
    private void OnUpdate() { } // celestecheck:ignore HooksShouldBeStatic - Needs instance
}
"#;
        let suppressions = parse_suppressions("Hooks.cs", content);
        assert_eq!(suppressions.len(), 2);

        assert_eq!(suppressions[0].suppression_type, SuppressionType::File);
        assert_eq!(suppressions[0].rule, "CL0015");
        assert_eq!(suppressions[0].reason, "Legacy scans");

        assert_eq!(suppressions[1].suppression_type, SuppressionType::Line);
        assert_eq!(suppressions[1].line, 5);
    }

    #[test]
    fn test_parse_suppressions_next_line() {
        let content = r#"
    // celestecheck:ignore-next-line CL0005 - Vanilla bug
    cursor.Remove();
"#;
        let suppressions = parse_suppressions("Hooks.cs", content);
        assert_eq!(suppressions.len(), 1);
        assert_eq!(suppressions[0].suppression_type, SuppressionType::NextLine);
        assert_eq!(suppressions[0].line, 2);
    }

    #[test]
    fn test_standalone_ignore_covers_next_line() {
        let content = "// celestecheck:ignore *\nOn.Celeste.Player.Update += OnUpdate;\n";
        let suppressions = parse_suppressions("Hooks.cs", content);
        assert_eq!(suppressions[0].suppression_type, SuppressionType::NextLine);
    }

    #[test]
    fn test_block_comment() {
        let content = "cursor.Remove(); /* celestecheck:ignore CL0005 - intended */\n";
        let suppressions = parse_suppressions("Hooks.cs", content);
        assert_eq!(suppressions.len(), 1);
        assert_eq!(suppressions[0].rule, "CL0005");
        assert_eq!(suppressions[0].reason, "intended");
    }

    #[test]
    fn test_late_ignore_file_is_dropped() {
        let mut content = String::from("using Monocle;\n");
        for _ in 0..12 {
            content.push_str("class A { }\n");
        }
        content.push_str("// celestecheck:ignore-file *\n");
        assert!(parse_suppressions("Hooks.cs", &content).is_empty());
    }

    #[test]
    fn test_matches_suppression() {
        let diagnostic = diagnostic_at(5);

        assert!(matches_suppression(&diagnostic, &suppression("CL0004", 0, SuppressionType::File)));
        assert!(matches_suppression(
            &diagnostic,
            &suppression("HooksShouldBeStatic", 4, SuppressionType::NextLine)
        ));
        assert!(matches_suppression(&diagnostic, &suppression("*", 5, SuppressionType::Line)));
        assert!(!matches_suppression(&diagnostic, &suppression("CL0003", 0, SuppressionType::File)));
        assert!(!matches_suppression(&diagnostic, &suppression("bogus", 0, SuppressionType::File)));
    }

    #[test]
    fn test_filter_suppressed() {
        let (active, suppressed) = filter_suppressed(
            vec![diagnostic_at(5), diagnostic_at(9)],
            &[suppression("*", 5, SuppressionType::Line)],
        );
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].line(), 9);
        assert_eq!(suppressed.len(), 1);
    }
}
