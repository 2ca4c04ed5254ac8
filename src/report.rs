//! Output formatting for lint results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use colored::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::detect::{AnalysisResult, Catalog, Diagnostic, Severity, SuppressedDiagnostic, SuppressionType};

/// Where a lint run came from, for report headers.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    /// Path given on the command line.
    pub path: &'a str,
    /// Configuration file in use, if any.
    pub config: Option<&'a Path>,
    pub fail_on: Severity,
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    pub fail_on: String,
    pub passed: bool,
    pub models_scanned: usize,
    pub counts: JsonCounts,
    pub diagnostics: Vec<JsonDiagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<JsonSuppressedDiagnostic>,
    pub suppressed_count: usize,
    pub excluded_count: usize,
}

/// Diagnostic counts by severity.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub code: String,
    pub name: String,
    pub severity: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSuppressedDiagnostic {
    pub diagnostic: JsonDiagnostic,
    pub suppression: JsonSuppression,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSuppression {
    pub rule: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub reason: String,
    pub file: String,
    pub line: usize,
    #[serde(rename = "type")]
    pub suppression_type: String,
}

/// Build the JSON report structure.
pub fn json_report(ctx: &ReportContext<'_>, result: &AnalysisResult) -> JsonReport {
    let suppressed = result
        .suppressed
        .iter()
        .map(|sd| JsonSuppressedDiagnostic {
            diagnostic: diagnostic_to_json(&sd.diagnostic),
            suppression: JsonSuppression {
                rule: sd.suppression.rule.clone(),
                reason: sd.suppression.reason.clone(),
                file: sd.suppression.file.clone(),
                line: sd.suppression.line,
                suppression_type: suppression_type_str(sd.suppression.suppression_type).to_string(),
            },
        })
        .collect();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: ctx.path.to_string(),
        config: ctx.config.map(|p| p.display().to_string()),
        fail_on: ctx.fail_on.to_string(),
        passed: result.passed(ctx.fail_on),
        models_scanned: result.models,
        counts: JsonCounts {
            error: result.count(Severity::Error),
            warning: result.count(Severity::Warning),
            info: result.count(Severity::Info),
        },
        diagnostics: result.diagnostics.iter().map(diagnostic_to_json).collect(),
        suppressed,
        suppressed_count: result.suppressed_count(),
        excluded_count: result.excluded,
    }
}

/// Write results in JSON format.
pub fn write_json(ctx: &ReportContext<'_>, result: &AnalysisResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_report(ctx, result))?;
    println!("{}", json);
    Ok(())
}

fn diagnostic_to_json(d: &Diagnostic) -> JsonDiagnostic {
    JsonDiagnostic {
        code: d.id.code().to_string(),
        name: d.id.name().to_string(),
        severity: d.severity.to_string(),
        file: d.file().to_string(),
        line: d.line(),
        column: d.location.column(),
        message: d.message.clone(),
    }
}

fn suppression_type_str(t: SuppressionType) -> &'static str {
    match t {
        SuppressionType::Line => "line",
        SuppressionType::NextLine => "nextline",
        SuppressionType::File => "file",
    }
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "celestecheck";
const INFO_URI: &str = "https://github.com/zen-systems/celestecheck";

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifReport {
    pub version: String,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    #[serde(rename = "informationUri")]
    pub information_uri: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRule {
    pub id: String,
    pub name: String,
    #[serde(rename = "shortDescription")]
    pub short_description: SarifMessage,
    #[serde(rename = "fullDescription")]
    pub full_description: SarifMessage,
    #[serde(rename = "helpUri")]
    pub help_uri: String,
    #[serde(rename = "defaultConfiguration")]
    pub default_config: SarifRuleConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRuleConfig {
    pub level: String,
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifResult {
    #[serde(rename = "ruleId")]
    pub rule_id: String,
    #[serde(rename = "ruleIndex")]
    pub rule_index: usize,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    pub artifact_location: SarifArtifact,
    pub region: SarifRegion,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifArtifact {
    pub uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRegion {
    #[serde(rename = "startLine")]
    pub start_line: usize,
    #[serde(rename = "startColumn")]
    pub start_column: usize,
}

fn map_severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

/// Build a SARIF log. Rule metadata covers the whole catalog, in code order.
pub fn sarif_report(catalog: &Catalog, result: &AnalysisResult) -> SarifReport {
    let rules: Vec<SarifRule> = catalog
        .iter()
        .map(|d| SarifRule {
            id: d.id.code().to_string(),
            name: d.id.name().to_string(),
            short_description: SarifMessage {
                text: d.title.to_string(),
            },
            full_description: SarifMessage {
                text: d.description.to_string(),
            },
            help_uri: format!("{}#{}", INFO_URI, d.id.code().to_lowercase()),
            default_config: SarifRuleConfig {
                level: map_severity_to_level(d.severity).to_string(),
                enabled: d.enabled,
            },
        })
        .collect();

    let results: Vec<SarifResult> = result
        .diagnostics
        .iter()
        .map(|d| SarifResult {
            rule_id: d.id.code().to_string(),
            rule_index: d.id as usize,
            level: map_severity_to_level(d.severity).to_string(),
            message: SarifMessage {
                text: d.message.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifact {
                        uri: d.file().replace('\\', "/"),
                    },
                    region: SarifRegion {
                        start_line: d.line().max(1),
                        start_column: d.location.column().max(1),
                    },
                },
            }],
        })
        .collect();

    SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: INFO_URI.to_string(),
                    rules,
                },
            },
            results,
        }],
    }
}

/// Write results in SARIF format.
pub fn write_sarif(catalog: &Catalog, result: &AnalysisResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&sarif_report(catalog, result))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(ctx: &ReportContext<'_>, result: &AnalysisResult, show_suppressed: bool) {
    // Header
    println!();
    print!("  ");
    print!("{}", "celestecheck".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", ctx.path);
    print!("  {}", "Config:   ".dimmed());
    match ctx.config {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", "(defaults)".dimmed()),
    }
    println!();

    write_result_summary(ctx, result);
    println!();

    if !result.diagnostics.is_empty() {
        write_diagnostics(&result.diagnostics);
        println!();
    }

    if !result.suppressed.is_empty() {
        write_suppressed_summary(&result.suppressed, show_suppressed);
        println!();
    }
}

fn write_result_summary(ctx: &ReportContext<'_>, result: &AnalysisResult) {
    if result.passed(ctx.fail_on) {
        print!("  {}", "✓ PASS".green());
    } else {
        print!("  {}", "✗ FAIL".red());
    }

    print!(
        "  {} error(s), {} warning(s), {} info",
        result.count(Severity::Error).to_string().red(),
        result.count(Severity::Warning).to_string().yellow(),
        result.count(Severity::Info).to_string().blue(),
    );
    print!("  {}", format!("({} model(s))", result.models).dimmed());

    if result.suppressed_count() > 0 {
        print!(
            "  {}",
            format!("({} suppressed)", result.suppressed_count()).dimmed()
        );
    }
    if result.excluded > 0 {
        print!("  {}", format!("({} excluded)", result.excluded).dimmed());
    }
    println!();
}

fn write_diagnostics(diagnostics: &[Diagnostic]) {
    println!("  {} ({}):", "Diagnostics".bold(), diagnostics.len());
    println!();

    for d in diagnostics {
        write_severity_tag(d.severity);
        print!("   ");
        print!("{:<8}", d.id.code().dimmed());
        print!("{}", d.file().blue());
        print!("{}", format!(":{}:{}", d.line(), d.location.column()).dimmed());
        println!();

        println!("            {}", d.message);
        println!("            {}", d.id.name().dimmed());
        println!();
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
    }
}

fn write_suppressed_summary(suppressed: &[SuppressedDiagnostic], show_details: bool) {
    println!("  {} ({}):", "Suppressed".dimmed(), suppressed.len());

    if !show_details {
        println!("    {}", "(use --show-suppressed to see details)".dimmed());
        return;
    }

    println!();
    for sd in suppressed {
        let d = &sd.diagnostic;
        let s = &sd.suppression;

        print!("    {:<8}", d.id.code().dimmed());
        print!("{}", d.file().blue());
        if s.suppression_type == SuppressionType::File {
            print!("{}", ":* (file)".dimmed());
        } else {
            print!("{}", format!(":{}", d.line()).dimmed());
        }
        println!();

        if !s.reason.is_empty() {
            println!("            {}", format!("reason: {:?}", s.reason).dimmed());
        }
    }
}

/// Print the catalog as a table.
pub fn write_rules(catalog: &Catalog) {
    println!();
    for d in catalog.iter() {
        let status = if d.enabled {
            String::new()
        } else {
            format!(" {}", "(disabled)".dimmed())
        };
        write_severity_tag(d.severity);
        println!(
            "{}  {:<34} {}{}",
            d.id.code().bold(),
            d.id.name(),
            d.title.dimmed(),
            status
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DiagnosticId, Suppression};
    use crate::model::{Location, Span};

    fn diagnostic(id: DiagnosticId, severity: Severity, line: usize) -> Diagnostic {
        Diagnostic {
            id,
            severity,
            location: Location::new(
                "Hooks.cs",
                Span {
                    start_line: line,
                    start_col: 9,
                    ..Default::default()
                },
            ),
            message: "Hook 'OnUpdate' should be static".to_string(),
            args: vec!["OnUpdate".to_string()],
        }
    }

    fn sample_result() -> AnalysisResult {
        let suppressed = diagnostic(DiagnosticId::DontUseCursorRemove, Severity::Warning, 30);
        AnalysisResult {
            diagnostics: vec![
                diagnostic(DiagnosticId::HooksShouldBeStatic, Severity::Error, 12),
                diagnostic(DiagnosticId::CallOrigInHooks, Severity::Warning, 12),
            ],
            suppressed: vec![SuppressedDiagnostic {
                suppression: Suppression {
                    rule: "CL0005".to_string(),
                    reason: "Vanilla bug".to_string(),
                    file: "Hooks.cs".to_string(),
                    line: 29,
                    suppression_type: SuppressionType::NextLine,
                },
                diagnostic: suppressed,
            }],
            excluded: 0,
            models: 1,
        }
    }

    #[test]
    fn test_json_report_counts() {
        let ctx = ReportContext {
            path: "build/Mod.model.json",
            config: None,
            fail_on: Severity::Error,
        };
        let report = json_report(&ctx, &sample_result());
        assert!(!report.passed);
        assert_eq!(report.counts.error, 1);
        assert_eq!(report.counts.warning, 1);
        assert_eq!(report.suppressed_count, 1);
        assert_eq!(report.diagnostics[0].code, "CL0004");
        assert_eq!(report.diagnostics[0].column, 9);
        assert_eq!(report.suppressed[0].suppression.suppression_type, "nextline");

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"fail_on\":\"error\""));
        assert!(!json.contains("\"config\""));
    }

    #[test]
    fn test_sarif_rules_come_from_catalog() {
        let catalog = Catalog::builtin();
        let report = sarif_report(&catalog, &sample_result());
        let run = &report.runs[0];

        assert_eq!(run.tool.driver.rules.len(), DiagnosticId::ALL.len());
        assert_eq!(run.tool.driver.rules[3].id, "CL0004");
        assert_eq!(run.tool.driver.rules[3].name, "HooksShouldBeStatic");
        assert_eq!(run.results.len(), 2);
        assert_eq!(run.results[0].rule_index, 3);
        assert_eq!(run.results[0].level, "error");
        assert_eq!(run.results[0].locations[0].physical_location.region.start_line, 12);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["version"], "2.1.0");
        assert!(value["$schema"].as_str().unwrap().contains("sarif-schema-2.1.0"));
    }
}
