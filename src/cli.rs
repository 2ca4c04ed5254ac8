//! Command-line interface for celestecheck.

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::{self, Config};
use crate::detect::{AnalysisResult, Diagnostic, Runner, Severity};
use crate::fix;
use crate::model::{NodeId, Program};
use crate::report::{self, ReportContext};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Suffixes of the model dumps `lint` picks up in a directory.
pub const MODEL_SUFFIXES: &[&str] = &[".model.json", ".model.yaml", ".model.yml"];

/// Semantic lints for Celeste mods.
///
/// celestecheck reads the program model a host compiler dumped for a mod
/// and reports misuse of MonoMod hooks, IL cursors, custom entities and
/// the entity tracker.
#[derive(Parser)]
#[command(name = "celestecheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint one model dump or every dump under a directory
    #[command(visible_alias = "check")]
    Lint(LintArgs),
    /// Offer or apply the fix for a single diagnostic
    Fix(FixArgs),
    /// List every diagnostic the linter can report
    Rules(RulesArgs),
    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the lint command.
#[derive(Parser)]
pub struct LintArgs {
    /// Model dump or directory of dumps
    pub path: PathBuf,

    /// Path to configuration file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Lowest severity that fails the run: error, warning, or info
    #[arg(long)]
    pub fail_on: Option<String>,

    /// Show suppressed diagnostics in output
    #[arg(long)]
    pub show_suppressed: bool,
}

/// Arguments for the fix command.
#[derive(Parser)]
pub struct FixArgs {
    /// Model dump to analyze
    pub model: PathBuf,

    /// Diagnostic location as <file>:<line>
    #[arg(long)]
    pub at: Option<String>,

    /// Apply the edit to the source file
    #[arg(long, requires = "at")]
    pub write: bool,

    /// Path to configuration file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the rules command.
#[derive(Parser)]
pub struct RulesArgs {
    /// Path to configuration file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "celestecheck.yaml")]
    pub output: PathBuf,
}

/// Default configuration written by `init`.
const DEFAULT_CONFIG: &str = include_str!("templates/default.yaml");

/// Whether `path` names a model dump.
pub fn is_model_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| MODEL_SUFFIXES.iter().any(|s| name.ends_with(s)))
        .unwrap_or(false)
}

/// Collect model dumps under `root`, sorted by path.
pub fn collect_models(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            if e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.') {
                return false;
            }
            true
        })
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_model_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Load the configuration, reporting problems on stderr.
fn load_config(explicit: Option<&Path>) -> Option<(Config, Option<PathBuf>)> {
    let (config, path) = match Config::load_or_default(explicit, Path::new(".")) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return None;
        }
    };
    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return None;
    }
    match &path {
        Some(p) => info!(config = %p.display(), "using configuration"),
        None => info!("no configuration file, using defaults"),
    }
    Some((config, path))
}

/// Directory the model's source paths are relative to.
fn model_dir(model: &Path) -> PathBuf {
    model
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Run the lint command.
pub fn run_lint(args: &LintArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" && args.format != "sarif" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let fail_on_override = match args.fail_on.as_deref().map(str::parse::<Severity>) {
        Some(Ok(severity)) => Some(severity),
        Some(Err(e)) => {
            eprintln!("Error: {}, must be 'error', 'warning', or 'info'", e);
            return Ok(EXIT_ERROR);
        }
        None => None,
    };

    let Some((config, config_path)) = load_config(args.config.as_deref()) else {
        return Ok(EXIT_ERROR);
    };
    let fail_on = fail_on_override.unwrap_or_else(|| config.fail_on());

    // Check path exists
    let metadata = match std::fs::metadata(&args.path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let models = if metadata.is_dir() {
        collect_models(&args.path)?
    } else {
        vec![args.path.clone()]
    };

    if models.is_empty() {
        eprintln!("Warning: no model dumps to lint");
        return Ok(EXIT_SUCCESS);
    }

    let mut result = AnalysisResult::new();
    for model in &models {
        let program = match Program::load(model) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {}: {}", model.display(), e);
                return Ok(EXIT_ERROR);
            }
        };
        debug!(model = %model.display(), files = program.files.len(), "analyzing model");
        let runner = Runner::new(config.clone())?.base_dir(model_dir(model));
        result.merge(runner.run(&program));
    }
    result.diagnostics.sort_by(|a, b| {
        (a.file(), a.location.span.start_byte, a.id.code(), &a.message).cmp(&(
            b.file(),
            b.location.span.start_byte,
            b.id.code(),
            &b.message,
        ))
    });

    // Output results
    let path_str = args.path.to_string_lossy().to_string();
    let ctx = ReportContext {
        path: &path_str,
        config: config_path.as_deref(),
        fail_on,
    };

    match args.format.as_str() {
        "json" => report::write_json(&ctx, &result)?,
        "sarif" => {
            let catalog = Runner::new(config)?.catalog().clone();
            report::write_sarif(&catalog, &result)?;
        }
        _ => report::write_pretty(&ctx, &result, args.show_suppressed),
    }

    if result.passed(fail_on) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Split `<file>:<line>` at its last colon.
pub fn parse_location(at: &str) -> Option<(&str, usize)> {
    let (file, line) = at.rsplit_once(':')?;
    let line = line.trim().parse().ok()?;
    if file.is_empty() || line == 0 {
        return None;
    }
    Some((file, line))
}

/// Whether the diagnostic sits at `file:line`. `file` may be a path suffix.
fn is_at(diagnostic: &Diagnostic, file: &str, line: usize) -> bool {
    let path = diagnostic.file().replace('\\', "/");
    let file = file.replace('\\', "/");
    diagnostic.line() == line
        && (path == file || path.ends_with(&format!("/{}", file.trim_start_matches("./"))))
}

/// Text of the line containing byte `offset`.
fn line_at(text: &str, offset: usize) -> &str {
    let start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(text.len());
    text[start..end].trim_end_matches('\r')
}

/// Whether the target's modifier tokens still sit where the model put them.
fn source_matches(program: &Program, target: NodeId, text: &str) -> bool {
    program
        .node(target)
        .kind
        .modifiers()
        .unwrap_or_default()
        .iter()
        .all(|t| text.get(t.span.start_byte..t.span.end_byte) == Some(t.text.as_str()))
}

/// Run the fix command.
pub fn run_fix(args: &FixArgs) -> anyhow::Result<i32> {
    let Some((config, _)) = load_config(args.config.as_deref()) else {
        return Ok(EXIT_ERROR);
    };

    let program = match Program::load(&args.model) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}: {}", args.model.display(), e);
            return Ok(EXIT_ERROR);
        }
    };
    let base_dir = model_dir(&args.model);
    let result = Runner::new(config)?.base_dir(&base_dir).run(&program);

    let Some(at) = args.at.as_deref() else {
        return list_fixable(&program, &result.diagnostics);
    };
    let Some((file, line)) = parse_location(at) else {
        eprintln!("Error: invalid location {:?}, expected <file>:<line>", at);
        return Ok(EXIT_ERROR);
    };

    let found = result
        .diagnostics
        .iter()
        .filter(|d| is_at(d, file, line))
        .find_map(|d| fix::action_for(&program, d).map(|action| (d, action)));
    let Some((diagnostic, action)) = found else {
        eprintln!("Error: no fixable diagnostic at {}:{}", file, line);
        return Ok(EXIT_ERROR);
    };
    let Some(applied) = action.apply(&program) else {
        eprintln!("Error: {} could not be applied", action.title);
        return Ok(EXIT_ERROR);
    };
    debug!(code = diagnostic.id.code(), edit = %applied.edit, "computed fix");

    let file = program.node(action.target).file;
    let source = program.file(file);
    let source_path = base_dir.join(&source.path);
    let Some(text) = program.source_text(file, Some(&base_dir)) else {
        eprintln!("Error: source of {} is not available", source.path);
        return Ok(EXIT_ERROR);
    };
    if !source_matches(&program, action.target, &text) {
        eprintln!(
            "Error: {} differs from the model dump, regenerate the dump first",
            source_path.display()
        );
        return Ok(EXIT_ERROR);
    }
    let Some(fixed) = applied.edit.apply(&text) else {
        eprintln!("Error: edit {} does not fit {}", applied.edit, source.path);
        return Ok(EXIT_ERROR);
    };

    println!(
        "{} {}  {}",
        diagnostic.id.code().bold(),
        diagnostic.location,
        action.title
    );
    println!("  {} {}", "-".red(), line_at(&text, applied.edit.start).red());
    println!("  {} {}", "+".green(), line_at(&fixed, applied.edit.start).green());

    if args.write {
        let on_disk = std::fs::read_to_string(&source_path).map_err(|e| {
            anyhow::anyhow!("cannot read {}: {}", source_path.display(), e)
        })?;
        if on_disk != text {
            eprintln!(
                "Error: {} differs from the model dump, regenerate the dump first",
                source_path.display()
            );
            return Ok(EXIT_ERROR);
        }
        std::fs::write(&source_path, &fixed)?;
        info!(file = %source_path.display(), "wrote fix");
        println!();
        println!("Wrote {}", source_path.display());
    }

    Ok(EXIT_SUCCESS)
}

/// Print each diagnostic that has a fix.
fn list_fixable(program: &Program, diagnostics: &[Diagnostic]) -> anyhow::Result<i32> {
    let fixable: Vec<_> = diagnostics
        .iter()
        .filter_map(|d| fix::action_for(program, d).map(|action| (d, action)))
        .collect();

    if fixable.is_empty() {
        println!("No fixable diagnostics.");
        return Ok(EXIT_SUCCESS);
    }

    for (d, action) in &fixable {
        println!(
            "{}:{}  {}  {}",
            d.file(),
            d.line(),
            d.id.code().bold(),
            d.message
        );
        println!("    {} {}", "fix:".dimmed(), action.title);
    }
    println!();
    println!("Apply one with: celestecheck fix <model> --at <file>:<line> --write");

    Ok(EXIT_SUCCESS)
}

/// Run the rules command.
pub fn run_rules(args: &RulesArgs) -> anyhow::Result<i32> {
    let Some((config, _)) = load_config(args.config.as_deref()) else {
        return Ok(EXIT_ERROR);
    };
    let runner = Runner::new(config)?;
    report::write_rules(runner.catalog());
    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_CONFIG) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to match your mod's framework versions", args.output.display());
    println!("  2. Run: celestecheck lint <model-dir> --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        assert_eq!(parse_location("Hooks.cs:12"), Some(("Hooks.cs", 12)));
        assert_eq!(parse_location("C:/mod/Hooks.cs:3"), Some(("C:/mod/Hooks.cs", 3)));
        assert_eq!(parse_location("Hooks.cs"), None);
        assert_eq!(parse_location("Hooks.cs:0"), None);
        assert_eq!(parse_location(":4"), None);
    }

    #[test]
    fn test_is_model_file() {
        assert!(is_model_file(Path::new("out/Mod.model.json")));
        assert!(is_model_file(Path::new("Mod.model.yaml")));
        assert!(!is_model_file(Path::new("Mod.json")));
        assert!(!is_model_file(Path::new("celestecheck.yaml")));
    }

    #[test]
    fn test_line_at() {
        let text = "class A\n{\n    void B() {}\n}\n";
        let offset = text.find("void").unwrap();
        assert_eq!(line_at(text, offset), "    void B() {}");
        assert_eq!(line_at(text, 0), "class A");
    }

    #[test]
    fn test_collect_models_skips_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join(".cache")).unwrap();
        std::fs::write(dir.path().join("a/One.model.json"), "{}").unwrap();
        std::fs::write(dir.path().join("Two.model.yaml"), "{}").unwrap();
        std::fs::write(dir.path().join(".cache/Three.model.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();

        let models = collect_models(dir.path()).unwrap();
        let names: Vec<_> = models
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["Two.model.yaml", "One.model.json"]);
    }

    #[test]
    fn test_default_config_template_is_valid() {
        let config: Config = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(config::validate(&config).is_ok());
        assert_eq!(config.fail_on(), Severity::Warning);
        assert_eq!(config.framework.cursor.chained_predicate_threshold, 5);
    }
}
