//! Configuration schema for celestecheck.
//!
//! The configuration is optional. It names the framework types the rules
//! look for, overrides catalog severities, and excludes generated paths.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detect::{DiagnosticId, Severity};

/// File names tried by [`Config::discover`], in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["celestecheck.yaml", ".celestecheck.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub framework: FrameworkNames,
    /// Per-diagnostic overrides, keyed by code (`CL0004`) or name.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleOverride>,
    /// Glob patterns over diagnostic file paths (e.g. "**/Generated/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Lowest severity that fails the run (default: warning).
    #[serde(default)]
    pub fail_on: Option<Severity>,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Find a configuration file in `dir`, if any.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load `explicit` if given, else a discovered file, else defaults.
    pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(dir),
        };
        match path {
            Some(path) => {
                let config = Self::parse_file(&path)
                    .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", path.display(), e))?;
                Ok((config, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    /// Returns the failure threshold (defaults to warning).
    pub fn fail_on(&self) -> Severity {
        self.fail_on.unwrap_or(Severity::Warning)
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|pattern| {
            globset::Glob::new(pattern)
                .map(|glob| glob.compile_matcher().is_match(path))
                .unwrap_or(false)
        })
    }
}

/// Override for one diagnostic.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RuleOverride {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Names of the bytecode-cursor methods the injection rule dispatches on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CursorMethods {
    pub emit_delegate: String,
    pub remove: Vec<String>,
    pub navigation: Vec<String>,
    /// Total argument count at which a navigation call is flagged.
    pub chained_predicate_threshold: usize,
}

impl Default for CursorMethods {
    fn default() -> Self {
        Self {
            emit_delegate: "EmitDelegate".into(),
            remove: strings(&["Remove", "RemoveRange"]),
            navigation: strings(&["GotoNext", "TryGotoNext", "GotoPrev", "TryGotoPrev"]),
            chained_predicate_threshold: 5,
        }
    }
}

/// Fully-qualified names of the framework types and members the rules match.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameworkNames {
    pub il_cursor: String,
    pub il_context: String,
    pub hook: String,
    /// Root namespaces of generated hook events.
    pub hook_namespaces: Vec<String>,
    pub cursor: CursorMethods,
    pub entity: String,
    pub scene_property: String,
    pub custom_entity_attribute: String,
    pub tracked_attribute: String,
    pub tracked_as_attribute: String,
    pub tracker: String,
    /// Tracker methods that are plain boolean checks.
    pub tracker_checks: Vec<String>,
    pub entity_list: String,
    pub entity_list_scans: Vec<String>,
    pub vector2: String,
    pub entity_data: String,
    pub entity_id: String,
    pub level: String,
    pub level_data: String,
    /// Return types that make a method sequence-producing.
    pub sequence_types: Vec<String>,
}

impl Default for FrameworkNames {
    fn default() -> Self {
        Self {
            il_cursor: "MonoMod.Cil.ILCursor".into(),
            il_context: "MonoMod.Cil.ILContext".into(),
            hook: "MonoMod.RuntimeDetour.Hook".into(),
            hook_namespaces: strings(&["On", "IL"]),
            cursor: CursorMethods::default(),
            entity: "Monocle.Entity".into(),
            scene_property: "Scene".into(),
            custom_entity_attribute: "Celeste.Mod.Entities.CustomEntityAttribute".into(),
            tracked_attribute: "Monocle.TrackedAttribute".into(),
            tracked_as_attribute: "Monocle.TrackedAsAttribute".into(),
            tracker: "Monocle.Tracker".into(),
            tracker_checks: strings(&["IsEntityTracked", "IsComponentTracked"]),
            entity_list: "Monocle.EntityList".into(),
            entity_list_scans: strings(&["FindAll", "FindFirst"]),
            vector2: "Microsoft.Xna.Framework.Vector2".into(),
            entity_data: "Celeste.EntityData".into(),
            entity_id: "Celeste.EntityID".into(),
            level: "Celeste.Level".into(),
            level_data: "Celeste.LevelData".into(),
            sequence_types: strings(&[
                "System.Collections.IEnumerator",
                "System.Collections.IEnumerable",
                "System.Collections.Generic.IEnumerator",
                "System.Collections.Generic.IEnumerable",
            ]),
        }
    }
}

impl FrameworkNames {
    /// Every configured type name, labelled by its key.
    fn type_names(&self) -> Vec<(&'static str, &str)> {
        let mut names = vec![
            ("il_cursor", self.il_cursor.as_str()),
            ("il_context", self.il_context.as_str()),
            ("hook", self.hook.as_str()),
            ("entity", self.entity.as_str()),
            ("custom_entity_attribute", self.custom_entity_attribute.as_str()),
            ("tracked_attribute", self.tracked_attribute.as_str()),
            ("tracked_as_attribute", self.tracked_as_attribute.as_str()),
            ("tracker", self.tracker.as_str()),
            ("entity_list", self.entity_list.as_str()),
            ("vector2", self.vector2.as_str()),
            ("entity_data", self.entity_data.as_str()),
            ("entity_id", self.entity_id.as_str()),
            ("level", self.level.as_str()),
            ("level_data", self.level_data.as_str()),
        ];
        names.extend(self.sequence_types.iter().map(|s| ("sequence_types", s.as_str())));
        names
    }

    /// Every configured member or namespace segment, labelled by its key.
    fn member_names(&self) -> Vec<(&'static str, &str)> {
        let mut names = vec![
            ("scene_property", self.scene_property.as_str()),
            ("cursor.emit_delegate", self.cursor.emit_delegate.as_str()),
        ];
        names.extend(self.hook_namespaces.iter().map(|s| ("hook_namespaces", s.as_str())));
        names.extend(self.cursor.remove.iter().map(|s| ("cursor.remove", s.as_str())));
        names.extend(self.cursor.navigation.iter().map(|s| ("cursor.navigation", s.as_str())));
        names.extend(self.tracker_checks.iter().map(|s| ("tracker_checks", s.as_str())));
        names.extend(self.entity_list_scans.iter().map(|s| ("entity_list_scans", s.as_str())));
        names
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    // Validate rule keys
    for key in config.rules.keys() {
        if DiagnosticId::parse(key).is_none() {
            anyhow::bail!("unknown rule {:?} in rules (expected a code like CL0004 or a name like HooksShouldBeStatic)", key);
        }
    }

    // Validate framework names
    for (key, name) in config.framework.type_names() {
        if name.is_empty() || !name.split('.').all(is_identifier) {
            anyhow::bail!("invalid framework.{} {:?}, must be a dotted type name", key, name);
        }
    }
    for (key, name) in config.framework.member_names() {
        if !is_identifier(name) {
            anyhow::bail!("invalid framework.{} {:?}, must be a simple identifier", key, name);
        }
    }
    if config.framework.cursor.chained_predicate_threshold == 0 {
        anyhow::bail!("framework.cursor.chained_predicate_threshold must be at least 1");
    }

    // Validate excluded_paths glob patterns compile
    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
version: "1"
framework:
  entity: Monocle.Entity
  cursor:
    chained_predicate_threshold: 3
rules:
  CL0015: { enabled: false }
  HooksShouldBeStatic: { severity: error }
excluded_paths: ["**/Generated/**"]
fail_on: error
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.framework.cursor.chained_predicate_threshold, 3);
        assert_eq!(config.framework.cursor.emit_delegate, "EmitDelegate");
        assert_eq!(config.framework.il_cursor, "MonoMod.Cil.ILCursor");
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.fail_on(), Severity::Error);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
        assert_eq!(config.fail_on(), Severity::Warning);
    }

    #[test]
    fn test_unknown_rule_key_rejected() {
        let mut config = Config::default();
        config.rules.insert("NoSuchRule".into(), RuleOverride::default());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("NoSuchRule"));
    }

    #[test]
    fn test_bad_framework_name_rejected() {
        let mut config = Config::default();
        config.framework.entity = "Monocle..Entity".into();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_excluded_paths() {
        let config = Config {
            excluded_paths: vec!["**/Generated/**".into()],
            ..Default::default()
        };
        assert!(config.is_path_excluded("src/Generated/Hooks.cs"));
        assert!(!config.is_path_excluded("src/Hooks.cs"));
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::discover(dir.path()).is_none());
        std::fs::write(dir.path().join(".celestecheck.yaml"), "version: \"1\"\n").unwrap();
        assert_eq!(
            Config::discover(dir.path()),
            Some(dir.path().join(".celestecheck.yaml"))
        );
    }
}
