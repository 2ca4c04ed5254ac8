//! Diagnostic catalog: stable ids and their descriptors.
//!
//! The catalog is built once with [`Catalog::builtin`], optionally adjusted by
//! configuration overrides, and then handed to the runner as an immutable
//! table. Rules only ever report ids present here.

use std::fmt;

use phf::phf_map;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Severity;
use crate::config::RuleOverride;

/// Every reportable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticId {
    DontUseLambdas,
    DontEmitInstanceMethods,
    CallOrigInHooks,
    HooksShouldBeStatic,
    DontUseCursorRemove,
    DontChainPredicatesInCursorGoto,
    CustomEntityWithNoValidCtor,
    CustomEntityNotExtendingEntity,
    CustomEntityGeneratorMethodMissing,
    CustomEntityGeneratorInvalidParams,
    CustomEntityGeneratorInvalid,
    CustomEntityNoIDs,
    UsingSceneInWrongPlace,
    DontYieldReturnOrig,
    DontUseFindAll,
    TrackerUsedOnUntrackedType,
    InvalidTrackedAs,
}

static BY_KEY: phf::Map<&'static str, DiagnosticId> = phf_map! {
    "CL0001" => DiagnosticId::DontUseLambdas,
    "CL0002" => DiagnosticId::DontEmitInstanceMethods,
    "CL0003" => DiagnosticId::CallOrigInHooks,
    "CL0004" => DiagnosticId::HooksShouldBeStatic,
    "CL0005" => DiagnosticId::DontUseCursorRemove,
    "CL0006" => DiagnosticId::DontChainPredicatesInCursorGoto,
    "CL0007" => DiagnosticId::CustomEntityWithNoValidCtor,
    "CL0008" => DiagnosticId::CustomEntityNotExtendingEntity,
    "CL0009" => DiagnosticId::CustomEntityGeneratorMethodMissing,
    "CL0010" => DiagnosticId::CustomEntityGeneratorInvalidParams,
    "CL0011" => DiagnosticId::CustomEntityGeneratorInvalid,
    "CL0012" => DiagnosticId::CustomEntityNoIDs,
    "CL0013" => DiagnosticId::UsingSceneInWrongPlace,
    "CL0014" => DiagnosticId::DontYieldReturnOrig,
    "CL0015" => DiagnosticId::DontUseFindAll,
    "CL0016" => DiagnosticId::TrackerUsedOnUntrackedType,
    "CL0017" => DiagnosticId::InvalidTrackedAs,
    "DontUseLambdas" => DiagnosticId::DontUseLambdas,
    "DontEmitInstanceMethods" => DiagnosticId::DontEmitInstanceMethods,
    "CallOrigInHooks" => DiagnosticId::CallOrigInHooks,
    "HooksShouldBeStatic" => DiagnosticId::HooksShouldBeStatic,
    "DontUseCursorRemove" => DiagnosticId::DontUseCursorRemove,
    "DontChainPredicatesInCursorGoto" => DiagnosticId::DontChainPredicatesInCursorGoto,
    "CustomEntityWithNoValidCtor" => DiagnosticId::CustomEntityWithNoValidCtor,
    "CustomEntityNotExtendingEntity" => DiagnosticId::CustomEntityNotExtendingEntity,
    "CustomEntityGeneratorMethodMissing" => DiagnosticId::CustomEntityGeneratorMethodMissing,
    "CustomEntityGeneratorInvalidParams" => DiagnosticId::CustomEntityGeneratorInvalidParams,
    "CustomEntityGeneratorInvalid" => DiagnosticId::CustomEntityGeneratorInvalid,
    "CustomEntityNoIDs" => DiagnosticId::CustomEntityNoIDs,
    "UsingSceneInWrongPlace" => DiagnosticId::UsingSceneInWrongPlace,
    "DontYieldReturnOrig" => DiagnosticId::DontYieldReturnOrig,
    "DontUseFindAll" => DiagnosticId::DontUseFindAll,
    "TrackerUsedOnUntrackedType" => DiagnosticId::TrackerUsedOnUntrackedType,
    "InvalidTrackedAs" => DiagnosticId::InvalidTrackedAs,
};

impl DiagnosticId {
    pub const ALL: [DiagnosticId; 17] = [
        DiagnosticId::DontUseLambdas,
        DiagnosticId::DontEmitInstanceMethods,
        DiagnosticId::CallOrigInHooks,
        DiagnosticId::HooksShouldBeStatic,
        DiagnosticId::DontUseCursorRemove,
        DiagnosticId::DontChainPredicatesInCursorGoto,
        DiagnosticId::CustomEntityWithNoValidCtor,
        DiagnosticId::CustomEntityNotExtendingEntity,
        DiagnosticId::CustomEntityGeneratorMethodMissing,
        DiagnosticId::CustomEntityGeneratorInvalidParams,
        DiagnosticId::CustomEntityGeneratorInvalid,
        DiagnosticId::CustomEntityNoIDs,
        DiagnosticId::UsingSceneInWrongPlace,
        DiagnosticId::DontYieldReturnOrig,
        DiagnosticId::DontUseFindAll,
        DiagnosticId::TrackerUsedOnUntrackedType,
        DiagnosticId::InvalidTrackedAs,
    ];

    /// Stable short code, e.g. `CL0004`.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticId::DontUseLambdas => "CL0001",
            DiagnosticId::DontEmitInstanceMethods => "CL0002",
            DiagnosticId::CallOrigInHooks => "CL0003",
            DiagnosticId::HooksShouldBeStatic => "CL0004",
            DiagnosticId::DontUseCursorRemove => "CL0005",
            DiagnosticId::DontChainPredicatesInCursorGoto => "CL0006",
            DiagnosticId::CustomEntityWithNoValidCtor => "CL0007",
            DiagnosticId::CustomEntityNotExtendingEntity => "CL0008",
            DiagnosticId::CustomEntityGeneratorMethodMissing => "CL0009",
            DiagnosticId::CustomEntityGeneratorInvalidParams => "CL0010",
            DiagnosticId::CustomEntityGeneratorInvalid => "CL0011",
            DiagnosticId::CustomEntityNoIDs => "CL0012",
            DiagnosticId::UsingSceneInWrongPlace => "CL0013",
            DiagnosticId::DontYieldReturnOrig => "CL0014",
            DiagnosticId::DontUseFindAll => "CL0015",
            DiagnosticId::TrackerUsedOnUntrackedType => "CL0016",
            DiagnosticId::InvalidTrackedAs => "CL0017",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticId::DontUseLambdas => "DontUseLambdas",
            DiagnosticId::DontEmitInstanceMethods => "DontEmitInstanceMethods",
            DiagnosticId::CallOrigInHooks => "CallOrigInHooks",
            DiagnosticId::HooksShouldBeStatic => "HooksShouldBeStatic",
            DiagnosticId::DontUseCursorRemove => "DontUseCursorRemove",
            DiagnosticId::DontChainPredicatesInCursorGoto => "DontChainPredicatesInCursorGoto",
            DiagnosticId::CustomEntityWithNoValidCtor => "CustomEntityWithNoValidCtor",
            DiagnosticId::CustomEntityNotExtendingEntity => "CustomEntityNotExtendingEntity",
            DiagnosticId::CustomEntityGeneratorMethodMissing => "CustomEntityGeneratorMethodMissing",
            DiagnosticId::CustomEntityGeneratorInvalidParams => "CustomEntityGeneratorInvalidParams",
            DiagnosticId::CustomEntityGeneratorInvalid => "CustomEntityGeneratorInvalid",
            DiagnosticId::CustomEntityNoIDs => "CustomEntityNoIDs",
            DiagnosticId::UsingSceneInWrongPlace => "UsingSceneInWrongPlace",
            DiagnosticId::DontYieldReturnOrig => "DontYieldReturnOrig",
            DiagnosticId::DontUseFindAll => "DontUseFindAll",
            DiagnosticId::TrackerUsedOnUntrackedType => "TrackerUsedOnUntrackedType",
            DiagnosticId::InvalidTrackedAs => "InvalidTrackedAs",
        }
    }

    /// Look up an id by code or name.
    pub fn parse(s: &str) -> Option<Self> {
        BY_KEY.get(s.trim()).copied()
    }
}

impl fmt::Display for DiagnosticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for DiagnosticId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for DiagnosticId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DiagnosticId::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown diagnostic id: {}", s)))
    }
}

/// Immutable description of one diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Descriptor {
    pub id: DiagnosticId,
    pub title: &'static str,
    /// Message with positional `{0}`, `{1}` placeholders.
    pub message_template: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub enabled: bool,
}

impl Descriptor {
    /// Substitute `args` into the message template.
    ///
    /// Placeholders without a matching argument are left as written.
    pub fn format(&self, args: &[&str]) -> String {
        let mut message = self.message_template.to_string();
        for (i, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", i), arg);
        }
        message
    }
}

const CATEGORY: &str = "Usage";

fn builtin_descriptor(id: DiagnosticId) -> Descriptor {
    let (title, message_template, description) = match id {
        DiagnosticId::DontUseLambdas => (
            "Don't emit lambdas",
            "Lambda passed to {0}; pass a static method instead",
            "Delegates emitted into IL are stored for the lifetime of the game. A lambda can capture state, which then outlives the hook and is silently pinned. Emit a static method instead.",
        ),
        DiagnosticId::DontEmitInstanceMethods => (
            "Don't emit instance methods",
            "Instance method '{0}' passed to {1}; emitted methods must be static",
            "The injected call site has no implicit receiver, so an instance method cannot be emitted safely. Make the method static.",
        ),
        DiagnosticId::CallOrigInHooks => (
            "Call orig in hooks",
            "Hook never calls '{0}' ({1}); other mods hooking the same method will break",
            "On. hooks and detours receive the original method as their first parameter. Not calling it skips the original implementation and every other hook registered after this one.",
        ),
        DiagnosticId::HooksShouldBeStatic => (
            "Hooks should be static",
            "Hook '{0}' should be static",
            "Instance hook targets capture the instance they were created from, which keeps it alive and makes the hook unsafe to re-apply across detour lifetimes.",
        ),
        DiagnosticId::DontUseCursorRemove => (
            "Don't remove instructions",
            "{0} removes IL instructions; prefer replacing or skipping them",
            "Removing instructions breaks other IL hooks that match against them. Replace the instruction with a no-op or branch past it instead.",
        ),
        DiagnosticId::DontChainPredicatesInCursorGoto => (
            "Don't chain predicates in cursor navigation",
            "{0} is called with {1} arguments; split the predicates into separate calls",
            "Long predicate chains are hard to reason about and break on engine updates. Match a short, distinctive sequence and move relative to it.",
        ),
        DiagnosticId::CustomEntityWithNoValidCtor => (
            "Custom entity has no valid constructor",
            "Custom entity '{0}' has no constructor Everest can call",
            "Everest instantiates custom entities through one of: (), (Vector2), (EntityData, Vector2) or (EntityData, Vector2, EntityID). Add one of them, or use a generator method for every id.",
        ),
        DiagnosticId::CustomEntityNotExtendingEntity => (
            "Custom entity does not extend Entity",
            "'{0}' is marked with [CustomEntity] but does not extend Entity",
            "Only types deriving from Entity (or Trigger) can be registered as custom entities.",
        ),
        DiagnosticId::CustomEntityGeneratorMethodMissing => (
            "Custom entity generator method missing",
            "Generator method '{0}' not found on '{1}'",
            "An id of the form \"Name = Method\" names a static generator method on the entity type. No member with that name exists.",
        ),
        DiagnosticId::CustomEntityGeneratorInvalidParams => (
            "Custom entity generator has invalid parameters",
            "Generator method '{0}' has parameters Everest cannot supply",
            "Generator methods must take one of: (), (Vector2), (EntityData, Vector2), (EntityData, Vector2, EntityID) or (Level, LevelData, Vector2, EntityData).",
        ),
        DiagnosticId::CustomEntityGeneratorInvalid => (
            "Custom entity generator is invalid",
            "Generator method '{0}' must be static and return an Entity",
            "Generator methods are invoked without an instance and their result is added to the level, so they must be static and return a type deriving from Entity.",
        ),
        DiagnosticId::CustomEntityNoIDs => (
            "Custom entity has no ids",
            "[CustomEntity] on '{0}' declares no ids",
            "A custom entity must be registered under at least one id, otherwise no map can place it.",
        ),
        DiagnosticId::UsingSceneInWrongPlace => (
            "Scene used in constructor",
            "Scene is always null inside a constructor; use Added or Awake instead",
            "An entity is not attached to a scene until it is added. Reading Scene in a constructor always yields null.",
        ),
        DiagnosticId::DontYieldReturnOrig => (
            "Don't yield return orig",
            "'yield return {0}(...)' yields the original coroutine as a single element",
            "Yielding the original enumerator hands it to the coroutine runner as one nested element, which changes timing compared to iterating it. Iterate the original and yield its elements.",
        ),
        DiagnosticId::DontUseFindAll => (
            "Don't scan the entity list",
            "EntityList.{0}<{1}> scans every entity; use Tracker.GetEntities<{1}> instead",
            "A linear scan over all entities is slower than the tracker index. Tracked types, and types declared in this mod that can be marked [Tracked], should be queried through the Tracker.",
        ),
        DiagnosticId::TrackerUsedOnUntrackedType => (
            "Tracker used on untracked type",
            "'{0}' is not tracked; Tracker.{1} will always be empty",
            "The tracker only indexes types marked [Tracked] or [TrackedAs]. Querying it for any other type returns nothing.",
        ),
        DiagnosticId::InvalidTrackedAs => (
            "Invalid TrackedAs target",
            "'{0}' is tracked as '{1}' but does not extend it",
            "[TrackedAs(typeof(T))] files instances under T's bucket. A type that does not derive from T will break consumers casting the bucket's elements to T.",
        ),
    };

    Descriptor {
        id,
        title,
        message_template,
        description,
        category: CATEGORY,
        severity: Severity::Warning,
        enabled: true,
    }
}

/// Immutable id-to-descriptor table.
#[derive(Debug, Clone)]
pub struct Catalog {
    descriptors: Vec<Descriptor>,
}

impl Catalog {
    /// The built-in catalog with default severities.
    pub fn builtin() -> Self {
        Self {
            descriptors: DiagnosticId::ALL.iter().map(|&id| builtin_descriptor(id)).collect(),
        }
    }

    /// A copy of this catalog with configuration overrides applied.
    ///
    /// Keys are codes or names; unknown keys are an error.
    pub fn with_overrides<'a, I>(&self, overrides: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a RuleOverride)>,
    {
        let mut catalog = self.clone();
        for (key, rule) in overrides {
            let id = DiagnosticId::parse(key)
                .ok_or_else(|| anyhow::anyhow!("unknown rule {:?}", key))?;
            let descriptor = &mut catalog.descriptors[id as usize];
            if let Some(enabled) = rule.enabled {
                descriptor.enabled = enabled;
            }
            if let Some(severity) = rule.severity {
                descriptor.severity = severity;
            }
        }
        Ok(catalog)
    }

    pub fn get(&self, id: DiagnosticId) -> &Descriptor {
        &self.descriptors[id as usize]
    }

    pub fn is_enabled(&self, id: DiagnosticId) -> bool {
        self.get(id).enabled
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_codes_and_names_round_trip() {
        for id in DiagnosticId::ALL {
            assert_eq!(DiagnosticId::parse(id.code()), Some(id));
            assert_eq!(DiagnosticId::parse(id.name()), Some(id));
        }
        assert_eq!(DiagnosticId::parse("CL9999"), None);
    }

    #[test]
    fn test_builtin_order_matches_ids() {
        let catalog = Catalog::builtin();
        for id in DiagnosticId::ALL {
            let d = catalog.get(id);
            assert_eq!(d.id, id);
            assert_eq!(d.category, "Usage");
            assert_eq!(d.severity, Severity::Warning);
            assert!(d.enabled);
        }
    }

    #[test]
    fn test_format_substitutes_positional_args() {
        let catalog = Catalog::builtin();
        let message = catalog
            .get(DiagnosticId::DontUseFindAll)
            .format(&["FindAll", "Spinner"]);
        assert_eq!(
            message,
            "EntityList.FindAll<Spinner> scans every entity; use Tracker.GetEntities<Spinner> instead"
        );
    }

    #[test]
    fn test_overrides() {
        let mut rules = BTreeMap::new();
        rules.insert(
            "CL0015".to_string(),
            RuleOverride {
                enabled: Some(false),
                severity: None,
            },
        );
        rules.insert(
            "HooksShouldBeStatic".to_string(),
            RuleOverride {
                enabled: None,
                severity: Some(Severity::Error),
            },
        );
        let catalog = Catalog::builtin().with_overrides(&rules).unwrap();
        assert!(!catalog.is_enabled(DiagnosticId::DontUseFindAll));
        assert_eq!(
            catalog.get(DiagnosticId::HooksShouldBeStatic).severity,
            Severity::Error
        );
        // the builtin table is untouched
        assert!(Catalog::builtin().is_enabled(DiagnosticId::DontUseFindAll));
    }

    #[test]
    fn test_unknown_override_rejected() {
        let mut rules = BTreeMap::new();
        rules.insert("Bogus".to_string(), RuleOverride::default());
        assert!(Catalog::builtin().with_overrides(&rules).is_err());
    }

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_string(&DiagnosticId::InvalidTrackedAs).unwrap();
        assert_eq!(json, "\"CL0017\"");
        let back: DiagnosticId = serde_json::from_str("\"InvalidTrackedAs\"").unwrap();
        assert_eq!(back, DiagnosticId::InvalidTrackedAs);
    }
}
