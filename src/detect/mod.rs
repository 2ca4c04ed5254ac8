//! Diagnostic catalog, rules and the engine that runs them.

mod catalog;
mod context;
mod entity;
mod entity_ids;
mod hooks;
mod il_cursor;
pub mod query;
mod registry;
mod runner;
mod suppress;
mod tracker;
mod types;

pub use catalog::{Catalog, Descriptor, DiagnosticId};
pub use context::{Collector, DiagnosticSink, RuleContext};
pub use entity::EntityRule;
pub use entity_ids::{parse_entity_id, EntityId};
pub use hooks::HookRule;
pub use il_cursor::IlCursorRule;
pub use registry::{Event, EventKind, Registry, Rule};
pub use runner::{collect_events, Runner};
pub use suppress::{
    collect_suppressions, filter_suppressed, matches_suppression, parse_suppressions,
    SuppressedDiagnostic, Suppression, SuppressionType,
};
pub use tracker::TrackerRule;
pub use types::{AnalysisResult, Diagnostic, Severity};
