//! Analysis runner: raises events and dispatches them to subscribed rules.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

use crate::config::Config;
use crate::model::{AssignmentOperator, NodeKind, Program, SymbolRef};

use super::context::{Collector, RuleContext};
use super::registry::{Event, Registry};
use super::{collect_suppressions, filter_suppressed, AnalysisResult, Catalog, Diagnostic};

/// Executes every registered rule against a program.
pub struct Runner {
    registry: Registry,
    catalog: Catalog,
    config: Config,
    base_dir: Option<PathBuf>,
}

impl Runner {
    /// Create a runner with the built-in rules and `config`'s catalog overrides.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let catalog = Catalog::builtin().with_overrides(&config.rules)?;
        Ok(Self {
            registry: Registry::builtin(),
            catalog,
            config,
            base_dir: None,
        })
    }

    /// Replace the rule set.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Directory that source paths in the model are relative to.
    pub fn base_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every rule and return the raw, sorted and deduplicated diagnostics.
    pub fn analyze(&self, program: &Program) -> Vec<Diagnostic> {
        let events: Vec<Event> = collect_events(program)
            .into_iter()
            .filter(|e| self.registry.is_subscribed(e.kind()))
            .collect();
        debug!(events = events.len(), nodes = program.nodes.len(), "dispatching events");

        let sink = Collector::new();
        let cx = RuleContext::new(program, &self.config.framework, &self.catalog, &sink);
        events.par_iter().for_each(|&event| {
            for rule in self.registry.subscribers(event.kind()) {
                rule.check(&cx, event);
            }
        });

        let mut diagnostics = sink.into_diagnostics();
        sort_and_dedup(&mut diagnostics);
        debug!(diagnostics = diagnostics.len(), "analysis finished");
        diagnostics
    }

    /// Analyze, then apply path exclusions and inline suppressions.
    pub fn run(&self, program: &Program) -> AnalysisResult {
        let (diagnostics, excluded): (Vec<_>, Vec<_>) = self
            .analyze(program)
            .into_iter()
            .partition(|d| !self.config.is_path_excluded(d.file()));

        let suppressions = collect_suppressions(program, self.base_dir.as_deref(), &diagnostics);
        let (diagnostics, suppressed) = if suppressions.is_empty() {
            (diagnostics, Vec::new())
        } else {
            filter_suppressed(diagnostics, &suppressions)
        };

        AnalysisResult {
            diagnostics,
            suppressed,
            excluded: excluded.len(),
            models: 1,
        }
    }
}

/// Walk the program once, in arena order, and raise every event.
pub fn collect_events(program: &Program) -> Vec<Event> {
    let mut events: Vec<Event> = program
        .type_ids()
        .filter(|&t| program.type_symbol(t).declaration.is_some())
        .map(Event::NamedType)
        .collect();

    for id in program.node_ids() {
        let event = match &program.node(id).kind {
            NodeKind::Invocation { .. } => Some(Event::Invocation(id)),
            NodeKind::ObjectCreation { .. } => Some(Event::ObjectCreation(id)),
            NodeKind::Assignment {
                operator: AssignmentOperator::AddAssign | AssignmentOperator::SubtractAssign,
                left,
                ..
            } => match program.node(*left).kind.referenced_symbol() {
                Some(SymbolRef::Event(_)) => Some(Event::EventAssignment(id)),
                _ => None,
            },
            NodeKind::Identifier {
                symbol: Some(SymbolRef::Property(_)),
                ..
            }
            | NodeKind::MemberAccess {
                symbol: Some(SymbolRef::Property(_)),
                ..
            } => Some(Event::PropertyReference(id)),
            _ => None,
        };
        events.extend(event);
    }

    events
}

/// Order by (file, start offset, code, message) and drop exact repeats.
fn sort_and_dedup(diagnostics: &mut Vec<Diagnostic>) {
    diagnostics.sort_by(|a, b| {
        (a.file(), a.location.span.start_byte, a.id.code(), &a.message).cmp(&(
            b.file(),
            b.location.span.start_byte,
            b.id.code(),
            &b.message,
        ))
    });
    diagnostics.dedup_by(|a, b| a.key() == b.key());
}
