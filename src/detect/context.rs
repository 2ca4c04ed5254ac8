//! Per-event rule context and the diagnostic sink.

use std::sync::Mutex;

use crate::config::FrameworkNames;
use crate::model::{Location, NodeId, Program};

use super::{Catalog, Diagnostic, DiagnosticId};

/// Append-only, thread-safe destination for diagnostics.
pub trait DiagnosticSink: Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// A sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct Collector {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiagnosticSink for Collector {
    fn report(&self, diagnostic: Diagnostic) {
        let mut diagnostics = self
            .diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        diagnostics.push(diagnostic);
    }
}

/// Read-only view handed to a rule for one event.
pub struct RuleContext<'a> {
    pub program: &'a Program,
    pub names: &'a FrameworkNames,
    catalog: &'a Catalog,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        program: &'a Program,
        names: &'a FrameworkNames,
        catalog: &'a Catalog,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            program,
            names,
            catalog,
            sink,
        }
    }

    /// Report `id` at the span of `node`.
    pub fn report(&self, id: DiagnosticId, node: NodeId, args: &[&str]) {
        self.report_at(id, self.program.location(node), args);
    }

    /// Report `id` at an explicit location. Disabled ids are dropped.
    pub fn report_at(&self, id: DiagnosticId, location: Location, args: &[&str]) {
        let descriptor = self.catalog.get(id);
        if !descriptor.enabled {
            return;
        }
        self.sink.report(Diagnostic {
            id,
            severity: descriptor.severity,
            message: descriptor.format(args),
            location,
            args: args.iter().map(|a| a.to_string()).collect(),
        });
    }
}
