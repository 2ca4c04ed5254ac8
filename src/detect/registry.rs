//! Rule trait, event kinds and the subscription table.

use std::collections::HashMap;

use crate::model::{NodeId, TypeId};

use super::context::RuleContext;
use super::DiagnosticId;

/// Kinds of events raised while walking a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A type declared in source.
    NamedType,
    Invocation,
    ObjectCreation,
    /// `+=` / `-=` whose left side is an event.
    EventAssignment,
    /// A name expression bound to a property.
    PropertyReference,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NamedType => "named_type",
            EventKind::Invocation => "invocation",
            EventKind::ObjectCreation => "object_creation",
            EventKind::EventAssignment => "event_assignment",
            EventKind::PropertyReference => "property_reference",
        }
    }
}

/// One raised event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    NamedType(TypeId),
    Invocation(NodeId),
    ObjectCreation(NodeId),
    EventAssignment(NodeId),
    PropertyReference(NodeId),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::NamedType(_) => EventKind::NamedType,
            Event::Invocation(_) => EventKind::Invocation,
            Event::ObjectCreation(_) => EventKind::ObjectCreation,
            Event::EventAssignment(_) => EventKind::EventAssignment,
            Event::PropertyReference(_) => EventKind::PropertyReference,
        }
    }
}

/// An independent analysis rule.
///
/// Rules are stateless and may be invoked concurrently for different events.
pub trait Rule: Send + Sync {
    /// Rule name for logging.
    fn name(&self) -> &'static str;

    /// Ids this rule may report.
    fn supported_diagnostics(&self) -> &'static [DiagnosticId];

    /// Event kinds this rule wants to see.
    fn subscriptions(&self) -> &'static [EventKind];

    /// Inspect one event and report through `cx`.
    fn check(&self, cx: &RuleContext<'_>, event: Event);
}

/// Rules plus the event-kind subscription table.
#[derive(Default)]
pub struct Registry {
    rules: Vec<Box<dyn Rule>>,
    table: HashMap<EventKind, Vec<usize>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in rule.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(super::hooks::HookRule)
            .register(super::il_cursor::IlCursorRule)
            .register(super::entity::EntityRule)
            .register(super::tracker::TrackerRule);
        registry
    }

    pub fn register<R: Rule + 'static>(&mut self, rule: R) -> &mut Self {
        let index = self.rules.len();
        for &kind in rule.subscriptions() {
            self.table.entry(kind).or_default().push(index);
        }
        self.rules.push(Box::new(rule));
        self
    }

    /// Rules subscribed to `kind`, in registration order.
    pub fn subscribers(&self, kind: EventKind) -> impl Iterator<Item = &dyn Rule> {
        self.table
            .get(&kind)
            .into_iter()
            .flatten()
            .map(move |&i| self.rules[i].as_ref())
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.table.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_subscriptions() {
        let registry = Registry::builtin();
        let names: Vec<_> = registry
            .subscribers(EventKind::NamedType)
            .map(|r| r.name())
            .collect();
        assert_eq!(names, vec!["entity", "tracker"]);

        let names: Vec<_> = registry
            .subscribers(EventKind::Invocation)
            .map(|r| r.name())
            .collect();
        assert_eq!(names, vec!["il_cursor", "tracker"]);
        assert!(registry.is_subscribed(EventKind::PropertyReference));
    }

    #[test]
    fn test_every_id_has_a_rule() {
        let registry = Registry::builtin();
        for id in DiagnosticId::ALL {
            assert!(
                registry.rules().any(|r| r.supported_diagnostics().contains(&id)),
                "no rule reports {}",
                id.name()
            );
        }
    }
}
