//! Tracker consistency: `[TrackedAs]` targets, tracker queries on untracked
//! types, and entity-list scans that the tracker could answer.

use crate::model::{AttributeArgument, MethodKind, NodeId, NodeKind, SymbolRef, TypeId};

use super::context::RuleContext;
use super::query;
use super::registry::{Event, EventKind, Rule};
use super::DiagnosticId;

pub struct TrackerRule;

impl Rule for TrackerRule {
    fn name(&self) -> &'static str {
        "tracker"
    }

    fn supported_diagnostics(&self) -> &'static [DiagnosticId] {
        &[
            DiagnosticId::DontUseFindAll,
            DiagnosticId::TrackerUsedOnUntrackedType,
            DiagnosticId::InvalidTrackedAs,
        ]
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::NamedType, EventKind::Invocation]
    }

    fn check(&self, cx: &RuleContext<'_>, event: Event) {
        match event {
            Event::NamedType(ty) => check_tracked_as(cx, ty),
            Event::Invocation(node) => check_invocation(cx, node),
            _ => {}
        }
    }
}

fn check_tracked_as(cx: &RuleContext<'_>, ty: TypeId) {
    let program = cx.program;
    let Some(attribute) = query::find_attribute(program, ty, &cx.names.tracked_as_attribute) else {
        return;
    };
    let [AttributeArgument::Type(target)] = attribute.arguments.as_slice() else {
        return;
    };
    let target_name = program.full_type_name(*target);
    if query::extends(program, ty, &target_name) {
        return;
    }

    let symbol = program.type_symbol(ty);
    let Some(at) = attribute.syntax.or(symbol.declaration) else {
        return;
    };
    cx.report(
        DiagnosticId::InvalidTrackedAs,
        at,
        &[symbol.name.as_str(), query::type_name(program, *target)],
    );
}

fn check_invocation(cx: &RuleContext<'_>, node: NodeId) {
    let program = cx.program;
    let names = cx.names;
    let NodeKind::Invocation {
        target: Some(target),
        type_arguments,
        ..
    } = &program.node(node).kind
    else {
        return;
    };
    let method = program.method(*target);
    if method.kind != MethodKind::Ordinary {
        return;
    }
    let Some(owner) = method.containing_type else {
        return;
    };
    // Non-generic calls say nothing about a type.
    let Some(&used) = type_arguments.first() else {
        return;
    };

    let owner_name = program.full_type_name(owner);
    let name = method.name.as_str();
    let used_name = query::type_name(program, used);

    if owner_name == names.tracker {
        if names.tracker_checks.iter().any(|c| c == name) {
            return;
        }
        if !query::is_tracked(program, used, names) {
            cx.report(DiagnosticId::TrackerUsedOnUntrackedType, node, &[used_name, name]);
        }
    } else if owner_name == names.entity_list && names.entity_list_scans.iter().any(|s| s == name) {
        if query::is_tracked(program, used, names)
            || query::is_source_local(program, SymbolRef::Type(used))
        {
            cx.report(DiagnosticId::DontUseFindAll, node, &[name, used_name]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, FrameworkNames};
    use crate::detect::{Diagnostic, Runner};
    use crate::model::{FrameworkStubs, MethodId, Program, ProgramBuilder};

    fn analyze(program: &Program) -> Vec<Diagnostic> {
        Runner::new(Config::default()).unwrap().analyze(program)
    }

    fn ids(diagnostics: &[Diagnostic]) -> Vec<DiagnosticId> {
        diagnostics.iter().map(|d| d.id).collect()
    }

    fn setup() -> (ProgramBuilder, FrameworkStubs) {
        let mut b = ProgramBuilder::new("Mod");
        let fw = FrameworkStubs::install(&mut b, &FrameworkNames::default());
        b.file("Level.cs");
        (b, fw)
    }

    /// `receiver.<name><T>()` bound to `method`.
    fn generic_call(b: &mut ProgramBuilder, receiver: &str, name: &str, method: MethodId, ty: TypeId) -> NodeId {
        let receiver = b.ident(receiver);
        let callee = b.member(receiver, name, None);
        b.call(callee, method, vec![ty], vec![])
    }

    #[test]
    fn test_tracked_as_must_extend_target() {
        let (mut b, fw) = setup();
        let solid = b.external_type("Celeste.Solid", "Celeste", Some(fw.entity));
        let good = b.class("Example.Block", Some(solid));
        b.attribute(good, fw.tracked_as_attribute, vec![AttributeArgument::Type(solid)]);
        let bad = b.class("Example.Cloud", Some(fw.entity));
        let attribute = b.attribute(bad, fw.tracked_as_attribute, vec![AttributeArgument::Type(solid)]);
        let program = b.finish();

        let diagnostics = analyze(&program);
        assert_eq!(ids(&diagnostics), vec![DiagnosticId::InvalidTrackedAs]);
        assert_eq!(diagnostics[0].location, program.location(attribute));
        assert_eq!(diagnostics[0].message, "'Cloud' is tracked as 'Solid' but does not extend it");
    }

    #[test]
    fn test_tracked_as_with_extra_arguments_ignored() {
        let (mut b, fw) = setup();
        let solid = b.external_type("Celeste.Solid", "Celeste", Some(fw.entity));
        let ty = b.class("Example.Cloud", Some(fw.entity));
        b.attribute(
            ty,
            fw.tracked_as_attribute,
            vec![AttributeArgument::Type(solid), AttributeArgument::Bool(true)],
        );
        assert!(analyze(&b.finish()).is_empty());
    }

    #[test]
    fn test_tracker_query_on_untracked_type() {
        let (mut b, fw) = setup();
        let tracked = b.class("Example.Spinner", Some(fw.entity));
        b.attribute(tracked, fw.tracked_attribute, vec![]);
        let untracked = b.class("Example.Cloud", Some(fw.entity));

        let get = fw.tracker_method(&mut b, "GetEntities");
        generic_call(&mut b, "tracker", "GetEntities", get, tracked);
        let call = generic_call(&mut b, "tracker", "GetEntities", get, untracked);
        let check = fw.tracker_method(&mut b, "IsEntityTracked");
        generic_call(&mut b, "tracker", "IsEntityTracked", check, untracked);
        let program = b.finish();

        let diagnostics = analyze(&program);
        assert_eq!(ids(&diagnostics), vec![DiagnosticId::TrackerUsedOnUntrackedType]);
        assert_eq!(diagnostics[0].location, program.location(call));
        assert_eq!(diagnostics[0].args, vec!["Cloud", "GetEntities"]);
    }

    #[test]
    fn test_find_all_on_markable_type() {
        let (mut b, fw) = setup();
        let local = b.class("Example.Cloud", Some(fw.entity));
        let player = b.external_type("Celeste.Player", "Celeste", Some(fw.entity));
        let find_all = fw.entity_list_method(&mut b, "FindAll");
        let find_first = fw.entity_list_method(&mut b, "FindFirst");
        generic_call(&mut b, "Entities", "FindAll", find_all, local);
        generic_call(&mut b, "Entities", "FindFirst", find_first, player);
        let program = b.finish();

        let diagnostics = analyze(&program);
        assert_eq!(ids(&diagnostics), vec![DiagnosticId::DontUseFindAll]);
        assert_eq!(
            diagnostics[0].message,
            "EntityList.FindAll<Cloud> scans every entity; use Tracker.GetEntities<Cloud> instead"
        );
    }

    #[test]
    fn test_find_first_on_tracked_external_type() {
        let (mut b, fw) = setup();
        let player = b.external_type("Celeste.Player", "Celeste", Some(fw.entity));
        b.attribute(player, fw.tracked_attribute, vec![]);
        let find_first = fw.entity_list_method(&mut b, "FindFirst");
        generic_call(&mut b, "Entities", "FindFirst", find_first, player);
        let diagnostics = analyze(&b.finish());
        assert_eq!(ids(&diagnostics), vec![DiagnosticId::DontUseFindAll]);
    }
}
