//! Hook registration checks.
//!
//! Covers runtime detours (`new Hook(target, replacement)`) and generated
//! event hooks (`On.Celeste.Player.Update += ...`, `IL.…`). For each
//! resolved replacement the rule checks that it is static, that it calls
//! `orig`, and that coroutine hooks do not yield `orig(...)` as one element.

use tracing::trace;

use crate::model::{MethodId, MethodKind, NodeId, NodeKind, SymbolRef};

use super::context::RuleContext;
use super::query;
use super::registry::{Event, EventKind, Rule};
use super::DiagnosticId;

/// A resolved hook replacement.
#[derive(Debug, Clone, Copy)]
struct HookSite {
    target: MethodId,
    /// Method declaration or anonymous function node.
    declaration: NodeId,
    body: Option<NodeId>,
    is_static: bool,
    is_sequence_producing: bool,
}

pub struct HookRule;

impl Rule for HookRule {
    fn name(&self) -> &'static str {
        "hooks"
    }

    fn supported_diagnostics(&self) -> &'static [DiagnosticId] {
        &[
            DiagnosticId::HooksShouldBeStatic,
            DiagnosticId::CallOrigInHooks,
            DiagnosticId::DontYieldReturnOrig,
        ]
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::ObjectCreation, EventKind::EventAssignment]
    }

    fn check(&self, cx: &RuleContext<'_>, event: Event) {
        let site = match event {
            Event::ObjectCreation(node) => detour_site(cx, node),
            Event::EventAssignment(node) => event_hook_site(cx, node),
            _ => None,
        };
        if let Some(site) = site {
            check_site(cx, &site);
        }
    }
}

/// `new Hook(target, replacement)`.
fn detour_site(cx: &RuleContext<'_>, node: NodeId) -> Option<HookSite> {
    let program = cx.program;
    let NodeKind::ObjectCreation {
        arguments,
        created: Some(created),
        ..
    } = &program.node(node).kind
    else {
        return None;
    };
    if program.full_type_name(*created) != cx.names.hook || arguments.len() != 2 {
        return None;
    }
    resolve_site(cx, node, arguments[1])
}

/// `X.Y.Z.Event += replacement` where the event lives under a hook namespace.
fn event_hook_site(cx: &RuleContext<'_>, node: NodeId) -> Option<HookSite> {
    let program = cx.program;
    let NodeKind::Assignment { left, right, .. } = &program.node(node).kind else {
        return None;
    };
    let event = match program.node(*left).kind.referenced_symbol() {
        Some(SymbolRef::Event(event)) => event,
        _ => return None,
    };
    let root = query::bottommost_namespace(program, SymbolRef::Event(event))?;
    let root_name = &program.namespace(root).name;
    if !cx.names.hook_namespaces.iter().any(|n| n == root_name) {
        return None;
    }
    resolve_site(cx, node, *right)
}

/// Resolve the replacement argument to a method with source.
fn resolve_site(cx: &RuleContext<'_>, registration: NodeId, argument: NodeId) -> Option<HookSite> {
    let program = cx.program;
    let (target, declaration) = match &program.node(argument).kind {
        NodeKind::Identifier { .. } => {
            let resolved = query::resolve_identifier_to_declaration(program, argument);
            if resolved.is_none() {
                trace!(registration = %registration, "hook target has no source, skipping");
            }
            resolved?
        }
        NodeKind::AnonymousFunction { symbol, .. } => ((*symbol)?, argument),
        _ => return None,
    };

    let method = program.method(target);
    Some(HookSite {
        target,
        declaration,
        body: program.node(declaration).kind.body(),
        is_static: method.is_static,
        is_sequence_producing: query::is_sequence_type(program, method.return_type, cx.names),
    })
}

fn check_site(cx: &RuleContext<'_>, site: &HookSite) {
    let program = cx.program;
    let method = program.method(site.target);

    if !site.is_static {
        let name = match method.kind {
            MethodKind::AnonymousFunction => "lambda",
            _ => method.name.as_str(),
        };
        cx.report(DiagnosticId::HooksShouldBeStatic, site.declaration, &[name]);
    }

    let Some(orig) = method.parameters.first() else {
        return;
    };
    if let Some(ty) = orig.ty {
        if program.full_type_name(ty) == cx.names.il_context {
            return;
        }
    }
    let Some(body) = site.body else {
        trace!(method = %method.name, "hook has no body, skipping orig checks");
        return;
    };

    // Any invocation of orig anywhere in the body is enough, for plain and
    // coroutine hooks alike.
    let calls_orig = program
        .descendants(body)
        .into_iter()
        .any(|n| query::is_invocation_of(program, n, &orig.name));
    if !calls_orig {
        let type_name = orig
            .ty
            .map(|t| query::type_name(program, t).to_string())
            .unwrap_or_else(|| "?".to_string());
        cx.report(
            DiagnosticId::CallOrigInHooks,
            site.declaration,
            &[orig.name.as_str(), type_name.as_str()],
        );
    }

    if site.is_sequence_producing {
        check_yielded_orig(cx, body, &orig.name);
    }
}

/// Flag `yield return orig(...)` in the body, not descending into nested functions.
fn check_yielded_orig(cx: &RuleContext<'_>, body: NodeId, orig: &str) {
    let program = cx.program;
    for node in program.descendants_until(body, NodeKind::is_function_boundary) {
        let NodeKind::YieldReturn { expression } = &program.node(node).kind else {
            continue;
        };
        let mut inner = *expression;
        while let NodeKind::Parenthesized { expression } = &program.node(inner).kind {
            inner = *expression;
        }
        if query::is_invocation_of(program, inner, orig) {
            cx.report(DiagnosticId::DontYieldReturnOrig, node, &[orig]);
        }
    }
}
