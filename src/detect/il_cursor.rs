//! Bytecode-cursor misuse: emitted delegates, instruction removal and long
//! navigation predicate chains.

use crate::model::{MethodId, MethodKind, NodeId, NodeKind, Program, SymbolRef};

use super::context::RuleContext;
use super::registry::{Event, EventKind, Rule};
use super::DiagnosticId;

pub struct IlCursorRule;

impl Rule for IlCursorRule {
    fn name(&self) -> &'static str {
        "il_cursor"
    }

    fn supported_diagnostics(&self) -> &'static [DiagnosticId] {
        &[
            DiagnosticId::DontUseLambdas,
            DiagnosticId::DontEmitInstanceMethods,
            DiagnosticId::DontUseCursorRemove,
            DiagnosticId::DontChainPredicatesInCursorGoto,
        ]
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::Invocation]
    }

    fn check(&self, cx: &RuleContext<'_>, event: Event) {
        let Event::Invocation(node) = event else {
            return;
        };
        let program = cx.program;
        let NodeKind::Invocation {
            arguments,
            target: Some(target),
            ..
        } = &program.node(node).kind
        else {
            return;
        };

        let method = program.method(*target);
        if method.kind != MethodKind::Ordinary {
            return;
        }
        match method.containing_type {
            Some(owner) if program.full_type_name(owner) == cx.names.il_cursor => {}
            _ => return,
        }

        let cursor = &cx.names.cursor;
        let name = method.name.as_str();
        if name == cursor.emit_delegate {
            if let [argument] = arguments.as_slice() {
                check_emitted(cx, name, *argument);
            }
        } else if cursor.remove.iter().any(|r| r == name) {
            cx.report(DiagnosticId::DontUseCursorRemove, node, &[name]);
        } else if cursor.navigation.iter().any(|n| n == name)
            && arguments.len() >= cursor.chained_predicate_threshold
        {
            let count = arguments.len().to_string();
            cx.report(DiagnosticId::DontChainPredicatesInCursorGoto, node, &[name, &count]);
        }
    }
}

/// The delegate handed to `EmitDelegate` must be a static method group.
fn check_emitted(cx: &RuleContext<'_>, emit: &str, argument: NodeId) {
    let program = cx.program;
    match &program.node(argument).kind {
        // static lambdas included
        NodeKind::AnonymousFunction { .. } => {
            cx.report(DiagnosticId::DontUseLambdas, argument, &[emit]);
        }
        NodeKind::Identifier {
            name,
            symbol: Some(SymbolRef::Method(method)),
        } => {
            if is_instance_method(program, *method) {
                cx.report(DiagnosticId::DontEmitInstanceMethods, argument, &[name.as_str(), emit]);
            }
        }
        _ => {}
    }
}

fn is_instance_method(program: &Program, method: MethodId) -> bool {
    let method = program.method(method);
    matches!(method.kind, MethodKind::Ordinary | MethodKind::LocalFunction) && !method.is_static
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, FrameworkNames};
    use crate::detect::{Diagnostic, Runner};
    use crate::model::{FrameworkStubs, MethodSpec, ProgramBuilder, TypeId};

    fn analyze(program: &Program) -> Vec<Diagnostic> {
        Runner::new(Config::default()).unwrap().analyze(program)
    }

    fn setup() -> (ProgramBuilder, FrameworkStubs, TypeId) {
        let mut b = ProgramBuilder::new("Mod");
        let fw = FrameworkStubs::install(&mut b, &FrameworkNames::default());
        b.file("Patches.cs");
        let ty = b.class("Example.Patches", None);
        (b, fw, ty)
    }

    /// `cursor.<name>(args)` bound to the cursor method.
    fn cursor_call(b: &mut ProgramBuilder, fw: &FrameworkStubs, name: &str, args: Vec<NodeId>) -> NodeId {
        let cursor = b.ident("cursor");
        let callee = b.member(cursor, name, None);
        let method = fw.cursor_method(b, name);
        b.call(callee, method, vec![], args)
    }

    #[test]
    fn test_emit_lambda_flagged_even_when_static() {
        let (mut b, fw, _) = setup();
        let body = b.block(vec![]);
        let lambda = b.lambda(MethodSpec::new("").modifiers(&["static"]), body);
        cursor_call(&mut b, &fw, "EmitDelegate", vec![lambda]);
        let program = b.finish();

        let diagnostics = analyze(&program);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, DiagnosticId::DontUseLambdas);
        assert_eq!(diagnostics[0].location, program.location(lambda));
        assert_eq!(
            diagnostics[0].message,
            "Lambda passed to EmitDelegate; pass a static method instead"
        );
    }

    #[test]
    fn test_emit_method_group() {
        let (mut b, fw, ty) = setup();
        let instance = b.method(ty, MethodSpec::new("Adjust"), None);
        let fixed = b.method(ty, MethodSpec::new("Clamp").modifiers(&["static"]), None);
        let a = b.reference("Adjust", SymbolRef::Method(instance));
        cursor_call(&mut b, &fw, "EmitDelegate", vec![a]);
        let c = b.reference("Clamp", SymbolRef::Method(fixed));
        cursor_call(&mut b, &fw, "EmitDelegate", vec![c]);
        let program = b.finish();

        let diagnostics = analyze(&program);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, DiagnosticId::DontEmitInstanceMethods);
        assert_eq!(diagnostics[0].args, vec!["Adjust", "EmitDelegate"]);
    }

    #[test]
    fn test_emit_local_function() {
        let (mut b, fw, ty) = setup();
        let body = b.block(vec![]);
        let capturing = b.local_function(Some(ty), MethodSpec::new("Adjust"), body);
        let body = b.block(vec![]);
        let pure = b.local_function(Some(ty), MethodSpec::new("Clamp").modifiers(&["static"]), body);
        for (name, decl) in [("Adjust", capturing), ("Clamp", pure)] {
            let method = b.program().node(decl).kind.declared_method().unwrap();
            let arg = b.reference(name, SymbolRef::Method(method));
            cursor_call(&mut b, &fw, "EmitDelegate", vec![arg]);
        }
        let program = b.finish();

        let diagnostics = analyze(&program);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, DiagnosticId::DontEmitInstanceMethods);
        assert_eq!(diagnostics[0].args, vec!["Adjust", "EmitDelegate"]);
    }

    #[test]
    fn test_remove_always_flagged() {
        let (mut b, fw, _) = setup();
        let count = b.literal("3");
        let call = cursor_call(&mut b, &fw, "RemoveRange", vec![count]);
        let program = b.finish();

        let diagnostics = analyze(&program);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, DiagnosticId::DontUseCursorRemove);
        assert_eq!(diagnostics[0].location, program.location(call));
    }

    #[test]
    fn test_navigation_threshold() {
        let (mut b, fw, _) = setup();
        let four: Vec<_> = (0..4).map(|i| b.ident(&format!("p{}", i))).collect();
        cursor_call(&mut b, &fw, "GotoNext", four);
        let five: Vec<_> = (0..5).map(|i| b.ident(&format!("q{}", i))).collect();
        cursor_call(&mut b, &fw, "TryGotoPrev", five);
        let program = b.finish();

        let diagnostics = analyze(&program);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, DiagnosticId::DontChainPredicatesInCursorGoto);
        assert_eq!(diagnostics[0].args, vec!["TryGotoPrev", "5"]);
    }

    #[test]
    fn test_same_name_on_other_type_ignored() {
        let (mut b, _, ty) = setup();
        let other = b.external_method(ty, MethodSpec::new("Remove"));
        let list = b.ident("list");
        let callee = b.member(list, "Remove", None);
        b.call(callee, other, vec![], vec![]);
        assert!(analyze(&b.finish()).is_empty());
    }

    #[test]
    fn test_unbound_invocation_ignored() {
        let (mut b, _, _) = setup();
        let cursor = b.ident("cursor");
        let callee = b.member(cursor, "Remove", None);
        b.invoke(callee, vec![]);
        assert!(analyze(&b.finish()).is_empty());
    }
}
