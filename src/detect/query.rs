//! Reusable predicates over the program model.
//!
//! Every helper is total: unresolved input yields `false` / `None`.

use crate::config::FrameworkNames;
use crate::model::{AttributeData, MethodId, NamespaceId, NodeId, NodeKind, Program, SymbolRef, TypeId};

/// Whether `ty` is `name` or derives from it through base classes.
///
/// Interfaces are not considered. The walk stops at a type with no base, and
/// is bounded by the number of types so a malformed cyclic chain terminates.
pub fn extends(program: &Program, ty: TypeId, name: &str) -> bool {
    let mut current = Some(ty);
    let mut steps = 0;
    while let Some(t) = current {
        if program.full_type_name(t) == name {
            return true;
        }
        steps += 1;
        if steps > program.types.len() {
            return false;
        }
        current = program.type_symbol(t).base;
    }
    false
}

/// Type that declares `symbol` (the type itself for a type symbol).
fn owning_type(program: &Program, symbol: SymbolRef) -> Option<TypeId> {
    match symbol {
        SymbolRef::Type(t) => Some(t),
        SymbolRef::Method(m) => program.method(m).containing_type,
        SymbolRef::Property(p) => Some(program.property(p).containing_type),
        SymbolRef::Event(e) => Some(program.event(e).containing_type),
    }
}

/// Outermost non-global namespace containing `symbol`.
pub fn bottommost_namespace(program: &Program, symbol: SymbolRef) -> Option<NamespaceId> {
    let mut ty = owning_type(program, symbol)?;
    let mut steps = 0;
    while let Some(outer) = program.type_symbol(ty).containing_type {
        steps += 1;
        if steps > program.types.len() {
            return None;
        }
        ty = outer;
    }

    let mut ns = program.type_symbol(ty).namespace?;
    let mut steps = 0;
    while let Some(parent) = program.namespace(ns).parent {
        steps += 1;
        if steps > program.namespaces.len() {
            return None;
        }
        ns = parent;
    }
    Some(ns)
}

/// First attribute on `ty` whose class is `class_name`.
pub fn find_attribute<'a>(program: &'a Program, ty: TypeId, class_name: &str) -> Option<&'a AttributeData> {
    program
        .type_symbol(ty)
        .attributes
        .iter()
        .find(|a| program.full_type_name(a.class) == class_name)
}

/// Whether `ty` carries `[Tracked]` or `[TrackedAs]` directly.
pub fn is_tracked(program: &Program, ty: TypeId, names: &FrameworkNames) -> bool {
    find_attribute(program, ty, &names.tracked_attribute).is_some()
        || find_attribute(program, ty, &names.tracked_as_attribute).is_some()
}

/// Whether `symbol` is declared by the compilation under analysis.
pub fn is_source_local(program: &Program, symbol: SymbolRef) -> bool {
    owning_type(program, symbol)
        .map(|t| program.type_symbol(t).assembly == program.assembly)
        .unwrap_or(false)
}

/// Resolve a bare identifier to the method it names and that method's declaration.
///
/// Fails when the identifier is unbound, names something other than a
/// method, or the method has no source in this compilation.
pub fn resolve_identifier_to_declaration(program: &Program, identifier: NodeId) -> Option<(MethodId, NodeId)> {
    let NodeKind::Identifier {
        symbol: Some(SymbolRef::Method(method)),
        ..
    } = &program.node(identifier).kind
    else {
        return None;
    };
    let declaration = program.method(*method).declaration?;
    Some((*method, declaration))
}

/// Whether `ty` is one of the configured sequence-producing return types.
pub fn is_sequence_type(program: &Program, ty: Option<TypeId>, names: &FrameworkNames) -> bool {
    match ty {
        Some(t) => {
            let name = program.full_type_name(t);
            names.sequence_types.iter().any(|s| *s == name)
        }
        None => false,
    }
}

/// Whether `node` is an invocation whose callee text is exactly `name`.
pub fn is_invocation_of(program: &Program, node: NodeId, name: &str) -> bool {
    match &program.node(node).kind {
        NodeKind::Invocation { callee, .. } => {
            program.expression_text(*callee).as_deref() == Some(name)
        }
        _ => false,
    }
}

/// Simple name of a type, for messages.
pub fn type_name(program: &Program, ty: TypeId) -> &str {
    &program.type_symbol(ty).name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FrameworkStubs, MethodSpec, ProgramBuilder};

    #[test]
    fn test_extends_walks_base_chain() {
        let names = FrameworkNames::default();
        let mut b = ProgramBuilder::new("Mod");
        let fw = FrameworkStubs::install(&mut b, &names);
        let solid = b.external_type("Celeste.Solid", "Celeste", Some(fw.entity));
        let block = b.class("Example.FallingBlock", Some(solid));
        let plain = b.class("Example.Settings", None);
        let program = b.finish();

        assert!(extends(&program, block, "Monocle.Entity"));
        assert!(extends(&program, block, "Example.FallingBlock"));
        assert!(!extends(&program, plain, "Monocle.Entity"));
    }

    #[test]
    fn test_extends_terminates_on_cycle() {
        let mut b = ProgramBuilder::new("Mod");
        let a = b.class("A", None);
        let c = b.class("C", Some(a));
        let mut program = b.finish();
        program.types[a.index()].base = Some(c);
        assert!(!extends(&program, a, "Missing"));
    }

    #[test]
    fn test_bottommost_namespace() {
        let names = FrameworkNames::default();
        let mut b = ProgramBuilder::new("Mod");
        let fw = FrameworkStubs::install(&mut b, &names);
        let event = fw.hook_event(&mut b, "On.Celeste.Player", "Update");
        let global = b.class("Loose", None);
        let program = b.finish();

        let root = bottommost_namespace(&program, SymbolRef::Event(event)).unwrap();
        assert_eq!(program.namespace(root).name, "On");
        assert_eq!(bottommost_namespace(&program, SymbolRef::Type(global)), None);
    }

    #[test]
    fn test_is_tracked_and_source_local() {
        let names = FrameworkNames::default();
        let mut b = ProgramBuilder::new("Mod");
        let fw = FrameworkStubs::install(&mut b, &names);
        let tracked = b.class("Example.Spinner", Some(fw.entity));
        b.attribute(tracked, fw.tracked_attribute, vec![]);
        let untracked = b.class("Example.Cloud", Some(fw.entity));
        let program = b.finish();

        assert!(is_tracked(&program, tracked, &names));
        assert!(!is_tracked(&program, untracked, &names));
        assert!(is_source_local(&program, SymbolRef::Type(untracked)));
        assert!(!is_source_local(&program, SymbolRef::Type(fw.entity)));
    }

    #[test]
    fn test_resolve_identifier_requires_source() {
        let mut b = ProgramBuilder::new("Mod");
        let ty = b.class("Example.Hooks", None);
        let with_source = b.method(ty, MethodSpec::new("OnUpdate"), None);
        let without_source = b.external_method(ty, MethodSpec::new("Elsewhere"));
        let a = b.reference("OnUpdate", SymbolRef::Method(with_source));
        let c = b.reference("Elsewhere", SymbolRef::Method(without_source));
        let unbound = b.ident("Nothing");
        let program = b.finish();

        let (method, decl) = resolve_identifier_to_declaration(&program, a).unwrap();
        assert_eq!(method, with_source);
        assert!(matches!(program.node(decl).kind, NodeKind::Method { .. }));
        assert!(resolve_identifier_to_declaration(&program, c).is_none());
        assert!(resolve_identifier_to_declaration(&program, unbound).is_none());
    }
}
