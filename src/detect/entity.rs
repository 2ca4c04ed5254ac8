//! Custom entity declarations and `Scene` reads during construction.

use tracing::trace;

use crate::config::FrameworkNames;
use crate::model::{AttributeArgument, MethodId, MethodKind, MethodSymbol, NodeId, NodeKind, Program, SymbolRef, TypeId};

use super::context::RuleContext;
use super::entity_ids::{parse_entity_id, EntityId};
use super::query;
use super::registry::{Event, EventKind, Rule};
use super::DiagnosticId;

pub struct EntityRule;

impl Rule for EntityRule {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn supported_diagnostics(&self) -> &'static [DiagnosticId] {
        &[
            DiagnosticId::CustomEntityWithNoValidCtor,
            DiagnosticId::CustomEntityNotExtendingEntity,
            DiagnosticId::CustomEntityGeneratorMethodMissing,
            DiagnosticId::CustomEntityGeneratorInvalidParams,
            DiagnosticId::CustomEntityGeneratorInvalid,
            DiagnosticId::CustomEntityNoIDs,
            DiagnosticId::UsingSceneInWrongPlace,
        ]
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::NamedType, EventKind::PropertyReference]
    }

    fn check(&self, cx: &RuleContext<'_>, event: Event) {
        match event {
            Event::NamedType(ty) => check_declaration(cx, ty),
            Event::PropertyReference(node) => check_scene_read(cx, node),
            _ => {}
        }
    }
}

/// Parameter shapes Everest can call, by configured type name.
fn accepted_shapes(names: &FrameworkNames, generator: bool) -> Vec<Vec<&str>> {
    let mut shapes = vec![
        vec![],
        vec![names.vector2.as_str()],
        vec![names.entity_data.as_str(), names.vector2.as_str()],
        vec![
            names.entity_data.as_str(),
            names.vector2.as_str(),
            names.entity_id.as_str(),
        ],
    ];
    if generator {
        shapes.push(vec![
            names.level.as_str(),
            names.level_data.as_str(),
            names.vector2.as_str(),
            names.entity_data.as_str(),
        ]);
    }
    shapes
}

/// Whether `method`'s parameters match one of the accepted shapes.
///
/// A compiler-supplied parameterless constructor does not count.
fn has_accepted_shape(program: &Program, method: &MethodSymbol, names: &FrameworkNames, generator: bool) -> bool {
    accepted_shapes(names, generator).iter().any(|shape| {
        if shape.is_empty() {
            return method.parameters.is_empty() && !method.is_implicitly_declared;
        }
        shape.len() == method.parameters.len()
            && shape.iter().zip(&method.parameters).all(|(expected, p)| {
                p.ty.map(|t| program.full_type_name(t) == *expected)
                    .unwrap_or(false)
            })
    })
}

/// Raw id strings: the elements of a `params string[]` array, or the
/// positional string arguments when the model lists them flat.
fn raw_ids(arguments: &[AttributeArgument]) -> Vec<&str> {
    match arguments.first() {
        Some(AttributeArgument::Array(items)) => items.iter().filter_map(|a| a.as_text()).collect(),
        _ => arguments
            .iter()
            .filter(|a| matches!(a, AttributeArgument::String(_)))
            .filter_map(|a| a.as_text())
            .collect(),
    }
}

fn check_declaration(cx: &RuleContext<'_>, ty: TypeId) {
    let program = cx.program;
    let names = cx.names;
    let Some(attribute) = query::find_attribute(program, ty, &names.custom_entity_attribute) else {
        return;
    };
    let symbol = program.type_symbol(ty);
    let Some(declaration) = symbol.declaration else {
        return;
    };
    let type_name = symbol.name.as_str();

    if !query::extends(program, ty, &names.entity) {
        cx.report(DiagnosticId::CustomEntityNotExtendingEntity, declaration, &[type_name]);
        return;
    }

    let ids: Vec<EntityId> = raw_ids(&attribute.arguments)
        .into_iter()
        .map(parse_entity_id)
        .collect();
    if ids.is_empty() {
        let at = attribute.syntax.unwrap_or(declaration);
        cx.report(DiagnosticId::CustomEntityNoIDs, at, &[type_name]);
    }

    let mut all_generators = true;
    for id in &ids {
        let Some(generator) = id.generator() else {
            all_generators = false;
            continue;
        };
        check_generator(cx, ty, declaration, generator);
    }

    if all_generators {
        trace!(ty = %type_name, "every id uses a generator, skipping constructor check");
        return;
    }
    let has_ctor = symbol.members.iter().any(|&m| {
        let method = program.method(m);
        method.kind == MethodKind::Constructor && has_accepted_shape(program, method, names, false)
    });
    if !has_ctor {
        cx.report(DiagnosticId::CustomEntityWithNoValidCtor, declaration, &[type_name]);
    }
}

fn check_generator(cx: &RuleContext<'_>, ty: TypeId, declaration: NodeId, name: &str) {
    let program = cx.program;
    let symbol = program.type_symbol(ty);
    let found: Option<MethodId> = symbol
        .members
        .iter()
        .copied()
        .find(|&m| program.method(m).name == name);
    let Some(generator) = found else {
        cx.report(
            DiagnosticId::CustomEntityGeneratorMethodMissing,
            declaration,
            &[name, symbol.name.as_str()],
        );
        return;
    };

    let method = program.method(generator);
    let at = method.declaration.unwrap_or(declaration);
    let returns_entity = method
        .return_type
        .map(|t| query::extends(program, t, &cx.names.entity))
        .unwrap_or(false);
    if !method.is_static || !returns_entity {
        cx.report(DiagnosticId::CustomEntityGeneratorInvalid, at, &[name]);
    }
    if !has_accepted_shape(program, method, cx.names, true) {
        cx.report(DiagnosticId::CustomEntityGeneratorInvalidParams, at, &[name]);
    }
}

/// `Scene` is null until the entity is added, so reading it in a constructor is a bug.
fn check_scene_read(cx: &RuleContext<'_>, node: NodeId) {
    let program = cx.program;
    let Some(SymbolRef::Property(property)) = program.node(node).kind.referenced_symbol() else {
        return;
    };
    let property = program.property(property);
    if property.name != cx.names.scene_property
        || program.full_type_name(property.containing_type) != cx.names.entity
    {
        return;
    }

    let boundary = program
        .ancestors(node)
        .find(|&a| program.node(a).kind.is_function_boundary());
    if let Some(boundary) = boundary {
        if matches!(program.node(boundary).kind, NodeKind::Constructor { .. }) {
            cx.report(DiagnosticId::UsingSceneInWrongPlace, node, &[]);
        }
    }
}
