//! Add the `static` modifier to a hook target.

use tracing::debug;

use crate::detect::{Diagnostic, DiagnosticId};
use crate::model::{NodeId, NodeKind, Program, Span, Token};

use super::{AppliedFix, CodeAction, CodeFix, TextEdit};

const STATIC: &str = "static";

/// Fix for `HooksShouldBeStatic`.
pub struct MakeHookStatic;

impl CodeFix for MakeHookStatic {
    fn fixable_diagnostics(&self) -> &'static [DiagnosticId] {
        &[DiagnosticId::HooksShouldBeStatic]
    }

    fn register(&self, program: &Program, diagnostic: &Diagnostic) -> Option<CodeAction> {
        if diagnostic.id != DiagnosticId::HooksShouldBeStatic {
            return None;
        }
        let target = find_declaration(program, diagnostic)?;
        let kind = &program.node(target).kind;
        let modifiers = kind.modifiers()?;
        if modifiers.iter().any(|t| t.is(STATIC)) {
            return None;
        }
        if let NodeKind::Method {
            modifiers_start: None,
            ..
        } = kind
        {
            if modifiers.is_empty() {
                debug!(node = %target, "no insertion point for static");
                return None;
            }
        }
        Some(CodeAction {
            title: "Make hook static".to_string(),
            equivalence_key: "MakeHookStatic".to_string(),
            file: diagnostic.location.file.clone(),
            target,
        })
    }
}

/// The method or anonymous function whose span is exactly the diagnostic's.
fn find_declaration(program: &Program, diagnostic: &Diagnostic) -> Option<NodeId> {
    let file = program.file_by_path(diagnostic.file())?;
    program.node_ids().find(|&id| {
        let node = program.node(id);
        node.file == file
            && node.span.same_range(&diagnostic.location.span)
            && matches!(
                node.kind,
                NodeKind::Method { .. } | NodeKind::AnonymousFunction { .. }
            )
    })
}

/// Insert `static` into the target's modifier list on a copy of `program`.
pub(super) fn make_static(program: &Program, target: NodeId) -> Option<AppliedFix> {
    let mut fixed = program.clone();
    let node = fixed.node_mut(target);
    let node_span = node.span;

    let (edit, symbol) = match &mut node.kind {
        NodeKind::Method {
            modifiers,
            modifiers_start,
            symbol,
            ..
        } => {
            if modifiers.iter().any(|t| t.is(STATIC)) {
                return None;
            }
            let index = modifiers
                .iter()
                .rposition(Token::is_accessibility)
                .map(|i| i + 1)
                .unwrap_or(0);
            let edit = if index > 0 {
                TextEdit::insert(modifiers[index - 1].span.end_byte, " static")
            } else {
                // the node start may be an attribute or doc comment
                let at = modifiers
                    .first()
                    .map(|t| t.span.start_byte)
                    .or(*modifiers_start)?;
                TextEdit::insert(at, "static ")
            };
            let mut token = static_token(&edit, node_span);
            token.trailing_trivia = " ".to_string();
            modifiers.insert(index, token);
            normalize_trivia(modifiers);
            (edit, *symbol)
        }
        NodeKind::AnonymousFunction {
            modifiers, symbol, ..
        } => {
            if modifiers.iter().any(|t| t.is(STATIC)) {
                return None;
            }
            let edit = TextEdit::insert(node_span.start_byte, "static ");
            let mut token = static_token(&edit, node_span);
            token.trailing_trivia = " ".to_string();
            // the keyword now starts the lambda
            token.leading_trivia = std::mem::take(&mut node.leading_trivia);
            modifiers.insert(0, token);
            (edit, *symbol)
        }
        _ => return None,
    };

    if let Some(method) = symbol {
        fixed.method_mut(method).is_static = true;
    }
    debug!(node = %target, edit = %edit, "applied static qualifier");
    Some(AppliedFix {
        program: fixed,
        edit,
    })
}

/// Span of the inserted keyword, on the line of the node.
fn static_token(edit: &TextEdit, node: Span) -> Token {
    let start = edit.start + edit.replacement.len() - edit.replacement.trim_start().len();
    let span = Span {
        start_byte: start,
        end_byte: start + STATIC.len(),
        start_line: node.start_line,
        start_col: node.start_col,
        end_line: node.start_line,
        end_col: node.start_col + STATIC.len(),
    };
    Token::new(STATIC, span)
}

/// Collapse whitespace-only, single-line trivia between modifiers to one space.
fn normalize_trivia(modifiers: &mut [Token]) {
    for token in modifiers {
        let trivia = &token.trailing_trivia;
        if !trivia.is_empty()
            && trivia.chars().all(char::is_whitespace)
            && !trivia.contains('\n')
        {
            token.trailing_trivia = " ".to_string();
        }
    }
}
