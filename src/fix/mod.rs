//! Code fixes for reported diagnostics.
//!
//! A fix is offered for one diagnostic at a time. Applying it yields a new
//! [`Program`] and the [`TextEdit`] to make to the source file; the input
//! program is never modified.

mod edit;
mod static_hook;

pub use edit::TextEdit;
pub use static_hook::MakeHookStatic;

use serde::Serialize;

use crate::detect::{Diagnostic, DiagnosticId};
use crate::model::{NodeId, Program};

/// A fix provider for a set of diagnostic ids.
pub trait CodeFix: Send + Sync {
    fn fixable_diagnostics(&self) -> &'static [DiagnosticId];

    /// Offer an action for `diagnostic`, or `None` when the reported node
    /// cannot be found or already has the fix applied.
    fn register(&self, program: &Program, diagnostic: &Diagnostic) -> Option<CodeAction>;
}

/// A registered, not yet applied fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeAction {
    pub title: String,
    /// Stable key shared by every action of the same kind.
    pub equivalence_key: String,
    /// Source file the edit applies to.
    pub file: String,
    pub target: NodeId,
}

impl CodeAction {
    /// Apply to `program`, producing an edited copy.
    pub fn apply(&self, program: &Program) -> Option<AppliedFix> {
        static_hook::make_static(program, self.target)
    }
}

/// Result of applying a [`CodeAction`].
#[derive(Debug, Clone)]
pub struct AppliedFix {
    pub program: Program,
    pub edit: TextEdit,
}

/// All built-in fixes.
pub fn builtin() -> Vec<Box<dyn CodeFix>> {
    vec![Box::new(MakeHookStatic)]
}

/// First action any built-in fix offers for `diagnostic`.
pub fn action_for(program: &Program, diagnostic: &Diagnostic) -> Option<CodeAction> {
    builtin()
        .iter()
        .filter(|f| f.fixable_diagnostics().contains(&diagnostic.id))
        .find_map(|f| f.register(program, diagnostic))
}

/// Whether any built-in fix handles `id`.
pub fn is_fixable(id: DiagnosticId) -> bool {
    builtin().iter().any(|f| f.fixable_diagnostics().contains(&id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_static_hook_is_fixable() {
        let fixable: Vec<_> = DiagnosticId::ALL
            .into_iter()
            .filter(|&id| is_fixable(id))
            .collect();
        assert_eq!(fixable, vec![DiagnosticId::HooksShouldBeStatic]);
    }
}
