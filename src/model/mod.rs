//! Program model: the syntax tree and resolved symbols handed to the rules.
//!
//! A C# front end produces this model (as a `*.model.json` / `*.model.yaml`
//! dump, or in-process through [`ProgramBuilder`]). Analysis only reads it;
//! the static-qualifier fix produces an edited copy.

mod builder;
mod ids;
mod program;
mod span;
mod stubs;
mod symbols;
mod syntax;

pub use builder::{MethodSpec, ProgramBuilder};
pub use ids::{EventId, FileId, MethodId, NamespaceId, NodeId, PropertyId, TypeId};
pub use program::{Ancestors, ModelError, Program};
pub use span::{Location, Span};
pub use stubs::FrameworkStubs;
pub use symbols::{
    AttributeArgument, AttributeData, EventSymbol, MethodKind, MethodSymbol, Namespace,
    ParameterSymbol, PropertySymbol, SourceFile, SymbolRef, TypeKind, TypeSymbol,
};
pub use syntax::{AssignmentOperator, FunctionSyntax, NodeKind, SyntaxNode, Token};
