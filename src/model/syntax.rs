//! Syntax tree nodes.
//!
//! Nodes live in a single arena on [`Program`](super::Program) and refer to
//! their children by [`NodeId`]. Parent links are not stored in dumps; they
//! are recomputed from the child lists when a program is loaded.

use serde::{Deserialize, Serialize};

use super::{FileId, MethodId, NodeId, PropertyId, Span, SymbolRef, TypeId};

/// One syntax node: position, trivia and typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub file: FileId,
    pub span: Span,
    /// Whitespace and comments in front of the node's first token.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub leading_trivia: String,
    #[serde(skip)]
    pub parent: Option<NodeId>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// A single token kept on declarations that carry modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub span: Span,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub leading_trivia: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trailing_trivia: String,
}

impl Token {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
            leading_trivia: String::new(),
            trailing_trivia: String::new(),
        }
    }

    pub fn is(&self, keyword: &str) -> bool {
        self.text == keyword
    }

    /// `public`, `private`, `protected` or `internal`.
    pub fn is_accessibility(&self) -> bool {
        matches!(
            self.text.as_str(),
            "public" | "private" | "protected" | "internal"
        )
    }
}

/// Lambda (`x => ...`) or anonymous method (`delegate (x) { ... }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionSyntax {
    Lambda,
    AnonymousMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentOperator {
    Assign,
    AddAssign,
    SubtractAssign,
    Other,
}

impl AssignmentOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::AddAssign => "+=",
            AssignmentOperator::SubtractAssign => "-=",
            AssignmentOperator::Other => "?=",
        }
    }
}

/// Typed payload of a syntax node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    CompilationUnit {
        #[serde(default)]
        members: Vec<NodeId>,
    },
    Namespace {
        name: String,
        #[serde(default)]
        members: Vec<NodeId>,
    },
    TypeDeclaration {
        name: String,
        #[serde(default)]
        symbol: Option<TypeId>,
        #[serde(default)]
        attributes: Vec<NodeId>,
        #[serde(default)]
        members: Vec<NodeId>,
    },
    Attribute {
        name: String,
        #[serde(default)]
        arguments: Vec<NodeId>,
    },
    Method {
        name: String,
        #[serde(default)]
        modifiers: Vec<Token>,
        /// Offset where a first modifier would go when `modifiers` is empty.
        #[serde(default)]
        modifiers_start: Option<usize>,
        #[serde(default)]
        symbol: Option<MethodId>,
        #[serde(default)]
        parameters: Vec<NodeId>,
        #[serde(default)]
        body: Option<NodeId>,
    },
    Constructor {
        #[serde(default)]
        modifiers: Vec<Token>,
        #[serde(default)]
        symbol: Option<MethodId>,
        #[serde(default)]
        parameters: Vec<NodeId>,
        #[serde(default)]
        body: Option<NodeId>,
    },
    LocalFunction {
        name: String,
        #[serde(default)]
        modifiers: Vec<Token>,
        #[serde(default)]
        symbol: Option<MethodId>,
        #[serde(default)]
        parameters: Vec<NodeId>,
        #[serde(default)]
        body: Option<NodeId>,
    },
    Property {
        name: String,
        #[serde(default)]
        symbol: Option<PropertyId>,
        #[serde(default)]
        accessors: Vec<NodeId>,
    },
    Field {
        name: String,
        #[serde(default)]
        initializer: Option<NodeId>,
    },
    Parameter {
        name: String,
    },
    Block {
        #[serde(default)]
        statements: Vec<NodeId>,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    LocalDeclaration {
        name: String,
        #[serde(default)]
        initializer: Option<NodeId>,
    },
    Return {
        #[serde(default)]
        expression: Option<NodeId>,
    },
    YieldReturn {
        expression: NodeId,
    },
    YieldBreak,
    /// Any other statement (`if`, `while`, `try`, ...).
    Statement {
        keyword: String,
        #[serde(default)]
        children: Vec<NodeId>,
    },
    Invocation {
        callee: NodeId,
        #[serde(default)]
        arguments: Vec<NodeId>,
        /// Resolved target; absent when binding failed.
        #[serde(default)]
        target: Option<MethodId>,
        #[serde(default)]
        type_arguments: Vec<TypeId>,
    },
    ObjectCreation {
        type_name: String,
        #[serde(default)]
        arguments: Vec<NodeId>,
        #[serde(default)]
        created: Option<TypeId>,
    },
    AnonymousFunction {
        syntax: FunctionSyntax,
        #[serde(default)]
        modifiers: Vec<Token>,
        #[serde(default)]
        parameters: Vec<NodeId>,
        body: NodeId,
        #[serde(default)]
        symbol: Option<MethodId>,
    },
    Identifier {
        name: String,
        #[serde(default)]
        symbol: Option<SymbolRef>,
    },
    MemberAccess {
        expression: NodeId,
        name: String,
        #[serde(default)]
        symbol: Option<SymbolRef>,
    },
    Assignment {
        operator: AssignmentOperator,
        left: NodeId,
        right: NodeId,
    },
    Await {
        expression: NodeId,
    },
    Parenthesized {
        expression: NodeId,
    },
    Literal {
        text: String,
    },
    /// Any other expression (binary, cast, indexer, ...).
    Expression {
        #[serde(default)]
        text: String,
        #[serde(default)]
        children: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Child nodes in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::CompilationUnit { members } | NodeKind::Namespace { members, .. } => {
                out.extend(members)
            }
            NodeKind::TypeDeclaration {
                attributes,
                members,
                ..
            } => {
                out.extend(attributes);
                out.extend(members);
            }
            NodeKind::Attribute { arguments, .. } => out.extend(arguments),
            NodeKind::Method {
                parameters, body, ..
            }
            | NodeKind::Constructor {
                parameters, body, ..
            }
            | NodeKind::LocalFunction {
                parameters, body, ..
            } => {
                out.extend(parameters);
                out.extend(body);
            }
            NodeKind::Property { accessors, .. } => out.extend(accessors),
            NodeKind::Field { initializer, .. }
            | NodeKind::LocalDeclaration { initializer, .. } => out.extend(initializer),
            NodeKind::Block { statements } => out.extend(statements),
            NodeKind::ExpressionStatement { expression }
            | NodeKind::YieldReturn { expression }
            | NodeKind::Await { expression }
            | NodeKind::Parenthesized { expression } => out.push(*expression),
            NodeKind::Return { expression } => out.extend(expression),
            NodeKind::Statement { children, .. } | NodeKind::Expression { children, .. } => {
                out.extend(children)
            }
            NodeKind::Invocation {
                callee, arguments, ..
            } => {
                out.push(*callee);
                out.extend(arguments);
            }
            NodeKind::ObjectCreation { arguments, .. } => out.extend(arguments),
            NodeKind::AnonymousFunction {
                parameters, body, ..
            } => {
                out.extend(parameters);
                out.push(*body);
            }
            NodeKind::MemberAccess { expression, .. } => out.push(*expression),
            NodeKind::Assignment { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Parameter { .. }
            | NodeKind::YieldBreak
            | NodeKind::Identifier { .. }
            | NodeKind::Literal { .. } => {}
        }
        out
    }

    /// Short name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit { .. } => "compilation_unit",
            NodeKind::Namespace { .. } => "namespace",
            NodeKind::TypeDeclaration { .. } => "type_declaration",
            NodeKind::Attribute { .. } => "attribute",
            NodeKind::Method { .. } => "method",
            NodeKind::Constructor { .. } => "constructor",
            NodeKind::LocalFunction { .. } => "local_function",
            NodeKind::Property { .. } => "property",
            NodeKind::Field { .. } => "field",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::Block { .. } => "block",
            NodeKind::ExpressionStatement { .. } => "expression_statement",
            NodeKind::LocalDeclaration { .. } => "local_declaration",
            NodeKind::Return { .. } => "return",
            NodeKind::YieldReturn { .. } => "yield_return",
            NodeKind::YieldBreak => "yield_break",
            NodeKind::Statement { .. } => "statement",
            NodeKind::Invocation { .. } => "invocation",
            NodeKind::ObjectCreation { .. } => "object_creation",
            NodeKind::AnonymousFunction { .. } => "anonymous_function",
            NodeKind::Identifier { .. } => "identifier",
            NodeKind::MemberAccess { .. } => "member_access",
            NodeKind::Assignment { .. } => "assignment",
            NodeKind::Await { .. } => "await",
            NodeKind::Parenthesized { .. } => "parenthesized",
            NodeKind::Literal { .. } => "literal",
            NodeKind::Expression { .. } => "expression",
        }
    }

    /// Method-like declarations and anonymous functions.
    pub fn is_function_boundary(&self) -> bool {
        matches!(
            self,
            NodeKind::Method { .. }
                | NodeKind::Constructor { .. }
                | NodeKind::LocalFunction { .. }
                | NodeKind::AnonymousFunction { .. }
        )
    }

    /// Body of a method-like node.
    pub fn body(&self) -> Option<NodeId> {
        match self {
            NodeKind::Method { body, .. }
            | NodeKind::Constructor { body, .. }
            | NodeKind::LocalFunction { body, .. } => *body,
            NodeKind::AnonymousFunction { body, .. } => Some(*body),
            _ => None,
        }
    }

    /// Declaration modifiers, if the node kind carries any.
    pub fn modifiers(&self) -> Option<&[Token]> {
        match self {
            NodeKind::Method { modifiers, .. }
            | NodeKind::Constructor { modifiers, .. }
            | NodeKind::LocalFunction { modifiers, .. }
            | NodeKind::AnonymousFunction { modifiers, .. } => Some(modifiers),
            _ => None,
        }
    }

    /// Symbol bound to a name expression.
    pub fn referenced_symbol(&self) -> Option<SymbolRef> {
        match self {
            NodeKind::Identifier { symbol, .. } | NodeKind::MemberAccess { symbol, .. } => *symbol,
            _ => None,
        }
    }

    /// Method symbol declared by this node.
    pub fn declared_method(&self) -> Option<MethodId> {
        match self {
            NodeKind::Method { symbol, .. }
            | NodeKind::Constructor { symbol, .. }
            | NodeKind::LocalFunction { symbol, .. }
            | NodeKind::AnonymousFunction { symbol, .. } => *symbol,
            _ => None,
        }
    }
}
