//! Semantic symbols resolved by the front end.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EventId, MethodId, NamespaceId, NodeId, PropertyId, TypeId};

/// A source file of the compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    /// Full text, when the dump embeds it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A namespace segment. `parent == None` means the global namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    #[serde(default)]
    pub parent: Option<NamespaceId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

/// A named type. Constructed generics collapse to their definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSymbol {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<NamespaceId>,
    #[serde(default)]
    pub containing_type: Option<TypeId>,
    #[serde(default)]
    pub base: Option<TypeId>,
    #[serde(default)]
    pub kind: TypeKind,
    /// Name of the assembly that declares the type.
    pub assembly: String,
    #[serde(default)]
    pub attributes: Vec<AttributeData>,
    #[serde(default)]
    pub members: Vec<MethodId>,
    /// Declaring syntax, for types declared in source.
    #[serde(default)]
    pub declaration: Option<NodeId>,
}

/// An attribute applied to a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeData {
    pub class: TypeId,
    /// Positional constructor arguments.
    #[serde(default)]
    pub arguments: Vec<AttributeArgument>,
    #[serde(default)]
    pub syntax: Option<NodeId>,
}

/// Constant value of an attribute constructor argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeArgument {
    String(String),
    Type(TypeId),
    Array(Vec<AttributeArgument>),
    Bool(bool),
    Other(String),
}

impl AttributeArgument {
    /// Text of a string-like constant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeArgument::String(s) | AttributeArgument::Other(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[default]
    Ordinary,
    Constructor,
    AnonymousFunction,
    LocalFunction,
    Accessor,
    Other,
}

impl MethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Ordinary => "method",
            MethodKind::Constructor => "constructor",
            MethodKind::AnonymousFunction => "anonymous function",
            MethodKind::LocalFunction => "local function",
            MethodKind::Accessor => "accessor",
            MethodKind::Other => "member",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSymbol {
    pub name: String,
    #[serde(default)]
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSymbol {
    pub name: String,
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(default)]
    pub containing_type: Option<TypeId>,
    #[serde(default)]
    pub is_static: bool,
    /// Compiler-synthesized (e.g. the default constructor).
    #[serde(default)]
    pub is_implicitly_declared: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterSymbol>,
    /// `None` for `void`.
    #[serde(default)]
    pub return_type: Option<TypeId>,
    #[serde(default)]
    pub declaration: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySymbol {
    pub name: String,
    pub containing_type: TypeId,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSymbol {
    pub name: String,
    pub containing_type: TypeId,
}

/// What a name expression is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SymbolRef {
    Type(TypeId),
    Method(MethodId),
    Property(PropertyId),
    Event(EventId),
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolRef::Type(id) => write!(f, "{}", id),
            SymbolRef::Method(id) => write!(f, "{}", id),
            SymbolRef::Property(id) => write!(f, "{}", id),
            SymbolRef::Event(id) => write!(f, "{}", id),
        }
    }
}
