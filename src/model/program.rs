//! The analyzed compilation: source files, symbols and syntax.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    EventId, EventSymbol, FileId, Location, MethodId, MethodSymbol, Namespace, NamespaceId,
    NodeId, NodeKind, PropertyId, PropertySymbol, SourceFile, SymbolRef, SyntaxNode, TypeId,
    TypeSymbol,
};

/// Errors raised while loading or validating a program dump.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML model: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported model format for {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    #[error("{owner} refers to missing {what} {index}")]
    DanglingReference {
        owner: String,
        what: &'static str,
        index: usize,
    },

    #[error("node {child} is listed as a child of both {first} and {second}")]
    SharedChild {
        child: usize,
        first: usize,
        second: usize,
    },

    #[error("node {0} is its own ancestor")]
    Cycle(usize),

    #[error("type {index} ({name}) is its own {link}")]
    TypeCycle {
        index: usize,
        name: String,
        link: &'static str,
    },
}

/// A whole compilation as produced by a C# front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Name of the assembly being compiled.
    pub assembly: String,
    #[serde(default)]
    pub files: Vec<SourceFile>,
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    #[serde(default)]
    pub types: Vec<TypeSymbol>,
    #[serde(default)]
    pub methods: Vec<MethodSymbol>,
    #[serde(default)]
    pub properties: Vec<PropertySymbol>,
    #[serde(default)]
    pub events: Vec<EventSymbol>,
    #[serde(default)]
    pub nodes: Vec<SyntaxNode>,
}

impl Program {
    /// Load a model dump, picking the format from the file extension.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Err(ModelError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ModelError> {
        let program: Program = serde_json::from_str(content)?;
        program.into_linked()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ModelError> {
        let program: Program = serde_yaml::from_str(content)?;
        program.into_linked()
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn into_linked(mut self) -> Result<Self, ModelError> {
        self.validate()?;
        self.link()?;
        Ok(self)
    }

    /// Check that every stored index points into its arena.
    pub fn validate(&self) -> Result<(), ModelError> {
        let check = |owner: &dyn Fn() -> String, what: &'static str, index: usize, len: usize| {
            if index < len {
                Ok(())
            } else {
                Err(ModelError::DanglingReference {
                    owner: owner(),
                    what,
                    index,
                })
            }
        };

        for (i, ns) in self.namespaces.iter().enumerate() {
            if let Some(parent) = ns.parent {
                check(&|| format!("namespace {}", i), "namespace", parent.index(), self.namespaces.len())?;
            }
        }

        for (i, ty) in self.types.iter().enumerate() {
            let owner = || format!("type {} ({})", i, ty.name);
            if let Some(ns) = ty.namespace {
                check(&owner, "namespace", ns.index(), self.namespaces.len())?;
            }
            for id in ty.containing_type.iter().chain(ty.base.iter()) {
                check(&owner, "type", id.index(), self.types.len())?;
            }
            for attr in &ty.attributes {
                check(&owner, "type", attr.class.index(), self.types.len())?;
                if let Some(syntax) = attr.syntax {
                    check(&owner, "node", syntax.index(), self.nodes.len())?;
                }
                let mut stack: Vec<&super::AttributeArgument> = attr.arguments.iter().collect();
                while let Some(arg) = stack.pop() {
                    match arg {
                        super::AttributeArgument::Type(t) => {
                            check(&owner, "type", t.index(), self.types.len())?
                        }
                        super::AttributeArgument::Array(items) => stack.extend(items),
                        _ => {}
                    }
                }
            }
            for m in &ty.members {
                check(&owner, "method", m.index(), self.methods.len())?;
            }
            if let Some(decl) = ty.declaration {
                check(&owner, "node", decl.index(), self.nodes.len())?;
            }
        }

        for (i, m) in self.methods.iter().enumerate() {
            let owner = || format!("method {} ({})", i, m.name);
            let types = m
                .containing_type
                .iter()
                .chain(m.return_type.iter())
                .chain(m.parameters.iter().filter_map(|p| p.ty.as_ref()));
            for t in types {
                check(&owner, "type", t.index(), self.types.len())?;
            }
            if let Some(decl) = m.declaration {
                check(&owner, "node", decl.index(), self.nodes.len())?;
            }
        }

        for (i, p) in self.properties.iter().enumerate() {
            check(&|| format!("property {} ({})", i, p.name), "type", p.containing_type.index(), self.types.len())?;
        }
        for (i, e) in self.events.iter().enumerate() {
            check(&|| format!("event {} ({})", i, e.name), "type", e.containing_type.index(), self.types.len())?;
        }

        for (i, node) in self.nodes.iter().enumerate() {
            let owner = || format!("node {} ({})", i, node.kind.as_str());
            check(&owner, "file", node.file.index(), self.files.len())?;
            for child in node.kind.children() {
                check(&owner, "node", child.index(), self.nodes.len())?;
            }
            self.validate_node_symbols(&owner, &node.kind)?;
        }

        self.validate_type_chains()
    }

    /// Reject containing-type and base-type chains that loop.
    fn validate_type_chains(&self) -> Result<(), ModelError> {
        let links: [(&'static str, fn(&TypeSymbol) -> Option<TypeId>); 2] = [
            ("containing type", |t| t.containing_type),
            ("base type", |t| t.base),
        ];
        for (i, ty) in self.types.iter().enumerate() {
            for (link, next) in links {
                let mut current = next(ty);
                let mut steps = 0;
                while let Some(t) = current {
                    steps += 1;
                    if t.index() == i || steps > self.types.len() {
                        return Err(ModelError::TypeCycle {
                            index: i,
                            name: ty.name.clone(),
                            link,
                        });
                    }
                    current = next(self.type_symbol(t));
                }
            }
        }
        Ok(())
    }

    fn validate_node_symbols(
        &self,
        owner: &dyn Fn() -> String,
        kind: &NodeKind,
    ) -> Result<(), ModelError> {
        let missing = |what: &'static str, index: usize| ModelError::DanglingReference {
            owner: owner(),
            what,
            index,
        };

        if let Some(m) = kind.declared_method() {
            if m.index() >= self.methods.len() {
                return Err(missing("method", m.index()));
            }
        }
        if let Some(symbol) = kind.referenced_symbol() {
            if !self.has_symbol(symbol) {
                let (what, index) = match symbol {
                    SymbolRef::Type(id) => ("type", id.index()),
                    SymbolRef::Method(id) => ("method", id.index()),
                    SymbolRef::Property(id) => ("property", id.index()),
                    SymbolRef::Event(id) => ("event", id.index()),
                };
                return Err(missing(what, index));
            }
        }
        match kind {
            NodeKind::TypeDeclaration {
                symbol: Some(t), ..
            } if t.index() >= self.types.len() => Err(missing("type", t.index())),
            NodeKind::Property {
                symbol: Some(p), ..
            } if p.index() >= self.properties.len() => Err(missing("property", p.index())),
            NodeKind::Invocation {
                target,
                type_arguments,
                ..
            } => {
                if let Some(t) = target {
                    if t.index() >= self.methods.len() {
                        return Err(missing("method", t.index()));
                    }
                }
                match type_arguments.iter().find(|t| t.index() >= self.types.len()) {
                    Some(t) => Err(missing("type", t.index())),
                    None => Ok(()),
                }
            }
            NodeKind::ObjectCreation {
                created: Some(t), ..
            } if t.index() >= self.types.len() => Err(missing("type", t.index())),
            _ => Ok(()),
        }
    }

    fn has_symbol(&self, symbol: SymbolRef) -> bool {
        match symbol {
            SymbolRef::Type(id) => id.index() < self.types.len(),
            SymbolRef::Method(id) => id.index() < self.methods.len(),
            SymbolRef::Property(id) => id.index() < self.properties.len(),
            SymbolRef::Event(id) => id.index() < self.events.len(),
        }
    }

    /// Recompute parent links from the child lists.
    ///
    /// Fails if a node is shared between two parents or sits on a cycle.
    pub fn link(&mut self) -> Result<(), ModelError> {
        for node in &mut self.nodes {
            node.parent = None;
        }
        for i in 0..self.nodes.len() {
            for child in self.nodes[i].kind.children() {
                if let Some(existing) = self.nodes[child.index()].parent {
                    return Err(ModelError::SharedChild {
                        child: child.index(),
                        first: existing.index(),
                        second: i,
                    });
                }
                self.nodes[child.index()].parent = Some(NodeId::from_index(i));
            }
        }

        let limit = self.nodes.len();
        for i in 0..self.nodes.len() {
            let mut current = self.nodes[i].parent;
            let mut steps = 0;
            while let Some(p) = current {
                steps += 1;
                if p.index() == i || steps > limit {
                    return Err(ModelError::Cycle(i));
                }
                current = self.nodes[p.index()].parent;
            }
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SyntaxNode {
        &mut self.nodes[id.index()]
    }

    pub fn type_symbol(&self, id: TypeId) -> &TypeSymbol {
        &self.types[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &MethodSymbol {
        &self.methods[id.index()]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodSymbol {
        &mut self.methods[id.index()]
    }

    pub fn property(&self, id: PropertyId) -> &PropertySymbol {
        &self.properties[id.index()]
    }

    pub fn event(&self, id: EventId) -> &EventSymbol {
        &self.events[id.index()]
    }

    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.index()]
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::from_index)
    }

    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.types.len()).map(TypeId::from_index)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).kind.children()
    }

    /// Parents of `id`, innermost first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            program: self,
            next: self.node(id).parent,
        }
    }

    /// Pre-order walk of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants_until(id, |_| false)
    }

    /// Pre-order walk that does not enter nodes matching `stop`.
    ///
    /// `id` itself is always entered; stopped nodes are not yielded.
    pub fn descendants_until(&self, id: NodeId, stop: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if current != id && stop(&self.node(current).kind) {
                continue;
            }
            out.push(current);
            let children = self.children(current);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Dotted namespace path, empty for the global namespace.
    pub fn namespace_path(&self, id: Option<NamespaceId>) -> String {
        let mut parts = Vec::new();
        let mut current = id;
        while let Some(ns) = current {
            let namespace = self.namespace(ns);
            parts.push(namespace.name.as_str());
            current = namespace.parent;
            if parts.len() > self.namespaces.len() {
                break;
            }
        }
        parts.reverse();
        parts.join(".")
    }

    /// Fully qualified name, e.g. `Celeste.Mod.Example.Spinner` or `Outer.Inner`.
    ///
    /// The containing-type walk is bounded by the number of types.
    pub fn full_type_name(&self, id: TypeId) -> String {
        let mut parts = vec![self.type_symbol(id).name.as_str()];
        let mut outermost = id;
        while let Some(outer) = self.type_symbol(outermost).containing_type {
            if outer == outermost || parts.len() > self.types.len() {
                break;
            }
            parts.push(self.type_symbol(outer).name.as_str());
            outermost = outer;
        }
        parts.reverse();
        let name = parts.join(".");
        let ns = self.namespace_path(self.type_symbol(outermost).namespace);
        if ns.is_empty() {
            name
        } else {
            format!("{}.{}", ns, name)
        }
    }

    pub fn find_type(&self, full_name: &str) -> Option<TypeId> {
        self.type_ids().find(|&id| self.full_type_name(id) == full_name)
    }

    pub fn file_by_path(&self, path: &str) -> Option<FileId> {
        self.files
            .iter()
            .position(|f| f.path == path)
            .map(FileId::from_index)
    }

    pub fn location(&self, id: NodeId) -> Location {
        let node = self.node(id);
        Location::new(self.file(node.file).path.clone(), node.span)
    }

    /// Source-like text of a simple name expression (`orig`, `self.orig`, `(orig)`).
    pub fn expression_text(&self, id: NodeId) -> Option<String> {
        match &self.node(id).kind {
            NodeKind::Identifier { name, .. } => Some(name.clone()),
            NodeKind::MemberAccess {
                expression, name, ..
            } => Some(format!("{}.{}", self.expression_text(*expression)?, name)),
            NodeKind::Parenthesized { expression } => {
                Some(format!("({})", self.expression_text(*expression)?))
            }
            _ => None,
        }
    }

    /// Resolve the on-disk text of a file: embedded text first, then `base_dir`.
    pub fn source_text(&self, file: FileId, base_dir: Option<&Path>) -> Option<String> {
        let source = self.file(file);
        if let Some(text) = &source.text {
            return Some(text.clone());
        }
        let path = match base_dir {
            Some(dir) => dir.join(&source.path),
            None => PathBuf::from(&source.path),
        };
        std::fs::read_to_string(path).ok()
    }
}

/// Iterator returned by [`Program::ancestors`].
pub struct Ancestors<'a> {
    program: &'a Program,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.program.node(current).parent;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Span, SyntaxNode};

    fn node(kind: NodeKind) -> SyntaxNode {
        SyntaxNode {
            file: FileId(0),
            span: Span::default(),
            leading_trivia: String::new(),
            parent: None,
            kind,
        }
    }

    fn program_with(nodes: Vec<SyntaxNode>) -> Program {
        Program {
            assembly: "Test".into(),
            files: vec![SourceFile {
                path: "Test.cs".into(),
                text: None,
            }],
            nodes,
            ..Default::default()
        }
    }

    #[test]
    fn test_link_computes_parents() {
        let mut program = program_with(vec![
            node(NodeKind::Identifier {
                name: "a".into(),
                symbol: None,
            }),
            node(NodeKind::ExpressionStatement {
                expression: NodeId(0),
            }),
            node(NodeKind::Block {
                statements: vec![NodeId(1)],
            }),
        ]);
        program.link().unwrap();

        let ancestors: Vec<_> = program.ancestors(NodeId(0)).collect();
        assert_eq!(ancestors, vec![NodeId(1), NodeId(2)]);
        assert_eq!(program.descendants(NodeId(2)), vec![NodeId(2), NodeId(1), NodeId(0)]);
    }

    #[test]
    fn test_link_rejects_shared_child() {
        let mut program = program_with(vec![
            node(NodeKind::Literal { text: "1".into() }),
            node(NodeKind::Parenthesized {
                expression: NodeId(0),
            }),
            node(NodeKind::Parenthesized {
                expression: NodeId(0),
            }),
        ]);
        assert!(matches!(
            program.link(),
            Err(ModelError::SharedChild { child: 0, .. })
        ));
    }

    #[test]
    fn test_link_rejects_cycle() {
        let mut program = program_with(vec![
            node(NodeKind::Parenthesized {
                expression: NodeId(1),
            }),
            node(NodeKind::Parenthesized {
                expression: NodeId(0),
            }),
        ]);
        assert!(matches!(program.link(), Err(ModelError::Cycle(_))));
    }

    #[test]
    fn test_validate_rejects_dangling_child() {
        let program = program_with(vec![node(NodeKind::Block {
            statements: vec![NodeId(7)],
        })]);
        let err = program.validate().unwrap_err();
        assert!(err.to_string().contains("missing node 7"));
    }

    fn type_named(name: &str, containing_type: Option<u32>, base: Option<u32>) -> TypeSymbol {
        TypeSymbol {
            name: name.into(),
            namespace: None,
            containing_type: containing_type.map(TypeId),
            base: base.map(TypeId),
            kind: Default::default(),
            assembly: "Test".into(),
            attributes: vec![],
            members: vec![],
            declaration: None,
        }
    }

    #[test]
    fn test_validate_rejects_containing_type_cycle() {
        let mut program = program_with(vec![]);
        program.types = vec![
            type_named("Outer", Some(1), None),
            type_named("Inner", Some(0), None),
        ];
        let err = program.validate().unwrap_err();
        assert!(matches!(
            err,
            ModelError::TypeCycle {
                index: 0,
                link: "containing type",
                ..
            }
        ));

        // Unvalidated programs still get a finite name.
        assert_eq!(program.full_type_name(TypeId(0)), "Outer.Inner.Outer");
    }

    #[test]
    fn test_validate_rejects_base_type_cycle() {
        let mut program = program_with(vec![]);
        program.types = vec![type_named("Loop", None, Some(0))];
        let err = program.validate().unwrap_err();
        assert_eq!(err.to_string(), "type 0 (Loop) is its own base type");
    }

    #[test]
    fn test_validate_accepts_nested_types() {
        let mut program = program_with(vec![]);
        program.types = vec![
            type_named("Entity", None, None),
            type_named("Player", None, Some(0)),
            type_named("Hair", Some(1), Some(0)),
        ];
        program.validate().unwrap();
        assert_eq!(program.full_type_name(TypeId(2)), "Player.Hair");
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.txt");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(
            Program::load(&path),
            Err(ModelError::UnsupportedFormat(_))
        ));
    }
}
