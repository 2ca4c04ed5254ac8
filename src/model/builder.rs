//! Programmatic construction of [`Program`]s.
//!
//! Used by tests and by front ends that emit models in-process. Every node
//! gets a synthetic, unique span (one node per line) so diagnostics built
//! from a constructed program sort deterministically.

use super::{
    AttributeArgument, AttributeData, AssignmentOperator, EventId, EventSymbol, FileId,
    FunctionSyntax, MethodId, MethodKind, MethodSymbol, Namespace, NamespaceId, NodeId, NodeKind,
    ParameterSymbol, Program, PropertyId, PropertySymbol, SourceFile, Span, SymbolRef, SyntaxNode,
    Token, TypeId, TypeSymbol,
};

/// Signature and modifiers of a method being declared.
#[derive(Debug, Clone, Default)]
pub struct MethodSpec {
    pub name: String,
    pub modifiers: Vec<String>,
    pub parameters: Vec<ParameterSymbol>,
    pub return_type: Option<TypeId>,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn modifiers(mut self, modifiers: &[&str]) -> Self {
        self.modifiers = modifiers.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeId) -> Self {
        self.parameters.push(ParameterSymbol {
            name: name.into(),
            ty: Some(ty),
        });
        self
    }

    /// A parameter whose type did not bind.
    pub fn untyped_param(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(ParameterSymbol {
            name: name.into(),
            ty: None,
        });
        self
    }

    pub fn returns(mut self, ty: TypeId) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.iter().any(|m| m == "static")
    }
}

/// Incrementally builds a [`Program`].
pub struct ProgramBuilder {
    program: Program,
    file: Option<FileId>,
    units: Vec<NodeId>,
    offset: usize,
    line: usize,
}

impl ProgramBuilder {
    pub fn new(assembly: impl Into<String>) -> Self {
        Self {
            program: Program {
                assembly: assembly.into(),
                ..Default::default()
            },
            file: None,
            units: Vec::new(),
            offset: 0,
            line: 1,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Start a new source file; subsequent syntax lands in it.
    pub fn file(&mut self, path: impl Into<String>) -> FileId {
        let file = FileId::from_index(self.program.files.len());
        self.program.files.push(SourceFile {
            path: path.into(),
            text: None,
        });
        self.file = Some(file);
        self.offset = 0;
        self.line = 1;
        let unit = self.alloc(NodeKind::CompilationUnit {
            members: Vec::new(),
        });
        self.units.push(unit);
        file
    }

    fn current_file(&mut self) -> FileId {
        match self.file {
            Some(file) => file,
            None => self.file("Source.cs"),
        }
    }

    fn next_span(&mut self, width: usize) -> Span {
        let span = Span {
            start_byte: self.offset,
            end_byte: self.offset + width,
            start_line: self.line,
            start_col: 1,
            end_line: self.line,
            end_col: 1 + width,
        };
        self.offset += width + 1;
        self.line += 1;
        span
    }

    /// Append a raw node to the arena.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let file = self.current_file();
        let span = self.next_span(kind.as_str().len());
        let id = NodeId::from_index(self.program.nodes.len());
        self.program.nodes.push(SyntaxNode {
            file,
            span,
            leading_trivia: String::new(),
            parent: None,
            kind,
        });
        id
    }

    /// Intern a dotted namespace path; the empty path is the global namespace.
    pub fn namespace(&mut self, dotted: &str) -> Option<NamespaceId> {
        let mut parent = None;
        for segment in dotted.split('.').filter(|s| !s.is_empty()) {
            let existing = self
                .program
                .namespaces
                .iter()
                .position(|ns| ns.name == segment && ns.parent == parent);
            parent = Some(match existing {
                Some(index) => NamespaceId::from_index(index),
                None => {
                    self.program.namespaces.push(Namespace {
                        name: segment.to_string(),
                        parent,
                    });
                    NamespaceId::from_index(self.program.namespaces.len() - 1)
                }
            });
        }
        parent
    }

    fn push_type(&mut self, full_name: &str, assembly: String, base: Option<TypeId>) -> TypeId {
        let (ns, name) = match full_name.rfind('.') {
            Some(i) => (&full_name[..i], &full_name[i + 1..]),
            None => ("", full_name),
        };
        let namespace = self.namespace(ns);
        self.program.types.push(TypeSymbol {
            name: name.to_string(),
            namespace,
            containing_type: None,
            base,
            kind: Default::default(),
            assembly,
            attributes: Vec::new(),
            members: Vec::new(),
            declaration: None,
        });
        TypeId::from_index(self.program.types.len() - 1)
    }

    /// Declare (or look up) a type defined in another assembly.
    pub fn external_type(&mut self, full_name: &str, assembly: &str, base: Option<TypeId>) -> TypeId {
        if let Some(existing) = self.program.find_type(full_name) {
            return existing;
        }
        self.push_type(full_name, assembly.to_string(), base)
    }

    /// Declare a class in the current source file.
    pub fn class(&mut self, full_name: &str, base: Option<TypeId>) -> TypeId {
        let id = self.push_type(full_name, self.program.assembly.clone(), base);
        let name = self.program.type_symbol(id).name.clone();
        let decl = self.alloc(NodeKind::TypeDeclaration {
            name,
            symbol: Some(id),
            attributes: Vec::new(),
            members: Vec::new(),
        });
        self.program.types[id.index()].declaration = Some(decl);

        let file = self.current_file();
        let unit = self.units[file.index()];
        if let NodeKind::CompilationUnit { members } = &mut self.program.node_mut(unit).kind {
            members.push(decl);
        }
        id
    }

    /// Apply an attribute to `target`, with syntax when the target is declared in source.
    pub fn attribute(
        &mut self,
        target: TypeId,
        class: TypeId,
        arguments: Vec<AttributeArgument>,
    ) -> NodeId {
        let name = self.program.type_symbol(class).name.clone();
        let name = name.strip_suffix("Attribute").unwrap_or(&name).to_string();
        let syntax = self.alloc(NodeKind::Attribute {
            name,
            arguments: Vec::new(),
        });
        if let Some(decl) = self.program.type_symbol(target).declaration {
            if let NodeKind::TypeDeclaration { attributes, .. } = &mut self.program.node_mut(decl).kind {
                attributes.push(syntax);
            }
        }
        self.program.types[target.index()].attributes.push(AttributeData {
            class,
            arguments,
            syntax: Some(syntax),
        });
        syntax
    }

    fn push_method(
        &mut self,
        owner: Option<TypeId>,
        kind: MethodKind,
        spec: &MethodSpec,
        is_implicitly_declared: bool,
    ) -> MethodId {
        self.program.methods.push(MethodSymbol {
            name: spec.name.clone(),
            kind,
            containing_type: owner,
            is_static: spec.is_static(),
            is_implicitly_declared,
            parameters: spec.parameters.clone(),
            return_type: spec.return_type,
            declaration: None,
        });
        let id = MethodId::from_index(self.program.methods.len() - 1);
        if let (Some(owner), MethodKind::Ordinary | MethodKind::Constructor) = (owner, kind) {
            self.program.types[owner.index()].members.push(id);
        }
        id
    }

    fn tokens(&mut self, words: &[String]) -> Vec<Token> {
        words
            .iter()
            .map(|word| {
                let mut token = Token::new(word.clone(), self.next_span(word.len()));
                token.trailing_trivia = " ".into();
                token
            })
            .collect()
    }

    fn parameter_nodes(&mut self, spec: &MethodSpec) -> Vec<NodeId> {
        spec.parameters
            .iter()
            .map(|p| p.name.clone())
            .collect::<Vec<_>>()
            .into_iter()
            .map(|name| self.alloc(NodeKind::Parameter { name }))
            .collect()
    }

    fn add_member(&mut self, owner: TypeId, member: NodeId) {
        if let Some(decl) = self.program.type_symbol(owner).declaration {
            if let NodeKind::TypeDeclaration { members, .. } = &mut self.program.node_mut(decl).kind {
                members.push(member);
            }
        }
    }

    /// Declare a method without source (metadata only).
    pub fn external_method(&mut self, owner: TypeId, spec: MethodSpec) -> MethodId {
        self.push_method(Some(owner), MethodKind::Ordinary, &spec, false)
    }

    /// Look up an ordinary method on `owner` by name, declaring it if missing.
    pub fn method_named(&mut self, owner: TypeId, name: &str) -> MethodId {
        let existing = self
            .program
            .type_symbol(owner)
            .members
            .iter()
            .copied()
            .find(|&m| self.program.method(m).name == name);
        match existing {
            Some(id) => id,
            None => self.external_method(owner, MethodSpec::new(name)),
        }
    }

    /// Declare a method with source in the current file.
    pub fn method(&mut self, owner: TypeId, spec: MethodSpec, body: Option<NodeId>) -> MethodId {
        let id = self.push_method(Some(owner), MethodKind::Ordinary, &spec, false);
        let modifiers_start = self.offset;
        let modifiers = self.tokens(&spec.modifiers);
        let parameters = self.parameter_nodes(&spec);
        let decl = self.alloc(NodeKind::Method {
            name: spec.name.clone(),
            modifiers,
            modifiers_start: Some(modifiers_start),
            symbol: Some(id),
            parameters,
            body,
        });
        self.program.method_mut(id).declaration = Some(decl);
        self.add_member(owner, decl);
        id
    }

    pub fn constructor(&mut self, owner: TypeId, spec: MethodSpec, body: Option<NodeId>) -> MethodId {
        let spec = MethodSpec {
            name: ".ctor".into(),
            ..spec
        };
        let id = self.push_method(Some(owner), MethodKind::Constructor, &spec, false);
        let modifiers = self.tokens(&spec.modifiers);
        let parameters = self.parameter_nodes(&spec);
        let decl = self.alloc(NodeKind::Constructor {
            modifiers,
            symbol: Some(id),
            parameters,
            body,
        });
        self.program.method_mut(id).declaration = Some(decl);
        self.add_member(owner, decl);
        id
    }

    /// The parameterless constructor the compiler synthesizes.
    pub fn implicit_constructor(&mut self, owner: TypeId) -> MethodId {
        self.push_method(
            Some(owner),
            MethodKind::Constructor,
            &MethodSpec::new(".ctor").modifiers(&["public"]),
            true,
        )
    }

    pub fn local_function(&mut self, owner: Option<TypeId>, spec: MethodSpec, body: NodeId) -> NodeId {
        let id = self.push_method(owner, MethodKind::LocalFunction, &spec, false);
        let modifiers = self.tokens(&spec.modifiers);
        let parameters = self.parameter_nodes(&spec);
        let decl = self.alloc(NodeKind::LocalFunction {
            name: spec.name.clone(),
            modifiers,
            symbol: Some(id),
            parameters,
            body: Some(body),
        });
        self.program.method_mut(id).declaration = Some(decl);
        decl
    }

    fn function(&mut self, syntax: FunctionSyntax, spec: MethodSpec, body: NodeId) -> NodeId {
        let id = self.push_method(None, MethodKind::AnonymousFunction, &spec, false);
        let modifiers = self.tokens(&spec.modifiers);
        let parameters = self.parameter_nodes(&spec);
        let decl = self.alloc(NodeKind::AnonymousFunction {
            syntax,
            modifiers,
            parameters,
            body,
            symbol: Some(id),
        });
        self.program.method_mut(id).declaration = Some(decl);
        decl
    }

    /// `(params) => body`. The `MethodSpec` name is ignored by analysis.
    pub fn lambda(&mut self, spec: MethodSpec, body: NodeId) -> NodeId {
        self.function(FunctionSyntax::Lambda, spec, body)
    }

    /// `delegate (params) { body }`.
    pub fn anonymous_method(&mut self, spec: MethodSpec, body: NodeId) -> NodeId {
        self.function(FunctionSyntax::AnonymousMethod, spec, body)
    }

    pub fn property(&mut self, owner: TypeId, name: &str) -> PropertyId {
        self.program.properties.push(PropertySymbol {
            name: name.to_string(),
            containing_type: owner,
            is_static: false,
        });
        PropertyId::from_index(self.program.properties.len() - 1)
    }

    pub fn event(&mut self, owner: TypeId, name: &str) -> EventId {
        self.program.events.push(EventSymbol {
            name: name.to_string(),
            containing_type: owner,
        });
        EventId::from_index(self.program.events.len() - 1)
    }

    /// An unbound identifier.
    pub fn ident(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Identifier {
            name: name.to_string(),
            symbol: None,
        })
    }

    /// An identifier bound to `symbol`.
    pub fn reference(&mut self, name: &str, symbol: SymbolRef) -> NodeId {
        self.alloc(NodeKind::Identifier {
            name: name.to_string(),
            symbol: Some(symbol),
        })
    }

    pub fn member(&mut self, expression: NodeId, name: &str, symbol: Option<SymbolRef>) -> NodeId {
        self.alloc(NodeKind::MemberAccess {
            expression,
            name: name.to_string(),
            symbol,
        })
    }

    /// An invocation whose target did not bind.
    pub fn invoke(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Invocation {
            callee,
            arguments,
            target: None,
            type_arguments: Vec::new(),
        })
    }

    /// An invocation bound to `target`.
    pub fn call(
        &mut self,
        callee: NodeId,
        target: MethodId,
        type_arguments: Vec<TypeId>,
        arguments: Vec<NodeId>,
    ) -> NodeId {
        self.alloc(NodeKind::Invocation {
            callee,
            arguments,
            target: Some(target),
            type_arguments,
        })
    }

    pub fn new_object(&mut self, ty: TypeId, arguments: Vec<NodeId>) -> NodeId {
        let type_name = self.program.type_symbol(ty).name.clone();
        self.alloc(NodeKind::ObjectCreation {
            type_name,
            arguments,
            created: Some(ty),
        })
    }

    pub fn literal(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Literal {
            text: text.to_string(),
        })
    }

    pub fn block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Block { statements })
    }

    pub fn expr_stmt(&mut self, expression: NodeId) -> NodeId {
        self.alloc(NodeKind::ExpressionStatement { expression })
    }

    pub fn local(&mut self, name: &str, initializer: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::LocalDeclaration {
            name: name.to_string(),
            initializer,
        })
    }

    pub fn ret(&mut self, expression: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::Return { expression })
    }

    pub fn yield_return(&mut self, expression: NodeId) -> NodeId {
        self.alloc(NodeKind::YieldReturn { expression })
    }

    pub fn yield_break(&mut self) -> NodeId {
        self.alloc(NodeKind::YieldBreak)
    }

    pub fn statement(&mut self, keyword: &str, children: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Statement {
            keyword: keyword.to_string(),
            children,
        })
    }

    pub fn assign(&mut self, operator: AssignmentOperator, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::Assignment {
            operator,
            left,
            right,
        })
    }

    pub fn awaited(&mut self, expression: NodeId) -> NodeId {
        self.alloc(NodeKind::Await { expression })
    }

    pub fn paren(&mut self, expression: NodeId) -> NodeId {
        self.alloc(NodeKind::Parenthesized { expression })
    }

    /// Finish building and compute parent links.
    pub fn finish(mut self) -> Program {
        let linked = self.program.link();
        debug_assert!(linked.is_ok(), "builder produced a malformed tree: {:?}", linked);
        self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_are_interned() {
        let mut b = ProgramBuilder::new("Mod");
        let a = b.namespace("On.Celeste");
        let again = b.namespace("On.Celeste");
        assert_eq!(a, again);
        assert_eq!(b.namespace(""), None);
        assert_eq!(b.program().namespace_path(a), "On.Celeste");
    }

    #[test]
    fn test_class_lands_in_compilation_unit() {
        let mut b = ProgramBuilder::new("Mod");
        b.file("Spinner.cs");
        let ty = b.class("Example.Spinner", None);
        let program = b.finish();

        let decl = program.type_symbol(ty).declaration.unwrap();
        let unit = program.node(decl).parent.unwrap();
        assert!(matches!(program.node(unit).kind, NodeKind::CompilationUnit { .. }));
        assert_eq!(program.full_type_name(ty), "Example.Spinner");
        assert_eq!(program.type_symbol(ty).assembly, "Mod");
    }

    #[test]
    fn test_method_static_follows_modifiers() {
        let mut b = ProgramBuilder::new("Mod");
        let ty = b.class("Example.Hooks", None);
        let body = b.block(vec![]);
        let m = b.method(ty, MethodSpec::new("Load").modifiers(&["public", "static"]), Some(body));
        let program = b.finish();

        assert!(program.method(m).is_static);
        let decl = program.method(m).declaration.unwrap();
        assert_eq!(program.node(body).parent, Some(decl));
    }

    #[test]
    fn test_spans_are_unique() {
        let mut b = ProgramBuilder::new("Mod");
        let x = b.ident("x");
        let y = b.ident("y");
        let program = b.finish();
        assert_ne!(program.node(x).span, program.node(y).span);
    }
}
