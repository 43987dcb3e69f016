//! The declaration resolver.
//!
//! Four passes over the program, all feeding one reporter:
//!
//! 1. enter every top-level name in the global scope (conflicts here are
//!    `DeclConflict`);
//! 2. prepare classes and interfaces - lazily and memoized, so the first
//!    class that needs its parent's scope triggers the parent's preparation.
//!    Preparation copies inherited entries in, applies the override rules,
//!    and checks interface coverage. A class marked in-progress that is
//!    reached again closed an inheritance cycle; the closing extends edge is
//!    reported as an unresolved class and dropped;
//! 3. resolve the declared types of global variables and function
//!    signatures;
//! 4. walk function bodies, creating function and block scopes and declaring
//!    formals and locals. The scopes are recorded in visit order so the
//!    checker can re-walk the tree against the same scope sequence.

use crate::error::{LookingFor, SemanticError};
use crate::registry::{ClassInfo, DeclId, DeclInfo, FnInfo, IfaceInfo, Registry, VarInfo, VarKind};
use crate::report::Reporter;
use crate::symbols::{ScopeId, ScopeKind, SymbolOrigin, SymbolTable, GLOBAL_SCOPE};
use decaf_ast::{
    Block, ClassDecl, Decl, FnDecl, InterfaceDecl, Member, PrimType, Program, Stmt, TypeExpr,
};
use decaf_types::{TypeTable, TypeId};
use rustc_hash::FxHashMap;

/// Everything the later phases need from declaration resolution.
#[derive(Debug)]
pub struct Binding {
    pub registry: Registry,
    pub symbols: SymbolTable,
    /// Function and block scopes in binder visit order; the checker consumes
    /// them through a cursor while re-walking the same tree.
    pub body_scopes: Vec<ScopeId>,
    /// Declaration id of each top-level declaration, in program order.
    pub top_ids: Vec<DeclId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrepState {
    InProgress,
    Ready,
}

/// Resolve a type as written against the global scope.
///
/// Named types must refer to a class or an interface; anything else reports
/// `IdentifierNotDeclared` for a type and poisons to `error`. An array of a
/// poisoned element is itself poisoned.
pub(crate) fn resolve_type_expr(
    te: &TypeExpr,
    types: &mut TypeTable,
    symbols: &SymbolTable,
    registry: &Registry,
    reporter: &mut Reporter,
) -> TypeId {
    match te {
        TypeExpr::Prim(prim, _) => match prim {
            PrimType::Int => TypeTable::INT,
            PrimType::Double => TypeTable::DOUBLE,
            PrimType::Bool => TypeTable::BOOL,
            PrimType::String => TypeTable::STRING,
            PrimType::Void => TypeTable::VOID,
        },
        TypeExpr::Named(ident) => {
            let entry = symbols.lookup_local(GLOBAL_SCOPE, &ident.name);
            match entry {
                Some(e) if registry.is_class(e.decl) || registry.is_iface(e.decl) => {
                    types.named(&ident.name)
                }
                _ => {
                    reporter.report(SemanticError::IdentifierNotDeclared {
                        name: ident.name.clone(),
                        kind: LookingFor::Type,
                        span: ident.span,
                    });
                    TypeTable::ERROR
                }
            }
        }
        TypeExpr::Array(elem, _) => {
            let elem_ty = resolve_type_expr(elem, types, symbols, registry, reporter);
            if elem_ty == TypeTable::ERROR {
                TypeTable::ERROR
            } else {
                types.array_of(elem_ty)
            }
        }
    }
}

pub struct Binder<'a, 'p> {
    types: &'a mut TypeTable,
    reporter: &'a mut Reporter,
    program: &'p Program,
    registry: Registry,
    symbols: SymbolTable,
    body_scopes: Vec<ScopeId>,
    top_ids: Vec<DeclId>,
    class_asts: FxHashMap<DeclId, &'p ClassDecl>,
    iface_asts: FxHashMap<DeclId, &'p InterfaceDecl>,
    prep: FxHashMap<DeclId, PrepState>,
}

impl<'a, 'p> Binder<'a, 'p> {
    pub fn new(program: &'p Program, types: &'a mut TypeTable, reporter: &'a mut Reporter) -> Self {
        Binder {
            types,
            reporter,
            program,
            registry: Registry::new(),
            symbols: SymbolTable::new(),
            body_scopes: Vec::new(),
            top_ids: Vec::new(),
            class_asts: FxHashMap::default(),
            iface_asts: FxHashMap::default(),
            prep: FxHashMap::default(),
        }
    }

    /// Run all passes and hand back the binding.
    pub fn bind(mut self) -> Binding {
        self.declare_globals();
        self.prepare_all();
        self.resolve_global_signatures();
        self.bind_bodies();

        Binding {
            registry: self.registry,
            symbols: self.symbols,
            body_scopes: self.body_scopes,
            top_ids: self.top_ids,
        }
    }

    fn decl_span(&self, id: DeclId) -> decaf_ast::Span {
        match self.registry.get(id) {
            DeclInfo::Var(v) => v.span,
            DeclInfo::Fn(f) => f.span,
            DeclInfo::Class(c) => c.span,
            DeclInfo::Iface(i) => i.span,
        }
    }

    fn report_conflict(&mut self, name: &str, span: decaf_ast::Span, prev: DeclId) {
        let prev_span = self.decl_span(prev);
        self.reporter.report(SemanticError::DeclConflict {
            name: name.to_string(),
            span,
            prev: prev_span,
        });
    }

    fn resolve_ty(&mut self, te: &TypeExpr) -> TypeId {
        resolve_type_expr(te, self.types, &self.symbols, &self.registry, self.reporter)
    }

    // ---- pass 1: top-level names ------------------------------------------

    fn declare_globals(&mut self) {
        for decl in &self.program.decls {
            let id = match decl {
                Decl::Var(v) => self.registry.add(DeclInfo::Var(VarInfo {
                    name: v.name.name.clone(),
                    ty: TypeTable::ERROR,
                    kind: VarKind::Global,
                    owner: None,
                    span: v.name.span,
                })),
                Decl::Fn(f) => self.registry.add(DeclInfo::Fn(FnInfo {
                    name: f.name.name.clone(),
                    ret: TypeTable::ERROR,
                    formals: Vec::new(),
                    has_body: f.body.is_some(),
                    owner: None,
                    span: f.name.span,
                })),
                Decl::Class(c) => {
                    let scope = self.symbols.alloc_scope(ScopeKind::Class, GLOBAL_SCOPE);
                    let self_ty = self.types.named(&c.name.name);
                    let id = self.registry.add(DeclInfo::Class(ClassInfo {
                        name: c.name.name.clone(),
                        extends: None,
                        implements: Vec::new(),
                        scope,
                        self_ty,
                        fields: Vec::new(),
                        methods: Vec::new(),
                        span: c.name.span,
                    }));
                    self.class_asts.insert(id, c);
                    id
                }
                Decl::Interface(i) => {
                    let scope = self.symbols.alloc_scope(ScopeKind::Interface, GLOBAL_SCOPE);
                    let self_ty = self.types.named(&i.name.name);
                    let id = self.registry.add(DeclInfo::Iface(IfaceInfo {
                        name: i.name.name.clone(),
                        scope,
                        self_ty,
                        methods: Vec::new(),
                        span: i.name.span,
                    }));
                    self.iface_asts.insert(id, i);
                    id
                }
            };

            let name = decl.name();
            match self.symbols.declare(GLOBAL_SCOPE, &name.name, id) {
                Ok(()) => {
                    // Named-type resolution is memoized against the winning
                    // declaration only.
                    let self_ty = match self.registry.get(id) {
                        DeclInfo::Class(c) => Some(c.self_ty),
                        DeclInfo::Iface(i) => Some(i.self_ty),
                        _ => None,
                    };
                    if let Some(ty) = self_ty {
                        self.registry.bind_named_ty(ty, id);
                    }
                }
                Err(prev) => self.report_conflict(&name.name, name.span, prev.decl),
            }
            self.top_ids.push(id);
        }
    }

    // ---- pass 2: class and interface preparation --------------------------

    fn prepare_all(&mut self) {
        for id in self.top_ids.clone() {
            if self.registry.is_iface(id) {
                self.prepare_iface(id);
            } else if self.registry.is_class(id) {
                self.prepare_class(id);
            }
        }
    }

    fn prepare_iface(&mut self, id: DeclId) {
        if self.prep.contains_key(&id) {
            return;
        }
        self.prep.insert(id, PrepState::InProgress);

        let ast = self.iface_asts[&id];
        let scope = self.registry.iface(id).scope;
        for proto in &ast.prototypes {
            let ret = self.resolve_ty(&proto.ret);
            let formals = self.resolve_formals(&proto.formals);
            let fn_id = self.registry.add(DeclInfo::Fn(FnInfo {
                name: proto.name.name.clone(),
                ret,
                formals,
                has_body: proto.body.is_some(),
                owner: Some(id),
                span: proto.name.span,
            }));
            self.registry.iface_mut(id).methods.push(fn_id);
            if let Err(prev) = self.symbols.declare(scope, &proto.name.name, fn_id) {
                self.report_conflict(&proto.name.name, proto.name.span, prev.decl);
            }
        }

        self.prep.insert(id, PrepState::Ready);
    }

    fn prepare_class(&mut self, id: DeclId) {
        if self.prep.contains_key(&id) {
            return;
        }
        self.prep.insert(id, PrepState::InProgress);

        let ast = self.class_asts[&id];
        let scope = self.registry.class(id).scope;

        // Superclass: resolve, prepare, copy entries in as inherited.
        if let Some(ext) = &ast.extends {
            let parent = self
                .symbols
                .lookup_local(GLOBAL_SCOPE, &ext.name)
                .map(|e| e.decl)
                .filter(|&d| self.registry.is_class(d));
            match parent {
                Some(parent) if self.prep.get(&parent) == Some(&PrepState::InProgress) => {
                    // This extends edge closed an inheritance cycle. Report
                    // it as an unresolved class and sever the edge.
                    self.reporter.report(SemanticError::IdentifierNotDeclared {
                        name: ext.name.clone(),
                        kind: LookingFor::Class,
                        span: ext.span,
                    });
                }
                Some(parent) => {
                    self.prepare_class(parent);
                    self.registry.class_mut(id).extends = Some(parent);
                    let parent_scope = self.registry.class(parent).scope;
                    self.symbols.copy_into(parent_scope, scope);
                }
                None => {
                    self.reporter.report(SemanticError::IdentifierNotDeclared {
                        name: ext.name.clone(),
                        kind: LookingFor::Class,
                        span: ext.span,
                    });
                }
            }
        }

        // Interfaces: resolve, prepare, copy prototypes in as inherited.
        for imp in &ast.implements {
            let iface = self
                .symbols
                .lookup_local(GLOBAL_SCOPE, &imp.name)
                .map(|e| e.decl)
                .filter(|&d| self.registry.is_iface(d));
            match iface {
                Some(iface) => {
                    self.prepare_iface(iface);
                    self.registry.class_mut(id).implements.push(iface);
                    let iface_scope = self.registry.iface(iface).scope;
                    self.symbols.copy_into(iface_scope, scope);
                }
                None => {
                    self.reporter.report(SemanticError::IdentifierNotDeclared {
                        name: imp.name.clone(),
                        kind: LookingFor::Interface,
                        span: imp.span,
                    });
                }
            }
        }

        // Own members, in declaration order.
        for member in &ast.members {
            match member {
                Member::Field(field) => {
                    let ty = self.resolve_ty(&field.declared);
                    let var_id = self.registry.add(DeclInfo::Var(VarInfo {
                        name: field.name.name.clone(),
                        ty,
                        kind: VarKind::Field,
                        owner: Some(id),
                        span: field.name.span,
                    }));
                    self.registry.class_mut(id).fields.push(var_id);
                    if let Err(prev) = self.symbols.declare(scope, &field.name.name, var_id) {
                        self.report_conflict(&field.name.name, field.name.span, prev.decl);
                    }
                }
                Member::Method(method) => {
                    let ret = self.resolve_ty(&method.ret);
                    let formals = self.resolve_formals(&method.formals);
                    let fn_id = self.registry.add(DeclInfo::Fn(FnInfo {
                        name: method.name.name.clone(),
                        ret,
                        formals,
                        has_body: method.body.is_some(),
                        owner: Some(id),
                        span: method.name.span,
                    }));
                    self.registry.class_mut(id).methods.push(fn_id);
                    match self.symbols.declare(scope, &method.name.name, fn_id) {
                        Ok(()) => {}
                        Err(prev)
                            if prev.origin == SymbolOrigin::Inherited
                                && self.registry.is_fn(prev.decl) =>
                        {
                            // Overriding an inherited method is legal iff the
                            // prototypes match; the override then takes the
                            // inherited slot.
                            let matches = self
                                .registry
                                .func(fn_id)
                                .matches_prototype(self.registry.func(prev.decl));
                            if matches {
                                self.symbols.replace(scope, &method.name.name, fn_id);
                            } else {
                                self.reporter.report(SemanticError::OverrideMismatch {
                                    name: method.name.name.clone(),
                                    span: method.name.span,
                                });
                            }
                        }
                        Err(prev) => {
                            self.report_conflict(&method.name.name, method.name.span, prev.decl)
                        }
                    }
                }
            }
        }

        // Interface coverage: every prototype of an implemented interface
        // must resolve in this scope to a bodied function.
        let implemented = self.registry.class(id).implements.clone();
        for iface in implemented {
            let protos = self.registry.iface(iface).methods.clone();
            for proto in protos {
                let name = self.registry.func(proto).name.clone();
                let covered = self
                    .symbols
                    .lookup_local(scope, &name)
                    .map(|e| self.registry.is_fn(e.decl) && self.registry.func(e.decl).has_body)
                    .unwrap_or(false);
                if !covered {
                    let class_name = self.registry.class(id).name.clone();
                    let iface_name = self.registry.iface(iface).name.clone();
                    let span = self.registry.class(id).span;
                    self.reporter.report(SemanticError::InterfaceNotImplemented {
                        class: class_name,
                        iface: iface_name,
                        span,
                    });
                    break;
                }
            }
        }

        self.prep.insert(id, PrepState::Ready);
    }

    fn resolve_formals(&mut self, formals: &[decaf_ast::VarDecl]) -> Vec<(String, TypeId)> {
        formals
            .iter()
            .map(|f| (f.name.name.clone(), self.resolve_ty(&f.declared)))
            .collect()
    }

    // ---- pass 3: global signatures ----------------------------------------

    fn resolve_global_signatures(&mut self) {
        for (i, decl) in self.program.decls.iter().enumerate() {
            let id = self.top_ids[i];
            match decl {
                Decl::Var(v) => {
                    let ty = self.resolve_ty(&v.declared);
                    if let DeclInfo::Var(info) = self.registry.get_mut(id) {
                        info.ty = ty;
                    }
                }
                Decl::Fn(f) => {
                    let ret = self.resolve_ty(&f.ret);
                    let formals = self.resolve_formals(&f.formals);
                    if let DeclInfo::Fn(info) = self.registry.get_mut(id) {
                        info.ret = ret;
                        info.formals = formals;
                    }
                }
                _ => {}
            }
        }
    }

    // ---- pass 4: function bodies ------------------------------------------

    fn bind_bodies(&mut self) {
        for (i, decl) in self.program.decls.iter().enumerate() {
            let id = self.top_ids[i];
            match decl {
                Decl::Fn(f) => self.bind_fn_body(id, f, GLOBAL_SCOPE),
                Decl::Class(c) => {
                    let class_scope = self.registry.class(id).scope;
                    let methods = self.registry.class(id).methods.clone();
                    let mut next = methods.into_iter();
                    for member in &c.members {
                        if let Member::Method(m) = member {
                            let fn_id = next
                                .next()
                                .expect("class method list out of sync with member walk");
                            self.bind_fn_body(fn_id, m, class_scope);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn bind_fn_body(&mut self, fn_id: DeclId, ast: &FnDecl, parent: ScopeId) {
        let body = match &ast.body {
            Some(body) => body,
            None => return,
        };

        let fn_scope = self.symbols.alloc_scope(ScopeKind::Function, parent);
        self.body_scopes.push(fn_scope);

        // Formal types were resolved with the signature; reuse them so a bad
        // type is only reported once.
        let formals = self.registry.func(fn_id).formals.clone();
        for (idx, formal) in ast.formals.iter().enumerate() {
            let ty = formals
                .get(idx)
                .map(|(_, ty)| *ty)
                .unwrap_or(TypeTable::ERROR);
            let var_id = self.registry.add(DeclInfo::Var(VarInfo {
                name: formal.name.name.clone(),
                ty,
                kind: VarKind::Param,
                owner: None,
                span: formal.name.span,
            }));
            if let Err(prev) = self.symbols.declare(fn_scope, &formal.name.name, var_id) {
                self.report_conflict(&formal.name.name, formal.name.span, prev.decl);
            }
        }

        self.bind_block(body, fn_scope);
    }

    fn bind_block(&mut self, block: &Block, parent: ScopeId) {
        let scope = self.symbols.alloc_scope(ScopeKind::Block, parent);
        self.body_scopes.push(scope);

        for decl in &block.decls {
            let ty = self.resolve_ty(&decl.declared);
            let var_id = self.registry.add(DeclInfo::Var(VarInfo {
                name: decl.name.name.clone(),
                ty,
                kind: VarKind::Local,
                owner: None,
                span: decl.name.span,
            }));
            if let Err(prev) = self.symbols.declare(scope, &decl.name.name, var_id) {
                self.report_conflict(&decl.name.name, decl.name.span, prev.decl);
            }
        }

        for stmt in &block.stmts {
            self.bind_stmt(stmt, scope);
        }
    }

    fn bind_stmt(&mut self, stmt: &Stmt, scope: ScopeId) {
        match stmt {
            Stmt::Block(block) => self.bind_block(block, scope),
            Stmt::If(s) => {
                self.bind_stmt(&s.then_body, scope);
                if let Some(else_body) = &s.else_body {
                    self.bind_stmt(else_body, scope);
                }
            }
            Stmt::While(s) => self.bind_stmt(&s.body, scope),
            Stmt::For(s) => self.bind_stmt(&s.body, scope),
            Stmt::Expr(_)
            | Stmt::Break(_)
            | Stmt::Return(_)
            | Stmt::Print(_)
            | Stmt::Error(_) => {}
        }
    }
}
