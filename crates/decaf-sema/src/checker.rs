//! The type checker.
//!
//! Walks every function body once, assigning a type to every expression in a
//! side table indexed by [`ExprId`]. The lexical context - current class,
//! current function return type, loop depth - is threaded through the walker
//! explicitly; nothing points back up the tree.
//!
//! Error policy: once an operand types as `error`, the enclosing expression
//! stays silent and poisons (or types `bool` where the surroundings need a
//! boolean to keep checking). Every diagnostic is reported at most once per
//! offending node.

use crate::assign::AssignCx;
use crate::binder::{resolve_type_expr, Binding};
use crate::error::{LookingFor, SemanticError};
use crate::registry::DeclId;
use crate::report::Reporter;
use crate::symbols::ScopeId;
use decaf_ast::{
    BinaryOp, Block, CallExpr, Decl, Expr, ExprId, FieldAccessExpr, FnDecl, Member, Program, Span,
    Stmt, UnaryOp,
};
use decaf_types::{TypeTable, TypeId};

/// Per-expression types, indexed by [`ExprId`]. Expressions the checker never
/// reaches stay `error` rather than unassigned.
#[derive(Debug, Clone)]
pub struct ExprTypes {
    types: Vec<TypeId>,
}

impl ExprTypes {
    pub fn new(expr_count: u32) -> Self {
        ExprTypes {
            types: vec![TypeTable::ERROR; expr_count as usize],
        }
    }

    pub fn get(&self, id: ExprId) -> TypeId {
        self.types[id.index()]
    }

    fn set(&mut self, id: ExprId, ty: TypeId) {
        self.types[id.index()] = ty;
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

pub struct Checker<'a> {
    types: &'a mut TypeTable,
    binding: &'a Binding,
    reporter: &'a mut Reporter,
    expr_types: ExprTypes,
    /// Cursor into the binder's scope record; advanced in the same visit
    /// order the binder used.
    scope_cursor: usize,
    current_scope: ScopeId,
    current_class: Option<DeclId>,
    current_ret: TypeId,
    loop_depth: u32,
}

impl<'a> Checker<'a> {
    pub fn new(
        program: &Program,
        binding: &'a Binding,
        types: &'a mut TypeTable,
        reporter: &'a mut Reporter,
    ) -> Self {
        Checker {
            types,
            binding,
            reporter,
            expr_types: ExprTypes::new(program.expr_count),
            scope_cursor: 0,
            current_scope: crate::symbols::GLOBAL_SCOPE,
            current_class: None,
            current_ret: TypeTable::VOID,
            loop_depth: 0,
        }
    }

    /// Check the whole program and hand back the expression type table.
    pub fn check(mut self, program: &Program) -> ExprTypes {
        for (i, decl) in program.decls.iter().enumerate() {
            let id = self.binding.top_ids[i];
            match decl {
                Decl::Var(_) => {}
                Decl::Fn(f) => self.check_fn(id, f),
                Decl::Class(c) => {
                    let methods = self.binding.registry.class(id).methods.clone();
                    let mut next = methods.into_iter();
                    self.current_class = Some(id);
                    for member in &c.members {
                        if let Member::Method(m) = member {
                            let fn_id = next
                                .next()
                                .expect("class method list out of sync with member walk");
                            self.check_fn(fn_id, m);
                        }
                    }
                    self.current_class = None;
                }
                Decl::Interface(_) => {}
            }
        }
        self.expr_types
    }

    fn next_body_scope(&mut self) -> ScopeId {
        let scope = self.binding.body_scopes[self.scope_cursor];
        self.scope_cursor += 1;
        scope
    }

    fn assign_cx(&self) -> AssignCx<'_> {
        AssignCx::new(self.types, &self.binding.registry)
    }

    fn display(&self, ty: TypeId) -> String {
        self.types.display(ty)
    }

    fn check_fn(&mut self, fn_id: DeclId, ast: &FnDecl) {
        let body = match &ast.body {
            Some(body) => body,
            None => return,
        };
        let fn_scope = self.next_body_scope();
        let saved_scope = self.current_scope;
        let saved_ret = self.current_ret;
        self.current_scope = fn_scope;
        self.current_ret = self.binding.registry.func(fn_id).ret;

        self.check_block(body);

        self.current_scope = saved_scope;
        self.current_ret = saved_ret;
    }

    fn check_block(&mut self, block: &Block) {
        let scope = self.next_body_scope();
        let saved = self.current_scope;
        self.current_scope = scope;
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.current_scope = saved;
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) => {
                self.check_expr(e);
            }
            Stmt::Block(block) => self.check_block(block),
            Stmt::If(s) => {
                let test = self.check_expr(&s.test);
                self.check_test(test, s.test.span());
                self.check_stmt(&s.then_body);
                if let Some(else_body) = &s.else_body {
                    self.check_stmt(else_body);
                }
            }
            Stmt::While(s) => {
                let test = self.check_expr(&s.test);
                self.check_test(test, s.test.span());
                self.loop_depth += 1;
                self.check_stmt(&s.body);
                self.loop_depth -= 1;
            }
            Stmt::For(s) => {
                self.check_expr(&s.init);
                let test = self.check_expr(&s.test);
                self.check_test(test, s.test.span());
                self.check_expr(&s.step);
                self.loop_depth += 1;
                self.check_stmt(&s.body);
                self.loop_depth -= 1;
            }
            Stmt::Break(s) => {
                if self.loop_depth == 0 {
                    self.reporter
                        .report(SemanticError::BreakOutsideLoop { span: s.span });
                }
            }
            Stmt::Return(s) => {
                let got = match &s.value {
                    Some(e) => self.check_expr(e),
                    None => TypeTable::VOID,
                };
                if !self.assign_cx().is_assignable(got, self.current_ret) {
                    let err = SemanticError::ReturnMismatch {
                        given: self.display(got),
                        expected: self.display(self.current_ret),
                        span: s.span,
                    };
                    self.reporter.report(err);
                }
            }
            Stmt::Print(s) => {
                for (i, arg) in s.args.iter().enumerate() {
                    let ty = self.check_expr(arg);
                    let printable = matches!(
                        ty,
                        TypeTable::INT | TypeTable::BOOL | TypeTable::STRING | TypeTable::ERROR
                    );
                    if !printable {
                        let err = SemanticError::PrintArgMismatch {
                            index: i + 1,
                            given: self.display(ty),
                            span: arg.span(),
                        };
                        self.reporter.report(err);
                    }
                }
            }
            Stmt::Error(_) => {}
        }
    }

    fn check_test(&mut self, ty: TypeId, span: Span) {
        if ty != TypeTable::BOOL && ty != TypeTable::ERROR {
            self.reporter.report(SemanticError::TestNotBoolean { span });
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> TypeId {
        let ty = match expr {
            Expr::IntLit(_) => TypeTable::INT,
            Expr::DoubleLit(_) => TypeTable::DOUBLE,
            Expr::BoolLit(_) => TypeTable::BOOL,
            Expr::StringLit(_) => TypeTable::STRING,
            Expr::NullLit(_) => TypeTable::NULL,
            Expr::Empty(_) => TypeTable::VOID,
            Expr::Error(_) => TypeTable::ERROR,
            Expr::Binary(b) => {
                let left = self.check_expr(&b.left);
                let right = self.check_expr(&b.right);
                self.check_binary(b.op, left, right, b.span)
            }
            Expr::Unary(u) => {
                let operand = self.check_expr(&u.operand);
                self.check_unary(u.op, operand, u.span)
            }
            Expr::Assign(a) => {
                let target = self.check_expr(&a.target);
                let value = self.check_expr(&a.value);
                if target == TypeTable::ERROR || value == TypeTable::ERROR {
                    TypeTable::ERROR
                } else if !self.assign_cx().is_assignable(value, target) {
                    let err = SemanticError::IncompatibleOperands {
                        op: "=".to_string(),
                        left: self.display(target),
                        right: self.display(value),
                        span: a.span,
                    };
                    self.reporter.report(err);
                    TypeTable::ERROR
                } else {
                    target
                }
            }
            Expr::This(t) => match self.current_class {
                Some(class) => self.binding.registry.class(class).self_ty,
                None => {
                    self.reporter
                        .report(SemanticError::ThisOutsideClassScope { span: t.span });
                    TypeTable::ERROR
                }
            },
            Expr::ArrayAccess(a) => {
                let base = self.check_expr(&a.base);
                let subscript = self.check_expr(&a.subscript);
                if subscript != TypeTable::INT && subscript != TypeTable::ERROR {
                    self.reporter.report(SemanticError::SubscriptNotInteger {
                        span: a.subscript.span(),
                    });
                }
                if base == TypeTable::ERROR {
                    TypeTable::ERROR
                } else {
                    match self.types.element_of(base) {
                        Some(elem) => elem,
                        None => {
                            self.reporter.report(SemanticError::BracketsOnNonArray {
                                span: a.base.span(),
                            });
                            TypeTable::ERROR
                        }
                    }
                }
            }
            Expr::FieldAccess(f) => self.check_field_access(f),
            Expr::Call(c) => self.check_call(c),
            Expr::NewObject(n) => {
                let entry = self
                    .binding
                    .symbols
                    .lookup_local(crate::symbols::GLOBAL_SCOPE, &n.class.name);
                match entry {
                    Some(e) if self.binding.registry.is_class(e.decl) => {
                        self.binding.registry.class(e.decl).self_ty
                    }
                    _ => {
                        self.reporter.report(SemanticError::IdentifierNotDeclared {
                            name: n.class.name.clone(),
                            kind: LookingFor::Class,
                            span: n.class.span,
                        });
                        TypeTable::ERROR
                    }
                }
            }
            Expr::NewArray(n) => {
                let size = self.check_expr(&n.size);
                if size != TypeTable::INT && size != TypeTable::ERROR {
                    self.reporter.report(SemanticError::NewArraySizeNotInteger {
                        span: n.size.span(),
                    });
                }
                let elem = resolve_type_expr(
                    &n.elem,
                    self.types,
                    &self.binding.symbols,
                    &self.binding.registry,
                    self.reporter,
                );
                if elem == TypeTable::ERROR {
                    TypeTable::ERROR
                } else {
                    self.types.array_of(elem)
                }
            }
            Expr::Read(r) => match r.kind {
                decaf_ast::ReadKind::Integer => TypeTable::INT,
                decaf_ast::ReadKind::Line => TypeTable::STRING,
            },
        };
        self.expr_types.set(expr.id(), ty);
        ty
    }

    fn check_binary(&mut self, op: BinaryOp, left: TypeId, right: TypeId, span: Span) -> TypeId {
        let poisoned = left == TypeTable::ERROR || right == TypeTable::ERROR;
        let report = |checker: &mut Self| {
            let err = SemanticError::IncompatibleOperands {
                op: op.to_string(),
                left: checker.display(left),
                right: checker.display(right),
                span,
            };
            checker.reporter.report(err);
        };

        if op.is_arithmetic() {
            if poisoned {
                TypeTable::ERROR
            } else if left == right && self.types.is_numeric(left) {
                left
            } else {
                report(self);
                TypeTable::ERROR
            }
        } else if op.is_relational() {
            if poisoned {
                TypeTable::BOOL
            } else if left == right && self.types.is_numeric(left) {
                TypeTable::BOOL
            } else {
                report(self);
                TypeTable::ERROR
            }
        } else if op.is_equality() {
            if poisoned {
                TypeTable::BOOL
            } else if self.assign_cx().mutually_compatible(left, right) {
                TypeTable::BOOL
            } else {
                report(self);
                TypeTable::ERROR
            }
        } else {
            // Logical.
            if poisoned {
                TypeTable::BOOL
            } else if left == TypeTable::BOOL && right == TypeTable::BOOL {
                TypeTable::BOOL
            } else {
                report(self);
                TypeTable::ERROR
            }
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: TypeId, span: Span) -> TypeId {
        match op {
            UnaryOp::Neg => {
                if operand == TypeTable::ERROR {
                    TypeTable::ERROR
                } else if self.types.is_numeric(operand) {
                    operand
                } else {
                    let err = SemanticError::IncompatibleOperand {
                        op: "-".to_string(),
                        ty: self.display(operand),
                        span,
                    };
                    self.reporter.report(err);
                    TypeTable::ERROR
                }
            }
            UnaryOp::Not => {
                if operand == TypeTable::ERROR {
                    TypeTable::BOOL
                } else if operand == TypeTable::BOOL {
                    TypeTable::BOOL
                } else {
                    let err = SemanticError::IncompatibleOperand {
                        op: "!".to_string(),
                        ty: self.display(operand),
                        span,
                    };
                    self.reporter.report(err);
                    TypeTable::ERROR
                }
            }
        }
    }

    fn check_field_access(&mut self, f: &FieldAccessExpr) -> TypeId {
        let registry = &self.binding.registry;
        match &f.base {
            Some(base) => {
                let base_ty = self.check_expr(base);
                if base_ty == TypeTable::ERROR || base_ty == TypeTable::NULL {
                    return TypeTable::ERROR;
                }
                let registry = &self.binding.registry;
                let decl = match registry.decl_of_named(base_ty) {
                    Some(decl) => decl,
                    None => {
                        let err = SemanticError::FieldNotFoundInBase {
                            name: f.field.name.clone(),
                            base: self.display(base_ty),
                            span: f.field.span,
                        };
                        self.reporter.report(err);
                        return TypeTable::ERROR;
                    }
                };
                let scope = if registry.is_class(decl) {
                    registry.class(decl).scope
                } else {
                    registry.iface(decl).scope
                };
                let entry = self.binding.symbols.lookup_local(scope, &f.field.name);
                let var = entry.filter(|e| registry.is_var(e.decl));
                let var = match var {
                    Some(entry) => entry,
                    None => {
                        let err = SemanticError::FieldNotFoundInBase {
                            name: f.field.name.clone(),
                            base: self.display(base_ty),
                            span: f.field.span,
                        };
                        self.reporter.report(err);
                        return TypeTable::ERROR;
                    }
                };
                // Access is denied when there is no syntactically enclosing
                // class, or when the enclosing class strictly extends the
                // base's static class; same-class, ancestor, and unrelated
                // contexts go through.
                let denied = match self.current_class {
                    None => true,
                    Some(current) => registry.extends_transitively(current, decl),
                };
                if denied {
                    let err = SemanticError::InaccessibleField {
                        name: f.field.name.clone(),
                        base: self.display(base_ty),
                        span: f.field.span,
                    };
                    self.reporter.report(err);
                    return TypeTable::ERROR;
                }
                registry.var(var.decl).ty
            }
            None => {
                let entry = self.binding.symbols.resolve(self.current_scope, &f.field.name);
                match entry.filter(|e| registry.is_var(e.decl)) {
                    Some(entry) => registry.var(entry.decl).ty,
                    None => {
                        self.reporter.report(SemanticError::IdentifierNotDeclared {
                            name: f.field.name.clone(),
                            kind: LookingFor::Variable,
                            span: f.field.span,
                        });
                        TypeTable::ERROR
                    }
                }
            }
        }
    }

    fn check_call(&mut self, c: &CallExpr) -> TypeId {
        // Actuals are checked before the callee is resolved, so their types
        // are assigned even when the call itself is bogus.
        let arg_tys: Vec<TypeId> = c.args.iter().map(|arg| self.check_expr(arg)).collect();

        let fn_decl = match &c.base {
            Some(base) => {
                let base_ty = self.check_expr(base);
                if base_ty == TypeTable::ERROR || base_ty == TypeTable::NULL {
                    return TypeTable::ERROR;
                }
                if self.types.element_of(base_ty).is_some() {
                    // The one built-in method on arrays.
                    if c.method.name == "length" {
                        return TypeTable::INT;
                    }
                    let err = SemanticError::FieldNotFoundInBase {
                        name: c.method.name.clone(),
                        base: self.display(base_ty),
                        span: c.method.span,
                    };
                    self.reporter.report(err);
                    return TypeTable::ERROR;
                }
                let registry = &self.binding.registry;
                let found = registry.decl_of_named(base_ty).and_then(|decl| {
                    let scope = if registry.is_class(decl) {
                        registry.class(decl).scope
                    } else {
                        registry.iface(decl).scope
                    };
                    self.binding
                        .symbols
                        .lookup_local(scope, &c.method.name)
                        .filter(|e| registry.is_fn(e.decl))
                });
                match found {
                    Some(entry) => entry.decl,
                    None => {
                        let err = SemanticError::FieldNotFoundInBase {
                            name: c.method.name.clone(),
                            base: self.display(base_ty),
                            span: c.method.span,
                        };
                        self.reporter.report(err);
                        return TypeTable::ERROR;
                    }
                }
            }
            None => {
                let registry = &self.binding.registry;
                let entry = self
                    .binding
                    .symbols
                    .resolve(self.current_scope, &c.method.name)
                    .filter(|e| registry.is_fn(e.decl));
                match entry {
                    Some(entry) => entry.decl,
                    None => {
                        self.reporter.report(SemanticError::IdentifierNotDeclared {
                            name: c.method.name.clone(),
                            kind: LookingFor::Function,
                            span: c.method.span,
                        });
                        return TypeTable::ERROR;
                    }
                }
            }
        };

        let (ret, formals) = {
            let info = self.binding.registry.func(fn_decl);
            (info.ret, info.formals.clone())
        };

        let need = formals.len();
        let have = arg_tys.len();
        if have != need {
            self.reporter.report(SemanticError::NumArgsMismatch {
                name: c.method.name.clone(),
                expected: need,
                actual: have,
                span: c.method.span,
            });
            return ret;
        }

        for (i, (arg_ty, (_, formal_ty))) in arg_tys.iter().zip(&formals).enumerate() {
            if !self.assign_cx().is_assignable(*arg_ty, *formal_ty) {
                let err = SemanticError::ArgMismatch {
                    index: i + 1,
                    given: self.display(*arg_ty),
                    expected: self.display(*formal_ty),
                    span: c.args[i].span(),
                };
                self.reporter.report(err);
            }
        }

        ret
    }
}
