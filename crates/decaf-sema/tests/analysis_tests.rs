//! Integration tests for the analysis pipeline: declaration resolution,
//! override and interface rules, the expression type rules, and the error
//! suppression policy.

use decaf_ast::builder::*;
use decaf_ast::{
    AstBuilder, BinaryOp, BreakStmt, ClassDecl, Decl, Expr, InterfaceDecl, Member, PrintStmt,
    ReturnStmt, Span, Stmt, UnaryOp, WhileStmt,
};
use decaf_sema::{analyze, Analysis, SemanticError};
use decaf_types::TypeTable;

fn run(b: AstBuilder, decls: Vec<Decl>) -> Result<Analysis, Vec<SemanticError>> {
    let program = b.finish(decls);
    let mut types = TypeTable::new();
    analyze(&program, &mut types)
}

fn expect_errors(b: AstBuilder, decls: Vec<Decl>) -> Vec<SemanticError> {
    run(b, decls).expect_err("expected diagnostics")
}

fn expect_clean(b: AstBuilder, decls: Vec<Decl>) -> Analysis {
    match run(b, decls) {
        Ok(analysis) => analysis,
        Err(errors) => panic!("expected a clean program, got {:?}", errors),
    }
}

fn expr_stmt(e: Expr) -> Stmt {
    Stmt::Expr(e)
}

fn ret(e: Expr) -> Stmt {
    Stmt::Return(ReturnStmt {
        span: Span::none(),
        value: Some(e),
    })
}

fn class(name: &str, extends: Option<&str>, implements: Vec<&str>, members: Vec<Member>) -> Decl {
    Decl::Class(ClassDecl {
        name: ident(name),
        extends: extends.map(ident),
        implements: implements.into_iter().map(ident).collect(),
        members,
    })
}

fn iface(name: &str, prototypes: Vec<decaf_ast::FnDecl>) -> Decl {
    Decl::Interface(InterfaceDecl {
        name: ident(name),
        prototypes,
    })
}

// ---- declaration conflicts --------------------------------------------------

#[test]
fn test_duplicate_globals_conflict() {
    let b = AstBuilder::new();
    let errors = expect_errors(
        b,
        vec![
            Decl::Var(var("x", int_ty())),
            Decl::Var(var("x", bool_ty())),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::DeclConflict { name, .. } if name == "x"));
}

#[test]
fn test_duplicate_locals_conflict_but_shadowing_is_legal() {
    // int x; void f() { int x; { int x; } }  -- fine
    let b = AstBuilder::new();
    expect_clean(
        b,
        vec![
            Decl::Var(var("x", int_ty())),
            Decl::Fn(func(
                "f",
                void_ty(),
                vec![],
                block(
                    vec![var("x", int_ty())],
                    vec![Stmt::Block(block(vec![var("x", int_ty())], vec![]))],
                ),
            )),
        ],
    );

    // void g() { int y; bool y; }  -- conflict
    let b = AstBuilder::new();
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "g",
            void_ty(),
            vec![],
            block(vec![var("y", int_ty()), var("y", bool_ty())], vec![]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::DeclConflict { name, .. } if name == "y"));
}

#[test]
fn test_field_conflicts_with_inherited_field() {
    let b = AstBuilder::new();
    let errors = expect_errors(
        b,
        vec![
            class("A", None, vec![], vec![Member::Field(var("f", int_ty()))]),
            class(
                "B",
                Some("A"),
                vec![],
                vec![Member::Field(var("f", int_ty()))],
            ),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::DeclConflict { name, .. } if name == "f"));
}

// ---- overrides (S4) ---------------------------------------------------------

#[test]
fn test_same_signature_in_unrelated_classes_is_clean() {
    let b = AstBuilder::new();
    expect_clean(
        b,
        vec![
            class(
                "A",
                None,
                vec![],
                vec![Member::Method(func(
                    "m",
                    void_ty(),
                    vec![],
                    block(vec![], vec![]),
                ))],
            ),
            class(
                "B",
                None,
                vec![],
                vec![Member::Method(func(
                    "m",
                    void_ty(),
                    vec![var("x", int_ty())],
                    block(vec![], vec![]),
                ))],
            ),
        ],
    );
}

#[test]
fn test_override_with_matching_prototype_is_clean() {
    let b = AstBuilder::new();
    expect_clean(
        b,
        vec![
            class(
                "A",
                None,
                vec![],
                vec![Member::Method(func(
                    "m",
                    int_ty(),
                    vec![var("x", int_ty())],
                    block(vec![], vec![]),
                ))],
            ),
            class(
                "C",
                Some("A"),
                vec![],
                vec![Member::Method(func(
                    "m",
                    int_ty(),
                    vec![var("y", int_ty())],
                    block(vec![], vec![]),
                ))],
            ),
        ],
    );
}

#[test]
fn test_override_with_extra_formal_is_exactly_one_mismatch() {
    let b = AstBuilder::new();
    let errors = expect_errors(
        b,
        vec![
            class(
                "A",
                None,
                vec![],
                vec![Member::Method(func(
                    "m",
                    void_ty(),
                    vec![],
                    block(vec![], vec![]),
                ))],
            ),
            class(
                "C",
                Some("A"),
                vec![],
                vec![Member::Method(func(
                    "m",
                    void_ty(),
                    vec![var("x", int_ty())],
                    block(vec![], vec![]),
                ))],
            ),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::OverrideMismatch { name, .. } if name == "m"));
}

#[test]
fn test_override_with_different_return_type_mismatches() {
    let b = AstBuilder::new();
    let errors = expect_errors(
        b,
        vec![
            class(
                "A",
                None,
                vec![],
                vec![Member::Method(func(
                    "m",
                    int_ty(),
                    vec![],
                    block(vec![], vec![]),
                ))],
            ),
            class(
                "C",
                Some("A"),
                vec![],
                vec![Member::Method(func(
                    "m",
                    bool_ty(),
                    vec![],
                    block(vec![], vec![]),
                ))],
            ),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::OverrideMismatch { .. }));
}

// ---- interfaces (S6) --------------------------------------------------------

#[test]
fn test_unimplemented_interface_is_reported_once() {
    let b = AstBuilder::new();
    let errors = expect_errors(
        b,
        vec![
            iface("I", vec![prototype("k", int_ty(), vec![])]),
            class("C", None, vec!["I"], vec![]),
        ],
    );
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        SemanticError::InterfaceNotImplemented { class, iface, .. } => {
            assert_eq!(class, "C");
            assert_eq!(iface, "I");
        }
        other => panic!("expected InterfaceNotImplemented, got {:?}", other),
    }
}

#[test]
fn test_implemented_interface_is_clean() {
    let mut b = AstBuilder::new();
    let zero = b.int(0);
    expect_clean(
        b,
        vec![
            iface("I", vec![prototype("k", int_ty(), vec![])]),
            class(
                "C",
                None,
                vec!["I"],
                vec![Member::Method(func(
                    "k",
                    int_ty(),
                    vec![],
                    block(vec![], vec![ret(zero)]),
                ))],
            ),
        ],
    );
}

#[test]
fn test_interface_satisfied_through_superclass_method() {
    let mut b = AstBuilder::new();
    let zero = b.int(0);
    expect_clean(
        b,
        vec![
            iface("I", vec![prototype("k", int_ty(), vec![])]),
            class(
                "Base",
                None,
                vec![],
                vec![Member::Method(func(
                    "k",
                    int_ty(),
                    vec![],
                    block(vec![], vec![ret(zero)]),
                ))],
            ),
            class("C", Some("Base"), vec!["I"], vec![]),
        ],
    );
}

#[test]
fn test_interface_receiver_method_call() {
    let mut b = AstBuilder::new();
    let zero = b.int(0);
    let recv = b.name("i");
    let call = b.method_call(recv, "k", vec![]);
    let call_id = call.id();
    let analysis = expect_clean(
        b,
        vec![
            iface("I", vec![prototype("k", int_ty(), vec![])]),
            class(
                "C",
                None,
                vec!["I"],
                vec![Member::Method(func(
                    "k",
                    int_ty(),
                    vec![],
                    block(vec![], vec![ret(zero)]),
                ))],
            ),
            Decl::Fn(func(
                "probe",
                int_ty(),
                vec![var("i", named_ty("I"))],
                block(vec![], vec![ret(call)]),
            )),
        ],
    );
    assert_eq!(analysis.expr_types.get(call_id), TypeTable::INT);
}

// ---- inheritance resolution -------------------------------------------------

#[test]
fn test_extends_unknown_class() {
    let b = AstBuilder::new();
    let errors = expect_errors(b, vec![class("C", Some("Ghost"), vec![], vec![])]);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::IdentifierNotDeclared { name, kind: decaf_sema::LookingFor::Class, .. }
            if name == "Ghost"
    ));
}

#[test]
fn test_implements_non_interface() {
    let b = AstBuilder::new();
    let errors = expect_errors(
        b,
        vec![
            class("A", None, vec![], vec![]),
            class("C", None, vec!["A"], vec![]),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::IdentifierNotDeclared { kind: decaf_sema::LookingFor::Interface, .. }
    ));
}

#[test]
fn test_inheritance_cycle_is_broken_and_reported() {
    let b = AstBuilder::new();
    let errors = expect_errors(
        b,
        vec![
            class("A", Some("B"), vec![], vec![]),
            class("B", Some("A"), vec![], vec![]),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::IdentifierNotDeclared { kind: decaf_sema::LookingFor::Class, .. }
    ));
}

#[test]
fn test_self_extension_is_a_cycle() {
    let b = AstBuilder::new();
    let errors = expect_errors(b, vec![class("A", Some("A"), vec![], vec![])]);
    assert_eq!(errors.len(), 1);
}

// ---- statement rules (S5) ---------------------------------------------------

#[test]
fn test_non_boolean_test_is_reported() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(
                vec![],
                vec![Stmt::If(decaf_ast::IfStmt {
                    span: Span::none(),
                    test: one,
                    then_body: Box::new(Stmt::Block(block(vec![], vec![]))),
                    else_body: None,
                })],
            ),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::TestNotBoolean { .. }));
}

#[test]
fn test_break_outside_loop_is_reported() {
    let b = AstBuilder::new();
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(vec![], vec![Stmt::Break(BreakStmt { span: Span::none() })]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::BreakOutsideLoop { .. }));
}

#[test]
fn test_break_inside_loop_is_clean() {
    let mut b = AstBuilder::new();
    let test = b.bool(true);
    expect_clean(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(
                vec![],
                vec![Stmt::While(WhileStmt {
                    span: Span::none(),
                    test,
                    body: Box::new(Stmt::Break(BreakStmt { span: Span::none() })),
                })],
            ),
        ))],
    );
}

#[test]
fn test_return_mismatch() {
    let mut b = AstBuilder::new();
    let val = b.bool(true);
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            int_ty(),
            vec![],
            block(vec![], vec![ret(val)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        SemanticError::ReturnMismatch { given, expected, .. } => {
            assert_eq!(given, "bool");
            assert_eq!(expected, "int");
        }
        other => panic!("expected ReturnMismatch, got {:?}", other),
    }
}

#[test]
fn test_bare_return_from_int_function_mismatches() {
    let b = AstBuilder::new();
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            int_ty(),
            vec![],
            block(
                vec![],
                vec![Stmt::Return(ReturnStmt {
                    span: Span::none(),
                    value: None,
                })],
            ),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::ReturnMismatch { given, .. } if given == "void"
    ));
}

#[test]
fn test_print_arg_mismatch_is_positional() {
    let mut b = AstBuilder::new();
    let ok = b.int(1);
    let bad = b.double(2.5);
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(
                vec![],
                vec![Stmt::Print(PrintStmt {
                    span: Span::none(),
                    args: vec![ok, bad],
                })],
            ),
        ))],
    );
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        SemanticError::PrintArgMismatch { index, given, .. } => {
            assert_eq!(*index, 2);
            assert_eq!(given, "double");
        }
        other => panic!("expected PrintArgMismatch, got {:?}", other),
    }
}

// ---- expression rules -------------------------------------------------------

#[test]
fn test_arithmetic_operand_mismatch() {
    let mut b = AstBuilder::new();
    let l = b.int(1);
    let r = b.bool(true);
    let sum = b.binary(BinaryOp::Add, l, r);
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(vec![], vec![expr_stmt(sum)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        SemanticError::IncompatibleOperands { op, left, right, .. } => {
            assert_eq!(op, "+");
            assert_eq!(left, "int");
            assert_eq!(right, "bool");
        }
        other => panic!("expected IncompatibleOperands, got {:?}", other),
    }
}

#[test]
fn test_error_suppression_reports_once() {
    // x = y + 1 with y undeclared: only the missing declaration is reported,
    // not the operand mismatch nor the assignment mismatch above it.
    let mut b = AstBuilder::new();
    let y = b.name("y");
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, y, one);
    let x = b.name("x");
    let assign = b.assign(x, sum);
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![var("x", int_ty())],
            block(vec![], vec![expr_stmt(assign)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::IdentifierNotDeclared { name, kind: decaf_sema::LookingFor::Variable, .. }
            if name == "y"
    ));
}

#[test]
fn test_unary_rules() {
    let mut b = AstBuilder::new();
    let t = b.bool(true);
    let neg = b.unary(UnaryOp::Neg, t);
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(vec![], vec![expr_stmt(neg)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::IncompatibleOperand { op, ty, .. } if op == "-" && ty == "bool"
    ));
}

#[test]
fn test_equality_follows_the_hierarchy() {
    // Dog == Animal and Dog == null are fine; Animal == int is not.
    let mut b = AstBuilder::new();
    let d1 = b.name("d");
    let a1 = b.name("a");
    let cmp = b.binary(BinaryOp::Equal, d1, a1);
    let d2 = b.name("d");
    let n = b.null();
    let cmp_null = b.binary(BinaryOp::Equal, d2, n);
    expect_clean(
        b,
        vec![
            class("Animal", None, vec![], vec![]),
            class("Dog", Some("Animal"), vec![], vec![]),
            Decl::Fn(func(
                "f",
                void_ty(),
                vec![var("d", named_ty("Dog")), var("a", named_ty("Animal"))],
                block(vec![], vec![expr_stmt(cmp), expr_stmt(cmp_null)]),
            )),
        ],
    );

    let mut b = AstBuilder::new();
    let a = b.name("a");
    let one = b.int(1);
    let cmp = b.binary(BinaryOp::Equal, a, one);
    let errors = expect_errors(
        b,
        vec![
            class("Animal", None, vec![], vec![]),
            Decl::Fn(func(
                "f",
                void_ty(),
                vec![var("a", named_ty("Animal"))],
                block(vec![], vec![expr_stmt(cmp)]),
            )),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::IncompatibleOperands { .. }));
}

#[test]
fn test_this_outside_class_scope() {
    let mut b = AstBuilder::new();
    let this = b.this();
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(vec![], vec![expr_stmt(this)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::ThisOutsideClassScope { .. }));
}

#[test]
fn test_subscript_rules() {
    let mut b = AstBuilder::new();
    let arr = b.name("a");
    let idx = b.bool(true);
    let access = b.index(arr, idx);
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![var("a", array_ty(int_ty()))],
            block(vec![], vec![expr_stmt(access)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::SubscriptNotInteger { .. }));

    let mut b = AstBuilder::new();
    let x = b.name("x");
    let idx = b.int(0);
    let access = b.index(x, idx);
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![var("x", int_ty())],
            block(vec![], vec![expr_stmt(access)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::BracketsOnNonArray { .. }));
}

#[test]
fn test_new_array_size_must_be_int() {
    let mut b = AstBuilder::new();
    let size = b.bool(true);
    let arr = b.new_array(size, int_ty());
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(vec![], vec![expr_stmt(arr)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::NewArraySizeNotInteger { .. }));
}

#[test]
fn test_new_requires_a_class() {
    let mut b = AstBuilder::new();
    let obj = b.new_object("Ghost");
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(vec![], vec![expr_stmt(obj)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::IdentifierNotDeclared { kind: decaf_sema::LookingFor::Class, .. }
    ));
}

// ---- calls ------------------------------------------------------------------

#[test]
fn test_call_arity_and_argument_types() {
    // g(1) against void g(bool): one ArgMismatch.
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let call = b.call("g", vec![one]);
    let errors = expect_errors(
        b,
        vec![
            Decl::Fn(func(
                "g",
                void_ty(),
                vec![var("flag", bool_ty())],
                block(vec![], vec![]),
            )),
            Decl::Fn(func(
                "f",
                void_ty(),
                vec![],
                block(vec![], vec![expr_stmt(call)]),
            )),
        ],
    );
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        SemanticError::ArgMismatch { index, given, expected, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(given, "int");
            assert_eq!(expected, "bool");
        }
        other => panic!("expected ArgMismatch, got {:?}", other),
    }

    // g() against void g(bool): one NumArgsMismatch.
    let mut b = AstBuilder::new();
    let call = b.call("g", vec![]);
    let errors = expect_errors(
        b,
        vec![
            Decl::Fn(func(
                "g",
                void_ty(),
                vec![var("flag", bool_ty())],
                block(vec![], vec![]),
            )),
            Decl::Fn(func(
                "f",
                void_ty(),
                vec![],
                block(vec![], vec![expr_stmt(call)]),
            )),
        ],
    );
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        SemanticError::NumArgsMismatch { name, expected, actual, .. } => {
            assert_eq!(name, "g");
            assert_eq!(*expected, 1);
            assert_eq!(*actual, 0);
        }
        other => panic!("expected NumArgsMismatch, got {:?}", other),
    }
}

#[test]
fn test_unknown_function_call() {
    let mut b = AstBuilder::new();
    let call = b.call("ghost", vec![]);
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(vec![], vec![expr_stmt(call)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::IdentifierNotDeclared { kind: decaf_sema::LookingFor::Function, .. }
    ));
}

#[test]
fn test_array_length_types_as_int() {
    let mut b = AstBuilder::new();
    let arr = b.name("a");
    let len = b.method_call(arr, "length", vec![]);
    let len_id = len.id();
    let analysis = expect_clean(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![var("a", array_ty(int_ty()))],
            block(vec![], vec![expr_stmt(len)]),
        ))],
    );
    assert_eq!(analysis.expr_types.get(len_id), TypeTable::INT);
}

#[test]
fn test_method_call_on_subclass_receiver_widens_arguments() {
    // void feed(Animal a) on Animal; feed(dog) is legal.
    let mut b = AstBuilder::new();
    let recv = b.name("a");
    let arg = b.name("d");
    let call = b.method_call(recv, "feed", vec![arg]);
    expect_clean(
        b,
        vec![
            class(
                "Animal",
                None,
                vec![],
                vec![Member::Method(func(
                    "feed",
                    void_ty(),
                    vec![var("other", named_ty("Animal"))],
                    block(vec![], vec![]),
                ))],
            ),
            class("Dog", Some("Animal"), vec![], vec![]),
            Decl::Fn(func(
                "f",
                void_ty(),
                vec![var("a", named_ty("Animal")), var("d", named_ty("Dog"))],
                block(vec![], vec![expr_stmt(call)]),
            )),
        ],
    );
}

#[test]
fn test_method_not_found_in_base() {
    let mut b = AstBuilder::new();
    let recv = b.name("a");
    let call = b.method_call(recv, "ghost", vec![]);
    let errors = expect_errors(
        b,
        vec![
            class("A", None, vec![], vec![]),
            Decl::Fn(func(
                "f",
                void_ty(),
                vec![var("a", named_ty("A"))],
                block(vec![], vec![expr_stmt(call)]),
            )),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::FieldNotFoundInBase { name, .. } if name == "ghost"
    ));
}

// ---- field access control ---------------------------------------------------

#[test]
fn test_field_access_outside_any_class_is_inaccessible() {
    // Global code touching a.f resolves the field but may not use it.
    let mut b = AstBuilder::new();
    let base = b.name("a");
    let access = b.field(base, "f");
    let errors = expect_errors(
        b,
        vec![
            class("A", None, vec![], vec![Member::Field(var("f", int_ty()))]),
            Decl::Fn(func(
                "g",
                void_ty(),
                vec![var("a", named_ty("A"))],
                block(vec![], vec![expr_stmt(access)]),
            )),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::InaccessibleField { name, .. } if name == "f"
    ));
}

#[test]
fn test_field_access_through_own_class_receiver_is_clean() {
    // A subclass method may reach the inherited field through an explicit
    // receiver of its own type, and through the bare name.
    let mut b = AstBuilder::new();
    let recv = b.name("c");
    let access = b.field(recv, "f");
    let one = b.int(1);
    let explicit = b.assign(access, one);
    let bare = b.name("f");
    let two = b.int(2);
    let implicit = b.assign(bare, two);
    expect_clean(
        b,
        vec![
            class("A", None, vec![], vec![Member::Field(var("f", int_ty()))]),
            class(
                "C",
                Some("A"),
                vec![],
                vec![Member::Method(func(
                    "m",
                    void_ty(),
                    vec![var("c", named_ty("C"))],
                    block(vec![], vec![expr_stmt(explicit), expr_stmt(implicit)]),
                ))],
            ),
        ],
    );
}

#[test]
fn test_field_access_through_ancestor_typed_receiver_is_inaccessible() {
    // From inside a strict subclass, an explicit receiver statically typed
    // as the ancestor is denied, even though the subclass inherits the field.
    let mut b = AstBuilder::new();
    let base = b.name("a");
    let access = b.field(base, "f");
    let errors = expect_errors(
        b,
        vec![
            class("A", None, vec![], vec![Member::Field(var("f", int_ty()))]),
            class(
                "B",
                Some("A"),
                vec![],
                vec![Member::Method(func(
                    "m",
                    void_ty(),
                    vec![var("a", named_ty("A"))],
                    block(vec![], vec![expr_stmt(access)]),
                ))],
            ),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::InaccessibleField { name, .. } if name == "f"
    ));
}

#[test]
fn test_field_access_from_ancestor_class_is_clean() {
    // The ancestor does not extend the subclass, so touching the subclass's
    // field through a subclass-typed receiver goes through.
    let mut b = AstBuilder::new();
    let base = b.name("b");
    let access = b.field(base, "f");
    expect_clean(
        b,
        vec![
            class(
                "A",
                None,
                vec![],
                vec![Member::Method(func(
                    "m",
                    void_ty(),
                    vec![var("b", named_ty("B"))],
                    block(vec![], vec![expr_stmt(access)]),
                ))],
            ),
            class(
                "B",
                Some("A"),
                vec![],
                vec![Member::Field(var("f", int_ty()))],
            ),
        ],
    );
}

#[test]
fn test_field_access_from_unrelated_class_is_clean() {
    // A class outside the receiver's hierarchy is not restricted.
    let mut b = AstBuilder::new();
    let base = b.name("a");
    let access = b.field(base, "f");
    expect_clean(
        b,
        vec![
            class("A", None, vec![], vec![Member::Field(var("f", int_ty()))]),
            class(
                "D",
                None,
                vec![],
                vec![Member::Method(func(
                    "m",
                    void_ty(),
                    vec![var("a", named_ty("A"))],
                    block(vec![], vec![expr_stmt(access)]),
                ))],
            ),
        ],
    );
}

#[test]
fn test_field_not_found_in_base() {
    let mut b = AstBuilder::new();
    let base = b.name("a");
    let access = b.field(base, "ghost");
    let errors = expect_errors(
        b,
        vec![
            class("A", None, vec![], vec![Member::Field(var("f", int_ty()))]),
            Decl::Fn(func(
                "g",
                void_ty(),
                vec![var("a", named_ty("A"))],
                block(vec![], vec![expr_stmt(access)]),
            )),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::FieldNotFoundInBase { name, .. } if name == "ghost"
    ));
}

// ---- type assignment totality ----------------------------------------------

#[test]
fn test_every_expression_gets_a_type() {
    let mut b = AstBuilder::new();
    let l = b.int(4);
    let r = b.int(2);
    let sum = b.binary(BinaryOp::Add, l, r);
    let sum_id = sum.id();
    let x = b.name("x");
    let x_id = x.id();
    let assign = b.assign(x, sum);
    let assign_id = assign.id();

    let analysis = expect_clean(
        b,
        vec![
            Decl::Var(var("x", int_ty())),
            Decl::Fn(func(
                "main",
                void_ty(),
                vec![],
                block(vec![], vec![expr_stmt(assign)]),
            )),
        ],
    );

    assert_eq!(analysis.expr_types.get(sum_id), TypeTable::INT);
    assert_eq!(analysis.expr_types.get(x_id), TypeTable::INT);
    assert_eq!(analysis.expr_types.get(assign_id), TypeTable::INT);
}

#[test]
fn test_assignment_widens_to_superclass() {
    let mut b = AstBuilder::new();
    let a = b.name("a");
    let d = b.name("d");
    let widen = b.assign(a, d);
    expect_clean(
        b,
        vec![
            class("Animal", None, vec![], vec![]),
            class("Dog", Some("Animal"), vec![], vec![]),
            Decl::Fn(func(
                "f",
                void_ty(),
                vec![var("a", named_ty("Animal")), var("d", named_ty("Dog"))],
                block(vec![], vec![expr_stmt(widen)]),
            )),
        ],
    );

    // The narrowing direction is rejected.
    let mut b = AstBuilder::new();
    let d = b.name("d");
    let a = b.name("a");
    let narrow = b.assign(d, a);
    let errors = expect_errors(
        b,
        vec![
            class("Animal", None, vec![], vec![]),
            class("Dog", Some("Animal"), vec![], vec![]),
            Decl::Fn(func(
                "f",
                void_ty(),
                vec![var("a", named_ty("Animal")), var("d", named_ty("Dog"))],
                block(vec![], vec![expr_stmt(narrow)]),
            )),
        ],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::IncompatibleOperands { .. }));
}

#[test]
fn test_unknown_declared_type_poisons_without_cascades() {
    // Ghost g; g = 1;  -- only the unknown type is reported.
    let mut b = AstBuilder::new();
    let g = b.name("g");
    let one = b.int(1);
    let assign = b.assign(g, one);
    let errors = expect_errors(
        b,
        vec![Decl::Fn(func(
            "f",
            void_ty(),
            vec![],
            block(vec![var("g", named_ty("Ghost"))], vec![expr_stmt(assign)]),
        ))],
    );
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::IdentifierNotDeclared { kind: decaf_sema::LookingFor::Type, .. }
    ));
}

#[test]
fn test_errors_are_sorted_by_location() {
    let mut b = AstBuilder::new();
    let late = b.this();
    let late = b.at(late, Span::new(9, 1, 4));
    let early = b.this();
    let early = b.at(early, Span::new(2, 1, 4));
    let errors = expect_errors(
        b,
        vec![
            Decl::Fn(func(
                "f",
                void_ty(),
                vec![],
                block(vec![], vec![expr_stmt(late)]),
            )),
            Decl::Fn(func(
                "g",
                void_ty(),
                vec![],
                block(vec![], vec![expr_stmt(early)]),
            )),
        ],
    );
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].span().line, 2);
    assert_eq!(errors[1].span().line, 9);
}
