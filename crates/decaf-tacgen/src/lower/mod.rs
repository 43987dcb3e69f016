//! AST to TAC lowering.
//!
//! Walks the checked tree with the analysis results in hand and drives the
//! [`CodeGenerator`]. Every function body becomes a label, a prologue, the
//! lowered body, and an epilogue; after all bodies one vtable
//! pseudo-instruction is emitted per class in declaration order.
//!
//! Callers must only lower programs whose analysis produced no diagnostics.
//!
//! Doubles are accepted by the checker but have no code-generation path in
//! this backend; a double constant lowers through the word-sized integer
//! path with its value truncated.

mod expr;
mod stmt;

use crate::codegen::CodeGenerator;
use crate::tac::{Location, TacProgram};
use decaf_ast::{Block, Decl, FnDecl, Member, Program};
use decaf_sema::{Analysis, DeclId};
use decaf_types::{TypeTable, TypeId};
use rustc_hash::FxHashMap;

/// Lower a checked program to its TAC stream.
pub fn lower_program(program: &Program, analysis: &Analysis, types: &TypeTable) -> TacProgram {
    let mut lowerer = Lowerer::new(program, analysis, types);
    lowerer.lower();
    lowerer.cg.finish()
}

pub(crate) struct Lowerer<'a> {
    pub(crate) program: &'a Program,
    pub(crate) analysis: &'a Analysis,
    pub(crate) types: &'a TypeTable,
    pub(crate) cg: CodeGenerator,
    /// Global variable slots by name.
    pub(crate) globals: FxHashMap<String, Location>,
    /// Per-function environment chain: innermost block last.
    pub(crate) locals: Vec<FxHashMap<String, Location>>,
    pub(crate) current_class: Option<DeclId>,
    pub(crate) this_loc: Option<Location>,
    /// Exit labels of the enclosing loops; `break` jumps to the last one.
    pub(crate) break_labels: Vec<String>,
}

impl<'a> Lowerer<'a> {
    fn new(program: &'a Program, analysis: &'a Analysis, types: &'a TypeTable) -> Self {
        Lowerer {
            program,
            analysis,
            types,
            cg: CodeGenerator::new(),
            globals: FxHashMap::default(),
            locals: Vec::new(),
            current_class: None,
            this_loc: None,
            break_labels: Vec::new(),
        }
    }

    fn lower(&mut self) {
        // Globals get their slots before any code refers to them.
        let mut global_index = 0;
        for decl in &self.program.decls {
            if let Decl::Var(v) = decl {
                let loc = CodeGenerator::global_location(&v.name.name, global_index);
                self.globals.insert(v.name.name.clone(), loc);
                global_index += 1;
            }
        }

        // Function bodies in declaration order, methods under their class.
        for (i, decl) in self.program.decls.iter().enumerate() {
            let id = self.analysis.binding.top_ids[i];
            match decl {
                Decl::Fn(f) => self.lower_function(f, None),
                Decl::Class(c) => {
                    self.current_class = Some(id);
                    for member in &c.members {
                        if let Member::Method(m) = member {
                            self.lower_function(m, Some(id));
                        }
                    }
                    self.current_class = None;
                }
                _ => {}
            }
        }

        // Vtables after all code.
        for (i, decl) in self.program.decls.iter().enumerate() {
            if let Decl::Class(c) = decl {
                let id = self.analysis.binding.top_ids[i];
                let labels = self.analysis.layouts.of(id).vtable();
                self.cg.gen_vtable(&c.name.name, labels);
            }
        }
    }

    pub(crate) fn function_label(&self, name: &str, owner: Option<DeclId>) -> String {
        match owner {
            Some(class) => {
                let class_name = &self.analysis.binding.registry.class(class).name;
                format!("_{}.{}", class_name, name)
            }
            None => format!("_{}", name),
        }
    }

    fn lower_function(&mut self, f: &FnDecl, owner: Option<DeclId>) {
        let body = match &f.body {
            Some(body) => body,
            None => return,
        };

        let label = self.function_label(&f.name.name, owner);
        self.cg.gen_label(&label);
        self.cg.gen_begin_func();

        self.locals.clear();
        self.locals.push(FxHashMap::default());

        // Methods receive `this` as the implicit first parameter; declared
        // formals follow.
        let has_this = owner.is_some() as i32;
        self.this_loc = owner.map(|_| CodeGenerator::param_location("this", 0));
        for (i, formal) in f.formals.iter().enumerate() {
            let loc = CodeGenerator::param_location(&formal.name.name, has_this + i as i32);
            self.locals
                .last_mut()
                .expect("function environment missing")
                .insert(formal.name.name.clone(), loc);
        }

        self.lower_block(body);

        self.cg.gen_end_func();
        self.this_loc = None;
    }

    pub(crate) fn lower_block(&mut self, block: &Block) {
        self.locals.push(FxHashMap::default());
        for decl in &block.decls {
            let loc = self.cg.alloc_local(&decl.name.name);
            self.locals
                .last_mut()
                .expect("block environment missing")
                .insert(decl.name.name.clone(), loc);
        }
        for stmt in &block.stmts {
            self.lower_stmt(stmt);
        }
        self.locals.pop();
    }

    /// The checked type of an expression.
    pub(crate) fn ty_of(&self, expr: &decaf_ast::Expr) -> TypeId {
        self.analysis.expr_types.get(expr.id())
    }

    /// The class or interface declaration behind a named type.
    pub(crate) fn decl_of_ty(&self, ty: TypeId) -> Option<DeclId> {
        self.analysis.binding.registry.decl_of_named(ty)
    }

    /// Where a bare name lives: block/param environment first, then a field
    /// of the current class, then a global. Mirrors the checker's scope
    /// chain.
    pub(crate) fn storage_of(&self, name: &str) -> Storage {
        for scope in self.locals.iter().rev() {
            if let Some(loc) = scope.get(name) {
                return Storage::Direct(loc.clone());
            }
        }
        if let Some(class) = self.current_class {
            if let Some(offset) = self.analysis.layouts.of(class).field_offset(name) {
                return Storage::ThisField(offset);
            }
        }
        match self.globals.get(name) {
            Some(loc) => Storage::Direct(loc.clone()),
            None => panic!("name '{}' survived checking but has no storage", name),
        }
    }

    /// Byte offset of `field` within objects of class `class`.
    pub(crate) fn field_offset(&self, class: DeclId, field: &str) -> i32 {
        self.analysis
            .layouts
            .of(class)
            .field_offset(field)
            .expect("field survived checking but has no offset")
    }

    /// The `this` pointer of the current method.
    pub(crate) fn this_location(&self) -> Location {
        self.this_loc
            .clone()
            .expect("implicit field access outside a method survived checking")
    }

    /// Object size of a class: fields plus the vtable word.
    pub(crate) fn object_size(&self, class: DeclId) -> i32 {
        self.analysis.layouts.of(class).object_size()
    }

    /// Vtable slot for a method dispatched on a receiver of static type
    /// `recv_ty`. For a class receiver the slot comes from the class layout;
    /// for an interface receiver it is the prototype's position, which the
    /// implementing class's layout reproduces.
    pub(crate) fn method_slot(&self, recv_ty: TypeId, name: &str) -> i32 {
        let registry = &self.analysis.binding.registry;
        let decl = self
            .decl_of_ty(recv_ty)
            .expect("method receiver survived checking without a declaration");
        let slot = if registry.is_class(decl) {
            self.analysis.layouts.of(decl).slot_of(name)
        } else {
            registry
                .iface(decl)
                .methods
                .iter()
                .position(|&m| registry.func(m).name == name)
                .map(|i| i as u32)
        };
        slot.expect("method survived checking but has no vtable slot") as i32
    }

    /// Is a method named `name` dispatchable on the current class?
    pub(crate) fn current_class_slot(&self, name: &str) -> Option<i32> {
        let class = self.current_class?;
        self.analysis
            .layouts
            .of(class)
            .slot_of(name)
            .map(|s| s as i32)
    }
}

/// Resolved storage for a bare name.
pub(crate) enum Storage {
    /// A local, parameter, or global slot used directly.
    Direct(Location),
    /// A field of `this` at the given byte offset.
    ThisField(i32),
}
