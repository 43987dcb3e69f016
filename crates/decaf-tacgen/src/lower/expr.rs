//! Expression lowering.
//!
//! Every recipe leaves its result in a location and returns it; void calls
//! and the empty expression return `None`. The TAC op set is minimal, so
//! `>`, `<=`, `>=`, `!=` and the unary operators are synthesized from `<`,
//! `==`, `-` and `||`.

use super::{Lowerer, Storage};
use crate::codegen::{Builtin, WORD_SIZE};
use crate::tac::{BinOp, Location};
use decaf_ast::{
    ArrayAccessExpr, AssignExpr, BinaryOp, CallExpr, Expr, FieldAccessExpr, NewArrayExpr,
    NewObjectExpr, ReadKind, UnaryOp,
};
use decaf_types::TypeTable;

const OUT_OF_BOUNDS_MSG: &str = "Decaf runtime error: Array subscript out of bounds\n";
const BAD_ARRAY_SIZE_MSG: &str = "Decaf runtime error: Array size is <= 0\n";

impl<'a> Lowerer<'a> {
    pub(crate) fn lower_expr(&mut self, expr: &Expr) -> Option<Location> {
        match expr {
            Expr::IntLit(e) => Some(self.cg.gen_load_const(e.value)),
            // No double path in this backend; the value takes the word-sized
            // constant route truncated.
            Expr::DoubleLit(e) => Some(self.cg.gen_load_const(e.value as i32)),
            Expr::BoolLit(e) => Some(self.cg.gen_load_const(e.value as i32)),
            Expr::StringLit(e) => Some(self.cg.gen_load_str(&e.value)),
            Expr::NullLit(_) => Some(self.cg.gen_load_const(0)),
            Expr::Empty(_) => None,
            Expr::Error(_) => Some(self.cg.gen_load_const(0)),
            Expr::Binary(b) => {
                let string_operands = self.ty_of(&b.left) == TypeTable::STRING;
                let left = self
                    .lower_expr(&b.left)
                    .expect("binary operand has no value");
                let right = self
                    .lower_expr(&b.right)
                    .expect("binary operand has no value");
                Some(self.lower_binary(b.op, left, right, string_operands))
            }
            Expr::Unary(u) => {
                let operand = self
                    .lower_expr(&u.operand)
                    .expect("unary operand has no value");
                Some(match u.op {
                    UnaryOp::Neg => {
                        let zero = self.cg.gen_load_const(0);
                        self.cg.gen_binary(BinOp::Sub, zero, operand)
                    }
                    UnaryOp::Not => self.negate(operand),
                })
            }
            Expr::Assign(a) => Some(self.lower_assign(a)),
            Expr::This(_) => Some(self.this_location()),
            Expr::ArrayAccess(a) => Some(self.lower_array_load(a)),
            Expr::FieldAccess(f) => Some(self.lower_field_load(f)),
            Expr::Call(c) => self.lower_call(c),
            Expr::NewObject(n) => Some(self.lower_new_object(n)),
            Expr::NewArray(n) => Some(self.lower_new_array(n)),
            Expr::Read(r) => match r.kind {
                ReadKind::Integer => self.cg.gen_builtin_call(Builtin::ReadInteger, &[]),
                ReadKind::Line => self.cg.gen_builtin_call(Builtin::ReadLine, &[]),
            },
        }
    }

    /// `x == 0`, the boolean complement of a 0/1 value.
    fn negate(&mut self, value: Location) -> Location {
        let zero = self.cg.gen_load_const(0);
        self.cg.gen_binary(BinOp::Equal, value, zero)
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: Location,
        right: Location,
        string_operands: bool,
    ) -> Location {
        // String equality goes through the runtime helper.
        if string_operands && op.is_equality() {
            let eq = self
                .cg
                .gen_builtin_call(Builtin::StringEqual, &[left, right])
                .expect("StringEqual returns a value");
            return match op {
                BinaryOp::Equal => eq,
                _ => self.negate(eq),
            };
        }

        match op {
            BinaryOp::Add => self.cg.gen_binary(BinOp::Add, left, right),
            BinaryOp::Sub => self.cg.gen_binary(BinOp::Sub, left, right),
            BinaryOp::Mul => self.cg.gen_binary(BinOp::Mul, left, right),
            BinaryOp::Div => self.cg.gen_binary(BinOp::Div, left, right),
            BinaryOp::Mod => self.cg.gen_binary(BinOp::Mod, left, right),
            BinaryOp::And => self.cg.gen_binary(BinOp::And, left, right),
            BinaryOp::Or => self.cg.gen_binary(BinOp::Or, left, right),
            BinaryOp::Equal => self.cg.gen_binary(BinOp::Equal, left, right),
            BinaryOp::NotEqual => {
                let eq = self.cg.gen_binary(BinOp::Equal, left, right);
                self.negate(eq)
            }
            BinaryOp::Less => self.cg.gen_binary(BinOp::Less, left, right),
            // a > b  ==  b < a
            BinaryOp::Greater => self.cg.gen_binary(BinOp::Less, right, left),
            BinaryOp::LessEq => {
                let lt = self.cg.gen_binary(BinOp::Less, left.clone(), right.clone());
                let eq = self.cg.gen_binary(BinOp::Equal, left, right);
                self.cg.gen_binary(BinOp::Or, lt, eq)
            }
            BinaryOp::GreaterEq => {
                let gt = self.cg.gen_binary(BinOp::Less, right.clone(), left.clone());
                let eq = self.cg.gen_binary(BinOp::Equal, left, right);
                self.cg.gen_binary(BinOp::Or, gt, eq)
            }
        }
    }

    /// Evaluate the right-hand side, then store through the target.
    fn lower_assign(&mut self, a: &AssignExpr) -> Location {
        let value = self
            .lower_expr(&a.value)
            .expect("assignment source has no value");

        match a.target.as_ref() {
            Expr::FieldAccess(f) => match &f.base {
                Some(base) => {
                    let base_ty = self.ty_of(base);
                    let base_loc = self
                        .lower_expr(base)
                        .expect("field base has no value");
                    let class = self
                        .decl_of_ty(base_ty)
                        .expect("field base survived checking without a class");
                    let offset = self.field_offset(class, &f.field.name);
                    self.cg.gen_store(base_loc, offset, value.clone());
                }
                None => match self.storage_of(&f.field.name) {
                    Storage::Direct(loc) => self.cg.gen_assign(loc, value.clone()),
                    Storage::ThisField(offset) => {
                        let this = self.this_location();
                        self.cg.gen_store(this, offset, value.clone());
                    }
                },
            },
            Expr::ArrayAccess(t) => {
                let base = self
                    .lower_expr(&t.base)
                    .expect("array base has no value");
                let subscript = self
                    .lower_expr(&t.subscript)
                    .expect("subscript has no value");
                self.emit_bounds_check(&base, &subscript);
                let addr = self.element_address(base, subscript);
                self.cg.gen_store(addr, 0, value.clone());
            }
            other => {
                // Degenerate target; evaluate it and assign over its result.
                if let Some(loc) = self.lower_expr(other) {
                    self.cg.gen_assign(loc, value.clone());
                }
            }
        }

        value
    }

    fn lower_field_load(&mut self, f: &FieldAccessExpr) -> Location {
        match &f.base {
            Some(base) => {
                let base_ty = self.ty_of(base);
                let base_loc = self
                    .lower_expr(base)
                    .expect("field base has no value");
                let class = self
                    .decl_of_ty(base_ty)
                    .expect("field base survived checking without a class");
                let offset = self.field_offset(class, &f.field.name);
                self.cg.gen_load(base_loc, offset)
            }
            None => match self.storage_of(&f.field.name) {
                Storage::Direct(loc) => {
                    let dst = self.cg.alloc_temp();
                    self.cg.gen_assign(dst.clone(), loc);
                    dst
                }
                Storage::ThisField(offset) => {
                    let this = self.this_location();
                    self.cg.gen_load(this, offset)
                }
            },
        }
    }

    fn lower_array_load(&mut self, a: &ArrayAccessExpr) -> Location {
        let base = self
            .lower_expr(&a.base)
            .expect("array base has no value");
        let subscript = self
            .lower_expr(&a.subscript)
            .expect("subscript has no value");
        self.emit_bounds_check(&base, &subscript);
        let addr = self.element_address(base, subscript);
        self.cg.gen_load(addr, 0)
    }

    /// `base + 4 * subscript`
    fn element_address(&mut self, base: Location, subscript: Location) -> Location {
        let word = self.cg.gen_load_const(WORD_SIZE);
        let offset = self.cg.gen_binary(BinOp::Mul, subscript, word);
        self.cg.gen_binary(BinOp::Add, base, offset)
    }

    /// `subscript < 0 || subscript >= *(base - 4)` prints the runtime
    /// message and halts; the fall-through continues with the access.
    fn emit_bounds_check(&mut self, base: &Location, subscript: &Location) {
        let zero = self.cg.gen_load_const(0);
        let negative = self
            .cg
            .gen_binary(BinOp::Less, subscript.clone(), zero);
        let length = self.cg.gen_load(base.clone(), -WORD_SIZE);
        let within = self.cg.gen_binary(BinOp::Less, subscript.clone(), length);
        let too_big = self.negate(within);
        let bad = self.cg.gen_binary(BinOp::Or, negative, too_big);

        let ok = self.cg.new_label();
        self.cg.gen_ifz(bad, &ok);
        let msg = self.cg.gen_load_str(OUT_OF_BOUNDS_MSG);
        self.cg.gen_builtin_call(Builtin::PrintString, &[msg]);
        self.cg.gen_builtin_call(Builtin::Halt, &[]);
        self.cg.gen_label(&ok);
    }

    fn lower_call(&mut self, c: &CallExpr) -> Option<Location> {
        let has_result = self.analysis.expr_types.get(c.id) != TypeTable::VOID;

        match &c.base {
            Some(base) => {
                let base_ty = self.ty_of(base);

                // arr.length() reads the length header below the elements.
                if self.types.element_of(base_ty).is_some() {
                    let base_loc = self
                        .lower_expr(base)
                        .expect("array base has no value");
                    return Some(self.cg.gen_load(base_loc, -WORD_SIZE));
                }

                let receiver = self
                    .lower_expr(base)
                    .expect("method receiver has no value");
                let slot = self.method_slot(base_ty, &c.method.name);
                self.emit_dispatch(receiver, slot, &c.args, has_result)
            }
            None => {
                // A bare call is a method of the current class when its name
                // dispatches there, a global function otherwise - the same
                // order the checker resolved it in.
                if let Some(slot) = self.current_class_slot(&c.method.name) {
                    let receiver = self.this_location();
                    self.emit_dispatch(receiver, slot, &c.args, has_result)
                } else {
                    let args: Vec<Location> = c
                        .args
                        .iter()
                        .map(|arg| {
                            self.lower_expr(arg)
                                .expect("call argument has no value")
                        })
                        .collect();
                    for arg in args.iter().rev() {
                        self.cg.gen_push_param(arg.clone());
                    }
                    let label = self.function_label(&c.method.name, None);
                    let result = self.cg.gen_lcall(&label, has_result);
                    self.cg.gen_pop_params(WORD_SIZE * args.len() as i32);
                    result
                }
            }
        }
    }

    /// Virtual dispatch: function pointer out of the receiver's vtable,
    /// arguments pushed right-to-left, receiver pushed last.
    fn emit_dispatch(
        &mut self,
        receiver: Location,
        slot: i32,
        args: &[Expr],
        has_result: bool,
    ) -> Option<Location> {
        let arg_locs: Vec<Location> = args
            .iter()
            .map(|arg| {
                self.lower_expr(arg)
                    .expect("call argument has no value")
            })
            .collect();

        let vtable = self.cg.gen_load(receiver.clone(), 0);
        let fnptr = self.cg.gen_load(vtable, slot * WORD_SIZE);

        for arg in arg_locs.iter().rev() {
            self.cg.gen_push_param(arg.clone());
        }
        self.cg.gen_push_param(receiver);

        let result = self.cg.gen_acall(fnptr, has_result);
        self.cg
            .gen_pop_params(WORD_SIZE * (arg_locs.len() as i32 + 1));
        result
    }

    /// `Alloc` one word per field plus the vtable word, then plant the
    /// vtable pointer at offset 0.
    fn lower_new_object(&mut self, n: &NewObjectExpr) -> Location {
        let ty = self.analysis.expr_types.get(n.id);
        let class = self
            .decl_of_ty(ty)
            .expect("new survived checking without a class");
        let size = self.object_size(class);

        let size_loc = self.cg.gen_load_const(size);
        let object = self
            .cg
            .gen_builtin_call(Builtin::Alloc, &[size_loc])
            .expect("Alloc returns a value");
        let vtable = self.cg.gen_load_label(&n.class.name);
        self.cg.gen_store(object.clone(), 0, vtable);
        object
    }

    /// Check the element count, allocate `count + 1` words, store the length
    /// in the header word, and hand back a pointer past the header.
    fn lower_new_array(&mut self, n: &NewArrayExpr) -> Location {
        let count = self
            .lower_expr(&n.size)
            .expect("array size has no value");

        // count <= 0, with the backend's <-only comparator.
        let one = self.cg.gen_load_const(1);
        let bad = self.cg.gen_binary(BinOp::Less, count.clone(), one.clone());
        let ok = self.cg.new_label();
        self.cg.gen_ifz(bad, &ok);
        let msg = self.cg.gen_load_str(BAD_ARRAY_SIZE_MSG);
        self.cg.gen_builtin_call(Builtin::PrintString, &[msg]);
        self.cg.gen_builtin_call(Builtin::Halt, &[]);
        self.cg.gen_label(&ok);

        let words = self.cg.gen_binary(BinOp::Add, count.clone(), one);
        let word_size = self.cg.gen_load_const(WORD_SIZE);
        let bytes = self.cg.gen_binary(BinOp::Mul, words, word_size);
        let header = self
            .cg
            .gen_builtin_call(Builtin::Alloc, &[bytes])
            .expect("Alloc returns a value");
        self.cg.gen_store(header.clone(), 0, count);

        let word_size = self.cg.gen_load_const(WORD_SIZE);
        self.cg.gen_binary(BinOp::Add, header, word_size)
    }
}
