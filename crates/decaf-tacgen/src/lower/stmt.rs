//! Statement lowering.

use super::Lowerer;
use crate::codegen::Builtin;
use decaf_ast::Stmt;
use decaf_types::TypeTable;

impl<'a> Lowerer<'a> {
    pub(crate) fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) => {
                self.lower_expr(e);
            }
            Stmt::Block(block) => self.lower_block(block),
            Stmt::If(s) => {
                let skip = self.cg.new_label();
                let test = self
                    .lower_expr(&s.test)
                    .expect("if test has no value");
                self.cg.gen_ifz(test, &skip);
                self.lower_stmt(&s.then_body);
                match &s.else_body {
                    Some(else_body) => {
                        let end = self.cg.new_label();
                        self.cg.gen_goto(&end);
                        self.cg.gen_label(&skip);
                        self.lower_stmt(else_body);
                        self.cg.gen_label(&end);
                    }
                    None => self.cg.gen_label(&skip),
                }
            }
            Stmt::While(s) => {
                let head = self.cg.new_label();
                let stop = self.cg.new_label();
                self.cg.gen_label(&head);
                let test = self
                    .lower_expr(&s.test)
                    .expect("while test has no value");
                self.cg.gen_ifz(test, &stop);
                self.break_labels.push(stop.clone());
                self.lower_stmt(&s.body);
                self.break_labels.pop();
                self.cg.gen_goto(&head);
                self.cg.gen_label(&stop);
            }
            Stmt::For(s) => {
                let head = self.cg.new_label();
                let stop = self.cg.new_label();
                self.lower_expr(&s.init);
                self.cg.gen_label(&head);
                if let Some(test) = self.lower_expr(&s.test) {
                    self.cg.gen_ifz(test, &stop);
                }
                self.break_labels.push(stop.clone());
                self.lower_stmt(&s.body);
                self.break_labels.pop();
                self.lower_expr(&s.step);
                self.cg.gen_goto(&head);
                self.cg.gen_label(&stop);
            }
            Stmt::Break(_) => {
                let stop = self
                    .break_labels
                    .last()
                    .expect("break outside a loop survived checking")
                    .clone();
                self.cg.gen_goto(&stop);
            }
            Stmt::Return(s) => {
                let value = s.value.as_ref().and_then(|e| self.lower_expr(e));
                self.cg.gen_return(value);
            }
            Stmt::Print(s) => {
                for arg in &s.args {
                    let ty = self.ty_of(arg);
                    let value = self
                        .lower_expr(arg)
                        .expect("print argument has no value");
                    let builtin = match ty {
                        TypeTable::INT => Builtin::PrintInt,
                        TypeTable::BOOL => Builtin::PrintBool,
                        _ => Builtin::PrintString,
                    };
                    self.cg.gen_builtin_call(builtin, &[value]);
                }
            }
            Stmt::Error(_) => {}
        }
    }
}
