//! The instruction accumulator.
//!
//! One `CodeGenerator` owns the growing stream for a whole compilation; no
//! other component mutates it. It hands out fresh temporaries (frame slots
//! below the locals), fresh labels, and the well-known locations for
//! parameters and globals.

use crate::tac::{BinOp, Instr, Location, TacProgram};

/// Bytes per word. Every value in generated code is word-sized.
pub const WORD_SIZE: i32 = 4;

/// Frame offset of the first parameter. For methods this is `this`; the
/// declared formals follow upward.
pub const OFFSET_FIRST_PARAM: i32 = 4;

/// Frame offset of the first local; locals and temporaries grow downward.
pub const OFFSET_FIRST_LOCAL: i32 = -8;

/// The runtime-library entry points generated code may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Alloc,
    ReadInteger,
    ReadLine,
    StringEqual,
    PrintInt,
    PrintBool,
    PrintString,
    Halt,
}

impl Builtin {
    pub fn label(&self) -> &'static str {
        match self {
            Builtin::Alloc => "_Alloc",
            Builtin::ReadInteger => "_ReadInteger",
            Builtin::ReadLine => "_ReadLine",
            Builtin::StringEqual => "_StringEqual",
            Builtin::PrintInt => "_PrintInt",
            Builtin::PrintBool => "_PrintBool",
            Builtin::PrintString => "_PrintString",
            Builtin::Halt => "_Halt",
        }
    }

    pub fn returns_value(&self) -> bool {
        matches!(
            self,
            Builtin::Alloc | Builtin::ReadInteger | Builtin::ReadLine | Builtin::StringEqual
        )
    }
}

/// Accumulates the ordered instruction stream and allocates storage.
#[derive(Debug, Default)]
pub struct CodeGenerator {
    instrs: Vec<Instr>,
    next_label: u32,
    next_temp: u32,
    local_offset: i32,
}

impl CodeGenerator {
    pub fn new() -> Self {
        CodeGenerator {
            instrs: Vec::new(),
            next_label: 0,
            next_temp: 0,
            local_offset: OFFSET_FIRST_LOCAL,
        }
    }

    pub fn emit(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    /// A fresh internal label.
    pub fn new_label(&mut self) -> String {
        let label = format!("_L{}", self.next_label);
        self.next_label += 1;
        label
    }

    /// A fresh temporary in the current frame.
    pub fn alloc_temp(&mut self) -> Location {
        let name = format!("_tmp{}", self.next_temp);
        self.next_temp += 1;
        let loc = Location::frame(name, self.local_offset);
        self.local_offset -= WORD_SIZE;
        loc
    }

    /// A named local in the current frame.
    pub fn alloc_local(&mut self, name: &str) -> Location {
        let loc = Location::frame(name, self.local_offset);
        self.local_offset -= WORD_SIZE;
        loc
    }

    /// The frame slot of parameter `index` (0-based; `this` is parameter 0
    /// of a method).
    pub fn param_location(name: &str, index: i32) -> Location {
        Location::frame(name, OFFSET_FIRST_PARAM + index * WORD_SIZE)
    }

    /// The global slot of program variable `index`.
    pub fn global_location(name: &str, index: i32) -> Location {
        Location::global(name, index * WORD_SIZE)
    }

    // ---- emission helpers --------------------------------------------------

    pub fn gen_load_const(&mut self, value: i32) -> Location {
        let dst = self.alloc_temp();
        self.emit(Instr::LoadIntConst {
            dst: dst.clone(),
            value,
        });
        dst
    }

    pub fn gen_load_str(&mut self, value: &str) -> Location {
        let dst = self.alloc_temp();
        self.emit(Instr::LoadStrConst {
            dst: dst.clone(),
            value: value.to_string(),
        });
        dst
    }

    pub fn gen_load_label(&mut self, label: &str) -> Location {
        let dst = self.alloc_temp();
        self.emit(Instr::LoadLabel {
            dst: dst.clone(),
            label: label.to_string(),
        });
        dst
    }

    pub fn gen_assign(&mut self, dst: Location, src: Location) {
        self.emit(Instr::Assign { dst, src });
    }

    pub fn gen_load(&mut self, base: Location, offset: i32) -> Location {
        let dst = self.alloc_temp();
        self.emit(Instr::Load {
            dst: dst.clone(),
            base,
            offset,
        });
        dst
    }

    pub fn gen_store(&mut self, base: Location, offset: i32, src: Location) {
        self.emit(Instr::Store { base, offset, src });
    }

    pub fn gen_binary(&mut self, op: BinOp, left: Location, right: Location) -> Location {
        let dst = self.alloc_temp();
        self.emit(Instr::BinOp {
            op,
            dst: dst.clone(),
            left,
            right,
        });
        dst
    }

    pub fn gen_label(&mut self, name: &str) {
        self.emit(Instr::Label {
            name: name.to_string(),
        });
    }

    pub fn gen_goto(&mut self, target: &str) {
        self.emit(Instr::Goto {
            target: target.to_string(),
        });
    }

    pub fn gen_ifz(&mut self, test: Location, target: &str) {
        self.emit(Instr::IfZ {
            test,
            target: target.to_string(),
        });
    }

    /// Open a function body: emits `BeginFunc` and resets the frame cursor
    /// for locals and temporaries.
    pub fn gen_begin_func(&mut self) {
        self.local_offset = OFFSET_FIRST_LOCAL;
        self.emit(Instr::BeginFunc);
    }

    pub fn gen_end_func(&mut self) {
        self.emit(Instr::EndFunc);
    }

    pub fn gen_return(&mut self, value: Option<Location>) {
        self.emit(Instr::Return { value });
    }

    pub fn gen_push_param(&mut self, arg: Location) {
        self.emit(Instr::PushParam { arg });
    }

    pub fn gen_pop_params(&mut self, bytes: i32) {
        if bytes > 0 {
            self.emit(Instr::PopParams { bytes });
        }
    }

    pub fn gen_lcall(&mut self, label: &str, has_result: bool) -> Option<Location> {
        let dst = has_result.then(|| self.alloc_temp());
        self.emit(Instr::LCall {
            label: label.to_string(),
            dst: dst.clone(),
        });
        dst
    }

    pub fn gen_acall(&mut self, fnptr: Location, has_result: bool) -> Option<Location> {
        let dst = has_result.then(|| self.alloc_temp());
        self.emit(Instr::ACall {
            fnptr,
            dst: dst.clone(),
        });
        dst
    }

    /// A runtime-library call: pushes the arguments right-to-left, calls,
    /// pops.
    pub fn gen_builtin_call(&mut self, builtin: Builtin, args: &[Location]) -> Option<Location> {
        for arg in args.iter().rev() {
            self.gen_push_param(arg.clone());
        }
        let result = self.gen_lcall(builtin.label(), builtin.returns_value());
        self.gen_pop_params(WORD_SIZE * args.len() as i32);
        result
    }

    pub fn gen_vtable(&mut self, class: &str, labels: Vec<String>) {
        self.emit(Instr::VTable {
            class: class.to_string(),
            labels,
        });
    }

    pub fn finish(self) -> TacProgram {
        TacProgram {
            instrs: self.instrs,
        }
    }
}
