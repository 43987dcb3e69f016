//! TAC instructions and their textual form.
//!
//! The instruction stream is the core's output interface: line-oriented on
//! emission, whitespace-insensitive on consumption. The assembler backend
//! that turns it into machine code is an external collaborator.

use std::fmt;

/// Which storage segment a location names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Program globals, offset from the global pointer.
    Global,
    /// Locals, temporaries and parameters, offset from the frame pointer.
    Frame,
}

/// An abstract storage handle: every value the emitter materializes lives at
/// one of these. The name is what the textual stream prints; the segment and
/// byte offset are for the assembler backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub seg: Segment,
    pub offset: i32,
}

impl Location {
    pub fn global(name: impl Into<String>, offset: i32) -> Self {
        Location {
            name: name.into(),
            seg: Segment::Global,
            offset,
        }
    }

    pub fn frame(name: impl Into<String>, offset: i32) -> Self {
        Location {
            name: name.into(),
            seg: Segment::Frame,
            offset,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The binary operators the stream carries. Everything else (`>`, `<=`,
/// `>=`, `!=`, unary ops) is synthesized from these during lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    Equal,
    And,
    Or,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Less => "<",
            BinOp::Equal => "==",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

/// One TAC instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// `dst := value`
    LoadIntConst { dst: Location, value: i32 },
    /// `dst := "value"`
    LoadStrConst { dst: Location, value: String },
    /// `dst := LoadLabel label` (vtable address)
    LoadLabel { dst: Location, label: String },
    /// `dst := src`
    Assign { dst: Location, src: Location },
    /// `dst := *(base + offset)`
    Load {
        dst: Location,
        base: Location,
        offset: i32,
    },
    /// `*(base + offset) := src`
    Store {
        base: Location,
        offset: i32,
        src: Location,
    },
    /// `dst := left op right`
    BinOp {
        op: BinOp,
        dst: Location,
        left: Location,
        right: Location,
    },
    /// `name:`
    Label { name: String },
    /// `Goto target`
    Goto { target: String },
    /// `IfZ test Goto target`
    IfZ { test: Location, target: String },
    /// `BeginFunc`
    BeginFunc,
    /// `EndFunc`
    EndFunc,
    /// `Return value` / `Return`
    Return { value: Option<Location> },
    /// `PushParam arg`
    PushParam { arg: Location },
    /// `PopParams bytes`
    PopParams { bytes: i32 },
    /// `dst := LCall label` / `LCall label`
    LCall {
        label: String,
        dst: Option<Location>,
    },
    /// `dst := ACall fnptr` / `ACall fnptr`
    ACall {
        fnptr: Location,
        dst: Option<Location>,
    },
    /// `VTable class = { labels, ... }`
    VTable { class: String, labels: Vec<String> },
}

impl Instr {
    /// Labels and vtables sit flush left; everything else is indented.
    pub fn is_flush_left(&self) -> bool {
        matches!(self, Instr::Label { .. } | Instr::VTable { .. })
    }
}

fn write_mem(f: &mut fmt::Formatter<'_>, base: &Location, offset: i32) -> fmt::Result {
    if offset == 0 {
        write!(f, "*({})", base)
    } else if offset > 0 {
        write!(f, "*({} + {})", base, offset)
    } else {
        write!(f, "*({} - {})", base, -offset)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::LoadIntConst { dst, value } => write!(f, "{} := {}", dst, value),
            Instr::LoadStrConst { dst, value } => write!(f, "{} := {:?}", dst, value),
            Instr::LoadLabel { dst, label } => write!(f, "{} := LoadLabel {}", dst, label),
            Instr::Assign { dst, src } => write!(f, "{} := {}", dst, src),
            Instr::Load { dst, base, offset } => {
                write!(f, "{} := ", dst)?;
                write_mem(f, base, *offset)
            }
            Instr::Store { base, offset, src } => {
                write_mem(f, base, *offset)?;
                write!(f, " := {}", src)
            }
            Instr::BinOp {
                op,
                dst,
                left,
                right,
            } => write!(f, "{} := {} {} {}", dst, left, op, right),
            Instr::Label { name } => write!(f, "{}:", name),
            Instr::Goto { target } => write!(f, "Goto {}", target),
            Instr::IfZ { test, target } => write!(f, "IfZ {} Goto {}", test, target),
            Instr::BeginFunc => write!(f, "BeginFunc"),
            Instr::EndFunc => write!(f, "EndFunc"),
            Instr::Return { value: Some(v) } => write!(f, "Return {}", v),
            Instr::Return { value: None } => write!(f, "Return"),
            Instr::PushParam { arg } => write!(f, "PushParam {}", arg),
            Instr::PopParams { bytes } => write!(f, "PopParams {}", bytes),
            Instr::LCall {
                label,
                dst: Some(d),
            } => write!(f, "{} := LCall {}", d, label),
            Instr::LCall { label, dst: None } => write!(f, "LCall {}", label),
            Instr::ACall {
                fnptr,
                dst: Some(d),
            } => write!(f, "{} := ACall {}", d, fnptr),
            Instr::ACall { fnptr, dst: None } => write!(f, "ACall {}", fnptr),
            Instr::VTable { class, labels } => {
                if labels.is_empty() {
                    write!(f, "VTable {} = {{ }}", class)
                } else {
                    write!(f, "VTable {} = {{ {} }}", class, labels.join(", "))
                }
            }
        }
    }
}

/// The finished instruction stream.
#[derive(Debug, Clone, Default)]
pub struct TacProgram {
    pub instrs: Vec<Instr>,
}

impl TacProgram {
    pub fn iter(&self) -> impl Iterator<Item = &Instr> {
        self.instrs.iter()
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }
}

impl fmt::Display for TacProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instrs {
            if instr.is_flush_left() {
                writeln!(f, "{}", instr)?;
            } else {
                writeln!(f, "  {}", instr)?;
            }
        }
        Ok(())
    }
}
