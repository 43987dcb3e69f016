//! TAC code generation for the Decaf compiler core.
//!
//! Consumes a checked program plus its [`decaf_sema::Analysis`] and produces
//! the linear three-address-code stream: labels, loads, binary ops, memory
//! traffic, control flow, calls (direct and through vtables), heap
//! allocation with the runtime checks, and one vtable per class. The stream
//! renders to the textual interface an assembler backend consumes.
//!
//! Code generation is only defined for programs whose analysis reported no
//! diagnostics; the driver is expected to gate on [`decaf_sema::analyze`].

pub mod codegen;
pub mod lower;
pub mod tac;

pub use codegen::{Builtin, CodeGenerator, OFFSET_FIRST_LOCAL, OFFSET_FIRST_PARAM, WORD_SIZE};
pub use lower::lower_program;
pub use tac::{BinOp, Instr, Location, Segment, TacProgram};
