//! Bytecode for the accumulator/stack interpreter
//!
//! This crate defines the instruction encoding shared by the compiler front
//! end, the interpreter and the garbage collector.
//!
//! # Features
//!
//! - Variable-length byte encoding: one opcode byte (high bit = push flag)
//!   followed by a fixed-size operand per opcode
//! - [`CodeBuffer`] emitter with branch and forward-reference patching
//! - Decoder and instruction iterator
//! - Disassembler for diagnostics
//!
//! # Example
//!
//! ```
//! use bytecode_system::{decode, CodeBuffer, ForwardKind, Op, Operand};
//!
//! let mut buf = CodeBuffer::new();
//! let top = buf.current();
//! let jump = buf.add_forward(ForwardKind::Break).unwrap();
//! buf.add_op(Op::Nop).unwrap();
//! let end = buf.current();
//! buf.patch_forward(top, ForwardKind::Break, end);
//!
//! let insn = decode(buf.bytes(), jump as usize).unwrap();
//! assert_eq!(insn.op, Op::Branch);
//! assert_eq!(insn.operand, Operand::Target(end));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod disasm;
pub mod emitter;
pub mod instruction;
pub mod opcode;

// Re-export main types at crate root
pub use disasm::{disassemble, disassemble_one, NoNames, Resolver};
pub use emitter::{CodeBuffer, MAX_CODE_SIZE};
pub use instruction::{
    decode, instructions, patch_string_operand, string_operand_at, string_operand_sites,
    Instruction, Instructions, Operand,
};
pub use opcode::{ForwardKind, Op, SliceFlags, ID_SIZE, OFFSET_SIZE, PUSH_FLAG};
