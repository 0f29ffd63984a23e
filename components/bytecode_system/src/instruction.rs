//! Instruction decoding
//!
//! Decodes the byte encoding produced by [`CodeBuffer`](crate::CodeBuffer)
//! back into opcode, push flag and operand. Used by the interpreter, the
//! disassembler, and the collector (which needs to find string literal
//! offsets embedded in code).

use core_types::{Id, Offset};

use crate::opcode::{ForwardKind, Op, SliceFlags};

/// Decoded operand of one instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// Float immediate
    Number(f32),
    /// Arena offset of a string literal
    String(Offset),
    /// Element count of a list literal
    Count(u16),
    /// Identifier
    Id(Id),
    /// Argument counts of a call
    Call {
        /// Positional arguments
        positional: u8,
        /// Named `(id, value)` argument pairs
        named: u8,
    },
    /// Presence bits of a slice
    Slice(SliceFlags),
    /// Absolute branch target
    Target(Offset),
    /// Unresolved forward reference
    Forward(ForwardKind),
}

/// A single decoded instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    /// Address of the opcode byte
    pub ip: usize,
    /// The opcode
    pub op: Op,
    /// Whether the result is pushed
    pub push: bool,
    /// Decoded operand
    pub operand: Operand,
}

impl Instruction {
    /// Address of the first operand byte.
    pub fn operand_ip(&self) -> usize {
        self.ip + 1
    }

    /// Address of the following instruction.
    pub fn next_ip(&self) -> usize {
        self.ip + self.op.encoded_len()
    }
}

pub(crate) fn read_u16(code: &[u8], at: usize) -> Option<u16> {
    let bytes = code.get(at..at + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn write_u16(code: &mut [u8], at: usize, value: u16) {
    code[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

/// Decode the instruction starting at `ip`.
///
/// Returns `None` when `ip` is past the end, the opcode byte is unknown, or
/// the operand is truncated.
///
/// # Example
///
/// ```
/// use bytecode_system::{decode, CodeBuffer, Op, Operand};
///
/// let mut buf = CodeBuffer::new();
/// buf.add_number(2.5).unwrap();
/// let insn = decode(buf.bytes(), 0).unwrap();
/// assert_eq!(insn.op, Op::Num);
/// assert_eq!(insn.operand, Operand::Number(2.5));
/// ```
pub fn decode(code: &[u8], ip: usize) -> Option<Instruction> {
    let (op, push) = Op::split(*code.get(ip)?)?;
    let at = ip + 1;
    if at + op.extra_size() > code.len() {
        return None;
    }
    let operand = match op {
        Op::Num => {
            let bytes = &code[at..at + 4];
            Operand::Number(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        }
        Op::String => Operand::String(read_u16(code, at)?),
        Op::List => Operand::Count(read_u16(code, at)?),
        Op::Id | Op::Assign | Op::Global => Operand::Id(read_u16(code, at)?),
        Op::Call => Operand::Call {
            positional: code[at],
            named: code[at + 1],
        },
        Op::Slice => Operand::Slice(SliceFlags::from_bits(code[at])),
        Op::If | Op::Branch => Operand::Target(read_u16(code, at)?),
        Op::Forward => Operand::Forward(ForwardKind::from_byte(code[at])?),
        _ => Operand::None,
    };
    Some(Instruction {
        ip,
        op,
        push,
        operand,
    })
}

/// Iterator over the instructions of an encoded code unit.
///
/// Stops at the end of the code or at the first undecodable byte.
pub struct Instructions<'a> {
    code: &'a [u8],
    ip: usize,
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Instruction;

    fn next(&mut self) -> Option<Instruction> {
        let insn = decode(self.code, self.ip)?;
        self.ip = insn.next_ip();
        Some(insn)
    }
}

/// Walk every instruction of `code` from `start`.
pub fn instructions(code: &[u8], start: usize) -> Instructions<'_> {
    Instructions { code, ip: start }
}

/// Positions of every string-literal operand in `code`.
///
/// The collector uses this to mark literals reachable from code and to
/// rewrite them once the literals have been relocated.
pub fn string_operand_sites(code: &[u8]) -> Vec<usize> {
    instructions(code, 0)
        .filter(|insn| matches!(insn.operand, Operand::String(_)))
        .map(|insn| insn.operand_ip())
        .collect()
}

/// Rewrite the string operand stored at `site`.
pub fn patch_string_operand(code: &mut [u8], site: usize, offset: Offset) {
    write_u16(code, site, offset);
}

/// Read the string operand stored at `site`.
pub fn string_operand_at(code: &[u8], site: usize) -> Offset {
    read_u16(code, site).unwrap_or(0)
}
