//! Bytecode emitter
//!
//! A monotonically growing instruction buffer driven by the parser. Every
//! `add_*` call appends one instruction and returns the offset of its opcode
//! byte, which the caller keeps to set the push flag or patch a branch once
//! the destination is known.

use core_types::{Id, Offset, VmError, VmResult};
use tracing::trace;

use crate::instruction::{decode, write_u16, Operand};
use crate::opcode::{ForwardKind, Op, SliceFlags, OFFSET_SIZE, PUSH_FLAG};

/// Largest code unit a 16-bit offset can address
pub const MAX_CODE_SIZE: usize = Offset::MAX as usize;

/// Growable compile buffer for one compilation unit
///
/// String operands hold arena offsets, so whoever owns the buffer must let
/// the collector see it (the heap keeps its compile buffer as a root).
///
/// # Example
///
/// ```
/// use bytecode_system::{CodeBuffer, Op};
///
/// let mut buf = CodeBuffer::new();
/// let lhs = buf.add_number(1.0).unwrap();
/// buf.set_push(lhs).unwrap();
/// buf.add_number(2.0).unwrap();
/// buf.add_op(Op::Plus).unwrap();
/// assert_eq!(buf.len(), 11);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    bytes: Vec<u8>,
}

impl CodeBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Offset the next instruction will be emitted at
    pub fn current(&self) -> Offset {
        self.bytes.len() as Offset
    }

    /// Number of bytes emitted so far
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been emitted
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Emitted bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Emitted bytes, mutable (collector relocation of string operands)
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    fn extend_op(&mut self, op: Op, operand: &[u8]) -> VmResult<Offset> {
        debug_assert_eq!(operand.len(), op.extra_size());
        let start = self.bytes.len();
        let end = start + 1 + operand.len();
        if end > MAX_CODE_SIZE {
            return Err(VmError::CodeTooLarge { size: end });
        }
        self.bytes.push(op as u8);
        self.bytes.extend_from_slice(operand);
        trace!(offset = start, op = op.name(), "emit");
        Ok(start as Offset)
    }

    /// Append an instruction without operand
    pub fn add_op(&mut self, op: Op) -> VmResult<Offset> {
        self.extend_op(op, &[])
    }

    /// Append an instruction taking an identifier (`id`, `assign`, `global`)
    pub fn add_op_id(&mut self, op: Op, id: Id) -> VmResult<Offset> {
        self.extend_op(op, &id.to_le_bytes())
    }

    /// Append a float immediate
    pub fn add_number(&mut self, number: f32) -> VmResult<Offset> {
        self.extend_op(Op::Num, &number.to_le_bytes())
    }

    /// Append a string literal already allocated at `string` in the arena
    pub fn add_string(&mut self, string: Offset) -> VmResult<Offset> {
        self.extend_op(Op::String, &string.to_le_bytes())
    }

    /// Append a list literal built from the top `size` stack values
    pub fn add_list(&mut self, size: u16) -> VmResult<Offset> {
        self.extend_op(Op::List, &size.to_le_bytes())
    }

    /// Append a branch (`if` or `branch`) whose target is patched later
    pub fn add_op_branch(&mut self, op: Op) -> VmResult<Offset> {
        debug_assert!(matches!(op, Op::If | Op::Branch));
        self.extend_op(op, &[0; OFFSET_SIZE])
    }

    /// Append a forward-reference placeholder of the given kind
    pub fn add_forward(&mut self, kind: ForwardKind) -> VmResult<Offset> {
        let mut operand = [0; OFFSET_SIZE];
        operand[0] = kind as u8;
        self.extend_op(Op::Forward, &operand)
    }

    /// Append a call with `positional` arguments followed by `named`
    /// `(id, value)` pairs on the stack
    pub fn add_call(&mut self, positional: u8, named: u8) -> VmResult<Offset> {
        self.extend_op(Op::Call, &[positional, named])
    }

    /// Append a slice recording which bounds were supplied
    pub fn add_slice(&mut self, has_start: bool, has_end: bool, has_stride: bool) -> VmResult<Offset> {
        let flags = SliceFlags::new(has_start, has_end, has_stride);
        self.extend_op(Op::Slice, &[flags.bits()])
    }

    /// Point the branch emitted at `branch` to `target`
    ///
    /// # Errors
    ///
    /// `BadOffset` unless `branch` is the address of an `if` or `branch`.
    pub fn patch_branch(&mut self, branch: Offset, target: Offset) -> VmResult<()> {
        let insn = decode(&self.bytes, branch as usize)
            .filter(|insn| matches!(insn.op, Op::If | Op::Branch))
            .ok_or(VmError::BadOffset {
                offset: branch as usize,
            })?;
        write_u16(&mut self.bytes, insn.operand_ip(), target);
        Ok(())
    }

    /// Resolve every `kind` forward reference emitted at or after `start`
    /// into a branch to `target`, keeping each placeholder's push flag.
    ///
    /// Scans the buffer instruction by instruction, so `start` must be the
    /// address of an instruction.
    pub fn patch_forward(&mut self, start: Offset, kind: ForwardKind, target: Offset) {
        let mut ip = start as usize;
        while let Some(insn) = decode(&self.bytes, ip) {
            if insn.operand == Operand::Forward(kind) {
                let push = if insn.push { PUSH_FLAG } else { 0 };
                self.bytes[ip] = Op::Branch as u8 | push;
                write_u16(&mut self.bytes, insn.operand_ip(), target);
                trace!(at = ip, target, kind = kind.name(), "patched forward");
            }
            ip = insn.next_ip();
        }
    }

    /// Mark the instruction at `offset` as producing a value to push
    ///
    /// # Errors
    ///
    /// `BadOffset` when no instruction starts at `offset`.
    pub fn set_push(&mut self, offset: Offset) -> VmResult<()> {
        let at = offset as usize;
        if decode(&self.bytes, at).is_none() {
            return Err(VmError::BadOffset { offset: at });
        }
        self.bytes[at] |= PUSH_FLAG;
        Ok(())
    }

    /// Hand back the accumulated bytes and reset for the next unit
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// Discard everything emitted so far
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}
