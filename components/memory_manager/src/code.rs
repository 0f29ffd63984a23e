//! Code objects: finished, immutable bytecode.
//!
//! ```text
//! size u16 | bytes[size]
//! ```
//!
//! The only edges out of a code object are string-literal operands, found
//! by decoding the instruction stream.

use bytecode_system::{patch_string_operand, string_operand_at, string_operand_sites};
use core_types::{Offset, VmResult};
use tracing::debug;

use crate::arena::Arena;
use crate::gc::{Marker, Relocation};
use crate::heap::Heap;
use crate::object::{MemDescriptor, ObjectKind};

/// Code layout and descriptor.
pub struct Code;

impl Code {
    const LEN: usize = 0;
    const BYTES: usize = 2;

    /// Length of the bytecode in bytes.
    pub fn len(arena: &Arena, at: Offset) -> usize {
        arena.u16_at(at, Self::LEN) as usize
    }

    /// The bytecode.
    pub fn bytes(arena: &Arena, at: Offset) -> &[u8] {
        arena.bytes(at, Self::BYTES, Self::len(arena, at))
    }
}

impl MemDescriptor for Code {
    fn name(&self) -> &'static str {
        "code"
    }

    fn size(&self, arena: &Arena, at: Offset) -> usize {
        Code::BYTES + Code::len(arena, at)
    }

    fn mark(&self, arena: &Arena, at: Offset, marker: &mut Marker) {
        let code = Code::bytes(arena, at);
        for site in string_operand_sites(code) {
            marker.mark(arena, ObjectKind::String, string_operand_at(code, site));
        }
    }

    fn relocate(&self, arena: &mut Arena, at: Offset, moves: &Relocation) {
        let sites = string_operand_sites(Code::bytes(arena, at));
        let len = Code::len(arena, at);
        let code = arena.bytes_mut(at, Code::BYTES, len);
        for site in sites {
            let old = string_operand_at(code, site);
            let new = moves.translate(old);
            if new != old {
                patch_string_operand(code, site, new);
            }
        }
    }
}

impl Heap {
    /// Copy the compile buffer into a new code object and reset the buffer.
    pub fn finish_code(&mut self) -> VmResult<Offset> {
        let len = self.code_buffer().len();
        let at = self.alloc(Code::BYTES + len)?;
        // the collector may have rewritten string operands in the buffer
        let bytes = self.code_buffer_mut().take();
        let arena = self.arena_mut();
        arena.set_u16(at, Code::LEN, len as u16);
        arena.bytes_mut(at, Code::BYTES, len).copy_from_slice(&bytes);
        debug!(code = at, len, "finished code unit");
        Ok(at)
    }

    /// The bytecode of the code object at `at`.
    pub fn code_bytes(&self, at: Offset) -> &[u8] {
        Code::bytes(self.arena(), at)
    }

    /// Length of the code object at `at`.
    pub fn code_len(&self, at: Offset) -> usize {
        Code::len(self.arena(), at)
    }
}
