//! Functions.
//!
//! ```text
//! code u16 | nformal u16 | formal id[nformal]
//! ```

use core_types::{Id, Offset, VmResult};

use crate::arena::Arena;
use crate::gc::{Marker, Relocation};
use crate::heap::Heap;
use crate::object::{MemDescriptor, ObjectKind};

/// Function layout and descriptor.
pub struct Func;

impl Func {
    const CODE: usize = 0;
    const NFORMAL: usize = 2;
    const FORMALS: usize = 4;

    /// Code object of the body.
    pub fn code(arena: &Arena, at: Offset) -> Offset {
        arena.u16_at(at, Self::CODE)
    }

    /// Number of formal parameters.
    pub fn nformal(arena: &Arena, at: Offset) -> usize {
        arena.u16_at(at, Self::NFORMAL) as usize
    }

    /// Identifier of formal parameter `i`.
    pub fn formal(arena: &Arena, at: Offset, i: usize) -> Id {
        arena.u16_at(at, Self::FORMALS + i * 2)
    }
}

impl MemDescriptor for Func {
    fn name(&self) -> &'static str {
        "func"
    }

    fn size(&self, arena: &Arena, at: Offset) -> usize {
        Func::FORMALS + Func::nformal(arena, at) * 2
    }

    fn mark(&self, arena: &Arena, at: Offset, marker: &mut Marker) {
        marker.mark(arena, ObjectKind::Code, Func::code(arena, at));
    }

    fn relocate(&self, arena: &mut Arena, at: Offset, moves: &Relocation) {
        let code = moves.translate(Func::code(arena, at));
        arena.set_u16(at, Func::CODE, code);
    }
}

impl Heap {
    /// Allocate a function running `code` with the given formal parameters.
    ///
    /// `code` is stashed across the allocation, so it may move.
    pub fn func_make(&mut self, code: Offset, formals: &[Id]) -> VmResult<Offset> {
        self.stash_code(code);
        let at = self.alloc(Func::FORMALS + formals.len() * 2);
        let code = self.fetch_code();
        let at = at?;
        let arena = self.arena_mut();
        arena.set_u16(at, Func::CODE, code);
        arena.set_u16(at, Func::NFORMAL, formals.len() as u16);
        for (i, &id) in formals.iter().enumerate() {
            arena.set_u16(at, Func::FORMALS + i * 2, id);
        }
        Ok(at)
    }

    /// Code object of the function at `at`.
    pub fn func_code(&self, at: Offset) -> Offset {
        Func::code(self.arena(), at)
    }

    /// Formal parameter identifiers of the function at `at`.
    pub fn func_formals(&self, at: Offset) -> Vec<Id> {
        let arena = self.arena();
        (0..Func::nformal(arena, at))
            .map(|i| Func::formal(arena, at, i))
            .collect()
    }
}
