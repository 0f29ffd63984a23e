//! Lists: a fixed header naming a separately allocated run of polys.
//!
//! ```text
//! header:  size u16 | alloc u16 | data u16
//! data:    alloc * poly   (a blob, reachable only through its list)
//! ```
//!
//! List helpers that allocate park their list arguments on the value stack
//! for the duration, so callers may pass polys straight out of locals.

use core_types::{Offset, Poly, PolyKind, VmError, VmResult};

use crate::arena::Arena;
use crate::gc::{Marker, Relocation};
use crate::heap::Heap;
use crate::object::MemDescriptor;

const POLY_SIZE: usize = 4;

/// List header layout and descriptor.
pub struct List;

impl List {
    /// Header size in bytes
    pub const SIZE: usize = 6;
    const LEN: usize = 0;
    const ALLOC: usize = 2;
    const DATA: usize = 4;

    /// Number of elements in use.
    pub fn len(arena: &Arena, at: Offset) -> usize {
        arena.u16_at(at, Self::LEN) as usize
    }

    /// Number of element slots allocated.
    pub fn capacity(arena: &Arena, at: Offset) -> usize {
        arena.u16_at(at, Self::ALLOC) as usize
    }

    /// Offset of the element storage.
    pub fn data(arena: &Arena, at: Offset) -> Offset {
        arena.u16_at(at, Self::DATA)
    }

    fn set_len(arena: &mut Arena, at: Offset, len: usize) {
        arena.set_u16(at, Self::LEN, len as u16);
    }

    /// Element `i`; `i` must be below [`List::len`].
    pub fn get(arena: &Arena, at: Offset, i: usize) -> Poly {
        arena.poly_at(Self::data(arena, at), i * POLY_SIZE)
    }

    /// Overwrite element `i`; `i` must be below [`List::capacity`].
    pub fn set(arena: &mut Arena, at: Offset, i: usize, value: Poly) {
        let data = Self::data(arena, at);
        arena.set_poly(data, i * POLY_SIZE, value);
    }
}

impl MemDescriptor for List {
    fn name(&self) -> &'static str {
        "list"
    }

    fn size(&self, _arena: &Arena, _at: Offset) -> usize {
        List::SIZE
    }

    fn mark(&self, arena: &Arena, at: Offset, marker: &mut Marker) {
        let data = List::data(arena, at);
        marker.mark_blob(data, List::capacity(arena, at) * POLY_SIZE);
        for i in 0..List::len(arena, at) {
            marker.mark_poly(arena, List::get(arena, at, i));
        }
    }

    fn relocate(&self, arena: &mut Arena, at: Offset, moves: &Relocation) {
        let data = moves.translate(List::data(arena, at));
        arena.set_u16(at, List::DATA, data);
        for i in 0..List::len(arena, at) {
            let p = List::get(arena, at, i);
            List::set(arena, at, i, moves.translate_poly(p));
        }
    }
}

/// Element storage. Sized and scanned by its owning list.
pub struct Blob;

impl MemDescriptor for Blob {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn size(&self, _arena: &Arena, _at: Offset) -> usize {
        0
    }

    fn mark(&self, _arena: &Arena, _at: Offset, _marker: &mut Marker) {}

    fn relocate(&self, _arena: &mut Arena, _at: Offset, _moves: &Relocation) {}
}

fn list_poly(at: Offset) -> Poly {
    Poly::reference(at, PolyKind::List)
}

impl Heap {
    /// Allocate an empty list with room for `capacity` elements.
    pub fn list_make(&mut self, capacity: usize) -> VmResult<Offset> {
        if capacity > u16::MAX as usize {
            return Err(VmError::OutOfMemory {
                requested: capacity * POLY_SIZE,
            });
        }
        let at = self.alloc(List::SIZE)?;
        if capacity == 0 {
            return Ok(at);
        }
        self.stash_poly(list_poly(at));
        let data = self.alloc(capacity * POLY_SIZE);
        let at = self.fetch_poly().offset();
        let data = data?;
        let arena = self.arena_mut();
        arena.set_u16(at, List::ALLOC, capacity as u16);
        arena.set_u16(at, List::DATA, data);
        Ok(at)
    }

    /// Number of elements of the list at `at`.
    pub fn list_len(&self, at: Offset) -> usize {
        List::len(self.arena(), at)
    }

    /// Element `i` of the list at `at`, if in range.
    pub fn list_get(&self, at: Offset, i: usize) -> Option<Poly> {
        (i < self.list_len(at)).then(|| List::get(self.arena(), at, i))
    }

    /// Overwrite element `i`. Returns false when out of range.
    pub fn list_set(&mut self, at: Offset, i: usize, value: Poly) -> bool {
        if i >= self.list_len(at) {
            return false;
        }
        List::set(self.arena_mut(), at, i, value);
        true
    }

    /// Snapshot of the elements. Offsets in the result go stale at the next
    /// allocation.
    pub fn list_items(&self, at: Offset) -> Vec<Poly> {
        (0..self.list_len(at))
            .map(|i| List::get(self.arena(), at, i))
            .collect()
    }

    /// Build a list from the top `count` stack values (deepest first) and
    /// pop them.
    pub fn list_imm(&mut self, count: usize) -> VmResult<Poly> {
        let at = self.list_make(count)?;
        for i in 0..count {
            let value = self.pick(count - 1 - i)?;
            List::set(self.arena_mut(), at, i, value);
        }
        List::set_len(self.arena_mut(), at, count);
        self.drop_n(count)?;
        Ok(list_poly(at))
    }

    /// Append `value` to `list`, growing its storage when full.
    pub fn list_append(&mut self, list: Poly, value: Poly) -> VmResult<()> {
        self.push(list)?;
        self.push(value)?;
        let at = list.offset();
        let len = self.list_len(at);
        if len == List::capacity(self.arena(), at) {
            if len == u16::MAX as usize {
                self.drop_n(2)?;
                return Err(VmError::OutOfMemory {
                    requested: (len + 1) * POLY_SIZE,
                });
            }
            let grown = (len * 2).clamp(4, u16::MAX as usize);
            let data = self.alloc(grown * POLY_SIZE);
            let at = self.pick(1)?.offset();
            let data = match data {
                Ok(data) => data,
                Err(err) => {
                    self.drop_n(2)?;
                    return Err(err);
                }
            };
            let arena = self.arena_mut();
            let old = List::data(arena, at);
            for i in 0..len {
                let p = arena.poly_at(old, i * POLY_SIZE);
                arena.set_poly(data, i * POLY_SIZE, p);
            }
            arena.set_u16(at, List::ALLOC, grown as u16);
            arena.set_u16(at, List::DATA, data);
        }
        let value = self.pop()?;
        let at = self.pop()?.offset();
        List::set(self.arena_mut(), at, len, value);
        List::set_len(self.arena_mut(), at, len + 1);
        Ok(())
    }

    /// New list holding the elements of `a` followed by those of `b`.
    pub fn list_concat(&mut self, a: Poly, b: Poly) -> VmResult<Poly> {
        self.push(a)?;
        self.push(b)?;
        let la = self.list_len(a.offset());
        let lb = self.list_len(b.offset());
        let made = self.list_make(la + lb);
        let a = self.pick(1)?.offset();
        let b = self.pick(0)?.offset();
        self.drop_n(2)?;
        let at = made?;
        let arena = self.arena_mut();
        for i in 0..la {
            let p = List::get(arena, a, i);
            List::set(arena, at, i, p);
        }
        for i in 0..lb {
            let p = List::get(arena, b, i);
            List::set(arena, at, la + i, p);
        }
        List::set_len(arena, at, la + lb);
        Ok(list_poly(at))
    }

    /// New list of `count` elements of `src` taken from `start` every
    /// `stride`.
    pub fn list_slice(
        &mut self,
        src: Poly,
        start: usize,
        stride: isize,
        count: usize,
    ) -> VmResult<Poly> {
        self.push(src)?;
        let made = self.list_make(count);
        let src = self.pop()?.offset();
        let at = made?;
        let arena = self.arena_mut();
        for i in 0..count {
            let p = List::get(arena, src, (start as isize + i as isize * stride) as usize);
            List::set(arena, at, i, p);
        }
        List::set_len(arena, at, count);
        Ok(list_poly(at))
    }
}
