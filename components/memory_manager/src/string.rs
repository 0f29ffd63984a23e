//! Strings: NUL-terminated byte runs.
//!
//! String helpers copy their source bytes out of the arena before
//! allocating, so their inputs need no rooting.

use core_types::{Offset, Poly, PolyKind, VmResult};

use crate::arena::Arena;
use crate::gc::{Marker, Relocation};
use crate::heap::Heap;
use crate::object::MemDescriptor;

/// String layout and descriptor.
pub struct Str;

impl MemDescriptor for Str {
    fn name(&self) -> &'static str {
        "string"
    }

    fn size(&self, arena: &Arena, at: Offset) -> usize {
        arena.cstr(at, 0).len() + 1
    }

    fn mark(&self, _arena: &Arena, _at: Offset, _marker: &mut Marker) {}

    fn relocate(&self, _arena: &mut Arena, _at: Offset, _moves: &Relocation) {}
}

impl Heap {
    /// Allocate a string holding `text`, cut at the first NUL byte.
    pub fn string_make(&mut self, text: &[u8]) -> VmResult<Offset> {
        let text = match text.iter().position(|&b| b == 0) {
            Some(nul) => &text[..nul],
            None => text,
        };
        let at = self.alloc(text.len() + 1)?;
        self.arena_mut()
            .bytes_mut(at, 0, text.len())
            .copy_from_slice(text);
        Ok(at)
    }

    /// Contents of the string at `at`, without the terminator.
    pub fn string_bytes(&self, at: Offset) -> &[u8] {
        self.arena().cstr(at, 0)
    }

    /// Length in bytes of the string at `at`.
    pub fn string_len(&self, at: Offset) -> usize {
        self.string_bytes(at).len()
    }

    /// One-character string holding byte `index` of `src`.
    ///
    /// Negative indices count from the end. Returns `None` when out of range.
    pub fn string_char(&mut self, src: Poly, index: i32) -> VmResult<Option<Poly>> {
        let bytes = self.string_bytes(src.offset());
        let len = bytes.len() as i64;
        let mut i = index as i64;
        if i < 0 {
            i += len;
        }
        if i < 0 || i >= len {
            return Ok(None);
        }
        let byte = [bytes[i as usize]];
        let at = self.string_make(&byte)?;
        Ok(Some(Poly::reference(at, PolyKind::String)))
    }

    /// New string holding `a` followed by `b`.
    pub fn string_cat(&mut self, a: Poly, b: Poly) -> VmResult<Poly> {
        let mut text = self.string_bytes(a.offset()).to_vec();
        text.extend_from_slice(self.string_bytes(b.offset()));
        let at = self.string_make(&text)?;
        Ok(Poly::reference(at, PolyKind::String))
    }

    /// New string of `count` bytes of `src` taken from `start` every `stride`.
    pub fn string_slice(
        &mut self,
        src: Poly,
        start: usize,
        stride: isize,
        count: usize,
    ) -> VmResult<Poly> {
        let bytes = self.string_bytes(src.offset());
        let text: Vec<u8> = (0..count)
            .map(|i| bytes[(start as isize + i as isize * stride) as usize])
            .collect();
        let at = self.string_make(&text)?;
        Ok(Poly::reference(at, PolyKind::String))
    }
}
