//! Interned identifiers.
//!
//! ```text
//! next u16 | id u16 | text bytes | NUL
//! ```
//!
//! Names form a chain off a heap root and are never freed. Ids are handed
//! out sequentially from 1.

use core_types::{Id, Offset, VmError, VmResult};
use tracing::trace;

use crate::arena::Arena;
use crate::gc::{Marker, Relocation};
use crate::heap::Heap;
use crate::object::{MemDescriptor, ObjectKind};

/// Name layout and descriptor.
pub struct Name;

impl Name {
    const NEXT: usize = 0;
    const ID: usize = 2;
    const TEXT: usize = 4;

    /// Next name in the chain.
    pub fn next(arena: &Arena, at: Offset) -> Offset {
        arena.u16_at(at, Self::NEXT)
    }

    /// Identifier assigned to this name.
    pub fn id(arena: &Arena, at: Offset) -> Id {
        arena.u16_at(at, Self::ID)
    }

    /// The identifier text.
    pub fn text(arena: &Arena, at: Offset) -> &[u8] {
        arena.cstr(at, Self::TEXT)
    }
}

impl MemDescriptor for Name {
    fn name(&self) -> &'static str {
        "name"
    }

    fn size(&self, arena: &Arena, at: Offset) -> usize {
        Name::TEXT + Name::text(arena, at).len() + 1
    }

    fn mark(&self, arena: &Arena, at: Offset, marker: &mut Marker) {
        marker.mark(arena, ObjectKind::Name, Name::next(arena, at));
    }

    fn relocate(&self, arena: &mut Arena, at: Offset, moves: &Relocation) {
        let next = moves.translate(Name::next(arena, at));
        arena.set_u16(at, Name::NEXT, next);
    }
}

impl Heap {
    /// Id of `text` if it has been interned.
    pub fn lookup_name(&self, text: &str) -> Option<Id> {
        let arena = self.arena();
        let mut at = self.names();
        while at != 0 {
            if Name::text(arena, at) == text.as_bytes() {
                return Some(Name::id(arena, at));
            }
            at = Name::next(arena, at);
        }
        None
    }

    /// Intern `text`, returning its id. Interning the same text twice
    /// returns the same id.
    pub fn name_id(&mut self, text: &str) -> VmResult<Id> {
        if let Some(id) = self.lookup_name(text) {
            return Ok(id);
        }
        let id = self.next_id;
        if id == Id::MAX {
            return Err(VmError::OutOfMemory {
                requested: text.len(),
            });
        }
        let bytes = text.as_bytes();
        let at = self.alloc(Name::TEXT + bytes.len() + 1)?;
        let head = self.names();
        let arena = self.arena_mut();
        arena.set_u16(at, Name::NEXT, head);
        arena.set_u16(at, Name::ID, id);
        arena.bytes_mut(at, Name::TEXT, bytes.len()).copy_from_slice(bytes);
        self.set_names(at);
        self.next_id += 1;
        trace!(name = text, id, "interned");
        Ok(id)
    }

    /// Text of the identifier `id`.
    pub fn name_string(&self, id: Id) -> Option<String> {
        let arena = self.arena();
        let mut at = self.names();
        while at != 0 {
            if Name::id(arena, at) == id {
                return Some(String::from_utf8_lossy(Name::text(arena, at)).into_owned());
            }
            at = Name::next(arena, at);
        }
        None
    }
}
