//! Object kinds and their memory descriptors.
//!
//! Objects in the arena have no header, so the collector learns an object's
//! kind from the edge it was reached through and then asks that kind's
//! [`MemDescriptor`] for the object's size, its outgoing edges, and how to
//! rewrite those edges after compaction.

use core_types::{Offset, Poly, PolyKind};

use crate::arena::Arena;
use crate::code::Code;
use crate::frame::{Frame, Variable};
use crate::func::Func;
use crate::gc::{Marker, Relocation};
use crate::list::{Blob, List};
use crate::name::Name;
use crate::string::Str;

/// Size, mark and move capabilities of one object kind.
///
/// Implementations only ever see offsets of objects of their own kind.
pub trait MemDescriptor: Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Unrounded size in bytes of the object at `at`.
    fn size(&self, arena: &Arena, at: Offset) -> usize;

    /// Report every object referenced by the object at `at`.
    fn mark(&self, arena: &Arena, at: Offset, marker: &mut Marker);

    /// Rewrite every offset field of the object at `at` (already at its new
    /// location) through `moves`.
    fn relocate(&self, arena: &mut Arena, at: Offset, moves: &Relocation);
}

/// Kind tag the collector keeps alongside each live offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// List header
    List,
    /// Element storage owned by a list
    Blob,
    /// NUL-terminated string
    String,
    /// Function
    Func,
    /// Finished bytecode
    Code,
    /// Activation record
    Frame,
    /// Variable binding
    Variable,
    /// Interned identifier
    Name,
}

impl ObjectKind {
    /// Descriptor implementing this kind's memory operations.
    pub fn descriptor(self) -> &'static dyn MemDescriptor {
        match self {
            ObjectKind::List => &List,
            ObjectKind::Blob => &Blob,
            ObjectKind::String => &Str,
            ObjectKind::Func => &Func,
            ObjectKind::Code => &Code,
            ObjectKind::Frame => &Frame,
            ObjectKind::Variable => &Variable,
            ObjectKind::Name => &Name,
        }
    }

    /// Kind of the arena object a poly references, if it references one.
    pub fn of_poly(p: Poly) -> Option<ObjectKind> {
        if !p.is_heap_ref() || p.offset() == 0 {
            return None;
        }
        match p.kind() {
            PolyKind::List => Some(ObjectKind::List),
            PolyKind::String => Some(ObjectKind::String),
            PolyKind::Func => Some(ObjectKind::Func),
            PolyKind::Builtin | PolyKind::Float => None,
        }
    }
}
