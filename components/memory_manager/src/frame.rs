//! Call frames and variable bindings.
//!
//! ```text
//! frame:    prev u16 | code u16 | ip u16 | variables u16
//! variable: next u16 | id u16 | value poly
//! ```
//!
//! Frames link to their caller through `prev`, so the call stack is itself
//! an arena-resident list the collector can relocate. Each frame owns a
//! newest-first chain of variables.

use core_types::{Id, Offset, Poly};

use crate::arena::Arena;
use crate::gc::{Marker, Relocation};
use crate::object::{MemDescriptor, ObjectKind};

/// Frame layout and descriptor.
pub struct Frame;

impl Frame {
    /// Frame size in bytes
    pub const SIZE: usize = 8;
    const PREV: usize = 0;
    const CODE: usize = 2;
    const IP: usize = 4;
    const VARIABLES: usize = 6;

    /// Caller's frame.
    pub fn prev(arena: &Arena, at: Offset) -> Offset {
        arena.u16_at(at, Self::PREV)
    }

    /// Code to resume in the caller.
    pub fn code(arena: &Arena, at: Offset) -> Offset {
        arena.u16_at(at, Self::CODE)
    }

    /// Address of the call instruction to resume after.
    pub fn ip(arena: &Arena, at: Offset) -> u16 {
        arena.u16_at(at, Self::IP)
    }

    /// Head of the variable chain.
    pub fn variables(arena: &Arena, at: Offset) -> Offset {
        arena.u16_at(at, Self::VARIABLES)
    }

    /// Fill in a freshly allocated frame.
    pub fn init(arena: &mut Arena, at: Offset, prev: Offset, code: Offset, ip: u16) {
        arena.set_u16(at, Self::PREV, prev);
        arena.set_u16(at, Self::CODE, code);
        arena.set_u16(at, Self::IP, ip);
        arena.set_u16(at, Self::VARIABLES, 0);
    }

    /// Replace the head of the variable chain.
    pub fn set_variables(arena: &mut Arena, at: Offset, head: Offset) {
        arena.set_u16(at, Self::VARIABLES, head);
    }
}

impl MemDescriptor for Frame {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn size(&self, _arena: &Arena, _at: Offset) -> usize {
        Frame::SIZE
    }

    fn mark(&self, arena: &Arena, at: Offset, marker: &mut Marker) {
        marker.mark(arena, ObjectKind::Frame, Frame::prev(arena, at));
        marker.mark(arena, ObjectKind::Code, Frame::code(arena, at));
        marker.mark(arena, ObjectKind::Variable, Frame::variables(arena, at));
    }

    fn relocate(&self, arena: &mut Arena, at: Offset, moves: &Relocation) {
        for field in [Frame::PREV, Frame::CODE, Frame::VARIABLES] {
            let old = arena.u16_at(at, field);
            arena.set_u16(at, field, moves.translate(old));
        }
    }
}

/// Variable layout and descriptor.
pub struct Variable;

impl Variable {
    /// Variable size in bytes
    pub const SIZE: usize = 8;
    const NEXT: usize = 0;
    const ID: usize = 2;
    const VALUE: usize = 4;

    /// Next binding in the chain.
    pub fn next(arena: &Arena, at: Offset) -> Offset {
        arena.u16_at(at, Self::NEXT)
    }

    /// Bound identifier.
    pub fn id(arena: &Arena, at: Offset) -> Id {
        arena.u16_at(at, Self::ID)
    }

    /// Bound value.
    pub fn value(arena: &Arena, at: Offset) -> Poly {
        arena.poly_at(at, Self::VALUE)
    }

    /// Fill in a freshly allocated variable.
    pub fn init(arena: &mut Arena, at: Offset, next: Offset, id: Id, value: Poly) {
        arena.set_u16(at, Self::NEXT, next);
        arena.set_u16(at, Self::ID, id);
        arena.set_poly(at, Self::VALUE, value);
    }

    /// Rebind to `id`.
    pub fn set_id(arena: &mut Arena, at: Offset, id: Id) {
        arena.set_u16(at, Self::ID, id);
    }

    /// Store a new value.
    pub fn set_value(arena: &mut Arena, at: Offset, value: Poly) {
        arena.set_poly(at, Self::VALUE, value);
    }
}

impl MemDescriptor for Variable {
    fn name(&self) -> &'static str {
        "variable"
    }

    fn size(&self, _arena: &Arena, _at: Offset) -> usize {
        Variable::SIZE
    }

    fn mark(&self, arena: &Arena, at: Offset, marker: &mut Marker) {
        marker.mark(arena, ObjectKind::Variable, Variable::next(arena, at));
        marker.mark_poly(arena, Variable::value(arena, at));
    }

    fn relocate(&self, arena: &mut Arena, at: Offset, moves: &Relocation) {
        let next = moves.translate(Variable::next(arena, at));
        arena.set_u16(at, Variable::NEXT, next);
        let value = moves.translate_poly(Variable::value(arena, at));
        Variable::set_value(arena, at, value);
    }
}
