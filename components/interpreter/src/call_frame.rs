//! Call frames and variable binding
//!
//! Frames and their variable chains live in the arena (see
//! [`memory_manager::Frame`]). The innermost frame and the global frame are
//! heap roots, so every function here re-reads them after allocating.

use arrayvec::ArrayVec;
use core_types::{Id, Offset, Poly, VmError, VmResult, ID_NONE};
use memory_manager::{Frame, Heap, Variable};
use tracing::trace;

/// Most parameter slots one call can bind (positional plus named)
pub const MAX_PARAMS: usize = 2 * u8::MAX as usize;

/// Push a frame resuming at `ip` in the running code, with `nparam`
/// unbound variable slots at the head of its chain.
///
/// # Returns
///
/// The new frame, which is now the innermost frame.
pub fn push(heap: &mut Heap, ip: u16, nparam: usize) -> VmResult<Offset> {
    let frame = heap.alloc(Frame::SIZE)?;
    let (prev, code) = (heap.frame(), heap.running_code());
    Frame::init(heap.arena_mut(), frame, prev, code, ip);
    heap.set_frame(frame);
    for _ in 0..nparam {
        let var = heap.alloc(Variable::SIZE)?;
        let frame = heap.frame();
        let arena = heap.arena_mut();
        let head = Frame::variables(arena, frame);
        Variable::init(arena, var, head, ID_NONE, Poly::NULL);
        Frame::set_variables(arena, frame, var);
    }
    Ok(heap.frame())
}

/// Pop the innermost frame.
///
/// # Returns
///
/// The `(code, ip)` saved by [`push`], or `None` at the global frame.
pub fn pop(heap: &mut Heap) -> Option<(Offset, u16)> {
    let frame = heap.frame();
    if frame == heap.globals() {
        return None;
    }
    let arena = heap.arena();
    let resume = (Frame::code(arena, frame), Frame::ip(arena, frame));
    let prev = Frame::prev(arena, frame);
    heap.set_frame(prev);
    Some(resume)
}

/// Number of frames above the global frame.
pub fn depth(heap: &Heap) -> usize {
    let mut n = 0;
    let mut frame = heap.frame();
    while frame != heap.globals() && frame != 0 {
        n += 1;
        frame = Frame::prev(heap.arena(), frame);
    }
    n
}

fn find(heap: &Heap, frame: Offset, id: Id) -> Option<Offset> {
    let arena = heap.arena();
    let mut var = Frame::variables(arena, frame);
    while var != 0 {
        if Variable::id(arena, var) == id {
            return Some(var);
        }
        var = Variable::next(arena, var);
    }
    None
}

/// Value bound to `id`: the innermost frame first, then the globals.
/// Unbound identifiers read as null.
pub fn lookup(heap: &Heap, id: Id) -> Poly {
    if let Some(var) = find(heap, heap.frame(), id) {
        let value = Variable::value(heap.arena(), var);
        if !value.is_global() {
            return value;
        }
    }
    match find(heap, heap.globals(), id) {
        Some(var) => Variable::value(heap.arena(), var),
        None => Poly::NULL,
    }
}

/// Value bound to `id` in the global frame, if bound.
pub fn lookup_global(heap: &Heap, id: Id) -> Option<Poly> {
    find(heap, heap.globals(), id).map(|var| Variable::value(heap.arena(), var))
}

fn bind(heap: &mut Heap, global: bool, id: Id, value: Poly) -> VmResult<()> {
    heap.stash_poly(value);
    let var = heap.alloc(Variable::SIZE);
    let value = heap.fetch_poly();
    let var = var?;
    let frame = if global { heap.globals() } else { heap.frame() };
    let arena = heap.arena_mut();
    let head = Frame::variables(arena, frame);
    Variable::init(arena, var, head, id, value);
    Frame::set_variables(arena, frame, var);
    Ok(())
}

/// Bind `id` to `value` in the global frame, creating the binding if absent.
pub fn assign_global(heap: &mut Heap, id: Id, value: Poly) -> VmResult<()> {
    match find(heap, heap.globals(), id) {
        Some(var) => {
            Variable::set_value(heap.arena_mut(), var, value);
            Ok(())
        }
        None => bind(heap, true, id, value),
    }
}

/// Bind `id` to `value` in the innermost frame, or in the globals when the
/// innermost frame marked `id` global.
pub fn assign(heap: &mut Heap, id: Id, value: Poly) -> VmResult<()> {
    match find(heap, heap.frame(), id) {
        Some(var) if Variable::value(heap.arena(), var).is_global() => {
            assign_global(heap, id, value)
        }
        Some(var) => {
            Variable::set_value(heap.arena_mut(), var, value);
            Ok(())
        }
        None => bind(heap, false, id, value),
    }
}

/// Redirect `id` to the global frame for the rest of the innermost frame.
/// A no-op at top level.
pub fn mark_global(heap: &mut Heap, id: Id) -> VmResult<()> {
    if heap.frame() == heap.globals() {
        return Ok(());
    }
    match find(heap, heap.frame(), id) {
        Some(var) => {
            Variable::set_value(heap.arena_mut(), var, Poly::GLOBAL);
            Ok(())
        }
        None => bind(heap, false, id, Poly::GLOBAL),
    }
}

/// Enter the function `positional + 2 * named` slots below the stack top.
///
/// The stack holds the callee, then its positional arguments, then the
/// named arguments as `(id, value)` pairs. Everything is popped; positional
/// arguments bind to the formals in declaration order and named arguments
/// bind ahead of them in the chain, so they take precedence.
///
/// # Returns
///
/// The callee's code object.
///
/// # Errors
///
/// `ArityMismatch` when `positional` differs from the formal count; the
/// callee and its arguments are dropped first.
pub fn enter(heap: &mut Heap, call_ip: u16, positional: usize, named: usize) -> VmResult<Offset> {
    let nargs = positional + 2 * named;
    let callee = heap.pick(nargs)?;
    let nformal = heap.func_formals(callee.offset()).len();
    if positional != nformal {
        heap.drop_n(nargs + 1)?;
        return Err(VmError::ArityMismatch {
            expected: nformal,
            got: positional,
        });
    }

    let nparam = positional + named;
    let frame = push(heap, call_ip, nparam)?;

    let mut slots: ArrayVec<Offset, MAX_PARAMS> = ArrayVec::new();
    let mut var = Frame::variables(heap.arena(), frame);
    while var != 0 && slots.len() < nparam {
        slots.push(var);
        var = Variable::next(heap.arena(), var);
    }

    for slot in slots[..named].iter().rev() {
        let value = heap.pop()?;
        let id = heap.pop()?.to_i32() as Id;
        let arena = heap.arena_mut();
        Variable::set_id(arena, *slot, id);
        Variable::set_value(arena, *slot, value);
    }

    let callee = heap.pick(positional)?;
    let formals = heap.func_formals(callee.offset());
    for (i, slot) in slots[named..].iter().enumerate().rev() {
        let value = heap.pop()?;
        let arena = heap.arena_mut();
        Variable::set_id(arena, *slot, formals[i]);
        Variable::set_value(arena, *slot, value);
    }

    let callee = heap.pop()?;
    let code = heap.func_code(callee.offset());
    trace!(code, positional, named, depth = depth(heap), "call");
    Ok(code)
}
