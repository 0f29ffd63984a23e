//! Type-directed operators
//!
//! Operand combinations an operator has no meaning for are not errors:
//! the result is the left operand unchanged. Integer operators truncate
//! both operands to `i32` first; integer division or remainder by zero
//! yields NaN.

use std::cmp::Ordering;

use bytecode_system::Op;
use core_types::{Poly, PolyKind, VmResult};
use memory_manager::Heap;

fn is_list(p: Poly) -> bool {
    p.is_heap_ref() && p.kind() == PolyKind::List
}

fn is_string(p: Poly) -> bool {
    p.is_heap_ref() && p.kind() == PolyKind::String
}

/// Truthiness: false for 0, null, and empty lists or strings.
pub fn truthy(heap: &Heap, p: Poly) -> bool {
    if p.is_null() {
        return false;
    }
    match p.kind() {
        PolyKind::Float => p.to_f32() != 0.0,
        PolyKind::List if is_list(p) => heap.list_len(p.offset()) != 0,
        PolyKind::String if is_string(p) => heap.string_len(p.offset()) != 0,
        _ => true,
    }
}

/// Structural equality: lists compare element-wise, strings by content,
/// everything else by value.
pub fn poly_equal(heap: &Heap, a: Poly, b: Poly) -> bool {
    if a.is_float() && b.is_float() {
        return a.to_f32() == b.to_f32();
    }
    if a == b {
        return true;
    }
    if is_string(a) && is_string(b) {
        return heap.string_bytes(a.offset()) == heap.string_bytes(b.offset());
    }
    if is_list(a) && is_list(b) {
        let (a, b) = (a.offset(), b.offset());
        let len = heap.list_len(a);
        if len != heap.list_len(b) {
            return false;
        }
        return (0..len).all(|i| match (heap.list_get(a, i), heap.list_get(b, i)) {
            (Some(x), Some(y)) => poly_equal(heap, x, y),
            _ => false,
        });
    }
    false
}

fn int_op(op: Op, a: i32, b: i32) -> Poly {
    let n = match op {
        Op::Div | Op::Mod if b == 0 => return Poly::NAN,
        Op::Div => a.wrapping_div(b),
        Op::Mod => a.wrapping_rem(b),
        Op::Land => a & b,
        Op::Lor => a | b,
        Op::Lxor => a ^ b,
        Op::Lshift => a.wrapping_shl(b as u32 & 31),
        Op::Rshift => a.wrapping_shr(b as u32 & 31),
        _ => return Poly::from_f32(a as f32),
    };
    Poly::from_f32(n as f32)
}

fn float_op(op: Op, a: f32, b: f32) -> Option<Poly> {
    let p = match op {
        Op::Plus => Poly::from_f32(a + b),
        Op::Minus => Poly::from_f32(a - b),
        Op::Times => Poly::from_f32(a * b),
        Op::Divide => Poly::from_f32(a / b),
        Op::Pow => Poly::from_f32(a.powf(b)),
        Op::Lt => Poly::from_bool(a < b),
        Op::Gt => Poly::from_bool(a > b),
        Op::Le => Poly::from_bool(a <= b),
        Op::Ge => Poly::from_bool(a >= b),
        Op::Div | Op::Mod | Op::Land | Op::Lor | Op::Lxor | Op::Lshift | Op::Rshift => {
            int_op(op, a as i32, b as i32)
        }
        _ => return None,
    };
    Some(p)
}

fn ordering(op: Op, ord: Ordering) -> Option<Poly> {
    let b = match op {
        Op::Lt => ord == Ordering::Less,
        Op::Gt => ord == Ordering::Greater,
        Op::Le => ord != Ordering::Greater,
        Op::Ge => ord != Ordering::Less,
        _ => return None,
    };
    Some(Poly::from_bool(b))
}

fn contains(heap: &Heap, container: Poly, item: Poly) -> Option<bool> {
    if is_list(container) {
        let at = container.offset();
        let found = (0..heap.list_len(at))
            .filter_map(|i| heap.list_get(at, i))
            .any(|x| poly_equal(heap, x, item));
        return Some(found);
    }
    if is_string(container) && is_string(item) {
        let hay = heap.string_bytes(container.offset());
        let needle = heap.string_bytes(item.offset());
        let found = needle.is_empty() || hay.windows(needle.len()).any(|w| w == needle);
        return Some(found);
    }
    None
}

fn fetch(heap: &mut Heap, a: Poly, b: Poly) -> VmResult<Poly> {
    if !b.is_float() {
        return Ok(a);
    }
    let index = b.to_i32();
    if is_string(a) {
        return Ok(heap.string_char(a, index)?.unwrap_or(a));
    }
    if is_list(a) {
        let at = a.offset();
        let len = heap.list_len(at) as i64;
        let i = if index < 0 { index as i64 + len } else { index as i64 };
        if (0..len).contains(&i) {
            return Ok(heap.list_get(at, i as usize).unwrap_or(a));
        }
    }
    Ok(a)
}

/// Apply a binary operator to `a` (left) and `b` (right).
///
/// Allocating operators keep their own operands alive, so neither needs to
/// be rooted by the caller.
pub fn binary(heap: &mut Heap, op: Op, a: Poly, b: Poly) -> VmResult<Poly> {
    match op {
        Op::And => return Ok(Poly::from_bool(truthy(heap, a) && truthy(heap, b))),
        Op::Or => return Ok(Poly::from_bool(truthy(heap, a) || truthy(heap, b))),
        Op::Eq => return Ok(Poly::from_bool(poly_equal(heap, a, b))),
        Op::Ne => return Ok(Poly::from_bool(!poly_equal(heap, a, b))),
        Op::Is => return Ok(Poly::from_bool(a == b)),
        Op::IsNot => return Ok(Poly::from_bool(a != b)),
        Op::In => return Ok(contains(heap, b, a).map_or(a, Poly::from_bool)),
        Op::NotIn => return Ok(contains(heap, b, a).map_or(a, |c| Poly::from_bool(!c))),
        Op::ArrayFetch => return fetch(heap, a, b),
        _ => {}
    }

    if a.is_float() && b.is_float() {
        return Ok(float_op(op, a.to_f32(), b.to_f32()).unwrap_or(a));
    }
    if is_string(a) && is_string(b) {
        if op == Op::Plus {
            return heap.string_cat(a, b);
        }
        let ord = heap.string_bytes(a.offset()).cmp(heap.string_bytes(b.offset()));
        return Ok(ordering(op, ord).unwrap_or(a));
    }
    if is_list(a) && is_list(b) && op == Op::Plus {
        return heap.list_concat(a, b);
    }
    Ok(a)
}

/// Apply a unary operator.
pub fn unary(heap: &Heap, op: Op, a: Poly) -> Poly {
    match op {
        Op::Not => Poly::from_bool(!truthy(heap, a)),
        Op::Uminus if a.is_float() => Poly::from_f32(-a.to_f32()),
        Op::Lnot if a.is_float() => Poly::from_f32(!a.to_i32() as f32),
        _ => a,
    }
}
