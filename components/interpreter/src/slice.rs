//! Slicing of lists and strings
//!
//! Bounds follow the usual half-open convention: negative indices count
//! from the end, out-of-range bounds clamp, and a negative stride walks
//! backwards from the end.

use bytecode_system::SliceFlags;
use core_types::{Poly, PolyKind, VmResult};
use memory_manager::Heap;

/// A resolved slice: `count` elements from `start`, `stride` apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    /// First element taken
    pub start: usize,
    /// Distance between taken elements; never 0
    pub stride: isize,
    /// Number of elements taken
    pub count: usize,
}

/// Resolve optional bounds against a sequence of length `len`.
///
/// Returns `None` for a zero stride.
///
/// # Example
///
/// ```
/// use interpreter::slice::{canonicalize, Slice};
///
/// let s = canonicalize(5, Some(-2), None, None).unwrap();
/// assert_eq!(s, Slice { start: 3, stride: 1, count: 2 });
///
/// let rev = canonicalize(3, None, None, Some(-1)).unwrap();
/// assert_eq!(rev, Slice { start: 2, stride: -1, count: 3 });
/// ```
pub fn canonicalize(
    len: usize,
    start: Option<i32>,
    end: Option<i32>,
    stride: Option<i32>,
) -> Option<Slice> {
    let stride = stride.unwrap_or(1) as i64;
    if stride == 0 {
        return None;
    }
    let len = len as i64;
    let (lo, hi) = if stride < 0 { (-1, len - 1) } else { (0, len) };
    let resolve = |bound: Option<i32>, default: i64| match bound {
        None => default,
        Some(i) => {
            let i = i as i64;
            let i = if i < 0 { i + len } else { i };
            i.clamp(lo, hi)
        }
    };
    let (start, end) = if stride < 0 {
        (resolve(start, len - 1), resolve(end, -1))
    } else {
        (resolve(start, 0), resolve(end, len))
    };
    let count = if stride > 0 && end > start {
        (end - start - 1) / stride + 1
    } else if stride < 0 && start > end {
        (start - end - 1) / -stride + 1
    } else {
        0
    };
    Some(Slice {
        start: if count == 0 { 0 } else { start as usize },
        stride: stride as isize,
        count: count as usize,
    })
}

fn bound(p: Poly) -> Option<i32> {
    if p.is_null() {
        None
    } else {
        Some(p.to_i32())
    }
}

/// Execute a slice instruction.
///
/// The supplied parts were evaluated in source order: the object first,
/// then start, end and stride. The last one supplied is in the
/// accumulator, the rest are on the stack. With no parts at all the
/// accumulator is the object itself. Anything but a list or string, and a
/// zero stride, yield the object unchanged.
pub fn slice(heap: &mut Heap, flags: SliceFlags, acc: Poly) -> VmResult<Poly> {
    let mut parts = [None; 3];
    let mut pending = Some(acc);
    let supplied = [flags.has_start(), flags.has_end(), flags.has_stride()];
    for (slot, given) in parts.iter_mut().zip(supplied).rev() {
        if !given {
            continue;
        }
        *slot = match pending.take() {
            Some(p) => bound(p),
            None => bound(heap.pop()?),
        };
    }
    let object = match pending {
        Some(p) => p,
        None => heap.pop()?,
    };

    let len = match object.kind() {
        PolyKind::List if object.is_heap_ref() => heap.list_len(object.offset()),
        PolyKind::String if object.is_heap_ref() => heap.string_len(object.offset()),
        _ => return Ok(object),
    };
    let Some(s) = canonicalize(len, parts[0], parts[1], parts[2]) else {
        return Ok(object);
    };
    match object.kind() {
        PolyKind::List => heap.list_slice(object, s.start, s.stride, s.count),
        _ => heap.string_slice(object, s.start, s.stride, s.count),
    }
}
