//! Host builtins
//!
//! A builtin is a plain function over the heap. Calling one looks exactly
//! like calling a user function from bytecode; the callee poly is a
//! [`PolyKind::Builtin`] reference whose payload indexes the
//! [`BuiltinTable`].

use core_types::{Poly, PolyKind, VmResult};
use memory_manager::Heap;

/// Formal count accepted by builtins that take any number of arguments
pub const VARIADIC: i8 = -1;

/// Signature of a host builtin.
///
/// The arguments stay on the value stack for the duration of the call, so
/// they remain rooted while the builtin allocates. Read them through
/// [`CallArgs::get`] after any allocation rather than holding on to a
/// copy.
pub type BuiltinFn = fn(&mut Heap, CallArgs) -> VmResult<Poly>;

/// A named host function
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    /// Global name the builtin is bound to
    pub name: &'static str,
    /// Positional arguments expected, or [`VARIADIC`]
    pub nformal: i8,
    /// Implementation
    pub func: BuiltinFn,
}

impl Builtin {
    /// Whether `count` positional arguments satisfy this builtin.
    pub fn accepts(&self, count: usize) -> bool {
        self.nformal == VARIADIC || self.nformal as usize == count
    }
}

/// Window over the positional arguments of a builtin call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallArgs {
    base: usize,
    len: usize,
}

impl CallArgs {
    pub(crate) fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }

    /// Number of positional arguments.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the call passed no arguments.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Argument `i`, read from the stack; null past the end.
    pub fn get(&self, heap: &Heap, i: usize) -> Poly {
        if i >= self.len {
            return Poly::NULL;
        }
        heap.stack().get(self.base + i).unwrap_or(Poly::NULL)
    }
}

/// Registered builtins, indexed by the payload of builtin polys
#[derive(Debug, Default)]
pub struct BuiltinTable {
    entries: Vec<Builtin>,
}

impl BuiltinTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `builtin`, returning the poly that calls it.
    pub fn register(&mut self, builtin: Builtin) -> Poly {
        let index = self.entries.len();
        self.entries.push(builtin);
        Poly::reference(index as u16, PolyKind::Builtin)
    }

    /// The builtin a poly refers to.
    pub fn get(&self, p: Poly) -> Option<&Builtin> {
        if p.is_null() || p.kind() != PolyKind::Builtin {
            return None;
        }
        self.entries.get(p.offset() as usize)
    }

    /// Number of registered builtins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn len(heap: &mut Heap, args: CallArgs) -> VmResult<Poly> {
    let value = args.get(heap, 0);
    let n = match value.kind() {
        PolyKind::List if value.is_heap_ref() => heap.list_len(value.offset()),
        PolyKind::String if value.is_heap_ref() => heap.string_len(value.offset()),
        _ => 0,
    };
    Ok(Poly::from_f32(n as f32))
}

fn append(heap: &mut Heap, args: CallArgs) -> VmResult<Poly> {
    let list = args.get(heap, 0);
    if list.is_heap_ref() && list.kind() == PolyKind::List {
        heap.list_append(list, args.get(heap, 1))?;
        return Ok(args.get(heap, 0));
    }
    Ok(list)
}

fn list(heap: &mut Heap, args: CallArgs) -> VmResult<Poly> {
    let at = heap.list_make(args.len())?;
    heap.push(Poly::reference(at, PolyKind::List))?;
    for i in 0..args.len() {
        let list = heap.pick(0)?;
        heap.list_append(list, args.get(heap, i))?;
    }
    heap.pop()
}

/// `len(x)`: length of a list or string, 0 for anything else
pub const LEN: Builtin = Builtin {
    name: "len",
    nformal: 1,
    func: len,
};

/// `append(list, value)`: append in place, returning the list
pub const APPEND: Builtin = Builtin {
    name: "append",
    nformal: 2,
    func: append,
};

/// `list(...)`: a new list of the arguments
pub const LIST: Builtin = Builtin {
    name: "list",
    nformal: VARIADIC,
    func: list,
};

/// Builtins that need nothing from the host beyond the heap
pub const CORE_BUILTINS: [Builtin; 3] = [LEN, APPEND, LIST];
