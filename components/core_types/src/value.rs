//! Tagged 32-bit value representation.
//!
//! Every runtime value is a [`Poly`]: a single 32-bit word that is either an
//! IEEE-754 single precision float or a tagged reference into the heap arena.
//! The discriminant is fully determined by the bit pattern, so no side table
//! is ever consulted to tell a number from an object.

use std::fmt;

/// Byte offset of an object inside the heap arena.
///
/// Offsets are 1-based; `0` means "no object". Every field that names
/// another heap object stores one of these, which is what lets the
/// collector relocate objects by rewriting offsets instead of pointers.
pub type Offset = u16;

/// Interned identifier. `0` is reserved for "no identifier".
pub type Id = u16;

/// The null offset.
pub const OFFSET_NONE: Offset = 0;

/// The null identifier.
pub const ID_NONE: Id = 0;

const REF_MASK: u32 = 0xff00_0000;
const KIND_MASK: u32 = 0x3;
const NAN_BITS: u32 = 0x7fff_ffff;
const NULL_BITS: u32 = 0xffff_ffff;
const GLOBAL_BITS: u32 = 0xffff_fffe;
// -inf shares the reserved high byte and has to be told apart explicitly.
// Finite floats at or below -2^127 share it too; `from_f32` folds them
// into -inf so arithmetic never yields a reference pattern.
const NEG_INF_BITS: u32 = 0xff80_0000;

/// Kind selected by the two low bits of a reference.
///
/// # Examples
///
/// ```
/// use core_types::{Poly, PolyKind};
///
/// assert_eq!(Poly::from_f32(1.5).kind(), PolyKind::Float);
/// assert_eq!(Poly::reference(8, PolyKind::List).kind(), PolyKind::List);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolyKind {
    /// List object in the arena
    List = 0,
    /// Null-terminated string in the arena
    String = 1,
    /// Function object in the arena
    Func = 2,
    /// Host builtin; the payload is a builtin table index, not an offset
    Builtin = 3,
    /// Plain number
    Float = 4,
}

/// A tagged runtime value: a float, a heap reference, or a sentinel.
///
/// Three sentinels exist besides numbers and references:
///
/// - [`Poly::NAN`]: the canonical NaN; every NaN produced by arithmetic
///   collapses to this bit pattern
/// - [`Poly::NULL`]: the null value (unbound identifiers read as null)
/// - [`Poly::GLOBAL`]: marks a local binding that redirects to the global
///   frame
///
/// # Examples
///
/// ```
/// use core_types::{Poly, PolyKind};
///
/// let n = Poly::from_f32(3.0);
/// assert!(n.is_float());
/// assert_eq!(n.to_f32(), 3.0);
///
/// let s = Poly::reference(12, PolyKind::String);
/// assert!(!s.is_float());
/// assert_eq!(s.offset(), 12);
///
/// assert!(Poly::from_f32(f32::NAN).is_nan());
/// assert!(Poly::from_f32(f32::NEG_INFINITY).is_float());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Poly(u32);

impl Poly {
    /// Canonical NaN
    pub const NAN: Poly = Poly(NAN_BITS);
    /// Null value
    pub const NULL: Poly = Poly(NULL_BITS);
    /// Global redirection marker
    pub const GLOBAL: Poly = Poly(GLOBAL_BITS);
    /// The number zero, also "false"
    pub const ZERO: Poly = Poly(0);
    /// The number one, also "true"
    pub const ONE: Poly = Poly(0x3f80_0000);

    /// Build a poly from its raw bit pattern.
    pub const fn from_bits(bits: u32) -> Self {
        Poly(bits)
    }

    /// Raw bit pattern.
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Wrap a float, canonicalising NaN.
    ///
    /// Negative floats whose magnitude reaches 2^127 become `-inf`: their
    /// bit patterns fall in the reference range.
    ///
    /// ```
    /// use core_types::Poly;
    ///
    /// let p = Poly::from_f32(-3e38);
    /// assert!(p.is_float());
    /// assert_eq!(p.to_f32(), f32::NEG_INFINITY);
    /// ```
    pub fn from_f32(f: f32) -> Self {
        let bits = f.to_bits();
        if f.is_nan() {
            Poly::NAN
        } else if bits & REF_MASK == REF_MASK {
            Poly(NEG_INF_BITS)
        } else {
            Poly(bits)
        }
    }

    /// `1.0` for true, `0.0` for false.
    pub fn from_bool(b: bool) -> Self {
        if b {
            Poly::ONE
        } else {
            Poly::ZERO
        }
    }

    /// Build a reference of the given kind.
    ///
    /// For [`PolyKind::Builtin`] the payload is a builtin index rather than
    /// an arena offset. `kind` must not be [`PolyKind::Float`].
    pub fn reference(offset: Offset, kind: PolyKind) -> Self {
        debug_assert!(kind != PolyKind::Float, "floats are not references");
        Poly(REF_MASK | ((offset as u32) << 2) | (kind as u32 & KIND_MASK))
    }

    /// Whether this word is a number (NaN included).
    pub fn is_float(self) -> bool {
        (self.0 & REF_MASK) != REF_MASK || self.0 == NEG_INF_BITS
    }

    /// Whether this is the canonical NaN.
    pub fn is_nan(self) -> bool {
        self.0 == NAN_BITS
    }

    /// Whether this is the null sentinel.
    pub fn is_null(self) -> bool {
        self.0 == NULL_BITS
    }

    /// Whether this is the global redirection marker.
    pub fn is_global(self) -> bool {
        self.0 == GLOBAL_BITS
    }

    /// Whether this is a reference into the arena (list, string or func).
    pub fn is_heap_ref(self) -> bool {
        matches!(
            self.kind(),
            PolyKind::List | PolyKind::String | PolyKind::Func
        ) && !self.is_null()
            && !self.is_global()
    }

    /// Kind of this value. Sentinels report the kind their low bits select;
    /// check [`Poly::is_null`] / [`Poly::is_global`] first where it matters.
    pub fn kind(self) -> PolyKind {
        if self.is_float() {
            return PolyKind::Float;
        }
        match self.0 & KIND_MASK {
            0 => PolyKind::List,
            1 => PolyKind::String,
            2 => PolyKind::Func,
            _ => PolyKind::Builtin,
        }
    }

    /// The float payload. Only meaningful when [`Poly::is_float`] holds.
    pub fn to_f32(self) -> f32 {
        f32::from_bits(self.0)
    }

    /// The float payload truncated toward zero to a 32-bit signed integer.
    /// References convert to 0.
    pub fn to_i32(self) -> i32 {
        if self.is_float() {
            self.to_f32() as i32
        } else {
            0
        }
    }

    /// Arena offset (or builtin index) carried by a reference.
    pub fn offset(self) -> Offset {
        ((self.0 & !REF_MASK) >> 2) as Offset
    }

    /// Same reference kind, new offset. Used by the collector when relocating.
    pub fn with_offset(self, offset: Offset) -> Self {
        Poly((self.0 & (REF_MASK | KIND_MASK)) | ((offset as u32) << 2))
    }
}

impl Default for Poly {
    fn default() -> Self {
        Poly::NULL
    }
}

impl From<f32> for Poly {
    fn from(f: f32) -> Self {
        Poly::from_f32(f)
    }
}

impl From<bool> for Poly {
    fn from(b: bool) -> Self {
        Poly::from_bool(b)
    }
}

impl fmt::Debug for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "Null");
        }
        if self.is_global() {
            return write!(f, "Global");
        }
        match self.kind() {
            PolyKind::Float => f.debug_tuple("Float").field(&self.to_f32()).finish(),
            PolyKind::List => f.debug_tuple("List").field(&self.offset()).finish(),
            PolyKind::String => f.debug_tuple("String").field(&self.offset()).finish(),
            PolyKind::Func => f.debug_tuple("Func").field(&self.offset()).finish(),
            PolyKind::Builtin => f.debug_tuple("Builtin").field(&self.offset()).finish(),
        }
    }
}
