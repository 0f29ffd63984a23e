//! Fixed-size byte arena with bump allocation.
//!
//! Every heap object lives somewhere inside one contiguous byte region and is
//! named by a 1-based [`Offset`]: the object at byte index `i` has offset
//! `i + 1`, so offset 0 never names an object. Objects carry no header; the
//! kind of an object is always known from whatever references it.

use core_types::{Offset, Poly};

/// Allocation granularity in bytes
pub const ALIGN: usize = 4;

/// Round a request up to the allocation granularity.
pub fn round_up(size: usize) -> usize {
    (size + ALIGN - 1) & !(ALIGN - 1)
}

/// Arena allocator backing the heap.
///
/// Allocation bumps `top`; space is only ever reclaimed by the collector
/// sliding live objects down and lowering `top`.
#[derive(Debug, Clone)]
pub struct Arena {
    /// Backing storage
    bytes: Box<[u8]>,
    /// First free byte index
    top: usize,
}

impl Arena {
    /// Creates a new arena with the specified capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Size of the arena in bytes
    pub fn new(capacity: usize) -> Self {
        Arena {
            bytes: vec![0u8; capacity].into_boxed_slice(),
            top: 0,
        }
    }

    /// Allocates zeroed memory using bump-pointer allocation.
    ///
    /// # Arguments
    ///
    /// * `size` - Number of bytes to allocate (rounded up to [`ALIGN`])
    ///
    /// # Returns
    ///
    /// Offset of the new object, or `None` if insufficient space.
    pub fn allocate(&mut self, size: usize) -> Option<Offset> {
        let size = round_up(size.max(1));
        if self.top + size > self.bytes.len() {
            return None;
        }
        let start = self.top;
        self.bytes[start..start + size].fill(0);
        self.top += size;
        Some(Self::offset_of(start))
    }

    /// Returns the total capacity of the arena.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the number of bytes currently allocated.
    pub fn used(&self) -> usize {
        self.top
    }

    /// Bytes left before the arena is exhausted.
    pub fn available(&self) -> usize {
        self.bytes.len() - self.top
    }

    pub(crate) fn set_top(&mut self, top: usize) {
        debug_assert!(top <= self.bytes.len());
        self.top = top;
    }

    /// Byte index of the object at `at`.
    pub fn index_of(at: Offset) -> usize {
        debug_assert!(at != 0, "null offset dereferenced");
        at as usize - 1
    }

    /// Offset of the object starting at byte index `index`.
    pub fn offset_of(index: usize) -> Offset {
        (index + 1) as Offset
    }

    /// Read a 16-bit field `field` bytes into the object at `at`.
    pub fn u16_at(&self, at: Offset, field: usize) -> u16 {
        let i = Self::index_of(at) + field;
        u16::from_le_bytes([self.bytes[i], self.bytes[i + 1]])
    }

    /// Write a 16-bit field.
    pub fn set_u16(&mut self, at: Offset, field: usize, value: u16) {
        let i = Self::index_of(at) + field;
        self.bytes[i..i + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// Read a poly field.
    pub fn poly_at(&self, at: Offset, field: usize) -> Poly {
        let i = Self::index_of(at) + field;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[i..i + 4]);
        Poly::from_bits(u32::from_le_bytes(word))
    }

    /// Write a poly field.
    pub fn set_poly(&mut self, at: Offset, field: usize, value: Poly) {
        let i = Self::index_of(at) + field;
        self.bytes[i..i + 4].copy_from_slice(&value.to_bits().to_le_bytes());
    }

    /// `len` bytes starting `field` bytes into the object at `at`.
    pub fn bytes(&self, at: Offset, field: usize, len: usize) -> &[u8] {
        let i = Self::index_of(at) + field;
        &self.bytes[i..i + len]
    }

    /// Mutable view of `len` bytes of the object at `at`.
    pub fn bytes_mut(&mut self, at: Offset, field: usize, len: usize) -> &mut [u8] {
        let i = Self::index_of(at) + field;
        &mut self.bytes[i..i + len]
    }

    /// The NUL-terminated byte run starting `field` bytes into `at`,
    /// without the terminator.
    pub fn cstr(&self, at: Offset, field: usize) -> &[u8] {
        let start = Self::index_of(at) + field;
        let rest = &self.bytes[start..];
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        &rest[..len]
    }

    /// Slide `len` bytes from byte index `from` down to `to`.
    pub(crate) fn slide(&mut self, from: usize, to: usize, len: usize) {
        debug_assert!(to <= from);
        self.bytes.copy_within(from..from + len, to);
    }
}
