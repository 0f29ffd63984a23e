//! Bounded value stack.
//!
//! Every slot below the stack pointer is a collector root.

use core_types::{Poly, VmError, VmResult};

/// Fixed-capacity stack of polys.
#[derive(Debug, Clone)]
pub struct ValueStack {
    slots: Vec<Poly>,
    capacity: usize,
}

impl ValueStack {
    /// Create an empty stack holding at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        ValueStack {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, failing when the stack is full.
    pub fn push(&mut self, value: Poly) -> VmResult<()> {
        if self.slots.len() >= self.capacity {
            return Err(VmError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.slots.push(value);
        Ok(())
    }

    /// Pop the top value.
    pub fn pop(&mut self) -> VmResult<Poly> {
        self.slots.pop().ok_or(VmError::StackUnderflow)
    }

    /// The value `depth` slots below the top (0 is the top).
    pub fn pick(&self, depth: usize) -> VmResult<Poly> {
        let len = self.slots.len();
        if depth >= len {
            return Err(VmError::StackUnderflow);
        }
        Ok(self.slots[len - 1 - depth])
    }

    /// Overwrite the value `depth` slots below the top.
    pub fn set_pick(&mut self, depth: usize, value: Poly) -> VmResult<()> {
        let len = self.slots.len();
        if depth >= len {
            return Err(VmError::StackUnderflow);
        }
        self.slots[len - 1 - depth] = value;
        Ok(())
    }

    /// Discard the top `count` values.
    pub fn drop_n(&mut self, count: usize) -> VmResult<()> {
        let len = self.slots.len();
        if count > len {
            return Err(VmError::StackUnderflow);
        }
        self.slots.truncate(len - count);
        Ok(())
    }

    /// Value at absolute slot `index` (0 is the bottom).
    pub fn get(&self, index: usize) -> Option<Poly> {
        self.slots.get(index).copied()
    }

    /// Number of values on the stack.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum depth.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Live slots, bottom first.
    pub fn as_slice(&self) -> &[Poly] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Poly] {
        &mut self.slots
    }
}
