//! Runtime error types.
//!
//! Only conditions the interpreter cannot degrade around are errors.
//! Operator type mismatches are not represented here: they resolve to a
//! per-operator default value instead.

use thiserror::Error;

/// Result alias used across the runtime.
pub type VmResult<T> = Result<T, VmError>;

/// Errors surfaced to whatever drives the interpreter.
///
/// # Examples
///
/// ```
/// use core_types::VmError;
///
/// let err = VmError::ArityMismatch { expected: 2, got: 1 };
/// assert_eq!(err.to_string(), "wrong number of args: wanted 2, got 1");
/// assert!(!err.is_fatal());
/// assert!(VmError::OutOfMemory { requested: 16 }.is_fatal());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// Allocation failed even after a full collection
    #[error("out of memory allocating {requested} bytes")]
    OutOfMemory {
        /// Bytes requested (before rounding)
        requested: usize,
    },

    /// A call supplied a different positional count than the callee declares
    #[error("wrong number of args: wanted {expected}, got {got}")]
    ArityMismatch {
        /// Formal parameter count
        expected: usize,
        /// Positional arguments supplied
        got: usize,
    },

    /// The value stack is full
    #[error("value stack overflow (capacity {capacity})")]
    StackOverflow {
        /// Configured stack capacity
        capacity: usize,
    },

    /// An instruction needed more operands than the stack holds
    #[error("value stack underflow")]
    StackUnderflow,

    /// The compile buffer grew past the offset range
    #[error("code unit too large: {size} bytes")]
    CodeTooLarge {
        /// Size the buffer would have reached
        size: usize,
    },

    /// An emitter patch named an address that holds no suitable instruction
    #[error("no patchable instruction at offset {offset}")]
    BadOffset {
        /// Address the caller supplied
        offset: usize,
    },

    /// The configured arena does not fit the offset range
    #[error("pool size {size} exceeds the addressable range")]
    PoolTooLarge {
        /// Requested pool size
        size: usize,
    },

    /// The host-imposed instruction budget ran out
    #[error("instruction limit of {limit} reached")]
    InstructionLimit {
        /// Configured budget
        limit: u64,
    },
}

impl VmError {
    /// Whether the error invalidates the whole VM rather than just the
    /// current top-level evaluation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VmError::OutOfMemory { .. }
                | VmError::StackOverflow { .. }
                | VmError::StackUnderflow
                | VmError::PoolTooLarge { .. }
        )
    }
}
