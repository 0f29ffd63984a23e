//! Core value types and error handling.
//!
//! This crate provides the foundational types shared by every runtime
//! component: the tagged 32-bit value, arena offsets and identifiers, and
//! the runtime error taxonomy.
//!
//! # Overview
//!
//! - [`Poly`] - Tagged float-or-reference value
//! - [`PolyKind`] - What a [`Poly`] holds
//! - [`Offset`] / [`Id`] - 1-based arena offsets and interned identifiers
//! - [`VmError`] - Errors surfaced to the driver of the interpreter
//!
//! # Examples
//!
//! ```
//! use core_types::{Poly, PolyKind, VmError};
//!
//! let n = Poly::from_f32(42.0);
//! assert_eq!(n.kind(), PolyKind::Float);
//!
//! let list = Poly::reference(16, PolyKind::List);
//! assert_eq!(list.offset(), 16);
//!
//! let err = VmError::StackUnderflow;
//! assert!(err.is_fatal());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod value;

pub use error::{VmError, VmResult};
pub use value::{Id, Offset, Poly, PolyKind, ID_NONE, OFFSET_NONE};
