//! Bytecode interpreter for the arena runtime
//!
//! This crate runs code objects produced by the emitter in
//! `bytecode_system` against a `memory_manager` heap:
//! - Accumulator machine with a bounded value stack
//! - Type-directed operators that degrade instead of failing
//! - Calls through arena-resident frames, with named arguments
//! - Host builtins behind the same call protocol
//! - Optional instruction limit and periodic incremental collection
//!
//! # Example
//!
//! ```
//! use interpreter::Vm;
//! use bytecode_system::Op;
//!
//! let mut vm = Vm::new().unwrap();
//! let buf = vm.emitter();
//! let at = buf.add_number(7.0).unwrap();
//! buf.set_push(at).unwrap();
//! buf.add_number(2.0).unwrap();
//! buf.add_op(Op::Div).unwrap();
//!
//! let result = vm.run().unwrap();
//! assert_eq!(vm.format(result), "3");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtin;
pub mod call_frame;
pub mod dispatch;
pub mod format;
pub mod operators;
pub mod slice;
pub mod vm;

// Re-export main types at crate root
pub use builtin::{Builtin, BuiltinFn, BuiltinTable, CallArgs, CORE_BUILTINS, VARIADIC};
pub use dispatch::Dispatcher;
pub use format::format_poly;
pub use operators::{poly_equal, truthy};
pub use slice::{canonicalize, Slice};
pub use vm::{Vm, VmConfig};
