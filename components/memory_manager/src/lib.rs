//! Memory Manager - arena, object layouts and compacting garbage collector
//!
//! This component provides:
//! - A fixed-size byte arena addressed by 1-based 16-bit offsets
//! - Layouts and memory descriptors for every object kind (list, string,
//!   function, code, frame, variable, name)
//! - A mark/move collector that slides live objects down and rewrites
//!   every offset that referenced them
//! - The [`Heap`], which owns the arena together with every GC root: the
//!   value stack, frame registers, stash registers and the compile buffer
//!
//! # Example
//!
//! ```
//! use core_types::{Poly, PolyKind};
//! use memory_manager::{CollectStyle, Heap};
//!
//! let mut heap = Heap::new().unwrap();
//! let _garbage = heap.string_make(b"unreachable").unwrap();
//! let kept = heap.string_make(b"kept").unwrap();
//! heap.push(Poly::reference(kept, PolyKind::String)).unwrap();
//!
//! heap.collect(CollectStyle::Full);
//!
//! let kept = heap.pop().unwrap();
//! assert_eq!(heap.string_bytes(kept.offset()), b"kept");
//! assert!(heap.stats().bytes_reclaimed > 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arena;
pub mod code;
pub mod frame;
pub mod func;
pub mod gc;
pub mod heap;
pub mod list;
pub mod name;
pub mod object;
pub mod stack;
pub mod string;

// Re-export main types
pub use arena::{round_up, Arena, ALIGN};
pub use code::Code;
pub use frame::{Frame, Variable};
pub use func::Func;
pub use gc::{CollectStyle, Collector, GcPhase, GcStats, Marker, Relocation, RootSet};
pub use heap::{Heap, HeapConfig, DEFAULT_POOL_SIZE, DEFAULT_STACK_SIZE};
pub use list::{Blob, List};
pub use name::Name;
pub use object::{MemDescriptor, ObjectKind};
pub use stack::ValueStack;
pub use string::Str;
