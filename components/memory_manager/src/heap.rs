//! The heap: arena, root registers, value stack and compile buffer.
//!
//! Everything that can hold an arena offset across an allocation lives here,
//! because any allocation may run the collector and relocate objects. Code
//! outside this crate must not keep an [`Offset`] or heap-referencing
//! [`Poly`] in a local across a call that allocates; it parks the value in a
//! root (the value stack, a stash register, or the accumulator) and reads it
//! back afterwards.

use bytecode_system::{string_operand_at, string_operand_sites, CodeBuffer, Resolver};
use core_types::{Id, Offset, Poly, VmError, VmResult};
use tracing::warn;

use crate::arena::Arena;
use crate::frame::Frame;
use crate::gc::{CollectStyle, Collector, GcPhase, GcStats, Marker, Relocation, RootSet};
use crate::object::ObjectKind;
use crate::stack::ValueStack;

/// Default arena size in bytes
pub const DEFAULT_POOL_SIZE: usize = 8192;
/// Default value stack depth
pub const DEFAULT_STACK_SIZE: usize = 256;

/// Heap sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// Arena size in bytes; must fit the 16-bit offset space
    pub pool_size: usize,
    /// Value stack capacity in slots
    pub stack_size: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig {
            pool_size: DEFAULT_POOL_SIZE,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// Root registers.
#[derive(Debug, Clone, Copy, Default)]
struct Roots {
    /// Global frame, always live
    globals: Offset,
    /// Innermost active frame
    frame: Offset,
    /// Head of the interned name chain
    names: Offset,
    /// Code object being executed
    code: Offset,
    /// Interpreter accumulator
    acc: Poly,
    /// Single-slot stash for a poly held across an allocation
    stash_poly: Poly,
    /// Single-slot stash for a code object held across an allocation
    stash_code: Offset,
}

struct RootView<'a> {
    roots: &'a mut Roots,
    stack: &'a mut ValueStack,
    compile: &'a mut CodeBuffer,
}

impl RootSet for RootView<'_> {
    fn mark_roots(&self, arena: &Arena, marker: &mut Marker) {
        let roots = &self.roots;
        marker.mark(arena, ObjectKind::Frame, roots.globals);
        marker.mark(arena, ObjectKind::Frame, roots.frame);
        marker.mark(arena, ObjectKind::Name, roots.names);
        marker.mark(arena, ObjectKind::Code, roots.code);
        marker.mark(arena, ObjectKind::Code, roots.stash_code);
        marker.mark_poly(arena, roots.acc);
        marker.mark_poly(arena, roots.stash_poly);
        for &p in self.stack.as_slice() {
            marker.mark_poly(arena, p);
        }
        let code = self.compile.bytes();
        for site in string_operand_sites(code) {
            marker.mark(arena, ObjectKind::String, string_operand_at(code, site));
        }
    }

    fn relocate_roots(&mut self, moves: &Relocation) {
        let roots = &mut self.roots;
        roots.globals = moves.translate(roots.globals);
        roots.frame = moves.translate(roots.frame);
        roots.names = moves.translate(roots.names);
        roots.code = moves.translate(roots.code);
        roots.stash_code = moves.translate(roots.stash_code);
        roots.acc = moves.translate_poly(roots.acc);
        roots.stash_poly = moves.translate_poly(roots.stash_poly);
        for p in self.stack.slots_mut() {
            *p = moves.translate_poly(*p);
        }
        let sites = string_operand_sites(self.compile.bytes());
        let code = self.compile.bytes_mut();
        for site in sites {
            let old = string_operand_at(code, site);
            bytecode_system::patch_string_operand(code, site, moves.translate(old));
        }
    }
}

/// Garbage-collected heap.
///
/// Owns the arena and every root, so an allocation can always collect.
#[derive(Debug)]
pub struct Heap {
    arena: Arena,
    stack: ValueStack,
    roots: Roots,
    compile: CodeBuffer,
    collector: Collector,
    config: HeapConfig,
    pub(crate) next_id: Id,
}

impl Heap {
    /// Creates a heap with the default configuration.
    pub fn new() -> VmResult<Self> {
        Self::with_config(HeapConfig::default())
    }

    /// Creates a heap and its global frame.
    ///
    /// # Errors
    ///
    /// `PoolTooLarge` if the pool cannot be addressed by 16-bit offsets.
    pub fn with_config(config: HeapConfig) -> VmResult<Self> {
        if config.pool_size > Offset::MAX as usize {
            return Err(VmError::PoolTooLarge {
                size: config.pool_size,
            });
        }
        let mut heap = Heap {
            arena: Arena::new(config.pool_size),
            stack: ValueStack::new(config.stack_size),
            roots: Roots {
                acc: Poly::ZERO,
                ..Roots::default()
            },
            compile: CodeBuffer::new(),
            collector: Collector::new(),
            config,
            next_id: 1,
        };
        let globals = heap.alloc(Frame::SIZE)?;
        heap.roots.globals = globals;
        heap.roots.frame = globals;
        Ok(heap)
    }

    /// Configuration the heap was built with.
    pub fn config(&self) -> HeapConfig {
        self.config
    }

    /// Allocates `size` zeroed bytes.
    ///
    /// On exhaustion runs an incremental collection, then a full one, and
    /// retries after each.
    ///
    /// # Errors
    ///
    /// `OutOfMemory` when even a full collection leaves too little space.
    pub fn alloc(&mut self, size: usize) -> VmResult<Offset> {
        if let Some(at) = self.arena.allocate(size) {
            return Ok(at);
        }
        for style in [CollectStyle::Incremental, CollectStyle::Full] {
            self.collect(style);
            if let Some(at) = self.arena.allocate(size) {
                return Ok(at);
            }
        }
        warn!(
            requested = size,
            used = self.arena.used(),
            capacity = self.arena.capacity(),
            "allocation failed after full collection"
        );
        Err(VmError::OutOfMemory { requested: size })
    }

    /// Runs a collection of the given style, returning bytes reclaimed.
    pub fn collect(&mut self, style: CollectStyle) -> usize {
        let mut view = RootView {
            roots: &mut self.roots,
            stack: &mut self.stack,
            compile: &mut self.compile,
        };
        self.collector.collect(style, &mut self.arena, &mut view)
    }

    /// Collection statistics.
    pub fn stats(&self) -> GcStats {
        self.collector.stats()
    }

    /// Current collector phase.
    pub fn phase(&self) -> GcPhase {
        self.collector.phase()
    }

    /// The arena.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The arena, mutably.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Bytes in use.
    pub fn used(&self) -> usize {
        self.arena.used()
    }

    // Value stack

    /// The value stack.
    pub fn stack(&self) -> &ValueStack {
        &self.stack
    }

    /// Push onto the value stack.
    pub fn push(&mut self, value: Poly) -> VmResult<()> {
        self.stack.push(value)
    }

    /// Pop the value stack.
    pub fn pop(&mut self) -> VmResult<Poly> {
        self.stack.pop()
    }

    /// Read `depth` slots below the top.
    pub fn pick(&self, depth: usize) -> VmResult<Poly> {
        self.stack.pick(depth)
    }

    /// Discard the top `count` values.
    pub fn drop_n(&mut self, count: usize) -> VmResult<()> {
        self.stack.drop_n(count)
    }

    /// Empty the value stack.
    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }

    // Registers

    /// The global frame.
    pub fn globals(&self) -> Offset {
        self.roots.globals
    }

    /// The innermost frame.
    pub fn frame(&self) -> Offset {
        self.roots.frame
    }

    /// Make `frame` the innermost frame.
    pub fn set_frame(&mut self, frame: Offset) {
        self.roots.frame = frame;
    }

    pub(crate) fn names(&self) -> Offset {
        self.roots.names
    }

    pub(crate) fn set_names(&mut self, names: Offset) {
        self.roots.names = names;
    }

    /// Code object being executed.
    pub fn running_code(&self) -> Offset {
        self.roots.code
    }

    /// Set the code object being executed.
    pub fn set_running_code(&mut self, code: Offset) {
        self.roots.code = code;
    }

    /// The accumulator.
    pub fn acc(&self) -> Poly {
        self.roots.acc
    }

    /// Replace the accumulator.
    pub fn set_acc(&mut self, value: Poly) {
        self.roots.acc = value;
    }

    /// Park a poly across an allocation.
    pub fn stash_poly(&mut self, value: Poly) {
        debug_assert!(self.roots.stash_poly.is_null(), "poly stash in use");
        self.roots.stash_poly = value;
    }

    /// Take back the stashed poly, clearing the slot.
    pub fn fetch_poly(&mut self) -> Poly {
        std::mem::replace(&mut self.roots.stash_poly, Poly::NULL)
    }

    /// Park a code object across an allocation.
    pub fn stash_code(&mut self, code: Offset) {
        debug_assert!(self.roots.stash_code == 0, "code stash in use");
        self.roots.stash_code = code;
    }

    /// Take back the stashed code object, clearing the slot.
    pub fn fetch_code(&mut self) -> Offset {
        std::mem::replace(&mut self.roots.stash_code, 0)
    }

    // Compile buffer

    /// The compile buffer.
    pub fn code_buffer(&self) -> &CodeBuffer {
        &self.compile
    }

    /// The compile buffer, for emitting.
    pub fn code_buffer_mut(&mut self) -> &mut CodeBuffer {
        &mut self.compile
    }
}

impl Resolver for Heap {
    fn name(&self, id: Id) -> Option<String> {
        self.name_string(id)
    }

    fn string(&self, offset: Offset) -> Option<String> {
        if offset == 0 || offset as usize > self.arena.used() {
            return None;
        }
        Some(String::from_utf8_lossy(self.arena.cstr(offset, 0)).into_owned())
    }
}
