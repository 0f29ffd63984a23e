//! Mark/move compacting garbage collector.
//!
//! The collector runs in two phases over the single arena:
//!
//! 1. **Mark**: starting from the root set, visit every reachable object
//!    through its kind's [`MemDescriptor`](crate::MemDescriptor), recording
//!    `(offset, kind, size)` for each live object.
//! 2. **Move**: walk live objects from low to high offset, slide each one
//!    down over the dead space preceding it, and record the old to new
//!    offset translation. Then revisit every live object and every root and
//!    rewrite their offset fields through the translation table.
//!
//! Relative order of objects is preserved and no object ever moves up, so
//! the translation table is sorted by old offset and lookups are a binary
//! search.

use std::collections::BTreeMap;

use core_types::{Offset, Poly};
use tracing::debug;

use crate::arena::{round_up, Arena};
use crate::object::ObjectKind;

/// State of the collector.
///
/// A collection runs to completion inside one [`Collector::collect`] call,
/// so callers only ever observe `Idle`. `Marking` and `Moving` are held
/// only while that call is on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GcPhase {
    /// No collection in progress
    #[default]
    Idle,
    /// Tracing live objects from the roots
    Marking,
    /// Compacting and rewriting offsets
    Moving,
}

/// How much of the arena a collection compacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectStyle {
    /// Compact the whole arena
    Full,
    /// Compact only what was allocated since the last full collection;
    /// everything below that point stays where it is, dead or alive.
    /// Marking still traces the whole heap: only the move step is bounded.
    Incremental,
}

/// Collection statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GcStats {
    /// Collections run, of either style
    pub collections: usize,
    /// Full collections run
    pub full_collections: usize,
    /// Bytes reclaimed by the last collection
    pub bytes_reclaimed: usize,
    /// Bytes reclaimed over the heap's lifetime
    pub total_reclaimed: usize,
    /// Objects that changed offset in the last collection
    pub objects_moved: usize,
    /// Bytes live after the last collection
    pub live_bytes: usize,
}

/// Something that holds offsets the collector does not find on its own.
pub trait RootSet {
    /// Report every root reference.
    fn mark_roots(&self, arena: &Arena, marker: &mut Marker);

    /// Rewrite every root reference through `moves`.
    fn relocate_roots(&mut self, moves: &Relocation);
}

#[derive(Debug, Clone, Copy)]
struct LiveObject {
    kind: ObjectKind,
    size: usize,
}

/// Mark-phase worklist and live set.
#[derive(Debug, Default)]
pub struct Marker {
    live: BTreeMap<Offset, LiveObject>,
    pending: Vec<Offset>,
}

impl Marker {
    /// Create an empty marker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the object at `at` as live and queue it for scanning.
    ///
    /// Offset 0 and already-marked objects are ignored.
    pub fn mark(&mut self, arena: &Arena, kind: ObjectKind, at: Offset) {
        if at == 0 || self.live.contains_key(&at) {
            return;
        }
        let size = round_up(kind.descriptor().size(arena, at));
        self.live.insert(at, LiveObject { kind, size });
        self.pending.push(at);
    }

    /// Mark list element storage. Its size is only known to the owning list.
    pub fn mark_blob(&mut self, at: Offset, bytes: usize) {
        if at == 0 || bytes == 0 {
            return;
        }
        self.live.entry(at).or_insert(LiveObject {
            kind: ObjectKind::Blob,
            size: round_up(bytes),
        });
    }

    /// Mark whatever arena object `p` references, if any.
    pub fn mark_poly(&mut self, arena: &Arena, p: Poly) {
        if let Some(kind) = ObjectKind::of_poly(p) {
            self.mark(arena, kind, p.offset());
        }
    }

    /// Whether `at` has been marked.
    pub fn is_marked(&self, at: Offset) -> bool {
        self.live.contains_key(&at)
    }

    /// Number of live objects found so far.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    fn drain(&mut self, arena: &Arena) {
        while let Some(at) = self.pending.pop() {
            let kind = self.live[&at].kind;
            kind.descriptor().mark(arena, at, self);
        }
    }
}

/// Old to new offset translation produced by the move phase.
#[derive(Debug, Default)]
pub struct Relocation {
    moves: Vec<(Offset, Offset)>,
}

impl Relocation {
    /// New offset of the object that lived at `at`. Objects that did not
    /// move translate to themselves.
    pub fn translate(&self, at: Offset) -> Offset {
        match self.moves.binary_search_by_key(&at, |&(old, _)| old) {
            Ok(i) => self.moves[i].1,
            Err(_) => at,
        }
    }

    /// Translate the offset carried by `p` if it references an arena object.
    pub fn translate_poly(&self, p: Poly) -> Poly {
        if ObjectKind::of_poly(p).is_some() {
            p.with_offset(self.translate(p.offset()))
        } else {
            p
        }
    }

    /// Number of objects that moved.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether nothing moved.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// The collector state machine: Idle, Marking, Moving, Idle.
#[derive(Debug, Default)]
pub struct Collector {
    phase: GcPhase,
    /// End of live data after the last full collection
    last_top: usize,
    stats: GcStats,
}

impl Collector {
    /// Create an idle collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> GcPhase {
        self.phase
    }

    /// Statistics so far.
    pub fn stats(&self) -> GcStats {
        self.stats
    }

    /// Run one collection.
    ///
    /// # Arguments
    ///
    /// * `style` - Full or incremental
    /// * `arena` - The arena to compact
    /// * `roots` - The root set
    ///
    /// # Returns
    ///
    /// Number of bytes reclaimed.
    pub fn collect<R: RootSet + ?Sized>(
        &mut self,
        style: CollectStyle,
        arena: &mut Arena,
        roots: &mut R,
    ) -> usize {
        let before = arena.used();

        self.phase = GcPhase::Marking;
        let mut marker = Marker::new();
        roots.mark_roots(arena, &mut marker);
        marker.drain(arena);

        self.phase = GcPhase::Moving;
        let floor = match style {
            CollectStyle::Full => 0,
            CollectStyle::Incremental => self.last_top.min(before),
        };
        let mut top = floor;
        let mut moves = Vec::new();
        for (&at, obj) in &marker.live {
            let index = Arena::index_of(at);
            if index < floor {
                continue;
            }
            if index != top {
                arena.slide(index, top, obj.size);
                moves.push((at, Arena::offset_of(top)));
            }
            top += obj.size;
        }
        let moves = Relocation { moves };

        if !moves.is_empty() {
            for (&at, obj) in &marker.live {
                obj.kind
                    .descriptor()
                    .relocate(arena, moves.translate(at), &moves);
            }
            roots.relocate_roots(&moves);
        }

        // Dead objects below the floor keep their space in an incremental pass.
        let new_top = top;
        arena.set_top(new_top);
        if style == CollectStyle::Full {
            self.last_top = new_top;
            self.stats.full_collections += 1;
        }

        let reclaimed = before - new_top;
        self.stats.collections += 1;
        self.stats.bytes_reclaimed = reclaimed;
        self.stats.total_reclaimed += reclaimed;
        self.stats.objects_moved = moves.len();
        self.stats.live_bytes = new_top;
        self.phase = GcPhase::Idle;

        debug!(
            ?style,
            live_objects = marker.live_count(),
            live_bytes = new_top,
            reclaimed,
            moved = moves.len(),
            "collection finished"
        );
        reclaimed
    }
}
