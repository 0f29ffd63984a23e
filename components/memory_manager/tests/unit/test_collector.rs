//! Collector properties over mixed allocation sequences

use core_types::{Poly, PolyKind};
use memory_manager::{CollectStyle, GcPhase, Heap, HeapConfig};

use super::init_logging;

/// Small deterministic generator so runs are reproducible.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0 >> 8
    }
}

fn heap(pool_size: usize) -> Heap {
    Heap::with_config(HeapConfig {
        pool_size,
        stack_size: 64,
    })
    .unwrap()
}

/// Host-side copy of a value, used to compare before and after collection.
#[derive(Debug, PartialEq)]
enum Shape {
    Num(f32),
    Text(Vec<u8>),
    Items(Vec<Shape>),
}

fn shape(heap: &Heap, p: Poly) -> Shape {
    match p.kind() {
        PolyKind::String => Shape::Text(heap.string_bytes(p.offset()).to_vec()),
        PolyKind::List => Shape::Items(
            heap.list_items(p.offset())
                .into_iter()
                .map(|e| shape(heap, e))
                .collect(),
        ),
        _ => Shape::Num(p.to_f32()),
    }
}

#[test]
fn test_live_values_are_content_equal_after_collection() {
    init_logging();
    let mut heap = heap(4096);
    let mut rng = Lcg(7);
    for round in 0..40 {
        match rng.next() % 4 {
            0 => {
                let text = format!("s{}", round);
                let at = heap.string_make(text.as_bytes()).unwrap();
                if rng.next() % 2 == 0 {
                    heap.push(Poly::reference(at, PolyKind::String)).unwrap();
                }
            }
            1 if heap.stack().len() >= 2 => {
                let list = heap.list_imm(2).unwrap();
                heap.push(list).unwrap();
            }
            2 => {
                let _garbage = heap.list_make(3).unwrap();
            }
            _ => heap.push(Poly::from_f32(round as f32)).unwrap(),
        }
    }
    let before: Vec<Shape> = heap
        .stack()
        .as_slice()
        .iter()
        .map(|&p| shape(&heap, p))
        .collect();
    heap.collect(CollectStyle::Full);
    let after: Vec<Shape> = heap
        .stack()
        .as_slice()
        .iter()
        .map(|&p| shape(&heap, p))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_full_collection_is_idempotent() {
    let mut heap = heap(1024);
    for i in 0..10 {
        let at = heap.string_make(format!("v{}", i).as_bytes()).unwrap();
        if i % 3 == 0 {
            heap.push(Poly::reference(at, PolyKind::String)).unwrap();
        }
    }
    heap.collect(CollectStyle::Full);
    let used = heap.used();
    heap.collect(CollectStyle::Full);
    assert_eq!(heap.stats().objects_moved, 0);
    assert_eq!(heap.stats().bytes_reclaimed, 0);
    assert_eq!(heap.used(), used);
}

#[test]
fn test_offsets_never_move_up() {
    let mut heap = heap(1024);
    let mut before = Vec::new();
    for i in 0..8 {
        let at = heap.string_make(format!("item{}", i).as_bytes()).unwrap();
        if i % 2 == 1 {
            heap.push(Poly::reference(at, PolyKind::String)).unwrap();
            before.push(at);
        }
    }
    heap.collect(CollectStyle::Full);
    let after: Vec<_> = heap.stack().as_slice().iter().map(|p| p.offset()).collect();
    for (old, new) in before.iter().zip(&after) {
        assert!(new <= old);
    }
    // relative order is preserved
    assert!(after.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_space_after_last_live_object_is_reusable() {
    let mut heap = heap(128);
    for _ in 0..5 {
        heap.string_make(b"0123456789abcdef").unwrap();
    }
    heap.collect(CollectStyle::Full);
    // only the global frame remains
    assert_eq!(heap.used(), 8);
    assert!(heap.alloc(120).is_ok());
}

#[test]
fn test_incremental_then_full() {
    let mut heap = heap(256);
    heap.collect(CollectStyle::Full);
    heap.string_make(b"garbage").unwrap();
    heap.collect(CollectStyle::Incremental);
    assert_eq!(heap.used(), 8);
    assert_eq!(heap.stats().full_collections, 1);
    assert_eq!(heap.stats().collections, 2);
    assert_eq!(heap.phase(), GcPhase::Idle);
}
