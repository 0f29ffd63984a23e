//! Memory Manager and Interpreter Integration Tests
//!
//! Programs that lean on the collector: garbage far larger than the pool,
//! live data larger than the pool, and literals kept alive only by code.

use bytecode_system::Op;
use core_types::{Poly, VmError};
use integration_tests::asm::Asm;
use integration_tests::init_logging;
use interpreter::{Vm, VmConfig};
use memory_manager::{CollectStyle, HeapConfig};

fn vm_with_pool(pool_size: usize) -> Vm {
    Vm::with_config(VmConfig {
        heap: HeapConfig {
            pool_size,
            stack_size: 32,
        },
        ..VmConfig::default()
    })
    .unwrap()
}

/// Test: garbage many times the pool size is reclaimed as it goes
#[test]
fn test_garbage_heavy_program_completes() {
    init_logging();
    let mut vm = vm_with_pool(1024);
    let mut asm = Asm::new(&mut vm);
    asm.num(0.0).assign("i");
    let top = asm.here();
    asm.id("i").push().num(200.0).op(Op::Lt);
    let exit = asm.branch(Op::If);
    asm.string("abc").push().string("def").op(Op::Plus).assign("s");
    asm.id("i").push().num(1.0).op(Op::Plus).assign("i");
    let back = asm.branch(Op::Branch);
    asm.patch(back, top);
    let end = asm.here();
    asm.patch(exit, end);
    vm.run().unwrap();

    assert_eq!(vm.get_global("i"), Some(Poly::from_f32(200.0)));
    let s = vm.get_global("s").unwrap();
    assert_eq!(vm.string(s).as_deref(), Some("abcdef"));
    let stats = vm.heap().stats();
    assert!(stats.collections > 0);
    assert!(stats.total_reclaimed > 1024);
}

/// Test: live data beyond the pool reports OutOfMemory
#[test]
fn test_live_data_exceeding_pool_is_out_of_memory() {
    let mut vm = vm_with_pool(512);
    vm.register_core_builtins().unwrap();
    let mut asm = Asm::new(&mut vm);
    asm.id("list").push().call(0, 0).assign("l");
    let top = asm.here();
    asm.num(1.0);
    let exit = asm.branch(Op::If);
    asm.id("append").push().id("l").push().num(1.0).push().call(2, 0);
    let back = asm.branch(Op::Branch);
    asm.patch(back, top);
    let end = asm.here();
    asm.patch(exit, end);

    let err = vm.run().unwrap_err();
    assert!(matches!(err, VmError::OutOfMemory { .. }));
    assert!(err.is_fatal());
}

/// Test: a string literal reachable only from code survives and moves
#[test]
fn test_literal_lives_in_code() {
    let mut vm = vm_with_pool(1024);
    for _ in 0..4 {
        vm.make_string("filler filler filler").unwrap();
    }
    // def greet(): return "hello"
    Asm::new(&mut vm).string("hello");
    vm.define_func("greet", &[]).unwrap();
    let used = vm.heap().used();
    vm.heap_mut().collect(CollectStyle::Full);
    assert!(vm.heap().used() < used);

    Asm::new(&mut vm).id("greet").push().call(0, 0).assign("g");
    vm.run().unwrap();
    let g = vm.get_global("g").unwrap();
    assert_eq!(vm.string(g).as_deref(), Some("hello"));
}

/// Test: a second full collection right after a first moves nothing
#[test]
fn test_collection_is_idempotent_after_run() {
    let mut vm = vm_with_pool(2048);
    let mut asm = Asm::new(&mut vm);
    asm.string("a").push().string("b").op(Op::Plus).assign("x");
    asm.string("c").push().string("d").op(Op::Plus);
    asm.num(1.0).push().num(2.0).push().list(2).assign("y");
    vm.run().unwrap();

    vm.heap_mut().collect(CollectStyle::Full);
    let used = vm.heap().used();
    vm.heap_mut().collect(CollectStyle::Full);
    assert_eq!(vm.heap().stats().objects_moved, 0);
    assert_eq!(vm.heap().stats().bytes_reclaimed, 0);
    assert_eq!(vm.heap().used(), used);
    let y = vm.get_global("y").unwrap();
    assert_eq!(vm.format(y), "[1, 2]");
}

/// Test: opportunistic incremental passes between instructions
#[test]
fn test_incremental_interval() {
    let mut vm = Vm::with_config(VmConfig {
        heap: HeapConfig {
            pool_size: 2048,
            stack_size: 32,
        },
        gc_interval: Some(5),
        ..VmConfig::default()
    })
    .unwrap();
    let mut asm = Asm::new(&mut vm);
    for i in 0..10 {
        asm.string("t").push().string("u").op(Op::Plus);
        asm.num(i as f32).assign("last");
    }
    vm.run().unwrap();
    let stats = vm.heap().stats();
    assert!(stats.collections >= 6);
    assert_eq!(stats.full_collections, 0);
    assert_eq!(vm.get_global("last"), Some(Poly::from_f32(9.0)));
}

/// Test: a product past the float range stays a number through collection
#[test]
fn test_large_negative_product_survives_collection() {
    let mut vm = vm_with_pool(1024);
    let mut asm = Asm::new(&mut vm);
    asm.num(-1e38).push().num(3.0).op(Op::Times).assign("x");
    asm.string("keep").push().num(-2e38).push().num(2.0).op(Op::Times).push();
    asm.list(2).assign("l");
    vm.run().unwrap();

    let x = vm.get_global("x").unwrap();
    assert!(x.is_float());
    assert_eq!(vm.format(x), "-inf");

    vm.heap_mut().collect(CollectStyle::Full);
    let x = vm.get_global("x").unwrap();
    assert_eq!(x.to_f32(), f32::NEG_INFINITY);
    assert_eq!(vm.format(x), "-inf");
    let l = vm.get_global("l").unwrap();
    assert_eq!(vm.format(l), "['keep', -inf]");
}
