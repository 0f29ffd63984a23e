//! Integration tests for interpreter
//!
//! Whole programs assembled through the emitter, exercising the
//! interpreter, the collector and the frame machinery together.

#[path = "../common/asm.rs"]
mod asm;

use asm::{define_factorial, Asm};
use bytecode_system::{ForwardKind, Op};
use core_types::{Poly, VmError};
use interpreter::{Vm, VmConfig};
use memory_manager::{CollectStyle, HeapConfig};

fn small_vm(pool_size: usize) -> Vm {
    Vm::with_config(VmConfig {
        heap: HeapConfig {
            pool_size,
            stack_size: 64,
        },
        ..VmConfig::default()
    })
    .unwrap()
}

#[test]
fn test_list_concat_program() {
    let mut vm = Vm::new().unwrap();
    let mut asm = Asm::new(&mut vm);
    asm.num(1.0).push().num(2.0).push().num(3.0).push().list(3).assign("a");
    asm.id("a").push();
    asm.num(4.0).push().num(5.0).push().list(2).assign("b");
    asm.op(Op::Plus).assign("c");
    vm.run().unwrap();

    let a = vm.get_global("a").unwrap();
    let b = vm.get_global("b").unwrap();
    let c = vm.get_global("c").unwrap();
    assert_eq!(vm.format(c), "[1, 2, 3, 4, 5]");
    assert_ne!(c.offset(), a.offset());
    assert_ne!(c.offset(), b.offset());
    assert_eq!(vm.format(a), "[1, 2, 3]");
    assert!(vm.heap().stack().is_empty());
}

#[test]
fn test_recursive_factorial() {
    let mut vm = Vm::new().unwrap();
    define_factorial(&mut vm);
    Asm::new(&mut vm)
        .id("fact")
        .push()
        .num(6.0)
        .push()
        .call(1, 0)
        .assign("r");
    vm.run().unwrap();
    assert_eq!(vm.get_global("r"), Some(Poly::from_f32(720.0)));
    assert!(vm.heap().stack().is_empty());
    assert_eq!(vm.heap().frame(), vm.heap().globals());
}

#[test]
fn test_factorial_under_collection_pressure() {
    let mut vm = small_vm(512);
    define_factorial(&mut vm);
    let mut asm = Asm::new(&mut vm);
    asm.num(0.0).assign("i");
    let top = asm.here();
    asm.id("i").push().num(30.0).op(Op::Lt);
    let exit = asm.branch(Op::If);
    asm.string("x").push().string("y").op(Op::Plus).assign("junk");
    asm.id("fact").push().num(5.0).push().call(1, 0).assign("r");
    asm.id("i").push().num(1.0).op(Op::Plus).assign("i");
    let back = asm.branch(Op::Branch);
    asm.patch(back, top);
    let end = asm.here();
    asm.patch(exit, end);
    vm.run().unwrap();

    assert_eq!(vm.get_global("r"), Some(Poly::from_f32(120.0)));
    assert!(vm.heap().stats().collections > 0);
    let junk = vm.get_global("junk").unwrap();
    assert_eq!(vm.string(junk).as_deref(), Some("xy"));
}

#[test]
fn test_return_honors_call_push_flag() {
    // def f(): return 41; 99
    // r = f() + 1, with the call result pushed as the left operand
    let mut vm = Vm::new().unwrap();
    let mut asm = Asm::new(&mut vm);
    asm.num(41.0).forward(ForwardKind::Return).num(99.0);
    asm.patch_forward(0, ForwardKind::Return);
    vm.define_func("f", &[]).unwrap();

    Asm::new(&mut vm)
        .id("f")
        .push()
        .call(0, 0)
        .push()
        .num(1.0)
        .op(Op::Plus)
        .assign("r");
    vm.run().unwrap();
    assert_eq!(vm.get_global("r"), Some(Poly::from_f32(42.0)));
    assert!(vm.heap().stack().is_empty());
}

#[test]
fn test_global_statement() {
    // def set(): global g; g = 7
    // def shadow(): g = 9
    let mut vm = Vm::new().unwrap();
    Asm::new(&mut vm).global("g").num(7.0).assign("g");
    vm.define_func("set", &[]).unwrap();
    Asm::new(&mut vm).num(9.0).assign("g");
    vm.define_func("shadow", &[]).unwrap();

    let mut asm = Asm::new(&mut vm);
    asm.num(1.0).assign("g");
    asm.id("set").push().call(0, 0);
    asm.id("shadow").push().call(0, 0);
    vm.run().unwrap();
    assert_eq!(vm.get_global("g"), Some(Poly::from_f32(7.0)));
}

#[test]
fn test_locals_do_not_leak() {
    // def f(a): b = a * 2; return b
    let mut vm = Vm::new().unwrap();
    Asm::new(&mut vm)
        .id("a")
        .push()
        .num(2.0)
        .op(Op::Times)
        .assign("b")
        .id("b");
    vm.define_func("f", &["a"]).unwrap();
    Asm::new(&mut vm)
        .id("f")
        .push()
        .num(4.0)
        .push()
        .call(1, 0)
        .assign("r");
    vm.run().unwrap();
    assert_eq!(vm.get_global("r"), Some(Poly::from_f32(8.0)));
    assert_eq!(vm.get_global("a"), None);
    assert_eq!(vm.get_global("b"), None);
}

#[test]
fn test_builtins_through_bytecode() {
    let mut vm = Vm::new().unwrap();
    vm.register_core_builtins().unwrap();
    let mut asm = Asm::new(&mut vm);
    asm.id("list").push().num(1.0).push().num(2.0).push().call(2, 0).assign("l");
    asm.id("append").push().id("l").push().string("z").push().call(2, 0);
    asm.id("len").push().id("l").push().call(1, 0).assign("n");
    vm.run().unwrap();
    assert_eq!(vm.get_global("n"), Some(Poly::from_f32(3.0)));
    let l = vm.get_global("l").unwrap();
    assert_eq!(vm.format(l), "[1, 2, 'z']");
    assert!(vm.heap().stack().is_empty());
}

#[test]
fn test_arity_error_leaves_frames_for_driver() {
    let mut vm = Vm::new().unwrap();
    // def outer(): inner(1)    with   def inner(a, b): 0
    Asm::new(&mut vm).num(0.0);
    vm.define_func("inner", &["a", "b"]).unwrap();
    Asm::new(&mut vm).id("inner").push().num(1.0).push().call(1, 0);
    vm.define_func("outer", &[]).unwrap();
    Asm::new(&mut vm).id("outer").push().call(0, 0);

    let err = vm.run().unwrap_err();
    assert_eq!(err, VmError::ArityMismatch { expected: 2, got: 1 });
    assert!(!err.is_fatal());
    assert_ne!(vm.heap().frame(), vm.heap().globals());
    vm.unwind();
    assert_eq!(vm.heap().frame(), vm.heap().globals());

    // the VM is usable again
    Asm::new(&mut vm).num(2.0).assign("ok");
    vm.run().unwrap();
    assert_eq!(vm.get_global("ok"), Some(Poly::from_f32(2.0)));
}

#[test]
fn test_relocated_function_still_callable() {
    let mut vm = small_vm(1024);
    for _ in 0..8 {
        vm.make_string("garbage that only exists to be collected").unwrap();
    }
    Asm::new(&mut vm).id("x").push().id("y").op(Op::Minus);
    let before = vm.define_func("sub", &["x", "y"]).unwrap();
    vm.heap_mut().collect(CollectStyle::Full);
    let after = vm.get_global("sub").unwrap();
    assert!(after.offset() < before.offset());

    Asm::new(&mut vm)
        .id("sub")
        .push()
        .num(10.0)
        .push()
        .num(3.0)
        .push()
        .call(2, 0)
        .assign("r");
    vm.run().unwrap();
    assert_eq!(vm.get_global("r"), Some(Poly::from_f32(7.0)));
}
