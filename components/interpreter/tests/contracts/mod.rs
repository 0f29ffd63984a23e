//! Contract tests for interpreter API
//!
//! These tests pin the public surface hosts rely on.

use bytecode_system::Op;
use core_types::{Poly, PolyKind, VmError, VmResult};
use interpreter::{
    canonicalize, format_poly, Builtin, BuiltinTable, CallArgs, Slice, Vm, VmConfig, VARIADIC,
};
use memory_manager::{Heap, DEFAULT_POOL_SIZE, DEFAULT_STACK_SIZE};

fn first(heap: &mut Heap, args: CallArgs) -> VmResult<Poly> {
    Ok(if args.is_empty() {
        Poly::NULL
    } else {
        args.get(heap, 0)
    })
}

const FIRST: Builtin = Builtin {
    name: "first",
    nformal: VARIADIC,
    func: first,
};

/// VmConfig::default() matches the embedded defaults
#[test]
fn test_default_config_contract() {
    let config = VmConfig::default();
    assert_eq!(config.heap.pool_size, DEFAULT_POOL_SIZE);
    assert_eq!(config.heap.stack_size, DEFAULT_STACK_SIZE);
    assert_eq!(config.gc_interval, None);
    assert_eq!(config.instruction_limit, None);
}

/// Vm::execute() returns the final accumulator
#[test]
fn test_execute_contract() {
    let mut vm = Vm::new().unwrap();
    vm.emitter().add_number(42.0).unwrap();
    let code = vm.finish().unwrap();
    assert_eq!(vm.execute(code).unwrap(), Poly::from_f32(42.0));
    // a code object can run again
    assert_eq!(vm.execute(code).unwrap(), Poly::from_f32(42.0));
}

/// Vm::register_builtin() binds the builtin globally
#[test]
fn test_register_builtin_contract() {
    let mut vm = Vm::new().unwrap();
    let callee = vm.register_builtin(FIRST).unwrap();
    assert_eq!(callee.kind(), PolyKind::Builtin);
    assert_eq!(vm.get_global("first"), Some(callee));
    assert_eq!(vm.format(callee), "<builtin first>");
}

/// Builtins see positional arguments only; named pairs are dropped
#[test]
fn test_builtin_named_args_contract() {
    let mut vm = Vm::new().unwrap();
    vm.register_builtin(FIRST).unwrap();
    let first = vm.name_id("first").unwrap();
    let buf = vm.emitter();
    let at = buf.add_op_id(Op::Id, first).unwrap();
    buf.set_push(at).unwrap();
    let at = buf.add_number(5.0).unwrap();
    buf.set_push(at).unwrap();
    let at = buf.add_number(1.0).unwrap();
    buf.set_push(at).unwrap();
    let at = buf.add_number(6.0).unwrap();
    buf.set_push(at).unwrap();
    buf.add_call(1, 1).unwrap();
    assert_eq!(vm.run().unwrap(), Poly::from_f32(5.0));
    assert!(vm.heap().stack().is_empty());
}

/// Builtin arity is checked before the call
#[test]
fn test_builtin_arity_contract() {
    let mut vm = Vm::new().unwrap();
    vm.register_core_builtins().unwrap();
    let len = vm.name_id("len").unwrap();
    let buf = vm.emitter();
    for at in [
        buf.add_op_id(Op::Id, len).unwrap(),
        buf.add_number(1.0).unwrap(),
        buf.add_number(2.0).unwrap(),
    ] {
        buf.set_push(at).unwrap();
    }
    buf.add_call(2, 0).unwrap();
    assert_eq!(
        vm.run().unwrap_err(),
        VmError::ArityMismatch { expected: 1, got: 2 }
    );
    assert!(vm.heap().stack().is_empty());
}

/// Calling something that is not a function keeps the accumulator
#[test]
fn test_non_function_call_contract() {
    let mut vm = Vm::new().unwrap();
    let buf = vm.emitter();
    let at = buf.add_number(5.0).unwrap();
    buf.set_push(at).unwrap();
    let at = buf.add_number(1.0).unwrap();
    buf.set_push(at).unwrap();
    buf.add_call(1, 0).unwrap();
    assert_eq!(vm.run().unwrap(), Poly::from_f32(1.0));
    assert!(vm.heap().stack().is_empty());
}

/// canonicalize() leaves a full slice unchanged and never panics on empty
#[test]
fn test_canonicalize_contract() {
    for len in 0..6 {
        assert_eq!(
            canonicalize(len, None, None, None),
            Some(Slice {
                start: 0,
                stride: 1,
                count: len
            })
        );
    }
    assert_eq!(canonicalize(0, Some(-3), Some(7), Some(-2)).unwrap().count, 0);
}

/// format_poly() works on a bare heap
#[test]
fn test_format_poly_contract() {
    let heap = Heap::new().unwrap();
    let table = BuiltinTable::new();
    assert_eq!(format_poly(&heap, &table, Poly::from_f32(0.5)), "0.5");
    assert_eq!(format_poly(&heap, &table, Poly::from_f32(-7.0)), "-7");
}
