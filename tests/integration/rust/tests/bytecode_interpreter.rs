//! Bytecode to Interpreter Integration Tests
//!
//! Tests the integration between bytecode_system and interpreter components.
//! Verifies that emitted instructions are executed as encoded.

use bytecode_system::{decode, ForwardKind, Op, Operand};
use core_types::Poly;
use integration_tests::asm::Asm;
use interpreter::Vm;

fn eval_binary(op: Op, a: f32, b: f32) -> Poly {
    let mut vm = Vm::new().unwrap();
    Asm::new(&mut vm).num(a).push().num(b).op(op);
    vm.run().unwrap()
}

/// Test: numeric binary operators through the dispatch loop
#[test]
fn test_numeric_operators() {
    let cases = [
        (Op::Plus, 2.0, 3.0, 5.0),
        (Op::Minus, 2.0, 3.0, -1.0),
        (Op::Times, 2.0, 3.0, 6.0),
        (Op::Divide, 3.0, 2.0, 1.5),
        (Op::Div, 7.0, 2.0, 3.0),
        (Op::Div, -7.0, 2.0, -3.0),
        (Op::Mod, 7.0, 3.0, 1.0),
        (Op::Pow, 3.0, 2.0, 9.0),
        (Op::Land, 6.0, 3.0, 2.0),
        (Op::Lor, 6.0, 3.0, 7.0),
        (Op::Lxor, 6.0, 3.0, 5.0),
        (Op::Lshift, 3.0, 2.0, 12.0),
        (Op::Rshift, 12.0, 2.0, 3.0),
        (Op::Lt, 1.0, 2.0, 1.0),
        (Op::Ge, 1.0, 2.0, 0.0),
        (Op::Eq, 2.0, 2.0, 1.0),
        (Op::Ne, 2.0, 2.0, 0.0),
    ];
    for (op, a, b, want) in cases {
        assert_eq!(
            eval_binary(op, a, b),
            Poly::from_f32(want),
            "{} {} {}",
            op.name(),
            a,
            b
        );
    }
}

/// Test: patched forward and direct branch encode and run identically
#[test]
fn test_forward_patch_matches_direct_branch() {
    let mut vm = Vm::new().unwrap();

    let mut asm = Asm::new(&mut vm);
    asm.num(1.0).forward(ForwardKind::Break).push().num(2.0);
    asm.patch_forward(0, ForwardKind::Break);
    let patched = vm.emitter().bytes().to_vec();
    let first = vm.finish().unwrap();

    let mut asm = Asm::new(&mut vm);
    asm.num(1.0);
    let jump = asm.branch(Op::Branch);
    asm.push().num(2.0);
    let end = asm.here();
    asm.patch(jump, end);
    let direct = vm.emitter().bytes().to_vec();
    let second = vm.finish().unwrap();

    assert_eq!(patched, direct);
    let insn = decode(&patched, 5).unwrap();
    assert_eq!(insn.op, Op::Branch);
    assert!(insn.push);
    assert_eq!(insn.operand, Operand::Target(end));

    assert_eq!(vm.execute(first).unwrap(), Poly::from_f32(1.0));
    vm.unwind();
    assert_eq!(vm.execute(second).unwrap(), Poly::from_f32(1.0));
}

/// Test: continue forwards target the loop head
#[test]
fn test_continue_forward() {
    // i = 0; n = 0
    // while i < 6: i = i + 1; if i mod 2: continue; n = n + 1
    let mut vm = Vm::new().unwrap();
    let mut asm = Asm::new(&mut vm);
    asm.num(0.0).assign("i").num(0.0).assign("n");
    let top = asm.here();
    asm.id("i").push().num(6.0).op(Op::Lt);
    let exit = asm.branch(Op::If);
    let body = asm.here();
    asm.id("i").push().num(1.0).op(Op::Plus).assign("i");
    asm.id("i").push().num(2.0).op(Op::Mod);
    let skip = asm.branch(Op::If);
    asm.forward(ForwardKind::Continue);
    let after = asm.here();
    asm.patch(skip, after);
    asm.id("n").push().num(1.0).op(Op::Plus).assign("n");
    let back = asm.branch(Op::Branch);
    asm.patch(back, top);
    let end = asm.here();
    asm.patch(exit, end);
    vm.emitter().patch_forward(body, ForwardKind::Continue, top);
    vm.run().unwrap();
    assert_eq!(vm.get_global("n"), Some(Poly::from_f32(3.0)));
    assert_eq!(vm.get_global("i"), Some(Poly::from_f32(6.0)));
}

/// Test: membership and identity through bytecode
#[test]
fn test_membership() {
    let mut vm = Vm::new().unwrap();
    let mut asm = Asm::new(&mut vm);
    asm.num(1.0).push().num(2.0).push().list(2).assign("l");
    asm.num(2.0).push().id("l").op(Op::In).assign("has");
    asm.num(3.0).push().id("l").op(Op::NotIn).assign("lacks");
    asm.id("l").push().id("l").op(Op::Is).assign("same");
    asm.string("ell").push().string("hello").op(Op::In).assign("sub");
    vm.run().unwrap();
    for name in ["has", "lacks", "same", "sub"] {
        assert_eq!(vm.get_global(name), Some(Poly::ONE), "{}", name);
    }
}

/// Test: disassembly names identifiers and literals
#[test]
fn test_disassembly_listing() {
    let mut vm = Vm::new().unwrap();
    Asm::new(&mut vm)
        .string("hi")
        .push()
        .id("who")
        .op(Op::Plus)
        .assign("greeting");
    let code = vm.finish().unwrap();
    let lines = vm.disassemble(code);
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("\"hi\""));
    assert!(lines[1].contains("who"));
    assert!(lines[3].contains("greeting"));
}
