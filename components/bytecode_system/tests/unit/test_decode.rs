//! Tests for decoding and disassembly

use bytecode_system::{
    disassemble, instructions, patch_string_operand, string_operand_at, string_operand_sites,
    CodeBuffer, NoNames, Op, Operand,
};

#[test]
fn test_instruction_walk_addresses() {
    let mut buf = CodeBuffer::new();
    buf.add_op_id(Op::Id, 1).unwrap();
    buf.add_number(0.5).unwrap();
    buf.add_op(Op::Lt).unwrap();
    buf.add_op_branch(Op::If).unwrap();
    let ips: Vec<usize> = instructions(buf.bytes(), 0).map(|i| i.ip).collect();
    assert_eq!(ips, vec![0, 3, 8, 9]);
}

#[test]
fn test_walk_stops_at_garbage() {
    let mut code = vec![Op::Nop as u8, Op::Nop as u8];
    code.push(0x7e);
    code.push(Op::Nop as u8);
    assert_eq!(instructions(&code, 0).count(), 2);
}

#[test]
fn test_string_operand_patch() {
    let mut buf = CodeBuffer::new();
    buf.add_string(100).unwrap();
    buf.add_string(200).unwrap();
    let mut code = buf.take();
    for site in string_operand_sites(&code) {
        let old = string_operand_at(&code, site);
        patch_string_operand(&mut code, site, old / 2);
    }
    let operands: Vec<Operand> = instructions(&code, 0).map(|i| i.operand).collect();
    assert_eq!(operands, vec![Operand::String(50), Operand::String(100)]);
}

#[test]
fn test_disassemble_without_names() {
    let mut buf = CodeBuffer::new();
    buf.add_op_id(Op::Global, 5).unwrap();
    buf.add_string(12).unwrap();
    let lines = disassemble(buf.bytes(), &NoNames);
    assert_eq!(lines[0], "     0:  global         #5");
    assert_eq!(lines[1], "     3:  string         @12");
}
