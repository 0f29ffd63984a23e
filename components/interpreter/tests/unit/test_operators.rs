use bytecode_system::Op;
use core_types::{Poly, PolyKind};
use interpreter::operators::{binary, unary};
use interpreter::{poly_equal, truthy};
use memory_manager::Heap;

fn num(n: f32) -> Poly {
    Poly::from_f32(n)
}

fn numbers(heap: &mut Heap, values: &[f32]) -> Poly {
    for &v in values {
        heap.push(num(v)).unwrap();
    }
    heap.list_imm(values.len()).unwrap()
}

#[test]
fn test_div_mod_truncate_toward_zero() {
    let mut heap = Heap::new().unwrap();
    let cases = [
        (Op::Div, 7.0, 2.0, 3.0),
        (Op::Div, -7.0, 2.0, -3.0),
        (Op::Div, 7.0, -2.0, -3.0),
        (Op::Mod, 7.0, 2.0, 1.0),
        (Op::Mod, -7.0, 2.0, -1.0),
    ];
    for (op, a, b, want) in cases {
        let got = binary(&mut heap, op, num(a), num(b)).unwrap();
        assert_eq!(got, num(want), "{:?} {} {}", op, a, b);
    }
}

#[test]
fn test_float_arithmetic() {
    let mut heap = Heap::new().unwrap();
    assert_eq!(binary(&mut heap, Op::Divide, num(7.0), num(2.0)).unwrap(), num(3.5));
    assert_eq!(binary(&mut heap, Op::Minus, num(1.0), num(3.0)).unwrap(), num(-2.0));
    assert_eq!(unary(&heap, Op::Uminus, num(3.0)), num(-3.0));
    let inf = binary(&mut heap, Op::Divide, num(-1.0), num(0.0)).unwrap();
    assert!(inf.is_float());
    assert_eq!(inf.to_f32(), f32::NEG_INFINITY);
    let nan = binary(&mut heap, Op::Divide, num(0.0), num(0.0)).unwrap();
    assert_eq!(nan, Poly::NAN);
}

#[test]
fn test_list_plus_allocates() {
    let mut heap = Heap::new().unwrap();
    let a = numbers(&mut heap, &[1.0, 2.0]);
    let b = numbers(&mut heap, &[3.0]);
    let c = binary(&mut heap, Op::Plus, a, b).unwrap();
    assert_ne!(c, a);
    assert_ne!(c, b);
    assert_eq!(heap.list_items(c.offset()), vec![num(1.0), num(2.0), num(3.0)]);
    assert_eq!(heap.list_len(a.offset()), 2);
}

#[test]
fn test_list_minus_degrades_to_left() {
    let mut heap = Heap::new().unwrap();
    let a = numbers(&mut heap, &[1.0]);
    let b = numbers(&mut heap, &[1.0]);
    assert_eq!(binary(&mut heap, Op::Minus, a, b).unwrap(), a);
    assert_eq!(binary(&mut heap, Op::Lt, a, b).unwrap(), a);
}

#[test]
fn test_logic_coerces() {
    let mut heap = Heap::new().unwrap();
    let empty = numbers(&mut heap, &[]);
    let s = Poly::reference(heap.string_make(b"x").unwrap(), PolyKind::String);
    assert_eq!(binary(&mut heap, Op::And, s, num(2.0)).unwrap(), Poly::ONE);
    assert_eq!(binary(&mut heap, Op::And, s, empty).unwrap(), Poly::ZERO);
    assert_eq!(binary(&mut heap, Op::Or, empty, Poly::NULL).unwrap(), Poly::ZERO);
    assert!(truthy(&heap, s));
    assert!(!truthy(&heap, empty));
}

#[test]
fn test_nested_list_equality() {
    let mut heap = Heap::new().unwrap();
    let inner = numbers(&mut heap, &[1.0]);
    heap.push(inner).unwrap();
    heap.push(num(2.0)).unwrap();
    let a = heap.list_imm(2).unwrap();
    heap.push(a).unwrap();
    let inner = numbers(&mut heap, &[1.0]);
    heap.push(inner).unwrap();
    heap.push(num(2.0)).unwrap();
    let b = heap.list_imm(2).unwrap();
    let a = heap.pop().unwrap();
    assert!(poly_equal(&heap, a, b));
    assert_eq!(binary(&mut heap, Op::Ne, a, b).unwrap(), Poly::ZERO);
}
