//! Disassembler for diagnostics
//!
//! Renders one instruction per line as address, mnemonic, push flag (`^`)
//! and decoded operand.

use core_types::{Id, Offset};

use crate::instruction::{decode, Operand};

/// Resolves identifiers and string literals for display.
///
/// The heap implements this; tests can use [`NoNames`].
pub trait Resolver {
    /// Text of an interned identifier
    fn name(&self, id: Id) -> Option<String>;
    /// Contents of the string literal at `offset`
    fn string(&self, offset: Offset) -> Option<String>;
}

/// Resolver that knows nothing; operands print numerically.
pub struct NoNames;

impl Resolver for NoNames {
    fn name(&self, _id: Id) -> Option<String> {
        None
    }

    fn string(&self, _offset: Offset) -> Option<String> {
        None
    }
}

/// Render the instruction at `ip`, returning the text and the address of
/// the next instruction. Undecodable bytes render as `???` and advance by
/// one byte.
///
/// # Example
///
/// ```
/// use bytecode_system::{disassemble_one, CodeBuffer, NoNames};
///
/// let mut buf = CodeBuffer::new();
/// let at = buf.add_number(7.0).unwrap();
/// buf.set_push(at).unwrap();
/// let (line, next) = disassemble_one(buf.bytes(), 0, &NoNames);
/// assert_eq!(line, "     0:  num          ^ 7");
/// assert_eq!(next, 5);
/// ```
pub fn disassemble_one(code: &[u8], ip: usize, resolver: &dyn Resolver) -> (String, usize) {
    let Some(insn) = decode(code, ip) else {
        return (format!("{:6}:  ???", ip), ip + 1);
    };
    let push = if insn.push { '^' } else { ' ' };
    let operand = match insn.operand {
        Operand::None => String::new(),
        Operand::Number(n) => format!("{}", n),
        Operand::String(o) => match resolver.string(o) {
            Some(s) => format!("{:?}", s),
            None => format!("@{}", o),
        },
        Operand::Count(n) => format!("{}", n),
        Operand::Id(id) => resolver.name(id).unwrap_or_else(|| format!("#{}", id)),
        Operand::Call { positional, named } => {
            format!("{} actuals {} named", positional, named)
        }
        Operand::Slice(flags) => {
            let mut parts = Vec::new();
            if flags.has_start() {
                parts.push("start");
            }
            if flags.has_end() {
                parts.push("end");
            }
            if flags.has_stride() {
                parts.push("stride");
            }
            parts.join(" ")
        }
        Operand::Target(t) => format!("{}", t),
        Operand::Forward(kind) => kind.name().to_string(),
    };
    let line = format!("{:6}:  {:<12} {} {}", ip, insn.op.name(), push, operand);
    (line.trim_end().to_string(), insn.next_ip())
}

/// Render a whole code unit, one instruction per line.
pub fn disassemble(code: &[u8], resolver: &dyn Resolver) -> Vec<String> {
    let mut lines = Vec::new();
    let mut ip = 0;
    while ip < code.len() {
        let (line, next) = disassemble_one(code, ip, resolver);
        lines.push(line);
        ip = next;
    }
    lines
}
