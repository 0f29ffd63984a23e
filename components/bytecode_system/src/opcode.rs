//! Bytecode opcodes
//!
//! Every instruction is one opcode byte followed by a fixed-size operand
//! whose length depends only on the opcode. The high bit of the opcode byte
//! is the push flag: when set, the instruction's result is pushed onto the
//! value stack after it executes.

use core_types::{Id, Offset};

/// Push flag OR'd into the opcode byte
pub const PUSH_FLAG: u8 = 0x80;

/// Size of an encoded offset operand
pub const OFFSET_SIZE: usize = std::mem::size_of::<Offset>();

/// Size of an encoded identifier operand
pub const ID_SIZE: usize = std::mem::size_of::<Id>();

/// Bytecode opcodes for the accumulator/stack machine
///
/// Binary operators take their left operand from the value stack and their
/// right operand from the accumulator, leaving the result in the
/// accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    /// Do nothing
    Nop = 0,

    // Literals and identifiers
    /// Load a float immediate
    Num,
    /// Load a string literal (operand: arena offset)
    String,
    /// Build a list from the top N stack values (operand: count)
    List,
    /// Read an identifier
    Id,

    // Arithmetic
    /// `+`: numbers, list concatenation, string concatenation
    Plus,
    /// `-`
    Minus,
    /// `*`
    Times,
    /// `/`
    Divide,
    /// Integer division, truncating toward zero
    Div,
    /// Integer remainder, truncating toward zero
    Mod,
    /// Exponentiation
    Pow,
    /// Bitwise and
    Land,
    /// Bitwise or
    Lor,
    /// Bitwise xor
    Lxor,
    /// Left shift
    Lshift,
    /// Arithmetic right shift
    Rshift,

    // Logic and comparison
    /// Logical and (both operands already evaluated)
    And,
    /// Logical or (both operands already evaluated)
    Or,
    /// Logical not
    Not,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// Identity
    Is,
    /// Negated identity
    IsNot,
    /// Membership
    In,
    /// Negated membership
    NotIn,

    // Unary
    /// Arithmetic negation
    Uminus,
    /// Bitwise complement
    Lnot,

    // Calls and containers
    /// Call (operand: positional count, named count)
    Call,
    /// `a[i]`
    ArrayFetch,
    /// `a[i] = v`
    ArrayStore,
    /// `a[start:end:stride]` (operand: which parts were supplied)
    Slice,

    // Bindings
    /// Bind the accumulator to an identifier
    Assign,
    /// Mark an identifier as global in the current scope
    Global,

    // Control flow
    /// Branch to the operand when the accumulator is not truthy
    If,
    /// Unconditional branch
    Branch,
    /// Placeholder for a not-yet-known `return`/`break`/`continue` target
    Forward,
}

const OPS: [Op; 41] = [
    Op::Nop,
    Op::Num,
    Op::String,
    Op::List,
    Op::Id,
    Op::Plus,
    Op::Minus,
    Op::Times,
    Op::Divide,
    Op::Div,
    Op::Mod,
    Op::Pow,
    Op::Land,
    Op::Lor,
    Op::Lxor,
    Op::Lshift,
    Op::Rshift,
    Op::And,
    Op::Or,
    Op::Not,
    Op::Eq,
    Op::Ne,
    Op::Gt,
    Op::Lt,
    Op::Ge,
    Op::Le,
    Op::Is,
    Op::IsNot,
    Op::In,
    Op::NotIn,
    Op::Uminus,
    Op::Lnot,
    Op::Call,
    Op::ArrayFetch,
    Op::ArrayStore,
    Op::Slice,
    Op::Assign,
    Op::Global,
    Op::If,
    Op::Branch,
    Op::Forward,
];

impl Op {
    /// Decode an opcode byte, ignoring the push flag.
    pub fn from_byte(byte: u8) -> Option<Op> {
        OPS.get((byte & !PUSH_FLAG) as usize).copied()
    }

    /// Split an opcode byte into the opcode and its push flag.
    pub fn split(byte: u8) -> Option<(Op, bool)> {
        Op::from_byte(byte).map(|op| (op, byte & PUSH_FLAG != 0))
    }

    /// Operand bytes following this opcode.
    pub fn extra_size(self) -> usize {
        match self {
            Op::Num => std::mem::size_of::<f32>(),
            Op::String | Op::List => OFFSET_SIZE,
            Op::Id | Op::Assign | Op::Global => ID_SIZE,
            Op::Call => 2,
            Op::Slice => 1,
            Op::If | Op::Branch | Op::Forward => OFFSET_SIZE,
            _ => 0,
        }
    }

    /// Total encoded length including the opcode byte.
    pub fn encoded_len(self) -> usize {
        1 + self.extra_size()
    }

    /// Mnemonic used by the disassembler.
    pub fn name(self) -> &'static str {
        match self {
            Op::Nop => "nop",
            Op::Num => "num",
            Op::String => "string",
            Op::List => "list",
            Op::Id => "id",
            Op::Plus => "plus",
            Op::Minus => "minus",
            Op::Times => "times",
            Op::Divide => "divide",
            Op::Div => "div",
            Op::Mod => "mod",
            Op::Pow => "pow",
            Op::Land => "land",
            Op::Lor => "lor",
            Op::Lxor => "lxor",
            Op::Lshift => "lshift",
            Op::Rshift => "rshift",
            Op::And => "and",
            Op::Or => "or",
            Op::Not => "not",
            Op::Eq => "eq",
            Op::Ne => "ne",
            Op::Gt => "gt",
            Op::Lt => "lt",
            Op::Ge => "ge",
            Op::Le => "le",
            Op::Is => "is",
            Op::IsNot => "is_not",
            Op::In => "in",
            Op::NotIn => "not_in",
            Op::Uminus => "uminus",
            Op::Lnot => "lnot",
            Op::Call => "call",
            Op::ArrayFetch => "array_fetch",
            Op::ArrayStore => "array_store",
            Op::Slice => "slice",
            Op::Assign => "assign",
            Op::Global => "global",
            Op::If => "if",
            Op::Branch => "branch",
            Op::Forward => "forward",
        }
    }

    /// Check if this opcode pops a left operand off the stack and combines
    /// it with the accumulator
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Op::Plus
                | Op::Minus
                | Op::Times
                | Op::Divide
                | Op::Div
                | Op::Mod
                | Op::Pow
                | Op::Land
                | Op::Lor
                | Op::Lxor
                | Op::Lshift
                | Op::Rshift
                | Op::And
                | Op::Or
                | Op::Eq
                | Op::Ne
                | Op::Gt
                | Op::Lt
                | Op::Ge
                | Op::Le
                | Op::Is
                | Op::IsNot
                | Op::In
                | Op::NotIn
                | Op::ArrayFetch
        )
    }

    /// Check if this opcode only transforms the accumulator
    pub fn is_unary(self) -> bool {
        matches!(self, Op::Not | Op::Uminus | Op::Lnot)
    }

    /// Check if this opcode transfers control
    pub fn is_branch(self) -> bool {
        matches!(self, Op::If | Op::Branch | Op::Forward)
    }
}

/// Kind of a forward reference whose destination is not yet known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ForwardKind {
    /// End of the enclosing function body
    Return = 0,
    /// End of the enclosing loop
    Break = 1,
    /// Re-test of the enclosing loop
    Continue = 2,
}

impl ForwardKind {
    /// Decode the kind byte stored in a forward operand.
    pub fn from_byte(byte: u8) -> Option<ForwardKind> {
        match byte {
            0 => Some(ForwardKind::Return),
            1 => Some(ForwardKind::Break),
            2 => Some(ForwardKind::Continue),
            _ => None,
        }
    }

    /// Lower-case name, as shown by the disassembler.
    pub fn name(self) -> &'static str {
        match self {
            ForwardKind::Return => "return",
            ForwardKind::Break => "break",
            ForwardKind::Continue => "continue",
        }
    }
}

/// Which of start/end/stride a slice instruction was given.
///
/// Packed into the single operand byte of [`Op::Slice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceFlags(u8);

impl SliceFlags {
    /// Start bound supplied
    pub const START: u8 = 1;
    /// End bound supplied
    pub const END: u8 = 2;
    /// Stride supplied
    pub const STRIDE: u8 = 4;

    /// Pack the three presence bits.
    pub fn new(has_start: bool, has_end: bool, has_stride: bool) -> Self {
        let mut bits = 0;
        if has_start {
            bits |= Self::START;
        }
        if has_end {
            bits |= Self::END;
        }
        if has_stride {
            bits |= Self::STRIDE;
        }
        SliceFlags(bits)
    }

    /// Rebuild from an operand byte.
    pub fn from_bits(bits: u8) -> Self {
        SliceFlags(bits & (Self::START | Self::END | Self::STRIDE))
    }

    /// The operand byte.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Start bound supplied
    pub fn has_start(self) -> bool {
        self.0 & Self::START != 0
    }

    /// End bound supplied
    pub fn has_end(self) -> bool {
        self.0 & Self::END != 0
    }

    /// Stride supplied
    pub fn has_stride(self) -> bool {
        self.0 & Self::STRIDE != 0
    }

    /// Number of bounds that were supplied.
    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }
}
