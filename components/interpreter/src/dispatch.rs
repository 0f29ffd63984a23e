//! Instruction dispatch
//!
//! The interpreter is an accumulator machine. Every instruction leaves its
//! result in the accumulator register; an instruction carrying the push
//! flag also pushes that result onto the value stack. Binary operators
//! take their left operand from the stack.
//!
//! Calls do not recurse on the Rust stack. Entering a function pushes an
//! arena frame that remembers the address of the call instruction; when
//! the callee's code runs out, the frame is popped and the call
//! instruction is decoded again to find where to resume and whether the
//! result is pushed.

use bytecode_system::{decode, disassemble_one, Instruction, Op, Operand};
use core_types::{Offset, Poly, PolyKind, VmError, VmResult};
use memory_manager::{CollectStyle, Heap};
use tracing::{trace, Level};

use crate::builtin::{BuiltinTable, CallArgs};
use crate::call_frame;
use crate::operators::{binary, truthy, unary};
use crate::slice::slice;
use crate::vm::VmConfig;

/// What to do after an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Continue with the next instruction
    Next,
    /// Continue at an address in the current code
    Jump(usize),
    /// Start running a function body
    Enter(Offset),
}

/// Runs code objects against a heap.
///
/// A dispatcher lives for a single top-level run; its instruction count
/// (and so the instruction limit) starts from zero each time.
pub struct Dispatcher<'vm> {
    heap: &'vm mut Heap,
    builtins: &'vm BuiltinTable,
    gc_interval: Option<u32>,
    instruction_limit: Option<u64>,
    executed: u64,
}

impl<'vm> Dispatcher<'vm> {
    /// Create a dispatcher over `heap`.
    pub fn new(heap: &'vm mut Heap, builtins: &'vm BuiltinTable, config: &VmConfig) -> Self {
        Self {
            heap,
            builtins,
            gc_interval: config.gc_interval.filter(|&n| n > 0),
            instruction_limit: config.instruction_limit,
            executed: 0,
        }
    }

    /// Instructions dispatched so far.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Run `code` from its first instruction until it, and every call it
    /// makes, has finished.
    ///
    /// # Returns
    ///
    /// The final accumulator value.
    ///
    /// # Errors
    ///
    /// Any error stops execution where it happened. Frames and stack
    /// slots are left as they were; the caller decides whether to unwind.
    pub fn run(&mut self, code: Offset) -> VmResult<Poly> {
        self.heap.set_running_code(code);
        self.heap.set_acc(Poly::ZERO);
        let mut ip = 0;
        loop {
            while ip < self.heap.code_len(self.heap.running_code()) {
                self.tick()?;
                let code = self.heap.running_code();
                let Some(insn) = decode(self.heap.code_bytes(code), ip) else {
                    break;
                };
                if tracing::enabled!(Level::TRACE) {
                    self.trace_instruction(code, ip);
                }
                ip = insn.next_ip();
                let mut push = insn.push;
                match self.step(insn)? {
                    Flow::Next => {}
                    Flow::Jump(target) => ip = target,
                    Flow::Enter(body) => {
                        self.heap.set_running_code(body);
                        ip = 0;
                        // the call instruction's flag applies on return
                        push = false;
                    }
                }
                if push {
                    self.heap.push(self.heap.acc())?;
                }
            }

            let Some((code, call_ip)) = call_frame::pop(self.heap) else {
                break;
            };
            self.heap.set_running_code(code);
            match decode(self.heap.code_bytes(code), call_ip as usize) {
                Some(call) => {
                    ip = call.next_ip();
                    if call.push {
                        self.heap.push(self.heap.acc())?;
                    }
                }
                None => ip = self.heap.code_len(code),
            }
            trace!(code, ip, depth = call_frame::depth(self.heap), "return");
        }
        Ok(self.heap.acc())
    }

    fn tick(&mut self) -> VmResult<()> {
        self.executed += 1;
        if let Some(limit) = self.instruction_limit {
            if self.executed > limit {
                return Err(VmError::InstructionLimit { limit });
            }
        }
        if let Some(n) = self.gc_interval {
            if self.executed % n as u64 == 0 {
                self.heap.collect(CollectStyle::Incremental);
            }
        }
        Ok(())
    }

    fn trace_instruction(&self, code: Offset, ip: usize) {
        let (line, _) = disassemble_one(self.heap.code_bytes(code), ip, &*self.heap);
        trace!(
            acc = self.heap.acc().to_bits(),
            sp = self.heap.stack().len(),
            "{}",
            line
        );
    }

    fn step(&mut self, insn: Instruction) -> VmResult<Flow> {
        let heap = &mut *self.heap;
        match (insn.op, insn.operand) {
            (Op::Num, Operand::Number(n)) => heap.set_acc(Poly::from_f32(n)),
            (Op::String, Operand::String(at)) => {
                heap.set_acc(Poly::reference(at, PolyKind::String))
            }
            (Op::List, Operand::Count(n)) => {
                let list = heap.list_imm(n as usize)?;
                heap.set_acc(list);
            }
            (Op::Id, Operand::Id(id)) => {
                let value = call_frame::lookup(heap, id);
                heap.set_acc(value);
            }
            (Op::Assign, Operand::Id(id)) => {
                let value = heap.acc();
                call_frame::assign(heap, id, value)?;
            }
            (Op::Global, Operand::Id(id)) => call_frame::mark_global(heap, id)?,
            (Op::If, Operand::Target(target)) => {
                if !truthy(heap, heap.acc()) {
                    return Ok(Flow::Jump(target as usize));
                }
            }
            (Op::Branch, Operand::Target(target)) => return Ok(Flow::Jump(target as usize)),
            (Op::Call, Operand::Call { positional, named }) => {
                return self.call(insn.ip, positional as usize, named as usize);
            }
            (Op::Slice, Operand::Slice(flags)) => {
                let acc = heap.acc();
                let value = slice(heap, flags, acc)?;
                heap.set_acc(value);
            }
            (Op::ArrayStore, _) => array_store(heap)?,
            (op, _) if op.is_unary() => {
                let value = unary(heap, op, heap.acc());
                heap.set_acc(value);
            }
            (op, _) if op.is_binary() => {
                let right = heap.acc();
                let left = heap.pop()?;
                let value = binary(heap, op, left, right)?;
                heap.set_acc(value);
            }
            // nop, and forwards nobody patched
            _ => {}
        }
        Ok(Flow::Next)
    }

    fn call(&mut self, ip: usize, positional: usize, named: usize) -> VmResult<Flow> {
        let nargs = positional + 2 * named;
        let callee = self.heap.pick(nargs)?;
        if callee.is_heap_ref() && callee.kind() == PolyKind::Func {
            let body = call_frame::enter(self.heap, ip as u16, positional, named)?;
            return Ok(Flow::Enter(body));
        }
        let Some(builtin) = self.builtins.get(callee).copied() else {
            // calling a non-function evaluates to the previous accumulator
            self.heap.drop_n(nargs + 1)?;
            return Ok(Flow::Next);
        };
        if !builtin.accepts(positional) {
            self.heap.drop_n(nargs + 1)?;
            return Err(VmError::ArityMismatch {
                expected: builtin.nformal.max(0) as usize,
                got: positional,
            });
        }

        self.heap.drop_n(2 * named)?;
        let base = self.heap.stack().len() - positional;
        trace!(builtin = builtin.name, positional, "call builtin");
        let result = (builtin.func)(self.heap, CallArgs::new(base, positional));
        let extra = self.heap.stack().len().saturating_sub(base - 1);
        self.heap.drop_n(extra)?;
        self.heap.set_acc(result?);
        Ok(Flow::Next)
    }
}

// Stack: list, index. The value is in the accumulator and stays there.
fn array_store(heap: &mut Heap) -> VmResult<()> {
    let index = heap.pop()?;
    let list = heap.pop()?;
    if !(list.is_heap_ref() && list.kind() == PolyKind::List && index.is_float()) {
        return Ok(());
    }
    let at = list.offset();
    let len = heap.list_len(at) as i64;
    let mut i = index.to_i32() as i64;
    if i < 0 {
        i += len;
    }
    if (0..len).contains(&i) {
        heap.list_set(at, i as usize, heap.acc());
    }
    Ok(())
}
