//! Virtual machine context
//!
//! [`Vm`] owns one heap and one builtin table. Everything a host does
//! (compiling through the emitter, defining functions, running code,
//! reading results) goes through it, so several independent VMs can
//! coexist in one process.

use bytecode_system::{disassemble, CodeBuffer};
use core_types::{Id, Offset, Poly, PolyKind, VmResult};
use memory_manager::{Heap, HeapConfig};
use tracing::debug;

use crate::builtin::{Builtin, BuiltinTable, CORE_BUILTINS};
use crate::call_frame;
use crate::dispatch::Dispatcher;
use crate::format::format_poly;

/// VM configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VmConfig {
    /// Arena and value stack sizes
    pub heap: HeapConfig,
    /// Run an incremental collection every this many instructions
    pub gc_interval: Option<u32>,
    /// Stop a run with `InstructionLimit` after this many instructions
    pub instruction_limit: Option<u64>,
}

/// Virtual machine for the bytecode interpreter
///
/// Offsets and polys handed back by the VM are only stable until the next
/// allocation: the collector may move the objects they name. Bind results
/// to globals (or keep them on the value stack) to hold on to them.
///
/// # Example
///
/// ```
/// use interpreter::Vm;
/// use bytecode_system::Op;
///
/// let mut vm = Vm::new().unwrap();
/// let x = vm.name_id("x").unwrap();
/// let buf = vm.emitter();
/// let at = buf.add_number(2.0).unwrap();
/// buf.set_push(at).unwrap();
/// buf.add_number(3.0).unwrap();
/// buf.add_op(Op::Plus).unwrap();
/// buf.add_op_id(Op::Assign, x).unwrap();
///
/// let code = vm.finish().unwrap();
/// vm.execute(code).unwrap();
/// assert_eq!(vm.format(vm.get_global("x").unwrap()), "5");
/// ```
pub struct Vm {
    heap: Heap,
    builtins: BuiltinTable,
    config: VmConfig,
}

impl Vm {
    /// Create a VM with the default configuration.
    pub fn new() -> VmResult<Self> {
        Self::with_config(VmConfig::default())
    }

    /// Create a VM with the given configuration.
    ///
    /// # Errors
    ///
    /// `PoolTooLarge` when the pool does not fit the offset range.
    pub fn with_config(config: VmConfig) -> VmResult<Self> {
        let heap = Heap::with_config(config.heap)?;
        debug!(
            pool = config.heap.pool_size,
            stack = config.heap.stack_size,
            "vm created"
        );
        Ok(Self {
            heap,
            builtins: BuiltinTable::new(),
            config,
        })
    }

    /// The configuration in effect.
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// The heap.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The heap, mutably.
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// The compile buffer the next code object is emitted into.
    pub fn emitter(&mut self) -> &mut CodeBuffer {
        self.heap.code_buffer_mut()
    }

    /// Intern an identifier.
    pub fn name_id(&mut self, text: &str) -> VmResult<Id> {
        self.heap.name_id(text)
    }

    /// Allocate a string literal and emit an instruction loading it.
    ///
    /// # Returns
    ///
    /// The address of the emitted instruction.
    pub fn add_string(&mut self, text: &str) -> VmResult<Offset> {
        let at = self.heap.string_make(text.as_bytes())?;
        self.heap.code_buffer_mut().add_string(at)
    }

    /// Allocate a string value.
    pub fn make_string(&mut self, text: &str) -> VmResult<Poly> {
        let at = self.heap.string_make(text.as_bytes())?;
        Ok(Poly::reference(at, PolyKind::String))
    }

    /// Turn the compile buffer into a code object.
    pub fn finish(&mut self) -> VmResult<Offset> {
        self.heap.finish_code()
    }

    /// Wrap a finished code object in a function with the given formals.
    pub fn make_func(&mut self, code: Offset, formals: &[Id]) -> VmResult<Poly> {
        let at = self.heap.func_make(code, formals)?;
        Ok(Poly::reference(at, PolyKind::Func))
    }

    /// Finish the compile buffer as the body of a function and bind it to
    /// the global `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - Global the function is bound to
    /// * `formals` - Parameter names in declaration order
    pub fn define_func(&mut self, name: &str, formals: &[&str]) -> VmResult<Poly> {
        let id = self.heap.name_id(name)?;
        let formals = formals
            .iter()
            .map(|f| self.heap.name_id(f))
            .collect::<VmResult<Vec<Id>>>()?;
        let code = self.heap.finish_code()?;
        let func = self.make_func(code, &formals)?;
        call_frame::assign_global(&mut self.heap, id, func)?;
        Ok(call_frame::lookup_global(&self.heap, id).unwrap_or(func))
    }

    /// Register a host builtin and bind it to its global name.
    ///
    /// # Returns
    ///
    /// The builtin's callable value.
    pub fn register_builtin(&mut self, builtin: Builtin) -> VmResult<Poly> {
        let id = self.heap.name_id(builtin.name)?;
        let callee = self.builtins.register(builtin);
        call_frame::assign_global(&mut self.heap, id, callee)?;
        Ok(callee)
    }

    /// Register `len`, `append` and `list`.
    pub fn register_core_builtins(&mut self) -> VmResult<()> {
        for builtin in CORE_BUILTINS {
            self.register_builtin(builtin)?;
        }
        Ok(())
    }

    /// Registered builtins.
    pub fn builtins(&self) -> &BuiltinTable {
        &self.builtins
    }

    /// Run a code object at the current frame.
    ///
    /// # Returns
    ///
    /// * `Ok(Poly)` - The final accumulator value
    /// * `Err(VmError)` - Execution stopped; call [`Vm::unwind`] before
    ///   running anything else
    pub fn execute(&mut self, code: Offset) -> VmResult<Poly> {
        let mut dispatcher = Dispatcher::new(&mut self.heap, &self.builtins, &self.config);
        let result = dispatcher.run(code);
        debug!(
            instructions = dispatcher.executed(),
            ok = result.is_ok(),
            "run finished"
        );
        result
    }

    /// Finish the compile buffer and run it.
    pub fn run(&mut self) -> VmResult<Poly> {
        let code = self.finish()?;
        self.execute(code)
    }

    /// Value of the global `name`, if bound.
    pub fn get_global(&self, name: &str) -> Option<Poly> {
        let id = self.heap.lookup_name(name)?;
        call_frame::lookup_global(&self.heap, id)
    }

    /// Bind the global `name` to `value`.
    pub fn set_global(&mut self, name: &str, value: Poly) -> VmResult<()> {
        self.heap.push(value)?;
        let id = self.heap.name_id(name);
        let value = self.heap.pop()?;
        call_frame::assign_global(&mut self.heap, id?, value)
    }

    /// Drop every call frame and stack slot left by a failed run.
    pub fn unwind(&mut self) {
        let depth = call_frame::depth(&self.heap);
        let globals = self.heap.globals();
        self.heap.set_frame(globals);
        self.heap.clear_stack();
        self.heap.set_running_code(0);
        self.heap.set_acc(Poly::ZERO);
        self.heap.code_buffer_mut().clear();
        debug!(frames = depth, "unwound");
    }

    /// Render a value for printing.
    pub fn format(&self, p: Poly) -> String {
        format_poly(&self.heap, &self.builtins, p)
    }

    /// Text of a string value.
    pub fn string(&self, p: Poly) -> Option<String> {
        if !(p.is_heap_ref() && p.kind() == PolyKind::String) {
            return None;
        }
        Some(String::from_utf8_lossy(self.heap.string_bytes(p.offset())).into_owned())
    }

    /// Elements of a list value.
    pub fn list(&self, p: Poly) -> Option<Vec<Poly>> {
        if !(p.is_heap_ref() && p.kind() == PolyKind::List) {
            return None;
        }
        Some(self.heap.list_items(p.offset()))
    }

    /// Disassemble a code object, one line per instruction.
    pub fn disassemble(&self, code: Offset) -> Vec<String> {
        disassemble(self.heap.code_bytes(code), &self.heap)
    }
}
