//! Defines the [`CairoRunner`] type, responsible for orchestrating a full
//! program run: segment layout, the fetch loop, and the final relocation.

use groudon_felt::Felt;

use crate::error::Error;
use crate::memory::{Pointer, Value};
use crate::program::Program;
use crate::trace::{relocate_trace, RelocatedTraceEntry};
use crate::CairoVM;

/// Configuration of a [`CairoRunner`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Whether to record a register trace during the run.
    pub trace_enabled: bool,
    /// An optional bound on the number of executed steps.
    pub max_steps: Option<usize>,
    /// The name of the layout to run with. Only `plain` is handled here;
    /// the name is carried through for diagnostics.
    pub layout: String,
    /// Whether the run is meant to feed a prover. Accepted for interface
    /// compatibility; the runner behaves identically either way.
    pub proof_mode: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            trace_enabled: false,
            max_steps: None,
            layout: "plain".to_owned(),
            proof_mode: false,
        }
    }
}

/// Loads a compiled program into a fresh virtual machine, runs it until its
/// end sentinel, and relocates the resulting memory and trace.
///
/// # Segment layout
///
/// Initialization allocates, in order: the program segment (index 0), the
/// execution segment (index 1), one segment per program builtin, one segment
/// whose base serves as the final frame pointer, and one segment whose base
/// is the *end sentinel*: the program counter value that stops the run. The
/// initial stack (builtin bases, then the final fp, then the sentinel) is
/// loaded at the bottom of the execution segment.
#[derive(Debug)]
pub struct CairoRunner {
    program: Program,
    vm: CairoVM,
    max_steps: Option<usize>,
    program_base: Pointer,
    execution_base: Pointer,
    initial_pc: Pointer,
    final_pc: Pointer,
    relocated_memory: Option<Vec<(usize, Felt)>>,
    relocated_trace: Option<Vec<RelocatedTraceEntry>>,
}

impl CairoRunner {
    /// Creates a runner with its segments laid out, the program and initial
    /// stack loaded, and the registers committed.
    pub fn new(program: Program, config: RunnerConfig) -> Result<CairoRunner, Error> {
        let mut vm = CairoVM::new(config.trace_enabled);

        let program_base = vm.segments.add();
        let execution_base = vm.segments.add();

        let mut stack: Vec<Value> = Vec::with_capacity(program.builtins.len() + 2);
        for name in &program.builtins {
            let base = vm.segments.add();
            tracing::debug!(builtin = %name, base = %base, "allocated builtin segment");
            stack.push(Value::Pointer(base));
        }

        let return_fp = vm.segments.add();
        let end = vm.segments.add();
        stack.push(Value::Pointer(return_fp));
        stack.push(Value::Pointer(end));

        let initial_pc = program_base.add_uint(program.main_offset)?;

        vm.segments.load_data(program_base, &program.data)?;
        vm.segments.load_data(execution_base, &stack)?;

        vm.cpu.pc = initial_pc;
        vm.cpu.ap = stack.len();
        vm.cpu.fp = stack.len();

        tracing::debug!(
            program_base = %program_base,
            execution_base = %execution_base,
            initial_pc = %initial_pc,
            final_pc = %end,
            "initialized runner"
        );

        Ok(CairoRunner {
            program,
            vm,
            max_steps: config.max_steps,
            program_base,
            execution_base,
            initial_pc,
            final_pc: end,
            relocated_memory: None,
            relocated_trace: None,
        })
    }

    /// The loaded program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The virtual machine driven by this runner.
    pub fn vm(&self) -> &CairoVM {
        &self.vm
    }

    /// The base of the program segment.
    pub fn program_base(&self) -> Pointer {
        self.program_base
    }

    /// The base of the execution segment.
    pub fn execution_base(&self) -> Pointer {
        self.execution_base
    }

    /// The program counter the run starts from.
    pub fn initial_pc(&self) -> Pointer {
        self.initial_pc
    }

    /// The program counter value that terminates the run.
    pub fn final_pc(&self) -> Pointer {
        self.final_pc
    }

    /// Executes a single step, refusing to run past the end sentinel.
    pub fn step(&mut self) -> Result<(), Error> {
        if self.vm.cpu.pc == self.final_pc {
            return Err(Error::EndOfProgram);
        }
        self.vm.step()
    }

    /// Runs the machine until the program counter reaches its end sentinel.
    pub fn run(&mut self) -> Result<(), Error> {
        self.run_until_pc(self.final_pc)
    }

    /// Runs the machine until the program counter reaches `end`.
    ///
    /// When the runner was configured with a step bound, exhausting it fails
    /// with [`Error::MaxStepsExceeded`]; the steps executed so far remain
    /// observable through the machine.
    pub fn run_until_pc(&mut self, end: Pointer) -> Result<(), Error> {
        while self.vm.cpu.pc != end {
            if let Some(max_steps) = self.max_steps {
                if self.vm.current_step() >= max_steps {
                    return Err(Error::MaxStepsExceeded(max_steps));
                }
            }
            self.vm.step()?;
        }
        tracing::debug!(steps = self.vm.current_step(), "run complete");
        Ok(())
    }

    /// Relocates the memory and the trace into the flat address space.
    ///
    /// The relocated artifacts are kept on the runner and served by
    /// [`CairoRunner::relocated_memory`] and [`CairoRunner::relocated_trace`].
    pub fn relocate(&mut self) -> Result<(), Error> {
        self.vm.segments.compute_effective_sizes();
        let memory = self.vm.segments.relocate_memory()?;

        let trace = match self.vm.trace() {
            Some(entries) => {
                let table = self
                    .vm
                    .segments
                    .relocation_table()
                    .ok_or(Error::UnallocatedSegment { segment: 0 })?;
                Some(relocate_trace(entries, table)?)
            }
            None => None,
        };

        tracing::debug!(cells = memory.len(), "relocated memory");

        self.relocated_memory = Some(memory);
        self.relocated_trace = trace;
        Ok(())
    }

    /// The relocated memory image, once [`CairoRunner::relocate`] has run:
    /// `(flat address, value)` pairs in ascending address order.
    pub fn relocated_memory(&self) -> Option<&[(usize, Felt)]> {
        self.relocated_memory.as_deref()
    }

    /// The relocated trace, once [`CairoRunner::relocate`] has run. `None`
    /// when tracing was disabled.
    pub fn relocated_trace(&self) -> Option<&[RelocatedTraceEntry]> {
        self.relocated_trace.as_deref()
    }
}
