//! This module contains the concrete interpreter for the control-flow-graph
//! IR, together with the heap and environment it executes against.
//!
//! # Execution Model
//!
//! A run interprets one function activation at a time. Each activation owns
//! its [`env::Bindings`] while the [`heap::Heap`] is threaded through the
//! whole call tree. Blocks execute in three phases: the block's phi nodes are
//! resolved first, then the state is snapshotted into the trace, then the
//! ordinary instructions and the terminator run. The snapshot deliberately
//! sits between the phis and the instructions so that a recorded step shows
//! the values the block started from.
//!
//! # The Step Budget
//!
//! Every run carries a budget of basic-block executions shared between the
//! activation and everything it calls. The budget is checked before a block
//! begins, so the number of blocks a record reports never exceeds the budget
//! it was given, and a budget of zero produces a record with no steps at all.
//! Exhausting the budget is not an error: the run stops where it stands and
//! the record is marked with `early_exit`, on the activation that was cut off
//! and on every activation enclosing it.

pub mod env;
pub mod heap;

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_traits::Zero;

use crate::{
    constant::{
        BOOL_WIDTH_BITS,
        DEFAULT_HEAP_ELEM_WIDTH_BITS,
        DEFAULT_MAX_STEPS,
        POINTER_WIDTH_BITS,
        RETURN_NAME,
    },
    error,
    error::{
        execution,
        execution::Error,
        location::Locatable,
    },
    interpreter::{env::Bindings, heap::Heap},
    ir::{
        BinOp,
        Block,
        BlockId,
        CastOp,
        Function,
        Instruction,
        Operand,
        Predicate,
        Program,
        Terminator,
        ValueRef,
    },
    trace::{BlockStep, CallRecord, State},
    value::{Int, Value},
};

/// The configuration of an interpretation run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// Whether integers are fixed-width two's-complement patterns rather
    /// than arbitrary-precision. Defaults to `false`.
    pub bounded_integers: bool,

    /// The heap granule width in bits for bounded-mode runs. Defaults to
    /// [`DEFAULT_HEAP_ELEM_WIDTH_BITS`].
    pub heap_elem_width: u32,

    /// The budget of basic-block executions for the whole run. Defaults to
    /// [`DEFAULT_MAX_STEPS`].
    pub max_steps: u32,
}

impl Config {
    /// Sets whether the run uses bounded integer arithmetic.
    #[must_use]
    pub fn with_bounded_integers(mut self, bounded: bool) -> Self {
        self.bounded_integers = bounded;
        self
    }

    /// Sets the heap granule width in bits for bounded-mode runs.
    #[must_use]
    pub fn with_heap_elem_width(mut self, width: u32) -> Self {
        self.heap_elem_width = width;
        self
    }

    /// Sets the budget of basic-block executions for the run.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bounded_integers: false,
            heap_elem_width:  DEFAULT_HEAP_ELEM_WIDTH_BITS,
            max_steps:        DEFAULT_MAX_STEPS,
        }
    }
}

/// The result of executing one basic block.
struct BlockUpdate {
    /// The post-phi snapshot recorded for the block.
    state: State,

    /// The records of the calls the block made.
    calls: Vec<CallRecord>,

    /// The successor to execute next, or [`None`] when the function
    /// returned or the run was cut off.
    next: Option<BlockId>,

    /// Whether a call made by the block exhausted the step budget.
    early_exit: bool,

    /// The blocks this block's execution consumed from the budget,
    /// including everything its calls consumed.
    blocks_visited: u32,
}

/// The concrete interpreter for a program.
#[derive(Clone, Copy, Debug)]
pub struct Interpreter<'a> {
    program: &'a Program,
    config:  Config,
}

impl<'a> Interpreter<'a> {
    /// Constructs an interpreter for `program` under `config`.
    #[must_use]
    pub fn new(program: &'a Program, config: Config) -> Self {
        Self { program, config }
    }

    /// Gets the configuration of the interpreter.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Interprets the function called `function` on `args`, with a fresh
    /// heap, recording the full trace of the run.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the function does not exist, the argument count is
    /// wrong, or interpretation encounters a fatal error.
    pub fn interpret(&self, function: &str, args: Vec<Value>) -> error::Result<CallRecord> {
        let fun = self.program.function(function).ok_or_else(|| {
            Error::UnknownFunction {
                name: function.to_string(),
            }
            .locate(function, "<entry>")
        })?;
        let env = Bindings::for_call(fun.name(), fun.args(), args).locate(function, "<entry>")?;
        let mut heap = Heap::new(self.config.bounded_integers, self.config.heap_elem_width);
        Ok(self.interpret_function(fun, env, &mut heap, self.config.max_steps)?)
    }

    /// Interprets one activation of `function` under the provided
    /// environment, sharing `heap` and `max_steps` with the caller.
    fn interpret_function(
        &self,
        function: &Function,
        mut env: Bindings,
        heap: &mut Heap,
        max_steps: u32,
    ) -> execution::Result<CallRecord> {
        let entry_state = self.boundary_snapshot(function, &env, heap);
        let mut steps = Vec::new();
        let mut blocks_visited: u32 = 0;
        let mut early_exit = false;
        let mut previous: Option<BlockId> = None;
        let mut current = Some(function.entry());

        while let Some(block_id) = current {
            if blocks_visited >= max_steps {
                early_exit = true;
                break;
            }
            let block = function.block(block_id).ok_or_else(|| {
                Error::NoSuchBlock {
                    index: block_id.index(),
                }
                .locate(function.name(), "<unknown>")
            })?;
            let update = self.interpret_block(
                function,
                block,
                previous,
                &mut env,
                heap,
                max_steps - blocks_visited,
            )?;
            blocks_visited += update.blocks_visited;
            steps.push(BlockStep {
                block_name: block.label.clone(),
                state:      update.state,
                calls:      update.calls,
            });
            if update.early_exit {
                early_exit = true;
                break;
            }
            previous = Some(block_id);
            current = update.next;
        }

        let return_state = self.boundary_snapshot(function, &env, heap);
        Ok(CallRecord {
            function_name: function.name().to_string(),
            entry_state,
            return_state,
            steps,
            early_exit,
            blocks_visited,
        })
    }

    /// Executes one basic block: phis, snapshot, instructions, terminator.
    ///
    /// The `budget` is the number of blocks still available to the run and
    /// is always at least one on entry; this block consumes the first unit
    /// and its calls share what is left.
    fn interpret_block(
        &self,
        function: &Function,
        block: &Block,
        previous: Option<BlockId>,
        env: &mut Bindings,
        heap: &mut Heap,
        budget: u32,
    ) -> execution::Result<BlockUpdate> {
        let in_function = function.name();
        let label = block.label.as_str();

        // Phi nodes resolve sequentially: a phi may read the result of an
        // earlier phi in the same block and sees its new value.
        for phi in &block.phis {
            let operand = previous
                .and_then(|from| {
                    phi.incoming
                        .iter()
                        .find(|(source, _)| *source == from)
                        .map(|(_, operand)| operand)
                })
                .ok_or_else(|| {
                    Error::NoIncomingValue {
                        block: label.to_string(),
                    }
                    .locate(in_function, label)
                })?;
            let value = self
                .resolve_operand(function, env, operand)
                .locate(in_function, label)?;
            env.bind(ValueRef::Var(phi.result), value);
        }

        let state = self.snapshot(function, env, heap);
        let mut calls = Vec::new();
        let mut blocks_visited: u32 = 1;

        for instruction in &block.instructions {
            if let Instruction::Call {
                result,
                callee,
                args,
            } = instruction
            {
                let callee_fun = self.program.function(callee).ok_or_else(|| {
                    Error::UnknownFunction {
                        name: callee.clone(),
                    }
                    .locate(in_function, label)
                })?;
                let mut resolved = Vec::with_capacity(args.len());
                for arg in args {
                    resolved.push(
                        self.resolve_operand(function, env, arg)
                            .locate(in_function, label)?,
                    );
                }
                let callee_env = Bindings::for_call(callee_fun.name(), callee_fun.args(), resolved)
                    .locate(in_function, label)?;
                let record =
                    self.interpret_function(callee_fun, callee_env, heap, budget - blocks_visited)?;
                blocks_visited += record.blocks_visited;

                if record.early_exit {
                    // The cut-off call's record is kept, but its result never
                    // binds and nothing after it in this block runs.
                    calls.push(record);
                    return Ok(BlockUpdate {
                        state,
                        calls,
                        next: None,
                        early_exit: true,
                        blocks_visited,
                    });
                }

                let value = record
                    .return_state
                    .variables
                    .get(RETURN_NAME)
                    .cloned()
                    .ok_or_else(|| {
                        Error::MissingReturnValue {
                            function: callee.clone(),
                        }
                        .locate(in_function, label)
                    })?;
                calls.push(record);
                env.bind(ValueRef::Var(*result), value);
            } else {
                self.eval_instruction(function, env, heap, instruction)
                    .locate(in_function, label)?;
            }
        }

        let next = match &block.terminator {
            Terminator::Return { value } => {
                let value = self
                    .resolve_operand(function, env, value)
                    .locate(in_function, label)?;
                env.bind(ValueRef::Return, value);
                None
            }
            Terminator::Branch { target } => Some(*target),
            Terminator::CondBranch {
                condition,
                on_true,
                on_false,
            } => {
                let condition = self
                    .resolve_operand(function, env, condition)
                    .locate(in_function, label)?
                    .as_bool()
                    .locate(in_function, label)?;
                Some(if condition { *on_true } else { *on_false })
            }
            Terminator::Switch {
                scrutinee,
                width,
                cases,
                default,
            } => {
                let value = self
                    .resolve_operand(function, env, scrutinee)
                    .locate(in_function, label)?;
                let scrutinee = value.as_int().locate(in_function, label)?;
                let mut target = *default;
                for case in cases {
                    let case_value = self.mode_int(*width, case.value.clone());
                    if scrutinee.eq(&case_value).locate(in_function, label)? {
                        target = case.target;
                        break;
                    }
                }
                Some(target)
            }
        };

        Ok(BlockUpdate {
            state,
            calls,
            next,
            early_exit: false,
            blocks_visited,
        })
    }

    /// Executes one non-call instruction.
    fn eval_instruction(
        &self,
        function: &Function,
        env: &mut Bindings,
        heap: &mut Heap,
        instruction: &Instruction,
    ) -> Result<(), Error> {
        match instruction {
            Instruction::Binary {
                result,
                op,
                lhs,
                rhs,
                width,
            } => {
                let lhs = self.resolve_operand(function, env, lhs)?;
                let rhs = self.resolve_operand(function, env, rhs)?;
                let value = if *width == BOOL_WIDTH_BITS {
                    Self::apply_bool_binary(*op, &lhs, &rhs)?
                } else {
                    Value::Int(Self::apply_int_binary(*op, lhs.as_int()?, rhs.as_int()?)?)
                };
                env.bind(ValueRef::Var(*result), value);
            }
            Instruction::Cmp {
                result,
                pred,
                lhs,
                rhs,
            } => {
                let lhs = self.resolve_operand(function, env, lhs)?;
                let rhs = self.resolve_operand(function, env, rhs)?;
                let outcome = Self::apply_predicate(*pred, lhs.as_int()?, rhs.as_int()?)?;
                env.bind(ValueRef::Var(*result), Value::Bool(outcome));
            }
            Instruction::Cast {
                result,
                op,
                operand,
                target_width,
            } => {
                let value = self.resolve_operand(function, env, operand)?;
                let cast = self.apply_cast(*op, &value, *target_width)?;
                env.bind(ValueRef::Var(*result), cast);
            }
            Instruction::AddressOf {
                result,
                base,
                components,
            } => {
                let base = self.resolve_operand(function, env, base)?;
                let mut address = base.as_int()?.as_pointer();
                for component in components {
                    let index = self.resolve_operand(function, env, &component.index)?;
                    let index = Self::index_to_pointer(index.as_int()?)?;
                    let stride =
                        self.mode_int(POINTER_WIDTH_BITS, BigInt::from(component.stride_bytes));
                    address = address.add(&stride.mul(&index)?)?;
                }
                env.bind(ValueRef::Var(*result), Value::Int(address));
            }
            Instruction::Load {
                result,
                address,
                width,
            } => {
                let address = self.resolve_operand(function, env, address)?;
                let value = heap.load(address.as_int()?, *width)?;
                env.bind(ValueRef::Var(*result), Value::Int(value));
            }
            Instruction::Store {
                address,
                value,
                width,
            } => {
                let address = self.resolve_operand(function, env, address)?;
                let value = self.resolve_operand(function, env, value)?;
                heap.store(address.as_int()?, value.as_int()?, *width)?;
            }
            Instruction::Select {
                result,
                condition,
                on_true,
                on_false,
            } => {
                let condition = self.resolve_operand(function, env, condition)?.as_bool()?;
                let chosen = if condition { on_true } else { on_false };
                let value = self.resolve_operand(function, env, chosen)?;
                env.bind(ValueRef::Var(*result), value);
            }
            Instruction::Call { .. } => {
                unreachable!("call instructions are handled by the block loop")
            }
        }
        Ok(())
    }

    /// Resolves an operand to a concrete value in the current environment.
    fn resolve_operand(
        &self,
        function: &Function,
        env: &Bindings,
        operand: &Operand,
    ) -> Result<Value, Error> {
        match operand {
            Operand::Ref(id) => env.get(&ValueRef::Var(*id)).cloned().ok_or_else(|| {
                Error::UnboundValue {
                    name: function.value_name(*id).to_string(),
                }
            }),
            Operand::ConstInt { width, value } => {
                if *width == BOOL_WIDTH_BITS {
                    Ok(Value::Bool(!value.is_zero()))
                } else {
                    Ok(Value::Int(self.mode_int(*width, value.clone())))
                }
            }
            Operand::NullPtr => Ok(Value::Int(self.mode_int(POINTER_WIDTH_BITS, BigInt::zero()))),
        }
    }

    /// Decodes a constant into an integer in the run's mode.
    fn mode_int(&self, width: u32, value: BigInt) -> Int {
        if self.config.bounded_integers {
            Int::bounded(width, value)
        } else {
            Int::unbounded(value)
        }
    }

    /// Coerces an address-computation index to pointer width.
    ///
    /// Indices are signed, so a narrow index sign-extends rather than
    /// zero-extending.
    fn index_to_pointer(index: &Int) -> Result<Int, Error> {
        match index {
            Int::Bounded { width, .. } if *width <= POINTER_WIDTH_BITS => {
                index.sext(POINTER_WIDTH_BITS)
            }
            Int::Bounded { .. } => index.trunc(POINTER_WIDTH_BITS),
            Int::Unbounded(_) => Ok(index.clone()),
        }
    }

    /// Applies a binary operation to two integer operands.
    fn apply_int_binary(op: BinOp, lhs: &Int, rhs: &Int) -> Result<Int, Error> {
        match op {
            BinOp::Add => lhs.add(rhs),
            BinOp::Sub => lhs.sub(rhs),
            BinOp::Mul => lhs.mul(rhs),
            BinOp::SDiv => lhs.sdiv(rhs),
            BinOp::UDiv => lhs.udiv(rhs),
            BinOp::SRem => lhs.srem(rhs),
            BinOp::URem => lhs.urem(rhs),
            BinOp::Shl => lhs.shl(rhs),
            BinOp::LShr => lhs.lshr(rhs),
            BinOp::AShr => lhs.ashr(rhs),
            BinOp::And => lhs.and(rhs),
            BinOp::Or => lhs.or(rhs),
            BinOp::Xor => lhs.xor(rhs),
        }
    }

    /// Applies a binary operation to two boolean operands.
    ///
    /// Disjunction is the only boolean operation the front-end emits.
    fn apply_bool_binary(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, Error> {
        match op {
            BinOp::Or => Ok(Value::Bool(lhs.as_bool()? || rhs.as_bool()?)),
            _ => Err(Error::UnsupportedBoolOperation { op }),
        }
    }

    /// Applies a comparison predicate to two integer operands.
    fn apply_predicate(pred: Predicate, lhs: &Int, rhs: &Int) -> Result<bool, Error> {
        match pred {
            Predicate::Eq => lhs.eq(rhs),
            Predicate::Ne => lhs.ne(rhs),
            Predicate::Sge => lhs.sge(rhs),
            Predicate::Sgt => lhs.sgt(rhs),
            Predicate::Sle => lhs.sle(rhs),
            Predicate::Slt => lhs.slt(rhs),
            Predicate::Uge => lhs.uge(rhs),
            Predicate::Ugt => lhs.ugt(rhs),
            Predicate::Ule => lhs.ule(rhs),
            Predicate::Ult => lhs.ult(rhs),
        }
    }

    /// Applies a cast to a value.
    ///
    /// Booleans widen to a zero-or-one integer under any cast; integers
    /// convert according to the cast's flavour. The pointer coercions are
    /// width adjustments in bounded mode and identities in unbounded mode.
    fn apply_cast(&self, op: CastOp, value: &Value, target_width: u32) -> Result<Value, Error> {
        match value {
            Value::Bool(b) => {
                if target_width == BOOL_WIDTH_BITS {
                    return Err(Error::InvalidWidthConversion {
                        from: BOOL_WIDTH_BITS,
                        to:   BOOL_WIDTH_BITS,
                    });
                }
                Ok(Value::Int(
                    self.mode_int(target_width, BigInt::from(u8::from(*b))),
                ))
            }
            Value::Int(int) => {
                let cast = match op {
                    CastOp::ZExt => int.zext(target_width)?,
                    CastOp::SExt => int.sext(target_width)?,
                    CastOp::Trunc => int.trunc(target_width)?,
                    CastOp::PtrToInt | CastOp::IntToPtr => int.zext_or_trunc(target_width),
                };
                Ok(Value::Int(cast))
            }
        }
    }

    /// Snapshots the state at a call boundary: the argument bindings, the
    /// return binding if set, and the heap.
    fn boundary_snapshot(&self, function: &Function, env: &Bindings, heap: &Heap) -> State {
        let mut variables = BTreeMap::new();
        for id in function.args() {
            if let Some(value) = env.get(&ValueRef::Var(*id)) {
                variables.insert(function.value_name(*id).to_string(), value.clone());
            }
        }
        if let Some(value) = env.get(&ValueRef::Return) {
            variables.insert(RETURN_NAME.to_string(), value.clone());
        }
        State {
            variables,
            heap: heap.clone(),
        }
    }

    /// Snapshots the current bindings and heap into a portable state.
    fn snapshot(&self, function: &Function, env: &Bindings, heap: &Heap) -> State {
        let variables = env
            .iter()
            .map(|(reference, value)| {
                let name = match reference {
                    ValueRef::Var(id) => function.value_name(*id).to_string(),
                    ValueRef::Return => RETURN_NAME.to_string(),
                };
                (name, value.clone())
            })
            .collect();
        State {
            variables,
            heap: heap.clone(),
        }
    }
}

/// Interprets two functions of `program` on the same arguments, each with a
/// fresh heap, and returns both records.
///
/// This is the entry point used when checking two versions of a routine
/// against each other: the records are produced under identical
/// configurations so their states can be compared step by step.
///
/// # Errors
///
/// Returns [`Err`] if either run encounters a fatal error.
pub fn interpret_function_pair(
    program: &Program,
    first: &str,
    second: &str,
    args: Vec<Value>,
    config: Config,
) -> error::Result<(CallRecord, CallRecord)> {
    let interpreter = Interpreter::new(program, config);
    let first = interpreter.interpret(first, args.clone())?;
    let second = interpreter.interpret(second, args)?;
    Ok((first, second))
}
