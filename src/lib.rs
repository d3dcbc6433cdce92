//! This library implements a concrete interpreter for a control-flow-graph
//! IR, recording every step of a run as a trace that an external equivalence
//! checker can compare against the trace of another program. It exists to
//! answer one question cheaply: do two versions of a routine behave the same
//! on a given input, and if not, where do they first diverge?
//!
//! # How it Works
//!
//! From a very high level, producing a comparable trace works as follows:
//!
//! 1. A front-end lowers each program into the [`ir::Program`] model: named
//!    functions made of basic blocks, with type information reduced to
//!    bit-widths.
//! 2. The [`interpreter::Interpreter`] executes a chosen function on concrete
//!    arguments, in one of two arithmetic modes: bounded two's-complement
//!    integers that wrap like hardware, or unbounded integers that never
//!    overflow.
//! 3. Every executed block is recorded as a step in a
//!    [`trace::CallRecord`], snapshotting the variables and the heap after
//!    the block's phi nodes resolve. Calls nest their own records. A step
//!    budget bounds the run, and exhausting it marks the record rather than
//!    failing it.
//! 4. The record is encoded via [`codec`] as JSON or CBOR, with every
//!    integer carried as its signed decimal reading so that traces from both
//!    arithmetic modes compare textually.
//!
//! # Basic Usage
//!
//! ```
//! use trace_interpreter::{
//!     interpreter::{Config, Interpreter},
//!     ir::{BinOp, Block, Function, Instruction, Operand, Program, Terminator},
//!     value::{Int, Value},
//! };
//!
//! // sum(a, b) = a + b
//! let mut fun = Function::new("sum");
//! let a = fun.argument("a");
//! let b = fun.argument("b");
//! let result = fun.value("result");
//! let mut entry = Block::new(
//!     "entry",
//!     Terminator::Return {
//!         value: Operand::Ref(result),
//!     },
//! );
//! entry.instructions.push(Instruction::Binary {
//!     result,
//!     op: BinOp::Add,
//!     lhs: Operand::Ref(a),
//!     rhs: Operand::Ref(b),
//!     width: 32,
//! });
//! fun.add_block(entry);
//! let mut program = Program::new();
//! program.add(fun);
//!
//! let interpreter = Interpreter::new(&program, Config::default());
//! let record = interpreter
//!     .interpret(
//!         "sum",
//!         vec![
//!             Value::from(Int::unbounded(3)),
//!             Value::from(Int::unbounded(5)),
//!         ],
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     record.return_state.variables.get("return"),
//!     Some(&Value::from(Int::unbounded(8)))
//! );
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod codec;
pub mod constant;
pub mod error;
pub mod interpreter;
pub mod ir;
pub mod trace;
pub mod value;

// Re-exports to provide the library interface.
pub use interpreter::{interpret_function_pair, Config, Interpreter};
pub use trace::CallRecord;
