//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.

#![cfg(test)]
#![allow(unused)] // Not every helper is used from every test binary.

use num_bigint::BigInt;
use trace_interpreter::{
    ir::{
        BinOp,
        Block,
        Function,
        Instruction,
        Operand,
        Phi,
        Predicate,
        Program,
        Terminator,
    },
    trace::CallRecord,
    value::{Int, Value},
};

/// Builds a 32-bit constant operand.
pub fn const32(value: i64) -> Operand {
    Operand::ConstInt {
        width: 32,
        value: BigInt::from(value),
    }
}

/// Builds a program with a single function `sum(a, b) = a + b` over 32-bit
/// integers.
pub fn sum_program() -> Program {
    let mut fun = Function::new("sum");
    let a = fun.argument("a");
    let b = fun.argument("b");
    let result = fun.value("result");

    let mut entry = Block::new(
        "entry",
        Terminator::Return {
            value: Operand::Ref(result),
        },
    );
    entry.instructions.push(Instruction::Binary {
        result,
        op: BinOp::Add,
        lhs: Operand::Ref(a),
        rhs: Operand::Ref(b),
        width: 32,
    });
    fun.add_block(entry);

    let mut program = Program::new();
    program.add(fun);
    program
}

/// Builds the looping function `count(n)`, which counts from zero to `n` one
/// block iteration at a time and returns the final counter.
///
/// A full run visits `2n + 3` blocks: the entry, `n + 1` header visits, `n`
/// body visits, and the exit.
pub fn count_function() -> Function {
    let mut fun = Function::new("count");
    let n = fun.argument("n");
    let i = fun.value("i");
    let next = fun.value("next");
    let done = fun.value("done");

    let placeholder = || Terminator::Return {
        value: Operand::NullPtr,
    };
    let entry = fun.add_block(Block::new("entry", placeholder()));
    let header = fun.add_block(Block::new("header", placeholder()));
    let body = fun.add_block(Block::new("body", placeholder()));
    let exit = fun.add_block(Block::new("exit", placeholder()));

    fun.block_mut(entry).unwrap().terminator = Terminator::Branch { target: header };

    let header_block = fun.block_mut(header).unwrap();
    header_block.phis.push(Phi {
        result:   i,
        incoming: vec![(entry, const32(0)), (body, Operand::Ref(next))],
    });
    header_block.instructions.push(Instruction::Cmp {
        result: done,
        pred:   Predicate::Sge,
        lhs:    Operand::Ref(i),
        rhs:    Operand::Ref(n),
    });
    header_block.terminator = Terminator::CondBranch {
        condition: Operand::Ref(done),
        on_true:   exit,
        on_false:  body,
    };

    let body_block = fun.block_mut(body).unwrap();
    body_block.instructions.push(Instruction::Binary {
        result: next,
        op: BinOp::Add,
        lhs: Operand::Ref(i),
        rhs: const32(1),
        width: 32,
    });
    body_block.terminator = Terminator::Branch { target: header };

    fun.block_mut(exit).unwrap().terminator = Terminator::Return {
        value: Operand::Ref(i),
    };

    fun
}

/// Builds a program containing `count` from [`count_function`].
pub fn count_program() -> Program {
    let mut program = Program::new();
    program.add(count_function());
    program
}

/// Builds a program where `main(n)` calls `count(n)` and returns the result
/// plus one.
pub fn call_program() -> Program {
    let mut main = Function::new("main");
    let n = main.argument("n");
    let counted = main.value("counted");
    let result = main.value("result");

    let mut entry = Block::new(
        "entry",
        Terminator::Return {
            value: Operand::Ref(result),
        },
    );
    entry.instructions.push(Instruction::Call {
        result: counted,
        callee: "count".to_string(),
        args:   vec![Operand::Ref(n)],
    });
    entry.instructions.push(Instruction::Binary {
        result,
        op: BinOp::Add,
        lhs: Operand::Ref(counted),
        rhs: const32(1),
        width: 32,
    });
    main.add_block(entry);

    let mut program = Program::new();
    program.add(count_function());
    program.add(main);
    program
}

/// Builds a program where `write_read(address, value)` stores a 32-bit value
/// and immediately loads it back.
pub fn memory_program() -> Program {
    let mut fun = Function::new("write_read");
    let address = fun.argument("address");
    let value = fun.argument("value");
    let loaded = fun.value("loaded");

    let mut entry = Block::new(
        "entry",
        Terminator::Return {
            value: Operand::Ref(loaded),
        },
    );
    entry.instructions.push(Instruction::Store {
        address: Operand::Ref(address),
        value:   Operand::Ref(value),
        width:   32,
    });
    entry.instructions.push(Instruction::Load {
        result:  loaded,
        address: Operand::Ref(address),
        width:   32,
    });
    fun.add_block(entry);

    let mut program = Program::new();
    program.add(fun);
    program
}

/// Wraps `values` as unbounded-mode arguments.
pub fn unbounded_args(values: &[i64]) -> Vec<Value> {
    values
        .iter()
        .map(|value| Value::from(Int::unbounded(*value)))
        .collect()
}

/// Wraps `values` as bounded-mode arguments of the given `width`.
pub fn bounded_args(width: u32, values: &[i64]) -> Vec<Value> {
    values
        .iter()
        .map(|value| Value::from(Int::bounded(width, *value)))
        .collect()
}

/// Gets the return binding of a record, if the run completed.
pub fn return_value(record: &CallRecord) -> Option<&Value> {
    record.return_state.variables.get("return")
}

/// Gets the labels of the blocks a record stepped through, in order.
pub fn block_names(record: &CallRecord) -> Vec<&str> {
    record
        .steps
        .iter()
        .map(|step| step.block_name.as_str())
        .collect()
}
