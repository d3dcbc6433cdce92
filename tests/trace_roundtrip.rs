//! This module is an integration test for the trace codec: records produced
//! by real runs must survive the trip through both wire encodings.

#![cfg(test)]

use num_bigint::BigInt;
use trace_interpreter::{
    codec,
    interpreter::{Config, Interpreter},
    ir::{BinOp, Block, Function, Instruction, Operand, Program, Terminator},
    value::{Int, Value},
};

mod common;

#[test]
fn json_round_trips_an_unbounded_run() -> anyhow::Result<()> {
    let program = common::call_program();
    let interpreter = Interpreter::new(&program, Config::default());
    let record = interpreter.interpret("main", common::unbounded_args(&[2]))?;

    let encoded = codec::to_json_string(&record)?;
    let decoded = codec::from_json_str(&encoded)?;

    assert_eq!(decoded, record);
    Ok(())
}

#[test]
fn cbor_round_trips_an_unbounded_run() -> anyhow::Result<()> {
    let program = common::memory_program();
    let interpreter = Interpreter::new(&program, Config::default());
    let record = interpreter.interpret("write_read", common::unbounded_args(&[16, -7]))?;

    let encoded = codec::to_cbor(&record)?;
    let decoded = codec::from_cbor(&encoded)?;

    assert_eq!(decoded, record);
    Ok(())
}

#[test]
fn bounded_records_are_stable_across_a_round_trip() -> anyhow::Result<()> {
    // Decoding forgets widths, so a bounded record does not compare equal to
    // its decoding. Its document text is the invariant instead.
    let program = common::memory_program();
    let interpreter = Interpreter::new(
        &program,
        Config::default().with_bounded_integers(true),
    );
    let record = interpreter.interpret("write_read", common::bounded_args(64, &[16, -7]))?;

    let first = codec::to_json_string(&record)?;
    let second = codec::to_json_string(&codec::from_json_str(&first)?)?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn integers_wider_than_a_machine_word_survive_a_real_run() -> anyhow::Result<()> {
    // square(x) = x * x at 256 bits, on a value that cannot fit in u64.
    let mut fun = Function::new("square");
    let x = fun.argument("x");
    let result = fun.value("result");
    let mut entry = Block::new(
        "entry",
        Terminator::Return {
            value: Operand::Ref(result),
        },
    );
    entry.instructions.push(Instruction::Binary {
        result,
        op: BinOp::Mul,
        lhs: Operand::Ref(x),
        rhs: Operand::Ref(x),
        width: 256,
    });
    fun.add_block(entry);
    let mut program = Program::new();
    program.add(fun);

    let huge: BigInt = "340282366920938463463374607431768211456".parse()?;
    let interpreter = Interpreter::new(&program, Config::default());
    let record = interpreter.interpret("square", vec![Value::from(Int::unbounded(huge.clone()))])?;

    let decoded = codec::from_json_str(&codec::to_json_string(&record)?)?;

    assert_eq!(
        common::return_value(&decoded),
        Some(&Value::from(Int::unbounded(&huge * &huge)))
    );
    Ok(())
}

#[test]
fn both_modes_agree_on_the_wire_when_their_readings_agree() -> anyhow::Result<()> {
    let program = common::sum_program();

    let bounded = Interpreter::new(&program, Config::default().with_bounded_integers(true));
    let bounded_record = bounded.interpret("sum", common::bounded_args(32, &[5, 3]))?;

    let unbounded = Interpreter::new(&program, Config::default());
    let unbounded_record = unbounded.interpret("sum", common::unbounded_args(&[5, 3]))?;

    assert_eq!(
        codec::to_json_string(&bounded_record)?,
        codec::to_json_string(&unbounded_record)?
    );
    Ok(())
}

#[test]
fn pretty_documents_parse_back() -> anyhow::Result<()> {
    let program = common::sum_program();
    let interpreter = Interpreter::new(&program, Config::default());
    let record = interpreter.interpret("sum", common::unbounded_args(&[1, 2]))?;

    let pretty = codec::to_json_string_pretty(&record)?;
    let decoded = codec::from_json_str(&pretty)?;

    assert_eq!(decoded, record);
    Ok(())
}
