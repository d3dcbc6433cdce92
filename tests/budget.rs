//! This module is an integration test for the step budget: its exact
//! accounting, the truncation it causes, and how truncation propagates
//! through nested calls.

#![cfg(test)]

use trace_interpreter::interpreter::{Config, Interpreter};

mod common;

/// The number of blocks a full run of `count(n)` visits.
fn count_blocks(n: u32) -> u32 {
    2 * n + 3
}

#[test]
fn blocks_visited_never_exceeds_the_budget() -> anyhow::Result<()> {
    let program = common::count_program();
    let full = count_blocks(3);

    for budget in 0..=full + 2 {
        let interpreter = Interpreter::new(&program, Config::default().with_max_steps(budget));
        let record = interpreter.interpret("count", common::unbounded_args(&[3]))?;

        assert!(record.blocks_visited <= budget);
        assert_eq!(record.steps.len(), record.blocks_visited as usize);
    }

    Ok(())
}

#[test]
fn early_exit_is_set_exactly_when_the_run_needs_more_than_the_budget() -> anyhow::Result<()> {
    let program = common::count_program();
    let full = count_blocks(3);

    for budget in 0..=full + 2 {
        let interpreter = Interpreter::new(&program, Config::default().with_max_steps(budget));
        let record = interpreter.interpret("count", common::unbounded_args(&[3]))?;

        if budget < full {
            assert!(record.early_exit);
            assert_eq!(record.blocks_visited, budget);
            assert_eq!(common::return_value(&record), None);
        } else {
            assert!(!record.early_exit);
            assert_eq!(record.blocks_visited, full);
            assert!(common::return_value(&record).is_some());
        }
    }

    Ok(())
}

#[test]
fn a_truncated_callee_keeps_its_partial_record() -> anyhow::Result<()> {
    // main(10) needs 1 + count_blocks(10) = 24 blocks; give it 5.
    let program = common::call_program();
    let interpreter = Interpreter::new(&program, Config::default().with_max_steps(5));

    let record = interpreter.interpret("main", common::unbounded_args(&[10]))?;

    // The caller is marked truncated and never binds its result.
    assert!(record.early_exit);
    assert_eq!(record.blocks_visited, 5);
    assert_eq!(common::return_value(&record), None);

    // The callee's partial record is still nested under the caller's block,
    // cut off at the budget that remained for it.
    let callee = &record.steps[0].calls[0];
    assert_eq!(callee.function_name, "count");
    assert!(callee.early_exit);
    assert_eq!(callee.blocks_visited, 4);

    Ok(())
}

#[test]
fn a_callee_that_fits_within_the_budget_completes() -> anyhow::Result<()> {
    let program = common::call_program();
    let full = 1 + count_blocks(2);
    let interpreter = Interpreter::new(&program, Config::default().with_max_steps(full));

    let record = interpreter.interpret("main", common::unbounded_args(&[2]))?;

    assert!(!record.early_exit);
    assert_eq!(record.blocks_visited, full);
    assert!(common::return_value(&record).is_some());
    assert!(!record.steps[0].calls[0].early_exit);

    Ok(())
}

#[test]
fn a_zero_budget_stops_before_the_entry_block() -> anyhow::Result<()> {
    let program = common::call_program();
    let interpreter = Interpreter::new(&program, Config::default().with_max_steps(0));

    let record = interpreter.interpret("main", common::unbounded_args(&[1]))?;

    assert!(record.early_exit);
    assert!(record.steps.is_empty());
    assert_eq!(record.blocks_visited, 0);

    Ok(())
}
