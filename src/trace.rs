//! This module contains the recorded trace of an interpretation run.
//!
//! A run of a function produces a [`CallRecord`]: the states at entry and
//! return, a step per basic block executed, and a nested record per call made
//! along the way. The record is the value the external equivalence checker
//! consumes, so its shape and field names are a wire contract shared with
//! that tool rather than an internal detail.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    interpreter::heap::Heap,
    value::Value,
};

/// A snapshot of the interpreter's state at one point in a run.
///
/// Variables are keyed by their textual names so that states from two
/// different runs (and two different programs) can be compared directly. The
/// states at a call boundary carry only the argument and return bindings;
/// block snapshots carry every binding live in the activation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct State {
    /// The values bound in the current activation, including the return
    /// sentinel once it has been bound.
    pub variables: BTreeMap<String, Value>,

    /// The heap shared by the whole call tree.
    pub heap: Heap,
}

/// The record of one executed basic block.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlockStep {
    /// The label of the executed block.
    pub block_name: String,

    /// The state after the block's phi nodes were resolved, before its other
    /// instructions ran.
    pub state: State,

    /// A record per call instruction executed in the block, in order.
    pub calls: Vec<CallRecord>,
}

/// The record of one function activation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CallRecord {
    /// The name of the function that ran.
    pub function_name: String,

    /// The state on entry, after argument binding and before the entry
    /// block.
    pub entry_state: State,

    /// The state at return, or at the point the run was cut off.
    pub return_state: State,

    /// One step per basic block executed, in order. Calls made inside a
    /// block nest their records under that block's step.
    pub steps: Vec<BlockStep>,

    /// Whether the run was cut off by the step budget before completing.
    ///
    /// When a nested call is cut off, this flag is set on its record and on
    /// the record of every enclosing activation.
    pub early_exit: bool,

    /// The number of basic blocks this activation and everything it called
    /// executed. Never exceeds the activation's step budget.
    pub blocks_visited: u32,
}
