//! This module contains the environment that maps IR values to the concrete
//! values bound to them during a single function activation.

use std::collections::HashMap;

use crate::{
    error::execution::Error,
    ir::{ValueId, ValueRef},
    value::Value,
};

/// The bindings of one function activation.
///
/// Each recursive call gets a fresh set of bindings, while the heap is shared
/// across the whole call tree.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Bindings {
    values: HashMap<ValueRef, Value>,
}

impl Bindings {
    /// Constructs an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs the environment for a call into `function`, binding `args`
    /// positionally to `params`.
    pub fn for_call(function: &str, params: &[ValueId], args: Vec<Value>) -> Result<Self, Error> {
        if params.len() != args.len() {
            return Err(Error::ArityMismatch {
                function: function.to_string(),
                expected: params.len(),
                actual:   args.len(),
            });
        }
        let values = params
            .iter()
            .zip(args)
            .map(|(param, arg)| (ValueRef::Var(*param), arg))
            .collect();
        Ok(Self { values })
    }

    /// Binds `value` to `target`, replacing any previous binding.
    ///
    /// Rebinding is how phi nodes and the return sentinel work, so it is not
    /// an error.
    pub fn bind(&mut self, target: ValueRef, value: Value) {
        self.values.insert(target, value);
    }

    /// Gets the value bound to `reference`, if any.
    #[must_use]
    pub fn get(&self, reference: &ValueRef) -> Option<&Value> {
        self.values.get(reference)
    }

    /// Iterates over the current bindings in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&ValueRef, &Value)> {
        self.values.iter()
    }
}
