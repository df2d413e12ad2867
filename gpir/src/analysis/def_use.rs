//! Reverse map from each definition to the instructions referencing it.

use std::collections::HashMap;

use crate::ir::function::Function;
use crate::ir::value::{Definition, InstId};
use crate::pass::FunctionAnalysis;

/// Marker type for requesting [`DefUse`] through the pass cache.
#[derive(Debug)]
pub struct DefUseAnalysis;

impl FunctionAnalysis for DefUseAnalysis {
    type Result = DefUse;
    const NAME: &'static str = "def-use";

    fn run(function: &Function) -> DefUse {
        DefUse::compute(function)
    }
}

/// Users of every definition referenced inside one function.
#[derive(Debug)]
pub struct DefUse {
    users: HashMap<Definition, Vec<InstId>>,
}

impl DefUse {
    pub fn compute(function: &Function) -> DefUse {
        let mut users: HashMap<Definition, Vec<InstId>> = HashMap::new();
        for id in function.ordered_instructions() {
            function.instruction(id).kind.for_each_use(|u| {
                if let Some(def) = u.as_definition() {
                    let entry = users.entry(def).or_default();
                    // An instruction using the same value twice is one user.
                    if entry.last() != Some(&id) {
                        entry.push(id);
                    }
                }
            });
        }
        DefUse { users }
    }

    /// Instructions referencing `def`, in function order.
    pub fn users(&self, def: Definition) -> &[InstId] {
        self.users.get(&def).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn user_count(&self, def: Definition) -> usize {
        self.users(def).len()
    }

    pub fn is_unused(&self, def: Definition) -> bool {
        self.users(def).is_empty()
    }
}
