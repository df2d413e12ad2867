//! Dead code elimination.
//!
//! Worklist over the pure, non-terminator instructions of a function: an
//! instruction with zero users is dropped, which decrements its operands'
//! user counts and may expose further work. Side-effecting kinds (stores,
//! loads, traps, terminators, applications of impure callees) are never
//! touched, so the observable behavior of the function is preserved.

use std::collections::{HashMap, HashSet};

use crate::ir::function::Function;
use crate::ir::value::{Definition, InstId};
use crate::pass::{FunctionSummaries, FunctionTransform};

#[derive(Debug, Default)]
pub struct DeadCodeElimination;

impl DeadCodeElimination {
    pub fn new() -> Self {
        Self
    }
}

impl FunctionTransform for DeadCodeElimination {
    fn name(&self) -> &'static str {
        "DeadCodeElimination"
    }

    fn run(&self, function: &mut Function, summaries: &FunctionSummaries) -> bool {
        let removable = |function: &Function, id: InstId| {
            let kind = &function.instruction(id).kind;
            !kind.is_terminator() && kind.is_pure(|callee| summaries.is_pure(callee))
        };

        // Per-instruction user counts; an instruction using the same value
        // through several operands counts once per referencing instruction.
        let mut user_count: HashMap<InstId, usize> = HashMap::new();
        for id in function.ordered_instructions() {
            let mut counted: HashSet<InstId> = HashSet::new();
            function.instruction(id).kind.for_each_use(|u| {
                if let Some(Definition::Instruction(def)) = u.as_definition() {
                    if counted.insert(def) {
                        *user_count.entry(def).or_insert(0) += 1;
                    }
                }
            });
        }

        let mut worklist: Vec<InstId> = function
            .ordered_instructions()
            .into_iter()
            .filter(|&id| removable(function, id))
            .collect();

        let mut changed = false;
        while let Some(id) = worklist.pop() {
            if !function.is_instruction_live(id) {
                continue;
            }
            if user_count.get(&id).copied().unwrap_or(0) > 0 {
                continue;
            }

            let mut operands: Vec<InstId> = Vec::new();
            let mut seen: HashSet<InstId> = HashSet::new();
            function.instruction(id).kind.for_each_use(|u| {
                if let Some(Definition::Instruction(def)) = u.as_definition() {
                    if seen.insert(def) {
                        operands.push(def);
                    }
                }
            });

            function.remove_instruction(id);
            changed = true;

            for def in operands {
                let count = user_count.entry(def).or_insert(0);
                *count = count.saturating_sub(1);
                if *count == 0 && function.is_instruction_live(def) && removable(function, def) {
                    worklist.push(def);
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::Builder;
    use crate::ir::function::FunctionAttribute;
    use crate::ir::instruction::{BooleanOp, InstructionKind};
    use crate::ir::module::{Module, Stage};
    use crate::ir::types::Type;
    use crate::ir::value::{Definition, Use};

    #[test]
    fn test_removes_transitively_dead_chain() {
        let mut module = Module::new("m", Stage::Raw);
        let mut b = Builder::new(&mut module);
        let f = b.create_function("f", vec![Type::Bool], Type::Bool);
        let entry = b.append_block(f, "entry", vec![("x".into(), Type::Bool)]);
        let x = Use::Def(Definition::Argument(entry, 0));
        let live = b.boolean(BooleanOp::And, x.clone(), x.clone());
        let dead1 = b.boolean(BooleanOp::Or, x.clone(), x.clone());
        let _dead2 = b.not(Use::Def(Definition::Instruction(dead1)));
        b.ret(Some(Use::Def(Definition::Instruction(live))));

        let changed = module
            .map_transform(&DeadCodeElimination::new(), true)
            .unwrap();
        assert!(changed);
        let function = module.function(f);
        assert_eq!(function.block(entry).instructions().len(), 2);

        // Idempotence: a second run reports no change.
        let changed = module
            .map_transform(&DeadCodeElimination::new(), true)
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_side_effects_survive() {
        let mut module = Module::new("m", Stage::Raw);
        let mut b = Builder::new(&mut module);
        let f = b.create_function("f", vec![Type::Bool], Type::void());
        let entry = b.append_block(f, "entry", vec![("x".into(), Type::Bool)]);
        let x = Use::Def(Definition::Argument(entry, 0));
        b.build(InstructionKind::Builtin {
            opcode: "debug.print".into(),
            operands: vec![x.clone()],
        });
        b.build(InstructionKind::Trap);
        b.ret(None);

        let changed = module
            .map_transform(&DeadCodeElimination::new(), true)
            .unwrap();
        assert!(!changed);
        assert_eq!(module.function(f).block(entry).instructions().len(), 3);
    }

    #[test]
    fn test_pure_apply_is_removable() {
        let mut module = Module::new("m", Stage::Raw);
        let mut b = Builder::new(&mut module);
        let callee = b.create_declaration("pure_callee", vec![Type::Bool], Type::Bool);
        module
            .function_mut(callee)
            .attributes
            .insert(FunctionAttribute::Pure);

        let mut b = Builder::new(&mut module);
        let impure = b.create_declaration("impure_callee", vec![Type::Bool], Type::Bool);
        let f = b.create_function("f", vec![Type::Bool], Type::void());
        let entry = b.append_block(f, "entry", vec![("x".into(), Type::Bool)]);
        let x = Use::Def(Definition::Argument(entry, 0));
        b.apply(Use::Def(Definition::Function(callee)), vec![x.clone()]);
        b.apply(Use::Def(Definition::Function(impure)), vec![x]);
        b.ret(None);

        let changed = module
            .map_transform(&DeadCodeElimination::new(), true)
            .unwrap();
        assert!(changed);
        // The pure application goes, the impure one stays.
        assert_eq!(module.function(f).block(entry).instructions().len(), 2);
    }
}
