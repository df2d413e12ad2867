//! CFG simplification: constant-conditional folding and unreachable-block
//! removal.

use std::collections::HashSet;

use crate::ir::function::Function;
use crate::ir::instruction::InstructionKind;
use crate::ir::value::{BlockId, Literal, Use};
use crate::pass::{FunctionSummaries, FunctionTransform};

#[derive(Debug, Default)]
pub struct CfgSimplification;

impl CfgSimplification {
    pub fn new() -> Self {
        Self
    }
}

impl FunctionTransform for CfgSimplification {
    fn name(&self) -> &'static str {
        "CFGSimplification"
    }

    fn run(&self, function: &mut Function, _summaries: &FunctionSummaries) -> bool {
        let mut changed = false;

        // `conditional true/false ...` decays to a branch along the taken arm.
        for block in function.block_order().to_vec() {
            let Some(terminator) = function.terminator_of(block) else {
                continue;
            };
            let InstructionKind::Conditional {
                condition: Use::Literal(_, Literal::Bool(value)),
                then_target,
                then_arguments,
                else_target,
                else_arguments,
            } = function.instruction(terminator).kind.clone()
            else {
                continue;
            };
            let (target, arguments) = if value {
                (then_target, then_arguments)
            } else {
                (else_target, else_arguments)
            };
            function.replace_instruction_kind(
                terminator,
                InstructionKind::Branch { target, arguments },
            );
            changed = true;
        }

        // Drop everything the entry can no longer reach.
        let Some(entry) = function.entry() else {
            return changed;
        };
        let mut reachable: HashSet<BlockId> = HashSet::new();
        let mut stack = vec![entry];
        reachable.insert(entry);
        while let Some(block) = stack.pop() {
            for successor in function.successors_of(block) {
                if reachable.insert(successor) {
                    stack.push(successor);
                }
            }
        }
        for block in function.block_order().to_vec() {
            if !reachable.contains(&block) {
                function.remove_block(block);
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::Builder;
    use crate::ir::module::{Module, Stage};
    use crate::ir::types::Type;

    #[test]
    fn test_constant_conditional_folds_and_dead_arm_disappears() {
        let mut module = Module::new("m", Stage::Raw);
        let mut b = Builder::new(&mut module);
        let f = b.create_function("f", vec![], Type::Bool);
        let entry = b.append_block(f, "entry", vec![]);
        let then = b.append_block(f, "then", vec![]);
        let els = b.append_block(f, "else", vec![]);
        b.move_to_end(f, entry);
        b.conditional(Use::bool_literal(true), then, vec![], els, vec![]);
        b.move_to_end(f, then);
        b.ret(Some(Use::bool_literal(true)));
        b.move_to_end(f, els);
        b.ret(Some(Use::bool_literal(false)));

        let changed = module
            .map_transform(&CfgSimplification::new(), true)
            .unwrap();
        assert!(changed);

        let function = module.function(f);
        assert_eq!(function.block_order().len(), 2);
        assert!(function.block_named("else").is_none());
        let terminator = function.terminator_of(entry).unwrap();
        assert!(matches!(
            function.instruction(terminator).kind,
            InstructionKind::Branch { .. }
        ));

        let changed = module
            .map_transform(&CfgSimplification::new(), true)
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_reachable_graph_is_untouched() {
        let mut module = Module::new("m", Stage::Raw);
        let mut b = Builder::new(&mut module);
        let f = b.create_function("f", vec![Type::Bool], Type::void());
        let entry = b.append_block(f, "entry", vec![("c".into(), Type::Bool)]);
        let done = b.append_block(f, "done", vec![]);
        let c = Use::Def(crate::ir::value::Definition::Argument(entry, 0));
        b.move_to_end(f, entry);
        b.conditional(c, done, vec![], done, vec![]);
        b.move_to_end(f, done);
        b.ret(None);

        let changed = module
            .map_transform(&CfgSimplification::new(), true)
            .unwrap();
        assert!(!changed);
        assert_eq!(module.function(f).block_order().len(), 2);
    }
}
