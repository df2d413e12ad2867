//! CFG canonicalization: single-exit rewriting with join blocks.
//!
//! Every `return` site is rewritten into a `branch` towards one synthetic
//! `exit` block whose parameter carries the return value. A conditional
//! whose two arms both branch straight to the same merge target gets a join
//! block that funnels the per-arm values through a single parameterized
//! edge. The exit block always prints last; joins keep creation order.

use std::collections::HashSet;

use crate::ir::function::Function;
use crate::ir::instruction::InstructionKind;
use crate::ir::value::{BlockId, Definition, InstId, Use};
use crate::pass::{FunctionSummaries, FunctionTransform};

#[derive(Debug, Default)]
pub struct CfgCanonicalization;

impl CfgCanonicalization {
    pub fn new() -> Self {
        Self
    }
}

impl FunctionTransform for CfgCanonicalization {
    fn name(&self) -> &'static str {
        "CFGCanonicalization"
    }

    fn run(&self, function: &mut Function, _summaries: &FunctionSummaries) -> bool {
        let return_blocks: Vec<BlockId> = function
            .block_order()
            .iter()
            .copied()
            .filter(|&block| {
                function.terminator_of(block).map_or(false, |t| {
                    matches!(function.instruction(t).kind, InstructionKind::Return(_))
                })
            })
            .collect();
        if return_blocks.len() <= 1 {
            return false;
        }

        let return_type = function.return_type.clone();
        let is_void = return_type.is_void();

        let exit_name = unique_block_name(function, "exit");
        let exit = function.append_block(exit_name);
        if !is_void {
            function.append_block_argument(exit, "exit_value", return_type.clone());
        }

        for block in return_blocks {
            let terminator = function
                .terminator_of(block)
                .expect("return block has a terminator");
            let InstructionKind::Return(value) = function.instruction(terminator).kind.clone()
            else {
                unreachable!("collected blocks end in return");
            };
            let arguments = if is_void {
                Vec::new()
            } else {
                vec![value.unwrap_or_else(Use::void_literal)]
            };
            function.replace_instruction_kind(
                terminator,
                InstructionKind::Branch {
                    target: exit,
                    arguments,
                },
            );
        }

        let exit_value = (!is_void).then(|| Use::Def(Definition::Argument(exit, 0)));
        function.append_instruction(exit, None, InstructionKind::Return(exit_value));

        if !is_void {
            insert_join_blocks(function, exit, &return_type);
        }
        function.move_block_to_end(exit);
        true
    }
}

/// Merge the arms of every conditional whose two successors both branch,
/// with one value, to the same merge target (the exit or an earlier join).
fn insert_join_blocks(
    function: &mut Function,
    exit: BlockId,
    return_type: &crate::ir::types::Type,
) {
    let mut merge_targets: HashSet<BlockId> = HashSet::from([exit]);
    let mut processed: HashSet<BlockId> = HashSet::new();

    loop {
        let mut created = false;
        for block in function.block_order().to_vec() {
            if processed.contains(&block) {
                continue;
            }
            let Some(terminator) = function.terminator_of(block) else {
                continue;
            };
            let InstructionKind::Conditional {
                then_target,
                else_target,
                ..
            } = function.instruction(terminator).kind
            else {
                continue;
            };
            if then_target == else_target {
                continue;
            }
            let Some((then_branch, then_merge)) = arm_branch(function, then_target) else {
                continue;
            };
            let Some((else_branch, else_merge)) = arm_branch(function, else_target) else {
                continue;
            };
            if then_merge != else_merge || !merge_targets.contains(&then_merge) {
                continue;
            }

            let join_name = unique_block_name(
                function,
                &format!("{}_join", function.block(block).name),
            );
            let join = function.append_block(join_name.clone());
            function.append_block_argument(join, format!("{}.0", join_name), return_type.clone());

            redirect_branch(function, then_branch, join);
            redirect_branch(function, else_branch, join);
            function.append_instruction(
                join,
                None,
                InstructionKind::Branch {
                    target: then_merge,
                    arguments: vec![Use::Def(Definition::Argument(join, 0))],
                },
            );

            merge_targets.insert(join);
            processed.insert(block);
            created = true;
        }
        if !created {
            break;
        }
    }
}

/// The arm's terminator when it is a single-value branch: `(branch, target)`.
fn arm_branch(function: &Function, block: BlockId) -> Option<(InstId, BlockId)> {
    let terminator = function.terminator_of(block)?;
    match &function.instruction(terminator).kind {
        InstructionKind::Branch { target, arguments } if arguments.len() == 1 => {
            Some((terminator, *target))
        }
        _ => None,
    }
}

fn redirect_branch(function: &mut Function, branch: InstId, new_target: BlockId) {
    let InstructionKind::Branch { arguments, .. } = function.instruction(branch).kind.clone()
    else {
        unreachable!("redirected instruction is a branch");
    };
    function.replace_instruction_kind(
        branch,
        InstructionKind::Branch {
            target: new_target,
            arguments,
        },
    );
}

fn unique_block_name(function: &Function, base: &str) -> String {
    if function.block_named(base).is_none() {
        return base.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{}{}", base, counter);
        if function.block_named(&candidate).is_none() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::Builder;
    use crate::ir::module::{Module, Stage};
    use crate::ir::types::Type;
    use crate::verify::verify_single_exit;

    /// entry: conditional -> then (return true) | else (return false)
    fn two_exit_module() -> (Module, crate::ir::value::FuncId) {
        let mut module = Module::new("m", Stage::Raw);
        let mut b = Builder::new(&mut module);
        let f = b.create_function("f", vec![Type::Bool], Type::Bool);
        let entry = b.append_block(f, "entry", vec![("c".into(), Type::Bool)]);
        let then = b.append_block(f, "then", vec![]);
        let els = b.append_block(f, "else", vec![]);
        let c = Use::Def(Definition::Argument(entry, 0));
        b.move_to_end(f, entry);
        b.conditional(c, then, vec![], els, vec![]);
        b.move_to_end(f, then);
        b.ret(Some(Use::bool_literal(true)));
        b.move_to_end(f, els);
        b.ret(Some(Use::bool_literal(false)));
        (module, f)
    }

    #[test]
    fn test_two_returns_merge_through_a_join() {
        let (mut module, f) = two_exit_module();
        let changed = module
            .map_transform(&CfgCanonicalization::new(), true)
            .unwrap();
        assert!(changed);

        let function = module.function(f);
        verify_single_exit(function).unwrap();

        // entry, then, else, entry_join, exit — exit prints last.
        let names: Vec<&str> = function
            .block_order()
            .iter()
            .map(|&b| function.block(b).name.as_str())
            .collect();
        assert_eq!(names, vec!["entry", "then", "else", "entry_join", "exit"]);

        let exit = function.block_named("exit").unwrap();
        let exit_block = function.block(exit);
        assert_eq!(exit_block.arguments().len(), 1);
        assert_eq!(exit_block.arguments()[0].name, "exit_value");
        assert_eq!(exit_block.arguments()[0].ty, Type::Bool);

        // Idempotence.
        let changed = module
            .map_transform(&CfgCanonicalization::new(), true)
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_void_function_gets_parameterless_exit() {
        let mut module = Module::new("m", Stage::Raw);
        let mut b = Builder::new(&mut module);
        let f = b.create_function("f", vec![Type::Bool], Type::void());
        let entry = b.append_block(f, "entry", vec![("c".into(), Type::Bool)]);
        let then = b.append_block(f, "then", vec![]);
        let els = b.append_block(f, "else", vec![]);
        let c = Use::Def(Definition::Argument(entry, 0));
        b.move_to_end(f, entry);
        b.conditional(c, then, vec![], els, vec![]);
        b.move_to_end(f, then);
        b.ret(None);
        b.move_to_end(f, els);
        b.ret(None);

        let changed = module
            .map_transform(&CfgCanonicalization::new(), true)
            .unwrap();
        assert!(changed);

        let function = module.function(f);
        verify_single_exit(function).unwrap();
        let exit = function.block_named("exit").unwrap();
        assert!(function.block(exit).arguments().is_empty());
    }

    #[test]
    fn test_single_exit_function_is_untouched() {
        let mut module = Module::new("m", Stage::Raw);
        let mut b = Builder::new(&mut module);
        let f = b.create_function("f", vec![], Type::void());
        b.append_block(f, "entry", vec![]);
        b.ret(None);

        let changed = module
            .map_transform(&CfgCanonicalization::new(), true)
            .unwrap();
        assert!(!changed);
        assert_eq!(module.function(f).block_order().len(), 1);
    }
}
