//! Dominator tree over a function's control-flow graph.
//!
//! Uses the iterative Cooper/Harvey/Kennedy algorithm over a reverse
//! post-order traversal. Blocks not reachable from the entry are outside
//! the tree; `contains` reports reachability.

use std::collections::HashMap;

use crate::ir::function::Function;
use crate::ir::value::{BlockId, Definition, InstId};
use crate::pass::FunctionAnalysis;

/// Marker type for requesting [`Dominance`] through the pass cache.
#[derive(Debug)]
pub struct DominanceAnalysis;

impl FunctionAnalysis for DominanceAnalysis {
    type Result = Dominance;
    const NAME: &'static str = "dominance";

    fn run(function: &Function) -> Dominance {
        Dominance::compute(function)
    }
}

/// The computed dominator tree.
#[derive(Debug)]
pub struct Dominance {
    /// Immediate dominator per reachable block; the entry maps to itself.
    idom: HashMap<BlockId, BlockId>,
    /// Reverse post-order position per reachable block.
    rpo_index: HashMap<BlockId, usize>,
    /// Dominator-tree children, ordered by reverse post-order.
    children: HashMap<BlockId, Vec<BlockId>>,
    entry: Option<BlockId>,
}

impl Dominance {
    pub fn compute(function: &Function) -> Dominance {
        let Some(entry) = function.entry() else {
            return Dominance {
                idom: HashMap::new(),
                rpo_index: HashMap::new(),
                children: HashMap::new(),
                entry: None,
            };
        };

        // Post-order traversal of the reachable CFG.
        let mut postorder = Vec::new();
        let mut visited = Vec::new();
        let mut stack = vec![(entry, 0usize)];
        visited.push(entry);
        while let Some((block, next)) = stack.pop() {
            let successors = function.successors_of(block);
            if next < successors.len() {
                stack.push((block, next + 1));
                let successor = successors[next];
                if !visited.contains(&successor) {
                    visited.push(successor);
                    stack.push((successor, 0));
                }
            } else {
                postorder.push(block);
            }
        }

        let rpo: Vec<BlockId> = postorder.iter().rev().copied().collect();
        let rpo_index: HashMap<BlockId, usize> =
            rpo.iter().enumerate().map(|(i, &b)| (b, i)).collect();

        let mut predecessors: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
        for &block in &rpo {
            for successor in function.successors_of(block) {
                if rpo_index.contains_key(&successor) {
                    predecessors.entry(successor).or_default().push(block);
                }
            }
        }

        let mut idom: HashMap<BlockId, BlockId> = HashMap::new();
        idom.insert(entry, entry);
        let mut changed = true;
        while changed {
            changed = false;
            for &block in rpo.iter().skip(1) {
                let preds = predecessors.get(&block).map(Vec::as_slice).unwrap_or(&[]);
                let mut new_idom = None;
                for &pred in preds {
                    if !idom.contains_key(&pred) {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred,
                        Some(current) => intersect(&idom, &rpo_index, pred, current),
                    });
                }
                if let Some(new_idom) = new_idom {
                    if idom.get(&block) != Some(&new_idom) {
                        idom.insert(block, new_idom);
                        changed = true;
                    }
                }
            }
        }

        let mut children: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
        for &block in &rpo {
            if block == entry {
                continue;
            }
            if let Some(&parent) = idom.get(&block) {
                children.entry(parent).or_default().push(block);
            }
        }

        Dominance {
            idom,
            rpo_index,
            children,
            entry: Some(entry),
        }
    }

    /// Whether `block` is reachable from the entry.
    pub fn contains(&self, block: BlockId) -> bool {
        self.rpo_index.contains_key(&block)
    }

    pub fn entry(&self) -> Option<BlockId> {
        self.entry
    }

    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        if Some(block) == self.entry {
            return None;
        }
        self.idom.get(&block).copied()
    }

    /// Dominator-tree children of `block`, in reverse post-order.
    pub fn children_of(&self, block: BlockId) -> &[BlockId] {
        self.children.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            let parent = self.idom[&current];
            if parent == current {
                return false;
            }
            current = parent;
        }
    }

    pub fn properly_dominates(&self, a: BlockId, b: BlockId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Whether the value of `def` is in scope at `user`: same-block
    /// definitions by position, cross-block by tree walk. Entry arguments,
    /// globals, and function references dominate everything; literals are
    /// always in scope and never reach this query.
    pub fn properly_dominates_def(
        &self,
        def: Definition,
        user: InstId,
        function: &Function,
    ) -> bool {
        let user_block = function.instruction(user).parent;
        match def {
            Definition::Variable(_) | Definition::Function(_) => true,
            Definition::Argument(block, _) => {
                block == user_block || self.properly_dominates(block, user_block)
            }
            Definition::Instruction(def_inst) => {
                let def_block = function.instruction(def_inst).parent;
                if def_block == user_block {
                    match (
                        function.position_in_block(def_inst),
                        function.position_in_block(user),
                    ) {
                        (Some(d), Some(u)) => d < u,
                        _ => false,
                    }
                } else {
                    self.properly_dominates(def_block, user_block)
                }
            }
        }
    }
}

fn intersect(
    idom: &HashMap<BlockId, BlockId>,
    rpo_index: &HashMap<BlockId, usize>,
    mut a: BlockId,
    mut b: BlockId,
) -> BlockId {
    while a != b {
        while rpo_index[&a] > rpo_index[&b] {
            a = idom[&a];
        }
        while rpo_index[&b] > rpo_index[&a] {
            b = idom[&b];
        }
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::instruction::InstructionKind;
    use crate::ir::types::Type;
    use crate::ir::value::Use;

    /// entry -> (then | els) -> merge, plus one unreachable block.
    fn diamond() -> (Function, BlockId, BlockId, BlockId, BlockId, BlockId) {
        let mut f = Function::new("f", vec![Type::Bool], Type::void());
        let entry = f.append_block("entry");
        f.append_block_argument(entry, "c", Type::Bool);
        let then = f.append_block("then");
        let els = f.append_block("else");
        let merge = f.append_block("merge");
        let island = f.append_block("island");

        let c = Use::Def(Definition::Argument(entry, 0));
        f.append_instruction(
            entry,
            None,
            InstructionKind::Conditional {
                condition: c,
                then_target: then,
                then_arguments: vec![],
                else_target: els,
                else_arguments: vec![],
            },
        );
        f.append_instruction(
            then,
            None,
            InstructionKind::Branch {
                target: merge,
                arguments: vec![],
            },
        );
        f.append_instruction(
            els,
            None,
            InstructionKind::Branch {
                target: merge,
                arguments: vec![],
            },
        );
        f.append_instruction(merge, None, InstructionKind::Return(None));
        f.append_instruction(island, None, InstructionKind::Return(None));
        (f, entry, then, els, merge, island)
    }

    #[test]
    fn test_diamond_dominators() {
        let (f, entry, then, els, merge, island) = diamond();
        let dom = Dominance::compute(&f);

        assert!(dom.dominates(entry, merge));
        assert!(dom.properly_dominates(entry, then));
        assert!(dom.properly_dominates(entry, els));
        assert!(!dom.properly_dominates(then, merge));
        assert!(!dom.properly_dominates(els, merge));
        assert_eq!(dom.immediate_dominator(merge), Some(entry));
        assert!(!dom.contains(island));
        assert!(dom.contains(entry));
        assert!(!dom.dominates(entry, island));
    }

    #[test]
    fn test_loop_dominators() {
        let mut f = Function::new("f", vec![Type::Bool], Type::void());
        let entry = f.append_block("entry");
        f.append_block_argument(entry, "c", Type::Bool);
        let header = f.append_block("header");
        let body = f.append_block("body");
        let exit = f.append_block("exit");

        let c = Use::Def(Definition::Argument(entry, 0));
        f.append_instruction(
            entry,
            None,
            InstructionKind::Branch {
                target: header,
                arguments: vec![],
            },
        );
        f.append_instruction(
            header,
            None,
            InstructionKind::Conditional {
                condition: c.clone(),
                then_target: body,
                then_arguments: vec![],
                else_target: exit,
                else_arguments: vec![],
            },
        );
        f.append_instruction(
            body,
            None,
            InstructionKind::Branch {
                target: header,
                arguments: vec![],
            },
        );
        f.append_instruction(exit, None, InstructionKind::Return(None));

        let dom = Dominance::compute(&f);
        assert_eq!(dom.immediate_dominator(header), Some(entry));
        assert_eq!(dom.immediate_dominator(body), Some(header));
        assert_eq!(dom.immediate_dominator(exit), Some(header));
        assert!(dom.dominates(header, body));
        assert!(!dom.dominates(body, exit));
    }

    #[test]
    fn test_position_based_dominance() {
        let mut f = Function::new("f", vec![Type::Bool], Type::Bool);
        let entry = f.append_block("entry");
        f.append_block_argument(entry, "x", Type::Bool);
        let x = Use::Def(Definition::Argument(entry, 0));
        let a = f.append_instruction(entry, None, InstructionKind::Not(x.clone()));
        let b = f.append_instruction(
            entry,
            None,
            InstructionKind::Not(Use::Def(Definition::Instruction(a))),
        );
        f.append_instruction(
            entry,
            None,
            InstructionKind::Return(Some(Use::Def(Definition::Instruction(b)))),
        );

        let dom = Dominance::compute(&f);
        assert!(dom.properly_dominates_def(Definition::Instruction(a), b, &f));
        assert!(!dom.properly_dominates_def(Definition::Instruction(b), a, &f));
        assert!(dom.properly_dominates_def(Definition::Argument(entry, 0), a, &f));
    }
}
