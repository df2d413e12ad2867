//! Algebraic expression views over basic blocks.
//!
//! Each block's pure instructions form a forest of expression trees: a pure
//! instruction folds a pure same-block operand into its tree when that
//! operand has exactly one user; every other operand is an atom. The views
//! are read-only; transforms consuming them decide how to rewrite.

use std::collections::{HashMap, VecDeque};

use crate::analysis::def_use::DefUseAnalysis;
use crate::ir::function::Function;
use crate::ir::value::{BlockId, Definition, InstId, Use};
use crate::pass::FunctionAnalysis;

/// Marker type for requesting [`AlgebraicExpressions`] through the pass cache.
#[derive(Debug)]
pub struct AlgebraicExpressionsAnalysis;

impl FunctionAnalysis for AlgebraicExpressionsAnalysis {
    type Result = AlgebraicExpressions;
    const NAME: &'static str = "algebraic-expressions";

    fn run(function: &Function) -> AlgebraicExpressions {
        AlgebraicExpressions::compute(function)
    }
}

/// One node of an expression tree.
#[derive(Debug, Clone)]
pub enum AlgebraicExpression {
    /// A leaf: a literal, an argument, or anything opaque to the algebra.
    Atom(Use),
    /// A pure instruction and its operand subtrees.
    Expression {
        instruction: InstId,
        operands: Vec<AlgebraicExpression>,
    },
}

impl AlgebraicExpression {
    pub fn is_atom(&self) -> bool {
        matches!(self, AlgebraicExpression::Atom(_))
    }

    fn operands(&self) -> &[AlgebraicExpression] {
        match self {
            AlgebraicExpression::Atom(_) => &[],
            AlgebraicExpression::Expression { operands, .. } => operands,
        }
    }
}

/// The expression forest of one block.
#[derive(Debug)]
pub struct BlockExpressions {
    pub block: BlockId,
    pub roots: Vec<AlgebraicExpression>,
}

/// Traversal orders understood by [`BlockExpressions::transpose_traversed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    BreadthFirst,
}

impl BlockExpressions {
    /// A lazy traversal over every subexpression of this block's forest:
    /// roots first, then each level of operands.
    pub fn transpose_traversed(&self, order: TraversalOrder) -> Transposed<'_> {
        let TraversalOrder::BreadthFirst = order;
        Transposed {
            queue: self.roots.iter().collect(),
        }
    }
}

/// Breadth-first iterator over subexpressions.
#[derive(Debug)]
pub struct Transposed<'a> {
    queue: VecDeque<&'a AlgebraicExpression>,
}

impl<'a> Iterator for Transposed<'a> {
    type Item = &'a AlgebraicExpression;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.operands());
        Some(node)
    }
}

/// Per-block expression forests for a whole function.
#[derive(Debug)]
pub struct AlgebraicExpressions {
    blocks: Vec<BlockExpressions>,
}

impl AlgebraicExpressions {
    pub fn compute(function: &Function) -> AlgebraicExpressions {
        let def_use = function.analysis::<DefUseAnalysis>();
        let mut blocks = Vec::new();

        for &block in function.block_order() {
            // Callee purity is module-level information; from a bare
            // function view every apply is opaque.
            let candidates: Vec<InstId> = function
                .block(block)
                .instructions()
                .iter()
                .copied()
                .filter(|&id| function.instruction(id).kind.is_pure(|_| false))
                .collect();

            let mut trees: HashMap<InstId, AlgebraicExpression> = HashMap::new();
            let mut consumed: Vec<InstId> = Vec::new();
            for &id in &candidates {
                let mut operands = Vec::new();
                function.instruction(id).kind.for_each_use(|u| {
                    let subtree = match u.as_definition() {
                        Some(Definition::Instruction(op))
                            if trees.contains_key(&op)
                                && def_use.user_count(Definition::Instruction(op)) == 1 =>
                        {
                            consumed.push(op);
                            trees.remove(&op).expect("subtree present")
                        }
                        _ => AlgebraicExpression::Atom(u.clone()),
                    };
                    operands.push(subtree);
                });
                trees.insert(
                    id,
                    AlgebraicExpression::Expression {
                        instruction: id,
                        operands,
                    },
                );
            }

            let roots = candidates
                .iter()
                .filter(|&&id| !consumed.contains(&id))
                .filter_map(|&id| trees.remove(&id))
                .collect();
            blocks.push(BlockExpressions { block, roots });
        }

        AlgebraicExpressions { blocks }
    }

    pub fn blocks(&self) -> &[BlockExpressions] {
        &self.blocks
    }

    pub fn for_block(&self, block: BlockId) -> Option<&BlockExpressions> {
        self.blocks.iter().find(|b| b.block == block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::instruction::{BooleanOp, InstructionKind};
    use crate::ir::types::Type;

    #[test]
    fn test_single_use_operands_fold_into_trees() {
        let mut f = Function::new("f", vec![Type::Bool], Type::Bool);
        let entry = f.append_block("entry");
        f.append_block_argument(entry, "x", Type::Bool);
        let x = Use::Def(Definition::Argument(entry, 0));
        let a = f.append_instruction(entry, None, InstructionKind::Not(x.clone()));
        let b = f.append_instruction(
            entry,
            None,
            InstructionKind::BooleanBinary {
                op: BooleanOp::Or,
                lhs: Use::Def(Definition::Instruction(a)),
                rhs: x,
            },
        );
        f.append_instruction(
            entry,
            None,
            InstructionKind::Return(Some(Use::Def(Definition::Instruction(b)))),
        );

        let algebra = AlgebraicExpressions::compute(&f);
        let exprs = algebra.for_block(entry).unwrap();
        assert_eq!(exprs.roots.len(), 1);

        let nodes: Vec<_> = exprs.transpose_traversed(TraversalOrder::BreadthFirst).collect();
        // Root `or`, then its two children (`not` subtree and the `x` atom),
        // then the `not`'s operand atom.
        assert_eq!(nodes.len(), 4);
        assert!(!nodes[0].is_atom());
        assert!(nodes.iter().filter(|n| n.is_atom()).count() == 2);
    }

    #[test]
    fn test_multi_use_operand_stays_a_root() {
        let mut f = Function::new("f", vec![Type::Bool], Type::Bool);
        let entry = f.append_block("entry");
        f.append_block_argument(entry, "x", Type::Bool);
        let x = Use::Def(Definition::Argument(entry, 0));
        let a = f.append_instruction(entry, None, InstructionKind::Not(x));
        let a_use = Use::Def(Definition::Instruction(a));
        f.append_instruction(
            entry,
            None,
            InstructionKind::BooleanBinary {
                op: BooleanOp::And,
                lhs: a_use.clone(),
                rhs: a_use.clone(),
            },
        );
        f.append_instruction(
            entry,
            None,
            InstructionKind::Return(Some(a_use)),
        );

        let algebra = AlgebraicExpressions::compute(&f);
        let exprs = algebra.for_block(entry).unwrap();
        // `not` has two users, so it is not folded into the `and`.
        assert_eq!(exprs.roots.len(), 2);
    }
}
