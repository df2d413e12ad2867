//! Common subexpression elimination.
//!
//! Blocks are visited in dominator-tree pre-order with a scoped value-number
//! table, so a representative always dominates the duplicates it replaces.
//! Keys pair the opcode with the operand keys (defining instruction ids, or
//! a structural key for literals); `and`/`or` sort their operand keys since
//! they commute. Only pure, value-producing kinds are keyed.

use std::collections::HashMap;

use crate::analysis::dominance::{Dominance, DominanceAnalysis};
use crate::ir::function::Function;
use crate::ir::instruction::InstructionKind;
use crate::ir::value::{BlockId, Definition, ElementKey, InstId, Literal, Use};
use crate::pass::{FunctionSummaries, FunctionTransform};

#[derive(Debug, Default)]
pub struct CommonSubexpressionElimination;

impl CommonSubexpressionElimination {
    pub fn new() -> Self {
        Self
    }
}

impl FunctionTransform for CommonSubexpressionElimination {
    fn name(&self) -> &'static str {
        "CommonSubexpressionElimination"
    }

    fn run(&self, function: &mut Function, _summaries: &FunctionSummaries) -> bool {
        let Some(entry) = function.entry() else {
            return false;
        };
        let dominance = function.analysis::<DominanceAnalysis>();
        let mut scopes: Vec<HashMap<String, InstId>> = Vec::new();
        visit(function, &dominance, entry, &mut scopes)
    }
}

fn visit(
    function: &mut Function,
    dominance: &Dominance,
    block: BlockId,
    scopes: &mut Vec<HashMap<String, InstId>>,
) -> bool {
    let mut changed = false;
    scopes.push(HashMap::new());

    for id in function.block(block).instructions().to_vec() {
        let Some(key) = value_number_key(function, id) else {
            continue;
        };
        let representative = scopes.iter().rev().find_map(|scope| scope.get(&key).copied());
        match representative {
            Some(representative) => {
                function.replace_all_uses(
                    Definition::Instruction(id),
                    &Use::Def(Definition::Instruction(representative)),
                );
                function.remove_instruction(id);
                changed = true;
            }
            None => {
                scopes
                    .last_mut()
                    .expect("scope pushed above")
                    .insert(key, id);
            }
        }
    }

    for child in dominance.children_of(block).to_vec() {
        changed |= visit(function, dominance, child, scopes);
    }
    scopes.pop();
    changed
}

/// The canonical key of a keyed instruction, or `None` for opaque kinds.
fn value_number_key(function: &Function, id: InstId) -> Option<String> {
    match &function.instruction(id).kind {
        InstructionKind::BooleanBinary { op, lhs, rhs } => {
            let mut operands = [use_key(lhs), use_key(rhs)];
            operands.sort();
            Some(format!("{} {}, {}", op.mnemonic(), operands[0], operands[1]))
        }
        InstructionKind::Not(operand) => Some(format!("not {}", use_key(operand))),
        InstructionKind::Literal { literal, ty } => {
            Some(format!("literal {}: {}", literal_key(literal), ty))
        }
        InstructionKind::Extract { from, keys } => {
            Some(format!("extract {} from {}", keys_key(keys), use_key(from)))
        }
        InstructionKind::ElementPointer { pointer, keys } => Some(format!(
            "elementPointer {} at {}",
            use_key(pointer),
            keys_key(keys)
        )),
        _ => None,
    }
}

fn use_key(u: &Use) -> String {
    match u {
        Use::Def(Definition::Instruction(id)) => format!("%i{}", id.0),
        Use::Def(Definition::Argument(block, index)) => format!("%a{}.{}", block.0, index),
        Use::Def(Definition::Variable(id)) => format!("@v{}", id.0),
        Use::Def(Definition::Function(id)) => format!("@f{}", id.0),
        Use::Literal(ty, literal) => format!("({}: {})", literal_key(literal), ty),
    }
}

fn literal_key(literal: &Literal) -> String {
    match literal {
        Literal::Undefined => "undefined".into(),
        Literal::Null => "null".into(),
        Literal::Zero => "zero".into(),
        Literal::Bool(value) => value.to_string(),
        Literal::Tuple(elements) => {
            let body: Vec<String> = elements.iter().map(use_key).collect();
            format!("tuple({})", body.join(", "))
        }
        Literal::Struct(fields) => {
            let body: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("#{} = {}", name, use_key(value)))
                .collect();
            format!("struct({})", body.join(", "))
        }
        Literal::EnumCase(case, elements) => {
            let body: Vec<String> = elements.iter().map(use_key).collect();
            format!("?{}({})", case, body.join(", "))
        }
    }
}

fn keys_key(keys: &[ElementKey]) -> String {
    keys.iter()
        .map(|key| match key {
            ElementKey::Index(i) => i.to_string(),
            ElementKey::Name(name) => format!("#{}", name),
            ElementKey::Value(value) => use_key(value),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
