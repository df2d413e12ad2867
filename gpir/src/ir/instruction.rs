//! Instruction kinds, operand iteration, substitution, and type inference.

use crate::ir::function::Function;
use crate::ir::intrinsics::registry;
use crate::ir::module::Module;
use crate::ir::types::Type;
use crate::ir::value::{BlockId, Definition, ElementKey, FuncId, Literal, Use};

/// The two boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BooleanOp {
    And,
    Or,
}

impl BooleanOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BooleanOp::And => "and",
            BooleanOp::Or => "or",
        }
    }
}

/// The closed set of instruction kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    Builtin {
        opcode: String,
        operands: Vec<Use>,
    },
    Branch {
        target: BlockId,
        arguments: Vec<Use>,
    },
    Conditional {
        condition: Use,
        then_target: BlockId,
        then_arguments: Vec<Use>,
        else_target: BlockId,
        else_arguments: Vec<Use>,
    },
    BranchEnum {
        subject: Use,
        cases: Vec<(String, BlockId)>,
    },
    Return(Option<Use>),
    Literal {
        literal: Literal,
        ty: Type,
    },
    BooleanBinary {
        op: BooleanOp,
        lhs: Use,
        rhs: Use,
    },
    Not(Use),
    Extract {
        from: Use,
        keys: Vec<ElementKey>,
    },
    Insert {
        source: Use,
        destination: Use,
        keys: Vec<ElementKey>,
    },
    Apply {
        callee: Use,
        arguments: Vec<Use>,
    },
    Load(Use),
    Store {
        value: Use,
        pointer: Use,
    },
    ElementPointer {
        pointer: Use,
        keys: Vec<ElementKey>,
    },
    Trap,
}

fn visit_use<'a, F>(u: &'a Use, f: &mut F)
where
    F: FnMut(&'a Use),
{
    f(u);
    if let Use::Literal(_, literal) = u {
        visit_literal(literal, f);
    }
}

fn visit_literal<'a, F>(literal: &'a Literal, f: &mut F)
where
    F: FnMut(&'a Use),
{
    match literal {
        Literal::Tuple(elements) | Literal::EnumCase(_, elements) => {
            for u in elements {
                visit_use(u, f);
            }
        }
        Literal::Struct(fields) => {
            for (_, u) in fields {
                visit_use(u, f);
            }
        }
        Literal::Undefined | Literal::Null | Literal::Zero | Literal::Bool(_) => {}
    }
}

fn visit_key<'a, F>(key: &'a ElementKey, f: &mut F)
where
    F: FnMut(&'a Use),
{
    if let ElementKey::Value(u) = key {
        visit_use(u, f);
    }
}

// Mutable mirror of the walkers above. The closure returns `true` when it
// replaced the use, in which case its children are the replacement's and
// must not be walked.
fn visit_use_mut<F>(u: &mut Use, f: &mut F)
where
    F: FnMut(&mut Use) -> bool,
{
    if f(u) {
        return;
    }
    if let Use::Literal(_, literal) = u {
        visit_literal_mut(literal, f);
    }
}

fn visit_literal_mut<F>(literal: &mut Literal, f: &mut F)
where
    F: FnMut(&mut Use) -> bool,
{
    match literal {
        Literal::Tuple(elements) | Literal::EnumCase(_, elements) => {
            for u in elements {
                visit_use_mut(u, f);
            }
        }
        Literal::Struct(fields) => {
            for (_, u) in fields {
                visit_use_mut(u, f);
            }
        }
        Literal::Undefined | Literal::Null | Literal::Zero | Literal::Bool(_) => {}
    }
}

fn visit_key_mut<F>(key: &mut ElementKey, f: &mut F)
where
    F: FnMut(&mut Use) -> bool,
{
    if let ElementKey::Value(u) = key {
        visit_use_mut(u, f);
    }
}

impl InstructionKind {
    /// The mnemonic used in the textual form and in value-numbering keys.
    pub fn opcode(&self) -> &'static str {
        match self {
            InstructionKind::Builtin { .. } => "builtin",
            InstructionKind::Branch { .. } => "branch",
            InstructionKind::Conditional { .. } => "conditional",
            InstructionKind::BranchEnum { .. } => "branchEnum",
            InstructionKind::Return(_) => "return",
            InstructionKind::Literal { .. } => "literal",
            InstructionKind::BooleanBinary { op, .. } => op.mnemonic(),
            InstructionKind::Not(_) => "not",
            InstructionKind::Extract { .. } => "extract",
            InstructionKind::Insert { .. } => "insert",
            InstructionKind::Apply { .. } => "apply",
            InstructionKind::Load(_) => "load",
            InstructionKind::Store { .. } => "store",
            InstructionKind::ElementPointer { .. } => "elementPointer",
            InstructionKind::Trap => "trap",
        }
    }

    /// Terminators end a block and appear nowhere else. `trap` is not a
    /// terminator: it is an impure void instruction.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstructionKind::Branch { .. }
                | InstructionKind::Conditional { .. }
                | InstructionKind::BranchEnum { .. }
                | InstructionKind::Return(_)
        )
    }

    /// Successor blocks named by this instruction, in lexical order.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            InstructionKind::Branch { target, .. } => vec![*target],
            InstructionKind::Conditional {
                then_target,
                else_target,
                ..
            } => vec![*then_target, *else_target],
            InstructionKind::BranchEnum { cases, .. } => {
                cases.iter().map(|(_, target)| *target).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Visit every `Use` embedded in this kind, including uses nested in
    /// literal payloads and in `ElementKey::Value` keys.
    pub fn for_each_use<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(&'a Use),
    {
        let f = &mut f;
        match self {
            InstructionKind::Builtin { operands, .. } => {
                for u in operands {
                    visit_use(u, f);
                }
            }
            InstructionKind::Branch { arguments, .. } => {
                for u in arguments {
                    visit_use(u, f);
                }
            }
            InstructionKind::Conditional {
                condition,
                then_arguments,
                else_arguments,
                ..
            } => {
                visit_use(condition, f);
                for u in then_arguments.iter().chain(else_arguments) {
                    visit_use(u, f);
                }
            }
            InstructionKind::BranchEnum { subject, .. } => visit_use(subject, f),
            InstructionKind::Return(value) => {
                if let Some(u) = value {
                    visit_use(u, f);
                }
            }
            InstructionKind::Literal { literal, .. } => visit_literal(literal, f),
            InstructionKind::BooleanBinary { lhs, rhs, .. } => {
                visit_use(lhs, f);
                visit_use(rhs, f);
            }
            InstructionKind::Not(operand) => visit_use(operand, f),
            InstructionKind::Extract { from, keys } => {
                visit_use(from, f);
                for key in keys {
                    visit_key(key, f);
                }
            }
            InstructionKind::Insert {
                source,
                destination,
                keys,
            } => {
                visit_use(source, f);
                visit_use(destination, f);
                for key in keys {
                    visit_key(key, f);
                }
            }
            InstructionKind::Apply { callee, arguments } => {
                visit_use(callee, f);
                for u in arguments {
                    visit_use(u, f);
                }
            }
            InstructionKind::Load(pointer) => visit_use(pointer, f),
            InstructionKind::Store { value, pointer } => {
                visit_use(value, f);
                visit_use(pointer, f);
            }
            InstructionKind::ElementPointer { pointer, keys } => {
                visit_use(pointer, f);
                for key in keys {
                    visit_key(key, f);
                }
            }
            InstructionKind::Trap => {}
        }
    }

    /// Mutable counterpart of [`for_each_use`]. The closure returns `true`
    /// when it replaced the use (children are then skipped).
    pub fn for_each_use_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Use) -> bool,
    {
        let f = &mut f;
        match self {
            InstructionKind::Builtin { operands, .. } => {
                for u in operands {
                    visit_use_mut(u, f);
                }
            }
            InstructionKind::Branch { arguments, .. } => {
                for u in arguments {
                    visit_use_mut(u, f);
                }
            }
            InstructionKind::Conditional {
                condition,
                then_arguments,
                else_arguments,
                ..
            } => {
                visit_use_mut(condition, f);
                for u in then_arguments.iter_mut().chain(else_arguments) {
                    visit_use_mut(u, f);
                }
            }
            InstructionKind::BranchEnum { subject, .. } => visit_use_mut(subject, f),
            InstructionKind::Return(value) => {
                if let Some(u) = value {
                    visit_use_mut(u, f);
                }
            }
            InstructionKind::Literal { literal, .. } => visit_literal_mut(literal, f),
            InstructionKind::BooleanBinary { lhs, rhs, .. } => {
                visit_use_mut(lhs, f);
                visit_use_mut(rhs, f);
            }
            InstructionKind::Not(operand) => visit_use_mut(operand, f),
            InstructionKind::Extract { from, keys } => {
                visit_use_mut(from, f);
                for key in keys {
                    visit_key_mut(key, f);
                }
            }
            InstructionKind::Insert {
                source,
                destination,
                keys,
            } => {
                visit_use_mut(source, f);
                visit_use_mut(destination, f);
                for key in keys {
                    visit_key_mut(key, f);
                }
            }
            InstructionKind::Apply { callee, arguments } => {
                visit_use_mut(callee, f);
                for u in arguments {
                    visit_use_mut(u, f);
                }
            }
            InstructionKind::Load(pointer) => visit_use_mut(pointer, f),
            InstructionKind::Store { value, pointer } => {
                visit_use_mut(value, f);
                visit_use_mut(pointer, f);
            }
            InstructionKind::ElementPointer { pointer, keys } => {
                visit_use_mut(pointer, f);
                for key in keys {
                    visit_key_mut(key, f);
                }
            }
            InstructionKind::Trap => {}
        }
    }

    /// Collect every embedded use.
    pub fn uses(&self) -> Vec<&Use> {
        let mut out = Vec::new();
        self.for_each_use(|u| out.push(u));
        out
    }

    /// Replace every use equal to `old` with `new`. Returns the number of
    /// replacements.
    pub fn substitute(&mut self, old: &Use, new: &Use) -> usize {
        let mut count = 0;
        self.for_each_use_mut(|u| {
            if u == old {
                *u = new.clone();
                count += 1;
                true
            } else {
                false
            }
        });
        count
    }

    /// The type this instruction produces, determined solely by its kind and
    /// operand types. Ill-typed combinations infer `Invalid`; the verifier
    /// turns those into diagnostics.
    pub fn infer_type(&self, function: &Function, module: &Module) -> Type {
        match self {
            InstructionKind::Literal { ty, .. } => ty.clone(),
            InstructionKind::BooleanBinary { .. } | InstructionKind::Not(_) => Type::Bool,
            InstructionKind::Apply { callee, arguments } => {
                match callee.ty(function, module).canonical() {
                    Type::Function(parameters, ret) => {
                        let conforms = arguments.len() == parameters.len()
                            && arguments
                                .iter()
                                .zip(&parameters)
                                .all(|(a, p)| a.ty(function, module) == *p);
                        if conforms {
                            *ret
                        } else {
                            Type::Invalid
                        }
                    }
                    _ => Type::Invalid,
                }
            }
            InstructionKind::Extract { from, keys } => from
                .ty(function, module)
                .element_type(keys)
                .unwrap_or(Type::Invalid),
            InstructionKind::Insert {
                source,
                destination,
                keys,
            } => {
                let destination_ty = destination.ty(function, module);
                match destination_ty.element_type(keys) {
                    Some(element) if element == source.ty(function, module) => destination_ty,
                    _ => Type::Invalid,
                }
            }
            InstructionKind::Load(pointer) => match pointer.ty(function, module).canonical() {
                Type::Pointer(pointee) => *pointee,
                _ => Type::Invalid,
            },
            InstructionKind::ElementPointer { pointer, keys } => {
                match pointer.ty(function, module).canonical() {
                    Type::Pointer(pointee) => match pointee.element_type(keys) {
                        Some(element) => Type::pointer(element),
                        None => Type::Invalid,
                    },
                    _ => Type::Invalid,
                }
            }
            InstructionKind::Builtin { opcode, operands } => match registry().get(opcode) {
                Some(intrinsic) => {
                    let conforms = operands.len() == intrinsic.parameter_types.len()
                        && operands
                            .iter()
                            .zip(&intrinsic.parameter_types)
                            .all(|(o, p)| o.ty(function, module) == *p);
                    if conforms {
                        intrinsic.result_type.clone()
                    } else {
                        Type::Invalid
                    }
                }
                None => Type::Invalid,
            },
            InstructionKind::Branch { .. }
            | InstructionKind::Conditional { .. }
            | InstructionKind::BranchEnum { .. }
            | InstructionKind::Return(_)
            | InstructionKind::Store { .. }
            | InstructionKind::Trap => Type::void(),
        }
    }

    /// Whether this kind has no side effects. `callee_is_pure` answers for
    /// direct `apply` callees; everything else is decided by the kind (and
    /// the intrinsic registry for `builtin`).
    pub fn is_pure<F>(&self, callee_is_pure: F) -> bool
    where
        F: Fn(FuncId) -> bool,
    {
        match self {
            InstructionKind::Literal { .. }
            | InstructionKind::BooleanBinary { .. }
            | InstructionKind::Not(_)
            | InstructionKind::Extract { .. }
            | InstructionKind::Insert { .. }
            | InstructionKind::ElementPointer { .. } => true,
            InstructionKind::Builtin { opcode, .. } => registry()
                .get(opcode)
                .map_or(false, |intrinsic| intrinsic.is_pure),
            InstructionKind::Apply {
                callee: Use::Def(Definition::Function(id)),
                ..
            } => callee_is_pure(*id),
            _ => false,
        }
    }
}

/// An instruction: an optional result name, a kind, and the block that
/// carries it.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub name: Option<String>,
    pub kind: InstructionKind,
    pub parent: BlockId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::value::InstId;

    fn inst_use(id: u32) -> Use {
        Use::Def(Definition::Instruction(InstId(id)))
    }

    #[test]
    fn test_terminator_classification() {
        assert!(InstructionKind::Return(None).is_terminator());
        assert!(InstructionKind::Branch {
            target: BlockId(0),
            arguments: vec![],
        }
        .is_terminator());
        assert!(!InstructionKind::Trap.is_terminator());
        assert!(!InstructionKind::Not(Use::bool_literal(true)).is_terminator());
    }

    #[test]
    fn test_successors() {
        let cond = InstructionKind::Conditional {
            condition: Use::bool_literal(true),
            then_target: BlockId(1),
            then_arguments: vec![],
            else_target: BlockId(2),
            else_arguments: vec![],
        };
        assert_eq!(cond.successors(), vec![BlockId(1), BlockId(2)]);
        assert!(InstructionKind::Return(None).successors().is_empty());
    }

    #[test]
    fn test_for_each_use_walks_nested_literals() {
        let kind = InstructionKind::Literal {
            literal: Literal::Struct(vec![
                ("a".into(), inst_use(1)),
                (
                    "b".into(),
                    Use::Literal(
                        Type::Tuple(vec![Type::Bool]),
                        Literal::Tuple(vec![inst_use(2)]),
                    ),
                ),
            ]),
            ty: Type::Invalid,
        };
        let mut seen = Vec::new();
        kind.for_each_use(|u| {
            if let Some(Definition::Instruction(id)) = u.as_definition() {
                seen.push(id.0);
            }
        });
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_substitute_replaces_all_occurrences() {
        let mut kind = InstructionKind::BooleanBinary {
            op: BooleanOp::And,
            lhs: inst_use(1),
            rhs: inst_use(1),
        };
        let replaced = kind.substitute(&inst_use(1), &inst_use(7));
        assert_eq!(replaced, 2);
        assert_eq!(
            kind,
            InstructionKind::BooleanBinary {
                op: BooleanOp::And,
                lhs: inst_use(7),
                rhs: inst_use(7),
            }
        );
    }

    #[test]
    fn test_substitute_reaches_element_keys() {
        let mut kind = InstructionKind::ElementPointer {
            pointer: inst_use(1),
            keys: vec![ElementKey::Value(inst_use(2)), ElementKey::Index(0)],
        };
        assert_eq!(kind.substitute(&inst_use(2), &inst_use(9)), 1);
        assert_eq!(
            kind,
            InstructionKind::ElementPointer {
                pointer: inst_use(1),
                keys: vec![ElementKey::Value(inst_use(9)), ElementKey::Index(0)],
            }
        );
    }

    #[test]
    fn test_purity_policy() {
        assert!(InstructionKind::Not(Use::bool_literal(true)).is_pure(|_| false));
        assert!(InstructionKind::Builtin {
            opcode: "bool.xor".into(),
            operands: vec![],
        }
        .is_pure(|_| false));
        assert!(!InstructionKind::Builtin {
            opcode: "debug.print".into(),
            operands: vec![],
        }
        .is_pure(|_| false));
        assert!(!InstructionKind::Trap.is_pure(|_| false));
        assert!(!InstructionKind::Load(Use::bool_literal(true)).is_pure(|_| false));

        let apply = InstructionKind::Apply {
            callee: Use::Def(Definition::Function(FuncId(0))),
            arguments: vec![],
        };
        assert!(!apply.is_pure(|_| false));
        assert!(apply.is_pure(|_| true));
    }
}
