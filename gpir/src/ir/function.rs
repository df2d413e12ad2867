//! Functions, basic blocks, and block arguments.
//!
//! A function owns two arenas: one of basic blocks and one of instructions.
//! Ids index into the arenas and stay stable across removals (removed slots
//! are tombstoned); `block_order` carries the textual ordering. Every
//! mutation entry point invalidates the function's cached analyses.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::ir::instruction::{Instruction, InstructionKind};
use crate::ir::types::Type;
use crate::ir::value::{BlockId, Definition, InstId, Use};
use crate::pass::{FunctionAnalysis, PassManager};

/// A basic block parameter.
#[derive(Debug, Clone)]
pub struct Argument {
    pub name: String,
    pub ty: Type,
}

/// A basic block: a name, parameters, and an ordered instruction list.
#[derive(Debug)]
pub struct BasicBlock {
    pub name: String,
    arguments: Vec<Argument>,
    instructions: Vec<InstId>,
}

impl BasicBlock {
    fn new(name: String) -> Self {
        Self {
            name,
            arguments: Vec::new(),
            instructions: Vec::new(),
        }
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn instructions(&self) -> &[InstId] {
        &self.instructions
    }
}

/// Function attributes, printed in `[...]` lines before the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FunctionAttribute {
    Inline,
    /// Applications of a pure function may be dropped when unused.
    Pure,
}

impl FunctionAttribute {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            FunctionAttribute::Inline => "inline",
            FunctionAttribute::Pure => "pure",
        }
    }
}

/// Declarations have no body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    External,
}

/// A function definition or declaration.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub argument_types: Vec<Type>,
    pub return_type: Type,
    pub attributes: BTreeSet<FunctionAttribute>,
    pub declaration_kind: Option<DeclarationKind>,
    blocks: Vec<Option<BasicBlock>>,
    block_order: Vec<BlockId>,
    instructions: Vec<Option<Instruction>>,
    pass_manager: PassManager,
}

impl Function {
    pub fn new(name: impl Into<String>, argument_types: Vec<Type>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            argument_types,
            return_type,
            attributes: BTreeSet::new(),
            declaration_kind: None,
            blocks: Vec::new(),
            block_order: Vec::new(),
            instructions: Vec::new(),
            pass_manager: PassManager::new(),
        }
    }

    pub fn declaration(
        name: impl Into<String>,
        argument_types: Vec<Type>,
        return_type: Type,
    ) -> Self {
        let mut f = Self::new(name, argument_types, return_type);
        f.declaration_kind = Some(DeclarationKind::External);
        f
    }

    pub fn is_declaration(&self) -> bool {
        self.declaration_kind.is_some()
    }

    /// The function's own type.
    pub fn ty(&self) -> Type {
        Type::function(self.argument_types.clone(), self.return_type.clone())
    }

    // ---- blocks ----

    pub fn append_block(&mut self, name: impl Into<String>) -> BlockId {
        self.invalidate_pass_results();
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Some(BasicBlock::new(name.into())));
        self.block_order.push(id);
        id
    }

    pub fn append_block_argument(
        &mut self,
        block: BlockId,
        name: impl Into<String>,
        ty: Type,
    ) -> usize {
        self.invalidate_pass_results();
        let block = self.block_mut_raw(block);
        block.arguments.push(Argument {
            name: name.into(),
            ty,
        });
        block.arguments.len() - 1
    }

    /// Remove a block and every instruction it carries.
    pub fn remove_block(&mut self, id: BlockId) {
        self.invalidate_pass_results();
        let block = self.blocks[id.0 as usize].take().expect("block was removed");
        for inst in block.instructions {
            self.instructions[inst.0 as usize] = None;
        }
        self.block_order.retain(|&b| b != id);
    }

    /// Move a block to the end of the printed order.
    pub fn move_block_to_end(&mut self, id: BlockId) {
        self.invalidate_pass_results();
        self.block_order.retain(|&b| b != id);
        self.block_order.push(id);
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        self.blocks[id.0 as usize].as_ref().expect("block was removed")
    }

    pub fn block_exists(&self, id: BlockId) -> bool {
        self.blocks
            .get(id.0 as usize)
            .map_or(false, Option::is_some)
    }

    /// Blocks in printed order.
    pub fn block_order(&self) -> &[BlockId] {
        &self.block_order
    }

    pub fn entry(&self) -> Option<BlockId> {
        self.block_order.first().copied()
    }

    /// Position of `id` in the printed order.
    pub fn block_index(&self, id: BlockId) -> Option<usize> {
        self.block_order.iter().position(|&b| b == id)
    }

    pub fn block_named(&self, name: &str) -> Option<BlockId> {
        self.block_order
            .iter()
            .copied()
            .find(|&b| self.block(b).name == name)
    }

    fn block_mut_raw(&mut self, id: BlockId) -> &mut BasicBlock {
        self.blocks[id.0 as usize].as_mut().expect("block was removed")
    }

    // ---- instructions ----

    pub fn append_instruction(
        &mut self,
        block: BlockId,
        name: Option<String>,
        kind: InstructionKind,
    ) -> InstId {
        self.invalidate_pass_results();
        let id = InstId(self.instructions.len() as u32);
        self.instructions.push(Some(Instruction {
            name,
            kind,
            parent: block,
        }));
        self.block_mut_raw(block).instructions.push(id);
        id
    }

    pub fn insert_instruction(
        &mut self,
        block: BlockId,
        index: usize,
        name: Option<String>,
        kind: InstructionKind,
    ) -> InstId {
        self.invalidate_pass_results();
        let id = InstId(self.instructions.len() as u32);
        self.instructions.push(Some(Instruction {
            name,
            kind,
            parent: block,
        }));
        self.block_mut_raw(block).instructions.insert(index, id);
        id
    }

    pub fn remove_instruction(&mut self, id: InstId) {
        self.invalidate_pass_results();
        let inst = self.instructions[id.0 as usize]
            .take()
            .expect("instruction was removed");
        self.block_mut_raw(inst.parent).instructions.retain(|&i| i != id);
    }

    pub fn replace_instruction_kind(&mut self, id: InstId, kind: InstructionKind) {
        self.invalidate_pass_results();
        self.instruction_mut_raw(id).kind = kind;
    }

    pub fn instruction(&self, id: InstId) -> &Instruction {
        self.instructions[id.0 as usize]
            .as_ref()
            .expect("instruction was removed")
    }

    pub fn is_instruction_live(&self, id: InstId) -> bool {
        self.instructions
            .get(id.0 as usize)
            .map_or(false, Option::is_some)
    }

    /// Size of the instruction arena, including tombstones.
    pub fn instruction_arena_len(&self) -> usize {
        self.instructions.len()
    }

    fn instruction_mut_raw(&mut self, id: InstId) -> &mut Instruction {
        self.instructions[id.0 as usize]
            .as_mut()
            .expect("instruction was removed")
    }

    /// Index of an instruction within its block's list.
    pub fn position_in_block(&self, id: InstId) -> Option<usize> {
        let parent = self.instruction(id).parent;
        self.block(parent).instructions.iter().position(|&i| i == id)
    }

    /// Every live instruction, in block order then block position.
    pub fn ordered_instructions(&self) -> Vec<InstId> {
        self.block_order
            .iter()
            .flat_map(|&b| self.block(b).instructions.iter().copied())
            .collect()
    }

    /// The block's final instruction, when it is a terminator.
    pub fn terminator_of(&self, block: BlockId) -> Option<InstId> {
        let last = *self.block(block).instructions.last()?;
        self.instruction(last).kind.is_terminator().then_some(last)
    }

    pub fn successors_of(&self, block: BlockId) -> Vec<BlockId> {
        self.terminator_of(block)
            .map(|t| self.instruction(t).kind.successors())
            .unwrap_or_default()
    }

    /// Rewrite every use of `old` to `new` across the whole body. Returns
    /// the number of rewritten uses.
    pub fn replace_all_uses(&mut self, old: Definition, new: &Use) -> usize {
        let old_use = Use::Def(old);
        let mut count = 0;
        for slot in self.instructions.iter_mut().flatten() {
            count += slot.kind.substitute(&old_use, new);
        }
        if count > 0 {
            self.pass_manager.invalidate();
        }
        count
    }

    /// Find a named value (block argument or instruction result).
    pub fn definition_named(&self, name: &str) -> Option<Definition> {
        for &block in &self.block_order {
            for (i, arg) in self.block(block).arguments().iter().enumerate() {
                if arg.name == name {
                    return Some(Definition::Argument(block, i));
                }
            }
            for &inst in self.block(block).instructions() {
                if self.instruction(inst).name.as_deref() == Some(name) {
                    return Some(Definition::Instruction(inst));
                }
            }
        }
        None
    }

    // ---- pass results ----

    /// The cached result of analysis `A`, computing it on a miss. The same
    /// `Rc` is returned until the next mutation.
    pub fn analysis<A: FunctionAnalysis>(&self) -> Rc<A::Result> {
        if let Some(cached) = self.pass_manager.cached::<A, A::Result>() {
            return cached;
        }
        let result = Rc::new(A::run(self));
        self.pass_manager.insert::<A, A::Result>(result.clone());
        result
    }

    pub fn invalidate_pass_results(&self) {
        self.pass_manager.invalidate();
    }

    pub fn pass_manager(&self) -> &PassManager {
        &self.pass_manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::instruction::BooleanOp;
    use crate::ir::value::Definition;

    fn boolean_function() -> Function {
        let mut f = Function::new("f", vec![Type::Bool], Type::Bool);
        let entry = f.append_block("entry");
        f.append_block_argument(entry, "x", Type::Bool);
        f
    }

    #[test]
    fn test_block_and_instruction_linkage() {
        let mut f = boolean_function();
        let entry = f.entry().unwrap();
        let x = Use::Def(Definition::Argument(entry, 0));
        let a = f.append_instruction(
            entry,
            Some("a".into()),
            InstructionKind::BooleanBinary {
                op: BooleanOp::And,
                lhs: x.clone(),
                rhs: x.clone(),
            },
        );
        let ret = f.append_instruction(
            entry,
            None,
            InstructionKind::Return(Some(Use::Def(Definition::Instruction(a)))),
        );

        assert_eq!(f.block(entry).instructions(), &[a, ret]);
        assert_eq!(f.instruction(a).parent, entry);
        assert_eq!(f.position_in_block(ret), Some(1));
        assert_eq!(f.terminator_of(entry), Some(ret));
        assert_eq!(f.definition_named("a"), Some(Definition::Instruction(a)));
        assert_eq!(f.definition_named("x"), Some(Definition::Argument(entry, 0)));
    }

    #[test]
    fn test_remove_instruction_keeps_ids_stable() {
        let mut f = boolean_function();
        let entry = f.entry().unwrap();
        let x = Use::Def(Definition::Argument(entry, 0));
        let a = f.append_instruction(entry, None, InstructionKind::Not(x.clone()));
        let b = f.append_instruction(entry, None, InstructionKind::Not(x));
        f.remove_instruction(a);

        assert!(!f.is_instruction_live(a));
        assert!(f.is_instruction_live(b));
        assert_eq!(f.block(entry).instructions(), &[b]);
        assert_eq!(f.instruction(b).kind.opcode(), "not");
    }

    #[test]
    fn test_replace_all_uses() {
        let mut f = boolean_function();
        let entry = f.entry().unwrap();
        let x = Use::Def(Definition::Argument(entry, 0));
        let a = f.append_instruction(entry, None, InstructionKind::Not(x.clone()));
        let a_use = Use::Def(Definition::Instruction(a));
        f.append_instruction(
            entry,
            None,
            InstructionKind::BooleanBinary {
                op: BooleanOp::Or,
                lhs: a_use.clone(),
                rhs: a_use.clone(),
            },
        );

        let rewritten = f.replace_all_uses(Definition::Instruction(a), &x);
        assert_eq!(rewritten, 2);
    }

    #[test]
    fn test_block_reordering() {
        let mut f = Function::new("f", vec![], Type::void());
        let a = f.append_block("a");
        let b = f.append_block("b");
        let c = f.append_block("c");
        f.move_block_to_end(b);
        assert_eq!(f.block_order(), &[a, c, b]);
        assert_eq!(f.entry(), Some(a));

        f.remove_block(c);
        assert_eq!(f.block_order(), &[a, b]);
        assert!(!f.block_exists(c));
    }
}
