//! The IR builder: a cursor over a module for well-formed construction.
//!
//! The builder keeps an insertion point (a function and one of its blocks)
//! and appends instructions there. It never verifies; staged, temporarily
//! ill-typed construction is allowed and caught by [`crate::verify`].

use std::rc::Rc;

use crate::ir::function::Function;
use crate::ir::instruction::{BooleanOp, InstructionKind};
use crate::ir::module::{Module, Variable};
use crate::ir::types::{EnumDecl, StructDecl, Type, TypeAlias};
use crate::ir::value::{BlockId, FuncId, InstId, Use, VarId};

/// Factory and insertion cursor for one module.
#[derive(Debug)]
pub struct Builder<'a> {
    module: &'a mut Module,
    point: Option<(FuncId, BlockId)>,
}

impl<'a> Builder<'a> {
    pub fn new(module: &'a mut Module) -> Self {
        Self {
            module,
            point: None,
        }
    }

    pub fn module(&self) -> &Module {
        self.module
    }

    // ---- declarations ----

    pub fn create_struct(&mut self, name: impl Into<String>) -> Rc<StructDecl> {
        let decl = StructDecl::new(name);
        self.module.add_struct(decl.clone());
        decl
    }

    pub fn create_enum(&mut self, name: impl Into<String>) -> Rc<EnumDecl> {
        let decl = EnumDecl::new(name);
        self.module.add_enum(decl.clone());
        decl
    }

    pub fn create_type_alias(
        &mut self,
        name: impl Into<String>,
        ty: Option<Type>,
    ) -> Rc<TypeAlias> {
        let alias = TypeAlias::new(name, ty);
        self.module.add_type_alias(alias.clone());
        alias
    }

    pub fn create_variable(&mut self, name: impl Into<String>, value_type: Type) -> VarId {
        self.module.add_variable(Variable {
            name: name.into(),
            value_type,
        })
    }

    pub fn create_function(
        &mut self,
        name: impl Into<String>,
        argument_types: Vec<Type>,
        return_type: Type,
    ) -> FuncId {
        self.module
            .add_function(Function::new(name, argument_types, return_type))
    }

    pub fn create_declaration(
        &mut self,
        name: impl Into<String>,
        argument_types: Vec<Type>,
        return_type: Type,
    ) -> FuncId {
        self.module
            .add_function(Function::declaration(name, argument_types, return_type))
    }

    /// Append a block with the given parameters and move the insertion
    /// point to its end.
    pub fn append_block(
        &mut self,
        function: FuncId,
        name: impl Into<String>,
        parameters: Vec<(String, Type)>,
    ) -> BlockId {
        let f = self.module.function_mut(function);
        let block = f.append_block(name);
        for (param, ty) in parameters {
            f.append_block_argument(block, param, ty);
        }
        self.point = Some((function, block));
        block
    }

    /// Move the insertion point to the end of `block`.
    pub fn move_to_end(&mut self, function: FuncId, block: BlockId) {
        self.point = Some((function, block));
    }

    pub fn insertion_point(&self) -> Option<(FuncId, BlockId)> {
        self.point
    }

    // ---- instruction construction ----

    /// Append `kind` at the insertion point. Panics when no insertion point
    /// has been set; that is a programmer error, not a verification issue.
    pub fn build(&mut self, kind: InstructionKind) -> InstId {
        self.build_impl(None, kind)
    }

    /// Append a named instruction at the insertion point.
    pub fn build_named(&mut self, name: impl Into<String>, kind: InstructionKind) -> InstId {
        self.build_impl(Some(name.into()), kind)
    }

    fn build_impl(&mut self, name: Option<String>, kind: InstructionKind) -> InstId {
        let (function, block) = self.point.expect("builder has no insertion point");
        self.module
            .function_mut(function)
            .append_instruction(block, name, kind)
    }

    pub fn boolean(&mut self, op: BooleanOp, lhs: Use, rhs: Use) -> InstId {
        self.build(InstructionKind::BooleanBinary { op, lhs, rhs })
    }

    pub fn not(&mut self, operand: Use) -> InstId {
        self.build(InstructionKind::Not(operand))
    }

    pub fn literal(&mut self, literal: crate::ir::value::Literal, ty: Type) -> InstId {
        self.build(InstructionKind::Literal { literal, ty })
    }

    pub fn branch(&mut self, target: BlockId, arguments: Vec<Use>) -> InstId {
        self.build(InstructionKind::Branch { target, arguments })
    }

    pub fn conditional(
        &mut self,
        condition: Use,
        then_target: BlockId,
        then_arguments: Vec<Use>,
        else_target: BlockId,
        else_arguments: Vec<Use>,
    ) -> InstId {
        self.build(InstructionKind::Conditional {
            condition,
            then_target,
            then_arguments,
            else_target,
            else_arguments,
        })
    }

    pub fn ret(&mut self, value: Option<Use>) -> InstId {
        self.build(InstructionKind::Return(value))
    }

    pub fn apply(&mut self, callee: Use, arguments: Vec<Use>) -> InstId {
        self.build(InstructionKind::Apply { callee, arguments })
    }
}
