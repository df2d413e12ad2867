//! The in-memory IR: types, values, instructions, structure, construction,
//! and printing.
//!
//! # Module Organization
//!
//! - `types.rs`: the type algebra (canonicalization, element access, validity)
//! - `value.rs`: literals, uses, definitions, arena ids
//! - `intrinsics.rs`: the sealed intrinsic registry
//! - `instruction.rs`: instruction kinds, operand iteration, type inference
//! - `function.rs`: functions, basic blocks, block arguments
//! - `module.rs`: modules, globals, the stage tag
//! - `builder.rs`: insertion-point construction API
//! - `print.rs`: deterministic textual form

pub mod builder;
pub mod function;
pub mod instruction;
pub mod intrinsics;
pub mod module;
pub mod print;
pub mod types;
pub mod value;

pub use builder::Builder;
pub use function::{Argument, BasicBlock, DeclarationKind, Function, FunctionAttribute};
pub use instruction::{BooleanOp, Instruction, InstructionKind};
pub use module::{Module, Stage, Variable};
pub use print::{print_function, print_module};
pub use types::{EnumCase, EnumDecl, StructDecl, Type, TypeAlias};
pub use value::{BlockId, Definition, ElementKey, FuncId, InstId, Literal, Use, VarId};
