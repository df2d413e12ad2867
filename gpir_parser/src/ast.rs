//! The parser's syntax tree.
//!
//! A faithful shape of the text, with names still unresolved. Lowering
//! (`crate::lower`) turns this into a `gpir::Module`, which is where
//! forward references get resolved.

use crate::span::Span;

#[derive(Debug)]
pub struct AstModule {
    pub name: String,
    pub stage: String,
    pub stage_span: Span,
    pub enums: Vec<AstEnum>,
    pub structs: Vec<AstStruct>,
    pub aliases: Vec<AstAlias>,
    pub variables: Vec<AstVariable>,
    pub functions: Vec<AstFunction>,
}

#[derive(Debug)]
pub struct AstEnum {
    pub name: String,
    pub cases: Vec<(String, Vec<AstType>)>,
    pub span: Span,
}

#[derive(Debug)]
pub struct AstStruct {
    pub name: String,
    pub fields: Vec<(String, AstType)>,
    pub span: Span,
}

#[derive(Debug)]
pub struct AstAlias {
    pub name: String,
    /// `None` spells `opaque`.
    pub ty: Option<AstType>,
    pub span: Span,
}

#[derive(Debug)]
pub struct AstVariable {
    pub name: String,
    pub ty: AstType,
    pub span: Span,
}

#[derive(Debug)]
pub struct AstFunction {
    /// `[inline]`, `[pure]`.
    pub attributes: Vec<String>,
    pub is_extern: bool,
    pub name: String,
    pub argument_types: Vec<AstType>,
    pub return_type: AstType,
    pub blocks: Vec<AstBlock>,
    pub span: Span,
}

#[derive(Debug)]
pub struct AstBlock {
    pub name: String,
    pub parameters: Vec<(String, AstType)>,
    pub instructions: Vec<AstInstruction>,
    pub span: Span,
}

#[derive(Debug)]
pub struct AstInstruction {
    pub name: Option<String>,
    pub kind: AstInstructionKind,
    pub span: Span,
}

#[derive(Debug)]
pub enum AstType {
    Bool,
    Named(String, Span),
    Tuple(Vec<AstType>),
    Pointer(Box<AstType>),
    Function(Vec<AstType>, Box<AstType>),
}

#[derive(Debug)]
pub enum AstLiteral {
    Undefined,
    Null,
    Zero,
    Bool(bool),
    Tuple(Vec<AstUse>),
    Struct(Vec<(String, AstUse)>),
    EnumCase(String, Vec<AstUse>),
}

#[derive(Debug)]
pub struct AstUse {
    pub kind: AstUseKind,
    pub span: Span,
}

#[derive(Debug)]
pub enum AstUseKind {
    Literal(AstLiteral, AstType),
    /// `%name` (the printed type annotation is re-derived at lowering).
    Local(String),
    /// `@name`.
    Global(String),
}

#[derive(Debug)]
pub enum AstKey {
    Index(usize),
    Name(String),
    Value(AstUse),
}

/// Callee of an `apply`: a bare reference without a type annotation.
#[derive(Debug)]
pub struct AstCallee {
    pub kind: AstCalleeKind,
    pub span: Span,
}

#[derive(Debug)]
pub enum AstCalleeKind {
    Local(String),
    Global(String),
}

#[derive(Debug)]
pub enum AstInstructionKind {
    Builtin {
        opcode: String,
        operands: Vec<AstUse>,
    },
    Branch {
        target: String,
        arguments: Vec<AstUse>,
    },
    Conditional {
        condition: AstUse,
        then_target: String,
        then_arguments: Vec<AstUse>,
        else_target: String,
        else_arguments: Vec<AstUse>,
    },
    BranchEnum {
        subject: AstUse,
        cases: Vec<(String, String)>,
    },
    Return(Option<AstUse>),
    Literal {
        literal: AstLiteral,
        ty: AstType,
    },
    BooleanBinary {
        op: gpir::ir::BooleanOp,
        lhs: AstUse,
        rhs: AstUse,
    },
    Not(AstUse),
    Extract {
        keys: Vec<AstKey>,
        from: AstUse,
    },
    Insert {
        source: AstUse,
        destination: AstUse,
        keys: Vec<AstKey>,
    },
    Apply {
        callee: AstCallee,
        arguments: Vec<AstUse>,
    },
    Load(AstUse),
    Store {
        value: AstUse,
        pointer: AstUse,
    },
    ElementPointer {
        pointer: AstUse,
        keys: Vec<AstKey>,
    },
    Trap,
}
