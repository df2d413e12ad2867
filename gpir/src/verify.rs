//! The verifier: enforces every structural and typing invariant.
//!
//! Verification is fail-fast and top-down: module-level names first, then
//! each function, its blocks, and each instruction. Errors carry the
//! printed name of the offending node and the relevant types.

use std::collections::HashSet;

use thiserror::Error;

use crate::analysis::dominance::DominanceAnalysis;
use crate::analysis::symbols::ModuleSymbolsAnalysis;
use crate::ident::is_identifier;
use crate::ir::function::Function;
use crate::ir::instruction::InstructionKind;
use crate::ir::intrinsics::registry;
use crate::ir::module::Module;
use crate::ir::types::Type;
use crate::ir::value::{BlockId, Definition, InstId, Literal, Use};

/// Everything the verifier can reject.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VerifierError {
    // Structural
    #[error("block '{block}' of @{function} has no terminator")]
    MissingTerminator { function: String, block: String },
    #[error("terminator is not the last instruction of block '{block}' in @{function}")]
    TerminatorNotLast { function: String, block: String },
    #[error("function @{function} has no entry block")]
    NoEntry { function: String },
    #[error("function @{function} has no exit block")]
    NoExit { function: String },
    #[error("function @{function} has multiple exit blocks")]
    MultipleExits { function: String },
    #[error("name '{name}' redeclared in the {namespace} name space")]
    Redeclared { name: String, namespace: String },
    #[error("illegal name '{name}'")]
    IllegalName { name: String },
    #[error("declaration @{function} cannot have a body")]
    DeclarationCannotHaveBody { function: String },
    #[error("instruction {instruction} is not linked into its parent block in @{function}")]
    InstructionParentMismatch {
        function: String,
        instruction: String,
    },
    #[error("branch target of {instruction} is not a block of @{function}")]
    BasicBlockParentMismatch {
        function: String,
        instruction: String,
    },
    #[error("named value '{name}' has void type")]
    NamedVoidValue { name: String },

    // Typing
    #[error("invalid type in {context}")]
    InvalidType { context: String },
    #[error("type mismatch in {context}: expected {expected}, found {actual}")]
    TypeMismatch {
        context: String,
        expected: String,
        actual: String,
    },
    #[error("unexpected type {actual} in {context}")]
    UnexpectedType { context: String, actual: String },
    #[error("operand of {context} has type {actual}, expected {expected}")]
    UseTypeMismatch {
        context: String,
        expected: String,
        actual: String,
    },
    #[error("operand of {context} has type {actual}, expected bool")]
    NotBool { context: String, actual: String },
    #[error("operand of {context} has type {actual}, expected a pointer")]
    NotPointer { context: String, actual: String },
    #[error("operand of {context} has type {actual}, expected an enum")]
    NotEnum { context: String, actual: String },
    #[error("callee of {context} has type {actual}, expected a function")]
    NotFunction { context: String, actual: String },
    #[error("operand of {context} has type {actual}, expected a tuple")]
    NotTuple { context: String, actual: String },

    // Linking
    #[error("operand {def} of {user} does not dominate it in @{function}")]
    UseBeforeDef {
        function: String,
        user: String,
        def: String,
    },
    #[error("operand of {user} does not belong to @{function}")]
    UseInvalidParent { function: String, user: String },
    #[error("argument mismatch applying {callee} in {context}")]
    FunctionArgumentMismatch { callee: String, context: String },
    #[error("entry block arguments of @{function} do not match its argument types")]
    FunctionEntryArgumentMismatch { function: String },
    #[error("arguments of {context} do not match parameters of block '{block}'")]
    BasicBlockArgumentMismatch { context: String, block: String },
    #[error("return in @{function} has type {actual}, expected {expected}")]
    ReturnTypeMismatch {
        function: String,
        expected: String,
        actual: String,
    },

    // Kind-specific
    #[error("invalid element path in {context}")]
    InvalidIndices { context: String },
    #[error("missing element path in {context}")]
    MissingIndices { context: String },
    #[error("invalid element offset in {context}")]
    InvalidOffset { context: String },
    #[error("enum case '{case}' is not a case of ${enum_name}")]
    InvalidEnumCase { case: String, enum_name: String },
    #[error("case table of {context} does not cover ${enum_name} exactly once per case")]
    InvalidEnumCaseBranch { context: String, enum_name: String },
    #[error("unknown intrinsic \"{opcode}\"")]
    InvalidIntrinsic { opcode: String },
    #[error("literal does not conform to its declared type in {context}")]
    InvalidLiteral { context: String },
    #[error("duplicate field '{field}' in struct ${struct_name}")]
    DuplicateStructField { struct_name: String, field: String },
    #[error("duplicate case '{case}' in enum ${enum_name}")]
    DuplicateEnumCase { enum_name: String, case: String },
    #[error("composite literal outside a literal instruction in {context}")]
    NestedLiteralNotInLiteralInstruction { context: String },
}

pub type VerifyResult<T = ()> = Result<T, VerifierError>;

/// Verify a whole module.
pub fn verify_module(module: &Module) -> VerifyResult {
    check_identifier(&module.name)?;

    let symbols = module.analysis::<ModuleSymbolsAnalysis>();
    if let Some(name) = &symbols.duplicate_type {
        return Err(VerifierError::Redeclared {
            name: name.clone(),
            namespace: "type".into(),
        });
    }
    if let Some(name) = &symbols.duplicate_value {
        return Err(VerifierError::Redeclared {
            name: name.clone(),
            namespace: "value".into(),
        });
    }

    for decl in module.structs() {
        check_identifier(&decl.name)?;
        let mut seen = HashSet::new();
        for (field, ty) in decl.fields().iter() {
            check_identifier(field)?;
            if !seen.insert(field.clone()) {
                return Err(VerifierError::DuplicateStructField {
                    struct_name: decl.name.clone(),
                    field: field.clone(),
                });
            }
            if !ty.is_valid() {
                return Err(VerifierError::InvalidType {
                    context: format!("field #{} of ${}", field, decl.name),
                });
            }
        }
    }
    for decl in module.enums() {
        check_identifier(&decl.name)?;
        let mut seen = HashSet::new();
        for case in decl.cases().iter() {
            check_identifier(&case.name)?;
            if !seen.insert(case.name.clone()) {
                return Err(VerifierError::DuplicateEnumCase {
                    enum_name: decl.name.clone(),
                    case: case.name.clone(),
                });
            }
            for ty in &case.associated_types {
                if !ty.is_valid() {
                    return Err(VerifierError::InvalidType {
                        context: format!("case ?{} of ${}", case.name, decl.name),
                    });
                }
            }
        }
    }
    for alias in module.type_aliases() {
        check_identifier(&alias.name)?;
        if let Some(target) = alias.ty() {
            if !target.is_valid() {
                return Err(VerifierError::InvalidType {
                    context: format!("type alias ${}", alias.name),
                });
            }
        }
    }
    for variable in module.variables() {
        check_identifier(&variable.name)?;
        if !variable.value_type.is_valid() {
            return Err(VerifierError::InvalidType {
                context: format!("variable @{}", variable.name),
            });
        }
    }

    for function in module.functions() {
        verify_function(module, function)?;
    }
    Ok(())
}

/// Verify one function.
pub fn verify_function(module: &Module, function: &Function) -> VerifyResult {
    check_identifier(&function.name)?;
    for ty in function.argument_types.iter().chain([&function.return_type]) {
        if !ty.is_valid() {
            return Err(VerifierError::InvalidType {
                context: format!("signature of @{}", function.name),
            });
        }
    }

    if function.is_declaration() {
        if function.entry().is_some() {
            return Err(VerifierError::DeclarationCannotHaveBody {
                function: function.name.clone(),
            });
        }
        return Ok(());
    }

    let Some(entry) = function.entry() else {
        return Err(VerifierError::NoEntry {
            function: function.name.clone(),
        });
    };

    let entry_types: Vec<Type> = function
        .block(entry)
        .arguments()
        .iter()
        .map(|a| a.ty.clone())
        .collect();
    if entry_types != function.argument_types {
        return Err(VerifierError::FunctionEntryArgumentMismatch {
            function: function.name.clone(),
        });
    }

    check_names(function)?;
    check_terminators(function)?;

    let dominance = function.analysis::<DominanceAnalysis>();
    for id in function.ordered_instructions() {
        let context = describe(function, id);
        let kind = &function.instruction(id).kind;

        // Operand linkage: every referenced definition must exist here.
        let mut linkage: VerifyResult = Ok(());
        kind.for_each_use(|u| {
            if linkage.is_err() {
                return;
            }
            linkage = check_operand_parent(module, function, u, &context);
        });
        linkage?;

        // Dominance, for users in reachable blocks.
        let user_block = function.instruction(id).parent;
        if dominance.contains(user_block) {
            let mut scope: VerifyResult = Ok(());
            kind.for_each_use(|u| {
                if scope.is_err() {
                    return;
                }
                if let Some(def) = u.as_definition() {
                    if !dominance.properly_dominates_def(def, id, function) {
                        scope = Err(VerifierError::UseBeforeDef {
                            function: function.name.clone(),
                            user: context.clone(),
                            def: describe_def(module, function, def),
                        });
                    }
                }
            });
            scope?;
        }

        // Composite literals live only inside literal instructions.
        if !matches!(kind, InstructionKind::Literal { .. }) {
            let mut nested: VerifyResult = Ok(());
            kind.for_each_use(|u| {
                if nested.is_err() {
                    return;
                }
                if let Use::Literal(_, literal) = u {
                    if !literal.is_scalar() {
                        nested = Err(VerifierError::NestedLiteralNotInLiteralInstruction {
                            context: context.clone(),
                        });
                    }
                }
            });
            nested?;
        }

        check_kind(module, function, kind, &context)?;

        if let Some(name) = &function.instruction(id).name {
            if kind.infer_type(function, module).is_void() {
                return Err(VerifierError::NamedVoidValue { name: name.clone() });
            }
        }
    }
    Ok(())
}

/// Postcondition of CFG canonicalization: exactly one `return` block.
pub fn verify_single_exit(function: &Function) -> VerifyResult {
    let exits = function
        .block_order()
        .iter()
        .filter(|&&b| {
            function
                .terminator_of(b)
                .map_or(false, |t| matches!(function.instruction(t).kind, InstructionKind::Return(_)))
        })
        .count();
    match exits {
        0 => Err(VerifierError::NoExit {
            function: function.name.clone(),
        }),
        1 => Ok(()),
        _ => Err(VerifierError::MultipleExits {
            function: function.name.clone(),
        }),
    }
}

fn check_identifier(name: &str) -> VerifyResult {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(VerifierError::IllegalName {
            name: name.to_string(),
        })
    }
}

/// Block names and value names each live in one function-wide scope.
fn check_names(function: &Function) -> VerifyResult {
    let mut block_names = HashSet::new();
    let mut value_names = HashSet::new();
    for &block in function.block_order() {
        let block_data = function.block(block);
        check_identifier(&block_data.name)?;
        if !block_names.insert(block_data.name.clone()) {
            return Err(VerifierError::Redeclared {
                name: block_data.name.clone(),
                namespace: "block".into(),
            });
        }
        for argument in block_data.arguments() {
            check_identifier(&argument.name)?;
            if !value_names.insert(argument.name.clone()) {
                return Err(VerifierError::Redeclared {
                    name: argument.name.clone(),
                    namespace: "value".into(),
                });
            }
            if argument.ty.is_void() {
                return Err(VerifierError::NamedVoidValue {
                    name: argument.name.clone(),
                });
            }
        }
        for &inst in block_data.instructions() {
            if let Some(name) = &function.instruction(inst).name {
                check_identifier(name)?;
                if !value_names.insert(name.clone()) {
                    return Err(VerifierError::Redeclared {
                        name: name.clone(),
                        namespace: "value".into(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn check_terminators(function: &Function) -> VerifyResult {
    for &block in function.block_order() {
        let block_data = function.block(block);
        let insts = block_data.instructions();
        let Some((&last, rest)) = insts.split_last() else {
            return Err(VerifierError::MissingTerminator {
                function: function.name.clone(),
                block: block_data.name.clone(),
            });
        };
        for &inst in rest {
            if function.instruction(inst).kind.is_terminator() {
                return Err(VerifierError::TerminatorNotLast {
                    function: function.name.clone(),
                    block: block_data.name.clone(),
                });
            }
        }
        if !function.instruction(last).kind.is_terminator() {
            return Err(VerifierError::MissingTerminator {
                function: function.name.clone(),
                block: block_data.name.clone(),
            });
        }
    }
    Ok(())
}

fn check_operand_parent(
    module: &Module,
    function: &Function,
    u: &Use,
    context: &str,
) -> VerifyResult {
    let Some(def) = u.as_definition() else {
        return Ok(());
    };
    let invalid = || VerifierError::UseInvalidParent {
        function: function.name.clone(),
        user: context.to_string(),
    };
    match def {
        Definition::Argument(block, index) => {
            if !function.block_exists(block) || index >= function.block(block).arguments().len() {
                return Err(invalid());
            }
        }
        Definition::Instruction(id) => {
            if !function.is_instruction_live(id) {
                return Err(invalid());
            }
            if function.position_in_block(id).is_none() {
                return Err(VerifierError::InstructionParentMismatch {
                    function: function.name.clone(),
                    instruction: context.to_string(),
                });
            }
        }
        Definition::Variable(id) => {
            if id.0 as usize >= module.variables().len() {
                return Err(invalid());
            }
        }
        Definition::Function(id) => {
            if id.0 as usize >= module.functions().len() {
                return Err(invalid());
            }
        }
    }
    Ok(())
}

fn check_block_args(
    module: &Module,
    function: &Function,
    context: &str,
    target: BlockId,
    arguments: &[Use],
) -> VerifyResult {
    if !function.block_exists(target) {
        return Err(VerifierError::BasicBlockParentMismatch {
            function: function.name.clone(),
            instruction: context.to_string(),
        });
    }
    let block = function.block(target);
    if arguments.len() != block.arguments().len() {
        return Err(VerifierError::BasicBlockArgumentMismatch {
            context: context.to_string(),
            block: block.name.clone(),
        });
    }
    for (argument, parameter) in arguments.iter().zip(block.arguments()) {
        if argument.ty(function, module) != parameter.ty {
            return Err(VerifierError::BasicBlockArgumentMismatch {
                context: context.to_string(),
                block: block.name.clone(),
            });
        }
    }
    Ok(())
}

fn check_literal(
    module: &Module,
    function: &Function,
    literal: &Literal,
    ty: &Type,
    context: &str,
) -> VerifyResult {
    let conforms_err = || VerifierError::InvalidLiteral {
        context: context.to_string(),
    };
    match (literal, ty.canonical()) {
        (Literal::Undefined | Literal::Zero, _) => Ok(()),
        (Literal::Null, Type::Pointer(_) | Type::Function(_, _)) => Ok(()),
        (Literal::Null, _) => Err(conforms_err()),
        (Literal::Bool(_), Type::Bool) => Ok(()),
        (Literal::Bool(_), _) => Err(conforms_err()),
        (Literal::Tuple(elements), Type::Tuple(expected)) => {
            if elements.len() != expected.len() {
                return Err(conforms_err());
            }
            for (element, expected) in elements.iter().zip(&expected) {
                check_element(module, function, element, expected, context)?;
            }
            Ok(())
        }
        (Literal::Tuple(_), _) => Err(conforms_err()),
        (Literal::Struct(fields), Type::Struct(decl)) => {
            let declared = decl.fields();
            if fields.len() != declared.len() {
                return Err(conforms_err());
            }
            for ((name, value), (field, expected)) in fields.iter().zip(declared.iter()) {
                if name != field {
                    return Err(conforms_err());
                }
                check_element(module, function, value, expected, context)?;
            }
            Ok(())
        }
        (Literal::Struct(_), _) => Err(conforms_err()),
        (Literal::EnumCase(case, elements), Type::Enum(decl)) => {
            let Some(expected) = decl.case_types(case) else {
                return Err(VerifierError::InvalidEnumCase {
                    case: case.clone(),
                    enum_name: decl.name.clone(),
                });
            };
            if elements.len() != expected.len() {
                return Err(conforms_err());
            }
            for (element, expected) in elements.iter().zip(&expected) {
                check_element(module, function, element, expected, context)?;
            }
            Ok(())
        }
        (Literal::EnumCase(_, _), _) => Err(conforms_err()),
    }
}

fn check_element(
    module: &Module,
    function: &Function,
    element: &Use,
    expected: &Type,
    context: &str,
) -> VerifyResult {
    if element.ty(function, module) != *expected {
        return Err(VerifierError::InvalidLiteral {
            context: context.to_string(),
        });
    }
    if let Use::Literal(ty, literal) = element {
        check_literal(module, function, literal, ty, context)?;
    }
    Ok(())
}

fn check_kind(
    module: &Module,
    function: &Function,
    kind: &InstructionKind,
    context: &str,
) -> VerifyResult {
    let ty_of = |u: &Use| u.ty(function, module);
    match kind {
        InstructionKind::Literal { literal, ty } => {
            if !ty.is_valid() {
                return Err(VerifierError::InvalidType {
                    context: context.to_string(),
                });
            }
            check_literal(module, function, literal, ty, context)
        }
        InstructionKind::BooleanBinary { lhs, rhs, .. } => {
            for operand in [lhs, rhs] {
                let ty = ty_of(operand);
                if ty != Type::Bool {
                    return Err(VerifierError::NotBool {
                        context: context.to_string(),
                        actual: ty.to_string(),
                    });
                }
            }
            Ok(())
        }
        InstructionKind::Not(operand) => {
            let ty = ty_of(operand);
            if ty != Type::Bool {
                return Err(VerifierError::NotBool {
                    context: context.to_string(),
                    actual: ty.to_string(),
                });
            }
            Ok(())
        }
        InstructionKind::Branch { target, arguments } => {
            check_block_args(module, function, context, *target, arguments)
        }
        InstructionKind::Conditional {
            condition,
            then_target,
            then_arguments,
            else_target,
            else_arguments,
        } => {
            let ty = ty_of(condition);
            if ty != Type::Bool {
                return Err(VerifierError::NotBool {
                    context: context.to_string(),
                    actual: ty.to_string(),
                });
            }
            check_block_args(module, function, context, *then_target, then_arguments)?;
            check_block_args(module, function, context, *else_target, else_arguments)
        }
        InstructionKind::BranchEnum { subject, cases } => {
            let subject_ty = ty_of(subject);
            let Type::Enum(decl) = subject_ty.canonical() else {
                return Err(VerifierError::NotEnum {
                    context: context.to_string(),
                    actual: subject_ty.to_string(),
                });
            };
            let mut seen = HashSet::new();
            for (case, target) in cases {
                let Some(parameter_types) = decl.case_types(case) else {
                    return Err(VerifierError::InvalidEnumCase {
                        case: case.clone(),
                        enum_name: decl.name.clone(),
                    });
                };
                if !seen.insert(case.clone()) {
                    return Err(VerifierError::InvalidEnumCaseBranch {
                        context: context.to_string(),
                        enum_name: decl.name.clone(),
                    });
                }
                if !function.block_exists(*target) {
                    return Err(VerifierError::BasicBlockParentMismatch {
                        function: function.name.clone(),
                        instruction: context.to_string(),
                    });
                }
                let parameters = function.block(*target).arguments();
                let matches = parameters.len() == parameter_types.len()
                    && parameters
                        .iter()
                        .zip(&parameter_types)
                        .all(|(p, t)| p.ty == *t);
                if !matches {
                    return Err(VerifierError::BasicBlockArgumentMismatch {
                        context: context.to_string(),
                        block: function.block(*target).name.clone(),
                    });
                }
            }
            if seen.len() != decl.cases().len() {
                return Err(VerifierError::InvalidEnumCaseBranch {
                    context: context.to_string(),
                    enum_name: decl.name.clone(),
                });
            }
            Ok(())
        }
        InstructionKind::Return(value) => {
            let actual = match value {
                Some(u) => ty_of(u),
                None => Type::void(),
            };
            if actual != function.return_type {
                return Err(VerifierError::ReturnTypeMismatch {
                    function: function.name.clone(),
                    expected: function.return_type.to_string(),
                    actual: actual.to_string(),
                });
            }
            Ok(())
        }
        InstructionKind::Extract { from, keys } => {
            if keys.is_empty() {
                return Err(VerifierError::MissingIndices {
                    context: context.to_string(),
                });
            }
            if ty_of(from).element_type(keys).is_none() {
                return Err(VerifierError::InvalidIndices {
                    context: context.to_string(),
                });
            }
            Ok(())
        }
        InstructionKind::Insert {
            source,
            destination,
            keys,
        } => {
            if keys.is_empty() {
                return Err(VerifierError::MissingIndices {
                    context: context.to_string(),
                });
            }
            let Some(element) = ty_of(destination).element_type(keys) else {
                return Err(VerifierError::InvalidIndices {
                    context: context.to_string(),
                });
            };
            let source_ty = ty_of(source);
            if element != source_ty {
                return Err(VerifierError::TypeMismatch {
                    context: context.to_string(),
                    expected: element.to_string(),
                    actual: source_ty.to_string(),
                });
            }
            Ok(())
        }
        InstructionKind::Apply { callee, arguments } => {
            let callee_ty = ty_of(callee);
            let Type::Function(parameters, _) = callee_ty.canonical() else {
                return Err(VerifierError::NotFunction {
                    context: context.to_string(),
                    actual: callee_ty.to_string(),
                });
            };
            let conforms = arguments.len() == parameters.len()
                && arguments
                    .iter()
                    .zip(&parameters)
                    .all(|(a, p)| ty_of(a) == *p);
            if !conforms {
                return Err(VerifierError::FunctionArgumentMismatch {
                    callee: callee_ty.to_string(),
                    context: context.to_string(),
                });
            }
            Ok(())
        }
        InstructionKind::Load(pointer) => {
            let ty = ty_of(pointer);
            if !matches!(ty.canonical(), Type::Pointer(_)) {
                return Err(VerifierError::NotPointer {
                    context: context.to_string(),
                    actual: ty.to_string(),
                });
            }
            Ok(())
        }
        InstructionKind::Store { value, pointer } => {
            let pointer_ty = ty_of(pointer);
            let Type::Pointer(pointee) = pointer_ty.canonical() else {
                return Err(VerifierError::NotPointer {
                    context: context.to_string(),
                    actual: pointer_ty.to_string(),
                });
            };
            let value_ty = ty_of(value);
            if value_ty != *pointee {
                return Err(VerifierError::UseTypeMismatch {
                    context: context.to_string(),
                    expected: pointee.to_string(),
                    actual: value_ty.to_string(),
                });
            }
            Ok(())
        }
        InstructionKind::ElementPointer { pointer, keys } => {
            let pointer_ty = ty_of(pointer);
            let Type::Pointer(pointee) = pointer_ty.canonical() else {
                return Err(VerifierError::NotPointer {
                    context: context.to_string(),
                    actual: pointer_ty.to_string(),
                });
            };
            if keys.is_empty() {
                return Err(VerifierError::MissingIndices {
                    context: context.to_string(),
                });
            }
            if pointee.element_type(keys).is_none() {
                return Err(VerifierError::InvalidOffset {
                    context: context.to_string(),
                });
            }
            Ok(())
        }
        InstructionKind::Builtin { opcode, operands } => {
            let registry = registry();
            let Some(intrinsic) = registry.get(opcode) else {
                return Err(VerifierError::InvalidIntrinsic {
                    opcode: opcode.clone(),
                });
            };
            if operands.len() != intrinsic.parameter_types.len() {
                return Err(VerifierError::UseTypeMismatch {
                    context: context.to_string(),
                    expected: format!("{} operands", intrinsic.parameter_types.len()),
                    actual: format!("{} operands", operands.len()),
                });
            }
            for (operand, parameter) in operands.iter().zip(&intrinsic.parameter_types) {
                let ty = ty_of(operand);
                if ty != *parameter {
                    return Err(VerifierError::UseTypeMismatch {
                        context: context.to_string(),
                        expected: parameter.to_string(),
                        actual: ty.to_string(),
                    });
                }
            }
            Ok(())
        }
        InstructionKind::Trap => Ok(()),
    }
}

fn describe(function: &Function, id: InstId) -> String {
    let inst = function.instruction(id);
    match &inst.name {
        Some(name) => format!("%{}", name),
        None => format!(
            "{} in '{}'",
            inst.kind.opcode(),
            function.block(inst.parent).name
        ),
    }
}

fn describe_def(module: &Module, function: &Function, def: Definition) -> String {
    match def {
        Definition::Argument(block, index) => {
            format!("%{}", function.block(block).arguments()[index].name)
        }
        Definition::Instruction(id) => describe(function, id),
        Definition::Variable(id) => format!("@{}", module.variable(id).name),
        Definition::Function(id) => format!("@{}", module.function(id).name),
    }
}
