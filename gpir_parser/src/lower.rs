//! Lowering: syntax tree to `gpir::Module`.
//!
//! Runs in phases so forward references resolve: nominal type shells first,
//! then their payloads, then globals and function headers, then bodies.
//! Within a body, blocks and instruction ids are registered before any
//! operand is resolved, so branches and operands may point forward.

use std::collections::HashMap;

use gpir::ir::{
    BlockId, Definition, ElementKey, Function, FunctionAttribute, InstId, InstructionKind,
    Literal, Module, Stage, Type, Use, Variable,
};

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::span::Span;

/// Lower a parsed module.
pub fn lower_module(ast: &AstModule) -> ParseResult<Module> {
    let stage: Stage = ast.stage.parse().map_err(|_| ParseError::UnknownStage {
        name: ast.stage.clone(),
        span: ast.stage_span,
    })?;
    let mut module = Module::new(ast.name.clone(), stage);

    // Nominal shells, so payload types may refer to any declaration.
    let mut types: HashMap<String, Type> = HashMap::new();
    let mut declare = |name: &str, ty: Type, span| {
        if types.insert(name.to_string(), ty).is_some() {
            Err(ParseError::DuplicateDefinition {
                name: name.to_string(),
                span,
            })
        } else {
            Ok(())
        }
    };
    for decl in &ast.enums {
        let shell = gpir::ir::EnumDecl::new(decl.name.clone());
        declare(&decl.name, Type::Enum(shell.clone()), decl.span)?;
        module.add_enum(shell);
    }
    for decl in &ast.structs {
        let shell = gpir::ir::StructDecl::new(decl.name.clone());
        declare(&decl.name, Type::Struct(shell.clone()), decl.span)?;
        module.add_struct(shell);
    }
    for decl in &ast.aliases {
        let shell = gpir::ir::TypeAlias::new(decl.name.clone(), None);
        declare(&decl.name, Type::Alias(shell.clone()), decl.span)?;
        module.add_type_alias(shell);
    }

    // Payloads.
    for decl in &ast.enums {
        let shell = module.enum_named(&decl.name).expect("declared above");
        for (case, associated) in &decl.cases {
            let lowered: ParseResult<Vec<Type>> =
                associated.iter().map(|t| resolve_type(&types, t)).collect();
            shell.append_case(case.clone(), lowered?);
        }
    }
    for decl in &ast.structs {
        let shell = module.struct_named(&decl.name).expect("declared above");
        for (field, ty) in &decl.fields {
            shell.append_field(field.clone(), resolve_type(&types, ty)?);
        }
    }
    for decl in &ast.aliases {
        if let Some(target) = &decl.ty {
            let shell = module.alias_named(&decl.name).expect("declared above");
            shell.set_type(resolve_type(&types, target)?);
        }
    }

    // Globals and function headers.
    let mut value_names: HashMap<String, Span> = HashMap::new();
    let mut check_value_name = |name: &str, span: Span| {
        if value_names.insert(name.to_string(), span).is_some() {
            Err(ParseError::DuplicateDefinition {
                name: name.to_string(),
                span,
            })
        } else {
            Ok(())
        }
    };
    for decl in &ast.variables {
        check_value_name(&decl.name, decl.span)?;
        module.add_variable(Variable {
            name: decl.name.clone(),
            value_type: resolve_type(&types, &decl.ty)?,
        });
    }
    for decl in &ast.functions {
        check_value_name(&decl.name, decl.span)?;
        let argument_types: ParseResult<Vec<Type>> = decl
            .argument_types
            .iter()
            .map(|t| resolve_type(&types, t))
            .collect();
        let return_type = resolve_type(&types, &decl.return_type)?;
        let mut function = if decl.is_extern {
            Function::declaration(decl.name.clone(), argument_types?, return_type)
        } else {
            Function::new(decl.name.clone(), argument_types?, return_type)
        };
        for attribute in &decl.attributes {
            let parsed = match attribute.as_str() {
                "inline" => FunctionAttribute::Inline,
                "pure" => FunctionAttribute::Pure,
                other => {
                    return Err(ParseError::unexpected_token(
                        other,
                        "an attribute ('inline' or 'pure')",
                        decl.span,
                    ))
                }
            };
            function.attributes.insert(parsed);
        }
        module.add_function(function);
    }

    // Bodies.
    for decl in &ast.functions {
        if decl.blocks.is_empty() {
            continue;
        }
        let id = module.function_named(&decl.name).expect("declared above");
        lower_body(&mut module, id, decl, &types)?;
    }
    Ok(module)
}

fn resolve_type(types: &HashMap<String, Type>, ast: &AstType) -> ParseResult<Type> {
    match ast {
        AstType::Bool => Ok(Type::Bool),
        AstType::Named(name, span) => {
            types.get(name).cloned().ok_or_else(|| ParseError::UnknownType {
                name: name.clone(),
                span: *span,
            })
        }
        AstType::Tuple(elements) => {
            let lowered: ParseResult<Vec<Type>> =
                elements.iter().map(|t| resolve_type(types, t)).collect();
            Ok(Type::Tuple(lowered?))
        }
        AstType::Pointer(pointee) => Ok(Type::pointer(resolve_type(types, pointee)?)),
        AstType::Function(arguments, ret) => {
            let lowered: ParseResult<Vec<Type>> =
                arguments.iter().map(|t| resolve_type(types, t)).collect();
            Ok(Type::function(lowered?, resolve_type(types, ret)?))
        }
    }
}

/// Local name resolution state of one function body.
struct BodyScope {
    blocks: HashMap<String, BlockId>,
    values: HashMap<String, Definition>,
}

fn lower_body(
    module: &mut Module,
    id: gpir::ir::FuncId,
    ast: &AstFunction,
    types: &HashMap<String, Type>,
) -> ParseResult<()> {
    let mut scope = BodyScope {
        blocks: HashMap::new(),
        values: HashMap::new(),
    };

    // Blocks and parameters first.
    for block in &ast.blocks {
        let function = module.function_mut(id);
        let block_id = function.append_block(block.name.clone());
        if scope.blocks.insert(block.name.clone(), block_id).is_some() {
            return Err(ParseError::DuplicateDefinition {
                name: block.name.clone(),
                span: block.span,
            });
        }
        for (index, (parameter, ty)) in block.parameters.iter().enumerate() {
            let lowered = resolve_type(types, ty)?;
            module
                .function_mut(id)
                .append_block_argument(block_id, parameter.clone(), lowered);
            if scope
                .values
                .insert(parameter.clone(), Definition::Argument(block_id, index))
                .is_some()
            {
                return Err(ParseError::DuplicateDefinition {
                    name: parameter.clone(),
                    span: block.span,
                });
            }
        }
    }

    // Predict instruction ids so operands may reference forward.
    let mut next = module.function(id).instruction_arena_len() as u32;
    for (block_index, block) in ast.blocks.iter().enumerate() {
        for (inst_index, inst) in block.instructions.iter().enumerate() {
            let predicted = Definition::Instruction(InstId(next));
            next += 1;
            if let Some(name) = &inst.name {
                if scope.values.insert(name.clone(), predicted).is_some() {
                    return Err(ParseError::DuplicateDefinition {
                        name: name.clone(),
                        span: inst.span,
                    });
                }
            }
            let positional = format!("{}.{}", block_index, inst_index);
            scope.values.entry(positional).or_insert(predicted);
        }
    }

    // Lower and append, in the same order the ids were predicted.
    for block in &ast.blocks {
        let block_id = scope.blocks[&block.name];
        for inst in &block.instructions {
            let kind = lower_kind(module, &scope, types, &inst.kind)?;
            // A `%<digits>.<digits>` result is the printer's positional
            // spelling of an unnamed instruction, not a name.
            let name = inst.name.clone().filter(|n| {
                n.chars().next().map_or(false, |c| !c.is_ascii_digit())
            });
            module.function_mut(id).append_instruction(block_id, name, kind);
        }
    }
    Ok(())
}

fn lower_kind(
    module: &Module,
    scope: &BodyScope,
    types: &HashMap<String, Type>,
    ast: &AstInstructionKind,
) -> ParseResult<InstructionKind> {
    let block = |name: &String, span: Span| {
        scope
            .blocks
            .get(name)
            .copied()
            .ok_or_else(|| ParseError::UnknownBlock {
                name: name.clone(),
                span,
            })
    };
    Ok(match ast {
        AstInstructionKind::Builtin { opcode, operands } => InstructionKind::Builtin {
            opcode: opcode.clone(),
            operands: lower_uses(module, scope, types, operands)?,
        },
        AstInstructionKind::Branch { target, arguments } => InstructionKind::Branch {
            target: block(target, Span::default())?,
            arguments: lower_uses(module, scope, types, arguments)?,
        },
        AstInstructionKind::Conditional {
            condition,
            then_target,
            then_arguments,
            else_target,
            else_arguments,
        } => InstructionKind::Conditional {
            condition: lower_use(module, scope, types, condition)?,
            then_target: block(then_target, Span::default())?,
            then_arguments: lower_uses(module, scope, types, then_arguments)?,
            else_target: block(else_target, Span::default())?,
            else_arguments: lower_uses(module, scope, types, else_arguments)?,
        },
        AstInstructionKind::BranchEnum { subject, cases } => InstructionKind::BranchEnum {
            subject: lower_use(module, scope, types, subject)?,
            cases: cases
                .iter()
                .map(|(case, target)| Ok((case.clone(), block(target, Span::default())?)))
                .collect::<ParseResult<Vec<_>>>()?,
        },
        AstInstructionKind::Return(value) => InstructionKind::Return(match value {
            Some(u) => Some(lower_use(module, scope, types, u)?),
            None => None,
        }),
        AstInstructionKind::Literal { literal, ty } => InstructionKind::Literal {
            literal: lower_literal(module, scope, types, literal)?,
            ty: resolve_type(types, ty)?,
        },
        AstInstructionKind::BooleanBinary { op, lhs, rhs } => InstructionKind::BooleanBinary {
            op: *op,
            lhs: lower_use(module, scope, types, lhs)?,
            rhs: lower_use(module, scope, types, rhs)?,
        },
        AstInstructionKind::Not(operand) => {
            InstructionKind::Not(lower_use(module, scope, types, operand)?)
        }
        AstInstructionKind::Extract { keys, from } => InstructionKind::Extract {
            from: lower_use(module, scope, types, from)?,
            keys: lower_keys(module, scope, types, keys)?,
        },
        AstInstructionKind::Insert {
            source,
            destination,
            keys,
        } => InstructionKind::Insert {
            source: lower_use(module, scope, types, source)?,
            destination: lower_use(module, scope, types, destination)?,
            keys: lower_keys(module, scope, types, keys)?,
        },
        AstInstructionKind::Apply { callee, arguments } => {
            let callee_use = match &callee.kind {
                AstCalleeKind::Local(name) => Use::Def(lookup_local(scope, name, callee.span)?),
                AstCalleeKind::Global(name) => {
                    Use::Def(lookup_global(module, name, callee.span)?)
                }
            };
            InstructionKind::Apply {
                callee: callee_use,
                arguments: lower_uses(module, scope, types, arguments)?,
            }
        }
        AstInstructionKind::Load(pointer) => {
            InstructionKind::Load(lower_use(module, scope, types, pointer)?)
        }
        AstInstructionKind::Store { value, pointer } => InstructionKind::Store {
            value: lower_use(module, scope, types, value)?,
            pointer: lower_use(module, scope, types, pointer)?,
        },
        AstInstructionKind::ElementPointer { pointer, keys } => InstructionKind::ElementPointer {
            pointer: lower_use(module, scope, types, pointer)?,
            keys: lower_keys(module, scope, types, keys)?,
        },
        AstInstructionKind::Trap => InstructionKind::Trap,
    })
}

fn lookup_local(scope: &BodyScope, name: &str, span: Span) -> ParseResult<Definition> {
    scope
        .values
        .get(name)
        .copied()
        .ok_or_else(|| ParseError::UnknownValue {
            name: name.to_string(),
            span,
        })
}

fn lookup_global(module: &Module, name: &str, span: Span) -> ParseResult<Definition> {
    if let Some(id) = module.variable_named(name) {
        return Ok(Definition::Variable(id));
    }
    if let Some(id) = module.function_named(name) {
        return Ok(Definition::Function(id));
    }
    Err(ParseError::UnknownValue {
        name: name.to_string(),
        span,
    })
}

fn lower_use(
    module: &Module,
    scope: &BodyScope,
    types: &HashMap<String, Type>,
    ast: &AstUse,
) -> ParseResult<Use> {
    Ok(match &ast.kind {
        AstUseKind::Local(name) => Use::Def(lookup_local(scope, name, ast.span)?),
        AstUseKind::Global(name) => Use::Def(lookup_global(module, name, ast.span)?),
        AstUseKind::Literal(literal, ty) => Use::Literal(
            resolve_type(types, ty)?,
            lower_literal(module, scope, types, literal)?,
        ),
    })
}

fn lower_uses(
    module: &Module,
    scope: &BodyScope,
    types: &HashMap<String, Type>,
    ast: &[AstUse],
) -> ParseResult<Vec<Use>> {
    ast.iter().map(|u| lower_use(module, scope, types, u)).collect()
}

fn lower_literal(
    module: &Module,
    scope: &BodyScope,
    types: &HashMap<String, Type>,
    ast: &AstLiteral,
) -> ParseResult<Literal> {
    Ok(match ast {
        AstLiteral::Undefined => Literal::Undefined,
        AstLiteral::Null => Literal::Null,
        AstLiteral::Zero => Literal::Zero,
        AstLiteral::Bool(value) => Literal::Bool(*value),
        AstLiteral::Tuple(elements) => Literal::Tuple(lower_uses(module, scope, types, elements)?),
        AstLiteral::Struct(fields) => Literal::Struct(
            fields
                .iter()
                .map(|(name, value)| {
                    Ok((name.clone(), lower_use(module, scope, types, value)?))
                })
                .collect::<ParseResult<Vec<_>>>()?,
        ),
        AstLiteral::EnumCase(case, elements) => Literal::EnumCase(
            case.clone(),
            lower_uses(module, scope, types, elements)?,
        ),
    })
}

fn lower_keys(
    module: &Module,
    scope: &BodyScope,
    types: &HashMap<String, Type>,
    ast: &[AstKey],
) -> ParseResult<Vec<ElementKey>> {
    ast.iter()
        .map(|key| {
            Ok(match key {
                AstKey::Index(index) => ElementKey::Index(*index),
                AstKey::Name(name) => ElementKey::Name(name.clone()),
                AstKey::Value(value) => ElementKey::Value(lower_use(module, scope, types, value)?),
            })
        })
        .collect()
}
