//! Deterministic textual form of a module.
//!
//! The printed form round-trips through `gpir_parser`: whitespace between
//! tokens is insignificant there, but this printer always emits the same
//! text for the same module.

use std::collections::HashMap;
use std::fmt::Write;

use crate::ir::function::Function;
use crate::ir::instruction::InstructionKind;
use crate::ir::module::Module;
use crate::ir::types::{EnumDecl, StructDecl, TypeAlias};
use crate::ir::value::{Definition, ElementKey, InstId, Literal, Use};

/// Print a whole module.
pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "module \"{}\"\nstage {}\n",
        escape(&module.name),
        module.stage
    );
    for decl in module.enums() {
        out.push('\n');
        print_enum(&mut out, decl);
    }
    for decl in module.structs() {
        out.push('\n');
        print_struct(&mut out, decl);
    }
    for alias in module.type_aliases() {
        out.push('\n');
        print_alias(&mut out, alias);
    }
    for variable in module.variables() {
        out.push('\n');
        let _ = writeln!(out, "var @{}: {}", variable.name, variable.value_type);
    }
    for function in module.functions() {
        out.push('\n');
        out.push_str(&print_function(module, function));
    }
    out
}

/// Print one function (attribute lines, header, body).
pub fn print_function(module: &Module, function: &Function) -> String {
    FunctionPrinter::new(module, function).print()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn print_enum(out: &mut String, decl: &EnumDecl) {
    let _ = writeln!(out, "enum ${} {{", decl.name);
    for case in decl.cases().iter() {
        let types = case
            .associated_types
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "    ?{}({})", case.name, types);
    }
    out.push_str("}\n");
}

fn print_struct(out: &mut String, decl: &StructDecl) {
    let _ = writeln!(out, "struct ${} {{", decl.name);
    for (field, ty) in decl.fields().iter() {
        let _ = writeln!(out, "    #{}: {}", field, ty);
    }
    out.push_str("}\n");
}

fn print_alias(out: &mut String, alias: &TypeAlias) {
    match alias.ty() {
        Some(ty) => {
            let _ = writeln!(out, "type ${} = {}", alias.name, ty);
        }
        None => {
            let _ = writeln!(out, "type ${} = opaque", alias.name);
        }
    }
}

struct FunctionPrinter<'a> {
    module: &'a Module,
    function: &'a Function,
    /// Display name per instruction: its own name, or `<bb>.<index>`.
    names: HashMap<InstId, String>,
}

impl<'a> FunctionPrinter<'a> {
    fn new(module: &'a Module, function: &'a Function) -> Self {
        let mut names = HashMap::new();
        for (bi, &block) in function.block_order().iter().enumerate() {
            for (ii, &inst) in function.block(block).instructions().iter().enumerate() {
                let name = match &function.instruction(inst).name {
                    Some(name) => name.clone(),
                    None => format!("{}.{}", bi, ii),
                };
                names.insert(inst, name);
            }
        }
        Self {
            module,
            function,
            names,
        }
    }

    fn print(&self) -> String {
        let mut out = String::new();
        for attribute in &self.function.attributes {
            let _ = writeln!(out, "[{}]", attribute.mnemonic());
        }
        if self.function.is_declaration() {
            let _ = writeln!(out, "[extern]\nfunc @{}: {}", self.function.name, self.function.ty());
            return out;
        }
        let _ = writeln!(out, "func @{}: {} {{", self.function.name, self.function.ty());
        for &block in self.function.block_order() {
            let params = self
                .function
                .block(block)
                .arguments()
                .iter()
                .map(|arg| format!("%{}: {}", arg.name, arg.ty))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "'{}({}):", self.function.block(block).name, params);
            for &inst in self.function.block(block).instructions() {
                let _ = writeln!(out, "    {}", self.instruction(inst));
            }
        }
        out.push_str("}\n");
        out
    }

    fn instruction(&self, id: InstId) -> String {
        let kind = &self.function.instruction(id).kind;
        let body = self.instruction_body(kind);
        let ty = kind.infer_type(self.function, self.module);
        if ty.is_void() {
            body
        } else {
            format!("%{} = {}", self.names[&id], body)
        }
    }

    fn instruction_body(&self, kind: &InstructionKind) -> String {
        match kind {
            InstructionKind::Builtin { opcode, operands } => {
                format!("builtin \"{}\"({})", opcode, self.uses(operands))
            }
            InstructionKind::Branch { target, arguments } => {
                format!("branch '{}({})", self.block_name(*target), self.uses(arguments))
            }
            InstructionKind::Conditional {
                condition,
                then_target,
                then_arguments,
                else_target,
                else_arguments,
            } => format!(
                "conditional {} then '{}({}) else '{}({})",
                self.use_ref(condition),
                self.block_name(*then_target),
                self.uses(then_arguments),
                self.block_name(*else_target),
                self.uses(else_arguments),
            ),
            InstructionKind::BranchEnum { subject, cases } => {
                let mut text = format!("branchEnum {}", self.use_ref(subject));
                for (case, target) in cases {
                    let _ = write!(text, " case ?{} '{}", case, self.block_name(*target));
                }
                text
            }
            InstructionKind::Return(None) => "return".to_string(),
            InstructionKind::Return(Some(value)) => format!("return {}", self.use_ref(value)),
            InstructionKind::Literal { literal, ty } => {
                format!("literal {}: {}", self.literal(literal), ty)
            }
            InstructionKind::BooleanBinary { op, lhs, rhs } => {
                format!("{} {}, {}", op.mnemonic(), self.use_ref(lhs), self.use_ref(rhs))
            }
            InstructionKind::Not(operand) => format!("not {}", self.use_ref(operand)),
            InstructionKind::Extract { from, keys } => {
                format!("extract {} from {}", self.keys(keys), self.use_ref(from))
            }
            InstructionKind::Insert {
                source,
                destination,
                keys,
            } => format!(
                "insert {} to {} at {}",
                self.use_ref(source),
                self.use_ref(destination),
                self.keys(keys)
            ),
            InstructionKind::Apply { callee, arguments } => {
                let ret = match callee.ty(self.function, self.module).canonical() {
                    crate::ir::types::Type::Function(_, ret) => *ret,
                    _ => crate::ir::types::Type::Invalid,
                };
                format!(
                    "apply {}({}) -> {}",
                    self.def_ident(callee),
                    self.uses(arguments),
                    ret
                )
            }
            InstructionKind::Load(pointer) => format!("load {}", self.use_ref(pointer)),
            InstructionKind::Store { value, pointer } => {
                format!("store {} to {}", self.use_ref(value), self.use_ref(pointer))
            }
            InstructionKind::ElementPointer { pointer, keys } => {
                format!("elementPointer {} at {}", self.use_ref(pointer), self.keys(keys))
            }
            InstructionKind::Trap => "trap".to_string(),
        }
    }

    fn block_name(&self, block: crate::ir::value::BlockId) -> &str {
        &self.function.block(block).name
    }

    fn uses(&self, uses: &[Use]) -> String {
        uses.iter()
            .map(|u| self.use_ref(u))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// A use with its type: `%x: bool`, `true: bool`.
    fn use_ref(&self, u: &Use) -> String {
        match u {
            Use::Literal(ty, literal) => format!("{}: {}", self.literal(literal), ty),
            Use::Def(def) => format!(
                "{}: {}",
                self.ident_of(*def),
                def.ty(self.function, self.module)
            ),
        }
    }

    /// A bare definition identifier, used for `apply` callees.
    fn def_ident(&self, u: &Use) -> String {
        match u {
            Use::Def(def) => self.ident_of(*def),
            Use::Literal(_, literal) => self.literal(literal),
        }
    }

    fn ident_of(&self, def: Definition) -> String {
        match def {
            Definition::Argument(block, index) => {
                format!("%{}", self.function.block(block).arguments()[index].name)
            }
            Definition::Instruction(id) => format!("%{}", self.names[&id]),
            Definition::Variable(id) => format!("@{}", self.module.variable(id).name),
            Definition::Function(id) => format!("@{}", self.module.function(id).name),
        }
    }

    fn literal(&self, literal: &Literal) -> String {
        match literal {
            Literal::Undefined => "undefined".to_string(),
            Literal::Null => "null".to_string(),
            Literal::Zero => "zero".to_string(),
            Literal::Bool(true) => "true".to_string(),
            Literal::Bool(false) => "false".to_string(),
            Literal::Tuple(elements) => format!("({})", self.uses(elements)),
            Literal::Struct(fields) => {
                let body = fields
                    .iter()
                    .map(|(name, value)| format!("#{} = {}", name, self.use_ref(value)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{}}}", body)
            }
            Literal::EnumCase(case, elements) => format!("?{}({})", case, self.uses(elements)),
        }
    }

    fn keys(&self, keys: &[ElementKey]) -> String {
        keys.iter()
            .map(|key| match key {
                ElementKey::Index(i) => i.to_string(),
                ElementKey::Name(name) => format!("#{}", name),
                ElementKey::Value(value) => self.use_ref(value),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
