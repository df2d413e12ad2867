//! Modules and global variables.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::ir::function::Function;
use crate::ir::types::{EnumDecl, StructDecl, Type, TypeAlias};
use crate::ir::value::{FuncId, VarId};
use crate::pass::{FunctionSummaries, FunctionTransform, ModuleAnalysis, PassManager};
use crate::verify::VerifierError;

/// The compilation stage a module is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Raw,
    Canonical,
    Optimized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Stage::Raw => "raw",
            Stage::Canonical => "canonical",
            Stage::Optimized => "optimized",
        };
        write!(f, "{}", text)
    }
}

impl FromStr for Stage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Stage::Raw),
            "canonical" => Ok(Stage::Canonical),
            "optimized" => Ok(Stage::Optimized),
            _ => Err(()),
        }
    }
}

/// A module-global variable. Its value has `value_type`; the variable
/// itself, used as an operand, is a pointer to that.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub value_type: Type,
}

impl Variable {
    pub fn ty(&self) -> Type {
        Type::pointer(self.value_type.clone())
    }
}

/// The top-level IR unit: type declarations, globals, and functions.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub stage: Stage,
    type_aliases: Vec<Rc<TypeAlias>>,
    structs: Vec<Rc<StructDecl>>,
    enums: Vec<Rc<EnumDecl>>,
    variables: Vec<Variable>,
    functions: Vec<Function>,
    pass_manager: PassManager,
}

impl Module {
    pub fn new(name: impl Into<String>, stage: Stage) -> Self {
        Self {
            name: name.into(),
            stage,
            type_aliases: Vec::new(),
            structs: Vec::new(),
            enums: Vec::new(),
            variables: Vec::new(),
            functions: Vec::new(),
            pass_manager: PassManager::new(),
        }
    }

    // ---- type declarations ----

    pub fn add_type_alias(&mut self, alias: Rc<TypeAlias>) {
        self.invalidate_pass_results();
        self.type_aliases.push(alias);
    }

    pub fn add_struct(&mut self, decl: Rc<StructDecl>) {
        self.invalidate_pass_results();
        self.structs.push(decl);
    }

    pub fn add_enum(&mut self, decl: Rc<EnumDecl>) {
        self.invalidate_pass_results();
        self.enums.push(decl);
    }

    pub fn type_aliases(&self) -> &[Rc<TypeAlias>] {
        &self.type_aliases
    }

    pub fn structs(&self) -> &[Rc<StructDecl>] {
        &self.structs
    }

    pub fn enums(&self) -> &[Rc<EnumDecl>] {
        &self.enums
    }

    pub fn struct_named(&self, name: &str) -> Option<Rc<StructDecl>> {
        self.structs.iter().find(|s| s.name == name).cloned()
    }

    pub fn enum_named(&self, name: &str) -> Option<Rc<EnumDecl>> {
        self.enums.iter().find(|e| e.name == name).cloned()
    }

    pub fn alias_named(&self, name: &str) -> Option<Rc<TypeAlias>> {
        self.type_aliases.iter().find(|a| a.name == name).cloned()
    }

    // ---- globals ----

    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        self.invalidate_pass_results();
        let id = VarId(self.variables.len() as u32);
        self.variables.push(variable);
        id
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0 as usize]
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable_named(&self, name: &str) -> Option<VarId> {
        self.variables
            .iter()
            .position(|v| v.name == name)
            .map(|i| VarId(i as u32))
    }

    // ---- functions ----

    pub fn add_function(&mut self, function: Function) -> FuncId {
        self.invalidate_pass_results();
        let id = FuncId(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FuncId) -> &mut Function {
        self.invalidate_pass_results();
        &mut self.functions[id.0 as usize]
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function_named(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(|i| FuncId(i as u32))
    }

    // ---- passes ----

    /// The cached result of module analysis `A`, computing it on a miss.
    pub fn analysis<A: ModuleAnalysis>(&self) -> Rc<A::Result> {
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

    /// Run `transform` over every function body in module order, OR the
    /// changed flags, and verify the module afterwards unless `verify` is
    /// false. A verification failure after a transform is a bug in the
    /// transform; it is surfaced, not rolled back.
    pub fn map_transform<T: FunctionTransform>(
        &mut self,
        transform: &T,
        verify: bool,
    ) -> Result<bool, VerifierError> {
        let summaries = FunctionSummaries::collect(self);
        let mut changed = false;
        for function in &mut self.functions {
            if function.is_declaration() {
                continue;
            }
            changed |= transform.run(function, &summaries);
        }
        self.invalidate_pass_results();
        if verify {
            crate::verify::verify_module(self)?;
        }
        Ok(changed)
    }
}
