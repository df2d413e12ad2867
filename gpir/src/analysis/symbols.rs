//! Module-level symbol tables: the type and value name spaces.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ir::module::Module;
use crate::ir::types::{EnumDecl, StructDecl, TypeAlias};
use crate::ir::value::{Definition, FuncId, VarId};
use crate::pass::ModuleAnalysis;

/// A named type declaration.
#[derive(Debug, Clone)]
pub enum TypeRef {
    Alias(Rc<TypeAlias>),
    Struct(Rc<StructDecl>),
    Enum(Rc<EnumDecl>),
}

/// Marker type for requesting [`ModuleSymbols`] through the pass cache.
#[derive(Debug)]
pub struct ModuleSymbolsAnalysis;

impl ModuleAnalysis for ModuleSymbolsAnalysis {
    type Result = ModuleSymbols;
    const NAME: &'static str = "module-symbols";

    fn run(module: &Module) -> ModuleSymbols {
        ModuleSymbols::compute(module)
    }
}

/// The two disjoint name spaces of a module, plus the first duplicate found
/// in each (declaration order).
#[derive(Debug)]
pub struct ModuleSymbols {
    types: HashMap<String, TypeRef>,
    values: HashMap<String, Definition>,
    pub duplicate_type: Option<String>,
    pub duplicate_value: Option<String>,
}

impl ModuleSymbols {
    pub fn compute(module: &Module) -> ModuleSymbols {
        let mut types = HashMap::new();
        let mut values = HashMap::new();
        let mut duplicate_type = None;
        let mut duplicate_value = None;

        let mut add_type = |name: &str, type_ref: TypeRef| {
            if types.contains_key(name) {
                if duplicate_type.is_none() {
                    duplicate_type = Some(name.to_string());
                }
            } else {
                types.insert(name.to_string(), type_ref);
            }
        };
        for alias in module.type_aliases() {
            add_type(&alias.name, TypeRef::Alias(alias.clone()));
        }
        for decl in module.structs() {
            add_type(&decl.name, TypeRef::Struct(decl.clone()));
        }
        for decl in module.enums() {
            add_type(&decl.name, TypeRef::Enum(decl.clone()));
        }

        let mut add_value = |name: &str, def: Definition| {
            if values.contains_key(name) {
                if duplicate_value.is_none() {
                    duplicate_value = Some(name.to_string());
                }
            } else {
                values.insert(name.to_string(), def);
            }
        };
        for (i, variable) in module.variables().iter().enumerate() {
            add_value(&variable.name, Definition::Variable(VarId(i as u32)));
        }
        for (i, function) in module.functions().iter().enumerate() {
            add_value(&function.name, Definition::Function(FuncId(i as u32)));
        }

        ModuleSymbols {
            types,
            values,
            duplicate_type,
            duplicate_value,
        }
    }

    pub fn type_named(&self, name: &str) -> Option<&TypeRef> {
        self.types.get(name)
    }

    pub fn value_named(&self, name: &str) -> Option<Definition> {
        self.values.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::function::Function;
    use crate::ir::module::{Stage, Variable};
    use crate::ir::types::Type;

    #[test]
    fn test_disjoint_name_spaces() {
        let mut m = Module::new("m", Stage::Raw);
        m.add_struct(StructDecl::new("Shared"));
        // Same name in the value name space is fine.
        m.add_variable(Variable {
            name: "Shared".into(),
            value_type: Type::Bool,
        });
        let symbols = ModuleSymbols::compute(&m);
        assert!(symbols.duplicate_type.is_none());
        assert!(symbols.duplicate_value.is_none());
        assert!(symbols.type_named("Shared").is_some());
        assert!(symbols.value_named("Shared").is_some());
    }

    #[test]
    fn test_duplicates_reported() {
        let mut m = Module::new("m", Stage::Raw);
        m.add_struct(StructDecl::new("T"));
        m.add_enum(EnumDecl::new("T"));
        m.add_function(Function::new("f", vec![], Type::void()));
        m.add_function(Function::new("f", vec![], Type::void()));
        let symbols = ModuleSymbols::compute(&m);
        assert_eq!(symbols.duplicate_type.as_deref(), Some("T"));
        assert_eq!(symbols.duplicate_value.as_deref(), Some("f"));
    }
}
