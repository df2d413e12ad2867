//! The process-wide intrinsic registry.
//!
//! Built once at first use and sealed; `builtin` instructions are checked
//! against it by the verifier and typed through it during inference.

use std::collections::HashMap;

use crate::ir::types::Type;

/// One intrinsic operation, keyed by its opcode string.
#[derive(Debug)]
pub struct Intrinsic {
    pub opcode: &'static str,
    pub parameter_types: Vec<Type>,
    pub result_type: Type,
    /// Pure intrinsics are eligible for dead-code elimination.
    pub is_pure: bool,
}

/// Immutable opcode table.
#[derive(Debug)]
pub struct IntrinsicRegistry {
    table: HashMap<&'static str, Intrinsic>,
}

impl IntrinsicRegistry {
    fn sealed() -> Self {
        let mut table = HashMap::new();
        let mut register = |intrinsic: Intrinsic| {
            table.insert(intrinsic.opcode, intrinsic);
        };
        register(Intrinsic {
            opcode: "bool.xor",
            parameter_types: vec![Type::Bool, Type::Bool],
            result_type: Type::Bool,
            is_pure: true,
        });
        register(Intrinsic {
            opcode: "bool.select",
            parameter_types: vec![Type::Bool, Type::Bool, Type::Bool],
            result_type: Type::Bool,
            is_pure: true,
        });
        register(Intrinsic {
            opcode: "debug.print",
            parameter_types: vec![Type::Bool],
            result_type: Type::void(),
            is_pure: false,
        });
        Self { table }
    }

    pub fn get(&self, opcode: &str) -> Option<&Intrinsic> {
        self.table.get(opcode)
    }

    pub fn contains(&self, opcode: &str) -> bool {
        self.table.contains_key(opcode)
    }
}

/// The sealed registry.
pub fn registry() -> IntrinsicRegistry {
    IntrinsicRegistry::sealed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let table = registry();
        let xor = table.get("bool.xor").unwrap();
        assert_eq!(xor.parameter_types.len(), 2);
        assert_eq!(xor.result_type, Type::Bool);
        assert!(xor.is_pure);

        assert!(registry().contains("debug.print"));
        assert!(!registry().get("debug.print").unwrap().is_pure);
        assert!(registry().get("no.such.op").is_none());
    }
}
