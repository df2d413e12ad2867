//! Analyses computed on demand and cached on the owning unit.

pub mod algebra;
pub mod def_use;
pub mod dominance;
pub mod symbols;

pub use algebra::{
    AlgebraicExpression, AlgebraicExpressions, AlgebraicExpressionsAnalysis, BlockExpressions,
    TraversalOrder,
};
pub use def_use::{DefUse, DefUseAnalysis};
pub use dominance::{Dominance, DominanceAnalysis};
pub use symbols::{ModuleSymbols, ModuleSymbolsAnalysis, TypeRef};
