//! IR-to-IR transforms.

pub mod cfg_canonicalization;
pub mod cfg_simplification;
pub mod cse;
pub mod dce;

pub use cfg_canonicalization::CfgCanonicalization;
pub use cfg_simplification::CfgSimplification;
pub use cse::CommonSubexpressionElimination;
pub use dce::DeadCodeElimination;
