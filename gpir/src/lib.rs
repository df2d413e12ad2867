//! gpir
//!
//! A typed, SSA-form intermediate representation with a verifier, a pass
//! framework, and a small optimizer.
//!
//! # Architecture
//!
//! ```text
//! Builder -> Module -> analyses (dominance, def-use, ...) -> transforms -> Printer
//!                \------------------- Verifier -------------------/
//! ```
//!
//! Construction goes through [`ir::Builder`]; every mutation invalidates the
//! owning unit's cached analyses. [`verify::verify_module`] enforces the
//! structural and typing invariants; transforms assume verified input and
//! are re-checked by [`ir::Module::map_transform`].

// Prevent accidental debug output in library code. CLI binaries may use
// eprintln!() for user-facing error messages.
#![deny(clippy::print_stderr)]

pub mod analysis;
pub mod ident;
pub mod ir;
pub mod pass;
pub mod transform;
pub mod verify;

pub use ir::{Builder, Function, Module, Stage};
pub use pass::{FunctionAnalysis, FunctionTransform, ModuleAnalysis, PassManager};
pub use verify::{verify_function, verify_module, VerifierError, VerifyResult};
