//! Caching and invalidation behavior of the pass framework.

use std::rc::Rc;

use gpir::analysis::{DefUseAnalysis, DominanceAnalysis, ModuleSymbolsAnalysis};
use gpir::ir::{Builder, Module, Stage, Type};
use gpir::pass::{FunctionSummaries, FunctionTransform};

fn one_function_module() -> (Module, gpir::ir::FuncId) {
    let mut module = Module::new("m", Stage::Raw);
    let mut b = Builder::new(&mut module);
    let f = b.create_function("f", vec![], Type::void());
    b.append_block(f, "entry", vec![]);
    b.ret(None);
    (module, f)
}

#[test]
fn test_analysis_results_are_memoized_by_identity() {
    let (module, f) = one_function_module();
    let function = module.function(f);
    let first = function.analysis::<DominanceAnalysis>();
    let second = function.analysis::<DominanceAnalysis>();
    assert!(Rc::ptr_eq(&first, &second));

    // A different analysis gets its own slot.
    let def_use = function.analysis::<DefUseAnalysis>();
    assert_eq!(function.pass_manager().cached_count(), 2);
    drop(def_use);
}

#[test]
fn test_mutation_invalidates_function_results() {
    let (mut module, f) = one_function_module();
    let before = module.function(f).analysis::<DominanceAnalysis>();
    module.function_mut(f).append_block("island");
    let after = module.function(f).analysis::<DominanceAnalysis>();
    assert!(!Rc::ptr_eq(&before, &after));
}

#[test]
fn test_module_analysis_is_cached_and_invalidated() {
    let (mut module, _) = one_function_module();
    let first = module.analysis::<ModuleSymbolsAnalysis>();
    let second = module.analysis::<ModuleSymbolsAnalysis>();
    assert!(Rc::ptr_eq(&first, &second));

    let mut b = Builder::new(&mut module);
    b.create_variable("g", Type::Bool);
    let third = module.analysis::<ModuleSymbolsAnalysis>();
    assert!(!Rc::ptr_eq(&first, &third));
    assert!(third.value_named("g").is_some());
}

/// A transform that reports a change without making one still propagates
/// its flag through `map_transform`, and the module is re-verified.
#[derive(Debug)]
struct NoopTransform {
    report_changed: bool,
}

impl FunctionTransform for NoopTransform {
    fn name(&self) -> &'static str {
        "Noop"
    }

    fn run(&self, _function: &mut gpir::Function, _summaries: &FunctionSummaries) -> bool {
        self.report_changed
    }
}

#[test]
fn test_map_transform_ors_changed_flags() {
    let (mut module, _) = one_function_module();
    assert!(module
        .map_transform(&NoopTransform { report_changed: true }, true)
        .unwrap());
    assert!(!module
        .map_transform(&NoopTransform { report_changed: false }, true)
        .unwrap());
}

#[test]
fn test_map_transform_surfaces_verifier_errors() {
    let (mut module, f) = one_function_module();
    // Break the function behind the framework's back: an empty block.
    module.function_mut(f).append_block("broken");
    let err = module
        .map_transform(&NoopTransform { report_changed: false }, true)
        .unwrap_err();
    assert!(matches!(
        err,
        gpir::VerifierError::MissingTerminator { .. }
    ));
    // With verification suppressed the same transform goes through.
    assert!(module
        .map_transform(&NoopTransform { report_changed: false }, false)
        .is_ok());
}
