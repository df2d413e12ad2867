//! The pass framework: analyses with cached results and transforms.
//!
//! Each IR unit (module or function) owns a [`PassManager`], a cache from
//! analysis identity to its computed result. Analyses are pure and memoized;
//! any mutation of the unit invalidates the cache. Transforms mutate a
//! function and report whether they changed anything;
//! [`crate::ir::module::Module::map_transform`] runs one over every function
//! and re-verifies afterwards.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::ir::function::{Function, FunctionAttribute};
use crate::ir::module::Module;
use crate::ir::types::Type;
use crate::ir::value::FuncId;

/// Per-unit cache of analysis results, keyed by the analysis type.
pub struct PassManager {
    cache: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn cached<A: 'static, R: 'static>(&self) -> Option<Rc<R>> {
        let rc = self.cache.borrow().get(&TypeId::of::<A>()).cloned()?;
        rc.downcast::<R>().ok()
    }

    pub(crate) fn insert<A: 'static, R: 'static>(&self, result: Rc<R>) {
        self.cache.borrow_mut().insert(TypeId::of::<A>(), result);
    }

    /// Drop every cached result.
    pub fn invalidate(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Number of cached results, for tests.
    pub fn cached_count(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PassManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassManager")
            .field("cached", &self.cached_count())
            .finish()
    }
}

/// A pure analysis over a function. The result is cached on the function's
/// pass manager; repeated queries return the same `Rc` until invalidation.
pub trait FunctionAnalysis: 'static {
    type Result: 'static;
    const NAME: &'static str;
    fn run(function: &Function) -> Self::Result;
}

/// A pure analysis over a module.
pub trait ModuleAnalysis: 'static {
    type Result: 'static;
    const NAME: &'static str;
    fn run(module: &Module) -> Self::Result;
}

/// A transform over a function. `run` mutates the function and returns
/// whether anything changed. `summaries` carries the module-level facts a
/// function-local pass may consult (callee signatures and attributes).
pub trait FunctionTransform {
    fn name(&self) -> &'static str;
    fn run(&self, function: &mut Function, summaries: &FunctionSummaries) -> bool;
}

/// Immutable snapshot of one function's interface.
#[derive(Debug, Clone)]
pub struct FunctionSummary {
    pub name: String,
    pub attributes: BTreeSet<FunctionAttribute>,
    pub argument_types: Vec<Type>,
    pub return_type: Type,
}

/// Interfaces of every function in a module, indexed by [`FuncId`].
#[derive(Debug)]
pub struct FunctionSummaries {
    summaries: Vec<FunctionSummary>,
}

impl FunctionSummaries {
    pub fn collect(module: &Module) -> Self {
        let summaries = module
            .functions()
            .iter()
            .map(|f| FunctionSummary {
                name: f.name.clone(),
                attributes: f.attributes.clone(),
                argument_types: f.argument_types.clone(),
                return_type: f.return_type.clone(),
            })
            .collect();
        Self { summaries }
    }

    /// An empty table, for running a transform outside any module.
    pub fn empty() -> Self {
        Self {
            summaries: Vec::new(),
        }
    }

    pub fn get(&self, id: FuncId) -> Option<&FunctionSummary> {
        self.summaries.get(id.0 as usize)
    }

    pub fn is_pure(&self, id: FuncId) -> bool {
        self.get(id)
            .map_or(false, |s| s.attributes.contains(&FunctionAttribute::Pure))
    }
}
