//! Extension points of the checker: the registry of typing rules for
//! qualified callables, the per-model attribute table, and the tensor
//! arithmetic contract.
//!
//! The checker itself knows nothing about `abs` or `torch.flatten`. When a
//! call's callee resolves to a name with no local binding, the dotted path
//! is looked up here and the registered [`TypeRule`] computes the result
//! type from the argument types alone.

pub mod arith;
pub mod builtins;
pub mod functions;

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

use crate::error::{CheckResult, TypeCheckError};
use crate::lattice::Type;

// ==================== Call snapshot ====================

/// Everything a type rule gets to see about one call site.
#[derive(Debug, Clone)]
pub struct CallTypes {
    /// Dotted path the callee resolved to, e.g. `torch.flatten`.
    pub callee: String,
    /// Positional argument types in source order.
    pub args: Vec<Type>,
    /// Keyword argument names and types in source order.
    pub kwargs: Vec<(String, Type)>,
}

impl CallTypes {
    pub fn new(callee: impl Into<String>, args: Vec<Type>) -> CallTypes {
        CallTypes {
            callee: callee.into(),
            args,
            kwargs: Vec::new(),
        }
    }

    pub fn with_kwargs(mut self, kwargs: Vec<(String, Type)>) -> CallTypes {
        self.kwargs = kwargs;
        self
    }

    pub fn arg(&self, index: usize) -> Option<&Type> {
        self.args.get(index)
    }

    pub fn kwarg(&self, name: &str) -> Option<&Type> {
        self.kwargs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, t)| t)
    }

    /// Fails with an arity error unless exactly `n` positional arguments
    /// were given.
    pub fn expect_args(&self, n: usize) -> CheckResult<()> {
        if self.args.len() == n {
            Ok(())
        } else {
            Err(TypeCheckError::arity(
                self.callee.clone(),
                n,
                self.args.len(),
            ))
        }
    }
}

// ==================== Registry ====================

/// A typing rule for one callable: argument types in, result type out.
pub type TypeRule = fn(&CallTypes) -> CheckResult<Type>;

/// Table of typing rules keyed by dotted callee path.
#[derive(Debug, Clone, Default)]
pub struct OpRegistry {
    rules: HashMap<String, TypeRule>,
}

impl OpRegistry {
    /// An empty registry with no rules at all.
    pub fn new() -> OpRegistry {
        OpRegistry::default()
    }

    /// A registry preloaded with the builtin and framework rules.
    pub fn with_defaults() -> OpRegistry {
        let mut registry = OpRegistry::new();
        builtins::register(&mut registry);
        functions::register(&mut registry);
        registry
    }

    /// Registers `rule` under `name`, replacing any previous rule.
    pub fn register(&mut self, name: impl Into<String>, rule: TypeRule) {
        self.rules.insert(name.into(), rule);
    }

    pub fn lookup(&self, name: &str) -> Option<TypeRule> {
        self.rules.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Process-wide registry with the default rules, built on first use.
pub static DEFAULT_REGISTRY: Lazy<OpRegistry> = Lazy::new(OpRegistry::with_defaults);

// ==================== Model attributes ====================

/// Attribute types of one model class, used to resolve `self.<attr>`.
///
/// Layers read from a sample instance become `Arrow` attributes here, so a
/// call through `self.fc1` types like any other callable.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    class: String,
    attrs: BTreeMap<String, Type>,
}

impl ModelInfo {
    pub fn new(class: impl Into<String>) -> ModelInfo {
        ModelInfo {
            class: class.into(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, ty: Type) -> ModelInfo {
        self.attrs.insert(name.into(), ty);
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn attr(&self, name: &str) -> Option<&Type> {
        self.attrs.get(name)
    }
}

// ==================== Tests ====================
