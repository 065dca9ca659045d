//! The lexical type environment: one flat scope of variable bindings per
//! inferred function, plus the merge used after conditionals.

use std::collections::{BTreeMap, BTreeSet};

use crate::lattice::{join, Type};

/// Variable name to type bindings for one function scope.
///
/// Backed by a `BTreeMap` so env-wide operations like the branch merge
/// visit names in a deterministic order.
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    bindings: BTreeMap<String, Type>,
}

impl TypeEnv {
    pub fn new() -> TypeEnv {
        TypeEnv::default()
    }

    /// Binds `name`, replacing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, ty: Type) {
        self.bindings.insert(name.into(), ty);
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Merges the post-arm environments of a conditional.
///
/// Each variable bound in either arm is rebound to the join of its two
/// post-arm types; an arm that did not bind it contributes the pre-branch
/// type instead. Two degradations land on `Unknown` with a note rather
/// than failing the run: a variable new in exactly one arm, and a join
/// failure between the arms.
pub fn merge_branches(
    pre: &TypeEnv,
    then_env: &TypeEnv,
    else_env: &TypeEnv,
) -> (TypeEnv, Vec<String>) {
    let mut merged = pre.clone();
    let mut notes = Vec::new();
    let names: BTreeSet<&str> = then_env.names().chain(else_env.names()).collect();
    for name in names {
        let fallback = pre.lookup(name);
        let ty = match (
            then_env.lookup(name).or(fallback),
            else_env.lookup(name).or(fallback),
        ) {
            (Some(a), Some(b)) => match join(a, b) {
                Ok(t) => t,
                Err(err) => {
                    notes.push(format!(
                        "cannot reconcile '{name}' across branches ({err}); treating as Any"
                    ));
                    Type::Unknown
                }
            },
            _ => {
                notes.push(format!(
                    "'{name}' is bound in only one branch; treating as Any"
                ));
                Type::Unknown
            }
        };
        merged.bind(name, ty);
    }
    (merged, notes)
}

// ==================== Tests ====================
