//! Function registry for the runner functions available to dispatch.
//!
//! The registry is filled once at startup and then shared behind an `Arc`;
//! after that it is only read, so lookups take no locks.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::functions::function::RunnerFunction;

/// Documentation entry for one registered function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDoc {
    pub name: String,
    pub summary: String,
    pub hidden: bool,
}

#[derive(Debug)]
struct Entry {
    function: Arc<dyn RunnerFunction>,
    /// Fixed at registration time.
    hidden: bool,
}

/// Registry of available runner functions, ordered by name.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Entry>,
}

impl FunctionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::functions::builtin::register_builtins(&mut registry);
        registry
    }

    /// Register a function. A name that is already taken keeps its first
    /// registration.
    pub fn register(&mut self, function: Arc<dyn RunnerFunction>) -> bool {
        let hidden = function.hidden();
        self.insert(function, hidden)
    }

    /// Register a function that must never show up in documentation.
    pub fn register_internal(&mut self, function: Arc<dyn RunnerFunction>) -> bool {
        self.insert(function, true)
    }

    fn insert(&mut self, function: Arc<dyn RunnerFunction>, hidden: bool) -> bool {
        let name = function.name().to_string();
        if self.functions.contains_key(&name) {
            tracing::warn!(function = %name, "Rejected duplicate function registration");
            return false;
        }
        tracing::debug!(function = %name, hidden, "Registered function");
        self.functions.insert(name, Entry { function, hidden });
        true
    }

    /// Look up a function by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn RunnerFunction>> {
        self.functions.get(name).map(|e| Arc::clone(&e.function))
    }

    pub fn has(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Whether `name` is registered as hidden. Unknown names are not hidden.
    pub fn is_hidden(&self, name: &str) -> bool {
        self.functions.get(name).is_some_and(|e| e.hidden)
    }

    /// All function names, sorted.
    pub fn list(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.functions.len()
    }

    /// Documentation for every registered function, hidden ones included.
    pub fn docs(&self) -> Vec<FunctionDoc> {
        self.functions
            .iter()
            .map(|(name, entry)| FunctionDoc {
                name: name.clone(),
                summary: entry.function.summary().to_string(),
                hidden: entry.hidden,
            })
            .collect()
    }
}
