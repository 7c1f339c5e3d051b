//! Lexical scope environments
//!
//! Every pass owns one `Environment<A>`: an arena of scopes, each holding
//! name -> attribute bindings and a link to its enclosing scope. Scope 0 is
//! the global scope and is seeded with the builtin names.

use std::collections::HashMap;

use thiserror::Error;

use crate::types::Builtin;

/// Unique identifier for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Lookup failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("name not found: {0}")]
pub struct NotFound(pub String);

/// A scope containing bindings
#[derive(Debug)]
struct Scope<A> {
    enclosing: Option<ScopeId>,
    bindings: HashMap<String, A>,
}

/// Scope chain with attribute payload `A`
#[derive(Debug)]
pub struct Environment<A> {
    scopes: Vec<Scope<A>>,
    current: ScopeId,
}

impl<A> Environment<A> {
    /// A lone global scope with no bindings
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                enclosing: None,
                bindings: HashMap::new(),
            }],
            current: ScopeId(0),
        }
    }

    /// A global scope where every builtin name is bound to `attr(builtin)`
    pub fn with_builtins(attr: impl Fn(Builtin) -> A) -> Self {
        let mut env = Self::new();
        for builtin in Builtin::all() {
            env.define(builtin.name(), attr(builtin));
        }
        env
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn is_global(&self) -> bool {
        self.current == self.global()
    }

    /// Create a child scope of `parent`. The new scope is not entered.
    pub fn with_enclosing(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            enclosing: Some(parent),
            bindings: HashMap::new(),
        });
        id
    }

    /// Make `id` the active scope
    pub fn enter(&mut self, id: ScopeId) {
        self.current = id;
    }

    /// Bind `name` in the active scope, overwriting any local binding.
    /// Returns false when the name was already bound here.
    pub fn define(&mut self, name: impl Into<String>, attr: A) -> bool {
        self.scopes[self.current.0]
            .bindings
            .insert(name.into(), attr)
            .is_none()
    }

    /// Look up a name in the active scope only
    pub fn lookup_local(&self, name: &str) -> Result<&A, NotFound> {
        self.scopes[self.current.0]
            .bindings
            .get(name)
            .ok_or_else(|| NotFound(name.to_string()))
    }

    /// Look up a name, searching from the active scope outward
    pub fn lookup(&self, name: &str) -> Result<&A, NotFound> {
        let id = self.resolve(name).ok_or_else(|| NotFound(name.to_string()))?;
        Ok(&self.scopes[id.0].bindings[name])
    }

    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut A, NotFound> {
        let id = self.resolve(name).ok_or_else(|| NotFound(name.to_string()))?;
        self.scopes[id.0]
            .bindings
            .get_mut(name)
            .ok_or_else(|| NotFound(name.to_string()))
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.scopes[self.current.0].bindings.contains_key(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Bindings of the active scope, in no particular order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &A)> {
        self.scopes[self.current.0]
            .bindings
            .iter()
            .map(|(name, attr)| (name.as_str(), attr))
    }

    /// Nearest scope on the chain that binds `name`
    fn resolve(&self, name: &str) -> Option<ScopeId> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            let scope = &self.scopes[id.0];
            if scope.bindings.contains_key(name) {
                return Some(id);
            }
            scope_id = scope.enclosing;
        }
        None
    }
}

impl<A> Default for Environment<A> {
    fn default() -> Self {
        Self::new()
    }
}
