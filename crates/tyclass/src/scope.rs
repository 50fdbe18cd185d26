//! Assembling a table from named sources of instances.
//!
//! An [`InstanceSource`] is a named bundle of implementations and type
//! definitions (what a module exports). The [`ScopeBuilder`] registers each
//! bundle at the priority of the role it plays at the use site: the
//! library's own builtins, an import, or local definitions.

use crate::contract::{Contract, Implementation};
use crate::error::ResolveError;
use crate::table::{InstanceTable, Origin, Priority};
use crate::typed::Typed;
use crate::typedef::TypeDef;

pub struct InstanceSource<C: Contract> {
    name: String,
    instances: Vec<Implementation<C>>,
    types: Vec<TypeDef>,
}

impl<C: Contract> InstanceSource<C> {
    pub fn new(name: impl Into<String>) -> Self {
        InstanceSource {
            name: name.into(),
            instances: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Add an implementation to the bundle.
    pub fn with(mut self, implementation: Implementation<C>) -> Self {
        self.instances.push(implementation);
        self
    }

    pub fn declare(mut self, def: TypeDef) -> Self {
        self.types.push(def);
        self
    }

    /// Add the declared shape of `T`, if it has one.
    pub fn declare_type<T: Typed>(self) -> Self {
        match T::type_def() {
            Some(def) => self.declare(def),
            None => self,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instances(&self) -> &[Implementation<C>] {
        &self.instances
    }
}

impl<C: Contract> Clone for InstanceSource<C> {
    fn clone(&self) -> Self {
        InstanceSource {
            name: self.name.clone(),
            instances: self.instances.clone(),
            types: self.types.clone(),
        }
    }
}

/// Builds the instance table visible at one use site.
pub struct ScopeBuilder<C: Contract> {
    table: InstanceTable<C>,
}

impl<C: Contract> ScopeBuilder<C> {
    pub fn new() -> Self {
        ScopeBuilder { table: InstanceTable::new() }
    }

    pub fn builtin(self, source: &InstanceSource<C>) -> Result<Self, ResolveError> {
        self.add(source, Priority::Builtin)
    }

    pub fn import(self, source: &InstanceSource<C>) -> Result<Self, ResolveError> {
        self.add(source, Priority::Imported)
    }

    pub fn local(self, source: &InstanceSource<C>) -> Result<Self, ResolveError> {
        self.add(source, Priority::Local)
    }

    pub fn finish(self) -> InstanceTable<C> {
        self.table
    }

    fn add(mut self, source: &InstanceSource<C>, priority: Priority) -> Result<Self, ResolveError> {
        tracing::debug!(
            source = %source.name,
            priority = %priority,
            instances = source.instances.len(),
            "adding instance source to scope"
        );
        for def in &source.types {
            self.table.declare(def.clone())?;
        }
        for implementation in &source.instances {
            self.table
                .register(implementation.clone(), Origin::new(priority, source.name.clone()))?;
        }
        Ok(self)
    }
}

impl<C: Contract> Default for ScopeBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
