//! The instance table: registered (type -> implementation) candidates.
//!
//! Candidates are keyed by exact [`Ty`]. Each remembers the priority and
//! scope of the source that registered it; insertion order carries no
//! meaning. Derived candidates are never stored here, they are synthesized
//! by the resolver on demand.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::contract::{Contract, Implementation};
use crate::error::{CandidateInfo, ResolveError};
use crate::resolve::{Lookup, Resolver};
use crate::ty::Ty;
use crate::typed::Typed;
use crate::typedef::{TypeDef, TypeRegistry};

/// Source priority of a registration, lowest to highest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Shipped with the library that defines the behavior.
    Builtin,
    /// Brought into scope from another module.
    Imported,
    /// Defined at the use site.
    Local,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Builtin => write!(f, "builtin"),
            Priority::Imported => write!(f, "imported"),
            Priority::Local => write!(f, "local"),
        }
    }
}

/// Where a registration comes from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Origin {
    pub priority: Priority,
    /// Name of the registering source scope (module, crate, bundle).
    pub scope: String,
}

impl Origin {
    pub fn new(priority: Priority, scope: impl Into<String>) -> Self {
        Origin { priority, scope: scope.into() }
    }

    pub fn builtin(scope: impl Into<String>) -> Self {
        Self::new(Priority::Builtin, scope)
    }

    pub fn imported(scope: impl Into<String>) -> Self {
        Self::new(Priority::Imported, scope)
    }

    pub fn local(scope: impl Into<String>) -> Self {
        Self::new(Priority::Local, scope)
    }
}

/// A registered (direct) candidate.
pub struct Candidate<C: Contract> {
    pub implementation: Implementation<C>,
    pub origin: Origin,
}

impl<C: Contract> Candidate<C> {
    pub fn priority(&self) -> Priority {
        self.origin.priority
    }

    pub fn info(&self) -> CandidateInfo {
        CandidateInfo {
            label: self.implementation.label().to_string(),
            scope: self.origin.scope.clone(),
            priority: self.origin.priority,
        }
    }
}

impl<C: Contract> Clone for Candidate<C> {
    fn clone(&self) -> Self {
        Candidate {
            implementation: self.implementation.clone(),
            origin: self.origin.clone(),
        }
    }
}

impl<C: Contract> fmt::Debug for Candidate<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("implementation", &self.implementation)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Serializable summary of a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub instances: Vec<TypeEntry>,
    pub types: Vec<TypeDef>,
}

/// The candidates registered for one type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeEntry {
    pub ty: String,
    pub candidates: Vec<CandidateInfo>,
}

/// The instance table for contract `C`.
///
/// Built through `&mut` access, then read through shared references. For
/// registration while readers are active, wrap it in a
/// [`SharedTable`](crate::shared::SharedTable).
pub struct InstanceTable<C: Contract> {
    instances: FxHashMap<Ty, Vec<Candidate<C>>>,
    types: TypeRegistry,
}

impl<C: Contract> InstanceTable<C> {
    /// Create a new, empty table.
    pub fn new() -> Self {
        InstanceTable {
            instances: FxHashMap::default(),
            types: TypeRegistry::new(),
        }
    }

    /// Register `implementation` for its type.
    ///
    /// Fails with `DuplicateDefinition` if a different implementation is
    /// already registered for the same type, priority and scope.
    /// Registering the same implementation again is a no-op.
    pub fn register(
        &mut self,
        implementation: Implementation<C>,
        origin: Origin,
    ) -> Result<(), ResolveError> {
        let ty = implementation.ty().clone();
        let existing = self.instances.entry(ty.clone()).or_default();

        if let Some(prev) = existing.iter().find(|c| c.origin == origin) {
            if prev.implementation == implementation {
                return Ok(());
            }
            return Err(ResolveError::DuplicateDefinition {
                ty,
                scope: origin.scope,
                priority: origin.priority,
            });
        }

        tracing::debug!(
            ty = %ty,
            label = implementation.label(),
            scope = %origin.scope,
            priority = %origin.priority,
            "registered instance"
        );
        existing.push(Candidate { implementation, origin });
        Ok(())
    }

    /// Declare a record or sum-type shape, making that type derivable.
    pub fn declare(&mut self, def: TypeDef) -> Result<(), ResolveError> {
        tracing::trace!(name = def.name(), "declared type");
        self.types.declare(def)
    }

    /// Declare the shape of `T`, if it has one.
    pub fn declare_type<T: Typed>(&mut self) -> Result<(), ResolveError> {
        match T::type_def() {
            Some(def) => self.declare(def),
            None => Ok(()),
        }
    }

    /// Direct candidates registered for exactly `ty`.
    pub fn candidates(&self, ty: &Ty) -> &[Candidate<C>] {
        self.instances.get(ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All candidates for `ty`: direct ones plus a derived one when every
    /// component of `ty` resolves. Uses the default resolver configuration.
    pub fn lookup(&self, ty: &Ty) -> Lookup<C> {
        Resolver::new(self).lookup(ty)
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Number of registered candidates across all types.
    pub fn len(&self) -> usize {
        self.instances.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A deterministic summary of every registered candidate and declared
    /// type, sorted by type.
    pub fn report(&self) -> TableReport {
        let mut instances: Vec<TypeEntry> = self
            .instances
            .iter()
            .filter(|(_, candidates)| !candidates.is_empty())
            .map(|(ty, candidates)| {
                let mut candidates: Vec<CandidateInfo> =
                    candidates.iter().map(Candidate::info).collect();
                candidates.sort_by(|a, b| {
                    b.priority
                        .cmp(&a.priority)
                        .then_with(|| a.scope.cmp(&b.scope))
                });
                TypeEntry { ty: ty.to_string(), candidates }
            })
            .collect();
        instances.sort_by(|a, b| a.ty.cmp(&b.ty));

        TableReport {
            instances,
            types: self.types.defs().into_iter().cloned().collect(),
        }
    }
}

impl<C: Contract> Default for InstanceTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Contract> Clone for InstanceTable<C> {
    fn clone(&self) -> Self {
        InstanceTable {
            instances: self.instances.clone(),
            types: self.types.clone(),
        }
    }
}

impl<C: Contract> fmt::Debug for InstanceTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceTable")
            .field("instances", &self.instances)
            .field("types", &self.types)
            .finish()
    }
}
