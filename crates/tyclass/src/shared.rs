//! An instance table that accepts registrations while readers resolve.
//!
//! Readers load the current snapshot without locking and keep it for as
//! long as they like; a snapshot never changes once published. Writers are
//! serialized by a mutex, copy the current snapshot, apply their change and
//! publish the copy.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::contract::{Contract, Implementation};
use crate::error::ResolveError;
use crate::table::{InstanceTable, Origin};
use crate::typedef::TypeDef;

pub struct SharedTable<C: Contract> {
    current: ArcSwap<InstanceTable<C>>,
    writer: Mutex<()>,
}

impl<C: Contract> SharedTable<C> {
    pub fn new() -> Self {
        Self::from_table(InstanceTable::new())
    }

    /// Start from an already assembled table.
    pub fn from_table(table: InstanceTable<C>) -> Self {
        SharedTable {
            current: ArcSwap::from_pointee(table),
            writer: Mutex::new(()),
        }
    }

    /// The current snapshot. Later writes do not affect it.
    pub fn snapshot(&self) -> Arc<InstanceTable<C>> {
        self.current.load_full()
    }

    pub fn register(
        &self,
        implementation: Implementation<C>,
        origin: Origin,
    ) -> Result<(), ResolveError> {
        self.update(|table| table.register(implementation, origin))
    }

    pub fn declare(&self, def: TypeDef) -> Result<(), ResolveError> {
        self.update(|table| table.declare(def))
    }

    /// Apply `f` to a copy of the current table and publish it.
    ///
    /// Nothing is published if `f` fails, so a batch of registrations is
    /// all-or-nothing.
    pub fn update<F>(&self, f: F) -> Result<(), ResolveError>
    where
        F: FnOnce(&mut InstanceTable<C>) -> Result<(), ResolveError>,
    {
        let _guard = self.writer.lock();
        let mut next = InstanceTable::clone(&self.current.load());
        f(&mut next)?;
        tracing::trace!(instances = next.len(), "publishing instance table snapshot");
        self.current.store(Arc::new(next));
        Ok(())
    }
}

impl<C: Contract> Default for SharedTable<C> {
    fn default() -> Self {
        Self::new()
    }
}
