//! The behavior contract and its implementations.
//!
//! A [`Contract`] names the Output type every implementation produces and
//! how a derived instance assembles component outputs. An
//! [`Implementation`] is one opaque `encode(value) -> Output` unit bound to
//! exactly one type.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::ty::Ty;
use crate::typed::Typed;

/// A behavior that can be implemented for arbitrary types.
///
/// The combinators are only used for derived instances. The engine never
/// inspects an `Output`; it passes component outputs straight into these.
pub trait Contract: 'static {
    type Output;

    /// Combine the outputs of a record's fields.
    fn record(type_name: &str, fields: Vec<(&str, Self::Output)>) -> Self::Output;

    /// Combine the outputs of a sum-type variant's positional fields.
    fn variant(type_name: &str, variant: &str, fields: Vec<Self::Output>) -> Self::Output;

    fn tuple(items: Vec<Self::Output>) -> Self::Output;

    fn list(items: Vec<Self::Output>) -> Self::Output;

    fn option(item: Option<Self::Output>) -> Self::Output;
}

/// Process-unique identity of an implementation. Clones share it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ImplId(u64);

impl ImplId {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        ImplId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

type EncodeFn<C> = dyn Fn(&dyn Typed) -> <C as Contract>::Output + Send + Sync;

/// An implementation of contract `C` for one type.
pub struct Implementation<C: Contract> {
    id: ImplId,
    label: Arc<str>,
    ty: Ty,
    type_name: &'static str,
    encode_fn: Arc<EncodeFn<C>>,
}

impl<C: Contract> Implementation<C> {
    /// Create an implementation for the Rust type `T`, bound to `T::type_of()`.
    pub fn new<T, F>(label: impl Into<Arc<str>>, encode: F) -> Self
    where
        T: Typed,
        F: Fn(&T) -> C::Output + Send + Sync + 'static,
    {
        let label = label.into();
        let type_name = std::any::type_name::<T>();
        let panic_label = label.clone();
        let encode_fn = move |value: &dyn Typed| match value.as_any().downcast_ref::<T>() {
            Some(v) => encode(v),
            None => panic!(
                "implementation `{}` received a value that is not a `{}`",
                panic_label, type_name
            ),
        };
        Implementation {
            id: ImplId::fresh(),
            label,
            ty: T::type_of(),
            type_name,
            encode_fn: Arc::new(encode_fn),
        }
    }

    pub fn id(&self) -> ImplId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The type this implementation is bound to.
    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    /// Run the implementation.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not of the Rust type the implementation was
    /// created for.
    pub fn encode(&self, value: &dyn Typed) -> C::Output {
        (self.encode_fn)(value)
    }
}

impl<C: Contract> Clone for Implementation<C> {
    fn clone(&self) -> Self {
        Implementation {
            id: self.id,
            label: self.label.clone(),
            ty: self.ty.clone(),
            type_name: self.type_name,
            encode_fn: self.encode_fn.clone(),
        }
    }
}

impl<C: Contract> PartialEq for Implementation<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C: Contract> Eq for Implementation<C> {}

impl<C: Contract> fmt::Debug for Implementation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("ty", &self.ty)
            .field("rust_type", &self.type_name)
            .finish()
    }
}
