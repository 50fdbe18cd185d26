//! Call surfaces: resolve by a value's static type, then encode.
//!
//! Both forms select the binding from `T::type_of()` alone; the value is
//! only handed to the bound implementation afterwards.

use crate::contract::Contract;
use crate::error::ResolveError;
use crate::resolve::Resolver;
use crate::typed::Typed;

/// Encode `value` with the instance resolved for its static type.
pub fn encode<C, T>(resolver: &Resolver<'_, C>, value: &T) -> Result<C::Output, ResolveError>
where
    C: Contract,
    T: Typed,
{
    let binding = resolver.resolve_type::<T>()?;
    Ok(binding.encode(value))
}

/// Method form of [`encode`], available on every [`Typed`] value.
pub trait Encode: Typed + Sized {
    fn encode<C: Contract>(&self, resolver: &Resolver<'_, C>) -> Result<C::Output, ResolveError> {
        encode(resolver, self)
    }
}

impl<T: Typed> Encode for T {}
