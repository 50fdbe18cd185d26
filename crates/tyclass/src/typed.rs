//! Static types of Rust values.
//!
//! [`Typed`] maps a Rust type to its [`Ty`] through an associated function,
//! so the type is known without looking at any value. Values only expose
//! their component values (fields, elements) for derived encoding, after a
//! binding has already been resolved.

use std::any::Any;

use rustc_hash::FxHashMap;

use crate::ty::Ty;
use crate::typedef::TypeDef;

/// Declared shapes keyed by type name.
pub type TypeDefs = FxHashMap<String, TypeDef>;

/// Component values of a composite value, in the order of its shape.
pub enum Components<'a> {
    /// Not composite (or composite but not exposed).
    Opaque,
    /// Record fields in declaration order.
    Record(Vec<(&'static str, &'a dyn Typed)>),
    /// The active variant of a sum type and its positional fields.
    Variant {
        name: &'static str,
        fields: Vec<&'a dyn Typed>,
    },
    Tuple(Vec<&'a dyn Typed>),
    List(Vec<&'a dyn Typed>),
    Option(Option<&'a dyn Typed>),
}

/// A Rust type with a static type identity.
///
/// Exactly one Rust type should claim a given `Ty`: implementations bound to
/// a `Ty` downcast the value to the Rust type they were created for.
pub trait Typed: Any {
    /// The static type of every value of `Self`.
    fn type_of() -> Ty
    where
        Self: Sized;

    /// The declared shape of `Self`, for named composite types.
    fn type_def() -> Option<TypeDef>
    where
        Self: Sized,
    {
        None
    }

    /// Add the declared shape of `Self` and of every named type reachable
    /// from its components to `defs`. Names already present are skipped,
    /// which also stops recursive types.
    fn collect_type_defs(defs: &mut TypeDefs)
    where
        Self: Sized,
    {
        if let Some(def) = Self::type_def() {
            defs.entry(def.name().to_string()).or_insert(def);
        }
    }

    /// This value's components, matching the shape of `type_of()`.
    fn components(&self) -> Components<'_> {
        Components::Opaque
    }

    fn as_any(&self) -> &dyn Any;
}

macro_rules! impl_typed_scalar {
    ($($rust:ty => $ctor:ident),* $(,)?) => {
        $(
            impl Typed for $rust {
                fn type_of() -> Ty {
                    Ty::$ctor()
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        )*
    };
}

impl_typed_scalar! {
    i64 => int,
    f64 => float,
    bool => bool,
    String => string,
}

impl<T: Typed> Typed for Vec<T> {
    fn type_of() -> Ty {
        Ty::list(T::type_of())
    }

    fn collect_type_defs(defs: &mut TypeDefs) {
        T::collect_type_defs(defs);
    }

    fn components(&self) -> Components<'_> {
        Components::List(self.iter().map(|v| v as &dyn Typed).collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Typed> Typed for Option<T> {
    fn type_of() -> Ty {
        Ty::option(T::type_of())
    }

    fn collect_type_defs(defs: &mut TypeDefs) {
        T::collect_type_defs(defs);
    }

    fn components(&self) -> Components<'_> {
        Components::Option(self.as_ref().map(|v| v as &dyn Typed))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

macro_rules! impl_typed_tuple {
    ($(($($name:ident . $idx:tt),+)),* $(,)?) => {
        $(
            impl<$($name: Typed),+> Typed for ($($name,)+) {
                fn type_of() -> Ty {
                    Ty::tuple(vec![$($name::type_of()),+])
                }

                fn collect_type_defs(defs: &mut TypeDefs) {
                    $($name::collect_type_defs(defs);)+
                }

                fn components(&self) -> Components<'_> {
                    Components::Tuple(vec![$(&self.$idx as &dyn Typed),+])
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        )*
    };
}

impl_typed_tuple! {
    (A.0, B.1),
    (A.0, B.1, C.2),
    (A.0, B.1, C.2, D.3),
}

/// Declare a struct together with its [`Typed`] impl and record shape.
///
/// ```
/// tyclass::record! {
///     #[derive(Debug, Clone)]
///     pub struct Person {
///         pub name: String,
///         pub email: String,
///     }
/// }
///
/// use tyclass::Typed;
/// assert_eq!(Person::type_of().to_string(), "Person");
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $fty ),*
        }

        impl $crate::Typed for $name {
            fn type_of() -> $crate::Ty {
                $crate::Ty::named(stringify!($name))
            }

            fn type_def() -> ::std::option::Option<$crate::TypeDef> {
                ::std::option::Option::Some($crate::TypeDef::Record($crate::RecordDef {
                    name: stringify!($name).to_string(),
                    fields: vec![
                        $( (stringify!($field).to_string(), <$fty as $crate::Typed>::type_of()) ),*
                    ],
                }))
            }

            fn collect_type_defs(defs: &mut $crate::TypeDefs) {
                if defs.contains_key(stringify!($name)) {
                    return;
                }
                if let ::std::option::Option::Some(def) = <Self as $crate::Typed>::type_def() {
                    defs.insert(stringify!($name).to_string(), def);
                }
                $( <$fty as $crate::Typed>::collect_type_defs(defs); )*
            }

            fn components(&self) -> $crate::Components<'_> {
                $crate::Components::Record(vec![
                    $( (stringify!($field), &self.$field as &dyn $crate::Typed) ),*
                ])
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}

/// Give an existing type an opaque named [`Typed`] identity.
///
/// Opaque types are never derived; they need a direct instance.
#[macro_export]
macro_rules! opaque_type {
    ($name:ident) => {
        $crate::opaque_type!($name as stringify!($name));
    };
    ($name:ident as $ty_name:expr) => {
        impl $crate::Typed for $name {
            fn type_of() -> $crate::Ty {
                $crate::Ty::named($ty_name)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}
