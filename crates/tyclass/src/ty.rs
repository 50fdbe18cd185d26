//! Type identities used as instance-resolution keys.
//!
//! A `Ty` is the static type of a value. Resolution looks candidates up by
//! exact `Ty` equality and decides derivability from the type's shape
//! (tuples, applied `List`/`Option` constructors, declared records and sum
//! types).

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// A named type: `Int`, `List`, `Person`.
///
/// Identity is the name alone. `module` records where the name was reached
/// from and only shows up when the type is printed (`billing.Invoice`).
#[derive(Clone, Debug, Serialize)]
pub struct TyCon {
    pub name: String,
    #[serde(rename = "module", skip_serializing_if = "Option::is_none")]
    pub display_prefix: Option<String>,
}

impl TyCon {
    pub fn new(name: impl Into<String>) -> Self {
        TyCon {
            name: name.into(),
            display_prefix: None,
        }
    }

    /// A constructor that prints qualified by `module`.
    pub fn with_module(name: impl Into<String>, module: impl Into<String>) -> Self {
        TyCon {
            display_prefix: Some(module.into()),
            ..TyCon::new(name)
        }
    }
}

impl PartialEq for TyCon {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TyCon {}

impl Hash for TyCon {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_prefix {
            Some(module) => write!(f, "{}.{}", module, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A static type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Ty {
    /// A nullary named type.
    Con(TyCon),
    /// A constructor applied to arguments: `List<Int>`, `Option<Person>`.
    App(Box<Ty>, Vec<Ty>),
    /// `(Int, String, Bool)`.
    Tuple(Vec<Ty>),
}

impl Ty {
    fn con(name: &str) -> Ty {
        Ty::Con(TyCon::new(name))
    }

    fn apply(name: &str, args: Vec<Ty>) -> Ty {
        Ty::App(Box::new(Ty::con(name)), args)
    }

    pub fn int() -> Ty {
        Ty::con("Int")
    }

    pub fn float() -> Ty {
        Ty::con("Float")
    }

    pub fn string() -> Ty {
        Ty::con("String")
    }

    pub fn bool() -> Ty {
        Ty::con("Bool")
    }

    /// `List<inner>`.
    pub fn list(inner: Ty) -> Ty {
        Ty::apply("List", vec![inner])
    }

    /// `Option<inner>`.
    pub fn option(inner: Ty) -> Ty {
        Ty::apply("Option", vec![inner])
    }

    pub fn tuple(elems: Vec<Ty>) -> Ty {
        Ty::Tuple(elems)
    }

    /// A user-declared type such as a record or sum type.
    pub fn named(name: impl Into<String>) -> Ty {
        Ty::Con(TyCon::new(name))
    }

    /// The constructor name at the head of this type, if any.
    ///
    /// `Person` -> `Some("Person")`, `List<Int>` -> `Some("List")`,
    /// tuples -> `None`.
    pub fn head_name(&self) -> Option<&str> {
        match self {
            Ty::Con(con) => Some(&con.name),
            Ty::App(base, _) => base.head_name(),
            Ty::Tuple(_) => None,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, tys: &[Ty]) -> fmt::Result {
    for (i, ty) in tys.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Con(con) => write!(f, "{}", con),
            Ty::App(base, args) if args.is_empty() => write!(f, "{}", base),
            Ty::App(base, args) => {
                write!(f, "{}<", base)?;
                write_joined(f, args)?;
                f.write_str(">")
            }
            Ty::Tuple(elems) => {
                f.write_str("(")?;
                write_joined(f, elems)?;
                f.write_str(")")
            }
        }
    }
}
