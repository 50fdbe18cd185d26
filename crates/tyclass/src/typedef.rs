//! Declared type shapes: records and sum types.
//!
//! Named types are opaque to the resolver unless their shape is declared
//! here. A declared shape makes the type composite, so an instance can be
//! derived for it from instances of its field types.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::ResolveError;
use crate::ty::Ty;

/// A record (struct) definition: named fields in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordDef {
    /// The record's name.
    pub name: String,
    /// Field names and their types.
    pub fields: Vec<(String, Ty)>,
}

/// A single variant of a sum type, with positional fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VariantDef {
    pub name: String,
    pub fields: Vec<Ty>,
}

/// A sum type definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SumDef {
    pub name: String,
    pub variants: Vec<VariantDef>,
}

/// A declared type shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDef {
    Record(RecordDef),
    Sum(SumDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Record(r) => &r.name,
            TypeDef::Sum(s) => &s.name,
        }
    }

    /// The named type this definition describes.
    pub fn ty(&self) -> Ty {
        Ty::named(self.name())
    }
}

/// The structural view of a composite type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    Record(RecordDef),
    Sum(SumDef),
    Tuple(Vec<Ty>),
    List(Ty),
    Option(Ty),
}

/// Registry of declared record and sum-type shapes, keyed by type name.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    defs: FxHashMap<String, TypeDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type shape.
    ///
    /// Redeclaring a name with an identical shape is a no-op; a different
    /// shape under the same name is rejected.
    pub fn declare(&mut self, def: TypeDef) -> Result<(), ResolveError> {
        match self.defs.get(def.name()) {
            Some(existing) if *existing == def => Ok(()),
            Some(_) => Err(ResolveError::ConflictingTypeDef {
                name: def.name().to_string(),
            }),
            None => {
                self.defs.insert(def.name().to_string(), def);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.defs.get(name)
    }

    /// All declared definitions, sorted by name.
    pub fn defs(&self) -> Vec<&TypeDef> {
        let mut defs: Vec<&TypeDef> = self.defs.values().collect();
        defs.sort_by(|a, b| a.name().cmp(b.name()));
        defs
    }

    /// The structural shape of `ty`, or `None` if it is not composite.
    ///
    /// Tuples, `List<T>` and `Option<T>` are intrinsically composite. A
    /// plain named type is composite only if its shape was declared.
    pub fn shape_of(&self, ty: &Ty) -> Option<Shape> {
        match ty {
            Ty::Tuple(elems) => Some(Shape::Tuple(elems.clone())),
            Ty::App(base, args) => match (base.head_name(), args.as_slice()) {
                (Some("List"), [inner]) => Some(Shape::List(inner.clone())),
                (Some("Option"), [inner]) => Some(Shape::Option(inner.clone())),
                _ => None,
            },
            Ty::Con(con) => match self.defs.get(&con.name)? {
                TypeDef::Record(r) => Some(Shape::Record(r.clone())),
                TypeDef::Sum(s) => Some(Shape::Sum(s.clone())),
            },
        }
    }
}
