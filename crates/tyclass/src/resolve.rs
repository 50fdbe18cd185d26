//! Instance resolution.
//!
//! Given a type, the [`Resolver`] selects exactly one [`Binding`] from the
//! instance table or fails:
//!
//! 1. Direct candidates registered for the exact type outrank any derived
//!    candidate. Among them the highest [`Priority`](crate::table::Priority)
//!    wins; candidates sharing an implementation collapse to one. A tie
//!    between distinct implementations is `AmbiguousInstance`.
//! 2. Without a direct candidate, a composite type is derived from the
//!    bindings of its components, resolved recursively under the same rules.
//!    A derivation that reaches a type already being derived fails with
//!    `RecursiveDerivation`.
//! 3. Otherwise `NoInstanceFound`.
//!
//! Resolution only reads the table and the type. Within one call every
//! component type is resolved once and its binding shared by all the places
//! that use it; nothing is kept between calls.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::ResolverConfig;
use crate::contract::{Contract, Implementation};
use crate::error::ResolveError;
use crate::table::{Candidate, InstanceTable, Origin};
use crate::ty::Ty;
use crate::typed::{Components, TypeDefs, Typed};
use crate::typedef::{Shape, TypeDef};

/// The result of a successful resolution.
pub enum Binding<C: Contract> {
    /// A registered candidate.
    Direct(Candidate<C>),
    /// An instance synthesized from the bindings of `ty`'s components.
    Derived { ty: Ty, derivation: Derivation<C> },
}

/// How a derived instance is assembled, one variant per composite shape.
///
/// Component bindings are shared: a type used by several fields is bound
/// once per resolution.
pub enum Derivation<C: Contract> {
    Record {
        name: String,
        fields: Vec<(String, Arc<Binding<C>>)>,
    },
    Sum {
        name: String,
        variants: Vec<(String, Vec<Arc<Binding<C>>>)>,
    },
    Tuple(Vec<Arc<Binding<C>>>),
    List(Arc<Binding<C>>),
    Option(Arc<Binding<C>>),
}

impl<C: Contract> Binding<C> {
    /// The type this binding encodes.
    pub fn ty(&self) -> &Ty {
        match self {
            Binding::Direct(c) => c.implementation.ty(),
            Binding::Derived { ty, .. } => ty,
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, Binding::Derived { .. })
    }

    /// The bound implementation, for direct bindings.
    pub fn implementation(&self) -> Option<&Implementation<C>> {
        match self {
            Binding::Direct(c) => Some(&c.implementation),
            Binding::Derived { .. } => None,
        }
    }

    /// Where the bound implementation was registered, for direct bindings.
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Binding::Direct(c) => Some(&c.origin),
            Binding::Derived { .. } => None,
        }
    }

    /// Whether both bindings select the same implementations in the same
    /// structure.
    pub fn same_as(&self, other: &Binding<C>) -> bool {
        self.same_as_in(other, &mut FxHashSet::default())
    }

    fn same_as_in(&self, other: &Binding<C>, seen: &mut SeenPairs) -> bool {
        match (self, other) {
            (Binding::Direct(a), Binding::Direct(b)) => a.implementation == b.implementation,
            (
                Binding::Derived { ty: ta, derivation: da },
                Binding::Derived { ty: tb, derivation: db },
            ) => ta == tb && da.same_as(db, seen),
            _ => false,
        }
    }

    /// Encode `value` with this binding.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a value of the Rust type the binding was
    /// resolved for. The call surfaces in [`crate::surface`] always pass a
    /// matching value.
    pub fn encode(&self, value: &dyn Typed) -> C::Output {
        match self {
            Binding::Direct(c) => c.implementation.encode(value),
            Binding::Derived { ty, derivation } => derivation.encode(ty, value),
        }
    }
}

impl<C: Contract> Clone for Binding<C> {
    fn clone(&self) -> Self {
        match self {
            Binding::Direct(c) => Binding::Direct(c.clone()),
            Binding::Derived { ty, derivation } => Binding::Derived {
                ty: ty.clone(),
                derivation: derivation.clone(),
            },
        }
    }
}

/// Pairs of shared bindings already found equal.
type SeenPairs = FxHashSet<(usize, usize)>;

fn same_binding<C: Contract>(a: &Arc<Binding<C>>, b: &Arc<Binding<C>>, seen: &mut SeenPairs) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }
    let key = (Arc::as_ptr(a) as usize, Arc::as_ptr(b) as usize);
    if seen.contains(&key) {
        return true;
    }
    let same = a.same_as_in(b, seen);
    if same {
        seen.insert(key);
    }
    same
}

fn all_same<C: Contract>(a: &[Arc<Binding<C>>], b: &[Arc<Binding<C>>], seen: &mut SeenPairs) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_binding(x, y, seen))
}

impl<C: Contract> Derivation<C> {
    fn same_as(&self, other: &Derivation<C>, seen: &mut SeenPairs) -> bool {
        match (self, other) {
            (Derivation::Record { fields: fa, .. }, Derivation::Record { fields: fb, .. }) => {
                fa.len() == fb.len()
                    && fa
                        .iter()
                        .zip(fb)
                        .all(|((na, ba), (nb, bb))| na == nb && same_binding(ba, bb, seen))
            }
            (Derivation::Sum { variants: va, .. }, Derivation::Sum { variants: vb, .. }) => {
                va.len() == vb.len()
                    && va
                        .iter()
                        .zip(vb)
                        .all(|((na, ba), (nb, bb))| na == nb && all_same(ba, bb, seen))
            }
            (Derivation::Tuple(a), Derivation::Tuple(b)) => all_same(a, b, seen),
            (Derivation::List(a), Derivation::List(b)) => same_binding(a, b, seen),
            (Derivation::Option(a), Derivation::Option(b)) => same_binding(a, b, seen),
            _ => false,
        }
    }

    fn encode(&self, ty: &Ty, value: &dyn Typed) -> C::Output {
        match (self, value.components()) {
            (Derivation::Record { name, fields }, Components::Record(values))
                if fields.len() == values.len() =>
            {
                let outputs = fields
                    .iter()
                    .zip(values)
                    .map(|((field, binding), (component, v))| {
                        if field != component {
                            shape_mismatch(ty);
                        }
                        (field.as_str(), binding.encode(v))
                    })
                    .collect();
                C::record(name, outputs)
            }
            (Derivation::Sum { name, variants }, Components::Variant { name: active, fields: values }) => {
                let Some((variant, bindings)) = variants.iter().find(|(v, _)| v == active) else {
                    shape_mismatch(ty)
                };
                if bindings.len() != values.len() {
                    shape_mismatch(ty);
                }
                let outputs = bindings
                    .iter()
                    .zip(values)
                    .map(|(binding, v)| binding.encode(v))
                    .collect();
                C::variant(name, variant, outputs)
            }
            (Derivation::Tuple(bindings), Components::Tuple(values))
                if bindings.len() == values.len() =>
            {
                let outputs = bindings
                    .iter()
                    .zip(values)
                    .map(|(binding, v)| binding.encode(v))
                    .collect();
                C::tuple(outputs)
            }
            (Derivation::List(elem), Components::List(values)) => {
                C::list(values.into_iter().map(|v| elem.encode(v)).collect())
            }
            (Derivation::Option(inner), Components::Option(value)) => {
                C::option(value.map(|v| inner.encode(v)))
            }
            _ => shape_mismatch(ty),
        }
    }
}

impl<C: Contract> Clone for Derivation<C> {
    fn clone(&self) -> Self {
        match self {
            Derivation::Record { name, fields } => Derivation::Record {
                name: name.clone(),
                fields: fields.clone(),
            },
            Derivation::Sum { name, variants } => Derivation::Sum {
                name: name.clone(),
                variants: variants.clone(),
            },
            Derivation::Tuple(items) => Derivation::Tuple(items.clone()),
            Derivation::List(elem) => Derivation::List(Arc::clone(elem)),
            Derivation::Option(inner) => Derivation::Option(Arc::clone(inner)),
        }
    }
}

fn shape_mismatch(ty: &Ty) -> ! {
    panic!("value components do not match the shape of `{}`", ty)
}

impl<C: Contract> fmt::Display for Binding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Direct(c) => write!(f, "{}", c.implementation.label()),
            Binding::Derived { ty, derivation } => write!(f, "derived {}", DerivationDisplay(ty, derivation)),
        }
    }
}

impl<C: Contract> fmt::Debug for Binding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binding({})", self)
    }
}

struct DerivationDisplay<'a, C: Contract>(&'a Ty, &'a Derivation<C>);

impl<C: Contract> fmt::Display for DerivationDisplay<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<C: Contract>(f: &mut fmt::Formatter<'_>, items: &[Arc<Binding<C>>]) -> fmt::Result {
            for (i, b) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", b)?;
            }
            Ok(())
        }

        let DerivationDisplay(ty, derivation) = self;
        match derivation {
            Derivation::Record { name, fields } => {
                write!(f, "{} {{ ", name)?;
                for (i, (field, b)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field, b)?;
                }
                write!(f, " }}")
            }
            Derivation::Sum { name, variants } => {
                write!(f, "{} {{ ", name)?;
                for (i, (variant, bindings)) in variants.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}(", variant)?;
                    list(f, bindings)?;
                    write!(f, ")")?;
                }
                write!(f, " }}")
            }
            Derivation::Tuple(items) => {
                write!(f, "(")?;
                list(f, items)?;
                write!(f, ")")
            }
            Derivation::List(elem) | Derivation::Option(elem) => {
                write!(f, "{}[{}]", ty.head_name().unwrap_or("?"), elem)
            }
        }
    }
}

/// Whether (and how) a type can be derived, as reported by [`Resolver::lookup`].
pub enum Derivability<C: Contract> {
    /// The type has no derivable shape.
    NotComposite,
    /// Every component resolved; this is the derived candidate.
    Derived(Binding<C>),
    /// The type is composite but a component failed to resolve.
    Blocked(ResolveError),
}

/// Every candidate for one type.
pub struct Lookup<C: Contract> {
    pub ty: Ty,
    pub direct: Vec<Candidate<C>>,
    pub derived: Derivability<C>,
}

impl<C: Contract> Lookup<C> {
    /// Number of candidates: direct ones plus the derived one, if any.
    pub fn len(&self) -> usize {
        self.direct.len() + usize::from(matches!(self.derived, Derivability::Derived(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// State of one resolution call.
struct Pass<C: Contract> {
    /// Types whose derivation is under way, outermost first.
    in_progress: Vec<Ty>,
    /// Completed bindings. A binding that succeeded once cannot fail
    /// elsewhere in the same pass: a cycle through it would have failed it.
    done: FxHashMap<Ty, Arc<Binding<C>>>,
    /// Shapes the caller's Rust type expects for named types, by name.
    expected: TypeDefs,
}

impl<C: Contract> Pass<C> {
    fn new() -> Self {
        Self::expecting(TypeDefs::default())
    }

    fn expecting(expected: TypeDefs) -> Self {
        Pass {
            in_progress: Vec::new(),
            done: FxHashMap::default(),
            expected,
        }
    }

    /// Whether the declared `shape` of `ty` disagrees with the shape the
    /// Rust type expects.
    fn conflicts(&self, ty: &Ty, shape: &Shape) -> bool {
        let Some(expected) = ty.head_name().and_then(|name| self.expected.get(name)) else {
            return false;
        };
        match (shape, expected) {
            (Shape::Record(declared), TypeDef::Record(expected)) => declared != expected,
            (Shape::Sum(declared), TypeDef::Sum(expected)) => declared != expected,
            (Shape::Record(_) | Shape::Sum(_), _) => true,
            _ => false,
        }
    }
}

/// Selects bindings from an instance table.
pub struct Resolver<'t, C: Contract> {
    table: &'t InstanceTable<C>,
    config: ResolverConfig,
}

impl<'t, C: Contract> Clone for Resolver<'t, C> {
    fn clone(&self) -> Self {
        Resolver { table: self.table, config: self.config }
    }
}

impl<'t, C: Contract> Resolver<'t, C> {
    /// A resolver with the default configuration.
    pub fn new(table: &'t InstanceTable<C>) -> Self {
        Self::with_config(table, ResolverConfig::default())
    }

    pub fn with_config(table: &'t InstanceTable<C>, config: ResolverConfig) -> Self {
        Resolver { table, config }
    }

    pub fn table(&self) -> &'t InstanceTable<C> {
        self.table
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the binding for `ty`.
    pub fn resolve(&self, ty: &Ty) -> Result<Binding<C>, ResolveError> {
        self.resolve_with(ty, Pass::new())
    }

    /// Resolve the binding for the static type of `T`.
    ///
    /// Every record or sum type derived along the way must be declared in
    /// the table with the shape `T` itself describes (see
    /// [`Typed::collect_type_defs`]); a table that declares the same name
    /// differently fails with `ConflictingTypeDef`.
    pub fn resolve_type<T: Typed>(&self) -> Result<Binding<C>, ResolveError> {
        let mut expected = TypeDefs::default();
        T::collect_type_defs(&mut expected);
        self.resolve_with(&T::type_of(), Pass::expecting(expected))
    }

    /// Gather every candidate for `ty` without ranking them.
    ///
    /// Unlike [`resolve`](Self::resolve), this always attempts the
    /// derivation, even when direct candidates exist.
    pub fn lookup(&self, ty: &Ty) -> Lookup<C> {
        let direct = self.table.candidates(ty).to_vec();
        let derived = match self.derivable_shape(ty) {
            None => Derivability::NotComposite,
            Some(shape) => match self.derive(ty, shape, &mut Pass::new()) {
                Ok(binding) => Derivability::Derived(binding),
                Err(err) => Derivability::Blocked(err),
            },
        };
        Lookup { ty: ty.clone(), direct, derived }
    }

    fn resolve_with(&self, ty: &Ty, mut pass: Pass<C>) -> Result<Binding<C>, ResolveError> {
        let result = self.resolve_in(ty, &mut pass);
        drop(pass);
        match &result {
            Ok(binding) => tracing::debug!(
                ty = %ty,
                derived = binding.is_derived(),
                label = binding.implementation().map(Implementation::label),
                "resolved instance"
            ),
            Err(err) => tracing::debug!(ty = %ty, error = %err, "instance resolution failed"),
        }
        result.map(|binding| Arc::try_unwrap(binding).unwrap_or_else(|shared| Binding::clone(&shared)))
    }

    fn resolve_in(&self, ty: &Ty, pass: &mut Pass<C>) -> Result<Arc<Binding<C>>, ResolveError> {
        if let Some(done) = pass.done.get(ty) {
            return Ok(Arc::clone(done));
        }

        let direct = self.table.candidates(ty);
        let binding = if !direct.is_empty() {
            select_direct(ty, direct)?
        } else {
            match self.derivable_shape(ty) {
                Some(shape) => self.derive(ty, shape, pass)?,
                None => {
                    return Err(ResolveError::NoInstanceFound {
                        ty: ty.clone(),
                        missing: ty.clone(),
                    })
                }
            }
        };

        let binding = Arc::new(binding);
        pass.done.insert(ty.clone(), Arc::clone(&binding));
        Ok(binding)
    }

    fn derivable_shape(&self, ty: &Ty) -> Option<Shape> {
        self.table
            .types()
            .shape_of(ty)
            .filter(|shape| self.config.derive.allows(shape))
    }

    fn derive(&self, ty: &Ty, shape: Shape, pass: &mut Pass<C>) -> Result<Binding<C>, ResolveError> {
        if let Some(pos) = pass.in_progress.iter().position(|t| t == ty) {
            let mut cycle = pass.in_progress[pos..].to_vec();
            cycle.push(ty.clone());
            return Err(ResolveError::RecursiveDerivation { ty: ty.clone(), cycle });
        }
        if pass.conflicts(ty, &shape) {
            return Err(ResolveError::ConflictingTypeDef {
                name: ty.head_name().unwrap_or_default().to_string(),
            });
        }

        tracing::trace!(ty = %ty, depth = pass.in_progress.len(), "deriving instance");
        pass.in_progress.push(ty.clone());
        let result = self.derive_shape(shape, pass);
        pass.in_progress.pop();

        match result {
            Ok(derivation) => Ok(Binding::Derived { ty: ty.clone(), derivation }),
            // Report the composite being resolved, keep the leaf that was missing.
            Err(ResolveError::NoInstanceFound { missing, .. }) => {
                Err(ResolveError::NoInstanceFound { ty: ty.clone(), missing })
            }
            Err(other) => Err(other),
        }
    }

    fn derive_shape(&self, shape: Shape, pass: &mut Pass<C>) -> Result<Derivation<C>, ResolveError> {
        match shape {
            Shape::Record(def) => {
                let mut fields = Vec::with_capacity(def.fields.len());
                for (name, field_ty) in def.fields {
                    let binding = self.resolve_in(&field_ty, pass)?;
                    fields.push((name, binding));
                }
                Ok(Derivation::Record { name: def.name, fields })
            }
            Shape::Sum(def) => {
                let mut variants = Vec::with_capacity(def.variants.len());
                for variant in def.variants {
                    let bindings = self.resolve_all(&variant.fields, pass)?;
                    variants.push((variant.name, bindings));
                }
                Ok(Derivation::Sum { name: def.name, variants })
            }
            Shape::Tuple(elems) => Ok(Derivation::Tuple(self.resolve_all(&elems, pass)?)),
            Shape::List(elem) => Ok(Derivation::List(self.resolve_in(&elem, pass)?)),
            Shape::Option(inner) => Ok(Derivation::Option(self.resolve_in(&inner, pass)?)),
        }
    }

    fn resolve_all(&self, tys: &[Ty], pass: &mut Pass<C>) -> Result<Vec<Arc<Binding<C>>>, ResolveError> {
        tys.iter().map(|t| self.resolve_in(t, pass)).collect()
    }
}

/// Rank direct candidates: highest priority wins, one implementation only.
fn select_direct<C: Contract>(ty: &Ty, direct: &[Candidate<C>]) -> Result<Binding<C>, ResolveError> {
    let Some(top) = direct.iter().map(Candidate::priority).max() else {
        return Err(ResolveError::NoInstanceFound { ty: ty.clone(), missing: ty.clone() });
    };

    let mut winners: Vec<&Candidate<C>> = direct.iter().filter(|c| c.priority() == top).collect();
    winners.sort_by(|a, b| {
        a.implementation
            .id()
            .cmp(&b.implementation.id())
            .then_with(|| a.origin.scope.cmp(&b.origin.scope))
    });
    winners.dedup_by(|a, b| a.implementation == b.implementation);

    match winners.as_slice() {
        [only] => Ok(Binding::Direct((*only).clone())),
        _ => {
            let mut candidates: Vec<_> = winners.iter().map(|c| c.info()).collect();
            candidates.sort_by(|a, b| a.scope.cmp(&b.scope).then_with(|| a.label.cmp(&b.label)));
            Err(ResolveError::AmbiguousInstance { ty: ty.clone(), candidates })
        }
    }
}
