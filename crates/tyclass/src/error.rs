//! Resolution errors.
//!
//! Every failure is classified before any implementation runs. The four
//! resolution outcomes (`NoInstanceFound`, `AmbiguousInstance`,
//! `DuplicateDefinition`, `RecursiveDerivation`) plus `ConflictingTypeDef`
//! for inconsistent shape declarations.

use std::fmt;

use serde::Serialize;

use crate::table::Priority;
use crate::ty::Ty;

/// A candidate as reported in an ambiguity error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CandidateInfo {
    /// The implementation's label.
    pub label: String,
    /// The source scope that registered it.
    pub scope: String,
    pub priority: Priority,
}

impl fmt::Display for CandidateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` from {} ({})", self.label, self.scope, self.priority)
    }
}

/// An error encountered while registering or resolving instances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind")]
pub enum ResolveError {
    /// The type has no direct candidate and cannot be derived.
    ///
    /// `missing` is the type that actually lacked an instance. It equals
    /// `ty` unless the failure happened inside a derivation, in which case
    /// it names the offending component.
    #[error("no instance found for `{ty}`{}", missing_suffix(.ty, .missing))]
    NoInstanceFound { ty: Ty, missing: Ty },

    /// Two or more candidates tie at the top rank.
    #[error("ambiguous instance for `{ty}`: candidates [{}]", join_candidates(.candidates))]
    AmbiguousInstance {
        ty: Ty,
        candidates: Vec<CandidateInfo>,
    },

    /// A different implementation is already registered for the same type,
    /// priority and scope.
    #[error("duplicate instance for `{ty}` in {scope} ({priority})")]
    DuplicateDefinition {
        ty: Ty,
        scope: String,
        priority: Priority,
    },

    /// Deriving `ty` requires an instance for `ty` itself.
    ///
    /// `cycle` is the derivation path from the first occurrence of `ty`
    /// back to `ty`.
    #[error("recursive derivation for `{ty}`: {}", join_cycle(.cycle))]
    RecursiveDerivation { ty: Ty, cycle: Vec<Ty> },

    /// A type name was declared twice with different shapes.
    #[error("conflicting definitions for type `{name}`")]
    ConflictingTypeDef { name: String },
}

impl ResolveError {
    /// The type the error is about.
    pub fn ty(&self) -> Option<&Ty> {
        match self {
            ResolveError::NoInstanceFound { ty, .. }
            | ResolveError::AmbiguousInstance { ty, .. }
            | ResolveError::DuplicateDefinition { ty, .. }
            | ResolveError::RecursiveDerivation { ty, .. } => Some(ty),
            ResolveError::ConflictingTypeDef { .. } => None,
        }
    }
}

fn missing_suffix(ty: &Ty, missing: &Ty) -> String {
    if ty == missing {
        String::new()
    } else {
        format!(" (component `{}` has no instance)", missing)
    }
}

fn join_candidates(candidates: &[CandidateInfo]) -> String {
    candidates
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_cycle(cycle: &[Ty]) -> String {
    cycle
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
