//! Type-class style instance resolution.
//!
//! A [`Contract`] is a behavior (an encoder, say) that many types can
//! implement. Implementations are registered in an [`InstanceTable`] under
//! the type they serve, each tagged with the priority and scope of the
//! source that registered it. Given the static type of a value, the
//! [`Resolver`] selects exactly one implementation or fails with a
//! [`ResolveError`]:
//!
//! - a direct registration for the type beats a derived instance,
//! - among direct registrations the highest [`Priority`] wins,
//! - records, sum types, tuples, lists and options without a direct
//!   registration get an instance derived from their components.
//!
//! Selection depends only on the type, never on the runtime value, and
//! every failure is reported before any implementation runs.
//!
//! ```
//! use tyclass::{encode, Contract, Implementation, InstanceTable, Origin, Resolver};
//!
//! struct Show;
//!
//! impl Contract for Show {
//!     type Output = String;
//!     fn record(name: &str, fields: Vec<(&str, String)>) -> String {
//!         let fields: Vec<String> = fields.into_iter().map(|(k, v)| format!("{k}: {v}")).collect();
//!         format!("{name} {{ {} }}", fields.join(", "))
//!     }
//!     fn variant(_: &str, variant: &str, fields: Vec<String>) -> String {
//!         format!("{variant}({})", fields.join(", "))
//!     }
//!     fn tuple(items: Vec<String>) -> String { format!("({})", items.join(", ")) }
//!     fn list(items: Vec<String>) -> String { format!("[{}]", items.join(", ")) }
//!     fn option(item: Option<String>) -> String { item.unwrap_or_else(|| "none".into()) }
//! }
//!
//! tyclass::record! {
//!     struct Person {
//!         name: String,
//!         email: String,
//!     }
//! }
//!
//! let mut table = InstanceTable::<Show>::new();
//! table.register(Implementation::new("string", |s: &String| format!("{s:?}")), Origin::builtin("core")).unwrap();
//! table.declare_type::<Person>().unwrap();
//!
//! let resolver = Resolver::new(&table);
//! let person = Person { name: "Ada".into(), email: "ada@example.com".into() };
//! assert_eq!(
//!     encode(&resolver, &person).unwrap(),
//!     r#"Person { name: "Ada", email: "ada@example.com" }"#
//! );
//! ```

pub mod config;
pub mod contract;
pub mod diagnostics;
pub mod error;
pub mod resolve;
pub mod scope;
pub mod shared;
pub mod surface;
pub mod table;
pub mod ty;
pub mod typed;
pub mod typedef;

pub use config::{DerivePolicy, ResolverConfig};
pub use contract::{Contract, ImplId, Implementation};
pub use error::{CandidateInfo, ResolveError};
pub use resolve::{Binding, Derivability, Derivation, Lookup, Resolver};
pub use scope::{InstanceSource, ScopeBuilder};
pub use shared::SharedTable;
pub use surface::{encode, Encode};
pub use table::{Candidate, InstanceTable, Origin, Priority, TableReport, TypeEntry};
pub use ty::{Ty, TyCon};
pub use typed::{Components, TypeDefs, Typed};
pub use typedef::{RecordDef, Shape, SumDef, TypeDef, TypeRegistry, VariantDef};
