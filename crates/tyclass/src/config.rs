//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::typedef::Shape;

/// Which composite shapes may receive a derived instance.
///
/// A shape whose flag is off is treated as non-composite: the type then
/// needs a direct instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivePolicy {
    pub records: bool,
    pub sums: bool,
    pub tuples: bool,
    pub lists: bool,
    pub options: bool,
}

impl DerivePolicy {
    /// Derive nothing; every type needs a direct instance.
    pub fn none() -> Self {
        DerivePolicy {
            records: false,
            sums: false,
            tuples: false,
            lists: false,
            options: false,
        }
    }

    pub fn allows(&self, shape: &Shape) -> bool {
        match shape {
            Shape::Record(_) => self.records,
            Shape::Sum(_) => self.sums,
            Shape::Tuple(_) => self.tuples,
            Shape::List(_) => self.lists,
            Shape::Option(_) => self.options,
        }
    }
}

impl Default for DerivePolicy {
    fn default() -> Self {
        DerivePolicy {
            records: true,
            sums: true,
            tuples: true,
            lists: true,
            options: true,
        }
    }
}

/// Settings for a [`Resolver`](crate::resolve::Resolver).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub derive: DerivePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Ty;

    #[test]
    fn default_derives_everything() {
        let policy = DerivePolicy::default();
        assert!(policy.allows(&Shape::List(Ty::int())));
        assert!(policy.allows(&Shape::Tuple(vec![])));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{ "derive": { "lists": false } }"#).unwrap();
        assert!(!config.derive.lists);
        assert!(config.derive.records);
        assert!(config.derive.options);
    }

    #[test]
    fn empty_config_is_default() {
        let config: ResolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ResolverConfig::default());
    }
}
