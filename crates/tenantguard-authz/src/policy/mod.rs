//! Policy primitives: rule matching, effective-rule resolution and the
//! default bootstrap policy.
//!
//! # Components
//!
//! - [`matcher`] - pure matching of one action against one rule
//! - [`rules`] - [`BindingRuleResolver`], rules granted through bindings
//! - [`bootstrap`] - [`bootstrap_policy`], the default cluster roles

pub mod bootstrap;
pub mod matcher;
pub mod rules;

pub use bootstrap::{BootstrapPolicy, bootstrap_policy};
pub use matcher::{rule_matches, rules_allow};
pub use rules::BindingRuleResolver;
