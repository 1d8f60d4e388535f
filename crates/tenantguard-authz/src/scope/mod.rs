//! Token scopes.
//!
//! A token may carry scopes that narrow what its holder can do. This module
//! parses scope strings, translates them into policy rules, and validates
//! requested scopes against an OAuth client's restrictions.
//!
//! # Scope Grammar
//!
//! | Scope | Grants |
//! |-------|--------|
//! | `user:info` | read the requester's own user object |
//! | `user:check-access` | self subject access and rules reviews |
//! | `user:list-scoped-projects` | list projects visible to the token |
//! | `user:list-projects` | list all projects, read namespaces |
//! | `user:full` | everything the user can do |
//! | `role:<name>:<ns>` | the cluster role's rules in `<ns>` (or `*`), minus escalating resources |
//! | `role:<name>:<ns>:!` | the cluster role's rules, escalating resources included |

pub mod converter;
pub mod parse;
pub mod restrictions;

pub use converter::{
    ScopeDescription, default_supported_scopes, describe_scope, describe_scopes,
    discovery_rule, scopes_to_rules, scopes_to_visible_namespaces, validate_scopes,
};
pub use parse::{ClusterRoleScope, Scope, UserScope};
pub use restrictions::{
    service_account_client, service_account_scope_restrictions, validate_scope_restrictions,
};
