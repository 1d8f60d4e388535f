//! # tenantguard-authz
//!
//! Authorization decision engine for multi-tenant cluster APIs.
//!
//! Given a principal and a requested action, the engine decides Allow, Deny
//! or no opinion and explains why. It provides:
//! - Rule matching over verbs, API groups, resources, names and URLs
//! - Namespace-scoped role binding evaluation and the reverse "who can" query
//! - Token scope translation with escalation protection
//! - An access restriction veto layer that fails closed
//! - Templated denial messages
//! - A default bootstrap policy
//!
//! ## Overview
//!
//! The engine is stateless and synchronous. Policy objects are read through
//! the lookup traits in [`storage`], which the host backs with its own
//! in-memory caches. Authorizers are `Send + Sync` and meant to be shared
//! behind an `Arc` across request handlers.
//!
//! ```ignore
//! use std::sync::Arc;
//! use tenantguard_authz::prelude::*;
//!
//! let policy = Arc::new(StaticPolicyStore::from_bootstrap(bootstrap_policy("")));
//! let catalog = Arc::new(StaticCatalog::new());
//! let chain = AuthorizerChain::from_stores(policy, catalog, &AuthzConfig::default());
//!
//! let principal = Principal::new("system:admin");
//! let action = Action::resource("delete", "pods").in_namespace("ns").build();
//! assert!(chain.authorize(&principal, &action).is_allowed());
//! ```
//!
//! ## Modules
//!
//! - [`authorizer`] - the authorizer layers and their composition
//! - [`config`] - engine configuration
//! - [`error`] - error types and partial results
//! - [`policy`] - rule matching, rule resolution and bootstrap policy
//! - [`scope`] - token scope parsing, translation and client restrictions
//! - [`selector`] - label selectors over the external catalogs
//! - [`storage`] - lookup traits and in-memory snapshots
//! - [`types`] - domain types

pub mod authorizer;
pub mod config;
pub mod error;
pub mod policy;
pub mod scope;
pub mod selector;
pub mod storage;
pub mod types;

pub use authorizer::{
    AccessRestrictionAuthorizer, AllowedSubjects, Authorizer, AuthorizerChain,
    ForbiddenMessageResolver, NamespaceRuleAuthorizer, ScopeLimitedAuthorizer, SubjectLocator,
};
pub use config::{AuthzConfig, ConfigError};
pub use error::{AggregateError, AuthzError, ErrorCategory, Partial};
pub use policy::{BindingRuleResolver, BootstrapPolicy, bootstrap_policy, rule_matches, rules_allow};
pub use scope::{
    Scope, scopes_to_rules, scopes_to_visible_namespaces, validate_scope_restrictions,
};
pub use selector::{LabelSelector, SelectorOperator};
pub use storage::{
    AccessRestrictionLister, ClusterRoleLister, GroupLister, PolicyLister, RuleResolver,
    StaticCatalog, StaticPolicyStore, SyncStatus, UserLister,
};
pub use types::{
    AccessRestriction, Action, AuthorizationDecision, Decision, OAuthClient, PolicyRule,
    Principal, Role, RoleBinding, RoleRef,
};

/// Type alias for authorization results.
pub type AuthzResult<T> = Result<T, AuthzError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tenantguard_authz::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthzResult;
    pub use crate::authorizer::{
        AccessRestrictionAuthorizer, AllowedSubjects, Authorizer, AuthorizerChain,
        ForbiddenMessageResolver, NamespaceRuleAuthorizer, ScopeLimitedAuthorizer,
        SubjectLocator,
    };
    pub use crate::config::{AuthzConfig, ConfigError};
    pub use crate::error::{AuthzError, ErrorCategory, Partial};
    pub use crate::policy::{BindingRuleResolver, bootstrap_policy, rule_matches, rules_allow};
    pub use crate::scope::{
        scopes_to_rules, scopes_to_visible_namespaces, validate_scope_restrictions,
    };
    pub use crate::selector::LabelSelector;
    pub use crate::storage::{
        AccessRestrictionLister, ClusterRoleLister, GroupLister, PolicyLister, RuleResolver,
        StaticCatalog, StaticPolicyStore, SyncStatus, UserLister,
    };
    pub use crate::types::{
        AccessRestriction, Action, AuthorizationDecision, ClusterRoleScopeRestriction, Decision,
        Group, GroupRestriction, OAuthClient, PolicyRule, Principal, Role, RoleBinding, RoleRef,
        ScopeRestriction, User, UserRestriction,
    };
}
