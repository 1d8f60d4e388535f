//! Domain types shared by the authorizers.
//!
//! ## Domain Types
//!
//! - [`Principal`] - the authenticated requester
//! - [`Action`] - the requested resource or non-resource action
//! - [`PolicyRule`] - a grant of verbs on resources or URLs
//! - [`Role`] / [`RoleBinding`] - rule sets and who they are granted to
//! - [`AccessRestriction`] - allow/deny-list vetoes
//! - [`OAuthClient`] - scope restrictions of an OAuth client
//! - [`AuthorizationDecision`] - the outcome of a check

pub mod action;
pub mod client;
pub mod decision;
pub mod identity;
pub mod principal;
pub mod restriction;
pub mod role;
pub mod rule;

pub use action::{Action, NonResourceAction, ResourceAction};
pub use client::{ClusterRoleScopeRestriction, OAuthClient, ScopeRestriction};
pub use decision::{AuthorizationDecision, Decision};
pub use identity::{Group, User};
pub use principal::{
    AUTHENTICATED_GROUP, AUTHENTICATED_OAUTH_GROUP, Principal, SCOPES_EXTRA_KEY,
    SERVICE_ACCOUNTS_GROUP, UNAUTHENTICATED_GROUP,
};
pub use restriction::{AccessRestriction, GroupRestriction, SubjectMatcher, UserRestriction};
pub use role::{Role, RoleBinding, RoleRef};
pub use rule::{PolicyRule, PolicyRuleBuilder, WILDCARD};
