//! OAuth client domain types.
//!
//! Only the parts of a client registration that constrain which scopes a
//! token may carry are modeled here.

use serde::{Deserialize, Serialize};

// =============================================================================
// Scope Restriction
// =============================================================================

/// One entry of an OAuth client's scope allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopeRestriction {
    /// The scope must equal one of the literal values.
    #[serde(rename = "literals")]
    ExactValues(Vec<String>),
    /// The scope must be a role scope within these bounds.
    ClusterRole(ClusterRoleScopeRestriction),
}

impl ScopeRestriction {
    /// Allows the literal scopes.
    #[must_use]
    pub fn exact<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ExactValues(values.into_iter().map(Into::into).collect())
    }
}

/// Bounds on `role:` scopes a client may request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleScopeRestriction {
    /// Allowed role names, `*` for any.
    pub role_names: Vec<String>,
    /// Allowed namespaces, `*` for any.
    pub namespaces: Vec<String>,
    /// Whether `:!` escalating scopes are permitted.
    #[serde(default)]
    pub allow_escalation: bool,
}

impl ClusterRoleScopeRestriction {
    /// Creates a restriction.
    #[must_use]
    pub fn new<R, N, S, T>(role_names: R, namespaces: N, allow_escalation: bool) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
        N: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            role_names: role_names.into_iter().map(Into::into).collect(),
            namespaces: namespaces.into_iter().map(Into::into).collect(),
            allow_escalation,
        }
    }
}

impl From<ClusterRoleScopeRestriction> for ScopeRestriction {
    fn from(value: ClusterRoleScopeRestriction) -> Self {
        Self::ClusterRole(value)
    }
}

// =============================================================================
// Client
// =============================================================================

/// An OAuth client registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthClient {
    /// Client name.
    pub name: String,
    /// Scope allow-list. Empty means any scope, including none.
    #[serde(default)]
    pub scope_restrictions: Vec<ScopeRestriction>,
}

impl OAuthClient {
    /// Creates an unrestricted client.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope_restrictions: Vec::new(),
        }
    }

    /// Adds a scope restriction.
    #[must_use]
    pub fn with_restriction(mut self, restriction: impl Into<ScopeRestriction>) -> Self {
        self.scope_restrictions.push(restriction.into());
        self
    }

    /// Returns `true` if the client constrains its scopes.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        !self.scope_restrictions.is_empty()
    }
}
