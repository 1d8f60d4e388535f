//! Scope string parsing.
//!
//! Token scopes follow two grammars:
//!
//! - `user:<name>` with a fixed vocabulary (see [`UserScope`])
//! - `role:<role-name>:<namespace|*>[:!]`, where the trailing `:!` grants
//!   access to escalating resources
//!
//! Anything else parses as [`Scope::Unrecognized`]; whether that is an error
//! is up to the caller.

use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;

/// Prefix of user scopes.
pub const USER_INDICATOR: &str = "user:";
/// Prefix of cluster role scopes.
pub const CLUSTER_ROLE_INDICATOR: &str = "role:";
/// Suffix marking a cluster role scope as escalating.
pub const ESCALATING_SUFFIX: &str = ":!";
/// Namespace value matching every namespace.
pub const ALL_NAMESPACES: &str = "*";

// =============================================================================
// User Scopes
// =============================================================================

/// The fixed `user:` scope vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UserScope {
    /// `user:info`: read the requester's own user object.
    Info,
    /// `user:check-access`: self subject access and rules reviews.
    CheckAccess,
    /// `user:list-scoped-projects`: list projects visible to this token.
    ListScopedProjects,
    /// `user:list-projects`: list all of the user's projects.
    ListAllProjects,
    /// `user:full`: everything the user can do.
    Full,
}

impl UserScope {
    /// Every user scope, in vocabulary order.
    pub const ALL: [UserScope; 5] = [
        Self::Info,
        Self::CheckAccess,
        Self::ListScopedProjects,
        Self::ListAllProjects,
        Self::Full,
    ];

    /// Returns the full scope string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "user:info",
            Self::CheckAccess => "user:check-access",
            Self::ListScopedProjects => "user:list-scoped-projects",
            Self::ListAllProjects => "user:list-projects",
            Self::Full => "user:full",
        }
    }
}

impl fmt::Display for UserScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Cluster Role Scopes
// =============================================================================

/// A parsed `role:` scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterRoleScope {
    /// Cluster role name, may contain colons.
    pub role: String,
    /// Namespace the scope applies to, `*` for all.
    pub namespace: String,
    /// Whether escalating resources stay visible.
    pub escalating: bool,
}

impl ClusterRoleScope {
    /// Parses `role:<role>:<namespace>[:!]`.
    ///
    /// The namespace is taken after the last colon, since role names may
    /// contain colons but namespaces cannot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidScope` if the prefix is missing, the role or
    /// namespace is empty, or there is no namespace separator.
    pub fn parse(scope: &str) -> Result<Self, AuthzError> {
        let bad_format = || AuthzError::invalid_scope(scope, "expected role:<name>:<namespace>");

        let rest = scope
            .strip_prefix(CLUSTER_ROLE_INDICATOR)
            .ok_or_else(bad_format)?;
        let (rest, escalating) = match rest.strip_suffix(ESCALATING_SUFFIX) {
            Some(stripped) => (stripped, true),
            None => (rest, false),
        };
        let (role, namespace) = rest.rsplit_once(':').ok_or_else(bad_format)?;
        if role.is_empty() || namespace.is_empty() {
            return Err(bad_format());
        }

        Ok(Self {
            role: role.to_string(),
            namespace: namespace.to_string(),
            escalating,
        })
    }

    /// Returns `true` if the scope applies in every namespace.
    #[must_use]
    pub fn is_all_namespaces(&self) -> bool {
        self.namespace == ALL_NAMESPACES
    }

    /// Returns `true` if the scope applies to requests in `namespace`.
    #[must_use]
    pub fn applies_to(&self, namespace: &str) -> bool {
        self.is_all_namespaces() || self.namespace == namespace
    }
}

impl fmt::Display for ClusterRoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CLUSTER_ROLE_INDICATOR}{}:{}", self.role, self.namespace)?;
        if self.escalating {
            write!(f, "{ESCALATING_SUFFIX}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Scope
// =============================================================================

/// A classified scope string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One of the fixed user scopes.
    User(UserScope),
    /// A cluster role scope.
    ClusterRole(ClusterRoleScope),
    /// A scope no evaluator handles.
    Unrecognized(String),
}

impl Scope {
    /// Classifies a scope string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidScope` for a `user:` scope outside the vocabulary or a
    /// malformed `role:` scope. Strings with neither prefix are not an error
    /// here; they classify as [`Scope::Unrecognized`].
    pub fn parse(scope: &str) -> Result<Self, AuthzError> {
        if scope.starts_with(USER_INDICATOR) {
            return UserScope::ALL
                .into_iter()
                .find(|s| s.as_str() == scope)
                .map(Self::User)
                .ok_or_else(|| AuthzError::invalid_scope(scope, "unrecognized user scope"));
        }
        if scope.starts_with(CLUSTER_ROLE_INDICATOR) {
            return ClusterRoleScope::parse(scope).map(Self::ClusterRole);
        }
        Ok(Self::Unrecognized(scope.to_string()))
    }

    /// Returns `true` unless the scope is unrecognized.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl FromStr for Scope {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user) => write!(f, "{user}"),
            Self::ClusterRole(role) => write!(f, "{role}"),
            Self::Unrecognized(raw) => write!(f, "{raw}"),
        }
    }
}
