//! The authenticated principal making a request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Extra key under which token scopes are carried.
pub const SCOPES_EXTRA_KEY: &str = "scopes.authorization.openshift.io";

/// Group every authenticated principal belongs to.
pub const AUTHENTICATED_GROUP: &str = "system:authenticated";

/// Group every anonymous principal belongs to.
pub const UNAUTHENTICATED_GROUP: &str = "system:unauthenticated";

/// Group of principals authenticated through an OAuth token.
pub const AUTHENTICATED_OAUTH_GROUP: &str = "system:authenticated:oauth";

/// Group containing all service accounts.
pub const SERVICE_ACCOUNTS_GROUP: &str = "system:serviceaccounts";

const SERVICE_ACCOUNT_USER_PREFIX: &str = "system:serviceaccount:";
const SERVICE_ACCOUNT_GROUP_PREFIX: &str = "system:serviceaccounts:";

/// The user requesting an action.
///
/// Immutable for the lifetime of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User name.
    pub name: String,

    /// Group memberships (unordered).
    #[serde(default)]
    pub groups: Vec<String>,

    /// Token-derived attributes.
    #[serde(default)]
    pub extra: HashMap<String, Vec<String>>,
}

impl Principal {
    /// Creates a principal with no groups and no extra attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates the principal of a service account.
    ///
    /// The name is `system:serviceaccount:<namespace>:<name>` and the groups
    /// are the all-service-accounts group, the per-namespace group and the
    /// authenticated group.
    #[must_use]
    pub fn service_account(namespace: &str, name: &str) -> Self {
        Self {
            name: format!("{SERVICE_ACCOUNT_USER_PREFIX}{namespace}:{name}"),
            groups: vec![
                SERVICE_ACCOUNTS_GROUP.to_string(),
                format!("{SERVICE_ACCOUNT_GROUP_PREFIX}{namespace}"),
                AUTHENTICATED_GROUP.to_string(),
            ],
            extra: HashMap::new(),
        }
    }

    /// Adds a group membership.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Adds several group memberships.
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Attaches token scopes.
    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra.insert(
            SCOPES_EXTRA_KEY.to_string(),
            scopes.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Token scopes, empty for an unscoped token.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        self.extra
            .get(SCOPES_EXTRA_KEY)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns `true` if the principal's token carries scopes.
    #[must_use]
    pub fn is_scoped(&self) -> bool {
        !self.scopes().is_empty()
    }

    /// Returns `true` if the principal belongs to the group.
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Returns `true` if the principal belongs to any of the groups.
    #[must_use]
    pub fn in_any_group<S: AsRef<str>>(&self, groups: &[S]) -> bool {
        groups.iter().any(|g| self.in_group(g.as_ref()))
    }

    /// Splits a service account user name into namespace and name.
    #[must_use]
    pub fn service_account_parts(&self) -> Option<(&str, &str)> {
        let rest = self.name.strip_prefix(SERVICE_ACCOUNT_USER_PREFIX)?;
        let (namespace, name) = rest.split_once(':')?;
        if namespace.is_empty() || name.is_empty() || name.contains(':') {
            return None;
        }
        Some((namespace, name))
    }
}
