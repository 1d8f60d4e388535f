//! Roles and role bindings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::principal::Principal;
use super::rule::PolicyRule;

/// A named set of policy rules.
///
/// Cluster roles have an empty namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Role name.
    pub name: String,

    /// Owning namespace, empty for cluster roles.
    #[serde(default)]
    pub namespace: String,

    /// Object labels, used by label-selector listing.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Granted rules.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl Role {
    /// Creates a cluster role.
    #[must_use]
    pub fn cluster(name: impl Into<String>, rules: Vec<PolicyRule>) -> Self {
        Self {
            name: name.into(),
            rules,
            ..Default::default()
        }
    }

    /// Creates a namespaced role.
    #[must_use]
    pub fn namespaced(
        namespace: impl Into<String>,
        name: impl Into<String>,
        rules: Vec<PolicyRule>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            rules,
            ..Default::default()
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Returns `true` for cluster roles.
    #[must_use]
    pub fn is_cluster_role(&self) -> bool {
        self.namespace.is_empty()
    }
}

/// Reference from a binding to the role it grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleRef {
    /// Role name.
    pub name: String,
    /// Role namespace, empty to reference a cluster role.
    #[serde(default)]
    pub namespace: String,
}

impl RoleRef {
    /// References a cluster role.
    #[must_use]
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
        }
    }

    /// References a namespaced role.
    #[must_use]
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Object kind used in lookup errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        if self.namespace.is_empty() {
            "clusterrole"
        } else {
            "role"
        }
    }
}

/// Grants a role to users and groups within a namespace (or cluster-wide).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    /// Binding name.
    pub name: String,

    /// Binding namespace, the master namespace for cluster bindings.
    #[serde(default)]
    pub namespace: String,

    /// The granted role.
    pub role_ref: RoleRef,

    /// Bound user names.
    #[serde(default)]
    pub users: Vec<String>,

    /// Bound group names.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl RoleBinding {
    /// Creates a binding with no subjects.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        role_ref: RoleRef,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            role_ref,
            users: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Adds bound users.
    #[must_use]
    pub fn with_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users.extend(users.into_iter().map(Into::into));
        self
    }

    /// Adds bound groups.
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Returns `true` if the binding names the principal or one of its groups.
    #[must_use]
    pub fn applies_to(&self, principal: &Principal) -> bool {
        self.users.iter().any(|u| *u == principal.name) || principal.in_any_group(&self.groups)
    }
}
