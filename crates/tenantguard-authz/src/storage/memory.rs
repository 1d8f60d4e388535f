//! In-memory snapshot implementations of the lookup traits.
//!
//! Both stores are immutable once built. They hold a point-in-time view of
//! policy and are shared across threads behind an `Arc`.

use std::collections::{BTreeMap, HashMap};

use crate::AuthzResult;
use crate::error::AuthzError;
use crate::policy::bootstrap::BootstrapPolicy;
use crate::selector::LabelSelector;
use crate::types::{AccessRestriction, Group, Role, RoleBinding, RoleRef, User};

use super::{
    AccessRestrictionLister, ClusterRoleLister, GroupLister, PolicyLister, SyncStatus, UserLister,
};

// =============================================================================
// Policy Store
// =============================================================================

/// Snapshot of roles and bindings.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyStore {
    roles: HashMap<RoleRef, Role>,
    bindings: HashMap<String, Vec<RoleBinding>>,
}

impl StaticPolicyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the bootstrap roles and bindings.
    #[must_use]
    pub fn from_bootstrap(policy: BootstrapPolicy) -> Self {
        let BootstrapPolicy {
            roles,
            role_bindings,
        } = policy;
        let store = roles.into_iter().fold(Self::new(), Self::with_role);
        role_bindings.into_iter().fold(store, Self::with_binding)
    }

    /// Adds a role, replacing any role with the same name and namespace.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        let key = RoleRef::namespaced(role.namespace.clone(), role.name.clone());
        self.roles.insert(key, role);
        self
    }

    /// Adds a binding to its namespace.
    #[must_use]
    pub fn with_binding(mut self, binding: RoleBinding) -> Self {
        self.bindings
            .entry(binding.namespace.clone())
            .or_default()
            .push(binding);
        self
    }

    /// Number of roles held.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }
}

impl PolicyLister for StaticPolicyStore {
    fn role_bindings(&self, namespace: &str) -> AuthzResult<Vec<RoleBinding>> {
        Ok(self.bindings.get(namespace).cloned().unwrap_or_default())
    }

    fn role(&self, role_ref: &RoleRef) -> AuthzResult<Role> {
        self.roles
            .get(role_ref)
            .cloned()
            .ok_or_else(|| AuthzError::not_found(role_ref.kind(), &role_ref.name))
    }
}

impl ClusterRoleLister for StaticPolicyStore {
    fn get(&self, name: &str) -> AuthzResult<Role> {
        self.role(&RoleRef::cluster(name))
    }

    fn list(&self, selector: &LabelSelector) -> AuthzResult<Vec<Role>> {
        selector.validate()?;
        let mut roles: Vec<Role> = self
            .roles
            .values()
            .filter(|r| r.is_cluster_role() && selector.matches(&r.labels))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Snapshot of users, groups and access restrictions.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    users: Vec<User>,
    groups: Vec<Group>,
    restrictions: Vec<AccessRestriction>,
    synced: bool,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            groups: Vec::new(),
            restrictions: Vec::new(),
            synced: true,
        }
    }
}

impl StaticCatalog {
    /// Creates an empty, synced catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    /// Adds a group.
    #[must_use]
    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    /// Adds an access restriction.
    #[must_use]
    pub fn with_restriction(mut self, restriction: AccessRestriction) -> Self {
        self.restrictions.push(restriction);
        self
    }

    /// Overrides the reported sync state.
    #[must_use]
    pub fn with_synced(mut self, synced: bool) -> Self {
        self.synced = synced;
        self
    }
}

fn select<T, F>(items: &[T], selector: &LabelSelector, labels: F) -> AuthzResult<Vec<T>>
where
    T: Clone,
    F: Fn(&T) -> &BTreeMap<String, String>,
{
    selector.validate()?;
    Ok(items
        .iter()
        .filter(|item| selector.matches(labels(*item)))
        .cloned()
        .collect())
}

impl UserLister for StaticCatalog {
    fn list_users(&self, selector: &LabelSelector) -> AuthzResult<Vec<User>> {
        select(&self.users, selector, |u| &u.labels)
    }
}

impl GroupLister for StaticCatalog {
    fn list_groups(&self, selector: &LabelSelector) -> AuthzResult<Vec<Group>> {
        select(&self.groups, selector, |g| &g.labels)
    }
}

impl AccessRestrictionLister for StaticCatalog {
    fn list_restrictions(&self, selector: &LabelSelector) -> AuthzResult<Vec<AccessRestriction>> {
        select(&self.restrictions, selector, |r| &r.labels)
    }
}

impl SyncStatus for StaticCatalog {
    fn has_synced(&self) -> bool {
        self.synced
    }
}
