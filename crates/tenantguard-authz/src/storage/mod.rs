//! Read-only lookup interfaces supplied by the host.
//!
//! The engine never persists or caches policy objects. It reads them through
//! these traits, which are expected to be backed by in-memory caches that
//! answer immediately.
//!
//! # Implementations
//!
//! - [`memory`] - immutable point-in-time snapshots, for hosts that already
//!   hold their policy in memory and for tests

pub mod memory;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::AuthzResult;
use crate::error::Partial;
use crate::selector::LabelSelector;
use crate::types::{
    AccessRestriction, Group, PolicyRule, Principal, Role, RoleBinding, RoleRef, User,
};

pub use memory::{StaticCatalog, StaticPolicyStore};

// =============================================================================
// Policy
// =============================================================================

/// Role and binding lookups.
pub trait PolicyLister: Send + Sync {
    /// Lists bindings in a namespace (the master namespace for cluster bindings).
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn role_bindings(&self, namespace: &str) -> AuthzResult<Vec<RoleBinding>>;

    /// Resolves the role a binding refers to.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the role does not exist, or another error if the
    /// lookup fails.
    fn role(&self, role_ref: &RoleRef) -> AuthzResult<Role>;
}

/// Resolves the rules granted to a principal at one scope.
pub trait RuleResolver: Send + Sync {
    /// Rules granted in `namespace`, the master namespace meaning cluster
    /// scope. Lookup failures are returned alongside the rules that did
    /// resolve.
    fn rules_for(&self, principal: &Principal, namespace: &str) -> Partial<Vec<PolicyRule>>;
}

/// Cluster role lookups for scope translation.
pub trait ClusterRoleLister: Send + Sync {
    /// Gets a cluster role by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such role exists, or another error if the
    /// lookup fails.
    fn get(&self, name: &str) -> AuthzResult<Role>;

    /// Lists cluster roles matching the selector.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn list(&self, selector: &LabelSelector) -> AuthzResult<Vec<Role>>;
}

// =============================================================================
// Catalogs
// =============================================================================

/// User catalog used to expand user selectors.
pub trait UserLister: Send + Sync {
    /// Lists users matching the selector.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn list_users(&self, selector: &LabelSelector) -> AuthzResult<Vec<User>>;
}

/// Group catalog used to expand group selectors.
pub trait GroupLister: Send + Sync {
    /// Lists groups matching the selector.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn list_groups(&self, selector: &LabelSelector) -> AuthzResult<Vec<Group>>;
}

/// Access restriction catalog.
pub trait AccessRestrictionLister: Send + Sync {
    /// Lists restrictions matching the selector.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn list_restrictions(&self, selector: &LabelSelector) -> AuthzResult<Vec<AccessRestriction>>;
}

/// Readiness of the caches behind the catalogs.
pub trait SyncStatus: Send + Sync {
    /// Returns `true` once every backing cache finished its initial sync.
    fn has_synced(&self) -> bool;
}

impl SyncStatus for AtomicBool {
    fn has_synced(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}
