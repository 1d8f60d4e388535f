//! Authorizers.
//!
//! Each layer implements [`Authorizer`] and can be used on its own or
//! composed with [`AuthorizerChain`]. The standard composition is:
//!
//! ```text
//! AccessRestrictionAuthorizer   veto layer, fails closed
//!   -> ScopeLimitedAuthorizer   narrows scoped tokens
//!     -> NamespaceRuleAuthorizer  cluster + namespace rules
//! ```
//!
//! A decision is always returned as a value. A non-Allow decision that
//! carries errors must be treated as Deny by the caller.

pub mod chain;
pub mod messages;
pub mod rbac;
pub mod restriction;
pub mod scope;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::Partial;
use crate::types::{Action, AuthorizationDecision, Principal};

pub use chain::AuthorizerChain;
pub use messages::ForbiddenMessageResolver;
pub use rbac::NamespaceRuleAuthorizer;
pub use restriction::AccessRestrictionAuthorizer;
pub use scope::ScopeLimitedAuthorizer;

/// Decides whether a principal may perform an action.
pub trait Authorizer: Send + Sync {
    /// Returns the decision for the request.
    fn authorize(&self, principal: &Principal, action: &Action) -> AuthorizationDecision;
}

/// Answers the reverse query: who may perform an action.
pub trait SubjectLocator: Send + Sync {
    /// Lists the users and groups bound to a rule matching the action.
    ///
    /// The listing is best effort: lookup failures are returned alongside it
    /// and can only cause subjects to be missing, never added.
    fn allowed_subjects(&self, action: &Action) -> Partial<AllowedSubjects>;
}

/// Subjects permitted to perform an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllowedSubjects {
    /// User names.
    pub users: BTreeSet<String>,
    /// Group names.
    pub groups: BTreeSet<String>,
}

impl AllowedSubjects {
    /// Returns `true` if no subject is permitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }

    /// Returns `true` if the user is listed directly.
    #[must_use]
    pub fn has_user(&self, user: &str) -> bool {
        self.users.contains(user)
    }

    /// Returns `true` if the group is listed.
    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }
}
