//! Ordered composition of authorizers.

use std::sync::Arc;

use tracing::debug;

use crate::config::AuthzConfig;
use crate::storage::{
    AccessRestrictionLister, ClusterRoleLister, GroupLister, PolicyLister, SyncStatus, UserLister,
};
use crate::types::{Action, AuthorizationDecision, Decision, Principal};

use super::Authorizer;
use super::rbac::NamespaceRuleAuthorizer;
use super::restriction::AccessRestrictionAuthorizer;
use super::scope::ScopeLimitedAuthorizer;

/// Runs authorizers in order until one allows or denies.
///
/// No-opinion results fall through to the next authorizer. Their errors are
/// dropped on Allow, attached to a Deny, and returned with the final
/// no-opinion when nothing decided.
#[derive(Clone, Default)]
pub struct AuthorizerChain {
    authorizers: Vec<Arc<dyn Authorizer>>,
}

impl AuthorizerChain {
    /// Creates an empty chain. An empty chain has no opinion on anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an authorizer.
    #[must_use]
    pub fn with(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizers.push(authorizer);
        self
    }

    /// Builds the standard chain: access restrictions, then scope narrowing
    /// over namespace rules.
    #[must_use]
    pub fn standard(
        restrictions: AccessRestrictionAuthorizer,
        rules: NamespaceRuleAuthorizer,
        roles: Arc<dyn ClusterRoleLister>,
    ) -> Self {
        let messages = Arc::clone(rules.messages());
        let scoped = ScopeLimitedAuthorizer::new(Arc::new(rules), roles).with_messages(messages);
        Self::new().with(Arc::new(restrictions)).with(Arc::new(scoped))
    }

    /// Builds the standard chain over one policy store and one catalog.
    #[must_use]
    pub fn from_stores<P, C>(policy: Arc<P>, catalog: Arc<C>, config: &AuthzConfig) -> Self
    where
        P: PolicyLister + ClusterRoleLister + 'static,
        C: AccessRestrictionLister + UserLister + GroupLister + SyncStatus + 'static,
    {
        let rules = NamespaceRuleAuthorizer::from_policy(
            Arc::clone(&policy) as Arc<dyn PolicyLister>,
            config,
        );
        let restrictions = AccessRestrictionAuthorizer::from_catalog(catalog, config);
        Self::standard(restrictions, rules, policy)
    }

    /// Number of authorizers in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.authorizers.len()
    }

    /// Returns `true` if the chain has no authorizers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authorizers.is_empty()
    }
}

impl std::fmt::Debug for AuthorizerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizerChain")
            .field("len", &self.authorizers.len())
            .finish()
    }
}

impl Authorizer for AuthorizerChain {
    fn authorize(&self, principal: &Principal, action: &Action) -> AuthorizationDecision {
        let mut reason = String::new();
        let mut errors = Vec::new();

        for (index, authorizer) in self.authorizers.iter().enumerate() {
            let decision = authorizer.authorize(principal, action);
            match decision.decision {
                Decision::Allow => {
                    debug!(
                        user = %principal.name,
                        action = %action,
                        authorizer = index,
                        "Chain allowed"
                    );
                    return decision;
                }
                Decision::Deny => {
                    debug!(
                        user = %principal.name,
                        action = %action,
                        authorizer = index,
                        "Chain denied"
                    );
                    return decision.with_errors(errors);
                }
                Decision::NoOpinion => {
                    if !decision.reason.is_empty() {
                        reason = decision.reason;
                    }
                    errors.extend(decision.errors);
                }
            }
        }

        AuthorizationDecision::no_opinion(reason).with_errors(errors)
    }
}
