//! Scope-limited authorizer.

use std::sync::Arc;

use tracing::debug;

use crate::policy::rules_allow;
use crate::scope::scopes_to_rules;
use crate::storage::ClusterRoleLister;
use crate::types::{Action, AuthorizationDecision, Principal};

use super::Authorizer;
use super::messages::ForbiddenMessageResolver;

/// Narrows scoped tokens before delegating.
///
/// A principal without scopes is passed straight through. Otherwise the
/// scopes are translated to rules, and the request reaches the delegate only
/// if one of those rules matches. Scopes restrict; the delegate still has to
/// allow the action on its own.
#[derive(Clone)]
pub struct ScopeLimitedAuthorizer {
    delegate: Arc<dyn Authorizer>,
    roles: Arc<dyn ClusterRoleLister>,
    messages: Arc<ForbiddenMessageResolver>,
}

impl ScopeLimitedAuthorizer {
    /// Wraps `delegate`, resolving role scopes through `roles`.
    #[must_use]
    pub fn new(delegate: Arc<dyn Authorizer>, roles: Arc<dyn ClusterRoleLister>) -> Self {
        Self {
            delegate,
            roles,
            messages: Arc::new(ForbiddenMessageResolver::default()),
        }
    }

    /// Replaces the forbidden-message resolver.
    #[must_use]
    pub fn with_messages(mut self, messages: Arc<ForbiddenMessageResolver>) -> Self {
        self.messages = messages;
        self
    }
}

impl std::fmt::Debug for ScopeLimitedAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeLimitedAuthorizer").finish_non_exhaustive()
    }
}

impl Authorizer for ScopeLimitedAuthorizer {
    fn authorize(&self, principal: &Principal, action: &Action) -> AuthorizationDecision {
        let scopes = principal.scopes();
        if scopes.is_empty() {
            return self.delegate.authorize(principal, action);
        }

        let rules = scopes_to_rules(scopes, action.namespace(), Some(self.roles.as_ref()));
        if rules_allow(action, &rules.value) {
            return self.delegate.authorize(principal, action);
        }

        debug!(
            user = %principal.name,
            action = %action,
            scopes = ?scopes,
            "Scopes prevent action"
        );
        AuthorizationDecision::deny(format!(
            "scopes [{}] prevent this action; {}",
            scopes.join(" "),
            self.messages.message(principal, action)
        ))
        .with_errors(rules.errors)
    }
}
