//! Namespace-rule authorizer.
//!
//! Checks the rules a principal holds at cluster scope, then in the request's
//! namespace. One matching rule is conclusive, so lookup errors only surface
//! when no rule matched.

use std::sync::Arc;

use tracing::debug;

use crate::config::AuthzConfig;
use crate::error::Partial;
use crate::policy::{BindingRuleResolver, rules_allow};
use crate::storage::{PolicyLister, RuleResolver};
use crate::types::{Action, AuthorizationDecision, Principal};

use super::messages::ForbiddenMessageResolver;
use super::{AllowedSubjects, Authorizer, SubjectLocator};

/// Reason returned when a cluster-scope rule grants the action.
pub const ALLOWED_BY_CLUSTER_RULE: &str = "allowed by cluster rule";

/// Authorizes requests from the rules reachable through role bindings.
#[derive(Clone)]
pub struct NamespaceRuleAuthorizer {
    resolver: Arc<dyn RuleResolver>,
    policy: Arc<dyn PolicyLister>,
    master_namespace: String,
    messages: Arc<ForbiddenMessageResolver>,
}

impl NamespaceRuleAuthorizer {
    /// Creates an authorizer with an explicit rule resolver.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn RuleResolver>,
        policy: Arc<dyn PolicyLister>,
        config: &AuthzConfig,
    ) -> Self {
        Self {
            resolver,
            policy,
            master_namespace: config.cluster.master_namespace.clone(),
            messages: Arc::new(ForbiddenMessageResolver::new(&config.messages)),
        }
    }

    /// Creates an authorizer that resolves rules by walking `policy`'s bindings.
    #[must_use]
    pub fn from_policy(policy: Arc<dyn PolicyLister>, config: &AuthzConfig) -> Self {
        let resolver = Arc::new(BindingRuleResolver::new(Arc::clone(&policy)));
        Self::new(resolver, policy, config)
    }

    /// Replaces the forbidden-message resolver.
    #[must_use]
    pub fn with_messages(mut self, messages: Arc<ForbiddenMessageResolver>) -> Self {
        self.messages = messages;
        self
    }

    /// The namespace holding cluster-wide bindings.
    #[must_use]
    pub fn master_namespace(&self) -> &str {
        &self.master_namespace
    }

    /// The forbidden-message resolver used for denials.
    #[must_use]
    pub fn messages(&self) -> &Arc<ForbiddenMessageResolver> {
        &self.messages
    }

    /// The request namespace, if it is distinct from cluster scope.
    fn scoped_namespace<'a>(&self, action: &'a Action) -> Option<&'a str> {
        let namespace = action.namespace();
        (!namespace.is_empty() && namespace != self.master_namespace).then_some(namespace)
    }
}

impl std::fmt::Debug for NamespaceRuleAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceRuleAuthorizer")
            .field("master_namespace", &self.master_namespace)
            .finish_non_exhaustive()
    }
}

impl Authorizer for NamespaceRuleAuthorizer {
    fn authorize(&self, principal: &Principal, action: &Action) -> AuthorizationDecision {
        let mut errors = Vec::new();

        let cluster = self.resolver.rules_for(principal, &self.master_namespace);
        if rules_allow(action, &cluster.value) {
            debug!(user = %principal.name, action = %action, "Allowed by cluster rule");
            return AuthorizationDecision::allow(ALLOWED_BY_CLUSTER_RULE);
        }
        errors.extend(cluster.errors);

        if let Some(namespace) = self.scoped_namespace(action) {
            let local = self.resolver.rules_for(principal, namespace);
            if rules_allow(action, &local.value) {
                debug!(
                    user = %principal.name,
                    action = %action,
                    namespace = %namespace,
                    "Allowed by namespace rule"
                );
                return AuthorizationDecision::allow(format!("allowed by rule in {namespace}"));
            }
            errors.extend(local.errors);
        }

        let message = self.messages.message(principal, action);
        if errors.is_empty() {
            return AuthorizationDecision::deny(message);
        }

        debug!(
            user = %principal.name,
            action = %action,
            errors = errors.len(),
            "No matching rule; rule lookup incomplete"
        );
        AuthorizationDecision::no_opinion(message).with_errors(errors)
    }
}

impl SubjectLocator for NamespaceRuleAuthorizer {
    fn allowed_subjects(&self, action: &Action) -> Partial<AllowedSubjects> {
        let mut subjects = AllowedSubjects::default();
        let mut errors = Vec::new();

        let namespaces = std::iter::once(self.master_namespace.as_str())
            .chain(self.scoped_namespace(action));
        for namespace in namespaces {
            let bindings = match self.policy.role_bindings(namespace) {
                Ok(bindings) => bindings,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            for binding in bindings {
                match self.policy.role(&binding.role_ref) {
                    Ok(role) if rules_allow(action, &role.rules) => {
                        subjects.users.extend(binding.users);
                        subjects.groups.extend(binding.groups);
                    }
                    Ok(_) => {}
                    Err(e) => errors.push(e),
                }
            }
        }

        Partial::with_errors(subjects, errors)
    }
}
