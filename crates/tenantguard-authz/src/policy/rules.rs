//! Effective-rule resolution from role bindings.

use std::sync::Arc;

use tracing::debug;

use crate::error::Partial;
use crate::storage::{PolicyLister, RuleResolver};
use crate::types::{PolicyRule, Principal};

/// Resolves a principal's rules by walking the bindings of a namespace.
///
/// A binding applies when it names the principal or one of its groups. A
/// binding whose role cannot be resolved is recorded as an error and skipped,
/// so the remaining bindings still contribute their rules.
#[derive(Clone)]
pub struct BindingRuleResolver {
    lister: Arc<dyn PolicyLister>,
}

impl BindingRuleResolver {
    /// Creates a resolver over the lister.
    #[must_use]
    pub fn new(lister: Arc<dyn PolicyLister>) -> Self {
        Self { lister }
    }

    /// The underlying lister.
    #[must_use]
    pub fn lister(&self) -> &Arc<dyn PolicyLister> {
        &self.lister
    }
}

impl std::fmt::Debug for BindingRuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRuleResolver").finish_non_exhaustive()
    }
}

impl RuleResolver for BindingRuleResolver {
    fn rules_for(&self, principal: &Principal, namespace: &str) -> Partial<Vec<PolicyRule>> {
        let bindings = match self.lister.role_bindings(namespace) {
            Ok(bindings) => bindings,
            Err(e) => return Partial::with_errors(Vec::new(), vec![e]),
        };

        let mut rules = Vec::new();
        let mut errors = Vec::new();
        for binding in bindings.iter().filter(|b| b.applies_to(principal)) {
            match self.lister.role(&binding.role_ref) {
                Ok(role) => rules.extend(role.rules),
                Err(e) => {
                    debug!(
                        binding = %binding.name,
                        namespace = %namespace,
                        error = %e,
                        "Skipping binding with unresolvable role"
                    );
                    errors.push(e);
                }
            }
        }
        Partial::with_errors(rules, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StaticPolicyStore;
    use crate::types::{Role, RoleBinding, RoleRef};

    fn pods_rule() -> PolicyRule {
        PolicyRule::builder()
            .verbs(["get"])
            .groups([""])
            .resources(["pods"])
            .rule()
    }

    fn store() -> StaticPolicyStore {
        StaticPolicyStore::new()
            .with_role(Role::cluster("pod-reader", vec![pods_rule()]))
            .with_binding(
                RoleBinding::new("ns", "readers", RoleRef::cluster("pod-reader"))
                    .with_groups(["devs"]),
            )
            .with_binding(
                RoleBinding::new("ns", "dangling", RoleRef::cluster("missing"))
                    .with_users(["alice"]),
            )
    }

    #[test]
    fn test_group_binding_contributes_rules() {
        let resolver = BindingRuleResolver::new(Arc::new(store()));
        let partial = resolver.rules_for(&Principal::new("bob").with_group("devs"), "ns");
        assert!(partial.is_complete());
        assert_eq!(partial.value, vec![pods_rule()]);
    }

    #[test]
    fn test_missing_role_is_recorded_and_skipped() {
        let resolver = BindingRuleResolver::new(Arc::new(store()));
        let partial = resolver.rules_for(&Principal::new("alice").with_group("devs"), "ns");
        assert_eq!(partial.value, vec![pods_rule()]);
        assert_eq!(partial.errors.len(), 1);
        assert!(partial.errors[0].is_not_found());
    }

    #[test]
    fn test_unbound_principal_gets_nothing() {
        let resolver = BindingRuleResolver::new(Arc::new(store()));
        let partial = resolver.rules_for(&Principal::new("carol"), "ns");
        assert!(partial.value.is_empty());
        assert!(partial.is_complete());
    }
}
