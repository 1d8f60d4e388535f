//! Access restriction veto layer.
//!
//! This authorizer never grants. It either vetoes a namespaced resource
//! request with [`Decision::Deny`](crate::types::Decision::Deny) or returns
//! no opinion so the rest of the chain can decide. Vetoes are rare and
//! security sensitive, so every one is logged at `warn` and every condition
//! it cannot evaluate resolves to Deny.
//!
//! Deny reasons are fixed strings. Restriction names only appear in logs.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::{AccessRestrictionConfig, AuthzConfig};
use crate::error::AuthzError;
use crate::policy::rules_allow;
use crate::selector::LabelSelector;
use crate::storage::{AccessRestrictionLister, GroupLister, SyncStatus, UserLister};
use crate::types::{
    AccessRestriction, Action, AuthorizationDecision, GroupRestriction, Principal, SubjectMatcher,
    UserRestriction,
};

use super::Authorizer;

/// Reason for a veto by a matching restriction.
pub const DENIED_REASON: &str = "denied by access restriction";

/// Reason when the backing caches have not synced.
pub const NOT_SYNCED_REASON: &str = "access restriction caches are not synced";

/// Reason when the restriction list cannot be read.
pub const LIST_ERROR_REASON: &str = "cannot determine access restrictions";

/// Vetoes requests that a matching access restriction does not permit.
#[derive(Clone)]
pub struct AccessRestrictionAuthorizer {
    restrictions: Arc<dyn AccessRestrictionLister>,
    users: Arc<dyn UserLister>,
    groups: Arc<dyn GroupLister>,
    synced: Arc<dyn SyncStatus>,
    config: AccessRestrictionConfig,
}

impl AccessRestrictionAuthorizer {
    /// Creates the authorizer over separate catalogs.
    #[must_use]
    pub fn new(
        restrictions: Arc<dyn AccessRestrictionLister>,
        users: Arc<dyn UserLister>,
        groups: Arc<dyn GroupLister>,
        synced: Arc<dyn SyncStatus>,
        config: &AuthzConfig,
    ) -> Self {
        Self {
            restrictions,
            users,
            groups,
            synced,
            config: config.access_restriction.clone(),
        }
    }

    /// Creates the authorizer over a single catalog serving every lookup.
    #[must_use]
    pub fn from_catalog<C>(catalog: Arc<C>, config: &AuthzConfig) -> Self
    where
        C: AccessRestrictionLister + UserLister + GroupLister + SyncStatus + 'static,
    {
        Self::new(
            Arc::clone(&catalog) as Arc<dyn AccessRestrictionLister>,
            Arc::clone(&catalog) as Arc<dyn UserLister>,
            Arc::clone(&catalog) as Arc<dyn GroupLister>,
            catalog,
            config,
        )
    }

    /// Returns `true` if the request is outside this authorizer's jurisdiction.
    fn is_ignored(&self, action: &Action) -> bool {
        if !self.config.enabled || !action.is_resource_request() {
            return true;
        }
        let namespace = action.namespace();
        namespace.is_empty() || self.config.is_exempt_namespace(namespace)
    }

    /// Returns `true` if the restriction lets the principal through.
    ///
    /// A restriction with only an allow-list admits its members alone.
    /// Otherwise a principal passes if allowed or not denied.
    fn permits(&self, restriction: &AccessRestriction, principal: &Principal) -> bool {
        if self.subjects_match(&restriction.allowed_subjects, principal) {
            return true;
        }
        if restriction.denied_subjects.is_empty() {
            return restriction.allowed_subjects.is_empty();
        }
        !self.subjects_match(&restriction.denied_subjects, principal)
    }

    fn subjects_match(&self, subjects: &[SubjectMatcher], principal: &Principal) -> bool {
        subjects.iter().any(|subject| match subject {
            SubjectMatcher::User(users) => self.user_matches(users, principal),
            SubjectMatcher::Group(groups) => self.group_matches(groups, principal),
        })
    }

    fn user_matches(&self, restriction: &UserRestriction, principal: &Principal) -> bool {
        if restriction.users.iter().any(|u| *u == principal.name)
            || principal.in_any_group(&restriction.groups)
        {
            return true;
        }

        restriction.selectors.iter().any(|selector| {
            self.select(selector, |s| self.users.list_users(s))
                .iter()
                .any(|user| user.name == principal.name || principal.in_any_group(&user.groups))
        })
    }

    fn group_matches(&self, restriction: &GroupRestriction, principal: &Principal) -> bool {
        if principal.in_any_group(&restriction.groups) {
            return true;
        }

        restriction.selectors.iter().any(|selector| {
            self.select(selector, |s| self.groups.list_groups(s))
                .iter()
                .any(|group| {
                    principal.in_group(&group.name)
                        || group.users.iter().any(|u| *u == principal.name)
                })
        })
    }

    /// Expands a selector against a catalog.
    ///
    /// Stored restrictions are validated on write, so a bad selector or a
    /// failed lookup here is an internal bug. It matches nothing.
    fn select<T, F>(&self, selector: &LabelSelector, list: F) -> Vec<T>
    where
        F: FnOnce(&LabelSelector) -> Result<Vec<T>, AuthzError>,
    {
        if let Err(e) = selector.validate() {
            error!(selector = %selector, error = %e, "Invalid selector in access restriction");
            return Vec::new();
        }
        list(selector).unwrap_or_else(|e| {
            error!(
                selector = %selector,
                error = %e,
                "Failed to expand access restriction selector"
            );
            Vec::new()
        })
    }
}

impl std::fmt::Debug for AccessRestrictionAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessRestrictionAuthorizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Authorizer for AccessRestrictionAuthorizer {
    fn authorize(&self, principal: &Principal, action: &Action) -> AuthorizationDecision {
        if self.is_ignored(action) {
            return AuthorizationDecision::no_opinion("");
        }

        if !self.synced.has_synced() {
            warn!(
                user = %principal.name,
                action = %action,
                "Access restriction caches not synced"
            );
            return AuthorizationDecision::deny(NOT_SYNCED_REASON).with_error(AuthzError::NotSynced);
        }

        let restrictions = match self.restrictions.list_restrictions(&LabelSelector::everything()) {
            Ok(restrictions) => restrictions,
            Err(e) => {
                warn!(error = %e, "Failed to list access restrictions");
                return AuthorizationDecision::deny(LIST_ERROR_REASON).with_error(e);
            }
        };

        let mut errors = Vec::new();
        for restriction in &restrictions {
            if let Err(e) = restriction.validate() {
                error!(
                    restriction = %restriction.name,
                    error = %e,
                    "Invalid access restriction"
                );
                errors.push(e);
            }

            let applies = restriction.match_attributes.is_empty()
                || rules_allow(action, &restriction.match_attributes);
            if !applies || self.permits(restriction, principal) {
                continue;
            }

            warn!(
                user = %principal.name,
                groups = ?principal.groups,
                action = %action,
                restriction = %restriction.name,
                "Denied by access restriction"
            );
            return AuthorizationDecision::deny(DENIED_REASON).with_errors(errors);
        }

        debug!(user = %principal.name, action = %action, "No access restriction veto");
        AuthorizationDecision::no_opinion("").with_errors(errors)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::AuthzResult;
    use crate::storage::StaticCatalog;
    use crate::types::{Group, PolicyRule, User};

    fn get_pods() -> Vec<PolicyRule> {
        vec![
            PolicyRule::builder()
                .verbs(["get"])
                .groups([""])
                .resources(["pods"])
                .rule(),
        ]
    }

    fn admins_only() -> AccessRestriction {
        AccessRestriction::new("pods-admins", get_pods())
            .allow(GroupRestriction::groups(["admins"]))
            .deny(GroupRestriction::groups(["system:authenticated", "system:unauthenticated"]))
    }

    fn authorizer(catalog: StaticCatalog) -> AccessRestrictionAuthorizer {
        AccessRestrictionAuthorizer::from_catalog(Arc::new(catalog), &AuthzConfig::default())
    }

    fn get_pod(namespace: &str) -> Action {
        Action::resource("get", "pods").in_namespace(namespace).build()
    }

    fn bob() -> Principal {
        Principal::new("bob").with_group("system:authenticated")
    }

    #[test]
    fn test_ignored_requests() {
        let authz = authorizer(
            StaticCatalog::new()
                .with_synced(false)
                .with_restriction(admins_only()),
        );
        for action in [
            Action::non_resource("get", "/healthz"),
            Action::resource("get", "pods").build(),
            get_pod("kube-system"),
        ] {
            let decision = authz.authorize(&bob(), &action);
            assert!(decision.is_no_opinion(), "{action}");
            assert_eq!(decision.reason, "");
        }
    }

    #[test]
    fn test_disabled_is_no_opinion() {
        let mut config = AuthzConfig::default();
        config.access_restriction.enabled = false;
        let catalog = Arc::new(StaticCatalog::new().with_restriction(admins_only()));
        let authz = AccessRestrictionAuthorizer::from_catalog(catalog, &config);
        assert!(authz.authorize(&bob(), &get_pod("ns")).is_no_opinion());
    }

    #[test]
    fn test_not_synced_fails_closed() {
        let catalog = Arc::new(StaticCatalog::new());
        let synced = Arc::new(AtomicBool::new(false));
        let authz = AccessRestrictionAuthorizer::new(
            catalog.clone(),
            catalog.clone(),
            catalog,
            synced.clone(),
            &AuthzConfig::default(),
        );

        let decision = authz.authorize(&bob(), &get_pod("ns"));
        assert!(decision.is_denied());
        assert_eq!(decision.reason, NOT_SYNCED_REASON);

        synced.store(true, Ordering::Release);
        assert!(authz.authorize(&bob(), &get_pod("ns")).is_no_opinion());
    }

    struct FailingLister;

    impl AccessRestrictionLister for FailingLister {
        fn list_restrictions(&self, _: &LabelSelector) -> AuthzResult<Vec<AccessRestriction>> {
            Err(AuthzError::lookup("restriction cache unavailable"))
        }
    }

    #[test]
    fn test_list_error_fails_closed() {
        let catalog = Arc::new(StaticCatalog::new());
        let authz = AccessRestrictionAuthorizer::new(
            Arc::new(FailingLister),
            catalog.clone(),
            catalog.clone(),
            catalog,
            &AuthzConfig::default(),
        );
        let decision = authz.authorize(&bob(), &get_pod("ns"));
        assert!(decision.is_denied());
        assert_eq!(decision.reason, LIST_ERROR_REASON);
        assert!(decision.error().is_some());
    }

    #[test]
    fn test_allow_list_with_deny_all() {
        let authz = authorizer(StaticCatalog::new().with_restriction(admins_only()));

        let decision = authz.authorize(&bob(), &get_pod("ns"));
        assert!(decision.is_denied());
        assert_eq!(decision.reason, DENIED_REASON);

        assert!(authz.authorize(&bob().with_group("admins"), &get_pod("ns")).is_no_opinion());
        assert!(
            authz
                .authorize(&bob(), &Action::resource("list", "pods").in_namespace("ns").build())
                .is_no_opinion()
        );
    }

    #[test]
    fn test_allow_list_only_denies_non_members() {
        let restriction = AccessRestriction::new("pods", get_pods())
            .allow(GroupRestriction::groups(["admins"]));
        let authz = authorizer(StaticCatalog::new().with_restriction(restriction));

        assert!(authz.authorize(&Principal::new("bob"), &get_pod("ns")).is_denied());
        assert!(
            authz
                .authorize(&Principal::new("bob").with_group("admins"), &get_pod("ns"))
                .is_no_opinion()
        );
    }

    #[test]
    fn test_deny_list_only() {
        let restriction = AccessRestriction::new("no-gopher", get_pods())
            .deny(UserRestriction::users(["gopher"]).with_groups(["pythons"]));
        let authz = authorizer(StaticCatalog::new().with_restriction(restriction));

        assert!(authz.authorize(&Principal::new("gopher"), &get_pod("ns")).is_denied());
        assert!(
            authz
                .authorize(&Principal::new("x").with_group("pythons"), &get_pod("ns"))
                .is_denied()
        );
        assert!(authz.authorize(&bob(), &get_pod("ns")).is_no_opinion());
    }

    #[test]
    fn test_empty_match_attributes_matches_everything() {
        let restriction = AccessRestriction::new("everything", Vec::new())
            .deny(UserRestriction::users(["mallory"]));
        let authz = authorizer(StaticCatalog::new().with_restriction(restriction));
        let action = Action::resource("delete", "configmaps")
            .in_namespace("ns")
            .build();

        let decision = authz.authorize(&Principal::new("mallory"), &action);
        assert!(decision.is_denied());
        assert_eq!(decision.reason, DENIED_REASON);
        assert!(matches!(
            decision.errors.as_slice(),
            [AuthzError::InvalidRule { .. }]
        ));

        let decision = authz.authorize(&bob(), &get_pod("ns"));
        assert!(decision.is_no_opinion());
        assert_eq!(decision.reason, "");
        assert!(matches!(
            decision.errors.as_slice(),
            [AuthzError::InvalidRule { .. }]
        ));
    }

    #[test]
    fn test_valid_restrictions_report_no_errors() {
        let authz = authorizer(StaticCatalog::new().with_restriction(admins_only()));
        let decision = authz.authorize(&bob().with_group("admins"), &get_pod("ns"));
        assert!(decision.is_no_opinion());
        assert!(decision.errors.is_empty());
    }

    #[test]
    fn test_group_selector_membership() {
        let restriction = AccessRestriction::new("secrets", get_pods())
            .allow(
                GroupRestriction::default()
                    .with_selector(LabelSelector::default().with_label("can", "read")),
            )
            .deny(GroupRestriction::groups(["system:authenticated"]));
        let catalog = StaticCatalog::new()
            .with_restriction(restriction)
            .with_group(
                Group::new("readers")
                    .with_label("can", "read")
                    .with_users(["bob"]),
            )
            .with_group(Group::new("virtual").with_label("can", "read"));
        let authz = authorizer(catalog);

        assert!(authz.authorize(&bob(), &get_pod("ns")).is_no_opinion());
        let carol = Principal::new("carol").with_groups(["virtual", "system:authenticated"]);
        assert!(authz.authorize(&carol, &get_pod("ns")).is_no_opinion());
        let dave = Principal::new("dave").with_group("system:authenticated");
        assert!(authz.authorize(&dave, &get_pod("ns")).is_denied());
    }

    #[test]
    fn test_user_selector_membership() {
        let restriction = AccessRestriction::new("labeled", get_pods())
            .allow(
                UserRestriction::default()
                    .with_selector(LabelSelector::default().with_label("not", "stable")),
            )
            .deny(GroupRestriction::groups(["system:authenticated"]));
        let catalog = StaticCatalog::new()
            .with_restriction(restriction)
            .with_user(User::new("eric").with_label("not", "stable"))
            .with_user(
                User::new("randy")
                    .with_label("not", "stable")
                    .with_groups(["sharks"]),
            );
        let authz = authorizer(catalog);

        let eric = Principal::new("eric").with_group("system:authenticated");
        assert!(authz.authorize(&eric, &get_pod("ns")).is_no_opinion());
        let shark = Principal::new("anyone").with_groups(["sharks", "system:authenticated"]);
        assert!(authz.authorize(&shark, &get_pod("ns")).is_no_opinion());
        assert!(authz.authorize(&bob(), &get_pod("ns")).is_denied());
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let bad = LabelSelector::default().with_label("bad key!", "x");
        let restriction = AccessRestriction::new("bad", get_pods())
            .allow(GroupRestriction::default().with_selector(bad))
            .deny(GroupRestriction::groups(["system:authenticated"]));
        let catalog = StaticCatalog::new()
            .with_restriction(restriction)
            .with_group(Group::new("g").with_users(["bob"]));
        let authz = authorizer(catalog);
        assert!(authz.authorize(&bob(), &get_pod("ns")).is_denied());
    }

    #[test]
    fn test_every_matching_restriction_must_permit() {
        let lenient =
            AccessRestriction::new("lenient", get_pods()).allow(UserRestriction::users(["bob"]));
        let strict =
            AccessRestriction::new("strict", get_pods()).deny(UserRestriction::users(["bob"]));
        let authz = authorizer(
            StaticCatalog::new()
                .with_restriction(lenient)
                .with_restriction(strict),
        );
        assert!(authz.authorize(&bob(), &get_pod("ns")).is_denied());
    }
}
