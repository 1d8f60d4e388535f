//! Translation of token scopes into policy rules.
//!
//! Every translation starts from a discovery rule so that scoped tokens can
//! always probe the API. Each scope then contributes its own rules. A scope
//! that cannot be evaluated is recorded as an error and the remaining scopes
//! are still translated.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use tracing::debug;

use super::parse::{ALL_NAMESPACES, ClusterRoleScope, Scope, USER_INDICATOR, UserScope};
use crate::AuthzResult;
use crate::error::{AuthzError, Partial};
use crate::policy::matcher::rules_allow;
use crate::storage::ClusterRoleLister;
use crate::types::{Action, PolicyRule, WILDCARD};

const LEGACY_GROUP: &str = "";
const CORE_GROUP: &str = "";
const USER_GROUP: &str = "user.openshift.io";
const PROJECT_GROUP: &str = "project.openshift.io";
const AUTHORIZATION_GROUP: &str = "authorization.openshift.io";
const KUBE_AUTHORIZATION_GROUP: &str = "authorization.k8s.io";
const IMAGE_GROUP: &str = "image.openshift.io";
const OAUTH_GROUP: &str = "oauth.openshift.io";
const NETWORK_GROUP: &str = "network.openshift.io";

/// Non-resource URLs every scoped token may `get`.
pub const DISCOVERY_URLS: [&str; 18] = [
    "/version",
    "/version/*",
    "/api",
    "/api/*",
    "/apis",
    "/apis/*",
    "/oapi",
    "/oapi/*",
    "/openapi/v2",
    "/swaggerapi",
    "/swaggerapi/*",
    "/swagger.json",
    "/swagger-2.0.0.pb-v1",
    "/osapi",
    "/osapi/",
    "/.well-known",
    "/.well-known/*",
    "/",
];

/// Group/resource pairs hidden from non-escalating role scopes.
pub const ESCALATING_RESOURCES: [(&str, &str); 16] = [
    (CORE_GROUP, "secrets"),
    (IMAGE_GROUP, "imagestreams/secrets"),
    (OAUTH_GROUP, "oauthauthorizetokens"),
    (OAUTH_GROUP, "oauthaccesstokens"),
    (AUTHORIZATION_GROUP, "roles"),
    (AUTHORIZATION_GROUP, "rolebindings"),
    (AUTHORIZATION_GROUP, "clusterroles"),
    (AUTHORIZATION_GROUP, "clusterrolebindings"),
    (NETWORK_GROUP, "service/externalips"),
    (LEGACY_GROUP, "imagestreams/secrets"),
    (LEGACY_GROUP, "oauthauthorizetokens"),
    (LEGACY_GROUP, "oauthaccesstokens"),
    (LEGACY_GROUP, "roles"),
    (LEGACY_GROUP, "rolebindings"),
    (LEGACY_GROUP, "clusterroles"),
    (LEGACY_GROUP, "clusterrolebindings"),
];

static DISCOVERY_RULE: LazyLock<PolicyRule> =
    LazyLock::new(|| PolicyRule::builder().verbs(["get"]).urls(DISCOVERY_URLS).rule());

/// The rule every scope translation starts with.
#[must_use]
pub fn discovery_rule() -> PolicyRule {
    DISCOVERY_RULE.clone()
}

// =============================================================================
// Rules
// =============================================================================

/// Translates scopes into the rules they permit for a request in `namespace`.
///
/// The result always starts with [`discovery_rule`]. Malformed or
/// unrecognized scopes are reported as errors without aborting the batch.
/// A role scope whose role does not exist contributes no rules and no error.
/// A role scope for another namespace contributes nothing.
pub fn scopes_to_rules<S: AsRef<str>>(
    scopes: &[S],
    namespace: &str,
    roles: Option<&dyn ClusterRoleLister>,
) -> Partial<Vec<PolicyRule>> {
    let mut rules = vec![discovery_rule()];
    let mut errors = Vec::new();

    for raw in scopes {
        let raw = raw.as_ref();
        let resolved = match Scope::parse(raw) {
            Ok(Scope::User(user)) => Ok(user_scope_rules(user)),
            Ok(Scope::ClusterRole(scope)) if !scope.applies_to(namespace) => Ok(Vec::new()),
            Ok(Scope::ClusterRole(scope)) => cluster_role_scope_rules(&scope, roles),
            Ok(Scope::Unrecognized(_)) => Err(AuthzError::unrecognized_scope(raw)),
            Err(e) => Err(e),
        };
        match resolved {
            Ok(scope_rules) => rules.extend(scope_rules),
            Err(e) => {
                debug!(scope = %raw, error = %e, "Scope contributed no rules");
                errors.push(e);
            }
        }
    }

    Partial::with_errors(rules, errors)
}

/// The fixed rules of a user scope.
#[must_use]
pub fn user_scope_rules(scope: UserScope) -> Vec<PolicyRule> {
    match scope {
        UserScope::Info => vec![
            PolicyRule::builder()
                .verbs(["get"])
                .groups([USER_GROUP, LEGACY_GROUP])
                .resources(["users"])
                .names(["~"])
                .rule(),
        ],
        UserScope::CheckAccess => vec![
            PolicyRule::builder()
                .verbs(["create"])
                .groups([KUBE_AUTHORIZATION_GROUP])
                .resources(["selfsubjectaccessreviews"])
                .rule(),
            PolicyRule::builder()
                .verbs(["create"])
                .groups([AUTHORIZATION_GROUP, LEGACY_GROUP])
                .resources(["selfsubjectrulesreviews"])
                .rule(),
        ],
        UserScope::ListScopedProjects => vec![list_projects_rule()],
        UserScope::ListAllProjects => vec![
            list_projects_rule(),
            PolicyRule::builder()
                .verbs(["get"])
                .groups([CORE_GROUP])
                .resources(["namespaces"])
                .rule(),
        ],
        UserScope::Full => vec![
            PolicyRule::builder()
                .verbs([WILDCARD])
                .groups([WILDCARD])
                .resources([WILDCARD])
                .rule(),
            PolicyRule::builder().verbs([WILDCARD]).urls([WILDCARD]).rule(),
        ],
    }
}

fn list_projects_rule() -> PolicyRule {
    PolicyRule::builder()
        .verbs(["list", "watch"])
        .groups([PROJECT_GROUP, LEGACY_GROUP])
        .resources(["projects"])
        .rule()
}

/// Rules of a role scope, ignoring its namespace.
fn cluster_role_scope_rules(
    scope: &ClusterRoleScope,
    roles: Option<&dyn ClusterRoleLister>,
) -> AuthzResult<Vec<PolicyRule>> {
    let Some(roles) = roles else {
        return Err(AuthzError::lookup(format!(
            "no cluster role lister to resolve scope {scope}"
        )));
    };
    let role = match roles.get(&scope.role) {
        Ok(role) => role,
        Err(e) if e.is_not_found() => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    if scope.escalating {
        return Ok(role.rules);
    }
    Ok(role
        .rules
        .into_iter()
        .filter(|rule| !rule.has_wildcard())
        .map(remove_escalating_resources)
        .collect())
}

/// Strips escalating resources from a rule, keeping the rest of it.
#[must_use]
pub fn remove_escalating_resources(mut rule: PolicyRule) -> PolicyRule {
    for (group, resource) in ESCALATING_RESOURCES {
        if rule.api_groups.iter().any(|g| g == group)
            && rule.resources.iter().any(|r| r == resource)
        {
            rule.resources.retain(|r| r != resource);
        }
    }
    rule
}

// =============================================================================
// Visible Namespaces
// =============================================================================

/// Namespaces whose metadata the scopes let the token read.
///
/// An empty scope list is unscoped and sees every namespace (`*`).
/// `user:full` and `user:list-projects` see every namespace; any other
/// `user:` scope sees none, even one that does not parse. A role scope
/// sees its own namespace if its rules allow `get namespaces`.
/// Unrecognized scopes are errors unless `ignore_unhandled` is set.
pub fn scopes_to_visible_namespaces<S: AsRef<str>>(
    scopes: &[S],
    roles: Option<&dyn ClusterRoleLister>,
    ignore_unhandled: bool,
) -> Partial<BTreeSet<String>> {
    if scopes.is_empty() {
        return Partial::ok(BTreeSet::from([ALL_NAMESPACES.to_string()]));
    }

    let get_namespaces = Action::resource("get", "namespaces").group(CORE_GROUP).build();
    let mut visible = BTreeSet::new();
    let mut errors = Vec::new();

    for raw in scopes {
        let raw = raw.as_ref();
        match Scope::parse(raw) {
            Ok(Scope::User(UserScope::Full | UserScope::ListAllProjects)) => {
                visible.insert(ALL_NAMESPACES.to_string());
            }
            Ok(Scope::User(_)) => {}
            Ok(Scope::ClusterRole(scope)) => match cluster_role_scope_rules(&scope, roles) {
                Ok(rules) if rules_allow(&get_namespaces, &rules) => {
                    visible.insert(scope.namespace.clone());
                }
                Ok(_) => {}
                Err(e) => errors.push(e),
            },
            Ok(Scope::Unrecognized(_)) if ignore_unhandled => {}
            Ok(Scope::Unrecognized(_)) => errors.push(AuthzError::unrecognized_scope(raw)),
            Err(_) if raw.starts_with(USER_INDICATOR) => {}
            Err(e) => errors.push(e),
        }
    }

    Partial::with_errors(visible, errors)
}

// =============================================================================
// Validation and Descriptions
// =============================================================================

/// Human-readable summary of what a scope grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeDescription {
    /// The scope string.
    pub scope: String,
    /// What the scope permits.
    pub description: String,
    /// Warning shown for scopes that reach escalating resources.
    pub warning: Option<String>,
}

/// Checks that every scope is well formed and recognized.
///
/// # Errors
///
/// Returns one error per bad scope, aggregated; an empty list is rejected.
pub fn validate_scopes<S: AsRef<str>>(scopes: &[S]) -> AuthzResult<()> {
    if scopes.is_empty() {
        return Err(AuthzError::scope_restriction("scopes may not be empty"));
    }
    let errors: Vec<AuthzError> = scopes
        .iter()
        .filter_map(|raw| {
            let raw = raw.as_ref();
            match Scope::parse(raw) {
                Ok(Scope::Unrecognized(_)) => Some(AuthzError::unrecognized_scope(raw)),
                Ok(_) => None,
                Err(e) => Some(e),
            }
        })
        .collect();
    AuthzError::aggregate(errors).map_or(Ok(()), Err)
}

/// Describes one scope.
///
/// # Errors
///
/// Returns an error if the scope is malformed or unrecognized.
pub fn describe_scope(scope: &str) -> AuthzResult<ScopeDescription> {
    let (description, warning) = match Scope::parse(scope)? {
        Scope::User(user) => (
            user_scope_description(user).to_string(),
            (user == UserScope::Full).then(|| {
                "Includes any access you have to escalating resources like secrets".to_string()
            }),
        ),
        Scope::ClusterRole(role) => {
            let where_phrase = if role.is_all_namespaces() {
                "server-wide".to_string()
            } else {
                format!("in project {:?}", role.namespace)
            };
            let (except, warning) = if role.escalating {
                (
                    "",
                    Some("Includes access to escalating resources like secrets".to_string()),
                )
            } else {
                (", except access escalating resources like secrets", None)
            };
            (
                format!(
                    "Anything you can do {where_phrase} that is also allowed by the {:?} role{except}",
                    role.role
                ),
                warning,
            )
        }
        Scope::Unrecognized(_) => return Err(AuthzError::unrecognized_scope(scope)),
    };
    Ok(ScopeDescription {
        scope: scope.to_string(),
        description,
        warning,
    })
}

/// Describes each scope, reporting the ones that cannot be described.
pub fn describe_scopes<S: AsRef<str>>(scopes: &[S]) -> Partial<Vec<ScopeDescription>> {
    let mut descriptions = Vec::with_capacity(scopes.len());
    let mut errors = Vec::new();
    for scope in scopes {
        match describe_scope(scope.as_ref()) {
            Ok(description) => descriptions.push(description),
            Err(e) => errors.push(e),
        }
    }
    Partial::with_errors(descriptions, errors)
}

/// The user scopes offered to every client, with their descriptions.
#[must_use]
pub fn default_supported_scopes() -> Vec<(&'static str, &'static str)> {
    UserScope::ALL
        .into_iter()
        .map(|s| (s.as_str(), user_scope_description(s)))
        .collect()
}

fn user_scope_description(scope: UserScope) -> &'static str {
    match scope {
        UserScope::Info => {
            "Read-only access to your user information (including username, identities, and group membership)"
        }
        UserScope::CheckAccess => {
            "Read-only access to view your privileges (for example, \"can I create builds?\")"
        }
        UserScope::ListScopedProjects => {
            "Read-only access to list your projects viewable with this token and view their metadata (display name, description, etc.)"
        }
        UserScope::ListAllProjects => {
            "Read-only access to list your projects and view their metadata (display name, description, etc.)"
        }
        UserScope::Full => "Full read/write access with all of your permissions",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StaticPolicyStore;
    use crate::types::Role;

    fn store() -> StaticPolicyStore {
        StaticPolicyStore::new()
            .with_role(Role::cluster(
                "admin",
                vec![
                    PolicyRule::builder()
                        .verbs(["get", "list"])
                        .groups([""])
                        .resources(["pods", "secrets"])
                        .rule(),
                    PolicyRule::builder()
                        .verbs(["get"])
                        .groups([""])
                        .resources(["namespaces"])
                        .rule(),
                ],
            ))
            .with_role(Role::cluster(
                "everything",
                vec![
                    PolicyRule::builder()
                        .verbs(["*"])
                        .groups(["*"])
                        .resources(["*"])
                        .rule(),
                ],
            ))
    }

    #[test]
    fn test_discovery_rule_is_always_present() {
        let partial = scopes_to_rules::<&str>(&[], "ns", None);
        assert_eq!(partial.value, vec![discovery_rule()]);
        assert!(partial.is_complete());
    }

    #[test]
    fn test_unrecognized_scope_is_reported() {
        let partial = scopes_to_rules(&["does-not-exist"], "ns", None);
        assert_eq!(partial.value, vec![discovery_rule()]);
        assert_eq!(
            partial.error().map(|e| e.to_string()),
            Some("no scope evaluator found for \"does-not-exist\"".to_string())
        );
    }

    #[test]
    fn test_bad_scope_does_not_block_others() {
        let partial = scopes_to_rules(&["role:broken", "user:info", "nope"], "ns", None);
        assert_eq!(partial.errors.len(), 2);
        assert_eq!(partial.value.len(), 2);
        assert!(rules_allow(
            &Action::resource("get", "users").named("~").build(),
            &partial.value
        ));
    }

    #[test]
    fn test_user_info_rules() {
        let partial = scopes_to_rules(&["user:info"], "", None);
        let get_self = Action::resource("get", "users")
            .group("user.openshift.io")
            .named("~")
            .build();
        assert!(rules_allow(&get_self, &partial.value));
        assert!(!rules_allow(
            &Action::resource("get", "users").named("alice").build(),
            &partial.value
        ));
    }

    #[test]
    fn test_user_full_rules() {
        let partial = scopes_to_rules(&["user:full"], "ns", None);
        assert!(rules_allow(
            &Action::resource("delete", "secrets").in_namespace("ns").build(),
            &partial.value
        ));
        assert!(rules_allow(&Action::non_resource("post", "/metrics"), &partial.value));
    }

    #[test]
    fn test_escalation_stripping() {
        let roles = store();
        let safe = scopes_to_rules(&["role:admin:*"], "ns", Some(&roles));
        let get_pods = Action::resource("get", "pods").in_namespace("ns").build();
        let get_secrets = Action::resource("get", "secrets").in_namespace("ns").build();
        assert!(rules_allow(&get_pods, &safe.value));
        assert!(!rules_allow(&get_secrets, &safe.value));

        let escalating = scopes_to_rules(&["role:admin:*:!"], "ns", Some(&roles));
        assert!(rules_allow(&get_pods, &escalating.value));
        assert!(rules_allow(&get_secrets, &escalating.value));
    }

    #[test]
    fn test_wildcard_rules_need_escalation() {
        let roles = store();
        let action = Action::resource("get", "pods").in_namespace("ns").build();
        let safe = scopes_to_rules(&["role:everything:ns"], "ns", Some(&roles));
        assert_eq!(safe.value, vec![discovery_rule()]);
        assert!(!rules_allow(&action, &safe.value));

        let escalating = scopes_to_rules(&["role:everything:ns:!"], "ns", Some(&roles));
        assert!(rules_allow(&action, &escalating.value));
    }

    #[test]
    fn test_other_namespace_scope_is_inert() {
        let roles = store();
        let partial = scopes_to_rules(&["role:admin:other"], "ns", Some(&roles));
        assert_eq!(partial.value, vec![discovery_rule()]);
        assert!(partial.is_complete());
    }

    #[test]
    fn test_missing_role_is_inert() {
        let roles = store();
        let partial = scopes_to_rules(&["role:future:*"], "ns", Some(&roles));
        assert_eq!(partial.value, vec![discovery_rule()]);
        assert!(partial.is_complete());
    }

    #[test]
    fn test_remove_escalating_resources_matches_group() {
        let rule = PolicyRule::builder()
            .verbs(["get"])
            .groups(["apps"])
            .resources(["secrets", "deployments"])
            .rule();
        assert_eq!(remove_escalating_resources(rule.clone()), rule);

        let legacy = PolicyRule::builder()
            .verbs(["get"])
            .groups([""])
            .resources(["roles", "pods", "oauthaccesstokens"])
            .rule();
        assert_eq!(remove_escalating_resources(legacy).resources, ["pods"]);
    }

    #[test]
    fn test_visible_namespaces() {
        let roles = store();
        let everything = scopes_to_visible_namespaces::<&str>(&[], Some(&roles), false);
        assert_eq!(everything.value, BTreeSet::from(["*".to_string()]));

        let listed = scopes_to_visible_namespaces(&["user:list-projects"], Some(&roles), false);
        assert_eq!(listed.value, BTreeSet::from(["*".to_string()]));

        let info = scopes_to_visible_namespaces(&["user:info"], Some(&roles), false);
        assert!(info.value.is_empty());

        let scoped = scopes_to_visible_namespaces(
            &["role:admin:alpha", "role:everything:bravo"],
            Some(&roles),
            false,
        );
        assert_eq!(scoped.value, BTreeSet::from(["alpha".to_string()]));
        assert!(scoped.is_complete());
    }

    #[test]
    fn test_visible_namespaces_unhandled() {
        let strict = scopes_to_visible_namespaces(&["bogus", "user:full"], None, false);
        assert_eq!(strict.value, BTreeSet::from(["*".to_string()]));
        assert_eq!(strict.errors.len(), 1);

        let lenient = scopes_to_visible_namespaces(&["bogus", "user:full"], None, true);
        assert!(lenient.is_complete());
    }

    #[test]
    fn test_visible_namespaces_unknown_user_scope_sees_nothing() {
        let visible = scopes_to_visible_namespaces(&["user:bogus"], None, false);
        assert!(visible.is_complete());
        assert!(visible.value.is_empty());

        let visible = scopes_to_visible_namespaces(&["user:bogus", "role:view:x:y:"], None, false);
        assert!(visible.value.is_empty());
        assert_eq!(visible.errors.len(), 1);
    }

    #[test]
    fn test_validate_scopes() {
        assert!(validate_scopes(&["user:info", "role:admin:ns"]).is_ok());
        assert!(validate_scopes::<&str>(&[]).is_err());
        let err = validate_scopes(&["user:info", "bogus", "role:x"]).unwrap_err();
        assert!(matches!(err, AuthzError::Aggregate(_)));
    }

    #[test]
    fn test_describe_scope() {
        let desc = describe_scope("role:admin:ns").unwrap();
        assert_eq!(
            desc.description,
            "Anything you can do in project \"ns\" that is also allowed by the \"admin\" role, except access escalating resources like secrets"
        );
        assert!(desc.warning.is_none());

        let desc = describe_scope("role:admin:*:!").unwrap();
        assert!(desc.description.starts_with("Anything you can do server-wide"));
        assert!(desc.warning.is_some());

        assert!(describe_scope("user:full").unwrap().warning.is_some());
        assert!(describe_scope("nope").is_err());
    }

    #[test]
    fn test_describe_scopes_and_defaults() {
        let partial = describe_scopes(&["user:info", "nope"]);
        assert_eq!(partial.value.len(), 1);
        assert_eq!(partial.errors.len(), 1);

        let defaults = default_supported_scopes();
        assert_eq!(defaults.len(), 5);
        assert_eq!(defaults[0].0, "user:info");
    }
}
