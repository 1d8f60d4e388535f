//! Default cluster roles and bindings.
//!
//! [`bootstrap_policy`] is a pure factory: it builds the same policy for the
//! same master namespace every time and holds no global state.

use crate::types::{
    AUTHENTICATED_GROUP, AUTHENTICATED_OAUTH_GROUP, PolicyRule, Role, RoleBinding, RoleRef,
    UNAUTHENTICATED_GROUP,
};

/// Unrestricted access to everything.
pub const CLUSTER_ADMIN_ROLE: &str = "cluster-admin";
/// Full control of a project, including its role bindings.
pub const ADMIN_ROLE: &str = "admin";
/// Read-write access to most objects in a project.
pub const EDIT_ROLE: &str = "edit";
/// Read-only access to most objects in a project.
pub const VIEW_ROLE: &str = "view";
/// Self-information every user needs.
pub const BASIC_USER_ROLE: &str = "basic-user";
/// Self subject access reviews.
pub const SELF_ACCESS_REVIEWER_ROLE: &str = "self-access-reviewer";
/// Project self-provisioning.
pub const SELF_PROVISIONER_ROLE: &str = "self-provisioner";
/// Health, version and discovery endpoints.
pub const CLUSTER_STATUS_ROLE: &str = "cluster-status";
/// Deleting OAuth tokens (logout).
pub const DELETE_TOKENS_ROLE: &str = "system:delete-tokens";

/// Group of cluster administrators.
pub const MASTERS_GROUP: &str = "system:masters";
/// The built-in administrator user.
pub const SYSTEM_ADMIN_USER: &str = "system:admin";

const READ: [&str; 3] = ["get", "list", "watch"];
const READ_WRITE: [&str; 8] = [
    "get",
    "list",
    "watch",
    "create",
    "update",
    "patch",
    "delete",
    "deletecollection",
];

const LEGACY_GROUP: &str = "";
const APPS_GROUP: &str = "apps";
const BATCH_GROUP: &str = "batch";
const RBAC_GROUP: &str = "rbac.authorization.k8s.io";
const KUBE_AUTHORIZATION_GROUP: &str = "authorization.k8s.io";
const AUTHORIZATION_GROUP: &str = "authorization.openshift.io";
const PROJECT_GROUP: &str = "project.openshift.io";
const USER_GROUP: &str = "user.openshift.io";
const OAUTH_GROUP: &str = "oauth.openshift.io";
const STORAGE_GROUP: &str = "storage.k8s.io";

const CORE_WORKLOAD_RESOURCES: [&str; 9] = [
    "pods",
    "replicationcontrollers",
    "services",
    "endpoints",
    "persistentvolumeclaims",
    "configmaps",
    "serviceaccounts",
    "events",
    "limitranges",
];
const POD_SUBRESOURCES: [&str; 5] = [
    "pods/attach",
    "pods/exec",
    "pods/log",
    "pods/portforward",
    "pods/proxy",
];
const APPS_RESOURCES: [&str; 4] = ["deployments", "statefulsets", "replicasets", "daemonsets"];
const BATCH_RESOURCES: [&str; 2] = ["jobs", "cronjobs"];

/// URLs every client may read for health checks and API discovery.
pub const STATUS_URLS: [&str; 20] = [
    "/healthz",
    "/healthz/*",
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

/// The default roles and the cluster bindings that grant them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapPolicy {
    /// Cluster roles.
    pub roles: Vec<Role>,
    /// Cluster role bindings, all in the master namespace.
    pub role_bindings: Vec<RoleBinding>,
}

impl BootstrapPolicy {
    /// Finds a bootstrap role by name.
    #[must_use]
    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }
}

/// Builds the default policy with cluster bindings in `master_namespace`.
#[must_use]
pub fn bootstrap_policy(master_namespace: &str) -> BootstrapPolicy {
    let roles = vec![
        cluster_admin_role(),
        admin_role(),
        edit_role(),
        view_role(),
        basic_user_role(),
        self_access_reviewer_role(),
        self_provisioner_role(),
        cluster_status_role(),
        delete_tokens_role(),
    ];

    let bind = |role: &str, binding: &str| {
        RoleBinding::new(master_namespace, binding, RoleRef::cluster(role))
    };
    let role_bindings = vec![
        bind(CLUSTER_ADMIN_ROLE, "cluster-admins")
            .with_users([SYSTEM_ADMIN_USER])
            .with_groups([MASTERS_GROUP]),
        bind(BASIC_USER_ROLE, "basic-users").with_groups([AUTHENTICATED_GROUP]),
        bind(CLUSTER_STATUS_ROLE, "cluster-status-binding")
            .with_groups([AUTHENTICATED_GROUP, UNAUTHENTICATED_GROUP]),
        bind(SELF_PROVISIONER_ROLE, "self-provisioners").with_groups([AUTHENTICATED_OAUTH_GROUP]),
        bind(SELF_ACCESS_REVIEWER_ROLE, "self-access-reviewers")
            .with_groups([AUTHENTICATED_GROUP]),
        bind(DELETE_TOKENS_ROLE, "system:delete-tokens")
            .with_groups([AUTHENTICATED_GROUP, UNAUTHENTICATED_GROUP]),
    ];

    BootstrapPolicy {
        roles,
        role_bindings,
    }
}

fn rule<const V: usize, const G: usize, const R: usize>(
    verbs: [&str; V],
    groups: [&str; G],
    resources: [&str; R],
) -> PolicyRule {
    PolicyRule::builder()
        .verbs(verbs)
        .groups(groups)
        .resources(resources)
        .rule()
}

fn cluster_admin_role() -> Role {
    Role::cluster(
        CLUSTER_ADMIN_ROLE,
        vec![
            rule(["*"], ["*"], ["*"]),
            PolicyRule::builder().verbs(["*"]).urls(["*"]).rule(),
        ],
    )
}

fn project_rules(verbs: &[&str]) -> Vec<PolicyRule> {
    vec![
        PolicyRule::builder()
            .verbs(verbs.iter().copied())
            .groups([LEGACY_GROUP])
            .resources(CORE_WORKLOAD_RESOURCES)
            .resources(POD_SUBRESOURCES)
            .rule(),
        PolicyRule::builder()
            .verbs(verbs.iter().copied())
            .groups([APPS_GROUP])
            .resources(APPS_RESOURCES)
            .rule(),
        PolicyRule::builder()
            .verbs(verbs.iter().copied())
            .groups([BATCH_GROUP])
            .resources(BATCH_RESOURCES)
            .rule(),
        rule(READ, [LEGACY_GROUP], ["namespaces"]),
    ]
}

fn admin_role() -> Role {
    let mut rules = project_rules(&READ_WRITE);
    rules.extend([
        rule(READ_WRITE, [LEGACY_GROUP], ["secrets"]),
        rule(
            READ_WRITE,
            [RBAC_GROUP, AUTHORIZATION_GROUP, LEGACY_GROUP],
            ["roles", "rolebindings"],
        ),
        rule(
            ["get", "patch", "update", "delete"],
            [PROJECT_GROUP, LEGACY_GROUP],
            ["projects"],
        ),
        rule(["create"], [KUBE_AUTHORIZATION_GROUP], ["localsubjectaccessreviews"]),
    ]);
    Role::cluster(ADMIN_ROLE, rules)
}

fn edit_role() -> Role {
    let mut rules = project_rules(&READ_WRITE);
    rules.extend([
        rule(READ_WRITE, [LEGACY_GROUP], ["secrets"]),
        rule(["get"], [PROJECT_GROUP, LEGACY_GROUP], ["projects"]),
    ]);
    Role::cluster(EDIT_ROLE, rules)
}

fn view_role() -> Role {
    let mut rules = project_rules(&READ);
    rules.push(rule(["get"], [PROJECT_GROUP, LEGACY_GROUP], ["projects"]));
    Role::cluster(VIEW_ROLE, rules)
}

fn basic_user_role() -> Role {
    Role::cluster(
        BASIC_USER_ROLE,
        vec![
            PolicyRule::builder()
                .verbs(["get"])
                .groups([USER_GROUP, LEGACY_GROUP])
                .resources(["users"])
                .names(["~"])
                .rule(),
            rule(["list"], [PROJECT_GROUP, LEGACY_GROUP], ["projectrequests"]),
            rule(["get", "list"], [AUTHORIZATION_GROUP, RBAC_GROUP], ["clusterroles"]),
            rule(READ, [STORAGE_GROUP], ["storageclasses"]),
            rule(["list", "watch"], [PROJECT_GROUP, LEGACY_GROUP], ["projects"]),
            rule(["create"], [AUTHORIZATION_GROUP, LEGACY_GROUP], ["selfsubjectrulesreviews"]),
            rule(["create"], [KUBE_AUTHORIZATION_GROUP], ["selfsubjectaccessreviews"]),
        ],
    )
}

fn self_access_reviewer_role() -> Role {
    Role::cluster(
        SELF_ACCESS_REVIEWER_ROLE,
        vec![
            rule(["create"], [AUTHORIZATION_GROUP, LEGACY_GROUP], ["selfsubjectrulesreviews"]),
            rule(["create"], [KUBE_AUTHORIZATION_GROUP], ["selfsubjectaccessreviews"]),
        ],
    )
}

fn self_provisioner_role() -> Role {
    Role::cluster(
        SELF_PROVISIONER_ROLE,
        vec![rule(["create"], [PROJECT_GROUP, LEGACY_GROUP], ["projectrequests"])],
    )
}

fn cluster_status_role() -> Role {
    Role::cluster(
        CLUSTER_STATUS_ROLE,
        vec![PolicyRule::builder().verbs(["get"]).urls(STATUS_URLS).rule()],
    )
}

fn delete_tokens_role() -> Role {
    Role::cluster(
        DELETE_TOKENS_ROLE,
        vec![rule(
            ["delete"],
            [OAUTH_GROUP, LEGACY_GROUP],
            ["oauthaccesstokens", "oauthauthorizetokens"],
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::matcher::rules_allow;
    use crate::types::Action;

    #[test]
    fn test_bootstrap_is_deterministic() {
        assert_eq!(bootstrap_policy("master"), bootstrap_policy("master"));
        assert_ne!(bootstrap_policy("master"), bootstrap_policy("other"));
    }

    #[test]
    fn test_bootstrap_contains_default_roles() {
        let policy = bootstrap_policy("");
        for name in [
            CLUSTER_ADMIN_ROLE,
            ADMIN_ROLE,
            EDIT_ROLE,
            VIEW_ROLE,
            BASIC_USER_ROLE,
            SELF_ACCESS_REVIEWER_ROLE,
            SELF_PROVISIONER_ROLE,
            CLUSTER_STATUS_ROLE,
            DELETE_TOKENS_ROLE,
        ] {
            let role = policy.role(name).unwrap();
            assert!(role.is_cluster_role(), "{name} should be a cluster role");
        }
    }

    #[test]
    fn test_bindings_live_in_master_namespace() {
        let policy = bootstrap_policy("openshift-master");
        assert!(
            policy
                .role_bindings
                .iter()
                .all(|b| b.namespace == "openshift-master" && b.role_ref.namespace.is_empty())
        );
        let admins = policy
            .role_bindings
            .iter()
            .find(|b| b.role_ref.name == CLUSTER_ADMIN_ROLE)
            .unwrap();
        assert_eq!(admins.users, [SYSTEM_ADMIN_USER]);
        assert_eq!(admins.groups, [MASTERS_GROUP]);
    }

    #[test]
    fn test_rules_are_well_formed() {
        let policy = bootstrap_policy("");
        for role in &policy.roles {
            for r in &role.rules {
                let rebuilt = PolicyRule::builder()
                    .verbs(r.verbs.clone())
                    .groups(r.api_groups.clone())
                    .resources(r.resources.clone())
                    .names(r.resource_names.clone())
                    .urls(r.non_resource_urls.clone())
                    .build();
                assert!(rebuilt.is_ok(), "{} has an invalid rule: {r:?}", role.name);
            }
        }
    }

    #[test]
    fn test_view_cannot_read_secrets() {
        let policy = bootstrap_policy("");
        let view = policy.role(VIEW_ROLE).unwrap();
        let edit = policy.role(EDIT_ROLE).unwrap();
        let read_secret = Action::resource("get", "secrets").in_namespace("ns").build();

        assert!(!rules_allow(&read_secret, &view.rules));
        assert!(rules_allow(&read_secret, &edit.rules));
        assert!(rules_allow(
            &Action::resource("list", "pods").in_namespace("ns").build(),
            &view.rules
        ));
    }

    #[test]
    fn test_basic_user_can_get_self() {
        let policy = bootstrap_policy("");
        let basic = policy.role(BASIC_USER_ROLE).unwrap();
        let get_self = Action::resource("get", "users")
            .group("user.openshift.io")
            .named("~")
            .build();
        assert!(rules_allow(&get_self, &basic.rules));
        assert!(!rules_allow(
            &Action::resource("get", "users")
                .group("user.openshift.io")
                .named("alice")
                .build(),
            &basic.rules
        ));
    }
}
