//! Access restriction veto cases over a shared set of restrictions.

use std::sync::Arc;

use tenantguard_authz::prelude::*;
use tenantguard_authz::types::SubjectMatcher;

const DENIED: &str = "denied by access restriction";

fn rule(verb: &str, group: &str, resource: &str) -> Vec<PolicyRule> {
    vec![
        PolicyRule::builder()
            .verbs([verb])
            .groups([group])
            .resources([resource])
            .rule(),
    ]
}

fn deny_everyone() -> GroupRestriction {
    GroupRestriction::groups(["system:authenticated", "system:unauthenticated"])
}

fn pods_for_admins() -> AccessRestriction {
    AccessRestriction::new("pods", rule("get", "", "pods"))
        .allow(GroupRestriction::groups(["admins", "system:serviceaccounts"]))
        .deny(deny_everyone())
}

fn secrets_for_labeled_groups() -> AccessRestriction {
    AccessRestriction::new("secrets", rule("get", "", "secrets"))
        .allow(
            GroupRestriction::groups(["system:serviceaccounts:ns2"])
                .with_selector(LabelSelector::default().with_label("can", "secret")),
        )
        .deny(deny_everyone())
}

fn configmaps_for_nancy() -> AccessRestriction {
    AccessRestriction::new("configmaps", rule("list", "", "configmaps"))
        .allow(UserRestriction::users(["nancy"]))
        .deny(deny_everyone())
}

fn identities_for_service_accounts() -> AccessRestriction {
    AccessRestriction::new("identities", rule("update", "user.openshift.io", "identities"))
        .allow(
            UserRestriction::users(["system:serviceaccount:ns3:sa3"])
                .with_groups(["system:serviceaccounts:ns4"])
                .with_selector(LabelSelector::default().with_label("not", "stable")),
        )
        .deny(GroupRestriction::groups([
            "system:authenticated",
            "system:unauthenticated",
            "system:serviceaccounts",
        ]))
}

fn no_gopher_deletes() -> AccessRestriction {
    AccessRestriction::new("serviceaccounts", rule("delete", "", "serviceaccounts")).deny(
        UserRestriction::users(["gopher"])
            .with_groups(["pythons"])
            .with_selector(LabelSelector::default().with_label("pandas", "rock")),
    )
}

fn daemonsets_for(subject: impl Into<SubjectMatcher>) -> AccessRestriction {
    AccessRestriction::new("daemonsets", rule("update", "", "daemonsets"))
        .allow(subject)
        .deny(deny_everyone())
}

fn all_restrictions() -> StaticCatalog {
    StaticCatalog::new()
        .with_restriction(pods_for_admins())
        .with_restriction(secrets_for_labeled_groups())
        .with_restriction(configmaps_for_nancy())
        .with_restriction(identities_for_service_accounts())
        .with_restriction(no_gopher_deletes())
        .with_restriction(daemonsets_for(UserRestriction::users(["user1"])))
        .with_restriction(daemonsets_for(GroupRestriction::groups(["group1"])))
}

fn request(verb: &str, group: &str, resource: &str) -> Action {
    Action::resource(verb, resource)
        .group(group)
        .named("target")
        .in_namespace("non-empty")
        .build()
}

fn user(name: &str, groups: &[&str]) -> Principal {
    Principal::new(name).with_groups(groups.iter().copied())
}

struct Case {
    name: &'static str,
    catalog: StaticCatalog,
    principal: Principal,
    action: Action,
    want: Decision,
}

fn check(cases: Vec<Case>) {
    for case in cases {
        let config = AuthzConfig::default();
        let authz = AccessRestrictionAuthorizer::from_catalog(Arc::new(case.catalog), &config);
        let decision = authz.authorize(&case.principal, &case.action);
        assert_eq!(decision.decision, case.want, "{}: {decision}", case.name);
        let want_reason = if case.want == Decision::Deny { DENIED } else { "" };
        assert_eq!(decision.reason, want_reason, "{}", case.name);
    }
}

#[test]
fn test_allow_list_by_group() {
    let get_pods = request("get", "", "pods");
    check(vec![
        Case {
            name: "outsider denied",
            catalog: all_restrictions(),
            principal: user("bob", &["system:authenticated"]),
            action: get_pods.clone(),
            want: Decision::Deny,
        },
        Case {
            name: "member passes",
            catalog: all_restrictions(),
            principal: user("bob", &["admins", "system:authenticated"]),
            action: get_pods.clone(),
            want: Decision::NoOpinion,
        },
        Case {
            name: "other verb not matched",
            catalog: all_restrictions(),
            principal: user("bob", &["system:authenticated"]),
            action: request("list", "", "pods"),
            want: Decision::NoOpinion,
        },
        Case {
            name: "service account global group passes",
            catalog: all_restrictions(),
            principal: Principal::service_account("ns1", "sa1"),
            action: get_pods,
            want: Decision::NoOpinion,
        },
    ]);
}

#[test]
fn test_allow_list_by_group_selector() {
    let get_secrets = request("get", "", "secrets");
    check(vec![
        Case {
            name: "no labeled group",
            catalog: all_restrictions(),
            principal: user("bob", &["system:authenticated"]),
            action: get_secrets.clone(),
            want: Decision::Deny,
        },
        Case {
            name: "labeled group object lists the user",
            catalog: all_restrictions()
                .with_group(Group::new("holders").with_label("can", "secret").with_users(["bob"])),
            principal: user("bob", &["system:authenticated"]),
            action: get_secrets.clone(),
            want: Decision::NoOpinion,
        },
        Case {
            name: "user carries the labeled group",
            catalog: all_restrictions()
                .with_group(Group::new("sgroup").with_label("can", "secret")),
            principal: user("bob", &["sgroup", "system:authenticated"]),
            action: get_secrets.clone(),
            want: Decision::NoOpinion,
        },
        Case {
            name: "service account namespace group",
            catalog: all_restrictions(),
            principal: Principal::service_account("ns2", "builder"),
            action: get_secrets,
            want: Decision::NoOpinion,
        },
    ]);
}

#[test]
fn test_allow_list_by_user() {
    let list_configmaps = request("list", "", "configmaps");
    check(vec![
        Case {
            name: "wrong user",
            catalog: all_restrictions(),
            principal: user("bob", &["system:authenticated"]),
            action: list_configmaps.clone(),
            want: Decision::Deny,
        },
        Case {
            name: "listed user",
            catalog: all_restrictions(),
            principal: user("nancy", &["system:authenticated"]),
            action: list_configmaps,
            want: Decision::NoOpinion,
        },
    ]);
}

#[test]
fn test_allow_list_for_service_accounts() {
    let update_identities = request("update", "user.openshift.io", "identities");
    check(vec![
        Case {
            name: "listed service account",
            catalog: all_restrictions(),
            principal: Principal::service_account("ns3", "sa3"),
            action: update_identities.clone(),
            want: Decision::NoOpinion,
        },
        Case {
            name: "right namespace, wrong name",
            catalog: all_restrictions(),
            principal: Principal::service_account("ns3", "sa4"),
            action: update_identities.clone(),
            want: Decision::Deny,
        },
        Case {
            name: "service account via namespace group",
            catalog: all_restrictions(),
            principal: Principal::service_account("ns4", "anything"),
            action: update_identities.clone(),
            want: Decision::NoOpinion,
        },
        Case {
            name: "all service accounts group is denied",
            catalog: all_restrictions(),
            principal: Principal::service_account("ns5", "sa5"),
            action: update_identities.clone(),
            want: Decision::Deny,
        },
        Case {
            name: "labeled user",
            catalog: all_restrictions().with_user(User::new("eric").with_label("not", "stable")),
            principal: user("eric", &["system:authenticated"]),
            action: update_identities.clone(),
            want: Decision::NoOpinion,
        },
        Case {
            name: "group of another labeled user",
            catalog: all_restrictions()
                .with_user(User::new("randy").with_label("not", "stable").with_groups(["sharks"])),
            principal: user("someone-else", &["sharks", "system:authenticated"]),
            action: update_identities,
            want: Decision::NoOpinion,
        },
    ]);
}

#[test]
fn test_deny_list() {
    let delete_sa = request("delete", "", "serviceaccounts");
    check(vec![
        Case {
            name: "listed user denied",
            catalog: all_restrictions(),
            principal: user("gopher", &["system:authenticated"]),
            action: delete_sa.clone(),
            want: Decision::Deny,
        },
        Case {
            name: "other user passes",
            catalog: all_restrictions(),
            principal: user("bob", &["system:authenticated"]),
            action: delete_sa.clone(),
            want: Decision::NoOpinion,
        },
        Case {
            name: "listed group denied",
            catalog: all_restrictions(),
            principal: user("bob", &["pythons", "system:authenticated"]),
            action: delete_sa.clone(),
            want: Decision::Deny,
        },
        Case {
            name: "labeled user denied",
            catalog: all_restrictions().with_user(User::new("frank").with_label("pandas", "rock")),
            principal: user("frank", &["system:authenticated"]),
            action: delete_sa.clone(),
            want: Decision::Deny,
        },
        Case {
            name: "group of another labeled user denied",
            catalog: all_restrictions().with_user(
                User::new("frank").with_label("pandas", "rock").with_groups(["danger-zone"]),
            ),
            principal: user("bob", &["danger-zone", "system:authenticated"]),
            action: delete_sa,
            want: Decision::Deny,
        },
    ]);
}

#[test]
fn test_every_matching_restriction_must_allow() {
    let update_daemonsets = request("update", "", "daemonsets");
    check(vec![
        Case {
            name: "only user given",
            catalog: all_restrictions(),
            principal: user("user1", &["system:authenticated"]),
            action: update_daemonsets.clone(),
            want: Decision::Deny,
        },
        Case {
            name: "only group given",
            catalog: all_restrictions(),
            principal: user("user2", &["group1", "system:authenticated"]),
            action: update_daemonsets.clone(),
            want: Decision::Deny,
        },
        Case {
            name: "both user and group given",
            catalog: all_restrictions(),
            principal: user("user1", &["group1", "system:authenticated"]),
            action: update_daemonsets,
            want: Decision::NoOpinion,
        },
    ]);
}

#[test]
fn test_exempt_and_cluster_scoped_requests_ignored() {
    let authz = AccessRestrictionAuthorizer::from_catalog(
        Arc::new(all_restrictions().with_synced(false)),
        &AuthzConfig::default(),
    );
    let bob = user("bob", &["system:authenticated"]);

    let exempt = Action::resource("get", "pods").in_namespace("openshift-apiserver").build();
    assert!(authz.authorize(&bob, &exempt).is_no_opinion());

    let cluster = Action::resource("get", "pods").build();
    assert!(authz.authorize(&bob, &cluster).is_no_opinion());

    assert!(authz.authorize(&bob, &Action::non_resource("get", "/api")).is_no_opinion());
    assert!(authz.authorize(&bob, &request("get", "", "pods")).is_denied());
}
