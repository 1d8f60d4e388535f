//! Rule matching.
//!
//! Decides whether a single [`PolicyRule`] covers an [`Action`]. Resource
//! actions must match the rule's verbs, API groups, resources and resource
//! names. Non-resource actions must match its verbs and URL patterns. Rules
//! of one kind never match actions of the other.
//!
//! # Usage
//!
//! ```
//! use tenantguard_authz::policy::matcher::rule_matches;
//! use tenantguard_authz::types::{Action, PolicyRule};
//!
//! let rule = PolicyRule::builder()
//!     .verbs(["get"])
//!     .groups([""])
//!     .resources(["pods"])
//!     .rule();
//! let action = Action::resource("get", "pods").in_namespace("ns").build();
//! assert!(rule_matches(&action, &rule));
//! ```

use crate::types::{Action, NonResourceAction, PolicyRule, ResourceAction, WILDCARD};

// =============================================================================
// Entry Points
// =============================================================================

/// Returns `true` if the rule covers the action.
#[must_use]
pub fn rule_matches(action: &Action, rule: &PolicyRule) -> bool {
    match action {
        Action::Resource(resource) => resource_rule_matches(resource, rule),
        Action::NonResource(non_resource) => non_resource_rule_matches(non_resource, rule),
    }
}

/// Returns `true` if any of the rules covers the action.
#[must_use]
pub fn rules_allow<'a, I>(action: &Action, rules: I) -> bool
where
    I: IntoIterator<Item = &'a PolicyRule>,
{
    rules.into_iter().any(|rule| rule_matches(action, rule))
}

fn resource_rule_matches(action: &ResourceAction, rule: &PolicyRule) -> bool {
    verb_matches(&rule.verbs, &action.verb)
        && api_group_matches(&rule.api_groups, &action.api_group)
        && resource_matches(&rule.resources, &action.resource, &action.subresource)
        && resource_name_matches(&rule.resource_names, &action.name)
}

fn non_resource_rule_matches(action: &NonResourceAction, rule: &PolicyRule) -> bool {
    verb_matches(&rule.verbs, &action.verb)
        && rule
            .non_resource_urls
            .iter()
            .any(|pattern| non_resource_url_matches(pattern, &action.path))
}

// =============================================================================
// Predicates
// =============================================================================

/// Verb match against the lower-cased request verb.
#[must_use]
pub fn verb_matches(verbs: &[String], verb: &str) -> bool {
    let verb = verb.to_lowercase();
    verbs.iter().any(|v| v == WILDCARD || *v == verb)
}

/// Case-insensitive API group match.
#[must_use]
pub fn api_group_matches(groups: &[String], group: &str) -> bool {
    groups
        .iter()
        .any(|g| g == WILDCARD || g.eq_ignore_ascii_case(group))
}

/// Matches `resource`, `resource/subresource`, `*` or `*/subresource`.
#[must_use]
pub fn resource_matches(resources: &[String], resource: &str, subresource: &str) -> bool {
    resources.iter().any(|r| {
        if r == WILDCARD {
            return true;
        }
        if subresource.is_empty() {
            return r == resource;
        }
        match r.split_once('/') {
            Some((res, sub)) => sub == subresource && (res == resource || res == WILDCARD),
            None => false,
        }
    })
}

/// Empty `names` matches any name. Otherwise the name must be listed; a
/// listed `""` only matches an unnamed request.
#[must_use]
pub fn resource_name_matches(names: &[String], name: &str) -> bool {
    names.is_empty() || names.iter().any(|n| n == name)
}

/// Exact match, `*`, or a prefix match for patterns ending in `*`.
#[must_use]
pub fn non_resource_url_matches(pattern: &str, path: &str) -> bool {
    if pattern == WILDCARD || pattern == path {
        return true;
    }
    pattern
        .strip_suffix('*')
        .is_some_and(|prefix| path.starts_with(prefix))
}
