//! Forbidden messages.
//!
//! Denials carry a templated message chosen by verb and resource. Lookup
//! tries the exact verb, then `*`; within the verb, the exact resource, then
//! `*`; and falls back to a default template. Namespaced and cluster-scoped
//! requests use separate tables.
//!
//! Templates substitute `{user}`, `{verb}`, `{resource}` (group-qualified,
//! with subresource), `{name}`, `{namespace}` and `{path}`.

use std::collections::HashMap;

use crate::config::MessagesConfig;
use crate::types::{Action, Principal, ResourceAction, WILDCARD};

const NON_RESOURCE_TEMPLATE: &str = r#"User "{user}" cannot "{verb}" on "{path}""#;
const DEFAULT_TEMPLATE: &str =
    r#"User "{user}" cannot "{verb}" "{resource}" with name "{name}" in project "{namespace}""#;
const PROJECT_GET_TEMPLATE: &str = r#"User "{user}" cannot get project "{namespace}""#;

type VerbTable = HashMap<String, HashMap<String, String>>;

/// Builds denial messages for actions.
#[derive(Debug, Clone)]
pub struct ForbiddenMessageResolver {
    namespaced: VerbTable,
    cluster: VerbTable,
    non_resource: String,
    default: String,
}

impl Default for ForbiddenMessageResolver {
    fn default() -> Self {
        Self::new(&MessagesConfig::default())
    }
}

impl ForbiddenMessageResolver {
    /// Creates the resolver with the standard templates.
    #[must_use]
    pub fn new(config: &MessagesConfig) -> Self {
        let mut resolver = Self {
            namespaced: HashMap::new(),
            cluster: HashMap::new(),
            non_resource: NON_RESOURCE_TEMPLATE.to_string(),
            default: DEFAULT_TEMPLATE.to_string(),
        };

        for verb in ["create", "get", "update", "delete"] {
            resolver.add_namespaced(
                verb,
                WILDCARD,
                format!(r#"User "{{user}}" cannot {verb} {{resource}} in project "{{namespace}}""#),
            );
            resolver.add_cluster(
                verb,
                WILDCARD,
                format!(r#"User "{{user}}" cannot {verb} {{resource}} at the cluster scope"#),
            );
        }
        for verb in ["list", "watch"] {
            resolver.add_namespaced(
                verb,
                WILDCARD,
                format!(r#"User "{{user}}" cannot {verb} {{resource}} in project "{{namespace}}""#),
            );
            resolver.add_cluster(
                verb,
                WILDCARD,
                format!(r#"User "{{user}}" cannot {verb} all {{resource}} in the cluster"#),
            );
        }

        resolver.add_cluster("create", "projectrequests", config.project_request_forbidden.clone());
        resolver.add_namespaced("get", "projects", PROJECT_GET_TEMPLATE.to_string());
        resolver
    }

    /// Registers a template for namespaced requests.
    pub fn add_namespaced(&mut self, verb: &str, resource: &str, template: String) {
        self.namespaced
            .entry(verb.to_string())
            .or_default()
            .insert(resource.to_string(), template);
    }

    /// Registers a template for cluster-scoped requests.
    pub fn add_cluster(&mut self, verb: &str, resource: &str, template: String) {
        self.cluster
            .entry(verb.to_string())
            .or_default()
            .insert(resource.to_string(), template);
    }

    /// Builds the denial message for the principal and action.
    #[must_use]
    pub fn message(&self, principal: &Principal, action: &Action) -> String {
        let resource = match action {
            Action::NonResource(n) => {
                return render(&self.non_resource, |key| match key {
                    "user" => Some(principal.name.clone()),
                    "verb" => Some(n.verb.clone()),
                    "path" => Some(n.path.clone()),
                    _ => None,
                });
            }
            Action::Resource(r) => r,
        };

        let table = if resource.namespace.is_empty() {
            &self.cluster
        } else {
            &self.namespaced
        };
        let template = table
            .get(&resource.verb)
            .or_else(|| table.get(WILDCARD))
            .and_then(|by_resource| {
                by_resource
                    .get(&resource.resource)
                    .or_else(|| by_resource.get(WILDCARD))
            })
            .unwrap_or(&self.default);

        render(template, |key| match key {
            "user" => Some(principal.name.clone()),
            "verb" => Some(resource.verb.clone()),
            "resource" => Some(qualified_resource(resource)),
            "name" => Some(resource.name.clone()),
            "namespace" => Some(resource.namespace.clone()),
            _ => None,
        })
    }
}

fn qualified_resource(action: &ResourceAction) -> String {
    if action.api_group.is_empty() {
        action.combined_resource()
    } else {
        format!("{}.{}", action.api_group, action.combined_resource())
    }
}

/// Substitutes `{key}` placeholders in one pass; unknown keys are kept.
fn render<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match lookup(key) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
