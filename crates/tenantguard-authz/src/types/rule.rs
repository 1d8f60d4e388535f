//! Policy rules.
//!
//! A [`PolicyRule`] grants a set of verbs either on API resources (scoped by
//! API group, resource and optionally object name) or on non-resource URLs.

use serde::{Deserialize, Serialize};

use crate::error::AuthzError;

/// Wildcard matching any verb, group, resource or URL.
pub const WILDCARD: &str = "*";

/// A single grant of verbs on resources or non-resource URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    /// Allowed verbs, `*` for all.
    pub verbs: Vec<String>,

    /// API groups, `""` for the legacy core group and `*` for all.
    #[serde(default)]
    pub api_groups: Vec<String>,

    /// Resources, optionally `resource/subresource` qualified.
    #[serde(default)]
    pub resources: Vec<String>,

    /// Object names; empty means any name.
    #[serde(default)]
    pub resource_names: Vec<String>,

    /// Non-resource URL patterns; a trailing `*` is a prefix match.
    #[serde(default, rename = "nonResourceURLs")]
    pub non_resource_urls: Vec<String>,
}

impl PolicyRule {
    /// Starts building a rule.
    #[must_use]
    pub fn builder() -> PolicyRuleBuilder {
        PolicyRuleBuilder::default()
    }

    /// Returns `true` if the rule grants `*` verbs, groups or resources.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        [&self.verbs, &self.api_groups, &self.resources]
            .iter()
            .any(|set| set.iter().any(|v| v == WILDCARD))
    }

    /// Returns `true` if the rule applies to resource requests.
    #[must_use]
    pub fn is_resource_rule(&self) -> bool {
        !self.resources.is_empty()
    }

    /// Returns `true` if the rule applies to non-resource requests.
    #[must_use]
    pub fn is_non_resource_rule(&self) -> bool {
        !self.non_resource_urls.is_empty()
    }
}

/// Builder for [`PolicyRule`].
#[derive(Debug, Clone, Default)]
pub struct PolicyRuleBuilder {
    rule: PolicyRule,
}

fn extend<I, S>(target: &mut Vec<String>, values: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for value in values {
        let value = value.into();
        if !target.contains(&value) {
            target.push(value);
        }
    }
}

impl PolicyRuleBuilder {
    /// Adds verbs.
    #[must_use]
    pub fn verbs<I, S>(mut self, verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.rule.verbs, verbs);
        self
    }

    /// Adds API groups.
    #[must_use]
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.rule.api_groups, groups);
        self
    }

    /// Adds resources.
    #[must_use]
    pub fn resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.rule.resources, resources);
        self
    }

    /// Adds resource names.
    #[must_use]
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.rule.resource_names, names);
        self
    }

    /// Adds non-resource URL patterns.
    #[must_use]
    pub fn urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.rule.non_resource_urls, urls);
        self
    }

    /// Validates and returns the rule.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` if the rule has no verbs, mixes resources with
    /// non-resource URLs, names resources without API groups, or names
    /// neither.
    pub fn build(self) -> Result<PolicyRule, AuthzError> {
        let rule = self.rule;
        if rule.verbs.is_empty() {
            return Err(AuthzError::invalid_rule("verbs must contain at least one value"));
        }
        match (rule.is_resource_rule(), rule.is_non_resource_rule()) {
            (true, true) => Err(AuthzError::invalid_rule(
                "a rule cannot apply to both regular resources and non-resource URLs",
            )),
            (false, false) => Err(AuthzError::invalid_rule(
                "resources or nonResourceURLs must contain at least one value",
            )),
            (true, false) if rule.api_groups.is_empty() => Err(AuthzError::invalid_rule(
                "resource rules must supply at least one api group",
            )),
            (false, true) if !rule.resource_names.is_empty() || !rule.api_groups.is_empty() => {
                Err(AuthzError::invalid_rule(
                    "non-resource rules cannot name api groups or resource names",
                ))
            }
            _ => Ok(rule),
        }
    }

    /// Returns the rule without validation.
    ///
    /// Used for fixed rule sets known to be well formed.
    #[must_use]
    pub fn rule(self) -> PolicyRule {
        self.rule
    }
}
