//! Label selectors.
//!
//! Selectors pick users, groups and roles out of the external catalogs by
//! their labels. An empty selector matches everything.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AuthzError;

static LABEL_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("Invalid label name regex")
});

static DNS_SUBDOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("Invalid DNS subdomain regex")
});

const MAX_LABEL_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

/// Selector operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorOperator {
    /// Label value is one of the values.
    In,
    /// Label is absent or its value is none of the values.
    NotIn,
    /// Label is present.
    Exists,
    /// Label is absent.
    DoesNotExist,
}

impl fmt::Display for SelectorOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::NotIn => write!(f, "notin"),
            Self::Exists => write!(f, "exists"),
            Self::DoesNotExist => write!(f, "!"),
        }
    }
}

/// A single set-based requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorRequirement {
    /// Label key.
    pub key: String,
    /// Operator.
    pub operator: SelectorOperator,
    /// Values for `In` / `NotIn`.
    #[serde(default)]
    pub values: Vec<String>,
}

impl SelectorRequirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            SelectorOperator::In => value.is_some_and(|v| self.values.contains(v)),
            SelectorOperator::NotIn => value.is_none_or(|v| !self.values.contains(v)),
            SelectorOperator::Exists => value.is_some(),
            SelectorOperator::DoesNotExist => value.is_none(),
        }
    }

    fn validate(&self) -> Result<(), AuthzError> {
        validate_key(&self.key)?;
        match self.operator {
            SelectorOperator::In | SelectorOperator::NotIn if self.values.is_empty() => {
                Err(AuthzError::invalid_selector(format!(
                    "operator {} on key {:?} requires at least one value",
                    self.operator, self.key
                )))
            }
            SelectorOperator::Exists | SelectorOperator::DoesNotExist
                if !self.values.is_empty() =>
            {
                Err(AuthzError::invalid_selector(format!(
                    "operator {} on key {:?} takes no values",
                    self.operator, self.key
                )))
            }
            _ => self.values.iter().try_for_each(|v| validate_value(v)),
        }
    }
}

/// Selects objects by label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Exact key/value pairs that must all be present.
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
    /// Set-based requirements that must all hold.
    #[serde(default)]
    pub match_expressions: Vec<SelectorRequirement>,
}

impl LabelSelector {
    /// A selector matching everything.
    #[must_use]
    pub fn everything() -> Self {
        Self::default()
    }

    /// Adds an exact label requirement.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.match_labels.insert(key.into(), value.into());
        self
    }

    /// Adds a set-based requirement.
    #[must_use]
    pub fn with_expression<I, S>(
        mut self,
        key: impl Into<String>,
        operator: SelectorOperator,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.match_expressions.push(SelectorRequirement {
            key: key.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Returns `true` if the selector has no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }

    /// Checks keys, values and operator arity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelector` describing the first problem found.
    pub fn validate(&self) -> Result<(), AuthzError> {
        for (key, value) in &self.match_labels {
            validate_key(key)?;
            validate_value(value)?;
        }
        self.match_expressions
            .iter()
            .try_for_each(SelectorRequirement::validate)
    }

    /// Returns `true` if the labels satisfy every requirement.
    #[must_use]
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(k, v)| labels.get(k) == Some(v))
            && self.match_expressions.iter().all(|r| r.matches(labels))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .match_labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        for req in &self.match_expressions {
            parts.push(match req.operator {
                SelectorOperator::Exists => req.key.clone(),
                SelectorOperator::DoesNotExist => format!("!{}", req.key),
                op => format!("{} {op} ({})", req.key, req.values.join(",")),
            });
        }
        write!(f, "{}", parts.join(","))
    }
}

fn validate_key(key: &str) -> Result<(), AuthzError> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };
    if let Some(prefix) = prefix
        && (prefix.is_empty()
            || prefix.len() > MAX_PREFIX_LEN
            || !DNS_SUBDOMAIN_REGEX.is_match(prefix))
    {
        return Err(AuthzError::invalid_selector(format!(
            "invalid label key prefix {prefix:?}"
        )));
    }
    if name.is_empty() || name.len() > MAX_LABEL_NAME_LEN || !LABEL_NAME_REGEX.is_match(name) {
        return Err(AuthzError::invalid_selector(format!(
            "invalid label key {key:?}"
        )));
    }
    Ok(())
}

fn validate_value(value: &str) -> Result<(), AuthzError> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > MAX_LABEL_NAME_LEN || !LABEL_NAME_REGEX.is_match(value) {
        return Err(AuthzError::invalid_selector(format!(
            "invalid label value {value:?}"
        )));
    }
    Ok(())
}
