//! Access restrictions: allow-list / deny-list vetoes over matching actions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::rule::PolicyRule;
use crate::error::AuthzError;
use crate::selector::LabelSelector;

/// A veto applied to every action matched by `match_attributes`.
///
/// A matching action passes if the principal is in the allow-list or is not
/// in the deny-list. With an allow-list and no deny-list, only allow-list
/// members pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRestriction {
    /// Restriction name, never shown to end users.
    pub name: String,

    /// Object labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Actions this restriction applies to. Empty matches everything.
    #[serde(default)]
    pub match_attributes: Vec<PolicyRule>,

    /// Subjects that always pass.
    #[serde(default)]
    pub allowed_subjects: Vec<SubjectMatcher>,

    /// Subjects that are vetoed unless also allowed.
    #[serde(default)]
    pub denied_subjects: Vec<SubjectMatcher>,
}

impl AccessRestriction {
    /// Creates a restriction over the given actions.
    #[must_use]
    pub fn new(name: impl Into<String>, match_attributes: Vec<PolicyRule>) -> Self {
        Self {
            name: name.into(),
            match_attributes,
            ..Default::default()
        }
    }

    /// Adds an allowed subject matcher.
    #[must_use]
    pub fn allow(mut self, subject: impl Into<SubjectMatcher>) -> Self {
        self.allowed_subjects.push(subject.into());
        self
    }

    /// Adds a denied subject matcher.
    #[must_use]
    pub fn deny(mut self, subject: impl Into<SubjectMatcher>) -> Self {
        self.denied_subjects.push(subject.into());
        self
    }

    /// Checks the restriction is well formed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` when `match_attributes` is empty and
    /// `InvalidSelector` for any malformed subject selector.
    pub fn validate(&self) -> Result<(), AuthzError> {
        if self.match_attributes.is_empty() {
            return Err(AuthzError::invalid_rule(format!(
                "access restriction {} has no match attributes",
                self.name
            )));
        }
        self.allowed_subjects
            .iter()
            .chain(&self.denied_subjects)
            .flat_map(SubjectMatcher::selectors)
            .try_for_each(LabelSelector::validate)
    }
}

/// Identifies a set of principals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubjectMatcher {
    /// Matches by user name, group, or selected user objects.
    #[serde(rename = "userRestriction")]
    User(UserRestriction),
    /// Matches by group or selected group objects.
    #[serde(rename = "groupRestriction")]
    Group(GroupRestriction),
}

impl SubjectMatcher {
    /// Label selectors carried by this matcher.
    #[must_use]
    pub fn selectors(&self) -> &[LabelSelector] {
        match self {
            Self::User(users) => &users.selectors,
            Self::Group(groups) => &groups.selectors,
        }
    }
}

impl From<UserRestriction> for SubjectMatcher {
    fn from(value: UserRestriction) -> Self {
        Self::User(value)
    }
}

impl From<GroupRestriction> for SubjectMatcher {
    fn from(value: GroupRestriction) -> Self {
        Self::Group(value)
    }
}

/// Matches principals by user name, direct group, or label-selected users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRestriction {
    /// Explicit user names.
    #[serde(default)]
    pub users: Vec<String>,
    /// Groups whose members match.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Selectors over the user catalog.
    #[serde(default)]
    pub selectors: Vec<LabelSelector>,
}

impl UserRestriction {
    /// Matches the named users.
    #[must_use]
    pub fn users<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Also matches members of the groups.
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Also matches users selected by the selector.
    #[must_use]
    pub fn with_selector(mut self, selector: LabelSelector) -> Self {
        self.selectors.push(selector);
        self
    }
}

/// Matches principals by group, direct or label-selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRestriction {
    /// Explicit group names.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Selectors over the group catalog.
    #[serde(default)]
    pub selectors: Vec<LabelSelector>,
}

impl GroupRestriction {
    /// Matches members of the groups.
    #[must_use]
    pub fn groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
            selectors: Vec::new(),
        }
    }

    /// Also matches groups selected by the selector.
    #[must_use]
    pub fn with_selector(mut self, selector: LabelSelector) -> Self {
        self.selectors.push(selector);
        self
    }
}
