//! The action a principal asks to perform.
//!
//! An action is either a resource request (verb on a typed API object,
//! optionally namespaced) or a non-resource request (verb on a URL path such
//! as `/healthz`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A requested action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    /// An action on an API resource.
    Resource(ResourceAction),
    /// An action on a non-resource URL.
    NonResource(NonResourceAction),
}

impl Action {
    /// Starts building a resource action.
    #[must_use]
    pub fn resource(verb: impl Into<String>, resource: impl Into<String>) -> ResourceAction {
        ResourceAction::new(verb, resource)
    }

    /// Creates a non-resource action.
    #[must_use]
    pub fn non_resource(verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self::NonResource(NonResourceAction {
            verb: verb.into(),
            path: path.into(),
        })
    }

    /// Returns `true` for resource requests.
    #[must_use]
    pub fn is_resource_request(&self) -> bool {
        matches!(self, Self::Resource(_))
    }

    /// The requested verb.
    #[must_use]
    pub fn verb(&self) -> &str {
        match self {
            Self::Resource(r) => &r.verb,
            Self::NonResource(n) => &n.verb,
        }
    }

    /// Target namespace, empty for cluster-scoped and non-resource requests.
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::Resource(r) => &r.namespace,
            Self::NonResource(_) => "",
        }
    }

    /// The resource part, if this is a resource request.
    #[must_use]
    pub fn as_resource(&self) -> Option<&ResourceAction> {
        match self {
            Self::Resource(r) => Some(r),
            Self::NonResource(_) => None,
        }
    }
}

impl From<ResourceAction> for Action {
    fn from(value: ResourceAction) -> Self {
        Self::Resource(value)
    }
}

impl From<NonResourceAction> for Action {
    fn from(value: NonResourceAction) -> Self {
        Self::NonResource(value)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(r) => write!(f, "{r}"),
            Self::NonResource(n) => write!(f, "{} {}", n.verb, n.path),
        }
    }
}

/// A verb on an API resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAction {
    /// Logical verb (get, list, watch, create, update, patch, delete, ...).
    pub verb: String,
    /// API group, empty for the legacy core group.
    #[serde(default)]
    pub api_group: String,
    /// API version.
    #[serde(default)]
    pub api_version: String,
    /// Resource type (e.g. "pods").
    pub resource: String,
    /// Subresource (e.g. "log"), empty if none.
    #[serde(default)]
    pub subresource: String,
    /// Object name, empty for collection requests.
    #[serde(default)]
    pub name: String,
    /// Namespace, empty for cluster-scoped requests.
    #[serde(default)]
    pub namespace: String,
}

impl ResourceAction {
    /// Creates a cluster-scoped resource action in the core group.
    #[must_use]
    pub fn new(verb: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            resource: resource.into(),
            ..Default::default()
        }
    }

    /// Sets the API group.
    #[must_use]
    pub fn group(mut self, api_group: impl Into<String>) -> Self {
        self.api_group = api_group.into();
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Sets the subresource.
    #[must_use]
    pub fn subresource(mut self, subresource: impl Into<String>) -> Self {
        self.subresource = subresource.into();
        self
    }

    /// Sets the object name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Finishes building.
    #[must_use]
    pub fn build(self) -> Action {
        Action::Resource(self)
    }

    /// `resource` or `resource/subresource`.
    #[must_use]
    pub fn combined_resource(&self) -> String {
        if self.subresource.is_empty() {
            self.resource.clone()
        } else {
            format!("{}/{}", self.resource, self.subresource)
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.verb)?;
        if !self.api_group.is_empty() {
            write!(f, "{}.", self.api_group)?;
        }
        write!(f, "{}", self.combined_resource())?;
        if !self.name.is_empty() {
            write!(f, " \"{}\"", self.name)?;
        }
        if !self.namespace.is_empty() {
            write!(f, " in {}", self.namespace)?;
        }
        Ok(())
    }
}

/// A verb on a non-resource URL path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonResourceAction {
    /// HTTP verb, lower-cased.
    pub verb: String,
    /// URL path with leading `/`.
    pub path: String,
}
