//! Authorizer configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [cluster]
//! master_namespace = "openshift-master"
//!
//! [access_restriction]
//! enabled = true
//! exempt_namespaces = ["kube-system", "openshift-apiserver"]
//!
//! [messages]
//! project_request_forbidden = "Ask your administrator for a project."
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AuthzError;

static NAMESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("Invalid namespace regex")
});

const MAX_NAMESPACE_LEN: usize = 63;

/// Root configuration of the authorizers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthzConfig {
    /// Cluster-scope settings.
    pub cluster: ClusterConfig,

    /// Access restriction settings.
    pub access_restriction: AccessRestrictionConfig,

    /// Denial message settings.
    pub messages: MessagesConfig,
}

/// Cluster-scope settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Namespace holding cluster-wide bindings. Empty means cluster scope
    /// is addressed with the empty namespace.
    pub master_namespace: String,
}

/// Access restriction settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessRestrictionConfig {
    /// Enable/disable the access restriction veto.
    pub enabled: bool,

    /// Namespaces never subject to access restrictions.
    ///
    /// These host the API servers themselves; vetoing their requests could
    /// deadlock authorization between cooperating servers.
    pub exempt_namespaces: Vec<String>,
}

impl Default for AccessRestrictionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exempt_namespaces: vec![
                "kube-system".to_string(),
                "openshift-apiserver".to_string(),
                "openshift-kube-apiserver".to_string(),
                "openshift-authentication".to_string(),
            ],
        }
    }
}

impl AccessRestrictionConfig {
    /// Returns `true` if the namespace is exempt from access restrictions.
    #[must_use]
    pub fn is_exempt_namespace(&self, namespace: &str) -> bool {
        self.exempt_namespaces.iter().any(|ns| ns == namespace)
    }
}

/// Denial message settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Message shown when project self-provisioning is refused.
    pub project_request_forbidden: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            project_request_forbidden: "You may not request a new project via this API."
                .to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for AuthzError {
    fn from(err: ConfigError) -> Self {
        AuthzError::configuration(err.to_string())
    }
}

impl AuthzConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::InvalidValue` if validation fails.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(toml).map_err(|e| ConfigError::Parse(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The master namespace is not a valid namespace name
    /// - An exempt namespace is empty or not a valid namespace name
    /// - The project request message is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let master = &self.cluster.master_namespace;
        if !master.is_empty() && !is_valid_namespace(master) {
            return Err(ConfigError::InvalidValue(format!(
                "Invalid master namespace: '{master}'"
            )));
        }

        for namespace in &self.access_restriction.exempt_namespaces {
            if !is_valid_namespace(namespace) {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid exempt namespace: '{namespace}'"
                )));
            }
        }

        if self.messages.project_request_forbidden.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "project_request_forbidden cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn is_valid_namespace(namespace: &str) -> bool {
    namespace.len() <= MAX_NAMESPACE_LEN && NAMESPACE_REGEX.is_match(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthzConfig::default();
        assert_eq!(config.cluster.master_namespace, "");
        assert!(config.access_restriction.enabled);
        assert!(config.access_restriction.is_exempt_namespace("kube-system"));
        assert!(!config.access_restriction.is_exempt_namespace("default"));
        assert_eq!(
            config.messages.project_request_forbidden,
            "You may not request a new project via this API."
        );
    }

    #[test]
    fn test_default_config_validates() {
        assert!(AuthzConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_master_namespace_fails_validation() {
        let mut config = AuthzConfig::default();
        config.cluster.master_namespace = "Not_Valid".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("master namespace"));
    }

    #[test]
    fn test_empty_exempt_namespace_fails_validation() {
        let mut config = AuthzConfig::default();
        config.access_restriction.exempt_namespaces.push(String::new());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exempt namespace"));
    }

    #[test]
    fn test_empty_message_fails_validation() {
        let mut config = AuthzConfig::default();
        config.messages.project_request_forbidden = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_str() {
        let config = AuthzConfig::from_toml_str(
            r#"
            [cluster]
            master_namespace = "openshift-master"

            [access_restriction]
            exempt_namespaces = ["kube-system"]
            "#,
        )
        .unwrap();
        assert_eq!(config.cluster.master_namespace, "openshift-master");
        assert!(config.access_restriction.enabled);
        assert_eq!(config.access_restriction.exempt_namespaces, ["kube-system"]);
        assert_eq!(config.messages, MessagesConfig::default());
    }

    #[test]
    fn test_from_toml_str_errors() {
        let err = AuthzConfig::from_toml_str("cluster = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err =
            AuthzConfig::from_toml_str("[cluster]\nmaster_namespace = \"UPPER\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let authz: AuthzError = err.into();
        assert!(matches!(authz, AuthzError::Configuration { .. }));
    }
}
