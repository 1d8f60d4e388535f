//! Authorization error types.
//!
//! This module defines the errors that can accompany an authorization
//! decision. Most of them are non-fatal: the engine records them next to a
//! best-effort result and keeps evaluating, so a single broken scope or a
//! missing role never blocks a grant found elsewhere.

use std::fmt;

/// Errors that can occur while resolving policy or evaluating a decision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// A looked-up object does not exist.
    #[error("{kind} \"{name}\" not found")]
    NotFound {
        /// Kind of the missing object (e.g. "clusterrole").
        kind: String,
        /// Name of the missing object.
        name: String,
    },

    /// A lookup against an external catalog failed.
    #[error("lookup failed: {message}")]
    Lookup {
        /// Description of the lookup failure.
        message: String,
    },

    /// A scope string is malformed.
    #[error("bad format for scope {scope}: {message}")]
    InvalidScope {
        /// The offending scope.
        scope: String,
        /// Why the scope is malformed.
        message: String,
    },

    /// No evaluator handles the scope.
    #[error("no scope evaluator found for \"{scope}\"")]
    UnrecognizedScope {
        /// The unhandled scope.
        scope: String,
    },

    /// A label selector is malformed.
    #[error("invalid label selector: {message}")]
    InvalidSelector {
        /// Description of the selector problem.
        message: String,
    },

    /// A policy rule is malformed.
    #[error("invalid policy rule: {message}")]
    InvalidRule {
        /// Description of the rule problem.
        message: String,
    },

    /// A requested scope violates an OAuth client's scope restrictions.
    #[error("{message}")]
    ScopeRestriction {
        /// Description of the violated restriction.
        message: String,
    },

    /// Backing caches have not finished their initial sync.
    #[error("authorization caches are not synced")]
    NotSynced,

    /// The authorizer configuration is invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// Several errors collected while evaluating a batch.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl AuthzError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates a new `Lookup` error.
    #[must_use]
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidScope` error.
    #[must_use]
    pub fn invalid_scope(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidScope {
            scope: scope.into(),
            message: message.into(),
        }
    }

    /// Creates a new `UnrecognizedScope` error.
    #[must_use]
    pub fn unrecognized_scope(scope: impl Into<String>) -> Self {
        Self::UnrecognizedScope {
            scope: scope.into(),
        }
    }

    /// Creates a new `InvalidSelector` error.
    #[must_use]
    pub fn invalid_selector(message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRule` error.
    #[must_use]
    pub fn invalid_rule(message: impl Into<String>) -> Self {
        Self::InvalidRule {
            message: message.into(),
        }
    }

    /// Creates a new `ScopeRestriction` error.
    #[must_use]
    pub fn scope_restriction(message: impl Into<String>) -> Self {
        Self::ScopeRestriction {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if the error reports a missing object.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the error comes from malformed input rather than
    /// from an unavailable data source.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidScope { .. }
                | Self::UnrecognizedScope { .. }
                | Self::InvalidSelector { .. }
                | Self::InvalidRule { .. }
                | Self::ScopeRestriction { .. }
        )
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } | Self::Lookup { .. } => ErrorCategory::Lookup,
            Self::InvalidScope { .. } | Self::UnrecognizedScope { .. } => ErrorCategory::Scope,
            Self::InvalidSelector { .. } | Self::InvalidRule { .. } => ErrorCategory::Validation,
            Self::ScopeRestriction { .. } => ErrorCategory::Scope,
            Self::NotSynced => ErrorCategory::Readiness,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Aggregate(_) => ErrorCategory::Aggregate,
        }
    }

    /// Collapses a list of errors into one.
    ///
    /// Returns `None` for an empty list and the error itself for a
    /// single-element list.
    #[must_use]
    pub fn aggregate(errors: Vec<AuthzError>) -> Option<AuthzError> {
        let mut flat = AggregateError::new(errors);
        match flat.errors.len() {
            0 => None,
            1 => flat.errors.pop(),
            _ => Some(Self::Aggregate(flat)),
        }
    }
}

/// Categories of authorization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Role, binding, user or group retrieval.
    Lookup,
    /// Scope parsing and client scope restrictions.
    Scope,
    /// Malformed rules or selectors.
    Validation,
    /// Backing caches not ready.
    Readiness,
    /// Configuration errors.
    Configuration,
    /// A mix of the above.
    Aggregate,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup => write!(f, "lookup"),
            Self::Scope => write!(f, "scope"),
            Self::Validation => write!(f, "validation"),
            Self::Readiness => write!(f, "readiness"),
            Self::Configuration => write!(f, "configuration"),
            Self::Aggregate => write!(f, "aggregate"),
        }
    }
}

/// A flattened list of errors.
///
/// Displays a lone error as its own message and several errors as
/// `[first, second, ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateError {
    errors: Vec<AuthzError>,
}

impl AggregateError {
    /// Creates an aggregate, flattening any nested aggregates.
    #[must_use]
    pub fn new(errors: Vec<AuthzError>) -> Self {
        let mut flat = Vec::with_capacity(errors.len());
        for err in errors {
            match err {
                AuthzError::Aggregate(inner) => flat.extend(inner.errors),
                other => flat.push(other),
            }
        }
        Self { errors: flat }
    }

    /// The collected errors.
    #[must_use]
    pub fn errors(&self) -> &[AuthzError] {
        &self.errors
    }

    /// Returns `true` if no errors were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => Ok(()),
            [only] => write!(f, "{only}"),
            many => {
                write!(f, "[")?;
                for (i, err) in many.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{err}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl std::error::Error for AggregateError {}

/// A best-effort value paired with the non-fatal errors met while computing it.
///
/// Policy is additive, so a partial value may under-report access but never
/// over-report it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partial<T> {
    /// The best-effort value.
    pub value: T,
    /// Errors recorded along the way.
    pub errors: Vec<AuthzError>,
}

impl<T> Partial<T> {
    /// Wraps a value with no errors.
    #[must_use]
    pub fn ok(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    /// Wraps a value with the given errors.
    #[must_use]
    pub fn with_errors(value: T, errors: Vec<AuthzError>) -> Self {
        Self { value, errors }
    }

    /// Returns `true` if no errors were recorded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapses the recorded errors into a single error, if any.
    #[must_use]
    pub fn error(&self) -> Option<AuthzError> {
        AuthzError::aggregate(self.errors.clone())
    }

    /// Splits into the value and the aggregated error.
    pub fn into_parts(self) -> (T, Option<AuthzError>) {
        (self.value, AuthzError::aggregate(self.errors))
    }
}
