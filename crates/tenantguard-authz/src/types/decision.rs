//! Authorization decisions.

use std::fmt;

use crate::error::AuthzError;

/// Outcome of an authorization check.
///
/// `NoOpinion` lets an outer chain keep evaluating other authorizers. `Deny`
/// is only returned on positive evidence of a veto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// The action is permitted.
    Allow,
    /// The action is vetoed.
    Deny,
    /// This authorizer has nothing to say about the action.
    NoOpinion,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
            Self::NoOpinion => write!(f, "no-opinion"),
        }
    }
}

/// A decision together with its reason and any non-fatal errors.
///
/// Callers must treat a non-Allow decision carrying errors as Deny.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    /// The outcome.
    pub decision: Decision,
    /// Human-readable reason.
    pub reason: String,
    /// Errors met while deciding.
    pub errors: Vec<AuthzError>,
}

impl AuthorizationDecision {
    /// Creates an allow decision.
    #[must_use]
    pub fn allow(reason: impl Into<String>) -> Self {
        Self::new(Decision::Allow, reason)
    }

    /// Creates a deny decision.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::new(Decision::Deny, reason)
    }

    /// Creates a no-opinion decision.
    #[must_use]
    pub fn no_opinion(reason: impl Into<String>) -> Self {
        Self::new(Decision::NoOpinion, reason)
    }

    fn new(decision: Decision, reason: impl Into<String>) -> Self {
        Self {
            decision,
            reason: reason.into(),
            errors: Vec::new(),
        }
    }

    /// Attaches errors.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<AuthzError>) -> Self {
        self.errors.extend(errors);
        self
    }

    /// Attaches one error.
    #[must_use]
    pub fn with_error(mut self, error: AuthzError) -> Self {
        self.errors.push(error);
        self
    }

    /// Returns `true` for an allow decision.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }

    /// Returns `true` for a deny decision.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        self.decision == Decision::Deny
    }

    /// Returns `true` for a no-opinion decision.
    #[must_use]
    pub fn is_no_opinion(&self) -> bool {
        self.decision == Decision::NoOpinion
    }

    /// Collapses the recorded errors into one, if any.
    #[must_use]
    pub fn error(&self) -> Option<AuthzError> {
        AuthzError::aggregate(self.errors.clone())
    }
}

impl fmt::Display for AuthorizationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.decision)
        } else {
            write!(f, "{}: {}", self.decision, self.reason)
        }
    }
}
