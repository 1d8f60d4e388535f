//! OAuth client scope restrictions.

use crate::AuthzResult;
use crate::error::AuthzError;
use crate::types::{ClusterRoleScopeRestriction, OAuthClient, ScopeRestriction, WILDCARD};

use super::parse::{ClusterRoleScope, UserScope};

/// Checks that a client may issue a token carrying `scopes`.
///
/// A client with restrictions may not request unscoped tokens. A client
/// without restrictions may request anything. Otherwise every scope must
/// satisfy at least one restriction.
///
/// # Errors
///
/// Returns the aggregated per-scope violations.
pub fn validate_scope_restrictions<S: AsRef<str>>(
    client: &OAuthClient,
    scopes: &[S],
) -> AuthzResult<()> {
    if scopes.is_empty() {
        if client.is_restricted() {
            return Err(AuthzError::scope_restriction(format!(
                "{} may not request unscoped tokens",
                client.name
            )));
        }
        return Ok(());
    }
    if !client.is_restricted() {
        return Ok(());
    }

    let errors: Vec<AuthzError> = scopes
        .iter()
        .filter_map(|scope| validate_scope(client, scope.as_ref()).err())
        .collect();
    AuthzError::aggregate(errors).map_or(Ok(()), Err)
}

fn validate_scope(client: &OAuthClient, scope: &str) -> AuthzResult<()> {
    let mut errors = Vec::new();
    for restriction in &client.scope_restrictions {
        let result = match restriction {
            ScopeRestriction::ExactValues(literals) if literals.is_empty() => continue,
            ScopeRestriction::ExactValues(literals) => validate_literal(scope, literals),
            ScopeRestriction::ClusterRole(bounds) => validate_cluster_role(scope, bounds),
        };
        match result {
            Ok(()) => return Ok(()),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        errors.push(AuthzError::scope_restriction(format!(
            "{scope} did not match any scope restriction"
        )));
    }
    AuthzError::aggregate(errors).map_or(Ok(()), Err)
}

fn validate_literal(scope: &str, literals: &[String]) -> AuthzResult<()> {
    if literals.iter().any(|l| l == scope) {
        return Ok(());
    }
    Err(AuthzError::scope_restriction(format!(
        "{scope} not found in [{}]",
        literals.join(" ")
    )))
}

fn validate_cluster_role(scope: &str, bounds: &ClusterRoleScopeRestriction) -> AuthzResult<()> {
    let parsed = ClusterRoleScope::parse(scope)?;
    let approved = |allowed: &[String], value: &str| {
        allowed.iter().any(|a| a == WILDCARD || a == value)
    };

    if !approved(&bounds.role_names, &parsed.role) {
        return Err(AuthzError::scope_restriction(format!(
            "{scope} does not use an approved name"
        )));
    }
    if !approved(&bounds.namespaces, &parsed.namespace) {
        return Err(AuthzError::scope_restriction(format!(
            "{scope} does not use an approved namespace"
        )));
    }
    if parsed.escalating && !bounds.allow_escalation {
        return Err(AuthzError::scope_restriction(format!(
            "{scope} is not allowed to escalate"
        )));
    }
    Ok(())
}

/// Restrictions for a service account acting as an OAuth client.
///
/// The account may request the read-only user scopes and any role scope
/// within its own namespace, escalating or not.
#[must_use]
pub fn service_account_scope_restrictions(namespace: &str) -> Vec<ScopeRestriction> {
    vec![
        ScopeRestriction::exact([
            UserScope::Info.as_str(),
            UserScope::CheckAccess.as_str(),
            UserScope::ListScopedProjects.as_str(),
            UserScope::ListAllProjects.as_str(),
        ]),
        ScopeRestriction::ClusterRole(ClusterRoleScopeRestriction::new(
            [WILDCARD],
            [namespace],
            true,
        )),
    ]
}

/// The OAuth client view of a service account.
#[must_use]
pub fn service_account_client(namespace: &str, name: &str) -> OAuthClient {
    OAuthClient {
        name: format!("system:serviceaccount:{namespace}:{name}"),
        scope_restrictions: service_account_scope_restrictions(namespace),
    }
}
