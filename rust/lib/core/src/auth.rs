//! Authentication trait for admin routes.
//!
//! Routers do NOT depend on any specific auth scheme. They only know
//! this trait. The concrete implementation is injected at startup time.

use axum::http::{header, HeaderMap};

use crate::ServiceError;

/// Pluggable authenticator. Admin routers call this for every request
/// with a `module:resource:action` permission string.
pub trait Authenticator: Send + Sync + 'static {
    /// Authenticate a request and check the given permission.
    ///
    /// Returns `Ok(())` if allowed, `Err(ServiceError)` if denied.
    fn check(&self, headers: &HeaderMap, permission: &str) -> Result<(), ServiceError>;
}

/// A no-op authenticator that allows everything. Used when no admin
/// token is configured, and in tests.
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn check(&self, _headers: &HeaderMap, _permission: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// An authenticator that denies everything. Used for testing.
pub struct DenyAll;

impl Authenticator for DenyAll {
    fn check(&self, _headers: &HeaderMap, permission: &str) -> Result<(), ServiceError> {
        Err(ServiceError::PermissionDenied(format!(
            "permission '{}' denied",
            permission
        )))
    }
}

/// Shared-secret authenticator: `Authorization: Bearer <token>` must match.
///
/// A valid token grants every permission.
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Authenticator for BearerToken {
    fn check(&self, headers: &HeaderMap, permission: &str) -> Result<(), ServiceError> {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".into()))?;

        if presented != self.token {
            tracing::warn!(permission, "rejected admin request with invalid token");
            return Err(ServiceError::Unauthorized("invalid bearer token".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn allow_and_deny() {
        let headers = HeaderMap::new();
        assert!(AllowAll.check(&headers, "inventory:spare_part:list").is_ok());
        let err = DenyAll.check(&headers, "inventory:spare_part:list").unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
    }

    #[test]
    fn bearer_token_checks_header() {
        let auth = BearerToken::new("s3cret");
        assert!(auth.check(&headers_with("Bearer s3cret"), "x:y:z").is_ok());

        let err = auth.check(&headers_with("Bearer nope"), "x:y:z").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = auth.check(&HeaderMap::new(), "x:y:z").unwrap_err();
        assert_eq!(err.to_string(), "missing bearer token");

        let err = auth.check(&headers_with("Basic s3cret"), "x:y:z").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }
}
