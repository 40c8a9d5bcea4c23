/// Authentication context and role gate for Axum
///
/// The API layer validates the bearer token and inserts an [`AuthContext`]
/// into the request extensions; handlers extract it with Axum's `Extension`
/// extractor. The [`require_admin`] middleware sits on the administrative
/// sub-router and rejects any principal whose role claim isn't `ADMIN`.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use userdesk_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Authenticated subject: {}", auth.subject)
/// }
/// ```

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::jwt::Claims;

/// Authentication context added to request extensions
///
/// Built from the validated token's claims; `subject` is the identity
/// provider's account identifier and the join key to the local record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Provider subject identifier
    pub subject: String,

    /// Account email, when the token carries it
    pub email: Option<String>,

    /// Role claim, when the token carries it
    pub role: Option<String>,
}

impl AuthContext {
    /// Creates an auth context from validated token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            email: claims.email.clone(),
            role: claims.role.clone(),
        }
    }

    /// Whether the principal carries the ADMIN role claim
    ///
    /// The provider stores the claim uppercased, but the comparison is
    /// case-insensitive anyway.
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|role| role.eq_ignore_ascii_case("ADMIN"))
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Authenticated but lacking the required role
    Forbidden(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AuthError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg).into_response(),
        }
    }
}

/// Admin role gate
///
/// Expects an [`AuthContext`] to already be present in the request
/// extensions (the bearer middleware runs first). Returns 403 for any
/// principal without the ADMIN role claim.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let context = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(AuthError::MissingCredentials)?;

    if !context.is_admin() {
        return Err(AuthError::Forbidden("ADMIN role required".to_string()));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Option<&str>) -> Claims {
        Claims {
            sub: "subject-1".to_string(),
            iss: "https://auth.example.com".to_string(),
            exp: 4102444800,
            iat: 1700000000,
            email: Some("user@example.com".to_string()),
            role: role.map(str::to_owned),
        }
    }

    #[test]
    fn test_auth_context_from_claims() {
        let context = AuthContext::from_claims(&claims(Some("USER")));

        assert_eq!(context.subject, "subject-1");
        assert_eq!(context.email.as_deref(), Some("user@example.com"));
        assert_eq!(context.role.as_deref(), Some("USER"));
    }

    #[test]
    fn test_is_admin_case_insensitive() {
        assert!(AuthContext::from_claims(&claims(Some("ADMIN"))).is_admin());
        assert!(AuthContext::from_claims(&claims(Some("admin"))).is_admin());
        assert!(!AuthContext::from_claims(&claims(Some("USER"))).is_admin());
        assert!(!AuthContext::from_claims(&claims(None)).is_admin());
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::Forbidden("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = AuthError::InvalidFormat("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
