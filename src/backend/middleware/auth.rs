/**
 * Admin Authentication Middleware
 *
 * Protects the editor-facing API routes. It extracts and verifies a JWT
 * bearer token from the Authorization header and attaches the admin identity
 * to the request extensions.
 *
 * Tokens are issued out of band (deploy tooling, a separate admin service)
 * with `create_admin_token`; this service only verifies them.
 */

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::backend::server::state::AppState;

/// JWT claims structure for admin tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Administrator identity
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// Authenticated admin identity attached to request extensions
#[derive(Clone, Debug)]
pub struct AdminUser {
    pub subject: String,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Create an admin JWT token
///
/// # Arguments
/// * `secret` - Signing secret (the configured `ADMIN_JWT_SECRET`)
/// * `subject` - Administrator identity
///
/// # Returns
/// JWT token string, valid for 30 days
pub fn create_admin_token(
    secret: &str,
    subject: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = unix_now();

    let claims = AdminClaims {
        sub: subject.to_string(),
        exp: now + 30 * 24 * 60 * 60,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Verify and decode an admin JWT token
pub fn verify_admin_token(
    secret: &str,
    token: &str,
) -> Result<AdminClaims, jsonwebtoken::errors::Error> {
    let data = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Admin authentication middleware
///
/// 1. Extracts the bearer token from the Authorization header
/// 2. Verifies it against the configured secret
/// 3. Attaches the `AdminUser` to request extensions
///
/// Returns 401 Unauthorized when the token is missing or invalid.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing Authorization header on admin route");
            StatusCode::UNAUTHORIZED
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("Invalid Authorization header format");
        StatusCode::UNAUTHORIZED
    })?;

    let claims = verify_admin_token(&state.config.admin_jwt_secret, token).map_err(|error| {
        tracing::warn!("Invalid admin token: {:?}", error);
        StatusCode::UNAUTHORIZED
    })?;

    request.extensions_mut().insert(AdminUser {
        subject: claims.sub,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_verify_token() {
        let token = create_admin_token("test-secret", "editor@example.com").unwrap();
        assert!(!token.is_empty());

        let claims = verify_admin_token("test-secret", &token).unwrap();
        assert_eq!(claims.sub, "editor@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_fails_verification() {
        let token = create_admin_token("test-secret", "editor").unwrap();
        assert!(verify_admin_token("other-secret", &token).is_err());
    }

    #[test]
    fn test_garbage_token_fails_verification() {
        assert!(verify_admin_token("test-secret", "invalid.token.here").is_err());
    }
}
