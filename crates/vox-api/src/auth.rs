//! Platform bearer-token authentication.
//!
//! Callers authenticate with a JWT minted by the platform's auth service and
//! signed with a shared secret. Verification is local; there is no network
//! round trip per request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Decoded platform token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformClaims {
    /// User ID
    pub sub: String,
    /// Email (if available)
    pub email: Option<String>,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Authenticated user extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

impl From<PlatformClaims> for AuthUser {
    fn from(claims: PlatformClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
        }
    }
}

/// Verifies platform tokens with the shared signing secret.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier from a signing secret.
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        let secret = std::env::var("PLATFORM_JWT_SECRET")
            .map_err(|_| ApiError::internal("PLATFORM_JWT_SECRET not set"))?;

        if secret.is_empty() {
            return Err(ApiError::internal("PLATFORM_JWT_SECRET cannot be empty"));
        }

        Ok(Self::new(&secret))
    }

    /// Verify a platform token.
    pub fn verify(&self, token: &str) -> Result<PlatformClaims, ApiError> {
        let token_data = decode::<PlatformClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| ApiError::unauthorized(format!("Token validation failed: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Axum extractor for authenticated users.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.verifier.verify(token)?;

        Ok(AuthUser::from(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = PlatformClaims {
            sub: "user-1".to_string(),
            email: Some("user@example.com".to_string()),
            iat: now,
            exp: now + exp_offset,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_round_trips() {
        let verifier = TokenVerifier::new("secret");
        let claims = verifier.verify(&token("secret", 3600)).unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let verifier = TokenVerifier::new("secret");
        assert!(verifier.verify(&token("other", 3600)).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = TokenVerifier::new("secret");
        assert!(verifier.verify(&token("secret", -3600)).is_err());
    }
}
