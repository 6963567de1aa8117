//! Credentials and bearer tokens.
//!
//! Passwords are stored as Argon2 PHC strings. Login issues an HS256 JWT;
//! protected routes take [`AuthenticatedUser`] or [`AdminUser`] as an
//! extractor, which rejects the request before the handler body runs.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, RepositoryError};
use crate::models::LocalUser;
use crate::AppState;

pub const ADMIN_ROLE: &str = "admin";
pub const CUSTOMER_ROLE: &str = "customer";

pub fn hash_password(password: &str) -> Result<String, RepositoryError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RepositoryError::PasswordHash(e.to_string()))
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    match PasswordHash::new(hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// [`hash_password`] on the blocking pool; Argon2 is too slow for a
/// runtime worker thread.
pub async fn hash_password_blocking(password: String) -> Result<String, RepositoryError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(
    password: String,
    hashed: String,
) -> Result<bool, RepositoryError> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &hashed)).await?)
}

/// JWT claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub unique_name: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Signs and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        TokenIssuer {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, user: &LocalUser) -> Result<String, RepositoryError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            unique_name: user.user_name.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: Uuid::new_v4(),
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
    }
}

/// Any caller presenting a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

/// A caller whose token carries the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}

fn claims_from_parts(parts: &Parts) -> Result<Claims, ApiError> {
    let state = parts
        .extensions
        .get::<AppState>()
        .ok_or(ApiError::Unauthorized)?;
    let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
    state.tokens.verify(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::Unauthorized
    })
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        claims_from_parts(parts).map(AuthenticatedUser)
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts)?;
        if !claims.is_admin() {
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> LocalUser {
        LocalUser {
            id: 9,
            user_name: "alice".into(),
            name: "Alice".into(),
            password: String::new(),
            role: role.into(),
        }
    }

    #[test]
    fn password_round_trip() {
        let hashed = hash_password("s3cret!").unwrap();
        assert_ne!(hashed, "s3cret!");
        assert!(verify_password("s3cret!", &hashed));
        assert!(!verify_password("wrong", &hashed));
    }

    #[tokio::test]
    async fn blocking_pool_helpers_agree_with_sync_versions() {
        let hashed = hash_password_blocking("s3cret!".to_string()).await.unwrap();
        assert!(verify_password("s3cret!", &hashed));
        assert!(verify_password_blocking("s3cret!".to_string(), hashed.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("wrong".to_string(), hashed)
            .await
            .unwrap());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn issued_token_carries_user_claims() {
        let issuer = TokenIssuer::new("test-secret", 5);
        let token = issuer.issue(&user(ADMIN_ROLE)).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, "9");
        assert_eq!(claims.unique_name, "alice");
        assert!(claims.is_admin());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = TokenIssuer::new("one", 5).issue(&user(CUSTOMER_ROLE)).unwrap();
        assert!(TokenIssuer::new("two", 5).verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", -10);
        let token = issuer.issue(&user(CUSTOMER_ROLE)).unwrap();
        assert!(issuer.verify(&token).is_err());
    }
}
