//! Credentials: password hashing and signed bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the user identity in `sub` and the admin
//! flag as a boolean claim. Privilege changes only show up in tokens issued
//! after the change.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("failed to hash password")]
    PasswordHash,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Claims embedded in every issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and validates bearer tokens
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            ttl,
        }
    }

    pub fn issue(&self, user_id: &str, is_admin: bool) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            is_admin,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

/// Decides whether a new account starts out as an admin.
///
/// Two sources, either is enough: the `isAdmin` field of the registration
/// request (when `allow_self_admin` is on) and an email suffix convention.
#[derive(Debug, Clone)]
pub struct AdminPolicy {
    pub email_suffix: Option<String>,
    pub allow_self_admin: bool,
}

impl AdminPolicy {
    pub fn from_config(config: &crate::config::AuthConfig) -> Self {
        let suffix = config.admin_email_suffix.trim().to_lowercase();
        Self {
            email_suffix: (!suffix.is_empty()).then_some(suffix),
            allow_self_admin: config.allow_self_admin,
        }
    }

    /// `email` is expected to be already lowercased
    pub fn grants_admin(&self, email: &str, requested: bool) -> bool {
        if requested && self.allow_self_admin {
            return true;
        }
        self.email_suffix
            .as_deref()
            .is_some_and(|suffix| email.ends_with(suffix))
    }
}

/// Hash a password with a fresh random salt (argon2id, PHC string format)
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// A stored value that is not a parseable PHC string fails like a wrong
/// password.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}
