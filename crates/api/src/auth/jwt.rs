//! Admin JWTs.
//!
//! Memora has one admin identity guarded by a shared password, so every
//! token carries the same subject and role. Tokens are HS256-signed.

use jsonwebtoken::errors::Error as JwtError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subject and role of every admin token.
pub const ADMIN_ROLE: &str = "admin";

const DEFAULT_EXPIRY_MINS: i64 = 480;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    /// Expiry, UTC Unix seconds.
    pub exp: i64,
    /// Issue time, UTC Unix seconds.
    pub iat: i64,
    /// Token id, logged on admin actions.
    pub jti: String,
}

impl Claims {
    /// Fresh admin claims valid for `lifetime_secs` from now.
    pub fn admin(lifetime_secs: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: ADMIN_ROLE.to_string(),
            role: ADMIN_ROLE.to_string(),
            exp: now + lifetime_secs,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret for signing and verifying.
    pub secret: String,
    /// Admin token lifetime in minutes.
    pub expiry_mins: i64,
}

impl JwtConfig {
    /// Load from `JWT_SECRET` (required) and `JWT_EXPIRY_MINS` (default 480).
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is unset or empty, or the expiry does not parse.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set and non-empty");

        let expiry_mins = match std::env::var("JWT_EXPIRY_MINS") {
            Ok(raw) => raw
                .parse()
                .unwrap_or_else(|e| panic!("JWT_EXPIRY_MINS has an invalid value '{raw}': {e}")),
            Err(_) => DEFAULT_EXPIRY_MINS,
        };

        Self {
            secret,
            expiry_mins,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.expiry_mins * 60
    }
}

/// A signed admin token and its lifetime in seconds.
#[derive(Debug, Clone)]
pub struct AdminToken {
    pub token: String,
    pub expires_in: i64,
}

pub fn issue_admin_token(config: &JwtConfig) -> Result<AdminToken, JwtError> {
    let expires_in = config.lifetime_secs();
    let token = encode(
        &Header::default(),
        &Claims::admin(expires_in),
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok(AdminToken { token, expires_in })
}

/// Verify the signature and expiry of `token` and return its claims.
pub fn decode_claims(token: &str, config: &JwtConfig) -> Result<Claims, JwtError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
