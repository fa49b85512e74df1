use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use travel_core::types::now_unix;
use uuid::Uuid;

use crate::error::{Result, UserError};
use crate::types::{Claims, IssuedTokens};

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| UserError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| UserError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Signs and verifies the access/refresh JWT pair. One secret, two TTLs;
/// the `kind` claim keeps the token types from being used interchangeably.
pub struct TokenIssuer {
    secret: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<IssuedTokens> {
        let now = now_unix();
        let access_token = self.sign(user_id, "access", now, self.access_ttl_secs)?;
        let refresh_token = self.sign(user_id, "refresh", now, self.refresh_ttl_secs)?;
        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expires_in: self.access_ttl_secs,
        })
    }

    fn sign(&self, user_id: &str, kind: &str, now: i64, ttl_secs: i64) -> Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            kind: kind.to_string(),
            iat: now,
            exp: now + ttl_secs,
            jti: Uuid::new_v4().to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|_| UserError::TokenInvalid)
    }

    /// Verify signature and expiry, and that `expected_kind` matches. Does
    /// not check revocation — callers consult `refresh_tokens` for that.
    pub fn verify(&self, token: &str, expected_kind: &str) -> Result<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => UserError::TokenExpired,
            _ => UserError::TokenInvalid,
        })?;
        if data.claims.kind != expected_kind {
            return Err(UserError::TokenRejected);
        }
        Ok(data.claims)
    }
}
