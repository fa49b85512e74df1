use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::instrument;
use travel_core::types::{now_unix, UserRole};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::error::{Result, UserError};
use crate::types::{IssuedTokens, User};

pub struct UserStore {
    db: Mutex<Connection>,
    tokens: TokenIssuer,
}

impl UserStore {
    pub fn new(conn: Connection, tokens: TokenIssuer) -> Self {
        Self {
            db: Mutex::new(conn),
            tokens,
        }
    }

    #[instrument(skip(self, password), fields(email))]
    pub fn register(&self, email: &str, display_name: &str, password: &str) -> Result<User> {
        let db = self.db.lock().unwrap();
        let existing: Option<i64> = db
            .query_row("SELECT 1 FROM users WHERE email = ?1", params![email], |r| r.get(0))
            .optional()?;
        if existing.is_some() {
            return Err(UserError::EmailTaken(email.to_string()));
        }

        let now = now_unix();
        let user = User {
            id: Uuid::now_v7().to_string(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            role: UserRole::User,
            password_hash: hash_password(password)?,
            created_at: now,
            updated_at: now,
        };
        db.execute(
            "INSERT INTO users (id, email, display_name, role, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id,
                user.email,
                user.display_name,
                user.role.to_string(),
                user.password_hash,
                user.created_at,
                user.updated_at,
            ],
        )?;
        Ok(user)
    }

    #[instrument(skip(self, password), fields(email))]
    pub fn login(&self, email: &str, password: &str) -> Result<(User, IssuedTokens)> {
        let user = {
            let db = self.db.lock().unwrap();
            db.query_row(
                "SELECT id, email, display_name, role, password_hash, created_at, updated_at
                 FROM users WHERE email = ?1",
                params![email],
                row_to_user,
            )
            .optional()?
            .ok_or(UserError::InvalidCredentials)?
        };
        if !verify_password(password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }
        let tokens = self.tokens.issue(&user.id)?;
        self.track_refresh_token(&tokens)?;
        Ok((user, tokens))
    }

    /// Verifies the refresh token, revokes it, and issues a fresh pair —
    /// rotation means a stolen refresh token is only usable once.
    #[instrument(skip(self, refresh_token))]
    pub fn refresh_token(&self, refresh_token: &str) -> Result<IssuedTokens> {
        let claims = self.tokens.verify(refresh_token, "refresh")?;
        {
            let db = self.db.lock().unwrap();
            let revoked: Option<i64> = db
                .query_row(
                    "SELECT revoked FROM refresh_tokens WHERE jti = ?1",
                    params![claims.jti],
                    |r| r.get(0),
                )
                .optional()?;
            match revoked {
                Some(0) => {}
                _ => return Err(UserError::TokenRejected),
            }
            db.execute(
                "UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?1",
                params![claims.jti],
            )?;
        }
        let tokens = self.tokens.issue(&claims.sub)?;
        self.track_refresh_token(&tokens)?;
        Ok(tokens)
    }

    #[instrument(skip(self, access_token))]
    pub fn validate_session(&self, access_token: &str) -> Result<String> {
        let claims = self.tokens.verify(access_token, "access")?;
        Ok(claims.sub)
    }

    #[instrument(skip(self, refresh_token))]
    pub fn logout(&self, refresh_token: &str) -> Result<()> {
        let claims = self.tokens.verify(refresh_token, "refresh")?;
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?1",
            params![claims.jti],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn get_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let db = self.db.lock().unwrap();
        let row = db
            .query_row(
                "SELECT id, email, display_name, role, password_hash, created_at, updated_at
                 FROM users WHERE id = ?1",
                params![user_id],
                row_to_user,
            )
            .optional()?;
        Ok(row)
    }

    fn track_refresh_token(&self, tokens: &IssuedTokens) -> Result<()> {
        let claims = self.tokens.verify(&tokens.refresh_token, "refresh")?;
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO refresh_tokens (jti, user_id, revoked, expires_at, created_at)
             VALUES (?1, ?2, 0, ?3, ?4)",
            params![claims.jti, claims.sub, claims.exp, claims.iat],
        )?;
        Ok(())
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    use std::str::FromStr;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        role: UserRole::from_str(&row.get::<_, String>(3)?).unwrap_or_default(),
        password_hash: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
