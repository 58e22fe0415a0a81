//! Household members, passwords and login sessions.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use db::DbPool;
use db::models::{ActionType, NewUser, SessionRow, UserFlags, UserRow};
use db::repository::{action_logs, sessions, users};

use crate::error::missing;
use crate::EngineError;

/// Shortest password accepted for staff logins.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    pub password: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default = "default_true")]
    pub can_be_assigned: bool,
    #[serde(default = "default_true")]
    pub eligible_for_points: bool,
}

fn default_true() -> bool {
    true
}

pub fn hash_password(password: &str) -> Result<String, EngineError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(EngineError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| EngineError::PasswordHash(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| EngineError::PasswordHash(e.to_string()))
}

/// `false` for malformed hashes as well as mismatches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
}

impl UserService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>, EngineError> {
        Ok(users::list_users(&self.pool).await?)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserRow, EngineError> {
        users::get_user(&self.pool, id).await.map_err(missing("user"))
    }

    /// Users who may be picked as completers, helpers or assignees in forms.
    pub async fn list_assignable(&self) -> Result<Vec<UserRow>, EngineError> {
        Ok(users::list_assignable(&self.pool).await?)
    }

    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create_user(&self, input: &UserInput) -> Result<UserRow, EngineError> {
        let username = input.username.trim();
        if username.is_empty() || username.chars().any(char::is_whitespace) {
            return Err(EngineError::Validation(
                "username is required and cannot contain spaces".into(),
            ));
        }
        let display_name = match input.display_name.trim() {
            "" => username,
            name => name,
        };
        // Blank means "no password"; anything else is hashed exactly as typed.
        let password_hash = match input.password.as_deref() {
            Some(password) if !password.trim().is_empty() => Some(hash_password(password)?),
            _ if input.is_staff => {
                return Err(EngineError::Validation("staff accounts need a password".into()))
            }
            _ => None,
        };

        let user = users::create_user(
            &self.pool,
            &NewUser {
                username: username.to_owned(),
                display_name: display_name.to_owned(),
                password_hash,
                is_staff: input.is_staff,
                can_be_assigned: input.can_be_assigned,
                eligible_for_points: input.eligible_for_points,
            },
        )
        .await?;

        info!(user_id = %user.id, is_staff = user.is_staff, "user created");
        Ok(user)
    }

    /// Replace a user's flags and, when `password` is given, their password.
    /// Nothing is written unless every field is valid.
    pub async fn update_user(
        &self,
        id: Uuid,
        flags: &UserFlags,
        password: Option<&str>,
    ) -> Result<UserRow, EngineError> {
        if flags.display_name.trim().is_empty() {
            return Err(EngineError::Validation("display name is required".into()));
        }
        let hash = password.map(hash_password).transpose()?;

        let mut tx = self.pool.begin().await?;
        users::update_flags(&mut *tx, id, flags)
            .await
            .map_err(missing("user"))?;
        if let Some(hash) = hash {
            users::set_password_hash(&mut *tx, id, &hash).await?;
        }
        let user = users::get_user(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn set_password(&self, id: Uuid, password: &str) -> Result<(), EngineError> {
        let hash = hash_password(password)?;
        users::set_password_hash(&self.pool, id, &hash)
            .await
            .map_err(missing("user"))
    }

    /// Check a username/password pair. Unknown, inactive and password-less
    /// accounts all fail with [`EngineError::InvalidCredentials`].
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserRow, EngineError> {
        let user = users::find_by_username(&self.pool, username.trim()).await?;
        match user {
            Some(user)
                if user.is_active
                    && user
                        .password_hash
                        .as_deref()
                        .is_some_and(|hash| verify_password(password, hash)) =>
            {
                Ok(user)
            }
            _ => {
                warn!(username, "failed login attempt");
                Err(EngineError::InvalidCredentials)
            }
        }
    }

    /// Authenticate and open a session lasting `ttl`.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(UserRow, SessionRow), EngineError> {
        let user = self.authenticate(username, password).await?;
        let token = Uuid::new_v4().simple().to_string();

        let mut tx = self.pool.begin().await?;
        let session = sessions::create_session(&mut *tx, &token, user.id, now + ttl).await?;
        action_logs::record(
            &mut *tx,
            ActionType::Login,
            Some(user.id),
            None,
            &format!("{} logged in", user.display_name),
        )
        .await?;
        tx.commit().await?;

        info!(user = %user.username, "session started");
        Ok((user, session))
    }

    /// The active user behind a live session token.
    pub async fn resolve_session(&self, token: &str, now: DateTime<Utc>) -> Result<Option<UserRow>, EngineError> {
        let Some(session) = sessions::find_live_session(&self.pool, token, now).await? else {
            return Ok(None);
        };
        let user = users::get_user(&self.pool, session.user_id).await?;
        Ok(user.is_active.then_some(user))
    }

    pub async fn logout(&self, token: &str, user: &UserRow) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await?;
        sessions::delete_session(&mut *tx, token).await?;
        action_logs::record(
            &mut *tx,
            ActionType::Logout,
            Some(user.id),
            None,
            &format!("{} logged out", user.display_name),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Drop expired sessions. Returns how many were removed.
    pub async fn purge_sessions(&self, now: DateTime<Utc>) -> Result<u64, EngineError> {
        Ok(sessions::purge_expired(&self.pool, now).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(matches!(hash_password("short"), Err(EngineError::Validation(_))));
    }
}
