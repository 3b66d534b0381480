//! Account registration, login and bearer-token checks.

pub mod password;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::{
    db::{helpers::storage_now, Database, Token, User},
    error::{ServiceError, ServiceResult},
    settings::ServiceSettings,
};
use password::{hash_password, verify_password};

/// The caller behind an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthBundle {
    pub user: User,
    pub token: Token,
}

pub fn issue_token(user_id: i64, ttl: TimeDelta, now: DateTime<Utc>) -> Token {
    Token {
        token: Uuid::new_v4().simple().to_string(),
        user_id,
        expiration: now + ttl,
    }
}

#[derive(Clone)]
pub struct Authenticator {
    db: Database,
    token_ttl: TimeDelta,
    hash_rounds: u32,
}

impl Authenticator {
    pub fn new(db: Database, settings: &ServiceSettings) -> Self {
        Self {
            db,
            token_ttl: settings.token_ttl(),
            hash_rounds: settings.hash_rounds,
        }
    }

    pub async fn register(&self, user_name: &str, password: &str) -> ServiceResult<User> {
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(ServiceError::bad_request("User name must not be empty."));
        }
        if password.is_empty() {
            return Err(ServiceError::bad_request("Password must not be empty."));
        }

        let hashed = hash_password(password, self.hash_rounds);
        self.db
            .create_user(user_name.to_string(), hashed.hash, hashed.salt, storage_now())
            .await?
            .ok_or_else(|| ServiceError::bad_request(format!("User '{user_name}' already exists.")))
    }

    /// Check credentials and issue a fresh token. Expired tokens of the user
    /// are pruned on the way.
    pub async fn login(&self, user_name: &str, password: &str) -> ServiceResult<(User, Token)> {
        let user = self
            .db
            .get_user_by_name(user_name.trim())
            .await?
            .filter(|user| verify_password(password, &user.password_salt, &user.password_hash))
            .ok_or_else(|| ServiceError::unauthorized("Incorrect user name or password."))?;

        let now = storage_now();
        self.db.delete_expired_tokens(user.user_id, now).await?;

        let token = issue_token(user.user_id, self.token_ttl, now);
        self.db.insert_token(&token).await?;
        Ok((user, token))
    }

    /// Resolve a bearer token to its user and push its expiration forward.
    pub async fn authenticate(&self, token: &str) -> ServiceResult<AuthBundle> {
        let now = storage_now();
        let mut stored = self
            .db
            .get_token(token)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("Invalid token."))?;

        if stored.is_expired(now) {
            self.db.delete_token(&stored.token).await?;
            return Err(ServiceError::unauthorized("Token expired."));
        }

        let user = self
            .db
            .get_user(stored.user_id)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("Invalid token."))?;

        stored.expiration = now + self.token_ttl;
        self.db
            .update_token_expiration(&stored.token, stored.expiration)
            .await?;

        Ok(AuthBundle {
            user,
            token: stored,
        })
    }
}
