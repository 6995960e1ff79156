//! User accounts.

use lb_crypto::password::{hash_password, verify_password};
use lb_proto::User;
use tracing::info;

use crate::db::Store;
use crate::error::StoreError;

pub const MIN_USER_NAME_LEN: usize = 3;

impl Store {
    /// Register a user.  Only the salted password hash is stored.
    pub async fn add_user(&self, user: &User) -> Result<i64, StoreError> {
        if user.name.chars().count() < MIN_USER_NAME_LEN {
            return Err(StoreError::Invalid(format!(
                "user name must have at least {MIN_USER_NAME_LEN} characters"
            )));
        }
        let password_hash = hash_password(&user.password)?;

        let res = sqlx::query("INSERT INTO users (name, full_name, password_hash) VALUES (?, ?, ?)")
            .bind(&user.name)
            .bind(&user.full_name)
            .bind(&password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::AlreadyExists(_) => {
                    StoreError::AlreadyExists(format!("user {}", user.name))
                }
                other => other,
            })?;

        let id = res.last_insert_rowid();
        info!(user = %user.name, id, "user added");
        Ok(id)
    }

    /// `Ok(false)` on a wrong password; [`StoreError::NotFound`] for an
    /// unknown user.
    pub async fn check_user_auth(&self, name: &str, password: &str) -> Result<bool, StoreError> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        let hash = hash.ok_or_else(|| StoreError::NotFound(format!("user {name}")))?;
        if hash.is_empty() {
            // Cache-local user rows carry no credentials.
            return Ok(false);
        }
        Ok(verify_password(password, &hash)?)
    }

    /// Create a credential-less user row if missing.  Used by the client
    /// cache, whose rows only exist to scope records.
    pub async fn ensure_user(&self, name: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO users (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
