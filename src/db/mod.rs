pub mod memory;
pub mod pool;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::mood_entry::{MoodEntry, NewMoodEntry};
use crate::models::settings::SettingKey;
use crate::models::user::{NewUser, RefreshToken, User};

pub use pool::create_pool;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed record {id}: {reason}")]
    Decode { id: String, reason: String },

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StoreError::Decode {
                id: "unknown".into(),
                reason: e.to_string(),
            },
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait MoodStore: Send + Sync {
    async fn create_entry(&self, owner: Uuid, entry: NewMoodEntry) -> StoreResult<MoodEntry>;

    /// All entries for `owner`, newest first. Malformed records are skipped.
    async fn fetch_entries(&self, owner: Uuid) -> StoreResult<Vec<MoodEntry>>;

    async fn count_entries(&self, owner: Uuid) -> StoreResult<i64>;

    /// Returns how many entries were removed.
    async fn delete_all_entries(&self, owner: Uuid) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Fails with `StoreError::Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn store_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        parent_token_id: Option<Uuid>,
    ) -> StoreResult<Uuid>;

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>>;

    async fn revoke_refresh_token(&self, id: Uuid) -> StoreResult<()>;

    async fn revoke_all_refresh_tokens(&self, user_id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The stored value, or `None` when the user never set this key.
    async fn get_setting(&self, owner: Uuid, key: SettingKey) -> StoreResult<Option<Value>>;

    async fn set_setting(&self, owner: Uuid, key: SettingKey, value: Value) -> StoreResult<()>;
}
