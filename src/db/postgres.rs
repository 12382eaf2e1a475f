use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::{MoodStore, SettingsStore, StoreError, StoreResult, UserStore};
use crate::models::mood_entry::{MoodEntry, NewMoodEntry};
use crate::models::settings::SettingKey;
use crate::models::user::{NewUser, RefreshToken, User};

/// PostgreSQL-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const ENTRY_COLUMNS: &str = r#"id, owner_id, "timestamp", main_mood, sub_mood, notes"#;

#[async_trait]
impl MoodStore for PgStore {
    async fn create_entry(&self, owner: Uuid, entry: NewMoodEntry) -> StoreResult<MoodEntry> {
        let sql = format!(
            r#"
            INSERT INTO mood_entries (id, owner_id, "timestamp", main_mood, sub_mood, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ENTRY_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, MoodEntry>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner)
            .bind(entry.timestamp)
            .bind(&entry.main_mood)
            .bind(&entry.sub_mood)
            .bind(&entry.notes)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn fetch_entries(&self, owner: Uuid) -> StoreResult<Vec<MoodEntry>> {
        let sql = format!(
            r#"SELECT {ENTRY_COLUMNS} FROM mood_entries WHERE owner_id = $1 ORDER BY "timestamp" DESC"#
        );
        let rows = sqlx::query(&sql).bind(owner).fetch_all(&self.db).await?;

        // Decode row by row so one bad record does not hide the rest.
        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            match MoodEntry::from_row(row) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    let err = StoreError::Decode {
                        id: sqlx::Row::try_get::<Uuid, _>(row, "id")
                            .map(|id| id.to_string())
                            .unwrap_or_else(|_| "unknown".into()),
                        reason: e.to_string(),
                    };
                    tracing::warn!(owner = %owner, error = %err, "Skipping mood entry");
                }
            }
        }
        Ok(entries)
    }

    async fn count_entries(&self, owner: Uuid) -> StoreResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM mood_entries WHERE owner_id = $1")
                .bind(owner)
                .fetch_one(&self.db)
                .await?;
        Ok(count)
    }

    async fn delete_all_entries(&self, owner: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM mood_entries WHERE owner_id = $1")
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await?;
        Ok(())
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, created_at, updated_at";

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.db)
            .await?;
        Ok(created)
    }

    async fn store_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        parent_token_id: Option<Uuid>,
    ) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, parent_token_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(parent_token_id)
        .execute(&self.db)
        .await?;
        Ok(id)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, revoked, parent_token_id, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(token)
    }

    async fn revoke_refresh_token(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = true, revoked_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn revoke_all_refresh_tokens(&self, user_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = true, revoked_at = NOW()
            WHERE user_id = $1 AND revoked = false
            "#,
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn get_setting(&self, owner: Uuid, key: SettingKey) -> StoreResult<Option<Value>> {
        let value = sqlx::query_scalar::<_, Value>(
            "SELECT value FROM user_settings WHERE user_id = $1 AND key = $2",
        )
        .bind(owner)
        .bind(key.as_str())
        .fetch_optional(&self.db)
        .await?;
        Ok(value)
    }

    async fn set_setting(&self, owner: Uuid, key: SettingKey, value: Value) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(owner)
        .bind(key.as_str())
        .bind(value)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
