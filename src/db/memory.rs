//! In-process store used when no `DATABASE_URL` is configured.
//!
//! Mood entries are kept as JSON documents per owner and decoded on read, the
//! same way a document backend would hand them back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{MoodStore, SettingsStore, StoreError, StoreResult, UserStore};
use crate::models::mood_entry::{MoodEntry, NewMoodEntry};
use crate::models::settings::SettingKey;
use crate::models::user::{NewUser, RefreshToken, User};

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<Uuid, Vec<Value>>>,
    users: RwLock<Vec<User>>,
    refresh_tokens: RwLock<Vec<RefreshToken>>,
    settings: RwLock<HashMap<(Uuid, SettingKey), Value>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }

    /// Makes every call fail with `StoreError::Unavailable`.
    #[cfg(test)]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Stores a document as-is, bypassing validation.
    #[cfg(test)]
    pub async fn insert_raw(&self, owner: Uuid, document: Value) {
        self.entries
            .write()
            .await
            .entry(owner)
            .or_default()
            .push(document);
    }
}

fn decode(document: &Value) -> StoreResult<MoodEntry> {
    serde_json::from_value(document.clone()).map_err(|e| StoreError::Decode {
        id: document
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl MoodStore for MemoryStore {
    async fn create_entry(&self, owner: Uuid, entry: NewMoodEntry) -> StoreResult<MoodEntry> {
        self.ensure_online()?;
        let created = MoodEntry {
            id: Uuid::new_v4(),
            owner_id: Some(owner),
            timestamp: entry.timestamp,
            main_mood: entry.main_mood,
            sub_mood: entry.sub_mood,
            notes: entry.notes,
        };
        let document = serde_json::to_value(&created)
            .map_err(|e| StoreError::Unavailable(format!("encode failed: {e}")))?;
        self.entries
            .write()
            .await
            .entry(owner)
            .or_default()
            .push(document);
        Ok(created)
    }

    async fn fetch_entries(&self, owner: Uuid) -> StoreResult<Vec<MoodEntry>> {
        self.ensure_online()?;
        let entries = self.entries.read().await;
        let mut decoded: Vec<MoodEntry> = entries
            .get(&owner)
            .map(|docs| {
                docs.iter()
                    .filter_map(|doc| match decode(doc) {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            tracing::warn!(owner = %owner, error = %e, "Skipping mood entry");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        decoded.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(decoded)
    }

    async fn count_entries(&self, owner: Uuid) -> StoreResult<i64> {
        self.ensure_online()?;
        let entries = self.entries.read().await;
        Ok(entries.get(&owner).map_or(0, |docs| docs.len() as i64))
    }

    async fn delete_all_entries(&self, owner: Uuid) -> StoreResult<u64> {
        self.ensure_online()?;
        let removed = self.entries.write().await.remove(&owner);
        Ok(removed.map_or(0, |docs| docs.len() as u64))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.ensure_online()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.ensure_online()?;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.ensure_online()?;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.ensure_online()?;
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email already registered".into()));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn store_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        parent_token_id: Option<Uuid>,
    ) -> StoreResult<Uuid> {
        self.ensure_online()?;
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tokens = self.refresh_tokens.write().await;
        // Revoked tokens stay until expiry so reuse can still be detected.
        tokens.retain(|t| t.expires_at > now);
        tokens.push(RefreshToken {
            id,
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            revoked: false,
            parent_token_id,
            created_at: now,
        });
        Ok(id)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        self.ensure_online()?;
        let tokens = self.refresh_tokens.read().await;
        Ok(tokens.iter().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn revoke_refresh_token(&self, id: Uuid) -> StoreResult<()> {
        self.ensure_online()?;
        let mut tokens = self.refresh_tokens.write().await;
        if let Some(token) = tokens.iter_mut().find(|t| t.id == id) {
            token.revoked = true;
        }
        Ok(())
    }

    async fn revoke_all_refresh_tokens(&self, user_id: Uuid) -> StoreResult<()> {
        self.ensure_online()?;
        let mut tokens = self.refresh_tokens.write().await;
        tokens
            .iter_mut()
            .filter(|t| t.user_id == user_id)
            .for_each(|t| t.revoked = true);
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_setting(&self, owner: Uuid, key: SettingKey) -> StoreResult<Option<Value>> {
        self.ensure_online()?;
        Ok(self.settings.read().await.get(&(owner, key)).cloned())
    }

    async fn set_setting(&self, owner: Uuid, key: SettingKey, value: Value) -> StoreResult<()> {
        self.ensure_online()?;
        self.settings.write().await.insert((owner, key), value);
        Ok(())
    }
}
