//! Session handoff: the most recent draft of an anonymous user, kept under an
//! opaque token for a bounded time.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::info;

use crate::portfolio::model::PortfolioData;
use crate::store::StoreError;

pub const DEFAULT_HANDOFF_TTL: Duration = Duration::from_secs(3600);

const KEY_PREFIX: &str = "folio:handoff:";

#[async_trait]
pub trait HandoffStore: Send + Sync {
    /// Stores `data` under `token`, replacing any previous draft and resetting its TTL.
    async fn put(&self, token: &str, data: &PortfolioData) -> Result<(), StoreError>;

    /// The draft under `token`, or `None` when absent or expired.
    async fn get(&self, token: &str) -> Result<Option<PortfolioData>, StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisHandoffStore {
    client: redis::Client,
    ttl: Duration,
}

impl RedisHandoffStore {
    pub fn new(client: redis::Client, ttl: Duration) -> Self {
        info!("Redis handoff store initialized (ttl: {}s)", ttl.as_secs());
        Self { client, ttl }
    }
}

#[async_trait]
impl HandoffStore for RedisHandoffStore {
    async fn put(&self, token: &str, data: &PortfolioData) -> Result<(), StoreError> {
        let payload = serde_json::to_string(data)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(format!("{KEY_PREFIX}{token}"))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<PortfolioData>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = redis::cmd("GET")
            .arg(format!("{KEY_PREFIX}{token}"))
            .query_async(&mut conn)
            .await?;
        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Memory
// ────────────────────────────────────────────────────────────────────────────

pub struct MemoryHandoffStore {
    ttl: Duration,
    drafts: RwLock<HashMap<String, (Instant, PortfolioData)>>,
}

impl MemoryHandoffStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            drafts: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryHandoffStore {
    fn default() -> Self {
        Self::new(DEFAULT_HANDOFF_TTL)
    }
}

#[async_trait]
impl HandoffStore for MemoryHandoffStore {
    async fn put(&self, token: &str, data: &PortfolioData) -> Result<(), StoreError> {
        let mut drafts = self.drafts.write().await;
        let now = Instant::now();
        drafts.retain(|_, (expires_at, _)| *expires_at > now);
        drafts.insert(token.to_string(), (now + self.ttl, data.clone()));
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<PortfolioData>, StoreError> {
        let drafts = self.drafts.read().await;
        Ok(drafts
            .get(token)
            .filter(|(expires_at, _)| *expires_at > Instant::now())
            .map(|(_, data)| data.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> PortfolioData {
        PortfolioData {
            full_name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryHandoffStore::default();
        store.put("tok", &draft("Jean Dupont")).await.unwrap();
        let got = store.get("tok").await.unwrap().unwrap();
        assert_eq!(got.full_name, "Jean Dupont");
    }

    #[tokio::test]
    async fn test_put_replaces_previous_draft() {
        let store = MemoryHandoffStore::default();
        store.put("tok", &draft("A")).await.unwrap();
        store.put("tok", &draft("B")).await.unwrap();
        assert_eq!(store.get("tok").await.unwrap().unwrap().full_name, "B");
    }

    #[tokio::test]
    async fn test_unknown_token_is_none() {
        let store = MemoryHandoffStore::default();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_draft_expires_after_ttl() {
        let store = MemoryHandoffStore::new(Duration::from_secs(10));
        store.put("tok", &draft("A")).await.unwrap();
        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(store.get("tok").await.unwrap().is_some());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("tok").await.unwrap().is_none());
    }
}
