//! Record-store ports and their adapters.
//!
//! Every read returns typed records; rows are validated at this boundary.
//! Writes replace whole records, never merge.

pub mod handoff;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::access::models::{AccessGrant, Module, Payment};
use crate::portfolio::records::PortfolioRecord;

pub use handoff::{HandoffStore, MemoryHandoffStore, RedisHandoffStore};
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn insert_portfolio(&self, record: PortfolioRecord) -> Result<PortfolioRecord, StoreError>;

    /// Replaces the stored record with the same id. `None` when it does not exist.
    async fn update_portfolio(
        &self,
        record: PortfolioRecord,
    ) -> Result<Option<PortfolioRecord>, StoreError>;

    async fn delete_portfolio(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn get_portfolio(&self, id: Uuid) -> Result<Option<PortfolioRecord>, StoreError>;

    /// The user's portfolios, newest first.
    async fn list_portfolios(&self, user_id: Uuid) -> Result<Vec<PortfolioRecord>, StoreError>;
}

#[async_trait]
pub trait ModuleStore: Send + Sync {
    /// Active modules, free ones first, then by name.
    async fn list_active_modules(&self) -> Result<Vec<Module>, StoreError>;

    async fn get_module(&self, id: Uuid) -> Result<Option<Module>, StoreError>;
}

#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError>;

    async fn insert_grant(&self, grant: AccessGrant) -> Result<AccessGrant, StoreError>;

    async fn list_grants(&self, user_id: Uuid) -> Result<Vec<AccessGrant>, StoreError>;
}
