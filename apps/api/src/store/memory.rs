use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::access::models::{AccessGrant, Module, Payment};
use crate::portfolio::model::Template;
use crate::portfolio::records::PortfolioRecord;
use crate::store::{AccessStore, ModuleStore, PortfolioStore, StoreError};

/// In-process adapter used when no `DATABASE_URL` is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    portfolios: RwLock<HashMap<Uuid, PortfolioRecord>>,
    modules: RwLock<Vec<Module>>,
    payments: RwLock<Vec<Payment>>,
    grants: RwLock<Vec<AccessGrant>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with one module per template.
    pub fn with_default_modules() -> Self {
        Self::with_modules(default_modules())
    }

    pub fn with_modules(modules: Vec<Module>) -> Self {
        Self {
            modules: RwLock::new(modules),
            ..Self::default()
        }
    }
}

/// Moderne and Minimaliste ship free; Créatif and Professionnel are paid.
pub fn default_modules() -> Vec<Module> {
    Template::ALL
        .into_iter()
        .map(|template| {
            let (is_free, price, category) = match template {
                Template::Moderne | Template::Minimaliste => (true, 0.0, "free"),
                Template::Creatif => (false, 4.99, "premium"),
                Template::Professionnel => (false, 9.99, "premium"),
            };
            Module {
                id: Uuid::new_v4(),
                name: template.display_name().to_string(),
                description: Some(format!("Template {}", template.display_name())),
                template_code: template,
                preview_image: None,
                is_free,
                price,
                category: category.to_string(),
                is_active: true,
            }
        })
        .collect()
}

#[async_trait]
impl PortfolioStore for MemoryStore {
    async fn insert_portfolio(&self, record: PortfolioRecord) -> Result<PortfolioRecord, StoreError> {
        self.portfolios
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_portfolio(
        &self,
        record: PortfolioRecord,
    ) -> Result<Option<PortfolioRecord>, StoreError> {
        let mut portfolios = self.portfolios.write().await;
        match portfolios.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn delete_portfolio(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.portfolios.write().await.remove(&id).is_some())
    }

    async fn get_portfolio(&self, id: Uuid) -> Result<Option<PortfolioRecord>, StoreError> {
        Ok(self.portfolios.read().await.get(&id).cloned())
    }

    async fn list_portfolios(&self, user_id: Uuid) -> Result<Vec<PortfolioRecord>, StoreError> {
        let mut records: Vec<PortfolioRecord> = self
            .portfolios
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[async_trait]
impl ModuleStore for MemoryStore {
    async fn list_active_modules(&self) -> Result<Vec<Module>, StoreError> {
        let mut modules: Vec<Module> = self
            .modules
            .read()
            .await
            .iter()
            .filter(|m| m.is_active)
            .cloned()
            .collect();
        modules.sort_by(|a, b| b.is_free.cmp(&a.is_free).then_with(|| a.name.cmp(&b.name)));
        Ok(modules)
    }

    async fn get_module(&self, id: Uuid) -> Result<Option<Module>, StoreError> {
        Ok(self.modules.read().await.iter().find(|m| m.id == id).cloned())
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError> {
        self.payments.write().await.push(payment.clone());
        Ok(payment)
    }

    /// One grant per (user, module): a repeat keeps the first grant and takes
    /// the new payment id.
    async fn insert_grant(&self, grant: AccessGrant) -> Result<AccessGrant, StoreError> {
        let mut grants = self.grants.write().await;
        match grants
            .iter_mut()
            .find(|g| g.user_id == grant.user_id && g.module_id == grant.module_id)
        {
            Some(existing) => {
                existing.payment_id = grant.payment_id;
                Ok(existing.clone())
            }
            None => {
                grants.push(grant.clone());
                Ok(grant)
            }
        }
    }

    async fn list_grants(&self, user_id: Uuid) -> Result<Vec<AccessGrant>, StoreError> {
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }
}
