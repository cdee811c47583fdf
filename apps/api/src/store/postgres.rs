use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::access::models::{AccessGrant, Module, Payment};
use crate::models::access::{AccessGrantRow, ModuleRow, PaymentRow};
use crate::models::portfolio::PortfolioRow;
use crate::portfolio::records::PortfolioRecord;
use crate::store::{AccessStore, ModuleStore, PortfolioStore, StoreError};

/// PostgreSQL adapter. Schema lives in `migrations/0001_init.sql`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PORTFOLIO_COLUMNS: &str = "id, user_id, module_id, full_name, specialty, skills, ai_keyword, \
     bio, profile_image, linkedin, github, email, projects, tools, template_settings, \
     is_published, slug, created_at, updated_at";

#[async_trait]
impl PortfolioStore for PgStore {
    async fn insert_portfolio(&self, record: PortfolioRecord) -> Result<PortfolioRecord, StoreError> {
        let sql = format!(
            "INSERT INTO user_portfolios ({PORTFOLIO_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
             RETURNING {PORTFOLIO_COLUMNS}"
        );
        let row: PortfolioRow = sqlx::query_as(&sql)
            .bind(record.id)
            .bind(record.user_id)
            .bind(record.module_id)
            .bind(&record.data.full_name)
            .bind(&record.data.specialty)
            .bind(&record.data.skills)
            .bind(&record.data.ai_keyword)
            .bind(&record.data.bio)
            .bind(&record.data.profile_image)
            .bind(&record.data.linkedin)
            .bind(&record.data.github)
            .bind(&record.data.email)
            .bind(Json(&record.data.projects))
            .bind(Json(&record.data.tools))
            .bind(Json(record.template_settings()))
            .bind(record.is_published)
            .bind(&record.slug)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn update_portfolio(
        &self,
        record: PortfolioRecord,
    ) -> Result<Option<PortfolioRecord>, StoreError> {
        let sql = format!(
            "UPDATE user_portfolios SET module_id = $2, full_name = $3, specialty = $4, skills = $5, \
             ai_keyword = $6, bio = $7, profile_image = $8, linkedin = $9, github = $10, email = $11, \
             projects = $12, tools = $13, template_settings = $14, is_published = $15, slug = $16, \
             updated_at = $17 \
             WHERE id = $1 \
             RETURNING {PORTFOLIO_COLUMNS}"
        );
        let row: Option<PortfolioRow> = sqlx::query_as(&sql)
            .bind(record.id)
            .bind(record.module_id)
            .bind(&record.data.full_name)
            .bind(&record.data.specialty)
            .bind(&record.data.skills)
            .bind(&record.data.ai_keyword)
            .bind(&record.data.bio)
            .bind(&record.data.profile_image)
            .bind(&record.data.linkedin)
            .bind(&record.data.github)
            .bind(&record.data.email)
            .bind(Json(&record.data.projects))
            .bind(Json(&record.data.tools))
            .bind(Json(record.template_settings()))
            .bind(record.is_published)
            .bind(&record.slug)
            .bind(record.updated_at)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PortfolioRecord::try_from).transpose()
    }

    async fn delete_portfolio(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_portfolios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_portfolio(&self, id: Uuid) -> Result<Option<PortfolioRecord>, StoreError> {
        let sql = format!("SELECT {PORTFOLIO_COLUMNS} FROM user_portfolios WHERE id = $1");
        let row: Option<PortfolioRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PortfolioRecord::try_from).transpose()
    }

    async fn list_portfolios(&self, user_id: Uuid) -> Result<Vec<PortfolioRecord>, StoreError> {
        let sql = format!(
            "SELECT {PORTFOLIO_COLUMNS} FROM user_portfolios WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows: Vec<PortfolioRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(PortfolioRecord::try_from).collect()
    }
}

#[async_trait]
impl ModuleStore for PgStore {
    async fn list_active_modules(&self) -> Result<Vec<Module>, StoreError> {
        let rows: Vec<ModuleRow> = sqlx::query_as(
            "SELECT id, name, description, template_code, preview_image, is_free, price, category, \
             is_active, created_at \
             FROM portfolio_modules WHERE is_active = TRUE ORDER BY is_free DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Module::from).collect())
    }

    async fn get_module(&self, id: Uuid) -> Result<Option<Module>, StoreError> {
        let row: Option<ModuleRow> = sqlx::query_as(
            "SELECT id, name, description, template_code, preview_image, is_free, price, category, \
             is_active, created_at \
             FROM portfolio_modules WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Module::from))
    }
}

#[async_trait]
impl AccessStore for PgStore {
    async fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError> {
        let row: PaymentRow = sqlx::query_as(
            "INSERT INTO payments (id, user_id, module_id, amount, currency, status, payment_method, \
             transaction_id, payment_data, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING id, user_id, module_id, amount, currency, status, payment_method, \
             transaction_id, payment_data, created_at",
        )
        .bind(payment.id)
        .bind(payment.user_id)
        .bind(payment.module_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(&payment.payment_method)
        .bind(&payment.transaction_id)
        .bind(Json(payment.payment_data()))
        .bind(payment.created_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn insert_grant(&self, grant: AccessGrant) -> Result<AccessGrant, StoreError> {
        let row: AccessGrantRow = sqlx::query_as(
            "INSERT INTO user_module_access (id, user_id, module_id, payment_id, granted_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, module_id) DO UPDATE SET payment_id = EXCLUDED.payment_id \
             RETURNING id, user_id, module_id, payment_id, granted_at",
        )
        .bind(grant.id)
        .bind(grant.user_id)
        .bind(grant.module_id)
        .bind(grant.payment_id)
        .bind(grant.granted_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list_grants(&self, user_id: Uuid) -> Result<Vec<AccessGrant>, StoreError> {
        let rows: Vec<AccessGrantRow> = sqlx::query_as(
            "SELECT id, user_id, module_id, payment_id, granted_at \
             FROM user_module_access WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AccessGrant::from).collect())
    }
}
