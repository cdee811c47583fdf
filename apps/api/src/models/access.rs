use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModuleRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub template_code: String,
    pub preview_image: Option<String>,
    pub is_free: bool,
    pub price: f64,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
    pub transaction_id: String,
    pub payment_data: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessGrantRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
}
