use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PortfolioRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Option<Uuid>,
    pub full_name: String,
    pub specialty: String,
    pub skills: Option<String>,
    pub ai_keyword: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub email: Option<String>,
    pub projects: Value,
    pub tools: Value,
    pub template_settings: Value,
    pub is_published: bool,
    pub slug: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
