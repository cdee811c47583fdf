use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::access::{AccessGrantRow, ModuleRow, PaymentRow};
use crate::portfolio::model::Template;
use crate::store::StoreError;

/// A purchasable (or free) template module. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub template_code: Template,
    pub preview_image: Option<String>,
    pub is_free: bool,
    pub price: f64,
    pub category: String,
    pub is_active: bool,
}

impl From<ModuleRow> for Module {
    fn from(row: ModuleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            template_code: Template::from_code(&row.template_code),
            preview_image: row.preview_image,
            is_free: row.is_free,
            price: row.price,
            category: row.category,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub transaction_id: String,
    pub card_last4: Option<String>,
    pub card_brand: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn payment_data(&self) -> serde_json::Value {
        json!({
            "card_last4": self.card_last4,
            "card_brand": self.card_brand,
        })
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = PaymentStatus::parse(&row.status).ok_or_else(|| StoreError::Corrupt {
            id: row.id.to_string(),
            reason: format!("unknown payment status '{}'", row.status),
        })?;
        let field = |name: &str| {
            row.payment_data
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            module_id: row.module_id,
            amount: row.amount,
            currency: row.currency.clone(),
            status,
            payment_method: row.payment_method.clone(),
            transaction_id: row.transaction_id.clone(),
            card_last4: field("card_last4"),
            card_brand: field("card_brand"),
            created_at: row.created_at,
        })
    }
}

/// Proof that a user may use a module. Written only after a completed payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
}

impl From<AccessGrantRow> for AccessGrant {
    fn from(row: AccessGrantRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            module_id: row.module_id,
            payment_id: row.payment_id,
            granted_at: row.granted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_row_with_unknown_status_is_corrupt() {
        let row = PaymentRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            module_id: Uuid::new_v4(),
            amount: 9.99,
            currency: "USD".into(),
            status: "maybe".into(),
            payment_method: "card".into(),
            transaction_id: "txn_1_abc".into(),
            payment_data: json!({}),
            created_at: Utc::now(),
        };
        assert!(matches!(
            Payment::try_from(row),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_payment_row_reads_card_fields() {
        let row = PaymentRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            module_id: Uuid::new_v4(),
            amount: 9.99,
            currency: "USD".into(),
            status: "completed".into(),
            payment_method: "card".into(),
            transaction_id: "txn_1_abc".into(),
            payment_data: json!({"card_last4": "4242", "card_brand": "visa"}),
            created_at: Utc::now(),
        };
        let payment = Payment::try_from(row).unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.card_last4.as_deref(), Some("4242"));
    }

    #[test]
    fn test_module_row_template_code_is_lenient() {
        let row = ModuleRow {
            id: Uuid::new_v4(),
            name: "Néon".into(),
            description: None,
            template_code: "unknown".into(),
            preview_image: None,
            is_free: false,
            price: 4.99,
            category: "premium".into(),
            is_active: true,
            created_at: Utc::now(),
        };
        assert_eq!(Module::from(row).template_code, Template::Moderne);
    }
}
