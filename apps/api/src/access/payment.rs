use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::access::models::{Module, Payment, PaymentStatus};
use crate::portfolio::validation::ValidationErrors;

/// Card form of the mock checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    pub card_holder: String,
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}

impl CardDetails {
    fn digits(&self) -> String {
        self.card_number.chars().filter(|c| !c.is_whitespace()).collect()
    }

    pub fn last4(&self) -> String {
        let digits: Vec<char> = self.digits().chars().collect();
        digits[digits.len().saturating_sub(4)..].iter().collect()
    }

    pub fn brand(&self) -> &'static str {
        match self.digits().chars().next() {
            Some('4') => "visa",
            Some('5') => "mastercard",
            Some('3') => "amex",
            _ => "card",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.card_holder.trim().is_empty() {
            errors.push("cardHolder", "Cardholder name is required");
        }

        let digits = self.digits();
        if !(13..=16).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            errors.push("cardNumber", "Card number must be 13 to 16 digits");
        }

        let month = self
            .expiry
            .split_once('/')
            .filter(|(mm, yy)| {
                mm.len() == 2
                    && yy.len() == 2
                    && mm.chars().chain(yy.chars()).all(|c| c.is_ascii_digit())
            })
            .and_then(|(mm, _)| mm.parse::<u8>().ok());
        if !matches!(month, Some(1..=12)) {
            errors.push("expiry", "Expiry must be MM/YY");
        }

        if !(3..=4).contains(&self.cvc.len()) || !self.cvc.chars().all(|c| c.is_ascii_digit()) {
            errors.push("cvc", "CVC must be 3 or 4 digits");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("invalid card details")]
    InvalidCard(ValidationErrors),

    #[error("payment declined: {0}")]
    Declined(String),
}

/// Charges a user for a module. Returns the payment record to persist.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn charge(
        &self,
        user_id: Uuid,
        module: &Module,
        card: &CardDetails,
    ) -> Result<Payment, PaymentError>;
}

/// Accepts every well-formed card and reports a completed USD card payment,
/// except the processor's standard decline test number.
#[derive(Debug, Default)]
pub struct MockPaymentProcessor;

pub const DECLINED_TEST_CARD: &str = "4000000000000002";

/// `txn_<unix millis>_<9 random chars>`
pub fn transaction_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("txn_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn charge(
        &self,
        user_id: Uuid,
        module: &Module,
        card: &CardDetails,
    ) -> Result<Payment, PaymentError> {
        card.validate().map_err(PaymentError::InvalidCard)?;
        if card.digits() == DECLINED_TEST_CARD {
            return Err(PaymentError::Declined("card_declined".to_string()));
        }

        Ok(Payment {
            id: Uuid::new_v4(),
            user_id,
            module_id: module.id,
            amount: module.price,
            currency: "USD".to_string(),
            status: PaymentStatus::Completed,
            payment_method: "card".to_string(),
            transaction_id: transaction_id(),
            card_last4: Some(card.last4()),
            card_brand: Some(card.brand().to_string()),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::default_modules;

    fn card() -> CardDetails {
        CardDetails {
            card_holder: "Jean Dupont".into(),
            card_number: "4242 4242 4242 4242".into(),
            expiry: "12/29".into(),
            cvc: "123".into(),
        }
    }

    #[test]
    fn test_valid_card_passes() {
        assert!(card().validate().is_ok());
        assert_eq!(card().last4(), "4242");
        assert_eq!(card().brand(), "visa");
    }

    #[test]
    fn test_invalid_card_fields_reported() {
        let bad = CardDetails {
            card_holder: " ".into(),
            card_number: "4242 42".into(),
            expiry: "13/29".into(),
            cvc: "12a".into(),
        };
        let errors = bad.validate().unwrap_err();
        for field in ["cardHolder", "cardNumber", "expiry", "cvc"] {
            assert!(errors.for_field(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn test_expiry_format_is_strict() {
        for expiry in ["1/29", "12-29", "12/2029", "00/29"] {
            let c = CardDetails {
                expiry: expiry.into(),
                ..card()
            };
            assert!(c.validate().is_err(), "{expiry} should be rejected");
        }
    }

    #[test]
    fn test_transaction_id_shape() {
        let id = transaction_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "txn");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[tokio::test]
    async fn test_mock_charge_is_completed_usd() {
        let module = default_modules().remove(3);
        let user = Uuid::new_v4();
        let payment = MockPaymentProcessor
            .charge(user, &module, &card())
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.currency, "USD");
        assert_eq!(payment.amount, module.price);
        assert_eq!(payment.card_last4.as_deref(), Some("4242"));
    }

    #[tokio::test]
    async fn test_decline_test_card_is_declined() {
        let module = default_modules().remove(3);
        let declined = CardDetails {
            card_number: "4000 0000 0000 0002".into(),
            ..card()
        };
        let result = MockPaymentProcessor
            .charge(Uuid::new_v4(), &module, &declined)
            .await;
        assert!(matches!(result, Err(PaymentError::Declined(_))));
    }
}
