//! Module/access gate: which template modules a user may use, and the mock
//! checkout that unlocks the paid ones.

pub mod gate;
pub mod handlers;
pub mod models;
pub mod payment;

use crate::errors::AppError;

pub use gate::{AccessGate, CheckoutTarget, ModuleAccess, Selection};
pub use payment::{CardDetails, MockPaymentProcessor, PaymentError};

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::InvalidCard(errors) => AppError::Validation(errors),
            PaymentError::Declined(reason) => AppError::Payment(reason),
        }
    }
}
