//! Form controller: draft editing, validation gating and bio generation.

pub mod bio;
pub mod controller;
pub mod handlers;
pub mod prompts;

use thiserror::Error;

use crate::errors::AppError;
use crate::portfolio::validation::ValidationErrors;

pub use bio::{BioError, BioGenerator, TemplateBioGenerator};
pub use controller::{FormController, FormEdit, Section};

#[derive(Debug, Error)]
pub enum FormError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("bio generation failed: {0}")]
    Bio(#[from] BioError),
}

impl From<FormError> for AppError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::Validation(errors) => AppError::Validation(errors),
            FormError::Bio(e) => AppError::BioGeneration(e.to_string()),
        }
    }
}
