use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::form::{FormController, FormEdit, Section};
use crate::portfolio::model::PortfolioData;
use crate::portfolio::validation::FieldError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub sections: BTreeMap<&'static str, Vec<FieldError>>,
}

#[derive(Deserialize)]
pub struct EditRequest {
    pub draft: PortfolioData,
    #[serde(default)]
    pub edits: Vec<FormEdit>,
}

#[derive(Serialize)]
pub struct EditResponse {
    pub draft: PortfolioData,
    #[serde(flatten)]
    pub report: ValidateResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BioResponse {
    pub bio: String,
    pub draft: PortfolioData,
}

fn section_key(section: Section) -> &'static str {
    match section {
        Section::Profile => "profile",
        Section::Projects => "projects",
        Section::Tools => "tools",
        Section::Design => "design",
    }
}

fn report(form: &FormController) -> ValidateResponse {
    let sections: BTreeMap<_, _> = Section::ALL
        .into_iter()
        .map(|s| (section_key(s), form.section_errors(s)))
        .collect();
    ValidateResponse {
        valid: sections.values().all(Vec::is_empty),
        sections,
    }
}

/// POST /api/v1/form/validate
/// Reports field errors grouped by form section; never rejects the request.
pub async fn handle_validate(Json(draft): Json<PortfolioData>) -> Json<ValidateResponse> {
    Json(report(&FormController::new(draft)))
}

/// POST /api/v1/form/edit
/// Applies list and design edits in order and returns the updated draft.
pub async fn handle_edit(Json(req): Json<EditRequest>) -> Json<EditResponse> {
    let mut form = FormController::new(req.draft);
    for edit in req.edits {
        form.apply(edit);
    }
    let report = report(&form);
    Json(EditResponse {
        draft: form.draft().clone(),
        report,
    })
}

/// POST /api/v1/form/bio
pub async fn handle_generate_bio(
    State(state): State<AppState>,
    Json(draft): Json<PortfolioData>,
) -> Result<Json<BioResponse>, AppError> {
    let mut form = FormController::new(draft);
    let bio = form.generate_bio(state.bio.as_ref()).await?.to_string();
    Ok(Json(BioResponse {
        bio,
        draft: form.draft().clone(),
    }))
}
