use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::Selection;
use crate::auth::{MaybeUser, RequireUser, SessionUser};
use crate::errors::AppError;
use crate::form::FormController;
use crate::portfolio::model::{PortfolioData, Template};
use crate::portfolio::records::{PortfolioRecord, PortfolioSummary};
use crate::render::render_portfolio;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub portfolio: PortfolioData,
    #[serde(default)]
    pub module_id: Option<Uuid>,
    /// Anonymous flow: resubmitting under the same token replaces the draft.
    #[serde(default)]
    pub draft_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftHandoff {
    pub draft_token: String,
    pub preview_url: String,
}

#[derive(Serialize)]
pub struct TemplateInfo {
    pub code: Template,
    pub name: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub is_published: bool,
}

/// Loads a portfolio the user owns. Someone else's record reads as missing.
pub(crate) async fn owned_portfolio(
    state: &AppState,
    user: &SessionUser,
    id: Uuid,
) -> Result<PortfolioRecord, AppError> {
    state
        .portfolios
        .get_portfolio(id)
        .await?
        .filter(|r| r.user_id == user.id)
        .ok_or_else(|| AppError::NotFound(format!("Portfolio {id} not found")))
}

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateInfo>> {
    Json(
        Template::ALL
            .into_iter()
            .map(|t| TemplateInfo {
                code: t,
                name: t.display_name(),
            })
            .collect(),
    )
}

/// POST /api/v1/portfolios
/// Signed-in users get a stored record; anonymous users a handoff token.
/// An attached `moduleId` must be unlocked for the session.
pub async fn handle_submit(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<SubmitRequest>,
) -> Result<Response, AppError> {
    state
        .gate
        .ensure_template_usable(user.as_ref(), req.portfolio.template)
        .await?;
    if let Some(module_id) = req.module_id {
        if let Selection::Checkout { .. } = state.gate.select(user.as_ref(), module_id).await? {
            warn!("Submit rejected: module {module_id} is locked for this session");
            return Err(AppError::Forbidden);
        }
    }
    let data = FormController::new(req.portfolio).submit()?;

    match user {
        Some(user) => {
            let _ticket = state.in_flight.acquire(format!("submit:{}", user.id))?;
            let record = PortfolioRecord::new(user.id, req.module_id, data, Utc::now());
            let record = state.portfolios.insert_portfolio(record).await?;
            info!("Portfolio {} created for user {}", record.id, user.id);
            Ok((StatusCode::CREATED, Json(record)).into_response())
        }
        None => {
            let token = req
                .draft_token
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
            let _ticket = state.in_flight.acquire(format!("submit:draft:{token}"))?;
            state.handoff.put(&token, &data).await?;
            info!("Draft handed off under token {token}");
            Ok((
                StatusCode::CREATED,
                Json(DraftHandoff {
                    preview_url: format!("/preview/{token}"),
                    draft_token: token,
                }),
            )
                .into_response())
        }
    }
}

/// GET /api/v1/portfolios
pub async fn handle_list_portfolios(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<PortfolioSummary>>, AppError> {
    let records = state.portfolios.list_portfolios(user.id).await?;
    Ok(Json(records.iter().map(PortfolioRecord::summary).collect()))
}

/// GET /api/v1/portfolios/:id
pub async fn handle_get_portfolio(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PortfolioRecord>, AppError> {
    Ok(Json(owned_portfolio(&state, &user, id).await?))
}

/// PUT /api/v1/portfolios/:id
/// Re-submission: the stored data is replaced whole.
pub async fn handle_update_portfolio(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
    Json(data): Json<PortfolioData>,
) -> Result<Json<PortfolioRecord>, AppError> {
    let mut record = owned_portfolio(&state, &user, id).await?;
    state
        .gate
        .ensure_template_usable(Some(&user), data.template)
        .await?;
    let data = FormController::new(data).submit()?;

    let _ticket = state.in_flight.acquire(format!("submit:{}", user.id))?;
    record.data = data;
    record.updated_at = Utc::now();
    let record = state
        .portfolios
        .update_portfolio(record)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio {id} not found")))?;
    Ok(Json(record))
}

/// DELETE /api/v1/portfolios/:id
pub async fn handle_delete_portfolio(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    owned_portfolio(&state, &user, id).await?;
    state.portfolios.delete_portfolio(id).await?;
    info!("Portfolio {id} deleted by user {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/portfolios/:id/publish
pub async fn handle_publish(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<PortfolioRecord>, AppError> {
    let mut record = owned_portfolio(&state, &user, id).await?;
    record.is_published = req.is_published;
    record.updated_at = Utc::now();
    let record = state
        .portfolios
        .update_portfolio(record)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio {id} not found")))?;
    Ok(Json(record))
}

/// GET /api/v1/portfolios/:id/preview
/// Owners always; anyone else only once published.
pub async fn handle_portfolio_preview(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let record = state
        .portfolios
        .get_portfolio(id)
        .await?
        .filter(|r| r.is_published || user.as_ref().is_some_and(|u| u.id == r.user_id))
        .ok_or_else(|| AppError::NotFound(format!("Portfolio {id} not found")))?;
    Ok(Html(render_portfolio(&record.data, &state.render_ctx).to_html()))
}

/// GET /preview/:token
/// A missing or expired draft redirects back to the form.
pub async fn handle_draft_preview(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    Ok(match state.handoff.get(&token).await? {
        Some(data) => Html(render_portfolio(&data, &state.render_ctx).to_html()).into_response(),
        None => Redirect::to("/create").into_response(),
    })
}
