use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::access::models::Module;
use crate::access::{CardDetails, CheckoutTarget, ModuleAccess, Selection};
use crate::auth::MaybeUser;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub module: Module,
    pub already_owned: bool,
}

/// GET /api/v1/modules
pub async fn handle_list_modules(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Vec<ModuleAccess>>, AppError> {
    Ok(Json(state.gate.list_modules(user.as_ref()).await?))
}

/// POST /api/v1/modules/:id/select
pub async fn handle_select_module(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Selection>, AppError> {
    Ok(Json(state.gate.select(user.as_ref(), id).await?))
}

/// GET /api/v1/modules/:id/checkout
/// Anonymous users go to `/login`; unknown or inactive modules to `/create`.
pub async fn handle_checkout_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    Ok(match state.gate.checkout_target(user.as_ref(), id).await? {
        CheckoutTarget::Login => Redirect::to("/login").into_response(),
        CheckoutTarget::Create => Redirect::to("/create").into_response(),
        CheckoutTarget::Module { module, owned } => Json(CheckoutView {
            module,
            already_owned: owned,
        })
        .into_response(),
    })
}

/// POST /api/v1/modules/:id/checkout
pub async fn handle_checkout(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
    Json(card): Json<CardDetails>,
) -> Result<Response, AppError> {
    let module = match state.gate.checkout_target(user.as_ref(), id).await? {
        CheckoutTarget::Login => return Ok(Redirect::to("/login").into_response()),
        CheckoutTarget::Create => return Ok(Redirect::to("/create").into_response()),
        CheckoutTarget::Module { module, .. } => module,
    };
    let Some(user) = user else {
        return Ok(Redirect::to("/login").into_response());
    };

    let _ticket = state.in_flight.acquire(format!("checkout:{}:{}", user.id, module.id))?;
    let receipt = state.gate.purchase(&user, &module, &card).await?;
    let status = if receipt.payment.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(receipt)).into_response())
}
