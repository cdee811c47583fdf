use axum::{extract::State, http::StatusCode, Extension};
use tracing::info;

use crate::auth::{RequireUser, SessionToken};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/auth/sign-out
pub async fn handle_sign_out(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<StatusCode, AppError> {
    state.auth.sign_out(&token).await?;
    info!("User {} signed out", user.id);
    Ok(StatusCode::NO_CONTENT)
}
