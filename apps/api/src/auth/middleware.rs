use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{AuthError, SessionUser};
use crate::errors::AppError;
use crate::state::AppState;

/// Raw bearer token of the current request, kept for sign-out.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Resolves `Authorization: Bearer <token>` into a `SessionUser` extension.
///
/// No header: the request continues anonymously. A header with a bad token is
/// rejected with 401 rather than silently downgraded.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    if let Some(token) = token {
        match state.auth.current_user(&token).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
                request.extensions_mut().insert(SessionToken(token));
            }
            Err(e) => return AppError::from(e).into_response(),
        }
    }

    next.run(request).await
}

/// Requires a signed-in user; 401 otherwise.
#[derive(Debug, Clone)]
pub struct RequireUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .map(RequireUser)
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

/// The signed-in user when there is one.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<SessionUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<SessionUser>().cloned()))
    }
}
