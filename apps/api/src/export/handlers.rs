use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use uuid::Uuid;

use crate::auth::RequireUser;
use crate::errors::AppError;
use crate::export::{export_bundle, export_pdf, ExportArtifact};
use crate::portfolio::handlers::owned_portfolio;
use crate::portfolio::model::PortfolioData;
use crate::state::AppState;

/// Everything outside RFC 5987 `attr-char` is escaped in `filename*`.
const ATTR_CHAR_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

#[derive(Clone, Copy)]
enum Format {
    Pdf,
    Bundle,
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8
/// name in `filename*`.
fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = utf8_percent_encode(filename, ATTR_CHAR_ESCAPES);
    HeaderValue::from_str(&format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

impl IntoResponse for ExportArtifact {
    fn into_response(self) -> Response {
        (
            [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(self.content_type),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    content_disposition(&self.filename),
                ),
            ],
            self.bytes,
        )
            .into_response()
    }
}

async fn run_export(
    state: &AppState,
    document_key: String,
    data: PortfolioData,
    format: Format,
) -> Result<Response, AppError> {
    let _ticket = state.in_flight.acquire(format!("export:{document_key}"))?;
    let ctx = state.render_ctx.clone();
    let artifact = match format {
        Format::Pdf => export_pdf(data, ctx, state.config.export_scale).await?,
        Format::Bundle => export_bundle(data, ctx).await?,
    };
    Ok(artifact.into_response())
}

async fn export_draft(state: AppState, token: String, format: Format) -> Result<Response, AppError> {
    match state.handoff.get(&token).await? {
        Some(data) => run_export(&state, token, data, format).await,
        // No render source: abort without producing a file.
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// GET /preview/:token/export/pdf
pub async fn handle_draft_pdf(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    export_draft(state, token, Format::Pdf).await
}

/// GET /preview/:token/export/bundle
pub async fn handle_draft_bundle(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    export_draft(state, token, Format::Bundle).await
}

/// GET /api/v1/portfolios/:id/export/pdf
pub async fn handle_portfolio_pdf(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let record = owned_portfolio(&state, &user, id).await?;
    run_export(&state, id.to_string(), record.data, Format::Pdf).await
}

/// GET /api/v1/portfolios/:id/export/bundle
pub async fn handle_portfolio_bundle(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let record = owned_portfolio(&state, &user, id).await?;
    run_export(&state, id.to_string(), record.data, Format::Bundle).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii_fallback_and_utf8_name() {
        let value = content_disposition("Élodie_Martin_portfolio.pdf");
        let value = value.to_str().unwrap();
        assert!(value.starts_with("attachment; filename=\"_lodie_Martin_portfolio.pdf\""));
        assert!(value.contains("filename*=UTF-8''%C3%89lodie_Martin_portfolio.pdf"));
    }

    #[test]
    fn test_space_and_quote_are_escaped_attr_chars_kept() {
        let value = content_disposition("Jean \"JD\" Dupont+CV.pdf");
        assert!(value
            .to_str()
            .unwrap()
            .ends_with("filename*=UTF-8''Jean%20%22JD%22%20Dupont+CV.pdf"));
    }

    #[test]
    fn test_plain_name_is_kept() {
        let value = content_disposition("Jean_Dupont_portfolio_source.zip");
        assert!(value
            .to_str()
            .unwrap()
            .contains("filename=\"Jean_Dupont_portfolio_source.zip\""));
    }
}
