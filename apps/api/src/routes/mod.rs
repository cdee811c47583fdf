pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::access::handlers as access;
use crate::auth::{auth_middleware, handlers as auth};
use crate::export::handlers as export;
use crate::form::handlers as form;
use crate::portfolio::handlers as portfolio;
use crate::state::AppState;

/// Room for a 5 MB image as a base64 data URI plus the rest of the record.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "code": "NOT_FOUND",
                "message": "No route matches this path"
            }
        })),
    )
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/templates", get(portfolio::handle_list_templates))
        // Form
        .route("/api/v1/form/validate", post(form::handle_validate))
        .route("/api/v1/form/edit", post(form::handle_edit))
        .route("/api/v1/form/bio", post(form::handle_generate_bio))
        // Portfolios
        .route(
            "/api/v1/portfolios",
            post(portfolio::handle_submit).get(portfolio::handle_list_portfolios),
        )
        .route(
            "/api/v1/portfolios/:id",
            get(portfolio::handle_get_portfolio)
                .put(portfolio::handle_update_portfolio)
                .delete(portfolio::handle_delete_portfolio),
        )
        .route(
            "/api/v1/portfolios/:id/publish",
            patch(portfolio::handle_publish),
        )
        .route(
            "/api/v1/portfolios/:id/preview",
            get(portfolio::handle_portfolio_preview),
        )
        .route(
            "/api/v1/portfolios/:id/export/pdf",
            get(export::handle_portfolio_pdf),
        )
        .route(
            "/api/v1/portfolios/:id/export/bundle",
            get(export::handle_portfolio_bundle),
        )
        // Anonymous draft handoff
        .route("/preview/:token", get(portfolio::handle_draft_preview))
        .route("/preview/:token/export/pdf", get(export::handle_draft_pdf))
        .route(
            "/preview/:token/export/bundle",
            get(export::handle_draft_bundle),
        )
        // Modules
        .route("/api/v1/modules", get(access::handle_list_modules))
        .route(
            "/api/v1/modules/:id/select",
            post(access::handle_select_module),
        )
        .route(
            "/api/v1/modules/:id/checkout",
            get(access::handle_checkout_page).post(access::handle_checkout),
        )
        // Auth
        .route("/api/v1/auth/sign-out", post(auth::handle_sign_out))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::response::Response;
    use chrono::Duration as ChronoDuration;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::access::{AccessGate, MockPaymentProcessor};
    use crate::auth::jwt::test_tokens::{mint, SECRET};
    use crate::auth::JwtAuthProvider;
    use crate::config::Config;
    use crate::form::TemplateBioGenerator;
    use crate::guard::InFlight;
    use crate::render::RenderContext;
    use crate::store::{MemoryHandoffStore, MemoryStore};

    fn test_state() -> AppState {
        let store = Arc::new(MemoryStore::with_default_modules());
        AppState {
            portfolios: store.clone(),
            handoff: Arc::new(MemoryHandoffStore::default()),
            gate: AccessGate::new(store.clone(), store, Arc::new(MockPaymentProcessor)),
            auth: Arc::new(JwtAuthProvider::new(SECRET)),
            bio: Arc::new(TemplateBioGenerator::new(Duration::ZERO)),
            in_flight: InFlight::new(),
            render_ctx: RenderContext::default(),
            config: Config {
                auth_jwt_secret: SECRET.to_string(),
                database_url: None,
                redis_url: None,
                port: 0,
                rust_log: "info".to_string(),
                bio_latency_ms: 0,
                handoff_ttl_secs: 3600,
                export_scale: 2.0,
                public_base_url: "https://portfolio.example.com".to_string(),
            },
        }
    }

    fn token() -> String {
        mint(
            Uuid::new_v4(),
            "jd@example.com",
            None,
            ChronoDuration::hours(1),
        )
    }

    fn portfolio_json() -> Value {
        json!({
            "fullName": "Jean Dupont",
            "specialty": "Développeur",
            "skills": "Rust, TypeScript, SQL",
            "aiKeyword": "innovation",
            "github": "https://github.com/jd",
            "tools": ["Git", "Docker"]
        })
    }

    fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state());
        let response = send(&app, request("GET", "/health", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "folio-api");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_not_found() {
        let app = build_router(test_state());
        let response = send(&app, request("GET", "/nope", None, None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_templates_lists_all_four() {
        let app = build_router(test_state());
        let body = json_body(send(&app, request("GET", "/api/v1/templates", None, None)).await).await;
        let codes: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["moderne", "minimaliste", "creatif", "professionnel"]);
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let app = build_router(test_state());
        let response = send(&app, request("GET", "/api/v1/portfolios", Some("garbage"), None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_listing_requires_session() {
        let app = build_router(test_state());
        let response = send(&app, request("GET", "/api/v1/portfolios", None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bio_missing_keyword_is_field_error() {
        let app = build_router(test_state());
        let mut draft = portfolio_json();
        draft["aiKeyword"] = json!("");
        let response = send(&app, request("POST", "/api/v1/form/bio", None, Some(draft))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["fields"][0]["field"], "aiKeyword");
    }

    #[tokio::test]
    async fn test_bio_generation_returns_paragraph() {
        let app = build_router(test_state());
        let response = send(
            &app,
            request("POST", "/api/v1/form/bio", None, Some(portfolio_json())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let bio = body["bio"].as_str().unwrap();
        assert!(bio.contains("Jean Dupont") && bio.contains("innovation"));
        assert_eq!(body["draft"]["bio"], body["bio"]);
    }

    #[tokio::test]
    async fn test_validate_groups_errors_by_section() {
        let app = build_router(test_state());
        let mut draft = portfolio_json();
        draft["skills"] = json!("Rust");
        let body = json_body(
            send(&app, request("POST", "/api/v1/form/validate", None, Some(draft))).await,
        )
        .await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["sections"]["profile"][0]["field"], "skills");
        assert_eq!(body["sections"]["design"], json!([]));
    }

    #[tokio::test]
    async fn test_edit_removes_tool_and_shifts() {
        let app = build_router(test_state());
        let body = json!({
            "draft": portfolio_json(),
            "edits": [{"op": "removeTool", "index": 0}, {"op": "addTool", "name": "Figma"}]
        });
        let response = send(&app, request("POST", "/api/v1/form/edit", None, Some(body))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["draft"]["tools"], json!(["Docker", "Figma"]));
        assert_eq!(body["valid"], true);
    }

    #[tokio::test]
    async fn test_anonymous_submit_hands_off_then_previews_and_exports() {
        let app = build_router(test_state());
        let response = send(
            &app,
            request(
                "POST",
                "/api/v1/portfolios",
                None,
                Some(json!({ "portfolio": portfolio_json() })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        let preview_url = body["previewUrl"].as_str().unwrap().to_string();

        let preview = send(&app, request("GET", &preview_url, None, None)).await;
        assert_eq!(preview.status(), StatusCode::OK);
        let html = to_bytes(preview.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(html.to_vec()).unwrap();
        assert!(html.contains("Jean Dupont"));
        assert!(html.contains("https://github.com/jd"));

        let bundle = send(
            &app,
            request("GET", &format!("{preview_url}/export/bundle"), None, None),
        )
        .await;
        assert_eq!(bundle.status(), StatusCode::OK);
        assert_eq!(
            bundle.headers()[header::CONTENT_TYPE],
            "application/zip"
        );
        assert!(bundle.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("Jean_Dupont_portfolio_source.zip"));
    }

    #[tokio::test]
    async fn test_missing_draft_redirects_and_export_aborts() {
        let app = build_router(test_state());
        let preview = send(&app, request("GET", "/preview/unknown", None, None)).await;
        assert!(preview.status().is_redirection());
        assert_eq!(preview.headers()[header::LOCATION], "/create");

        let export = send(&app, request("GET", "/preview/unknown/export/pdf", None, None)).await;
        assert_eq!(export.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_signed_in_submit_list_publish_delete() {
        let app = build_router(test_state());
        let token = token();

        let created = send(
            &app,
            request(
                "POST",
                "/api/v1/portfolios",
                Some(&token),
                Some(json!({ "portfolio": portfolio_json() })),
            ),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = json_body(created).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["data"]["github"], "github.com/jd");
        assert!(created["slug"].as_str().unwrap().starts_with("jean-dupont-"));

        let listed = json_body(send(&app, request("GET", "/api/v1/portfolios", Some(&token), None)).await).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        // Unpublished: hidden from anonymous preview.
        let hidden = send(&app, request("GET", &format!("/api/v1/portfolios/{id}/preview"), None, None)).await;
        assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

        let published = send(
            &app,
            request(
                "PATCH",
                &format!("/api/v1/portfolios/{id}/publish"),
                Some(&token),
                Some(json!({ "isPublished": true })),
            ),
        )
        .await;
        assert_eq!(json_body(published).await["isPublished"], true);
        let visible = send(&app, request("GET", &format!("/api/v1/portfolios/{id}/preview"), None, None)).await;
        assert_eq!(visible.status(), StatusCode::OK);

        let other = self::token();
        let foreign = send(&app, request("GET", &format!("/api/v1/portfolios/{id}"), Some(&other), None)).await;
        assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

        let deleted = send(&app, request("DELETE", &format!("/api/v1/portfolios/{id}"), Some(&token), None)).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        let gone = send(&app, request("GET", &format!("/api/v1/portfolios/{id}"), Some(&token), None)).await;
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_record() {
        let app = build_router(test_state());
        let mut draft = portfolio_json();
        draft["fullName"] = json!("J");
        let response = send(
            &app,
            request("POST", "/api/v1/portfolios", None, Some(json!({ "portfolio": draft }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_premium_template_locked_until_checkout() {
        let app = build_router(test_state());
        let token = token();

        let modules = json_body(send(&app, request("GET", "/api/v1/modules", Some(&token), None)).await).await;
        let premium = modules
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["templateCode"] == "creatif")
            .unwrap()
            .clone();
        assert_eq!(premium["usable"], false);
        let module_id = premium["id"].as_str().unwrap().to_string();

        let mut draft = portfolio_json();
        draft["template"] = json!("creatif");
        let locked = send(
            &app,
            request(
                "POST",
                "/api/v1/portfolios",
                Some(&token),
                Some(json!({ "portfolio": draft.clone() })),
            ),
        )
        .await;
        assert_eq!(locked.status(), StatusCode::FORBIDDEN);

        let selection = json_body(
            send(
                &app,
                request("POST", &format!("/api/v1/modules/{module_id}/select"), Some(&token), None),
            )
            .await,
        )
        .await;
        assert_eq!(selection["status"], "checkout");
        assert_eq!(
            selection["checkoutUrl"],
            format!("/api/v1/modules/{module_id}/checkout")
        );

        let paid = send(
            &app,
            request(
                "POST",
                &format!("/api/v1/modules/{module_id}/checkout"),
                Some(&token),
                Some(json!({
                    "cardHolder": "Jean Dupont",
                    "cardNumber": "4242 4242 4242 4242",
                    "expiry": "12/29",
                    "cvc": "123"
                })),
            ),
        )
        .await;
        assert_eq!(paid.status(), StatusCode::CREATED);
        let receipt = json_body(paid).await;
        assert_eq!(receipt["payment"]["status"], "completed");
        assert_eq!(receipt["selection"]["status"], "unlocked");

        let unlocked = send(
            &app,
            request(
                "POST",
                "/api/v1/portfolios",
                Some(&token),
                Some(json!({ "portfolio": draft, "moduleId": module_id })),
            ),
        )
        .await;
        assert_eq!(unlocked.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_submit_with_locked_module_is_forbidden() {
        let app = build_router(test_state());
        let token = token();
        let modules = json_body(send(&app, request("GET", "/api/v1/modules", Some(&token), None)).await).await;
        let locked_id = modules
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["usable"] == false)
            .unwrap()["id"]
            .clone();
        let free_id = modules
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["usable"] == true)
            .unwrap()["id"]
            .clone();

        let locked = send(
            &app,
            request(
                "POST",
                "/api/v1/portfolios",
                Some(&token),
                Some(json!({ "portfolio": portfolio_json(), "moduleId": locked_id })),
            ),
        )
        .await;
        assert_eq!(locked.status(), StatusCode::FORBIDDEN);

        let listed = json_body(send(&app, request("GET", "/api/v1/portfolios", Some(&token), None)).await).await;
        assert!(listed.as_array().unwrap().is_empty());

        let free = send(
            &app,
            request(
                "POST",
                "/api/v1/portfolios",
                Some(&token),
                Some(json!({ "portfolio": portfolio_json(), "moduleId": free_id })),
            ),
        )
        .await;
        assert_eq!(free.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_large_profile_image_reaches_validation() {
        let app = build_router(test_state());
        let submit = |image_bytes: usize| {
            let mut draft = portfolio_json();
            draft["profileImage"] = json!(format!(
                "data:image/png;base64,{}",
                "A".repeat(image_bytes / 3 * 4)
            ));
            request("POST", "/api/v1/portfolios", None, Some(json!({ "portfolio": draft })))
        };

        let accepted = send(&app, submit(4 * 1024 * 1024)).await;
        assert_eq!(accepted.status(), StatusCode::CREATED);

        let too_big = send(&app, submit(5 * 1024 * 1024 + 512 * 1024)).await;
        assert_eq!(too_big.status(), StatusCode::BAD_REQUEST);
        let body = json_body(too_big).await;
        assert_eq!(body["error"]["fields"][0]["field"], "profileImage");
    }

    #[tokio::test]
    async fn test_anonymous_checkout_redirects_to_login() {
        let app = build_router(test_state());
        let response = send(
            &app,
            request("GET", &format!("/api/v1/modules/{}/checkout", Uuid::new_v4()), None, None),
        )
        .await;
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_sign_out_revokes_session() {
        let app = build_router(test_state());
        let token = token();
        let response = send(&app, request("POST", "/api/v1/auth/sign-out", Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let after = send(&app, request("GET", "/api/v1/portfolios", Some(&token), None)).await;
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_concurrent_export_of_same_document_conflicts() {
        let state = test_state();
        let app = build_router(state.clone());
        let response = send(
            &app,
            request(
                "POST",
                "/api/v1/portfolios",
                None,
                Some(json!({ "portfolio": portfolio_json(), "draftToken": "tok" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let _busy = state.in_flight.try_acquire("export:tok").unwrap();
        let response = send(&app, request("GET", "/preview/tok/export/pdf", None, None)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
