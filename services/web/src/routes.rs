//! Web service routes

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use common::{ExpiryCode, NewShare, RegistryError, RegistryResult, ShareBundle, ShareId};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, warn};

use crate::{
    config::ServerConfig,
    error::{ApiError, ApiResult},
    mailer::KeyEmail,
    models::{SendKeyRequest, SendKeyResponse, ShareDataResponse, UploadResponse},
    state::AppState,
    templates::Unavailable,
};

/// Create the router for the web service
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(server.max_upload_bytes)),
        )
        .route("/download/:id", get(download_page))
        .route("/data/:id", get(share_data))
        .route("/send-key", post(send_key))
        .nest_service("/static", ServeDir::new(&server.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "sanchar",
        "active_shares": state.registry.len().await,
    }))
}

/// Upload page
pub async fn index(State(state): State<AppState>) -> ApiResult<Html<String>> {
    Ok(Html(state.templates.render_index()?))
}

/// Store the uploaded files as a new share
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut payloads = Vec::new();
    let mut filenames = Vec::new();
    let mut expiry = ExpiryCode::default();
    let mut has_password = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" | "file" => {
                let filename = field.file_name().map(str::to_owned);
                let bytes = field.bytes().await?;

                // browsers send an empty part for an untouched file input
                if filename.as_deref() == Some("") && bytes.is_empty() {
                    continue;
                }

                let filename = filename
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| format!("file-{}", payloads.len() + 1));
                payloads.push(STANDARD.encode(&bytes));
                filenames.push(filename);
            }
            "expiry" => expiry = ExpiryCode::parse_lenient(&field.text().await?),
            "has_password" => has_password = parse_flag(&field.text().await?),
            _ => debug!(field = %name, "Ignoring unknown multipart field"),
        }
    }

    if payloads.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let share_id = state
        .registry
        .create(NewShare {
            payloads,
            filenames,
            expiry,
            has_password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            share_id,
            expiry: expiry.as_str().to_string(),
        }),
    ))
}

/// Landing page for a share link
pub async fn download_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let response = match lookup(&state, &id).await {
        Ok(bundle) => Html(state.templates.render_download(&bundle)?).into_response(),
        Err(RegistryError::Expired) => (
            StatusCode::GONE,
            Html(state.templates.render_unavailable(Unavailable::Expired)?),
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Html(state.templates.render_unavailable(Unavailable::NotFound)?),
        )
            .into_response(),
    };

    Ok(response)
}

/// Encoded payloads and filenames of a live share
pub async fn share_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ShareDataResponse>> {
    let bundle = lookup(&state, &id).await?;
    Ok(Json(ShareDataResponse::from(bundle.as_ref())))
}

/// Email a decryption key. Failures are reported in the body, never as an HTTP error.
pub async fn send_key(
    State(state): State<AppState>,
    payload: Result<Json<SendKeyRequest>, JsonRejection>,
) -> Json<SendKeyResponse> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "Malformed key email request");
            return Json(SendKeyResponse::error(rejection.body_text()));
        }
    };

    if request.key.trim().is_empty() {
        return Json(SendKeyResponse::error("A key is required"));
    }

    let share_url = request
        .share_id
        .as_deref()
        .and_then(|id| id.parse::<ShareId>().ok())
        .and_then(|id| state.download_url(&id.to_string()));

    let email = KeyEmail {
        to: request.email.trim().to_string(),
        key: request.key,
        share_url,
    };

    match state.mailer.send_key(&email).await {
        Ok(()) => Json(SendKeyResponse::sent()),
        Err(e) => {
            warn!(error = %e, "Failed to send key email");
            Json(SendKeyResponse::error(e.to_string()))
        }
    }
}

async fn lookup(state: &AppState, raw_id: &str) -> RegistryResult<Arc<ShareBundle>> {
    let id: ShareId = raw_id.parse().map_err(|_| RegistryError::NotFound)?;
    state.registry.get(&id).await
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}
