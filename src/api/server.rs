// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::{
    types::{
        CleanExpiredKeysRequest, CreateAllowlistRequest, DownloadQuery, ExecuteRequest,
        HealthResponse, SponsorRequest, UploadEncryptedPdfRequest,
    },
    ApiError, SealService,
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SealService>,
}

impl AppState {
    pub fn new(service: Arc<SealService>) -> Self {
        Self { service }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/seal/create-allowlist", post(create_allowlist_handler))
        .route("/api/seal/clean-expired-keys", post(clean_expired_keys_handler))
        .route("/api/auth/sponsor", post(sponsor_handler))
        .route("/api/auth/execute", post(execute_handler))
        .route("/api/contracts/download-pdf/:id", get(download_pdf_handler))
        .route("/api/contracts/:id", get(get_contract_handler))
        .route("/api/contracts/:id/encrypted-pdf", post(upload_encrypted_pdf_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(service: Arc<SealService>, port: u16) -> anyhow::Result<()> {
    let app = create_app(AppState::new(service));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 API server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// Error response wrapper
pub struct ApiErrorResponse(pub ApiError);

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (status, Json(self.0.to_response())).into_response()
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(e: ApiError) -> Self {
        ApiErrorResponse(e)
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiErrorResponse> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiErrorResponse(ApiError::BadRequest(rejection.body_text())))
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn create_allowlist_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateAllowlistRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let request = body(payload)?;
    Ok(Json(state.service.create_allowlist(&request).await?))
}

async fn sponsor_handler(
    State(state): State<AppState>,
    payload: Result<Json<SponsorRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let request = body(payload)?;
    Ok(Json(state.service.sponsor(&request).await?))
}

async fn execute_handler(
    State(state): State<AppState>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let request = body(payload)?;
    Ok(Json(state.service.execute(&request).await?))
}

async fn clean_expired_keys_handler(
    State(state): State<AppState>,
    payload: Result<Json<CleanExpiredKeysRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let request = body(payload)?;
    Ok(Json(state.service.clean_expired_keys(&request).await?))
}

async fn get_contract_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    Ok(Json(state.service.get_contract(&id).await?))
}

async fn upload_encrypted_pdf_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UploadEncryptedPdfRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let request = body(payload)?;
    Ok(Json(state.service.upload_encrypted_pdf(&id, &request).await?))
}

async fn download_pdf_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiErrorResponse> {
    let pdf = state.service.download_pdf(&id).await?;

    let disposition = if query.view.as_deref() == Some("inline") {
        "inline"
    } else {
        "attachment"
    };
    let file_name = pdf
        .file_name
        .unwrap_or_else(|| format!("{}.enc", id))
        .replace('"', "");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{}; filename=\"{}\"", disposition, file_name),
            ),
        ],
        pdf.data,
    )
        .into_response())
}
