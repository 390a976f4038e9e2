//! HTTP request handlers for API endpoints

use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, warn};

use crate::error::AppResult;

use super::state::AppState;
use super::types::{
    DatasetsResponse, ErrorResponse, HealthResponse, LicenseResponse, MessageResponse,
    ReportUpload, SaveReportRequest, VersionResponse,
};

/// Liveness probe
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Health",
    responses(
        (status = 200, description = "Process is running", body = HealthResponse)
    )
)]
pub async fn healthz() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe: ready while the database answers
#[utoipa::path(
    get,
    path = "/readyz",
    tag = "Health",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                }),
            )
        }
    }
}

/// Save a report definition
#[utoipa::path(
    post,
    path = "/api/save-report",
    tag = "Reports",
    request_body = SaveReportRequest,
    responses(
        (status = 200, description = "Report saved", body = MessageResponse),
        (status = 400, description = "Missing field or invalid report name", body = ErrorResponse),
        (status = 500, description = "Write failed", body = ErrorResponse)
    )
)]
pub async fn save_report(
    State(state): State<AppState>,
    ReportUpload(request): ReportUpload,
) -> AppResult<Json<MessageResponse>> {
    let result = match request.into_parts() {
        Ok((file_name, content)) => state.reports.save(&file_name, &content).await,
        Err(e) => Err(e),
    };
    state.metrics.record_report_save(&result);
    let file_name = result?;
    debug!(file = %file_name, "Save request completed");

    Ok(Json(MessageResponse {
        message: "Report saved successfully".to_string(),
    }))
}

/// List saved report names
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    responses(
        (status = 200, description = "Report file names", body = Vec<String>),
        (status = 500, description = "Listing failed", body = ErrorResponse)
    )
)]
pub async fn list_reports(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let names = state.reports.list().await?;
    debug!(count = names.len(), "Listed reports");
    Ok(Json(names))
}

/// Designer/viewer license key
#[utoipa::path(
    get,
    path = "/api/license",
    tag = "License",
    responses(
        (status = 200, description = "License key, empty when unset", body = LicenseResponse)
    )
)]
pub async fn get_license(State(state): State<AppState>) -> Json<LicenseResponse> {
    Json(LicenseResponse {
        key: state.license_key.to_string(),
    })
}

/// All datasets for the report designer
#[utoipa::path(
    get,
    path = "/api/data",
    tag = "Datasets",
    responses(
        (status = 200, description = "Datasets keyed by name", body = DatasetsResponse),
        (status = 500, description = "A dataset query failed", body = ErrorResponse)
    )
)]
pub async fn get_data(State(state): State<AppState>) -> AppResult<Json<DatasetsResponse>> {
    let started = Instant::now();
    let result = state.db.fetch_datasets().await;
    state
        .metrics
        .record_dataset_request(&result, started.elapsed());

    let datasets = result?;
    debug!(
        datasets = datasets.len(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Datasets served"
    );
    Ok(Json(DatasetsResponse(datasets)))
}

/// Build information
#[utoipa::path(
    get,
    path = "/api/version",
    tag = "Version",
    responses(
        (status = 200, description = "Build information", body = VersionResponse)
    )
)]
pub async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("VERGEN_GIT_SHA").to_string(),
        build_date: env!("VERGEN_BUILD_TIMESTAMP").to_string(),
        rust_version: env!("VERGEN_RUSTC_SEMVER").to_string(),
        rust_channel: env!("VERGEN_RUSTC_CHANNEL").to_string(),
        platform: env!("VERGEN_CARGO_TARGET_TRIPLE").to_string(),
    })
}
