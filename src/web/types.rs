//! Request and response types for API endpoints

use axum::extract::{Form, FromRequest, Json, Request};
use axum::http::header;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::storage::Datasets;

/// Body of a report save request
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveReportRequest {
    /// Report name; `.mrt` is appended when missing
    #[schema(example = "monthly-cems")]
    pub file_name: Option<String>,
    /// Serialized report definition, stored verbatim
    #[schema(example = "{\"ReportVersion\":\"2024.1.1\"}")]
    pub report_content: Option<String>,
}

impl SaveReportRequest {
    /// Both fields, or `InvalidRequest` when either is absent or empty
    pub fn into_parts(self) -> AppResult<(String, String)> {
        match (self.file_name, self.report_content) {
            (Some(name), Some(content)) if !name.is_empty() && !content.is_empty() => {
                Ok((name, content))
            }
            _ => Err(AppError::invalid("Missing fileName or reportContent")),
        }
    }
}

/// Save request decoded from either a JSON or a urlencoded form body.
/// Rejections surface as `InvalidRequest` rather than axum's defaults.
pub struct ReportUpload(pub SaveReportRequest);

impl<S> FromRequest<S> for ReportUpload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        let body = if is_form {
            let Form(body) = Form::<SaveReportRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::invalid(e.body_text()))?;
            body
        } else {
            let Json(body) = Json::<SaveReportRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::invalid(e.body_text()))?;
            body
        };
        Ok(Self(body))
    }
}

/// Plain confirmation message
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Report saved successfully")]
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Designer/viewer license key
#[derive(Debug, Serialize, ToSchema)]
pub struct LicenseResponse {
    /// License key, empty when none is configured
    pub key: String,
}

/// Health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// Every dataset keyed by name, each an array of row objects whose columns
/// follow the database schema
#[derive(Debug, Serialize, ToSchema)]
#[schema(value_type = Object)]
pub struct DatasetsResponse(pub Datasets);

/// Version info response (build-time information)
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionResponse {
    #[schema(example = "0.1.0")]
    pub version: String,
    #[schema(example = "abc1234")]
    pub commit: String,
    #[schema(example = "2026-01-11T00:00:00Z")]
    pub build_date: String,
    #[schema(example = "1.94.1")]
    pub rust_version: String,
    #[schema(example = "stable")]
    pub rust_channel: String,
    #[schema(example = "x86_64-unknown-linux-gnu")]
    pub platform: String,
}
