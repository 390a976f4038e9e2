//! Web layer for report-hub
//!
//! This module provides the HTTP server, API endpoints and the static front
//! end mounts.
//!
//! # Module Structure
//! - `handlers`: HTTP request handlers
//! - `state`: Application state and asset directories
//! - `types`: Request and response types

mod handlers;
mod state;
mod types;

// Re-export public types
pub use handlers::{
    get_data, get_license, get_version, healthz, list_reports, readyz, save_report,
};
pub use state::{AppState, AssetDirs};
pub use types::{
    DatasetsResponse, ErrorResponse, HealthResponse, LicenseResponse, MessageResponse,
    ReportUpload, SaveReportRequest, VersionResponse,
};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    response::IntoResponse,
    routing::{get, post},
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

use crate::config::Config;
use crate::metrics::metrics_handler;
use crate::storage::{Database, ReportStore};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "report-hub API",
        description = "Dataset, report file and license endpoints for the report designer",
        version = env!("CARGO_PKG_VERSION"),
        license(name = "MIT")
    ),
    paths(
        handlers::healthz,
        handlers::readyz,
        handlers::save_report,
        handlers::list_reports,
        handlers::get_license,
        handlers::get_data,
        handlers::get_version,
    ),
    components(schemas(
        SaveReportRequest,
        MessageResponse,
        ErrorResponse,
        LicenseResponse,
        HealthResponse,
        DatasetsResponse,
        VersionResponse,
    )),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Reports", description = "Report definition storage"),
        (name = "License", description = "Designer license key"),
        (name = "Datasets", description = "Database datasets for the designer"),
        (name = "Version", description = "Build version information"),
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn router(state: AppState, assets: &AssetDirs, body_limit: usize) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        // Probes and metrics
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        // API routes
        .route("/api/save-report", post(save_report))
        .route("/api/reports", get(list_reports))
        .route("/api/license", get(get_license))
        .route("/api/data", get(get_data))
        .route("/api/version", get(get_version))
        // OpenAPI documentation
        .route("/api-docs/openapi.json", get(serve_openapi))
        // Designer and viewer entry points
        .route_service("/designer", ServeFile::new(assets.designer_page()))
        .route_service("/viewer", ServeFile::new(assets.viewer_page()))
        // Front end library and public assets (saved reports included)
        .nest_service("/stimulsoft", ServeDir::new(&assets.vendor))
        .fallback_service(ServeDir::new(&assets.public))
        .layer(
            ServiceBuilder::new()
                .layer(trace)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

pub async fn run(config: Config, mut shutdown: tokio::sync::watch::Receiver<bool>) -> Result<()> {
    info!(
        port = config.port,
        public_dir = %config.public_dir.display(),
        reports_dir = %config.reports_dir.display(),
        vendor_dir = %config.vendor_dir.display(),
        "Starting server"
    );

    let reports = ReportStore::new(&config.reports_dir);
    reports
        .init()
        .await
        .context("Failed to create reports directory")?;

    let db = Database::connect(&config).await?;

    let state = AppState::new(db.clone(), reports, config.get_license_key());
    let app = router(state, &AssetDirs::from(&config), config.body_limit_bytes());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        addr = %addr,
        designer = %format!("http://localhost:{}/designer", config.port),
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
            info!("Server shutting down");
        })
        .await?;

    db.close().await;
    Ok(())
}

async fn serve_openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::path::Path;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::error::INTERNAL_ERROR_MESSAGE;
    use crate::storage::unreachable_database;

    struct Fixture {
        dir: TempDir,
        app: Router,
    }

    impl Fixture {
        fn reports_dir(&self) -> std::path::PathBuf {
            self.dir.path().join("public").join("reports")
        }
    }

    fn fixture_with(license_key: &str, create_reports_dir: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("public");
        let vendor = dir.path().join("vendor");
        std::fs::create_dir_all(vendor.join("scripts")).unwrap();
        std::fs::create_dir_all(&public).unwrap();
        std::fs::write(public.join("designer.html"), "<html>designer</html>").unwrap();
        std::fs::write(public.join("viewer.html"), "<html>viewer</html>").unwrap();
        std::fs::write(vendor.join("scripts").join("stimulsoft.reports.js"), "// lib").unwrap();

        let reports_dir = public.join("reports");
        if create_reports_dir {
            std::fs::create_dir_all(&reports_dir).unwrap();
        }

        let state = AppState::new(
            unreachable_database(),
            ReportStore::new(reports_dir),
            license_key,
        );
        let assets = AssetDirs { public, vendor };
        let app = router(state, &assets, 1024 * 1024);
        Fixture { dir, app }
    }

    fn fixture() -> Fixture {
        fixture_with("", true)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    fn json_body(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_save_then_list() {
        let fx = fixture();

        let (status, body) = post_json(
            &fx.app,
            "/api/save-report",
            json!({"fileName": "foo", "reportContent": "{\"Pages\":{}}"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"message": "Report saved successfully"}));

        let (status, body) = get(&fx.app, "/api/reports").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!(["foo.mrt"]));

        let saved = std::fs::read_to_string(fx.reports_dir().join("foo.mrt")).unwrap();
        assert_eq!(saved, "{\"Pages\":{}}");
    }

    #[tokio::test]
    async fn test_save_does_not_double_extension() {
        let fx = fixture();

        let (status, _) = post_json(
            &fx.app,
            "/api/save-report",
            json!({"fileName": "foo.mrt", "reportContent": "x"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(files_in(&fx.reports_dir()), vec!["foo.mrt"]);
    }

    #[tokio::test]
    async fn test_save_missing_fields_is_bad_request() {
        let fx = fixture();

        for body in [
            json!({"reportContent": "x"}),
            json!({"fileName": "foo"}),
            json!({}),
        ] {
            let (status, response) = post_json(&fx.app, "/api/save-report", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(
                json_body(&response),
                json!({"error": "Missing fileName or reportContent"})
            );
        }
        assert!(files_in(&fx.reports_dir()).is_empty());
    }

    #[tokio::test]
    async fn test_save_malformed_body_is_bad_request() {
        let fx = fixture();

        let request = Request::post("/api/save-report")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send(&fx.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = Request::post("/api/save-report")
            .body(Body::from("fileName=foo"))
            .unwrap();
        let (status, _) = send(&fx.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(files_in(&fx.reports_dir()).is_empty());
    }

    #[tokio::test]
    async fn test_save_form_body() {
        let fx = fixture();

        let request = Request::post("/api/save-report")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("fileName=daily&reportContent=%3CReport%2F%3E"))
            .unwrap();
        let (status, _) = send(&fx.app, request).await;
        assert_eq!(status, StatusCode::OK);

        let saved = std::fs::read_to_string(fx.reports_dir().join("daily.mrt")).unwrap();
        assert_eq!(saved, "<Report/>");
    }

    #[tokio::test]
    async fn test_save_path_escape_rejected() {
        let fx = fixture();

        let (status, _) = post_json(
            &fx.app,
            "/api/save-report",
            json!({"fileName": "../../escaped", "reportContent": "x"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!fx.dir.path().join("escaped.mrt").exists());
        assert!(files_in(&fx.reports_dir()).is_empty());
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let fx = fixture_with("", false);

        let (status, body) = get(&fx.app, "/api/reports").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!([]));
    }

    #[tokio::test]
    async fn test_license_unset_is_empty_string() {
        let fx = fixture();

        let (status, body) = get(&fx.app, "/api/license").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"key": ""}));
    }

    #[tokio::test]
    async fn test_license_configured() {
        let fx = fixture_with("6vJhGtLLLz2GNviWmUTrhSqnOItdDwjB", true);

        let (_, body) = get(&fx.app, "/api/license").await;
        assert_eq!(json_body(&body), json!({"key": "6vJhGtLLLz2GNviWmUTrhSqnOItdDwjB"}));
    }

    #[tokio::test]
    async fn test_no_cross_origin_access() {
        let fx = fixture_with("6vJhGtLLLz2GNviWmUTrhSqnOItdDwjB", true);

        for uri in ["/api/license", "/api/data", "/api/reports"] {
            let request = Request::get(uri)
                .header(header::ORIGIN, "https://other.example")
                .body(Body::empty())
                .unwrap();
            let response = fx.app.clone().oneshot(request).await.unwrap();
            assert!(
                response
                    .headers()
                    .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                    .is_none(),
                "{uri} allows cross-origin reads"
            );
        }
    }

    #[tokio::test]
    async fn test_data_without_database_is_internal_error() {
        let fx = fixture();

        let (status, body) = get(&fx.app, "/api/data").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(&body), json!({"error": INTERNAL_ERROR_MESSAGE}));
    }

    #[tokio::test]
    async fn test_entry_points_served_without_database() {
        let fx = fixture();

        let (status, _) = get(&fx.app, "/api/data").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = get(&fx.app, "/designer").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<html>designer</html>");

        let (status, body) = get(&fx.app, "/viewer").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<html>viewer</html>");
    }

    #[tokio::test]
    async fn test_static_mounts() {
        let fx = fixture();

        let (status, body) = get(&fx.app, "/stimulsoft/scripts/stimulsoft.reports.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"// lib");

        post_json(
            &fx.app,
            "/api/save-report",
            json!({"fileName": "shared", "reportContent": "<Report/>"}),
        )
        .await;
        let (status, body) = get(&fx.app, "/reports/shared.mrt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<Report/>");

        let (status, _) = get(&fx.app, "/missing.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_probes() {
        let fx = fixture();

        let (status, body) = get(&fx.app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"status": "ok"}));

        let (status, body) = get(&fx.app, "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(&body), json!({"status": "unavailable"}));
    }

    #[tokio::test]
    async fn test_metrics_count_requests() {
        let fx = fixture();

        post_json(
            &fx.app,
            "/api/save-report",
            json!({"fileName": "foo", "reportContent": "x"}),
        )
        .await;
        get(&fx.app, "/api/data").await;

        let (status, body) = get(&fx.app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("report_hub_report_saves_total{result=\"success\"} 1"));
        assert!(text.contains("report_hub_dataset_requests_total{result=\"error\"} 1"));
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let fx = fixture();

        let (status, body) = get(&fx.app, "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        let doc = json_body(&body);
        for path in ["/api/save-report", "/api/reports", "/api/license", "/api/data"] {
            assert!(doc["paths"].get(path).is_some(), "{path} missing");
        }
    }

    #[tokio::test]
    async fn test_version() {
        let fx = fixture();

        let (status, body) = get(&fx.app, "/api/version").await;
        assert_eq!(status, StatusCode::OK);
        let version = json_body(&body);
        assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(version["commit"], env!("VERGEN_GIT_SHA"));
        assert_eq!(version["build_date"], env!("VERGEN_BUILD_TIMESTAMP"));
        assert_eq!(version["platform"], env!("VERGEN_CARGO_TARGET_TRIPLE"));
    }

    #[tokio::test]
    async fn test_body_limit() {
        let fx = fixture();

        let content = "x".repeat(2 * 1024 * 1024);
        let (status, _) = post_json(
            &fx.app,
            "/api/save-report",
            json!({"fileName": "big", "reportContent": content}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(files_in(&fx.reports_dir()).is_empty());
    }
}
