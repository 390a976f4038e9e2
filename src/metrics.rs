//! Prometheus metrics for report-hub.

use std::time::Duration;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

use crate::error::{AppError, AppResult};
use crate::storage::Datasets;
use crate::web::AppState;

/// Labels for request outcome counters.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ResultLabels {
    pub result: String,
}

/// Labels for per-dataset gauges.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DatasetLabels {
    pub dataset: String,
}

pub struct Metrics {
    pub dataset_requests_total: Family<ResultLabels, Counter>,
    pub dataset_request_duration_seconds: Histogram,
    pub dataset_rows: Family<DatasetLabels, Gauge>,
    pub report_saves_total: Family<ResultLabels, Counter>,
}

/// From a warm local database up to full scans of large tables.
const DATASET_DURATION_BUCKETS: &[f64] = &[
    0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

impl Metrics {
    /// Create and register all metrics with the given registry.
    pub fn new(registry: &mut Registry) -> Self {
        let dataset_requests_total = Family::<ResultLabels, Counter>::default();
        registry.register(
            "report_hub_dataset_requests",
            "Total number of aggregated dataset requests",
            dataset_requests_total.clone(),
        );

        let dataset_request_duration_seconds =
            Histogram::new(DATASET_DURATION_BUCKETS.iter().copied());
        registry.register(
            "report_hub_dataset_request_duration_seconds",
            "Time spent running all dataset queries for one request",
            dataset_request_duration_seconds.clone(),
        );

        let dataset_rows = Family::<DatasetLabels, Gauge>::default();
        registry.register(
            "report_hub_dataset_rows",
            "Rows returned per dataset by the last successful request",
            dataset_rows.clone(),
        );

        let report_saves_total = Family::<ResultLabels, Counter>::default();
        registry.register(
            "report_hub_report_saves",
            "Total number of report save attempts",
            report_saves_total.clone(),
        );

        Self {
            dataset_requests_total,
            dataset_request_duration_seconds,
            dataset_rows,
            report_saves_total,
        }
    }

    pub fn record_dataset_request(&self, result: &Result<Datasets, sqlx::Error>, elapsed: Duration) {
        self.dataset_request_duration_seconds
            .observe(elapsed.as_secs_f64());

        let label = if result.is_ok() { "success" } else { "error" };
        self.dataset_requests_total
            .get_or_create(&ResultLabels {
                result: label.to_string(),
            })
            .inc();

        if let Ok(datasets) = result {
            for (name, rows) in datasets {
                let count = rows.as_array().map_or(0, Vec::len);
                self.dataset_rows
                    .get_or_create(&DatasetLabels {
                        dataset: name.clone(),
                    })
                    .set(i64::try_from(count).unwrap_or(i64::MAX));
            }
        }
    }

    pub fn record_report_save(&self, result: &AppResult<String>) {
        let label = match result {
            Ok(_) => "success",
            Err(AppError::InvalidRequest(_)) => "rejected",
            Err(_) => "error",
        };
        self.report_saves_total
            .get_or_create(&ResultLabels {
                result: label.to_string(),
            })
            .inc();
    }
}

/// Axum handler that encodes the registry as OpenMetrics text.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut buf = String::new();
    if encode(&mut buf, &state.registry).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            "Failed to encode metrics".to_string(),
        );
    }
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        buf,
    )
}
