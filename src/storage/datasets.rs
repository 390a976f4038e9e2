//! Fixed dataset queries for the report designer
//!
//! Every dataset is a full scan; rows are rendered by PostgreSQL itself with
//! `row_to_json`, so column names and values reach the client exactly as the
//! schema defines them.

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, error};

use super::database::Database;

/// Datasets keyed by name, each holding an array of row objects
pub type Datasets = serde_json::Map<String, Value>;

/// Name of the unified compliance dataset
pub const COMPLIANCES: &str = "Compliances";

/// Datasets served straight from one table: (dataset name, source table)
pub const TABLE_DATASETS: [(&str, &str); 10] = [
    ("CEMS", "CEMS"),
    ("ClinicalWaste", "clinical_waste_track"),
    ("DriversCompliance", "drivers_compliance"),
    ("IdleDowntime", "Idle_Downtime"),
    ("ParameterLimits", "parameter_limits"),
    ("StatutoryCompliance", "statutory_compliance"),
    ("TestingKIP", "Testing_KIP"),
    ("TransportCompliance", "transport_compliance"),
    ("Users", "users"),
    ("WasteTreated", "Waste_Treated"),
];

/// Values of the `Category` column in the unified compliance dataset
#[cfg(test)]
const COMPLIANCE_CATEGORIES: [&str; 3] = ["Driver", "Statutory", "Transport"];

/// Columns of every unified compliance row
#[cfg(test)]
const COMPLIANCE_FIELDS: [&str; 5] =
    ["Category", "ItemName", "LicenseDetail", "expiryDate", "remarks"];

// Output aliases are quoted so the JSON keys keep their case. The date and
// remarks columns keep their source names, which saved reports bind to.
const COMPLIANCES_SQL: &str = r#"
    SELECT
        'Driver' AS "Category",
        driverName AS "ItemName",
        licenseType AS "LicenseDetail",
        expiryDate AS "expiryDate",
        remarks AS "remarks"
    FROM drivers_compliance

    UNION ALL

    SELECT
        'Statutory' AS "Category",
        equipment AS "ItemName",
        licenseNo AS "LicenseDetail",
        expiryDate AS "expiryDate",
        remarks AS "remarks"
    FROM statutory_compliance

    UNION ALL

    SELECT
        'Transport' AS "Category",
        vehicleNo AS "ItemName",
        licenseType AS "LicenseDetail",
        expiryDate AS "expiryDate",
        remarks AS "remarks"
    FROM transport_compliance
"#;

/// All dataset names in response order
#[cfg(test)]
fn dataset_names() -> impl Iterator<Item = &'static str> {
    std::iter::once(COMPLIANCES).chain(TABLE_DATASETS.iter().map(|(name, _)| *name))
}

/// Wrap a query so each result row comes back as one JSON object
fn json_rows_sql(query: &str) -> String {
    format!("SELECT row_to_json(t) FROM ({query}) AS t")
}

/// (dataset name, SQL) for every dataset
fn dataset_queries() -> Vec<(&'static str, String)> {
    std::iter::once((COMPLIANCES, json_rows_sql(COMPLIANCES_SQL)))
        .chain(
            TABLE_DATASETS
                .iter()
                .map(|(name, table)| (*name, json_rows_sql(&format!("SELECT * FROM {table}")))),
        )
        .collect()
}

/// Collect per-dataset rows into the response object
fn assemble(results: impl IntoIterator<Item = (&'static str, Vec<Value>)>) -> Datasets {
    results
        .into_iter()
        .map(|(name, rows)| (name.to_string(), Value::Array(rows)))
        .collect()
}

impl Database {
    /// Run every dataset query and assemble the response.
    /// Any failing query fails the whole call; partial results are dropped.
    pub async fn fetch_datasets(&self) -> Result<Datasets, sqlx::Error> {
        let queries = dataset_queries();

        let results = try_join_all(queries.iter().map(|(name, sql)| async move {
            let rows = self.fetch_json_rows(sql).await.map_err(|e| {
                error!(dataset = %name, error = %e, "Dataset query failed");
                e
            })?;
            debug!(dataset = %name, rows = rows.len(), "Dataset fetched");
            Ok::<_, sqlx::Error>((*name, rows))
        }))
        .await?;

        Ok(assemble(results))
    }

    async fn fetch_json_rows(&self, sql: &str) -> Result<Vec<Value>, sqlx::Error> {
        sqlx::query_scalar::<_, Value>(sql)
            .fetch_all(&self.pool)
            .await
    }
}
