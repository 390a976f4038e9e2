//! Application state shared across handlers

use std::path::PathBuf;
use std::sync::Arc;

use prometheus_client::registry::Registry;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::storage::{Database, ReportStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub reports: ReportStore,
    pub license_key: Arc<str>,
    pub metrics: Arc<Metrics>,
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(db: Database, reports: ReportStore, license_key: &str) -> Self {
        let mut registry = Registry::default();
        let metrics = Arc::new(Metrics::new(&mut registry));
        Self {
            db,
            reports,
            license_key: Arc::from(license_key),
            metrics,
            registry: Arc::new(registry),
        }
    }
}

/// Directories the front end is served from
#[derive(Debug, Clone)]
pub struct AssetDirs {
    /// Public web root holding designer.html, viewer.html and saved reports
    pub public: PathBuf,
    /// Report designer/viewer library
    pub vendor: PathBuf,
}

impl AssetDirs {
    pub fn designer_page(&self) -> PathBuf {
        self.public.join("designer.html")
    }

    pub fn viewer_page(&self) -> PathBuf {
        self.public.join("viewer.html")
    }
}

impl From<&Config> for AssetDirs {
    fn from(config: &Config) -> Self {
        Self {
            public: config.public_dir.clone(),
            vendor: config.vendor_dir.clone(),
        }
    }
}
