use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgConnectOptions;

// ============================================
// Environment variable name constants
// ============================================
pub mod env {
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const PORT: &str = "PORT";
    pub const DB_USER: &str = "DB_USER";
    pub const DB_PASSWORD: &str = "DB_PASSWORD";
    pub const DB_SERVER: &str = "DB_SERVER";
    pub const DB_PORT: &str = "DB_PORT";
    pub const DB_NAME: &str = "DB_NAME";
    pub const DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
    pub const DB_ACQUIRE_TIMEOUT_SECS: &str = "DB_ACQUIRE_TIMEOUT_SECS";
    pub const LICENSE_KEY: &str = "STIMULSOFT_LICENSE_KEY";
    pub const PUBLIC_DIR: &str = "PUBLIC_DIR";
    pub const REPORTS_DIR: &str = "REPORTS_DIR";
    pub const VENDOR_DIR: &str = "VENDOR_DIR";
    pub const BODY_LIMIT_MB: &str = "BODY_LIMIT_MB";
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show version information
    Version,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "report-hub",
    version,
    about = "Report designer backend",
    long_about = "Serves database datasets as JSON to a browser-based report designer/viewer, stores report definitions on disk and hands out the designer license key."
)]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Log format: json or pretty
    #[arg(long, env = env::LOG_FORMAT, default_value = "json")]
    pub log_format: String,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = env::LOG_LEVEL, default_value = "info")]
    pub log_level: String,

    /// HTTP listen port
    #[arg(long, env = env::PORT, default_value = "3000")]
    pub port: u16,

    // ============================================
    // Database settings
    // ============================================
    /// Database user
    #[arg(long, env = env::DB_USER)]
    pub db_user: Option<String>,

    /// Database password
    #[arg(long, env = env::DB_PASSWORD, hide_env_values = true)]
    pub db_password: Option<String>,

    /// Database host
    #[arg(long, env = env::DB_SERVER, default_value = "localhost")]
    pub db_server: String,

    /// Database port
    #[arg(long, env = env::DB_PORT, default_value = "5432")]
    pub db_port: u16,

    /// Database name
    #[arg(long, env = env::DB_NAME)]
    pub db_name: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = env::DB_MAX_CONNECTIONS, default_value = "10")]
    pub db_max_connections: u32,

    /// Seconds to wait for a pooled connection before failing a query
    #[arg(long, env = env::DB_ACQUIRE_TIMEOUT_SECS, default_value = "30")]
    pub db_acquire_timeout_secs: u64,

    // ============================================
    // Front end settings
    // ============================================
    /// License key handed to the report designer/viewer
    #[arg(long, env = env::LICENSE_KEY, hide_env_values = true)]
    pub license_key: Option<String>,

    /// Directory served as the public web root
    #[arg(long, env = env::PUBLIC_DIR, default_value = "public")]
    pub public_dir: PathBuf,

    /// Directory holding saved report definitions
    #[arg(long, env = env::REPORTS_DIR, default_value = "public/reports")]
    pub reports_dir: PathBuf,

    /// Directory of the report designer/viewer library, mounted at /stimulsoft
    #[arg(long, env = env::VENDOR_DIR, default_value = "node_modules/stimulsoft-reports-js")]
    pub vendor_dir: PathBuf,

    /// Maximum request body size in MiB
    #[arg(long, env = env::BODY_LIMIT_MB, default_value = "50")]
    pub body_limit_mb: usize,
}

impl Config {
    /// Parse flags and environment. A `.env` file in the working directory is
    /// loaded first; variables already set in the environment take precedence.
    pub fn from_args() -> Self {
        dotenvy::dotenv().ok();
        Config::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.db_name.as_deref().is_none_or(str::is_empty) {
            return Err(format!("{} is required", env::DB_NAME));
        }
        if self.db_max_connections == 0 {
            return Err(format!("{} must be at least 1", env::DB_MAX_CONNECTIONS));
        }
        if self.body_limit_mb == 0 {
            return Err(format!("{} must be at least 1", env::BODY_LIMIT_MB));
        }
        Ok(())
    }

    /// Connection options assembled from the individual DB_* settings
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.db_server)
            .port(self.db_port);
        if let Some(user) = &self.db_user {
            options = options.username(user);
        }
        if let Some(password) = &self.db_password {
            options = options.password(password);
        }
        if let Some(name) = &self.db_name {
            options = options.database(name);
        }
        options
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }

    /// License key, empty when unset
    pub fn get_license_key(&self) -> &str {
        self.license_key.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        command: None,
        log_format: "pretty".to_string(),
        log_level: "info".to_string(),
        port: 3000,
        db_user: Some("report".to_string()),
        db_password: Some("secret".to_string()),
        db_server: "localhost".to_string(),
        db_port: 5432,
        db_name: Some("compliance".to_string()),
        db_max_connections: 10,
        db_acquire_timeout_secs: 30,
        license_key: None,
        public_dir: PathBuf::from("public"),
        reports_dir: PathBuf::from("public/reports"),
        vendor_dir: PathBuf::from("node_modules/stimulsoft-reports-js"),
        body_limit_mb: 50,
    }
}
