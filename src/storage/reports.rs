//! Report definition file store
//!
//! A flat directory of `<name>.mrt` files. Files are written whole and never
//! parsed; concurrent saves of the same name are not serialized.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// Extension every stored report carries
pub const REPORT_EXTENSION: &str = ".mrt";

/// Directory of saved report definitions
#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the store directory if it does not exist yet
    pub async fn init(&self) -> std::io::Result<()> {
        if fs::try_exists(&self.root).await? {
            debug!(path = %self.root.display(), "Reports directory exists");
        } else {
            info!(path = %self.root.display(), "Creating reports directory");
            fs::create_dir_all(&self.root).await?;
        }
        Ok(())
    }

    /// Write `content` under the normalized form of `file_name`, replacing any
    /// existing report of that name. Returns the stored file name.
    pub async fn save(&self, file_name: &str, content: &str) -> AppResult<String> {
        let name = normalize_file_name(file_name)?;
        let path = self.root.join(&name);

        fs::write(&path, content).await?;

        info!(
            file = %name,
            bytes = content.len(),
            "Report saved"
        );
        Ok(name)
    }

    /// Names of all stored reports, sorted. A missing directory lists as empty.
    pub async fn list(&self) -> AppResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.root.display(), "Reports directory missing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str()
                && name.ends_with(REPORT_EXTENSION)
            {
                names.push(name.to_string());
            }
        }
        names.sort_unstable();
        Ok(names)
    }
}

/// Append the report extension unless present, then require the result to be
/// a single plain file name so the write stays inside the store directory.
pub fn normalize_file_name(file_name: &str) -> AppResult<String> {
    if file_name.is_empty() {
        return Err(AppError::invalid("Report name must not be empty"));
    }

    let name = if file_name.ends_with(REPORT_EXTENSION) {
        file_name.to_string()
    } else {
        format!("{file_name}{REPORT_EXTENSION}")
    };

    let mut components = Path::new(&name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || name.contains(['/', '\\']) {
        return Err(AppError::invalid(format!("Invalid report name: {file_name}")));
    }

    Ok(name)
}
