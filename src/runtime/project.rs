//! Filesystem helpers around a SAM project
//!
//! Missing project files are an expected state (a freshly opened folder),
//! so enumerations return empty lists for them instead of failing.

use crate::core::{Config, Error, Result};
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Folder created under `~/Documents` when no project path is known
pub const DEFAULT_PROJECT_FOLDER: &str = "aws-lambda-swift";

/// Remove the template staging directory
///
/// An already absent directory is not an error, so cleaning up twice in a
/// row is harmless.
pub async fn cleanup_temp_directory(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            debug!(dir = %dir.display(), "Temporary directory cleanup successful.");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "Temporary directory does not exist. No cleanup needed.");
            Ok(())
        }
        Err(e) => Err(Error::Cleanup {
            message: format!(
                "Failed to clean up temporary directory '{}'",
                dir.display()
            ),
            source: e,
        }),
    }
}

/// Executable product names declared in the project's package manifest
pub async fn get_functions(path: &Path, config: &Config) -> Result<Vec<String>> {
    let manifest = path.join(&config.package_file);
    let content = match tokio::fs::read_to_string(&manifest).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(manifest = %manifest.display(), "no package manifest, no functions");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(Error::GetFunctionsFailed {
                message: format!("Failed to get functions from '{}'", manifest.display()),
                source: e,
            })
        }
    };

    let pattern = Regex::new(&config.functions_pattern)
        .map_err(|e| Error::configuration(format!("invalid functions pattern: {}", e)))?;

    Ok(pattern
        .captures_iter(&content)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
        .collect())
}

/// Names of the `.json` event payloads in the project's events directory
pub async fn get_events(path: &Path, config: &Config) -> Result<Vec<String>> {
    let events_dir = path.join(&config.events_dir);
    let failed = |e| Error::GetEventsFailed {
        message: format!("Failed to get events from '{}'", events_dir.display()),
        source: e,
    };

    let mut entries = match tokio::fs::read_dir(&events_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(dir = %events_dir.display(), "no events directory, no events");
            return Ok(Vec::new());
        }
        Err(e) => return Err(failed(e)),
    };

    let mut events = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(failed)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") {
            events.push(name);
        }
    }
    events.sort();
    Ok(events)
}

/// Whether `path` exists
pub async fn check_folder_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// `~/Documents/aws-lambda-swift`, created if missing
pub async fn default_project_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::configuration("could not determine the home directory"))?;
    ensure_project_dir(&home).await
}

async fn ensure_project_dir(home: &Path) -> Result<PathBuf> {
    let path = home.join("Documents").join(DEFAULT_PROJECT_FOLDER);
    tokio::fs::create_dir_all(&path).await.map_err(|e| {
        Error::io(
            format!("could not create default project directory '{}'", path.display()),
            e,
        )
    })?;
    Ok(path)
}

/// Whether the event payload file has no content
pub(crate) async fn event_file_is_empty(path: &Path) -> std::io::Result<bool> {
    let content = tokio::fs::read(path).await?;
    Ok(content.is_empty())
}
