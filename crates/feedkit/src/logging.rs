//! Tracing subscriber initialisation.
//!
//! A terminal UI owns stdout, so logs go to a file. Follow them with
//! `tail -f` from another terminal.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from [`init`].
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path has no file name component.
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Split `log_path` into its directory and file name, creating the
/// directory if needed.
fn prepare(log_path: &Path) -> Result<(PathBuf, String), LoggingError> {
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.clone(),
        source,
    })?;

    Ok((directory, file_name.to_string()))
}

/// Install a global fmt subscriber writing to `log_path`.
///
/// Honours `RUST_LOG`, defaulting to `info`.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;

    let (directory, file_name) = prepare(log_path)?;
    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn path_without_file_name_is_rejected() {
        let result = init(Path::new("/"));
        assert!(matches!(result, Err(LoggingError::InvalidPath(_))), "{result:?}");
    }

    #[test]
    fn prepare_creates_missing_directory() {
        let dir = std::env::temp_dir().join(format!("feedkit_test_logs_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let (directory, file_name) = prepare(&dir.join("nested").join("feed.log")).unwrap();

        assert!(directory.ends_with("nested"));
        assert!(directory.is_dir());
        assert_eq!(file_name, "feed.log");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn bare_file_name_logs_to_working_directory() {
        let (directory, file_name) = prepare(Path::new("feedkit-test.log")).unwrap();
        assert_eq!(directory, PathBuf::from("."));
        assert_eq!(file_name, "feedkit-test.log");
    }

    #[test]
    fn second_init_reports_existing_subscriber() {
        let dir = std::env::temp_dir().join(format!("feedkit_test_init_{}", std::process::id()));
        let log = dir.join("feed.log");

        let first = init(&log);
        let second = init(&log);

        // Another test in this binary may have installed a subscriber first.
        assert!(first.is_ok() || matches!(first, Err(LoggingError::SubscriberAlreadySet)));
        assert!(matches!(second, Err(LoggingError::SubscriberAlreadySet)));
        let _ = fs::remove_dir_all(&dir);
    }
}
