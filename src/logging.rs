//! Logging setup.
//!
//! The terminal belongs to the user and the children, so logs always go to a
//! file. The filter is read from `IMCSH_LOG` and defaults to `info`.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const FILTER_ENV: &str = "IMCSH_LOG";

pub fn init_file_logging(log_path: &Path) {
    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {}", e);
            return;
        }
    }

    let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file: {}", e);
            return;
        }
    };

    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .try_init();
    if let Err(e) = result {
        eprintln!("Warning: Could not install logger: {}", e);
    }
}

/// `<data-local-dir>/imcsh/imcsh.log`, or the temp directory when there is
/// no such directory.
pub fn default_log_path() -> PathBuf {
    if let Some(dir) = dirs::data_local_dir() {
        return dir.join("imcsh").join("imcsh.log");
    }
    std::env::temp_dir().join("imcsh.log")
}
