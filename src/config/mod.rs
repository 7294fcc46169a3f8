use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{CatalogError, CatalogResult};

/// Default location of the sources catalog, relative to the working directory
pub const DEFAULT_CATALOG_ROOT: &str = "catalogs/sources";

#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_root: PathBuf,
    pub download_dir: PathBuf,
    pub http_timeout: Option<Duration>,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> CatalogResult<Self> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let catalog_root = std::env::var("CATALOG_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CATALOG_ROOT));

        // Downloads land in the working directory unless told otherwise
        let download_dir = match std::env::var("CATALOG_DOWNLOAD_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()?,
        };

        let http_timeout = match std::env::var("CATALOG_HTTP_TIMEOUT_SECS") {
            Ok(raw) => Some(Self::parse_timeout(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            catalog_root,
            download_dir,
            http_timeout,
        })
    }

    fn parse_timeout(raw: &str) -> CatalogResult<Duration> {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(CatalogError::Config(format!(
                "CATALOG_HTTP_TIMEOUT_SECS must be a positive integer, got '{}'",
                raw
            ))),
        }
    }
}
