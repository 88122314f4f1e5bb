// src/config.rs

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use dotenvy::dotenv;

/// Number of questions assigned to every user.
pub const QUIZ_QUESTION_COUNT: usize = 7;

/// Points awarded for a correct answer unless the catalog says otherwise.
pub const DEFAULT_POINTS: i64 = 10;

/// Name of the shared CSV export blob.
pub const CSV_FILE_NAME: &str = "labor_ergebnisse.csv";

/// Blob directory for uploaded lab reports.
pub const REPORT_DIR: &str = "Laborberichte";

/// Which `StateStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// How the lab results CSV export is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// One shared CSV blob, rewritten by a single writer.
    Blob,
    /// One row per user in the store, rendered to CSV on read.
    Rendered,
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blob" => Ok(Self::Blob),
            "rendered" => Ok(Self::Rendered),
            other => Err(format!("unknown export mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub blob_dir: PathBuf,
    pub public_base_url: String,
    pub export_mode: ExportMode,
    pub catalog_path: Option<PathBuf>,
    pub store_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse::<StorageBackend>()
            .expect("STORAGE_BACKEND must be 'postgres' or 'memory'");

        let database_url = env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            panic!("DATABASE_URL must be set when STORAGE_BACKEND=postgres");
        }

        let blob_dir = env::var("BLOB_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("storage"));

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000/files/".to_string());

        let export_mode = env::var("EXPORT_MODE")
            .unwrap_or_else(|_| "blob".to_string())
            .parse::<ExportMode>()
            .expect("EXPORT_MODE must be 'blob' or 'rendered'");

        let catalog_path = env::var("CATALOG_PATH").ok().map(PathBuf::from);

        let store_timeout = env::var("STORE_TIMEOUT_SECS")
            .ok()
            .map(|v| {
                parse_timeout_secs(&v)
                    .expect("STORE_TIMEOUT_SECS must be a positive number of seconds")
            })
            .unwrap_or(Duration::from_secs(5));

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(5000);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            storage_backend,
            database_url,
            blob_dir,
            public_base_url,
            export_mode,
            catalog_path,
            store_timeout,
            port,
            rust_log,
        }
    }
}

/// Storage deadline in whole seconds; zero would fail every call.
fn parse_timeout_secs(raw: &str) -> Result<Duration, String> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err("timeout must be greater than zero".to_string()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(format!("invalid timeout '{}': {}", raw, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_names_case_insensitively() {
        assert_eq!("Postgres".parse::<StorageBackend>(), Ok(StorageBackend::Postgres));
        assert_eq!("memory".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("firestore".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn parses_export_modes() {
        assert_eq!("BLOB".parse::<ExportMode>(), Ok(ExportMode::Blob));
        assert_eq!("rendered".parse::<ExportMode>(), Ok(ExportMode::Rendered));
        assert!("csv".parse::<ExportMode>().is_err());
    }

    #[test]
    fn store_timeout_must_be_positive_seconds() {
        assert_eq!(parse_timeout_secs("7"), Ok(Duration::from_secs(7)));
        assert!(parse_timeout_secs("0").is_err());
        assert!(parse_timeout_secs("abc").is_err());
        assert!(parse_timeout_secs("-1").is_err());
    }
}
