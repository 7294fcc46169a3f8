use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Source errors
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Source {0} already exists in the catalog")]
    DuplicateSourceId(u64),

    #[error("Malformed catalog entry {filename}: {reason}")]
    MalformedEntry { filename: String, reason: String },

    // Dataset errors
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Unreadable dataset: {0}")]
    UnreadableDataset(String),

    #[error("Invalid GTFS dataset: {0}")]
    InvalidGtfs(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
