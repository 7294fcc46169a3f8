use serde_json::Value;

use crate::errors::CatalogResult;

/// One catalog file as read from disk
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntity {
    pub filename: String,
    pub json: Value,
}

#[cfg_attr(test, mockall::automock)]
pub trait SourceRepository: Send + Sync {
    /// Every entity of this repository's data type
    fn load_all(&self) -> CatalogResult<Vec<StoredEntity>>;

    /// Create or overwrite the entity file `filename`
    fn save(&self, filename: &str, json: &Value) -> CatalogResult<()>;

    /// Number of files across the whole catalog, all data types included
    fn count_entities(&self) -> CatalogResult<usize>;
}
