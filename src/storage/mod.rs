pub mod json;
pub mod traits;

pub use json::{JsonCatalogStorage, JsonSourceRepository};
pub use traits::{SourceRepository, StoredEntity};
