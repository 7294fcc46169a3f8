mod source_repository;
mod storage;

pub use source_repository::JsonSourceRepository;
pub use storage::JsonCatalogStorage;
