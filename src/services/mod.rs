pub mod catalog_service;
pub mod dataset_service;
pub mod refresh_service;
pub mod sources_catalog;

pub use catalog_service::CatalogService;
pub use dataset_service::{DatasetInspector, DatasetService, DatasetSummary, FeatureReport};
pub use refresh_service::{RefreshReport, RefreshService};
pub use sources_catalog::{SourceQueries, SourcesCatalog, UpdateOutcome};
