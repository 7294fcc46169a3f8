pub mod archive;
pub mod extract;
pub mod features;

pub use archive::{load_gtfs, GtfsArchive, TableColumns};
pub use extract::{
    extract_gtfs_bounding_box, extract_gtfs_calendar_range, is_readable, read_dataset,
    REMEDIATION_CONTACT,
};
pub use features::{detect_features, has_recent_service_date};
