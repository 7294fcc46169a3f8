use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{BoundingBoxFilter, DataType, Status};
use crate::errors::CatalogResult;
use crate::services::dataset_service::DatasetInspector;
use crate::sources::schedule::GtfsScheduleSource;

/// Resolves static references of realtime sources
pub trait ScheduleLookup {
    fn get_schedule_source(&self, mdb_source_id: u64) -> Option<&GtfsScheduleSource>;
}

impl ScheduleLookup for BTreeMap<u64, GtfsScheduleSource> {
    fn get_schedule_source(&self, mdb_source_id: u64) -> Option<&GtfsScheduleSource> {
        self.get(&mdb_source_id)
    }
}

/// Collaborators an entity needs while being built or updated
pub struct BuildContext<'a> {
    pub inspector: &'a dyn DatasetInspector,
    /// Schedule catalog, for entities that reference schedule sources
    pub statics: Option<&'a dyn ScheduleLookup>,
}

/// Query capabilities shared by every source type
pub trait Source {
    fn mdb_source_id(&self) -> u64;

    fn data_type(&self) -> DataType;

    fn provider(&self) -> &str;

    /// File name of the catalog entry. Stable once assigned.
    fn filename(&self) -> &str;

    fn status(&self) -> Option<Status>;

    /// Absent status counts as active
    fn has_status(&self, status: Status) -> bool {
        self.status().unwrap_or_default() == status
    }

    fn has_subdivision_name(&self, subdivision_name: &str, statics: &dyn ScheduleLookup) -> bool;

    fn has_country_code(&self, country_code: &str, statics: &dyn ScheduleLookup) -> bool;

    fn has_feature(&self, feature: &str, statics: &dyn ScheduleLookup) -> bool;

    fn is_overlapping_bounding_box(
        &self,
        filter: &BoundingBoxFilter,
        statics: &dyn ScheduleLookup,
    ) -> bool;

    fn latest_url(&self) -> Option<&str> {
        None
    }

    fn has_latest_dataset(&self) -> bool {
        self.latest_url().is_some()
    }
}

/// A source type stored in its own catalog directory
pub trait CatalogEntity: Source + Serialize + DeserializeOwned + Clone {
    /// Caller-supplied fields of a new source
    type Draft;
    /// Caller-supplied fields of an update; `None` leaves a field untouched
    type Changes;

    const DATA_TYPE: DataType;

    fn build(
        mdb_source_id: u64,
        draft: Self::Draft,
        context: &BuildContext<'_>,
    ) -> CatalogResult<Self>;

    fn update(&mut self, changes: Self::Changes, context: &BuildContext<'_>) -> CatalogResult<()>;

    /// Set the file name of an entity read back from the catalog
    fn attach_filename(&mut self, filename: String);

    fn as_json(&self) -> CatalogResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
