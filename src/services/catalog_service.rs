use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::{BoundingBoxFilter, DataTypeFilter, Status};
use crate::errors::CatalogResult;
use crate::services::dataset_service::DatasetInspector;
use crate::services::sources_catalog::UpdateOutcome;
use crate::sources::{
    CatalogRegistry, GtfsRealtimeSource, GtfsScheduleSource, NewRealtimeSource,
    NewScheduleSource, RealtimeSourceUpdate, ScheduleSourceUpdate,
};
use crate::storage::traits::SourceRepository;

/// Entry point for every catalog operation
pub struct CatalogService<R: SourceRepository, I: DatasetInspector> {
    registry: CatalogRegistry<R>,
    inspector: I,
}

impl<R: SourceRepository, I: DatasetInspector> CatalogService<R, I> {
    pub fn new(registry: CatalogRegistry<R>, inspector: I) -> Self {
        Self {
            registry,
            inspector,
        }
    }

    pub fn inspector(&self) -> &I {
        &self.inspector
    }

    /// Add a schedule source; its dataset is downloaded to derive the bounding box
    pub fn add_gtfs_schedule_source(
        &mut self,
        draft: NewScheduleSource,
    ) -> CatalogResult<&GtfsScheduleSource> {
        self.registry.add_schedule_source(draft, &self.inspector)
    }

    pub fn update_gtfs_schedule_source(
        &mut self,
        mdb_source_id: u64,
        changes: ScheduleSourceUpdate,
    ) -> CatalogResult<UpdateOutcome> {
        self.registry
            .update_schedule_source(mdb_source_id, changes, &self.inspector)
    }

    pub fn add_gtfs_realtime_source(
        &mut self,
        draft: NewRealtimeSource,
    ) -> CatalogResult<&GtfsRealtimeSource> {
        self.registry.add_realtime_source(draft, &self.inspector)
    }

    pub fn update_gtfs_realtime_source(
        &mut self,
        mdb_source_id: u64,
        changes: RealtimeSourceUpdate,
    ) -> CatalogResult<UpdateOutcome> {
        self.registry
            .update_realtime_source(mdb_source_id, changes, &self.inspector)
    }

    pub fn get_sources(&self, data_type: DataTypeFilter) -> CatalogResult<BTreeMap<u64, Value>> {
        self.registry.get_sources(data_type)
    }

    pub fn get_sources_by_bounding_box(
        &self,
        filter: &BoundingBoxFilter,
        data_type: DataTypeFilter,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.registry.get_sources_by_bounding_box(filter, data_type)
    }

    pub fn get_sources_by_subdivision_name(
        &self,
        subdivision_name: &str,
        data_type: DataTypeFilter,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.registry
            .get_sources_by_subdivision_name(subdivision_name, data_type)
    }

    pub fn get_sources_by_country_code(
        &self,
        country_code: &str,
        data_type: DataTypeFilter,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.registry
            .get_sources_by_country_code(country_code, data_type)
    }

    pub fn get_sources_by_feature(
        &self,
        feature: &str,
        data_type: DataTypeFilter,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.registry.get_sources_by_feature(feature, data_type)
    }

    pub fn get_sources_by_status(
        &self,
        status: Status,
        data_type: DataTypeFilter,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.registry.get_sources_by_status(status, data_type)
    }

    /// Latest dataset URL of every source that has one, keyed by id
    pub fn get_latest_datasets(&self, data_type: DataTypeFilter) -> BTreeMap<u64, String> {
        self.registry.get_latest_datasets(data_type)
    }
}
