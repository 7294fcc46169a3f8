use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::{BoundingBoxFilter, DataTypeFilter, Status};
use crate::errors::CatalogResult;
use crate::services::dataset_service::DatasetInspector;
use crate::services::sources_catalog::{SourceQueries, SourcesCatalog, UpdateOutcome};
use crate::sources::realtime::{GtfsRealtimeSource, NewRealtimeSource, RealtimeSourceUpdate};
use crate::sources::schedule::{GtfsScheduleSource, NewScheduleSource, ScheduleSourceUpdate};
use crate::sources::traits::BuildContext;
use crate::storage::traits::SourceRepository;

/// The schedule and realtime catalogs, queried together or by data type
pub struct CatalogRegistry<R: SourceRepository> {
    schedule: SourcesCatalog<GtfsScheduleSource, R>,
    realtime: SourcesCatalog<GtfsRealtimeSource, R>,
}

impl<R: SourceRepository> CatalogRegistry<R> {
    pub fn new(
        schedule: SourcesCatalog<GtfsScheduleSource, R>,
        realtime: SourcesCatalog<GtfsRealtimeSource, R>,
    ) -> Self {
        Self { schedule, realtime }
    }

    pub fn open(schedule_repository: R, realtime_repository: R) -> CatalogResult<Self> {
        Ok(Self::new(
            SourcesCatalog::open(schedule_repository)?,
            SourcesCatalog::open(realtime_repository)?,
        ))
    }

    pub fn schedule(&self) -> &SourcesCatalog<GtfsScheduleSource, R> {
        &self.schedule
    }

    pub fn realtime(&self) -> &SourcesCatalog<GtfsRealtimeSource, R> {
        &self.realtime
    }

    fn catalogs(&self, data_type: DataTypeFilter) -> Vec<&dyn SourceQueries> {
        let catalogs: [&dyn SourceQueries; 2] = [&self.schedule, &self.realtime];
        catalogs
            .into_iter()
            .filter(|catalog| data_type.includes(catalog.data_type()))
            .collect()
    }

    /// Run `query` on every selected catalog and merge the results by id
    fn collect<F>(&self, data_type: DataTypeFilter, query: F) -> CatalogResult<BTreeMap<u64, Value>>
    where
        F: Fn(&dyn SourceQueries) -> CatalogResult<BTreeMap<u64, Value>>,
    {
        let mut sources = BTreeMap::new();
        for catalog in self.catalogs(data_type) {
            sources.extend(query(catalog)?);
        }
        Ok(sources)
    }

    pub fn get_sources(&self, data_type: DataTypeFilter) -> CatalogResult<BTreeMap<u64, Value>> {
        self.collect(data_type, |catalog| catalog.get_sources())
    }

    pub fn get_sources_by_bounding_box(
        &self,
        filter: &BoundingBoxFilter,
        data_type: DataTypeFilter,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.collect(data_type, |catalog| {
            catalog.get_sources_by_bounding_box(filter, &self.schedule)
        })
    }

    pub fn get_sources_by_subdivision_name(
        &self,
        subdivision_name: &str,
        data_type: DataTypeFilter,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.collect(data_type, |catalog| {
            catalog.get_sources_by_subdivision_name(subdivision_name, &self.schedule)
        })
    }

    pub fn get_sources_by_country_code(
        &self,
        country_code: &str,
        data_type: DataTypeFilter,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.collect(data_type, |catalog| {
            catalog.get_sources_by_country_code(country_code, &self.schedule)
        })
    }

    pub fn get_sources_by_feature(
        &self,
        feature: &str,
        data_type: DataTypeFilter,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.collect(data_type, |catalog| {
            catalog.get_sources_by_feature(feature, &self.schedule)
        })
    }

    pub fn get_sources_by_status(
        &self,
        status: Status,
        data_type: DataTypeFilter,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.collect(data_type, |catalog| catalog.get_sources_by_status(status))
    }

    pub fn get_latest_datasets(&self, data_type: DataTypeFilter) -> BTreeMap<u64, String> {
        self.catalogs(data_type)
            .into_iter()
            .flat_map(|catalog| catalog.get_latest_datasets())
            .collect()
    }

    pub fn add_schedule_source(
        &mut self,
        draft: NewScheduleSource,
        inspector: &dyn DatasetInspector,
    ) -> CatalogResult<&GtfsScheduleSource> {
        let context = BuildContext {
            inspector,
            statics: None,
        };
        self.schedule.add(draft, &context)
    }

    pub fn update_schedule_source(
        &mut self,
        mdb_source_id: u64,
        changes: ScheduleSourceUpdate,
        inspector: &dyn DatasetInspector,
    ) -> CatalogResult<UpdateOutcome> {
        let context = BuildContext {
            inspector,
            statics: None,
        };
        self.schedule.update(mdb_source_id, changes, &context)
    }

    pub fn add_realtime_source(
        &mut self,
        draft: NewRealtimeSource,
        inspector: &dyn DatasetInspector,
    ) -> CatalogResult<&GtfsRealtimeSource> {
        let context = BuildContext {
            inspector,
            statics: Some(&self.schedule),
        };
        self.realtime.add(draft, &context)
    }

    pub fn update_realtime_source(
        &mut self,
        mdb_source_id: u64,
        changes: RealtimeSourceUpdate,
        inspector: &dyn DatasetInspector,
    ) -> CatalogResult<UpdateOutcome> {
        let context = BuildContext {
            inspector,
            statics: Some(&self.schedule),
        };
        self.realtime.update(mdb_source_id, changes, &context)
    }
}
