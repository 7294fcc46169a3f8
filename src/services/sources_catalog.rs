use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::{BoundingBoxFilter, DataType, Status};
use crate::errors::{CatalogError, CatalogResult};
use crate::sources::schedule::GtfsScheduleSource;
use crate::sources::traits::{BuildContext, CatalogEntity, ScheduleLookup, Source};
use crate::storage::traits::SourceRepository;

/// Result of an update request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
}

/// In-memory catalog of one source type, backed by its repository
pub struct SourcesCatalog<S: CatalogEntity, R: SourceRepository> {
    repository: R,
    sources: BTreeMap<u64, S>,
}

impl<S: CatalogEntity, R: SourceRepository> SourcesCatalog<S, R> {
    /// Load every entity of the repository
    pub fn open(repository: R) -> CatalogResult<Self> {
        let mut sources = BTreeMap::new();

        for stored in repository.load_all()? {
            let mut entity: S =
                serde_json::from_value(stored.json).map_err(|e| CatalogError::MalformedEntry {
                    filename: stored.filename.clone(),
                    reason: e.to_string(),
                })?;
            if entity.data_type() != S::DATA_TYPE {
                return Err(CatalogError::MalformedEntry {
                    filename: stored.filename,
                    reason: format!(
                        "expected data type {}, found {}",
                        S::DATA_TYPE,
                        entity.data_type()
                    ),
                });
            }
            entity.attach_filename(stored.filename);
            sources.insert(entity.mdb_source_id(), entity);
        }

        tracing::debug!(data_type = %S::DATA_TYPE, count = sources.len(), "Loaded catalog");
        Ok(Self {
            repository,
            sources,
        })
    }

    pub fn get_source(&self, mdb_source_id: u64) -> Option<&S> {
        self.sources.get(&mdb_source_id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// JSON of every entity matching `predicate`, keyed by id
    pub fn select<F>(&self, predicate: F) -> CatalogResult<BTreeMap<u64, Value>>
    where
        F: Fn(&S) -> bool,
    {
        self.sources
            .iter()
            .filter(|(_, source)| predicate(source))
            .map(|(id, source)| -> CatalogResult<(u64, Value)> { Ok((*id, source.as_json()?)) })
            .collect()
    }

    /// Assign the next id, build the entity and persist it
    pub fn add(&mut self, draft: S::Draft, context: &BuildContext<'_>) -> CatalogResult<&S> {
        let mdb_source_id = self.repository.count_entities()? as u64 + 1;
        if self.sources.contains_key(&mdb_source_id) {
            return Err(CatalogError::DuplicateSourceId(mdb_source_id));
        }

        let entity = S::build(mdb_source_id, draft, context)?;
        self.repository.save(entity.filename(), &entity.as_json()?)?;
        tracing::info!(
            mdb_source_id,
            filename = entity.filename(),
            "Added {} source",
            S::DATA_TYPE
        );

        Ok(self.sources.entry(mdb_source_id).or_insert(entity))
    }

    /// Merge `changes` into a copy of the entity; committed only if every step succeeds
    pub fn update(
        &mut self,
        mdb_source_id: u64,
        changes: S::Changes,
        context: &BuildContext<'_>,
    ) -> CatalogResult<UpdateOutcome> {
        let Some(current) = self.sources.get(&mdb_source_id) else {
            tracing::warn!(mdb_source_id, "No {} source to update", S::DATA_TYPE);
            return Ok(UpdateOutcome::NotFound);
        };

        let mut updated = current.clone();
        updated.update(changes, context)?;
        self.repository.save(updated.filename(), &updated.as_json()?)?;
        self.sources.insert(mdb_source_id, updated);
        tracing::info!(mdb_source_id, "Updated {} source", S::DATA_TYPE);

        Ok(UpdateOutcome::Updated)
    }
}

impl<R: SourceRepository> ScheduleLookup for SourcesCatalog<GtfsScheduleSource, R> {
    fn get_schedule_source(&self, mdb_source_id: u64) -> Option<&GtfsScheduleSource> {
        self.get_source(mdb_source_id)
    }
}

/// Object-safe query surface of a catalog, used to dispatch by data type
pub trait SourceQueries {
    fn data_type(&self) -> DataType;

    fn get_sources(&self) -> CatalogResult<BTreeMap<u64, Value>>;

    fn get_sources_by_bounding_box(
        &self,
        filter: &BoundingBoxFilter,
        statics: &dyn ScheduleLookup,
    ) -> CatalogResult<BTreeMap<u64, Value>>;

    fn get_sources_by_subdivision_name(
        &self,
        subdivision_name: &str,
        statics: &dyn ScheduleLookup,
    ) -> CatalogResult<BTreeMap<u64, Value>>;

    fn get_sources_by_country_code(
        &self,
        country_code: &str,
        statics: &dyn ScheduleLookup,
    ) -> CatalogResult<BTreeMap<u64, Value>>;

    fn get_sources_by_feature(
        &self,
        feature: &str,
        statics: &dyn ScheduleLookup,
    ) -> CatalogResult<BTreeMap<u64, Value>>;

    fn get_sources_by_status(&self, status: Status) -> CatalogResult<BTreeMap<u64, Value>>;

    fn get_latest_datasets(&self) -> BTreeMap<u64, String>;
}

impl<S: CatalogEntity, R: SourceRepository> SourceQueries for SourcesCatalog<S, R> {
    fn data_type(&self) -> DataType {
        S::DATA_TYPE
    }

    fn get_sources(&self) -> CatalogResult<BTreeMap<u64, Value>> {
        self.select(|_| true)
    }

    fn get_sources_by_bounding_box(
        &self,
        filter: &BoundingBoxFilter,
        statics: &dyn ScheduleLookup,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.select(|source| source.is_overlapping_bounding_box(filter, statics))
    }

    fn get_sources_by_subdivision_name(
        &self,
        subdivision_name: &str,
        statics: &dyn ScheduleLookup,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.select(|source| source.has_subdivision_name(subdivision_name, statics))
    }

    fn get_sources_by_country_code(
        &self,
        country_code: &str,
        statics: &dyn ScheduleLookup,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.select(|source| source.has_country_code(country_code, statics))
    }

    fn get_sources_by_feature(
        &self,
        feature: &str,
        statics: &dyn ScheduleLookup,
    ) -> CatalogResult<BTreeMap<u64, Value>> {
        self.select(|source| source.has_feature(feature, statics))
    }

    fn get_sources_by_status(&self, status: Status) -> CatalogResult<BTreeMap<u64, Value>> {
        self.select(|source| source.has_status(status))
    }

    fn get_latest_datasets(&self) -> BTreeMap<u64, String> {
        self.sources
            .iter()
            .filter_map(|(id, source)| source.latest_url().map(|url| (*id, url.to_string())))
            .collect()
    }
}
