use serde::Serialize;

use crate::domain::{DataType, DataTypeFilter, Status};
use crate::errors::CatalogResult;
use crate::services::catalog_service::CatalogService;
use crate::services::dataset_service::{DatasetInspector, FeatureReport};
use crate::services::sources_catalog::UpdateOutcome;
use crate::sources::ScheduleSourceUpdate;
use crate::storage::traits::SourceRepository;

/// Metadata derived for one source during a refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshedSource {
    pub mdb_source_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl RefreshedSource {
    fn from_report(mdb_source_id: u64, report: FeatureReport) -> Self {
        Self {
            mdb_source_id,
            features: (!report.features.is_empty()).then_some(report.features),
            status: (!report.has_recent_service).then_some(Status::Inactive),
        }
    }

    fn has_changes(&self) -> bool {
        self.features.is_some() || self.status.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshFailure {
    pub mdb_source_id: u64,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub dry_run: bool,
    pub refreshed: Vec<RefreshedSource>,
    pub unchanged: Vec<u64>,
    pub failed: Vec<RefreshFailure>,
}

/// Re-derives feature tags and status of schedule sources from their latest dataset
pub struct RefreshService<'a, R: SourceRepository, I: DatasetInspector> {
    catalog: &'a mut CatalogService<R, I>,
}

impl<'a, R: SourceRepository, I: DatasetInspector> RefreshService<'a, R, I> {
    pub fn new(catalog: &'a mut CatalogService<R, I>) -> Self {
        Self { catalog }
    }

    /// Refresh every schedule source with a latest dataset.
    /// A failing source is logged and recorded; the run continues.
    pub fn refresh_all(&mut self, dry_run: bool) -> CatalogResult<RefreshReport> {
        let latest = self
            .catalog
            .get_latest_datasets(DataTypeFilter::Only(DataType::Gtfs));
        let mut report = RefreshReport {
            dry_run,
            ..Default::default()
        };

        tracing::info!(count = latest.len(), dry_run, "Refreshing schedule sources");

        for (mdb_source_id, url) in latest {
            match self.refresh_one(mdb_source_id, &url, dry_run) {
                Ok(Some(refreshed)) => report.refreshed.push(refreshed),
                Ok(None) => report.unchanged.push(mdb_source_id),
                Err(e) => {
                    tracing::error!(mdb_source_id, error = %e, "Failed to refresh source");
                    report.failed.push(RefreshFailure {
                        mdb_source_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            refreshed = report.refreshed.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            "Refresh complete"
        );
        Ok(report)
    }

    fn refresh_one(
        &mut self,
        mdb_source_id: u64,
        url: &str,
        dry_run: bool,
    ) -> CatalogResult<Option<RefreshedSource>> {
        let features = self.catalog.inspector().inspect_features(url)?;
        let refreshed = RefreshedSource::from_report(mdb_source_id, features);

        if !refreshed.has_changes() {
            tracing::debug!(mdb_source_id, "Nothing to refresh");
            return Ok(None);
        }
        if dry_run {
            tracing::info!(mdb_source_id, "[DRY RUN] Would update source");
            return Ok(Some(refreshed));
        }

        let outcome = self.catalog.update_gtfs_schedule_source(
            mdb_source_id,
            ScheduleSourceUpdate {
                features: refreshed.features.clone(),
                status: refreshed.status,
                ..Default::default()
            },
        )?;
        Ok((outcome == UpdateOutcome::Updated).then_some(refreshed))
    }
}
