use std::path::PathBuf;

use chrono::{NaiveDate, Utc};

use crate::domain::naming::get_iso_time;
use crate::domain::Extent;
use crate::errors::CatalogResult;
use crate::gtfs::{
    detect_features, extract_gtfs_bounding_box, extract_gtfs_calendar_range,
    has_recent_service_date, is_readable, load_gtfs, read_dataset,
};
use crate::http::{download_dataset, DatasetAuth, HttpClient};

/// Where and how to fetch a source's dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRequest {
    pub url: String,
    pub auth: DatasetAuth,
}

/// Metadata derived from a downloaded dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub extent: Option<Extent>,
    pub calendar_start: Option<NaiveDate>,
    pub calendar_end: Option<NaiveDate>,
    pub extracted_on: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureReport {
    pub features: Vec<String>,
    pub has_recent_service: bool,
}

#[cfg_attr(test, mockall::automock)]
pub trait DatasetInspector {
    /// Download the dataset, check it loads and extract its extent and calendar
    fn inspect(&self, request: &DatasetRequest) -> CatalogResult<DatasetSummary>;

    /// Download the dataset and report the GTFS features it uses
    fn inspect_features(&self, url: &str) -> CatalogResult<FeatureReport>;
}

pub struct DatasetService<C: HttpClient> {
    client: C,
    download_dir: PathBuf,
}

impl<C: HttpClient> DatasetService<C> {
    pub fn new(client: C, download_dir: PathBuf) -> Self {
        Self {
            client,
            download_dir,
        }
    }
}

impl<C: HttpClient> DatasetInspector for DatasetService<C> {
    fn inspect(&self, request: &DatasetRequest) -> CatalogResult<DatasetSummary> {
        let dataset =
            download_dataset(&self.client, &self.download_dir, &request.url, &request.auth)?;
        is_readable(dataset.path(), load_gtfs)?;

        let (extent, (calendar_start, calendar_end)) = read_dataset(dataset.path(), |path| {
            Ok((extract_gtfs_bounding_box(path)?, extract_gtfs_calendar_range(path)?))
        })?;
        tracing::debug!(url = %request.url, ?extent, "Extracted dataset metadata");

        Ok(DatasetSummary {
            extent,
            calendar_start,
            calendar_end,
            extracted_on: get_iso_time(),
        })
    }

    fn inspect_features(&self, url: &str) -> CatalogResult<FeatureReport> {
        let dataset = download_dataset(
            &self.client,
            &self.download_dir,
            url,
            &DatasetAuth::default(),
        )?;
        is_readable(dataset.path(), load_gtfs)?;

        let (features, has_recent_service) = read_dataset(dataset.path(), |path| {
            let mut archive = load_gtfs(path)?;
            let features = detect_features(&mut archive)?;
            let has_recent_service =
                has_recent_service_date(&mut archive, Utc::now().date_naive())?;
            Ok((features, has_recent_service))
        })?;

        Ok(FeatureReport {
            features,
            has_recent_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CatalogError;
    use crate::gtfs::REMEDIATION_CONTACT;
    use crate::gtfs::archive::test_support::{write_archive, write_archive_bytes};
    use crate::http::client::MockHttpClient;
    use tempfile::TempDir;

    fn archive_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let dir = TempDir::new().unwrap();
        let path = write_archive(dir.path(), "gtfs.zip", entries);
        std::fs::read(path).unwrap()
    }

    fn service_returning(body: Vec<u8>, download_dir: &TempDir) -> DatasetService<MockHttpClient> {
        let mut client = MockHttpClient::new();
        client.expect_get().returning(move |_| Ok(body.clone()));
        DatasetService::new(client, download_dir.path().to_path_buf())
    }

    #[test]
    fn test_inspect_extracts_metadata_and_cleans_up() {
        let download_dir = TempDir::new().unwrap();
        let body = archive_bytes(&[
            ("stops.txt", "stop_id,stop_lat,stop_lon\ns1,45.5,-73.6\ns2,45.4,-73.9\n"),
            ("calendar.txt", "service_id,start_date,end_date\nwk,20240101,20241231\n"),
        ]);
        let service = service_returning(body, &download_dir);

        let summary = service
            .inspect(&DatasetRequest {
                url: "https://example.com/gtfs.zip".to_string(),
                auth: DatasetAuth::default(),
            })
            .unwrap();

        let extent = summary.extent.unwrap();
        assert_eq!(extent.minimum_latitude, 45.4);
        assert_eq!(extent.maximum_longitude, -73.6);
        assert_eq!(summary.calendar_start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(summary.calendar_end, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert!(summary.extracted_on.ends_with("+00:00"));
        assert_eq!(std::fs::read_dir(download_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_inspect_rejects_unreadable_dataset() {
        let download_dir = TempDir::new().unwrap();
        let service = service_returning(b"<html>Not found</html>".to_vec(), &download_dir);

        let result = service.inspect(&DatasetRequest {
            url: "https://example.com/gtfs.zip".to_string(),
            auth: DatasetAuth::default(),
        });

        assert!(matches!(result, Err(CatalogError::UnreadableDataset(_))));
        assert_eq!(std::fs::read_dir(download_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_inspect_features() {
        let download_dir = TempDir::new().unwrap();
        let body = archive_bytes(&[
            ("stops.txt", "stop_id\ns1\n"),
            ("pathways.txt", "pathway_id\np1\n"),
            ("calendar.txt", "service_id,start_date,end_date\nwk,20000101,20001231\n"),
        ]);
        let service = service_returning(body, &download_dir);

        let report = service.inspect_features("https://example.com/latest.zip").unwrap();

        assert_eq!(report.features, vec!["pathways"]);
        assert!(!report.has_recent_service);
    }

    #[test]
    fn test_inspect_rejects_table_that_is_not_utf8() {
        let download_dir = TempDir::new().unwrap();
        let archive_dir = TempDir::new().unwrap();
        let path = write_archive_bytes(
            archive_dir.path(),
            "gtfs.zip",
            &[("stops.txt", b"stop_id,stop_name,stop_lat,stop_lon\ns1,Gare \xe9st,45.5,-73.6\n")],
        );
        let service = service_returning(std::fs::read(path).unwrap(), &download_dir);

        let result = service.inspect(&DatasetRequest {
            url: "https://example.com/gtfs.zip".to_string(),
            auth: DatasetAuth::default(),
        });

        match result {
            Err(CatalogError::UnreadableDataset(message)) => {
                assert!(message.contains(REMEDIATION_CONTACT))
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(std::fs::read_dir(download_dir.path()).unwrap().count(), 0);
    }
}
