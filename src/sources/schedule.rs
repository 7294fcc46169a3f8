use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::naming::{create_filename, create_latest_url, JSON_EXTENSION, UNKNOWN};
use crate::domain::source::deserialize_source_id;
use crate::domain::{
    AuthenticationType, BoundingBox, BoundingBoxFilter, DataType, Location, Redirect,
    RedirectInput, SourceUrls, Status,
};
use crate::errors::CatalogResult;
use crate::http::DatasetAuth;
use crate::services::dataset_service::DatasetRequest;
use crate::sources::traits::{BuildContext, CatalogEntity, ScheduleLookup, Source};

/// A GTFS Schedule feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GtfsScheduleSource {
    #[serde(deserialize_with = "deserialize_source_id")]
    pub mdb_source_id: u64,
    pub data_type: DataType,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub location: Location,
    pub urls: SourceUrls,
    #[serde(default, rename = "redirect", skip_serializing_if = "Option::is_none")]
    pub redirects: Option<Vec<Redirect>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_calendar_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_calendar_end: Option<NaiveDate>,
    #[serde(skip)]
    filename: String,
}

/// Fields of a schedule source being added
#[derive(Debug, Clone, Default)]
pub struct NewScheduleSource {
    pub provider: String,
    pub country_code: String,
    pub direct_download_url: String,
    pub subdivision_name: Option<String>,
    pub municipality: Option<String>,
    pub name: Option<String>,
    pub authentication_type: Option<AuthenticationType>,
    pub authentication_info_url: Option<String>,
    pub api_key_parameter_name: Option<String>,
    pub api_key_parameter_value: Option<String>,
    pub license_url: Option<String>,
    pub features: Option<Vec<String>>,
    pub status: Option<Status>,
    pub feed_contact_email: Option<String>,
    pub redirects: Vec<RedirectInput>,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleSourceUpdate {
    pub provider: Option<String>,
    pub name: Option<String>,
    pub country_code: Option<String>,
    pub subdivision_name: Option<String>,
    pub municipality: Option<String>,
    pub direct_download_url: Option<String>,
    pub authentication_type: Option<AuthenticationType>,
    pub authentication_info_url: Option<String>,
    pub api_key_parameter_name: Option<String>,
    pub api_key_parameter_value: Option<String>,
    pub license_url: Option<String>,
    pub features: Option<Vec<String>>,
    pub status: Option<Status>,
    pub feed_contact_email: Option<String>,
    pub redirects: Option<Vec<RedirectInput>>,
}

impl Source for GtfsScheduleSource {
    fn mdb_source_id(&self) -> u64 {
        self.mdb_source_id
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn provider(&self) -> &str {
        &self.provider
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn status(&self) -> Option<Status> {
        self.status
    }

    fn has_subdivision_name(&self, subdivision_name: &str, _statics: &dyn ScheduleLookup) -> bool {
        self.location.subdivision_name.as_deref() == Some(subdivision_name)
    }

    fn has_country_code(&self, country_code: &str, _statics: &dyn ScheduleLookup) -> bool {
        self.location.country_code == country_code
    }

    fn has_feature(&self, feature: &str, _statics: &dyn ScheduleLookup) -> bool {
        self.has_own_feature(feature)
    }

    fn is_overlapping_bounding_box(
        &self,
        filter: &BoundingBoxFilter,
        _statics: &dyn ScheduleLookup,
    ) -> bool {
        self.location.bounding_box.overlaps(filter)
    }

    fn latest_url(&self) -> Option<&str> {
        self.urls.latest.as_deref()
    }
}

impl GtfsScheduleSource {
    pub fn has_own_feature(&self, feature: &str) -> bool {
        self.features
            .as_ref()
            .is_some_and(|features| features.iter().any(|f| f == feature))
    }
}

impl CatalogEntity for GtfsScheduleSource {
    type Draft = NewScheduleSource;
    type Changes = ScheduleSourceUpdate;

    const DATA_TYPE: DataType = DataType::Gtfs;

    fn build(
        mdb_source_id: u64,
        draft: NewScheduleSource,
        context: &BuildContext<'_>,
    ) -> CatalogResult<Self> {
        let summary = context.inspector.inspect(&DatasetRequest {
            url: draft.direct_download_url.clone(),
            auth: DatasetAuth::new(
                draft.authentication_type,
                draft.api_key_parameter_name.clone(),
                draft.api_key_parameter_value.clone(),
            ),
        })?;

        let subdivision_name = draft.subdivision_name.as_deref().unwrap_or(UNKNOWN);
        let id = mdb_source_id.to_string();
        let data_type = Self::DATA_TYPE.as_str();
        let filename = create_filename(
            &draft.country_code,
            subdivision_name,
            &draft.provider,
            data_type,
            &id,
            JSON_EXTENSION,
        );
        let latest = create_latest_url(
            &draft.country_code,
            subdivision_name,
            &draft.provider,
            data_type,
            &id,
        );

        let redirects = Redirect::from_inputs(draft.redirects);

        Ok(Self {
            mdb_source_id,
            data_type: Self::DATA_TYPE,
            provider: draft.provider,
            name: draft.name,
            feed_contact_email: draft.feed_contact_email,
            features: draft.features,
            status: draft.status,
            location: Location {
                country_code: draft.country_code,
                subdivision_name: draft.subdivision_name,
                municipality: draft.municipality,
                bounding_box: BoundingBox::from_extent(summary.extent, summary.extracted_on),
            },
            urls: SourceUrls {
                direct_download: draft.direct_download_url,
                authentication_type: draft.authentication_type,
                authentication_info: draft.authentication_info_url,
                api_key_parameter_name: draft.api_key_parameter_name,
                latest: Some(latest),
                license: draft.license_url,
            },
            redirects: (!redirects.is_empty()).then_some(redirects),
            extracted_calendar_start: summary.calendar_start,
            extracted_calendar_end: summary.calendar_end,
            filename,
        })
    }

    fn update(
        &mut self,
        changes: ScheduleSourceUpdate,
        context: &BuildContext<'_>,
    ) -> CatalogResult<()> {
        // Authentication first, the dataset download below relies on it
        if let Some(authentication_type) = changes.authentication_type {
            self.urls.authentication_type = Some(authentication_type);
        }
        if let Some(authentication_info_url) = changes.authentication_info_url {
            self.urls.authentication_info = Some(authentication_info_url);
        }
        if let Some(api_key_parameter_name) = changes.api_key_parameter_name {
            self.urls.api_key_parameter_name = Some(api_key_parameter_name);
        }

        if let Some(direct_download_url) = changes.direct_download_url {
            let summary = context.inspector.inspect(&DatasetRequest {
                url: direct_download_url.clone(),
                auth: DatasetAuth::new(
                    self.urls.authentication_type,
                    self.urls.api_key_parameter_name.clone(),
                    changes.api_key_parameter_value,
                ),
            })?;
            self.urls.direct_download = direct_download_url;
            self.location.bounding_box =
                BoundingBox::from_extent(summary.extent, summary.extracted_on);
            self.extracted_calendar_start = summary.calendar_start;
            self.extracted_calendar_end = summary.calendar_end;
        }

        if let Some(provider) = changes.provider {
            self.provider = provider;
        }
        if let Some(name) = changes.name {
            self.name = Some(name);
        }
        if let Some(country_code) = changes.country_code {
            self.location.country_code = country_code;
        }
        if let Some(subdivision_name) = changes.subdivision_name {
            self.location.subdivision_name = Some(subdivision_name);
        }
        if let Some(municipality) = changes.municipality {
            self.location.municipality = Some(municipality);
        }
        if let Some(license_url) = changes.license_url {
            self.urls.license = Some(license_url);
        }
        if let Some(features) = changes.features {
            self.features = Some(features);
        }
        if let Some(status) = changes.status {
            self.status = Some(status);
        }
        if let Some(feed_contact_email) = changes.feed_contact_email {
            self.feed_contact_email = Some(feed_contact_email);
        }
        if let Some(redirects) = changes.redirects {
            self.redirects = Some(Redirect::from_inputs(redirects));
        }

        Ok(())
    }

    fn attach_filename(&mut self, filename: String) {
        self.filename = filename;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Extent;
    use crate::errors::CatalogError;
    use crate::services::dataset_service::{DatasetSummary, MockDatasetInspector};

    fn summary() -> DatasetSummary {
        DatasetSummary {
            extent: Some(Extent {
                minimum_latitude: 45.4,
                maximum_latitude: 45.7,
                minimum_longitude: -74.0,
                maximum_longitude: -73.4,
            }),
            calendar_start: NaiveDate::from_ymd_opt(2024, 1, 1),
            calendar_end: NaiveDate::from_ymd_opt(2024, 12, 31),
            extracted_on: "2024-03-01T12:00:00+00:00".to_string(),
        }
    }

    fn draft() -> NewScheduleSource {
        NewScheduleSource {
            provider: "Société de transport de Montréal".to_string(),
            country_code: "CA".to_string(),
            subdivision_name: Some("Quebec".to_string()),
            municipality: Some("Montreal".to_string()),
            direct_download_url: "https://example.com/stm.zip".to_string(),
            redirects: vec![
                RedirectInput::new("12", Some("merged".to_string())),
                RedirectInput::new("None", None),
            ],
            ..Default::default()
        }
    }

    fn build_with(inspector: &MockDatasetInspector, draft: NewScheduleSource) -> GtfsScheduleSource {
        let context = BuildContext {
            inspector,
            statics: None,
        };
        GtfsScheduleSource::build(1, draft, &context).unwrap()
    }

    #[test]
    fn test_build_derives_filename_and_latest_url() {
        let mut inspector = MockDatasetInspector::new();
        inspector
            .expect_inspect()
            .withf(|request| request.url == "https://example.com/stm.zip")
            .times(1)
            .returning(|_| Ok(summary()));

        let source = build_with(&inspector, draft());

        assert_eq!(
            source.filename(),
            "ca-quebec-societe-de-transport-de-montreal-gtfs-1.json"
        );
        assert_eq!(
            source.latest_url(),
            Some(
                "https://storage.googleapis.com/storage/v1/b/mdb-latest/o/\
                 ca-quebec-societe-de-transport-de-montreal-gtfs-1.zip?alt=media"
            )
        );
        assert_eq!(source.location.bounding_box.minimum_latitude, Some(45.4));
        assert_eq!(source.redirects.as_ref().map(Vec::len), Some(1));
        assert!(source.has_latest_dataset());
    }

    #[test]
    fn test_build_uses_unknown_subdivision_for_naming() {
        let mut inspector = MockDatasetInspector::new();
        inspector.expect_inspect().returning(|_| Ok(summary()));

        let source = build_with(
            &inspector,
            NewScheduleSource {
                subdivision_name: None,
                provider: "Exo".to_string(),
                ..draft()
            },
        );

        assert_eq!(source.filename(), "ca-unknown-exo-gtfs-1.json");
        assert!(source.location.subdivision_name.is_none());
    }

    #[test]
    fn test_build_fails_when_dataset_is_unreadable() {
        let mut inspector = MockDatasetInspector::new();
        inspector
            .expect_inspect()
            .returning(|_| Err(CatalogError::UnreadableDataset("bad zip".to_string())));

        let context = BuildContext {
            inspector: &inspector,
            statics: None,
        };
        let result = GtfsScheduleSource::build(1, draft(), &context);
        assert!(matches!(result, Err(CatalogError::UnreadableDataset(_))));
    }

    #[test]
    fn test_json_layout() {
        let mut inspector = MockDatasetInspector::new();
        inspector.expect_inspect().returning(|_| Ok(summary()));
        let source = build_with(&inspector, draft());

        let json = source.as_json().unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "mdb_source_id",
                "data_type",
                "provider",
                "location",
                "urls",
                "redirect",
                "extracted_calendar_start",
                "extracted_calendar_end",
            ]
        );
        assert_eq!(json["data_type"], "gtfs");
        assert_eq!(json["extracted_calendar_end"], "2024-12-31");
        assert_eq!(json["redirect"][0]["id"], "12");
        assert!(json["urls"].get("authentication_type").is_none());
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let mut inspector = MockDatasetInspector::new();
        inspector.expect_inspect().returning(|_| Ok(summary()));
        let source = build_with(&inspector, draft());

        let json = source.as_json().unwrap();
        let mut reloaded: GtfsScheduleSource = serde_json::from_value(json.clone()).unwrap();
        reloaded.attach_filename(source.filename().to_string());

        assert_eq!(reloaded, source);
        assert_eq!(reloaded.as_json().unwrap(), json);
    }

    #[test]
    fn test_reads_catalog_entry_with_null_bounding_box() {
        let json = serde_json::json!({
            "mdb_source_id": "40",
            "data_type": "gtfs",
            "provider": "Example Transit",
            "location": {
                "country_code": "US",
                "bounding_box": {
                    "minimum_latitude": null,
                    "maximum_latitude": null,
                    "minimum_longitude": null,
                    "maximum_longitude": null,
                    "extracted_on": null
                }
            },
            "urls": {
                "direct_download": "https://example.com/gtfs.zip",
                "authentication_type": 0,
                "latest": "https://example.com/latest.zip"
            }
        });

        let source: GtfsScheduleSource = serde_json::from_value(json).unwrap();
        assert_eq!(source.mdb_source_id, 40);
        assert_eq!(source.urls.authentication_type, Some(AuthenticationType::None));
        assert!(source.location.bounding_box.extent().is_none());
        assert!(source.has_status(Status::Active));
    }

    #[test]
    fn test_update_merges_provided_fields_only() {
        let mut inspector = MockDatasetInspector::new();
        inspector.expect_inspect().times(1).returning(|_| Ok(summary()));
        let mut source = build_with(&inspector, draft());
        let filename = source.filename().to_string();

        source
            .update(
                ScheduleSourceUpdate {
                    status: Some(Status::Deprecated),
                    features: Some(vec!["fares-v1".to_string()]),
                    redirects: Some(vec![RedirectInput::new("99", None)]),
                    ..Default::default()
                },
                &BuildContext {
                    inspector: &inspector,
                    statics: None,
                },
            )
            .unwrap();

        assert_eq!(source.status, Some(Status::Deprecated));
        assert_eq!(source.provider, "Société de transport de Montréal");
        assert!(source.has_own_feature("fares-v1"));
        assert_eq!(source.redirects.as_ref().unwrap()[0].id, "99");
        assert_eq!(source.filename(), filename);
    }

    #[test]
    fn test_update_with_new_url_reinspects_with_merged_auth() {
        let mut inspector = MockDatasetInspector::new();
        let mut seq = mockall::Sequence::new();
        inspector
            .expect_inspect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(summary()));
        inspector
            .expect_inspect()
            .withf(|request| {
                request.url == "https://example.com/new.zip"
                    && request.auth
                        == DatasetAuth::new(
                            Some(AuthenticationType::Header),
                            Some("apikey".to_string()),
                            Some("secret".to_string()),
                        )
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(DatasetSummary {
                    extent: None,
                    calendar_start: None,
                    calendar_end: None,
                    extracted_on: "2024-04-01T00:00:00+00:00".to_string(),
                })
            });

        let mut source = build_with(&inspector, draft());
        source
            .update(
                ScheduleSourceUpdate {
                    direct_download_url: Some("https://example.com/new.zip".to_string()),
                    authentication_type: Some(AuthenticationType::Header),
                    api_key_parameter_name: Some("apikey".to_string()),
                    api_key_parameter_value: Some("secret".to_string()),
                    ..Default::default()
                },
                &BuildContext {
                    inspector: &inspector,
                    statics: None,
                },
            )
            .unwrap();

        assert_eq!(source.urls.direct_download, "https://example.com/new.zip");
        assert!(source.location.bounding_box.extent().is_none());
        assert_eq!(
            source.location.bounding_box.extracted_on.as_deref(),
            Some("2024-04-01T00:00:00+00:00")
        );
        assert!(source.extracted_calendar_start.is_none());
    }
}
