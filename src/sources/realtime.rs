use serde::{Deserialize, Serialize};

use crate::domain::naming::{create_filename, JSON_EXTENSION, UNKNOWN};
use crate::domain::source::{deserialize_source_id, deserialize_source_ids};
use crate::domain::{AuthenticationType, BoundingBoxFilter, DataType, SourceUrls, Status};
use crate::errors::CatalogResult;
use crate::sources::schedule::GtfsScheduleSource;
use crate::sources::traits::{BuildContext, CatalogEntity, ScheduleLookup, Source};

/// A GTFS Realtime feed. Location queries defer to the schedule sources it
/// references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GtfsRealtimeSource {
    #[serde(deserialize_with = "deserialize_source_id")]
    pub mdb_source_id: u64,
    pub data_type: DataType,
    pub entity_type: Vec<String>,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_source_ids",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub static_reference: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub urls: SourceUrls,
    #[serde(skip)]
    filename: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewRealtimeSource {
    pub entity_type: Vec<String>,
    pub provider: String,
    pub direct_download_url: String,
    pub name: Option<String>,
    pub static_reference: Vec<u64>,
    pub note: Option<String>,
    pub authentication_type: Option<AuthenticationType>,
    pub authentication_info_url: Option<String>,
    pub api_key_parameter_name: Option<String>,
    pub license_url: Option<String>,
    pub features: Option<Vec<String>>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default)]
pub struct RealtimeSourceUpdate {
    pub entity_type: Option<Vec<String>>,
    pub provider: Option<String>,
    pub name: Option<String>,
    pub static_reference: Option<Vec<u64>>,
    pub note: Option<String>,
    pub direct_download_url: Option<String>,
    pub authentication_type: Option<AuthenticationType>,
    pub authentication_info_url: Option<String>,
    pub api_key_parameter_name: Option<String>,
    pub license_url: Option<String>,
    pub features: Option<Vec<String>>,
    pub status: Option<Status>,
}

/// Referenced schedule sources that exist, in reference order
fn resolve<'a>(references: &[u64], statics: &'a dyn ScheduleLookup) -> Vec<&'a GtfsScheduleSource> {
    references
        .iter()
        .filter_map(|id| statics.get_schedule_source(*id))
        .collect()
}

impl GtfsRealtimeSource {
    pub fn static_sources<'a>(&self, statics: &'a dyn ScheduleLookup) -> Vec<&'a GtfsScheduleSource> {
        resolve(&self.static_reference, statics)
    }

    fn has_own_feature(&self, feature: &str) -> bool {
        self.features
            .as_ref()
            .is_some_and(|features| features.iter().any(|f| f == feature))
    }
}

impl Source for GtfsRealtimeSource {
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

    fn has_subdivision_name(&self, subdivision_name: &str, statics: &dyn ScheduleLookup) -> bool {
        self.static_sources(statics)
            .iter()
            .any(|source| source.has_subdivision_name(subdivision_name, statics))
    }

    fn has_country_code(&self, country_code: &str, statics: &dyn ScheduleLookup) -> bool {
        self.static_sources(statics)
            .iter()
            .any(|source| source.has_country_code(country_code, statics))
    }

    fn has_feature(&self, feature: &str, statics: &dyn ScheduleLookup) -> bool {
        self.has_own_feature(feature)
            || self
                .static_sources(statics)
                .iter()
                .any(|source| source.has_own_feature(feature))
    }

    fn is_overlapping_bounding_box(
        &self,
        filter: &BoundingBoxFilter,
        statics: &dyn ScheduleLookup,
    ) -> bool {
        self.static_sources(statics)
            .iter()
            .any(|source| source.location.bounding_box.overlaps(filter))
    }
}

impl CatalogEntity for GtfsRealtimeSource {
    type Draft = NewRealtimeSource;
    type Changes = RealtimeSourceUpdate;

    const DATA_TYPE: DataType = DataType::GtfsRt;

    fn build(
        mdb_source_id: u64,
        draft: NewRealtimeSource,
        context: &BuildContext<'_>,
    ) -> CatalogResult<Self> {
        let resolved = match context.statics {
            Some(statics) => resolve(&draft.static_reference, statics),
            None => Vec::new(),
        };
        if resolved.len() < draft.static_reference.len() {
            tracing::warn!(
                mdb_source_id,
                references = ?draft.static_reference,
                "Some static references do not match a schedule source"
            );
        }

        let (country_code, subdivision_name) = match resolved.first() {
            Some(source) => (
                source.location.country_code.clone(),
                source
                    .location
                    .subdivision_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            ),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
        };
        let filename_provider = draft.name.as_deref().unwrap_or(&draft.provider);
        let filename_data_type = std::iter::once(Self::DATA_TYPE.as_str())
            .chain(draft.entity_type.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("-");
        let filename = create_filename(
            &country_code,
            &subdivision_name,
            filename_provider,
            &filename_data_type,
            &mdb_source_id.to_string(),
            JSON_EXTENSION,
        );

        Ok(Self {
            mdb_source_id,
            data_type: Self::DATA_TYPE,
            entity_type: draft.entity_type,
            provider: draft.provider,
            name: draft.name,
            static_reference: draft.static_reference,
            note: draft.note,
            features: draft.features,
            status: draft.status,
            urls: SourceUrls {
                authentication_type: draft.authentication_type,
                authentication_info: draft.authentication_info_url,
                api_key_parameter_name: draft.api_key_parameter_name,
                license: draft.license_url,
                ..SourceUrls::new(draft.direct_download_url)
            },
            filename,
        })
    }

    fn update(
        &mut self,
        changes: RealtimeSourceUpdate,
        _context: &BuildContext<'_>,
    ) -> CatalogResult<()> {
        if let Some(entity_type) = changes.entity_type {
            self.entity_type = entity_type;
        }
        if let Some(provider) = changes.provider {
            self.provider = provider;
        }
        if let Some(name) = changes.name {
            self.name = Some(name);
        }
        if let Some(static_reference) = changes.static_reference {
            self.static_reference = static_reference;
        }
        if let Some(note) = changes.note {
            self.note = Some(note);
        }
        if let Some(direct_download_url) = changes.direct_download_url {
            self.urls.direct_download = direct_download_url;
        }
        if let Some(authentication_type) = changes.authentication_type {
            self.urls.authentication_type = Some(authentication_type);
        }
        if let Some(authentication_info_url) = changes.authentication_info_url {
            self.urls.authentication_info = Some(authentication_info_url);
        }
        if let Some(api_key_parameter_name) = changes.api_key_parameter_name {
            self.urls.api_key_parameter_name = Some(api_key_parameter_name);
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

        Ok(())
    }

    fn attach_filename(&mut self, filename: String) {
        self.filename = filename;
    }
}
