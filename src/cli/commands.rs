use clap::{Args, Parser, Subcommand};

use crate::domain::{AuthenticationType, BoundingBoxFilter, DataTypeFilter, RedirectInput, Status};
use crate::sources::{
    NewRealtimeSource, NewScheduleSource, RealtimeSourceUpdate, ScheduleSourceUpdate,
};

#[derive(Parser)]
#[command(name = "mobility-catalogs")]
#[command(about = "Catalog of GTFS Schedule and GTFS Realtime sources")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a GTFS Schedule source (downloads its dataset)
    AddSchedule(AddScheduleArgs),

    /// Update fields of a GTFS Schedule source
    UpdateSchedule(UpdateScheduleArgs),

    /// Add a GTFS Realtime source
    AddRealtime(AddRealtimeArgs),

    /// Update fields of a GTFS Realtime source
    UpdateRealtime(UpdateRealtimeArgs),

    /// Print every source as JSON
    List {
        /// all, gtfs or gtfs-rt
        #[arg(long, default_value = "all")]
        data_type: DataTypeFilter,
    },

    /// Print the sources matching one criterion as JSON
    Search {
        #[command(flatten)]
        criteria: SearchCriteria,

        /// all, gtfs or gtfs-rt
        #[arg(long, default_value = "all")]
        data_type: DataTypeFilter,
    },

    /// Print the latest dataset URL of every source that has one
    Latest {
        /// all, gtfs or gtfs-rt
        #[arg(long, default_value = "all")]
        data_type: DataTypeFilter,
    },

    /// Re-derive features and status of schedule sources from their latest dataset
    Refresh {
        /// Report what would change without writing the catalog
        #[arg(long)]
        dry_run: bool,
    },
}

/// Authentication settings shared by every add/update command
#[derive(Args, Debug, Default)]
pub struct AuthArgs {
    /// 0 = none, 1 = API key as query parameter, 2 = API key as header
    #[arg(long)]
    pub authentication_type: Option<AuthenticationType>,

    /// Page where an API key can be obtained
    #[arg(long)]
    pub authentication_info_url: Option<String>,

    #[arg(long)]
    pub api_key_parameter_name: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddScheduleArgs {
    #[arg(long)]
    pub provider: String,

    /// ISO 3166-1 alpha-2 code
    #[arg(long)]
    pub country_code: String,

    #[arg(long)]
    pub direct_download_url: String,

    #[arg(long)]
    pub subdivision_name: Option<String>,

    #[arg(long)]
    pub municipality: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub auth: AuthArgs,

    /// API key used to download the dataset, never stored
    #[arg(long, env = "CATALOG_API_KEY", hide_env_values = true)]
    pub api_key_parameter_value: Option<String>,

    #[arg(long)]
    pub license_url: Option<String>,

    /// Feature tag, repeatable
    #[arg(long = "feature")]
    pub features: Vec<String>,

    #[arg(long)]
    pub status: Option<Status>,

    #[arg(long)]
    pub feed_contact_email: Option<String>,

    /// Redirect to another source, as ID or ID:COMMENT, repeatable
    #[arg(long = "redirect")]
    pub redirects: Vec<RedirectInput>,
}

impl AddScheduleArgs {
    pub fn into_draft(self) -> NewScheduleSource {
        NewScheduleSource {
            provider: self.provider,
            country_code: self.country_code,
            direct_download_url: self.direct_download_url,
            subdivision_name: self.subdivision_name,
            municipality: self.municipality,
            name: self.name,
            authentication_type: self.auth.authentication_type,
            authentication_info_url: self.auth.authentication_info_url,
            api_key_parameter_name: self.auth.api_key_parameter_name,
            api_key_parameter_value: self.api_key_parameter_value,
            license_url: self.license_url,
            features: non_empty(self.features),
            status: self.status,
            feed_contact_email: self.feed_contact_email,
            redirects: self.redirects,
        }
    }
}

#[derive(Args, Debug)]
pub struct UpdateScheduleArgs {
    pub mdb_source_id: u64,

    #[arg(long)]
    pub provider: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub country_code: Option<String>,

    #[arg(long)]
    pub subdivision_name: Option<String>,

    #[arg(long)]
    pub municipality: Option<String>,

    /// A new URL triggers a download to refresh the bounding box
    #[arg(long)]
    pub direct_download_url: Option<String>,

    #[command(flatten)]
    pub auth: AuthArgs,

    #[arg(long, env = "CATALOG_API_KEY", hide_env_values = true)]
    pub api_key_parameter_value: Option<String>,

    #[arg(long)]
    pub license_url: Option<String>,

    /// Replaces the feature list, repeatable
    #[arg(long = "feature")]
    pub features: Vec<String>,

    #[arg(long)]
    pub status: Option<Status>,

    #[arg(long)]
    pub feed_contact_email: Option<String>,

    /// Replaces the redirect list, repeatable
    #[arg(long = "redirect")]
    pub redirects: Vec<RedirectInput>,
}

impl UpdateScheduleArgs {
    pub fn into_changes(self) -> (u64, ScheduleSourceUpdate) {
        let changes = ScheduleSourceUpdate {
            provider: self.provider,
            name: self.name,
            country_code: self.country_code,
            subdivision_name: self.subdivision_name,
            municipality: self.municipality,
            direct_download_url: self.direct_download_url,
            authentication_type: self.auth.authentication_type,
            authentication_info_url: self.auth.authentication_info_url,
            api_key_parameter_name: self.auth.api_key_parameter_name,
            api_key_parameter_value: self.api_key_parameter_value,
            license_url: self.license_url,
            features: non_empty(self.features),
            status: self.status,
            feed_contact_email: self.feed_contact_email,
            redirects: non_empty(self.redirects),
        };
        (self.mdb_source_id, changes)
    }
}

#[derive(Args, Debug)]
pub struct AddRealtimeArgs {
    /// tu, vp or sa, repeatable
    #[arg(long = "entity-type", required = true)]
    pub entity_types: Vec<String>,

    #[arg(long)]
    pub provider: String,

    #[arg(long)]
    pub direct_download_url: String,

    #[arg(long)]
    pub name: Option<String>,

    /// Id of a schedule source this feed belongs to, repeatable
    #[arg(long = "static-reference")]
    pub static_references: Vec<u64>,

    #[arg(long)]
    pub note: Option<String>,

    #[command(flatten)]
    pub auth: AuthArgs,

    #[arg(long)]
    pub license_url: Option<String>,

    #[arg(long = "feature")]
    pub features: Vec<String>,

    #[arg(long)]
    pub status: Option<Status>,
}

impl AddRealtimeArgs {
    pub fn into_draft(self) -> NewRealtimeSource {
        NewRealtimeSource {
            entity_type: self.entity_types,
            provider: self.provider,
            direct_download_url: self.direct_download_url,
            name: self.name,
            static_reference: self.static_references,
            note: self.note,
            authentication_type: self.auth.authentication_type,
            authentication_info_url: self.auth.authentication_info_url,
            api_key_parameter_name: self.auth.api_key_parameter_name,
            license_url: self.license_url,
            features: non_empty(self.features),
            status: self.status,
        }
    }
}

#[derive(Args, Debug)]
pub struct UpdateRealtimeArgs {
    pub mdb_source_id: u64,

    /// Replaces the entity types, repeatable
    #[arg(long = "entity-type")]
    pub entity_types: Vec<String>,

    #[arg(long)]
    pub provider: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    /// Replaces the static references, repeatable
    #[arg(long = "static-reference")]
    pub static_references: Vec<u64>,

    #[arg(long)]
    pub note: Option<String>,

    #[arg(long)]
    pub direct_download_url: Option<String>,

    #[command(flatten)]
    pub auth: AuthArgs,

    #[arg(long)]
    pub license_url: Option<String>,

    #[arg(long = "feature")]
    pub features: Vec<String>,

    #[arg(long)]
    pub status: Option<Status>,
}

impl UpdateRealtimeArgs {
    pub fn into_changes(self) -> (u64, RealtimeSourceUpdate) {
        let changes = RealtimeSourceUpdate {
            entity_type: non_empty(self.entity_types),
            provider: self.provider,
            name: self.name,
            static_reference: non_empty(self.static_references),
            note: self.note,
            direct_download_url: self.direct_download_url,
            authentication_type: self.auth.authentication_type,
            authentication_info_url: self.auth.authentication_info_url,
            api_key_parameter_name: self.auth.api_key_parameter_name,
            license_url: self.license_url,
            features: non_empty(self.features),
            status: self.status,
        };
        (self.mdb_source_id, changes)
    }
}

/// Exactly one search criterion
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SearchCriteria {
    /// Sources whose bounding box overlaps this one
    #[arg(
        long,
        num_args = 4,
        value_names = ["MIN_LAT", "MAX_LAT", "MIN_LON", "MAX_LON"],
        allow_negative_numbers = true
    )]
    pub bbox: Option<Vec<f64>>,

    #[arg(long)]
    pub subdivision_name: Option<String>,

    #[arg(long)]
    pub country_code: Option<String>,

    #[arg(long)]
    pub feature: Option<String>,

    #[arg(long)]
    pub status: Option<Status>,
}

/// The criterion selected on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum Search {
    BoundingBox(BoundingBoxFilter),
    SubdivisionName(String),
    CountryCode(String),
    Feature(String),
    Status(Status),
}

impl SearchCriteria {
    pub fn into_search(self) -> Option<Search> {
        if let Some(bbox) = self.bbox {
            return match bbox[..] {
                [min_lat, max_lat, min_lon, max_lon] => Some(Search::BoundingBox(
                    BoundingBoxFilter::new(min_lat, max_lat, min_lon, max_lon),
                )),
                _ => None,
            };
        }
        self.subdivision_name
            .map(Search::SubdivisionName)
            .or(self.country_code.map(Search::CountryCode))
            .or(self.feature.map(Search::Feature))
            .or(self.status.map(Search::Status))
    }
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    (!values.is_empty()).then_some(values)
}
