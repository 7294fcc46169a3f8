use serde::{Deserialize, Serialize};

/// Feature tags describing optional GTFS extensions present in a dataset
pub const FARES_V1: &str = "fares-v1";
pub const FARES_V2: &str = "fares-v2";
pub const FLEX_V1: &str = "flex-v1";
pub const FLEX_V2: &str = "flex-v2";
pub const PATHWAYS: &str = "pathways";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "gtfs")]
    Gtfs,
    #[serde(rename = "gtfs-rt")]
    GtfsRt,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Gtfs => "gtfs",
            DataType::GtfsRt => "gtfs-rt",
        }
    }

    /// Catalog directory of this data type, relative to the sources root
    pub fn catalog_path(&self) -> &'static str {
        match self {
            DataType::Gtfs => "gtfs/schedule",
            DataType::GtfsRt => "gtfs/realtime",
        }
    }
}

impl std::str::FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gtfs" => Ok(DataType::Gtfs),
            "gtfs-rt" | "gtfs_rt" => Ok(DataType::GtfsRt),
            _ => Err(format!("Unknown data type: {}", s)),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which catalogs a query is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataTypeFilter {
    #[default]
    All,
    Only(DataType),
}

impl DataTypeFilter {
    pub fn includes(&self, data_type: DataType) -> bool {
        match self {
            DataTypeFilter::All => true,
            DataTypeFilter::Only(only) => *only == data_type,
        }
    }
}

impl std::str::FromStr for DataTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(DataTypeFilter::All);
        }
        s.parse().map(DataTypeFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Deprecated,
    Inactive,
    Development,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Deprecated => "deprecated",
            Status::Inactive => "inactive",
            Status::Development => "development",
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "deprecated" => Ok(Status::Deprecated),
            "inactive" => Ok(Status::Inactive),
            "development" => Ok(Status::Development),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the API key of a source is passed. Stored as 0, 1 or 2 in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AuthenticationType {
    #[default]
    None,
    QueryParameter,
    Header,
}

impl TryFrom<u8> for AuthenticationType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AuthenticationType::None),
            1 => Ok(AuthenticationType::QueryParameter),
            2 => Ok(AuthenticationType::Header),
            _ => Err(format!("Unknown authentication type: {}", value)),
        }
    }
}

impl From<AuthenticationType> for u8 {
    fn from(value: AuthenticationType) -> Self {
        match value {
            AuthenticationType::None => 0,
            AuthenticationType::QueryParameter => 1,
            AuthenticationType::Header => 2,
        }
    }
}

impl std::str::FromStr for AuthenticationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("Unknown authentication type: {}", s))?;
        AuthenticationType::try_from(code)
    }
}

/// URL bundle shared by every source type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUrls {
    pub direct_download: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_type: Option<AuthenticationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_parameter_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl SourceUrls {
    pub fn new(direct_download: String) -> Self {
        Self {
            direct_download,
            authentication_type: None,
            authentication_info: None,
            api_key_parameter_name: None,
            latest: None,
            license: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn into_id<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            RawId::Number(n) => Ok(n),
            RawId::Text(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

/// Accepts a source id written either as a JSON integer or as a string
pub fn deserialize_source_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    RawId::deserialize(deserializer)?.into_id()
}

/// List form of [`deserialize_source_id`]; `null` reads as an empty list
pub fn deserialize_source_ids<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<RawId>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(RawId::into_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_round_trip() {
        assert_eq!("gtfs".parse::<DataType>().unwrap(), DataType::Gtfs);
        assert_eq!("GTFS-RT".parse::<DataType>().unwrap(), DataType::GtfsRt);
        assert_eq!(
            serde_json::to_string(&DataType::GtfsRt).unwrap(),
            "\"gtfs-rt\""
        );
        assert!("gbfs".parse::<DataType>().is_err());
    }

    #[test]
    fn test_data_type_filter() {
        assert_eq!("all".parse::<DataTypeFilter>().unwrap(), DataTypeFilter::All);
        let rt: DataTypeFilter = "gtfs-rt".parse().unwrap();
        assert!(rt.includes(DataType::GtfsRt));
        assert!(!rt.includes(DataType::Gtfs));
        assert!(DataTypeFilter::All.includes(DataType::Gtfs));
    }

    #[test]
    fn test_status_defaults_to_active() {
        assert_eq!(Status::default(), Status::Active);
        assert_eq!("Deprecated".parse::<Status>().unwrap(), Status::Deprecated);
        assert!("retired".parse::<Status>().is_err());
    }

    #[test]
    fn test_authentication_type_serializes_as_integer() {
        assert_eq!(
            serde_json::to_string(&AuthenticationType::Header).unwrap(),
            "2"
        );
        let parsed: AuthenticationType = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, AuthenticationType::QueryParameter);
        assert!(serde_json::from_str::<AuthenticationType>("7").is_err());
    }

    #[test]
    fn test_source_urls_omit_absent_fields() {
        let urls = SourceUrls::new("https://example.com/gtfs.zip".to_string());
        let json = serde_json::to_value(&urls).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "direct_download": "https://example.com/gtfs.zip" })
        );
    }

    #[test]
    fn test_source_ids_accept_strings_and_numbers() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_source_ids")]
            ids: Vec<u64>,
        }

        let holder: Holder = serde_json::from_str(r#"{"ids": ["12", 40]}"#).unwrap();
        assert_eq!(holder.ids, vec![12, 40]);

        let holder: Holder = serde_json::from_str(r#"{"ids": null}"#).unwrap();
        assert!(holder.ids.is_empty());

        assert!(serde_json::from_str::<Holder>(r#"{"ids": ["abc"]}"#).is_err());
    }

    #[test]
    fn test_single_source_id_accepts_string() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "deserialize_source_id")]
            id: u64,
        }

        assert_eq!(serde_json::from_str::<Holder>(r#"{"id": "7"}"#).unwrap().id, 7);
        assert_eq!(serde_json::from_str::<Holder>(r#"{"id": 7}"#).unwrap().id, 7);
    }
}
