use chrono::{SecondsFormat, Utc};

/// Placeholder for a location part that is not known
pub const UNKNOWN: &str = "unknown";
pub const JSON_EXTENSION: &str = "json";
pub const ZIP_EXTENSION: &str = "zip";

const LATEST_URL_PREFIX: &str = "https://storage.googleapis.com/storage/v1/b/mdb-latest/o/";
const LATEST_URL_SUFFIX: &str = "?alt=media";

/// Turns free text into a filename slug.
///
/// Only the part before the first comma is kept. Characters other than
/// alphanumerics, spaces and hyphens are dropped, words are joined with
/// hyphens and the result is transliterated to ASCII.
pub fn normalize(value: &str) -> String {
    let head = value.split(',').next().unwrap_or_default();
    let kept: String = head
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect();
    let slug = kept.split_whitespace().collect::<Vec<_>>().join("-");
    deunicode::deunicode(&slug)
}

/// `{country}-{subdivision}-{provider}-{data_type}-{id}.{extension}`
pub fn create_filename(
    country_code: &str,
    subdivision_name: &str,
    provider: &str,
    data_type: &str,
    mdb_source_id: &str,
    extension: &str,
) -> String {
    format!(
        "{}-{}-{}-{}-{}.{}",
        normalize(country_code),
        normalize(subdivision_name),
        normalize(provider),
        data_type,
        mdb_source_id,
        extension
    )
}

/// URL of the latest archived dataset of a schedule source
pub fn create_latest_url(
    country_code: &str,
    subdivision_name: &str,
    provider: &str,
    data_type: &str,
    mdb_source_id: &str,
) -> String {
    let filename = create_filename(
        country_code,
        subdivision_name,
        provider,
        data_type,
        mdb_source_id,
        ZIP_EXTENSION,
    );
    format!("{}{}{}", LATEST_URL_PREFIX, filename, LATEST_URL_SUFFIX)
}

/// Current UTC time as ISO 8601, second precision (`2022-01-01T00:00:00+00:00`)
pub fn get_iso_time() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}
