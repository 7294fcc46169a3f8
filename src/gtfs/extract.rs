use std::path::Path;

use chrono::NaiveDate;

use crate::domain::Extent;
use crate::errors::{CatalogError, CatalogResult};
use crate::gtfs::archive::{load_gtfs, GtfsArchive};

/// Who to reach when a dataset cannot be read
pub const REMEDIATION_CONTACT: &str = "emma@mobilitydata.org";

/// Run `load` on `path`, turning any failure into an unreadable-dataset error
pub fn is_readable<T, F>(path: &Path, load: F) -> CatalogResult<bool>
where
    F: FnOnce(&Path) -> CatalogResult<T>,
{
    read_dataset(path, load).map(|_| true)
}

/// Run `read` on `path` and keep its output. Failures become unreadable-dataset errors.
pub fn read_dataset<T, F>(path: &Path, read: F) -> CatalogResult<T>
where
    F: FnOnce(&Path) -> CatalogResult<T>,
{
    read(path).map_err(|e| {
        CatalogError::UnreadableDataset(format!(
            "Exception \"{}\" occurred while reading the dataset. \
             The dataset could not be loaded. Please verify the source \
             or contact {} for assistance.",
            e, REMEDIATION_CONTACT
        ))
    })
}

/// Extent of `stop_lat`/`stop_lon` over `stops.txt`
pub fn extract_gtfs_bounding_box(path: &Path) -> CatalogResult<Option<Extent>> {
    let mut archive = load_gtfs(path)?;
    bounding_box_of(&mut archive)
}

fn bounding_box_of(archive: &mut GtfsArchive) -> CatalogResult<Option<Extent>> {
    let Some(stops) = archive.read_columns("stops.txt", &["stop_lat", "stop_lon"])? else {
        return Ok(None);
    };
    let (Some(latitudes), Some(longitudes)) = (stops.values("stop_lat"), stops.values("stop_lon"))
    else {
        return Ok(None);
    };

    let (minimum_latitude, maximum_latitude) = min_max(latitudes);
    let (minimum_longitude, maximum_longitude) = min_max(longitudes);

    Ok(match (minimum_latitude, maximum_latitude, minimum_longitude, maximum_longitude) {
        (Some(min_lat), Some(max_lat), Some(min_lon), Some(max_lon)) => Some(Extent {
            minimum_latitude: min_lat,
            maximum_latitude: max_lat,
            minimum_longitude: min_lon,
            maximum_longitude: max_lon,
        }),
        _ => None,
    })
}

fn min_max(values: &[String]) -> (Option<f64>, Option<f64>) {
    values
        .iter()
        .filter_map(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .fold((None, None), |(min, max), v| {
            (
                Some(min.map_or(v, |m: f64| m.min(v))),
                Some(max.map_or(v, |m: f64| m.max(v))),
            )
        })
}

/// Earliest and latest service dates over `calendar.txt` and `calendar_dates.txt`
pub fn extract_gtfs_calendar_range(
    path: &Path,
) -> CatalogResult<(Option<NaiveDate>, Option<NaiveDate>)> {
    let mut archive = load_gtfs(path)?;
    calendar_range_of(&mut archive)
}

fn calendar_range_of(
    archive: &mut GtfsArchive,
) -> CatalogResult<(Option<NaiveDate>, Option<NaiveDate>)> {
    let mut starts = Vec::new();
    let mut ends = Vec::new();

    if let Some(calendar) = archive.read_columns("calendar.txt", &["start_date", "end_date"])? {
        starts.extend(parse_dates(calendar.values("start_date")));
        ends.extend(parse_dates(calendar.values("end_date")));
    }
    if let Some(calendar_dates) = archive.read_columns("calendar_dates.txt", &["date"])? {
        let dates = parse_dates(calendar_dates.values("date"));
        starts.extend(dates.iter().copied());
        ends.extend(dates);
    }

    Ok((starts.into_iter().min(), ends.into_iter().max()))
}

pub(crate) fn parse_dates(values: Option<&[String]>) -> Vec<NaiveDate> {
    values
        .unwrap_or_default()
        .iter()
        .filter_map(|value| parse_gtfs_date(value))
        .collect()
}

/// Strict `YYYYMMDD`
pub fn parse_gtfs_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}
