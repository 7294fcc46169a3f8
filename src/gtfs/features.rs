use chrono::{Duration, NaiveDate};

use crate::domain::source::{FARES_V1, FARES_V2, FLEX_V1, FLEX_V2, PATHWAYS};
use crate::errors::CatalogResult;
use crate::gtfs::archive::GtfsArchive;
use crate::gtfs::extract::parse_dates;

/// Sources with no service in this window are considered inactive
pub const SIX_MONTHS_IN_WEEKS: i64 = 26;

/// Feature tags supported by the dataset, in a stable order
pub fn detect_features(archive: &mut GtfsArchive) -> CatalogResult<Vec<String>> {
    let mut features = Vec::new();

    if archive.line_count("pathways.txt")? >= 2 {
        features.push(PATHWAYS.to_string());
    }
    if archive.line_count("fare_attributes.txt")? >= 2 {
        features.push(FARES_V1.to_string());
    }
    if archive.line_count("fare_products.txt")? >= 2 {
        features.push(FARES_V2.to_string());
    }
    if has_flex_v1(archive)? {
        features.push(FLEX_V1.to_string());
    }
    if archive.line_count("location_groups.txt")? >= 2
        || archive.line_count("locations.geojson")? >= 2
        || archive.line_count("booking_rules.txt")? >= 4
    {
        features.push(FLEX_V2.to_string());
    }

    Ok(features)
}

fn has_flex_v1(archive: &mut GtfsArchive) -> CatalogResult<bool> {
    if !archive.has_file("areas.txt") {
        return Ok(false);
    }
    let Some(stop_times) = archive.read_columns(
        "stop_times.txt",
        &["start_service_area_id", "start_service_area_radius"],
    )?
    else {
        return Ok(false);
    };

    let has_values = |column: &str| stop_times.values(column).is_some_and(|v| !v.is_empty());
    Ok(has_values("start_service_area_id") || has_values("start_service_area_radius"))
}

/// Whether any service date falls after `today` minus six months
pub fn has_recent_service_date(archive: &mut GtfsArchive, today: NaiveDate) -> CatalogResult<bool> {
    let cutoff = today - Duration::weeks(SIX_MONTHS_IN_WEEKS);

    if let Some(calendar) = archive.read_columns("calendar.txt", &["end_date"])? {
        if parse_dates(calendar.values("end_date"))
            .into_iter()
            .any(|date| date > cutoff)
        {
            return Ok(true);
        }
    }
    if let Some(calendar_dates) = archive.read_columns("calendar_dates.txt", &["date"])? {
        if parse_dates(calendar_dates.values("date"))
            .into_iter()
            .any(|date| date > cutoff)
        {
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs::archive::load_gtfs;
    use crate::gtfs::archive::test_support::write_archive;
    use tempfile::TempDir;

    fn archive_with(entries: &[(&str, &str)]) -> (TempDir, GtfsArchive) {
        let dir = TempDir::new().unwrap();
        let path = write_archive(dir.path(), "gtfs.zip", entries);
        let archive = load_gtfs(&path).unwrap();
        (dir, archive)
    }

    #[test]
    fn test_detects_pathways_and_fares() {
        let (_dir, mut archive) = archive_with(&[
            ("stops.txt", "stop_id\ns1\n"),
            ("pathways.txt", "pathway_id\np1\n"),
            ("fare_attributes.txt", "fare_id\n"),
            ("fare_products.txt", "fare_product_id\nday-pass\n"),
        ]);

        assert_eq!(detect_features(&mut archive).unwrap(), vec![PATHWAYS, FARES_V2]);
    }

    #[test]
    fn test_flex_v1_needs_areas_and_service_area_values() {
        let (_dir, mut archive) = archive_with(&[
            ("areas.txt", "area_id\na1\n"),
            (
                "stop_times.txt",
                "trip_id,stop_id,start_service_area_id\nt1,s1,\nt1,s2,a1\n",
            ),
        ]);
        assert_eq!(detect_features(&mut archive).unwrap(), vec![FLEX_V1]);

        let (_dir, mut archive) = archive_with(&[
            ("areas.txt", "area_id\na1\n"),
            ("stop_times.txt", "trip_id,stop_id,start_service_area_id\nt1,s1,\n"),
        ]);
        assert!(detect_features(&mut archive).unwrap().is_empty());

        let (_dir, mut archive) = archive_with(&[(
            "stop_times.txt",
            "trip_id,stop_id,start_service_area_radius\nt1,s1,200\n",
        )]);
        assert!(detect_features(&mut archive).unwrap().is_empty());
    }

    #[test]
    fn test_flex_v2_thresholds() {
        let (_dir, mut archive) = archive_with(&[(
            "booking_rules.txt",
            "booking_rule_id,booking_type\nb1,0\nb2,1\n",
        )]);
        assert!(detect_features(&mut archive).unwrap().is_empty());

        let (_dir, mut archive) = archive_with(&[
            ("stops.txt", "stop_id\ns1\n"),
            ("locations.geojson", "{\"type\":\"FeatureCollection\",\n\"features\":[]}\n"),
        ]);
        assert_eq!(detect_features(&mut archive).unwrap(), vec![FLEX_V2]);
    }

    #[test]
    fn test_recent_service_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let (_dir, mut archive) = archive_with(&[(
            "calendar.txt",
            "service_id,start_date,end_date\nwk,20230101,20231231\n",
        )]);
        assert!(has_recent_service_date(&mut archive, today).unwrap());

        let (_dir, mut archive) = archive_with(&[(
            "calendar.txt",
            "service_id,start_date,end_date\nwk,20230101,20230601\n",
        )]);
        assert!(!has_recent_service_date(&mut archive, today).unwrap());

        let (_dir, mut archive) = archive_with(&[
            ("calendar.txt", "service_id,start_date,end_date\nwk,20230101,20230601\n"),
            ("calendar_dates.txt", "service_id,date,exception_type\nwk,20240501,1\n"),
        ]);
        assert!(has_recent_service_date(&mut archive, today).unwrap());
    }
}
