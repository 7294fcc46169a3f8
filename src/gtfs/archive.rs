use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use zip::ZipArchive;

use crate::errors::{CatalogError, CatalogResult};

/// An opened GTFS dataset. Tables are looked up by file name, either at the
/// archive root or inside a single top-level folder.
pub struct GtfsArchive {
    archive: ZipArchive<File>,
    entries: Vec<String>,
}

/// Non-empty values of the requested columns of one table
#[derive(Debug, Default)]
pub struct TableColumns {
    columns: Vec<(String, Option<Vec<String>>)>,
}

impl TableColumns {
    /// Values of `name`, or `None` when the table has no such column
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .and_then(|(_, values)| values.as_deref())
    }
}

pub fn load_gtfs(path: &Path) -> CatalogResult<GtfsArchive> {
    let file = File::open(path)?;
    let archive = ZipArchive::new(file)?;
    let entries: Vec<String> = archive.file_names().map(str::to_string).collect();

    if !entries.iter().any(|name| name.ends_with(".txt")) {
        return Err(CatalogError::InvalidGtfs(format!(
            "{} contains no GTFS tables",
            path.display()
        )));
    }

    Ok(GtfsArchive { archive, entries })
}

impl GtfsArchive {
    fn entry_name(&self, table: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|name| name.as_str() == table)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|name| name.rsplit('/').next() == Some(table))
            })
            .cloned()
    }

    pub fn has_file(&self, table: &str) -> bool {
        self.entry_name(table).is_some()
    }

    /// Number of lines of `table`, header included; 0 when absent
    pub fn line_count(&mut self, table: &str) -> CatalogResult<usize> {
        let Some(name) = self.entry_name(table) else {
            return Ok(0);
        };
        let file = self.archive.by_name(&name)?;
        let mut count = 0;
        for line in BufReader::new(file).split(b'\n') {
            line?;
            count += 1;
        }
        Ok(count)
    }

    /// Read `columns` of `table`. Returns `None` when the table is absent.
    pub fn read_columns(
        &mut self,
        table: &str,
        columns: &[&str],
    ) -> CatalogResult<Option<TableColumns>> {
        let Some(name) = self.entry_name(table) else {
            return Ok(None);
        };
        let file = self.archive.by_name(&name)?;
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        let headers = rdr.headers()?.clone();

        let indexes: Vec<Option<usize>> = columns
            .iter()
            .map(|column| {
                headers
                    .iter()
                    .position(|h| h.trim_start_matches('\u{feff}') == *column)
            })
            .collect();
        let mut values: Vec<Option<Vec<String>>> = indexes
            .iter()
            .map(|idx| idx.map(|_| Vec::new()))
            .collect();

        for result in rdr.records() {
            let record = result?;
            for (idx, column_values) in indexes.iter().zip(values.iter_mut()) {
                if let (Some(i), Some(column_values)) = (idx, column_values) {
                    match record.get(*i) {
                        Some(value) if !value.is_empty() => column_values.push(value.to_string()),
                        _ => {}
                    }
                }
            }
        }

        Ok(Some(TableColumns {
            columns: columns
                .iter()
                .map(|c| c.to_string())
                .zip(values)
                .collect(),
        }))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::write_archive;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_requires_a_table() {
        let dir = TempDir::new().unwrap();
        let path = write_archive(dir.path(), "empty.zip", &[("readme.md", "hello")]);
        assert!(matches!(load_gtfs(&path), Err(CatalogError::InvalidGtfs(_))));
    }

    #[test]
    fn test_load_rejects_non_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not-a-zip");
        std::fs::write(&path, "<html>Forbidden</html>").unwrap();
        assert!(matches!(load_gtfs(&path), Err(CatalogError::Zip(_))));
    }

    #[test]
    fn test_line_count() {
        let dir = TempDir::new().unwrap();
        let path = write_archive(
            dir.path(),
            "gtfs.zip",
            &[("pathways.txt", "pathway_id,from_stop_id\np1,s1\np2,s2\n")],
        );
        let mut archive = load_gtfs(&path).unwrap();
        assert_eq!(archive.line_count("pathways.txt").unwrap(), 3);
        assert_eq!(archive.line_count("levels.txt").unwrap(), 0);
    }

    #[test]
    fn test_tables_inside_folder_are_found() {
        let dir = TempDir::new().unwrap();
        let path = write_archive(
            dir.path(),
            "gtfs.zip",
            &[("feed/stops.txt", "stop_id,stop_lat,stop_lon\ns1,45.0,-73.0\n")],
        );
        let archive = load_gtfs(&path).unwrap();
        assert!(archive.has_file("stops.txt"));
        assert!(!archive.has_file("routes.txt"));
    }

    #[test]
    fn test_read_columns_skips_empty_values() {
        let dir = TempDir::new().unwrap();
        let path = write_archive(
            dir.path(),
            "gtfs.zip",
            &[(
                "stops.txt",
                "\u{feff}stop_id,stop_lat,stop_lon\ns1,45.5, -73.5\ns2,,\ns3,46.0,-74.0\n",
            )],
        );
        let mut archive = load_gtfs(&path).unwrap();
        let columns = archive
            .read_columns("stops.txt", &["stop_id", "stop_lat", "zone_id"])
            .unwrap()
            .unwrap();

        assert_eq!(columns.values("stop_id").unwrap().len(), 3);
        assert_eq!(columns.values("stop_lat").unwrap(), ["45.5", "46.0"]);
        assert!(columns.values("zone_id").is_none());
        assert!(archive.read_columns("shapes.txt", &["shape_id"]).unwrap().is_none());
    }
}
