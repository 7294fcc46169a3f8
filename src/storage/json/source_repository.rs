use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::domain::DataType;
use crate::errors::{CatalogError, CatalogResult};
use crate::storage::json::JsonCatalogStorage;
use crate::storage::traits::{SourceRepository, StoredEntity};

const JSON_FILE_EXTENSION: &str = "json";
const INDENT: &[u8] = b"    ";

/// Entity files of one data type, e.g. `<root>/gtfs/schedule/*.json`
pub struct JsonSourceRepository {
    storage: JsonCatalogStorage,
    dir: PathBuf,
    /// Where each loaded entry was found, subdirectories included
    locations: Mutex<HashMap<String, PathBuf>>,
}

impl JsonSourceRepository {
    pub fn new(storage: JsonCatalogStorage, data_type: DataType) -> CatalogResult<Self> {
        let dir = storage.root().join(data_type.catalog_path());
        fs::create_dir_all(&dir)?;
        Ok(Self {
            storage,
            dir,
            locations: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an entry was loaded from, or a new file in the data type directory
    fn path_of(&self, filename: &str) -> PathBuf {
        self.locations
            .lock()
            .ok()
            .and_then(|locations| locations.get(filename).cloned())
            .unwrap_or_else(|| self.dir.join(filename))
    }

    fn remember(&self, filename: &str, path: &Path) {
        if let Ok(mut locations) = self.locations.lock() {
            locations.insert(filename.to_string(), path.to_path_buf());
        }
    }
}

fn json_files_in(dir: &Path, files: &mut Vec<PathBuf>) -> CatalogResult<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            json_files_in(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(JSON_FILE_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

impl SourceRepository for JsonSourceRepository {
    fn load_all(&self) -> CatalogResult<Vec<StoredEntity>> {
        let mut files = Vec::new();
        json_files_in(&self.dir, &mut files)?;
        files.sort();

        files
            .into_iter()
            .map(|path| -> CatalogResult<StoredEntity> {
                let filename = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or_default()
                    .to_string();
                let content = fs::read_to_string(&path)?;
                let json = serde_json::from_str(&content).map_err(|e| CatalogError::MalformedEntry {
                    filename: filename.clone(),
                    reason: e.to_string(),
                })?;
                self.remember(&filename, &path);
                Ok(StoredEntity { filename, json })
            })
            .collect()
    }

    fn save(&self, filename: &str, json: &Value) -> CatalogResult<()> {
        let mut buffer = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));
        json.serialize(&mut serializer)?;

        let mut file = fs::File::create(self.path_of(filename))?;
        file.write_all(&buffer)?;
        tracing::debug!(filename, "Saved catalog entry");
        Ok(())
    }

    fn count_entities(&self) -> CatalogResult<usize> {
        self.storage.count_files()
    }
}
