use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::CatalogResult;

/// Root directory of the sources catalog, one subdirectory per data type
#[derive(Debug, Clone)]
pub struct JsonCatalogStorage {
    root: PathBuf,
}

impl JsonCatalogStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> CatalogResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Count of regular files below the root, at any depth
    pub fn count_files(&self) -> CatalogResult<usize> {
        count_files_in(&self.root)
    }
}

fn count_files_in(dir: &Path) -> CatalogResult<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            count += count_files_in(&entry.path())?;
        } else {
            count += 1;
        }
    }
    Ok(count)
}
