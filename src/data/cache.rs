//! Content-addressed dataset cache.
//!
//! Keyed by the SHA-256 of the file bytes, so re-opening an identical file
//! (under any name) skips parsing, and an edited file is always re-parsed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::loader::{load_bytes, load_parquet, SourceFormat};
use super::model::DefectDataset;
use crate::error::DatasetError;

/// Hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<String, Arc<DefectDataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a file through the cache.
    pub fn load_file(&mut self, path: &Path) -> Result<Arc<DefectDataset>, DatasetError> {
        let format = SourceFormat::from_path(path)?;
        let bytes = std::fs::read(path)?;
        let hash = content_hash(&bytes);

        if let Some(hit) = self.entries.get(&hash) {
            log::debug!("Dataset cache hit for {} ({hash})", path.display());
            return Ok(Arc::clone(hit));
        }
        log::debug!("Dataset cache miss for {} ({hash})", path.display());

        let dataset = match format {
            SourceFormat::Parquet => load_parquet(path)?,
            other => load_bytes(&bytes, other)?,
        };
        Ok(self.insert(hash, dataset))
    }

    /// Load an in-memory CSV or JSON payload through the cache.
    pub fn load_bytes(
        &mut self,
        bytes: &[u8],
        format: SourceFormat,
    ) -> Result<Arc<DefectDataset>, DatasetError> {
        let hash = content_hash(bytes);
        if let Some(hit) = self.entries.get(&hash) {
            log::debug!("Dataset cache hit ({hash})");
            return Ok(Arc::clone(hit));
        }
        let dataset = load_bytes(bytes, format)?;
        Ok(self.insert(hash, dataset))
    }

    fn insert(&mut self, hash: String, dataset: DefectDataset) -> Arc<DefectDataset> {
        let dataset = Arc::new(dataset);
        self.entries.insert(hash, Arc::clone(&dataset));
        dataset
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
defect_id,module,severity,status,reported_date,resolved_date,priority,assigned_to
DEF-0001,X,Critical,Open,2024-01-05,,High,John Doe
";

    #[test]
    fn identical_content_is_parsed_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, CSV).expect("write a");
        std::fs::write(&b, CSV).expect("write b");

        let mut cache = DatasetCache::new();
        let first = cache.load_file(&a).expect("load a");
        let second = cache.load_file(&b).expect("load b");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_content_is_reparsed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("defects.csv");
        std::fs::write(&path, CSV).expect("write");

        let mut cache = DatasetCache::new();
        let first = cache.load_file(&path).expect("first load");

        let edited = format!("{CSV}DEF-0002,Y,Minor,Closed,2024-01-20,2024-01-25,Low,Jane Smith\n");
        std::fs::write(&path, edited).expect("rewrite");
        let second = cache.load_file(&path).expect("second load");

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let mut cache = DatasetCache::new();
        let err = cache.load_bytes(b"defect_id,module\nDEF-1,X\n", SourceFormat::Csv);
        assert!(matches!(err, Err(DatasetError::Schema { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
