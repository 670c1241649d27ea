use crate::cache::{ImportCacheKey, ImportCacheValue};
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Storage abstraction for caching import results
pub trait DocumentStorage {
    fn get_import_output(&self, cache_key: &ImportCacheKey) -> Result<Option<ImportCacheValue>>;
    fn store_import_output(&self, cache_key: &ImportCacheKey, cache_value: &ImportCacheValue) -> Result<()>;
}

/// File-based storage implementation using local cache directory
pub struct FileStorage {
    cache_dir: String,
}

impl FileStorage {
    pub fn new(cache_dir: &str) -> Result<Self> {
        fs::create_dir_all(format!("{cache_dir}/import"))?;

        Ok(Self {
            cache_dir: cache_dir.to_string(),
        })
    }

    fn import_path(&self, cache_key: &ImportCacheKey) -> String {
        format!("{}/import/{}.json", self.cache_dir, cache_key.to_cache_hash())
    }
}

impl DocumentStorage for FileStorage {
    fn get_import_output(&self, cache_key: &ImportCacheKey) -> Result<Option<ImportCacheValue>> {
        let path = self.import_path(cache_key);
        if Path::new(&path).exists() {
            let json_str = fs::read_to_string(path)?;
            let cache_value: ImportCacheValue = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached ImportCacheValue: {}", e))?;
            Ok(Some(cache_value))
        } else {
            Ok(None)
        }
    }

    fn store_import_output(&self, cache_key: &ImportCacheKey, cache_value: &ImportCacheValue) -> Result<()> {
        let path = self.import_path(cache_key);
        let json_str = serde_json::to_string(cache_value)
            .map_err(|e| anyhow!("Failed to serialize ImportCacheValue: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }
}

/// Hash of the whole package. Packages are zip archives whose central
/// directory sits at the end, so sampling chunks is not safe here.
pub fn calculate_package_hash(package_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(package_bytes.len().to_le_bytes());
    hasher.update(package_bytes);
    format!("{:x}", hasher.finalize())
}

/// Calculate hash for configuration data (for the cache key)
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// No-op storage implementation that disables all caching
pub struct NoOpStorage;

impl Default for NoOpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStorage for NoOpStorage {
    fn get_import_output(&self, _cache_key: &ImportCacheKey) -> Result<Option<ImportCacheValue>> {
        Ok(None) // Always cache miss
    }

    fn store_import_output(&self, _cache_key: &ImportCacheKey, _cache_value: &ImportCacheValue) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::preprocessor::ParsedPackage;
    use crate::types::{Document, Slide};

    #[test]
    fn test_package_hash_consistency() {
        let data = b"PK test package content";
        assert_eq!(calculate_package_hash(data), calculate_package_hash(data));
    }

    #[test]
    fn test_package_hash_uniqueness() {
        assert_ne!(calculate_package_hash(b"package 1"), calculate_package_hash(b"package 2"));
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let temp_dir = std::env::temp_dir().join(format!("deckwright_test_cache_{}", uuid::Uuid::new_v4()));
        let storage = FileStorage::new(temp_dir.to_str().unwrap()).unwrap();

        let key = ImportCacheKey::new(calculate_package_hash(b"deck"), "cfg".to_string());
        assert!(storage.get_import_output(&key).unwrap().is_none());

        let mut document = Document::new();
        document.slides.push(Slide::new("Cached"));
        let value = ImportCacheValue::new(
            ParsedPackage {
                document: document.clone(),
                warnings: Vec::new(),
            },
            12,
        );
        storage.store_import_output(&key, &value).unwrap();

        let cached = storage.get_import_output(&key).unwrap().unwrap();
        assert_eq!(cached.parsed.document, document);
        assert_eq!(cached.processing_time_ms, 12);

        std::fs::remove_dir_all(temp_dir).ok();
    }

    #[test]
    fn test_noop_storage_always_misses() {
        let storage = NoOpStorage::new();
        let key = ImportCacheKey::new("a".to_string(), "b".to_string());
        let value = ImportCacheValue::new(
            ParsedPackage {
                document: Document::new(),
                warnings: Vec::new(),
            },
            0,
        );
        storage.store_import_output(&key, &value).unwrap();
        assert!(storage.get_import_output(&key).unwrap().is_none());
    }
}
