use crate::package::preprocessor::ParsedPackage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version constants for cache invalidation
pub mod versions {
    pub const DECKWRIGHT_VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const IMPORT_VERSION: &str = "1.0.0";
}

/// Import cache key (package bytes + import config → document)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ImportCacheKey {
    pub package_hash: String,
    pub config_hash: String,
    pub deckwright_version: String,
    pub import_version: String,
}

impl ImportCacheKey {
    pub fn new(package_hash: String, config_hash: String) -> Self {
        Self {
            package_hash,
            config_hash,
            deckwright_version: versions::DECKWRIGHT_VERSION.to_string(),
            import_version: versions::IMPORT_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.package_hash);
        hasher.update(&self.config_hash);
        hasher.update(&self.deckwright_version);
        hasher.update(&self.import_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Cached import result with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCacheValue {
    pub parsed: ParsedPackage,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub cache_version: String,
}

impl ImportCacheValue {
    pub fn new(parsed: ParsedPackage, processing_time_ms: u64) -> Self {
        Self {
            parsed,
            created_at: Utc::now(),
            processing_time_ms,
            cache_version: versions::DECKWRIGHT_VERSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_hash_depends_on_config() {
        let a = ImportCacheKey::new("pkg".to_string(), "cfg-a".to_string());
        let b = ImportCacheKey::new("pkg".to_string(), "cfg-b".to_string());
        assert_eq!(a.to_cache_hash(), a.clone().to_cache_hash());
        assert_ne!(a.to_cache_hash(), b.to_cache_hash());
    }
}
