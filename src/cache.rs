use crate::analyze::ConcatenationPattern;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_CACHE_DIR: &str = ".tachui/cache";

#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub patterns: Vec<ConcatenationPattern>,
}

/// Content-addressed cache of per-file analysis results. An entry is only
/// served when the SHA-256 of the current source matches the stored hash.
pub struct AnalysisCache {
    cache_dir: PathBuf,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

impl AnalysisCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            if let Err(e) = fs::create_dir_all(&cache_dir) {
                warn!(dir = %cache_dir.display(), error = %e, "Cannot create cache directory");
            }
        }
        Self { cache_dir }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn compute_hash(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, file_path: &str) -> PathBuf {
        let safe_name = file_path.replace(['/', '\\', ':'], "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    pub fn get(&self, file_path: &str, source: &str) -> Option<Vec<ConcatenationPattern>> {
        let entry_path = self.entry_path(file_path);
        let data = fs::read_to_string(&entry_path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                warn!(file = file_path, error = %e, "Discarding corrupt cache entry");
                fs::remove_file(entry_path).ok();
                return None;
            }
        };

        if entry.hash == Self::compute_hash(source) {
            Some(entry.patterns)
        } else {
            None
        }
    }

    pub fn set(&self, file_path: &str, source: &str, patterns: &[ConcatenationPattern]) {
        let entry = CacheEntry {
            hash: Self::compute_hash(source),
            patterns: patterns.to_vec(),
        };
        match serde_json::to_string(&entry) {
            Ok(data) => {
                if let Err(e) = fs::write(self.entry_path(file_path), data) {
                    warn!(file = file_path, error = %e, "Cannot write cache entry");
                }
            }
            Err(e) => warn!(file = file_path, error = %e, "Cannot serialize cache entry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze_patterns;

    fn temp_cache(name: &str) -> AnalysisCache {
        let dir = std::env::temp_dir().join(format!("tachui_cache_{}_{}", name, std::process::id()));
        fs::remove_dir_all(&dir).ok();
        AnalysisCache::new(dir)
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(AnalysisCache::compute_hash("a"), AnalysisCache::compute_hash("a"));
        assert_ne!(AnalysisCache::compute_hash("a"), AnalysisCache::compute_hash("b"));
        assert_eq!(AnalysisCache::compute_hash("").len(), 64);
    }

    #[test]
    fn test_hit_and_invalidation() {
        let cache = temp_cache("hit");
        let src = r#"Text("a").build().concat(Text("b"))"#;
        let patterns = analyze_patterns(src, "src/a.js");
        assert!(cache.get("src/a.js", src).is_none());

        cache.set("src/a.js", src, &patterns);
        assert_eq!(cache.get("src/a.js", src), Some(patterns));
        assert!(cache.get("src/a.js", "changed").is_none());
        fs::remove_dir_all(cache.dir()).ok();
    }

    #[test]
    fn test_corrupt_entry_is_discarded() {
        let cache = temp_cache("corrupt");
        let path = cache.entry_path("x.js");
        fs::write(&path, "{not json").unwrap();
        assert!(cache.get("x.js", "").is_none());
        assert!(!path.exists());
        fs::remove_dir_all(cache.dir()).ok();
    }
}
