//! Process-local profile cache keyed by name, invalidated on any
//! (mtime, size) change of the backing file.
//!
//! Entries are immutable and replaced, never mutated, so a plain
//! reader/writer lock is enough.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use cpk_core::SourceFingerprint;

use crate::profile::ProfileConfig;

/// Hit/miss/size counters, for observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    profile: Arc<ProfileConfig>,
    path: PathBuf,
    fingerprint: SourceFingerprint,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Default)]
pub struct ProfileCache {
    inner: RwLock<CacheInner>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached profile only if its backing file is unchanged.
    /// A changed or vanished file evicts the entry. Every `None` counts as
    /// a miss, whether the entry was stale or never cached.
    pub fn get(&self, name: &str) -> Option<Arc<ProfileConfig>> {
        let fresh = {
            let inner = self.inner.read().expect("cache lock poisoned");
            inner.entries.get(name).and_then(|entry| {
                match SourceFingerprint::of(&entry.path) {
                    Ok(current) if current == entry.fingerprint => {
                        Some(Arc::clone(&entry.profile))
                    }
                    _ => None,
                }
            })
        };

        let mut inner = self.inner.write().expect("cache lock poisoned");
        match fresh {
            Some(profile) => {
                inner.hits += 1;
                Some(profile)
            }
            None => {
                if inner.entries.remove(name).is_some() {
                    tracing::debug!(profile = name, "cache entry stale, evicting");
                }
                inner.misses += 1;
                None
            }
        }
    }

    /// Record a freshly loaded profile. Replaces any existing entry.
    pub fn put(
        &self,
        name: &str,
        profile: Arc<ProfileConfig>,
        path: &Path,
        fingerprint: SourceFingerprint,
    ) {
        let mut inner = self.inner.write().expect("cache lock poisoned");
        inner.entries.insert(
            name.to_string(),
            CacheEntry {
                profile,
                path: path.to_path_buf(),
                fingerprint,
            },
        );
    }

    /// Drop one entry, or everything when `name` is `None`. Counters are
    /// kept; they describe the cache's lifetime, not its contents.
    pub fn clear(&self, name: Option<&str>) {
        let mut inner = self.inner.write().expect("cache lock poisoned");
        match name {
            Some(name) => {
                inner.entries.remove(name);
            }
            None => inner.entries.clear(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read().expect("cache lock poisoned");
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_profile(name: &str) -> Arc<ProfileConfig> {
        Arc::new(serde_yaml::from_str(&format!("name: {name}\n")).unwrap())
    }

    fn write_profile(dir: &tempfile::TempDir, name: &str, body: &str) -> (PathBuf, SourceFingerprint) {
        let path = dir.path().join(format!("{name}.yaml"));
        std::fs::write(&path, body).unwrap();
        let fingerprint = SourceFingerprint::of(&path).unwrap();
        (path, fingerprint)
    }

    #[test]
    fn test_hit_when_file_unchanged() {
        let dir = tempdir().unwrap();
        let (path, fingerprint) = write_profile(&dir, "dev", "name: dev\n");
        let cache = ProfileCache::new();
        cache.put("dev", sample_profile("dev"), &path, fingerprint);

        let hit = cache.get("dev").unwrap();
        assert_eq!(hit.name, "dev");
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_miss_and_eviction_when_file_changes() {
        let dir = tempdir().unwrap();
        let (path, fingerprint) = write_profile(&dir, "dev", "name: dev\n");
        let cache = ProfileCache::new();
        cache.put("dev", sample_profile("dev"), &path, fingerprint);

        // Change size so the fingerprint differs even with coarse mtime.
        std::fs::write(&path, "name: dev\ndescription: edited\n").unwrap();

        assert!(cache.get("dev").is_none());
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 0, "stale entry evicted");
    }

    #[test]
    fn test_miss_when_file_deleted() {
        let dir = tempdir().unwrap();
        let (path, fingerprint) = write_profile(&dir, "dev", "name: dev\n");
        let cache = ProfileCache::new();
        cache.put("dev", sample_profile("dev"), &path, fingerprint);

        std::fs::remove_file(&path).unwrap();
        assert!(cache.get("dev").is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_get_unknown_name_counts_miss() {
        let cache = ProfileCache::new();
        assert!(cache.get("nope").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_put_replaces_entry() {
        let dir = tempdir().unwrap();
        let (path, fingerprint) = write_profile(&dir, "dev", "name: dev\n");
        let cache = ProfileCache::new();
        cache.put("dev", sample_profile("old"), &path, fingerprint);
        cache.put("dev", sample_profile("new"), &path, fingerprint);
        assert_eq!(cache.get("dev").unwrap().name, "new");
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_clear_one_and_all() {
        let dir = tempdir().unwrap();
        let (path_a, fp_a) = write_profile(&dir, "a", "name: a\n");
        let (path_b, fp_b) = write_profile(&dir, "b", "name: b\n");
        let cache = ProfileCache::new();
        cache.put("a", sample_profile("a"), &path_a, fp_a);
        cache.put("b", sample_profile("b"), &path_b, fp_b);

        cache.clear(Some("a"));
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());

        cache.clear(None);
        assert_eq!(cache.stats().entries, 0);
    }
}
