// ── Local response cache ──
//
// One JSON file per key under a cache directory. Fresh fetches are always
// written; reads are only served when the cache is opened in read mode.
// A corrupt or unreadable entry counts as a miss.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::Error;

const CACHE_EXTENSION: &str = "json";

/// Metadata about a single cached response.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub key: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// File-backed cache of raw API responses.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    read_enabled: bool,
}

impl ResponseCache {
    /// Open (and create if needed) a cache directory.
    ///
    /// With `read_enabled = false` every `get` misses, but `set` still
    /// writes so a later run can replay the data.
    pub fn open(dir: impl Into<PathBuf>, read_enabled: bool) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| Error::Cache {
            key: dir.display().to_string(),
            source,
        })?;
        if read_enabled {
            info!(dir = %dir.display(), "response cache: reading cached data when available");
        } else {
            debug!(dir = %dir.display(), "response cache: write-only");
        }
        Ok(Self { dir, read_enabled })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn read_enabled(&self) -> bool {
        self.read_enabled
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{CACHE_EXTENSION}", sanitize_key(key)))
    }

    /// Read a cached value. `None` on a miss, when reads are disabled, or
    /// when the entry cannot be decoded.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.read_enabled {
            return None;
        }

        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "cache entry unreadable, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                info!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "cache entry corrupt, treating as miss");
                None
            }
        }
    }

    /// Store a value, regardless of read mode.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), Error> {
        let path = self.path_for(key);
        let bytes = serde_json::to_vec(value).map_err(|e| Error::Cache {
            key: key.to_owned(),
            source: std::io::Error::other(e),
        })?;
        fs::write(&path, &bytes).map_err(|source| Error::Cache {
            key: key.to_owned(),
            source,
        })?;
        debug!(key, bytes = bytes.len(), "cached");
        Ok(())
    }

    /// Remove one entry. Returns `true` if something was deleted.
    pub fn delete(&self, key: &str) -> Result<bool, Error> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => {
                info!(key, "cache invalidated");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(Error::Cache {
                key: key.to_owned(),
                source,
            }),
        }
    }

    /// List cached entries, newest first.
    pub fn list(&self) -> Result<Vec<CacheEntry>, Error> {
        let io_err = |source: std::io::Error| Error::Cache {
            key: self.dir.display().to_string(),
            source,
        };

        let mut entries = Vec::new();
        for dirent in fs::read_dir(&self.dir).map_err(io_err)? {
            let dirent = dirent.map_err(io_err)?;
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let meta = dirent.metadata().map_err(io_err)?;
            entries.push(CacheEntry {
                key: key.to_owned(),
                file_name: dirent.file_name().to_string_lossy().into_owned(),
                size_bytes: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.key.cmp(&b.key)));
        Ok(entries)
    }

    /// Remove every cached entry. Returns how many were deleted.
    pub fn clear(&self) -> Result<usize, Error> {
        let mut removed = 0;
        for entry in self.list()? {
            if self.delete(&entry.key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Keys become file names: keep `[A-Za-z0-9._-]`, replace the rest.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
