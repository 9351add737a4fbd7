//! Content-addressed result cache.
//!
//! Reports are keyed by a fingerprint of the input content and the options
//! that affect the result. The cache is two-tier: an in-memory index maps
//! fingerprints to on-disk JSON files, one file per fingerprint. Entries
//! expire after a TTL; the file's mtime doubles as the recency marker. The
//! cache is best-effort on both sides: read failures become misses, write
//! failures are logged and reported as not-stored, and neither ever fails
//! the surrounding request.

use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, StrataError};
use crate::profile::ProfileReport;

/// Default time-to-live: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default sweep interval: hourly.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// The result-affecting option set that participates in the fingerprint,
/// serialized in fixed key order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalOptions {
    pub delimiter: String,
    pub skip_empty_lines: bool,
}

/// Compute the cache fingerprint for a (content, options) pair.
///
/// SHA-256 over `hex(sha256(content)) || "|" || canonical(options)`.
pub fn fingerprint(content: &str, options: &CanonicalOptions) -> String {
    let content_hash = format!("{:x}", Sha256::digest(content.as_bytes()));
    let canonical = serde_json::to_string(options).expect("options serialize");
    let mut hasher = Sha256::new();
    hasher.update(content_hash.as_bytes());
    hasher.update(b"|");
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One persisted cache record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub timestamp: DateTime<Utc>,
    pub result: ProfileReport,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    path: PathBuf,
    stored_at: SystemTime,
}

/// Two-tier report cache with TTL eviction.
pub struct ResultCache {
    dir: PathBuf,
    ttl: Duration,
    index: Mutex<HashMap<String, IndexEntry>>,
}

impl ResultCache {
    /// Open a cache rooted at `dir`, creating the directory on demand and
    /// loading any still-valid entries found there. Files that fail to
    /// parse or are past the TTL are skipped.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_ttl(dir, DEFAULT_TTL)
    }

    /// Open a cache with a custom TTL.
    pub fn with_ttl(dir: impl AsRef<Path>, ttl: Duration) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StrataError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let cache = Self {
            dir,
            ttl,
            index: Mutex::new(HashMap::new()),
        };
        cache.scan();
        Ok(cache)
    }

    /// Populate the index from the cache directory.
    fn scan(&self) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "cache scan failed");
                return;
            }
        };

        let mut index = self.index.lock().expect("cache index lock");
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(mtime) = file_mtime(&path) else { continue };
            if age_of(mtime) > self.ttl {
                continue;
            }
            let Ok(file) = fs::File::open(&path) else { continue };
            let parsed: std::result::Result<CacheEntry, _> =
                serde_json::from_reader(BufReader::new(file));
            match parsed {
                Ok(cached) => {
                    index.insert(
                        cached.fingerprint,
                        IndexEntry {
                            path,
                            stored_at: mtime,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unparsable cache file");
                }
            }
        }
        tracing::debug!(entries = index.len(), "cache index loaded");
    }

    /// Look up a report by fingerprint.
    ///
    /// Misses on: absent index entry, missing file, TTL expiry, or a file
    /// that fails to read or parse. Every failure path cleans up both
    /// tiers; a hit touches the file mtime to mark recency.
    pub fn lookup(&self, fingerprint: &str) -> Option<ProfileReport> {
        let mut index = self.index.lock().expect("cache index lock");
        let entry = index.get(fingerprint)?.clone();

        let expired = match file_mtime(&entry.path) {
            Some(mtime) => age_of(mtime) > self.ttl,
            None => true,
        };
        if expired {
            let _ = fs::remove_file(&entry.path);
            index.remove(fingerprint);
            return None;
        }

        let report = fs::File::open(&entry.path)
            .ok()
            .and_then(|f| serde_json::from_reader::<_, CacheEntry>(BufReader::new(f)).ok())
            .map(|cached| cached.result);

        match report {
            Some(report) => {
                touch(&entry.path);
                Some(report)
            }
            None => {
                tracing::warn!(fingerprint, "evicting corrupt cache entry");
                let _ = fs::remove_file(&entry.path);
                index.remove(fingerprint);
                None
            }
        }
    }

    /// Store a report under its fingerprint.
    ///
    /// Returns whether the entry landed on disk; a failed write is logged
    /// and reported as `false`, never an error.
    pub fn store(&self, fingerprint: &str, report: &ProfileReport) -> bool {
        let path = self.dir.join(format!("{}.json", fingerprint));
        let entry = CacheEntry {
            fingerprint: fingerprint.to_string(),
            timestamp: Utc::now(),
            result: report.clone(),
        };

        let written = fs::File::create(&path)
            .map_err(|e| e.to_string())
            .and_then(|f| {
                serde_json::to_writer(BufWriter::new(f), &entry).map_err(|e| e.to_string())
            });

        match written {
            Ok(()) => {
                let mut index = self.index.lock().expect("cache index lock");
                index.insert(
                    fingerprint.to_string(),
                    IndexEntry {
                        path,
                        stored_at: SystemTime::now(),
                    },
                );
                true
            }
            Err(e) => {
                tracing::warn!(fingerprint, error = %e, "cache write failed");
                false
            }
        }
    }

    /// Evict expired entries and delete their files. Returns the number of
    /// entries removed.
    pub fn sweep(&self) -> usize {
        let mut index = self.index.lock().expect("cache index lock");
        let expired: Vec<String> = index
            .iter()
            .filter(|(_, entry)| {
                let mtime = file_mtime(&entry.path).unwrap_or(entry.stored_at);
                age_of(mtime) > self.ttl
            })
            .map(|(fp, _)| fp.clone())
            .collect();

        for fp in &expired {
            if let Some(entry) = index.remove(fp) {
                let _ = fs::remove_file(&entry.path);
            }
        }
        if !expired.is_empty() {
            tracing::debug!(evicted = expired.len(), "cache sweep");
        }
        expired.len()
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.index.lock().expect("cache index lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the periodic background sweeper.
    pub fn spawn_sweeper(cache: Arc<Self>, interval: Duration) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || loop {
            std::thread::sleep(interval);
            cache.sweep();
        })
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn age_of(mtime: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(mtime)
        .unwrap_or(Duration::ZERO)
}

/// Best-effort mtime bump marking a fresh hit.
fn touch(path: &Path) {
    let result = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(SystemTime::now()));
    if let Err(e) = result {
        tracing::debug!(path = %path.display(), error = %e, "mtime touch failed");
    }
}
