//! Durable lifecycle record store.
//!
//! # Responsibilities
//! - Load the rule → record map, tolerating missing or corrupted state
//! - Merge one round's delta back into the file without losing writes from
//!   concurrently running shards
//! - Garbage-collect records no round has evaluated within the retention window
//!
//! # Design Decisions
//! - Per-key compare-and-set: a delta entry is applied only if the on-disk
//!   value still equals the value this round loaded
//! - Exclusive advisory lock on a sidecar `.lock` file around read-modify-write
//! - Atomic replace (temp file + rename); readers never see partial JSON

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{StoreConfig, StoreLayout};
use crate::lifecycle::record::{LifecycleRecord, Records, StoredRecord};
use crate::persist::write_atomic;
use crate::rules::Rule;

const SECS_PER_DAY: u64 = 86_400;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read lifecycle store {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write lifecycle store {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to lock lifecycle store {}: {source}", .path.display())]
    Lock { path: PathBuf, source: io::Error },

    #[error("failed to encode lifecycle store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Changes produced by one round.
#[derive(Debug, Clone, Default)]
pub struct StoreDelta {
    pub upserts: Records,
    pub evictions: BTreeSet<Rule>,
}

impl StoreDelta {
    fn keys(&self) -> impl Iterator<Item = &Rule> {
        self.upserts.keys().chain(self.evictions.iter())
    }
}

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Delta entries written.
    pub applied: usize,
    /// Delta keys dropped because another run changed them first.
    pub conflicts: BTreeSet<Rule>,
    /// Stale records removed by garbage collection.
    pub collected: usize,
    /// Records in the file after the merge.
    pub total: usize,
}

/// File-backed lifecycle store for one shard (or all shards, when shared).
#[derive(Debug, Clone)]
pub struct LifecycleStore {
    path: PathBuf,
    retention_secs: Option<u64>,
}

impl LifecycleStore {
    pub fn new(path: impl Into<PathBuf>, retention_days: u64) -> Self {
        Self {
            path: path.into(),
            retention_secs: (retention_days > 0)
                .then(|| retention_days.saturating_mul(SECS_PER_DAY)),
        }
    }

    /// Open the store serving `shard` under the configured layout.
    pub fn for_shard(config: &StoreConfig, shard: u32) -> Self {
        let base = PathBuf::from(&config.path);
        let path = match config.layout {
            StoreLayout::Shared => base,
            StoreLayout::PerShard => shard_path(&base, shard),
        };
        Self::new(path, config.retention_days)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record. A missing or corrupted file loads as empty with a
    /// warning, since that silently resets every rule's failure history.
    pub fn load(&self) -> Result<Records, StoreError> {
        match read_records(&self.path)? {
            Some(records) => Ok(records),
            None => {
                tracing::warn!(
                    store = %self.path.display(),
                    "Lifecycle store not found, every rule starts with a clean history"
                );
                Ok(Records::new())
            }
        }
    }

    /// Merge `delta` into the file.
    ///
    /// `base` is the snapshot this round was computed from. Keys outside the
    /// delta are preserved as found on disk.
    pub fn merge(
        &self,
        base: &Records,
        delta: &StoreDelta,
        now: u64,
    ) -> Result<MergeReport, StoreError> {
        let _lock = self.lock()?;
        let mut on_disk = read_records(&self.path)?.unwrap_or_default();
        let mut report = MergeReport::default();

        for rule in delta.keys() {
            let found = on_disk.get(rule);
            if found != base.get(rule) {
                // Another run already wrote what this round would write.
                if found == delta.upserts.get(rule) {
                    report.applied += 1;
                    continue;
                }
                report.conflicts.insert(rule.clone());
                tracing::warn!(
                    rule = %rule,
                    store = %self.path.display(),
                    "Record changed by a concurrent run, keeping its value"
                );
                continue;
            }
            match delta.upserts.get(rule) {
                Some(record) => {
                    on_disk.insert(rule.clone(), *record);
                }
                None => {
                    on_disk.remove(rule);
                }
            }
            report.applied += 1;
        }

        if let Some(retention) = self.retention_secs {
            let cutoff = now.saturating_sub(retention);
            let before = on_disk.len();
            on_disk.retain(|_, record| record.last_seen.map_or(true, |seen| seen >= cutoff));
            report.collected = before - on_disk.len();
        }

        report.total = on_disk.len();
        let encoded = serde_json::to_vec_pretty(&on_disk)?;
        write_atomic(&self.path, &encoded).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(
            store = %self.path.display(),
            applied = report.applied,
            conflicts = report.conflicts.len(),
            collected = report.collected,
            total = report.total,
            "Lifecycle store merged"
        );
        Ok(report)
    }

    fn lock(&self) -> Result<File, StoreError> {
        let mut lock_name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        lock_name.push(".lock");
        let lock_path = self.path.with_file_name(lock_name);

        let lock_err = |source| StoreError::Lock {
            path: lock_path.clone(),
            source,
        };
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(lock_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(lock_err)?;
        // Released when the handle is dropped.
        file.lock().map_err(lock_err)?;
        Ok(file)
    }
}

/// `dist/delete_counter.json` → `dist/delete_counter_03.json`.
fn shard_path(base: &Path, shard: u32) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lifecycle".to_string());
    let name = match base.extension() {
        Some(ext) => format!("{stem}_{shard:02}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{shard:02}"),
    };
    base.with_file_name(name)
}

/// `None` when the file does not exist.
fn read_records(path: &Path) -> Result<Option<Records>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(Some(Records::new()));
    }

    let raw: BTreeMap<Rule, serde_json::Value> = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(
                store = %path.display(),
                error = %e,
                "Lifecycle store is corrupted, starting from an empty store"
            );
            return Ok(Some(Records::new()));
        }
    };

    let mut records = Records::new();
    let mut dropped = 0usize;
    for (rule, value) in raw {
        match serde_json::from_value::<StoredRecord>(value) {
            Ok(stored) => {
                records.insert(rule, LifecycleRecord::from(stored));
            }
            Err(_) => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!(
            store = %path.display(),
            dropped,
            "Dropped unreadable lifecycle records"
        );
    }
    Ok(Some(records))
}
