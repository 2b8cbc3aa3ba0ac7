use crate::stores::kv::KvStore;
use crate::wal::wal::{Wal, WalOperation};
use anyhow::Result;
use dashmap::DashMap;
use std::sync::{Mutex, MutexGuard};

/// Key-value store backed by a write-ahead log.
///
/// Reads are served from memory. Each write is appended and flushed to the
/// log before the in-memory map changes, so a crash never leaves the map
/// ahead of the disk. The append and the map update happen under one lock,
/// so the log records writes in the order the map applied them.
pub struct DurableKv {
    entries: DashMap<String, String>,
    wal: Wal,
    /// Log lines appended since the last compaction
    writer: Mutex<usize>,
    compact_every: usize,
}

impl DurableKv {
    /// Replay `wal` into memory and return the store
    pub fn open(wal: Wal) -> Result<Self> {
        let operations = wal.replay()?;
        let entries = DashMap::new();

        for op in &operations {
            match op {
                WalOperation::Set { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                WalOperation::Remove { key } => {
                    entries.remove(key);
                }
            }
        }

        tracing::debug!(
            path = %wal.path().display(),
            operations_replayed = operations.len(),
            live_keys = entries.len(),
            "WAL replay completed"
        );

        Ok(Self {
            entries,
            wal,
            writer: Mutex::new(operations.len()),
            compact_every: 0,
        })
    }

    /// Compact the log once this many lines have been appended since the
    /// last compaction. Zero disables it.
    pub fn with_compact_every(mut self, lines: usize) -> Self {
        self.compact_every = lines;
        self
    }

    fn write_lock(&self) -> MutexGuard<'_, usize> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Rewrite the log as one `SET` per live key. Returns the number of keys written.
    pub fn compact(&self) -> Result<usize> {
        let mut appended = self.write_lock();
        let keys = self.compact_locked()?;
        *appended = 0;
        Ok(keys)
    }

    fn compact_locked(&self) -> Result<usize> {
        let mut live: Vec<(String, String)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        live.sort();

        let snapshot: Vec<WalOperation> = live
            .into_iter()
            .map(|(key, value)| WalOperation::Set { key, value })
            .collect();

        self.wal.rewrite(&snapshot)?;
        Ok(snapshot.len())
    }

    fn apply(&self, op: WalOperation) -> Result<()> {
        let mut appended = self.write_lock();

        self.wal.log_operation(op.clone())?;
        match op {
            WalOperation::Set { key, value } => {
                self.entries.insert(key, value);
            }
            WalOperation::Remove { key } => {
                self.entries.remove(&key);
            }
        }

        *appended += 1;
        if self.compact_every > 0 && *appended >= self.compact_every {
            // The write itself is durable; a failed compaction is retried on the next write
            match self.compact_locked() {
                Ok(keys) => {
                    tracing::debug!(live_keys = keys, lines = *appended, "WAL compacted");
                    *appended = 0;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to compact WAL");
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for DurableKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.apply(WalOperation::Set {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.apply(WalOperation::Remove {
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> DurableKv {
        let wal = Wal::new(dir.path().join("store.wal")).unwrap();
        DurableKv::open(wal).unwrap()
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let kv = open(&temp_dir);
            kv.set("users", r#"[{"username":"Steve"}]"#).unwrap();
            kv.set("currentUser", "Steve").unwrap();
            kv.remove("currentUser").unwrap();
        }

        let kv = open(&temp_dir);
        assert_eq!(
            kv.get("users").unwrap().as_deref(),
            Some(r#"[{"username":"Steve"}]"#)
        );
        assert_eq!(kv.get("currentUser").unwrap(), None);
        assert_eq!(kv.len(), 1);
    }

    #[test]
    fn test_compact_keeps_latest_values_only() {
        let temp_dir = TempDir::new().unwrap();
        let kv = open(&temp_dir);

        kv.set("applications", "[]").unwrap();
        kv.set("applications", "[1]").unwrap();
        kv.set("users", "[]").unwrap();
        kv.set("currentUser", "x").unwrap();
        kv.remove("currentUser").unwrap();

        assert_eq!(kv.compact().unwrap(), 2);

        let wal = Wal::new(temp_dir.path().join("store.wal")).unwrap();
        let ops = wal.replay().unwrap();
        assert_eq!(
            ops,
            vec![
                WalOperation::Set {
                    key: "applications".to_string(),
                    value: "[1]".to_string()
                },
                WalOperation::Set {
                    key: "users".to_string(),
                    value: "[]".to_string()
                },
            ]
        );

        drop(kv);
        let reopened = open(&temp_dir);
        assert_eq!(reopened.get("applications").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_fresh_store_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let kv = open(&temp_dir);
        assert!(kv.is_empty());
        assert_eq!(kv.get("users").unwrap(), None);
    }

    #[test]
    fn test_log_compacts_after_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let wal = Wal::new(temp_dir.path().join("store.wal")).unwrap();
        let kv = DurableKv::open(wal).unwrap().with_compact_every(4);

        for i in 0..10 {
            kv.set("applications", &format!("[{}]", i)).unwrap();
        }

        let wal = Wal::new(temp_dir.path().join("store.wal")).unwrap();
        let lines = wal.replay().unwrap().len();
        assert!(lines < 4, "log kept {} lines", lines);

        drop(kv);
        let reopened = open(&temp_dir);
        assert_eq!(reopened.get("applications").unwrap().as_deref(), Some("[9]"));
    }

    #[test]
    fn test_no_threshold_keeps_every_line() {
        let temp_dir = TempDir::new().unwrap();
        let kv = open(&temp_dir);

        for i in 0..5 {
            kv.set("k", &i.to_string()).unwrap();
        }

        let wal = Wal::new(temp_dir.path().join("store.wal")).unwrap();
        assert_eq!(wal.replay().unwrap().len(), 5);
    }

    #[test]
    fn test_racing_writes_match_after_reopen() {
        use std::sync::Arc;
        use std::thread;

        let temp_dir = TempDir::new().unwrap();

        for round in 0..200 {
            let path = temp_dir.path().join(format!("race-{}.wal", round));
            let kv = Arc::new(DurableKv::open(Wal::new(path.clone()).unwrap()).unwrap());

            let setter = {
                let kv = Arc::clone(&kv);
                thread::spawn(move || kv.set("currentUser", "Steve").unwrap())
            };
            let remover = {
                let kv = Arc::clone(&kv);
                thread::spawn(move || kv.remove("currentUser").unwrap())
            };
            setter.join().unwrap();
            remover.join().unwrap();

            let live = kv.get("currentUser").unwrap();
            drop(kv);

            let reopened = DurableKv::open(Wal::new(path).unwrap()).unwrap();
            assert_eq!(reopened.get("currentUser").unwrap(), live, "round {}", round);
        }
    }
}
