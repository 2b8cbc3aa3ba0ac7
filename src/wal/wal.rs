use anyhow::{bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// WAL operation types
///
/// Keys and values are hex encoded on disk so that JSON blobs containing
/// `|` or newlines cannot break the line format.
#[derive(Debug, Clone, PartialEq)]
pub enum WalOperation {
    Set { key: String, value: String },
    Remove { key: String },
}

impl WalOperation {
    fn to_string(&self) -> String {
        match self {
            WalOperation::Set { key, value } => {
                format!("SET|{}|{}", hex::encode(key), hex::encode(value))
            }
            WalOperation::Remove { key } => format!("REMOVE|{}", hex::encode(key)),
        }
    }

    fn from_string(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split('|').collect();

        match parts.first() {
            Some(&"SET") => {
                if parts.len() != 3 {
                    bail!("Invalid SET format");
                }
                let key = decode_text(parts[1]).context("Invalid key")?;
                let value = decode_text(parts[2]).context("Invalid value")?;

                Ok(WalOperation::Set { key, value })
            }
            Some(&"REMOVE") => {
                if parts.len() != 2 {
                    bail!("Invalid REMOVE format");
                }
                let key = decode_text(parts[1]).context("Invalid key")?;

                Ok(WalOperation::Remove { key })
            }
            _ => bail!("Unknown operation type"),
        }
    }
}

fn decode_text(field: &str) -> Result<String> {
    let bytes = hex::decode(field).context("Invalid hex")?;
    String::from_utf8(bytes).context("Field is not valid UTF-8")
}

pub struct Wal {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl Wal {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open WAL file")?;

        Ok(Wal {
            file: Arc::new(Mutex::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, File> {
        // A poisoned lock only means another writer panicked mid-line; replay skips torn lines.
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn log_operation(&self, op: WalOperation) -> Result<()> {
        let line = op.to_string();
        let mut file = self.lock();
        writeln!(file, "{}", line).context("Failed to write to WAL")?;
        file.flush().context("Failed to flush WAL")?;
        Ok(())
    }

    pub fn replay(&self) -> Result<Vec<WalOperation>> {
        let file = File::open(&self.path).context("Failed to open WAL for replay")?;
        let reader = BufReader::new(file);
        let mut operations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from WAL")?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match WalOperation::from_string(line) {
                Ok(op) => operations.push(op),
                Err(e) => {
                    tracing::warn!(
                        line_num = line_num + 1,
                        error = %e,
                        "Failed to parse WAL line, skipping"
                    );
                }
            }
        }

        Ok(operations)
    }

    /// Path of the scratch file a rewrite stages its snapshot in
    pub fn snapshot_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".snapshot");
        PathBuf::from(name)
    }

    /// Replace the whole log with `operations`.
    ///
    /// The snapshot is written and synced to a sibling file, then renamed over
    /// the log, so a failure at any step leaves the previous log intact.
    pub fn rewrite(&self, operations: &[WalOperation]) -> Result<()> {
        let mut file = self.lock();
        let snapshot_path = self.snapshot_path();

        let result = write_snapshot(&snapshot_path, operations)
            .and_then(|()| {
                std::fs::rename(&snapshot_path, &self.path)
                    .context("Failed to move WAL snapshot into place")
            });
        if let Err(e) = result {
            let _ = std::fs::remove_file(&snapshot_path);
            return Err(e);
        }

        *file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .context("Failed to reopen WAL after rewrite")?;
        Ok(())
    }
}

fn write_snapshot(path: &Path, operations: &[WalOperation]) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .context("Failed to create WAL snapshot")?;

    let mut writer = BufWriter::new(file);
    for op in operations {
        writeln!(writer, "{}", op.to_string()).context("Failed to write WAL snapshot")?;
    }

    let file = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush WAL snapshot")?;
    file.sync_all().context("Failed to sync WAL snapshot")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_wal_operation_serialization() {
        let op = WalOperation::Set {
            key: "users".to_string(),
            value: r#"[{"username":"a|b"}]"#.to_string(),
        };
        let serialized = op.to_string();
        assert!(serialized.starts_with("SET|7573657273|"));
        assert_eq!(serialized.matches('|').count(), 2);
        assert_eq!(WalOperation::from_string(&serialized).unwrap(), op);

        let op = WalOperation::Remove {
            key: "currentUser".to_string(),
        };
        let serialized = op.to_string();
        assert_eq!(serialized, format!("REMOVE|{}", hex::encode("currentUser")));
        assert_eq!(WalOperation::from_string(&serialized).unwrap(), op);
    }

    #[test]
    fn test_wal_value_with_newline_stays_on_one_line() {
        let op = WalOperation::Set {
            key: "applications".to_string(),
            value: "line one\nline two".to_string(),
        };
        assert!(!op.to_string().contains('\n'));
    }

    #[test]
    fn test_wal_log_and_replay() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let wal = Wal::new(wal_path).unwrap();

        wal.log_operation(WalOperation::Set {
            key: "currentUser".to_string(),
            value: "Steve".to_string(),
        })
        .unwrap();
        wal.log_operation(WalOperation::Remove {
            key: "currentUser".to_string(),
        })
        .unwrap();

        let operations = wal.replay().unwrap();
        assert_eq!(operations.len(), 2);

        match &operations[0] {
            WalOperation::Set { key, value } => {
                assert_eq!(key, "currentUser");
                assert_eq!(value, "Steve");
            }
            _ => panic!("Expected Set"),
        }

        match &operations[1] {
            WalOperation::Remove { key } => assert_eq!(key, "currentUser"),
            _ => panic!("Expected Remove"),
        }
    }

    #[test]
    fn test_wal_rewrite_replaces_contents() {
        let temp_dir = TempDir::new().unwrap();
        let wal = Wal::new(temp_dir.path().join("test.wal")).unwrap();

        for value in ["1", "2", "3"] {
            wal.log_operation(WalOperation::Set {
                key: "k".to_string(),
                value: value.to_string(),
            })
            .unwrap();
        }
        assert_eq!(wal.replay().unwrap().len(), 3);

        wal.rewrite(&[WalOperation::Set {
            key: "k".to_string(),
            value: "3".to_string(),
        }])
        .unwrap();

        let operations = wal.replay().unwrap();
        assert_eq!(operations.len(), 1);

        // Appends after a rewrite land after the snapshot
        wal.log_operation(WalOperation::Remove { key: "k".to_string() })
            .unwrap();
        assert_eq!(wal.replay().unwrap().len(), 2);
    }

    #[test]
    fn test_wal_rewrite_failure_keeps_old_log() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("test.wal");
        let wal = Wal::new(wal_path.clone()).unwrap();

        wal.log_operation(WalOperation::Set {
            key: "users".to_string(),
            value: "[1]".to_string(),
        })
        .unwrap();
        let before = fs::read_to_string(&wal_path).unwrap();

        // A directory squatting on the snapshot path makes the snapshot write fail
        fs::create_dir(wal.snapshot_path()).unwrap();

        assert!(wal.rewrite(&[]).is_err());
        assert_eq!(fs::read_to_string(&wal_path).unwrap(), before);
        assert_eq!(wal.replay().unwrap().len(), 1);

        // The append handle still works after the failed rewrite
        wal.log_operation(WalOperation::Remove { key: "users".to_string() })
            .unwrap();
        assert_eq!(wal.replay().unwrap().len(), 2);
    }

    #[test]
    fn test_wal_rewrite_leaves_no_snapshot_file() {
        let temp_dir = TempDir::new().unwrap();
        let wal = Wal::new(temp_dir.path().join("test.wal")).unwrap();

        wal.rewrite(&[WalOperation::Remove { key: "k".to_string() }])
            .unwrap();

        assert!(!wal.snapshot_path().exists());
        assert_eq!(wal.replay().unwrap().len(), 1);
    }

    #[test]
    fn test_wal_invalid_lines() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        fs::write(
            &wal_path,
            format!(
                "INVALID_OP|data\nSET|zz|00\nSET|{}|{}\n",
                hex::encode("users"),
                hex::encode("[]")
            ),
        )
        .unwrap();

        let wal = Wal::new(wal_path).unwrap();
        let operations = wal.replay().unwrap();

        assert_eq!(operations.len(), 1);
    }
}
