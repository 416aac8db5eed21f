//! Pluggable write-ahead log (§3 Non-goals: "best-effort in-memory with a
//! pluggable write-ahead log interface"; §9 "Durability"). `NullWal` is the
//! default; `FileWal` is an append-only on-disk log in the same
//! header-then-payload shape the rest of this codebase's storage layer
//! uses for its own WAL.

use crate::error::WalError;
use crate::record::WalRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

#[async_trait]
pub trait WriteAheadLog: Send + Sync {
    async fn append(&self, record: WalRecord) -> Result<(), WalError>;
}

/// The default: durability is not provided in this phase (§3 Non-goals).
#[derive(Default)]
pub struct NullWal;

#[async_trait]
impl WriteAheadLog for NullWal {
    async fn append(&self, _record: WalRecord) -> Result<(), WalError> {
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct EntryHeader {
    data_len: u64,
}

/// Append-only file-backed WAL. Writes are synchronous (`fsync`'d) on the
/// calling task; callers on a hot path should treat `append` as a blocking
/// operation and keep log volume proportional to actual 2PC traffic.
pub struct FileWal {
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

impl FileWal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn iter(&self) -> Result<WalIterator, WalError> {
        WalIterator::new(&self.path)
    }

    fn append_inner(&self, record: &WalRecord) -> Result<(), WalError> {
        let data = bincode::serialize(record)?;
        let header = EntryHeader {
            data_len: data.len() as u64,
        };
        let mut writer = self.file.lock().map_err(|_| WalError::Poisoned)?;
        bincode::serialize_into(&mut *writer, &header)?;
        writer.write_all(&data)?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }
}

#[async_trait]
impl WriteAheadLog for FileWal {
    async fn append(&self, record: WalRecord) -> Result<(), WalError> {
        self.append_inner(&record).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "WAL append failed");
            e
        })
    }
}

/// Replays a `FileWal` in append order, for crash recovery (§9: "Recovery
/// replays these in order; the invariants in §8 must continue to hold").
pub struct WalIterator {
    reader: BufReader<File>,
}

impl WalIterator {
    pub fn new(path: &Path) -> Result<Self, WalError> {
        Ok(Self {
            reader: BufReader::new(File::open(path)?),
        })
    }
}

impl Iterator for WalIterator {
    type Item = Result<WalRecord, WalError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.fill_buf() {
            Ok(buf) if buf.is_empty() => return None,
            Ok(_) => {}
            Err(e) => return Some(Err(e.into())),
        }

        let header: EntryHeader = match bincode::deserialize_from(&mut self.reader) {
            Ok(h) => h,
            Err(e) => return Some(Err(WalError::Encode(e))),
        };
        let mut data = vec![0u8; header.data_len as usize];
        if let Err(e) = self.reader.read_exact(&mut data) {
            return Some(Err(e.into()));
        }
        Some(bincode::deserialize(&data).map_err(WalError::Encode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_types::{ChainId, TxGroup, XtId, XtRequest};
    use tempfile::tempdir;

    fn sample_record(tag: u8) -> WalRecord {
        WalRecord::VoteRecorded {
            xt_id: XtId([tag; 32]),
            chain_id: ChainId::from("A"),
            vote: tag % 2 == 0,
        }
    }

    #[tokio::test]
    async fn null_wal_always_succeeds() {
        let wal = NullWal;
        wal.append(sample_record(1)).await.unwrap();
    }

    #[tokio::test]
    async fn file_wal_round_trips_records_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wal");
        let wal = FileWal::open(&path).unwrap();

        let created = WalRecord::InstanceCreated {
            xt_id: XtId([9u8; 32]),
            request: XtRequest {
                groups: vec![TxGroup {
                    chain_id: ChainId::from("A"),
                    raw_txs: vec![b"tx".to_vec()],
                }],
            },
        };
        wal.append(created.clone()).await.unwrap();
        wal.append(sample_record(2)).await.unwrap();
        wal.append(WalRecord::DecisionEmitted {
            xt_id: XtId([9u8; 32]),
            commit: true,
        })
        .await
        .unwrap();

        let records: Vec<WalRecord> = wal.iter().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], created);
        assert_eq!(records[2], WalRecord::DecisionEmitted { xt_id: XtId([9u8; 32]), commit: true });
    }

    #[tokio::test]
    async fn file_wal_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.wal");
        {
            let wal = FileWal::open(&path).unwrap();
            wal.append(sample_record(3)).await.unwrap();
        }
        let wal = FileWal::open(&path).unwrap();
        wal.append(sample_record(4)).await.unwrap();
        let records: Vec<WalRecord> = wal.iter().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
    }
}
