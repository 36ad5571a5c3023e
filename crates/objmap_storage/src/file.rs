//! Log-structured persistent engine.
//!
//! On-disk layout of an engine directory:
//!
//! ```text
//! <dir>/
//! ├─ LOCK           # Advisory lock for single-writer
//! └─ records.log    # Append-only put/delete record log
//! ```
//!
//! Every mutation appends one framed record to the log. On open the log is
//! replayed into an in-memory ordered map; a torn record at the tail is
//! dropped and the file truncated back to the last complete record. When the
//! replay finds dead entries (tombstones or overwritten puts) the log is
//! compacted by rewriting the live entries through a temporary file and an
//! atomic rename.

use crate::engine::{EngineOptions, KvEngine};
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Magic bytes identifying a log record.
const LOG_MAGIC: [u8; 4] = *b"OMLG";

/// Current log format version.
const LOG_VERSION: u16 = 1;

/// Advisory lock file name.
const LOCK_FILE: &str = "LOCK";

/// Record log file name.
const LOG_FILE: &str = "records.log";

/// Temporary file for atomic log compaction.
const LOG_TEMP: &str = "records.log.tmp";

/// Header size for log records.
/// magic (4) + version (2) + type (1) + key_len (4) + val_len (4) = 15 bytes
const HEADER_SIZE: usize = 15;

/// CRC size.
const CRC_SIZE: usize = 4;

/// Type of log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum LogRecordType {
    /// Store a key/value pair.
    Put = 1,
    /// Remove a key.
    Delete = 2,
}

impl LogRecordType {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Put),
            2 => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Computes a CRC32 checksum (IEEE polynomial).
fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

/// Encodes one framed record.
fn encode_frame(record_type: LogRecordType, key: &[u8], value: &[u8]) -> StorageResult<Vec<u8>> {
    let key_len = u32::try_from(key.len())
        .map_err(|_| StorageError::corrupted("record key too large"))?;
    let val_len = u32::try_from(value.len())
        .map_err(|_| StorageError::corrupted("record value too large"))?;

    let mut data = Vec::with_capacity(HEADER_SIZE + key.len() + value.len() + CRC_SIZE);
    data.extend_from_slice(&LOG_MAGIC);
    data.extend_from_slice(&LOG_VERSION.to_le_bytes());
    data.push(record_type as u8);
    data.extend_from_slice(&key_len.to_le_bytes());
    data.extend_from_slice(&val_len.to_le_bytes());
    data.extend_from_slice(key);
    data.extend_from_slice(value);

    let crc = compute_crc32(&data);
    data.extend_from_slice(&crc.to_le_bytes());
    Ok(data)
}

/// Result of replaying the record log.
struct Replay {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Byte offset of the last complete record.
    valid_len: u64,
    /// Number of records superseded by later ones.
    dead_records: usize,
}

/// Replays the raw log bytes into an ordered map.
///
/// Stops at the first torn or unreadable record; everything before it is
/// kept. The log is self-framing, so a partial trailing write (crash during
/// append) only ever costs the final record.
fn replay_log(data: &[u8]) -> Replay {
    let mut entries: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
    let mut offset = 0usize;
    let mut dead_records = 0usize;

    while data.len() - offset >= HEADER_SIZE + CRC_SIZE {
        let header = &data[offset..offset + HEADER_SIZE];
        if header[0..4] != LOG_MAGIC {
            warn!(offset, "record log: bad magic, dropping tail");
            break;
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != LOG_VERSION {
            warn!(offset, version, "record log: unknown version, dropping tail");
            break;
        }
        let record_type = match LogRecordType::from_byte(header[6]) {
            Some(t) => t,
            None => {
                warn!(offset, "record log: unknown record type, dropping tail");
                break;
            }
        };
        let key_len = u32::from_le_bytes([header[7], header[8], header[9], header[10]]) as usize;
        let val_len = u32::from_le_bytes([header[11], header[12], header[13], header[14]]) as usize;

        let frame_len = HEADER_SIZE + key_len + val_len + CRC_SIZE;
        if data.len() - offset < frame_len {
            warn!(offset, "record log: truncated record, dropping tail");
            break;
        }

        let body_end = offset + HEADER_SIZE + key_len + val_len;
        let stored_crc = u32::from_le_bytes([
            data[body_end],
            data[body_end + 1],
            data[body_end + 2],
            data[body_end + 3],
        ]);
        if compute_crc32(&data[offset..body_end]) != stored_crc {
            warn!(offset, "record log: checksum mismatch, dropping tail");
            break;
        }

        let key = data[offset + HEADER_SIZE..offset + HEADER_SIZE + key_len].to_vec();
        match record_type {
            LogRecordType::Put => {
                let value = data[offset + HEADER_SIZE + key_len..body_end].to_vec();
                if entries.insert(key, value).is_some() {
                    dead_records += 1;
                }
            }
            LogRecordType::Delete => {
                entries.remove(&key);
                // Tombstone plus the put it cancels
                dead_records += 2;
            }
        }

        offset += frame_len;
    }

    Replay {
        entries,
        valid_len: offset as u64,
        dead_records,
    }
}

/// A persistent, log-structured key-value engine.
///
/// Holds an exclusive advisory lock on its directory for its whole lifetime;
/// a second open of the same directory fails with
/// [`StorageError::EngineLocked`]. Dropping the engine releases the lock.
///
/// # Durability
///
/// With `sync_on_write` enabled (the default) every mutation is synced to
/// disk before returning. A crash mid-append costs at most the record being
/// written; earlier records survive.
///
/// # Example
///
/// ```no_run
/// use objmap_storage::{EngineOptions, FileEngine, KvEngine};
/// use std::path::Path;
///
/// let mut engine = FileEngine::open(Path::new("my_store"), &EngineOptions::new()).unwrap();
/// engine.put(b"key", b"value").unwrap();
/// ```
#[derive(Debug)]
pub struct FileEngine {
    dir: PathBuf,
    log: File,
    log_len: u64,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    sync_on_write: bool,
    _lock_file: File,
}

impl FileEngine {
    /// Opens or creates an engine directory.
    ///
    /// Replays the record log, drops any torn tail, and compacts the log if
    /// the replay found dead entries.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory does not exist and `create_if_missing` is off
    /// - Another process holds the lock (returns [`StorageError::EngineLocked`])
    /// - I/O errors occur
    pub fn open(dir: &Path, options: &EngineOptions) -> StorageResult<Self> {
        if !dir.exists() {
            if options.create_if_missing {
                fs::create_dir_all(dir)?;
            } else {
                return Err(StorageError::invalid_path(format!(
                    "engine directory does not exist: {}",
                    dir.display()
                )));
            }
        }
        if !dir.is_dir() {
            return Err(StorageError::invalid_path(format!(
                "path is not a directory: {}",
                dir.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::EngineLocked);
        }

        let mut log = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOG_FILE))?;

        let mut raw = Vec::new();
        log.read_to_end(&mut raw)?;

        let replay = replay_log(&raw);
        if replay.valid_len < raw.len() as u64 {
            log.set_len(replay.valid_len)?;
            log.sync_all()?;
        }

        let mut engine = Self {
            dir: dir.to_path_buf(),
            log,
            log_len: replay.valid_len,
            entries: replay.entries,
            sync_on_write: options.sync_on_write,
            _lock_file: lock_file,
        };

        if replay.dead_records > 0 {
            engine.compact()?;
        }

        Ok(engine)
    }

    /// Returns the path to the engine directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Permanently deletes all on-disk state for the engine at `dir`.
    ///
    /// A missing directory is not an error, so destroying a store that was
    /// never opened succeeds. The caller must have released any open handle
    /// first; the lock file is removed along with everything else.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub fn destroy(dir: &Path) -> StorageResult<()> {
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    /// Appends one framed record and updates the tracked log length.
    fn append_frame(
        &mut self,
        record_type: LogRecordType,
        key: &[u8],
        value: &[u8],
    ) -> StorageResult<()> {
        let frame = encode_frame(record_type, key, value)?;
        self.log.seek(SeekFrom::Start(self.log_len))?;
        self.log.write_all(&frame)?;
        if self.sync_on_write {
            self.log.sync_data()?;
        }
        self.log_len += frame.len() as u64;
        Ok(())
    }

    /// Rewrites the log to its live contents via a temporary file and an
    /// atomic rename.
    fn compact(&mut self) -> StorageResult<()> {
        let temp_path = self.dir.join(LOG_TEMP);
        let mut temp = File::create(&temp_path)?;

        let mut written = 0u64;
        for (key, value) in &self.entries {
            let frame = encode_frame(LogRecordType::Put, key, value)?;
            temp.write_all(&frame)?;
            written += frame.len() as u64;
        }
        temp.sync_all()?;
        drop(temp);

        fs::rename(&temp_path, self.dir.join(LOG_FILE))?;
        sync_directory(&self.dir)?;

        self.log = OpenOptions::new()
            .read(true)
            .write(true)
            .open(self.dir.join(LOG_FILE))?;
        self.log_len = written;
        Ok(())
    }
}

impl KvEngine for FileEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.append_frame(LogRecordType::Put, key, value)?;
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        self.append_frame(LogRecordType::Delete, key, &[])?;
        self.entries.remove(key);
        Ok(())
    }

    fn scan(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Syncs the engine directory so renames and deletions are durable.
#[cfg(unix)]
fn sync_directory(dir: &Path) -> StorageResult<()> {
    let handle = File::open(dir)?;
    handle.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> StorageResult<()> {
    // NTFS journaling covers metadata durability; directory fsync is not
    // supported on Windows
    Ok(())
}
