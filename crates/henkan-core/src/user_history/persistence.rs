//! On-disk format of the history cache and the storage backends.
//!
//! Layout: `HNUH` magic, one version byte, CRC-32 (little endian) of the body,
//! then the bincode-encoded entry list ordered least recently used first.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::entry::Entry;

pub const MAGIC: &[u8; 4] = b"HNUH";
pub const VERSION: u8 = 1;
const HEADER_LEN: usize = 9;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic bytes")]
    InvalidMagic,
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("checksum mismatch: expected {expected:#010x}, found {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("data too short: {0} bytes")]
    Truncated(usize),
    #[error("refusing to save an empty history")]
    Empty,
    #[error("serialize error: {0}")]
    Serialize(String),
    #[error("deserialize error: {0}")]
    Deserialize(String),
}

/// Serialize entries, least recently used first.
pub fn encode(entries: &[Entry]) -> Result<Vec<u8>, HistoryError> {
    if entries.is_empty() {
        return Err(HistoryError::Empty);
    }
    let body = bincode::serialize(entries).map_err(|e| HistoryError::Serialize(e.to_string()))?;
    let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    buf.extend_from_slice(&body);
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Entry>, HistoryError> {
    if bytes.len() < HEADER_LEN {
        return Err(HistoryError::Truncated(bytes.len()));
    }
    if &bytes[0..4] != MAGIC {
        return Err(HistoryError::InvalidMagic);
    }
    if bytes[4] != VERSION {
        return Err(HistoryError::UnsupportedVersion(bytes[4]));
    }
    let mut crc = [0u8; 4];
    crc.copy_from_slice(&bytes[5..HEADER_LEN]);
    let expected = u32::from_le_bytes(crc);
    let body = &bytes[HEADER_LEN..];
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(HistoryError::ChecksumMismatch { expected, actual });
    }
    bincode::deserialize(body).map_err(|e| HistoryError::Deserialize(e.to_string()))
}

/// Opaque blob store holding one serialized history.
pub trait HistoryStorage: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Vec<u8>>, HistoryError>;
    fn save(&self, bytes: &[u8]) -> Result<(), HistoryError>;
}

/// File-backed storage with atomic replace.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStorage for FileStorage {
    fn load(&self) -> Result<Option<Vec<u8>>, HistoryError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomic write: write to .tmp then rename.
    fn save(&self, bytes: &[u8]) -> Result<(), HistoryError> {
        let tmp = self.path.with_extension("tmp");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory storage for hosts that persist elsewhere, and for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<Option<Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            data: Mutex::new(Some(bytes)),
        }
    }

    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl HistoryStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<u8>>, HistoryError> {
        Ok(self.bytes())
    }

    fn save(&self, bytes: &[u8]) -> Result<(), HistoryError> {
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = Some(bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::entry::NextEntry;
    use super::*;

    fn sample() -> Vec<Entry> {
        vec![
            Entry {
                key: "きょう".into(),
                value: "今日".into(),
                last_access_time: 100,
                conversion_freq: 2,
                next_entries: vec![NextEntry { entry_fp: 42 }],
                ..Entry::default()
            },
            Entry {
                key: "は".into(),
                value: "は".into(),
                last_access_time: 101,
                suggestion_freq: 1,
                removed: true,
                ..Entry::default()
            },
        ]
    }

    #[test]
    fn test_encode_decode() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(&bytes[0..4], MAGIC);
        assert_eq!(decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_refuses_empty() {
        assert!(matches!(encode(&[]), Err(HistoryError::Empty)));
    }

    #[test]
    fn test_rejects_corruption() {
        let bytes = encode(&sample()).unwrap();

        assert!(matches!(decode(&bytes[..5]), Err(HistoryError::Truncated(5))));

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(decode(&bad_magic), Err(HistoryError::InvalidMagic)));

        let mut bad_version = bytes.clone();
        bad_version[4] = 99;
        assert!(matches!(
            decode(&bad_version),
            Err(HistoryError::UnsupportedVersion(99))
        ));

        let mut flipped = bytes.clone();
        let last = flipped.len() - 1;
        flipped[last] ^= 0xFF;
        assert!(matches!(
            decode(&flipped),
            Err(HistoryError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("history.db"));
        assert!(storage.load().unwrap().is_none());

        storage.save(b"payload").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some(&b"payload"[..]));
        assert!(!storage.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.load().unwrap().is_none());
        storage.save(b"abc").unwrap();
        assert_eq!(storage.bytes(), Some(b"abc".to_vec()));
    }
}
