//! Append-Only Record Log.
//!
//! # File Format
//! ```text
//! [Header: 8 bytes][Entry][Entry][Entry]...
//! ```
//!
//! Header:
//! - magic: b"TSRA"
//! - version: u32 LE
//!
//! Entry: a 20-byte header (record id, payload length, crc64 over
//! id + length + payload) followed by the bincode-encoded record.
//!
//! # Safety Guarantees
//! - Write + fsync before `persist` returns
//! - No truncation or rewriting, ever
//! - Reads re-verify every entry checksum

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use crc64fast::Digest as Crc64;

use tessera::record::Record;
use tessera::store::{RecordIter, RecordStore, StoreError};

use crate::error::{PersistenceError, Result};

pub const MAGIC: [u8; 4] = *b"TSRA";
pub const VERSION: u32 = 1;

const HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub record_id: u64,
    pub payload_len: u32,
    pub checksum: u64,
}

impl EntryHeader {
    pub const SIZE: usize = 8 + 4 + 8; // 20 bytes

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u64(&mut buf[0..8], self.record_id);
        LittleEndian::write_u32(&mut buf[8..12], self.payload_len);
        LittleEndian::write_u64(&mut buf[12..20], self.checksum);
        buf
    }

    pub fn from_bytes(buf: &[u8; Self::SIZE]) -> Self {
        Self {
            record_id: LittleEndian::read_u64(&buf[0..8]),
            payload_len: LittleEndian::read_u32(&buf[8..12]),
            checksum: LittleEndian::read_u64(&buf[12..20]),
        }
    }
}

fn entry_checksum(record_id: u64, payload: &[u8]) -> u64 {
    let mut digest = Crc64::new();
    digest.write(&record_id.to_le_bytes());
    digest.write(&(payload.len() as u32).to_le_bytes());
    digest.write(payload);
    digest.sum64()
}

fn read_header(reader: &mut impl Read) -> Result<()> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;
    if header[0..4] != MAGIC {
        return Err(PersistenceError::InvalidMagic);
    }
    let version = LittleEndian::read_u32(&header[4..8]);
    if version != VERSION {
        return Err(PersistenceError::UnsupportedVersion(version));
    }
    Ok(())
}

/// File-backed append-only store for one ledger.
pub struct LogStore {
    path: PathBuf,
    file: File,
}

impl LogStore {
    /// Open or create a log file.
    ///
    /// If the file exists, validates the header and appends. If it
    /// doesn't, creates it with a fresh header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        if file.metadata()?.len() == 0 {
            let mut header = [0u8; HEADER_SIZE];
            header[0..4].copy_from_slice(&MAGIC);
            LittleEndian::write_u32(&mut header[4..8], VERSION);
            file.write_all(&header)?;
            file.sync_data()?;
        } else {
            let mut reader = File::open(&path)?;
            read_header(&mut reader)?;
        }

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, record: &Record) -> Result<()> {
        let payload = bincode::serde::encode_to_vec(record, bincode::config::standard())
            .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;

        let header = EntryHeader {
            record_id: record.id,
            payload_len: payload.len() as u32,
            checksum: entry_checksum(record.id, &payload),
        };

        self.file.write_all(&header.to_bytes())?;
        self.file.write_all(&payload)?;
        // fsync before reporting durability to the ledger.
        self.file.sync_data()?;
        Ok(())
    }
}

impl RecordStore for LogStore {
    fn persist(&mut self, record: &Record) -> std::result::Result<(), StoreError> {
        self.append(record).map_err(StoreError::from)
    }

    fn iter(&self) -> std::result::Result<RecordIter<'_>, StoreError> {
        let reader = LogReader::open(&self.path).map_err(StoreError::from)?;
        Ok(Box::new(reader.map(|item| item.map_err(StoreError::from))))
    }
}

/// Streaming, checksum-verifying reader over a log file.
pub struct LogReader {
    reader: BufReader<File>,
}

impl LogReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        read_header(&mut reader)?;
        Ok(Self { reader })
    }
}

impl Iterator for LogReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut header_buf = [0u8; EntryHeader::SIZE];
        match self.reader.read_exact(&mut header_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return None,
            Err(e) => return Some(Err(PersistenceError::IoError(e))),
        }
        let header = EntryHeader::from_bytes(&header_buf);

        let mut payload = vec![0u8; header.payload_len as usize];
        if let Err(e) = self.reader.read_exact(&mut payload) {
            return Some(Err(PersistenceError::IoError(e)));
        }

        let found = entry_checksum(header.record_id, &payload);
        if found != header.checksum {
            return Some(Err(PersistenceError::ChecksumMismatch {
                expected: header.checksum,
                found,
            }));
        }

        match bincode::serde::decode_from_slice::<Record, _>(&payload, bincode::config::standard())
        {
            Ok((record, _)) => Some(Ok(record)),
            Err(e) => Some(Err(PersistenceError::InvalidFormat(e.to_string()))),
        }
    }
}
