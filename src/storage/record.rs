//! Stored record and segment frame format
//!
//! Each record is written as one frame:
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, includes itself and the checksum)
//! +------------------+
//! | Record Body      | (JSON: key + typed document)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! The checksum covers the length prefix and the body.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{StorageError, StorageResult};
use crate::model::Document;

/// Byte offset of a frame within its segment
pub type RecordOffset = u64;

const LENGTH_SIZE: usize = 4;
const CHECKSUM_SIZE: usize = 4;
const MIN_FRAME_SIZE: usize = LENGTH_SIZE + CHECKSUM_SIZE;

/// Primary key of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    /// Unique natural key (student_id, course_code)
    Natural(String),
    /// Synthetic auto-incrementing key
    Sequence(u64),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Natural(key) => f.write_str(key),
            RecordKey::Sequence(n) => write!(f, "{}", n),
        }
    }
}

/// A record as held in a collection segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub key: RecordKey,
    pub document: Document,
}

impl StoredRecord {
    pub fn new(key: RecordKey, document: Document) -> Self {
        Self { key, document }
    }

    /// Encode the record as a checksummed frame.
    pub fn encode(&self) -> StorageResult<Vec<u8>> {
        let body = serde_json::to_vec(self)
            .map_err(|e| StorageError::encode_failed(format!("record {}: {}", self.key, e)))?;

        let frame_length = (LENGTH_SIZE + body.len() + CHECKSUM_SIZE) as u32;

        let mut frame = Vec::with_capacity(frame_length as usize);
        frame.extend_from_slice(&frame_length.to_le_bytes());
        frame.extend_from_slice(&body);
        let checksum = compute_checksum(&frame);
        frame.extend_from_slice(&checksum.to_le_bytes());

        Ok(frame)
    }

    /// Decode the frame starting at `offset` in `segment`.
    ///
    /// Returns the record and the number of bytes consumed. Any length or
    /// checksum inconsistency is reported as corruption.
    pub fn decode(segment: &[u8], offset: RecordOffset) -> StorageResult<(Self, usize)> {
        let start = offset as usize;
        let data = segment
            .get(start..)
            .ok_or_else(|| StorageError::corruption_at_offset(offset, "offset past end of segment"))?;

        if data.len() < MIN_FRAME_SIZE {
            return Err(StorageError::corruption_at_offset(offset, "frame too short"));
        }

        let frame_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if frame_length < MIN_FRAME_SIZE {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!("invalid frame length: {}", frame_length),
            ));
        }
        if data.len() < frame_length {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!(
                    "frame truncated: expected {} bytes, got {}",
                    frame_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = frame_length - CHECKSUM_SIZE;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        if !verify_checksum(&data[..checksum_offset], stored_checksum) {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!(
                    "checksum mismatch: computed {:08x}, stored {:08x}",
                    compute_checksum(&data[..checksum_offset]),
                    stored_checksum
                ),
            ));
        }

        let record: StoredRecord = serde_json::from_slice(&data[LENGTH_SIZE..checksum_offset])
            .map_err(|e| StorageError::corruption_at_offset(offset, format!("undecodable body: {}", e)))?;

        Ok((record, frame_length))
    }
}
