//! Append-only collection segments
//!
//! A segment holds every frame of one collection, in insertion order. Reads
//! are served from memory and checksum-verified. When the store has a data
//! directory, each append is also written through to `<data_dir>/<name>.seg`.
//! Opening a mirror never touches its contents; `truncate` clears it.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::{RecordOffset, StoredRecord};
use crate::schema::Collection;

/// Append-only frame log for one collection.
#[derive(Debug)]
pub struct Segment {
    /// Encoded frames, back to back
    bytes: Vec<u8>,
    /// Frame start offsets, in insertion order
    offsets: Vec<RecordOffset>,
    /// Write-through mirror, if the store is disk-backed
    mirror: Option<Mirror>,
}

#[derive(Debug)]
struct Mirror {
    path: PathBuf,
    file: File,
}

impl Segment {
    /// Creates an empty memory-only segment.
    pub fn in_memory() -> Self {
        Self {
            bytes: Vec::new(),
            offsets: Vec::new(),
            mirror: None,
        }
    }

    /// Opens an empty segment mirrored to `<data_dir>/<collection>.seg`.
    ///
    /// An existing file is left as it is until `truncate` is called, so a
    /// failed open of a sibling segment loses nothing.
    ///
    /// # Errors
    ///
    /// Returns `ENROLL_STORAGE_UNAVAILABLE` if the directory or file cannot be
    /// opened.
    pub fn open_file(collection: Collection, data_dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(data_dir).map_err(|e| {
            StorageError::unavailable(
                format!("failed to create data directory: {}", data_dir.display()),
                e,
            )
        })?;

        let path = data_dir.join(format!("{}.seg", collection.name()));
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                StorageError::unavailable(
                    format!("failed to open segment file: {}", path.display()),
                    e,
                )
            })?;

        Ok(Self {
            bytes: Vec::new(),
            offsets: Vec::new(),
            mirror: Some(Mirror { path, file }),
        })
    }

    /// Opens a segment for `collection`, on disk if `data_dir` is given.
    pub fn open(collection: Collection, data_dir: Option<&Path>) -> StorageResult<Self> {
        match data_dir {
            Some(dir) => Self::open_file(collection, dir),
            None => Ok(Self::in_memory()),
        }
    }

    /// Discards any previous contents of the mirror file.
    ///
    /// Must be called before the first append to a disk-backed segment.
    pub fn truncate(&mut self) -> StorageResult<()> {
        let Some(mirror) = self.mirror.as_mut() else {
            return Ok(());
        };
        mirror
            .file
            .set_len(0)
            .and_then(|()| mirror.file.rewind())
            .map_err(|e| {
                StorageError::unavailable(
                    format!("failed to truncate segment file: {}", mirror.path.display()),
                    e,
                )
            })
    }

    /// Appends a record, returning its offset.
    ///
    /// The in-memory copy is only extended once the mirror write succeeded.
    pub fn append(&mut self, record: &StoredRecord) -> StorageResult<RecordOffset> {
        let frame = record.encode()?;

        if let Some(mirror) = self.mirror.as_mut() {
            mirror.file.write_all(&frame).map_err(|e| {
                StorageError::write_failed(
                    format!("failed to append to {}", mirror.path.display()),
                    e,
                )
            })?;
        }

        let offset = self.bytes.len() as RecordOffset;
        self.bytes.extend_from_slice(&frame);
        self.offsets.push(offset);
        Ok(offset)
    }

    /// Reads and verifies the record at `offset`.
    pub fn read_at(&self, offset: RecordOffset) -> StorageResult<StoredRecord> {
        StoredRecord::decode(&self.bytes, offset).map(|(record, _)| record)
    }

    /// Returns the offset of the `position`-th record in insertion order.
    pub fn offset_at(&self, position: usize) -> Option<RecordOffset> {
        self.offsets.get(position).copied()
    }

    /// Returns the number of records
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[cfg(test)]
    pub(crate) fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> Option<&Path> {
        self.mirror.as_ref().map(|m| m.path.as_path())
    }

    /// Flips one byte in memory. Test hook for corruption handling.
    #[cfg(test)]
    pub(crate) fn corrupt_byte(&mut self, index: usize) {
        if let Some(byte) = self.bytes.get_mut(index) {
            *byte ^= 0xFF;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, Student};
    use crate::storage::RecordKey;
    use tempfile::TempDir;

    fn record(id: &str) -> StoredRecord {
        let row = [("student_id", id), ("grade_level", "11")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StoredRecord::new(
            RecordKey::Natural(id.to_string()),
            Document::Student(Student::from_row(row)),
        )
    }

    #[test]
    fn test_append_and_read_in_order() {
        let mut segment = Segment::in_memory();
        let first = segment.append(&record("S1")).unwrap();
        let second = segment.append(&record("S2")).unwrap();

        assert_eq!(first, 0);
        assert!(second > first);
        assert_eq!(segment.len(), 2);
        assert_eq!(segment.offset_at(1), Some(second));
        assert_eq!(segment.offset_at(2), None);
        assert_eq!(segment.read_at(second).unwrap().key, RecordKey::Natural("S2".into()));
    }

    #[test]
    fn test_disk_segment_mirrors_frames() {
        let tmp = TempDir::new().unwrap();
        let mut segment = Segment::open_file(Collection::Students, tmp.path()).unwrap();
        segment.truncate().unwrap();
        segment.append(&record("S1")).unwrap();

        let path = segment.path().unwrap().to_path_buf();
        assert_eq!(path.file_name().unwrap(), "students.seg");
        let on_disk = fs::read(&path).unwrap();
        assert_eq!(on_disk.len(), segment.byte_len());
    }

    #[test]
    fn test_open_keeps_file_until_truncated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("courses.seg");
        {
            let mut segment = Segment::open_file(Collection::Courses, tmp.path()).unwrap();
            segment.truncate().unwrap();
            let row = [("course_code", "C1")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let course = crate::model::Course::from_row(row, &Default::default());
            segment
                .append(&StoredRecord::new(
                    RecordKey::Natural("C1".into()),
                    Document::Course(course),
                ))
                .unwrap();
        }
        let written = fs::read(&path).unwrap().len();
        assert!(written > 0);

        let mut segment = Segment::open_file(Collection::Courses, tmp.path()).unwrap();
        assert_eq!(segment.len(), 0);
        assert_eq!(fs::read(&path).unwrap().len(), written);

        segment.truncate().unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_truncate_memory_segment_is_noop() {
        let mut segment = Segment::in_memory();
        segment.append(&record("S1")).unwrap();
        segment.truncate().unwrap();
        assert_eq!(segment.len(), 1);
    }

    #[test]
    fn test_create_fails_when_directory_is_a_file() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();

        let err = Segment::open_file(Collection::Students, &blocker).unwrap_err();
        assert_eq!(err.code().code(), "ENROLL_STORAGE_UNAVAILABLE");
    }

    #[test]
    fn test_corrupted_frame_detected_on_read() {
        let mut segment = Segment::in_memory();
        let offset = segment.append(&record("S1")).unwrap();
        segment.corrupt_byte(6);
        assert!(segment.read_at(offset).unwrap_err().is_fatal());
    }
}
