use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Trait for reading byte ranges from a file.
///
/// The TIFF parser only ever needs the header, one IFD, and the value blocks
/// that IFD points at, so it reads through this trait instead of loading the
/// whole file. Image data is never touched.
#[async_trait]
pub trait RangeReader: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Get the current size of the resource in bytes.
    fn size(&self) -> u64;

    /// Get an identifier for this resource (for logging).
    fn identifier(&self) -> &str;
}

/// Trait for writing byte ranges into an existing file.
///
/// Positional writes never change the size. [`RangeWriter::append`] is the
/// only way to grow the resource and [`RangeWriter::truncate`] the only way to
/// shrink it. [`RangeWriter::sync`] must return only once everything written
/// so far is durable.
#[async_trait]
pub trait RangeWriter: RangeReader {
    /// Overwrite `data.len()` bytes starting at `offset`.
    ///
    /// The range must lie entirely inside the current size.
    async fn write_all_at(&self, offset: u64, data: &[u8]) -> Result<(), IoError>;

    /// Append `data` at the end of the resource, returning the offset it was
    /// written at.
    async fn append(&self, data: &[u8]) -> Result<u64, IoError>;

    /// Shrink the resource to `len` bytes. `len` must not exceed the current
    /// size.
    async fn truncate(&self, len: u64) -> Result<(), IoError>;

    /// Flush all written data to durable storage.
    async fn sync(&self) -> Result<(), IoError>;
}

/// Bounds check shared by reader and writer implementations.
pub(crate) fn check_range(offset: u64, len: usize, size: u64) -> Result<(), IoError> {
    let end = offset.checked_add(len as u64);
    match end {
        Some(end) if end <= size => Ok(()),
        _ => Err(IoError::RangeOutOfBounds {
            offset,
            requested: len as u64,
            size,
        }),
    }
}
