//! In-memory range reader/writer for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::range::{check_range, RangeReader, RangeWriter};
use crate::error::IoError;

/// A growable byte buffer behind the range traits.
pub struct MemoryFile {
    data: Mutex<Vec<u8>>,
    identifier: String,
}

impl MemoryFile {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Mutex::new(data),
            identifier: "memory://test".to_string(),
        }
    }

    /// Snapshot of the current contents.
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

#[async_trait]
impl RangeReader for MemoryFile {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let data = self.data.lock().unwrap();
        check_range(offset, len, data.len() as u64)?;
        let start = offset as usize;
        Ok(Bytes::copy_from_slice(&data[start..start + len]))
    }

    fn size(&self) -> u64 {
        self.data.lock().unwrap().len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[async_trait]
impl RangeWriter for MemoryFile {
    async fn write_all_at(&self, offset: u64, bytes: &[u8]) -> Result<(), IoError> {
        let mut data = self.data.lock().unwrap();
        check_range(offset, bytes.len(), data.len() as u64)?;
        let start = offset as usize;
        data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    async fn append(&self, bytes: &[u8]) -> Result<u64, IoError> {
        let mut data = self.data.lock().unwrap();
        let offset = data.len() as u64;
        data.extend_from_slice(bytes);
        Ok(offset)
    }

    async fn truncate(&self, len: u64) -> Result<(), IoError> {
        let mut data = self.data.lock().unwrap();
        check_range(len, 0, data.len() as u64)?;
        data.truncate(len as usize);
        Ok(())
    }

    async fn sync(&self) -> Result<(), IoError> {
        Ok(())
    }
}
