//! Local filesystem implementation of the range traits.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use super::range::{check_range, RangeReader, RangeWriter};
use crate::error::IoError;

/// A file on local disk opened for positional access.
///
/// The handle is held for the lifetime of the value and closed when it is
/// dropped, so a rewrite that fails half-way still releases the file.
pub struct LocalFile {
    file: Mutex<File>,
    size: AtomicU64,
    identifier: String,
}

impl LocalFile {
    /// Open an existing file read-only.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .map_err(|e| IoError::fs(path.display().to_string(), e))?;
        Self::from_file(file, path).await
    }

    /// Open an existing file for reading and writing. The file is never
    /// created or truncated.
    pub async fn open_rw(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .await
            .map_err(|e| IoError::fs(path.display().to_string(), e))?;
        Self::from_file(file, path).await
    }

    async fn from_file(file: File, path: &Path) -> Result<Self, IoError> {
        let identifier = path.display().to_string();
        let metadata = file
            .metadata()
            .await
            .map_err(|e| IoError::fs(identifier.clone(), e))?;

        Ok(Self {
            file: Mutex::new(file),
            size: AtomicU64::new(metadata.len()),
            identifier,
        })
    }

    fn io_err(&self, err: std::io::Error) -> IoError {
        IoError::fs(self.identifier.clone(), err)
    }
}

#[async_trait]
impl RangeReader for LocalFile {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.size())?;

        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| self.io_err(e))?;

        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)
            .await
            .map_err(|e| self.io_err(e))?;

        Ok(Bytes::from(buf))
    }

    fn size(&self) -> u64 {
        self.size.load(Ordering::SeqCst)
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[async_trait]
impl RangeWriter for LocalFile {
    async fn write_all_at(&self, offset: u64, data: &[u8]) -> Result<(), IoError> {
        check_range(offset, data.len(), self.size())?;

        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| self.io_err(e))?;
        file.write_all(data).await.map_err(|e| self.io_err(e))?;
        file.flush().await.map_err(|e| self.io_err(e))?;

        Ok(())
    }

    async fn append(&self, data: &[u8]) -> Result<u64, IoError> {
        let mut file = self.file.lock().await;
        let offset = file
            .seek(SeekFrom::End(0))
            .await
            .map_err(|e| self.io_err(e))?;
        file.write_all(data).await.map_err(|e| self.io_err(e))?;
        file.flush().await.map_err(|e| self.io_err(e))?;

        self.size
            .store(offset + data.len() as u64, Ordering::SeqCst);
        Ok(offset)
    }

    async fn truncate(&self, len: u64) -> Result<(), IoError> {
        check_range(len, 0, self.size())?;

        let file = self.file.lock().await;
        file.set_len(len).await.map_err(|e| self.io_err(e))?;
        self.size.store(len, Ordering::SeqCst);
        Ok(())
    }

    async fn sync(&self) -> Result<(), IoError> {
        let mut file = self.file.lock().await;
        file.flush().await.map_err(|e| self.io_err(e))?;
        file.sync_data().await.map_err(|e| self.io_err(e))
    }
}
