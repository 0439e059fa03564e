use crate::models::StoredFile;
use crate::utils::validation::{ValidationError, sanitize_filename};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid filename: {0}")]
    InvalidFilename(#[from] ValidationError),

    #[error("failed to read upload body: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[async_trait]
pub trait StorageService: Send + Sync {
    fn root(&self) -> &Path;

    /// Persists `reader` under `filename`, replacing any existing file.
    /// Returns only once every byte is flushed to the storage handle.
    async fn store_stream<'a>(
        &self,
        filename: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<StoredFile, StorageError>;
}

/// Writes uploads directly under a local directory.
pub struct LocalStorageService {
    root: PathBuf,
}

impl LocalStorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        Ok(self.root.join(sanitize_filename(filename)?))
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn store_stream<'a>(
        &self,
        filename: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<StoredFile, StorageError> {
        let path = self.resolve(filename)?;
        let write_err = |source| StorageError::Write {
            path: path.clone(),
            source,
        };

        let mut guard = PartialFile::new(path.clone());
        let file = fs::File::create(&path).await.map_err(write_err)?;
        let mut writer = BufWriter::new(file);

        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut size = 0u64;
        loop {
            let n = reader.read(&mut buffer).await.map_err(StorageError::Read)?;
            if n == 0 {
                break;
            }
            writer.write_all(&buffer[..n]).await.map_err(write_err)?;
            size += n as u64;
        }

        writer.flush().await.map_err(write_err)?;
        writer.get_ref().sync_all().await.map_err(write_err)?;
        guard.keep();

        tracing::debug!("Stored {} ({} bytes)", path.display(), size);

        Ok(StoredFile {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path,
            size,
        })
    }
}

/// Removes a file on drop unless it was kept, so failed or cancelled
/// writes never leave a truncated upload behind.
struct PartialFile {
    path: PathBuf,
    keep: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::warn!("Removed incomplete upload {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!(
                "Failed to remove incomplete upload {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
