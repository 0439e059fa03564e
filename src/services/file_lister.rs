use crate::models::FileRecord;
use crate::utils::format::format_size;
use chrono::{DateTime, Utc};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
#[error("failed to list {}: {source}", path.display())]
pub struct ListError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Name of the user running the service, reported as the owner of every file.
pub fn current_owner() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Lists `dir` in directory order, one record per entry.
pub async fn get_files_status(dir: &Path) -> Result<Vec<FileRecord>, ListError> {
    let list_err = |source| ListError {
        path: dir.to_path_buf(),
        source,
    };

    let owner = current_owner();
    let mut entries = fs::read_dir(dir).await.map_err(list_err)?;
    let mut records = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
        let metadata = fs::metadata(entry.path()).await.map_err(list_err)?;
        // Birth time is not available everywhere; mtime is the closest stand-in.
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(list_err)?;

        records.push(FileRecord {
            owner: owner.clone(),
            file: entry.file_name().to_string_lossy().into_owned(),
            size: format_size(metadata.len()),
            last_modified: DateTime::<Utc>::from(created),
        });
    }

    Ok(records)
}
