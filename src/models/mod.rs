use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

/// Event name every progress notification is published under.
pub const ON_UPLOAD_EVENT: &str = "file-uploaded";

/// Fixed payload returned once all fields of an upload are on disk.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "Files uploaded with success!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub processed_already: u64,
    pub filename: String,
}

/// One directory entry as reported by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub owner: String,
    pub file: String,
    pub size: String,
    #[serde(serialize_with = "serialize_iso_millis")]
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct UploadSummary {
    pub files: Vec<StoredFile>,
    pub total_bytes: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub result: String,
}

impl UploadResponse {
    pub fn success() -> Self {
        Self {
            result: UPLOAD_SUCCESS_MESSAGE.to_string(),
        }
    }
}

fn serialize_iso_millis<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
