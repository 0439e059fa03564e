use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the upload service
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory uploaded files are written to (default: "./downloads")
    pub downloads_dir: PathBuf,

    /// Minimum gap between two progress notifications of one upload (default: 2000 ms)
    pub message_time_delay: Duration,

    /// Maximum request body size in bytes (default: 1 GiB)
    pub max_upload_size: usize,

    /// Bind host (default: "127.0.0.1")
    pub host: String,

    /// Bind port (default: 3000)
    pub port: u16,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("./downloads"),
            message_time_delay: Duration::from_millis(2000),
            max_upload_size: 1024 * 1024 * 1024, // 1 GiB
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            downloads_dir: env::var("DOWNLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.downloads_dir),

            message_time_delay: env::var("MESSAGE_TIME_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.message_time_delay),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            host: env::var("HOST").unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }
}
