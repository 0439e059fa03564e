pub mod file_lister;
pub mod notifier;
pub mod progress;
pub mod storage;
pub mod throttle;
pub mod upload_handler;
