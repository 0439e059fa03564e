pub mod events;
pub mod files;
