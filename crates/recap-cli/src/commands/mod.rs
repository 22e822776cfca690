pub mod config;
pub mod delete;
pub mod import;
pub mod list;
pub mod record;
pub mod setup;
pub mod show;
pub mod summarize;
pub mod transcribe;
