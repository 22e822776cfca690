//! Audio acquisition: live capture and file import.

mod import;
mod recorder;

pub use import::{ImportError, import_audio, is_format_supported, probe_duration};
pub use recorder::{AudioRecorder, CaptureError};
