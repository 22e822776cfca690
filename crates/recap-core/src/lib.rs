pub mod audio;
pub mod http;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod provider;
pub mod secrets;
pub mod settings;
pub mod storage;
pub mod transcription;
pub mod verbose;

pub use audio::{AudioRecorder, CaptureError, ImportError, import_audio, is_format_supported};
pub use llm::{
    DEFAULT_OLLAMA_URL, DEFAULT_SUMMARY_PROMPT, LlmClient, LlmError, TextGenerator,
};
pub use model::{DocumentStatus, Recording, RecordingState, Summary, Transcript};
pub use pipeline::{JobHandle, Pipeline, PipelineError};
pub use progress::Progress;
pub use provider::LlmProvider;
pub use secrets::{FileSecretStore, MemorySecretStore, SecretError, SecretStore};
pub use settings::{LlmSettings, Settings, TranscriptionSettings};
pub use storage::{Storage, StorageError};
pub use transcription::{
    AuthorizationStatus, TranscribeError, TranscriptionEngine, WhisperApiEngine,
};
pub use verbose::set_verbose;
