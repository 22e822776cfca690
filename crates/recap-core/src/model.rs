//! Core data model: recordings and the documents derived from them.
//!
//! A [`Recording`] owns references to at most one [`Transcript`] and one
//! [`Summary`]. The documents carry their own identifiers and are stored
//! separately; regenerating a stage creates a new document and repoints the
//! recording's reference, orphaning the old one (no cascading delete).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing state of a derived document (transcript or summary).
///
/// Documents are persisted `Pending` before work begins so a crash mid-job
/// leaves discoverable state, then flipped to a terminal state on completion.
/// A `Failed` document is retained as evidence of the attempt, never rolled
/// back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Ready,
    Failed,
}

impl DocumentStatus {
    /// True while the producing job has not reached a terminal state.
    pub fn is_processing(&self) -> bool {
        matches!(self, DocumentStatus::Pending)
    }
}

/// One captured or imported audio asset.
///
/// Invariant: `summary_id` is `None` unless `transcript_id` is `Some`; a
/// summary cannot exist without its source transcript having been created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Duration of the audio in seconds, non-negative.
    pub duration_secs: f64,
    pub audio_path: PathBuf,
    #[serde(default)]
    pub transcript_id: Option<Uuid>,
    #[serde(default)]
    pub summary_id: Option<Uuid>,
}

impl Recording {
    pub fn new(title: impl Into<String>, duration_secs: f64, audio_path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: Utc::now(),
            duration_secs,
            audio_path,
            transcript_id: None,
            summary_id: None,
        }
    }
}

/// Text derived from one recording's audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub id: Uuid,
    pub recording_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub status: DocumentStatus,
}

impl Transcript {
    /// Create an empty placeholder for a transcription job about to start.
    pub fn pending(recording_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            recording_id,
            text: String::new(),
            created_at: Utc::now(),
            status: DocumentStatus::Pending,
        }
    }
}

/// LLM-generated digest of one transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: Uuid,
    pub transcript_id: Uuid,
    pub recording_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub status: DocumentStatus,
    /// Which provider/model produced this summary, e.g. `"OpenAI - gpt-4o"`.
    pub llm_label: String,
}

impl Summary {
    /// Create an empty placeholder for a summary job about to start.
    pub fn pending(transcript_id: Uuid, recording_id: Uuid, llm_label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript_id,
            recording_id,
            text: String::new(),
            created_at: Utc::now(),
            status: DocumentStatus::Pending,
            llm_label: llm_label.into(),
        }
    }
}

/// Audio capture state transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Paused,
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_transcript_is_processing_and_empty() {
        let recording_id = Uuid::new_v4();
        let transcript = Transcript::pending(recording_id);
        assert!(transcript.status.is_processing());
        assert!(transcript.text.is_empty());
        assert_eq!(transcript.recording_id, recording_id);
    }

    #[test]
    fn terminal_states_are_not_processing() {
        assert!(!DocumentStatus::Ready.is_processing());
        assert!(!DocumentStatus::Failed.is_processing());
    }

    #[test]
    fn new_recording_has_no_references() {
        let recording = Recording::new("standup", 12.5, PathBuf::from("/tmp/standup.wav"));
        assert!(recording.transcript_id.is_none());
        assert!(recording.summary_id.is_none());
    }
}
