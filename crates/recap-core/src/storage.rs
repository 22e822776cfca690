//! Durable storage for the recording index and derived documents.
//!
//! Layout under the base directory:
//!
//! ```text
//! recordings.json        single ordered recording index
//! transcripts/<id>.json  one document per transcript
//! summaries/<id>.json    one document per summary
//! audio/                 captured and imported audio files
//! ```
//!
//! All writes are whole-document overwrites: the index is rewritten in full
//! and each transcript/summary is one file keyed by its own id. That makes
//! every operation idempotent, at the cost of not being incremental.
//! Loading a document "by recording" indirects through the index reference
//! first, then fetches the file; a dangling reference surfaces as
//! [`StorageError::NotFound`], never a panic.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::model::{Recording, Summary, Transcript};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found")]
    NotFound,
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode document: {0}")]
    Decode(#[source] serde_json::Error),
}

pub struct Storage {
    base: PathBuf,
}

impl Storage {
    /// Open storage rooted at `base`, creating the directory tree if needed.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let storage = Self { base: base.into() };
        std::fs::create_dir_all(storage.transcripts_dir())?;
        std::fs::create_dir_all(storage.summaries_dir())?;
        std::fs::create_dir_all(storage.audio_dir())?;
        Ok(storage)
    }

    /// Default data directory for the current user.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("recap"))
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.base.join("audio")
    }

    fn recordings_path(&self) -> PathBuf {
        self.base.join("recordings.json")
    }

    fn transcripts_dir(&self) -> PathBuf {
        self.base.join("transcripts")
    }

    fn summaries_dir(&self) -> PathBuf {
        self.base.join("summaries")
    }

    // ── Recording index ──

    /// Rewrite the whole recording index.
    pub fn save_recordings(&self, recordings: &[Recording]) -> Result<(), StorageError> {
        write_json(&self.recordings_path(), recordings)
    }

    /// Load the recording index. An index that has never been written is an
    /// empty list, not an error.
    pub fn load_recordings(&self) -> Result<Vec<Recording>, StorageError> {
        let path = self.recordings_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_json(&path)
    }

    /// Replace the entry matching `recording.id` and rewrite the index.
    pub fn update_recording(&self, recording: &Recording) -> Result<(), StorageError> {
        let mut recordings = self.load_recordings()?;
        let entry = recordings
            .iter_mut()
            .find(|r| r.id == recording.id)
            .ok_or(StorageError::NotFound)?;
        *entry = recording.clone();
        self.save_recordings(&recordings)
    }

    // ── Transcripts ──

    pub fn save_transcript(&self, transcript: &Transcript) -> Result<(), StorageError> {
        write_json(
            &self.transcripts_dir().join(format!("{}.json", transcript.id)),
            transcript,
        )
    }

    /// Load the transcript referenced by the given recording.
    pub fn load_transcript(&self, recording_id: Uuid) -> Result<Transcript, StorageError> {
        let transcript_id = self
            .find_recording(recording_id)?
            .transcript_id
            .ok_or(StorageError::NotFound)?;
        self.load_transcript_by_id(transcript_id)
    }

    pub fn load_transcript_by_id(&self, id: Uuid) -> Result<Transcript, StorageError> {
        let path = self.transcripts_dir().join(format!("{id}.json"));
        if !path.exists() {
            return Err(StorageError::NotFound);
        }
        read_json(&path)
    }

    // ── Summaries ──

    pub fn save_summary(&self, summary: &Summary) -> Result<(), StorageError> {
        write_json(
            &self.summaries_dir().join(format!("{}.json", summary.id)),
            summary,
        )
    }

    /// Load the summary referenced by the given recording.
    pub fn load_summary(&self, recording_id: Uuid) -> Result<Summary, StorageError> {
        let summary_id = self
            .find_recording(recording_id)?
            .summary_id
            .ok_or(StorageError::NotFound)?;
        self.load_summary_by_id(summary_id)
    }

    pub fn load_summary_by_id(&self, id: Uuid) -> Result<Summary, StorageError> {
        let path = self.summaries_dir().join(format!("{id}.json"));
        if !path.exists() {
            return Err(StorageError::NotFound);
        }
        read_json(&path)
    }

    fn find_recording(&self, id: Uuid) -> Result<Recording, StorageError> {
        self.load_recordings()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(StorageError::NotFound)
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let data = serde_json::to_string_pretty(value).map_err(StorageError::Encode)?;
    std::fs::write(path, data)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(StorageError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentStatus;

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        (dir, storage)
    }

    fn recording(title: &str) -> Recording {
        Recording::new(title, 3.0, PathBuf::from(format!("/tmp/{title}.wav")))
    }

    #[test]
    fn empty_index_loads_as_empty_list() {
        let (_dir, storage) = storage();
        assert!(storage.load_recordings().unwrap().is_empty());
    }

    #[test]
    fn recording_index_round_trips() {
        let (_dir, storage) = storage();
        let recordings = vec![recording("first"), recording("second")];
        storage.save_recordings(&recordings).unwrap();

        let loaded = storage.load_recordings().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, recordings[0].id);
        assert_eq!(loaded[1].title, "second");
    }

    #[test]
    fn update_recording_requires_existing_entry() {
        let (_dir, storage) = storage();
        let rec = recording("ghost");
        assert!(matches!(
            storage.update_recording(&rec),
            Err(StorageError::NotFound)
        ));

        storage.save_recordings(std::slice::from_ref(&rec)).unwrap();
        let mut updated = rec.clone();
        updated.title = "renamed".to_string();
        storage.update_recording(&updated).unwrap();

        let loaded = storage.load_recordings().unwrap();
        assert_eq!(loaded[0].title, "renamed");
    }

    #[test]
    fn transcript_round_trip_preserves_id_text_and_status() {
        let (_dir, storage) = storage();
        let mut rec = recording("meeting");
        let mut transcript = Transcript::pending(rec.id);
        transcript.text = "hello world".to_string();
        transcript.status = DocumentStatus::Ready;

        storage.save_transcript(&transcript).unwrap();
        rec.transcript_id = Some(transcript.id);
        storage.save_recordings(&[rec.clone()]).unwrap();

        let loaded = storage.load_transcript(rec.id).unwrap();
        assert_eq!(loaded.id, transcript.id);
        assert_eq!(loaded.text, "hello world");
        assert_eq!(loaded.status, DocumentStatus::Ready);

        // Loading again without intervening writes returns identical content
        let again = storage.load_transcript(rec.id).unwrap();
        assert_eq!(again.id, loaded.id);
        assert_eq!(again.text, loaded.text);
    }

    #[test]
    fn load_summary_without_reference_is_not_found() {
        let (_dir, storage) = storage();
        let rec = recording("no-summary");
        storage.save_recordings(&[rec.clone()]).unwrap();

        assert!(matches!(
            storage.load_summary(rec.id),
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn dangling_reference_surfaces_as_not_found() {
        let (_dir, storage) = storage();
        let mut rec = recording("dangling");
        // Reference a document that was never written (or deleted externally)
        rec.transcript_id = Some(Uuid::new_v4());
        rec.summary_id = Some(Uuid::new_v4());
        storage.save_recordings(&[rec.clone()]).unwrap();

        assert!(matches!(
            storage.load_transcript(rec.id),
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            storage.load_summary(rec.id),
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn unknown_recording_is_not_found() {
        let (_dir, storage) = storage();
        assert!(matches!(
            storage.load_transcript(Uuid::new_v4()),
            Err(StorageError::NotFound)
        ));
    }
}
