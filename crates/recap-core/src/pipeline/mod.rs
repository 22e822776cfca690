//! Pipeline orchestrator.
//!
//! Drives each recording through its stages (audio, then transcript, then
//! summary), persisting intermediate state so every stage can be
//! independently loaded, retried or regenerated:
//!
//! 1. A placeholder document (`Pending`, empty text) is persisted and the
//!    recording's reference repointed *before* the job runs, so a crash
//!    mid-job leaves discoverable state.
//! 2. The engine/LLM call runs as a background task reporting progress.
//! 3. Completion persists the terminal document: `Ready` with text on
//!    success, `Failed` with empty text on error. Failed documents are kept
//!    as evidence of the attempt, never rolled back.
//!
//! The orchestrator owns the canonical in-memory recording list; storage
//! holds the durable copy. Jobs are tracked per `(recording, stage)` with a
//! generation counter: a second transcription for the same recording is
//! rejected with [`PipelineError::AlreadyInFlight`] while one is running,
//! while a second summary request supersedes the first: the superseded
//! job's completion is discarded instead of persisted (last writer by job
//! start order wins).
//!
//! Caller contract: `begin_summary` trusts that the caller checked the
//! transcript via [`Pipeline::summary_input`] first; it does not re-check
//! mid-flight.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::audio::{CaptureError, ImportError, import_audio};
use crate::llm::{LlmError, TextGenerator};
use crate::model::{DocumentStatus, Recording, Summary, Transcript};
use crate::progress::Progress;
use crate::provider::LlmProvider;
use crate::settings::Settings;
use crate::storage::{Storage, StorageError};
use crate::transcription::{TranscribeError, TranscriptionEngine};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("a transcription job for this recording is already running")]
    AlreadyInFlight,
    #[error("transcript is not ready for summarization")]
    TranscriptNotReady,
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Transcribe(#[from] TranscribeError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("background job terminated unexpectedly")]
    JobTerminated,
}

/// Handle to an in-flight transcription or summary job.
#[derive(Debug)]
pub struct JobHandle {
    progress: watch::Receiver<f32>,
    handle: JoinHandle<Result<(), PipelineError>>,
}

impl JobHandle {
    /// Progress fraction in `[0, 1]`, monotonically non-decreasing. The
    /// channel closes when the job reaches a terminal state.
    pub fn progress(&self) -> watch::Receiver<f32> {
        self.progress.clone()
    }

    /// Wait for the job to finish and surface its error, if any.
    pub async fn wait(self) -> Result<(), PipelineError> {
        match self.handle.await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::JobTerminated),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum JobKind {
    Transcribe,
    Summarize,
}

#[derive(Default)]
struct JobState {
    generation: u64,
    running: bool,
}

pub struct Pipeline {
    storage: Storage,
    engine: Arc<dyn TranscriptionEngine>,
    generator: Arc<dyn TextGenerator>,
    settings: Settings,
    recordings: Mutex<Vec<Recording>>,
    jobs: Mutex<HashMap<(Uuid, JobKind), JobState>>,
}

impl Pipeline {
    pub fn new(
        storage: Storage,
        engine: Arc<dyn TranscriptionEngine>,
        generator: Arc<dyn TextGenerator>,
        settings: Settings,
    ) -> Self {
        Self {
            storage,
            engine,
            generator,
            settings,
            recordings: Mutex::new(Vec::new()),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Directory where captured and imported audio lands.
    pub fn audio_dir(&self) -> PathBuf {
        self.storage.audio_dir()
    }

    // ── Recording list ──

    /// Load the durable index into the in-memory list, newest first.
    pub fn load(&self) -> Result<(), PipelineError> {
        let mut recordings = self.storage.load_recordings()?;
        recordings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        *self.recordings.lock().unwrap() = recordings;
        Ok(())
    }

    pub fn recordings(&self) -> Vec<Recording> {
        self.recordings.lock().unwrap().clone()
    }

    pub fn recording(&self, id: Uuid) -> Option<Recording> {
        self.recordings
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Insert a freshly captured or imported recording and persist the index.
    pub fn add_recording(&self, recording: Recording) -> Result<(), PipelineError> {
        let mut recordings = self.recordings.lock().unwrap();
        recordings.insert(0, recording);
        self.storage.save_recordings(&recordings)?;
        Ok(())
    }

    /// Delete a recording and its backing audio file. Transcript and summary
    /// documents are orphaned, not collected (see module docs).
    pub fn delete_recording(&self, id: Uuid) -> Result<(), PipelineError> {
        let mut recordings = self.recordings.lock().unwrap();
        let index = recordings
            .iter()
            .position(|r| r.id == id)
            .ok_or(PipelineError::NotFound)?;

        let removed = recordings.remove(index);
        if let Err(err) = std::fs::remove_file(&removed.audio_path)
            && err.kind() != std::io::ErrorKind::NotFound
        {
            crate::warn!(
                "failed to remove audio file {}: {err}",
                removed.audio_path.display()
            );
        }
        self.storage.save_recordings(&recordings)?;
        Ok(())
    }

    /// Import an external audio file and register the resulting recording.
    pub async fn import(&self, source: &Path, title: &str) -> Result<Recording, PipelineError> {
        let recording = import_audio(source, title, &self.audio_dir()).await?;
        self.add_recording(recording.clone())?;
        Ok(recording)
    }

    // ── Transcription ──

    /// Start transcribing a recording.
    ///
    /// Persists a `Pending` placeholder transcript and repoints the
    /// recording's reference before the engine runs, then drives the engine
    /// in a background task. Fails with [`PipelineError::AlreadyInFlight`]
    /// when a transcription for this recording is still running; retrying
    /// after a failure creates a fresh placeholder with a new id, orphaning
    /// the previous document.
    pub fn begin_transcription(self: &Arc<Self>, recording_id: Uuid) -> Result<JobHandle, PipelineError> {
        let recording = self.recording(recording_id).ok_or(PipelineError::NotFound)?;
        let generation = self.claim_job(recording_id, JobKind::Transcribe)?;

        let transcript = Transcript::pending(recording_id);
        if let Err(err) = self.persist_placeholder_transcript(&transcript, recording_id) {
            self.release_job(recording_id, JobKind::Transcribe, generation);
            return Err(err);
        }

        let (progress, rx) = Progress::new();
        let this = Arc::clone(self);
        let audio_path = recording.audio_path.clone();
        let handle = tokio::spawn(async move {
            let result = this.engine.transcribe(&audio_path, &progress).await;
            this.finish_transcription(transcript, generation, result)
        });

        Ok(JobHandle {
            progress: rx,
            handle,
        })
    }

    fn persist_placeholder_transcript(
        &self,
        transcript: &Transcript,
        recording_id: Uuid,
    ) -> Result<(), PipelineError> {
        self.storage.save_transcript(transcript)?;
        self.update_recording(recording_id, |r| r.transcript_id = Some(transcript.id))
    }

    fn finish_transcription(
        &self,
        mut transcript: Transcript,
        generation: u64,
        result: Result<String, TranscribeError>,
    ) -> Result<(), PipelineError> {
        let recording_id = transcript.recording_id;
        if self.is_stale(recording_id, JobKind::Transcribe, generation) {
            crate::verbose!("discarding stale transcription result for {recording_id}");
            return Ok(());
        }

        let outcome = match result {
            Ok(text) => {
                transcript.text = text;
                transcript.status = DocumentStatus::Ready;
                Ok(())
            }
            Err(err) => {
                // Keep the empty placeholder as evidence of the attempt
                transcript.status = DocumentStatus::Failed;
                Err(PipelineError::from(err))
            }
        };

        // Background save: in-memory state stays the session's source of
        // truth even if the write fails
        if let Err(err) = self.storage.save_transcript(&transcript) {
            crate::warn!("failed to persist transcript {}: {err}", transcript.id);
        }
        self.release_job(recording_id, JobKind::Transcribe, generation);
        outcome
    }

    /// Fetch the transcript referenced by a recording.
    pub fn load_transcript(&self, recording_id: Uuid) -> Result<Transcript, PipelineError> {
        map_not_found(self.storage.load_transcript(recording_id))
    }

    // ── Summarization ──

    /// Resolve and validate the transcript a summary would be generated
    /// from. This is the caller-side `TranscriptNotReady` check that
    /// `begin_summary` itself relies on.
    pub fn summary_input(&self, recording_id: Uuid) -> Result<Transcript, PipelineError> {
        let transcript = self.load_transcript(recording_id)?;
        if transcript.status.is_processing() || transcript.text.is_empty() {
            return Err(PipelineError::TranscriptNotReady);
        }
        Ok(transcript)
    }

    /// Start generating a summary for a transcript.
    ///
    /// Symmetric with [`Pipeline::begin_transcription`], except a newer
    /// summary request supersedes a running one instead of being rejected:
    /// the superseded job's completion is discarded by generation check.
    pub fn begin_summary(
        self: &Arc<Self>,
        transcript: &Transcript,
        provider: LlmProvider,
        model: &str,
    ) -> Result<JobHandle, PipelineError> {
        let recording_id = transcript.recording_id;
        if self.recording(recording_id).is_none() {
            return Err(PipelineError::NotFound);
        }
        let generation = self.claim_job(recording_id, JobKind::Summarize)?;

        let summary = Summary::pending(transcript.id, recording_id, provider.label(model));
        if let Err(err) = self.persist_placeholder_summary(&summary, recording_id) {
            self.release_job(recording_id, JobKind::Summarize, generation);
            return Err(err);
        }

        let (progress, rx) = Progress::new();
        let this = Arc::clone(self);
        let text = transcript.text.clone();
        let instruction = self.settings.summary_instruction();
        let model = model.to_string();
        let handle = tokio::spawn(async move {
            let result = this
                .generator
                .generate(&text, &instruction, &provider, &model, &progress)
                .await;
            this.finish_summary(summary, generation, result)
        });

        Ok(JobHandle {
            progress: rx,
            handle,
        })
    }

    fn persist_placeholder_summary(
        &self,
        summary: &Summary,
        recording_id: Uuid,
    ) -> Result<(), PipelineError> {
        self.storage.save_summary(summary)?;
        self.update_recording_checked(recording_id, |r| {
            // A summary reference may never exist without a transcript
            // reference
            if r.transcript_id.is_none() {
                return Err(PipelineError::TranscriptNotReady);
            }
            r.summary_id = Some(summary.id);
            Ok(())
        })
    }

    fn finish_summary(
        &self,
        mut summary: Summary,
        generation: u64,
        result: Result<String, LlmError>,
    ) -> Result<(), PipelineError> {
        let recording_id = summary.recording_id;
        if self.is_stale(recording_id, JobKind::Summarize, generation) {
            crate::verbose!("discarding stale summary result for {recording_id}");
            return Ok(());
        }

        let outcome = match result {
            Ok(text) => {
                summary.text = text;
                summary.status = DocumentStatus::Ready;
                Ok(())
            }
            Err(err) => {
                summary.status = DocumentStatus::Failed;
                Err(PipelineError::from(err))
            }
        };

        if let Err(err) = self.storage.save_summary(&summary) {
            crate::warn!("failed to persist summary {}: {err}", summary.id);
        }
        self.release_job(recording_id, JobKind::Summarize, generation);
        outcome
    }

    /// Fetch the summary referenced by a recording.
    pub fn load_summary(&self, recording_id: Uuid) -> Result<Summary, PipelineError> {
        map_not_found(self.storage.load_summary(recording_id))
    }

    // ── Job bookkeeping ──

    fn claim_job(&self, id: Uuid, kind: JobKind) -> Result<u64, PipelineError> {
        let mut jobs = self.jobs.lock().unwrap();
        let state = jobs.entry((id, kind)).or_default();
        if kind == JobKind::Transcribe && state.running {
            return Err(PipelineError::AlreadyInFlight);
        }
        state.generation += 1;
        state.running = true;
        Ok(state.generation)
    }

    fn release_job(&self, id: Uuid, kind: JobKind, generation: u64) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(state) = jobs.get_mut(&(id, kind))
            && state.generation == generation
        {
            state.running = false;
        }
    }

    fn is_stale(&self, id: Uuid, kind: JobKind, generation: u64) -> bool {
        let jobs = self.jobs.lock().unwrap();
        jobs.get(&(id, kind))
            .map(|state| state.generation != generation)
            .unwrap_or(true)
    }

    // ── Index mutation ──

    fn update_recording(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut Recording),
    ) -> Result<(), PipelineError> {
        self.update_recording_checked(id, |r| {
            mutate(r);
            Ok(())
        })
    }

    fn update_recording_checked(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut Recording) -> Result<(), PipelineError>,
    ) -> Result<(), PipelineError> {
        let mut recordings = self.recordings.lock().unwrap();
        let entry = recordings
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(PipelineError::NotFound)?;
        mutate(entry)?;
        let updated = entry.clone();
        drop(recordings);

        self.storage.update_recording(&updated)?;
        Ok(())
    }
}

fn map_not_found<T>(result: Result<T, StorageError>) -> Result<T, PipelineError> {
    result.map_err(|err| match err {
        StorageError::NotFound => PipelineError::NotFound,
        other => PipelineError::Storage(other),
    })
}
