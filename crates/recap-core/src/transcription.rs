//! Transcription engine abstraction.
//!
//! The pipeline only knows the [`TranscriptionEngine`] trait: audio file in,
//! text out, with coarse progress along the way. The production
//! implementation talks to an OpenAI-compatible whisper server (e.g.
//! faster-whisper-server), which keeps transcription self-hostable; tests
//! inject scripted fakes.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::http::get_http_client;
use crate::progress::Progress;

/// Default model name for faster-whisper-server
const DEFAULT_WHISPER_MODEL: &str = "Systran/faster-whisper-small";

const TRANSCRIBE_TIMEOUT_SECS: u64 = 600;

/// Speech-recognition authorization, mirrored from the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Authorized,
    Denied,
    Restricted,
    Undetermined,
}

#[derive(Debug, Error)]
pub enum TranscribeError {
    /// The user denied speech-recognition access. Distinct from engine
    /// failure so callers can point at permission settings.
    #[error("speech recognition access denied")]
    PermissionDenied,
    #[error("speech recognition is not available")]
    Unavailable,
    #[error("could not read audio file: {0}")]
    AudioRead(#[from] std::io::Error),
    #[error("transcription engine failed: {0}")]
    EngineFailed(String),
    #[error("network request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Audio file → text, with progress reporting.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Current authorization state of the underlying engine.
    fn authorization(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    async fn transcribe(
        &self,
        audio_path: &Path,
        progress: &Progress,
    ) -> Result<String, TranscribeError>;
}

/// Map a non-authorized state to its error. Engines call this before doing
/// any work.
pub fn check_authorization(status: AuthorizationStatus) -> Result<(), TranscribeError> {
    match status {
        AuthorizationStatus::Authorized => Ok(()),
        AuthorizationStatus::Denied => Err(TranscribeError::PermissionDenied),
        AuthorizationStatus::Restricted | AuthorizationStatus::Undetermined => {
            Err(TranscribeError::Unavailable)
        }
    }
}

/// Response structure for OpenAI-compatible transcription APIs
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcription via an OpenAI-compatible whisper server.
pub struct WhisperApiEngine {
    server_url: Option<String>,
    api_key: Option<String>,
    model: String,
    language: Option<String>,
}

impl WhisperApiEngine {
    pub fn new(server_url: Option<String>) -> Self {
        Self {
            server_url,
            api_key: None,
            model: DEFAULT_WHISPER_MODEL.to_string(),
            language: None,
        }
    }

    pub fn from_settings(settings: &crate::settings::TranscriptionSettings) -> Self {
        Self {
            server_url: settings.server_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_WHISPER_MODEL.to_string()),
            language: settings.language.clone(),
        }
    }

    /// Build the full API URL from the configured server base URL.
    fn api_url(&self) -> Result<String, TranscribeError> {
        let url = self.server_url.as_deref().unwrap_or("").trim();
        if url.is_empty() {
            return Err(TranscribeError::EngineFailed(
                "whisper server URL not configured.\n\
                 Set with: recap config --whisper-url http://localhost:8765"
                    .to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(TranscribeError::EngineFailed(format!(
                "invalid whisper server URL: must start with http:// or https://, got {url}"
            )));
        }
        Ok(format!(
            "{}/v1/audio/transcriptions",
            url.trim_end_matches('/')
        ))
    }
}

#[async_trait]
impl TranscriptionEngine for WhisperApiEngine {
    async fn transcribe(
        &self,
        audio_path: &Path,
        progress: &Progress,
    ) -> Result<String, TranscribeError> {
        check_authorization(self.authorization())?;
        let api_url = self.api_url()?;

        let audio_data = tokio::fs::read(audio_path).await?;
        progress.report(0.1);

        let filename = audio_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let mut form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio_data)
                    .file_name(filename.clone())
                    .mime_str(mime_for(&filename))?,
            );
        if let Some(lang) = self.language.clone() {
            form = form.text("language", lang);
        }
        progress.report(0.3);

        let client = get_http_client()?;
        // Self-hosted servers usually skip auth but the API format expects a
        // bearer token either way
        let bearer = self.api_key.as_deref().unwrap_or("no-auth");
        let response = client
            .post(&api_url)
            .header("Authorization", format!("Bearer {bearer}"))
            .multipart(form)
            .timeout(std::time::Duration::from_secs(TRANSCRIBE_TIMEOUT_SECS))
            .send()
            .await?;
        progress.report(0.7);

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscribeError::EngineFailed(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let text = response.text().await?;
        let resp: WhisperResponse = serde_json::from_str(&text)
            .map_err(|_| TranscribeError::EngineFailed("unexpected response body".to_string()))?;
        progress.report(1.0);

        Ok(resp.text)
    }
}

/// MIME type by file extension, for the multipart upload.
fn mime_for(filename: &str) -> &'static str {
    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    match extension.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "aif" | "aiff" => "audio/aiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_server_url_names_the_config_command() {
        let engine = WhisperApiEngine::new(None);
        let err = engine.api_url().unwrap_err();
        assert!(err.to_string().contains("--whisper-url"));
    }

    #[test]
    fn api_url_appends_transcriptions_endpoint() {
        let engine = WhisperApiEngine::new(Some("http://localhost:8765/".to_string()));
        assert_eq!(
            engine.api_url().unwrap(),
            "http://localhost:8765/v1/audio/transcriptions"
        );
    }

    #[test]
    fn api_url_rejects_missing_scheme() {
        let engine = WhisperApiEngine::new(Some("localhost:8765".to_string()));
        assert!(engine.api_url().is_err());
    }

    #[test]
    fn denied_authorization_is_a_distinct_error() {
        assert!(matches!(
            check_authorization(AuthorizationStatus::Denied),
            Err(TranscribeError::PermissionDenied)
        ));
        assert!(matches!(
            check_authorization(AuthorizationStatus::Restricted),
            Err(TranscribeError::Unavailable)
        ));
        assert!(check_authorization(AuthorizationStatus::Authorized).is_ok());
    }

    #[test]
    fn mime_types_cover_supported_imports() {
        assert_eq!(mime_for("talk.mp3"), "audio/mpeg");
        assert_eq!(mime_for("talk.WAV"), "audio/wav");
        assert_eq!(mime_for("talk.aiff"), "audio/aiff");
        assert_eq!(mime_for("talk.bin"), "application/octet-stream");
    }
}
