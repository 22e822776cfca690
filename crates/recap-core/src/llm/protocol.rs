//! Per-provider wire formats.
//!
//! Each provider differs in exactly four places: endpoint URL, auth headers,
//! request body shape, and the JSON path of the generated text. Those four
//! axes are data produced by the pure functions in this module; the shared
//! HTTP send/receive/status path in the parent module consumes them. Keeping
//! the functions pure makes every provider's wire format testable without a
//! network.

use serde_json::{Value, json};

use crate::provider::LlmProvider;

pub(crate) const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub(crate) const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
pub(crate) const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";
pub(crate) const MISTRAL_CHAT_URL: &str = "https://api.mistral.ai/v1/chat/completions";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const TEMPERATURE: f64 = 0.3;

/// A fully constructed request, ready for the shared HTTP path.
#[derive(Debug, PartialEq)]
pub(crate) struct WireRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

/// Build the provider-specific request for one generation call.
///
/// `api_key` is ignored for Ollama; `ollama_url` is ignored for everything
/// else.
pub(crate) fn build_request(
    provider: &LlmProvider,
    model: &str,
    instruction: &str,
    text: &str,
    api_key: &str,
    ollama_url: &str,
) -> WireRequest {
    match provider {
        LlmProvider::OpenAi => WireRequest {
            url: OPENAI_CHAT_URL.to_string(),
            headers: vec![("Authorization", format!("Bearer {api_key}"))],
            body: json!({
                "model": model,
                "messages": [
                    {"role": "system", "content": instruction},
                    {"role": "user", "content": text}
                ],
                "temperature": TEMPERATURE,
            }),
        },
        LlmProvider::Anthropic => WireRequest {
            url: ANTHROPIC_MESSAGES_URL.to_string(),
            headers: vec![
                ("x-api-key", api_key.to_string()),
                ("anthropic-version", ANTHROPIC_VERSION.to_string()),
            ],
            body: json!({
                "model": model,
                "messages": [
                    {"role": "user", "content": format!("{instruction}\n\n{text}")}
                ],
                "max_tokens": 4000,
                "temperature": TEMPERATURE,
            }),
        },
        LlmProvider::Gemini => WireRequest {
            // Gemini parameterizes the URL by model and authenticates via
            // query parameter instead of a header
            url: format!("{GEMINI_BASE_URL}/models/{model}:generateContent?key={api_key}"),
            headers: Vec::new(),
            body: json!({
                "contents": [
                    {"role": "user", "parts": [
                        {"text": format!("{instruction}\n\n{text}")}
                    ]}
                ],
                "generationConfig": {
                    "temperature": TEMPERATURE,
                    "topK": 40,
                    "topP": 0.95,
                    "maxOutputTokens": 8192,
                },
            }),
        },
        LlmProvider::Mistral => WireRequest {
            url: MISTRAL_CHAT_URL.to_string(),
            headers: vec![("Authorization", format!("Bearer {api_key}"))],
            body: json!({
                "model": model,
                "messages": [
                    {"role": "system", "content": instruction},
                    {"role": "user", "content": text}
                ],
                "temperature": TEMPERATURE,
                "max_tokens": 4096,
            }),
        },
        LlmProvider::Ollama => WireRequest {
            url: format!("{}/api/generate", ollama_url.trim_end_matches('/')),
            headers: Vec::new(),
            body: json!({
                "model": model,
                "prompt": format!("{instruction}\n\n{text}"),
                "stream": false,
                "options": {
                    "temperature": TEMPERATURE,
                    "num_predict": 4096,
                },
            }),
        },
    }
}

/// Extract the generated text from a provider's response body.
///
/// Returns `None` when the expected field path is absent.
pub(crate) fn extract_text(provider: &LlmProvider, body: &Value) -> Option<String> {
    let text = match provider {
        LlmProvider::OpenAi | LlmProvider::Mistral => body
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()?,
        LlmProvider::Anthropic => body.get("content")?.get(0)?.get("text")?.as_str()?,
        LlmProvider::Gemini => body
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .get(0)?
            .get("text")?
            .as_str()?,
        LlmProvider::Ollama => body.get("response")?.as_str()?,
    };
    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(provider: &LlmProvider) -> WireRequest {
        build_request(provider, "m1", "Summarize.", "hello world", "sekret", DEFAULT_OLLAMA)
    }

    const DEFAULT_OLLAMA: &str = "http://localhost:11434";

    #[test]
    fn openai_request_shape() {
        let req = request(&LlmProvider::OpenAi);
        assert_eq!(req.url, OPENAI_CHAT_URL);
        assert_eq!(
            req.headers,
            vec![("Authorization", "Bearer sekret".to_string())]
        );
        assert_eq!(req.body["model"], "m1");
        assert_eq!(req.body["messages"][0]["role"], "system");
        assert_eq!(req.body["messages"][0]["content"], "Summarize.");
        assert_eq!(req.body["messages"][1]["role"], "user");
        assert_eq!(req.body["messages"][1]["content"], "hello world");
        assert_eq!(req.body["temperature"], 0.3);
        assert!(req.body.get("max_tokens").is_none());
    }

    #[test]
    fn anthropic_request_shape() {
        let req = request(&LlmProvider::Anthropic);
        assert_eq!(req.url, ANTHROPIC_MESSAGES_URL);
        assert_eq!(req.headers[0], ("x-api-key", "sekret".to_string()));
        assert_eq!(req.headers[1].0, "anthropic-version");
        // Instruction and text collapse into a single user message
        assert_eq!(req.body["messages"][0]["role"], "user");
        assert_eq!(
            req.body["messages"][0]["content"],
            "Summarize.\n\nhello world"
        );
        assert_eq!(req.body["max_tokens"], 4000);
    }

    #[test]
    fn gemini_request_carries_key_in_url() {
        let req = request(&LlmProvider::Gemini);
        assert_eq!(
            req.url,
            "https://generativelanguage.googleapis.com/v1/models/m1:generateContent?key=sekret"
        );
        assert!(req.headers.is_empty());
        assert_eq!(
            req.body["contents"][0]["parts"][0]["text"],
            "Summarize.\n\nhello world"
        );
        assert_eq!(req.body["generationConfig"]["topK"], 40);
        assert_eq!(req.body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn mistral_request_is_openai_shape_plus_max_tokens() {
        let req = request(&LlmProvider::Mistral);
        assert_eq!(req.url, MISTRAL_CHAT_URL);
        assert_eq!(
            req.headers,
            vec![("Authorization", "Bearer sekret".to_string())]
        );
        assert_eq!(req.body["messages"][0]["role"], "system");
        assert_eq!(req.body["max_tokens"], 4096);
    }

    #[test]
    fn ollama_request_uses_single_prompt_field() {
        let req = request(&LlmProvider::Ollama);
        assert_eq!(req.url, "http://localhost:11434/api/generate");
        assert!(req.headers.is_empty());
        assert_eq!(req.body["prompt"], "Summarize.\n\nhello world");
        assert_eq!(req.body["stream"], false);
        assert_eq!(req.body["options"]["num_predict"], 4096);
    }

    #[test]
    fn ollama_url_trailing_slash_is_normalized() {
        let req = build_request(
            &LlmProvider::Ollama,
            "llama3",
            "p",
            "t",
            "",
            "http://box:11434/",
        );
        assert_eq!(req.url, "http://box:11434/api/generate");
    }

    #[test]
    fn extract_openai_and_mistral_path() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Summary text"}}]
        });
        assert_eq!(
            extract_text(&LlmProvider::OpenAi, &body).as_deref(),
            Some("Summary text")
        );
        assert_eq!(
            extract_text(&LlmProvider::Mistral, &body).as_deref(),
            Some("Summary text")
        );
    }

    #[test]
    fn extract_anthropic_path() {
        let body = serde_json::json!({"content": [{"type": "text", "text": "Summary text"}]});
        assert_eq!(
            extract_text(&LlmProvider::Anthropic, &body).as_deref(),
            Some("Summary text")
        );
    }

    #[test]
    fn extract_gemini_path() {
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Summary text"}]}}]
        });
        assert_eq!(
            extract_text(&LlmProvider::Gemini, &body).as_deref(),
            Some("Summary text")
        );
    }

    #[test]
    fn extract_ollama_path() {
        let body = serde_json::json!({"response": "Summary text", "done": true});
        assert_eq!(
            extract_text(&LlmProvider::Ollama, &body).as_deref(),
            Some("Summary text")
        );
    }

    #[test]
    fn extract_returns_none_on_missing_path() {
        let body = serde_json::json!({"error": {"message": "overloaded"}});
        for provider in LlmProvider::all() {
            assert_eq!(extract_text(provider, &body), None);
        }
    }
}
