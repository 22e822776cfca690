//! Shared HTTP client for all outbound requests.
//!
//! A single lazily-built `reqwest::Client` is reused across the LLM client
//! and the transcription engine so connections are pooled. Timeouts are set
//! per request, since local inference servers need far longer than cloud
//! APIs.

use once_cell::sync::OnceCell;

static HTTP_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

/// Get the shared HTTP client, building it on first use.
pub fn get_http_client() -> Result<&'static reqwest::Client, reqwest::Error> {
    HTTP_CLIENT.get_or_try_init(|| reqwest::Client::builder().build())
}
