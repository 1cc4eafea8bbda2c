use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::RemoteConfig;
use crate::error::SourceError;
use crate::sources::QuizRemoteSource;

/// Fetches a remote-config parameter document over HTTP and extracts the quiz.
///
/// The endpoint returns a JSON object mapping parameter names to values; the
/// configured key holds the quiz JSON, usually as a string.
#[derive(Clone)]
pub struct HttpRemoteSource {
    client: Client,
    config: RemoteConfig,
}

impl HttpRemoteSource {
    /// Build a client scoped to `config`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Transport` if the HTTP client cannot be built.
    pub fn new(config: RemoteConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl QuizRemoteSource for HttpRemoteSource {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Transport(format!(
                "remote config returned status {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        tracing::debug!(url = %self.config.url, bytes = body.len(), "fetched remote config");
        extract_parameter(&body, &self.config.key)
    }
}

/// Pull one parameter out of a remote-config document.
///
/// String values are returned verbatim; structured values are re-encoded as JSON.
pub(crate) fn extract_parameter(document: &[u8], key: &str) -> Result<Vec<u8>, SourceError> {
    let mut params: HashMap<String, Value> = serde_json::from_slice(document)
        .map_err(|err| SourceError::Transport(format!("unreadable remote config: {err}")))?;

    match params.remove(key) {
        Some(Value::String(raw)) if !raw.trim().is_empty() => Ok(raw.into_bytes()),
        // An absent or blank parameter means the quiz is not published remotely,
        // so it is reported as missing and the local quiz is used instead.
        Some(Value::Null | Value::String(_)) | None => Err(SourceError::NotFound),
        Some(value) => serde_json::to_vec(&value)
            .map_err(|err| SourceError::Transport(err.to_string())),
    }
}
