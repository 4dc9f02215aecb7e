//! Ollama API streaming client
//!
//! Generation backend for the control loop:
//! - HTTP/1.1 streaming via reqwest
//! - Endpoint: POST /api/generate with `stream: true`
//! - Stop sequences sent line-anchored as `options.stop` and enforced
//!   client-side as well, holding back tokens that may start one

use crate::errors::{AgentError, Result};
use crate::streaming::generator::{StopScanner, TextGenerator, TokenSink};
use crate::streaming::parser::JsonParser;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

/// Default request timeout (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sampling options forwarded to the server
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub num_predict: i32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            num_predict: 256,
        }
    }
}

/// Ollama streaming client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    sampling: SamplingOptions,
}

impl OllamaClient {
    /// Create new Ollama client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL)
    }

    /// Create Ollama client with custom configuration
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        Self::with_timeout(base_url, model, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create Ollama client with an explicit request timeout
    pub fn with_timeout(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AgentError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            sampling: SamplingOptions::default(),
        })
    }

    /// Override sampling options
    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = sampling;
        self
    }

    /// Open a streaming generation request
    ///
    /// # Returns
    /// Stream of raw NDJSON byte chunks
    pub async fn generate_stream(
        &self,
        prompt: &str,
        stop: &[&str],
    ) -> Result<impl futures_util::Stream<Item = Result<Vec<u8>>>> {
        let url = format!("{}/api/generate", self.base_url);
        let request = self.build_request(prompt, stop);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::OllamaApiError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::OllamaApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let stream = response.bytes_stream().map(|result| {
            result
                .map(|bytes| bytes.to_vec())
                .map_err(|e| AgentError::StreamingError(e.to_string()))
        });

        Ok(stream)
    }

    fn build_request(&self, prompt: &str, stop: &[&str]) -> OllamaGenerateRequest {
        OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: true,
            options: RequestOptions {
                // The server matches anywhere; a leading newline keeps quoted markers intact
                stop: stop
                    .iter()
                    .filter(|s| !s.is_empty())
                    .map(|s| format!("\n{}", s))
                    .collect(),
                temperature: self.sampling.temperature,
                num_predict: self.sampling.num_predict,
            },
        }
    }

    /// Read the stream until `done` or a stop sequence shows up
    async fn stream_completion(
        &self,
        prompt: &str,
        stop: &[&str],
        mut on_token: Option<TokenSink<'_>>,
    ) -> Result<String> {
        let stream = self.generate_stream(prompt, stop).await?;
        futures_util::pin_mut!(stream);

        let mut parser = JsonParser::new();
        let mut scanner = StopScanner::new(stop);

        'read: while let Some(bytes) = stream.next().await {
            for chunk in parser.push_chunks(&bytes?)? {
                if let Some(error) = chunk.error {
                    return Err(AgentError::OllamaApiError(error));
                }

                if scanner.push(&chunk.response, &mut on_token) {
                    debug!("stop sequence reached, closing stream");
                    break 'read;
                }

                if chunk.done {
                    break 'read;
                }
            }
        }

        if parser.has_pending() {
            warn!(
                bytes = parser.buffer_size(),
                "stream ended with an incomplete chunk"
            );
        }

        Ok(scanner.finish(&mut on_token))
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AgentError::OllamaApiError(format!("Failed to list models: {}", e)))?;

        if !response.status().is_success() {
            return Err(AgentError::OllamaApiError(
                "Failed to retrieve model list".to_string(),
            ));
        }

        let models_response: ModelsResponse = response
            .json()
            .await
            .map_err(|e| AgentError::OllamaApiError(format!("Failed to parse models: {}", e)))?;

        Ok(models_response
            .models
            .into_iter()
            .map(|m| m.name)
            .collect())
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn sampling(&self) -> SamplingOptions {
        self.sampling
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        stop: &[&str],
        on_token: Option<TokenSink<'_>>,
    ) -> Result<String> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting generation");
        self.stream_completion(prompt, stop, on_token)
            .await
            .map_err(|e| match e {
                AgentError::Generation(_) => e,
                other => AgentError::Generation(other.to_string()),
            })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: RequestOptions,
}

#[derive(Debug, Clone, Serialize)]
struct RequestOptions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    temperature: f32,
    num_predict: i32,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}
