use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result};

/// A text-completion service: prompt in, raw completion out.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Name of the model answering the prompts.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_ctx: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for the `/api/generate` endpoint of an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
    options: GenerateOptions,
}

impl OllamaClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.model_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build model HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: generate_endpoint(&config.ollama_base_url),
            model: config.ollama_model.clone(),
            options: GenerateOptions {
                temperature: config.model_temperature,
                num_ctx: config.model_context_tokens,
            },
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionModel for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: &self.options,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, prompt_chars = prompt.chars().count(), "sending completion request");

        let res = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::model(&self.endpoint, describe(&e)))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::model(
                &self.endpoint,
                format!("{}: {}", status, excerpt(&text, 300)),
            ));
        }

        let reply: GenerateResponse = res
            .json()
            .await
            .map_err(|e| AppError::model(&self.endpoint, format!("Invalid response format: {}", e)))?;

        Ok(reply.response)
    }
}

fn generate_endpoint(base_url: &str) -> String {
    format!("{}/api/generate", base_url.trim_end_matches('/'))
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

fn excerpt(text: &str, max_chars: usize) -> &str {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
