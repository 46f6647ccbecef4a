#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use web_summarizer::fetcher::DocumentFetcher;
use web_summarizer::llm::CompletionModel;
use web_summarizer::{AppError, FetchedDocument, Result};

#[derive(Clone)]
pub struct MockFetcher {
    pub document: FetchedDocument,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockFetcher {
    pub fn page(title: &str, text: &str) -> Self {
        Self {
            document: FetchedDocument::page(Some(title.to_string()), text),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            document: FetchedDocument::page(None, ""),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(ref reason) = self.fail_with {
            return Err(AppError::fetch(url, reason));
        }
        Ok(self.document.clone())
    }
}

#[derive(Clone)]
pub struct MockModel {
    pub response: String,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
    pub delay: Option<Duration>,
}

impl MockModel {
    pub fn replying(response: &str) -> Self {
        Self {
            response: response.to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            delay: None,
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            response: String::new(),
            prompts: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(detail.to_string()),
            delay: None,
        }
    }

    /// Replies only after `delay` has passed.
    pub fn slow(response: &str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::replying(response)
        }
    }
}

#[async_trait]
impl CompletionModel for MockModel {
    fn name(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(ref detail) = self.fail_with {
            return Err(AppError::model("http://mock/api/generate", detail));
        }
        Ok(self.response.clone())
    }
}

pub const FOX_TEXT: &str = "The quick brown fox jumps over the lazy dog.";
pub const FOX_RESPONSE: &str =
    "TITLE: Fox Story\nSUMMARY: A short tale about a fox.\nTAGS: animals, fable";
