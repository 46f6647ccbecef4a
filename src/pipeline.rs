use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::fetcher::{DocumentFetcher, WebFetcher};
use crate::llm::{CompletionModel, OllamaClient};
use crate::models::{SummaryRequest, SummaryResult};
use crate::parser::ResponseParser;
use crate::prompt::{build_prompt, PromptOptions};

/// Runs fetch, prompt, completion and parse in sequence for one request.
///
/// Holds no per-request state, so one instance serves concurrent requests.
pub struct Summarizer {
    fetcher: Arc<dyn DocumentFetcher>,
    model: Arc<dyn CompletionModel>,
    prompt: PromptOptions,
    parser: ResponseParser,
}

impl Summarizer {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        model: Arc<dyn CompletionModel>,
        prompt: PromptOptions,
        parser: ResponseParser,
    ) -> Self {
        Self {
            fetcher,
            model,
            prompt,
            parser,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(WebFetcher::new(config)?),
            Arc::new(OllamaClient::new(config)?),
            PromptOptions::from_config(config),
            ResponseParser::new(config.tag_delimiter.clone()),
        ))
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    #[tracing::instrument(skip_all, fields(url = %request.url))]
    pub async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResult> {
        let start = Instant::now();

        let document = self.fetcher.fetch(&request.url).await?;
        if document.text.trim().is_empty() {
            return Err(AppError::fetch(&request.url, "no readable text was found"));
        }
        info!(
            source = document.source.as_str(),
            title = document.title.as_deref().unwrap_or(""),
            chars = document.char_count(),
            elapsed = ?start.elapsed(),
            "document fetched"
        );

        let prompt = build_prompt(&document, &self.prompt);
        debug!(prompt_chars = prompt.chars().count(), "prompt built");

        let llm_start = Instant::now();
        let raw = self.model.complete(&prompt).await?;
        debug!(elapsed = ?llm_start.elapsed(), raw = %raw, "completion received");

        let result = self.parser.parse(&raw)?;
        self.check_summary_length(&result);

        info!(
            tags = result.tags.len(),
            elapsed = ?start.elapsed(),
            "summary ready"
        );
        Ok(result)
    }

    /// The length range is asked for in the prompt, not enforced.
    fn check_summary_length(&self, result: &SummaryResult) {
        let chars = result.summary.chars().count();
        if chars < self.prompt.min_chars || chars > self.prompt.max_chars {
            warn!(
                chars,
                min = self.prompt.min_chars,
                max = self.prompt.max_chars,
                "summary length outside requested range"
            );
        }
    }
}
