pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod llm;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod telemetry;

use std::sync::Arc;
use config::Config;
use pipeline::Summarizer;

pub use error::{AppError, Result};
pub use models::{FetchedDocument, SummaryRequest, SummaryResult};

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub summarizer: Arc<Summarizer>,
}
