use std::time::Duration;

use fantoccini::wd::{Capabilities, TimeoutConfiguration};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tracing::{debug, warn};

use super::format_text;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::FetchedDocument;

/// Renders pages in a headless Chrome driven over WebDriver. Every call
/// opens its own session and closes it before returning.
#[derive(Debug, Clone)]
pub struct BrowserRenderer {
    webdriver_url: String,
    user_agent: String,
    page_load_timeout: Duration,
}

impl BrowserRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            user_agent: config.user_agent.clone(),
            page_load_timeout: config.page_load_timeout,
        }
    }

    fn capabilities(&self) -> Capabilities {
        let caps = json!({
            "browserName": "chrome",
            "goog:chromeOptions": {
                "args": [
                    "--headless=new",
                    "--disable-gpu",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    format!("--user-agent={}", self.user_agent),
                ]
            }
        });
        match caps {
            serde_json::Value::Object(map) => map,
            _ => Capabilities::new(),
        }
    }

    pub async fn render(&self, url: &str) -> Result<FetchedDocument> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        let client = builder.connect(&self.webdriver_url).await.map_err(|e| {
            AppError::fetch(
                url,
                format!("could not open a browser session at {}: {}", self.webdriver_url, e),
            )
        })?;
        debug!(webdriver = %self.webdriver_url, "browser session opened");

        let session = Session::new(client);
        let outcome = self.read_page(session.client(), url).await;
        session.close().await;
        outcome
    }

    async fn read_page(&self, client: &Client, url: &str) -> Result<FetchedDocument> {
        client
            .update_timeouts(TimeoutConfiguration::new(None, Some(self.page_load_timeout), None))
            .await
            .map_err(|e| AppError::fetch(url, format!("could not configure browser: {}", e)))?;

        client
            .goto(url)
            .await
            .map_err(|e| AppError::fetch(url, format!("page load failed: {}", e)))?;

        let body = client
            .wait()
            .at_most(self.page_load_timeout)
            .for_element(Locator::Css("body"))
            .await
            .map_err(|e| AppError::fetch(url, format!("page never finished loading: {}", e)))?;

        let title = client.title().await.ok();
        let text = body
            .text()
            .await
            .map_err(|e| AppError::fetch(url, format!("could not read page text: {}", e)))?;

        Ok(FetchedDocument::page(title, format_text(&text)))
    }
}

/// Owns a WebDriver session. `close` ends it; if the owning future is
/// dropped first, the session is ended from a background task instead.
struct Session {
    client: Client,
    closed: bool,
}

impl Session {
    fn new(client: Client) -> Self {
        Self {
            client,
            closed: false,
        }
    }

    fn client(&self) -> &Client {
        &self.client
    }

    async fn close(mut self) {
        self.closed = true;
        close_client(self.client.clone()).await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(close_client(self.client.clone()));
        }
    }
}

async fn close_client(client: Client) {
    match client.close().await {
        Ok(()) => debug!("browser session closed"),
        Err(e) => warn!(error = %e, "failed to close browser session"),
    }
}
