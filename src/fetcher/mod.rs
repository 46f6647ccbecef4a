//! Turning a URL into plain text.
//!
//! Video links go to [`TranscriptFetcher`]. Other pages are rendered by
//! [`BrowserRenderer`] or read by [`StaticPageFetcher`], depending on the
//! [`FetchMode`]. In auto mode the static reader goes first and the browser
//! takes over for listed domains and for pages it could not read.

mod browser;
mod static_page;
mod transcript;

pub use browser::BrowserRenderer;
pub use static_page::{extract_document, StaticPageFetcher};
pub use transcript::{video_id, TranscriptFetcher};

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};
use url::Url;

use crate::config::{Config, FetchMode};
use crate::error::{AppError, Result};
use crate::models::FetchedDocument;

#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument>;
}

/// The default fetcher, routing each URL to the right strategy.
pub struct WebFetcher {
    mode: FetchMode,
    browser_domains: Vec<String>,
    browser: BrowserRenderer,
    pages: StaticPageFetcher,
    transcripts: TranscriptFetcher,
}

impl WebFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = http_client(config)?;

        Ok(Self {
            mode: config.fetch_mode,
            browser_domains: config.browser_domains.clone(),
            browser: BrowserRenderer::new(config),
            pages: StaticPageFetcher::new(client.clone()),
            transcripts: TranscriptFetcher::new(client, config.transcript_languages.clone()),
        })
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    async fn fetch_auto(&self, url: &str) -> Result<FetchedDocument> {
        if needs_browser(url, &self.browser_domains) {
            debug!(%url, "domain is listed for the browser");
            return self.browser.render(url).await;
        }

        match self.pages.fetch(url).await {
            Ok(document) if !document.text.is_empty() => Ok(document),
            Ok(_) => {
                debug!(%url, "static extraction found no text, rendering in browser");
                self.browser.render(url).await
            }
            Err(e) => {
                warn!(%url, error = %e, "static fetch failed, rendering in browser");
                self.browser.render(url).await
            }
        }
    }
}

/// Whether the URL's host is one of `domains` or a subdomain of one.
fn needs_browser(url: &str, domains: &[String]) -> bool {
    let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_ascii_lowercase)) else {
        return false;
    };
    domains.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

#[async_trait]
impl DocumentFetcher for WebFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        if let Some(id) = video_id(url) {
            debug!(%url, video_id = %id, "fetching video transcript");
            return self.transcripts.fetch(url).await;
        }

        match self.mode {
            FetchMode::Browser => {
                debug!(%url, "rendering page in browser");
                self.browser.render(url).await
            }
            FetchMode::Static => {
                debug!(%url, "fetching static page");
                self.pages.fetch(url).await
            }
            FetchMode::Auto => self.fetch_auto(url).await,
        }
    }
}

fn http_client(config: &Config) -> Result<Client> {
    ClientBuilder::new()
        .timeout(config.http_timeout)
        .connect_timeout(config.http_timeout.min(std::time::Duration::from_secs(5)))
        .pool_max_idle_per_host(10)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Collapses runs of whitespace inside each line and drops blank lines.
pub(crate) fn format_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let mut words = line.split_whitespace().peekable();
        if words.peek().is_none() {
            continue;
        }
        if !result.is_empty() {
            result.push('\n');
        }
        for (i, word) in words.enumerate() {
            if i > 0 {
                result.push(' ');
            }
            result.push_str(word);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_text_collapses_whitespace_and_blank_lines() {
        let raw = "\n\n   Hello    world \n\t\n  second\tline  \n\n";
        assert_eq!(format_text(raw), "Hello world\nsecond line");
    }

    #[test]
    fn format_text_of_whitespace_is_empty() {
        assert_eq!(format_text(" \n\t \n"), "");
    }

    #[test]
    fn fetcher_follows_configured_mode() {
        let config = Config::from_lookup(|key| match key {
            "FETCH_MODE" => Some("static".to_string()),
            _ => None,
        })
        .unwrap();
        let fetcher = WebFetcher::new(&config).unwrap();
        assert_eq!(fetcher.mode(), FetchMode::Static);
    }

    #[test]
    fn listed_domains_and_their_subdomains_need_the_browser() {
        let domains = vec!["163.com".to_string(), "news.qq.com".to_string()];

        assert!(needs_browser("https://163.com/article/1", &domains));
        assert!(needs_browser("https://www.163.com/dy/article/ABC.html", &domains));
        assert!(needs_browser("https://NEWS.QQ.com/rain/a/1", &domains));
        assert!(!needs_browser("https://qq.com/", &domains));
        assert!(!needs_browser("https://evil163.com/", &domains));
        assert!(!needs_browser("https://example.com/?ref=163.com", &domains));
        assert!(!needs_browser("not a url", &domains));
    }

    #[tokio::test]
    async fn auto_mode_falls_back_to_the_browser_when_static_fetch_fails() {
        let config = Config::from_lookup(|key| match key {
            "FETCH_MODE" => Some("auto".to_string()),
            "WEBDRIVER_URL" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        })
        .unwrap();
        let fetcher = WebFetcher::new(&config).unwrap();

        let err = fetcher.fetch("http://127.0.0.1:9/article").await.unwrap_err();
        match err {
            AppError::Fetch { reason, .. } => assert!(reason.contains("browser session"), "{reason}"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn static_mode_never_opens_a_browser() {
        let config = Config::from_lookup(|key| match key {
            "FETCH_MODE" => Some("static".to_string()),
            "WEBDRIVER_URL" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        })
        .unwrap();
        let fetcher = WebFetcher::new(&config).unwrap();

        let err = fetcher.fetch("http://127.0.0.1:9/article").await.unwrap_err();
        match err {
            AppError::Fetch { reason, .. } => assert!(!reason.contains("browser session"), "{reason}"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }
}
