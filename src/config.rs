use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{AppError, Result};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Sites whose article text only appears once scripts have run.
const DEFAULT_BROWSER_DOMAINS: &str = "juejin.cn,163.com,guokr.com,baidu.com,smzdm.com,nmc.cn,\
    52pojie.cn,toutiao.com,sspai.com,sina.com.cn,hupu.com,51cto.com,ithome.com,news.qq.com,\
    nodeseek.com,thepaper.cn,hellogithub.com,miyoushe.com";

/// How ordinary web pages are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Render the page in a headless browser driven over WebDriver.
    Browser,
    /// Plain HTTP GET and HTML text extraction.
    Static,
    /// Static extraction first; the browser for `BROWSER_DOMAINS` and for
    /// pages whose static extraction fails or comes back empty.
    Auto,
}

impl FromStr for FetchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" | "webdriver" => Ok(FetchMode::Browser),
            "static" | "http" => Ok(FetchMode::Static),
            "auto" => Ok(FetchMode::Auto),
            other => Err(AppError::Config(format!(
                "Invalid FETCH_MODE '{}', expected 'browser', 'static' or 'auto'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,

    pub ollama_base_url: String,
    pub ollama_model: String,
    pub model_temperature: f32,
    pub model_context_tokens: u32,
    pub model_timeout: Duration,

    pub summary_language: String,
    pub summary_min_chars: usize,
    pub summary_max_chars: usize,
    pub summary_min_tags: usize,
    pub summary_max_tags: usize,
    pub max_input_chars: usize,
    pub tag_delimiter: String,

    pub fetch_mode: FetchMode,
    pub browser_domains: Vec<String>,
    pub webdriver_url: String,
    pub page_load_timeout: Duration,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub transcript_languages: Vec<String>,

    pub request_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Missing or blank
    /// values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        // Server
        let host = var("HOST", "127.0.0.1");
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;
        let port: u16 = parse("PORT", &var("PORT", "8001"))?;

        // Model service
        let ollama_base_url = var("OLLAMA_BASE_URL", "http://127.0.0.1:11434");
        Url::parse(&ollama_base_url)
            .map_err(|e| AppError::Config(format!("Invalid OLLAMA_BASE_URL: {}", e)))?;

        // Fetching
        let webdriver_url = var("WEBDRIVER_URL", "http://localhost:4444");
        Url::parse(&webdriver_url)
            .map_err(|e| AppError::Config(format!("Invalid WEBDRIVER_URL: {}", e)))?;

        let transcript_languages = list(&var("TRANSCRIPT_LANGUAGES", "en"));
        let browser_domains = list(&var("BROWSER_DOMAINS", DEFAULT_BROWSER_DOMAINS))
            .into_iter()
            .map(|domain| domain.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        let config = Config {
            server_addr: SocketAddr::new(ip, port),
            ollama_base_url,
            ollama_model: var("OLLAMA_MODEL", "gemma3:4b"),
            model_temperature: parse("MODEL_TEMPERATURE", &var("MODEL_TEMPERATURE", "0"))?,
            model_context_tokens: parse("MODEL_CONTEXT_TOKENS", &var("MODEL_CONTEXT_TOKENS", "8192"))?,
            model_timeout: seconds("MODEL_TIMEOUT_SECS", &var("MODEL_TIMEOUT_SECS", "180"))?,
            summary_language: var("SUMMARY_LANGUAGE", "English"),
            summary_min_chars: parse("SUMMARY_MIN_CHARS", &var("SUMMARY_MIN_CHARS", "120"))?,
            summary_max_chars: parse("SUMMARY_MAX_CHARS", &var("SUMMARY_MAX_CHARS", "220"))?,
            summary_min_tags: parse("SUMMARY_MIN_TAGS", &var("SUMMARY_MIN_TAGS", "3"))?,
            summary_max_tags: parse("SUMMARY_MAX_TAGS", &var("SUMMARY_MAX_TAGS", "6"))?,
            max_input_chars: parse("MAX_INPUT_CHARS", &var("MAX_INPUT_CHARS", "4000"))?,
            // The delimiter is taken verbatim so that a lone space is allowed.
            tag_delimiter: lookup("TAG_DELIMITER")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| ",".to_string()),
            fetch_mode: var("FETCH_MODE", "browser").parse()?,
            browser_domains,
            webdriver_url,
            page_load_timeout: seconds("PAGE_LOAD_TIMEOUT_SECS", &var("PAGE_LOAD_TIMEOUT_SECS", "30"))?,
            http_timeout: seconds("HTTP_TIMEOUT_SECS", &var("HTTP_TIMEOUT_SECS", "20"))?,
            user_agent: var("USER_AGENT", DEFAULT_USER_AGENT),
            transcript_languages,
            request_timeout: seconds("REQUEST_TIMEOUT_SECS", &var("REQUEST_TIMEOUT_SECS", "120"))?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.summary_min_chars > self.summary_max_chars {
            return Err(AppError::Config(format!(
                "SUMMARY_MIN_CHARS ({}) is greater than SUMMARY_MAX_CHARS ({})",
                self.summary_min_chars, self.summary_max_chars
            )));
        }
        if self.summary_min_tags > self.summary_max_tags {
            return Err(AppError::Config(format!(
                "SUMMARY_MIN_TAGS ({}) is greater than SUMMARY_MAX_TAGS ({})",
                self.summary_min_tags, self.summary_max_tags
            )));
        }
        if self.max_input_chars == 0 {
            return Err(AppError::Config("MAX_INPUT_CHARS must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn seconds(key: &str, value: &str) -> Result<Duration> {
    let secs: u64 = parse(key, value)?;
    if secs == 0 {
        return Err(AppError::Config(format!("{} must be positive", key)));
    }
    Ok(Duration::from_secs(secs))
}
