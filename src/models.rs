use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// A request to summarize the document behind `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub url: String,
}

impl SummaryRequest {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let request = Self {
            url: url.into().trim().to_string(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Checks that the URL is a non-empty absolute `http`/`https` URI.
    ///
    /// Requests built through serde skip [`SummaryRequest::new`], so the API
    /// calls this before handing the request to the pipeline.
    pub fn validate(&self) -> Result<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(AppError::InvalidRequest("url must not be empty".to_string()));
        }

        let parsed = Url::parse(url)
            .map_err(|e| AppError::InvalidRequest(format!("'{}' is not a valid URL: {}", url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::InvalidRequest(format!(
                "unsupported URL scheme '{}', expected http or https",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none() {
            return Err(AppError::InvalidRequest(format!("'{}' has no host", url)));
        }

        Ok(())
    }
}

/// Where the text of a [`FetchedDocument`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSource {
    Page,
    Transcript,
}

impl DocumentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSource::Page => "webpage",
            DocumentSource::Transcript => "video transcript",
        }
    }
}

/// Plain text pulled from a page or a video transcript. The text may be
/// empty when nothing readable was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub title: Option<String>,
    pub text: String,
    pub source: DocumentSource,
}

impl FetchedDocument {
    pub fn page(title: Option<String>, text: impl Into<String>) -> Self {
        Self::new(title, text.into(), DocumentSource::Page)
    }

    pub fn transcript(title: Option<String>, text: impl Into<String>) -> Self {
        Self::new(title, text.into(), DocumentSource::Transcript)
    }

    fn new(title: Option<String>, text: String, source: DocumentSource) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { title, text, source }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// The structured summary returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
}

impl fmt::Display for SummaryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Summary: {}", self.summary)?;
        write!(f, "Tags: {}", self.tags.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_http_and_https() {
        assert!(SummaryRequest::new("https://example.com/article").is_ok());
        assert!(SummaryRequest::new("  http://example.com  ").is_ok());
    }

    #[test]
    fn request_rejects_empty_and_malformed_urls() {
        for url in ["", "   ", "not a url", "ftp://example.com/file", "mailto:someone@example.com"] {
            let err = SummaryRequest::new(url).unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)), "{url:?} gave {err:?}");
        }
    }

    #[test]
    fn document_drops_blank_titles() {
        let doc = FetchedDocument::page(Some("   ".to_string()), "body");
        assert_eq!(doc.title, None);

        let doc = FetchedDocument::transcript(Some(" A talk ".to_string()), "words");
        assert_eq!(doc.title.as_deref(), Some("A talk"));
        assert_eq!(doc.source, DocumentSource::Transcript);
    }

    #[test]
    fn result_serializes_to_flat_object() {
        let result = SummaryResult {
            title: "Fox Story".to_string(),
            summary: "A short tale about a fox.".to_string(),
            tags: vec!["animals".to_string(), "fable".to_string()],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "title": "Fox Story",
                "summary": "A short tale about a fox.",
                "tags": ["animals", "fable"],
            })
        );
    }

    #[test]
    fn result_displays_one_field_per_line() {
        let result = SummaryResult {
            title: "Fox Story".to_string(),
            summary: "A short tale about a fox.".to_string(),
            tags: vec!["animals".to_string(), "fable".to_string()],
        };
        assert_eq!(
            result.to_string(),
            "Title: Fox Story\nSummary: A short tale about a fox.\nTags: animals, fable"
        );
    }
}
