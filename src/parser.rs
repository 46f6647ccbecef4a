//! Parsing of the marker-delimited completions the prompt asks for.
//!
//! The expected shape is:
//!
//! ```text
//! TITLE: <title>
//! SUMMARY: <summary>
//! TAGS: <tag>, <tag>, ...
//! ```
//!
//! A marker is a line that, after optional markdown decoration (`#`, `*`,
//! `_`, `>`, `-`, spaces), starts with the keyword (any case) followed by
//! optional decoration and `:` or `：`. The title comes first and the
//! summary after it; the tag marker may sit before or after the summary.
//! Each section runs to the next located marker. The tag section ends at
//! the first blank or whitespace-only line. A surrounding code fence is
//! ignored.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::SummaryResult;

fn marker_regex(keyword: &str) -> Regex {
    Regex::new(&format!(
        r"(?mi)^[ \t#*_>\-]*{}[ \t*_]*[:：][ \t*_]*",
        keyword
    ))
    .expect("Failed to compile section marker")
}

static TITLE_MARKER: Lazy<Regex> = Lazy::new(|| marker_regex("TITLE"));
static SUMMARY_MARKER: Lazy<Regex> = Lazy::new(|| marker_regex("SUMMARY"));
static TAGS_MARKER: Lazy<Regex> = Lazy::new(|| marker_regex("TAGS"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Title,
    Summary,
    Tags,
}

impl Section {
    pub fn keyword(&self) -> &'static str {
        match self {
            Section::Title => "TITLE",
            Section::Summary => "SUMMARY",
            Section::Tags => "TAGS",
        }
    }

    fn marker(&self) -> &'static Regex {
        match self {
            Section::Title => &TITLE_MARKER,
            Section::Summary => &SUMMARY_MARKER,
            Section::Tags => &TAGS_MARKER,
        }
    }

    /// Finds this section's marker at or after byte offset `from`.
    /// Returns the byte range of the marker itself.
    fn locate(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        self.marker()
            .find_at(text, from)
            .map(|m| (m.start(), m.end()))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone)]
pub struct ResponseParser {
    tag_delimiter: String,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(",")
    }
}

impl ResponseParser {
    pub fn new(tag_delimiter: impl Into<String>) -> Self {
        Self {
            tag_delimiter: tag_delimiter.into(),
        }
    }

    pub fn parse(&self, raw: &str) -> Result<SummaryResult> {
        let text = strip_fence(raw);

        let (_, title_end) = Section::Title
            .locate(text, 0)
            .ok_or(AppError::Format { section: Section::Title })?;
        let (summary_start, summary_end) = Section::Summary
            .locate(text, title_end)
            .ok_or(AppError::Format { section: Section::Summary })?;
        // Tags usually follow the summary, but some models emit them first.
        let tags_marker = Section::Tags.locate(text, title_end);

        let title_stop = match tags_marker {
            Some((tags_start, _)) if tags_start < summary_start => tags_start,
            _ => summary_start,
        };
        let title = inline_text(&text[title_end..title_stop]);
        if title.is_empty() {
            return Err(AppError::Format { section: Section::Title });
        }

        let summary_stop = match tags_marker {
            Some((tags_start, _)) if tags_start > summary_start => tags_start,
            _ => text.len(),
        };
        let summary = inline_text(&text[summary_end..summary_stop]);
        if summary.is_empty() {
            return Err(AppError::Format { section: Section::Summary });
        }

        let tags = tags_marker
            .map(|(tags_start, tags_end)| {
                let stop = if tags_start < summary_start { summary_start } else { text.len() };
                self.split_tags(&text[tags_end..stop])
            })
            .unwrap_or_default();

        Ok(SummaryResult {
            title,
            summary,
            tags,
        })
    }

    fn split_tags(&self, section: &str) -> Vec<String> {
        let mut joined = section
            .trim_start()
            .lines()
            .take_while(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join(&self.tag_delimiter);
        if self.tag_delimiter == "," {
            joined = joined.replace('，', ",");
        }

        joined
            .split(self.tag_delimiter.as_str())
            .map(|tag| tag.trim().trim_start_matches('#').trim())
            .map(|tag| tag.trim_matches(|c: char| c == '*' || c == '_').trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Removes a code fence wrapping the whole completion, if there is one.
fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string, e.g. ```text
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Joins the lines of a section into one line, dropping decoration left
/// behind by bold or italic markers.
fn inline_text(section: &str) -> String {
    section
        .lines()
        .map(|line| line.trim().trim_matches(|c: char| c == '*' || c == '_').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "TITLE: Fox Story\nSUMMARY: A short tale about a fox.\nTAGS: animals, fable";

    fn fox_story() -> SummaryResult {
        SummaryResult {
            title: "Fox Story".to_string(),
            summary: "A short tale about a fox.".to_string(),
            tags: vec!["animals".to_string(), "fable".to_string()],
        }
    }

    #[test]
    fn parses_well_formed_response() {
        let parser = ResponseParser::default();
        assert_eq!(parser.parse(WELL_FORMED).unwrap(), fox_story());
    }

    #[test]
    fn parsing_is_idempotent() {
        let parser = ResponseParser::default();
        let first = parser.parse(WELL_FORMED).unwrap();
        let second = parser.parse(WELL_FORMED).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn tolerates_markdown_decoration_and_case() {
        let raw = "Here you go:\n\n## **Title:** Fox Story\n**summary**: A short tale\nabout a fox.\n- Tags: #animals, #fable\n";
        let result = ResponseParser::default().parse(raw).unwrap();
        assert_eq!(result.title, "Fox Story");
        assert_eq!(result.summary, "A short tale about a fox.");
        assert_eq!(result.tags, vec!["animals", "fable"]);
    }

    #[test]
    fn strips_code_fence() {
        let raw = format!("```text\n{}\n```", WELL_FORMED);
        assert_eq!(ResponseParser::default().parse(&raw).unwrap(), fox_story());
    }

    #[test]
    fn accepts_full_width_punctuation() {
        let raw = "TITLE：狐狸的故事\nSUMMARY：一只狐狸的短篇故事。\nTAGS：动物，寓言";
        let result = ResponseParser::default().parse(raw).unwrap();
        assert_eq!(result.title, "狐狸的故事");
        assert_eq!(result.tags, vec!["动物", "寓言"]);
    }

    #[test]
    fn missing_tags_section_gives_empty_tags() {
        let raw = "TITLE: Fox Story\nSUMMARY: A short tale about a fox.";
        let result = ResponseParser::default().parse(raw).unwrap();
        assert_eq!(result.summary, "A short tale about a fox.");
        assert!(result.tags.is_empty());
    }

    #[test]
    fn empty_tag_list_gives_empty_tags() {
        let raw = "TITLE: Fox Story\nSUMMARY: A short tale about a fox.\nTAGS: , ,";
        let result = ResponseParser::default().parse(raw).unwrap();
        assert!(result.tags.is_empty());
    }

    #[test]
    fn tags_stop_at_blank_line() {
        let raw = "TITLE: Fox\nSUMMARY: A fox.\nTAGS: animals,\nfable\n\nLet me know if you need more.";
        let result = ResponseParser::default().parse(raw).unwrap();
        assert_eq!(result.tags, vec!["animals", "fable"]);
    }

    #[test]
    fn tags_stop_at_whitespace_only_line() {
        let raw = "TITLE: Fox\nSUMMARY: A fox.\nTAGS: animals, fable\n  \nLet me know if you need more.";
        let result = ResponseParser::default().parse(raw).unwrap();
        assert_eq!(result.tags, vec!["animals", "fable"]);
    }

    #[test]
    fn tags_stop_at_crlf_blank_line() {
        let raw = "TITLE: Fox\r\nSUMMARY: A fox.\r\nTAGS: animals,\r\nfable\r\n\r\nLet me know if you need more.";
        let result = ResponseParser::default().parse(raw).unwrap();
        assert_eq!(result.title, "Fox");
        assert_eq!(result.summary, "A fox.");
        assert_eq!(result.tags, vec!["animals", "fable"]);
    }

    #[test]
    fn tags_before_summary_stay_out_of_the_title() {
        let raw = "TITLE: Fox Story\nTAGS: animals, fable\nSUMMARY: A short tale about a fox.";
        assert_eq!(ResponseParser::default().parse(raw).unwrap(), fox_story());
    }

    #[test]
    fn splits_on_configured_delimiter() {
        let raw = "TITLE: Fox\nSUMMARY: A fox.\nTAGS: wild animals; fable ;  ";
        let result = ResponseParser::new(";").parse(raw).unwrap();
        assert_eq!(result.tags, vec!["wild animals", "fable"]);
    }

    #[test]
    fn missing_title_is_a_format_error() {
        let raw = "SUMMARY: A short tale about a fox.\nTAGS: animals";
        let err = ResponseParser::default().parse(raw).unwrap_err();
        assert!(matches!(err, AppError::Format { section: Section::Title }));
    }

    #[test]
    fn missing_summary_is_a_format_error() {
        let raw = "TITLE: Fox Story\nTAGS: animals";
        let err = ResponseParser::default().parse(raw).unwrap_err();
        assert!(matches!(err, AppError::Format { section: Section::Summary }));
    }

    #[test]
    fn summary_before_title_is_not_accepted() {
        let raw = "SUMMARY: A short tale.\nTITLE: Fox Story";
        let err = ResponseParser::default().parse(raw).unwrap_err();
        assert!(matches!(err, AppError::Format { section: Section::Summary }));
    }

    #[test]
    fn blank_title_is_a_format_error() {
        let raw = "TITLE:\nSUMMARY: A short tale about a fox.";
        let err = ResponseParser::default().parse(raw).unwrap_err();
        assert!(matches!(err, AppError::Format { section: Section::Title }));
    }

    #[test]
    fn unstructured_text_names_the_title_section() {
        let err = ResponseParser::default()
            .parse("I think this page is about foxes.")
            .unwrap_err();
        assert_eq!(err.to_string(), "Model response is missing the TITLE section");
    }

    #[test]
    fn keyword_inside_a_sentence_is_not_a_marker() {
        let raw = "The title: something\nTITLE: Real\nSUMMARY: Body.";
        let result = ResponseParser::default().parse(raw).unwrap();
        assert_eq!(result.title, "Real");
    }
}
