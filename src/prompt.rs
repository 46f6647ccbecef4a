use crate::config::Config;
use crate::models::FetchedDocument;

/// Constraints the prompt asks the model to honor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub language: String,
    pub min_chars: usize,
    pub max_chars: usize,
    pub min_tags: usize,
    pub max_tags: usize,
    /// Ceiling on the number of document characters placed in the prompt.
    pub max_input_chars: usize,
    pub tag_delimiter: String,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
            min_chars: 120,
            max_chars: 220,
            min_tags: 3,
            max_tags: 6,
            max_input_chars: 4000,
            tag_delimiter: ",".to_string(),
        }
    }
}

impl PromptOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: config.summary_language.clone(),
            min_chars: config.summary_min_chars,
            max_chars: config.summary_max_chars,
            min_tags: config.summary_min_tags,
            max_tags: config.summary_max_tags,
            max_input_chars: config.max_input_chars,
            tag_delimiter: config.tag_delimiter.clone(),
        }
    }
}

pub fn build_prompt(document: &FetchedDocument, options: &PromptOptions) -> String {
    let normalized = normalize_text(&document.text);
    let content = truncate_chars(&normalized, options.max_input_chars);

    let mut result = String::with_capacity(content.len() + 800);
    result.push_str(&format!(
        "You summarize the content of a {}. Write your answer in {}.\n",
        document.source.as_str(),
        options.language
    ));
    result.push_str(
        "Reply with exactly three sections, each starting on its own line with its marker, and nothing else:\n",
    );
    result.push_str("TITLE: a short, descriptive title\n");
    result.push_str(&format!(
        "SUMMARY: one paragraph of {} to {} characters, without line breaks, based only on the content below\n",
        options.min_chars, options.max_chars
    ));
    result.push_str(&format!(
        "TAGS: {} to {} topical tags, nouns or short phrases, most important first, separated by \"{}\"\n",
        options.min_tags, options.max_tags, options.tag_delimiter
    ));
    result.push_str(
        "\nDo not add information that is not in the content. Do not use Markdown, code fences or explanations.\n\n",
    );

    if let Some(title) = &document.title {
        result.push_str(&format!("Original title: {}\n", title));
    }
    result.push_str("Content:\n");
    result.push_str(content);
    result
}

/// Drops trailing whitespace at the end of every line.
fn normalize_text(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps the first `max_chars` characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
