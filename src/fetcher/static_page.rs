use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use super::format_text;
use crate::error::{AppError, Result};
use crate::models::FetchedDocument;

// Create static selectors to avoid recompiling them each time
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body").expect("Failed to parse body selector")
});
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("head > title, title").expect("Failed to parse title selector")
});
static MAIN_CONTENT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"article, main, [role="main"]"#).expect("Failed to parse main content selector")
});
static OG_TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="og:title"]"#).expect("Failed to parse og:title selector")
});

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe", "head"];

/// Page furniture around the article: menus, sidebars, comment forms.
const BOILERPLATE_ELEMENTS: &[&str] = &["nav", "aside", "footer", "form", "dialog"];

/// Elements that start a new line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Reads pages with a plain GET, without running their scripts.
#[derive(Debug, Clone)]
pub struct StaticPageFetcher {
    client: Client,
}

impl StaticPageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let html = self.fetch_html(url).await?;
        Ok(extract_document(&html))
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AppError::fetch(url, e))?;

        response.text().await.map_err(|e| AppError::fetch(url, e))
    }
}

/// Extracts the title and the readable text of an HTML document.
///
/// The text comes from the largest `article`/`main` element when the page
/// has one, otherwise from `<body>` with its site header left out. Menus,
/// sidebars and footers are skipped either way.
pub fn extract_document(html: &str) -> FetchedDocument {
    let document = Html::parse_document(html);

    let main_text = document
        .select(&MAIN_CONTENT_SELECTOR)
        .map(|element| format_text(&visible_text(element, BOILERPLATE_ELEMENTS)))
        .max_by_key(|text| text.chars().count())
        .filter(|text| !text.is_empty());

    let text = main_text.unwrap_or_else(|| {
        let mut skipped = BOILERPLATE_ELEMENTS.to_vec();
        skipped.push("header");
        document
            .select(&BODY_SELECTOR)
            .next()
            .map(|body| format_text(&visible_text(body, &skipped)))
            .unwrap_or_default()
    });

    FetchedDocument::page(extract_title(&document), text)
}

fn extract_title(document: &Html) -> Option<String> {
    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|element| element.text().collect::<String>())
        .filter(|title| !title.trim().is_empty());

    title.or_else(|| {
        document
            .select(&OG_TITLE_SELECTOR)
            .next()
            .and_then(|element| element.value().attr("content"))
            .map(str::to_string)
    })
}

/// Text under `root`, leaving out hidden elements and anything inside one of
/// `skipped` (checked up to `root` only).
fn visible_text(root: ElementRef<'_>, skipped: &[&str]) -> String {
    let mut result = String::new();

    for node in root.descendants() {
        match node.value() {
            Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name()) => {
                result.push('\n');
            }
            Node::Text(text) => {
                let hidden = node
                    .ancestors()
                    .take_while(|ancestor| ancestor.id() != root.id())
                    .any(|ancestor| match ancestor.value() {
                        Node::Element(e) => {
                            HIDDEN_ELEMENTS.contains(&e.name()) || skipped.contains(&e.name())
                        }
                        _ => false,
                    });
                if !hidden {
                    result.push_str(text);
                }
            }
            _ => {}
        }
    }

    result
}
