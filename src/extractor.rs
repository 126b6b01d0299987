use regex::Regex;
use scraper::{node::Element, ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::errors::PipelineError;

/// Maximum length of extracted article text, in characters
pub const MAX_CONTENT_CHARS: usize = 8000;

/// Number of paragraphs read from the article body
pub const MAX_PARAGRAPHS: usize = 20;

const NOISE_TAGS: &[&str] = &["script", "style", "table", "sup"];
const NOISE_CLASSES: &[&str] = &["reference", "mw-editsection", "noprint", "mw-empty-elt"];

static CONTENT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#mw-content-text").expect("static selector"));
static PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("static selector"));
static CITATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:\d+|[a-z]|citation needed|note \d+)\]").expect("static regex")
});

fn is_noise(element: &Element) -> bool {
    NOISE_TAGS.contains(&element.name())
        || element.classes().any(|class| NOISE_CLASSES.contains(&class))
}

/// Append the text of `element`, skipping noise subtrees
fn push_prose(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !is_noise(child_element.value()) {
                push_prose(child_element, out);
            }
        }
    }
}

fn inside_noise(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_noise(ancestor.value()))
}

/// Text of the first paragraphs of the main content container
fn paragraph_text(document: &Html) -> String {
    let Some(container) = document.select(&CONTENT_SELECTOR).next() else {
        return String::new();
    };

    container
        .select(&PARAGRAPH_SELECTOR)
        .filter(|paragraph| !inside_noise(*paragraph))
        .take(MAX_PARAGRAPHS)
        .map(|paragraph| {
            let mut text = String::new();
            push_prose(paragraph, &mut text);
            text.trim().to_string()
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse every whitespace run to a single space and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the article text from the rendered page and the optional summary.
///
/// The result is a single line with no repeated spaces and at most
/// [`MAX_CONTENT_CHARS`] characters.
pub fn extract_article_text(html: &str, summary: &str) -> Result<String, PipelineError> {
    let document = Html::parse_document(html);
    let body = paragraph_text(&document);

    let summary = summary.trim();
    let combined = if summary.is_empty() {
        body
    } else {
        format!("{} {}", summary, body)
    };

    let cleaned = CITATION_MARKER.replace_all(&combined, "");
    if cleaned.trim().is_empty() {
        return Err(PipelineError::EmptyContent);
    }

    let normalized = normalize_whitespace(&cleaned);
    let truncated: String = normalized.chars().take(MAX_CONTENT_CHARS).collect();

    Ok(truncated.trim_end().to_string())
}
