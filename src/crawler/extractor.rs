//! Content extraction from fetched HTML
//!
//! This module turns a fetched page into:
//! - Paragraph-level text chunks that pass the length quality gate
//! - Outbound links, resolved to absolute URLs without fragments
//!
//! Extraction is pure: no network I/O and no crawl state.

use crate::crawler::RawPage;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never counts as page content
const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "aside", "header", "noscript",
];

/// A unit of indexable text taken from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Page the chunk came from
    pub url: Url,

    /// Position of the chunk among the page's qualifying paragraphs
    pub ordinal: usize,

    /// Full paragraph text
    pub text: String,

    /// Truncated text stored alongside the vector
    pub preview: String,
}

impl TextChunk {
    pub fn new(url: Url, ordinal: usize, text: String, preview_length: usize) -> Self {
        let preview = make_preview(&text, preview_length);
        Self {
            url,
            ordinal,
            text,
            preview,
        }
    }
}

/// First `max_chars` characters of `text`, with `...` appended when cut
pub fn make_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Chunks and links extracted from one page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub chunks: Vec<TextChunk>,
    pub links: Vec<Url>,
}

/// Splits a fetched page into text chunks and outbound links
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, page: &RawPage) -> ExtractedPage;
}

/// `scraper`-based extractor for HTML pages
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    /// Paragraphs must be strictly longer than this many characters
    min_chunk_length: usize,
    preview_length: usize,
}

impl HtmlExtractor {
    pub fn new(min_chunk_length: usize, preview_length: usize) -> Self {
        Self {
            min_chunk_length,
            preview_length,
        }
    }
}

impl ContentExtractor for HtmlExtractor {
    /// Parses the page body
    ///
    /// # Chunk Rules
    ///
    /// - Only `<p>` elements outside `script`, `style`, `nav`, `footer`,
    ///   `aside`, `header` and `noscript` subtrees
    /// - Whitespace is collapsed and the text trimmed
    /// - A paragraph qualifies when its length in characters exceeds the
    ///   configured minimum
    ///
    /// # Link Rules
    ///
    /// Anchors inside the same non-content subtrees are skipped, so site
    /// navigation and footers never feed the frontier. Links are resolved
    /// against the page's own (final) URL.
    fn extract(&self, page: &RawPage) -> ExtractedPage {
        let document = Html::parse_document(&page.body);

        let chunks = extract_paragraphs(&document)
            .into_iter()
            .filter(|text| text.chars().count() > self.min_chunk_length)
            .enumerate()
            .map(|(ordinal, text)| {
                TextChunk::new(page.url.clone(), ordinal, text, self.preview_length)
            })
            .collect();

        let links = extract_links(&document, &page.url);

        ExtractedPage { chunks, links }
    }
}

fn is_non_content(element: ElementRef<'_>) -> bool {
    NON_CONTENT_TAGS.contains(&element.value().name())
}

/// Whether `element` sits inside a non-content subtree
fn in_non_content(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(is_non_content)
}

/// Collects the visible text of every content paragraph, in document order
fn extract_paragraphs(document: &Html) -> Vec<String> {
    let mut paragraphs = Vec::new();

    let p_selector = match Selector::parse("p") {
        Ok(s) => s,
        Err(_) => return paragraphs,
    };

    for p in document.select(&p_selector) {
        if in_non_content(p) {
            continue;
        }

        let text = visible_text(p);
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }

    paragraphs
}

/// Text of a paragraph, skipping any nested non-content elements
fn visible_text(p: ElementRef<'_>) -> String {
    let mut raw = String::new();

    for node in p.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let nested_in_non_content = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != p.id())
            .filter_map(ElementRef::wrap)
            .any(is_non_content);
        if !nested_in_non_content {
            raw.push_str(text);
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts followable links from the content part of the document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if in_non_content(element) {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None for `javascript:`, `mailto:`, `tel:` and `data:` targets,
/// fragment-only anchors, unparsable hrefs, and anything that does not
/// resolve to HTTP(S).
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);

    Some(absolute_url)
}
