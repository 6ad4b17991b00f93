//! Link extraction from fetched documents
//!
//! This module turns a response body into candidate child URLs:
//! - HTML: every `<a href>` target, resolved against the page's final URL
//! - XML: every `<loc>` inside `<url>` (url-set sitemaps) or `<sitemap>`
//!   (sitemap indexes)
//!
//! Extraction never fails as a whole. Unusable elements are skipped and the
//! rest of the document is still scanned.

use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{Html, Selector};
use url::Url;

/// How a response body should be scanned for links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// An HTML page; anchors are followed
    Html,
    /// A sitemap or sitemap index; `loc` entries are followed
    Xml,
    /// Anything else; no links are extracted
    Other,
}

impl DocumentKind {
    /// Resolves the document kind from a `Content-Type` header value
    ///
    /// # Examples
    ///
    /// ```
    /// use cache_warmer::crawler::DocumentKind;
    ///
    /// assert_eq!(DocumentKind::from_content_type("text/html; charset=utf-8"), DocumentKind::Html);
    /// assert_eq!(DocumentKind::from_content_type("application/xml"), DocumentKind::Xml);
    /// assert_eq!(DocumentKind::from_content_type("image/png"), DocumentKind::Other);
    /// ```
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if mime == "text/html" || mime == "application/xhtml+xml" {
            DocumentKind::Html
        } else if mime == "text/xml" || mime == "application/xml" || mime.ends_with("+xml") {
            DocumentKind::Xml
        } else {
            DocumentKind::Other
        }
    }
}

/// Extracts candidate child URLs from a document
///
/// # Arguments
///
/// * `body` - The response body
/// * `base_url` - The response's final URL, used to resolve relative links
/// * `kind` - How to scan the body
///
/// # Returns
///
/// Absolute http(s) URLs in document order, duplicates included. Dedup is
/// left to the frontier.
///
/// # Example
///
/// ```
/// use cache_warmer::crawler::{extract_links, DocumentKind};
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url, DocumentKind::Html);
/// assert_eq!(links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn extract_links(body: &str, base_url: &Url, kind: DocumentKind) -> Vec<String> {
    match kind {
        DocumentKind::Html => extract_html_links(body, base_url),
        DocumentKind::Xml => extract_sitemap_links(body, base_url),
        DocumentKind::Other => Vec::new(),
    }
}

/// Extracts all anchor targets from an HTML document
fn extract_html_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    // A document <base href> overrides the response URL for resolution.
    let base = base_override(&document, base_url).unwrap_or_else(|| base_url.clone());

    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, &base) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

fn base_override(document: &Html, base_url: &Url) -> Option<Url> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;
    base_url.join(href.trim()).ok()
}

/// Extracts `loc` entries from a sitemap or sitemap index
///
/// Only `loc` elements whose parent is `url` or `sitemap` count, so image and
/// video extension tags (`image:loc`) inside a `url` entry are ignored.
/// A syntax error ends the scan; entries read before it are kept.
fn extract_sitemap_links(xml: &str, base_url: &Url) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    reader.check_end_names(false);

    let mut links = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    // Text of the `loc` currently open; None when outside one or when it
    // contained undecodable text.
    let mut current: Option<String> = None;
    let mut in_loc = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                in_loc = name == b"loc" && is_loc_parent(stack.last());
                if in_loc {
                    current = Some(String::new());
                }
                stack.push(name);
            }
            Ok(Event::End(_)) => {
                if in_loc {
                    if let Some(text) = current.take() {
                        if let Some(absolute_url) = resolve_link(&text, base_url) {
                            links.push(absolute_url);
                        }
                    }
                    in_loc = false;
                }
                stack.pop();
            }
            Ok(Event::Text(e)) if in_loc => match e.unescape() {
                Ok(text) => {
                    if let Some(buf) = current.as_mut() {
                        buf.push_str(&text);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        "Skipping undecodable sitemap entry at byte {}: {}",
                        reader.buffer_position(),
                        err
                    );
                    current = None;
                }
            },
            Ok(Event::CData(e)) if in_loc => match std::str::from_utf8(&e) {
                Ok(text) => {
                    if let Some(buf) = current.as_mut() {
                        buf.push_str(text);
                    }
                }
                Err(_) => current = None,
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    "Sitemap parse error at byte {}: {}; keeping {} entries",
                    reader.buffer_position(),
                    err,
                    links.len()
                );
                break;
            }
        }
    }

    links
}

fn is_loc_parent(parent: Option<&Vec<u8>>) -> bool {
    matches!(parent.map(Vec::as_slice), Some(b"url") | Some(b"sitemap"))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only references (same page)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
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

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
