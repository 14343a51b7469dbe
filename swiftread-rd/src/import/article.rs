//! Web article extraction
//!
//! Fetching and extraction are deliberately separate: `import_url` performs
//! the network fetch, `extract_article` is a pure function over the fetched
//! markup so the content heuristic is testable without a server.
//!
//! Content selection walks a prioritized list of structural and CMS
//! selectors; the first container with enough paragraphs wins, with an
//! explicit whole-page fallback when nothing qualifies.

use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use swiftread_common::{text, Error, Result};
use tracing::{debug, info};

use super::{element_text, inside_any, ImportedText};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
/// Diagnostics carried by fetch errors are truncated to this many chars
const MAX_FETCH_DIAGNOSTIC: usize = 50;

/// Elements never contributing article text
const STRIP_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "form", "iframe", "noscript",
];

/// Candidate content containers, most specific first
const CANDIDATE_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    ".post-content",
    ".article-content",
    ".entry-content",
    "#content",
];

/// A candidate must hold more than this many paragraphs to be accepted
const MIN_CANDIDATE_PARAGRAPHS: usize = 2;
/// An accepted candidate shorter than this falls through to the fallback
const MIN_CANDIDATE_TEXT_CHARS: usize = 200;
/// Fallback keeps only paragraphs whose own text exceeds this
const MIN_FALLBACK_PARAGRAPH_CHARS: usize = 50;
/// Final text shorter than this fails the import
const MIN_ARTICLE_CHARS: usize = 100;
const MAX_TITLE_CHARS: usize = 100;

const FALLBACK_TITLE: &str = "Imported Article";

/// Fetch a web page and extract its article text.
pub async fn import_url(url: &str) -> Result<ImportedText> {
    validate_url(url)?;

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(fetch_error)?;

    info!("fetching article from {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(fetch_error)?
        .error_for_status()
        .map_err(fetch_error)?;
    let body = response.text().await.map_err(fetch_error)?;

    extract_article(&body)
}

/// Accept only absolute http(s) URLs.
pub fn validate_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::Validation("please enter a valid URL".to_string()))
    }
}

/// Extract title and word list from raw page markup. Pure, no I/O.
pub fn extract_article(markup: &str) -> Result<ImportedText> {
    let doc = Html::parse_document(markup);

    let title = document_title(&doc);
    let body = text::collapse_whitespace(&select_content(&doc));

    if body.chars().count() < MIN_ARTICLE_CHARS {
        return Err(Error::Import("could not extract article text".to_string()));
    }

    let words = text::tokenize(&body);
    debug!("extracted {} words from article", words.len());

    Ok(ImportedText {
        title: if title.is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            title
        },
        words,
    })
}

fn fetch_error(e: reqwest::Error) -> Error {
    Error::Fetch(text::truncate_chars(&e.to_string(), MAX_FETCH_DIAGNOSTIC))
}

/// Document title, preferring an Open-Graph title when present.
fn document_title(doc: &Html) -> String {
    let mut title = String::new();

    if let Ok(sel) = Selector::parse("title") {
        if let Some(el) = doc.select(&sel).next() {
            title = el.text().collect::<String>();
        }
    }
    if let Ok(sel) = Selector::parse("meta[property=\"og:title\"]") {
        if let Some(content) = doc
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr("content"))
            .filter(|c| !c.trim().is_empty())
        {
            title = content.to_string();
        }
    }

    text::truncate_chars(&text::collapse_whitespace(&title), MAX_TITLE_CHARS)
}

/// Run the prioritized candidate list, then the fallback.
fn select_content(doc: &Html) -> String {
    for candidate in CANDIDATE_SELECTORS {
        let Ok(sel) = Selector::parse(candidate) else {
            continue;
        };
        let Some(container) = doc.select(&sel).next() else {
            continue;
        };
        if inside_any(&container, STRIP_TAGS) {
            continue;
        }

        // The gate counts paragraph elements, empty ones included; only
        // the joined text drops them.
        let paragraphs = container_paragraphs(container);
        if paragraphs.len() > MIN_CANDIDATE_PARAGRAPHS {
            let joined = paragraphs
                .iter()
                .filter(|chunk| !chunk.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");
            if joined.chars().count() >= MIN_CANDIDATE_TEXT_CHARS {
                debug!("accepted content candidate {:?}", candidate);
                return joined;
            }
            // Accepted candidate is too thin; fall through to the fallback.
            break;
        }
    }

    fallback_paragraphs(doc)
}

/// Paragraph texts inside a container, stripped elements excluded. Empty
/// paragraphs stay in the list so callers can count elements.
fn container_paragraphs(container: ElementRef<'_>) -> Vec<String> {
    let Ok(p_sel) = Selector::parse("p") else {
        return Vec::new();
    };
    container
        .select(&p_sel)
        .filter(|p| !inside_any(p, STRIP_TAGS))
        .map(|p| element_text(p, STRIP_TAGS))
        .collect()
}

/// Every paragraph on the page with enough text of its own.
fn fallback_paragraphs(doc: &Html) -> String {
    let Ok(p_sel) = Selector::parse("p") else {
        return String::new();
    };
    doc.select(&p_sel)
        .filter(|p| !inside_any(p, STRIP_TAGS))
        .map(|p| element_text(p, STRIP_TAGS))
        .filter(|chunk| chunk.chars().count() > MIN_FALLBACK_PARAGRAPH_CHARS)
        .collect::<Vec<_>>()
        .join(" ")
}
