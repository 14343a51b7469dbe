//! EPUB archive extraction
//!
//! An EPUB is a zip archive whose `META-INF/container.xml` points at a
//! package descriptor (OPF). The OPF carries the title, a manifest mapping
//! internal ids to content files, and a spine fixing reading order. Text is
//! collected chapter by chapter in spine order; a broken chapter is skipped
//! rather than failing the whole import.

use roxmltree::Document;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use swiftread_common::{text, Error, Result};
use tracing::{debug, warn};

use super::ImportedText;

/// Minimum word count for a usable book
const MIN_WORDS: usize = 10;

const FALLBACK_TITLE: &str = "Untitled EPUB";

/// Tags whose text content is dropped from chapters
const SKIP_TAGS: &[&str] = &["script", "style"];

/// Elements whose text is collected, in document order
const TEXT_SELECTOR: &str = "p, h1, h2, h3, h4";

/// Extract the title and word list from EPUB bytes, rejecting books with
/// too little text to be worth reading.
pub fn extract_epub(data: &[u8]) -> Result<ImportedText> {
    let imported = parse_epub(data)?;
    if imported.words.len() < MIN_WORDS {
        return Err(Error::Import("too little text".to_string()));
    }
    Ok(imported)
}

/// Parse EPUB bytes into a title and spine-ordered word list.
pub fn parse_epub(data: &[u8]) -> Result<ImportedText> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|_| Error::Import("not a valid archive".to_string()))?;

    let container = read_entry(&mut archive, "META-INF/container.xml")
        .ok_or_else(|| Error::Import("not a valid archive".to_string()))?;
    let opf_path = container_rootfile(&container)
        .ok_or_else(|| Error::Import("not a valid archive".to_string()))?;
    let opf_xml = read_entry(&mut archive, &opf_path)
        .ok_or_else(|| Error::Import("not a valid archive".to_string()))?;

    let package = Package::parse(&opf_xml)?;
    let opf_dir = opf_path
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default();

    let mut collected: Vec<String> = Vec::new();
    for idref in &package.spine {
        let Some(href) = package.manifest.get(idref) else {
            continue;
        };
        let chapter_path = if opf_dir.is_empty() {
            href.clone()
        } else {
            format!("{}/{}", opf_dir, href)
        };
        match read_entry(&mut archive, &chapter_path) {
            Some(markup) => collect_chapter_text(&markup, &mut collected),
            None => {
                warn!("skipping unreadable chapter {}", chapter_path);
            }
        }
    }

    let words = text::tokenize(&collected.join(" "));
    debug!("extracted {} words from {} spine items", words.len(), package.spine.len());

    Ok(ImportedText {
        title: package.title,
        words,
    })
}

/// Parsed package descriptor.
struct Package {
    title: String,
    /// manifest id -> content-file path, HTML-type resources only
    manifest: HashMap<String, String>,
    /// ordered manifest ids defining reading order
    spine: Vec<String>,
}

impl Package {
    fn parse(opf_xml: &str) -> Result<Self> {
        let doc = Document::parse(opf_xml)
            .map_err(|e| Error::Import(format!("unreadable package descriptor: {}", e)))?;

        let title = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "title")
            .and_then(|n| n.text())
            .map(|t| text::collapse_whitespace(t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());

        let mut manifest = HashMap::new();
        for item in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "item")
        {
            let (Some(id), Some(href)) = (item.attribute("id"), item.attribute("href")) else {
                continue;
            };
            let media_type = item.attribute("media-type").unwrap_or("");
            if media_type.contains("html") {
                manifest.insert(id.to_string(), href.to_string());
            }
        }

        let spine = doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "itemref")
            .filter_map(|n| n.attribute("idref"))
            .filter(|idref| manifest.contains_key(*idref))
            .map(str::to_string)
            .collect();

        Ok(Self {
            title,
            manifest,
            spine,
        })
    }
}

/// Resolve the package descriptor path from the container manifest.
fn container_rootfile(container_xml: &str) -> Option<String> {
    let doc = Document::parse(container_xml).ok()?;
    doc.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "rootfile")
        .and_then(|n| n.attribute("full-path"))
        .map(str::to_string)
}

/// Append the paragraph and heading text of one chapter, in document order.
fn collect_chapter_text(markup: &str, out: &mut Vec<String>) {
    let Ok(selector) = Selector::parse(TEXT_SELECTOR) else {
        return;
    };
    let doc = Html::parse_document(markup);
    for el in doc.select(&selector) {
        let chunk = super::element_text(el, SKIP_TAGS);
        if !chunk.is_empty() {
            out.push(chunk);
        }
    }
}

fn read_entry(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, name: &str) -> Option<String> {
    let mut file = archive.by_name(name).ok()?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).ok()?;
    Some(String::from_utf8_lossy(&buf).into_owned())
}
