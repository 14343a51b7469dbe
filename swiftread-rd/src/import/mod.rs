//! Import pipeline
//!
//! Two independent producers, both resolving an input to a title and an
//! ordered word list: the EPUB archive extractor and the web article
//! extractor. Results land in the reading session; saving to the library
//! is a separate, explicit step.

pub mod article;
pub mod epub;

use scraper::ElementRef;
use swiftread_common::text;

/// Output of either producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedText {
    pub title: String,
    pub words: Vec<String>,
}

/// True when `el` sits inside any of the given tags.
pub(crate) fn inside_any(el: &ElementRef<'_>, tags: &[&str]) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| tags.contains(&ancestor.value().name()))
}

/// Collect the visible text of an element, skipping text nested inside any
/// of the given tags, with whitespace collapsed.
pub(crate) fn element_text(el: ElementRef<'_>, skip: &[&str]) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        if let Some(chunk) = node.value().as_text() {
            let skipped = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| skip.contains(&ancestor.value().name()));
            if !skipped {
                out.push_str(chunk);
                out.push(' ');
            }
        }
    }
    text::collapse_whitespace(&out)
}
