// src/services/extractor.rs

//! Candidate text extraction from HTML and JSON documents.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{ContentMode, SourceConfig};
use crate::utils::json_path::{resolve, to_display_json, value_to_text};
use crate::utils::{non_empty_text, normalize_whitespace};

/// Candidate texts pulled out of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub status_text: Option<String>,
    pub estimated_raw: Option<String>,
    pub promised_raw: Option<String>,
    /// Whitespace-normalized full text of the document
    pub page_text: String,
}

/// JSON extraction applies when the server says JSON or the source demands it.
pub fn is_json_mode(content_type: &str, mode: ContentMode) -> bool {
    content_type.to_ascii_lowercase().contains("application/json") || mode == ContentMode::Json
}

/// Extract status/ETA/promised candidates and the full text of `body`.
///
/// A configured promised-delivery date always wins over an extracted one.
pub fn extract(body: &str, content_type: &str, source: &SourceConfig) -> Extraction {
    let mut extraction = if is_json_mode(content_type, source.content_mode) {
        extract_json(body, source)
    } else {
        extract_html(body, source)
    };
    if source.promised_delivery_date.is_some() {
        extraction.promised_raw = source.promised_delivery_date.clone();
    }
    extraction
}

fn extract_json(body: &str, source: &SourceConfig) -> Extraction {
    let document: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("{}: unable to parse JSON body ({})", source.order_id, e);
            return Extraction {
                page_text: normalize_whitespace(body),
                ..Extraction::default()
            };
        }
    };

    Extraction {
        status_text: first_from_json(&document, &source.status.paths),
        estimated_raw: first_from_json(&document, &source.eta.paths),
        promised_raw: first_from_json(&document, &source.promised.paths),
        page_text: normalize_whitespace(&to_display_json(&document)),
    }
}

fn extract_html(body: &str, source: &SourceConfig) -> Extraction {
    let document = Html::parse_document(body);
    Extraction {
        status_text: first_from_html(&document, &source.status.selectors),
        estimated_raw: first_from_html(&document, &source.eta.selectors),
        promised_raw: first_from_html(&document, &source.promised.selectors),
        page_text: element_text(document.root_element()),
    }
}

/// Text of the first path resolving to a non-null, non-blank value.
pub fn first_from_json(document: &Value, paths: &[String]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| resolve(document, path))
        .filter_map(value_to_text)
        .find_map(|text| non_empty_text(&text))
}

/// Text of the first element matched by the first usable selector.
pub fn first_from_html(document: &Html, selectors: &[String]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = match parse_selector(raw) {
            Ok(selector) => selector,
            Err(e) => {
                log::warn!("{}", e);
                return None;
            }
        };
        let element = document.select(&selector).next()?;
        non_empty_text(&element_text(element))
    })
}

/// Elements whose text is never part of the rendered page.
const NON_RENDERED: &[&str] = &["script", "style", "noscript", "template"];

/// Whitespace-collapsed text content of an element, segments space-joined.
/// Text nested in non-rendered elements below `element` is skipped.
fn element_text(element: ElementRef<'_>) -> String {
    let segments: Vec<&str> = element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .ancestors()
                .take_while(|ancestor| ancestor.id() != element.id())
                .filter_map(|ancestor| ancestor.value().as_element())
                .any(|el| NON_RENDERED.contains(&el.name()));
            if hidden { None } else { Some(&**text) }
        })
        .collect();
    normalize_whitespace(&segments.join(" "))
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
