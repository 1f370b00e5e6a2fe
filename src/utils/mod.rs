//! Utility functions and helpers.

pub mod coerce;
pub mod datetime;
pub mod http;
pub mod json_path;

use url::Url;

/// Collapse every whitespace run into a single space and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize text and return `None` when nothing is left.
pub fn non_empty_text(s: &str) -> Option<String> {
    let text = normalize_whitespace(s);
    if text.is_empty() { None } else { Some(text) }
}

/// Extract the domain from a URL string.
pub fn get_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  Shipment\n\t delayed   due to\r\nweather "),
            "Shipment delayed due to weather"
        );
        assert_eq!(normalize_whitespace(" \n\t "), "");
        assert_eq!(normalize_whitespace("a\u{00A0}\u{2003}b"), "a b");
    }

    #[test]
    fn test_non_empty_text() {
        assert_eq!(non_empty_text("  in transit "), Some("in transit".to_string()));
        assert_eq!(non_empty_text("   "), None);
    }

    #[test]
    fn test_get_domain() {
        assert_eq!(
            get_domain("https://track.carrier.example/status?id=1"),
            Some("track.carrier.example".to_string())
        );
        assert_eq!(get_domain("not a url"), None);
    }
}
