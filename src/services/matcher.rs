// src/services/matcher.rs

//! Ignore/delay decisions and context snippets.

use crate::models::{MatchOrigin, Pattern, PatternMatch, PatternSet};
use crate::utils::normalize_whitespace;

/// Minimum number of characters kept on each side of a match.
const MIN_SNIPPET_RADIUS: usize = 80;

/// First ignore pattern matching the status candidate or the full text.
pub fn find_ignore<'a>(
    ignore: &'a PatternSet,
    status_text: Option<&str>,
    page_text: &str,
) -> Option<&'a Pattern> {
    status_text
        .and_then(|status| ignore.first_matching(status))
        .or_else(|| ignore.first_matching(page_text))
}

/// Delay match with status precedence: the status candidate is tried with
/// the whole ordered list before the full text is considered.
pub fn find_delay(
    delay: &PatternSet,
    status_text: Option<&str>,
    page_text: &str,
) -> Option<PatternMatch> {
    status_text
        .and_then(|status| delay.find(status, MatchOrigin::Status))
        .or_else(|| delay.find(page_text, MatchOrigin::Body))
}

/// Whitespace-normalized excerpt centered on `found` within `text`.
///
/// Keeps `max(budget / 2, 80)` characters on each side of the match, then
/// truncates to `budget` characters. `None` for empty text.
pub fn context_snippet(text: &str, found: &PatternMatch, budget: usize) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let radius = (budget / 2).max(MIN_SNIPPET_RADIUS);
    let match_start = floor_char_boundary(text, found.start.min(text.len()));
    let match_end = floor_char_boundary(text, found.end.min(text.len())).max(match_start);

    let start = step_back(text, match_start, radius);
    let end = step_forward(text, match_end, radius);

    let snippet = normalize_whitespace(&text[start..end]);
    let snippet = if snippet.chars().count() > budget {
        snippet.chars().take(budget).collect::<String>().trim_end().to_string()
    } else {
        snippet
    };
    if snippet.is_empty() { None } else { Some(snippet) }
}

/// Byte offset `chars` characters before `from`, clamped to 0.
fn step_back(text: &str, from: usize, chars: usize) -> usize {
    if chars == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset `chars` characters after `from`, clamped to the end.
fn step_forward(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
