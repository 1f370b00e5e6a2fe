// src/models/pattern.rs

//! Compiled delay/ignore patterns.

use std::fmt;

use regex::{Regex, RegexBuilder};

/// How a configured pattern ended up being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Compiled as a case-insensitive regular expression
    Regex,
    /// Not a valid regex; matched as escaped literal text
    Literal,
}

/// A single pattern, compiled once at configuration time.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    kind: PatternKind,
    regex: Regex,
}

impl Pattern {
    /// Compile `source` case-insensitively, falling back to a literal match.
    pub fn compile(source: &str) -> Option<Self> {
        if let Ok(regex) = build(source) {
            return Some(Self {
                source: source.to_string(),
                kind: PatternKind::Regex,
                regex,
            });
        }

        log::debug!("Pattern '{}' is not a valid regex; matching literally", source);
        match build(&regex::escape(source)) {
            Ok(regex) => Some(Self {
                source: source.to_string(),
                kind: PatternKind::Literal,
                regex,
            }),
            Err(e) => {
                log::warn!("Dropping pattern '{}': {}", source, e);
                None
            }
        }
    }

    /// The pattern text as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// First match of this pattern in `text`.
    pub fn find(&self, text: &str, origin: MatchOrigin) -> Option<PatternMatch> {
        self.regex.find(text).map(|m| PatternMatch {
            pattern: self.source.clone(),
            text: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
            origin,
        })
    }
}

fn build(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Ordered list of compiled patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compile every entry, preserving order.
    pub fn compile<S: AsRef<str>>(sources: &[S]) -> Self {
        Self {
            patterns: sources
                .iter()
                .filter_map(|s| Pattern::compile(s.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// First pattern (in order) matching `text`, if any.
    pub fn first_matching(&self, text: &str) -> Option<&Pattern> {
        if text.is_empty() {
            return None;
        }
        self.patterns.iter().find(|p| p.is_match(text))
    }

    /// First match (in pattern order) within `text`.
    pub fn find(&self, text: &str, origin: MatchOrigin) -> Option<PatternMatch> {
        if text.is_empty() {
            return None;
        }
        self.patterns.iter().find_map(|p| p.find(text, origin))
    }
}

/// Which candidate text produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrigin {
    Status,
    Body,
}

impl fmt::Display for MatchOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOrigin::Status => f.write_str("status"),
            MatchOrigin::Body => f.write_str("body"),
        }
    }
}

/// A successful delay-pattern match. Offsets are byte offsets into the
/// text selected by `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub pattern: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub origin: MatchOrigin,
}
