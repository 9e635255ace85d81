//! Citation marker extraction and sentence segmentation
//!
//! Markers follow the wire format `[Source: <name>[, Page <N>][, Section
//! <label>]]` with case-insensitive keywords. Claim extraction rides on a
//! sentence splitter, which is deliberately a narrow trait: splitting on
//! punctuation is approximate and may be swapped for a real segmenter
//! without touching callers.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Matches `[Source: name, Page N, Section label]` with optional groups.
static CITATION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[Source:\s*([^,\]]+?)(?:,\s*Page\s*(\d+))?(?:,\s*Section\s*([^\]]+))?\]")
        .expect("valid citation marker regex")
});

/// A citation marker as written in the response, before verification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCitation {
    /// Last sentence fragment preceding the marker
    pub claim: String,
    /// Source name inside the marker
    pub source_file: String,
    /// Optional page number
    pub page: Option<u32>,
    /// Optional section label
    pub section: Option<String>,
}

/// Splits text into sentence fragments.
pub trait SentenceSplitter: Send + Sync + std::fmt::Debug {
    /// Split `text` into fragments, in order
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Splitter that breaks on `.`, `!`, `?` and newlines.
///
/// A period flanked by digits is not a terminator, so values like "2.4 kPa"
/// survive in one fragment.
#[derive(Debug, Clone, Default)]
pub struct PunctuationSplitter;

impl PunctuationSplitter {
    /// Create a new punctuation splitter
    pub fn new() -> Self {
        Self
    }
}

impl SentenceSplitter for PunctuationSplitter {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let bytes = text.as_bytes();
        let mut fragments = Vec::new();
        let mut start = 0;

        for (idx, ch) in text.char_indices() {
            let is_terminator = match ch {
                '!' | '?' | '\n' => true,
                '.' => {
                    let prev_digit = idx > 0 && bytes[idx - 1].is_ascii_digit();
                    let next_digit = bytes
                        .get(idx + 1)
                        .is_some_and(|b| b.is_ascii_digit());
                    !(prev_digit && next_digit)
                }
                _ => false,
            };

            if is_terminator {
                fragments.push(&text[start..idx]);
                start = idx + ch.len_utf8();
            }
        }

        fragments.push(&text[start..]);
        fragments
    }
}

/// Splitter backed by Unicode sentence boundaries (UAX #29).
#[derive(Debug, Clone, Default)]
pub struct UnicodeSentenceSplitter;

impl UnicodeSentenceSplitter {
    /// Create a new unicode sentence splitter
    pub fn new() -> Self {
        Self
    }
}

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.unicode_sentences().collect()
    }
}

/// Extracts citation markers and their preceding claims from a response.
#[derive(Debug)]
pub struct CitationExtractor {
    splitter: Box<dyn SentenceSplitter>,
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationExtractor {
    /// Create an extractor with the default punctuation splitter
    pub fn new() -> Self {
        Self {
            splitter: Box::new(PunctuationSplitter::new()),
        }
    }

    /// Create an extractor with a custom sentence splitter
    pub fn with_splitter(splitter: Box<dyn SentenceSplitter>) -> Self {
        Self { splitter }
    }

    /// Extract every marker occurrence, in order of appearance.
    ///
    /// Repeated identical markers are reported once per occurrence.
    /// Missing optional groups yield `None` fields, never an error.
    pub fn extract(&self, response: &str) -> Vec<RawCitation> {
        CITATION_MARKER
            .captures_iter(response)
            .map(|caps| {
                let marker_start = caps.get(0).map(|m| m.start()).unwrap_or(0);
                let claim = self.claim_before(&response[..marker_start]);

                RawCitation {
                    claim,
                    source_file: caps[1].trim().to_string(),
                    page: caps.get(2).and_then(|m| m.as_str().parse().ok()),
                    section: caps.get(3).map(|m| m.as_str().trim().to_string()),
                }
            })
            .collect()
    }

    /// Check whether the text contains any citation marker at all
    pub fn has_marker(response: &str) -> bool {
        CITATION_MARKER.is_match(response)
    }

    /// Last non-empty sentence fragment of the text preceding a marker.
    fn claim_before(&self, text_before: &str) -> String {
        self.splitter
            .split(text_before)
            .iter()
            .rev()
            .map(|fragment| fragment.trim())
            .find(|fragment| !fragment.is_empty())
            .unwrap_or("")
            .to_string()
    }
}
