//! The working document a refinement task grows.
//!
//! A document is an ordered sequence of text segments. Segments preserve the
//! order in which they were produced; joining them yields the full current
//! text. The word count is always computed from the current text, never cached.

use serde::{Deserialize, Serialize};

/// An ordered sequence of text segments forming a transcript or synthesis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    segments: Vec<String>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from a single block of text
    ///
    /// Whitespace-only input yields an empty document.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Self::new()
        } else {
            Self {
                segments: vec![text],
            }
        }
    }

    /// Append a segment produced by a refinement pass
    ///
    /// Empty or whitespace-only segments are ignored so a blank generation
    /// result never clobbers the document.
    pub fn push_segment(&mut self, segment: impl Into<String>) {
        let segment = segment.into();
        if !segment.trim().is_empty() {
            self.segments.push(segment);
        }
    }

    /// The segments in production order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The full current text: segments joined in order
    pub fn text(&self) -> String {
        self.segments.join("\n\n")
    }

    /// Number of words in the full current text
    pub fn word_count(&self) -> usize {
        self.segments.iter().map(|s| count_words(s)).sum()
    }

    /// Whether the document contains no text
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Count word runs (alphanumeric plus underscore) in a block of text
pub fn count_words(text: &str) -> usize {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|run| !run.is_empty())
        .count()
}

/// The output of one refinement pass, consumed within that pass
#[derive(Debug, Clone)]
pub struct PassResult {
    /// Text produced by the pass (may be empty if nothing was contributed)
    pub text: String,

    /// Word delta versus the document before the pass
    pub word_delta: i64,

    /// Optional diagnostic, e.g. "no new content retrieved"
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_matches_word_runs() {
        assert_eq!(count_words("Hello, world!"), 2);
        assert_eq!(count_words("  one_two three\nfour "), 3);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("---"), 0);
    }

    #[test]
    fn test_text_joins_segments_in_order() {
        let mut doc = Document::from_text("first");
        doc.push_segment("second");
        doc.push_segment("third");

        assert_eq!(doc.text(), "first\n\nsecond\n\nthird");
        assert_eq!(doc.segments().len(), 3);
    }

    #[test]
    fn test_blank_segments_are_ignored() {
        let mut doc = Document::from_text("content");
        doc.push_segment("");
        doc.push_segment("   \n ");

        assert_eq!(doc.segments().len(), 1);
        assert_eq!(doc.word_count(), 1);
    }

    #[test]
    fn test_word_count_is_computed_from_current_text() {
        let mut doc = Document::new();
        assert_eq!(doc.word_count(), 0);
        assert!(doc.is_empty());

        doc.push_segment("one two three");
        assert_eq!(doc.word_count(), 3);

        doc.push_segment("four five");
        assert_eq!(doc.word_count(), 5);
    }

    #[test]
    fn test_from_whitespace_is_empty() {
        let doc = Document::from_text("   ");
        assert!(doc.is_empty());
        assert_eq!(doc.word_count(), 0);
    }
}
