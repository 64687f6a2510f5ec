//! Context construction for generation calls.
//!
//! The generator has a practical input size. Once the accumulated document
//! outgrows it, the newest segments are supplied whole and the oldest ones
//! are condensed to their leading sentences, so continuity is preserved
//! without dropping material outright. The document itself is never
//! shortened; condensation only affects what the generator sees.

use crate::domain::Document;

/// Share of the context budget reserved for the newest segments, kept whole
const RECENT_SHARE_NUM: usize = 2;
const RECENT_SHARE_DEN: usize = 3;

/// Build the generation context for a document, capped at `max_bytes`
pub fn build_context(document: &Document, max_bytes: usize) -> String {
    let full = document.text();
    if full.len() <= max_bytes {
        return full;
    }

    let segments = document.segments();
    let recent_budget = max_bytes * RECENT_SHARE_NUM / RECENT_SHARE_DEN;

    // Walk backwards, keeping the newest segments whole while they fit
    let mut used = 0usize;
    let mut split = segments.len();
    for (i, segment) in segments.iter().enumerate().rev() {
        if used + segment.len() > recent_budget {
            break;
        }
        used += segment.len() + 2;
        split = i;
    }

    let head_budget = max_bytes.saturating_sub(used);
    let per_segment = head_budget / split.max(1);

    let mut parts: Vec<String> = Vec::with_capacity(segments.len());
    for segment in &segments[..split] {
        let lead = leading_sentences(segment, per_segment);
        if !lead.is_empty() {
            parts.push(lead.to_string());
        }
    }
    parts.extend(segments[split..].iter().cloned());

    parts.join("\n\n")
}

/// Leading sentences of `text` fitting within `budget` bytes.
///
/// Prefers a sentence boundary, falls back to a word boundary, and never
/// splits a UTF-8 character.
fn leading_sentences(text: &str, budget: usize) -> &str {
    if text.len() <= budget {
        return text;
    }

    let mut sentence_end = 0;
    let mut word_end = 0;
    let mut limit = 0;
    for (idx, c) in text.char_indices() {
        if idx + c.len_utf8() > budget {
            break;
        }
        limit = idx + c.len_utf8();
        match c {
            '.' | '!' | '?' => sentence_end = limit,
            c if c.is_whitespace() => word_end = idx,
            _ => {}
        }
    }

    if sentence_end > 0 {
        &text[..sentence_end]
    } else if word_end > 0 {
        &text[..word_end]
    } else {
        &text[..limit]
    }
}

/// Cap an excerpt at `max_chars` characters, marking the cut
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}... [content truncated]", cut)
}
