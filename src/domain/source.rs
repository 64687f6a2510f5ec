//! Research sources and their fetch status.
//!
//! A research task owns an ordered set of sources, unique by URL, with
//! insertion order preserved. The per-source status map is always returned in
//! full so the caller can retry only the failed sources.

use serde::{Deserialize, Serialize};

/// One source URL with its fetch status and retrieved excerpt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSource {
    /// The source URL
    pub url: String,

    /// Current fetch status
    pub status: FetchStatus,

    /// Extracted page text, if fetched
    pub excerpt: Option<String>,

    /// Error message, if the fetch failed
    pub error: Option<String>,
}

impl ResearchSource {
    /// Create a not-yet-fetched source
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: FetchStatus::NotFetched,
            excerpt: None,
            error: None,
        }
    }

    /// Mark the source as fetched with the extracted text
    pub fn mark_fetched(&mut self, excerpt: String) {
        self.status = FetchStatus::Fetched;
        self.excerpt = Some(excerpt);
        self.error = None;
    }

    /// Mark the source as failed with the fetch error
    pub fn mark_failed(&mut self, error: String) {
        self.status = FetchStatus::FetchFailed;
        self.error = Some(error);
    }

    /// Host name of the URL, used to attribute material in prompts
    pub fn domain(&self) -> String {
        reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| self.url.clone())
    }

    /// Whether a pass has consumed this source (successfully or not)
    pub fn is_consumed(&self) -> bool {
        self.status != FetchStatus::NotFetched
    }
}

/// Fetch status of a research source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// No pass has attempted this source yet
    NotFetched,

    /// Fetched and folded into the synthesis
    Fetched,

    /// The fetch failed; the pass still counted against the budget
    FetchFailed,
}

/// Build the ordered source set from input URLs, unique by URL
///
/// Insertion order equals input order; later duplicates are dropped.
pub fn source_set(urls: &[String]) -> Vec<ResearchSource> {
    let mut seen = std::collections::HashSet::new();
    urls.iter()
        .filter(|url| seen.insert(url.as_str()))
        .map(ResearchSource::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_set_preserves_order_and_dedupes() {
        let urls = vec![
            "https://a.example/one".to_string(),
            "https://b.example/two".to_string(),
            "https://a.example/one".to_string(),
        ];
        let sources = source_set(&urls);

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].url, "https://a.example/one");
        assert_eq!(sources[1].url, "https://b.example/two");
        assert!(sources.iter().all(|s| s.status == FetchStatus::NotFetched));
    }

    #[test]
    fn test_domain_extraction() {
        let source = ResearchSource::new("https://en.wikipedia.org/wiki/Normandy");
        assert_eq!(source.domain(), "en.wikipedia.org");

        // Unparseable URLs fall back to the raw string
        let broken = ResearchSource::new("not a url");
        assert_eq!(broken.domain(), "not a url");
    }

    #[test]
    fn test_status_transitions() {
        let mut source = ResearchSource::new("https://a.example");
        assert!(!source.is_consumed());

        source.mark_failed("connection refused".to_string());
        assert_eq!(source.status, FetchStatus::FetchFailed);
        assert!(source.is_consumed());

        source.mark_fetched("page text".to_string());
        assert_eq!(source.status, FetchStatus::Fetched);
        assert_eq!(source.excerpt.as_deref(), Some("page text"));
        assert!(source.error.is_none());
    }
}
