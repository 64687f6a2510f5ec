//! Web page fetcher for research sources.
//!
//! Fetches a URL and reduces it to readable text: script, style and chrome
//! elements are dropped, the remaining text is whitespace-collapsed. Failures
//! are reported per-source and never abort a research run.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Node};
use tracing::debug;

use super::{FetchError, PageFetcher};

/// Elements whose text is boilerplate rather than page content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "header", "footer", "nav"];

/// Browser-style User-Agent; some sources reject unadorned clients
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Settings for the page fetcher
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Page fetcher backed by reqwest
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// Create a fetcher with the given settings
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::new("", e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| FetchError::new(url, format!("invalid URL: {}", e)))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::new(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(url, format!("HTTP {}", status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::new(url, e.to_string()))?;

        let text = extract_text(&html);
        debug!(url, chars = text.len(), "fetched page content");
        Ok(text)
    }
}

/// Reduce an HTML document to whitespace-collapsed readable text
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.tree.root(), &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: ego_tree::NodeRef<'_, Node>, out: &mut String) {
    if let Node::Element(element) = node.value() {
        if SKIPPED_ELEMENTS.contains(&element.name()) {
            return;
        }
    }
    if let Node::Text(text) = node.value() {
        out.push_str(text);
        out.push(' ');
    }
    for child in node.children() {
        collect_text(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_strips_tags() {
        let html = "<html><body><p>Hello <b>world</b></p></body></html>";
        assert_eq!(extract_text(html), "Hello world");
    }

    #[test]
    fn test_extract_text_skips_script_and_chrome() {
        let html = r#"<html>
            <head><style>body { color: red; }</style></head>
            <body>
                <nav>Menu Items</nav>
                <p>Actual content here.</p>
                <script>var tracking = true;</script>
                <footer>Copyright notice</footer>
            </body>
        </html>"#;

        assert_eq!(extract_text(html), "Actual content here.");
    }

    #[test]
    fn test_extract_text_collapses_whitespace() {
        let html = "<p>spread\n\n   over\t\tlines</p>";
        assert_eq!(extract_text(html), "spread over lines");
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_fetch_error() {
        let fetcher = HttpPageFetcher::new(FetchSettings::default()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(err.reason.contains("invalid URL"));
        assert_eq!(err.url, "not a url");
    }
}
