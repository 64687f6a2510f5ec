//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the two external calls the
//! engines make: generating text and fetching web pages. The engines are
//! written against these traits so tests can substitute deterministic stubs.

pub mod openai;
pub mod webpage;

use async_trait::async_trait;
use thiserror::Error;

// Re-export the production adapters
pub use openai::OpenAiGenerator;
pub use webpage::HttpPageFetcher;

/// Produce text given prior context and an instruction.
///
/// Each call is independent and idempotent from the engine's viewpoint: no
/// session state is carried between calls. The context may be empty; the
/// instruction must not be.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, context: &str, instruction: &str) -> Result<String, GenerationError>;
}

/// Fetch the readable text of a web page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Failure modes of a generation call
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Timeout or transport failure; safe to retry
    #[error("transient generation failure: {0}")]
    Transient(String),

    /// The service explicitly declined the request; must not be retried
    #[error("generation rejected: {0}")]
    Rejected(String),
}

impl GenerationError {
    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Transient(_))
    }
}

/// Failure fetching a source page
#[derive(Debug, Clone, Error)]
#[error("fetch failed for {url}: {reason}")]
pub struct FetchError {
    pub url: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
