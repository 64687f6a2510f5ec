//! Core refinement logic.
//!
//! This module contains:
//! - Policy: the convergence rules deciding when a run stops
//! - Limits: timeouts, context caps and retry policy
//! - Progress: the event sink engines report through
//! - Context: capped context construction for generation calls
//! - Expand / Research: the two engines

pub mod context;
pub mod expand;
pub mod limits;
pub mod policy;
pub mod progress;
pub mod research;

use thiserror::Error;
use tracing::warn;

use crate::adapters::{GenerationError, Generator};

// Re-export commonly used types
pub use expand::{ExpansionEngine, ExpansionReport};
pub use limits::{EngineLimits, RetryPolicy};
pub use policy::{ConvergencePolicy, Decision};
pub use progress::{ChannelProgressSink, NullProgressSink, ProgressEvent, ProgressSink};
pub use research::{ResearchEngine, ResearchReport};

/// Input rejected before any pass was started
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// One generation call with bounded timeout and transient-failure retries.
///
/// Rejected errors are returned immediately; transient ones are retried per
/// the policy, with backoff, before being handed back to the engine.
pub(crate) async fn generate_with_retry(
    generator: &dyn Generator,
    retry: &RetryPolicy,
    timeout: std::time::Duration,
    context: &str,
    instruction: &str,
) -> Result<String, GenerationError> {
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let result = match tokio::time::timeout(timeout, generator.generate(context, instruction))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Transient(format!(
                "generation call timed out after {:?}",
                timeout
            ))),
        };

        match result {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transient() && retry.should_retry(attempt) => {
                let delay = retry.delay_for_attempt(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "generation failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
