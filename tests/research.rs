//! Research Engine Integration Tests
//!
//! Exercises the public research API with deterministic stub generators
//! and page fetchers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use redraft::core::{NullProgressSink, RetryPolicy};
use redraft::{
    Document, EngineError, EngineLimits, FetchError, FetchStatus, GenerationError, Generator,
    Outcome, PageFetcher, ResearchEngine, TaskState,
};

/// Returns a fixed extraction per call and counts invocations
struct FixedExtractor {
    calls: Arc<AtomicU32>,
}

impl FixedExtractor {
    fn new() -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl Generator for FixedExtractor {
    async fn generate(&self, _context: &str, _instruction: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("several extracted facts about the research topic".to_string())
    }
}

/// Declines every extraction
struct RejectingExtractor;

#[async_trait]
impl Generator for RejectingExtractor {
    async fn generate(&self, _context: &str, _instruction: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Rejected("content policy".to_string()))
    }
}

/// Serves static page text; URLs containing "broken" fail
struct StaticPages {
    fetches: Arc<AtomicU32>,
}

impl StaticPages {
    fn new() -> (Self, Arc<AtomicU32>) {
        let fetches = Arc::new(AtomicU32::new(0));
        (
            Self {
                fetches: fetches.clone(),
            },
            fetches,
        )
    }
}

#[async_trait]
impl PageFetcher for StaticPages {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if url.contains("broken") {
            Err(FetchError::new(url, "connection refused"))
        } else {
            Ok(format!("page text for {}", url))
        }
    }
}

fn fast_limits() -> EngineLimits {
    EngineLimits {
        retry_policy: RetryPolicy {
            initial_delay_ms: 1,
            max_delay_ms: 2,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn urls(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("https://site{}.example/page", i))
        .collect()
}

#[tokio::test]
async fn test_budget_covering_all_sources_consumes_them_all() {
    let (generator, generations) = FixedExtractor::new();
    let (fetcher, fetches) = StaticPages::new();
    let engine = ResearchEngine::new(generator, fetcher, fast_limits());

    let report = engine
        .research(
            "test topic",
            &urls(3),
            5,
            &NullProgressSink,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::ReachedTarget);
    assert_eq!(report.task.state, TaskState::Succeeded);
    assert_eq!(report.passes_completed, 3);
    assert!(report.all_sources_fetched());
    assert_eq!(fetches.load(Ordering::SeqCst), 3);
    assert_eq!(generations.load(Ordering::SeqCst), 3);
    assert!(!report.synthesis.is_empty());
}

#[tokio::test]
async fn test_budget_smaller_than_source_count_leaves_sources_unfetched() {
    let (generator, _) = FixedExtractor::new();
    let (fetcher, fetches) = StaticPages::new();
    let engine = ResearchEngine::new(generator, fetcher, fast_limits());

    let input = urls(5);
    let report = engine
        .research(
            "test topic",
            &input,
            2,
            &NullProgressSink,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::BudgetExhausted);
    assert_eq!(report.task.state, TaskState::SucceededPartial);
    assert_eq!(report.passes_completed, 2);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);

    // The status map accounts for every input URL exactly once
    assert_eq!(report.sources.len(), input.len());
    for (source, url) in report.sources.iter().zip(&input) {
        assert_eq!(&source.url, url);
    }
    let unfetched = report
        .sources
        .iter()
        .filter(|s| s.status == FetchStatus::NotFetched)
        .count();
    assert_eq!(unfetched, 3);
}

#[tokio::test]
async fn test_failed_fetch_is_recorded_and_the_pass_still_counts() {
    let (generator, generations) = FixedExtractor::new();
    let (fetcher, _) = StaticPages::new();
    let engine = ResearchEngine::new(generator, fetcher, fast_limits());

    let input = vec![
        "https://broken.example/one".to_string(),
        "https://site0.example/page".to_string(),
    ];
    let report = engine
        .research(
            "test topic",
            &input,
            5,
            &NullProgressSink,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::ReachedTarget);
    assert_eq!(report.passes_completed, 2);
    // No generation call for the failed source
    assert_eq!(generations.load(Ordering::SeqCst), 1);

    assert_eq!(report.sources[0].status, FetchStatus::FetchFailed);
    assert_eq!(
        report.sources[0].error.as_deref(),
        Some("connection refused")
    );
    assert_eq!(report.sources[1].status, FetchStatus::Fetched);

    // Partial: the caller can retry just the failed source
    assert!(report.is_partial());
}

#[tokio::test]
async fn test_consecutive_failed_fetches_stop_with_no_progress() {
    let (generator, _) = FixedExtractor::new();
    let (fetcher, _) = StaticPages::new();
    let engine = ResearchEngine::new(generator, fetcher, fast_limits());

    let input = vec![
        "https://broken.example/one".to_string(),
        "https://broken.example/two".to_string(),
        "https://broken.example/three".to_string(),
        "https://site0.example/page".to_string(),
    ];
    let report = engine
        .research(
            "test topic",
            &input,
            10,
            &NullProgressSink,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::NoProgress);
    assert_eq!(report.passes_completed, 2);
    assert_eq!(report.sources[3].status, FetchStatus::NotFetched);
}

#[tokio::test]
async fn test_rejected_generation_returns_full_status_map() {
    let (fetcher, _) = StaticPages::new();
    let engine = ResearchEngine::new(RejectingExtractor, fetcher, fast_limits());

    let input = urls(3);
    let report = engine
        .research(
            "test topic",
            &input,
            5,
            &NullProgressSink,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    match &report.outcome {
        Outcome::Failed { reason } => assert_eq!(reason, "content policy"),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert_eq!(report.task.state, TaskState::Failed);
    assert_eq!(report.sources.len(), 3);
    // The first source was fetched before the generation call failed
    assert_eq!(report.sources[0].status, FetchStatus::Fetched);
    assert_eq!(report.sources[1].status, FetchStatus::NotFetched);
}

#[tokio::test]
async fn test_duplicate_urls_are_folded_once() {
    let (generator, generations) = FixedExtractor::new();
    let (fetcher, fetches) = StaticPages::new();
    let engine = ResearchEngine::new(generator, fetcher, fast_limits());

    let input = vec![
        "https://site0.example/page".to_string(),
        "https://site0.example/page".to_string(),
        "https://site1.example/page".to_string(),
    ];
    let report = engine
        .research(
            "test topic",
            &input,
            5,
            &NullProgressSink,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.sources.len(), 2);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(generations.load(Ordering::SeqCst), 2);
    assert_eq!(report.outcome, Outcome::ReachedTarget);
}

#[tokio::test]
async fn test_invalid_inputs_are_rejected_before_any_pass() {
    let (generator, _) = FixedExtractor::new();
    let (fetcher, fetches) = StaticPages::new();
    let engine = ResearchEngine::new(generator, fetcher, fast_limits());

    let result = engine
        .research(
            "",
            &urls(2),
            3,
            &NullProgressSink,
            &CancellationToken::new(),
        )
        .await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));

    let result = engine
        .research(
            "topic",
            &urls(2),
            0,
            &NullProgressSink,
            &CancellationToken::new(),
        )
        .await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));

    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancellation_returns_synthesis_so_far() {
    let token = CancellationToken::new();
    let (fetcher, _) = StaticPages::new();

    /// Trips cancellation during the second extraction
    struct CancelOnSecond {
        token: CancellationToken,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Generator for CancelOnSecond {
        async fn generate(
            &self,
            _context: &str,
            _instruction: &str,
        ) -> Result<String, GenerationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= 2 {
                self.token.cancel();
            }
            Ok("fresh synthesis material".to_string())
        }
    }

    let engine = ResearchEngine::new(
        CancelOnSecond {
            token: token.clone(),
            calls: AtomicU32::new(0),
        },
        fetcher,
        fast_limits(),
    );

    let report = engine
        .research("test topic", &urls(4), 4, &NullProgressSink, &token)
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::Cancelled);
    assert_eq!(report.task.state, TaskState::Cancelled);
    assert_eq!(report.passes_completed, 2);
    let synthesis: Document = report.synthesis;
    assert_eq!(synthesis.segments().len(), 2);
    assert_eq!(
        report
            .sources
            .iter()
            .filter(|s| s.status == FetchStatus::Fetched)
            .count(),
        2
    );
}
