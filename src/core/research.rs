//! Research aggregation engine.
//!
//! Drives repeated research passes over an ordered set of source URLs,
//! merging newly retrieved material into a running synthesis for a topic.
//! Each pass consumes the next not-yet-fetched source: the page text is
//! fetched, then folded into the synthesis by one generation call. A failed
//! fetch marks the source and still counts against the loop budget. The
//! per-source status map is returned in full regardless of outcome so the
//! caller can retry only the failed sources.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::adapters::{GenerationError, Generator, PageFetcher};
use crate::domain::{
    source_set, Document, FetchStatus, Outcome, PassResult, RefinementTask, ResearchSource,
    TaskKind, TaskState,
};
use crate::prompts;

use super::context::{build_context, truncate_excerpt};
use super::limits::EngineLimits;
use super::policy::{ConvergencePolicy, Decision};
use super::progress::{pass_percent, ProgressEvent, ProgressSink};
use super::{generate_with_retry, EngineError};

/// The result of a research run
#[derive(Debug, Clone)]
pub struct ResearchReport {
    /// The task, in its terminal state
    pub task: RefinementTask,

    /// The synthesis as of the last completed pass
    pub synthesis: Document,

    /// Every input source with its final status, in input order
    pub sources: Vec<ResearchSource>,

    /// Why the run terminated
    pub outcome: Outcome,

    /// Number of passes that completed
    pub passes_completed: u32,
}

impl ResearchReport {
    /// Whether usable output exists but the run did not fully succeed
    pub fn is_partial(&self) -> bool {
        self.task.state == TaskState::SucceededPartial
    }

    /// Whether every source was fetched and folded
    pub fn all_sources_fetched(&self) -> bool {
        self.sources
            .iter()
            .all(|s| s.status == FetchStatus::Fetched)
    }
}

/// Engine aggregating research for one topic at a time
pub struct ResearchEngine<G: Generator, F: PageFetcher> {
    generator: G,
    fetcher: F,
    limits: EngineLimits,
}

impl<G: Generator, F: PageFetcher> ResearchEngine<G, F> {
    /// Create an engine over the given generator and page fetcher
    pub fn new(generator: G, fetcher: F, limits: EngineLimits) -> Self {
        Self {
            generator,
            fetcher,
            limits,
        }
    }

    /// Research `topic` across `source_urls` over at most `loop_budget` passes.
    ///
    /// The loop budget bounds passes, not sources: a budget smaller than the
    /// source count leaves sources in not-yet-fetched status, reported in the
    /// result rather than silently ignored.
    #[instrument(skip_all, fields(topic, loop_budget, sources = source_urls.len()))]
    pub async fn research(
        &self,
        topic: &str,
        source_urls: &[String],
        loop_budget: u32,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ResearchReport, EngineError> {
        if loop_budget == 0 {
            return Err(EngineError::InvalidInput(
                "loop budget must be at least 1".to_string(),
            ));
        }
        if topic.trim().is_empty() {
            return Err(EngineError::InvalidInput("topic must not be empty".to_string()));
        }
        if source_urls.is_empty() {
            return Err(EngineError::InvalidInput(
                "at least one source URL is required".to_string(),
            ));
        }

        let mut task = RefinementTask::new(TaskKind::Research, loop_budget);
        task.state = TaskState::Running;
        info!(task_id = %task.id, "starting research run");

        let mut policy = ConvergencePolicy::new(loop_budget);
        let mut sources = source_set(source_urls);
        let mut synthesis = Document::new();
        let mut passes = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!(task_id = %task.id, passes, "research cancelled between passes");
                return Ok(self.finish(task, synthesis, sources, Outcome::Cancelled, passes, sink));
            }

            let Some(next) = sources.iter().position(|s| !s.is_consumed()) else {
                // No unseen source material remains
                return Ok(self.finish(
                    task,
                    synthesis,
                    sources,
                    Outcome::ReachedTarget,
                    passes,
                    sink,
                ));
            };

            let pass_index = passes + 1;
            let prior_words = synthesis.word_count();

            let result = match self
                .run_pass(topic, &mut sources[next], &synthesis)
                .await
            {
                Ok(result) => result,
                Err(GenerationError::Rejected(reason))
                | Err(GenerationError::Transient(reason)) => {
                    return Ok(self.finish(
                        task,
                        synthesis,
                        sources,
                        Outcome::Failed { reason },
                        passes,
                        sink,
                    ));
                }
            };

            synthesis.push_segment(result.text);
            passes = pass_index;
            let new_words = synthesis.word_count();

            let status_line = match &result.note {
                Some(note) => format!(
                    "pass {}/{}: {} ({})",
                    pass_index, loop_budget, sources[next].domain(), note
                ),
                None => format!(
                    "pass {}/{}: folded {}, {} words",
                    pass_index, loop_budget, sources[next].domain(), new_words
                ),
            };
            sink.emit(ProgressEvent::new(
                pass_percent(pass_index, loop_budget),
                status_line,
            ));

            let unconsumed = sources.iter().filter(|s| !s.is_consumed()).count();
            let outcome = match policy.decide_research(
                pass_index,
                new_words as i64 - prior_words as i64,
                unconsumed,
            ) {
                Decision::Continue => continue,
                Decision::Reached => Outcome::ReachedTarget,
                Decision::BudgetExhausted => Outcome::BudgetExhausted,
                Decision::NoProgress => Outcome::NoProgress,
            };
            return Ok(self.finish(task, synthesis, sources, outcome, passes, sink));
        }
    }

    /// One research pass: fetch the source, fold its excerpt into the synthesis
    async fn run_pass(
        &self,
        topic: &str,
        source: &mut ResearchSource,
        synthesis: &Document,
    ) -> Result<PassResult, GenerationError> {
        let raw = match self.fetcher.fetch(&source.url).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(url = %source.url, error = %e, "source fetch failed");
                source.mark_failed(e.reason);
                return Ok(PassResult {
                    text: String::new(),
                    word_delta: 0,
                    note: Some("fetch failed".to_string()),
                });
            }
        };

        let excerpt = truncate_excerpt(&raw, self.limits.max_excerpt_chars);
        source.mark_fetched(excerpt.clone());

        let instruction = prompts::research_instruction(topic, &source.domain(), &excerpt);
        let context = build_context(synthesis, self.limits.max_context_bytes);

        let text = generate_with_retry(
            &self.generator,
            &self.limits.retry_policy,
            self.limits.generation_timeout(),
            &context,
            &instruction,
        )
        .await?;

        if text.is_empty() || text.contains(prompts::NO_RELEVANT_INFO) {
            return Ok(PassResult {
                text: String::new(),
                word_delta: 0,
                note: Some("no new content retrieved".to_string()),
            });
        }

        let word_delta = crate::domain::count_words(&text) as i64;
        Ok(PassResult {
            text: format!("Source: {}\n\n{}", source.url, text),
            word_delta,
            note: None,
        })
    }

    fn finish(
        &self,
        mut task: RefinementTask,
        synthesis: Document,
        sources: Vec<ResearchSource>,
        outcome: Outcome,
        passes_completed: u32,
        sink: &dyn ProgressSink,
    ) -> ResearchReport {
        let all_fetched = sources.iter().all(|s| s.status == FetchStatus::Fetched);
        task.state = outcome.task_state(passes_completed, all_fetched);
        if outcome == Outcome::ReachedTarget {
            sink.emit(ProgressEvent::new(100, "all sources consumed".to_string()));
        }
        info!(
            task_id = %task.id,
            passes_completed,
            words = synthesis.word_count(),
            outcome = %outcome,
            "research run finished"
        );

        ResearchReport {
            task,
            synthesis,
            sources,
            outcome,
            passes_completed,
        }
    }
}
