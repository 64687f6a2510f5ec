//! Transcript expansion engine.
//!
//! Drives repeated expansion passes over a single document toward a target
//! word count. Each pass issues one generation call, appends the returned
//! text as a new segment, and consults the convergence policy. Accumulated
//! work is never discarded: whatever the document holds when the run stops
//! is returned alongside the outcome.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::adapters::{GenerationError, Generator};
use crate::domain::{Document, Outcome, PassResult, RefinementTask, TaskKind, TaskState};
use crate::prompts;

use super::context::build_context;
use super::limits::EngineLimits;
use super::policy::{ConvergencePolicy, Decision};
use super::progress::{pass_percent, ProgressEvent, ProgressSink};
use super::{generate_with_retry, EngineError};

/// Words asked for per pass when no target is set
const DEFAULT_GROWTH_WORDS: usize = 500;

/// The result of an expansion run
#[derive(Debug, Clone)]
pub struct ExpansionReport {
    /// The task, in its terminal state
    pub task: RefinementTask,

    /// The document as of the last completed pass
    pub document: Document,

    /// Why the run terminated
    pub outcome: Outcome,

    /// Number of passes that completed
    pub passes_completed: u32,
}

impl ExpansionReport {
    /// Whether usable output exists but the run did not fully succeed
    pub fn is_partial(&self) -> bool {
        self.task.state == TaskState::SucceededPartial
    }
}

/// Engine driving expansion passes over one document at a time
pub struct ExpansionEngine<G: Generator> {
    generator: G,
    limits: EngineLimits,
}

impl<G: Generator> ExpansionEngine<G> {
    /// Create an engine over the given generator
    pub fn new(generator: G, limits: EngineLimits) -> Self {
        Self { generator, limits }
    }

    /// Expand `initial` toward `target_words` over at most `loop_budget` passes.
    ///
    /// `target_words = None` runs the full budget. Progress is pushed into
    /// `sink` after each pass; `cancel` is checked before each pass and stops
    /// the run with the document accumulated so far.
    #[instrument(skip_all, fields(loop_budget, target = ?target_words))]
    pub async fn expand(
        &self,
        initial: Document,
        loop_budget: u32,
        target_words: Option<usize>,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExpansionReport, EngineError> {
        if loop_budget == 0 {
            return Err(EngineError::InvalidInput(
                "loop budget must be at least 1".to_string(),
            ));
        }

        let mut task = RefinementTask::new(TaskKind::Expansion, loop_budget);
        task.state = TaskState::Running;
        info!(task_id = %task.id, "starting expansion run");

        let mut policy = ConvergencePolicy::new(loop_budget);
        let mut document = initial;
        let mut passes = 0u32;

        // Target already met by the initial document: zero passes
        let initial_words = document.word_count();
        if policy.decide_expansion(0, initial_words, initial_words, target_words)
            == Decision::Reached
        {
            sink.emit(ProgressEvent::new(
                100,
                format!("target already met: {} words", initial_words),
            ));
            return Ok(self.finish(task, document, Outcome::ReachedTarget, 0, sink));
        }

        loop {
            if cancel.is_cancelled() {
                info!(task_id = %task.id, passes, "expansion cancelled between passes");
                return Ok(self.finish(task, document, Outcome::Cancelled, passes, sink));
            }

            let pass_index = passes + 1;
            let result = match self.run_pass(&document, pass_index, target_words).await {
                Ok(result) => result,
                // Rejected is terminal outright; Transient lands here only
                // after the retry policy is exhausted. Either way the
                // accumulated document is returned, not discarded.
                Err(GenerationError::Rejected(reason))
                | Err(GenerationError::Transient(reason)) => {
                    return Ok(self.finish(
                        task,
                        document,
                        Outcome::Failed { reason },
                        passes,
                        sink,
                    ));
                }
            };

            let prior_words = document.word_count();
            document.push_segment(result.text);
            passes = pass_index;
            let new_words = document.word_count();

            sink.emit(ProgressEvent::new(
                pass_percent(pass_index, loop_budget),
                match target_words {
                    Some(target) => format!(
                        "pass {}/{}: {} of {} words",
                        pass_index, loop_budget, new_words, target
                    ),
                    None => format!("pass {}/{}: {} words", pass_index, loop_budget, new_words),
                },
            ));

            let outcome =
                match policy.decide_expansion(pass_index, prior_words, new_words, target_words) {
                    Decision::Continue => continue,
                    Decision::Reached => Outcome::ReachedTarget,
                    Decision::BudgetExhausted => Outcome::BudgetExhausted,
                    Decision::NoProgress => Outcome::NoProgress,
                };
            return Ok(self.finish(task, document, outcome, passes, sink));
        }
    }

    /// One expansion pass: build context, issue the generation call
    async fn run_pass(
        &self,
        document: &Document,
        pass_index: u32,
        target_words: Option<usize>,
    ) -> Result<PassResult, GenerationError> {
        let current_words = document.word_count();
        let words_needed = target_words
            .map(|t| t.saturating_sub(current_words))
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_GROWTH_WORDS);

        let instruction = prompts::expansion_instruction(current_words, words_needed);
        let context = build_context(document, self.limits.max_context_bytes);

        let text = generate_with_retry(
            &self.generator,
            &self.limits.retry_policy,
            self.limits.generation_timeout(),
            &context,
            &instruction,
        )
        .await?;

        let word_delta = crate::domain::count_words(&text) as i64;
        info!(pass_index, word_delta, "expansion pass completed");

        Ok(PassResult {
            note: if word_delta == 0 {
                Some("no new content generated".to_string())
            } else {
                None
            },
            text,
            word_delta,
        })
    }

    fn finish(
        &self,
        mut task: RefinementTask,
        document: Document,
        outcome: Outcome,
        passes_completed: u32,
        sink: &dyn ProgressSink,
    ) -> ExpansionReport {
        task.state = outcome.task_state(passes_completed, true);
        if outcome == Outcome::ReachedTarget {
            sink.emit(ProgressEvent::new(
                100,
                format!("target reached: {} words", document.word_count()),
            ));
        }
        info!(
            task_id = %task.id,
            passes_completed,
            words = document.word_count(),
            outcome = %outcome,
            "expansion run finished"
        );

        ExpansionReport {
            task,
            document,
            outcome,
            passes_completed,
        }
    }
}
