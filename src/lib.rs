//! redraft - iterative content-refinement engine
//!
//! Repeatedly transforms a growing body of text through an external
//! generative call, under a loop-count budget and a convergence target,
//! while staying observably progressing and safe to abort mid-pass.
//!
//! # Architecture
//!
//! Two engines share one structure:
//! - Expansion grows a single transcript toward a target word count
//! - Research folds material from source URLs into a running synthesis
//!
//! Both consult a single convergence policy after every pass, push progress
//! through a non-blocking sink, and always return the accumulated document
//! alongside the termination outcome.
//!
//! # Modules
//!
//! - `adapters`: External system seams (generation client, page fetcher)
//! - `core`: Refinement logic (Policy, Limits, Progress, Engines)
//! - `domain`: Data structures (Task, Document, Source)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Expand a transcript over 3 passes toward 1000 words
//! redraft expand -i transcript.txt --loops 3 --target-words 1000
//!
//! # Research a topic from two sources
//! redraft research -t "Operation Overlord" -u https://a.example https://b.example
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod prompts;

// Re-export main types at crate root for convenience
pub use adapters::{FetchError, GenerationError, Generator, PageFetcher};
pub use core::{
    ConvergencePolicy, Decision, EngineError, EngineLimits, ExpansionEngine, ExpansionReport,
    ProgressEvent, ProgressSink, ResearchEngine, ResearchReport,
};
pub use domain::{Document, FetchStatus, Outcome, RefinementTask, ResearchSource, TaskState};
