//! Domain types for the refinement engines.
//!
//! This module contains the core data structures:
//! - Task: identity and lifecycle of one engine run
//! - Document: the growing body of text a run works on
//! - Source: research URLs and their fetch status

pub mod document;
pub mod source;
pub mod task;

// Re-export commonly used types
pub use document::{count_words, Document, PassResult};
pub use source::{source_set, FetchStatus, ResearchSource};
pub use task::{Outcome, RefinementTask, TaskKind, TaskState};
