//! Infrastructure layer - corpus loading and pipeline orchestration

pub mod corpus;
pub mod pipeline;

pub use corpus::{CorpusRegistry, CorpusSource, CorpusStore, FsCorpusSource};
pub use pipeline::{AuditEntry, GroundingPipeline, PipelineStep, QueryOutcome, StepStatus};
