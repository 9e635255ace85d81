//! Grounding Gateway
//!
//! A corpus-grounding engine for LLM responses:
//! - Structural parsing of plain-text corpora into titled, paged sections
//! - Deterministic lexical retrieval over parsed sections
//! - Citation extraction and verification against retrieved sections
//! - Input and output guardrails with hallucination estimation
//!
//! The [`infrastructure::GroundingPipeline`] wires these into one turn:
//! guardrails, retrieval, prompt assembly, generation, verification.

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{
    Citation, CitationStatus, CitationVerifier, DomainError, GuardrailDecision, GuardrailResult,
    Guardrails, LlmProvider, MatchType, PlugPolicy, RankedSection, Retriever, Section,
    StructuralParser,
};
pub use infrastructure::{CorpusRegistry, CorpusStore, FsCorpusSource, GroundingPipeline, QueryOutcome};
