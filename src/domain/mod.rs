//! Domain layer - Core grounding logic and entities

pub mod citation;
pub mod corpus;
pub mod error;
pub mod guardrail;
pub mod llm;
pub mod prompt;
pub mod retrieval;

pub use citation::{
    Citation, CitationExtractor, CitationStatus, CitationVerifier, PunctuationSplitter,
    SentenceSplitter, UnicodeSentenceSplitter, VerifierConfig,
};
pub use corpus::{Section, StructuralParser};
pub use error::DomainError;
pub use guardrail::{
    GuardrailConfig, GuardrailDecision, GuardrailLayer, GuardrailResult, Guardrails, PlugPolicy,
};
pub use llm::{GenerationOutput, GenerationRequest, LlmProvider};
pub use retrieval::{MatchType, RankedSection, RetrievalConfig, Retriever};
