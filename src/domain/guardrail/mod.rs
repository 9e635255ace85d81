//! Input and output guardrail evaluation
//!
//! The input stage screens queries for prompt injection, PII and topic
//! violations before any retrieval happens; the output stage screens
//! generated responses for missing citations, ungrounded claims, missing
//! disclaimers and blocked-term leakage. Both stages always decide.

mod input;
mod output;
mod policy;
mod result;

pub use policy::PlugPolicy;
pub use result::{GuardrailDecision, GuardrailLayer, GuardrailResult};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::citation::{PunctuationSplitter, SentenceSplitter};

/// Configuration for guardrail evaluation.
///
/// Thresholds are empirical carry-overs; override rather than edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Hallucination scores above this block the response
    #[serde(default = "default_hallucination_ceiling")]
    pub hallucination_ceiling: f32,
    /// Sentences with a grounding ratio below this count as ungrounded
    #[serde(default = "default_grounding_ratio_threshold")]
    pub grounding_ratio_threshold: f32,
    /// Sentences must exceed this many characters to be evaluated
    #[serde(default = "default_min_sentence_chars")]
    pub min_sentence_chars: usize,
    /// Responses must exceed this many characters to be valid
    #[serde(default = "default_min_response_chars")]
    pub min_response_chars: usize,
    /// Minimum term length considered meaningful for grounding
    #[serde(default = "default_min_term_chars")]
    pub min_term_chars: usize,
    /// Keywords that satisfy (or exempt a sentence from) the disclaimer check
    #[serde(default = "default_disclaimer_keywords")]
    pub disclaimer_keywords: Vec<String>,
    /// Terms ignored when estimating sentence grounding
    #[serde(default = "default_grounding_stopwords")]
    pub grounding_stopwords: HashSet<String>,
}

fn default_hallucination_ceiling() -> f32 {
    0.30
}

fn default_grounding_ratio_threshold() -> f32 {
    0.3
}

fn default_min_sentence_chars() -> usize {
    10
}

fn default_min_response_chars() -> usize {
    20
}

fn default_min_term_chars() -> usize {
    4
}

fn default_disclaimer_keywords() -> Vec<String> {
    [
        "disclaimer",
        "subject to market risks",
        "consult",
        "not indicative of future",
        "read all scheme",
        "ai-assisted",
        "final determination",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_grounding_stopwords() -> HashSet<String> {
    [
        "this", "that", "with", "from", "have", "been", "will", "they", "their", "what", "which",
        "when", "where", "must", "should", "could", "would", "also", "based", "about",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            hallucination_ceiling: default_hallucination_ceiling(),
            grounding_ratio_threshold: default_grounding_ratio_threshold(),
            min_sentence_chars: default_min_sentence_chars(),
            min_response_chars: default_min_response_chars(),
            min_term_chars: default_min_term_chars(),
            disclaimer_keywords: default_disclaimer_keywords(),
            grounding_stopwords: default_grounding_stopwords(),
        }
    }
}

impl GuardrailConfig {
    /// Create a configuration with the default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hallucination ceiling
    pub fn with_hallucination_ceiling(mut self, ceiling: f32) -> Self {
        self.hallucination_ceiling = ceiling.clamp(0.0, 1.0);
        self
    }

    /// Set the per-sentence grounding ratio threshold
    pub fn with_grounding_ratio_threshold(mut self, threshold: f32) -> Self {
        self.grounding_ratio_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

/// Unified input/output guardrail evaluator
#[derive(Debug)]
pub struct Guardrails {
    config: GuardrailConfig,
    splitter: Box<dyn SentenceSplitter>,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self::new()
    }
}

impl Guardrails {
    /// Create an evaluator with the default configuration
    pub fn new() -> Self {
        Self {
            config: GuardrailConfig::default(),
            splitter: Box::new(PunctuationSplitter::new()),
        }
    }

    /// Create an evaluator with a custom configuration
    pub fn with_config(config: GuardrailConfig) -> Self {
        Self {
            config,
            splitter: Box::new(PunctuationSplitter::new()),
        }
    }

    /// Replace the sentence splitter used for grounding estimation
    pub fn with_splitter(mut self, splitter: Box<dyn SentenceSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    /// Get the guardrail configuration
    pub fn config(&self) -> &GuardrailConfig {
        &self.config
    }
}
