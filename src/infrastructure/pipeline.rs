//! End-to-end grounded query pipeline
//!
//! Orders every turn the same way: input guardrails, retrieval, prompt
//! assembly, generation, citation verification, output guardrails. Each
//! stage is recorded as a step so callers get a full audit trail even
//! when a stage blocks the turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::citation::{Citation, CitationVerifier};
use crate::domain::guardrail::{GuardrailDecision, GuardrailResult, Guardrails, PlugPolicy};
use crate::domain::llm::{GenerationRequest, LlmProvider};
use crate::domain::prompt::{build_prompt, build_system_prompt};
use crate::domain::DomainError;
use crate::infrastructure::corpus::CorpusRegistry;

/// How a pipeline step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Blocked,
    Skipped,
}

/// One recorded pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    pub name: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PipelineStep {
    fn new(name: &str, status: StepStatus, started: Instant, detail: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            duration_ms: started.elapsed().as_millis() as u64,
            detail,
        }
    }
}

/// Compliance record of one turn, kept verbatim even when the visible
/// response was withheld. Returned to the caller; never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub query_id: Uuid,
    pub plug_id: String,
    pub query: String,
    /// Qualified ids of the sections handed to the model
    pub retrieved_sections: Vec<String>,
    /// Provider output before any withholding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    pub input_decision: GuardrailDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_decision: Option<GuardrailDecision>,
    pub timestamp: DateTime<Utc>,
}

/// Full result of one grounded query turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query_id: Uuid,
    pub plug_id: String,
    pub response_text: String,
    pub citations: Vec<Citation>,
    pub input_guardrails: GuardrailResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_guardrails: Option<GuardrailResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hallucination_score: Option<f32>,
    pub steps: Vec<PipelineStep>,
    pub audit: AuditEntry,
    pub total_duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl QueryOutcome {
    /// Check if the turn produced a usable grounded response
    pub fn is_answered(&self) -> bool {
        self.input_guardrails.decision.allows_proceeding()
            && self
                .output_guardrails
                .as_ref()
                .is_some_and(|g| g.decision.allows_proceeding())
    }
}

const BLOCKED_INPUT_MESSAGE: &str =
    "This query cannot be processed. Please rephrase your question.";
const BLOCKED_OUTPUT_MESSAGE: &str =
    "The generated response did not meet grounding requirements and was withheld.";

/// Orchestrates guardrails, retrieval, generation and verification
pub struct GroundingPipeline {
    provider: Arc<dyn LlmProvider>,
    registry: Arc<CorpusRegistry>,
    guardrails: Guardrails,
    verifier: CitationVerifier,
    top_k: usize,
}

impl GroundingPipeline {
    /// Create a pipeline with default guardrails and verifier
    pub fn new(provider: Arc<dyn LlmProvider>, registry: Arc<CorpusRegistry>) -> Self {
        Self {
            provider,
            registry,
            guardrails: Guardrails::new(),
            verifier: CitationVerifier::new(),
            top_k: 5,
        }
    }

    /// Replace the guardrail evaluator
    pub fn with_guardrails(mut self, guardrails: Guardrails) -> Self {
        self.guardrails = guardrails;
        self
    }

    /// Replace the citation verifier
    pub fn with_verifier(mut self, verifier: CitationVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Set how many sections to retrieve per query
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Run one query through the full pipeline under a plug's policy
    pub async fn process_query(
        &self,
        query: &str,
        policy: &PlugPolicy,
    ) -> Result<QueryOutcome, DomainError> {
        let query_id = Uuid::new_v4();
        let turn_started = Instant::now();
        let mut steps: Vec<PipelineStep> = Vec::new();

        info!(%query_id, plug_id = %policy.plug_id, "processing query");

        // Input guardrails decide whether anything else runs.
        let started = Instant::now();
        let input_result = self.guardrails.check_input(query, policy);
        if input_result.is_blocked() {
            warn!(%query_id, "query blocked at input stage");
            steps.push(PipelineStep::new(
                "input_guardrails",
                StepStatus::Blocked,
                started,
                input_result.details.get("injection_pattern").cloned(),
            ));
            let audit = AuditEntry {
                query_id,
                plug_id: policy.plug_id.clone(),
                query: query.to_string(),
                retrieved_sections: Vec::new(),
                raw_response: None,
                input_decision: input_result.decision,
                output_decision: None,
                timestamp: Utc::now(),
            };
            return Ok(QueryOutcome {
                query_id,
                plug_id: policy.plug_id.clone(),
                response_text: BLOCKED_INPUT_MESSAGE.to_string(),
                citations: Vec::new(),
                input_guardrails: input_result,
                output_guardrails: None,
                hallucination_score: None,
                steps,
                audit,
                total_duration_ms: turn_started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            });
        }
        steps.push(PipelineStep::new(
            "input_guardrails",
            StepStatus::Completed,
            started,
            None,
        ));

        // Flagged queries proceed with PII redacted.
        let effective_query = if input_result.is_flagged() {
            let started = Instant::now();
            let redacted = self.guardrails.redact(query);
            steps.push(PipelineStep::new(
                "pii_redaction",
                StepStatus::Completed,
                started,
                input_result.details.get("pii_detected").cloned(),
            ));
            redacted
        } else {
            query.to_string()
        };

        let started = Instant::now();
        let store = self.registry.get_or_load(policy).await?;
        let ranked = store.retrieve(&effective_query, self.top_k);
        debug!(%query_id, retrieved = ranked.len(), "retrieval complete");
        steps.push(PipelineStep::new(
            "retrieval",
            StepStatus::Completed,
            started,
            Some(format!("{} sections", ranked.len())),
        ));

        let started = Instant::now();
        let system_prompt = build_system_prompt(policy);
        let user_prompt = build_prompt(&effective_query, &ranked);
        let output = self
            .provider
            .generate(GenerationRequest::new(system_prompt, user_prompt))
            .await?;
        steps.push(PipelineStep::new(
            "generation",
            StepStatus::Completed,
            started,
            Some(output.model.clone()),
        ));

        let sections: Vec<_> = ranked.iter().map(|r| r.section.clone()).collect();

        let started = Instant::now();
        let citations = self.verifier.verify(&output.text, &sections);
        steps.push(PipelineStep::new(
            "citation_verification",
            StepStatus::Completed,
            started,
            Some(format!("{} citations", citations.len())),
        ));

        let started = Instant::now();
        let context_text = sections
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let (output_result, hallucination_score) =
            self.guardrails.check_output(&output.text, &context_text, policy);
        let output_blocked = output_result.is_blocked();
        steps.push(PipelineStep::new(
            "output_guardrails",
            if output_blocked {
                StepStatus::Blocked
            } else {
                StepStatus::Completed
            },
            started,
            Some(format!("hallucination {hallucination_score:.2}")),
        ));

        let audit = AuditEntry {
            query_id,
            plug_id: policy.plug_id.clone(),
            query: query.to_string(),
            retrieved_sections: sections.iter().map(|s| s.qualified_id()).collect(),
            raw_response: Some(output.text.clone()),
            input_decision: input_result.decision,
            output_decision: Some(output_result.decision),
            timestamp: Utc::now(),
        };

        let response_text = if output_blocked {
            warn!(%query_id, hallucination_score, "response blocked at output stage");
            BLOCKED_OUTPUT_MESSAGE.to_string()
        } else {
            output.text
        };

        info!(
            %query_id,
            citations = citations.len(),
            blocked = output_blocked,
            "query complete"
        );

        Ok(QueryOutcome {
            query_id,
            plug_id: policy.plug_id.clone(),
            response_text,
            citations,
            input_guardrails: input_result,
            output_guardrails: Some(output_result),
            hallucination_score: Some(hallucination_score),
            steps,
            audit,
            total_duration_ms: turn_started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        })
    }
}
