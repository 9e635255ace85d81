//! LLM provider abstraction
//!
//! The grounding pipeline is provider-agnostic; anything that can turn a
//! system prompt plus a grounded user prompt into text plugs in here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// A single generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System-level instructions for the provider
    pub system_prompt: String,
    /// User prompt, already carrying the retrieved context
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Text produced by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub text: String,
    /// Model identifier reported by the provider
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
}

impl GenerationOutput {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            prompt_tokens: None,
            completion_tokens: None,
        }
    }

    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.prompt_tokens = Some(prompt_tokens);
        self.completion_tokens = Some(completion_tokens);
        self
    }
}

/// Trait for text generation providers
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Generate a response for the given request
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}


#[cfg(test)]
mod tests {
    use super::mock::MockLlmProvider;
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_configured_response() {
        let provider = MockLlmProvider::new("mock").with_response("grounded answer");

        let output = provider
            .generate(GenerationRequest::new("system", "user"))
            .await
            .unwrap();

        assert_eq!(output.text, "grounded answer");
        assert_eq!(output.model, "mock-model");
    }

    #[tokio::test]
    async fn test_mock_returns_configured_error() {
        let provider = MockLlmProvider::new("mock").with_error("rate limited");

        let err = provider
            .generate(GenerationRequest::new("system", "user"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("sys", "hello")
            .with_temperature(0.2)
            .with_max_tokens(512);

        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(512));
    }
}
