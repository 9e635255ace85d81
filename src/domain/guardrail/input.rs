//! Input-stage guardrails: prompt injection, PII, topic boundary, validity

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use super::result::{GuardrailDecision, GuardrailLayer, GuardrailResult};
use super::{Guardrails, PlugPolicy};

/// Known adversarial phrasings, matched case-insensitively.
static INJECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"ignore\s+(all\s+)?previous\s+instructions",
        r"ignore\s+(all\s+)?above",
        r"disregard\s+(all\s+)?previous",
        r"pretend\s+you\s+are",
        r"forget\s+(everything|all)",
        r"system\s*prompt",
        r"reveal\s+your\s+(instructions|prompt|system)",
        r"jailbreak",
        r"dan\s+mode",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("valid injection pattern"))
    .collect()
});

/// Role-reassignment phrasings. These are injections unless the assigned
/// role is one the engine legitimately plays.
static ROLE_REASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:you\s+are\s+now|act\s+as)\s+an?\s+(\w+)")
        .expect("valid role reassignment pattern")
});

const EXEMPT_ROLES: [&str; 3] = ["compliance", "investment", "advisor"];

/// PII pattern classes. Placeholder tokens produced by redaction match
/// none of these, which keeps redaction idempotent.
static PII_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
        ("credit_card", r"\b(?:\d{4}[-\s]?){3}\d{4}\b"),
        (
            "email",
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        ),
        (
            "phone",
            r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b",
        ),
    ]
    .iter()
    .map(|(class, pattern)| (*class, Regex::new(pattern).expect("valid PII pattern")))
    .collect()
});

impl Guardrails {
    /// Evaluate the input stage for a query under the given policy.
    ///
    /// Blocks on injection, topic violation or an empty query (surfaced in
    /// that priority order); flags on PII, which is redacted downstream
    /// rather than blocked.
    pub fn check_input(&self, query: &str, policy: &PlugPolicy) -> GuardrailResult {
        let mut checks: BTreeMap<String, bool> = BTreeMap::new();
        let mut details: BTreeMap<String, String> = BTreeMap::new();

        let injection = detect_injection(query);
        if let Some(pattern) = &injection {
            details.insert("injection_pattern".to_string(), pattern.clone());
        }
        checks.insert("prompt_injection_safe".to_string(), injection.is_none());

        let pii_classes = detect_pii(query);
        checks.insert("pii_safe".to_string(), pii_classes.is_empty());
        if !pii_classes.is_empty() {
            details.insert("pii_detected".to_string(), pii_classes.join(", "));
        }

        // Topic boundary is only enforced for plugs that declare blocked terms.
        if !policy.blocked_terms.is_empty() {
            let blocked = policy.blocked_terms_in(query);
            checks.insert("topic_in_scope".to_string(), blocked.is_empty());
            if !blocked.is_empty() {
                details.insert("blocked_terms_found".to_string(), blocked.join(", "));
            }
        }

        checks.insert("query_valid".to_string(), !query.trim().is_empty());

        let decision = if !checks["prompt_injection_safe"] {
            GuardrailDecision::Blocked
        } else if !checks.get("topic_in_scope").copied().unwrap_or(true) {
            GuardrailDecision::Blocked
        } else if !checks["query_valid"] {
            GuardrailDecision::Blocked
        } else if !checks["pii_safe"] {
            details.insert(
                "pii_action".to_string(),
                "PII detected and redacted from context".to_string(),
            );
            GuardrailDecision::Flagged
        } else {
            GuardrailDecision::Passed
        };

        GuardrailResult::new(GuardrailLayer::Input, decision, checks, details)
    }

    /// Replace every PII match with a category-tagged placeholder.
    ///
    /// Idempotent: redacting already-redacted text changes nothing.
    pub fn redact(&self, text: &str) -> String {
        let mut redacted = text.to_string();
        for (class, pattern) in PII_PATTERNS.iter() {
            let placeholder = format!("[REDACTED-{}]", class.to_uppercase());
            redacted = pattern.replace_all(&redacted, placeholder.as_str()).into_owned();
        }
        redacted
    }
}

/// First adversarial phrasing found in the query, if any
fn detect_injection(query: &str) -> Option<String> {
    for pattern in INJECTION_PATTERNS.iter() {
        if pattern.is_match(query) {
            return Some(pattern.as_str().to_string());
        }
    }

    if let Some(caps) = ROLE_REASSIGNMENT.captures(query) {
        let role = caps[1].to_lowercase();
        if !EXEMPT_ROLES.contains(&role.as_str()) {
            return Some(ROLE_REASSIGNMENT.as_str().to_string());
        }
    }

    None
}

/// PII classes present in the text, in pattern order
fn detect_pii(text: &str) -> Vec<&'static str> {
    PII_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .map(|(class, _)| *class)
        .collect()
}
