//! Output-stage guardrails: citations, grounding, disclaimer, leakage

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

use super::result::{GuardrailDecision, GuardrailLayer, GuardrailResult};
use super::{Guardrails, PlugPolicy};

static CITATION_PRESENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[Source:\s*[^\]]+\]").expect("valid citation presence regex"));

static GROUNDING_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z]+\b").expect("valid grounding term regex"));

impl Guardrails {
    /// Evaluate the output stage for a generated response.
    ///
    /// Returns the verdict together with the hallucination score so
    /// callers can report it without re-deriving it from the details map.
    pub fn check_output(
        &self,
        response: &str,
        retrieved_context: &str,
        policy: &PlugPolicy,
    ) -> (GuardrailResult, f32) {
        let mut checks: BTreeMap<String, bool> = BTreeMap::new();
        let mut details: BTreeMap<String, String> = BTreeMap::new();

        let citation_count = CITATION_PRESENCE.find_iter(response).count();
        checks.insert("has_citations".to_string(), citation_count > 0);
        details.insert("citation_count".to_string(), citation_count.to_string());

        let hallucination_score = self.estimate_hallucination(response, retrieved_context);
        checks.insert(
            "hallucination_acceptable".to_string(),
            hallucination_score <= self.config().hallucination_ceiling,
        );
        details.insert(
            "hallucination_score".to_string(),
            format!("{hallucination_score:.2}"),
        );

        let disclaimer_present = if policy.require_disclaimer {
            let response_lower = response.to_lowercase();
            self.config()
                .disclaimer_keywords
                .iter()
                .any(|keyword| response_lower.contains(keyword))
        } else {
            true
        };
        checks.insert("disclaimer_present".to_string(), disclaimer_present);

        if !policy.blocked_terms.is_empty() {
            let leaked = policy.blocked_terms_in(response);
            checks.insert("no_blocked_terms".to_string(), leaked.is_empty());
            if !leaked.is_empty() {
                details.insert("blocked_terms_in_output".to_string(), leaked.join(", "));
            }
        }

        checks.insert(
            "response_valid".to_string(),
            response.trim().chars().count() > self.config().min_response_chars,
        );

        let all_passed = checks.values().all(|&passed| passed);
        let decision = if !checks["hallucination_acceptable"] {
            GuardrailDecision::Blocked
        } else if !checks.get("no_blocked_terms").copied().unwrap_or(true) {
            GuardrailDecision::Blocked
        } else if !all_passed {
            GuardrailDecision::Flagged
        } else {
            GuardrailDecision::Passed
        };

        (
            GuardrailResult::new(GuardrailLayer::Output, decision, checks, details),
            hallucination_score,
        )
    }

    /// Fraction of the response's factual-looking sentences that are not
    /// grounded in the retrieved context.
    ///
    /// Empty context scores 1.0 regardless of the response. Sentences that
    /// carry a citation marker or a disclaimer keyword are exempt, as are
    /// sentences with no meaningful terms; with nothing left to evaluate
    /// the score is 0.0.
    pub fn estimate_hallucination(&self, response: &str, context: &str) -> f32 {
        if context.trim().is_empty() {
            return 1.0;
        }

        let config = self.config();
        let context_lower = context.to_lowercase();
        let mut counted = 0usize;
        let mut ungrounded = 0usize;

        // Citation markers may contain periods (filenames); collapse them to
        // a dot-free token so the splitter cannot cut a sentence mid-marker.
        let normalized = CITATION_PRESENCE.replace_all(response, "[source]");

        for fragment in self.splitter.split(&normalized) {
            let sentence = fragment.trim();
            if sentence.chars().count() <= config.min_sentence_chars {
                continue;
            }

            let sentence_lower = sentence.to_lowercase();
            if sentence_lower.contains("[source]")
                || config
                    .disclaimer_keywords
                    .iter()
                    .any(|keyword| sentence_lower.contains(keyword))
            {
                continue;
            }

            let terms: HashSet<&str> = GROUNDING_TERM
                .find_iter(&sentence_lower)
                .map(|m| m.as_str())
                .filter(|term| {
                    term.len() >= config.min_term_chars
                        && !config.grounding_stopwords.contains(*term)
                })
                .collect();

            if terms.is_empty() {
                continue;
            }

            let grounded = terms
                .iter()
                .filter(|term| context_lower.contains(**term))
                .count();
            let grounding_ratio = grounded as f32 / terms.len() as f32;

            counted += 1;
            if grounding_ratio < config.grounding_ratio_threshold {
                ungrounded += 1;
            }
        }

        if counted == 0 {
            0.0
        } else {
            (ungrounded as f32 / counted as f32).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PlugPolicy {
        PlugPolicy::new("compliance_sme", "Compliance SME")
            .with_blocked_terms(["guaranteed returns"])
    }

    const CONTEXT: &str =
        "Live load is 2.4 kPa for offices. Penalties for violations include fines.";

    #[test]
    fn test_empty_context_scores_one() {
        let guardrails = Guardrails::new();

        let score = guardrails
            .estimate_hallucination("A perfectly reasonable grounded answer.", "");
        assert_eq!(score, 1.0);

        let (_, score) = guardrails.check_output(
            "A perfectly reasonable grounded answer goes here.",
            "   ",
            &policy(),
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_grounded_response_scores_zero() {
        let guardrails = Guardrails::new();

        let score = guardrails.estimate_hallucination(
            "Live load is 2.4 kPa for offices and penalties include fines.",
            CONTEXT,
        );

        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_fabricated_response_scores_high() {
        let guardrails = Guardrails::new();

        let score = guardrails.estimate_hallucination(
            "Quantum resonance amplifies structural harmonics dramatically overnight.",
            CONTEXT,
        );

        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_cited_sentences_are_exempt() {
        let guardrails = Guardrails::new();

        let score = guardrails.estimate_hallucination(
            "Quantum resonance amplifies structural harmonics [Source: loads.txt, Page 2]",
            CONTEXT,
        );

        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_disclaimer_sentences_are_exempt() {
        let guardrails = Guardrails::new();

        let score = guardrails.estimate_hallucination(
            "Disclaimer: always consult a licensed engineer before proceeding!",
            CONTEXT,
        );

        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_no_countable_sentences_scores_zero() {
        let guardrails = Guardrails::new();

        let score = guardrails.estimate_hallucination("Yes. No. Ok.", CONTEXT);

        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_score_uses_counted_sentence_denominator() {
        let guardrails = Guardrails::new();

        // One exempt (cited) sentence, one grounded, one fabricated: the
        // denominator is the two evaluated sentences.
        let response = "Live load is 2.4 kPa for offices and fines apply. \
                        Quantum resonance amplifies structural harmonics dramatically. \
                        Cited elsewhere entirely [Source: loads.txt, Page 2]";
        let score = guardrails.estimate_hallucination(response, CONTEXT);

        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_excessive_hallucination_blocks() {
        let guardrails = Guardrails::new();

        let (result, score) = guardrails.check_output(
            "Quantum resonance amplifies structural harmonics dramatically overnight.",
            CONTEXT,
            &policy(),
        );

        assert!(score > 0.30);
        assert_eq!(result.decision, GuardrailDecision::Blocked);
        assert_eq!(result.check("hallucination_acceptable"), Some(false));
    }

    #[test]
    fn test_blocked_term_leakage_blocks() {
        let guardrails = Guardrails::new();

        let (result, _) = guardrails.check_output(
            "Offices get guaranteed returns of 2.4 kPa live load for offices with fines. \
             [Source: loads.txt, Page 2]",
            CONTEXT,
            &policy(),
        );

        assert_eq!(result.decision, GuardrailDecision::Blocked);
        assert_eq!(result.check("no_blocked_terms"), Some(false));
        assert!(result.details.contains_key("blocked_terms_in_output"));
    }

    #[test]
    fn test_missing_citation_flags() {
        let guardrails = Guardrails::new();

        let (result, _) = guardrails.check_output(
            "Live load is 2.4 kPa for offices and penalties include fines.",
            CONTEXT,
            &policy(),
        );

        assert_eq!(result.decision, GuardrailDecision::Flagged);
        assert_eq!(result.check("has_citations"), Some(false));
        assert_eq!(
            result.details.get("citation_count").map(String::as_str),
            Some("0")
        );
    }

    #[test]
    fn test_missing_required_disclaimer_flags() {
        let guardrails = Guardrails::new();
        let strict = policy().with_required_disclaimer();

        let (result, _) = guardrails.check_output(
            "Live load is 2.4 kPa for offices with fines. [Source: loads.txt, Page 2]",
            CONTEXT,
            &strict,
        );

        assert_eq!(result.decision, GuardrailDecision::Flagged);
        assert_eq!(result.check("disclaimer_present"), Some(false));
    }

    #[test]
    fn test_short_response_flags() {
        let guardrails = Guardrails::new();

        let (result, _) = guardrails.check_output("[Source: a] Ok.", CONTEXT, &policy());

        assert_eq!(result.check("response_valid"), Some(false));
        assert_eq!(result.decision, GuardrailDecision::Flagged);
    }

    #[test]
    fn test_clean_cited_response_passes() {
        let guardrails = Guardrails::new();

        let (result, score) = guardrails.check_output(
            "Live load is 2.4 kPa for offices and penalties include fines. \
             [Source: loads.txt, Page 2]",
            CONTEXT,
            &policy(),
        );

        assert_eq!(result.decision, GuardrailDecision::Passed);
        assert!(score <= 0.30);
    }
}
