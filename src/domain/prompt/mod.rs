//! Prompt assembly for grounded generation
//!
//! The user prompt embeds every retrieved section verbatim with its
//! provenance so the model can emit citation markers the verifier can
//! later check against the same corpus.

use std::fmt::Write as _;

use crate::domain::corpus::Section;
use crate::domain::guardrail::PlugPolicy;
use crate::domain::retrieval::RankedSection;

/// Build the grounded user prompt for a query and its retrieved sections
pub fn build_prompt(query: &str, sections: &[RankedSection]) -> String {
    let mut prompt = String::from("RETRIEVED DOCUMENTS:\n");

    if sections.is_empty() {
        prompt.push_str("No relevant documents found.\n");
    } else {
        for (index, ranked) in sections.iter().enumerate() {
            let section: &Section = &ranked.section;
            let _ = write!(
                prompt,
                "\n--- Document {} ---\nFile: {}\nPage: {}\nSection: {}\nContent: {}\n",
                index + 1,
                section.filename,
                section.page,
                section.title,
                section.content,
            );
        }
    }

    let _ = write!(
        prompt,
        "\nIMPORTANT INSTRUCTIONS:\n\
         1. Answer ONLY from the retrieved documents above.\n\
         2. Cite every factual claim using [Source: filename, Page X, Section Y] format.\n\
         3. If the documents do not contain the answer, say so instead of guessing.\n\
         4. Do not invent filenames, page numbers or section titles.\n\
         \nUSER QUESTION: {query}\n"
    );

    prompt
}

/// Build the system prompt for a plug, honoring any override
pub fn build_system_prompt(policy: &PlugPolicy) -> String {
    if let Some(override_prompt) = &policy.system_prompt_override {
        return override_prompt.clone();
    }

    let mut prompt = format!("You are {}.", policy.name);
    if !policy.description.is_empty() {
        let _ = write!(prompt, " {}.", policy.description.trim_end_matches('.'));
    }
    prompt.push_str(
        " Cite all sources using [Source: filename, Page X, Section Y] format.",
    );
    prompt
}
