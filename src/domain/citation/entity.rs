//! Citation entity and verification status

use serde::{Deserialize, Serialize};

/// Verification status of an extracted citation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStatus {
    /// The citation matched a retrieved section with high confidence
    Verified,
    /// The citation matched a retrieved section only partially
    Partial,
    /// No retrieved section plausibly backs the citation
    Unverified,
}

impl CitationStatus {
    /// Check if the citation is fully verified
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Check if the citation is at least partially backed
    pub fn is_backed(&self) -> bool {
        matches!(self, Self::Verified | Self::Partial)
    }
}

/// A citation extracted from a generated response and checked against the
/// sections that were actually retrieved for the turn.
///
/// Read-only after verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Sentence fragment preceding the citation marker
    pub claim: String,
    /// Source name as written inside the marker
    pub source_file: String,
    /// Page number, from the marker or the best-matching section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Section label, from the marker or the best-matching section title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Node id of the best-matching section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Verification outcome
    pub status: CitationStatus,
    /// Match confidence in `[0, 1]`
    pub confidence: f32,
    /// Excerpt of the matched section's content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}
