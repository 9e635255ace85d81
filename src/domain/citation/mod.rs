//! Citation extraction and verification

mod entity;
mod extractor;
mod verifier;

pub use entity::{Citation, CitationStatus};
pub use extractor::{
    CitationExtractor, PunctuationSplitter, RawCitation, SentenceSplitter,
    UnicodeSentenceSplitter,
};
pub use verifier::{CitationVerifier, VerifierConfig};
