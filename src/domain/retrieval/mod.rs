//! Lexical/structural retrieval over parsed corpus sections

mod config;
mod retriever;

pub use config::{MatchType, RetrievalConfig};
pub use retriever::{RankedSection, Retriever};
