//! Corpus loading, parsing and caching infrastructure

mod registry;
mod store;

pub use registry::{CorpusRegistry, CorpusSource, FsCorpusSource};
pub use store::CorpusStore;
