//! Corpus entities and structural parsing

mod parser;
mod section;

pub use parser::StructuralParser;
pub use section::Section;
