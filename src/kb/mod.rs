//! Knowledge Base
//!
//! Support documentation corpus and its keyword search index.

pub mod corpus;
pub mod html;
pub mod index;

pub use corpus::{Corpus, Document, NavLink};
pub use html::strip_html;
pub use index::{SearchHit, SearchIndex, SearchOutcome, Suggestion, highlight};

use crate::config::KbConfig;
use crate::types::Result;

/// Load the configured corpus and index it
pub fn open(config: &KbConfig) -> Result<(Corpus, SearchIndex)> {
    let corpus = Corpus::load(config.corpus_path.as_deref())?;
    let index = SearchIndex::build(&corpus);
    Ok((corpus, index))
}
