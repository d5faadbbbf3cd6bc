//! Search Command
//!
//! Query the support knowledge base.

use console::style;

use crate::cli::ui::output::Output;
use crate::config::Config;
use crate::kb::{self, Corpus, SearchOutcome, highlight};
use crate::types::Result;

/// Hits printed under the top document
const SHOWN_HITS: usize = 10;

pub fn run(config: &Config, query: &str, suggest: bool) -> Result<()> {
    let (corpus, index) = kb::open(&config.kb)?;
    let output = Output::new();

    if suggest {
        let suggestions = index.suggest(query);
        if suggestions.is_empty() {
            output.info("No suggestions");
        }
        for item in suggestions {
            println!("  {}  {}", style(&item.id).dim(), item.title);
        }
        return Ok(());
    }

    match index.search(query) {
        SearchOutcome::Empty => output.warning("Empty query"),
        SearchOutcome::NoResults => output.info(&format!("No results for \"{}\"", query.trim())),
        SearchOutcome::Direct(id) => print_document(&corpus, &id)?,
        SearchOutcome::Ranked { top, hits } => {
            print_document(&corpus, &top)?;
            output.section(&format!("Matches ({})", hits.len()));
            for hit in hits.iter().take(SHOWN_HITS) {
                println!(
                    "  {} {} {}",
                    style(format!("[{}]", hit.score)).dim(),
                    style(&hit.doc_title).bold(),
                    highlight(&hit.sentence, &hit.matched_words)
                );
            }
        }
    }
    Ok(())
}

fn print_document(corpus: &Corpus, id: &str) -> Result<()> {
    let doc = corpus.require(id)?;
    Output::new().header(&doc.title);
    println!("{}", doc.plain_text());
    Ok(())
}
