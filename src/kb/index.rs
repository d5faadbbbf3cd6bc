//! Keyword search over the corpus.
//!
//! A word-to-posting map built once per corpus. Lookups are exact word
//! matches with no stemming or fuzziness. Scoring favours title hits.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::sync::LazyLock;

use super::corpus::Corpus;
use crate::constants::search::{
    BODY_WEIGHT, ID_MATCH_PENALTY, MAX_RESULTS, MAX_SUGGESTIONS, MIN_SUGGEST_LEN, MIN_WORD_LEN,
    TITLE_WEIGHT,
};

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex"));

/// Sentence index used by title postings
pub const TITLE_SENTENCE: i64 = -1;

/// Where a word occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub doc_id: String,
    pub doc_title: String,
    pub sentence: String,
    pub sentence_index: i64,
    pub is_title: bool,
}

/// One ranked sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub doc_title: String,
    pub sentence: String,
    pub sentence_index: i64,
    pub score: u32,
    pub matched_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank query
    Empty,
    /// Query names a document by title, id or nav label
    Direct(String),
    /// Best match first
    Ranked { top: String, hits: Vec<SearchHit> },
    NoResults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct SearchIndex {
    postings: HashMap<String, Vec<Posting>>,
    /// (id, lowercase title) in corpus order
    titles: Vec<(String, String)>,
    /// (id, lowercase label) in nav order
    labels: Vec<(String, String)>,
    pool: Vec<Suggestion>,
}

fn indexable(word: &str) -> bool {
    word.chars().count() >= MIN_WORD_LEN
}

impl SearchIndex {
    pub fn build(corpus: &Corpus) -> Self {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();

        for doc in corpus.documents() {
            let content = doc.plain_text().to_lowercase();
            let sentences = SENTENCE_BREAK
                .split(&content)
                .filter(|s| !s.trim().is_empty());

            for (index, sentence) in sentences.enumerate() {
                let trimmed = sentence.trim();
                for word in sentence.split_whitespace().filter(|w| indexable(w)) {
                    postings.entry(word.to_string()).or_default().push(Posting {
                        doc_id: doc.id.clone(),
                        doc_title: doc.title.clone(),
                        sentence: trimmed.to_string(),
                        sentence_index: index as i64,
                        is_title: false,
                    });
                }
            }

            let title = doc.title.to_lowercase();
            for word in title.split_whitespace().filter(|w| indexable(w)) {
                postings.entry(word.to_string()).or_default().push(Posting {
                    doc_id: doc.id.clone(),
                    doc_title: doc.title.clone(),
                    sentence: title.clone(),
                    sentence_index: TITLE_SENTENCE,
                    is_title: true,
                });
            }
        }

        let titles = corpus
            .documents()
            .iter()
            .map(|d| (d.id.clone(), d.title.to_lowercase()))
            .collect();
        let labels = corpus
            .nav()
            .iter()
            .map(|n| (n.id.clone(), n.label.to_lowercase()))
            .collect();

        // Nav labels take over the title of an existing id without moving it
        let mut pool: Vec<Suggestion> = corpus
            .documents()
            .iter()
            .map(|d| Suggestion {
                id: d.id.clone(),
                title: d.title.clone(),
            })
            .collect();
        for link in corpus.nav() {
            match pool.iter_mut().find(|s| s.id == link.id) {
                Some(existing) => existing.title = link.label.clone(),
                None => pool.push(Suggestion {
                    id: link.id.clone(),
                    title: link.label.clone(),
                }),
            }
        }

        Self {
            postings,
            titles,
            labels,
            pool,
        }
    }

    pub fn postings(&self, word: &str) -> &[Posting] {
        self.postings.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn word_count(&self) -> usize {
        self.postings.len()
    }

    fn direct_match(&self, query: &str) -> Option<&str> {
        self.titles
            .iter()
            .find(|(id, title)| title.contains(query) || id.to_lowercase().contains(query))
            .or_else(|| self.labels.iter().find(|(_, label)| label.contains(query)))
            .map(|(id, _)| id.as_str())
    }

    pub fn search(&self, query: &str) -> SearchOutcome {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return SearchOutcome::Empty;
        }

        if let Some(id) = self.direct_match(&query) {
            return SearchOutcome::Direct(id.to_string());
        }

        // Insertion-ordered accumulation so ties keep first-seen order
        let mut slots: HashMap<(String, i64), usize> = HashMap::new();
        let mut hits: Vec<SearchHit> = Vec::new();

        for word in query.split_whitespace().filter(|w| indexable(w)) {
            for posting in self.postings(word) {
                let key = (posting.doc_id.clone(), posting.sentence_index);
                let slot = *slots.entry(key).or_insert_with(|| {
                    hits.push(SearchHit {
                        doc_id: posting.doc_id.clone(),
                        doc_title: posting.doc_title.clone(),
                        sentence: posting.sentence.clone(),
                        sentence_index: posting.sentence_index,
                        score: 0,
                        matched_words: Vec::new(),
                    });
                    hits.len() - 1
                });

                let hit = &mut hits[slot];
                hit.score += if posting.is_title { TITLE_WEIGHT } else { BODY_WEIGHT };
                hit.matched_words.push(word.to_string());
            }
        }

        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(MAX_RESULTS);

        match hits.first() {
            Some(best) => SearchOutcome::Ranked {
                top: best.doc_id.clone(),
                hits,
            },
            None => SearchOutcome::NoResults,
        }
    }

    /// Type-ahead suggestions, best first
    pub fn suggest(&self, query: &str) -> Vec<Suggestion> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < MIN_SUGGEST_LEN {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &Suggestion)> = self
            .pool
            .iter()
            .filter_map(|item| {
                let score = match item.title.to_lowercase().find(&query) {
                    Some(pos) => pos,
                    None => item.id.to_lowercase().find(&query)? + ID_MATCH_PENALTY,
                };
                Some((score, item))
            })
            .collect();

        scored.sort_by_key(|(score, _)| *score);
        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, item)| item.clone())
            .collect()
    }
}

/// Bracket every case-insensitive occurrence of `words` in `sentence`
pub fn highlight(sentence: &str, words: &[String]) -> String {
    let mut alternatives: Vec<String> = words
        .iter()
        .filter(|w| !w.is_empty())
        .map(|w| regex::escape(w))
        .collect();
    if alternatives.is_empty() {
        return sentence.to_string();
    }
    // Longest first so overlapping words match whole
    alternatives.sort_by_key(|w| std::cmp::Reverse(w.len()));
    alternatives.dedup();

    match RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.replace_all(sentence, "[$0]").into_owned(),
        Err(_) => sentence.to_string(),
    }
}
