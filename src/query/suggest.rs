//! "Did you mean" reconstruction of a query.
//!
//! While rewriting, the query is mirrored into a list of segments: fixed text
//! (operators, parentheses, field prefixes) and slots holding literal terms.
//! Once rewriting is done each slot is offered to a [`SpellChecker`], and the
//! query is reassembled with any corrections.

use crate::analysis::Analyzer;
use rustc_hash::FxHashSet;
use tracing::trace;

/// Spelling backend
pub trait SpellChecker: Send + Sync {
    /// Whether `term` is a known word
    fn exists(&self, term: &str) -> bool;

    /// Up to `max` corrections for `term`, best first
    fn suggest(&self, term: &str, max: usize) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(String),
}

/// Query text with correctable slots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionBuilder {
    segments: Vec<Segment>,
}

impl SuggestionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.segments.push(Segment::Text(text.into()));
    }

    pub fn push_slot(&mut self, term: impl Into<String>) {
        self.segments.push(Segment::Slot(term.into()));
    }

    /// Reassemble the query, correcting slots. `None` if nothing changed.
    pub fn resolve(
        &self,
        field: &str,
        analyzer: &dyn Analyzer,
        checker: &dyn SpellChecker,
    ) -> Option<String> {
        let mut out = String::new();
        let mut corrected = false;

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(term) => match correct(field, term, analyzer, checker) {
                    Some(word) => {
                        trace!(from = %term, to = %word, "spelling correction");
                        out.push_str(&word);
                        corrected = true;
                    }
                    None => out.push_str(term),
                },
            }
        }

        corrected.then_some(out)
    }
}

fn correct(
    field: &str,
    term: &str,
    analyzer: &dyn Analyzer,
    checker: &dyn SpellChecker,
) -> Option<String> {
    if term.is_empty() {
        return None;
    }
    let tokens = analyzer.analyze(field, term);
    let [token] = tokens.as_slice() else {
        return None;
    };
    if checker.exists(term) || checker.exists(&token.text) {
        return None;
    }
    checker.suggest(&token.text, 1).into_iter().next()
}

/// Farthest edit distance a suggestion may be from the misspelling
const MAX_EDIT_DISTANCE: usize = 2;

/// In-memory dictionary ranked by edit distance
#[derive(Debug, Clone, Default)]
pub struct WordListSpellChecker {
    words: FxHashSet<String>,
}

impl WordListSpellChecker {
    pub fn new<S: Into<String>>(words: impl IntoIterator<Item = S>) -> Self {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }
}

impl SpellChecker for WordListSpellChecker {
    fn exists(&self, term: &str) -> bool {
        self.words.contains(term)
    }

    fn suggest(&self, term: &str, max: usize) -> Vec<String> {
        let mut candidates: Vec<(usize, &String)> = self
            .words
            .iter()
            .map(|word| (levenshtein_distance(term, word), word))
            .filter(|(distance, _)| *distance <= MAX_EDIT_DISTANCE)
            .collect();
        candidates.sort();
        candidates
            .into_iter()
            .take(max)
            .map(|(_, word)| word.clone())
            .collect()
    }
}

pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
