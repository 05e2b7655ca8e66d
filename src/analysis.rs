//! Text analysis: turning a literal into the terms an index would hold.
//!
//! The compiler only depends on the [`Analyzer`] trait. Position increments
//! tell it how tokens relate: an increment of 0 means the token shares the
//! previous token's position (an injected synonym).

use rustc_hash::{FxHashMap, FxHashSet};
use unicode_segmentation::UnicodeSegmentation;

/// English stop words dropped by [`StandardAnalyzer`]
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// One analyzed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedToken {
    pub text: String,
    /// Positions advanced since the previous token
    pub position_increment: u32,
}

impl AnalyzedToken {
    pub fn new(text: impl Into<String>, position_increment: u32) -> Self {
        Self {
            text: text.into(),
            position_increment,
        }
    }
}

/// Splits field text into index terms
pub trait Analyzer: Send + Sync {
    fn analyze(&self, field: &str, text: &str) -> Vec<AnalyzedToken>;
}

/// Unicode word segmentation, lowercasing and English stop words
#[derive(Debug, Clone)]
pub struct StandardAnalyzer {
    stop_words: FxHashSet<String>,
}

impl StandardAnalyzer {
    pub fn new() -> Self {
        Self::with_stop_words(ENGLISH_STOP_WORDS.iter().copied())
    }

    pub fn with_stop_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            stop_words: words.into_iter().map(str::to_lowercase).collect(),
        }
    }
}

impl Default for StandardAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, _field: &str, text: &str) -> Vec<AnalyzedToken> {
        let mut tokens = Vec::new();
        let mut skipped = 0;

        for word in text.unicode_words() {
            let word = word.to_lowercase();
            if self.stop_words.contains(&word) {
                skipped += 1;
                continue;
            }
            // first token starts at increment 1 regardless of leading stop words
            let increment = if tokens.is_empty() { 1 } else { 1 + skipped };
            tokens.push(AnalyzedToken::new(word, increment));
            skipped = 0;
        }

        tokens
    }
}

/// Splits on whitespace and keeps text as typed
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceAnalyzer;

impl Analyzer for WhitespaceAnalyzer {
    fn analyze(&self, _field: &str, text: &str) -> Vec<AnalyzedToken> {
        text.split_whitespace()
            .map(|word| AnalyzedToken::new(word, 1))
            .collect()
    }
}

/// Wraps another analyzer and injects synonyms at the same position
#[derive(Debug, Clone)]
pub struct SynonymAnalyzer<A> {
    inner: A,
    synonyms: FxHashMap<String, Vec<String>>,
}

impl<A: Analyzer> SynonymAnalyzer<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            synonyms: FxHashMap::default(),
        }
    }

    pub fn with_synonyms<S: Into<String>>(
        mut self,
        word: &str,
        synonyms: impl IntoIterator<Item = S>,
    ) -> Self {
        self.synonyms
            .entry(word.to_string())
            .or_default()
            .extend(synonyms.into_iter().map(Into::into));
        self
    }
}

impl<A: Analyzer> Analyzer for SynonymAnalyzer<A> {
    fn analyze(&self, field: &str, text: &str) -> Vec<AnalyzedToken> {
        let mut tokens = Vec::new();
        for token in self.inner.analyze(field, text) {
            let synonyms = self.synonyms.get(&token.text);
            tokens.push(token.clone());
            if let Some(synonyms) = synonyms {
                tokens.extend(synonyms.iter().map(|s| AnalyzedToken::new(s.clone(), 0)));
            }
        }
        tokens
    }
}
