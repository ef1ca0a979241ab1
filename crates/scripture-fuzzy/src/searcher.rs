use anyhow::Result;
use tracing::{debug, info, warn};

use scripture_core::traits::Retriever;
use scripture_core::types::{RawScore, ScoredVerse, Verse};

use crate::ratio::{extract, Scorer, TokenSetRatio};

/// Verse attribute a fuzzy query can be run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerseField {
    Text,
    Name,
    BookName,
    ChapterName,
}

impl VerseField {
    fn of(self, verse: &Verse) -> &str {
        match self {
            Self::Text => &verse.text,
            Self::Name => &verse.name,
            Self::BookName => &verse.book_name,
            Self::ChapterName => &verse.chapter_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    pub verse: Verse,
    pub score: f64,
    pub field: VerseField,
}

/// Approximate matching over the loaded verse texts.
pub struct FuzzySearcher {
    verses: Vec<Verse>,
    corpus: Vec<String>,
    cutoff: f64,
    scorer: Box<dyn Scorer>,
}

impl FuzzySearcher {
    /// `cutoff` is the minimum similarity (0..=100) used by `retrieve`.
    pub fn new(cutoff: f64) -> Self {
        Self::with_scorer(cutoff, Box::new(TokenSetRatio))
    }

    pub fn with_scorer(cutoff: f64, scorer: Box<dyn Scorer>) -> Self {
        Self { verses: Vec::new(), corpus: Vec::new(), cutoff, scorer }
    }

    pub fn load(&mut self, verses: &[Verse]) {
        info!(count = verses.len(), "loading verses for fuzzy search");
        self.verses = verses.to_vec();
        self.corpus = verses.iter().map(|v| v.text.clone()).collect();
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn search(&self, query: &str, limit: Option<usize>, cutoff: f64) -> Vec<ScoredVerse> {
        if self.corpus.is_empty() {
            warn!("no verses loaded for fuzzy search");
            return Vec::new();
        }
        let hits: Vec<ScoredVerse> = extract(self.scorer.as_ref(), query, &self.corpus, limit, cutoff)
            .into_iter()
            .map(|m| ScoredVerse { verse: self.verses[m.index].clone(), score: RawScore::Similarity(m.score) })
            .collect();
        debug!(query, hits = hits.len(), "fuzzy search");
        hits
    }

    /// Runs the query against each field separately and merges the matches,
    /// best first. A verse can appear once per matching field.
    pub fn search_fields(
        &self,
        query: &str,
        fields: &[VerseField],
        limit: Option<usize>,
        cutoff: f64,
    ) -> Vec<FieldMatch> {
        if self.verses.is_empty() {
            warn!("no verses loaded for fuzzy search");
            return Vec::new();
        }
        let mut all = Vec::new();
        for &field in fields {
            let corpus: Vec<String> = self.verses.iter().map(|v| field.of(v).to_string()).collect();
            for m in extract(self.scorer.as_ref(), query, &corpus, limit, cutoff) {
                all.push(FieldMatch { verse: self.verses[m.index].clone(), score: m.score, field });
            }
        }
        all.sort_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(n) = limit {
            all.truncate(n);
        }
        all
    }
}

impl Retriever for FuzzySearcher {
    fn retrieve(&self, query: &str, limit: Option<usize>) -> Result<Vec<ScoredVerse>> {
        Ok(self.search(query, limit, self.cutoff))
    }
}
