//! Domain types shared by the store, the retrieval engines and the fusion layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Stable integer key of a verse record. Identical across strategies and
/// embedding cache entries.
pub type VerseId = i64;

/// A single verse as persisted by the store.
///
/// - `name`: reference label, e.g. "Genesis 1:1"
/// - `book_name`/`chapter_name`: owning labels, kept verbatim
/// - `translation`: short tag of the edition the verse was imported from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub id: VerseId,
    pub name: String,
    pub text: String,
    pub book_name: String,
    pub chapter_name: String,
    pub translation: String,
}

/// Which retrieval strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Exact,
    Fuzzy,
    Semantic,
    Topic,
}

impl SearchMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Semantic => "semantic",
            Self::Topic => "topic",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy selector of a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Exact,
    Fuzzy,
    Semantic,
    Topic,
    All,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Semantic => "semantic",
            Self::Topic => "topic",
            Self::All => "all",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = Error;

    /// Case-insensitive. Accepts the strategy names as well
    /// (`literal`, `vector`, `theme`, `combined`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "literal" => Ok(Self::Exact),
            "fuzzy" => Ok(Self::Fuzzy),
            "semantic" | "vector" => Ok(Self::Semantic),
            "topic" | "theme" => Ok(Self::Topic),
            "all" | "combined" => Ok(Self::All),
            _ => Err(Error::InvalidSearchType(s.to_string())),
        }
    }
}

/// A score exactly as a retrieval collaborator reported it, before fusion
/// puts it on the shared `SearchResult::score` field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawScore {
    /// Occurrence-based relevance of the literal store, 0..=100.
    Occurrence(f64),
    /// Token-set similarity, 0..=100.
    Similarity(f64),
    /// Cosine similarity of embeddings, nominally 0..=1.
    Cosine(f64),
}

/// A candidate verse returned by one collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredVerse {
    pub verse: Verse,
    pub score: RawScore,
}

/// One entry of a search response.
///
/// Serialized as a flat record: verse fields, then `score`, `search_method`
/// and `rank`. `score` and `rank` are omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub verse: Verse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub search_method: SearchMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
}

impl SearchResult {
    pub fn id(&self) -> VerseId {
        self.verse.id
    }

    /// Score used for ordering; a stripped score counts as zero.
    pub fn score_or_zero(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// Request envelope of a search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub search_type: SearchType,
    /// Zero or negative means unbounded.
    pub limit: i64,
    pub categorize: bool,
    pub include_scores: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_type: SearchType::All,
            limit: 20,
            categorize: true,
            include_scores: true,
        }
    }

    pub fn search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn categorize(mut self, categorize: bool) -> Self {
        self.categorize = categorize;
        self
    }

    pub fn include_scores(mut self, include_scores: bool) -> Self {
        self.include_scores = include_scores;
        self
    }

    /// The limit as an optional bound.
    pub fn bound(&self) -> Option<usize> {
        limit_bound(self.limit)
    }
}

/// Maps a caller-supplied limit onto an optional bound: `<= 0` is unbounded.
pub fn limit_bound(limit: i64) -> Option<usize> {
    usize::try_from(limit).ok().filter(|&n| n > 0)
}
